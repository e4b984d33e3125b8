//! Pure rules: formula evaluation, modifier folding, challenge classification.

pub mod challenge;
pub mod formula;
pub mod modifiers;

pub use challenge::{
    Band, Challenge, ChallengeParseError, ChallengeRange, ChallengeRules, OffensiveMedian,
};
pub use formula::{
    ChallengeModifier, FormulaContext, FormulaError, ModifierFormula, Operation, StatTarget,
};
pub use modifiers::{compute, ModifierStack};
