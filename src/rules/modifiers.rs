//! Modifier resolution: folds challenge modifiers over a base combat number.

use crate::rules::formula::{ChallengeModifier, Operation, StatTarget};

/// Applies `modifiers` to `base`.
///
/// Any override present wins outright and the smallest override value is
/// returned. Otherwise every modifier is applied in list order; division
/// truncates toward zero.
pub fn compute<'a, I>(modifiers: I, base: i32) -> i32
where
    I: IntoIterator<Item = &'a ChallengeModifier>,
    I::IntoIter: Clone,
{
    let modifiers = modifiers.into_iter();
    let smallest_override = modifiers
        .clone()
        .filter(|modifier| modifier.operation == Operation::Override)
        .map(|modifier| modifier.value)
        .min();
    if let Some(value) = smallest_override {
        return value;
    }

    modifiers.fold(base, |value, modifier| match modifier.operation {
        Operation::Add => value.saturating_add(modifier.value),
        Operation::Subtract => value.saturating_sub(modifier.value),
        Operation::Multiply => value.saturating_mul(modifier.value),
        Operation::Divide => value.checked_div(modifier.value).unwrap_or(value),
        Operation::Override => value,
    })
}

/// Modifiers gathered from every source of a character, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierStack {
    modifiers: Vec<ChallengeModifier>,
}

impl ModifierStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, modifier: ChallengeModifier) {
        self.modifiers.push(modifier);
    }

    pub fn extend<I>(&mut self, modifiers: I)
    where
        I: IntoIterator<Item = ChallengeModifier>,
    {
        self.modifiers.extend(modifiers);
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub fn for_target(&self, target: StatTarget) -> impl Iterator<Item = &ChallengeModifier> + Clone {
        self.modifiers
            .iter()
            .filter(move |modifier| modifier.target == target)
    }

    /// Resolves `base` using only the modifiers aimed at `target`.
    pub fn apply(&self, target: StatTarget, base: i32) -> i32 {
        compute(self.for_target(target), base)
    }
}

impl FromIterator<ChallengeModifier> for ModifierStack {
    fn from_iter<T: IntoIterator<Item = ChallengeModifier>>(iter: T) -> Self {
        Self {
            modifiers: iter.into_iter().collect(),
        }
    }
}
