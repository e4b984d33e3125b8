//! Closed vocabularies describing a character: alignment, gender, size,
//! skills, languages, conditions and racial special features.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::abilities::Ability;
use crate::rng::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    LawfulGood,
    LawfulNeutral,
    LawfulEvil,
    NeutralGood,
    Neutral,
    NeutralEvil,
    ChaoticGood,
    ChaoticNeutral,
    ChaoticEvil,
}

impl Alignment {
    pub const ALL: [Alignment; 9] = [
        Alignment::LawfulGood,
        Alignment::LawfulNeutral,
        Alignment::LawfulEvil,
        Alignment::NeutralGood,
        Alignment::Neutral,
        Alignment::NeutralEvil,
        Alignment::ChaoticGood,
        Alignment::ChaoticNeutral,
        Alignment::ChaoticEvil,
    ];

    pub fn random(rng: &mut Rng) -> Self {
        Self::ALL[rng.below(Self::ALL.len())]
    }

    pub fn descriptor(&self) -> &'static str {
        match self {
            Self::LawfulGood => "lawful good",
            Self::LawfulNeutral => "lawful neutral",
            Self::LawfulEvil => "lawful evil",
            Self::NeutralGood => "neutral good",
            Self::Neutral => "neutral",
            Self::NeutralEvil => "neutral evil",
            Self::ChaoticGood => "chaotic good",
            Self::ChaoticNeutral => "chaotic neutral",
            Self::ChaoticEvil => "chaotic evil",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptor())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Female, Gender::Male];

    pub fn random(rng: &mut Rng) -> Self {
        if rng.coin() {
            Gender::Male
        } else {
            Gender::Female
        }
    }

    pub fn descriptor(&self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
        }
    }

    pub fn pronoun(&self) -> &'static str {
        match self {
            Self::Female => "she",
            Self::Male => "he",
        }
    }

    pub fn caps_pronoun(&self) -> &'static str {
        match self {
            Self::Female => "She",
            Self::Male => "He",
        }
    }

    pub fn alternate_pronoun(&self) -> &'static str {
        match self {
            Self::Female => "her",
            Self::Male => "his",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptor())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Huge,
}

impl Size {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tiny => "tiny",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Huge => "huge",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Tiny => "Tiny",
            Self::Small => "Small",
            Self::Medium => "Medium",
            Self::Large => "Large",
            Self::Huge => "Huge",
        }
    }

    pub fn shorthand(&self) -> &'static str {
        match self {
            Self::Tiny => "T",
            Self::Small => "S",
            Self::Medium => "M",
            Self::Large => "L",
            Self::Huge => "H",
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stored and displayed by their printed names (`"Animal Handling"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    Acrobatics,
    #[serde(rename = "Animal Handling", alias = "animalHandling")]
    AnimalHandling,
    Arcana,
    Athletics,
    Deception,
    History,
    Insight,
    Intimidation,
    Investigation,
    Medicine,
    Nature,
    Perception,
    Performance,
    Persuasion,
    Religion,
    #[serde(rename = "Sleight of Hand", alias = "sleightOfHand")]
    SleightOfHand,
    Stealth,
    Survival,
}

impl Skill {
    pub const ALL: [Skill; 18] = [
        Skill::Acrobatics,
        Skill::AnimalHandling,
        Skill::Arcana,
        Skill::Athletics,
        Skill::Deception,
        Skill::History,
        Skill::Insight,
        Skill::Intimidation,
        Skill::Investigation,
        Skill::Medicine,
        Skill::Nature,
        Skill::Perception,
        Skill::Performance,
        Skill::Persuasion,
        Skill::Religion,
        Skill::SleightOfHand,
        Skill::Stealth,
        Skill::Survival,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Acrobatics => "Acrobatics",
            Self::AnimalHandling => "Animal Handling",
            Self::Arcana => "Arcana",
            Self::Athletics => "Athletics",
            Self::Deception => "Deception",
            Self::History => "History",
            Self::Insight => "Insight",
            Self::Intimidation => "Intimidation",
            Self::Investigation => "Investigation",
            Self::Medicine => "Medicine",
            Self::Nature => "Nature",
            Self::Perception => "Perception",
            Self::Performance => "Performance",
            Self::Persuasion => "Persuasion",
            Self::Religion => "Religion",
            Self::SleightOfHand => "Sleight of Hand",
            Self::Stealth => "Stealth",
            Self::Survival => "Survival",
        }
    }

    pub fn ability(&self) -> Ability {
        match self {
            Self::Athletics => Ability::Str,
            Self::Acrobatics | Self::SleightOfHand | Self::Stealth => Ability::Dex,
            Self::Arcana | Self::History | Self::Investigation | Self::Nature | Self::Religion => {
                Ability::Int
            }
            Self::AnimalHandling
            | Self::Insight
            | Self::Medicine
            | Self::Perception
            | Self::Survival => Ability::Wis,
            Self::Deception | Self::Intimidation | Self::Performance | Self::Persuasion => {
                Ability::Cha
            }
        }
    }

    /// A skill not already in `known`, or `None` when every skill is taken.
    pub fn random_excluding(rng: &mut Rng, known: &[Skill]) -> Option<Skill> {
        let candidates: Vec<Skill> = Self::ALL
            .into_iter()
            .filter(|skill| !known.contains(skill))
            .collect();
        rng.pick(&candidates).copied()
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Abyssal,
    Celestial,
    Common,
    #[serde(rename = "deep speech", alias = "deepSpeech")]
    DeepSpeech,
    Draconic,
    Dwarvish,
    Elvish,
    Giant,
    Gnomish,
    Goblin,
    Halfling,
    Infernal,
    Orc,
    Primordial,
    Sylvan,
    Undercommon,
}

impl Language {
    pub const ALL: [Language; 16] = [
        Language::Abyssal,
        Language::Celestial,
        Language::Common,
        Language::DeepSpeech,
        Language::Draconic,
        Language::Dwarvish,
        Language::Elvish,
        Language::Giant,
        Language::Gnomish,
        Language::Goblin,
        Language::Halfling,
        Language::Infernal,
        Language::Orc,
        Language::Primordial,
        Language::Sylvan,
        Language::Undercommon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Abyssal => "abyssal",
            Self::Celestial => "celestial",
            Self::Common => "common",
            Self::DeepSpeech => "deep speech",
            Self::Draconic => "draconic",
            Self::Dwarvish => "dwarvish",
            Self::Elvish => "elvish",
            Self::Giant => "giant",
            Self::Gnomish => "gnomish",
            Self::Goblin => "goblin",
            Self::Halfling => "halfling",
            Self::Infernal => "infernal",
            Self::Orc => "orc",
            Self::Primordial => "primordial",
            Self::Sylvan => "sylvan",
            Self::Undercommon => "undercommon",
        }
    }

    /// Title-cased display form, e.g. `Deep Speech`.
    pub fn title(&self) -> String {
        self.as_str()
            .split(' ')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }

    pub fn random_excluding(rng: &mut Rng, known: &[Language]) -> Option<Language> {
        let candidates: Vec<Language> = Self::ALL
            .into_iter()
            .filter(|language| !known.contains(language))
            .collect();
        rng.pick(&candidates).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Blinded,
    Charmed,
    Deafened,
    Frightened,
    Grappled,
    Incapacitated,
    Invisible,
    Paralyzed,
    Petrified,
    Poisoned,
    Prone,
    Restrained,
    Stunned,
    Unconscious,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blinded => "blinded",
            Self::Charmed => "charmed",
            Self::Deafened => "deafened",
            Self::Frightened => "frightened",
            Self::Grappled => "grappled",
            Self::Incapacitated => "incapacitated",
            Self::Invisible => "invisible",
            Self::Paralyzed => "paralyzed",
            Self::Petrified => "petrified",
            Self::Poisoned => "poisoned",
            Self::Prone => "prone",
            Self::Restrained => "restrained",
            Self::Stunned => "stunned",
            Self::Unconscious => "unconscious",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Racial features that change assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpecialFeature {
    AbilityPlusOne,
    /// One extra hit point per level.
    #[serde(alias = "toughness")]
    DwarvenToughness,
    /// One additional random language.
    ExtraLanguage,
    /// Two additional random skills.
    SkillVersatility,
}
