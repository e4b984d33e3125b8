//! Occupation records (e.g. "guard", "priest"): proficiencies, the per-level
//! table, and the classification bounds maintained by the recompute job.

use serde::{Deserialize, Serialize};

use crate::data::lenient;
use crate::data::level_data::{LevelEntry, LevelTable};
use crate::data::proficiency::{ArmorTag, ProficiencyRef, WeaponTag};
use crate::rules::challenge::{Challenge, ChallengeRange};

/// Records carrying stored low/high classification bounds.
pub trait Bounded {
    fn id(&self) -> &str;

    fn low_challenge(&self) -> Option<Challenge>;

    fn high_challenge(&self) -> Option<Challenge>;

    /// The stored bounds; a single stored end stands for both.
    fn challenge_range(&self) -> Option<ChallengeRange> {
        match (self.low_challenge(), self.high_challenge()) {
            (Some(low), Some(high)) => Some(ChallengeRange::new(low, high)),
            (Some(only), None) | (None, Some(only)) => Some(ChallengeRange::single(only)),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occupation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub armor_proficiencies: Vec<ProficiencyRef<ArmorTag>>,
    #[serde(default)]
    pub weapon_proficiencies: Vec<ProficiencyRef<WeaponTag>>,
    #[serde(default)]
    pub levels: LevelTable,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub low_challenge: Option<Challenge>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub high_challenge: Option<Challenge>,
}

impl Occupation {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            armor_proficiencies: Vec::new(),
            weapon_proficiencies: Vec::new(),
            levels: LevelTable::new(),
            low_challenge: None,
            high_challenge: None,
        }
    }

    pub fn level(&self, level: i32) -> Option<&LevelEntry> {
        self.levels.get(level)
    }

    /// The level title, falling back to the occupation title.
    pub fn title_at(&self, level: i32) -> &str {
        self.level(level)
            .and_then(|entry| entry.title.as_deref())
            .unwrap_or(&self.title)
    }
}

impl Bounded for Occupation {
    fn id(&self) -> &str {
        &self.id
    }

    fn low_challenge(&self) -> Option<Challenge> {
        self.low_challenge
    }

    fn high_challenge(&self) -> Option<Challenge> {
        self.high_challenge
    }
}
