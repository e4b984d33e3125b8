//! Per-level data: a sparse table keyed by level 1..=20 where a lookup falls
//! back to the nearest populated level below.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::items::DamageType;
use crate::data::lenient;
use crate::data::proficiency::{ArmorTag, ProficiencyRef};
use crate::npc::abilities::{Ability, AbilityModifier};
use crate::npc::descriptors::{Condition, Skill};

pub const MAX_LEVEL: u8 = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelEntry {
    #[serde(default, deserialize_with = "lenient::list", skip_serializing_if = "Vec::is_empty")]
    pub ability_modifiers: Vec<AbilityModifier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub armor_proficiencies: Vec<ProficiencyRef<ArmorTag>>,
    #[serde(default, deserialize_with = "lenient::list", skip_serializing_if = "Vec::is_empty")]
    pub condition_immunities: Vec<Condition>,
    #[serde(default, deserialize_with = "lenient::list", skip_serializing_if = "Vec::is_empty")]
    pub damage_resistances: Vec<DamageType>,
    #[serde(default, deserialize_with = "lenient::list", skip_serializing_if = "Vec::is_empty")]
    pub saves: Vec<Ability>,
    #[serde(default, deserialize_with = "lenient::list", skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<Skill>,
    /// Trait ids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<String>,
    /// Unparsed modifier descriptions, e.g. `hitPoints +level*2`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub challenge_modifiers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truesight: Option<u32>,
}

/// Stored as a JSON object keyed by level number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelTable {
    entries: BTreeMap<u8, LevelEntry>,
}

impl LevelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The entry at `level`, else the nearest populated level below it.
    /// Levels at or below zero have no data.
    pub fn get(&self, level: i32) -> Option<&LevelEntry> {
        if level <= 0 {
            return None;
        }
        let capped = u8::try_from(level).unwrap_or(u8::MAX);
        self.entries
            .range(..=capped)
            .next_back()
            .map(|(_, entry)| entry)
    }

    /// Publishes an entry. An already populated level is never replaced;
    /// returns false in that case.
    pub fn insert(&mut self, level: u8, entry: LevelEntry) -> bool {
        if level == 0 || self.entries.contains_key(&level) {
            return false;
        }
        self.entries.insert(level, entry);
        true
    }

    pub fn levels(&self) -> impl Iterator<Item = u8> + '_ {
        self.entries.keys().copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = (u8, &LevelEntry)> + '_ {
        self.entries.iter().map(|(level, entry)| (*level, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(u8, LevelEntry)> for LevelTable {
    fn from_iter<I: IntoIterator<Item = (u8, LevelEntry)>>(iter: I) -> Self {
        let mut table = LevelTable::new();
        for (level, entry) in iter {
            table.insert(level, entry);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(title: &str) -> LevelEntry {
        LevelEntry {
            title: Some(title.to_string()),
            ..LevelEntry::default()
        }
    }

    fn sparse() -> LevelTable {
        [(1, titled("novice")), (5, titled("adept")), (10, titled("master"))]
            .into_iter()
            .collect()
    }

    #[test]
    fn lookup_falls_back_to_nearest_lower_level() {
        let table = sparse();
        assert_eq!(table.get(7).and_then(|e| e.title.as_deref()), Some("adept"));
        assert_eq!(table.get(5).and_then(|e| e.title.as_deref()), Some("adept"));
        assert_eq!(table.get(20).and_then(|e| e.title.as_deref()), Some("master"));
        assert_eq!(table.get(1).and_then(|e| e.title.as_deref()), Some("novice"));
    }

    #[test]
    fn level_zero_and_below_have_no_data() {
        let table = sparse();
        assert!(table.get(0).is_none());
        assert!(table.get(-3).is_none());
    }

    #[test]
    fn lookup_below_first_populated_level_is_empty() {
        let table: LevelTable = [(3, titled("late"))].into_iter().collect();
        assert!(table.get(2).is_none());
    }

    #[test]
    fn published_levels_are_not_replaced() {
        let mut table = sparse();
        assert!(!table.insert(5, titled("usurper")));
        assert_eq!(table.get(5).and_then(|e| e.title.as_deref()), Some("adept"));
        assert!(table.insert(15, titled("legend")));
    }

    #[test]
    fn decodes_from_object_keyed_by_level() {
        let table: LevelTable = serde_json::from_str(
            r#"{"1": {"title": "Guard", "skills": ["Perception", "Juggling"]}, "4": {"title": "Sergeant"}}"#,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(3).map(|e| e.skills.clone()), Some(vec![Skill::Perception]));
        assert_eq!(table.get(9).and_then(|e| e.title.as_deref()), Some("Sergeant"));
    }
}
