//! Item records: actions and weapons, armor, and traits.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::data::lenient;
use crate::dice::{Die, DieFace};
use crate::npc::abilities::Ability;

/// Id given to the shield bash every shield-proficient character gains.
pub const SHIELD_BASH_ID: &str = "shieldBash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageType {
    Acid,
    Bludgeoning,
    Cold,
    Fire,
    Force,
    Lightning,
    Necrotic,
    Piercing,
    Poison,
    Psychic,
    Radiant,
    Slashing,
    Thunder,
}

impl DamageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Acid => "acid",
            Self::Bludgeoning => "bludgeoning",
            Self::Cold => "cold",
            Self::Fire => "fire",
            Self::Force => "force",
            Self::Lightning => "lightning",
            Self::Necrotic => "necrotic",
            Self::Piercing => "piercing",
            Self::Poison => "poison",
            Self::Psychic => "psychic",
            Self::Radiant => "radiant",
            Self::Slashing => "slashing",
            Self::Thunder => "thunder",
        }
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a weapon is wielded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttackKind {
    Melee,
    Ranged,
    Thrown,
}

impl AttackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Melee => "melee",
            Self::Ranged => "ranged",
            Self::Thrown => "thrown",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "melee" => Some(Self::Melee),
            "ranged" => Some(Self::Ranged),
            "thrown" => Some(Self::Thrown),
            _ => None,
        }
    }
}

/// Weapon category, stored as `simple_melee`, `martial_ranged`, `natural`, ...
/// Anything unrecognised reads as [`WeaponType::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WeaponType {
    Simple(AttackKind),
    Martial(AttackKind),
    Natural,
    #[default]
    None,
}

impl WeaponType {
    pub fn attack_kind(&self) -> Option<AttackKind> {
        match self {
            Self::Simple(kind) | Self::Martial(kind) => Some(*kind),
            Self::Natural | Self::None => None,
        }
    }

    /// Simple or martial weapon of exactly this kind.
    pub fn is_weapon(&self, kind: AttackKind) -> bool {
        self.attack_kind() == Some(kind)
    }
}

impl FromStr for WeaponType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s.trim().split_once('_') {
            Some(("simple", kind)) => AttackKind::parse(kind).map(Self::Simple),
            Some(("martial", kind)) => AttackKind::parse(kind).map(Self::Martial),
            Some(_) => None,
            None if s.trim() == "natural" => Some(Self::Natural),
            None => None,
        };
        Ok(parsed.unwrap_or(Self::None))
    }
}

impl fmt::Display for WeaponType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(kind) => write!(f, "simple_{}", kind.as_str()),
            Self::Martial(kind) => write!(f, "martial_{}", kind.as_str()),
            Self::Natural => write!(f, "natural"),
            Self::None => write!(f, "none"),
        }
    }
}

impl Serialize for WeaponType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeaponType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .as_deref()
            .map(|raw| raw.parse::<WeaponType>().unwrap_or_default())
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaOfEffect {
    pub area: String,
    #[serde(rename = "type")]
    pub shape: String,
}

impl fmt::Display for AreaOfEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.area, self.shape)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub short: u32,
    #[serde(default)]
    pub long: Option<u32>,
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.long {
            Some(long) => write!(f, "{}/{}", self.short, long),
            None => write!(f, "{}", self.short),
        }
    }
}

/// A weapon or special action. Equality compares name and description only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub damage_die: Option<Die>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub damage_type: Option<DamageType>,
    #[serde(default)]
    pub weapon_type: WeaponType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_of_effect: Option<AreaOfEffect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reach: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
    #[serde(
        default,
        deserialize_with = "lenient::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub save: Option<Ability>,
    #[serde(default)]
    pub versatile: bool,
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.description == other.description
    }
}

impl Eq for Action {}

impl Action {
    /// The improvised shield attack: 1d6 bludgeoning, simple melee.
    pub fn shield_bash() -> Self {
        Self {
            id: SHIELD_BASH_ID.to_string(),
            name: "Shield Bash".to_string(),
            description: None,
            damage_die: Some(Die::new(DieFace::D6, 1)),
            damage_type: Some(DamageType::Bludgeoning),
            weapon_type: WeaponType::Simple(AttackKind::Melee),
            area_of_effect: None,
            reach: None,
            range: None,
            save: None,
            versatile: false,
        }
    }

    /// Ranged weapons use ranged attack numbers; every other action uses melee ones.
    pub fn uses_ranged_numbers(&self) -> bool {
        self.weapon_type.is_weapon(AttackKind::Ranged)
    }

    pub fn reach_or_default(&self) -> u32 {
        self.reach.unwrap_or(5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmorCategory {
    #[default]
    None,
    Light,
    Medium,
    Heavy,
    Shield,
}

impl ArmorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Heavy => "heavy",
            Self::Shield => "shield",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Armor {
    pub id: String,
    pub name: String,
    pub base_ac: i32,
    #[serde(rename = "type", default, deserialize_with = "lenient::or_default")]
    pub category: ArmorCategory,
}

impl Armor {
    /// Armor class while wearing this armor. A shield contributes nothing on its own.
    pub fn armor_class(&self, dex: i32, con: i32) -> i32 {
        match self.category {
            ArmorCategory::Heavy => self.base_ac,
            ArmorCategory::Light => self.base_ac.saturating_add(dex),
            ArmorCategory::Medium => self.base_ac.saturating_add(dex.min(2)),
            ArmorCategory::None => self.base_ac.saturating_add(dex).saturating_add(con),
            ArmorCategory::Shield => 0,
        }
    }

    pub fn is_shield(&self) -> bool {
        self.category == ArmorCategory::Shield
    }
}

/// A titled rule text whose description may contain `$` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trait {
    pub id: String,
    pub title: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armor(category: ArmorCategory, base_ac: i32) -> Armor {
        Armor {
            id: category.as_str().to_string(),
            name: category.as_str().to_string(),
            base_ac,
            category,
        }
    }

    #[test]
    fn armor_class_formulas_by_category() {
        assert_eq!(armor(ArmorCategory::Heavy, 16).armor_class(3, 1), 16);
        assert_eq!(armor(ArmorCategory::Heavy, 16).armor_class(-1, 1), 16);
        assert_eq!(armor(ArmorCategory::Light, 11).armor_class(3, 1), 14);
        assert_eq!(armor(ArmorCategory::Medium, 13).armor_class(4, 0), 15);
        assert_eq!(armor(ArmorCategory::Medium, 13).armor_class(1, 0), 14);
        assert_eq!(armor(ArmorCategory::None, 10).armor_class(2, 3), 15);
        assert_eq!(armor(ArmorCategory::Shield, 2).armor_class(2, 3), 0);
    }

    #[test]
    fn armor_class_saturates_on_extreme_scores() {
        assert_eq!(armor(ArmorCategory::Light, 11).armor_class(i32::MAX, 0), i32::MAX);
        assert_eq!(armor(ArmorCategory::None, 10).armor_class(i32::MAX, i32::MAX), i32::MAX);
        assert_eq!(armor(ArmorCategory::None, 10).armor_class(i32::MIN, i32::MIN), i32::MIN);
    }

    #[test]
    fn weapon_type_text() {
        assert_eq!("simple_melee".parse::<WeaponType>(), Ok(WeaponType::Simple(AttackKind::Melee)));
        assert_eq!("martial_thrown".parse::<WeaponType>(), Ok(WeaponType::Martial(AttackKind::Thrown)));
        assert_eq!("natural".parse::<WeaponType>(), Ok(WeaponType::Natural));
        assert_eq!("simpleMelee".parse::<WeaponType>(), Ok(WeaponType::None));
        assert_eq!("exotic_melee".parse::<WeaponType>(), Ok(WeaponType::None));
    }

    #[test]
    fn actions_compare_by_name_and_description() {
        let mut bash = Action::shield_bash();
        let other = Action {
            id: "another-id".to_string(),
            damage_die: None,
            ..Action::shield_bash()
        };
        assert_eq!(bash, other);
        bash.description = Some("different".to_string());
        assert_ne!(bash, other);
    }

    #[test]
    fn undecodable_action_fields_are_dropped() {
        let action: Action = serde_json::from_str(
            r#"{"id": "club", "name": "Club", "damage_die": "1d20", "damage_type": "sonic", "weapon_type": "simple_melee"}"#,
        )
        .unwrap();
        assert_eq!(action.damage_die, None);
        assert_eq!(action.damage_type, None);
        assert_eq!(action.weapon_type, WeaponType::Simple(AttackKind::Melee));
    }
}
