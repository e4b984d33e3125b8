//! Proficiency references: either a concrete item id or a category tag that is
//! expanded against the compendium when read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::data::items::{Action, ArmorCategory, Armor, AttackKind, WeaponType};

/// Records addressable by id.
pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for Action {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Armor {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A category that selects a subset of a collection.
pub trait Category: Copy + Sized + 'static {
    type Item: Identified;

    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn matches(&self, item: &Self::Item) -> bool;

    /// Case-insensitive lookup that ignores `-` and `_`.
    fn from_tag(raw: &str) -> Option<Self> {
        let wanted = normalize_tag(raw);
        Self::ALL
            .iter()
            .copied()
            .find(|tag| normalize_tag(tag.as_str()) == wanted)
    }
}

fn normalize_tag(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmorTag {
    Light,
    Medium,
    Heavy,
    Shield,
}

impl Category for ArmorTag {
    type Item = Armor;

    const ALL: &'static [Self] = &[Self::Light, Self::Medium, Self::Heavy, Self::Shield];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Heavy => "heavy",
            Self::Shield => "shield",
        }
    }

    fn matches(&self, armor: &Armor) -> bool {
        let category = match self {
            Self::Light => ArmorCategory::Light,
            Self::Medium => ArmorCategory::Medium,
            Self::Heavy => ArmorCategory::Heavy,
            Self::Shield => ArmorCategory::Shield,
        };
        armor.category == category
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeaponTag {
    Exotic,
    Martial,
    MartialMelee,
    MartialRanged,
    Melee,
    Ranged,
    Simple,
    SimpleMelee,
    SimpleRanged,
}

impl Category for WeaponTag {
    type Item = Action;

    const ALL: &'static [Self] = &[
        Self::Exotic,
        Self::Martial,
        Self::MartialMelee,
        Self::MartialRanged,
        Self::Melee,
        Self::Ranged,
        Self::Simple,
        Self::SimpleMelee,
        Self::SimpleRanged,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Exotic => "exotic",
            Self::Martial => "martial",
            Self::MartialMelee => "martialMelee",
            Self::MartialRanged => "martialRanged",
            Self::Melee => "melee",
            Self::Ranged => "ranged",
            Self::Simple => "simple",
            Self::SimpleMelee => "simpleMelee",
            Self::SimpleRanged => "simpleRanged",
        }
    }

    // Thrown weapons are only ever granted by id.
    fn matches(&self, weapon: &Action) -> bool {
        use AttackKind::{Melee, Ranged};
        let kind = weapon.weapon_type;
        match self {
            Self::Exotic => false,
            Self::Martial => matches!(kind, WeaponType::Martial(Melee | Ranged)),
            Self::MartialMelee => kind == WeaponType::Martial(Melee),
            Self::MartialRanged => kind == WeaponType::Martial(Ranged),
            Self::Melee => kind.is_weapon(Melee),
            Self::Ranged => kind.is_weapon(Ranged),
            Self::Simple => matches!(kind, WeaponType::Simple(Melee | Ranged)),
            Self::SimpleMelee => kind == WeaponType::Simple(Melee),
            Self::SimpleRanged => kind == WeaponType::Simple(Ranged),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProficiencyRef<T> {
    Concrete(String),
    Category(T),
}

impl<T: Category> ProficiencyRef<T> {
    pub fn parse(raw: &str) -> Self {
        match T::from_tag(raw) {
            Some(tag) => Self::Category(tag),
            None => Self::Concrete(raw.trim().to_string()),
        }
    }
}

impl<T: Category> FromStr for ProficiencyRef<T> {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl<T: Category> fmt::Display for ProficiencyRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete(id) => write!(f, "{id}"),
            Self::Category(tag) => write!(f, "{}", tag.as_str()),
        }
    }
}

impl<T: Category> Serialize for ProficiencyRef<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, T: Category> Deserialize<'de> for ProficiencyRef<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Resolves references against `items`: concrete ids first, in list order,
/// then every item matched by each category. Duplicates keep their first
/// position; unresolvable references contribute nothing. O(refs × items).
pub fn expand<'a, T: Category>(
    refs: &[ProficiencyRef<T>],
    items: &'a [T::Item],
) -> Vec<&'a T::Item> {
    let concrete = refs.iter().filter_map(|reference| match reference {
        ProficiencyRef::Concrete(id) => items.iter().find(|item| item.id() == id),
        ProficiencyRef::Category(_) => None,
    });
    let categories = refs
        .iter()
        .filter_map(|reference| match reference {
            ProficiencyRef::Category(tag) => Some(*tag),
            ProficiencyRef::Concrete(_) => None,
        })
        .flat_map(|tag| items.iter().filter(move |item| tag.matches(item)));

    let mut resolved: Vec<&'a T::Item> = Vec::new();
    for item in concrete.chain(categories) {
        if !resolved.iter().any(|known| known.id() == item.id()) {
            resolved.push(item);
        }
    }
    resolved
}

/// Concrete ids that do not resolve against `items`.
pub fn unresolved<'r, T: Category>(
    refs: &'r [ProficiencyRef<T>],
    items: &[T::Item],
) -> Vec<&'r str> {
    refs.iter()
        .filter_map(|reference| match reference {
            ProficiencyRef::Concrete(id) if !items.iter().any(|item| item.id() == id) => {
                Some(id.as_str())
            }
            _ => None,
        })
        .collect()
}
