//! The six abilities, scores, and stored ability modifiers ("str 2").

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Baseline score every ability starts from before modifiers are added.
pub const BASE_SCORE: i32 = 10;

/// Stored in save lists as `Str`, `Dex`, ...; the lowercase short form is also accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ability {
    #[serde(rename = "Str", alias = "str")]
    Str,
    #[serde(rename = "Dex", alias = "dex")]
    Dex,
    #[serde(rename = "Con", alias = "con")]
    Con,
    #[serde(rename = "Int", alias = "int")]
    Int,
    #[serde(rename = "Wis", alias = "wis")]
    Wis,
    #[serde(rename = "Cha", alias = "cha")]
    Cha,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Ability::Str,
        Ability::Dex,
        Ability::Con,
        Ability::Int,
        Ability::Wis,
        Ability::Cha,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// `str`, `dex`, ...
    pub fn key(&self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Dex => "dex",
            Self::Con => "con",
            Self::Int => "int",
            Self::Wis => "wis",
            Self::Cha => "cha",
        }
    }

    /// `Str`, `Dex`, ... as printed in saving throw lists.
    pub fn short_title(&self) -> &'static str {
        match self {
            Self::Str => "Str",
            Self::Dex => "Dex",
            Self::Con => "Con",
            Self::Int => "Int",
            Self::Wis => "Wis",
            Self::Cha => "Cha",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Str => "Strength",
            Self::Dex => "Dexterity",
            Self::Con => "Constitution",
            Self::Int => "Intelligence",
            Self::Wis => "Wisdom",
            Self::Cha => "Charisma",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Ability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Ability::ALL
            .into_iter()
            .find(|ability| ability.key() == lowered || ability.title().eq_ignore_ascii_case(&lowered))
            .ok_or_else(|| format!("unknown ability `{s}`"))
    }
}

/// `floor(score / 2) - 5`.
pub fn modifier_for(score: i32) -> i32 {
    score.div_euclid(2) - 5
}

/// Formats a bonus with an explicit sign: `+2`, `-1`, `+0`.
pub fn signed(value: i32) -> String {
    if value < 0 {
        value.to_string()
    } else {
        format!("+{value}")
    }
}

/// A stored ability adjustment, written `"<ability> <amount>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbilityModifier {
    pub ability: Ability,
    pub amount: i32,
}

impl AbilityModifier {
    pub fn new(ability: Ability, amount: i32) -> Self {
        Self { ability, amount }
    }
}

impl fmt::Display for AbilityModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ability.key(), self.amount)
    }
}

impl FromStr for AbilityModifier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(ability), Some(amount), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(format!("malformed ability modifier `{s}`"));
        };
        let amount = amount
            .parse()
            .map_err(|_| format!("malformed ability modifier `{s}`"))?;
        Ok(Self::new(ability.parse()?, amount))
    }
}

impl Serialize for AbilityModifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AbilityModifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Scores for all six abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbilityScores {
    scores: [i32; 6],
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            scores: [BASE_SCORE; 6],
        }
    }
}

impl AbilityScores {
    pub fn score(&self, ability: Ability) -> i32 {
        self.scores[ability.index()]
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        modifier_for(self.score(ability))
    }

    /// Adds every modifier in the list; several entries for one ability accumulate.
    pub fn apply<'a, I>(&mut self, modifiers: I)
    where
        I: IntoIterator<Item = &'a AbilityModifier>,
    {
        for modifier in modifiers {
            let slot = &mut self.scores[modifier.ability.index()];
            *slot = slot.saturating_add(modifier.amount);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Ability, i32)> + '_ {
        Ability::ALL.into_iter().map(|ability| (ability, self.score(ability)))
    }

    /// `"14 (+2)"`, or `"8 (-1)"` below ten.
    pub fn describe(&self, ability: Ability) -> String {
        let score = self.score(ability);
        let modifier = self.modifier(ability);
        if score < BASE_SCORE {
            format!("{score} ({modifier})")
        } else {
            format!("{score} (+{modifier})")
        }
    }
}

impl Serialize for AbilityScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|(ability, score)| (ability.key(), score)))
    }
}
