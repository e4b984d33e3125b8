//! Challenge classification.
//!
//! A fixed, totally ordered ladder of challenge ranks. Each rank carries an XP
//! value and four bands: hit points and damage per round pick a base rank,
//! armor class and attack bonus nudge it when they fall outside the expected
//! band. The defensive and offensive ranks are then averaged by rating.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Inclusive integer band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Band {
    pub low: i32,
    pub high: i32,
}

impl Band {
    pub const fn new(low: i32, high: i32) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: i32) -> bool {
        (self.low..=self.high).contains(&value)
    }

    /// Strips both ends while more than two values remain, then takes the lower
    /// of what is left.
    pub fn median(&self) -> i32 {
        let (mut low, mut high) = (self.low, self.high);
        while high - low + 1 > 2 {
            low += 1;
            high -= 1;
        }
        low
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Challenge {
    Zero,
    OneEighth,
    OneFourth,
    OneHalf,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Eleven,
    Twelve,
    Thirteen,
    Fourteen,
    Fifteen,
    Sixteen,
    Seventeen,
    Eighteen,
    Nineteen,
    Twenty,
    TwentyOne,
    TwentyTwo,
    TwentyThree,
    TwentyFour,
    TwentyFive,
    TwentySix,
    TwentySeven,
    TwentyEight,
    TwentyNine,
    Thirty,
}

struct RankRow {
    challenge: Challenge,
    key: &'static str,
    rating: &'static str,
    numeric: f64,
    xp: u32,
    hit_points: Band,
    damage_per_round: Band,
    armor_class: Band,
    attack_bonus: Band,
}

const fn row(
    challenge: Challenge,
    key: &'static str,
    rating: &'static str,
    numeric: f64,
    xp: u32,
    hit_points: (i32, i32),
    damage_per_round: (i32, i32),
    armor_class: (i32, i32),
    attack_bonus: (i32, i32),
) -> RankRow {
    RankRow {
        challenge,
        key,
        rating,
        numeric,
        xp,
        hit_points: Band::new(hit_points.0, hit_points.1),
        damage_per_round: Band::new(damage_per_round.0, damage_per_round.1),
        armor_class: Band::new(armor_class.0, armor_class.1),
        attack_bonus: Band::new(attack_bonus.0, attack_bonus.1),
    }
}

use Challenge as C;

#[rustfmt::skip]
const LADDER: [RankRow; 34] = [
    row(C::Zero,        "zero",        "0",   0.0,   10,     (1, 6),     (0, 1),     (12, 14), (2, 4)),
    row(C::OneEighth,   "oneEighth",   "1/8", 0.125, 25,     (7, 35),    (2, 3),     (12, 14), (2, 4)),
    row(C::OneFourth,   "oneFourth",   "1/4", 0.25,  50,     (36, 49),   (4, 5),     (12, 14), (2, 4)),
    row(C::OneHalf,     "oneHalf",     "1/2", 0.5,   100,    (50, 70),   (6, 8),     (12, 14), (2, 4)),
    row(C::One,         "one",         "1",   1.0,   200,    (71, 85),   (9, 14),    (12, 14), (2, 4)),
    row(C::Two,         "two",         "2",   2.0,   450,    (86, 100),  (15, 20),   (12, 14), (2, 4)),
    row(C::Three,       "three",       "3",   3.0,   700,    (101, 115), (21, 26),   (12, 14), (3, 5)),
    row(C::Four,        "four",        "4",   4.0,   1100,   (116, 130), (27, 32),   (13, 15), (4, 6)),
    row(C::Five,        "five",        "5",   5.0,   1800,   (131, 145), (33, 38),   (14, 16), (5, 7)),
    row(C::Six,         "six",         "6",   6.0,   2300,   (146, 160), (39, 44),   (14, 16), (5, 7)),
    row(C::Seven,       "seven",       "7",   7.0,   2900,   (161, 175), (45, 50),   (14, 16), (5, 7)),
    row(C::Eight,       "eight",       "8",   8.0,   3900,   (176, 190), (51, 56),   (15, 17), (6, 8)),
    row(C::Nine,        "nine",        "9",   9.0,   5000,   (191, 205), (57, 62),   (15, 17), (6, 8)),
    row(C::Ten,         "ten",         "10",  10.0,  5900,   (206, 220), (63, 68),   (16, 18), (6, 8)),
    row(C::Eleven,      "eleven",      "11",  11.0,  7200,   (221, 235), (69, 74),   (16, 18), (7, 9)),
    row(C::Twelve,      "twelve",      "12",  12.0,  8400,   (236, 250), (75, 80),   (16, 18), (7, 9)),
    row(C::Thirteen,    "thirteen",    "13",  13.0,  10000,  (251, 265), (81, 86),   (17, 19), (7, 9)),
    row(C::Fourteen,    "fourteen",    "14",  14.0,  11500,  (266, 280), (87, 92),   (17, 19), (7, 9)),
    row(C::Fifteen,     "fifteen",     "15",  15.0,  13000,  (281, 295), (93, 98),   (17, 19), (7, 9)),
    row(C::Sixteen,     "sixteen",     "16",  16.0,  15000,  (296, 310), (99, 104),  (17, 19), (8, 10)),
    row(C::Seventeen,   "seventeen",   "17",  17.0,  18000,  (311, 325), (105, 110), (18, 20), (9, 11)),
    row(C::Eighteen,    "eighteen",    "18",  18.0,  20000,  (326, 340), (111, 116), (18, 20), (9, 11)),
    row(C::Nineteen,    "nineteen",    "19",  19.0,  22000,  (341, 355), (117, 122), (18, 20), (9, 11)),
    row(C::Twenty,      "twenty",      "20",  20.0,  25000,  (356, 400), (123, 140), (18, 20), (9, 11)),
    row(C::TwentyOne,   "twentyOne",   "21",  21.0,  33000,  (401, 445), (141, 158), (18, 20), (10, 12)),
    row(C::TwentyTwo,   "twentyTwo",   "22",  22.0,  41000,  (446, 490), (159, 176), (18, 20), (10, 12)),
    row(C::TwentyThree, "twentyThree", "23",  23.0,  50000,  (491, 535), (177, 194), (18, 20), (10, 12)),
    row(C::TwentyFour,  "twentyFour",  "24",  24.0,  62000,  (536, 580), (195, 212), (18, 20), (11, 13)),
    row(C::TwentyFive,  "twentyFive",  "25",  25.0,  75000,  (581, 625), (213, 230), (18, 20), (11, 13)),
    row(C::TwentySix,   "twentySix",   "26",  26.0,  90000,  (626, 670), (231, 248), (18, 20), (11, 13)),
    row(C::TwentySeven, "twentySeven", "27",  27.0,  105000, (671, 715), (249, 266), (18, 20), (12, 14)),
    row(C::TwentyEight, "twentyEight", "28",  28.0,  120000, (716, 760), (267, 284), (18, 20), (12, 14)),
    row(C::TwentyNine,  "twentyNine",  "29",  29.0,  135000, (761, 805), (285, 302), (18, 20), (12, 14)),
    row(C::Thirty,      "thirty",      "30",  30.0,  155000, (806, 850), (303, 320), (18, 20), (13, 15)),
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown challenge rating `{0}`")]
pub struct ChallengeParseError(pub String);

impl Challenge {
    pub const COUNT: usize = LADDER.len();

    /// Every rank, lowest first.
    pub fn all() -> impl DoubleEndedIterator<Item = Challenge> + ExactSizeIterator {
        LADDER.iter().map(|row| row.challenge)
    }

    pub const fn lowest() -> Self {
        Challenge::Zero
    }

    pub const fn highest() -> Self {
        Challenge::Thirty
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        LADDER.get(index).map(|row| row.challenge)
    }

    fn row(self) -> &'static RankRow {
        &LADDER[self.index()]
    }

    /// Stored form, e.g. `oneEighth`.
    pub fn key(self) -> &'static str {
        self.row().key
    }

    /// Display form, e.g. `1/8`.
    pub fn rating(self) -> &'static str {
        self.row().rating
    }

    pub fn numeric_rating(self) -> f64 {
        self.row().numeric
    }

    pub fn xp_value(self) -> u32 {
        self.row().xp
    }

    pub fn proficiency(self) -> i32 {
        (self.numeric_rating() / 4.1).floor() as i32 + 2
    }

    pub fn armor_class_band(self) -> Band {
        self.row().armor_class
    }

    pub fn attack_bonus_band(self) -> Band {
        self.row().attack_bonus
    }

    pub fn hit_points_band(self) -> Band {
        self.row().hit_points
    }

    pub fn damage_per_round_band(self) -> Band {
        self.row().damage_per_round
    }

    /// One rank up, clamped at the top.
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1).unwrap_or(self)
    }

    /// One rank down, clamped at the bottom.
    pub fn previous(self) -> Self {
        self.index()
            .checked_sub(1)
            .and_then(Self::from_index)
            .unwrap_or(self)
    }

    /// Moves `steps` ranks (negative is down), clamped at both ends.
    pub fn step(self, steps: i32) -> Self {
        let target = (self.index() as i64 + i64::from(steps)).clamp(0, Self::COUNT as i64 - 1);
        Self::from_index(target as usize).unwrap_or(self)
    }

    pub fn from_hit_points(hit_points: i32) -> Option<Self> {
        LADDER
            .iter()
            .find(|row| row.hit_points.contains(hit_points))
            .map(|row| row.challenge)
    }

    pub fn from_damage_per_round(damage: i32) -> Option<Self> {
        LADDER
            .iter()
            .find(|row| row.damage_per_round.contains(damage))
            .map(|row| row.challenge)
    }

    /// Snaps a continuous rating down to the rank whose rating it reaches.
    pub fn from_rating(rating: f64) -> Self {
        LADDER
            .iter()
            .rev()
            .find(|row| rating >= row.numeric)
            .map(|row| row.challenge)
            .unwrap_or(Challenge::Zero)
    }

    /// Moves from the lower-rated rank halfway toward the higher one and snaps.
    pub fn average(defensive: Self, offensive: Self) -> Self {
        let defensive_rating = defensive.numeric_rating();
        let offensive_rating = offensive.numeric_rating();
        if defensive_rating == offensive_rating {
            return defensive;
        }
        let (low, high) = if offensive_rating > defensive_rating {
            (defensive_rating, offensive_rating)
        } else {
            (offensive_rating, defensive_rating)
        };
        Self::from_rating(low + (high - low) / 2.0)
    }
}

impl PartialOrd for Challenge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Challenge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.xp_value().cmp(&other.xp_value())
    }
}

impl Default for Challenge {
    fn default() -> Self {
        Challenge::Zero
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rating())
    }
}

impl FromStr for Challenge {
    type Err = ChallengeParseError;

    /// Accepts either the display rating (`1/8`) or the stored key (`oneEighth`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        LADDER
            .iter()
            .find(|row| row.rating == trimmed || row.key == trimmed)
            .map(|row| row.challenge)
            .ok_or_else(|| ChallengeParseError(trimmed.to_string()))
    }
}

/// Which band's median the offensive adjustment measures the attack bonus against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OffensiveMedian {
    /// The armor-class band, as the stored bounds were historically computed.
    #[default]
    ArmorClass,
    /// The rank's own attack-bonus band.
    AttackBonus,
}

impl OffensiveMedian {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArmorClass => "armor-class",
            Self::AttackBonus => "attack-bonus",
        }
    }
}

impl fmt::Display for OffensiveMedian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OffensiveMedian {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "armor-class" | "ac" => Ok(Self::ArmorClass),
            "attack-bonus" | "attack" => Ok(Self::AttackBonus),
            other => Err(format!("unknown offensive median `{other}`")),
        }
    }
}

/// Tunables for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChallengeRules {
    #[serde(default)]
    pub offensive_median: OffensiveMedian,
}

impl ChallengeRules {
    pub fn new(offensive_median: OffensiveMedian) -> Self {
        Self { offensive_median }
    }

    /// Base rank from hit points, shifted when armor class is outside the rank's band.
    pub fn defensive(&self, hit_points: i32, armor_class: i32) -> Option<Challenge> {
        let base = Challenge::from_hit_points(hit_points)?;
        Some(adjust(base, base.armor_class_band(), armor_class))
    }

    /// Base rank from damage per round, shifted when the attack bonus is outside the rank's band.
    pub fn offensive(&self, attack_bonus: i32, damage_per_round: i32) -> Option<Challenge> {
        let base = Challenge::from_damage_per_round(damage_per_round)?;
        if base.attack_bonus_band().contains(attack_bonus) {
            return Some(base);
        }
        let reference = match self.offensive_median {
            OffensiveMedian::ArmorClass => base.armor_class_band(),
            OffensiveMedian::AttackBonus => base.attack_bonus_band(),
        };
        Some(step_from_median(base, reference, attack_bonus))
    }

    /// Averages the two sub-ranks. Out-of-table hit points or damage fall back to the lowest rank.
    pub fn calculate(
        &self,
        hit_points: i32,
        armor_class: i32,
        attack_bonus: i32,
        damage_per_round: i32,
    ) -> Challenge {
        match (
            self.defensive(hit_points, armor_class),
            self.offensive(attack_bonus, damage_per_round),
        ) {
            (Some(defensive), Some(offensive)) => Challenge::average(defensive, offensive),
            _ => Challenge::lowest(),
        }
    }
}

fn adjust(base: Challenge, band: Band, value: i32) -> Challenge {
    if band.contains(value) {
        base
    } else {
        step_from_median(base, band, value)
    }
}

fn step_from_median(base: Challenge, band: Band, value: i32) -> Challenge {
    let diff = (band.median() - value) / 2;
    base.step(diff)
}

/// Classifies with the default rules.
pub fn calculate(hit_points: i32, armor_class: i32, attack_bonus: i32, damage_per_round: i32) -> Challenge {
    ChallengeRules::default().calculate(hit_points, armor_class, attack_bonus, damage_per_round)
}

/// An inclusive span of ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRange {
    pub low: Challenge,
    pub high: Challenge,
}

impl ChallengeRange {
    pub fn new(low: Challenge, high: Challenge) -> Self {
        if low <= high {
            Self { low, high }
        } else {
            Self {
                low: high,
                high: low,
            }
        }
    }

    pub fn single(challenge: Challenge) -> Self {
        Self {
            low: challenge,
            high: challenge,
        }
    }

    pub fn full() -> Self {
        Self::new(Challenge::lowest(), Challenge::highest())
    }

    pub fn contains(&self, challenge: Challenge) -> bool {
        self.low <= challenge && challenge <= self.high
    }

    /// Number of ranks covered.
    pub fn count(&self) -> usize {
        self.high.index() - self.low.index() + 1
    }

    /// Extends to cover `challenge`. Returns true when the range changed.
    pub fn widen(&mut self, challenge: Challenge) -> bool {
        let before = *self;
        self.low = self.low.min(challenge);
        self.high = self.high.max(challenge);
        before != *self
    }

    /// Smallest range covering both.
    pub fn union(&self, other: &ChallengeRange) -> ChallengeRange {
        ChallengeRange {
            low: self.low.min(other.low),
            high: self.high.max(other.high),
        }
    }

    /// Overlap of both, or `None` when they are disjoint.
    pub fn intersect(&self, other: &ChallengeRange) -> Option<ChallengeRange> {
        let low = self.low.max(other.low);
        let high = self.high.min(other.high);
        (low <= high).then_some(ChallengeRange { low, high })
    }

    /// Clamps both ends into `limits`.
    pub fn clamp_to(&self, limits: &ChallengeRange) -> ChallengeRange {
        ChallengeRange {
            low: self.low.clamp(limits.low, limits.high),
            high: self.high.clamp(limits.low, limits.high),
        }
    }

    pub fn ranks(&self) -> impl Iterator<Item = Challenge> {
        let (low, high) = (self.low.index(), self.high.index());
        (low..=high).filter_map(Challenge::from_index)
    }
}

impl fmt::Display for ChallengeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_is_ordered_by_xp() {
        let xp: Vec<u32> = Challenge::all().map(Challenge::xp_value).collect();
        assert!(xp.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(Challenge::all().count(), Challenge::COUNT);
        for (index, challenge) in Challenge::all().enumerate() {
            assert_eq!(challenge.index(), index);
        }
    }

    #[test]
    fn bands_are_contiguous() {
        let rows: Vec<Challenge> = Challenge::all().collect();
        for pair in rows.windows(2) {
            assert_eq!(pair[0].hit_points_band().high + 1, pair[1].hit_points_band().low);
            assert_eq!(
                pair[0].damage_per_round_band().high + 1,
                pair[1].damage_per_round_band().low
            );
        }
    }

    #[test]
    fn median_of_three_wide_band_is_middle() {
        assert_eq!(Band::new(12, 14).median(), 13);
        assert_eq!(Band::new(2, 4).median(), 3);
        assert_eq!(Band::new(1, 6).median(), 3);
    }

    #[test]
    fn stored_key_round_trips_through_serde() {
        let json = serde_json::to_string(&Challenge::OneEighth).unwrap();
        assert_eq!(json, "\"oneEighth\"");
        assert_eq!("twentyOne".parse::<Challenge>(), Ok(Challenge::TwentyOne));
        assert_eq!("1/4".parse::<Challenge>(), Ok(Challenge::OneFourth));
    }

    #[test]
    fn range_widening_and_clamping() {
        let mut range = ChallengeRange::single(Challenge::Two);
        assert!(!range.widen(Challenge::Two));
        assert!(range.widen(Challenge::OneHalf));
        assert!(range.widen(Challenge::Five));
        assert_eq!(range, ChallengeRange::new(Challenge::OneHalf, Challenge::Five));
        assert_eq!(range.count(), 6);

        let limits = ChallengeRange::new(Challenge::One, Challenge::Three);
        assert_eq!(
            range.clamp_to(&limits),
            ChallengeRange::new(Challenge::One, Challenge::Three)
        );
        assert_eq!(range.intersect(&limits), Some(limits));
        assert_eq!(
            limits.intersect(&ChallengeRange::single(Challenge::Ten)),
            None
        );
    }
}
