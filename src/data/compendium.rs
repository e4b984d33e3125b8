//! In-memory compendium snapshot. Passed explicitly to everything that reads
//! reference data; lookups are linear scans, O(n) per call.

use serde::{Deserialize, Serialize};

use crate::data::items::{Action, Armor, Trait};
use crate::data::occupation::{Bounded, Occupation};
use crate::data::proficiency::{expand, ArmorTag, ProficiencyRef, WeaponTag};
use crate::data::race::{Race, Subrace};
use crate::rules::challenge::{Challenge, ChallengeRange};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Compendium {
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub armors: Vec<Armor>,
    #[serde(default)]
    pub occupations: Vec<Occupation>,
    #[serde(default)]
    pub races: Vec<Race>,
    #[serde(default)]
    pub subraces: Vec<Subrace>,
    #[serde(default)]
    pub traits: Vec<Trait>,
    #[serde(default)]
    pub weapons: Vec<Action>,
}

impl Compendium {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occupation(&self, id: &str) -> Option<&Occupation> {
        self.occupations.iter().find(|o| o.id == id)
    }

    pub fn race(&self, id: &str) -> Option<&Race> {
        self.races.iter().find(|r| r.id == id)
    }

    pub fn subrace(&self, id: &str) -> Option<&Subrace> {
        self.subraces.iter().find(|s| s.id == id)
    }

    pub fn action(&self, id: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn weapon(&self, id: &str) -> Option<&Action> {
        self.weapons.iter().find(|w| w.id == id)
    }

    pub fn armor(&self, id: &str) -> Option<&Armor> {
        self.armors.iter().find(|a| a.id == id)
    }

    pub fn trait_entry(&self, id: &str) -> Option<&Trait> {
        self.traits.iter().find(|t| t.id == id)
    }

    /// Subraces listed on `race` whose record names it as parent, in list order.
    pub fn subraces_of(&self, race: &Race) -> Vec<&Subrace> {
        race.subraces
            .iter()
            .filter_map(|id| self.subrace(id))
            .filter(|subrace| subrace.race == race.id)
            .collect()
    }

    pub fn armors_for(&self, refs: &[ProficiencyRef<ArmorTag>]) -> Vec<&Armor> {
        expand(refs, &self.armors)
    }

    pub fn weapons_for(&self, refs: &[ProficiencyRef<WeaponTag>]) -> Vec<&Action> {
        expand(refs, &self.weapons)
    }

    /// Unknown ids are skipped.
    pub fn traits_for<S: AsRef<str>>(&self, ids: &[S]) -> Vec<&Trait> {
        ids.iter()
            .filter_map(|id| self.trait_entry(id.as_ref()))
            .collect()
    }

    /// Unknown ids are skipped.
    pub fn actions_for<S: AsRef<str>>(&self, ids: &[S]) -> Vec<&Action> {
        ids.iter()
            .filter_map(|id| self.action(id.as_ref()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.occupations.is_empty() && self.races.is_empty()
    }

    /// Classification range reachable for a filter selection.
    ///
    /// Selecting every occupation and every race yields the widest stored range
    /// (at least `0-1/8`). A narrower selection clamps the full ladder to each
    /// selected race in turn, does the same for the selected occupations, and
    /// clamps the race span into the occupation span. Entities without stored
    /// bounds are ignored. Disjoint selections collapse onto the nearest end
    /// rather than failing.
    pub fn challenge_range(&self, occupations: &[&str], races: &[&str]) -> ChallengeRange {
        let chosen_occupations: Vec<&Occupation> = self
            .occupations
            .iter()
            .filter(|o| occupations.contains(&o.id.as_str()))
            .collect();
        let chosen_races: Vec<&Race> = self
            .races
            .iter()
            .filter(|r| races.contains(&r.id.as_str()))
            .collect();

        let everything = chosen_occupations.len() == self.occupations.len()
            && chosen_races.len() == self.races.len();
        if everything {
            let widest = self
                .occupations
                .iter()
                .filter_map(Bounded::challenge_range)
                .chain(self.races.iter().filter_map(Bounded::challenge_range))
                .fold(
                    ChallengeRange::new(Challenge::Zero, Challenge::OneEighth),
                    |widest, range| {
                        if range.count() > widest.count() {
                            range
                        } else {
                            widest
                        }
                    },
                );
            return widest;
        }

        let occupation_span = clamp_all(chosen_occupations.iter().copied());
        let race_span = clamp_all(chosen_races.iter().copied());
        race_span.clamp_to(&occupation_span)
    }
}

fn clamp_all<'a, B, I>(entities: I) -> ChallengeRange
where
    B: Bounded + 'a,
    I: Iterator<Item = &'a B>,
{
    entities
        .filter_map(Bounded::challenge_range)
        .fold(ChallengeRange::full(), |acc, range| acc.clamp_to(&range))
}
