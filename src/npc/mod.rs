//! Character assembly: composes occupation, race, subrace and level into
//! ability scores, proficiencies and combat numbers, then classifies once.

pub mod abilities;
pub mod describe;
pub mod descriptors;
pub mod details;

use std::borrow::Cow;

use thiserror::Error;
use uuid::Uuid;

use crate::data::compendium::Compendium;
use crate::data::items::{Action, Armor, AttackKind, DamageType, Trait};
use crate::data::level_data::{LevelEntry, MAX_LEVEL};
use crate::data::proficiency::Identified;
use crate::data::occupation::Occupation;
use crate::data::race::{Nameable, Race, Subrace};
use crate::rng::Rng;
use crate::rules::challenge::{Challenge, ChallengeRules};
use crate::rules::formula::{ChallengeModifier, FormulaContext, FormulaError};
use crate::rules::modifiers::ModifierStack;
use crate::rules::StatTarget;

use abilities::{Ability, AbilityScores};
use descriptors::{Alignment, Condition, Gender, Language, Skill, SpecialFeature};
use details::Details;

pub use describe::{EnvIdentity, Identity, NpcRecord, StaticIdentity};

#[derive(Debug, Error)]
pub enum NpcError {
    #[error("unknown occupation '{0}'")]
    UnknownOccupation(String),

    #[error("unknown race '{0}'")]
    UnknownRace(String),

    #[error("unknown subrace '{subrace}' for race '{race}'")]
    UnknownSubrace { subrace: String, race: String },

    #[error("compendium has no occupations or no races")]
    EmptyCompendium,

    #[error("challenge modifier '{description}': {source}")]
    Formula {
        description: String,
        #[source]
        source: FormulaError,
    },

    #[error("no current user to own the record")]
    MissingIdentity,
}

/// A builder input that is either drawn from the seeded generator or fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice<T> {
    Random,
    Fixed(T),
}

impl<T> Default for Choice<T> {
    fn default() -> Self {
        Self::Random
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DetailsChoice {
    #[default]
    Generate,
    /// Leave every detail empty.
    Skip,
    Fixed(Details),
}

/// Equipped armor and weapons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Loadout<'a> {
    pub armor: Option<&'a Armor>,
    pub melee: Option<&'a Action>,
    pub ranged: Option<&'a Action>,
}

/// The four combat numbers classification reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CombatNumbers {
    pub hit_points: i32,
    pub armor_class: i32,
    pub attack_bonus: i32,
    pub damage_per_round: i32,
}

#[derive(Debug, Clone, Default)]
pub struct NpcBuilder {
    occupation: Choice<String>,
    race: Choice<String>,
    subrace: Choice<Option<String>>,
    level: Choice<i32>,
    gender: Choice<Gender>,
    alignment: Choice<Alignment>,
    armor: Choice<Option<String>>,
    melee: Choice<Option<String>>,
    ranged: Choice<Option<String>>,
    name: Option<String>,
    id: Option<String>,
    details: DetailsChoice,
    rules: ChallengeRules,
    seed: Option<u64>,
}

impl NpcBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occupation(mut self, id: &str) -> Self {
        self.occupation = Choice::Fixed(id.to_string());
        self
    }

    pub fn race(mut self, id: &str) -> Self {
        self.race = Choice::Fixed(id.to_string());
        self
    }

    /// `None` builds a character without a subrace.
    pub fn subrace(mut self, id: Option<&str>) -> Self {
        self.subrace = Choice::Fixed(id.map(str::to_string));
        self
    }

    /// Clamped to 1..=20.
    pub fn level(mut self, level: i32) -> Self {
        self.level = Choice::Fixed(level);
        self
    }

    pub fn gender(mut self, gender: Gender) -> Self {
        self.gender = Choice::Fixed(gender);
        self
    }

    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = Choice::Fixed(alignment);
        self
    }

    /// Armor by id; `None` leaves the character unarmored.
    pub fn armor(mut self, id: Option<&str>) -> Self {
        self.armor = Choice::Fixed(id.map(str::to_string));
        self
    }

    pub fn melee(mut self, id: Option<&str>) -> Self {
        self.melee = Choice::Fixed(id.map(str::to_string));
        self
    }

    pub fn ranged(mut self, id: Option<&str>) -> Self {
        self.ranged = Choice::Fixed(id.map(str::to_string));
        self
    }

    /// Fixes armor, melee and ranged to nothing.
    pub fn unequipped(self) -> Self {
        self.armor(None).melee(None).ranged(None)
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn details(mut self, details: DetailsChoice) -> Self {
        self.details = details;
        self
    }

    pub fn rules(mut self, rules: ChallengeRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self, compendium: &Compendium) -> Result<Npc<'_>, NpcError> {
        let mut rng = self.seed.map(Rng::new).unwrap_or_else(Rng::from_entropy);

        let occupation = match &self.occupation {
            Choice::Fixed(id) => compendium
                .occupation(id)
                .ok_or_else(|| NpcError::UnknownOccupation(id.clone()))?,
            Choice::Random => rng
                .pick(&compendium.occupations)
                .ok_or(NpcError::EmptyCompendium)?,
        };
        let race = match &self.race {
            Choice::Fixed(id) => compendium
                .race(id)
                .ok_or_else(|| NpcError::UnknownRace(id.clone()))?,
            Choice::Random => rng.pick(&compendium.races).ok_or(NpcError::EmptyCompendium)?,
        };
        let subrace = match &self.subrace {
            Choice::Fixed(Some(id)) => Some(
                compendium
                    .subrace(id)
                    .filter(|subrace| subrace.race == race.id)
                    .ok_or_else(|| NpcError::UnknownSubrace {
                        subrace: id.clone(),
                        race: race.id.clone(),
                    })?,
            ),
            Choice::Fixed(None) => None,
            Choice::Random => rng.pick(&compendium.subraces_of(race)).copied(),
        };
        let level = match self.level {
            Choice::Fixed(level) => level.clamp(1, i32::from(MAX_LEVEL)),
            Choice::Random => i32::from(rng.between(1, MAX_LEVEL)),
        };
        let gender = match self.gender {
            Choice::Fixed(gender) => gender,
            Choice::Random => Gender::random(&mut rng),
        };
        let alignment = match self.alignment {
            Choice::Fixed(alignment) => alignment,
            Choice::Random => Alignment::random(&mut rng),
        };

        let mut npc = Npc::assemble(
            compendium,
            Parts {
                occupation,
                race,
                subrace,
                level,
                gender,
                alignment,
                rules: self.rules,
            },
            &mut rng,
        )?;

        npc.name = match self.name {
            Some(name) => name,
            None => random_name(race, subrace, gender, &mut rng),
        };
        npc.id = self.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        npc.details = match self.details {
            DetailsChoice::Generate => Details::generate(&mut rng),
            DetailsChoice::Skip => Details::default(),
            DetailsChoice::Fixed(details) => details,
        };

        let armor = match &self.armor {
            Choice::Fixed(id) => id.as_deref().and_then(|id| compendium.armor(id)),
            Choice::Random => {
                let wearable: Vec<&Armor> = npc
                    .armor_proficiencies
                    .iter()
                    .copied()
                    .filter(|armor| !armor.is_shield())
                    .collect();
                rng.pick(&wearable).copied()
            }
        };
        let melee = pick_weapon(&self.melee, &npc, AttackKind::Melee, &mut rng);
        let ranged = pick_weapon(&self.ranged, &npc, AttackKind::Ranged, &mut rng);
        npc.equip(Loadout {
            armor,
            melee,
            ranged,
        });
        Ok(npc)
    }
}

fn pick_weapon<'a>(
    choice: &Choice<Option<String>>,
    npc: &Npc<'a>,
    kind: AttackKind,
    rng: &mut Rng,
) -> Option<&'a Action> {
    match choice {
        Choice::Fixed(id) => id.as_deref().and_then(|id| npc.compendium.weapon(id)),
        Choice::Random => {
            let candidates: Vec<&'a Action> = npc
                .weapon_proficiencies
                .iter()
                .copied()
                .filter(|weapon| weapon.weapon_type.is_weapon(kind))
                .collect();
            rng.pick(&candidates).copied()
        }
    }
}

/// First name from the subrace's list (or the race's without one) plus an
/// optional family name. An empty list falls back to the race name.
fn random_name(race: &Race, subrace: Option<&Subrace>, gender: Gender, rng: &mut Rng) -> String {
    let source: &dyn Nameable = match subrace {
        Some(subrace) => subrace,
        None => race,
    };
    let first = source
        .random_first_name(gender, rng)
        .unwrap_or(race.name.as_str())
        .to_string();
    match source.random_family_name(rng) {
        Some(family) => format!("{first} {family}"),
        None => first,
    }
}

struct Parts<'a> {
    occupation: &'a Occupation,
    race: &'a Race,
    subrace: Option<&'a Subrace>,
    level: i32,
    gender: Gender,
    alignment: Alignment,
    rules: ChallengeRules,
}

/// An assembled character. Borrows its building blocks from the compendium.
#[derive(Debug, Clone)]
pub struct Npc<'a> {
    compendium: &'a Compendium,
    rules: ChallengeRules,
    id: String,
    name: String,
    level: i32,
    gender: Gender,
    alignment: Alignment,
    occupation: &'a Occupation,
    race: &'a Race,
    subrace: Option<&'a Subrace>,
    scores: AbilityScores,
    armor_proficiencies: Vec<&'a Armor>,
    weapon_proficiencies: Vec<&'a Action>,
    languages: Vec<Language>,
    skills: Vec<Skill>,
    saves: Vec<Ability>,
    damage_resistances: Vec<DamageType>,
    condition_immunities: Vec<Condition>,
    traits: Vec<&'a Trait>,
    modifiers: ModifierStack,
    loadout: Loadout<'a>,
    details: Details,
    challenge: Challenge,
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, items: impl IntoIterator<Item = T>) {
    for item in items {
        if !list.contains(&item) {
            list.push(item);
        }
    }
}

fn push_unique_by_id<'a, T: Identified>(list: &mut Vec<&'a T>, items: Vec<&'a T>) {
    for item in items {
        if !list.iter().any(|known| known.id() == item.id()) {
            list.push(item);
        }
    }
}

impl<'a> Npc<'a> {
    fn assemble(compendium: &'a Compendium, parts: Parts<'a>, rng: &mut Rng) -> Result<Self, NpcError> {
        let Parts {
            occupation,
            race,
            subrace,
            level,
            gender,
            alignment,
            rules,
        } = parts;
        let occupation_level: Option<&LevelEntry> = occupation.level(level);
        let race_level = race.level(level);
        let subrace_level = subrace.and_then(|s| s.level(level));

        let mut scores = AbilityScores::default();
        if let Some(entry) = occupation_level {
            scores.apply(&entry.ability_modifiers);
        }
        scores.apply(&race.ability_modifiers);
        if let Some(subrace) = subrace {
            scores.apply(&subrace.ability_modifiers);
        }

        let mut armor_proficiencies = Vec::new();
        if let Some(subrace) = subrace {
            push_unique_by_id(
                &mut armor_proficiencies,
                compendium.armors_for(&subrace.armor_proficiencies),
            );
        }
        push_unique_by_id(
            &mut armor_proficiencies,
            compendium.armors_for(&occupation.armor_proficiencies),
        );
        if let Some(entry) = occupation_level {
            push_unique_by_id(
                &mut armor_proficiencies,
                compendium.armors_for(&entry.armor_proficiencies),
            );
        }

        let mut weapon_proficiencies = Vec::new();
        push_unique_by_id(
            &mut weapon_proficiencies,
            compendium.weapons_for(&race.weapon_proficiencies),
        );
        push_unique_by_id(
            &mut weapon_proficiencies,
            compendium.weapons_for(&occupation.weapon_proficiencies),
        );
        if let Some(subrace) = subrace {
            push_unique_by_id(
                &mut weapon_proficiencies,
                compendium.weapons_for(&subrace.weapon_proficiencies),
            );
        }

        let mut languages = race.languages.clone();
        let extra_languages = usize::from(race.has_feature(SpecialFeature::ExtraLanguage))
            + usize::from(subrace.is_some_and(|s| s.has_feature(SpecialFeature::ExtraLanguage)));
        for _ in 0..extra_languages {
            if let Some(language) = Language::random_excluding(rng, &languages) {
                languages.push(language);
            }
        }

        let mut skills = Vec::new();
        if let Some(entry) = occupation_level {
            push_unique(&mut skills, entry.skills.iter().copied());
        }
        push_unique(&mut skills, race.skills.iter().copied());
        if race.has_feature(SpecialFeature::SkillVersatility) {
            for _ in 0..2 {
                if let Some(skill) = Skill::random_excluding(rng, &skills) {
                    skills.push(skill);
                }
            }
        }
        skills.sort_by_key(|skill| skill.name());

        let mut damage_resistances = race.damage_resistances.clone();
        if let Some(entry) = occupation_level {
            push_unique(&mut damage_resistances, entry.damage_resistances.iter().copied());
        }
        if let Some(subrace) = subrace {
            push_unique(&mut damage_resistances, subrace.damage_resistances.iter().copied());
        }

        let trait_ids = [occupation_level, race_level, subrace_level]
            .into_iter()
            .flatten()
            .flat_map(|entry| entry.traits.iter());
        let traits = trait_ids
            .filter_map(|id| compendium.trait_entry(id))
            .collect();

        let ctx = FormulaContext {
            level,
            wis: scores.modifier(Ability::Wis),
        };
        let descriptions = race
            .challenge_modifiers
            .iter()
            .chain(occupation_level.into_iter().flat_map(|e| e.challenge_modifiers.iter()))
            .chain(subrace.into_iter().flat_map(|s| s.challenge_modifiers.iter()));
        let mut modifiers = ModifierStack::new();
        for description in descriptions {
            let modifier = ChallengeModifier::parse(description, &ctx).map_err(|source| {
                NpcError::Formula {
                    description: description.clone(),
                    source,
                }
            })?;
            modifiers.push(modifier);
        }

        let mut npc = Self {
            compendium,
            rules,
            id: String::new(),
            name: String::new(),
            level,
            gender,
            alignment,
            occupation,
            race,
            subrace,
            scores,
            armor_proficiencies,
            weapon_proficiencies,
            languages,
            skills,
            saves: occupation_level.map(|e| e.saves.clone()).unwrap_or_default(),
            damage_resistances,
            condition_immunities: occupation_level
                .map(|e| e.condition_immunities.clone())
                .unwrap_or_default(),
            traits,
            modifiers,
            loadout: Loadout::default(),
            details: Details::default(),
            challenge: Challenge::lowest(),
        };
        npc.challenge = npc.classify();
        Ok(npc)
    }

    /// Replaces the equipped armor and weapons and reclassifies.
    pub fn equip(&mut self, loadout: Loadout<'a>) {
        self.loadout = loadout;
        self.challenge = self.classify();
    }

    /// Single pass: the numbers use the lowest rank's proficiency bonus and
    /// the resulting rank is not fed back.
    fn classify(&self) -> Challenge {
        let numbers = self.combat_numbers();
        self.rules.calculate(
            numbers.hit_points,
            numbers.armor_class,
            numbers.attack_bonus,
            numbers.damage_per_round,
        )
    }

    /// The effective numbers classification was computed from: modifiers
    /// applied, attack figures at the lowest rank's proficiency bonus.
    pub fn combat_numbers(&self) -> CombatNumbers {
        let proficiency = Challenge::lowest().proficiency();
        let actions = self.actions();
        let best = |target: StatTarget, melee: i32, ranged: i32| {
            actions
                .iter()
                .map(|action| {
                    let base = if action.uses_ranged_numbers() { ranged } else { melee };
                    self.modifiers.apply(target, base)
                })
                .fold(0, i32::max)
        };
        CombatNumbers {
            hit_points: self.modifiers.apply(StatTarget::HitPoints, self.hit_points()),
            armor_class: self.modifiers.apply(StatTarget::ArmorClass, self.armor_class()),
            attack_bonus: best(
                StatTarget::AttackBonus,
                self.melee_damage_bonus() + proficiency,
                self.ranged_damage_bonus() + proficiency,
            ),
            damage_per_round: best(
                StatTarget::DamagePerRound,
                self.melee_damage_bonus(),
                self.ranged_damage_bonus(),
            ),
        }
    }

    pub fn compendium(&self) -> &'a Compendium {
        self.compendium
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// First word of the name.
    pub fn short_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn occupation(&self) -> &'a Occupation {
        self.occupation
    }

    pub fn race(&self) -> &'a Race {
        self.race
    }

    pub fn subrace(&self) -> Option<&'a Subrace> {
        self.subrace
    }

    pub fn ability_scores(&self) -> &AbilityScores {
        &self.scores
    }

    pub fn armor_proficiencies(&self) -> &[&'a Armor] {
        &self.armor_proficiencies
    }

    pub fn weapon_proficiencies(&self) -> &[&'a Action] {
        &self.weapon_proficiencies
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    pub fn saves(&self) -> &[Ability] {
        &self.saves
    }

    pub fn damage_resistances(&self) -> &[DamageType] {
        &self.damage_resistances
    }

    /// Always empty; no building block grants damage immunities.
    pub fn damage_immunities(&self) -> &[DamageType] {
        &[]
    }

    pub fn condition_immunities(&self) -> &[Condition] {
        &self.condition_immunities
    }

    pub fn traits(&self) -> &[&'a Trait] {
        &self.traits
    }

    pub fn modifiers(&self) -> &ModifierStack {
        &self.modifiers
    }

    pub fn loadout(&self) -> Loadout<'a> {
        self.loadout
    }

    pub fn armor(&self) -> Option<&'a Armor> {
        self.loadout.armor
    }

    pub fn melee_weapon(&self) -> Option<&'a Action> {
        self.loadout.melee
    }

    pub fn ranged_weapon(&self) -> Option<&'a Action> {
        self.loadout.ranged
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn challenge(&self) -> Challenge {
        self.challenge
    }

    pub fn rules(&self) -> ChallengeRules {
        self.rules
    }

    /// Proficiency bonus of the assigned rank.
    pub fn proficiency(&self) -> i32 {
        self.challenge.proficiency()
    }

    pub fn has_shield(&self) -> bool {
        self.armor_proficiencies.iter().any(|armor| armor.is_shield())
    }

    fn has_feature(&self, feature: SpecialFeature) -> bool {
        self.race.has_feature(feature) || self.subrace.is_some_and(|s| s.has_feature(feature))
    }

    /// Constitution modifier per level, plus one per level with dwarven toughness.
    pub fn hit_point_bonus(&self) -> i32 {
        let bonus = self.scores.modifier(Ability::Con).saturating_mul(self.level);
        if self.has_feature(SpecialFeature::DwarvenToughness) {
            bonus.saturating_add(self.level)
        } else {
            bonus
        }
    }

    /// `floor(level * 4.5)` plus the bonus.
    pub fn hit_points(&self) -> i32 {
        (self.level * 9 / 2).saturating_add(self.hit_point_bonus())
    }

    /// Unarmored (or shield only) is `10 + dex`.
    pub fn armor_class(&self) -> i32 {
        let dex = self.scores.modifier(Ability::Dex);
        match self.loadout.armor {
            Some(armor) if !armor.is_shield() => {
                armor.armor_class(dex, self.scores.modifier(Ability::Con))
            }
            _ => dex.saturating_add(10),
        }
    }

    /// Strength unless dexterity's modifier is higher.
    pub fn melee_ability(&self) -> Ability {
        if self.scores.modifier(Ability::Str) >= self.scores.modifier(Ability::Dex) {
            Ability::Str
        } else {
            Ability::Dex
        }
    }

    pub fn melee_attack_bonus(&self) -> i32 {
        self.melee_damage_bonus() + self.proficiency()
    }

    pub fn melee_damage_bonus(&self) -> i32 {
        self.scores.modifier(self.melee_ability())
    }

    pub fn ranged_attack_bonus(&self) -> i32 {
        self.ranged_damage_bonus() + self.proficiency()
    }

    pub fn ranged_damage_bonus(&self) -> i32 {
        self.scores.modifier(Ability::Dex)
    }

    pub fn speed(&self) -> i32 {
        30 + self.race.speed + self.subrace.map_or(0, |s| s.speed)
    }

    pub fn darkvision(&self) -> u32 {
        self.race.darkvision + self.subrace.map_or(0, |s| s.darkvision)
    }

    pub fn truesight(&self) -> u32 {
        self.occupation
            .level(self.level)
            .and_then(|entry| entry.truesight)
            .unwrap_or(0)
    }

    pub fn passive_perception(&self) -> i32 {
        let base = 10 + self.scores.modifier(Ability::Wis);
        if self.skills.contains(&Skill::Perception) {
            base + self.proficiency()
        } else {
            base
        }
    }

    /// The level title, or the occupation title when no level data names one.
    pub fn occupation_title(&self) -> &'a str {
        self.occupation.title_at(self.level)
    }

    /// Subrace actions, a shield bash when proficient with shields, then
    /// the equipped melee and ranged weapons.
    pub fn actions(&self) -> Vec<Cow<'a, Action>> {
        let mut actions: Vec<Cow<'a, Action>> = self
            .subrace
            .map(|subrace| self.compendium.actions_for(&subrace.actions))
            .unwrap_or_default()
            .into_iter()
            .map(Cow::Borrowed)
            .collect();
        if self.has_shield() {
            actions.push(Cow::Owned(Action::shield_bash()));
        }
        actions.extend(self.loadout.melee.map(Cow::Borrowed));
        actions.extend(self.loadout.ranged.map(Cow::Borrowed));
        actions
    }

    pub fn save_dc(&self, ability: Ability) -> i32 {
        8 + self.to_hit(ability)
    }

    pub fn to_hit(&self, ability: Ability) -> i32 {
        self.scores.modifier(ability) + self.proficiency()
    }
}
