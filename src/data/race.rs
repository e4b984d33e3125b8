//! Race and subrace records. Every subrace names its parent race by id.

use serde::{Deserialize, Serialize};

use crate::data::items::DamageType;
use crate::data::lenient;
use crate::data::level_data::{LevelEntry, LevelTable};
use crate::data::occupation::Bounded;
use crate::data::proficiency::{ArmorTag, ProficiencyRef, WeaponTag};
use crate::npc::abilities::AbilityModifier;
use crate::npc::descriptors::{Gender, Language, Size, Skill, SpecialFeature};
use crate::rng::Rng;
use crate::rules::challenge::Challenge;

/// Records that supply character names.
pub trait Nameable {
    fn first_names(&self, gender: Gender) -> &[String];

    fn family_names(&self) -> &[String];

    fn random_first_name<'a>(&'a self, gender: Gender, rng: &mut Rng) -> Option<&'a str> {
        rng.pick(self.first_names(gender)).map(String::as_str)
    }

    fn random_family_name<'a>(&'a self, rng: &mut Rng) -> Option<&'a str> {
        rng.pick(self.family_names()).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::list")]
    pub ability_modifiers: Vec<AbilityModifier>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub damage_resistances: Vec<DamageType>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub languages: Vec<Language>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub size: Size,
    #[serde(default, deserialize_with = "lenient::list")]
    pub skills: Vec<Skill>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub special_features: Vec<SpecialFeature>,
    /// Subrace ids.
    #[serde(default)]
    pub subraces: Vec<String>,
    #[serde(default)]
    pub weapon_proficiencies: Vec<ProficiencyRef<WeaponTag>>,
    #[serde(default)]
    pub family_names: Vec<String>,
    #[serde(default)]
    pub female_names: Vec<String>,
    #[serde(default)]
    pub male_names: Vec<String>,
    #[serde(default)]
    pub challenge_modifiers: Vec<String>,
    #[serde(default)]
    pub darkvision: u32,
    /// Added to the base walking speed of 30 ft.
    #[serde(default)]
    pub speed: i32,
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

impl Race {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            ability_modifiers: Vec::new(),
            damage_resistances: Vec::new(),
            languages: Vec::new(),
            size: Size::default(),
            skills: Vec::new(),
            special_features: Vec::new(),
            subraces: Vec::new(),
            weapon_proficiencies: Vec::new(),
            family_names: Vec::new(),
            female_names: Vec::new(),
            male_names: Vec::new(),
            challenge_modifiers: Vec::new(),
            darkvision: 0,
            speed: 0,
            levels: LevelTable::new(),
            low_challenge: None,
            high_challenge: None,
        }
    }

    pub fn level(&self, level: i32) -> Option<&LevelEntry> {
        self.levels.get(level)
    }

    pub fn has_feature(&self, feature: SpecialFeature) -> bool {
        self.special_features.contains(&feature)
    }
}

impl Bounded for Race {
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

impl Nameable for Race {
    fn first_names(&self, gender: Gender) -> &[String] {
        match gender {
            Gender::Female => &self.female_names,
            Gender::Male => &self.male_names,
        }
    }

    fn family_names(&self) -> &[String] {
        &self.family_names
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subrace {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Parent race id.
    pub race: String,
    #[serde(default, deserialize_with = "lenient::list")]
    pub ability_modifiers: Vec<AbilityModifier>,
    /// Action ids granted to every member.
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub armor_proficiencies: Vec<ProficiencyRef<ArmorTag>>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub damage_resistances: Vec<DamageType>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub special_features: Vec<SpecialFeature>,
    #[serde(default)]
    pub weapon_proficiencies: Vec<ProficiencyRef<WeaponTag>>,
    #[serde(default)]
    pub family_names: Vec<String>,
    #[serde(default)]
    pub female_names: Vec<String>,
    #[serde(default)]
    pub male_names: Vec<String>,
    #[serde(default)]
    pub challenge_modifiers: Vec<String>,
    #[serde(default)]
    pub darkvision: u32,
    #[serde(default)]
    pub speed: i32,
    #[serde(default)]
    pub levels: LevelTable,
}

impl Subrace {
    pub fn new(id: &str, name: &str, race: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            race: race.to_string(),
            ability_modifiers: Vec::new(),
            actions: Vec::new(),
            armor_proficiencies: Vec::new(),
            damage_resistances: Vec::new(),
            special_features: Vec::new(),
            weapon_proficiencies: Vec::new(),
            family_names: Vec::new(),
            female_names: Vec::new(),
            male_names: Vec::new(),
            challenge_modifiers: Vec::new(),
            darkvision: 0,
            speed: 0,
            levels: LevelTable::new(),
        }
    }

    pub fn level(&self, level: i32) -> Option<&LevelEntry> {
        self.levels.get(level)
    }

    pub fn has_feature(&self, feature: SpecialFeature) -> bool {
        self.special_features.contains(&feature)
    }
}

impl Nameable for Subrace {
    fn first_names(&self, gender: Gender) -> &[String] {
        match gender {
            Gender::Female => &self.female_names,
            Gender::Male => &self.male_names,
        }
    }

    fn family_names(&self) -> &[String] {
        &self.family_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::npc::abilities::Ability;

    #[test]
    fn race_record_tolerates_unknown_entries() {
        let race: Race = serde_json::from_str(
            r#"{
                "id": "dwarf",
                "name": "Dwarf",
                "ability_modifiers": ["con 2", "luck 9"],
                "languages": ["common", "dwarvish", "binary"],
                "size": "colossal",
                "special_features": ["toughness", "flight"],
                "subraces": ["hillDwarf"],
                "darkvision": 60,
                "speed": -5
            }"#,
        )
        .unwrap();
        assert_eq!(race.ability_modifiers, vec![AbilityModifier::new(Ability::Con, 2)]);
        assert_eq!(race.languages, vec![Language::Common, Language::Dwarvish]);
        assert_eq!(race.size, Size::Medium);
        assert!(race.has_feature(SpecialFeature::DwarvenToughness));
        assert_eq!(race.special_features.len(), 1);
        assert_eq!(race.speed, -5);
    }

    #[test]
    fn names_come_from_the_gendered_list() {
        let mut race = Race::new("elf", "Elf");
        race.female_names = vec!["Adrie".to_string()];
        let mut rng = Rng::new(1);
        assert_eq!(race.random_first_name(Gender::Female, &mut rng), Some("Adrie"));
        assert_eq!(race.random_first_name(Gender::Male, &mut rng), None);
        assert_eq!(race.random_family_name(&mut rng), None);
    }
}
