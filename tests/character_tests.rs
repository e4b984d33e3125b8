mod common;

use common::{fixture_compendium, minimal_compendium};
use npcgen::data::items::{DamageType, SHIELD_BASH_ID};
use npcgen::npc::abilities::{Ability, AbilityModifier};
use npcgen::npc::descriptors::{Alignment, Gender, Language};
use npcgen::npc::{DetailsChoice, NpcBuilder, NpcError};
use npcgen::rules::{Challenge, StatTarget};

fn guard(level: i32) -> NpcBuilder {
    NpcBuilder::new()
        .occupation("guard")
        .race("human")
        .subrace(None)
        .level(level)
        .gender(Gender::Female)
        .alignment(Alignment::LawfulGood)
        .seed(42)
}

#[test]
fn unremarkable_commoner_is_challenge_zero() {
    let compendium = minimal_compendium();
    let npc = NpcBuilder::new()
        .occupation("commoner")
        .race("human")
        .level(1)
        .seed(1)
        .build(&compendium)
        .unwrap();

    for ability in Ability::ALL {
        assert_eq!(npc.ability_scores().score(ability), 10, "{ability}");
    }
    assert_eq!(npc.hit_points(), 4);
    assert_eq!(npc.armor_class(), 10);
    assert_eq!(npc.speed(), 30);
    assert_eq!(npc.melee_weapon().map(|w| w.id.as_str()), Some("club"));
    assert_eq!(npc.ranged_weapon(), None);
    assert_eq!(npc.armor(), None);
    assert_eq!(npc.melee_attack_bonus(), 2);
    assert_eq!(npc.challenge(), Challenge::Zero);
    assert_eq!(npc.proficiency(), 2);
    assert_eq!(npc.languages(), &[Language::Common]);
}

#[test]
fn extreme_constitution_saturates_hit_points() {
    let mut compendium = minimal_compendium();
    compendium.races[0]
        .ability_modifiers
        .push(AbilityModifier::new(Ability::Con, i32::MAX));
    let npc = NpcBuilder::new()
        .occupation("commoner")
        .race("human")
        .level(20)
        .details(DetailsChoice::Skip)
        .seed(3)
        .build(&compendium)
        .unwrap();

    assert_eq!(npc.hit_point_bonus(), i32::MAX);
    assert_eq!(npc.hit_points(), i32::MAX);
    assert_eq!(npc.challenge(), Challenge::Zero);
}

#[test]
fn random_choices_draw_from_the_compendium() {
    let compendium = fixture_compendium();
    for seed in 0..25 {
        let npc = NpcBuilder::new().seed(seed).build(&compendium).unwrap();
        assert!(compendium.occupation(&npc.occupation().id).is_some());
        assert!(compendium.race(&npc.race().id).is_some());
        assert!((1..=20).contains(&npc.level()));
        if let Some(subrace) = npc.subrace() {
            assert_eq!(subrace.race, npc.race().id);
        }
        assert!(!npc.name().is_empty());
        assert!(!npc.id().is_empty());
    }
}

#[test]
fn same_seed_builds_the_same_character() {
    let compendium = fixture_compendium();
    let first = NpcBuilder::new().seed(7).build(&compendium).unwrap();
    let second = NpcBuilder::new().seed(7).build(&compendium).unwrap();
    assert_eq!(first.name(), second.name());
    assert_eq!(first.level(), second.level());
    assert_eq!(first.occupation().id, second.occupation().id);
    assert_eq!(first.race().id, second.race().id);
    assert_eq!(first.challenge(), second.challenge());
    assert_eq!(first.details(), second.details());
}

#[test]
fn level_data_falls_back_to_nearest_lower_entry() {
    let compendium = fixture_compendium();
    let npc = guard(12).build(&compendium).unwrap();

    assert_eq!(npc.occupation_title(), "Captain");
    assert_eq!(npc.ability_scores().score(Ability::Str), 15);
    assert_eq!(npc.ability_scores().score(Ability::Con), 14);
    assert_eq!(npc.saves(), &[Ability::Str, Ability::Con]);
    // 12 * 4.5 plus +2 constitution per level.
    assert_eq!(npc.hit_points(), 78);
    assert_eq!(npc.combat_numbers().hit_points, 90);
    assert_eq!(npc.modifiers().apply(StatTarget::HitPoints, 0), 12);
}

#[test]
fn armor_proficiencies_merge_occupation_and_level_entry() {
    let compendium = fixture_compendium();
    let low = guard(1).build(&compendium).unwrap();
    let ids: Vec<&str> = low.armor_proficiencies().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["leather", "chainShirt", "shield"]);

    let high = guard(10).build(&compendium).unwrap();
    let ids: Vec<&str> = high.armor_proficiencies().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["leather", "chainShirt", "shield", "chainMail"]);
}

#[test]
fn random_armor_is_never_a_shield() {
    let compendium = fixture_compendium();
    for seed in 0..20 {
        let npc = guard(10).seed(seed).build(&compendium).unwrap();
        assert!(npc.armor().map_or(true, |armor| !armor.is_shield()));
    }
}

#[test]
fn fixed_equipment_sets_armor_class_and_attacks() {
    let compendium = fixture_compendium();
    let npc = guard(10)
        .armor(Some("chainMail"))
        .melee(Some("spear"))
        .ranged(Some("shortbow"))
        .build(&compendium)
        .unwrap();

    assert_eq!(npc.armor_class(), 16);
    let actions: Vec<String> = npc.actions().iter().map(|a| a.id.clone()).collect();
    assert_eq!(actions, vec![SHIELD_BASH_ID, "spear", "shortbow"]);
}

#[test]
fn unequipped_character_fights_with_shield_bash_only() {
    let compendium = fixture_compendium();
    let npc = guard(1).unequipped().build(&compendium).unwrap();
    assert_eq!(npc.armor(), None);
    assert_eq!(npc.melee_weapon(), None);
    assert_eq!(npc.ranged_weapon(), None);
    let actions = npc.actions();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].id, SHIELD_BASH_ID);
}

#[test]
fn extra_language_feature_adds_one_language() {
    let compendium = fixture_compendium();
    let npc = guard(1).build(&compendium).unwrap();
    assert_eq!(npc.languages().len(), 2);
    assert_eq!(npc.languages()[0], Language::Common);
    assert_ne!(npc.languages()[1], Language::Common);
}

#[test]
fn subrace_contributes_actions_and_resistances() {
    let compendium = fixture_compendium();
    let npc = NpcBuilder::new()
        .occupation("acolyte")
        .race("dragonborn")
        .subrace(Some("redDragonborn"))
        .level(6)
        .details(DetailsChoice::Skip)
        .seed(3)
        .build(&compendium)
        .unwrap();

    assert_eq!(npc.actions()[0].id, "fireBreath");
    assert_eq!(npc.damage_resistances(), &[DamageType::Fire]);
    assert!(["Akra", "Arjhan"].contains(&npc.name()));
    let breath = npc
        .action_description(&npc.actions()[0])
        .expect("breath weapon should describe itself");
    assert!(breath.contains("15-foot cone"), "{breath}");
    assert!(breath.contains("3d6 fire"), "{breath}");
}

#[test]
fn subrace_must_belong_to_the_race() {
    let compendium = fixture_compendium();
    let err = NpcBuilder::new()
        .occupation("guard")
        .race("human")
        .subrace(Some("redDragonborn"))
        .build(&compendium)
        .unwrap_err();
    assert!(matches!(err, NpcError::UnknownSubrace { .. }));
}

#[test]
fn unknown_race_is_reported() {
    let compendium = fixture_compendium();
    let err = NpcBuilder::new().race("elf").build(&compendium).unwrap_err();
    assert!(matches!(err, NpcError::UnknownRace(ref id) if id == "elf"));
}

#[test]
fn export_text_has_every_section() {
    let compendium = fixture_compendium();
    let npc = guard(1).name("Adela Vell").build(&compendium).unwrap();
    let text = npc.export_text();
    assert!(text.starts_with("NPC from npcgen:\nAdela Vell\n"));
    for section in ["\nROLEPLAYING\n", "\n\nTRAITS\n", "\n\nACTIONS\n"] {
        assert!(text.contains(section), "missing {section:?}");
    }
    assert!(text.contains("Watchful. Adela has advantage"));
    assert!(text.contains("Occupation Watchman"));
}
