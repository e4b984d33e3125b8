#![allow(dead_code)]

use npcgen::data::compendium::Compendium;
use serde_json::json;

/// A commoner with one 1d6 club and an unremarkable human: every ability at
/// ten, no armor, speed 30.
pub fn minimal_compendium() -> Compendium {
    serde_json::from_value(json!({
        "actions": [],
        "armors": [],
        "occupations": [{
            "id": "commoner",
            "title": "Commoner",
            "weapon_proficiencies": ["club"]
        }],
        "races": [{
            "id": "human",
            "name": "Human",
            "languages": ["common"],
            "female_names": ["Mara"],
            "male_names": ["Tomas"]
        }],
        "subraces": [],
        "traits": [],
        "weapons": [{
            "id": "club",
            "name": "Club",
            "damage_die": "1d6",
            "damage_type": "bludgeoning",
            "weapon_type": "simple_melee"
        }]
    }))
    .expect("minimal compendium should decode")
}

/// Two occupations, two races (one with a subrace), armor of every category
/// and weapons of every kind.
pub fn fixture_compendium() -> Compendium {
    serde_json::from_value(json!({
        "actions": [{
            "id": "fireBreath",
            "name": "Fire Breath",
            "description": "$shortName exhales fire in a $areaOfEffect, $dexSave, $breathWeaponDamage $damageType damage.",
            "damage_type": "fire",
            "area_of_effect": {"area": "15-foot", "type": "cone"},
            "save": "Dex"
        }],
        "armors": [
            {"id": "leather", "name": "Leather", "base_ac": 11, "type": "light"},
            {"id": "chainShirt", "name": "Chain Shirt", "base_ac": 13, "type": "medium"},
            {"id": "chainMail", "name": "Chain Mail", "base_ac": 16, "type": "heavy"},
            {"id": "shield", "name": "Shield", "base_ac": 2, "type": "shield"}
        ],
        "occupations": [
            {
                "id": "guard",
                "title": "Guard",
                "armor_proficiencies": ["light", "medium", "shield"],
                "weapon_proficiencies": ["simple"],
                "levels": {
                    "1": {
                        "ability_modifiers": ["str 2", "con 1"],
                        "saves": ["Str"],
                        "skills": ["Perception"],
                        "traits": ["watchful"],
                        "title": "Watchman"
                    },
                    "10": {
                        "ability_modifiers": ["str 4", "con 3"],
                        "armor_proficiencies": ["heavy"],
                        "saves": ["Str", "Con"],
                        "skills": ["Perception", "Athletics"],
                        "traits": ["watchful"],
                        "challenge_modifiers": ["hitPoints +level"],
                        "title": "Captain"
                    }
                }
            },
            {
                "id": "acolyte",
                "title": "Acolyte",
                "weapon_proficiencies": ["club"],
                "levels": {
                    "1": {"ability_modifiers": ["wis 2"], "skills": ["Religion"]}
                }
            }
        ],
        "races": [
            {
                "id": "human",
                "name": "Human",
                "ability_modifiers": ["str 1", "dex 1", "con 1", "int 1", "wis 1", "cha 1"],
                "languages": ["common"],
                "special_features": ["extraLanguage"],
                "female_names": ["Adela"],
                "male_names": ["Aldric"],
                "family_names": ["Vell"]
            },
            {
                "id": "dragonborn",
                "name": "Dragonborn",
                "ability_modifiers": ["str 2", "cha 1"],
                "languages": ["common", "draconic"],
                "subraces": ["redDragonborn"]
            }
        ],
        "subraces": [{
            "id": "redDragonborn",
            "name": "Red",
            "race": "dragonborn",
            "actions": ["fireBreath"],
            "damage_resistances": ["fire"],
            "female_names": ["Akra"],
            "male_names": ["Arjhan"]
        }],
        "traits": [{
            "id": "watchful",
            "title": "Watchful",
            "description": "$shortName has advantage on sight-based Perception checks."
        }],
        "weapons": [
            {"id": "club", "name": "Club", "damage_die": "1d4", "damage_type": "bludgeoning", "weapon_type": "simple_melee"},
            {"id": "spear", "name": "Spear", "damage_die": "1d6", "damage_type": "piercing", "weapon_type": "simple_melee", "versatile": true},
            {"id": "shortbow", "name": "Shortbow", "damage_die": "1d6", "damage_type": "piercing", "weapon_type": "simple_ranged", "range": {"short": 80, "long": 320}},
            {"id": "longsword", "name": "Longsword", "damage_die": "1d8", "damage_type": "slashing", "weapon_type": "martial_melee", "versatile": true}
        ]
    }))
    .expect("fixture compendium should decode")
}

/// Snapshot document holding every collection of `compendium`.
pub fn snapshot_of(compendium: &Compendium) -> serde_json::Value {
    serde_json::to_value(compendium).expect("compendium should serialize")
}
