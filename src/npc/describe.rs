//! Text rendering of an assembled character: stat lines, action text,
//! `$token` values, the plain-text export and the persisted record.

use serde::{Deserialize, Serialize};

use crate::data::compendium::Compendium;
use crate::data::items::{Action, AttackKind, WeaponType};
use crate::dice::{Die, DieFace};
use crate::npc::abilities::{signed, Ability};
use crate::npc::descriptors::{Alignment, Gender};
use crate::npc::details::Details;
use crate::npc::{DetailsChoice, Npc, NpcBuilder, NpcError};
use crate::rules::challenge::{Challenge, ChallengeRules};
use crate::rules::StatTarget;
use crate::template::{expand, Placeholders, Token};

/// Breath weapons start at 2d6 and grow with level.
const BREATH_WEAPON_DIE: Die = Die::new(DieFace::D6, 2);

pub const USER_ID_ENV: &str = "NPCGEN_USER_ID";

/// Supplies the owner recorded on persisted characters.
pub trait Identity {
    fn current_user_id(&self) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(pub Option<String>);

impl Identity for StaticIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Reads the owner from `NPCGEN_USER_ID`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvIdentity;

impl Identity for EnvIdentity {
    fn current_user_id(&self) -> Option<String> {
        std::env::var(USER_ID_ENV)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

/// A saved character: fixed choices plus the generated roleplaying text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcRecord {
    pub alignment: Alignment,
    pub appearance: String,
    pub bond: String,
    pub challenge: Challenge,
    pub flaw: String,
    pub gender: Gender,
    pub id: String,
    pub level: i32,
    pub mannerism: String,
    #[serde(default)]
    pub melee: Option<String>,
    pub name: String,
    pub occupation: String,
    pub race: String,
    #[serde(default)]
    pub ranged: Option<String>,
    #[serde(default)]
    pub subrace: Option<String>,
    pub talent: String,
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub armor: Option<String>,
}

/// FNV-1a, so a record always rebuilds with the same random extras.
fn seed_for(id: &str) -> u64 {
    id.bytes().fold(0xcbf29ce484222325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x100000001b3)
    })
}

fn ordinal(n: i32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

fn join_or_none<I>(items: I) -> String
where
    I: IntoIterator,
    I::Item: ToString,
{
    let parts: Vec<String> = items.into_iter().map(|item| item.to_string()).collect();
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(", ")
    }
}

/// `"(1d6 + 2)"`, `"(1d6 - 1)"` or `"(1d6)"`.
fn dice_with_bonus(die: Die, bonus: i32) -> String {
    match bonus {
        0 => format!("({die})"),
        b if b < 0 => format!("({die} - {})", -b),
        b => format!("({die} + {b})"),
    }
}

fn hit_text(action: &Action, bonus: i32) -> String {
    let damage_type = action
        .damage_type
        .map(|kind| format!(" {kind}"))
        .unwrap_or_default();
    let mut text = match action.damage_die {
        Some(die) => format!(
            "Hit: {} {}{damage_type} damage.",
            die.adding(bonus),
            dice_with_bonus(die, bonus)
        ),
        None => format!("Hit: {}{damage_type} damage.", 1 + bonus),
    };
    if action.versatile {
        if let Some(die) = action.damage_die {
            let two_handed = die.next();
            text.push_str(&format!(
                " If wielded with two hands, this attack deals {} {}{damage_type} damage instead.",
                two_handed.adding(bonus),
                dice_with_bonus(two_handed, bonus)
            ));
        }
    }
    text
}

fn range_text(action: &Action) -> String {
    action
        .range
        .map(|range| range.to_string())
        .unwrap_or_else(|| "5".to_string())
}

/// Values for the action-only tokens; everything else comes from the character.
struct ActionContext<'n, 'a> {
    npc: &'n Npc<'a>,
    action: &'n Action,
}

impl Placeholders for ActionContext<'_, '_> {
    fn value(&self, token: Token) -> Option<String> {
        match token {
            Token::AreaOfEffect => self.action.area_of_effect.as_ref().map(ToString::to_string),
            Token::BreathWeaponDamage => {
                let level = u8::try_from(self.npc.level()).unwrap_or(u8::MAX);
                Some(BREATH_WEAPON_DIE.progressive(level).to_string())
            }
            Token::DamageType => self.action.damage_type.map(|kind| kind.to_string()),
            other => self.npc.value(other),
        }
    }
}

impl Placeholders for Npc<'_> {
    fn value(&self, token: Token) -> Option<String> {
        let value = match token {
            Token::Name => self.name().to_string(),
            Token::ShortName => self.short_name().to_string(),
            Token::PossessiveName => format!("{}'s", self.short_name()),
            Token::AlternatePronoun => self.gender().alternate_pronoun().to_string(),
            Token::Pronoun => self.gender().pronoun().to_string(),
            Token::CapsPronoun => self.gender().caps_pronoun().to_string(),
            Token::Level => self.level().to_string(),
            Token::Spell(ability) => self.spell_description(ability),
            Token::Save(ability) => {
                format!("{} {} saving throw", self.save_dc(ability), ability.title())
            }
            Token::MeleeAttackMod => signed(self.melee_attack_bonus()),
            Token::MeleeDamageMod => self.melee_damage_bonus().to_string(),
            Token::RangedAttackMod => signed(self.ranged_attack_bonus()),
            Token::RangedDamageMod => self.ranged_damage_bonus().to_string(),
            // only meaningful inside an action description
            Token::AreaOfEffect | Token::BreathWeaponDamage | Token::DamageType => return None,
        };
        Some(value)
    }
}

impl<'a> Npc<'a> {
    /// Expands `$tokens` in stored text against this character.
    pub fn expand(&self, text: &str) -> String {
        expand(text, self)
    }

    pub fn armor_class_description(&self) -> String {
        let armor_class = self.modifiers().apply(StatTarget::ArmorClass, self.armor_class());
        match self.armor() {
            Some(armor) if !armor.is_shield() => {
                if self.has_shield() {
                    format!("{armor_class} ({}, shield)", armor.name)
                } else {
                    format!("{armor_class} ({})", armor.name)
                }
            }
            _ => armor_class.to_string(),
        }
    }

    pub fn hit_points_description(&self) -> String {
        let hit_points = self.modifiers().apply(StatTarget::HitPoints, self.hit_points());
        let bonus = self.hit_point_bonus();
        let level = self.level();
        match bonus {
            0 => format!("{hit_points} ({level}d8)"),
            b if b < 0 => format!("{hit_points} ({level}d8 - {})", -b),
            b => format!("{hit_points} ({level}d8 + {b})"),
        }
    }

    pub fn speed_description(&self) -> String {
        format!("{} ft.", self.speed())
    }

    pub fn ability_description(&self, ability: Ability) -> String {
        self.ability_scores().describe(ability)
    }

    pub fn saving_throws_description(&self) -> String {
        join_or_none(
            self.saves()
                .iter()
                .map(|ability| format!("{} {}", ability.short_title(), signed(self.to_hit(*ability)))),
        )
    }

    pub fn skills_description(&self) -> String {
        join_or_none(
            self.skills()
                .iter()
                .map(|skill| format!("{} {}", skill.name(), signed(self.to_hit(skill.ability())))),
        )
    }

    pub fn damage_resistances_description(&self) -> String {
        join_or_none(self.damage_resistances())
    }

    pub fn damage_immunities_description(&self) -> String {
        join_or_none(self.damage_immunities())
    }

    pub fn condition_immunities_description(&self) -> String {
        join_or_none(self.condition_immunities())
    }

    pub fn languages_description(&self) -> String {
        join_or_none(self.languages().iter().map(|language| language.title()))
    }

    pub fn senses_description(&self) -> String {
        let mut senses = Vec::new();
        if self.truesight() > 0 {
            senses.push(format!("truesight {} ft.", self.truesight()));
        }
        if self.darkvision() > 0 {
            senses.push(format!("darkvision {} ft.", self.darkvision()));
        }
        senses.push(format!("passive Perception {}", self.passive_perception()));
        senses.join(", ")
    }

    pub fn challenge_description(&self) -> String {
        let challenge = self.challenge();
        format!("{} ({} xp)", challenge.rating(), challenge.xp_value())
    }

    fn kind_description(&self) -> String {
        match self.subrace().filter(|subrace| !subrace.name.is_empty()) {
            Some(subrace) => format!("humanoid ({} {})", subrace.name, self.race().name),
            None => format!("humanoid ({})", self.race().name),
        }
    }

    pub fn details_description(&self) -> String {
        format!(
            "{} {}, {}, {}",
            self.race().size.title(),
            self.kind_description(),
            self.gender().descriptor(),
            self.alignment().descriptor()
        )
    }

    pub fn short_description(&self) -> String {
        format!(
            "{} {} {}, {}",
            ordinal(self.level()),
            self.kind_description(),
            self.occupation().title,
            self.gender().descriptor()
        )
    }

    pub fn spell_description(&self, ability: Ability) -> String {
        format!(
            "(spell save DC {}, {} to hit with spell attacks)",
            self.save_dc(ability),
            signed(self.to_hit(ability))
        )
    }

    /// Rules text for one action, tokens expanded. `None` when a non-weapon
    /// action has no stored description.
    pub fn action_description(&self, action: &Action) -> Option<String> {
        let reach = action.reach_or_default();
        let text = match (action.weapon_type, action.weapon_type.attack_kind()) {
            (WeaponType::Natural, _) | (_, Some(AttackKind::Melee)) => self.melee_text(action, reach),
            (_, Some(AttackKind::Ranged)) => format!(
                "Ranged Weapon Attack: $rangedAttackMod to hit, range {} ft., one target. {}",
                range_text(action),
                hit_text(action, self.ranged_damage_bonus())
            ),
            (_, Some(AttackKind::Thrown)) => format!(
                "Melee or Ranged Weapon Attack: $meleeAttackMod to hit, reach {reach} ft. or range {} ft., one target. {}",
                range_text(action),
                hit_text(action, self.melee_damage_bonus())
            ),
            (_, None) => action.description.clone()?,
        };
        Some(expand(&text, &ActionContext { npc: self, action }))
    }

    fn melee_text(&self, action: &Action, reach: u32) -> String {
        format!(
            "Melee Weapon Attack: $meleeAttackMod to hit, reach {reach} ft., one target. {}",
            hit_text(action, self.melee_damage_bonus())
        )
    }

    /// `Title. text` blocks separated by blank lines.
    pub fn traits_description(&self) -> String {
        self.traits()
            .iter()
            .map(|entry| format!("{}. {}", entry.title, self.expand(&entry.description)))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn actions_description(&self) -> String {
        self.actions()
            .iter()
            .filter_map(|action| {
                self.action_description(action)
                    .map(|text| format!("{}. {text}", action.name))
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// The full plain-text stat block.
    pub fn export_text(&self) -> String {
        let scores: Vec<String> = Ability::ALL
            .iter()
            .map(|ability| format!("{} {}", ability.short_title().to_uppercase(), self.ability_description(*ability)))
            .collect();
        let details = self.details();
        let mut out = String::new();
        out.push_str("NPC from npcgen:\n");
        out.push_str(&format!("{}\n", self.name()));
        out.push_str(&format!("{}\n", self.details_description()));
        out.push_str(&format!("Armor Class {}\n", self.armor_class_description()));
        out.push_str(&format!("Hit Points {}\n", self.hit_points_description()));
        out.push_str(&format!("Speed {}\n", self.speed_description()));
        for line in scores {
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&format!("Saving Throws {}\n", self.saving_throws_description()));
        out.push_str(&format!("Skills {}\n", self.skills_description()));
        out.push_str(&format!("Damage Resistances {}\n", self.damage_resistances_description()));
        out.push_str(&format!("Damage Immunities {}\n", self.damage_immunities_description()));
        out.push_str(&format!(
            "Condition Immunities {}\n",
            self.condition_immunities_description()
        ));
        out.push_str(&format!("Senses {}\n", self.senses_description()));
        out.push_str(&format!("Languages {}\n", self.languages_description()));
        out.push_str(&format!("Challenge {}\n", self.challenge_description()));
        out.push_str(&format!("Occupation {}\n", self.occupation_title()));

        out.push_str("\nROLEPLAYING\n");
        let roleplaying = [
            ("Mannerism", &details.mannerism),
            ("Talent", &details.talent),
            ("Bond", &details.bond),
            ("Flaw", &details.flaw),
            ("Appearance", &details.appearance),
        ];
        let roleplaying: Vec<String> = roleplaying
            .iter()
            .map(|(title, text)| format!("{title}. {}", self.expand(text)))
            .collect();
        out.push_str(&roleplaying.join("\n\n"));

        out.push_str("\n\nTRAITS\n");
        out.push_str(&self.traits_description());
        out.push_str("\n\nACTIONS\n");
        out.push_str(&self.actions_description());
        out.push('\n');
        out
    }

    /// Snapshot for persistence, owned by the identity's current user.
    pub fn to_record(&self, identity: &dyn Identity) -> Result<NpcRecord, NpcError> {
        let uid = identity
            .current_user_id()
            .ok_or(NpcError::MissingIdentity)?;
        let details = self.details();
        Ok(NpcRecord {
            alignment: self.alignment(),
            appearance: details.appearance.clone(),
            bond: details.bond.clone(),
            challenge: self.challenge(),
            flaw: details.flaw.clone(),
            gender: self.gender(),
            id: self.id().to_string(),
            level: self.level(),
            mannerism: details.mannerism.clone(),
            melee: self.melee_weapon().map(|weapon| weapon.id.clone()),
            name: self.name().to_string(),
            occupation: self.occupation().id.clone(),
            race: self.race().id.clone(),
            ranged: self.ranged_weapon().map(|weapon| weapon.id.clone()),
            subrace: self.subrace().map(|subrace| subrace.id.clone()),
            talent: details.talent.clone(),
            uid,
            armor: self.armor().map(|armor| armor.id.clone()),
        })
    }

    /// Rebuilds a saved character. The challenge is recomputed from the
    /// current compendium rather than read back from the record.
    pub fn from_record(
        compendium: &'a Compendium,
        record: &NpcRecord,
        rules: ChallengeRules,
    ) -> Result<Npc<'a>, NpcError> {
        NpcBuilder::new()
            .id(&record.id)
            .name(&record.name)
            .occupation(&record.occupation)
            .race(&record.race)
            .subrace(record.subrace.as_deref())
            .level(record.level)
            .gender(record.gender)
            .alignment(record.alignment)
            .armor(record.armor.as_deref())
            .melee(record.melee.as_deref())
            .ranged(record.ranged.as_deref())
            .details(DetailsChoice::Fixed(Details {
                appearance: record.appearance.clone(),
                bond: record.bond.clone(),
                flaw: record.flaw.clone(),
                mannerism: record.mannerism.clone(),
                talent: record.talent.clone(),
            }))
            .rules(rules)
            .seed(seed_for(&record.id))
            .build(compendium)
    }
}
