//! `$token` substitution for stored trait, action and roleplaying text.
//!
//! Expansion is a single left-to-right pass. At each `$` the longest
//! recognised token is replaced by the value its context supplies; text
//! that is not a token, or a token the context cannot supply, is copied
//! verbatim. Substituted values are never rescanned.

use std::collections::HashMap;

use crate::npc::abilities::Ability;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Name,
    ShortName,
    PossessiveName,
    AlternatePronoun,
    Pronoun,
    CapsPronoun,
    Level,
    Spell(Ability),
    Save(Ability),
    MeleeAttackMod,
    MeleeDamageMod,
    RangedAttackMod,
    RangedDamageMod,
    /// Action-only. Supplied while expanding an action's own description;
    /// character-wide text keeps it verbatim.
    AreaOfEffect,
    /// Action-only, like `AreaOfEffect`.
    BreathWeaponDamage,
    /// Action-only, like `AreaOfEffect`.
    DamageType,
}

impl Token {
    pub const ALL: [Token; 26] = [
        Token::Name,
        Token::ShortName,
        Token::PossessiveName,
        Token::AlternatePronoun,
        Token::Pronoun,
        Token::CapsPronoun,
        Token::Level,
        Token::Spell(Ability::Str),
        Token::Spell(Ability::Dex),
        Token::Spell(Ability::Con),
        Token::Spell(Ability::Int),
        Token::Spell(Ability::Wis),
        Token::Spell(Ability::Cha),
        Token::Save(Ability::Str),
        Token::Save(Ability::Dex),
        Token::Save(Ability::Con),
        Token::Save(Ability::Int),
        Token::Save(Ability::Wis),
        Token::Save(Ability::Cha),
        Token::MeleeAttackMod,
        Token::MeleeDamageMod,
        Token::RangedAttackMod,
        Token::RangedDamageMod,
        Token::AreaOfEffect,
        Token::BreathWeaponDamage,
        Token::DamageType,
    ];

    pub fn text(&self) -> &'static str {
        match self {
            Self::Name => "$name",
            Self::ShortName => "$shortName",
            Self::PossessiveName => "$possessiveName",
            Self::AlternatePronoun => "$alternatePronoun",
            Self::Pronoun => "$pronoun",
            Self::CapsPronoun => "$capsPronoun",
            Self::Level => "$level",
            Self::Spell(Ability::Str) => "$strSpell",
            Self::Spell(Ability::Dex) => "$dexSpell",
            Self::Spell(Ability::Con) => "$conSpell",
            Self::Spell(Ability::Int) => "$intSpell",
            Self::Spell(Ability::Wis) => "$wisSpell",
            Self::Spell(Ability::Cha) => "$chaSpell",
            Self::Save(Ability::Str) => "$strSave",
            Self::Save(Ability::Dex) => "$dexSave",
            Self::Save(Ability::Con) => "$conSave",
            Self::Save(Ability::Int) => "$intSave",
            Self::Save(Ability::Wis) => "$wisSave",
            Self::Save(Ability::Cha) => "$chaSave",
            Self::MeleeAttackMod => "$meleeAttackMod",
            Self::MeleeDamageMod => "$meleeDamageMod",
            Self::RangedAttackMod => "$rangedAttackMod",
            Self::RangedDamageMod => "$rangedDamageMod",
            Self::AreaOfEffect => "$areaOfEffect",
            Self::BreathWeaponDamage => "$breathWeaponDamage",
            Self::DamageType => "$damageType",
        }
    }

    /// The longest token `text` starts with.
    pub fn longest_prefix(text: &str) -> Option<Token> {
        Self::ALL
            .into_iter()
            .filter(|token| text.starts_with(token.text()))
            .max_by_key(|token| token.text().len())
    }
}

/// Supplies token values. `None` leaves the token in place.
pub trait Placeholders {
    fn value(&self, token: Token) -> Option<String>;
}

impl Placeholders for HashMap<Token, String> {
    fn value(&self, token: Token) -> Option<String> {
        self.get(&token).cloned()
    }
}

pub fn expand<P: Placeholders + ?Sized>(source: &str, ctx: &P) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let replaced = Token::longest_prefix(tail)
            .and_then(|token| ctx.value(token).map(|value| (token, value)));
        match replaced {
            Some((token, value)) => {
                out.push_str(&value);
                rest = &tail[token.text().len()..];
            }
            None => {
                out.push('$');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> HashMap<Token, String> {
        HashMap::from([
            (Token::Name, "Tordek Ironfist".to_string()),
            (Token::ShortName, "Tordek".to_string()),
            (Token::Pronoun, "he".to_string()),
        ])
    }

    #[test]
    fn text_without_tokens_is_untouched() {
        let source = "A plain sentence costing $5, with no tokens.";
        assert_eq!(expand(source, &names()), source);
    }

    #[test]
    fn longest_token_wins() {
        assert_eq!(Token::longest_prefix("$name"), Some(Token::Name));
        assert_eq!(Token::longest_prefix("$shortName's"), Some(Token::ShortName));
        assert_eq!(Token::longest_prefix("$wisSave DC"), Some(Token::Save(Ability::Wis)));
        assert_eq!(Token::longest_prefix("$unknown"), None);
    }

    #[test]
    fn unsupplied_tokens_stay_verbatim() {
        let out = expand("$shortName swings at $level with $capsPronoun", &names());
        assert_eq!(out, "Tordek swings at $level with $capsPronoun");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let ctx = HashMap::from([(Token::Name, "$shortName".to_string())]);
        assert_eq!(expand("$name!", &ctx), "$shortName!");
    }

    #[test]
    fn every_token_text_is_unique() {
        let mut texts: Vec<&str> = Token::ALL.iter().map(Token::text).collect();
        texts.sort_unstable();
        texts.dedup();
        assert_eq!(texts.len(), Token::ALL.len());
    }
}
