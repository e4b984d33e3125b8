//! Roleplaying details drawn from phrase tables. Generated text keeps its
//! `$shortName`-style tokens; they are expanded against the character when read.

use serde::{Deserialize, Serialize};

use crate::rng::Rng;

const HEIGHTS: &[&str] = &[
    "very short",
    "a little shorter than average",
    "of average height",
    "a little taller than average",
    "very tall",
];
const BUILDS: &[&str] = &[
    "unhealthily skinny",
    "slightly skinnier than average",
    "average in build",
    "slightly more muscular than average",
    "very muscular",
];
const SKIN_COLORS: &[&str] = &["brown", "gray", "pale", "pink", "tan"];
const SKIN_TEXTURES: &[&str] = &["rough", "silky", "smooth", "soft", "sunburned"];
const FACE_SHAPES: &[&str] = &["average", "diamond-shaped", "heart-shaped", "oval", "round", "square"];
const FACE_SIZES: &[&str] = &["short", "average", "long"];
const EYE_COLORS: &[&str] = &["blue", "brown", "cyan", "golden", "green", "red"];
const EYE_INTENSITIES: &[&str] = &["bright", "dull", "pale"];
const HAIR_COLORS: &[&str] = &[
    "auburn", "black", "blonde", "blue", "brown", "gray", "pink", "red", "white",
];
const HAIR_STYLES: &[&str] = &["braided", "curly", "ponytailed", "straight", "wavy"];
const HAIR_LENGTHS: &[&str] = &[
    "cropped",
    "chin-length",
    "medium",
    "shoulder-length",
    "elbow-length",
    "mid-back length",
    "waist-length",
];

const BONDS: &[&str] = &[
    "is dedicated to fulfilling a personal life goal",
    "is protective of close family members",
    "is protective of colleagues or compatriots",
    "is loyal to a benefactor, patron, or employer",
    "is captivated by a romantic interest",
    "is drawn to a special place",
    "is protective of a sentimental keepsake",
    "is protective of a valuable possession",
    "is seeking revenge for the death of a loved one",
    "has been hexed into becoming minuscule",
    "is searching for $alternatePronoun soul mate",
    "is being haunted by a ghost",
    "is secretly a cannibal",
];

const FLAWS: &[&str] = &[
    "has a forbidden love",
    "is easily susceptible to romance",
    "envies another creature's possessions or station",
    "has a shameful or scandalous history and is willing to do anything to keep it secret",
    "has committed a secret crime or misdeed and is willing to do anything to keep it secret",
    "has a constant wanderlust and is unable to live at the same place for more than a few months",
    "often offends other people with $alternatePronoun arrogance",
    "suffers from overpowering greed",
    "is prone to blinding rage",
    "suffers from foolhardy bravery",
    "is extremely lazy and selfish",
    "is very conceited",
];
const PHOBIAS: &[&str] = &[
    "being alone",
    "cats",
    "dogs",
    "elves",
    "heights",
    "insects",
    "large crowds",
    "snakes",
    "spiders",
    "thunder",
];

const BEHAVIORS: &[&str] = &[
    "is prone to singing, whistling, or humming quietly",
    "is prone to predictions of doom",
    "fidgets frequently while in social situations",
    "squints frequently",
    "frequently trails off to stare into the distance",
    "is constantly chewing something",
    "bites $alternatePronoun fingernails when not speaking",
    "constantly twirls or tugs on $alternatePronoun hair or beard",
    "holds grudges for a ridiculously long time",
    "rarely thinks before acting",
    "stretches the truth to tell a good story",
    "has a crude sense of humor",
    "is very good at keeping secrets",
    "argues about everything, no matter how small",
];
const SPEECHES: &[&str] = &[
    "always speaks in rhyme",
    "speaks with a very deep voice",
    "speaks with a very high voice",
    "slurs words when talking",
    "has a terrible lisp",
    "stutters frequently when talking",
    "enunciates words overly clearly",
    "always whispers when speaking",
    "uses flowery speech",
    "uses incredibly long words when speaking",
    "frequently uses the wrong words",
    "uses colorful oaths and exclamations",
    "constantly makes jokes and puns",
    "paces fervently while talking",
    "taps $alternatePronoun fingers when speaking",
    "bites $alternatePronoun fingernails when speaking",
    "always speaks loudly, as though $pronoun can't be heard",
];

const SKILL_LEVELS: &[&str] = &[
    "expertly",
    "like a well-trained rat",
    "masterfully",
    "poorly",
    "very well",
    "well",
    "with some proficiency",
];
const INSTRUMENTS: &[&str] = &[
    "bagpipes", "citole", "drum", "dulcimer", "fiddle", "flute", "gittern", "lute", "lyre",
    "horn", "pan flute", "shawm", "viol",
];
const HOBBIES: &[&str] = &[
    "dance",
    "draw",
    "juggle",
    "paint",
    "sew",
    "sing",
    "skip rocks",
    "throw darts",
];
const KNACKS: &[&str] = &[
    "has a perfect memory",
    "is unbelievably lucky",
    "is a great cook",
    "is a skilled actor and master of disguise",
    "is an expert carpenter",
    "is great with animals",
    "is great with children",
    "is great at solving puzzles",
    "is great at impressions",
    "drinks everyone under the table",
    "speaks several languages fluently",
    "knows thieves' cant",
    "can make a potion out of anything",
];

fn pick(rng: &mut Rng, table: &[&'static str]) -> &'static str {
    rng.pick(table).copied().unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Details {
    pub appearance: String,
    pub bond: String,
    pub flaw: String,
    pub mannerism: String,
    pub talent: String,
}

impl Details {
    pub fn generate(rng: &mut Rng) -> Self {
        Self {
            appearance: appearance(rng),
            bond: format!("$shortName {}.", pick(rng, BONDS)),
            flaw: flaw(rng),
            mannerism: format!(
                "$shortName {} and {}.",
                pick(rng, BEHAVIORS),
                pick(rng, SPEECHES)
            ),
            talent: talent(rng),
        }
    }
}

fn appearance(rng: &mut Rng) -> String {
    let body = format!("is {} and {}", pick(rng, HEIGHTS), pick(rng, BUILDS));
    let skin = format!("with {} {} skin", pick(rng, SKIN_TEXTURES), pick(rng, SKIN_COLORS));
    let face = format!("has a {} {} face", pick(rng, FACE_SIZES), pick(rng, FACE_SHAPES));
    let eyes = if rng.coin() {
        "is blind".to_string()
    } else {
        format!("with {} {} eyes", pick(rng, EYE_INTENSITIES), pick(rng, EYE_COLORS))
    };
    let hair = if rng.coin() {
        "is also bald".to_string()
    } else {
        format!(
            "has {}, {}, {} hair",
            pick(rng, HAIR_LENGTHS),
            pick(rng, HAIR_STYLES),
            pick(rng, HAIR_COLORS)
        )
    };
    format!("$shortName {body} {skin}. $capsPronoun {face} {eyes}. $name {hair}.")
}

fn flaw(rng: &mut Rng) -> String {
    let flaw = pick(rng, FLAWS);
    if rng.one_in(4) {
        format!("$shortName {flaw} and is afraid of {}.", pick(rng, PHOBIAS))
    } else {
        format!("$shortName {flaw}.")
    }
}

fn talent(rng: &mut Rng) -> String {
    let mut sentences = Vec::new();
    if rng.coin() {
        sentences.push(format!(
            "$shortName can {} {}.",
            pick(rng, HOBBIES),
            pick(rng, SKILL_LEVELS)
        ));
    }
    if rng.coin() {
        sentences.push(format!(
            "$shortName can play the {} {}.",
            pick(rng, INSTRUMENTS),
            pick(rng, SKILL_LEVELS)
        ));
    }
    if rng.coin() {
        sentences.push(format!("$shortName {}.", pick(rng, KNACKS)));
    }
    if sentences.is_empty() {
        "$shortName isn't good at anything.".to_string()
    } else {
        sentences.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_details() {
        assert_eq!(Details::generate(&mut Rng::new(11)), Details::generate(&mut Rng::new(11)));
    }

    #[test]
    fn every_detail_is_a_sentence_about_the_character() {
        for seed in 0..32 {
            let details = Details::generate(&mut Rng::new(seed));
            for text in [
                &details.appearance,
                &details.bond,
                &details.flaw,
                &details.mannerism,
                &details.talent,
            ] {
                assert!(text.starts_with("$shortName "), "{text}");
                assert!(text.ends_with('.'), "{text}");
            }
        }
    }
}
