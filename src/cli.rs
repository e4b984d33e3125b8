use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use crate::config::{snapshot_path, RecomputeConfig};
use crate::data::loader::load_snapshot;
use crate::data::store::DocumentStore;
use crate::data::validate::validate_compendium;
use crate::npc::describe::{EnvIdentity, Identity, StaticIdentity};
use crate::npc::NpcBuilder;
use crate::parallel::recompute::RecomputeJob;
use crate::rules::challenge::{Challenge, ChallengeRules, OffensiveMedian};

/// Owner recorded on generated records when `NPCGEN_USER_ID` is unset.
const LOCAL_USER: &str = "local";

const USAGE: &str = "usage: npcgen <classify|generate|recompute|validate>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Classify,
    Generate,
    Recompute,
    Validate,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("classify") => Some(Command::Classify),
        Some("generate") => Some(Command::Generate),
        Some("recompute") => Some(Command::Recompute),
        Some("validate") => Some(Command::Validate),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Classify) => handle_classify(args),
        Some(Command::Generate) => handle_generate(args),
        Some(Command::Recompute) => handle_recompute(args),
        Some(Command::Validate) => handle_validate(args),
        None => {
            eprintln!("{USAGE}");
            2
        }
    }
}

#[derive(Debug, Serialize)]
struct ClassifyOutput {
    challenge: Challenge,
    rating: &'static str,
    xp: u32,
    proficiency: i32,
    offensive_median: OffensiveMedian,
}

fn handle_classify(args: &[String]) -> i32 {
    let numbers: Option<Vec<i32>> = positionals(args)
        .take(4)
        .map(|arg| arg.parse::<i32>().ok())
        .collect();
    let Some([hit_points, armor_class, attack_bonus, damage_per_round]) =
        numbers.and_then(|numbers| <[i32; 4]>::try_from(numbers).ok())
    else {
        eprintln!("usage: npcgen classify <hp> <ac> <attack> <dpr> [--median armor-class|attack-bonus]");
        return 2;
    };

    let mut rules = RecomputeConfig::from_env().rules;
    if let Some(raw) = flag_value(args, "--median") {
        match raw.parse::<OffensiveMedian>() {
            Ok(median) => rules = ChallengeRules::new(median),
            Err(err) => {
                eprintln!("{err}");
                return 2;
            }
        }
    }

    let challenge = rules.calculate(hit_points, armor_class, attack_bonus, damage_per_round);
    print_json(&ClassifyOutput {
        challenge,
        rating: challenge.rating(),
        xp: challenge.xp_value(),
        proficiency: challenge.proficiency(),
        offensive_median: rules.offensive_median,
    })
}

fn handle_generate(args: &[String]) -> i32 {
    let Some(runtime) = runtime() else {
        return 1;
    };
    let path = snapshot_arg(args);
    let compendium = match runtime.block_on(load_snapshot(&path)) {
        Ok((_, compendium)) => compendium,
        Err(err) => {
            eprintln!("failed to load {}: {err}", path.display());
            return 1;
        }
    };

    let mut builder = NpcBuilder::new().rules(RecomputeConfig::from_env().rules);
    if let Some(id) = flag_value(args, "--occupation") {
        builder = builder.occupation(id);
    }
    if let Some(id) = flag_value(args, "--race") {
        builder = builder.race(id);
    }
    if let Some(raw) = flag_value(args, "--level") {
        builder = builder.level(parse_i32_arg(raw, "level", 1));
    }
    if let Some(raw) = flag_value(args, "--seed") {
        builder = builder.seed(parse_u64_arg(raw, "seed", 0));
    }

    let npc = match builder.build(&compendium) {
        Ok(npc) => npc,
        Err(err) => {
            eprintln!("generation failed: {err}");
            return 1;
        }
    };
    info!(id = npc.id(), name = npc.name(), challenge = %npc.challenge(), "generated npc");

    if args.iter().any(|arg| arg == "--text") {
        print!("{}", npc.export_text());
        return 0;
    }
    let identity = StaticIdentity(Some(
        EnvIdentity
            .current_user_id()
            .unwrap_or_else(|| LOCAL_USER.to_string()),
    ));
    match npc.to_record(&identity) {
        Ok(record) => print_json(&record),
        Err(err) => {
            eprintln!("failed to build record: {err}");
            1
        }
    }
}

fn handle_recompute(args: &[String]) -> i32 {
    let Some(runtime) = runtime() else {
        return 1;
    };
    let path = snapshot_arg(args);
    let config = RecomputeConfig::from_env();
    let result = runtime.block_on(async {
        let (store, compendium) = load_snapshot(&path).await?;
        let store = Arc::new(store);
        let job = RecomputeJob::new(Arc::clone(&store) as Arc<dyn DocumentStore>, config);
        let report = job.run(Arc::new(compendium)).await;
        if report.writes() > 0 {
            store.save(&path).await?;
            info!(path = %path.display(), writes = report.writes(), "saved snapshot");
        }
        Ok::<_, crate::Error>(report)
    });

    match result {
        Ok(report) => {
            let code = print_json(&report);
            if code == 0 && !report.failures.is_empty() {
                warn!(failures = report.failures.len(), "recompute finished with failures");
                return 1;
            }
            code
        }
        Err(err) => {
            eprintln!("recompute failed: {err}");
            1
        }
    }
}

fn handle_validate(args: &[String]) -> i32 {
    let Some(runtime) = runtime() else {
        return 1;
    };
    let path = snapshot_arg(args);
    let compendium = match runtime.block_on(load_snapshot(&path)) {
        Ok((_, compendium)) => compendium,
        Err(err) => {
            eprintln!("failed to load {}: {err}", path.display());
            return 1;
        }
    };

    let report = validate_compendium(&compendium);
    for diagnostic in &report.diagnostics {
        eprintln!("- {diagnostic}");
    }
    let code = print_json(&report);
    if report.has_errors() {
        eprintln!("validation failed: {}", path.display());
        1
    } else {
        code
    }
}

fn runtime() -> Option<Runtime> {
    match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => Some(runtime),
        Err(err) => {
            eprintln!("failed to start async runtime: {err}");
            None
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize output: {err}");
            1
        }
    }
}

/// Arguments after the command that are neither flags nor flag values.
fn positionals(args: &[String]) -> impl Iterator<Item = &str> {
    let mut rest = args.iter().skip(2);
    std::iter::from_fn(move || {
        while let Some(arg) = rest.next() {
            if arg == "--text" {
                continue;
            }
            if arg.starts_with("--") {
                rest.next();
                continue;
            }
            return Some(arg.as_str());
        }
        None
    })
}

/// First positional argument after the command, else `NPCGEN_SNAPSHOT` or the default.
fn snapshot_arg(args: &[String]) -> PathBuf {
    positionals(args)
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(snapshot_path)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|index| args.get(index + 1))
        .map(String::as_str)
}

fn parse_i32_arg(raw: &str, name: &str, default: i32) -> i32 {
    raw.parse::<i32>().unwrap_or_else(|_| {
        eprintln!("invalid {name} '{raw}', defaulting to {default}");
        default
    })
}

fn parse_u64_arg(raw: &str, name: &str, default: u64) -> u64 {
    raw.parse::<u64>().unwrap_or_else(|_| {
        eprintln!("invalid {name} '{raw}', defaulting to {default}");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn commands_parse() {
        assert_eq!(parse_command(&args(&["npcgen", "classify"])), Some(Command::Classify));
        assert_eq!(parse_command(&args(&["npcgen", "recompute"])), Some(Command::Recompute));
        assert_eq!(parse_command(&args(&["npcgen", "serve"])), None);
        assert_eq!(parse_command(&args(&["npcgen"])), None);
    }

    #[test]
    fn snapshot_is_first_positional_after_flags() {
        let raw = args(&["npcgen", "generate", "--race", "elf", "--text", "my.json"]);
        assert_eq!(snapshot_arg(&raw), PathBuf::from("my.json"));
        assert_eq!(flag_value(&raw, "--race"), Some("elf"));
        assert_eq!(flag_value(&raw, "--level"), None);
    }

    #[test]
    fn classify_needs_four_integers() {
        assert_eq!(run_with_args(&args(&["npcgen", "classify", "10", "12"])), 2);
        assert_eq!(run_with_args(&args(&["npcgen", "classify", "a", "b", "c", "d"])), 2);
        assert_eq!(run_with_args(&args(&["npcgen", "classify", "4", "10", "2", "1"])), 0);
    }

    #[test]
    fn flag_values_are_not_positionals() {
        let raw = args(&["npcgen", "classify", "--median", "attack-bonus", "4", "10", "2", "1"]);
        assert_eq!(positionals(&raw).collect::<Vec<_>>(), vec!["4", "10", "2", "1"]);
        assert_eq!(run_with_args(&raw), 0);
        let raw = args(&["npcgen", "classify", "4", "10", "--median", "armor-class", "2", "1"]);
        assert_eq!(run_with_args(&raw), 0);
    }
}
