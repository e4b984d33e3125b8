//! Runtime configuration read from the process environment.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::data::loader::DEFAULT_SNAPSHOT_PATH;
pub use crate::rules::challenge::ChallengeRules;

pub const DEFAULT_MAX_CONCURRENT_WRITES: usize = 16;

/// Tunables for the bounds recompute job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecomputeConfig {
    /// CPU worker threads for combination evaluation. 0 uses every core.
    pub workers: usize,
    /// Upper bound on store writes in flight at once.
    pub max_concurrent_writes: usize,
    /// Wall-clock budget for the whole job.
    pub deadline: Option<Duration>,
    pub rules: ChallengeRules,
}

impl Default for RecomputeConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            max_concurrent_writes: DEFAULT_MAX_CONCURRENT_WRITES,
            deadline: None,
            rules: ChallengeRules::default(),
        }
    }
}

impl RecomputeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// - `NPCGEN_WORKERS`
    /// - `NPCGEN_MAX_CONCURRENT_WRITES`
    /// - `NPCGEN_DEADLINE_SECS`
    /// - `NPCGEN_OFFENSIVE_MEDIAN` (`armor-class` or `attack-bonus`)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(workers) = read_env::<usize>("NPCGEN_WORKERS") {
            config.workers = workers;
        }

        if let Some(limit) = read_env::<usize>("NPCGEN_MAX_CONCURRENT_WRITES") {
            config.max_concurrent_writes = limit.max(1);
        }

        if let Some(secs) = read_env::<u64>("NPCGEN_DEADLINE_SECS") {
            config.deadline = Some(Duration::from_secs(secs));
        }

        if let Some(median) = read_env("NPCGEN_OFFENSIVE_MEDIAN") {
            config.rules = ChallengeRules::new(median);
        }

        config
    }
}

/// Snapshot path from `NPCGEN_SNAPSHOT`, else the bundled default.
pub fn snapshot_path() -> PathBuf {
    env::var("NPCGEN_SNAPSHOT")
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_PATH))
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::challenge::OffensiveMedian;

    #[test]
    fn defaults() {
        let config = RecomputeConfig::default();
        assert_eq!(config.workers, 0);
        assert_eq!(config.max_concurrent_writes, 16);
        assert_eq!(config.deadline, None);
        assert_eq!(config.rules.offensive_median, OffensiveMedian::ArmorClass);
    }

    #[test]
    fn unparsable_values_are_ignored() {
        assert_eq!(read_env::<usize>("NPCGEN_TEST_SURELY_UNSET_VARIABLE"), None);
    }
}
