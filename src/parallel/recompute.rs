//! Bounds recompute job.
//!
//! Phase one evaluates every occupation x race x subrace x level x loadout
//! combination on the rayon pool and folds the ranks into one candidate range
//! per occupation and per race. Phase two writes each candidate back to the
//! document store, widening whatever is stored at the time of the write.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::future::join_all;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::RecomputeConfig;
use crate::data::compendium::Compendium;
use crate::data::items::{Action, Armor, AttackKind};
use crate::data::level_data::MAX_LEVEL;
use crate::data::store::{DocumentStore, Fields, StoreError};
use crate::npc::descriptors::{Alignment, Gender};
use crate::npc::{DetailsChoice, Loadout, NpcBuilder};
use crate::parallel::batch::batch_ranges;
use crate::parallel::pool::WorkerPool;
use crate::rules::challenge::{Challenge, ChallengeRange, ChallengeRules};

/// Chunks handed to each worker thread, so cancellation is noticed promptly.
const CHUNKS_PER_WORKER: usize = 4;

const LOW_FIELD: &str = "low_challenge";
const HIGH_FIELD: &str = "high_challenge";

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Occupation,
    Race,
}

impl EntityKind {
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Occupation => "occupations",
            Self::Race => "races",
        }
    }
}

/// A bound that was widened and written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundsUpdate {
    pub kind: EntityKind,
    pub id: String,
    pub previous: Option<ChallengeRange>,
    pub current: ChallengeRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecomputeFailure {
    /// `occupations/<id>`, `races/<id>` or the combination that failed to assemble.
    pub scope: String,
    pub reason: String,
}

impl RecomputeFailure {
    fn new(scope: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            scope: scope.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecomputeReport {
    pub started_at: String,
    pub finished_at: String,
    pub elapsed_ms: u128,
    pub combinations: usize,
    pub updates: Vec<BoundsUpdate>,
    pub unchanged: usize,
    pub failures: Vec<RecomputeFailure>,
    pub cancelled: bool,
}

impl RecomputeReport {
    /// Store writes that were performed.
    pub fn writes(&self) -> usize {
        self.updates.len()
    }
}

/// Result of the CPU phase.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub combinations: usize,
    pub candidates: BTreeMap<(EntityKind, String), ChallengeRange>,
    pub failures: Vec<RecomputeFailure>,
    pub cancelled: bool,
}

impl Evaluation {
    fn absorb(&mut self, other: Evaluation) {
        self.combinations += other.combinations;
        for (key, range) in other.candidates {
            merge_candidate(&mut self.candidates, key, range);
        }
        self.failures.extend(other.failures);
        self.cancelled |= other.cancelled;
    }
}

fn merge_candidate(
    candidates: &mut BTreeMap<(EntityKind, String), ChallengeRange>,
    key: (EntityKind, String),
    range: ChallengeRange,
) {
    candidates
        .entry(key)
        .and_modify(|known| *known = known.union(&range))
        .or_insert(range);
}

struct Unit<'c> {
    occupation: &'c str,
    race: &'c str,
    subrace: Option<&'c str>,
    level: i32,
}

impl Unit<'_> {
    fn scope(&self) -> String {
        format!(
            "{}/{}/{}/level {}",
            self.occupation,
            self.race,
            self.subrace.unwrap_or("-"),
            self.level
        )
    }
}

fn units(compendium: &Compendium) -> Vec<Unit<'_>> {
    let mut units = Vec::new();
    for occupation in &compendium.occupations {
        for race in &compendium.races {
            let mut subraces: Vec<Option<&str>> = compendium
                .subraces_of(race)
                .into_iter()
                .map(|subrace| Some(subrace.id.as_str()))
                .collect();
            if subraces.is_empty() {
                subraces.push(None);
            }
            for subrace in subraces {
                for level in 1..=i32::from(MAX_LEVEL) {
                    units.push(Unit {
                        occupation: &occupation.id,
                        race: &race.id,
                        subrace,
                        level,
                    });
                }
            }
        }
    }
    units
}

fn weapon_options<'a>(proficiencies: &[&'a Action], kind: AttackKind) -> Vec<Option<&'a Action>> {
    let options: Vec<Option<&'a Action>> = proficiencies
        .iter()
        .filter(|weapon| weapon.weapon_type.is_weapon(kind))
        .map(|weapon| Some(*weapon))
        .collect();
    if options.is_empty() {
        vec![None]
    } else {
        options
    }
}

/// Classifies every loadout of one unit.
fn evaluate_unit(
    compendium: &Compendium,
    rules: ChallengeRules,
    unit: &Unit<'_>,
) -> Result<(ChallengeRange, usize), RecomputeFailure> {
    let mut npc = NpcBuilder::new()
        .occupation(unit.occupation)
        .race(unit.race)
        .subrace(unit.subrace)
        .level(unit.level)
        .gender(Gender::Female)
        .alignment(Alignment::Neutral)
        .name(unit.race)
        .id(unit.occupation)
        .details(DetailsChoice::Skip)
        .unequipped()
        .rules(rules)
        .seed(0)
        .build(compendium)
        .map_err(|err| RecomputeFailure::new(unit.scope(), err))?;

    let mut armors: Vec<Option<&Armor>> = vec![None];
    armors.extend(
        npc.armor_proficiencies()
            .iter()
            .filter(|armor| !armor.is_shield())
            .map(|armor| Some(*armor)),
    );
    let melee_options = weapon_options(npc.weapon_proficiencies(), AttackKind::Melee);
    let ranged_options = weapon_options(npc.weapon_proficiencies(), AttackKind::Ranged);

    let mut range: Option<ChallengeRange> = None;
    let mut combinations = 0;
    for &armor in &armors {
        for &melee in &melee_options {
            for &ranged in &ranged_options {
                npc.equip(Loadout {
                    armor,
                    melee,
                    ranged,
                });
                let challenge = npc.challenge();
                match range.as_mut() {
                    Some(known) => {
                        known.widen(challenge);
                    }
                    None => range = Some(ChallengeRange::single(challenge)),
                }
                combinations += 1;
            }
        }
    }
    Ok((
        range.unwrap_or_else(|| ChallengeRange::single(npc.challenge())),
        combinations,
    ))
}

fn past(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() >= deadline)
}

/// CPU phase: classifies every reachable combination on the worker pool.
pub fn evaluate(
    compendium: &Compendium,
    rules: ChallengeRules,
    pool: WorkerPool,
    cancel: &CancelToken,
    deadline: Option<Instant>,
) -> Evaluation {
    let units = units(compendium);
    let chunks = batch_ranges(units.len(), pool.threads() * CHUNKS_PER_WORKER);
    let partials: Vec<Evaluation> = pool.install(|| {
        chunks
            .par_iter()
            .map(|chunk| {
                let mut partial = Evaluation::default();
                if cancel.is_cancelled() || past(deadline) {
                    partial.cancelled = true;
                    return partial;
                }
                for unit in &units[chunk.clone()] {
                    match evaluate_unit(compendium, rules, unit) {
                        Ok((range, combinations)) => {
                            partial.combinations += combinations;
                            merge_candidate(
                                &mut partial.candidates,
                                (EntityKind::Occupation, unit.occupation.to_string()),
                                range,
                            );
                            merge_candidate(
                                &mut partial.candidates,
                                (EntityKind::Race, unit.race.to_string()),
                                range,
                            );
                        }
                        Err(failure) => partial.failures.push(failure),
                    }
                }
                partial
            })
            .collect()
    });

    let mut evaluation = Evaluation::default();
    for partial in partials {
        evaluation.absorb(partial);
    }
    evaluation
}

#[derive(Debug)]
enum WriteOutcome {
    Updated(BoundsUpdate),
    Unchanged,
    Skipped,
    Failed(RecomputeFailure),
}

fn stored_bound(record: Option<&Value>, field: &str) -> Result<Option<Challenge>, StoreError> {
    match record.and_then(|record| record.get(field)) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
    }
}

async fn write_bounds(
    store: &dyn DocumentStore,
    kind: EntityKind,
    id: &str,
    candidate: ChallengeRange,
) -> Result<WriteOutcome, StoreError> {
    let collection = kind.collection();
    let record = store.get(collection, id).await?;
    let low = stored_bound(record.as_ref(), LOW_FIELD)?;
    let high = stored_bound(record.as_ref(), HIGH_FIELD)?;
    let previous = match (low, high) {
        (Some(low), Some(high)) => Some(ChallengeRange::new(low, high)),
        (Some(only), None) | (None, Some(only)) => Some(ChallengeRange::single(only)),
        (None, None) => None,
    };
    let merged = previous.map_or(candidate, |stored| stored.union(&candidate));
    if (low, high) == (Some(merged.low), Some(merged.high)) {
        return Ok(WriteOutcome::Unchanged);
    }

    let mut fields = Fields::new();
    fields.insert(LOW_FIELD.to_string(), serde_json::to_value(merged.low)?);
    fields.insert(HIGH_FIELD.to_string(), serde_json::to_value(merged.high)?);
    store.put(collection, id, fields).await?;
    debug!(collection, id, from = ?previous, to = %merged, "widened bounds");
    Ok(WriteOutcome::Updated(BoundsUpdate {
        kind,
        id: id.to_string(),
        previous,
        current: merged,
    }))
}

/// Recomputes and persists challenge bounds for every occupation and race.
pub struct RecomputeJob {
    store: Arc<dyn DocumentStore>,
    config: RecomputeConfig,
    cancel: CancelToken,
}

impl RecomputeJob {
    pub fn new(store: Arc<dyn DocumentStore>, config: RecomputeConfig) -> Self {
        Self {
            store,
            config,
            cancel: CancelToken::new(),
        }
    }

    /// A handle that stops the job before its next chunk or write.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub async fn run(&self, compendium: Arc<Compendium>) -> RecomputeReport {
        let started_at = Utc::now();
        let clock = Instant::now();
        let deadline = self.config.deadline.map(|budget| clock + budget);
        info!(
            occupations = compendium.occupations.len(),
            races = compendium.races.len(),
            workers = self.config.workers,
            "bounds recompute started"
        );

        let pool = WorkerPool::with_workers(self.config.workers);
        let rules = self.config.rules;
        let cancel = self.cancel.clone();
        let phase = tokio::task::spawn_blocking(move || {
            evaluate(&compendium, rules, pool, &cancel, deadline)
        })
        .await;
        let mut evaluation = match phase {
            Ok(evaluation) => evaluation,
            Err(err) => {
                warn!(%err, "combination evaluation aborted");
                Evaluation {
                    failures: vec![RecomputeFailure::new("evaluation", err)],
                    ..Evaluation::default()
                }
            }
        };
        for failure in &evaluation.failures {
            warn!(scope = %failure.scope, reason = %failure.reason, "combination failed");
        }

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_writes.max(1)));
        let write_deadline = deadline.map(tokio::time::Instant::from_std);
        let candidates = std::mem::take(&mut evaluation.candidates);
        let tasks = candidates.into_iter().map(|((kind, id), candidate)| {
            let store = Arc::clone(&self.store);
            let semaphore = Arc::clone(&semaphore);
            let cancel = self.cancel.clone();
            let scope = format!("{}/{id}", kind.collection());
            let task = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(err) => return WriteOutcome::Failed(RecomputeFailure::new(scope, err)),
                };
                if cancel.is_cancelled() || past(deadline) {
                    return WriteOutcome::Skipped;
                }
                let write = write_bounds(store.as_ref(), kind, &id, candidate);
                let result = match write_deadline {
                    Some(at) => match tokio::time::timeout_at(at, write).await {
                        Ok(result) => result,
                        Err(_) => {
                            return WriteOutcome::Failed(RecomputeFailure::new(
                                scope,
                                "deadline elapsed during write",
                            ))
                        }
                    },
                    None => write.await,
                };
                result.unwrap_or_else(|err| WriteOutcome::Failed(RecomputeFailure::new(scope, err)))
            });
            async move {
                task.await.unwrap_or_else(|err| {
                    WriteOutcome::Failed(RecomputeFailure::new("write task", err))
                })
            }
        });
        let outcomes = join_all(tasks).await;

        let mut updates = Vec::new();
        let mut unchanged = 0;
        let mut cancelled = evaluation.cancelled;
        for outcome in outcomes {
            match outcome {
                WriteOutcome::Updated(update) => updates.push(update),
                WriteOutcome::Unchanged => unchanged += 1,
                WriteOutcome::Skipped => cancelled = true,
                WriteOutcome::Failed(failure) => {
                    warn!(scope = %failure.scope, reason = %failure.reason, "bounds write failed");
                    evaluation.failures.push(failure);
                }
            }
        }

        let elapsed: Duration = clock.elapsed();
        let report = RecomputeReport {
            started_at: started_at.to_rfc3339(),
            finished_at: Utc::now().to_rfc3339(),
            elapsed_ms: elapsed.as_millis(),
            combinations: evaluation.combinations,
            updates,
            unchanged,
            failures: evaluation.failures,
            cancelled,
        };
        info!(
            combinations = report.combinations,
            writes = report.writes(),
            unchanged = report.unchanged,
            failures = report.failures.len(),
            cancelled = report.cancelled,
            elapsed_ms = report.elapsed_ms as u64,
            "bounds recompute finished"
        );
        report
    }
}
