mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{fixture_compendium, minimal_compendium};
use npcgen::config::RecomputeConfig;
use npcgen::data::compendium::Compendium;
use npcgen::data::loader::load_compendium;
use npcgen::data::occupation::Bounded;
use npcgen::data::store::{DocumentStore, Fields, MemoryStore, StoreError, StoreResult};
use npcgen::parallel::recompute::{EntityKind, RecomputeJob};
use npcgen::rules::Challenge;
use serde_json::Value;

fn config() -> RecomputeConfig {
    RecomputeConfig {
        workers: 2,
        max_concurrent_writes: 2,
        ..RecomputeConfig::default()
    }
}

/// Delegates to a [`MemoryStore`] but refuses every write to one record.
struct FlakyStore {
    inner: MemoryStore,
    failing_id: &'static str,
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn fetch_all(&self, collection: &str) -> StoreResult<Vec<Value>> {
        self.inner.fetch_all(collection).await
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        self.inner.get(collection, id).await
    }

    async fn put(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        if id == self.failing_id {
            return Err(StoreError::Backend(format!("write to {id} refused")));
        }
        self.inner.put(collection, id, fields).await
    }
}

#[tokio::test]
async fn first_run_writes_bounds_for_every_occupation_and_race() {
    let compendium = fixture_compendium();
    let store = Arc::new(MemoryStore::from_compendium(&compendium).unwrap());
    let job = RecomputeJob::new(Arc::clone(&store) as Arc<dyn DocumentStore>, config());

    let report = job.run(Arc::new(compendium)).await;

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert!(!report.cancelled);
    assert!(report.combinations > 0);
    assert_eq!(report.writes(), 4);
    assert_eq!(store.write_count(), 4);
    let kinds: Vec<EntityKind> = report.updates.iter().map(|u| u.kind).collect();
    assert_eq!(kinds.iter().filter(|k| **k == EntityKind::Occupation).count(), 2);
    assert!(report.updates.iter().all(|u| u.previous.is_none()));

    let reloaded = load_compendium(store.as_ref()).await.unwrap();
    for occupation in &reloaded.occupations {
        let range = occupation.challenge_range().expect("bounds were stored");
        assert!(range.low <= range.high);
    }
    for race in &reloaded.races {
        assert!(race.challenge_range().is_some());
    }
}

#[tokio::test]
async fn second_run_is_idempotent() {
    let compendium = Arc::new(fixture_compendium());
    let store = Arc::new(MemoryStore::from_compendium(&compendium).unwrap());
    let job = RecomputeJob::new(Arc::clone(&store) as Arc<dyn DocumentStore>, config());

    let first = job.run(Arc::clone(&compendium)).await;
    let after_first = store.snapshot().await;
    let second = job.run(compendium).await;

    assert_eq!(first.writes(), 4);
    assert_eq!(second.writes(), 0);
    assert_eq!(second.unchanged, 4);
    assert_eq!(store.write_count(), 4);
    assert_eq!(store.snapshot().await, after_first);
}

#[tokio::test]
async fn stored_bounds_are_widened_never_narrowed() {
    let mut compendium = minimal_compendium();
    compendium.occupations[0].low_challenge = Some(Challenge::Zero);
    compendium.occupations[0].high_challenge = Some(Challenge::Thirty);
    let store = Arc::new(MemoryStore::from_compendium(&compendium).unwrap());
    let job = RecomputeJob::new(Arc::clone(&store) as Arc<dyn DocumentStore>, config());

    let report = job.run(Arc::new(compendium)).await;

    assert!(report
        .updates
        .iter()
        .all(|update| update.kind == EntityKind::Race));
    let reloaded = load_compendium(store.as_ref()).await.unwrap();
    assert_eq!(reloaded.occupations[0].low_challenge, Some(Challenge::Zero));
    assert_eq!(reloaded.occupations[0].high_challenge, Some(Challenge::Thirty));
}

#[tokio::test]
async fn empty_compendium_writes_nothing() {
    let store = Arc::new(MemoryStore::from_compendium(&Compendium::default()).unwrap());
    let job = RecomputeJob::new(Arc::clone(&store) as Arc<dyn DocumentStore>, config());

    let report = job.run(Arc::new(Compendium::default())).await;

    assert_eq!(report.combinations, 0);
    assert_eq!(report.writes(), 0);
    assert!(report.failures.is_empty());
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn failed_write_is_reported_without_aborting_the_rest() {
    let compendium = fixture_compendium();
    let store = Arc::new(FlakyStore {
        inner: MemoryStore::from_compendium(&compendium).unwrap(),
        failing_id: "guard",
    });
    let job = RecomputeJob::new(Arc::clone(&store) as Arc<dyn DocumentStore>, config());

    let report = job.run(Arc::new(compendium)).await;

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].scope, "occupations/guard");
    assert!(report.failures[0].reason.contains("refused"));
    assert_eq!(report.writes(), 3);
    assert_eq!(store.inner.write_count(), 3);
}

#[tokio::test]
async fn cancelled_job_writes_nothing() {
    let compendium = fixture_compendium();
    let store = Arc::new(MemoryStore::from_compendium(&compendium).unwrap());
    let job = RecomputeJob::new(Arc::clone(&store) as Arc<dyn DocumentStore>, config());
    job.cancel_token().cancel();

    let report = job.run(Arc::new(compendium)).await;

    assert!(report.cancelled);
    assert_eq!(report.writes(), 0);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn elapsed_deadline_skips_every_write() {
    let compendium = fixture_compendium();
    let store = Arc::new(MemoryStore::from_compendium(&compendium).unwrap());
    let config = RecomputeConfig {
        deadline: Some(Duration::ZERO),
        ..config()
    };
    let job = RecomputeJob::new(Arc::clone(&store) as Arc<dyn DocumentStore>, config);

    let report = job.run(Arc::new(compendium)).await;

    assert!(report.cancelled);
    assert_eq!(store.write_count(), 0);
}
