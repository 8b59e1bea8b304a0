mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as Age;

use bc_domain::config::CacheConfig;
use bc_domain::error::Error;
use bc_domain::{CachedState, Category};
use bc_sessions::{
    FreshnessPolicy, JsonFileStore, MemoryStore, PersistenceStore, RefreshPipeline,
    SessionOrchestrator, StaticDevice, TurnContext,
};

use common::{address, event, location, now, FakeCouncil, Probe, TZ};

fn council() -> Arc<FakeCouncil> {
    Arc::new(
        FakeCouncil::default()
            .with_postcode(
                "TE57PC",
                vec![location("L1", "40"), location("L2", "42"), location("L3", "44")],
            )
            .with_location(
                "L2",
                Probe::Events(vec![
                    event(1, &[Category::Domestic]),
                    event(8, &[Category::Recycle]),
                ]),
            ),
    )
}

fn orchestrator(
    council: Arc<FakeCouncil>,
    store: Arc<dyn PersistenceStore>,
) -> SessionOrchestrator {
    SessionOrchestrator::new(
        store,
        Arc::new(StaticDevice::new(address("42 Mill Lane", "TE5 7PC"))),
        RefreshPipeline::new(council, 12, 3, Duration::from_millis(200)),
        FreshnessPolicy::new(&CacheConfig::default(), TZ),
    )
}

fn ctx() -> TurnContext {
    TurnContext {
        user_id: "amzn1.ask.account.TEST".into(),
        device_id: "kitchen".into(),
        consent_token: Some("token".into()),
    }
}

#[tokio::test]
async fn first_turn_refreshes_and_persists() {
    let council = council();
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(council.clone(), store.clone());

    let mut turn = orch.begin_turn(&ctx(), None, now()).await.unwrap();
    assert!(turn.refreshed);
    assert_eq!(turn.state.collections.len(), 2);
    assert!(turn.state.dirty);

    orch.end_turn(&ctx(), &mut turn.state).await.unwrap();
    assert!(!turn.state.dirty);

    let saved = store.load(&ctx().user_id).await.unwrap().unwrap();
    assert_eq!(saved.collections, turn.state.collections);
    assert!(!saved.dirty);
}

#[tokio::test]
async fn second_turn_uses_persisted_state() {
    let council = council();
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(council.clone(), store.clone());

    let mut first = orch.begin_turn(&ctx(), None, now()).await.unwrap();
    orch.end_turn(&ctx(), &mut first.state).await.unwrap();
    let probes_after_first = council.probed().len();

    let second = orch
        .begin_turn(&ctx(), None, now() + Age::hours(3))
        .await
        .unwrap();
    assert!(!second.refreshed);
    assert_eq!(council.searches(), 1);
    assert_eq!(council.probed().len(), probes_after_first);
}

#[tokio::test]
async fn old_schedule_is_refreshed_with_cached_lookup() {
    let council = council();
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(council.clone(), store.clone());

    let mut first = orch.begin_turn(&ctx(), None, now()).await.unwrap();
    orch.end_turn(&ctx(), &mut first.state).await.unwrap();

    let later = orch
        .begin_turn(&ctx(), None, now() + Age::hours(30))
        .await
        .unwrap();
    assert!(later.refreshed);
    // Postcode lookups live for a week.
    assert_eq!(council.searches(), 1);
}

#[tokio::test]
async fn loaded_state_forgets_pending_question() {
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(council(), store.clone());

    let mut first = orch.begin_turn(&ctx(), None, now()).await.unwrap();
    first.state.missed_question = true;
    first.state.current_category = Some(Category::Recycle);
    first.state.mark_dirty();
    orch.end_turn(&ctx(), &mut first.state).await.unwrap();

    let next = orch.begin_turn(&ctx(), None, now()).await.unwrap();
    assert!(!next.state.missed_question);
    assert_eq!(next.state.current_category, Some(Category::Recycle));

    // Session-carried state is taken as is.
    let carried = orch
        .begin_turn(&ctx(), Some(first.state.clone()), now())
        .await
        .unwrap();
    assert!(carried.state.missed_question);
}

#[tokio::test]
async fn skip_persist_never_writes() {
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(council(), store.clone()).skip_persist(true);

    let mut turn = orch.begin_turn(&ctx(), None, now()).await.unwrap();
    orch.end_turn(&ctx(), &mut turn.state).await.unwrap();

    assert!(!turn.state.dirty);
    assert!(store.is_empty());
}

#[tokio::test]
async fn clean_state_is_not_saved() {
    let store = Arc::new(MemoryStore::new());
    let orch = orchestrator(council(), store.clone());
    let mut state = CachedState::default();
    orch.end_turn(&ctx(), &mut state).await.unwrap();
    assert!(store.is_empty());
}

#[tokio::test]
async fn missing_consent_is_reported() {
    let orch = orchestrator(council(), Arc::new(MemoryStore::new()));
    let mut c = ctx();
    c.consent_token = None;
    let err = orch.begin_turn(&c, None, now()).await.unwrap_err();
    assert!(matches!(err, Error::MissingConsent(_)));
    assert!(err.needs_consent_prompt());
}

#[tokio::test]
async fn denied_address_access_is_reported() {
    let orch = SessionOrchestrator::new(
        Arc::new(MemoryStore::new()),
        Arc::new(StaticDevice::without_permission()),
        RefreshPipeline::new(council(), 12, 3, Duration::from_millis(200)),
        FreshnessPolicy::new(&CacheConfig::default(), TZ),
    );
    let err = orch.begin_turn(&ctx(), None, now()).await.unwrap_err();
    assert!(matches!(err, Error::PermissionDenied(_)));
}

#[tokio::test]
async fn forced_refresh_ignores_freshness() {
    let council = council();
    let orch = orchestrator(council.clone(), Arc::new(MemoryStore::new()));

    let first = orch.begin_turn(&ctx(), None, now()).await.unwrap();
    let probes = council.probed().len();
    let again = orch.force_refresh(&ctx(), now()).await.unwrap();
    assert!(council.probed().len() > probes);
    // The cached postcode lookup is not reused either.
    assert_eq!(council.searches(), 2);
    assert_eq!(again.collections, first.state.collections);
}

#[tokio::test]
async fn background_refresh_persists_to_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path()).unwrap());
    let orch = orchestrator(council(), store.clone());

    let turn = orch.begin_turn(&ctx(), None, now()).await.unwrap();
    orch.refresh_in_background(&ctx(), &turn.identity, &turn.state, now())
        .await
        .unwrap();

    let saved = store.load(&ctx().user_id).await.unwrap().unwrap();
    assert_eq!(saved.collections.len(), 2);
}

#[tokio::test]
async fn unreadable_saved_state_is_replaced_by_a_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path()).unwrap());
    std::fs::write(
        dir.path().join("users").join("amzn1.ask.account.TEST.json"),
        r#"{"collections":[{"date":"2026-10-19T00:00:00Z","roundTypes":["GLASS"]}]}"#,
    )
    .unwrap();
    assert!(matches!(store.load(&ctx().user_id).await, Err(Error::Json(_))));

    let council = council();
    let orch = orchestrator(council.clone(), store.clone());
    let mut turn = orch.begin_turn(&ctx(), None, now()).await.unwrap();
    assert!(turn.refreshed);
    assert_eq!(turn.state.collections.len(), 2);
    assert_eq!(council.searches(), 1);

    orch.end_turn(&ctx(), &mut turn.state).await.unwrap();
    let saved = store.load(&ctx().user_id).await.unwrap().unwrap();
    assert_eq!(saved.collections, turn.state.collections);
}
