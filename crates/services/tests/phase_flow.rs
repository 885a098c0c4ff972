mod common;

use std::sync::Arc;

use common::{Contract, FakeCompletion, app_services, module, start_shell};
use gym_core::model::{Catalog, Phase, ScenarioId};
use gym_core::time::fixed_clock;
use gym_core::{Strength, classify};
use services::{
    AppServices, CoachingError, PROGRESS_KEY, ProgressStore, SaveStatus, ShellError,
};
use storage::repository::{InMemoryRepository, KeyValueStore};

const RESPONSE: &str = "Ten years on this committee and I have never once missed a deadline.";

fn complete_recognition(shell: &mut services::SessionShell) {
    for _ in 0..3 {
        shell.open(&module(), Phase::Recognition, None).unwrap();
        shell.select_option("a").unwrap();
        shell.submit_recognition().unwrap();
    }
}

#[tokio::test]
async fn correct_recognition_answer_is_recorded_once() {
    let fake = FakeCompletion::new();
    let mut shell = start_shell(&fake).await;
    let id = ScenarioId::new("m1-p1-s1");

    shell.open(&module(), Phase::Recognition, Some(&id)).unwrap();
    shell.select_option("a").unwrap();
    let reveal = shell.submit_recognition().unwrap();
    assert!(reveal.is_correct);
    assert_eq!(reveal.explanation, "Credibility wins.");

    shell.open(&module(), Phase::Recognition, Some(&id)).unwrap();
    shell.select_option("b").unwrap();
    let replay = shell.submit_recognition().unwrap();
    assert!(!replay.is_correct);
    assert!(!replay.newly_completed);

    let progress = shell.progress();
    assert_eq!(progress.completed_count(&module(), Phase::Recognition), 1);
    let stat = progress.principle_stat("Ethos").unwrap();
    assert_eq!((stat.attempts(), stat.successes()), (1, 1));
    assert_eq!(classify("Ethos", &progress), Strength::Strong);
}

#[tokio::test]
async fn coaching_unlocks_after_three_recognitions() {
    let fake = FakeCompletion::happy();
    let mut shell = start_shell(&fake).await;

    assert!(matches!(
        shell.open(&module(), Phase::Coaching, None),
        Err(ShellError::Locked { remaining: 3, .. })
    ));
    complete_recognition(&mut shell);

    let dashboard = shell.dashboard();
    let overview = dashboard.module(&module()).unwrap();
    assert_eq!(overview.completed, 3);
    assert!(overview.phases[1].unlocked);
    assert!(!overview.phases[2].unlocked);

    let active = shell.open(&module(), Phase::Coaching, None).unwrap();
    assert_eq!(active.scenario_id(), &ScenarioId::new("m1-p2-s1"));
}

#[tokio::test]
async fn short_coaching_text_is_a_no_op() {
    let fake = FakeCompletion::happy();
    let mut shell = start_shell(&fake).await;
    complete_recognition(&mut shell);
    shell.open(&module(), Phase::Coaching, None).unwrap();
    let before = shell.progress();

    let outcome = shell.request_coaching("Trust me, please.").await.unwrap();

    assert!(outcome.is_none());
    assert_eq!(fake.calls(Contract::Grade), 0);
    assert_eq!(*shell.progress(), *before);
}

#[tokio::test]
async fn malformed_grade_leaves_state_unchanged() {
    let fake = FakeCompletion::happy();
    let mut shell = start_shell(&fake).await;
    complete_recognition(&mut shell);
    shell.open(&module(), Phase::Coaching, None).unwrap();
    let before = shell.progress();

    fake.reply_next(Contract::Grade, r#"{"rating": "excellent"}"#);
    let err = shell.request_coaching(RESPONSE).await.unwrap_err();
    assert!(matches!(
        err,
        ShellError::Coaching(CoachingError::Reply(_))
    ));
    assert_eq!(*shell.progress(), *before);

    fake.fail_next(Contract::Grade);
    let err = shell.request_coaching(RESPONSE).await.unwrap_err();
    assert!(matches!(&err, ShellError::Coaching(e) if e.is_retryable()));

    let report = shell.request_coaching(RESPONSE).await.unwrap().unwrap();
    assert_eq!(report.rating, 4);
    assert_eq!(report.enhanced_version, "Rewritten.");
}

#[tokio::test]
async fn regrading_refreshes_score_but_not_completion() {
    let fake = FakeCompletion::happy();
    let mut shell = start_shell(&fake).await;
    complete_recognition(&mut shell);
    let id = ScenarioId::new("m1-p2-s1");
    shell.open(&module(), Phase::Coaching, Some(&id)).unwrap();

    shell.request_coaching(RESPONSE).await.unwrap();
    shell.try_again().unwrap();
    fake.reply_next(Contract::Grade, &common::GRADE.replace("\"rating\": 4", "\"rating\": 2"));
    shell.request_coaching(RESPONSE).await.unwrap();

    let progress = shell.progress();
    assert_eq!(progress.completed_count(&module(), Phase::Coaching), 1);
    let ethos = progress.principle_stat("Ethos").unwrap();
    assert_eq!(ethos.rated_attempts(), 2);
    assert_eq!(ethos.avg_rating(), Some(3.0));
    assert_eq!(ethos.attempts(), 3);
}

#[tokio::test]
async fn progress_survives_a_new_session() {
    let fake = FakeCompletion::new();
    let services = app_services(&fake);

    let mut first = services.start_session().await;
    complete_recognition(&mut first);
    first.flush().await;
    assert_eq!(first.save_status(), SaveStatus::Saved);

    let second = services.start_session().await;
    assert_eq!(second.progress().completed_count(&module(), Phase::Recognition), 3);
}

#[tokio::test]
async fn stored_snapshot_uses_the_progress_key() {
    let repo = InMemoryRepository::new();
    let store = ProgressStore::new(Arc::new(repo.clone()), fixed_clock());
    let progress = store.load().await;
    store.save(&progress).await;

    let raw = repo.get(PROGRESS_KEY).await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(value.get("last_activity").is_some());
}

#[test]
fn bundled_demo_catalog_parses() {
    let catalog = Catalog::from_json_str(include_str!("../../../demos/catalog.json")).unwrap();
    assert!(catalog.modules().count() >= 1);
    let _ = AppServices::in_memory(catalog, fixed_clock());
}
