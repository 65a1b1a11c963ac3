mod common;

use common::{engine, past};
use pretty_assertions::assert_eq;
use sentinel_core::prelude::*;
use sentinel_state::{ActivityType, RetentionPeriod};
use sentinel_test_utils::activity_titles;

#[tokio::test(start_paused = true)]
async fn test_document_expires_after_retention_window() {
    let engine = engine();
    let doc = engine
        .documents()
        .upload_document("statement.pdf", b"%PDF")
        .unwrap();

    tokio::time::sleep(past(89)).await;
    assert!(engine.store().snapshot().document(doc.id).is_some());

    tokio::time::sleep(past(1)).await;
    let state = engine.store().snapshot();
    assert!(state.document(doc.id).is_none());
    assert_eq!(state.activities[0].activity_type, ActivityType::PolicyAction);
    assert_eq!(
        state.activities[0].description,
        "Document statement.pdf expired and was automatically deleted"
    );
}

#[tokio::test(start_paused = true)]
async fn test_explicit_delete_before_window_emits_nothing() {
    let engine = engine();
    let doc = engine
        .documents()
        .upload_document("statement.pdf", b"%PDF")
        .unwrap();
    assert!(engine.documents().delete(doc.id));
    let before = engine.store().snapshot();

    tokio::time::sleep(past(90)).await;
    assert_eq!(*engine.store().snapshot(), *before);
}

#[tokio::test(start_paused = true)]
async fn test_raw_delete_racing_timer_is_absorbed() {
    let engine = engine();
    let doc = engine
        .documents()
        .upload_document("statement.pdf", b"%PDF")
        .unwrap();
    // bypass the service so the timer stays armed
    engine.store().dispatch(Action::DeleteDocument(doc.id));
    let revision = engine.store().revision();

    tokio::time::sleep(past(90)).await;
    assert_eq!(engine.store().revision(), revision);
    assert!(!activity_titles(&engine.store().snapshot()).contains(&"Document Auto-Deleted"));
}

#[tokio::test(start_paused = true)]
async fn test_disabling_auto_delete_before_fire_keeps_document() {
    let engine = engine();
    let doc = engine
        .documents()
        .upload_document("statement.pdf", b"%PDF")
        .unwrap();
    engine.update_settings(SettingsPatch::new().with_auto_delete(false));

    tokio::time::sleep(past(90)).await;
    let state = engine.store().snapshot();
    assert!(state.document(doc.id).is_some());
    assert!(state
        .activities
        .iter()
        .all(|a| a.activity_type != ActivityType::PolicyAction));
}

#[tokio::test(start_paused = true)]
async fn test_retention_uses_period_in_effect_at_upload() {
    let engine = engine();
    engine.update_settings(SettingsPatch::new().with_retention(RetentionPeriod::Days30));
    let early = engine
        .documents()
        .upload_document("early.csv", b"a,b")
        .unwrap();
    engine.update_settings(SettingsPatch::new().with_retention(RetentionPeriod::Days180));
    let late = engine
        .documents()
        .upload_document("late.csv", b"c,d")
        .unwrap();

    tokio::time::sleep(past(30)).await;
    let state = engine.store().snapshot();
    assert!(state.document(early.id).is_none());
    assert!(state.document(late.id).is_some());

    tokio::time::sleep(past(150)).await;
    assert!(engine.store().snapshot().documents.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_upload_with_auto_delete_off_arms_nothing() {
    let engine = engine();
    engine.update_settings(SettingsPatch::new().with_auto_delete(false));
    let doc = engine
        .documents()
        .upload_document("statement.pdf", b"%PDF")
        .unwrap();
    assert!(!engine.documents().retention().is_armed(doc.id));
    assert_eq!(engine.documents().retention().pending_count(), 0);
}
