// Fragment admission: fail-fast validation order, duplicate rejection,
// the started-at re-anchor latch, and upload tracking.

mod common;

use std::time::Duration;

use common::{free_account, pipeline, upload};
use meeting_minutes::{FragmentStatus, MeetingStatus, PipelineError};

#[tokio::test]
async fn admits_and_stores_a_fragment() {
    let p = pipeline().await;
    let account = free_account("acct-1");
    let meeting = p.registry.create(&account, "m", vec![], 30).await.unwrap();

    let fragment = upload(&p, meeting.id, &account, 1, "hello").await.unwrap();
    assert_eq!(fragment.sequence, 1);
    assert_eq!(fragment.status, FragmentStatus::Uploaded);
    assert_eq!(fragment.size_bytes, 5);

    // The blob is durable under the returned reference.
    let bytes = p.store.get(&fragment.storage_ref).await.unwrap();
    assert_eq!(bytes, b"hello");

    let fragments = p.registry.fragments_sorted(&meeting.id).await.unwrap();
    assert_eq!(fragments.len(), 1);
}

#[tokio::test]
async fn rejects_non_audio_content_types() {
    let p = pipeline().await;
    let account = free_account("acct-1");
    let meeting = p.registry.create(&account, "m", vec![], 30).await.unwrap();

    let err = p
        .ingester
        .admit(meeting.id, &account, 1, b"x".to_vec(), "text/plain")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));

    // Fail-fast: nothing was admitted.
    assert!(p.registry.fragments_sorted(&meeting.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn rejects_empty_and_oversize_payloads() {
    let p = pipeline().await;
    let account = free_account("acct-1");
    let meeting = p.registry.create(&account, "m", vec![], 30).await.unwrap();

    let err = p
        .ingester
        .admit(meeting.id, &account, 1, Vec::new(), "audio/webm")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));

    // Harness ceiling is 1 MiB.
    let oversize = vec![0u8; 1024 * 1024 + 1];
    let err = p
        .ingester
        .admit(meeting.id, &account, 1, oversize, "audio/webm")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));

    assert!(p.registry.fragments_sorted(&meeting.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn rejects_duplicate_sequence_numbers() {
    let p = pipeline().await;
    let account = free_account("acct-1");
    let meeting = p.registry.create(&account, "m", vec![], 30).await.unwrap();

    upload(&p, meeting.id, &account, 7, "first").await.unwrap();
    let err = upload(&p, meeting.id, &account, 7, "second").await.unwrap_err();
    assert!(matches!(err, PipelineError::InvalidInput(_)));

    let fragments = p.registry.fragments_sorted(&meeting.id).await.unwrap();
    assert_eq!(fragments.len(), 1);
}

#[tokio::test]
async fn sequence_numbers_may_have_gaps() {
    let p = pipeline().await;
    let account = free_account("acct-1");
    let meeting = p.registry.create(&account, "m", vec![], 30).await.unwrap();

    upload(&p, meeting.id, &account, 10, "ten").await.unwrap();
    upload(&p, meeting.id, &account, 2, "two").await.unwrap();
    upload(&p, meeting.id, &account, 40, "forty").await.unwrap();

    let sequences: Vec<u64> = p
        .registry
        .fragments_sorted(&meeting.id)
        .await
        .unwrap()
        .iter()
        .map(|f| f.sequence)
        .collect();
    assert_eq!(sequences, vec![2, 10, 40]);
}

#[tokio::test]
async fn rejects_uploads_once_recording_ended() {
    let p = pipeline().await;
    let account = free_account("acct-1");
    let meeting = p.registry.create(&account, "m", vec![], 30).await.unwrap();

    p.registry
        .transition(
            &meeting.id,
            &account.id,
            MeetingStatus::Recording,
            MeetingStatus::Processing,
        )
        .await
        .unwrap();

    let err = upload(&p, meeting.id, &account, 1, "late").await.unwrap_err();
    assert!(matches!(err, PipelineError::InvalidStateTransition { .. }));
}

#[tokio::test]
async fn rejects_uploads_from_other_accounts() {
    let p = pipeline().await;
    let owner = free_account("acct-owner");
    let intruder = free_account("acct-intruder");
    let meeting = p.registry.create(&owner, "m", vec![], 30).await.unwrap();

    let err = upload(&p, meeting.id, &intruder, 1, "sneaky").await.unwrap_err();
    assert!(matches!(err, PipelineError::NotFound));
}

#[tokio::test]
async fn first_fragment_anchors_the_clock_once() {
    let p = pipeline().await;
    let account = free_account("acct-1");
    let meeting = p.registry.create(&account, "m", vec![], 30).await.unwrap();
    assert!(!meeting.clock_anchored);
    let created_anchor = meeting.started_at;

    tokio::time::sleep(Duration::from_millis(20)).await;

    // Sequence number does not matter; the first admitted fragment anchors.
    upload(&p, meeting.id, &account, 5, "first").await.unwrap();
    let anchored = p.registry.get(&meeting.id, &account.id).await.unwrap();
    assert!(anchored.clock_anchored);
    assert!(anchored.started_at > created_anchor);

    upload(&p, meeting.id, &account, 6, "second").await.unwrap();
    let after_second = p.registry.get(&meeting.id, &account.id).await.unwrap();
    assert_eq!(after_second.started_at, anchored.started_at);
}

#[tokio::test]
async fn duration_guard_runs_on_admission() {
    let p = pipeline().await;
    let account = free_account("acct-1");

    // Zero-minute ceiling: the very first admission trips the guard.
    let meeting = p.registry.create(&account, "m", vec![], 0).await.unwrap();

    let err = upload(&p, meeting.id, &account, 1, "audio").await.unwrap_err();
    assert!(matches!(err, PipelineError::DurationExceeded { limit_minutes: 0 }));

    let after = p.registry.get(&meeting.id, &account.id).await.unwrap();
    assert_eq!(after.status, MeetingStatus::CompletedWithoutSummary);
    assert!(p.registry.fragments_sorted(&meeting.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn tracker_reports_in_flight_admissions() {
    let p = pipeline().await;
    let session_id = uuid::Uuid::new_v4();

    assert!(p.tracker.wait_idle(session_id, Duration::from_millis(10)).await);

    let guard = p.tracker.begin(session_id).await;
    assert_eq!(p.tracker.in_flight(session_id).await, 1);
    assert!(!p.tracker.wait_idle(session_id, Duration::from_millis(50)).await);

    drop(guard);
    assert_eq!(p.tracker.in_flight(session_id).await, 0);
    assert!(p.tracker.wait_idle(session_id, Duration::from_millis(10)).await);
}
