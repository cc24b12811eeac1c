// Registry and state-machine behavior: compare-and-set transitions,
// ownership enforcement, and the duration guard's forced completion.

mod common;

use chrono::Duration;
use common::{free_account, pipeline};
use meeting_minutes::{DurationGuard, MeetingStatus, PipelineError};

#[tokio::test]
async fn create_and_read_back() {
    let p = pipeline().await;
    let account = free_account("acct-1");

    let meeting = p
        .registry
        .create(&account, "weekly standup", vec!["Aoi".to_string()], 30)
        .await
        .unwrap();

    assert_eq!(meeting.status, MeetingStatus::Recording);
    assert_eq!(meeting.max_duration_minutes, 30);

    let read = p.registry.get(&meeting.id, &account.id).await.unwrap();
    assert_eq!(read.id, meeting.id);
    assert_eq!(read.title, "weekly standup");
    assert_eq!(read.participants, vec!["Aoi".to_string()]);
}

#[tokio::test]
async fn reads_are_ownership_scoped() {
    let p = pipeline().await;
    let owner = free_account("acct-owner");
    let intruder = free_account("acct-intruder");

    let meeting = p.registry.create(&owner, "private", vec![], 30).await.unwrap();

    // Another account's session is indistinguishable from an absent one.
    let err = p.registry.get(&meeting.id, &intruder.id).await.unwrap_err();
    assert!(matches!(err, PipelineError::NotFound));

    let err = p
        .registry
        .transition(
            &meeting.id,
            &intruder.id,
            MeetingStatus::Recording,
            MeetingStatus::Processing,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NotFound));

    let err = p.registry.remove(&meeting.id, &intruder.id).await.unwrap_err();
    assert!(matches!(err, PipelineError::NotFound));
}

#[tokio::test]
async fn transition_is_a_guarded_compare_and_set() {
    let p = pipeline().await;
    let account = free_account("acct-1");
    let meeting = p.registry.create(&account, "m", vec![], 30).await.unwrap();

    let updated = p
        .registry
        .transition(
            &meeting.id,
            &account.id,
            MeetingStatus::Recording,
            MeetingStatus::Processing,
        )
        .await
        .unwrap();
    assert_eq!(updated.status, MeetingStatus::Processing);

    // Second identical CAS loses: the session is no longer Recording.
    let err = p
        .registry
        .transition(
            &meeting.id,
            &account.id,
            MeetingStatus::Recording,
            MeetingStatus::Processing,
        )
        .await
        .unwrap_err();
    match err {
        PipelineError::InvalidStateTransition { from, to } => {
            assert_eq!(from, MeetingStatus::Processing);
            assert_eq!(to, MeetingStatus::Processing);
        }
        other => panic!("expected InvalidStateTransition, got {other:?}"),
    }
}

#[tokio::test]
async fn completed_never_regresses() {
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
    let completed = p
        .registry
        .set_summary_and_complete(&meeting.id, "summary".to_string())
        .await
        .unwrap();
    assert_eq!(completed.status, MeetingStatus::Completed);
    assert_eq!(completed.summary.as_deref(), Some("summary"));

    for to in [
        MeetingStatus::Recording,
        MeetingStatus::Processing,
        MeetingStatus::Error,
        MeetingStatus::CompletedWithoutSummary,
    ] {
        let err = p
            .registry
            .transition(&meeting.id, &account.id, MeetingStatus::Completed, to)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidStateTransition { .. }));
    }
}

#[tokio::test]
async fn list_returns_newest_first() {
    let p = pipeline().await;
    let account = free_account("acct-1");

    let first = p.registry.create(&account, "first", vec![], 30).await.unwrap();
    let second = p.registry.create(&account, "second", vec![], 30).await.unwrap();
    let third = p.registry.create(&account, "third", vec![], 30).await.unwrap();

    let listed = p.registry.list(&account.id).await;
    let ids: Vec<_> = listed.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);

    // Another account sees nothing.
    let other = free_account("acct-2");
    assert!(p.registry.list(&other.id).await.is_empty());
}

#[tokio::test]
async fn remove_drops_the_session() {
    let p = pipeline().await;
    let account = free_account("acct-1");
    let meeting = p.registry.create(&account, "m", vec![], 30).await.unwrap();

    let (removed, fragments) = p.registry.remove(&meeting.id, &account.id).await.unwrap();
    assert_eq!(removed.id, meeting.id);
    assert!(fragments.is_empty());

    let err = p.registry.get(&meeting.id, &account.id).await.unwrap_err();
    assert!(matches!(err, PipelineError::NotFound));
}

#[tokio::test]
async fn guard_allows_below_the_ceiling() {
    let p = pipeline().await;
    let account = free_account("acct-1");
    let meeting = p.registry.create(&account, "m", vec![], 30).await.unwrap();

    let now = meeting.started_at + Duration::minutes(29);
    DurationGuard::check_admission(&p.registry, &meeting, now)
        .await
        .unwrap();

    let after = p.registry.get(&meeting.id, &account.id).await.unwrap();
    assert_eq!(after.status, MeetingStatus::Recording);
}

#[tokio::test]
async fn guard_rejects_and_force_completes_at_the_ceiling() {
    let p = pipeline().await;
    let account = free_account("acct-1");
    let meeting = p.registry.create(&account, "m", vec![], 30).await.unwrap();

    let now = meeting.started_at + Duration::minutes(31);
    let err = DurationGuard::check_admission(&p.registry, &meeting, now)
        .await
        .unwrap_err();
    match err {
        PipelineError::DurationExceeded { limit_minutes } => assert_eq!(limit_minutes, 30),
        other => panic!("expected DurationExceeded, got {other:?}"),
    }

    // The rejection's side effect: recording is over, summary still owed.
    let after = p.registry.get(&meeting.id, &account.id).await.unwrap();
    assert_eq!(after.status, MeetingStatus::CompletedWithoutSummary);
}

#[tokio::test]
async fn usage_flag_flips_once() {
    let p = pipeline().await;
    let account = free_account("acct-1");
    let meeting = p.registry.create(&account, "m", vec![], 30).await.unwrap();

    assert!(p.registry.try_mark_usage_counted(&meeting.id).await.unwrap());
    assert!(!p.registry.try_mark_usage_counted(&meeting.id).await.unwrap());
    assert!(!p.registry.try_mark_usage_counted(&meeting.id).await.unwrap());
}
