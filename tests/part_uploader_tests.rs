// Tests for single-part upload retries
//
// The clock is paused so backoff delays are asserted exactly without
// actually sleeping.

mod common;

use anyhow::Result;
use bytes::Bytes;
use common::FakeRecordingsApi;
use recording_upload::api::RecordingsApi;
use recording_upload::upload::{
    ByteRange, PartState, PartTask, PartUploader, RetryPolicy, UploadError,
};
use std::sync::Arc;
use std::time::Duration;

fn uploader(api: &Arc<FakeRecordingsApi>) -> PartUploader {
    PartUploader::new(
        Arc::clone(api) as Arc<dyn RecordingsApi>,
        RetryPolicy::default(),
    )
}

fn task_for(api: &FakeRecordingsApi, part_number: usize) -> PartTask {
    PartTask::new(
        part_number as u32,
        ByteRange::new(0, 4),
        api.destination(part_number),
    )
}

#[tokio::test(start_paused = true)]
async fn test_permanent_failure_makes_four_attempts_with_linear_backoff() -> Result<()> {
    let api = Arc::new(FakeRecordingsApi::with_parts(1).fail_part_forever(1));
    let mut task = task_for(&api, 1);

    let err = uploader(&api)
        .upload(&mut task, Bytes::from_static(b"data"), "video/webm")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        UploadError::PartUploadFailed {
            part_number: 1,
            attempts: 4,
            ..
        }
    ));
    assert_eq!(task.state, PartState::Failed);
    assert_eq!(task.attempt_count, 4);
    assert!(task.confirmation_tag().is_none());

    let attempts = api.attempts_for(1);
    assert_eq!(attempts.len(), 4);

    let gaps: Vec<Duration> = attempts.windows(2).map(|w| w[1].at - w[0].at).collect();
    assert_eq!(
        gaps,
        vec![
            Duration::from_millis(2000),
            Duration::from_millis(4000),
            Duration::from_millis(6000),
        ]
    );

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_protocol_errors_are_retried() -> Result<()> {
    let api = Arc::new(
        FakeRecordingsApi::with_parts(1)
            .fail_part(1, 3)
            .with_part_error(UploadError::Protocol {
                message: "Missing ETag in response".into(),
            }),
    );
    let mut task = task_for(&api, 1);

    let tag = uploader(&api)
        .upload(&mut task, Bytes::from_static(b"data"), "video/webm")
        .await?;

    assert_eq!(tag, FakeRecordingsApi::tag_for(&api.destination(1)));
    assert_eq!(task.attempt_count, 4, "succeeds on the last allowed attempt");
    assert_eq!(task.state, PartState::Confirmed);
    assert_eq!(task.confirmation_tag(), Some(tag.as_str()));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_non_retryable_error_fails_first_attempt() -> Result<()> {
    let api = Arc::new(
        FakeRecordingsApi::with_parts(1)
            .fail_part_forever(1)
            .with_part_error(UploadError::Service {
                status: Some(500),
                message: "Server error".into(),
            }),
    );
    let mut task = task_for(&api, 1);

    let err = uploader(&api)
        .upload(&mut task, Bytes::from_static(b"data"), "video/webm")
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::PartUploadFailed { attempts: 1, .. }));
    assert_eq!(api.attempts_for(1).len(), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unauthorized_part_keeps_auth_classification() -> Result<()> {
    let api = Arc::new(
        FakeRecordingsApi::with_parts(1)
            .fail_part_forever(1)
            .with_part_error(UploadError::Unauthorized {
                message: "Invalid or expired token.".into(),
            }),
    );
    let mut task = task_for(&api, 1);

    let err = uploader(&api)
        .upload(&mut task, Bytes::from_static(b"data"), "video/webm")
        .await
        .unwrap_err();

    assert!(err.is_auth(), "unexpected error: {:?}", err);
    assert_eq!(task.state, PartState::Failed);
    assert_eq!(api.attempts_for(1).len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_confirmed_part_is_not_uploaded_again() -> Result<()> {
    let api = Arc::new(FakeRecordingsApi::with_parts(1));
    let mut task = task_for(&api, 1);
    assert!(task.confirm("existing-tag".to_string()));

    let tag = uploader(&api)
        .upload(&mut task, Bytes::from_static(b"data"), "video/webm")
        .await?;

    assert_eq!(tag, "existing-tag");
    assert!(api.calls().is_empty());

    Ok(())
}

#[test]
fn test_confirmation_tag_is_set_once() {
    let mut task = PartTask::new(3, ByteRange::new(10, 20), "https://storage.test/part/3".into());

    assert_eq!(task.state, PartState::Pending);
    assert!(task.confirm("first".to_string()));
    assert!(!task.confirm("second".to_string()));

    assert_eq!(task.confirmation_tag(), Some("first"));
    assert_eq!(task.state, PartState::Confirmed);
}

#[test]
fn test_retry_policy_defaults() {
    let policy = RetryPolicy::default();

    assert_eq!(policy.max_retries, 3);
    assert_eq!(policy.max_attempts(), 4);
    assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
    assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
    assert_eq!(policy.delay_for(3), Duration::from_millis(6000));
}
