//! Integration tests for the controller's play/stop surface and signal
//! scoping.

use std::sync::Arc;

use media_events::{MediaEvent, ScriptedResource};
use mediaflow::{
    AudioController, BusyPolicy, SessionConfig, SessionError, SignalScope, TeardownReason,
};

fn controller_with(config: SessionConfig) -> (Arc<ScriptedResource>, AudioController) {
    let resource = Arc::new(ScriptedResource::new());
    let controller = AudioController::with_config(resource.clone(), config).unwrap();
    (resource, controller)
}

#[test]
fn test_play_is_cold() {
    let resource = Arc::new(ScriptedResource::new());
    let controller = AudioController::new(resource.clone());

    let session = controller.play("track.mp3");

    assert_eq!(session.uri(), "track.mp3");
    assert!(session.signal().same_signal(&controller.signal()));
    assert_eq!(resource.listener_count(), 0);
    assert!(!controller.is_busy());
}

#[test]
fn test_stop_cancels_immediately() {
    let (resource, controller) = controller_with(SessionConfig::default());
    let mut stream = controller.play("track.mp3").subscribe().unwrap();
    resource.tick(0.4);
    assert!(controller.is_busy());

    assert_eq!(controller.stop(), 1);

    // Teardown completed before stop() returned
    assert!(stream.is_terminated());
    assert_eq!(stream.termination(), Some(TeardownReason::Cancelled));
    assert_eq!(resource.listener_count(), 0);
    assert_eq!(resource.pause_calls(), 1);
    assert_eq!(resource.source(), "");
    assert!(!controller.is_busy());

    resource.tick(0.8);
    let items: Vec<_> = stream.try_iter().collect();
    assert_eq!(items.len(), 1);
}

#[test]
fn test_stop_without_sessions_is_harmless() {
    let (resource, controller) = controller_with(SessionConfig::default());
    assert_eq!(controller.stop(), 0);
    assert_eq!(controller.stop(), 0);
    assert_eq!(resource.pause_calls(), 0);
}

#[test]
fn test_replaced_session_leaves_the_signal() {
    let config = SessionConfig::default().with_busy_policy(BusyPolicy::Replace);
    let (resource, controller) = controller_with(config);

    let first = controller.play("a.mp3").subscribe().unwrap();
    let second = controller.play("b.mp3").subscribe().unwrap();
    assert_eq!(first.termination(), Some(TeardownReason::Replaced));
    assert_eq!(controller.signal().subscriber_count(), 1);

    assert_eq!(controller.stop(), 1);
    assert_eq!(second.termination(), Some(TeardownReason::Cancelled));
    assert_eq!(resource.listener_count(), 0);
}

#[test]
fn test_per_stop_scope_installs_fresh_signal() {
    let (resource, controller) = controller_with(SessionConfig::default());
    let before = controller.signal();

    controller.stop();

    let after = controller.signal();
    assert!(before.is_fired());
    assert!(!after.is_fired());
    assert!(!before.same_signal(&after));

    let stream = controller.play("next.mp3").subscribe().unwrap();
    assert!(!stream.is_terminated());
    assert_eq!(resource.source(), "next.mp3");
}

#[test]
fn test_session_built_before_stop_is_cancelled_on_subscribe() {
    let (resource, controller) = controller_with(SessionConfig::default());
    let stale = controller.play("stale.mp3");

    controller.stop();
    let stream = stale.subscribe().unwrap();

    assert_eq!(stream.termination(), Some(TeardownReason::Cancelled));
    assert_eq!(resource.listener_count(), 0);
    assert!(!resource.source_history().contains(&"stale.mp3".to_string()));
}

#[test]
fn test_lifetime_scope_keeps_fired_signal() {
    let config = SessionConfig::default().with_signal_scope(SignalScope::Lifetime);
    let (resource, controller) = controller_with(config);

    let first = controller.play("a.mp3").subscribe().unwrap();
    controller.stop();
    assert_eq!(first.termination(), Some(TeardownReason::Cancelled));

    // Every later session is cancelled as soon as it subscribes
    let later = controller.play("b.mp3").subscribe().unwrap();
    assert_eq!(later.termination(), Some(TeardownReason::Cancelled));
    assert!(controller.signal().is_fired());
    assert_eq!(resource.listener_count(), 0);
}

#[test]
fn test_busy_controller_rejects_second_play() {
    let (resource, controller) = controller_with(SessionConfig::default());
    let first = controller.play("a.mp3").subscribe().unwrap();

    let result = controller.play("b.mp3").subscribe();

    assert!(matches!(result, Err(SessionError::ResourceBusy(id)) if id == first.session_id()));
    assert_eq!(controller.active_session(), Some(first.session_id()));
    assert_eq!(resource.play_calls(), 0);
}

#[test]
fn test_natural_end_frees_controller() {
    let (resource, controller) = controller_with(SessionConfig::default());
    let stream = controller.play("a.mp3").subscribe().unwrap();

    resource.emit(MediaEvent::Ended);

    assert_eq!(stream.termination(), Some(TeardownReason::Ended));
    assert!(!controller.is_busy());
    assert_eq!(controller.signal().subscriber_count(), 0);
    assert!(controller.play("b.mp3").subscribe().is_ok());
}

#[test]
fn test_with_config_validates() {
    let resource = Arc::new(ScriptedResource::new());
    let config = SessionConfig::default().with_events([MediaEvent::Ended, MediaEvent::Error]);

    let result = AudioController::with_config(resource, config);
    assert!(matches!(result, Err(SessionError::Configuration(_))));
}
