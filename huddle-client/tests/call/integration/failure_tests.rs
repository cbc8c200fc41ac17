use huddle_client::call::{CallConfig, CallEvent, CallState};
use huddle_client::error::CallError;
use huddle_client::media::MediaError;
use huddle_client::membership::RoomEvent;
use huddle_client::transport::TransportEvent;
use std::time::Duration;

use crate::utils::{CountingMediaSource, Participant, SilentPeer, init_tracing, spawn_relay};

fn short_ring() -> CallConfig {
    CallConfig {
        ring_timeout: Duration::from_millis(500),
    }
}

#[tokio::test]
async fn unanswered_offer_times_out_without_ever_going_active() {
    init_tracing();
    let addr = spawn_relay().await;

    let mut caller = Participant::join(
        addr,
        "r1",
        "a@x.com",
        CountingMediaSource::new(1),
        short_ring(),
    )
    .await
    .expect("caller join");

    // The callee joins but never answers anything.
    let _silent = SilentPeer::join(addr, "r1", "b@x.com").await.expect("silent join");

    caller
        .wait_for_state(CallState::Ringing)
        .await
        .expect("caller rings");

    // The only way out of Ringing without an answer is the timeout.
    loop {
        match caller.next_event().await.expect("event") {
            CallEvent::Failed(CallError::RingTimeout) => break,
            CallEvent::StateChanged(CallState::Active) => {
                panic!("went active without an answer")
            }
            _ => continue,
        }
    }
    caller
        .wait_for_state(CallState::Ended)
        .await
        .expect("caller ends");

    assert_eq!(caller.media.live(), 0, "capture must be released");
    assert!(caller.transport.is_closed());
}

#[tokio::test]
async fn peer_disconnect_mid_ringing_ends_the_call() {
    init_tracing();
    let addr = spawn_relay().await;

    let mut caller = Participant::join(
        addr,
        "r1",
        "a@x.com",
        CountingMediaSource::new(1),
        CallConfig::default(),
    )
    .await
    .expect("caller join");

    let silent = SilentPeer::join(addr, "r1", "b@x.com").await.expect("silent join");

    caller
        .wait_for_state(CallState::Ringing)
        .await
        .expect("caller rings");

    silent.disconnect();

    loop {
        match caller.next_event().await.expect("event") {
            CallEvent::Failed(CallError::PeerGone) => break,
            CallEvent::StateChanged(CallState::Active) => {
                panic!("stale answer applied after peer left")
            }
            _ => continue,
        }
    }
    caller
        .wait_for_state(CallState::Ended)
        .await
        .expect("caller ends");

    assert_eq!(caller.media.live(), 0, "capture must be released");
}

#[tokio::test]
async fn media_failure_aborts_setup_and_sends_nothing() {
    init_tracing();
    let addr = spawn_relay().await;

    let mut caller = Participant::join(
        addr,
        "r1",
        "a@x.com",
        CountingMediaSource::failing(MediaError::PermissionDenied),
        CallConfig::default(),
    )
    .await
    .expect("caller join");

    let mut silent = SilentPeer::join(addr, "r1", "b@x.com").await.expect("silent join");

    loop {
        match caller.next_event().await.expect("event") {
            CallEvent::SetupFailed(CallError::Media(MediaError::PermissionDenied)) => break,
            CallEvent::StateChanged(state) => panic!("unexpected state change to {state:?}"),
            _ => continue,
        }
    }

    // The would-be callee saw its join echo and nothing else: no offer
    // ever left the failing side.
    match silent.next_event().await.expect("join echo") {
        RoomEvent::Joined { .. } => {}
        other => panic!("expected Joined, got {other:?}"),
    }
    let quiet =
        tokio::time::timeout(Duration::from_millis(300), silent.next_event()).await;
    assert!(quiet.is_err(), "no signal may reach the peer");
}

#[tokio::test]
async fn hang_up_cascades_to_the_other_side() {
    init_tracing();
    let addr = spawn_relay().await;

    let mut caller = Participant::join(
        addr,
        "r1",
        "a@x.com",
        CountingMediaSource::new(1),
        CallConfig::default(),
    )
    .await
    .expect("caller join");

    let mut callee = Participant::join(
        addr,
        "r1",
        "b@x.com",
        CountingMediaSource::new(1),
        CallConfig::default(),
    )
    .await
    .expect("callee join");

    caller
        .wait_for_state(CallState::Active)
        .await
        .expect("caller active");
    callee
        .wait_for_state(CallState::Active)
        .await
        .expect("callee active");

    caller.call.hang_up().await;
    caller
        .wait_for_state(CallState::Ended)
        .await
        .expect("caller ends");
    assert_eq!(caller.media.live(), 0);

    // The caller's connection closes with its controller; the relay tells
    // the callee, which ends with "peer gone".
    loop {
        match callee.next_event().await.expect("event") {
            CallEvent::Failed(CallError::PeerGone) => break,
            _ => continue,
        }
    }
    callee
        .wait_for_state(CallState::Ended)
        .await
        .expect("callee ends");
    assert_eq!(callee.media.live(), 0);
}

#[tokio::test]
async fn transport_death_ends_the_call() {
    init_tracing();
    let addr = spawn_relay().await;

    let mut caller = Participant::join(
        addr,
        "r1",
        "a@x.com",
        CountingMediaSource::new(1),
        CallConfig::default(),
    )
    .await
    .expect("caller join");

    let mut callee = Participant::join(
        addr,
        "r1",
        "b@x.com",
        CountingMediaSource::new(1),
        CallConfig::default(),
    )
    .await
    .expect("callee join");

    caller
        .wait_for_state(CallState::Active)
        .await
        .expect("caller active");
    callee
        .wait_for_state(CallState::Active)
        .await
        .expect("callee active");

    caller.transport.emit(TransportEvent::Closed).await;

    caller
        .wait_for_state(CallState::Ended)
        .await
        .expect("caller ends");
    assert_eq!(caller.media.live(), 0);
}
