use huddle_core::{SessionDescription, SignalBody};

use crate::utils::{TestPeer, init_tracing, spawn_relay};

#[tokio::test]
async fn disconnect_broadcasts_peer_left_to_the_remaining_occupant() {
    init_tracing();
    let addr = spawn_relay().await;

    let mut p1 = TestPeer::connect(addr).await.expect("connect p1");
    p1.join("r1", "a@x.com").await.expect("join p1");
    p1.wait_joined().await.expect("p1 echo");

    let mut p2 = TestPeer::connect(addr).await.expect("connect p2");
    p2.join("r1", "b@x.com").await.expect("join p2");
    let p2_id = p2.wait_joined().await.expect("p2 echo");
    p1.wait_peer_joined().await.expect("p1 sees p2");

    p2.close().await.expect("close p2");

    let left = p1.wait_peer_left().await.expect("peer left");
    assert_eq!(left, p2_id);
}

#[tokio::test]
async fn offer_to_a_departed_peer_goes_nowhere() {
    init_tracing();
    let addr = spawn_relay().await;

    let mut p1 = TestPeer::connect(addr).await.expect("connect p1");
    p1.join("r1", "a@x.com").await.expect("join p1");
    p1.wait_joined().await.expect("p1 echo");

    let mut p2 = TestPeer::connect(addr).await.expect("connect p2");
    p2.join("r1", "b@x.com").await.expect("join p2");
    let p2_id = p2.wait_joined().await.expect("p2 echo");
    p1.wait_peer_joined().await.expect("p1 sees p2");

    p2.close().await.expect("close p2");
    p1.wait_peer_left().await.expect("peer left");

    // The caller may still try to dial the stale handle; the relay drops
    // it and the caller's connection stays healthy.
    p1.send_signal(
        p2_id,
        SignalBody::CallOffer {
            description: SessionDescription::offer("v=0 stale"),
        },
    )
    .await
    .expect("send to departed peer");

    p1.expect_silence().await.expect("no bounce, no error");
}

#[tokio::test]
async fn room_is_recreated_after_the_last_occupant_leaves() {
    init_tracing();
    let addr = spawn_relay().await;

    let mut p1 = TestPeer::connect(addr).await.expect("connect p1");
    p1.join("r1", "a@x.com").await.expect("join p1");
    p1.wait_joined().await.expect("p1 echo");
    p1.close().await.expect("close p1");

    // Let the relay process the disconnect before reusing the room id.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    // Fresh join to the same id gets a fresh, empty room.
    let mut p3 = TestPeer::connect(addr).await.expect("connect p3");
    p3.join("r1", "c@x.com").await.expect("join p3");
    p3.wait_joined().await.expect("p3 echo");
    p3.expect_silence().await.expect("no ghost occupants");
}
