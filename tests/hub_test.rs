use std::sync::{Arc, Mutex};

use chat_relay::core::connection::Deliver;
use chat_relay::core::events::ServerEvent;
use chat_relay::core::hub::ChatHub;
use chat_relay::core::registry::ConnectionRegistry;

// Delivery handle that records events instead of writing to a socket
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<ServerEvent>>,
}

impl Recorder {
    fn take(&self) -> Vec<ServerEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl Deliver for Recorder {
    fn deliver(&self, event: &ServerEvent) -> bool {
        self.events.lock().unwrap().push(event.clone());
        true
    }
}

fn new_hub() -> ChatHub {
    ChatHub::new(Arc::new(ConnectionRegistry::new()), "General".to_string())
}

async fn join(hub: &ChatHub, id: &str, username: &str, room: Option<&str>) -> Arc<Recorder> {
    let recorder = Arc::new(Recorder::default());
    hub.join(
        id.to_string(),
        username.to_string(),
        room.map(|r| r.to_string()),
        recorder.clone(),
    )
    .await;
    recorder
}

#[tokio::test]
async fn test_join_defaults_to_configured_room() {
    let hub = new_hub();
    join(&hub, "c1", "alice", None).await;

    let session = hub.registry().get("c1").await.unwrap();
    assert_eq!(session.room, "General");
}

#[tokio::test]
async fn test_join_notifies_room_and_sends_snapshot_to_caller() {
    let hub = new_hub();
    let alice = join(&hub, "c1", "alice", Some("Tech")).await;
    alice.clear();

    let bob = join(&hub, "c2", "bob", Some("Tech")).await;

    // Existing member sees the arrival
    let alice_events = alice.take();
    assert_eq!(alice_events.len(), 1);
    match &alice_events[0] {
        ServerEvent::UserJoined { username, room } => {
            assert_eq!(username, "bob");
            assert_eq!(room, "Tech");
        }
        other => panic!("unexpected event: {:?}", other),
    }

    // The caller sees its own arrival, then the member list
    let bob_events = bob.take();
    assert_eq!(bob_events.len(), 2);
    assert!(matches!(&bob_events[0], ServerEvent::UserJoined { username, .. } if username == "bob"));
    match &bob_events[1] {
        ServerEvent::UsersInRoom { usernames } => {
            assert_eq!(usernames, &["alice", "bob"]);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_repeated_join_from_same_connection_keeps_one_membership() {
    let hub = new_hub();
    join(&hub, "c1", "alice", Some("General")).await;
    let alice = join(&hub, "c1", "alice", Some("General")).await;
    alice.clear();

    assert_eq!(hub.registry().members_of("General").await, vec!["alice"]);

    // A single membership means a single copy of each broadcast
    hub.broadcast("c1", "hi".to_string()).await;
    let events = alice.take();
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], ServerEvent::ReceiveMessage { .. }));
}

#[tokio::test]
async fn test_broadcast_to_sole_member_reaches_only_sender() {
    let hub = new_hub();
    let alice = join(&hub, "c1", "alice", Some("R")).await;
    alice.clear();

    hub.broadcast("c1", "hi".to_string()).await;

    let events = alice.take();
    assert_eq!(events.len(), 1);
    match &events[0] {
        ServerEvent::ReceiveMessage {
            username,
            text,
            room,
            ..
        } => {
            assert_eq!(username, "alice");
            assert_eq!(text, "hi");
            assert_eq!(room, "R");
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_broadcast_reaches_every_room_member_including_sender() {
    let hub = new_hub();
    let alice = join(&hub, "c1", "alice", Some("R")).await;
    let bob = join(&hub, "c2", "bob", Some("R")).await;
    let carol = join(&hub, "c3", "carol", Some("Other")).await;
    alice.clear();
    bob.clear();
    carol.clear();

    hub.broadcast("c1", "hello".to_string()).await;

    for recorder in [&alice, &bob] {
        let events = recorder.take();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ServerEvent::ReceiveMessage { username, .. } if username == "alice"
        ));
    }

    // Other rooms are untouched
    assert!(carol.take().is_empty());
}

#[tokio::test]
async fn test_broadcast_from_unknown_sender_is_silently_dropped() {
    let hub = new_hub();
    let bystander = join(&hub, "c1", "alice", None).await;
    bystander.clear();

    hub.broadcast("ghost", "boo".to_string()).await;

    assert!(bystander.take().is_empty());
}

#[tokio::test]
async fn test_private_message_delivers_exactly_once_each_way() {
    let hub = new_hub();
    let alice = join(&hub, "c1", "alice", Some("R")).await;
    let bob = join(&hub, "c2", "bob", Some("R")).await;
    let carol = join(&hub, "c3", "carol", Some("R")).await;
    alice.clear();
    bob.clear();
    carol.clear();

    hub.send_private("c1", "bob", "x".to_string()).await;

    let bob_events = bob.take();
    assert_eq!(bob_events.len(), 1);
    match &bob_events[0] {
        ServerEvent::ReceivePrivateMessage {
            from,
            text,
            is_private,
            ..
        } => {
            assert_eq!(from, "alice");
            assert_eq!(text, "x");
            assert!(*is_private);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    let alice_events = alice.take();
    assert_eq!(alice_events.len(), 1);
    match &alice_events[0] {
        ServerEvent::PrivateMessageSent {
            target_username,
            text,
        } => {
            assert_eq!(target_username, "bob");
            assert_eq!(text, "x");
        }
        other => panic!("unexpected event: {:?}", other),
    }

    // No room broadcast occurs
    assert!(carol.take().is_empty());
}

#[tokio::test]
async fn test_private_message_to_unknown_target_reports_error_to_sender_only() {
    let hub = new_hub();
    let alice = join(&hub, "c1", "alice", Some("R")).await;
    let bob = join(&hub, "c2", "bob", Some("R")).await;
    alice.clear();
    bob.clear();

    hub.send_private("c1", "nobody", "x".to_string()).await;

    let alice_events = alice.take();
    assert_eq!(alice_events.len(), 1);
    match &alice_events[0] {
        ServerEvent::Error { message } => {
            assert!(message.contains("nobody"));
        }
        other => panic!("unexpected event: {:?}", other),
    }

    assert!(bob.take().is_empty());
}

#[tokio::test]
async fn test_private_message_from_unknown_sender_is_a_no_op() {
    let hub = new_hub();
    let bob = join(&hub, "c1", "bob", None).await;
    bob.clear();

    hub.send_private("ghost", "bob", "x".to_string()).await;

    assert!(bob.take().is_empty());
}

#[tokio::test]
async fn test_private_message_resolves_earliest_duplicate_username() {
    let hub = new_hub();
    let first = join(&hub, "c1", "dup", Some("R")).await;
    let second = join(&hub, "c2", "dup", Some("R")).await;
    let sender = join(&hub, "c3", "alice", Some("R")).await;
    first.clear();
    second.clear();
    sender.clear();

    hub.send_private("c3", "dup", "x".to_string()).await;

    assert_eq!(first.take().len(), 1);
    assert!(second.take().is_empty());
}

#[tokio::test]
async fn test_change_room_moves_member_and_orders_notifications() {
    let hub = new_hub();
    let alice = join(&hub, "c1", "alice", Some("X")).await;
    let bob = join(&hub, "c2", "bob", Some("X")).await;
    let carol = join(&hub, "c3", "carol", Some("Y")).await;
    alice.clear();
    bob.clear();
    carol.clear();

    hub.change_room("c1", "Y".to_string()).await;

    // Old room: departure first, then a member list excluding the mover
    let bob_events = bob.take();
    assert_eq!(bob_events.len(), 2);
    assert!(matches!(
        &bob_events[0],
        ServerEvent::UserLeft { username, room } if username == "alice" && room == "X"
    ));
    match &bob_events[1] {
        ServerEvent::UsersInRoom { usernames } => assert_eq!(usernames, &["bob"]),
        other => panic!("unexpected event: {:?}", other),
    }

    // New room: arrival, then a member list including the mover
    let carol_events = carol.take();
    assert_eq!(carol_events.len(), 2);
    assert!(matches!(
        &carol_events[0],
        ServerEvent::UserJoined { username, room } if username == "alice" && room == "Y"
    ));
    match &carol_events[1] {
        ServerEvent::UsersInRoom { usernames } => assert_eq!(usernames, &["alice", "carol"]),
        other => panic!("unexpected event: {:?}", other),
    }

    // The mover is in the new room by fan-out time, so it sees the arrival
    // events and none of the departure ones.
    let alice_events = alice.take();
    assert_eq!(alice_events.len(), 2);
    assert!(matches!(&alice_events[0], ServerEvent::UserJoined { .. }));

    // Membership resolved to exactly one room
    assert_eq!(hub.registry().members_of("X").await, vec!["bob"]);
    assert_eq!(hub.registry().members_of("Y").await, vec!["alice", "carol"]);
}

#[tokio::test]
async fn test_change_room_for_unknown_sender_is_a_no_op() {
    let hub = new_hub();
    let bystander = join(&hub, "c1", "alice", Some("X")).await;
    bystander.clear();

    hub.change_room("ghost", "Y".to_string()).await;

    assert!(bystander.take().is_empty());
    assert!(hub.registry().members_of("Y").await.is_empty());
}

#[tokio::test]
async fn test_disconnect_removes_session_and_notifies_former_room() {
    let hub = new_hub();
    let alice = join(&hub, "c1", "alice", Some("R")).await;
    let bob = join(&hub, "c2", "bob", Some("R")).await;
    alice.clear();
    bob.clear();

    hub.disconnect("c1").await;

    assert!(hub.registry().get("c1").await.is_none());

    let bob_events = bob.take();
    assert_eq!(bob_events.len(), 2);
    assert!(matches!(
        &bob_events[0],
        ServerEvent::UserLeft { username, room } if username == "alice" && room == "R"
    ));
    match &bob_events[1] {
        ServerEvent::UsersInRoom { usernames } => assert_eq!(usernames, &["bob"]),
        other => panic!("unexpected event: {:?}", other),
    }

    // The removed connection receives nothing
    assert!(alice.take().is_empty());
}

#[tokio::test]
async fn test_disconnect_of_unknown_connection_is_a_no_op() {
    let hub = new_hub();
    let bystander = join(&hub, "c1", "alice", None).await;
    bystander.clear();

    hub.disconnect("ghost").await;

    assert!(bystander.take().is_empty());
    assert_eq!(hub.registry().connection_count().await, 1);
}

#[tokio::test]
async fn test_one_failing_recipient_does_not_block_the_rest() {
    // A recipient whose transport has gone away
    struct DeadOutbox;
    impl Deliver for DeadOutbox {
        fn deliver(&self, _event: &ServerEvent) -> bool {
            false
        }
    }

    let hub = new_hub();
    hub.join(
        "c1".to_string(),
        "dead".to_string(),
        Some("R".to_string()),
        Arc::new(DeadOutbox),
    )
    .await;
    let alive = join(&hub, "c2", "bob", Some("R")).await;
    alive.clear();

    hub.broadcast("c2", "hello".to_string()).await;

    assert_eq!(alive.take().len(), 1);
}
