//! Disconnect grace behavior: a player who comes back inside the window
//! keeps their seat silently; one who does not is removed exactly once.

mod support;

use std::time::Duration;

use backend::live::protocol::ServerEvent;
use backend::{GameConfig, SessionOrchestrator};

use crate::support::live::{connect, drain};

const GRACE: Duration = Duration::from_millis(50);

#[tokio::test]
async fn rejoin_within_grace_keeps_seat_and_stays_silent() {
    let orchestrator = SessionOrchestrator::new(GameConfig::with_grace(GRACE));
    let pin = "660042";

    let (host, mut host_rx) = connect(&orchestrator);
    let (player, mut player_rx) = connect(&orchestrator);
    orchestrator.host_join(host, pin).unwrap();
    orchestrator
        .join_lobby(player, pin, "Alice".to_string(), Some(1))
        .unwrap();
    drain(&mut host_rx);
    drain(&mut player_rx);

    orchestrator.handle_disconnect(player);
    assert!(orchestrator.registry().get(pin).unwrap().lock().contains_player(player));

    // Same connection comes back before the window lapses.
    orchestrator
        .join_lobby(player, pin, "Alice".to_string(), Some(1))
        .unwrap();
    tokio::time::sleep(GRACE * 4).await;

    let session = orchestrator.registry().get(pin).unwrap();
    assert!(session.lock().contains_player(player));
    assert_eq!(session.lock().player_count(), 1);

    // The host only saw the rejoin's lobby refresh, never a departure.
    let events = drain(&mut host_rx);
    assert!(events
        .iter()
        .all(|e| matches!(e, ServerEvent::LobbyUpdated { .. })));
}

#[tokio::test]
async fn unreturned_player_is_removed_exactly_once() {
    let orchestrator = SessionOrchestrator::new(GameConfig::with_grace(GRACE));
    let pin = "660043";

    let (host, mut host_rx) = connect(&orchestrator);
    let (player, _player_rx) = connect(&orchestrator);
    orchestrator.host_join(host, pin).unwrap();
    orchestrator
        .join_lobby(player, pin, "Alice".to_string(), Some(1))
        .unwrap();
    drain(&mut host_rx);

    orchestrator.handle_disconnect(player);
    tokio::time::sleep(GRACE * 6).await;

    let session = orchestrator.registry().get(pin).unwrap();
    assert!(!session.lock().contains_player(player));
    assert_eq!(session.lock().player_count(), 0);

    let events = drain(&mut host_rx);
    assert_eq!(
        events,
        vec![
            ServerEvent::PlayerLeft {
                player_name: "Alice".to_string(),
            },
            ServerEvent::LobbyUpdated {
                players: vec![],
                count: 0,
            },
        ]
    );
}

#[tokio::test]
async fn host_disconnect_alerts_room_immediately() {
    let orchestrator = SessionOrchestrator::new(GameConfig::with_grace(GRACE));
    let pin = "660044";

    let (host, _host_rx) = connect(&orchestrator);
    let (player, mut player_rx) = connect(&orchestrator);
    orchestrator.host_join(host, pin).unwrap();
    orchestrator
        .join_lobby(player, pin, "Alice".to_string(), Some(1))
        .unwrap();
    drain(&mut player_rx);

    orchestrator.handle_disconnect(host);

    let events = drain(&mut player_rx);
    assert_eq!(
        events,
        vec![ServerEvent::HostDisconnected {
            message: "Host disconnected".to_string(),
        }]
    );

    // No grace timer runs for the host slot.
    assert!(orchestrator
        .registry()
        .get(pin)
        .unwrap()
        .lock()
        .host_conn()
        .is_none());
    tokio::time::sleep(GRACE * 4).await;
    assert_eq!(
        orchestrator.registry().get(pin).unwrap().lock().player_count(),
        1
    );
}
