//! Helpers for driving the orchestrator with channel-backed connections.

use std::sync::Arc;

use backend::live::hub::OutboundReceiver;
use backend::live::registry::ConnId;
use backend::live::ServerEvent;
use backend::SessionOrchestrator;
use tokio::sync::mpsc::unbounded_channel;
use uuid::Uuid;

/// Register a fake connection and hand back its outbound receiver.
pub fn connect(orchestrator: &Arc<SessionOrchestrator>) -> (ConnId, OutboundReceiver) {
    let conn_id = Uuid::new_v4();
    let (tx, rx) = unbounded_channel();
    orchestrator.hub().register(conn_id, tx);
    (conn_id, rx)
}

/// Everything queued for a connection so far.
pub fn drain(rx: &mut OutboundReceiver) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
