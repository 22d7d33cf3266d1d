//! Room broadcaster: fan-out of server events to every connection joined
//! to a PIN's room, plus targeted single-connection sends.
//!
//! Delivery is best-effort and at-most-once per connection: a send to a
//! closed channel is dropped silently. Per-connection ordering follows the
//! send order, and the orchestrator issues room broadcasts while holding
//! the session lock, so broadcasts observe its serialization order.

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::live::protocol::ServerEvent;
use crate::live::registry::ConnId;

pub type OutboundSender = mpsc::UnboundedSender<ServerEvent>;
pub type OutboundReceiver = mpsc::UnboundedReceiver<ServerEvent>;

#[derive(Default)]
pub struct RoomHub {
    connections: DashMap<ConnId, OutboundSender>,
    rooms: DashMap<String, Vec<ConnId>>,
    // A connection sits in at most one room at a time.
    joined: DashMap<ConnId, String>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            rooms: DashMap::new(),
            joined: DashMap::new(),
        }
    }

    /// Register a connection's outbound channel. Call before any join.
    pub fn register(&self, conn_id: ConnId, sender: OutboundSender) {
        self.connections.insert(conn_id, sender);
    }

    /// Drop a connection entirely: outbound channel and room membership.
    pub fn unregister(&self, conn_id: ConnId) {
        if let Some((_, pin)) = self.joined.remove(&conn_id) {
            self.remove_from_room(&pin, conn_id);
        }
        self.connections.remove(&conn_id);
    }

    /// Move a connection into a PIN's room, leaving any previous room.
    pub fn join_room(&self, pin: &str, conn_id: ConnId) {
        if let Some(previous) = self.joined.insert(conn_id, pin.to_string()) {
            if previous != pin {
                self.remove_from_room(&previous, conn_id);
            }
        }
        let mut members = self.rooms.entry(pin.to_string()).or_default();
        if !members.contains(&conn_id) {
            members.push(conn_id);
        }
    }

    pub fn leave_room(&self, pin: &str, conn_id: ConnId) {
        self.joined
            .remove_if(&conn_id, |_, joined_pin| joined_pin == pin);
        self.remove_from_room(pin, conn_id);
    }

    fn remove_from_room(&self, pin: &str, conn_id: ConnId) {
        let now_empty = match self.rooms.get_mut(pin) {
            Some(mut members) => {
                members.retain(|member| *member != conn_id);
                members.is_empty()
            }
            None => return,
        };
        // The guard above is released before touching the entry again.
        if now_empty {
            self.rooms.remove_if(pin, |_, members| members.is_empty());
        }
    }

    /// Fan an event out to every connection in the room.
    pub fn broadcast(&self, pin: &str, event: &ServerEvent) {
        if let Some(members) = self.rooms.get(pin) {
            for member in members.iter() {
                if let Some(sender) = self.connections.get(member) {
                    let _ = sender.send(event.clone());
                }
            }
        }
    }

    /// Send to a single connection. Returns false if it is unknown or its
    /// channel has closed.
    pub fn send_to(&self, conn_id: ConnId, event: ServerEvent) -> bool {
        match self.connections.get(&conn_id) {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn room_size(&self, pin: &str) -> usize {
        self.rooms.get(pin).map_or(0, |members| members.len())
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::unbounded_channel;
    use uuid::Uuid;

    use super::*;

    fn attach(hub: &RoomHub) -> (ConnId, OutboundReceiver) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = unbounded_channel();
        hub.register(conn_id, tx);
        (conn_id, rx)
    }

    #[test]
    fn broadcast_reaches_every_room_member_in_order() {
        let hub = RoomHub::new();
        let (a, mut rx_a) = attach(&hub);
        let (b, mut rx_b) = attach(&hub);
        hub.join_room("482913", a);
        hub.join_room("482913", b);

        let first = ServerEvent::HostDisconnected {
            message: "Host disconnected".to_string(),
        };
        let second = ServerEvent::Error {
            message: "after".to_string(),
        };
        hub.broadcast("482913", &first);
        hub.broadcast("482913", &second);

        for rx in [&mut rx_a, &mut rx_b] {
            assert_eq!(rx.try_recv().unwrap(), first);
            assert_eq!(rx.try_recv().unwrap(), second);
        }
    }

    #[test]
    fn broadcast_does_not_cross_rooms() {
        let hub = RoomHub::new();
        let (a, mut rx_a) = attach(&hub);
        let (b, mut rx_b) = attach(&hub);
        hub.join_room("111111", a);
        hub.join_room("222222", b);

        hub.broadcast(
            "111111",
            &ServerEvent::Error {
                message: "room one".to_string(),
            },
        );

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn joining_a_new_room_leaves_the_old_one() {
        let hub = RoomHub::new();
        let (a, _rx) = attach(&hub);
        hub.join_room("111111", a);
        hub.join_room("222222", a);

        assert_eq!(hub.room_size("111111"), 0);
        assert_eq!(hub.room_size("222222"), 1);
    }

    #[test]
    fn unregister_removes_connection_and_membership() {
        let hub = RoomHub::new();
        let (a, _rx) = attach(&hub);
        hub.join_room("482913", a);

        hub.unregister(a);
        assert_eq!(hub.connection_count(), 0);
        assert_eq!(hub.room_size("482913"), 0);
    }

    #[test]
    fn send_to_dropped_receiver_is_best_effort() {
        let hub = RoomHub::new();
        let (a, rx) = attach(&hub);
        drop(rx);

        assert!(!hub.send_to(
            a,
            ServerEvent::Error {
                message: "gone".to_string()
            }
        ));
        // A broadcast over the same dead channel must not panic either.
        hub.join_room("482913", a);
        hub.broadcast(
            "482913",
            &ServerEvent::Error {
                message: "gone".to_string(),
            },
        );
    }
}
