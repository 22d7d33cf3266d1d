//! WebSocket session actor: one per connected browser tab.
//!
//! The actor owns nothing but its connection id and heartbeat bookkeeping.
//! Inbound frames are parsed at this boundary and handed to the
//! orchestrator; outbound events arrive on a per-connection channel
//! registered with the room hub and are written to the socket in order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tokio::sync::mpsc::unbounded_channel;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::live::orchestrator::SessionOrchestrator;
use crate::live::protocol::{ClientEvent, ServerEvent};
use crate::live::registry::ConnId;
use crate::state::app_state::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let conn_id = Uuid::new_v4();
    let session = LiveSession::new(conn_id, app_state.orchestrator());
    ws::start(session, &req, stream)
}

pub struct LiveSession {
    conn_id: ConnId,
    orchestrator: Arc<SessionOrchestrator>,
    last_heartbeat: Instant,
}

impl LiveSession {
    fn new(conn_id: ConnId, orchestrator: Arc<SessionOrchestrator>) -> Self {
        Self {
            conn_id,
            orchestrator,
            last_heartbeat: Instant::now(),
        }
    }

    fn send_json(ctx: &mut ws::WebsocketContext<Self>, event: &ServerEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "[WS SESSION] failed to serialize outbound event"),
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(conn_id = %actor.conn_id, "[WS SESSION] heartbeat timed out");
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
    }
}

impl Actor for LiveSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(conn_id = %self.conn_id, "[WS SESSION] started");

        let (tx, rx) = unbounded_channel();
        let hub = self.orchestrator.hub();
        hub.register(self.conn_id, tx);
        ctx.add_stream(UnboundedReceiverStream::new(rx));

        hub.send_to(self.conn_id, ServerEvent::Connected { sid: self.conn_id });

        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        // Host slots clear immediately; players get the grace window.
        self.orchestrator.handle_disconnect(self.conn_id);
        self.orchestrator.hub().unregister(self.conn_id);
        info!(conn_id = %self.conn_id, "[WS SESSION] stopped");
    }
}

/// Outbound events from the room hub, forwarded onto the socket.
impl StreamHandler<ServerEvent> for LiveSession {
    fn handle(&mut self, event: ServerEvent, ctx: &mut Self::Context) {
        Self::send_json(ctx, &event);
    }

    fn finished(&mut self, _ctx: &mut Self::Context) {
        // The hub dropped our sender; keep the socket open. The actor
        // stops when the transport stream ends.
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for LiveSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();

                match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => self.orchestrator.dispatch(self.conn_id, event),
                    Err(err) => {
                        warn!(conn_id = %self.conn_id, error = %err, "[WS SESSION] malformed frame");
                        Self::send_json(
                            ctx,
                            &ServerEvent::Error {
                                message: "Malformed event".to_string(),
                            },
                        );
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
                Self::send_json(
                    ctx,
                    &ServerEvent::Error {
                        message: "Binary frames are not supported".to_string(),
                    },
                );
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(conn_id = %self.conn_id, error = %err, "[WS SESSION] protocol error");
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}
