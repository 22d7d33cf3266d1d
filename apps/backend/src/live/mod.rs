//! Live game coordination: session registry, room fan-out, reconnect
//! grace handling, and the WebSocket edge.

pub mod grace;
pub mod hub;
pub mod orchestrator;
pub mod protocol;
pub mod registry;
pub mod session;

pub use grace::GraceTracker;
pub use hub::RoomHub;
pub use orchestrator::SessionOrchestrator;
pub use protocol::{ClientEvent, ServerEvent};
pub use registry::{ConnId, SessionRegistry, SessionStatus};
