pub mod live;
pub mod logging;
pub mod websocket;
pub mod websocket_client;
