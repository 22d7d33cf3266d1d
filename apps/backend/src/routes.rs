use actix_web::web;

use crate::live::session;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(crate::health::configure)
        .route("/ws", web::get().to(session::upgrade));
}
