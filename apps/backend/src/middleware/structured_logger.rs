//! One structured log line per completed request.
//!
//! Runs inside `RequestTrace` in the wrap order, so it reads the trace id
//! that middleware put into request extensions. Severity tracks the status
//! class: 5xx logs at error, 4xx at warn, everything else at info.

use std::future::{ready, Ready};
use std::time::Instant;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use actix_web::{Error as ActixError, HttpMessage};
use futures_util::future::LocalBoxFuture;
use tracing::{error, info, warn};

pub struct StructuredLogger;

impl<S, B> Transform<S, ServiceRequest> for StructuredLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type InitError = ();
    type Transform = StructuredLoggerService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StructuredLoggerService { service }))
    }
}

pub struct StructuredLoggerService<S> {
    service: S,
}

struct RequestRecord {
    method: String,
    path: String,
    trace_id: String,
    start: Instant,
}

impl RequestRecord {
    fn capture(req: &ServiceRequest) -> Self {
        Self {
            method: req.method().to_string(),
            path: req.path().to_string(),
            trace_id: req
                .extensions()
                .get::<String>()
                .cloned()
                .unwrap_or_else(|| "unknown".to_string()),
            start: Instant::now(),
        }
    }

    fn emit(&self, status: StatusCode) {
        let status_code = status.as_u16();
        let duration_us = self.start.elapsed().as_micros() as u64;

        if status.is_server_error() {
            error!(
                http.method = %self.method,
                url.path = %self.path,
                http.status_code = %status_code,
                duration_us = %duration_us,
                trace_id = %self.trace_id,
                message = "request_completed"
            );
        } else if status.is_client_error() {
            warn!(
                http.method = %self.method,
                url.path = %self.path,
                http.status_code = %status_code,
                duration_us = %duration_us,
                trace_id = %self.trace_id,
                message = "request_completed"
            );
        } else {
            info!(
                http.method = %self.method,
                url.path = %self.path,
                http.status_code = %status_code,
                duration_us = %duration_us,
                trace_id = %self.trace_id,
                message = "request_completed"
            );
        }
    }
}

impl<S, B> Service<ServiceRequest> for StructuredLoggerService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let record = RequestRecord::capture(&req);
        let inner = self.service.call(req);

        Box::pin(async move {
            let result = inner.await;
            let status = match &result {
                Ok(res) => res.status(),
                Err(err) => err.as_response_error().status_code(),
            };
            record.emit(status);
            result
        })
    }
}
