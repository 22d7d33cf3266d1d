use std::env;

use actix_cors::Cors;
use actix_web::http::header;

/// Build CORS middleware from `CORS_ALLOWED_ORIGINS`:
/// - Comma-separated explicit origins, lightly validated
/// - A `*` entry switches to allow-any-origin, matching the deployed
///   front-end contract (carried over as observed behavior)
/// - Falls back to localhost dev origins when nothing valid is configured
pub fn cors_middleware() -> Cors {
    // e.g. CORS_ALLOWED_ORIGINS=http://localhost:3000,https://quiz.example.com
    let allowed_raw = env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default();

    let entries: Vec<String> = allowed_raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && *s != "null")
        .map(|s| s.to_string())
        .collect();

    let allow_any = entries.iter().any(|entry| entry == "*");

    let allowed_origins: Vec<String> = entries
        .into_iter()
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .collect();

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
        .expose_headers(vec![header::HeaderName::from_static("x-trace-id")])
        .max_age(3600);

    if allow_any {
        return cors.allow_any_origin();
    }

    let effective_origins: Vec<String> = if allowed_origins.is_empty() {
        vec![
            "http://localhost:3000".to_string(),
            "http://127.0.0.1:3000".to_string(),
        ]
    } else {
        allowed_origins
    };

    for origin in effective_origins {
        cors = cors.allowed_origin(&origin);
    }

    cors
}
