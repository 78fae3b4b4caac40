use actix_cors::Cors;
use actix_web::http::header;

/// CORS for the configured browser origins, falling back to localhost.
pub fn cors_middleware(allowed_origins: &[String]) -> Cors {
    let fallback = [
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ];
    let origins: &[String] = if allowed_origins.is_empty() {
        &fallback
    } else {
        allowed_origins
    };

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
        .expose_headers(vec![header::HeaderName::from_static("x-trace-id")])
        .max_age(3600);

    for origin in origins {
        cors = cors.allowed_origin(origin);
    }
    cors
}
