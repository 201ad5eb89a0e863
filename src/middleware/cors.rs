//! Middleware de CORS
//!
//! Este módulo maneja la configuración de CORS para permitir
//! requests desde diferentes orígenes.

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Crear middleware de CORS configurado para desarrollo
/// NOTA: Permite cualquier origen - solo para desarrollo
pub fn cors_middleware() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Crear middleware de CORS con orígenes específicos
pub fn cors_middleware_with_origins(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("⚠️ Origen CORS inválido ignorado: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            HeaderName::from_static("authorization"),
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("origin"),
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Elige la política según el entorno: permisiva si no hay orígenes configurados
pub fn cors_for(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        cors_middleware()
    } else {
        cors_middleware_with_origins(origins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn preflight(layer: CorsLayer, origin: &str) -> (StatusCode, Option<String>) {
        let app = Router::new().route("/api/trips", get(|| async { "ok" })).layer(layer);
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/trips")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let allowed = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_string());
        (response.status(), allowed)
    }

    #[tokio::test]
    async fn configured_origin_is_allowed_and_invalid_ones_are_skipped() {
        let origins = vec![
            "https://fleet.example.com".to_string(),
            "bad\norigin".to_string(),
        ];

        let (status, allowed) =
            preflight(cors_middleware_with_origins(&origins), "https://fleet.example.com").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(allowed.as_deref(), Some("https://fleet.example.com"));

        let (_, allowed) =
            preflight(cors_middleware_with_origins(&origins), "https://evil.example.com").await;
        assert_eq!(allowed, None);
    }

    #[tokio::test]
    async fn empty_origin_list_is_permissive() {
        let (_, allowed) = preflight(cors_for(&[]), "https://anywhere.example.com").await;
        assert_eq!(allowed.as_deref(), Some("https://anywhere.example.com"));
    }
}
