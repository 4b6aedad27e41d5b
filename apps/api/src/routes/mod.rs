pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::{analytics, profile, resumes, sharing, templates};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Identity bootstrap, profile and settings
        .route("/api/v1/session", post(profile::handlers::handle_session))
        .route(
            "/api/v1/profile",
            get(profile::handlers::handle_get_profile)
                .patch(profile::handlers::handle_update_profile),
        )
        .route(
            "/api/v1/settings",
            get(profile::handlers::handle_get_settings)
                .patch(profile::handlers::handle_update_preferences),
        )
        // Resumes
        .route(
            "/api/v1/resumes",
            get(resumes::handlers::handle_list_resumes)
                .post(resumes::handlers::handle_create_resume),
        )
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handlers::handle_get_resume)
                .patch(resumes::handlers::handle_update_resume)
                .delete(resumes::handlers::handle_delete_resume),
        )
        // Sharing
        .route(
            "/api/v1/resumes/:id/share",
            post(sharing::handlers::handle_share).delete(sharing::handlers::handle_unshare),
        )
        .route(
            "/api/v1/sharing/reconcile",
            post(sharing::handlers::handle_reconcile),
        )
        .route("/api/v1/shared/:id", get(sharing::handlers::handle_get_shared))
        // Template catalogs
        .route(
            "/api/v1/templates",
            get(templates::handlers::handle_list_templates)
                .post(templates::handlers::handle_create_template),
        )
        .route(
            "/api/v1/templates/defaults",
            get(templates::handlers::handle_list_default_templates),
        )
        .route(
            "/api/v1/templates/:id",
            get(templates::handlers::handle_get_template)
                .patch(templates::handlers::handle_update_template)
                .delete(templates::handlers::handle_delete_template),
        )
        // Analytics
        .route(
            "/api/v1/analytics/events",
            post(analytics::handlers::handle_log_event),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::analytics::tests::FailingSink;
    use crate::config::{Config, StoreBackend};
    use crate::dal::DataAccess;
    use crate::identity::USER_ID_HEADER;
    use crate::store::MemoryDocumentStore;

    fn app() -> Router {
        let config = Config {
            store_backend: StoreBackend::Memory,
            database_url: None,
            redis_url: None,
            public_base_url: "https://cv.example.com".into(),
            port: 0,
            rust_log: "info".into(),
        };
        let data = DataAccess::new(
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(FailingSink),
            config.public_base_url.clone(),
        );
        build_router(AppState { data, config })
    }

    fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(request("GET", "/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store"], "memory");
    }

    #[tokio::test]
    async fn test_anonymous_resume_list_is_unauthorized() {
        let response = app()
            .oneshot(request("GET", "/api/v1/resumes", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_resume_share_flow_over_http() {
        let app = app();

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/v1/resumes",
                Some("alice"),
                Some(json!({ "title": "My CV" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = json_body(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(request("GET", &format!("/api/v1/resumes/{id}"), Some("bob"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/api/v1/resumes/{id}/share"),
                Some("alice"),
                Some(json!({ "expires_in_days": 7 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await["public_url"],
            format!("https://cv.example.com/shared/{id}")
        );

        let response = app
            .clone()
            .oneshot(request("GET", &format!("/api/v1/shared/{id}"), None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["view_count"], 1);

        let response = app
            .clone()
            .oneshot(request(
                "DELETE",
                &format!("/api/v1/resumes/{id}/share"),
                Some("alice"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(request("GET", &format!("/api/v1/shared/{id}"), None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_share_without_body_and_bad_expiry() {
        let app = app();
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/v1/resumes",
                Some("alice"),
                Some(json!({ "title": "CV" })),
            ))
            .await
            .unwrap();
        let id = json_body(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/api/v1/resumes/{id}/share"),
                Some("alice"),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request(
                "POST",
                &format!("/api/v1/resumes/{id}/share"),
                Some("alice"),
                Some(json!({ "expires_in_days": 0 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_share_body_does_not_create_permanent_link() {
        let app = app();
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/v1/resumes",
                Some("alice"),
                Some(json!({ "title": "CV" })),
            ))
            .await
            .unwrap();
        let id = json_body(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/api/v1/resumes/{id}/share"),
                Some("alice"),
                Some(json!({ "expires_in_days": -7 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");

        let response = app
            .oneshot(request("GET", &format!("/api/v1/shared/{id}"), None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stale_expected_version_is_conflict() {
        let app = app();
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/v1/resumes",
                Some("alice"),
                Some(json!({ "title": "CV" })),
            ))
            .await
            .unwrap();
        let id = json_body(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(request(
                "PATCH",
                &format!("/api/v1/resumes/{id}"),
                Some("alice"),
                Some(json!({ "title": "CV 2", "expected_version": 5 })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_template_admin_routes_forbidden_for_users() {
        let app = app();
        let response = app
            .clone()
            .oneshot(request("POST", "/api/v1/session", Some("alice"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/v1/templates",
                Some("alice"),
                Some(json!({ "name": "Mine", "category": "basic" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(request("GET", "/api/v1/templates/defaults", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!([]));
    }
}
