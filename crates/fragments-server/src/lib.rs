//! HTTP server for the fragments store.
//!
//! Exposes create, list, read, convert, info, update and delete under
//! `/v1/fragments`, with every route but the health check behind an
//! [`AuthProvider`]. Responses use the `{"status": ...}` envelope from
//! [`response`].

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod response;
pub mod router;
pub mod server;

pub use auth::{AllowAllAuth, AuthProvider, BasicUsersAuth, Credentials, Identity};
pub use config::{AuthConfig, ServerConfig, StorageConfig};
pub use error::{ServerError, ServerResult};
pub use router::{build_router, AppState};
pub use server::FragmentsServer;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use axum::Router;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use fragments_store::Storage;
    use serde_json::Value;
    use tower::util::ServiceExt;

    const USER1: &str = "user1@email.com";
    const USER2: &str = "user2@email.com";

    fn app() -> Router {
        build_router(AppState::new(Storage::in_memory(), Arc::new(AllowAllAuth)))
    }

    fn auth(user: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{user}:password1")))
    }

    fn request(method: &str, uri: &str, user: Option<&str>) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri).header(header::HOST, "localhost:8080");
        match user {
            Some(user) => builder.header(header::AUTHORIZATION, auth(user)),
            None => builder,
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    async fn create(app: &Router, user: &str, content_type: &str, body: impl Into<Body>) -> String {
        let response = send(
            app,
            request("POST", "/v1/fragments", Some(user))
                .header(header::CONTENT_TYPE, content_type)
                .body(body.into())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json(response).await;
        body["fragment"]["id"].as_str().unwrap().to_string()
    }

    fn png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(3, 3, image::Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    // -----------------------------------------------------------------------
    // Health and auth
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn health_endpoint() {
        let response = send(&app(), request("GET", "/", None).body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        let body = json(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn missing_credentials_are_401() {
        let response =
            send(&app(), request("GET", "/v1/fragments", None).body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"]["code"], 401);
    }

    #[tokio::test]
    async fn wrong_password_is_401() {
        let users = [(USER1.to_string(), "secret".to_string())].into();
        let app = build_router(AppState::new(Storage::in_memory(), Arc::new(BasicUsersAuth::new(users))));
        let response =
            send(&app, request("GET", "/v1/fragments", Some(USER1)).body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_returns_201_with_location_and_metadata() {
        let app = app();
        let response = send(
            &app,
            request("POST", "/v1/fragments", Some(USER1))
                .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(Body::from("hello"))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();

        let body = json(response).await;
        let fragment = &body["fragment"];
        let id = fragment["id"].as_str().unwrap();
        assert_eq!(location, format!("http://localhost:8080/v1/fragments/{id}"));
        assert_eq!(fragment["type"], "text/plain; charset=utf-8");
        assert_eq!(fragment["size"], 5);
        assert_eq!(fragment["ownerId"], fragments_types::OwnerId::from_principal(USER1).as_str());
        assert!(fragment["created"].is_string());
        assert!(fragment["updated"].is_string());
    }

    #[tokio::test]
    async fn location_uses_configured_api_url() {
        let mut state = AppState::new(Storage::in_memory(), Arc::new(AllowAllAuth));
        state.api_url = Some("https://api.example.com".into());
        let response = send(
            &build_router(state),
            request("POST", "/v1/fragments", Some(USER1))
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("x"))
                .unwrap(),
        )
        .await;
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://api.example.com/v1/fragments/"));
    }

    #[tokio::test]
    async fn unsupported_type_is_415() {
        let app = app();
        for content_type in [Some("application/octet-stream"), None] {
            let mut builder = request("POST", "/v1/fragments", Some(USER1));
            if let Some(ct) = content_type {
                builder = builder.header(header::CONTENT_TYPE, ct);
            }
            let response = send(&app, builder.body(Body::from("x")).unwrap()).await;
            assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        }
    }

    #[tokio::test]
    async fn oversized_body_is_413() {
        let mut state = AppState::new(Storage::in_memory(), Arc::new(AllowAllAuth));
        state.max_body_bytes = 4;
        let response = send(
            &build_router(state),
            request("POST", "/v1/fragments", Some(USER1))
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("too large"))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    // -----------------------------------------------------------------------
    // Read and convert
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn read_raw_payload_with_stored_type() {
        let app = app();
        let id = create(&app, USER1, "text/markdown", "# Title").await;
        let response = send(
            &app,
            request("GET", &format!("/v1/fragments/{id}"), Some(USER1))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/markdown");
        assert_eq!(body_bytes(response).await, b"# Title");
    }

    #[tokio::test]
    async fn markdown_converts_to_html() {
        let app = app();
        let id = create(&app, USER1, "text/markdown", "# Title").await;
        let response = send(
            &app,
            request("GET", &format!("/v1/fragments/{id}.html"), Some(USER1))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        assert_eq!(body_bytes(response).await, b"<h1>Title</h1>\n");
    }

    #[tokio::test]
    async fn text_to_png_is_415() {
        let app = app();
        let id = create(&app, USER1, "text/plain", "hello").await;
        let response = send(
            &app,
            request("GET", &format!("/v1/fragments/{id}.png"), Some(USER1))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn png_converts_to_jpeg() {
        let app = app();
        let id = create(&app, USER1, "image/png", png()).await;
        let response = send(
            &app,
            request("GET", &format!("/v1/fragments/{id}.jpg"), Some(USER1))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
        let jpg = body_bytes(response).await;
        assert!(image::load_from_memory_with_format(&jpg, image::ImageFormat::Jpeg).is_ok());
    }

    #[tokio::test]
    async fn corrupt_image_is_422() {
        let app = app();
        let id = create(&app, USER1, "image/png", "not really a png").await;
        let response = send(
            &app,
            request("GET", &format!("/v1/fragments/{id}.webp"), Some(USER1))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn unknown_fragment_is_404() {
        let response = send(
            &app(),
            request("GET", "/v1/fragments/nope", Some(USER1)).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["status"], "error");
    }

    #[tokio::test]
    async fn other_owners_fragments_are_invisible() {
        let app = app();
        let id = create(&app, USER1, "text/plain", "mine").await;
        let response = send(
            &app,
            request("GET", &format!("/v1/fragments/{id}"), Some(USER2))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn info_returns_metadata_only() {
        let app = app();
        let id = create(&app, USER1, "application/json", "{\"a\":1}").await;
        let response = send(
            &app,
            request("GET", &format!("/v1/fragments/{id}/info"), Some(USER1))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["fragment"]["id"], id.as_str());
        assert_eq!(body["fragment"]["size"], 7);
    }

    // -----------------------------------------------------------------------
    // List
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn list_ids_and_expanded() {
        let app = app();
        let a = create(&app, USER1, "text/plain", "a").await;
        let b = create(&app, USER1, "text/plain", "bb").await;
        create(&app, USER2, "text/plain", "theirs").await;

        let body = json(
            send(&app, request("GET", "/v1/fragments", Some(USER1)).body(Body::empty()).unwrap()).await,
        )
        .await;
        let mut ids: Vec<&str> =
            body["fragments"].as_array().unwrap().iter().map(|v| v.as_str().unwrap()).collect();
        ids.sort();
        let mut expected = vec![a.as_str(), b.as_str()];
        expected.sort();
        assert_eq!(ids, expected);

        let body = json(
            send(
                &app,
                request("GET", "/v1/fragments?expand=1", Some(USER1)).body(Body::empty()).unwrap(),
            )
            .await,
        )
        .await;
        let fragments = body["fragments"].as_array().unwrap();
        assert_eq!(fragments.len(), 2);
        assert!(fragments.iter().all(|f| f["type"] == "text/plain"));
    }

    #[tokio::test]
    async fn new_user_has_empty_list() {
        let body = json(
            send(&app(), request("GET", "/v1/fragments", Some(USER2)).body(Body::empty()).unwrap())
                .await,
        )
        .await;
        assert_eq!(body["fragments"], Value::Array(vec![]));
    }

    // -----------------------------------------------------------------------
    // Update and delete
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn update_replaces_data() {
        let app = app();
        let id = create(&app, USER1, "text/plain", "old").await;
        let response = send(
            &app,
            request("PUT", &format!("/v1/fragments/{id}"), Some(USER1))
                .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(Body::from("brand new"))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["fragment"]["size"], 9);

        let response = send(
            &app,
            request("GET", &format!("/v1/fragments/{id}"), Some(USER1))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(body_bytes(response).await, b"brand new");
    }

    #[tokio::test]
    async fn update_with_different_type_is_400() {
        let app = app();
        let id = create(&app, USER1, "text/plain", "old").await;
        let response = send(
            &app,
            request("PUT", &format!("/v1/fragments/{id}"), Some(USER1))
                .header(header::CONTENT_TYPE, "text/markdown")
                .body(Body::from("# new"))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_missing_is_404() {
        let response = send(
            &app(),
            request("PUT", "/v1/fragments/ghost", Some(USER1))
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("x"))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_then_404() {
        let app = app();
        let id = create(&app, USER1, "text/plain", "bye").await;
        let uri = format!("/v1/fragments/{id}");

        let response = send(&app, request("DELETE", &uri, Some(USER1)).body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await, serde_json::json!({"status": "ok"}));

        let response = send(&app, request("GET", &uri, Some(USER1)).body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, request("DELETE", &uri, Some(USER1)).body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn filesystem_backend_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(AppState::new(Storage::filesystem(dir.path()), Arc::new(AllowAllAuth)));
        let id = create(&app, USER1, "text/markdown", "*hi*").await;
        let response = send(
            &app,
            request("GET", &format!("/v1/fragments/{id}.html"), Some(USER1))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(body_bytes(response).await, b"<p><em>hi</em></p>\n");
    }

    #[tokio::test]
    async fn overlong_ids_are_404_on_filesystem_backend() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(AppState::new(Storage::filesystem(dir.path()), Arc::new(AllowAllAuth)));
        create(&app, USER1, "text/plain", "seed").await;
        let uri = format!("/v1/fragments/{}", "x".repeat(200));

        for method in ["GET", "DELETE"] {
            let response =
                send(&app, request(method, &uri, Some(USER1)).body(Body::empty()).unwrap()).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method}");
        }
    }
}
