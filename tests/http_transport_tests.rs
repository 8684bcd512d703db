/// HTTP transport tests
///
/// Runs the reqwest-backed transport against an in-process axum server.
/// Run with: cargo test --test http_transport_tests
use admin_console::catalog;
use admin_console::resource::AssetSlot;
use admin_console::transport::{HttpTransport, SharedTransport, Transport, TransportError};
use admin_console::upload::{StagedAsset, upload_asset};
use admin_console::{ConsoleConfig, ResourceList};
use axum::{
    Json, Router,
    extract::{Multipart, Path},
    http::StatusCode,
    routing::{get, post, put},
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

async fn list_roles() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": [{"_id": "r1", "name": "admin"}, {"_id": "r2", "name": "chef"}]
    }))
}

async fn create_role(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["name"] == "admin" {
        return (
            StatusCode::CONFLICT,
            Json(json!({"success": false, "message": "Role already exists"})),
        );
    }
    (StatusCode::CREATED, Json(json!({"success": true, "data": body})))
}

async fn update_role(Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    Json(json!({"success": true, "data": {"_id": id, "name": body["name"]}}))
}

async fn delete_role(Path(_id): Path<String>) -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn upload_image(mut multipart: Multipart) -> (StatusCode, Json<Value>) {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("unnamed").to_string();
        let content_type = field.content_type().unwrap_or("").to_string();
        let size = field.bytes().await.map(|b| b.len()).unwrap_or(0);

        return (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "filePath": format!("/uploads/{}", file_name),
                "contentType": content_type,
                "size": size
            })),
        );
    }
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"success": false, "message": "No image provided"})),
    )
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "oops")
}

async fn garbage() -> &'static str {
    "definitely not json"
}

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/api/roles", get(list_roles).post(create_role))
        .route("/api/roles/:id", put(update_role).delete(delete_role))
        .route("/api/menus/upload", post(upload_image))
        .route("/api/broken", get(broken))
        .route("/api/garbage", get(garbage));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/api", addr)
}

async fn transport() -> HttpTransport {
    let base_url = spawn_server().await;
    HttpTransport::new(ConsoleConfig::new(&base_url)).unwrap()
}

#[tokio::test]
async fn test_get_decodes_json_body() {
    let transport = transport().await;

    let body = transport.get("roles").await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_post_and_put_send_json() {
    let transport = transport().await;

    let created = transport.post("roles", &json!({"name": "waiter"})).await.unwrap();
    assert_eq!(created["data"]["name"], "waiter");

    let updated = transport.put("roles/r2", &json!({"name": "head chef"})).await.unwrap();
    assert_eq!(updated["data"], json!({"_id": "r2", "name": "head chef"}));
}

#[tokio::test]
async fn test_error_status_keeps_server_message() {
    let transport = transport().await;

    let err = transport.post("roles", &json!({"name": "admin"})).await.unwrap_err();
    assert_eq!(
        err,
        TransportError::Status {
            status: 409,
            message: Some("Role already exists".to_string())
        }
    );
    assert_eq!(err.message_or("Operation failed"), "Role already exists");
}

#[tokio::test]
async fn test_error_status_without_json_body() {
    let transport = transport().await;

    let err = transport.get("broken").await.unwrap_err();
    assert_eq!(
        err,
        TransportError::Status {
            status: 500,
            message: None
        }
    );
}

#[tokio::test]
async fn test_empty_success_body_is_null() {
    let transport = transport().await;
    assert_eq!(transport.delete("roles/r1").await.unwrap(), Value::Null);
}

#[tokio::test]
async fn test_non_json_success_body_is_decode_error() {
    let transport = transport().await;
    let err = transport.get("garbage").await.unwrap_err();
    assert!(matches!(err, TransportError::Decode(_)));
}

#[tokio::test]
async fn test_multipart_upload_returns_reference() {
    let transport = transport().await;
    let asset = StagedAsset::new("pho.png", "image/png", vec![1, 2, 3, 4]);

    let raw = transport.upload("menus/upload", "image", &asset).await.unwrap();
    assert_eq!(raw["contentType"], "image/png");
    assert_eq!(raw["size"], 4);

    let reference = upload_asset(&transport, &AssetSlot::image("menus"), &asset)
        .await
        .unwrap();
    assert_eq!(reference, "/uploads/pho.png");
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ConsoleConfig::new(&format!("http://{}/api", addr))
        .connect_timeout(Duration::from_secs(2))
        .request_timeout(Duration::from_secs(2));
    let transport = HttpTransport::new(config).unwrap();

    let err = transport.get("roles").await.unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
    assert_eq!(err.message_or("Failed to fetch roles"), "Failed to fetch roles");
}

#[tokio::test]
async fn test_list_round_trip_over_http() {
    let transport: SharedTransport = Arc::new(transport().await);
    let mut roles = ResourceList::new(catalog::find("roles").unwrap(), transport);

    assert_eq!(roles.load().await.unwrap(), 2);
    assert_eq!(roles.rows()[0]["id"], "r1");

    roles.request_delete_at(0).unwrap();
    assert!(roles.confirm_delete().await.unwrap());

    roles.open_create();
    roles.form_mut().set_input("name", "admin");
    let err = roles.submit_form().await.unwrap_err();
    assert_eq!(err.user_message(), "Role already exists");
}
