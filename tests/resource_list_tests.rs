/// Resource list tests
///
/// Snapshot loading, reload-after-mutation and the two-step delete flow,
/// driven through a scripted transport.
/// Run with: cargo test --test resource_list_tests
mod support;

use admin_console::catalog;
use admin_console::core::{ConsoleError, NoticeLevel};
use admin_console::form::FormEvent;
use admin_console::resource::{FieldSpec, ResourceDescriptor};
use admin_console::{AdminConsole, ResourceList, SharedTransport};
use serde_json::json;
use std::sync::Arc;
use support::{RecordingTransport, record};
use tokio_test::{assert_err, assert_ok};

fn list_for(descriptor: ResourceDescriptor, transport: &Arc<RecordingTransport>) -> ResourceList {
    let shared: SharedTransport = transport.clone();
    ResourceList::new(Arc::new(descriptor), shared)
}

#[tokio::test]
async fn test_load_normalizes_identifiers() {
    let transport = RecordingTransport::new();
    transport.respond_ok(
        "GET",
        "roles",
        json!({
            "success": true,
            "data": [
                {"_id": "r1", "name": "admin"},
                {"_id": {"$oid": "r2"}, "name": "chef"},
                {"id": 3, "name": "waiter"}
            ]
        }),
    );

    let mut roles = list_for(catalog::roles(), &transport);
    assert_eq!(roles.load().await.unwrap(), 3);

    let ids: Vec<_> = roles.rows().iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!("r1"), json!("r2"), json!(3)]);
    assert!(!roles.is_loading());
}

#[tokio::test]
async fn test_bare_array_listing_is_accepted() {
    let transport = RecordingTransport::new();
    transport.respond_ok("GET", "ingredients", json!([{"_id": "a", "name": "Salt"}, "junk"]));

    let mut ingredients = list_for(catalog::ingredients(), &transport);
    assert_eq!(ingredients.load().await.unwrap(), 1);
    assert_eq!(ingredients.rows()[0]["name"], "Salt");
}

#[tokio::test]
async fn test_fetch_failure_keeps_previous_snapshot() {
    let transport = RecordingTransport::new();
    transport.respond_ok("GET", "ingredients", json!([{"_id": "a", "name": "Salt"}]));
    transport.respond_status("GET", "ingredients", 500, None);

    let mut ingredients = list_for(catalog::ingredients(), &transport);
    assert_ok!(ingredients.load().await);
    ingredients.take_notices();

    let err = assert_err!(ingredients.load().await);
    assert_eq!(err, ConsoleError::FetchFailed("Failed to fetch ingredients".to_string()));
    assert_eq!(ingredients.rows().len(), 1);
    assert_eq!(ingredients.rows()[0]["name"], "Salt");

    let notices = ingredients.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].message, "Failed to fetch ingredients");
}

#[tokio::test]
async fn test_fetch_failure_surfaces_server_message() {
    let transport = RecordingTransport::new();
    transport.respond_status("GET", "users", 403, Some("Forbidden"));
    transport.respond_ok("GET", "users", json!({"success": false, "message": "Token expired"}));

    let mut users = list_for(catalog::users(), &transport);
    assert_eq!(users.load().await.unwrap_err().user_message(), "Forbidden");
    assert_eq!(users.load().await.unwrap_err().user_message(), "Token expired");
    assert!(users.rows().is_empty());
}

#[tokio::test]
async fn test_last_applied_snapshot_wins() {
    let transport = RecordingTransport::new();
    transport.respond_ok("GET", "roles", json!([{"_id": "r1", "name": "first"}]));
    transport.respond_ok("GET", "roles", json!([{"_id": "r2", "name": "second"}]));

    let mut roles = list_for(catalog::roles(), &transport);
    let early = roles.snapshot_request();
    let late = roles.snapshot_request();
    assert!(roles.is_loading());

    let early_rows = early.run().await;
    let late_rows = late.run().await;

    // Responses applied out of issue order: the later application is shown.
    roles.apply_snapshot(late_rows).unwrap();
    roles.apply_snapshot(early_rows).unwrap();

    assert_eq!(roles.rows().len(), 1);
    assert_eq!(roles.rows()[0]["name"], "first");
    assert!(!roles.is_loading());
}

#[tokio::test]
async fn test_short_ingredient_name_is_rejected_before_network() {
    let transport = RecordingTransport::new();
    let mut ingredients = list_for(catalog::ingredients(), &transport);

    assert!(ingredients.open_create());
    ingredients.form_mut().set_input("name", "S");

    let err = assert_err!(ingredients.submit_form().await);
    assert_eq!(err.user_message(), "Name must be at least 2 characters long");
    assert!(transport.calls().is_empty());
    assert!(ingredients.form().is_open());

    let notices = ingredients.take_notices();
    assert_eq!(notices[0].message, "Name must be at least 2 characters long");
}

#[tokio::test]
async fn test_create_posts_once_and_reloads_once() {
    let transport = RecordingTransport::new();
    transport.respond_ok("POST", "ingredients", json!({"success": true, "data": {"_id": "a"}}));
    transport.respond_ok("GET", "ingredients", json!([{"_id": "a", "name": "Salt"}]));

    let mut ingredients = list_for(catalog::ingredients(), &transport);
    ingredients.open_create();
    ingredients.form_mut().set_input("name", "Salt");

    let event = ingredients.submit_form().await.unwrap();
    assert!(matches!(event, FormEvent::Succeeded { created: true, .. }));

    let methods: Vec<_> = transport.calls().iter().map(|c| c.method).collect();
    assert_eq!(methods, vec!["POST", "GET"]);
    assert_eq!(
        transport.calls_to("POST", "ingredients")[0].body,
        Some(json!({"name": "Salt"}))
    );

    assert!(!ingredients.form().is_open());
    assert_eq!(ingredients.rows().len(), 1);

    let notices = ingredients.take_notices();
    assert!(
        notices
            .iter()
            .any(|n| n.level == NoticeLevel::Success && n.message == "Ingredient added successfully")
    );
}

#[tokio::test]
async fn test_edit_puts_once_and_reloads_once() {
    let transport = RecordingTransport::new();
    transport.respond_ok("GET", "ingredients", json!([{"_id": "a", "name": "Salt"}]));
    transport.respond_ok("GET", "ingredients", json!([{"_id": "a", "name": "Sea Salt"}]));

    let mut ingredients = list_for(catalog::ingredients(), &transport);
    ingredients.load().await.unwrap();
    transport.reset_calls();

    assert!(ingredients.open_edit_at(0).unwrap());
    ingredients.form_mut().set_input("name", "Sea Salt");

    let event = ingredients.submit_form().await.unwrap();
    assert!(matches!(event, FormEvent::Succeeded { created: false, .. }));

    let methods: Vec<_> = transport.calls().iter().map(|c| c.method).collect();
    assert_eq!(methods, vec!["PUT", "GET"]);
    assert_eq!(
        transport.calls_to("PUT", "ingredients/a")[0].body,
        Some(json!({"name": "Sea Salt"}))
    );
    assert_eq!(ingredients.rows()[0]["name"], "Sea Salt");

    let notices = ingredients.take_notices();
    assert!(notices.iter().any(|n| n.message == "Ingredient updated successfully"));
}

#[tokio::test]
async fn test_rejected_create_does_not_reload() {
    let transport = RecordingTransport::new();
    transport.respond_status("POST", "roles", 409, Some("Role already exists"));

    let mut roles = list_for(catalog::roles(), &transport);
    roles.open_create();
    roles.form_mut().set_input("name", "admin");

    let err = assert_err!(roles.submit_form().await);
    assert_eq!(err, ConsoleError::MutationRejected("Role already exists".to_string()));
    assert_eq!(transport.count("GET"), 0);
    assert_eq!(roles.form().error_message(), Some("Role already exists"));
    assert_eq!(roles.form().draft()["name"], "admin");
}

#[tokio::test]
async fn test_rejection_without_message_uses_fallback() {
    let transport = RecordingTransport::new();
    transport.respond_status("POST", "roles", 500, None);

    let mut roles = list_for(catalog::roles(), &transport);
    roles.open_create();
    roles.form_mut().set_input("name", "admin");

    let err = assert_err!(roles.submit_form().await);
    assert_eq!(err.user_message(), "Operation failed");
}

#[tokio::test]
async fn test_delete_role_by_legacy_identifier() {
    let transport = RecordingTransport::new();
    transport.respond_ok("GET", "roles", json!([{"_id": "r1", "name": "admin"}]));

    let mut roles = list_for(catalog::roles(), &transport);
    roles.load().await.unwrap();
    transport.reset_calls();

    assert_ok!(roles.request_delete_at(0));
    assert_eq!(roles.pending_delete().unwrap().id, "r1");
    assert!(transport.calls().is_empty());

    assert!(roles.confirm_delete().await.unwrap());
    assert_eq!(transport.calls_to("DELETE", "roles/r1").len(), 1);
    assert_eq!(transport.count("GET"), 1);
    assert!(roles.pending_delete().is_none());

    let notices = roles.take_notices();
    assert_eq!(notices.last().unwrap().message, "Role deleted successfully");
}

#[tokio::test]
async fn test_cancelled_delete_sends_nothing() {
    let transport = RecordingTransport::new();
    transport.respond_ok("GET", "roles", json!([{"_id": "r1", "name": "admin"}]));

    let mut roles = list_for(catalog::roles(), &transport);
    roles.load().await.unwrap();
    transport.reset_calls();

    roles.request_delete_at(0).unwrap();
    roles.cancel_delete();

    assert!(!roles.confirm_delete().await.unwrap());
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_failed_delete_reports_and_skips_reload() {
    let transport = RecordingTransport::new();
    transport.respond_ok("GET", "menus", json!([{"_id": "m1", "name": "Pho"}]));
    transport.respond_status("DELETE", "menus/m1", 500, None);

    let mut menus = list_for(catalog::menus(), &transport);
    menus.load().await.unwrap();
    transport.reset_calls();

    menus.request_delete_at(0).unwrap();
    let err = assert_err!(menus.confirm_delete().await);
    assert_eq!(err, ConsoleError::MutationRejected("Failed to delete menu".to_string()));
    assert_eq!(transport.count("GET"), 0);
    assert_eq!(menus.rows().len(), 1);
}

#[tokio::test]
async fn test_identifierless_rows_refuse_edit_and_delete() {
    let transport = RecordingTransport::new();
    transport.respond_ok("GET", "ingredients", json!([{"name": "Ghost"}]));

    let mut ingredients = list_for(catalog::ingredients(), &transport);
    ingredients.load().await.unwrap();
    transport.reset_calls();

    assert!(ingredients.open_edit_at(0).is_err());
    assert!(!ingredients.form().is_open());

    assert!(ingredients.request_delete(&record(json!({"name": "Ghost"}))).is_err());
    assert!(ingredients.pending_delete().is_none());
    assert!(!ingredients.confirm_delete().await.unwrap());

    assert!(transport.calls().is_empty());
    assert_eq!(ingredients.take_notices().len(), 2);
}

#[tokio::test]
async fn test_console_registers_custom_collection() {
    let transport = RecordingTransport::new();
    transport.respond_ok("GET", "categories", json!([{"_id": "c1", "name": "Soup"}]));

    let shared: SharedTransport = transport.clone();
    let mut console = AdminConsole::with_transport(shared);
    let tabs: Vec<_> = console.descriptors().iter().map(|d| d.collection.clone()).collect();
    assert_eq!(tabs, vec!["ingredients", "roles", "users", "menus"]);

    console.register(
        ResourceDescriptor::new("categories", "Category")
            .field(FieldSpec::text("name", "Name").required("Please input the category name!")),
    );
    assert_eq!(console.lists().len(), 5);

    let mut categories = console.list("categories").unwrap();
    assert_eq!(categories.load().await.unwrap(), 1);
    assert_eq!(categories.rows()[0]["id"], "c1");
    assert!(console.list("orders").is_none());
}
