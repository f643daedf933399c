//! End-to-end tests: commands in over HTTP, notifications out over the
//! broadcast channel, reads back over HTTP.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

const COMMANDS_URI: &str = "/api/v1/products/commands";

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_update_delete_round_trip(pool: PgPool) {
    let service = common::start_service(pool.clone());

    // Create
    let (status, json) = common::post_json(
        service.app.clone(),
        COMMANDS_URI,
        &json!({
            "kind": "create",
            "payload": {
                "name": "Potato",
                "kcal": 73.0,
                "type": "FRUITS_AND_VEGETABLES",
                "properties": { "KCAL_AFTER_BOILED": "66.0" }
            }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["status"], "accepted");

    let created = service.next_notification().await;
    assert_eq!(created["code"], "PRODUCT_CREATED");
    assert_eq!(created["message"], "New product was created (Potato)");
    let id = created["properties"]["product"]["id"].as_str().unwrap().to_owned();

    let (status, json) =
        common::get_json(service.app.clone(), &format!("/api/v1/products/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Potato");
    assert_eq!(json["properties"], json!({ "KCAL_AFTER_BOILED": "66.0" }));

    // Update
    common::post_json(
        service.app.clone(),
        COMMANDS_URI,
        &json!({
            "kind": "update",
            "payload": {
                "id": id,
                "name": "Potato_updated",
                "kcal": 74.0,
                "type": "FRUITS_AND_VEGETABLES",
                "properties": { "ORIGIN": "local" }
            }
        }),
    )
    .await;
    let updated = service.next_notification().await;
    assert_eq!(updated["code"], "PRODUCT_UPDATED");
    assert_eq!(updated["properties"]["product"]["version"], 1);
    assert_eq!(
        updated["properties"]["product"]["properties"],
        json!({ "ORIGIN": "local" })
    );

    // Delete
    common::post_json(
        service.app.clone(),
        COMMANDS_URI,
        &json!({ "kind": "delete", "payload": { "id": id } }),
    )
    .await;
    let removed = service.next_notification().await;
    assert_eq!(removed["code"], "PRODUCT_REMOVED");
    assert_eq!(removed["message"], "Product was removed (Potato_updated)");

    let (status, json) = common::get_json(service.app, &format!("/api/v1/products/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "product_not_found");

    let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM custom_properties")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orphans, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_failed_command_is_reported_only_on_notification_channel(pool: PgPool) {
    let service = common::start_service(pool);
    let missing = Uuid::new_v4();

    let (status, _) = common::post_json(
        service.app.clone(),
        COMMANDS_URI,
        &json!({ "kind": "delete", "payload": { "id": missing } }),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    let notification = service.next_notification().await;
    assert_eq!(notification["code"], "PRODUCT_REMOVED_ERROR");
    assert_eq!(
        notification["message"],
        format!("product not found by id {missing}")
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_list_pages_through_created_products(pool: PgPool) {
    // Arrange
    let service = common::start_service(pool);
    for name in ["Apple", "Bread", "Cheese"] {
        common::post_json(
            service.app.clone(),
            COMMANDS_URI,
            &json!({ "kind": "create", "payload": { "name": name, "kcal": 1.0, "type": "OTHER" } }),
        )
        .await;
        assert_eq!(service.next_notification().await["code"], "PRODUCT_CREATED");
    }

    // Act
    let (status, json) =
        common::get_json(service.app, "/api/v1/products?page_number=0&page_size=2").await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Apple", "Bread"]);
    assert_eq!(json["total_elements"], 3);
    assert_eq!(json["total_pages"], 2);
}
