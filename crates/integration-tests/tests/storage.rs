//! Storage behavior observed through the running server.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use jsonshop_core::ProductId;
use jsonshop_integration_tests::TestContext;
use jsonshop_server::db::RepositoryError;
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn test_existing_file_is_served() {
    let products = json!([{
        "_id": "5f1e3c",
        "name": "Espresso Cup",
        "price": 9.5,
        "createdAt": "2021-03-04T05:06:07.000Z",
        "updatedAt": "2021-03-04T05:06:07.000Z",
        "reviews": [{
            "_id": "r1",
            "rate": 4,
            "comment": "solid",
            "createdAt": "2021-03-05T00:00:00.000Z"
        }]
    }]);
    let ctx = TestContext::with_files(&[("products.json", &products.to_string())]).await;

    let product: Value = ctx
        .client
        .get(ctx.url("/products/5f1e3c"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(product["name"], "Espresso Cup");
    assert_eq!(product["reviews"][0]["rate"], 4);

    let review = ctx
        .db
        .products()
        .get_review(&ProductId::new("5f1e3c"), &"r1".into())
        .await
        .unwrap();
    assert_eq!(review.comment, "solid");
}

#[tokio::test]
async fn test_malformed_file_is_an_error_not_an_empty_catalog() {
    let ctx = TestContext::with_files(&[("products.json", "{ this is not json")]).await;

    let resp = ctx.client.get(ctx.url("/products")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Internal server error");

    let resp = ctx.client.get(ctx.url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    // A write must not clobber the unreadable file
    let resp = ctx
        .client
        .post(ctx.url("/products"))
        .json(&json!({ "name": "Espresso Cup" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let raw = std::fs::read_to_string(ctx.data_dir().join("products.json")).unwrap();
    assert_eq!(raw, "{ this is not json");

    assert!(matches!(
        ctx.db.products().get_all(None).await,
        Err(RepositoryError::Storage(_))
    ));
}

#[tokio::test]
async fn test_saves_leave_no_temp_files() {
    let ctx = TestContext::new().await;
    for name in ["Espresso Cup", "Oak Desk", "Tea Kettle"] {
        ctx.create_product(&json!({ "name": name })).await;
    }

    let entries: Vec<String> = std::fs::read_dir(ctx.data_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["products.json".to_string()]);
    assert_eq!(
        ctx.read_collection("products.json").as_array().unwrap().len(),
        3
    );
}

#[tokio::test]
async fn test_unrelated_writes_leave_existing_records_as_stored() {
    let lamp = json!({
        "_id": "old-lamp",
        "name": "Old Lamp",
        "price": 12,
        "stock": 7,
        "createdAt": "2020-10-10T10:00:00.000Z",
        "updatedAt": "2020-10-10T10:00:00.000Z",
        "reviews": [{
            "_id": "r1",
            "rate": "5",
            "comment": "bright",
            "createdAt": "2020-10-11T00:00:00.000Z"
        }]
    });
    let carts = json!([
        { "_id": "cart0", "owner": "bob", "products": ["old-lamp"] },
        { "_id": "cart1", "products": [] }
    ]);
    let ctx = TestContext::with_files(&[
        ("products.json", &json!([lamp]).to_string()),
        ("carts.json", &carts.to_string()),
    ])
    .await;

    let created = ctx
        .create_product(&json!({ "name": "Espresso Cup", "price": 9 }))
        .await;
    let resp = ctx
        .client
        .post(ctx.url("/carts/cart1/add-to-cart/old-lamp"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let products = ctx.read_collection("products.json");
    assert_eq!(products[0], lamp);
    assert_eq!(products[1]["_id"], created["_id"]);
    assert!(
        products[1]["createdAt"]
            .as_str()
            .unwrap()
            .ends_with('Z')
    );
    assert_eq!(products[1]["createdAt"].as_str().unwrap().len(), 24);

    let carts_on_disk = ctx.read_collection("carts.json");
    assert_eq!(carts_on_disk[0], carts[0]);
    assert_eq!(carts_on_disk[1]["products"], json!(["old-lamp"]));
}

#[tokio::test]
async fn test_loosely_typed_ratings_are_served() {
    let products = json!([
        {
            "_id": "quoted",
            "name": "Espresso Cup",
            "createdAt": "2021-03-04T05:06:07.000Z",
            "updatedAt": "2021-03-04T05:06:07.000Z",
            "reviews": [{ "_id": "r1", "rate": "5", "comment": "ok", "createdAt": "2021-03-05T00:00:00.000Z" }]
        },
        {
            "_id": "plain",
            "name": "Oak Desk",
            "createdAt": "2021-03-04T05:06:07.000Z",
            "updatedAt": "2021-03-04T05:06:07.000Z",
            "reviews": [{ "_id": "r2", "rate": 4.5, "comment": "ok", "createdAt": "2021-03-05T00:00:00.000Z" }]
        }
    ]);
    let ctx = TestContext::with_files(&[("products.json", &products.to_string())]).await;

    let resp = ctx.client.get(ctx.url("/products/plain")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let plain: Value = resp.json().await.unwrap();
    assert_eq!(plain["reviews"][0]["rate"], 4.5);

    let resp = ctx
        .client
        .get(ctx.url("/products/quoted/reviews"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let reviews: Value = resp.json().await.unwrap();
    assert_eq!(reviews[0]["rate"], 5);
}
