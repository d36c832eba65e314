//! End-to-end product, review and export tests over HTTP.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use jsonshop_integration_tests::TestContext;
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new().await;

    let resp = ctx.client.get(ctx.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = ctx.client.get(ctx.url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_create_persists_to_file() {
    let ctx = TestContext::new().await;

    let product = ctx
        .create_product(&json!({ "name": "Espresso Cup", "price": 9 }))
        .await;
    let id = product["_id"].as_str().unwrap();
    assert!(!id.is_empty());
    assert_eq!(product["createdAt"], product["updatedAt"]);
    assert_eq!(product["reviews"], json!([]));

    let on_disk = ctx.read_collection("products.json");
    assert_eq!(on_disk.as_array().unwrap().len(), 1);
    assert_eq!(on_disk[0]["_id"], id);
    assert_eq!(on_disk[0]["name"], "Espresso Cup");
}

#[tokio::test]
async fn test_update_merges_and_delete_removes() {
    let ctx = TestContext::new().await;
    let product = ctx
        .create_product(&json!({ "name": "Espresso Cup", "brand": "Acme", "category": "kitchen" }))
        .await;
    let url = ctx.url(&format!("/products/{}", product["_id"].as_str().unwrap()));

    let resp = ctx
        .client
        .put(&url)
        .json(&json!({ "name": "Espresso Mug", "price": "12.50" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["name"], "Espresso Mug");
    assert_eq!(updated["brand"], "Acme");
    assert_eq!(updated["price"], 12.5);
    assert_eq!(updated["createdAt"], product["createdAt"]);

    let resp = ctx.client.delete(&url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ctx.client.get(&url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(ctx.read_collection("products.json"), json!([]));
}

#[tokio::test]
async fn test_category_filter() {
    let ctx = TestContext::new().await;
    ctx.create_product(&json!({ "name": "Espresso Cup", "category": "kitchen" }))
        .await;
    ctx.create_product(&json!({ "name": "Oak Desk", "category": "office" }))
        .await;
    ctx.create_product(&json!({ "name": "Tea Kettle", "category": "kitchen" }))
        .await;

    let all: Value = ctx
        .client
        .get(ctx.url("/products"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.as_array().unwrap().len(), 3);

    let kitchen: Value = ctx
        .client
        .get(ctx.url("/products?category=kitchen"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = kitchen
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Espresso Cup", "Tea Kettle"]);

    let none: Value = ctx
        .client
        .get(ctx.url("/products?category=garden"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(none, json!([]));
}

#[tokio::test]
async fn test_validation_errors() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .client
        .post(ctx.url("/products"))
        .json(&json!({ "price": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ctx
        .client
        .post(ctx.url("/products"))
        .json(&json!({ "name": "Cup" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("at least 4"));

    // Nothing was written
    assert!(!ctx.data_dir().join("products.json").exists());
}

#[tokio::test]
async fn test_review_scenario() {
    let ctx = TestContext::new().await;
    let product = ctx
        .create_product(&json!({ "name": "Espresso Cup", "price": 9 }))
        .await;
    let reviews_url = ctx.url(&format!(
        "/products/{}/reviews",
        product["_id"].as_str().unwrap()
    ));

    let resp = ctx
        .client
        .post(&reviews_url)
        .json(&json!({ "comment": "missing rating" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ctx
        .client
        .post(&reviews_url)
        .json(&json!({ "rating": 5, "comment": "great" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let reviews: Value = resp.json().await.unwrap();
    assert_eq!(reviews.as_array().unwrap().len(), 1);
    assert_eq!(reviews[0]["rate"], 5);
    assert_eq!(reviews[0]["comment"], "great");

    let review_url = format!("{reviews_url}/{}", reviews[0]["_id"].as_str().unwrap());
    let resp = ctx
        .client
        .put(&review_url)
        .json(&json!({ "rate": 4 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let reviews: Value = resp.json().await.unwrap();
    assert_eq!(reviews[0]["rate"], 4);
    assert_eq!(reviews[0]["comment"], "great");
    assert!(reviews[0]["updatedAt"].is_string());

    let resp = ctx
        .client
        .put(&review_url)
        .json(&json!({ "rate": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ctx.client.delete(&review_url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.json::<Value>().await.unwrap(), json!([]));

    let on_disk = ctx.read_collection("products.json");
    assert_eq!(on_disk[0]["reviews"], json!([]));
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let ctx = TestContext::new().await;

    for url in [
        "/products/nonexistent",
        "/products/nonexistent/reviews",
        "/products/nonexistent/reviews/r1",
    ] {
        let resp = ctx.client.get(ctx.url(url)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{url}");
    }
}

#[tokio::test]
async fn test_export_csv() {
    let ctx = TestContext::new().await;
    ctx.create_product(&json!({ "name": "Espresso Cup", "brand": "Acme, Inc.", "price": 9.5 }))
        .await;

    let resp = ctx
        .client
        .get(ctx.url("/products/export/exportToCSV"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()["content-disposition"],
        "attachment; filename=\"productsList.csv\""
    );

    let body = resp.text().await.unwrap();
    let mut lines = body.lines();
    assert_eq!(
        lines.next().unwrap(),
        "_id,name,description,brand,price,category,createdAt,updatedAt,imageUrl"
    );
    let row = lines.next().unwrap();
    assert!(row.contains(",Espresso Cup,,\"Acme, Inc.\",9.5,,"), "{row}");
    assert!(lines.next().is_none());
}

#[tokio::test]
async fn test_bad_bodies_and_routes_get_json_errors() {
    let ctx = TestContext::new().await;
    let product = ctx.create_product(&json!({ "name": "Espresso Cup" })).await;
    let reviews_url = ctx.url(&format!(
        "/products/{}/reviews",
        product["_id"].as_str().unwrap()
    ));

    let resp = ctx
        .client
        .post(&reviews_url)
        .json(&json!({ "rate": "5", "comment": "quoted rating" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = ctx
        .client
        .post(ctx.url("/products"))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());

    let resp = ctx.client.get(ctx.url("/no/such/route")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "route not found");
}
