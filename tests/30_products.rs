mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn public_can_list_products() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server.client.get(server.api("/products")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], json!([]));
    Ok(())
}

#[tokio::test]
async fn customer_cannot_create_products() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.customer_token("casey@example.com").await?;

    let res = server
        .client
        .post(server.api("/products"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Garden Hose", "price": "19.99", "stock": 5 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "FORBIDDEN");

    let list: Value = server.client.get(server.api("/products")).send().await?.json().await?;
    assert_eq!(list["data"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn anonymous_create_is_unauthenticated() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .client
        .post(server.api("/products"))
        .json(&json!({ "name": "Garden Hose" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn staff_product_lifecycle() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.staff_token("sam@example.com").await?;

    let id = server
        .create(
            &token,
            "/products",
            json!({ "name": "Garden Hose", "desc": "Fifty feet of green hose", "price": 19.99, "stock": 5 }),
            "prodId",
        )
        .await?;

    let res = server.client.get(server.api(&format!("/products/{}", id))).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["name"], "Garden Hose");
    assert_eq!(body["data"]["price"], "19.99");
    assert!(body["data"]["createdAt"].is_string());

    let res = server
        .client
        .put(server.api(&format!("/products/{}", id)))
        .bearer_auth(&token)
        .json(&json!({ "stock": 0, "prodId": 777 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["stock"], 0);
    assert_eq!(body["data"]["prodId"], id);

    let res = server
        .client
        .delete(server.api(&format!("/products/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(res.bytes().await?.is_empty());

    let res = server.client.get(server.api(&format!("/products/{}", id))).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await?;
    assert_eq!(body["error"], "Product not found");
    Ok(())
}

#[tokio::test]
async fn product_bodies_are_validated() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.staff_token("sam@example.com").await?;

    let res = server
        .client
        .post(server.api("/products"))
        .bearer_auth(&token)
        .json(&json!({ "name": "X1", "price": "10.555", "stock": -2 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    for field in ["name", "price", "stock"] {
        assert!(body["field_errors"].get(field).is_some(), "missing error for {}", field);
    }

    let res = server
        .client
        .post(server.api("/products"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Garden Hose", "colour": "green" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn update_without_writable_fields_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.staff_token("sam@example.com").await?;
    let id = server.create(&token, "/products", json!({ "name": "Garden Hose" }), "prodId").await?;

    let res = server
        .client
        .put(server.api(&format!("/products/{}", id)))
        .bearer_auth(&token)
        .json(&json!({ "createdAt": "2020-01-01T00:00:00Z", "bogus": 1 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn missing_and_malformed_ids() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.staff_token("sam@example.com").await?;

    let res = server.client.get(server.api("/products/424242")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.client.get(server.api("/products/abc")).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .client
        .delete(server.api("/products/424242"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn admins_pass_the_staff_gate() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.admin_token()?;

    server.create(&token, "/services", json!({ "name": "Lawn Mowing", "price": "45.00" }), "serviceId").await?;
    Ok(())
}
