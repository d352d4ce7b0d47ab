//! End-to-end flows through the HTTP API: onboarding, selling, approvals,
//! and closing the day

mod common;

use axum::http::{Method, StatusCode};
use common::{PASSWORD, app, create_account, login, send, setup_pool, test_config};
use mobile_master::models::Role;
use serde_json::json;

#[tokio::test]
async fn test_shop_day_from_onboarding_to_closing() {
    let pool = setup_pool();
    let app = app(pool.clone(), &test_config());
    create_account(&pool, "Platform Admin", "admin@mobilemaster.pk", Role::SuperAdmin);
    let admin = login(&app, "admin@mobilemaster.pk", PASSWORD).await;

    // The admin onboards an owner
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(&admin),
        Some(json!({"name": "Bilal Ahmed", "email": "Bilal@Example.pk", "password": PASSWORD, "role": "OWNER"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["email"], "bilal@example.pk");
    assert!(body["data"].get("password_hash").is_none());
    let owner = login(&app, "bilal@example.pk", PASSWORD).await;

    // The owner opens a shop and hires a worker
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/shops",
        Some(&owner),
        Some(json!({"name": "Bilal Mobiles", "address": "Hall Road, Lahore", "phone": "0300-1234567"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let shop_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/shops/{}/workers", shop_id),
        Some(&owner),
        Some(json!({"name": "Usman Tariq", "email": "usman@example.pk", "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["user"]["role"], "WORKER");
    let worker = login(&app, "usman@example.pk", PASSWORD).await;

    // Stock the shelf
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/shops/{}/products", shop_id),
        Some(&owner),
        Some(json!({
            "name": "Galaxy A15 128GB",
            "sku": "SAM-A15-128",
            "cost_price": 4_500_000,
            "sale_price": 4_999_900,
            "low_stock_threshold": 1,
            "initial_stock": 3
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let product_id = body["data"]["id"].as_str().unwrap().to_string();

    // The worker sells one for cash
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/shops/{}/sales", shop_id),
        Some(&worker),
        Some(json!({
            "items": [{"product_id": product_id, "quantity": 1}],
            "discount": 99_900,
            "payment_method": "CASH",
            "customer_name": "Ali Raza"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["total"], 4_900_000);

    // Workers cannot edit prices directly; they ask
    let product_uri = format!("/api/products/{}", product_id);
    let (status, _) = send(&app, Method::PATCH, &product_uri, Some(&worker), Some(json!({"sale_price": 4_899_900}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/approvals/request",
        Some(&worker),
        Some(json!({
            "shop_id": shop_id,
            "request_type": "PRODUCT_UPDATE",
            "entity_id": product_id,
            "payload": {"sale_price": 4_899_900}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], "PENDING");
    let request_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/approvals/{}/approve", request_id),
        Some(&owner),
        Some(json!({"note": "Eid discount"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "APPROVED");

    let (_, body) = send(&app, Method::GET, &product_uri, Some(&worker), None).await;
    assert_eq!(body["data"]["sale_price"], 4_899_900);

    // Two left is still above the threshold of one
    let (_, body) = send(&app, Method::GET, &format!("/api/shops/{}/inventory/low-stock", shop_id), Some(&owner), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    // Close the day with the drawer matching
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/shops/{}/daily-closings", shop_id),
        Some(&worker),
        Some(json!({"opening_cash": 1_000_000, "expenses": 50_000, "actual_cash": 5_850_000})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["expected_cash"], 5_850_000);
    assert_eq!(body["data"]["difference"], 0);

    // The owner sees it all in the audit log
    let (status, body) = send(&app, Method::GET, &format!("/api/shops/{}/audit-logs", shop_id), Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = body["data"].as_array().unwrap().iter().map(|e| e["action"].as_str().unwrap()).collect();
    for expected in ["PRODUCT_CREATED", "SALE_CREATED", "APPROVAL_REQUESTED", "APPROVAL_APPROVED", "PRODUCT_UPDATED"] {
        assert!(actions.contains(&expected), "missing {} in {:?}", expected, actions);
    }

    let (status, _) = send(&app, Method::GET, &format!("/api/shops/{}/audit-logs", shop_id), Some(&worker), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deactivated_account_is_locked_out() {
    let pool = setup_pool();
    let app = app(pool.clone(), &test_config());
    create_account(&pool, "Platform Admin", "admin@mobilemaster.pk", Role::SuperAdmin);
    let owner = create_account(&pool, "Kamran", "kamran@example.pk", Role::Owner);
    let admin = login(&app, "admin@mobilemaster.pk", PASSWORD).await;
    let token = login(&app, "kamran@example.pk", PASSWORD).await;

    let (status, _) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/users/{}/status", owner.id),
        Some(&admin),
        Some(json!({"active": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["active"], false);

    let (status, body) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"email": "kamran@example.pk", "password": PASSWORD})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tenants_are_isolated() {
    let pool = setup_pool();
    let app = app(pool.clone(), &test_config());
    create_account(&pool, "Bilal", "bilal@example.pk", Role::Owner);
    create_account(&pool, "Kamran", "kamran@example.pk", Role::Owner);
    let bilal = login(&app, "bilal@example.pk", PASSWORD).await;
    let kamran = login(&app, "kamran@example.pk", PASSWORD).await;

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/shops",
        Some(&bilal),
        Some(json!({"name": "Bilal Mobiles", "address": "Hall Road", "phone": "0300"})),
    )
    .await;
    let shop_id = body["data"]["id"].as_str().unwrap().to_string();

    for uri in [
        format!("/api/shops/{}", shop_id),
        format!("/api/shops/{}/products", shop_id),
        format!("/api/shops/{}/inventory", shop_id),
        format!("/api/shops/{}/sales", shop_id),
    ] {
        let (status, body) = send(&app, Method::GET, &uri, Some(&kamran), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
        assert_eq!(body["success"], false);
    }

    let (_, body) = send(&app, Method::GET, "/api/shops", Some(&kamran), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}
