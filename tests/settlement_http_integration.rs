//! Integration tests for the settlement HTTP surface.
//!
//! These drive the deployed router shape in simulation mode: real
//! handlers, the in-memory entitlement store, and the simulated
//! gateway. That is exactly what a deployment without gateway
//! credentials serves, so these flows double as a regression net for
//! the checkout paths:
//! 1. Order creation and capture activate the caller's entitlement
//! 2. Subscription checkout activates immediately (no approval redirect)
//! 3. Status and access queries reflect the stored record
//! 4. Webhooks are acknowledged and matched by subscription id

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use tollgate::adapters::http::settlement::{
    settlement_router, GatewayPublicInfo, SettlementAppState,
};
use tollgate::adapters::paypal::SimulatedGateway;
use tollgate::adapters::storage::InMemoryEntitlementStore;
use tollgate::domain::foundation::{Timestamp, UserId};
use tollgate::domain::subscription::SubscriptionStatus;
use tollgate::ports::EntitlementStore;

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Builds the router the binary serves, backed by simulation mode.
///
/// The store is cloned into the state; both handles share the same
/// records, so tests can verify persistence directly.
fn simulation_app(store: &InMemoryEntitlementStore) -> Router {
    let state = SettlementAppState::new(
        Arc::new(store.clone()),
        Arc::new(SimulatedGateway::new()),
        GatewayPublicInfo {
            environment: "sandbox".to_string(),
            configured: false,
            simulation: true,
            client_id: None,
        },
    );

    Router::new()
        .nest("/api", settlement_router())
        .with_state(state)
}

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

async fn seed_user(store: &InMemoryEntitlementStore, id: &str) {
    let email = format!("{}@example.com", id);
    store.insert_user(&user(id), Some(&email)).await;
}

fn get(uri: &str, user_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header("X-User-Id", user_id);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, user_id: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user_id) = user_id {
        builder = builder.header("X-User-Id", user_id);
    }
    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn post_empty(uri: &str, user_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header("X-User-Id", user_id);
    }
    builder.body(Body::empty()).unwrap()
}

async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Integration Tests
// =============================================================================

/// The config endpoint is public and reports the active gateway mode
/// without exposing secrets.
#[tokio::test]
async fn gateway_config_reports_simulation_mode() {
    let store = InMemoryEntitlementStore::new();
    let app = simulation_app(&store);

    let response = app.oneshot(get("/api/billing/config", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["gateway"], "simulated");
    assert_eq!(body["environment"], "sandbox");
    assert_eq!(body["configured"], false);
    assert_eq!(body["simulation"], true);
    assert!(body.get("client_id").is_none());
}

/// Tests the complete one-off purchase flow:
/// create order → capture → entitlement active for about thirty days.
#[tokio::test]
async fn order_round_trip_activates_the_caller() {
    let store = InMemoryEntitlementStore::new();
    seed_user(&store, "alice").await;
    let app = simulation_app(&store);

    // Order creation needs no caller identity
    let response = app
        .clone()
        .oneshot(post_json("/api/billing/orders", None, &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = response_json(response).await;
    let order_id = order["order_id"].as_str().unwrap().to_string();
    assert!(order_id.starts_with("SIMULATED_ORDER_"));
    assert_eq!(order["status"], "CREATED");

    // Capture as alice
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/billing/orders/capture",
            Some("alice"),
            &json!({ "order_id": order_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let captured = response_json(response).await;
    assert!(captured["capture_id"].as_str().unwrap().starts_with("SIM-"));
    assert_eq!(captured["status"], "COMPLETED");
    assert_eq!(captured["subscription"]["status"], "active");
    assert_eq!(captured["subscription"]["provider"], "simulated");
    assert_eq!(captured["subscription"]["plan_id"], "monthly");

    // Entitlement window lands about thirty days out
    let period_end = Timestamp::parse_rfc3339(
        captured["subscription"]["current_period_end"]
            .as_str()
            .unwrap(),
    )
    .unwrap();
    assert!(period_end.is_after(&Timestamp::now().add_days(29)));
    assert!(Timestamp::now().add_days(31).is_after(&period_end));

    // The stored record agrees with the response
    let stored = store.get(&user("alice")).await.unwrap().unwrap();
    assert_eq!(stored.status, SubscriptionStatus::Active);
    assert_eq!(
        stored.subscription_id.as_deref(),
        captured["capture_id"].as_str()
    );

    // And both queries now answer entitled
    let response = app
        .clone()
        .oneshot(get("/api/billing/subscriptions/status", Some("alice")))
        .await
        .unwrap();
    assert_eq!(response_json(response).await["is_active"], true);

    let response = app
        .oneshot(get("/api/billing/access", Some("alice")))
        .await
        .unwrap();
    assert_eq!(response_json(response).await["has_access"], true);
}

/// Without gateway credentials, subscription checkout still works: the
/// simulated gateway activates in one step instead of redirecting the
/// buyer for approval.
#[tokio::test]
async fn subscription_checkout_activates_immediately_in_simulation() {
    let store = InMemoryEntitlementStore::new();
    seed_user(&store, "bob").await;
    let app = simulation_app(&store);

    let response = app
        .oneshot(post_json(
            "/api/billing/subscriptions",
            Some("bob"),
            &json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let subscription_id = body["subscription_id"].as_str().unwrap().to_string();
    assert!(subscription_id.starts_with("SIM_SUB_"));
    // No approval redirect in simulation mode
    assert!(body.get("approve_url").is_none());
    assert_eq!(body["subscription"]["status"], "active");
    assert_eq!(body["subscription"]["provider"], "simulated");

    let stored = store.get(&user("bob")).await.unwrap().unwrap();
    assert_eq!(stored.status, SubscriptionStatus::Active);
    assert_eq!(stored.subscription_id, Some(subscription_id));
}

/// Confirming is safe to retry: the second call rewrites the same
/// record instead of failing on the already-active state.
#[tokio::test]
async fn confirm_subscription_is_idempotent() {
    let store = InMemoryEntitlementStore::new();
    seed_user(&store, "carol").await;
    let app = simulation_app(&store);

    let request_body = json!({ "subscription_id": "SIM_SUB_REDIRECT" });
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/billing/subscriptions/confirm",
                Some("carol"),
                &request_body,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["subscription"]["subscription_id"], "SIM_SUB_REDIRECT");
        assert_eq!(body["subscription"]["status"], "active");
    }

    let stored = store.get(&user("carol")).await.unwrap().unwrap();
    assert_eq!(stored.status, SubscriptionStatus::Active);
    assert_eq!(stored.subscription_id.as_deref(), Some("SIM_SUB_REDIRECT"));
}

/// A user who never purchased anything reads back the defaulted record,
/// not an error.
#[tokio::test]
async fn status_of_a_fresh_user_is_inactive_without_error() {
    let store = InMemoryEntitlementStore::new();
    seed_user(&store, "dave").await;
    let app = simulation_app(&store);

    let response = app
        .clone()
        .oneshot(get("/api/billing/subscriptions/status", Some("dave")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["subscription"]["status"], "inactive");
    assert!(body["subscription"]["provider"].is_null());
    assert!(body["subscription"]["current_period_end"].is_null());
    assert_eq!(body["is_active"], false);

    let response = app
        .oneshot(get("/api/billing/access", Some("dave")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["has_access"], false);
}

#[tokio::test]
async fn user_endpoints_reject_requests_without_identity() {
    let store = InMemoryEntitlementStore::new();
    let app = simulation_app(&store);

    let response = app
        .clone()
        .oneshot(get("/api/billing/subscriptions/status", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["error_code"], "AUTHENTICATION_REQUIRED");

    let response = app
        .oneshot(post_json("/api/billing/subscriptions", None, &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn capture_for_an_unknown_user_is_not_found() {
    let store = InMemoryEntitlementStore::new();
    let app = simulation_app(&store);

    let response = app
        .oneshot(post_json(
            "/api/billing/orders/capture",
            Some("ghost"),
            &json!({ "order_id": "SIMULATED_ORDER_1" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["error_code"], "USER_NOT_FOUND");
}

/// Cancelling stops entitlement immediately but keeps the gateway
/// identity and the paid-through date on the record.
#[tokio::test]
async fn cancel_stops_entitlement_and_keeps_the_record() {
    let store = InMemoryEntitlementStore::new();
    seed_user(&store, "erin").await;
    let app = simulation_app(&store);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/billing/subscriptions",
            Some("erin"),
            &json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(post_empty("/api/billing/subscriptions/cancel", Some("erin")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get("/api/billing/subscriptions/status", Some("erin")))
        .await
        .unwrap();
    let body = response_json(response).await;
    assert_eq!(body["subscription"]["status"], "cancelled");
    assert!(body["subscription"]["subscription_id"]
        .as_str()
        .unwrap()
        .starts_with("SIM_SUB_"));
    assert!(!body["subscription"]["current_period_end"].is_null());
    assert_eq!(body["is_active"], false);

    let response = app
        .oneshot(get("/api/billing/access", Some("erin")))
        .await
        .unwrap();
    assert_eq!(response_json(response).await["has_access"], false);
}

/// Tests the webhook flow end to end: an activated user is cancelled by
/// a gateway notification matched on subscription id.
#[tokio::test]
async fn webhook_cancellation_downgrades_the_matched_user() {
    let store = InMemoryEntitlementStore::new();
    seed_user(&store, "frank").await;
    let app = simulation_app(&store);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/billing/subscriptions",
            Some("frank"),
            &json!({}),
        ))
        .await
        .unwrap();
    let subscription_id = response_json(response).await["subscription_id"]
        .as_str()
        .unwrap()
        .to_string();

    let event = json!({
        "id": "WH-cancel-1",
        "event_type": "BILLING.SUBSCRIPTION.CANCELLED",
        "create_time": "2026-08-25T10:00:00Z",
        "resource": { "id": subscription_id, "status": "CANCELLED" }
    });
    let response = app
        .oneshot(post_json("/api/webhooks/paypal", None, &event))
        .await
        .unwrap();

    // Webhooks are always acknowledged; simulation cannot verify them
    assert_eq!(response.status(), StatusCode::OK);
    let ack = response_json(response).await;
    assert_eq!(ack["received"], true);
    assert_eq!(ack["verified"], false);

    // Status downgraded, identity and paid-through date untouched
    let stored = store.get(&user("frank")).await.unwrap().unwrap();
    assert_eq!(stored.status, SubscriptionStatus::Cancelled);
    assert_eq!(stored.subscription_id, Some(subscription_id));
    assert!(stored.current_period_end.is_some());
}

#[tokio::test]
async fn webhook_with_unknown_subscription_is_still_acknowledged() {
    let store = InMemoryEntitlementStore::new();
    let app = simulation_app(&store);

    let event = json!({
        "event_type": "BILLING.SUBSCRIPTION.ACTIVATED",
        "resource": { "id": "I-NEVER-SEEN", "status": "ACTIVE" }
    });
    let response = app
        .oneshot(post_json("/api/webhooks/paypal", None, &event))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["received"], true);
}

/// Gateways retry on non-2xx, so even garbage must be acknowledged.
#[tokio::test]
async fn webhook_acknowledges_an_unparseable_body() {
    let store = InMemoryEntitlementStore::new();
    let app = simulation_app(&store);

    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/paypal")
        .body(Body::from("definitely not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["received"], true);
}
