use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::IntoResponse;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::leads::router::{submit_handler, LEADS_PATH};
use crate::leads::service::{LeadRelayError, DELIVERY_FAILED_MESSAGE};
use crate::leads::sink::SinkError;

fn post_json(body: Vec<u8>) -> Request<Body> {
    Request::post(LEADS_PATH)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ORIGIN, ALLOWED_ORIGIN)
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn submit_handler_returns_success_body() {
    let harness = harness(RecordingSink::default());

    let response = submit_handler::<RecordingSink>(
        State(harness.service.clone()),
        body_of(&full_payload()).into(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "success": true }));
}

#[tokio::test]
async fn submit_route_rejects_missing_loan_type() {
    let harness = harness(RecordingSink::default());
    let payload = json!({ "name": "A", "email": "a@b.com", "contact": "12345678" });

    let response = harness
        .router()
        .oneshot(post_json(body_of(&payload)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Missing required field: loan_type" })
    );
}

#[tokio::test]
async fn submit_route_reports_generic_error_when_sink_unreachable() {
    let harness = harness(UnreachableSink);

    let response = harness
        .router()
        .oneshot(post_json(body_of(&full_payload())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    let message = body["error"].as_str().expect("error message");
    assert!(!message.contains("connection refused"));
}

#[tokio::test]
async fn get_is_method_not_allowed() {
    let harness = harness(RecordingSink::default());

    let response = harness
        .router()
        .oneshot(Request::get(LEADS_PATH).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers().get(header::ALLOW).unwrap(), "POST");
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Method not allowed" })
    );
    assert!(harness.log_lines().is_empty());
}

#[tokio::test]
async fn responses_carry_the_configured_origin() {
    let harness = harness(RecordingSink::default());

    let response = harness
        .router()
        .oneshot(post_json(body_of(&full_payload())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        ALLOWED_ORIGIN
    );
}

#[tokio::test]
async fn preflight_allows_post_with_content_type() {
    let harness = harness(RecordingSink::default());

    let response = harness
        .router()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri(LEADS_PATH)
                .header(header::ORIGIN, ALLOWED_ORIGIN)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
        "POST"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
        "content-type"
    );
    assert!(harness.sink.delivered().is_empty());
}

#[tokio::test]
async fn relay_error_response_keeps_the_cause_private() {
    let response = LeadRelayError::Delivery(SinkError::Transport {
        attempts: 3,
        message: "dns error: script.example.com".to_string(),
    })
    .into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({ "error": DELIVERY_FAILED_MESSAGE })
    );
}
