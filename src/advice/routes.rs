//! HTTP route handlers for the advice API.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::{get, post},
    Router,
};
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;

use crate::error::{AdviceError, Result};
use crate::routing::{GeocodeFailure, RouteReport};
use crate::AppState;

use super::models::{AdviceRequest, CalculationResult, GenerateRequest, TransportMode, TripInput, ELECTRICITY_FACTOR};
use super::prompt::{response_schema, AdvicePrompt};
use super::provider::AdviceProvider;

/// Create the advice router with all endpoints.
pub fn router<P: AdviceProvider + 'static>() -> Router<AppState<P>> {
    Router::new()
        .route("/", post(request_advice::<P>))
        .route("/generate", post(generate::<P>))
        .route("/health", get(health::<P>))
}

/// Health check for the advice engine, with the factor table in use.
async fn health<P: AdviceProvider>(State(state): State<AppState<P>>) -> Json<Value> {
    let factors: serde_json::Map<String, Value> = TransportMode::ALL
        .iter()
        .map(|mode| {
            let factor = mode.emission_factor().to_f64().unwrap_or_default();
            (mode.to_string(), Value::from(factor))
        })
        .collect();

    Json(serde_json::json!({
        "status": "ok",
        "service": "advice-engine",
        "model": state.model,
        "emission_factors_kg_per_km": factors,
        "electricity_factor_kg_per_kwh": ELECTRICITY_FACTOR.to_f64().unwrap_or_default(),
    }))
}

/// Calculate trip emissions and fetch reduction advice.
async fn request_advice<P: AdviceProvider>(
    State(state): State<AppState<P>>,
    payload: Result<Json<AdviceRequest>, JsonRejection>,
) -> Result<Json<CalculationResult>> {
    let Json(request) = payload?;

    let route = match request.route {
        Some(RouteReport::Resolved(route)) => route,
        Some(RouteReport::Failed { status, address }) => {
            return Err(match GeocodeFailure::from_status(&status, &address) {
                Some(failure) => AdviceError::RouteUnavailable(failure),
                None => AdviceError::InvalidRoute,
            });
        }
        None => return Err(AdviceError::InvalidRoute),
    };
    let distance_km = route.distance_km.ok_or(AdviceError::InvalidRoute)?;

    // The map's canonical addresses replace what was typed.
    let pick = |resolved: &str, typed: &str| -> String {
        if resolved.trim().is_empty() {
            typed.to_string()
        } else {
            resolved.to_string()
        }
    };
    let start = pick(&route.start_address, &request.start_location);
    let destination = pick(&route.end_address, &request.destination);

    let trip = TripInput::parse(
        &start,
        &destination,
        &request.transport_mode,
        request.electricity_kwh.as_deref(),
    )?;

    let result = state.advice.request_advice(&trip, distance_km).await?;
    Ok(Json(result))
}

/// Forward a raw prompt to the provider and return its JSON reply.
async fn generate<P: AdviceProvider>(
    State(state): State<AppState<P>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = payload?;
    if request.prompt.trim().is_empty() {
        return Err(AdviceError::InvalidInput("missing prompt".into()));
    }

    let prompt = AdvicePrompt {
        prompt: request.prompt,
        response_schema: request.response_schema.unwrap_or_else(response_schema),
    };
    let reply = state.advice.generate_json(&prompt).await?;
    Ok(Json(reply))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::client::tests::{StubProvider, GOOD_REPLY};
    use crate::advice::AdviceClient;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(provider: StubProvider) -> Router {
        let state = AppState {
            advice: Arc::new(AdviceClient::new(provider, None)),
            model: "stub-model".to_string(),
        };
        Router::new()
            .nest("/api/advice", router::<StubProvider>())
            .with_state(state)
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn trip_body(route: Value) -> Value {
        serde_json::json!({
            "start_location": "Dublin",
            "destination": "Belfast",
            "transport_mode": "car",
            "electricity_kwh": "",
            "route": route,
        })
    }

    #[tokio::test]
    async fn test_advice_success() {
        let body = trip_body(serde_json::json!({
            "distance_km": 100.0,
            "start_address": "Dublin, Ireland",
            "end_address": "Belfast, UK"
        }));

        let (status, json) = post_json(app(StubProvider::replying(GOOD_REPLY)), "/api/advice", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total_co2"], 21.0);
        assert_eq!(json["distance_km"], 100.0);
        assert_eq!(json["advice"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_route_is_invalid_route() {
        let provider = StubProvider::replying(GOOD_REPLY);
        let (status, json) = post_json(app(provider.clone()), "/api/advice", trip_body(Value::Null)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error_type"], "invalid_route");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_route_without_distance_is_invalid_route() {
        for route in [
            serde_json::json!({ "start_address": "A", "end_address": "B" }),
            serde_json::json!({ "distance_km": null, "start_address": "A", "end_address": "B" }),
            serde_json::json!({ "distance_km": 0.0, "start_address": "A", "end_address": "B" }),
        ] {
            let provider = StubProvider::replying(GOOD_REPLY);
            let (status, json) = post_json(app(provider.clone()), "/api/advice", trip_body(route)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["error_type"], "invalid_route");
            assert_eq!(provider.call_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_missing_mode_is_invalid_input() {
        let mut body = trip_body(serde_json::json!({
            "distance_km": 10.0,
            "start_address": "A",
            "end_address": "B"
        }));
        body.as_object_mut().unwrap().remove("transport_mode");

        let provider = StubProvider::replying(GOOD_REPLY);
        let (status, json) = post_json(app(provider.clone()), "/api/advice", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error_type"], "invalid_input");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_body_is_invalid_input() {
        let body = serde_json::json!({ "transport_mode": 42, "route": "somewhere" });
        let (status, json) = post_json(app(StubProvider::replying(GOOD_REPLY)), "/api/advice", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error_type"], "invalid_input");
    }

    #[tokio::test]
    async fn test_geocode_failure_is_reported() {
        let body = trip_body(serde_json::json!({ "status": "ZERO_RESULTS", "address": "Atlantis" }));
        let (status, json) = post_json(app(StubProvider::replying(GOOD_REPLY)), "/api/advice", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error_type"], "route_unavailable");
        assert!(json["message"].as_str().unwrap().contains("Atlantis"));
    }

    #[tokio::test]
    async fn test_unknown_mode_is_invalid_input() {
        let mut body = trip_body(serde_json::json!({
            "distance_km": 10.0,
            "start_address": "A",
            "end_address": "B"
        }));
        body["transport_mode"] = Value::from("rocket");

        let provider = StubProvider::replying(GOOD_REPLY);
        let (status, json) = post_json(app(provider.clone()), "/api/advice", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error_type"], "invalid_input");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_reply_is_bad_gateway() {
        let body = trip_body(serde_json::json!({
            "distance_km": 10.0,
            "start_address": "A",
            "end_address": "B"
        }));
        let (status, json) = post_json(app(StubProvider::replying("not json")), "/api/advice", body).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error_type"], "malformed_response");
    }

    #[tokio::test]
    async fn test_generate_requires_prompt() {
        let (status, json) = post_json(
            app(StubProvider::replying("{}")),
            "/api/advice/generate",
            serde_json::json!({ "prompt": "  " }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error_type"], "invalid_input");
    }

    #[tokio::test]
    async fn test_generate_returns_reply_json() {
        let (status, json) = post_json(
            app(StubProvider::replying("{\"ok\": true}")),
            "/api/advice/generate",
            serde_json::json!({ "prompt": "hi", "responseSchema": { "type": "object" } }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ok"], true);
    }

    #[tokio::test]
    async fn test_health_lists_factors() {
        let response = app(StubProvider::replying("{}"))
            .oneshot(Request::builder().uri("/api/advice/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["model"], "stub-model");
        assert_eq!(json["emission_factors_kg_per_km"]["plane"], 0.25);
    }
}
