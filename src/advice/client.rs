//! Advice request orchestration: calculate, prompt, dispatch, validate.

use std::time::Duration;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use super::calculator::{compute, route_distance};
use super::models::{CalculationResult, Emissions, TripInput};
use super::prompt::AdvicePrompt;
use super::provider::AdviceProvider;
use super::validator;
use crate::error::{AdviceError, Result};

/// Largest acceptable gap between provider and local figures, in kg CO2.
const FIGURE_TOLERANCE: f64 = 0.1;

pub struct AdviceClient<P> {
    provider: P,
    timeout: Option<Duration>,
}

impl<P: AdviceProvider> AdviceClient<P> {
    pub fn new(provider: P, timeout: Option<Duration>) -> Self {
        Self { provider, timeout }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Request emissions figures and advice for a trip.
    ///
    /// Issues exactly one provider call. The numeric fields of the result are
    /// always the local calculation; only `summary` and `advice` come from
    /// the provider.
    #[tracing::instrument(
        name = "advice_request",
        skip(self, trip),
        fields(request_id = %uuid::Uuid::new_v4(), mode = %trip.transport_mode)
    )]
    pub async fn request_advice(&self, trip: &TripInput, distance_km: f64) -> Result<CalculationResult> {
        let distance = route_distance(distance_km)?;
        let emissions = compute(distance, trip.transport_mode, trip.electricity_or_zero())?;
        let request = AdvicePrompt::for_trip(trip, distance, &emissions);

        tracing::info!(
            "Requesting advice: {} -> {} ({} km)",
            trip.start_location,
            trip.destination,
            distance.normalize()
        );

        let raw = self.dispatch(&request).await?;
        let reply = validator::parse_reply(&raw)?;

        Ok(merge(reply, &emissions, distance_km))
    }

    /// Send an arbitrary prompt and return the fence-normalised JSON reply.
    pub async fn generate_json(&self, request: &AdvicePrompt) -> Result<Value> {
        let raw = self.dispatch(request).await?;
        validator::parse_json(&raw)
    }

    async fn dispatch(&self, request: &AdvicePrompt) -> Result<String> {
        let call = self.provider.generate(request);
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                AdviceError::ProviderUnavailable(format!(
                    "no reply within {} seconds",
                    limit.as_secs_f64()
                ))
            })?,
            None => call.await,
        };

        if let Err(e) = &outcome {
            tracing::error!(kind = e.kind(), "Advice provider call failed: {}", e);
        }
        outcome
    }
}

/// Overlay the authoritative local figures on a validated reply.
fn merge(reply: CalculationResult, emissions: &Emissions, distance_km: f64) -> CalculationResult {
    let route_co2 = to_f64(emissions.route_co2);
    let electric_co2 = to_f64(emissions.electric_co2);
    let total_co2 = to_f64(emissions.total_co2);

    let diverges = |reported: f64, expected: f64| (reported - expected).abs() > FIGURE_TOLERANCE + 1e-9;
    if diverges(reply.route_co2, route_co2)
        || diverges(reply.electric_co2, electric_co2)
        || diverges(reply.total_co2, total_co2)
        || diverges(reply.distance_km, distance_km)
    {
        tracing::warn!(
            reported_total = reply.total_co2,
            expected_total = total_co2,
            "Provider figures disagree with local calculation; using local figures"
        );
    }
    if !(3..=4).contains(&reply.advice.len()) {
        tracing::warn!(count = reply.advice.len(), "Provider returned an unusual number of tips");
    }

    CalculationResult {
        route_co2,
        electric_co2,
        total_co2,
        distance_km,
        summary: reply.summary,
        advice: reply.advice,
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
