//! Prompt and response schema sent to the advice provider.

use rust_decimal::Decimal;
use serde_json::{json, Value};

use super::calculator::round1;
use super::models::{Emissions, TransportMode, TripInput, ELECTRICITY_FACTOR};

/// Fields every reply must carry, in schema order.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "route_co2",
    "electric_co2",
    "total_co2",
    "distance_km",
    "summary",
    "advice",
];

/// Prompt and schema for a single provider call.
#[derive(Debug, Clone)]
pub struct AdvicePrompt {
    pub prompt: String,
    pub response_schema: Value,
}

impl AdvicePrompt {
    pub fn for_trip(trip: &TripInput, distance: Decimal, emissions: &Emissions) -> Self {
        Self {
            prompt: build_prompt(trip, distance, emissions),
            response_schema: response_schema(),
        }
    }
}

/// Structural description of `CalculationResult`.
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "route_co2": { "type": "number" },
            "electric_co2": { "type": "number" },
            "total_co2": { "type": "number" },
            "distance_km": { "type": "number" },
            "summary": { "type": "string" },
            "advice": {
                "type": "array",
                "items": { "type": "string" }
            }
        },
        "required": REQUIRED_FIELDS,
    })
}

/// Build the advice prompt for a trip with a validated distance.
///
/// The locally computed figures are embedded as reference values the model
/// must reproduce.
pub fn build_prompt(trip: &TripInput, distance: Decimal, emissions: &Emissions) -> String {
    // Shown with exactly one decimal, ties away from zero (12.25 -> 12.3).
    let mut shown_distance = round1(distance);
    shown_distance.rescale(1);

    let electricity = trip
        .electricity_kwh
        .map(|kwh| kwh.normalize().to_string())
        .unwrap_or_else(|| "0".to_string());

    let factors = TransportMode::ALL
        .iter()
        .map(|mode| format!("    - {}: {} kg CO₂ per km", mode, mode.emission_factor()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an expert in travel carbon footprints. Analyze the user's trip and energy data, calculate its CO₂ emissions, and give actionable advice for reducing its environmental impact.

Trip data:
- Start Location: {start}
- Destination: {destination}
- Route Distance: {shown_distance} km (measured by the routing service; do not estimate it)
- Transport Mode: {mode}
- Electricity Used (for EV charging, optional): {electricity} kWh

Instructions:
1. Use the route distance exactly as given.
2. Route CO₂: multiply the distance by the emission factor of the transport mode:
{factors}
3. Electric CO₂: if electricity usage is greater than 0, multiply it by {electricity_factor} kg CO₂ per kWh. Otherwise this value must be 0.
4. Total CO₂: add the route and electric CO₂.
5. Reference figures computed by the service, which your values must match: route_co2 = {route_co2}, electric_co2 = {electric_co2}, total_co2 = {total_co2}.
6. Summary: write one sentence summarizing the total emissions for the trip.
7. Advice: give 3-4 personalized, actionable and encouraging tips for reducing this trip's footprint, quantifying savings where possible. For a car, suggest public transport or carpooling. For an EV, commend it and suggest off-peak charging. For a plane, suggest ground transport for shorter distances or flying economy.
8. Output: return only a JSON object strictly matching the provided schema. distance_km must equal {distance_km}. Round all CO₂ values to one decimal place. Do not wrap the JSON in markdown code fences.
"#,
        start = trip.start_location,
        destination = trip.destination,
        shown_distance = shown_distance,
        mode = trip.transport_mode,
        electricity = electricity,
        factors = factors,
        electricity_factor = ELECTRICITY_FACTOR,
        route_co2 = emissions.route_co2,
        electric_co2 = emissions.electric_co2,
        total_co2 = emissions.total_co2,
        distance_km = distance.normalize(),
    )
}
