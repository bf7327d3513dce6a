//! Trip emissions calculation.
//!
//! All figures are rounded half away from zero to one decimal place, each
//! one independently. `total_co2` is the rounded sum of the already-rounded
//! parts, so it can differ from the unrounded exact total by up to 0.1 kg.
//! That difference is expected.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::models::{Emissions, TransportMode, ELECTRICITY_FACTOR};
use crate::error::{AdviceError, Result};

/// Round to one decimal place, half away from zero.
pub fn round1(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a map-supplied distance, rejecting missing or non-positive routes.
pub fn route_distance(distance_km: f64) -> Result<Decimal> {
    if !distance_km.is_finite() || distance_km <= 0.0 {
        return Err(AdviceError::InvalidRoute);
    }
    Decimal::from_f64(distance_km).ok_or(AdviceError::InvalidRoute)
}

/// Compute emissions for a trip.
pub fn compute(
    distance_km: Decimal,
    mode: TransportMode,
    electricity_kwh: Decimal,
) -> Result<Emissions> {
    if distance_km <= Decimal::ZERO {
        return Err(AdviceError::InvalidInput(
            "distance must be greater than zero".into(),
        ));
    }

    let route_co2 = round1(distance_km * mode.emission_factor());
    let electric_co2 = if electricity_kwh > Decimal::ZERO {
        round1(electricity_kwh * ELECTRICITY_FACTOR)
    } else {
        Decimal::ZERO
    };
    let total_co2 = round1(route_co2 + electric_co2);

    Ok(Emissions {
        route_co2,
        electric_co2,
        total_co2,
    })
}
