//! Data types for trip emissions and advice.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{AdviceError, Result};
use crate::routing::RouteReport;

/// kg CO2 emitted per kWh of electricity.
pub const ELECTRICITY_FACTOR: Decimal = dec!(0.45);

/// Supported transport modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Car,
    Bus,
    Bike,
    Plane,
}

impl TransportMode {
    pub const ALL: [TransportMode; 4] = [Self::Car, Self::Bus, Self::Bike, Self::Plane];

    /// kg CO2 per km.
    pub fn emission_factor(self) -> Decimal {
        match self {
            Self::Car => dec!(0.21),
            Self::Bus => dec!(0.06),
            Self::Bike => dec!(0.0),
            Self::Plane => dec!(0.25),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Car => "car",
            Self::Bus => "bus",
            Self::Bike => "bike",
            Self::Plane => "plane",
        }
    }
}

impl FromStr for TransportMode {
    type Err = AdviceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "car" => Ok(Self::Car),
            "bus" => Ok(Self::Bus),
            "bike" => Ok(Self::Bike),
            "plane" => Ok(Self::Plane),
            other => Err(AdviceError::InvalidInput(format!(
                "unknown transport mode '{}' (expected car, bus, bike or plane)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload for an advice request, as submitted by the form.
#[derive(Debug, Deserialize, Serialize)]
pub struct AdviceRequest {
    #[serde(default)]
    pub start_location: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub transport_mode: String,
    #[serde(default)]
    pub electricity_kwh: Option<String>,
    /// Route lookup outcome from the map provider
    #[serde(default)]
    pub route: Option<RouteReport>,
}

/// Request payload for the raw prompt proxy.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
    /// Output schema; the result schema is used when absent
    #[serde(default)]
    pub response_schema: Option<serde_json::Value>,
}

/// A validated trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TripInput {
    pub start_location: String,
    pub destination: String,
    pub transport_mode: TransportMode,
    /// kWh used for charging; `None` when not supplied
    pub electricity_kwh: Option<Decimal>,
}

impl TripInput {
    /// Validate raw form fields.
    pub fn parse(
        start_location: &str,
        destination: &str,
        transport_mode: &str,
        electricity_kwh: Option<&str>,
    ) -> Result<Self> {
        let start_location = start_location.trim();
        let destination = destination.trim();
        if start_location.is_empty() {
            return Err(AdviceError::InvalidInput("start location is required".into()));
        }
        if destination.is_empty() {
            return Err(AdviceError::InvalidInput("destination is required".into()));
        }

        let transport_mode = transport_mode.parse()?;

        let electricity_kwh = match electricity_kwh.map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(raw) => {
                let kwh = Decimal::from_str(raw).map_err(|_| {
                    AdviceError::InvalidInput(format!("electricity usage '{}' is not a number", raw))
                })?;
                if kwh.is_sign_negative() && !kwh.is_zero() {
                    return Err(AdviceError::InvalidInput(
                        "electricity usage cannot be negative".into(),
                    ));
                }
                Some(kwh)
            }
        };

        Ok(Self {
            start_location: start_location.to_string(),
            destination: destination.to_string(),
            transport_mode,
            electricity_kwh,
        })
    }

    /// Electricity usage, zero when absent.
    pub fn electricity_or_zero(&self) -> Decimal {
        self.electricity_kwh.unwrap_or(Decimal::ZERO)
    }
}

/// Locally computed emissions, each figure rounded to 1 decimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emissions {
    pub route_co2: Decimal,
    pub electric_co2: Decimal,
    pub total_co2: Decimal,
}

/// Response payload: emissions plus generated summary and tips.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CalculationResult {
    /// kg CO2 for the route
    pub route_co2: f64,
    /// kg CO2 for electricity use
    pub electric_co2: f64,
    /// kg CO2 in total
    pub total_co2: f64,
    /// Route distance in kilometers, as supplied
    pub distance_km: f64,
    /// One-sentence summary
    pub summary: String,
    /// 3-4 reduction tips
    pub advice: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("car".parse::<TransportMode>().unwrap(), TransportMode::Car);
        assert_eq!(" Plane ".parse::<TransportMode>().unwrap(), TransportMode::Plane);
        assert!(matches!(
            "train".parse::<TransportMode>(),
            Err(AdviceError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_generate_request_uses_camel_case() {
        let request: GenerateRequest =
            serde_json::from_str(r#"{"prompt": "p", "responseSchema": {"type": "object"}}"#).unwrap();
        assert_eq!(request.prompt, "p");
        assert!(request.response_schema.is_some());
    }

    #[test]
    fn test_mode_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&TransportMode::Bike).unwrap(), r#""bike""#);
    }

    #[test]
    fn test_parse_trip_defaults_blank_electricity() {
        let trip = TripInput::parse("Berlin", "Hamburg", "bus", Some("  ")).unwrap();
        assert_eq!(trip.electricity_kwh, None);
        assert_eq!(trip.electricity_or_zero(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_trip_reads_electricity() {
        let trip = TripInput::parse("A", "B", "car", Some("15.5")).unwrap();
        assert_eq!(trip.electricity_kwh, Some(dec!(15.5)));
    }

    #[test]
    fn test_parse_trip_rejects_bad_electricity() {
        assert!(matches!(
            TripInput::parse("A", "B", "car", Some("lots")),
            Err(AdviceError::InvalidInput(_))
        ));
        assert!(matches!(
            TripInput::parse("A", "B", "car", Some("-2")),
            Err(AdviceError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parse_trip_requires_locations() {
        assert!(matches!(
            TripInput::parse(" ", "B", "car", None),
            Err(AdviceError::InvalidInput(_))
        ));
        assert!(matches!(
            TripInput::parse("A", "", "car", None),
            Err(AdviceError::InvalidInput(_))
        ));
    }
}
