//! Routing/geocoding boundary.
//!
//! The map provider runs in the browser; this service only consumes what it
//! reports: a resolved distance with canonical addresses, or a named failure.

use serde::{Deserialize, Serialize};

/// A route resolved by the map provider.
///
/// Every field may be absent; a missing distance is an invalid route, not a
/// malformed body.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ResolvedRoute {
    /// Route length in kilometers
    #[serde(default)]
    pub distance_km: Option<f64>,
    /// Canonical start address
    #[serde(default)]
    pub start_address: String,
    /// Canonical end address
    #[serde(default)]
    pub end_address: String,
}

/// What the caller reports about the route lookup.
///
/// `Failed` is tried first since a resolved route accepts any object.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RouteReport {
    Failed { status: String, address: String },
    Resolved(ResolvedRoute),
}

/// Geocoding failure reasons surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeocodeFailure {
    NoResults { address: String },
    QuotaExceeded,
    AccessDenied,
    MalformedRequest { address: String },
    Unknown { status: String, address: String },
}

impl GeocodeFailure {
    /// Map a provider status code. `OK` is not a failure.
    pub fn from_status(status: &str, address: &str) -> Option<Self> {
        let address = address.to_string();
        match status.trim() {
            "OK" => None,
            "ZERO_RESULTS" => Some(Self::NoResults { address }),
            "OVER_QUERY_LIMIT" => Some(Self::QuotaExceeded),
            "REQUEST_DENIED" => Some(Self::AccessDenied),
            "INVALID_REQUEST" => Some(Self::MalformedRequest { address }),
            other => Some(Self::Unknown {
                status: other.to_string(),
                address,
            }),
        }
    }
}

impl std::fmt::Display for GeocodeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoResults { address } => write!(
                f,
                "No results found for '{}'. Try a more specific address.",
                address
            ),
            Self::QuotaExceeded => write!(
                f,
                "Geocoding quota exceeded. Enable billing or reduce request frequency."
            ),
            Self::AccessDenied => write!(
                f,
                "Request denied by the geocoding service. Check the map API key and its restrictions."
            ),
            Self::MalformedRequest { address } => write!(
                f,
                "Invalid geocoding request for '{}'. The address may be malformed.",
                address
            ),
            Self::Unknown { status, address } => write!(
                f,
                "Geocode was not successful for '{}'. Reason: {}",
                address, status
            ),
        }
    }
}
