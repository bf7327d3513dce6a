//! Validation of untrusted provider replies.

use serde_json::{Map, Value};

use super::models::CalculationResult;
use crate::error::{AdviceError, Result};

/// Reasons a reply does not match the result schema.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("reply is not a JSON object")]
    NotAnObject,
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("field '{0}' must be a number")]
    NotANumber(&'static str),
    #[error("field '{0}' must be a string")]
    NotAString(&'static str),
    #[error("field 'advice' must be a list of strings")]
    NotAStringList,
    #[error("field 'advice' must not be empty")]
    EmptyAdvice,
}

impl From<ValidationError> for AdviceError {
    fn from(e: ValidationError) -> Self {
        AdviceError::MalformedResponse(e.to_string())
    }
}

/// Strip a markdown code fence some models wrap JSON in despite being told
/// not to.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest),
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse raw provider text into JSON after fence normalisation.
pub fn parse_json(raw: &str) -> Result<Value> {
    let text = strip_code_fence(raw);
    if text.is_empty() {
        return Err(AdviceError::EmptyResponse);
    }
    serde_json::from_str(text)
        .map_err(|e| AdviceError::MalformedResponse(format!("invalid JSON: {}", e)))
}

/// Parse and validate raw provider text.
pub fn parse_reply(raw: &str) -> Result<CalculationResult> {
    let value = parse_json(raw)?;
    Ok(validate(&value)?)
}

/// Validate a candidate reply. Missing fields are rejected, never defaulted.
pub fn validate(candidate: &Value) -> Result<CalculationResult, ValidationError> {
    let obj = candidate.as_object().ok_or(ValidationError::NotAnObject)?;

    let summary = match field(obj, "summary")? {
        Value::String(s) => s.clone(),
        _ => return Err(ValidationError::NotAString("summary")),
    };

    let advice = match field(obj, "advice")? {
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or(ValidationError::NotAStringList)?,
        _ => return Err(ValidationError::NotAStringList),
    };
    if advice.is_empty() {
        return Err(ValidationError::EmptyAdvice);
    }

    Ok(CalculationResult {
        route_co2: number(obj, "route_co2")?,
        electric_co2: number(obj, "electric_co2")?,
        total_co2: number(obj, "total_co2")?,
        distance_km: number(obj, "distance_km")?,
        summary,
        advice,
    })
}

fn field<'a>(
    obj: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a Value, ValidationError> {
    obj.get(name).ok_or(ValidationError::MissingField(name))
}

fn number(obj: &Map<String, Value>, name: &'static str) -> Result<f64, ValidationError> {
    field(obj, name)?
        .as_f64()
        .ok_or(ValidationError::NotANumber(name))
}
