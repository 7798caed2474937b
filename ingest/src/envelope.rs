//! Readers for the webhook envelope wrapping a call report.
//!
//! The voice platform posts an envelope of the form
//! `{"message": {"type": ..., "analysis": ..., "call": ..., "customer": ...}}`
//! and has moved the structured call data around between versions; these
//! helpers probe every location we have seen in the wild.

use serde_json::Value;

pub const END_OF_CALL_REPORT: &str = "end-of-call-report";

/// True if the body is an envelope rather than a bare report object.
pub fn is_envelope(body: &Value) -> bool {
    body.get("message").is_some()
}

/// Type of the webhook message, if the body is an envelope.
pub fn message_type(body: &Value) -> Option<&str> {
    body.get("message")?.get("type")?.as_str()
}

/// Finds the structured call data inside an end-of-call envelope.
///
/// Locations are probed in order: the legacy `analysis.structuredData`, the
/// same field nested under `call.analysis`, then the first entry of the
/// newer `analysis.structuredOutputs` map (whose `result` holds the data).
pub fn structured_data(body: &Value) -> Option<&Value> {
    let message = body.get("message")?;
    let analysis = non_empty_object(message.get("analysis"))
        .or_else(|| message.get("call").and_then(|call| call.get("analysis")))?;

    if let Some(data) = non_empty_object(analysis.get("structuredData")) {
        return Some(data);
    }

    let outputs = analysis.get("structuredOutputs")?.as_object()?;
    outputs.values().next()?.get("result")
}

/// True caller ID recorded by telephony, for when the extracted phone number
/// is unusable.
pub fn customer_number(body: &Value) -> Option<&str> {
    let message = body.get("message")?;
    message
        .get("call")
        .and_then(|call| call.get("customer"))
        .or_else(|| message.get("customer"))
        .and_then(|customer| customer.get("number"))
        .and_then(Value::as_str)
}

/// A phone value the analysis step could not really extract: empty,
/// self-referential, or too short to be a dialable number.
pub fn needs_phone_backfill(phone: &str) -> bool {
    let lower = phone.to_lowercase();
    phone.is_empty() || lower.contains("unknown") || lower.contains("caller") || phone.len() < 7
}

fn non_empty_object(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| v.as_object().is_some_and(|map| !map.is_empty()))
}
