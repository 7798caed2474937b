use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("payload is not a JSON object")]
    NotAnObject,
}

/// Structured data extracted from one finished call.
///
/// Field order is the column order of the target sheet. Every field is
/// string-typed: absent or null values normalize to the empty string, and
/// scalar booleans/numbers coerce to their text form, so a partially filled
/// report is always representable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallReport {
    pub caller_first_name: String,
    pub caller_last_name: String,
    pub phone_number: String,
    pub zip_code: String,
    pub standing_or_leaking_water: String,
    pub affected_areas_scope: String,
    pub affected_rooms_count: String,
    pub leak_stopped: String,
    pub leak_timeline: String,
    pub has_insurance: String,
    pub call_summary: String,
}

impl CallReport {
    /// Extracts a report from an arbitrary JSON value.
    ///
    /// Missing fields are not an error: a payload carrying any subset of the
    /// fields validates, with the rest left empty. Unknown keys are ignored.
    /// Only a value that is not an object at all is rejected.
    pub fn from_value(value: &Value) -> Result<CallReport, SchemaError> {
        let map = value.as_object().ok_or(SchemaError::NotAnObject)?;
        let field = |name: &str| scalar_string(map.get(name));

        Ok(CallReport {
            caller_first_name: field("caller_first_name"),
            caller_last_name: field("caller_last_name"),
            phone_number: field("phone_number"),
            zip_code: field("zip_code"),
            standing_or_leaking_water: field("standing_or_leaking_water"),
            affected_areas_scope: field("affected_areas_scope"),
            affected_rooms_count: field("affected_rooms_count"),
            leak_stopped: field("leak_stopped"),
            leak_timeline: field("leak_timeline"),
            has_insurance: field("has_insurance"),
            call_summary: field("call_summary"),
        })
    }

    /// The report as an ordered spreadsheet row, one cell per field in
    /// declaration order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.caller_first_name.clone(),
            self.caller_last_name.clone(),
            self.phone_number.clone(),
            self.zip_code.clone(),
            self.standing_or_leaking_water.clone(),
            self.affected_areas_scope.clone(),
            self.affected_rooms_count.clone(),
            self.leak_stopped.clone(),
            self.leak_timeline.clone(),
            self.has_insurance.clone(),
            self.call_summary.clone(),
        ]
    }
}

fn scalar_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        // null and non-scalar shapes carry no cell value
        _ => String::new(),
    }
}
