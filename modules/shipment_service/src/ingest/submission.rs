//! Typed views over raw survey payloads
//!
//! Payloads arrive as arbitrary key/value JSON. Everything the pipeline
//! needs is extracted here in one explicit parse step at the boundary; the
//! raw payload is retained alongside and never mutated.

use crate::contract::ShipmentStatus;
use crate::domain::GpsPoint;
use crate::ingest::api::SUBMISSION_TIME_FORMAT;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// A payload that could not be turned into a typed submission
#[derive(Debug, thiserror::Error)]
pub enum SubmissionParseError {
    #[error("submission payload is not a JSON object")]
    NotAnObject,
    #[error("submission payload is missing required field {0}")]
    MissingField(&'static str),
    #[error("submission timestamp {value:?} is not in YYYY-MM-DDTHH:MM:SS format")]
    Timestamp { value: String },
    #[error("submission id {value:?} is not a valid UUID")]
    Id { value: String },
}

fn field<'a>(payload: &'a Value, name: &'static str) -> Result<&'a str, SubmissionParseError> {
    payload
        .get(name)
        .and_then(Value::as_str)
        .ok_or(SubmissionParseError::MissingField(name))
}

fn parse_submission_time(value: &str) -> Result<DateTime<Utc>, SubmissionParseError> {
    NaiveDateTime::parse_from_str(value, SUBMISSION_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| SubmissionParseError::Timestamp {
            value: value.to_string(),
        })
}

fn parse_uuid(value: &str) -> Result<Uuid, SubmissionParseError> {
    Uuid::parse_str(value).map_err(|_| SubmissionParseError::Id {
        value: value.to_string(),
    })
}

/// Value of the first flat field whose key is `name` or ends in `/name`
/// (group prefixes vary between form versions).
fn flat_field<'a>(payload: &'a Value, name: &str) -> Option<&'a str> {
    let object = payload.as_object()?;
    let suffix = format!("/{name}");
    object
        .iter()
        .find(|(key, _)| key.as_str() == name || key.ends_with(&suffix))
        .and_then(|(_, value)| value.as_str())
}

/// One package-tracking scan submission.
#[derive(Debug, Clone)]
pub struct ScanSubmission {
    pub uuid: Uuid,
    pub form_id: i64,
    pub submission_time: DateTime<Utc>,
    gps: Option<String>,
    qr_codes: BTreeSet<String>,
    pub location_code: Option<String>,
    /// The payload exactly as received; kept for the FormSubmission record.
    pub payload: Value,
}

impl ScanSubmission {
    pub fn parse(form_id: i64, payload: Value) -> Result<Self, SubmissionParseError> {
        if !payload.is_object() {
            return Err(SubmissionParseError::NotAnObject);
        }
        let uuid = parse_uuid(field(&payload, "_uuid")?)?;
        let submission_time = parse_submission_time(field(&payload, "_submission_time")?)?;
        let gps = payload.get("gps").and_then(Value::as_str).map(str::to_string);
        let qr_codes = extract_qr_codes(&payload);
        let location_code = flat_field(&payload, "current_location").map(str::to_string);
        Ok(Self {
            uuid,
            form_id,
            submission_time,
            gps,
            qr_codes,
            location_code,
            payload,
        })
    }

    /// De-duplicated package QR codes referenced by this submission
    pub fn qr_codes(&self) -> &BTreeSet<String> {
        &self.qr_codes
    }

    /// GPS observation split out of the space-delimited
    /// "lat lng altitude accuracy" string; any missing or unparseable
    /// position becomes None.
    pub fn gps_point(&self) -> GpsPoint {
        let Some(gps) = self.gps.as_deref() else {
            return GpsPoint::default();
        };
        GpsPoint {
            latitude: gps_component(gps, 0),
            longitude: gps_component(gps, 1),
            altitude: gps_component(gps, 2),
            accuracy: gps_component(gps, 3),
        }
    }
}

fn gps_component(gps: &str, index: usize) -> Option<f64> {
    gps.split(' ').nth(index).and_then(|part| part.parse().ok())
}

/// Pull package QR codes out of either historical payload shape: newer forms
/// send a repeat group (a JSON list of sub-objects, sometimes JSON-encoded
/// as a string), older forms a single flat qr_code field.
fn extract_qr_codes(payload: &Value) -> BTreeSet<String> {
    let mut codes = BTreeSet::new();
    let Some(object) = payload.as_object() else {
        return codes;
    };

    for (key, value) in object {
        if !(key == "package" || key.ends_with("/package")) {
            continue;
        }
        // The repeat group may arrive as a real array or JSON-encoded text
        let parsed;
        let entries = match value {
            Value::Array(entries) => entries.as_slice(),
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Array(entries)) => {
                    parsed = entries;
                    parsed.as_slice()
                }
                _ => continue,
            },
            _ => continue,
        };
        for entry in entries {
            if let Some(fields) = entry.as_object() {
                for (field_key, field_value) in fields {
                    if field_key.ends_with("qr_code") {
                        if let Some(code) = field_value.as_str() {
                            codes.insert(code.to_string());
                        }
                    }
                }
            }
        }
    }

    if codes.is_empty() {
        if let Some(code) = flat_field(payload, "qr_code") {
            codes.insert(code.to_string());
        }
    }
    codes
}

/// One device-verification submission: a user QR code plus the device that
/// scanned it.
#[derive(Debug, Clone)]
pub struct DeviceSubmission {
    pub uuid: Uuid,
    pub form_id: i64,
    pub submission_time: DateTime<Utc>,
    pub qr_code: String,
    pub device_id: String,
    pub payload: Value,
}

impl DeviceSubmission {
    pub fn parse(form_id: i64, payload: Value) -> Result<Self, SubmissionParseError> {
        if !payload.is_object() {
            return Err(SubmissionParseError::NotAnObject);
        }
        let uuid = parse_uuid(field(&payload, "_uuid")?)?;
        let submission_time = parse_submission_time(field(&payload, "_submission_time")?)?;
        let qr_code = flat_field(&payload, "qr_code")
            .ok_or(SubmissionParseError::MissingField("qr_code"))?
            .to_string();
        let device_id = flat_field(&payload, "deviceid")
            .ok_or(SubmissionParseError::MissingField("deviceid"))?
            .to_string();
        Ok(Self {
            uuid,
            form_id,
            submission_time,
            qr_code,
            device_id,
            payload,
        })
    }
}

/// Status named by the prefix of a location code such as
/// "STATUS_IN_TRANSIT-Zero_Point". The part before the first hyphen must be
/// one of the known status constant names.
pub fn status_from_location_code(code: &str) -> Option<ShipmentStatus> {
    let prefix = code.split_once('-').map_or(code, |(prefix, _)| prefix);
    ShipmentStatus::from_constant_name(prefix)
}

/// The slice of a form definition the pipeline needs: named choice lists.
#[derive(Debug, Clone, Default)]
pub struct FormDefinition {
    choices: HashMap<String, Vec<Choice>>,
}

#[derive(Debug, Clone)]
struct Choice {
    name: String,
    labels: HashMap<String, String>,
}

impl FormDefinition {
    /// True when the server returned no usable definition (missing form)
    pub fn is_empty_definition(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Lenient parse: a definition without choice lists still works, labels
    /// just resolve to empty.
    pub fn parse(value: &Value) -> Self {
        let mut choices = HashMap::new();
        if let Some(lists) = value.get("choices").and_then(Value::as_object) {
            for (list_name, entries) in lists {
                let parsed: Vec<Choice> = entries
                    .as_array()
                    .map(|entries| {
                        entries
                            .iter()
                            .filter_map(|entry| {
                                let name = entry.get("name")?.as_str()?.to_string();
                                let labels = entry
                                    .get("label")
                                    .and_then(Value::as_object)
                                    .map(|labels| {
                                        labels
                                            .iter()
                                            .filter_map(|(lang, text)| {
                                                Some((lang.clone(), text.as_str()?.to_string()))
                                            })
                                            .collect()
                                    })
                                    .unwrap_or_default();
                                Some(Choice { name, labels })
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                choices.insert(list_name.clone(), parsed);
            }
        }
        Self { choices }
    }

    /// Human label for a location code, from the location_list choices.
    ///
    /// Tries the suffix after the first hyphen, falling back to the whole
    /// code, matching by substring against choice names. Returns "" when
    /// nothing matches.
    pub fn location_label(&self, location_code: &str) -> String {
        let key = location_code
            .split_once('-')
            .map_or(location_code, |(_, suffix)| suffix);
        self.choices
            .get("location_list")
            .and_then(|list| list.iter().find(|choice| choice.name.contains(key)))
            .and_then(|choice| choice.labels.get("English"))
            .cloned()
            .unwrap_or_default()
    }
}
