//! Field-level validation of candidate records.
//!
//! Validation is a pure function of its input. Both contribution paths use the
//! same rules: the single-entry form reports errors per field, while CSV
//! ingestion turns a failed record into a skipped row.
use crate::record::{Field, GeoRecord, LngLat};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display};

pub const NAME_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;
pub const TYPE_MAX_CHARS: usize = 50;

/// A mapping from a field to the message of the first rule that it violated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    /// Record a violation for `field`. Only the first violation of each field
    /// is kept.
    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    /// The message for the first failing field, in the order the fields are
    /// checked
    pub fn first_message(&self) -> Option<&str> {
        self.0.values().next().map(String::as_str)
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts = self
            .iter()
            .map(|(field, msg)| format!("{field}: {msg}"))
            .collect::<Vec<_>>();
        write!(f, "{}", parts.join("; "))
    }
}

/// The raw text of the single-entry form, exactly as the user typed it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl RecordForm {
    /// A blank form with the coordinates already filled in, e.g. from a click
    /// on the map
    pub fn at(position: LngLat) -> Self {
        Self {
            latitude: position.lat.to_string(),
            longitude: position.lng.to_string(),
            ..Default::default()
        }
    }
}

fn optional_text(
    value: Option<&str>,
    max: usize,
    field: Field,
    message: &str,
    errors: &mut FieldErrors,
) -> Option<String> {
    let value = value.map(str::trim).filter(|s| !s.is_empty())?;
    if value.chars().count() > max {
        errors.add(field, message);
    }
    Some(value.to_string())
}

fn check_coordinate(value: f64, limit: f64, field: Field, label: &str, errors: &mut FieldErrors) {
    if !value.is_finite() {
        errors.add(field, format!("{label} must be a number"));
    } else if !(-limit..=limit).contains(&value) {
        errors.add(field, format!("{label} must be between -{limit} and {limit}"));
    }
}

fn check_record(record: &GeoRecord, errors: &mut FieldErrors) -> GeoRecord {
    let name = record.name.trim();
    if name.is_empty() {
        errors.add(Field::Name, "Project name is required");
    } else if name.chars().count() > NAME_MAX_CHARS {
        errors.add(Field::Name, "Name must be less than 200 characters");
    }
    check_coordinate(record.latitude, 90.0, Field::Latitude, "Latitude", errors);
    check_coordinate(record.longitude, 180.0, Field::Longitude, "Longitude", errors);
    let description = optional_text(
        record.description.as_deref(),
        DESCRIPTION_MAX_CHARS,
        Field::Description,
        "Description must be less than 1000 characters",
        errors,
    );
    let kind = optional_text(
        record.kind.as_deref(),
        TYPE_MAX_CHARS,
        Field::Kind,
        "Type must be less than 50 characters",
        errors,
    );

    GeoRecord {
        id: record.id,
        name: name.to_string(),
        latitude: record.latitude,
        longitude: record.longitude,
        description,
        kind,
        user_id: record.user_id,
    }
}

/// Validate a candidate record, returning a normalized copy (text fields
/// trimmed, empty optional fields removed) if every rule passes.
pub fn validate_record(record: &GeoRecord) -> Result<GeoRecord, FieldErrors> {
    let mut errors = FieldErrors::default();
    let checked = check_record(record, &mut errors);
    match errors.is_empty() {
        true => Ok(checked),
        false => Err(errors),
    }
}

fn parse_coordinate(text: &str, field: Field, label: &str, errors: &mut FieldErrors) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        errors.add(field, format!("{label} is required"));
        return f64::NAN;
    }
    match text.parse::<f64>() {
        Ok(v) => v,
        Err(_) => {
            errors.add(field, format!("{label} must be a number"));
            f64::NAN
        }
    }
}

/// Validate the raw contents of the single-entry form
pub fn validate_form(form: &RecordForm) -> Result<GeoRecord, FieldErrors> {
    let mut errors = FieldErrors::default();
    let latitude = parse_coordinate(&form.latitude, Field::Latitude, "Latitude", &mut errors);
    let longitude = parse_coordinate(&form.longitude, Field::Longitude, "Longitude", &mut errors);
    let candidate = GeoRecord::candidate(
        form.name.clone(),
        latitude,
        longitude,
        Some(form.description.clone()),
        Some(form.kind.clone()),
    );
    let checked = check_record(&candidate, &mut errors);
    match errors.is_empty() {
        true => Ok(checked),
        false => Err(errors),
    }
}
