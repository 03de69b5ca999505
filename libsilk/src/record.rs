//! The canonical shape of a point of interest on the map
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, sqlite::SqliteRow};
use std::fmt::Display;

/// Record type assigned to every record that was imported from a CSV file
pub const TYPE_UPLOADED: &str = "uploaded";

/// Record type assigned to records entered by hand when no type was given
pub const TYPE_DEFAULT: &str = "location";

/// Identifier assigned to a record by the store when it is inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a user account in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fields of a [GeoRecord] that can be supplied by a user
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Field {
    Name,
    Latitude,
    Longitude,
    Description,
    #[serde(rename = "type")]
    #[strum(serialize = "type")]
    Kind,
}

/// A geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// A point of interest. Records built on the client are *candidates* and have
/// neither an `id` nor a `user_id` until the store accepts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,

    pub name: String,

    pub latitude: f64,

    pub longitude: f64,

    #[serde(default)]
    pub description: Option<String>,

    /// A free-form classification. Only used to choose the marker color.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

impl GeoRecord {
    /// Creates a new candidate record
    pub fn candidate(
        name: String,
        latitude: f64,
        longitude: f64,
        description: Option<String>,
        kind: Option<String>,
    ) -> Self {
        Self {
            id: None,
            name,
            latitude,
            longitude,
            description,
            kind,
            user_id: None,
        }
    }

    pub fn position(&self) -> LngLat {
        LngLat::new(self.longitude, self.latitude)
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_uploaded(&self) -> bool {
        self.kind.as_deref() == Some(TYPE_UPLOADED)
    }

    /// Attach the submitting user to this candidate. Any user id already
    /// present on the record is overwritten.
    pub fn submitted_by(mut self, user: UserId) -> Self {
        self.user_id = Some(user);
        self
    }
}

impl FromRow<'_, SqliteRow> for GeoRecord {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: Some(RecordId(row.try_get("locid")?)),
            name: row.try_get("locname")?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            description: row.try_get("locdesc")?,
            kind: row.try_get("loctype")?,
            user_id: Some(UserId(row.try_get("userid")?)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn field_names() {
        assert_eq!(Field::Kind.to_string(), "type");
        assert_eq!(Field::Latitude.to_string(), "latitude");
        assert_eq!(Field::from_str("type").unwrap(), Field::Kind);
    }

    #[test]
    fn record_serializes_type_field() {
        let rec = GeoRecord::candidate(
            "Istanbul".to_string(),
            41.0082,
            28.9784,
            None,
            Some(TYPE_UPLOADED.to_string()),
        );
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["type"], "uploaded");
        assert!(json.get("id").is_none());
        assert!(json.get("user_id").is_none());
        assert!(rec.is_uploaded());
        assert!(!rec.is_persisted());
    }

    #[test]
    fn submitted_by_overwrites_user() {
        let mut rec = GeoRecord::candidate("x".to_string(), 0.0, 0.0, None, None);
        rec.user_id = Some(UserId(99));
        let rec = rec.submitted_by(UserId(3));
        assert_eq!(rec.user_id, Some(UserId(3)));
    }
}
