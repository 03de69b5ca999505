use libsilk::{
    GeoRecord,
    ingest::SkippedRow,
    markers::{Marker, MarkerColor},
    user::User,
};
use serde::Serialize;
use tabled::Tabled;

#[derive(Tabled, Serialize)]
#[tabled(rename_all = "PascalCase")]
pub(crate) struct LocationRow {
    #[tabled(display("tabled::derive::display::option", ""))]
    id: Option<i64>,
    name: String,
    latitude: f64,
    longitude: f64,
    #[tabled(display("tabled::derive::display::option", ""))]
    #[serde(rename = "type")]
    #[tabled(rename = "Type")]
    kind: Option<String>,
    #[tabled(display("tabled::derive::display::option", ""))]
    description: Option<String>,
    #[tabled(display("tabled::derive::display::option", ""))]
    user: Option<i64>,
}

impl LocationRow {
    pub(crate) fn new(record: &GeoRecord) -> Self {
        Self {
            id: record.id.map(|id| id.0),
            name: record.name.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            kind: record.kind.clone(),
            description: record.description.clone(),
            user: record.user_id.map(|id| id.0),
        }
    }
}

#[derive(Tabled, Serialize)]
#[tabled(rename_all = "PascalCase")]
pub(crate) struct MarkerRow {
    id: i64,
    name: String,
    longitude: f64,
    latitude: f64,
    color: MarkerColor,
    /// The tile that contains the marker at the current zoom level
    tile: String,
}

impl MarkerRow {
    pub(crate) fn new(marker: &Marker, tile: (u32, u32)) -> Self {
        Self {
            id: marker.id.0,
            name: marker.name.clone(),
            longitude: marker.position.lng,
            latitude: marker.position.lat,
            color: marker.color,
            tile: format!("{}/{}", tile.0, tile.1),
        }
    }
}

#[derive(Tabled, Serialize)]
#[tabled(rename_all = "PascalCase")]
pub(crate) struct SkippedRowRow {
    row: usize,
    reason: String,
}

impl SkippedRowRow {
    pub(crate) fn new(skipped: &SkippedRow) -> Self {
        Self {
            row: skipped.row,
            reason: skipped.reason.to_string(),
        }
    }
}

#[derive(Tabled, Serialize)]
#[tabled(rename_all = "PascalCase")]
pub(crate) struct UserRow {
    id: i64,
    username: String,
}

impl UserRow {
    pub(crate) fn new(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}
