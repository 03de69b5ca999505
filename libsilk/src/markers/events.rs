//! Translating pointer interaction on the map into location events
use crate::{
    record::{LngLat, RecordId},
    validate::RecordForm,
};
use serde::Serialize;

/// A raw click as reported by the map surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapClick {
    /// A click on the map where there is no marker
    Surface(LngLat),
    /// A click on the marker for the given record
    Marker(RecordId),
}

/// A click translated into the vocabulary of the rest of the system
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LocationEvent {
    /// A position with no record behind it, e.g. a place to add a new one
    Provisional { position: LngLat },
    /// An existing record
    Existing {
        id: RecordId,
        name: String,
        position: LngLat,
    },
}

impl LocationEvent {
    /// The identifier of the record that was clicked, if there was one
    pub fn id(&self) -> Option<RecordId> {
        match self {
            LocationEvent::Provisional { .. } => None,
            LocationEvent::Existing { id, .. } => Some(*id),
        }
    }

    pub fn position(&self) -> LngLat {
        match self {
            LocationEvent::Provisional { position } | LocationEvent::Existing { position, .. } => {
                *position
            }
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            LocationEvent::Provisional { .. } => None,
            LocationEvent::Existing { name, .. } => Some(name),
        }
    }

    /// An entry form pre-filled with the clicked position. Only provisional
    /// events can seed a new record.
    pub fn to_form(&self) -> Option<RecordForm> {
        match self {
            LocationEvent::Provisional { position } => Some(RecordForm::at(*position)),
            LocationEvent::Existing { .. } => None,
        }
    }
}
