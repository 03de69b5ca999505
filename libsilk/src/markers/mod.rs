//! Keeping the markers on a map in line with the records in the store.
//!
//! A [MarkerSync] owns the marker set of one map view. Every refresh fetches
//! the complete record set and replaces all markers; markers are never patched
//! one at a time. Each fetch is numbered, and a result that arrives after a
//! newer fetch was started is thrown away, so a slow response can never
//! overwrite a fresher one.
use crate::{
    error::Result,
    record::{GeoRecord, LngLat, RecordId},
    session::{SessionEvent, SessionEvents},
    store::RecordStore,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

pub mod events;
pub mod tiles;

pub use events::{LocationEvent, MapClick};
pub use tiles::{MapView, TileConfig, TileProvider};

/// The two marker colors. Records imported from CSV files are shown
/// differently from everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MarkerColor {
    Uploaded,
    Native,
}

impl MarkerColor {
    pub fn for_record(record: &GeoRecord) -> Self {
        match record.is_uploaded() {
            true => MarkerColor::Uploaded,
            false => MarkerColor::Native,
        }
    }

    pub fn css(&self) -> &'static str {
        match self {
            MarkerColor::Uploaded => "hsl(28, 80%, 52%)",
            MarkerColor::Native => "hsl(147, 47%, 25%)",
        }
    }
}

/// A pin on the map, derived from exactly one persisted record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: RecordId,
    pub name: String,
    pub position: LngLat,
    pub description: Option<String>,
    pub color: MarkerColor,
}

impl Marker {
    /// Build the marker for a persisted record. Records without an id have
    /// not been persisted and get no marker.
    pub fn from_record(record: &GeoRecord) -> Option<Self> {
        Some(Self {
            id: record.id?,
            name: record.name.clone(),
            position: record.position(),
            description: record.description.clone(),
            color: MarkerColor::for_record(record),
        })
    }
}

/// The state of a map view's marker set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncState {
    /// Nothing has been fetched yet
    Uninitialized,
    /// A fetch is in flight
    Loading,
    /// The markers reflect a completed fetch. `stale` is set when the latest
    /// fetch failed and the markers are left over from an earlier one.
    Ready { stale: bool },
}

/// Identifies one fetch issued by a [MarkerSync]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

pub struct MarkerSync {
    store: Arc<dyn RecordStore>,
    tiles: Box<dyn TileProvider>,
    view: MapView,
    state: SyncState,
    markers: Vec<Marker>,
    issued: u64,
    last_error: Option<String>,
}

impl MarkerSync {
    pub fn new(store: Arc<dyn RecordStore>, tiles: Box<dyn TileProvider>) -> Self {
        Self {
            store,
            tiles,
            view: MapView::default(),
            state: SyncState::Uninitialized,
            markers: Vec::new(),
            issued: 0,
            last_error: None,
        }
    }

    pub fn with_view(mut self, view: MapView) -> Self {
        self.view = view;
        self
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn tiles(&self) -> &dyn TileProvider {
        self.tiles.as_ref()
    }

    pub fn view(&self) -> MapView {
        self.view
    }

    /// The message of the most recent failed fetch, cleared by the next
    /// successful one
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Load the initial marker set
    pub async fn mount(&mut self) -> &[Marker] {
        trace!(provider = self.tiles.name(), "mounting map view");
        self.refresh().await;
        &self.markers
    }

    /// Fetch the complete record set and replace all markers
    pub async fn refresh(&mut self) -> SyncState {
        let ticket = self.begin_refresh();
        let result = self.store.fetch_all().await;
        self.complete_refresh(ticket, result);
        self.state
    }

    /// Wait for the signed-in user to change and reload the markers when it
    /// does. Returns `None` once the session is gone.
    pub async fn follow_session(&mut self, events: &mut SessionEvents) -> Option<SyncState> {
        let SessionEvent::Changed(user) = events.next().await?;
        debug!(user = ?user.map(|u| u.username), "session changed, refreshing markers");
        Some(self.refresh().await)
    }

    /// Start a fetch. The returned ticket must be handed back with the fetch
    /// result to [MarkerSync::complete_refresh].
    pub fn begin_refresh(&mut self) -> FetchTicket {
        self.issued += 1;
        self.state = SyncState::Loading;
        debug!(seq = self.issued, "refreshing markers");
        FetchTicket(self.issued)
    }

    /// Apply the result of the fetch identified by `ticket`. Returns `false`
    /// without touching anything if a newer fetch has been started since.
    pub fn complete_refresh(&mut self, ticket: FetchTicket, result: Result<Vec<GeoRecord>>) -> bool {
        if ticket.0 != self.issued {
            debug!(
                seq = ticket.0,
                latest = self.issued,
                "discarding result of superseded fetch"
            );
            return false;
        }

        match result {
            Ok(records) => {
                self.markers = records
                    .iter()
                    .filter_map(|r| {
                        let marker = Marker::from_record(r);
                        if marker.is_none() {
                            warn!(name = %r.name, "fetched record has no id, not shown");
                        }
                        marker
                    })
                    .collect();
                self.last_error = None;
                self.state = SyncState::Ready { stale: false };
                debug!(count = self.markers.len(), "markers replaced");
            }
            Err(e) => {
                error!("Failed to fetch locations: {e}");
                self.last_error = Some(e.to_string());
                self.state = SyncState::Ready { stale: true };
            }
        }
        true
    }

    /// Translate a click on the map. A click on a marker that is no longer in
    /// the marker set yields nothing.
    pub fn click(&self, click: MapClick) -> Option<LocationEvent> {
        match click {
            MapClick::Surface(position) => Some(LocationEvent::Provisional { position }),
            MapClick::Marker(id) => self.marker(id).map(|m| LocationEvent::Existing {
                id: m.id,
                name: m.name.clone(),
                position: m.position,
            }),
        }
    }

    pub fn marker(&self, id: RecordId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        contribute::{contribute_csv, contribute_form},
        record::{TYPE_UPLOADED, UserId},
        session::{Session, UserIdentity},
        store::MemoryStore,
        validate::RecordForm,
    };
    use test_log::test;

    fn record(name: &str, lat: f64, lng: f64, kind: Option<&str>) -> GeoRecord {
        GeoRecord::candidate(
            name.to_string(),
            lat,
            lng,
            None,
            kind.map(str::to_string),
        )
        .submitted_by(UserId(1))
    }

    fn silk_road() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_records(vec![
            record("Istanbul", 41.0082, 28.9784, Some(TYPE_UPLOADED)),
            record("Tehran", 35.6892, 51.3890, Some("school")),
            record("Samarkand", 39.6270, 66.9597, None),
        ]))
    }

    fn sync(store: Arc<MemoryStore>) -> MarkerSync {
        MarkerSync::new(store, TileConfig::default().build().unwrap())
    }

    #[test(tokio::test)]
    async fn mount_loads_markers() {
        let store = silk_road();
        let mut map = sync(store.clone());
        assert_eq!(map.state(), SyncState::Uninitialized);
        assert!(map.markers().is_empty());

        let markers = map.mount().await;
        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0].name, "Istanbul");
        assert_eq!(markers[0].position, LngLat::new(28.9784, 41.0082));
        assert_eq!(markers[0].color, MarkerColor::Uploaded);
        assert_eq!(markers[1].color, MarkerColor::Native);
        assert_eq!(markers[2].color, MarkerColor::Native);
        assert_eq!(map.state(), SyncState::Ready { stale: false });
        assert_eq!(store.fetch_count(), 1);
        assert_eq!(map.view(), MapView::default());
    }

    #[test(tokio::test)]
    async fn refresh_is_idempotent() {
        let store = silk_road();
        let mut map = sync(store.clone());
        map.refresh().await;
        let first = map.markers().to_vec();
        map.refresh().await;
        assert_eq!(map.markers(), first.as_slice());
        assert_eq!(store.fetch_count(), 2);
    }

    #[test(tokio::test)]
    async fn refresh_replaces_everything() {
        let store = silk_road();
        let mut map = sync(store.clone());
        map.mount().await;

        store.remove(RecordId(1)).unwrap();
        store
            .insert(vec![record("Kashgar", 39.4704, 75.9877, None)])
            .await
            .unwrap();
        map.refresh().await;
        let names = map
            .markers()
            .iter()
            .map(|m| m.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Tehran", "Samarkand", "Kashgar"]);
        assert!(map.marker(RecordId(1)).is_none());
    }

    #[test(tokio::test)]
    async fn failed_fetch_keeps_last_good_markers() {
        let store = silk_road();
        let mut map = sync(store.clone());

        store.set_fail_fetch(true);
        assert_eq!(map.refresh().await, SyncState::Ready { stale: true });
        assert!(map.markers().is_empty());
        assert_eq!(map.last_error(), Some("Store error: fetch failed"));

        store.set_fail_fetch(false);
        map.refresh().await;
        assert_eq!(map.markers().len(), 3);
        assert_eq!(map.last_error(), None);

        store.set_fail_fetch(true);
        assert_eq!(map.refresh().await, SyncState::Ready { stale: true });
        assert_eq!(map.markers().len(), 3);
    }

    #[test(tokio::test)]
    async fn late_results_are_discarded() {
        let store = silk_road();
        let mut map = sync(store.clone());

        let older = map.begin_refresh();
        let old_result = store.fetch_all().await;
        store.remove(RecordId(2)).unwrap();
        let newer = map.begin_refresh();
        assert_eq!(map.state(), SyncState::Loading);
        let new_result = store.fetch_all().await;

        assert!(map.complete_refresh(newer, new_result));
        assert_eq!(map.markers().len(), 2);
        // the older fetch finishes last and must not win
        assert!(!map.complete_refresh(older, old_result));
        assert_eq!(map.markers().len(), 2);
        assert!(map.marker(RecordId(2)).is_none());
        assert_eq!(map.state(), SyncState::Ready { stale: false });
    }

    #[test(tokio::test)]
    async fn superseded_result_leaves_loading_state() {
        let store = silk_road();
        let mut map = sync(store.clone());
        let older = map.begin_refresh();
        let newer = map.begin_refresh();
        let (first, second) = futures::join!(store.fetch_all(), store.fetch_all());
        assert!(!map.complete_refresh(older, first));
        assert_eq!(map.state(), SyncState::Loading);
        assert!(map.markers().is_empty());
        assert!(map.complete_refresh(newer, second));
        assert_eq!(map.markers().len(), 3);
        assert_eq!(store.fetch_count(), 2);
    }

    #[test(tokio::test)]
    async fn clicks_are_translated() {
        let store = silk_road();
        let mut map = sync(store);
        map.mount().await;

        let surface = map
            .click(MapClick::Surface(LngLat::new(69.2401, 41.2995)))
            .unwrap();
        assert_eq!(surface.id(), None);
        assert_eq!(surface.name(), None);
        assert_eq!(surface.position(), LngLat::new(69.2401, 41.2995));
        let form = surface.to_form().unwrap();
        assert_eq!(form.latitude, "41.2995");
        assert_eq!(form.longitude, "69.2401");

        let existing = map.click(MapClick::Marker(RecordId(2))).unwrap();
        assert_eq!(existing.id(), Some(RecordId(2)));
        assert_eq!(existing.name(), Some("Tehran"));
        assert_eq!(existing.position(), LngLat::new(51.3890, 35.6892));
        assert!(existing.to_form().is_none());

        assert!(map.click(MapClick::Marker(RecordId(42))).is_none());
    }

    #[test(tokio::test)]
    async fn contributions_show_up_after_refresh() {
        let store = silk_road();
        let mut map = sync(store.clone());
        map.mount().await;
        let session = Session::signed_in(UserIdentity {
            id: UserId(4),
            username: "weaver".to_string(),
        });

        let uploaded = contribute_csv(
            "name,latitude,longitude\nBukhara,39.7747,64.4286\n",
            &session,
            &*store,
        )
        .await
        .unwrap();
        let form = RecordForm {
            name: "Merv".to_string(),
            latitude: "37.6628".to_string(),
            longitude: "62.1926".to_string(),
            ..Default::default()
        };
        let added = contribute_form(&form, &session, &*store)
            .await
            .unwrap();
        // nothing changes until the map is refreshed
        assert_eq!(map.markers().len(), 3);

        map.refresh().await;
        assert_eq!(map.markers().len(), 5);
        let bukhara = uploaded.inserted[0].id.unwrap();
        let merv = added.inserted[0].id.unwrap();
        assert_eq!(bukhara, RecordId(4));
        assert_eq!(merv, RecordId(5));
        let marker = map.marker(bukhara).unwrap();
        assert_eq!(marker.name, "Bukhara");
        assert_eq!(marker.color, MarkerColor::Uploaded);
        let marker = map.marker(merv).unwrap();
        assert_eq!(marker.name, "Merv");
        assert_eq!(marker.position, LngLat::new(62.1926, 37.6628));
        assert_eq!(marker.color, MarkerColor::Native);
    }

    #[test(tokio::test)]
    async fn session_changes_refresh_markers() {
        let store = silk_road();
        let mut map = sync(store.clone());
        let session = Session::anonymous();
        let mut events = session.subscribe();

        session.sign_in(UserIdentity {
            id: UserId(1),
            username: "caravan".to_string(),
        });
        assert_eq!(
            map.follow_session(&mut events).await,
            Some(SyncState::Ready { stale: false })
        );
        assert_eq!(map.markers().len(), 3);
        assert_eq!(store.fetch_count(), 1);

        session.sign_out();
        store.remove(RecordId(3)).unwrap();
        map.follow_session(&mut events).await;
        assert_eq!(map.markers().len(), 2);
        assert_eq!(store.fetch_count(), 2);

        drop(session);
        assert_eq!(map.follow_session(&mut events).await, None);
        assert_eq!(store.fetch_count(), 2);
    }

    #[test]
    fn candidates_get_no_marker() {
        let rec = GeoRecord::candidate("x".to_string(), 1.0, 1.0, None, None);
        assert!(Marker::from_record(&rec).is_none());
    }

    #[test]
    fn marker_colors() {
        assert_eq!(MarkerColor::Uploaded.to_string(), "uploaded");
        assert_eq!(MarkerColor::Native.css(), "hsl(147, 47%, 25%)");
        let mut rec = record("x", 0.0, 0.0, Some("Uploaded"));
        // only the exact type value counts as uploaded
        assert_eq!(MarkerColor::for_record(&rec), MarkerColor::Native);
        rec.kind = Some(TYPE_UPLOADED.to_string());
        assert_eq!(MarkerColor::for_record(&rec), MarkerColor::Uploaded);
    }
}
