//! Contributing new locations, either in bulk from a CSV file or one at a
//! time from the entry form.
//!
//! Both paths follow the same order: check the input, make sure somebody is
//! signed in, attach their id to every record and hand the batch to the
//! store. Nothing reaches the store unless every earlier step succeeded.
use crate::{
    error::{Error, Result},
    ingest::{Ingested, SkippedRow, ingest_file, parse_csv},
    record::{GeoRecord, TYPE_DEFAULT},
    session::Session,
    store::RecordStore,
    validate::{RecordForm, validate_form},
};
use serde::Serialize;
use std::path::Path;
use tracing::{error, info, warn};

/// The records that were accepted by the store, along with any CSV rows that
/// were left out
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Contribution {
    pub inserted: Vec<GeoRecord>,
    pub skipped: Vec<SkippedRow>,
}

impl Contribution {
    pub fn accepted(&self) -> usize {
        self.inserted.len()
    }
}

/// What the presentation layer is told about a contribution attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub success: bool,
    pub accepted: usize,
    pub reason: Option<String>,
}

impl From<&Result<Contribution>> for Outcome {
    fn from(value: &Result<Contribution>) -> Self {
        match value {
            Ok(c) => Self {
                success: true,
                accepted: c.accepted(),
                reason: None,
            },
            Err(e) => Self {
                success: false,
                accepted: 0,
                reason: Some(e.to_string()),
            },
        }
    }
}

impl Outcome {
    /// Whether the caller should send the user to sign in
    pub fn needs_sign_in(result: &Result<Contribution>) -> bool {
        matches!(result, Err(Error::Unauthorized(_)))
    }
}

async fn submit(
    records: Vec<GeoRecord>,
    action: &str,
    session: &Session,
    store: &dyn RecordStore,
) -> Result<Vec<GeoRecord>> {
    let user = session.require_user(action).inspect_err(|e| warn!("{e}"))?;
    let records = records
        .into_iter()
        .map(|r| r.submitted_by(user.id))
        .collect::<Vec<_>>();
    store
        .insert(records)
        .await
        .inspect(|inserted| info!(count = inserted.len(), user = %user.username, "added locations"))
        .inspect_err(|e| error!("Failed to insert locations: {e}"))
}

async fn submit_ingested(
    ingested: Result<Ingested>,
    session: &Session,
    store: &dyn RecordStore,
) -> Result<Contribution> {
    let ingested = ingested.inspect_err(|e| warn!("Rejected CSV upload: {e}"))?;
    let inserted = submit(ingested.records, "upload locations", session, store).await?;
    Ok(Contribution {
        inserted,
        skipped: ingested.skipped,
    })
}

/// Import every valid row of `text` for the signed-in user
pub async fn contribute_csv(
    text: &str,
    session: &Session,
    store: &dyn RecordStore,
) -> Result<Contribution> {
    submit_ingested(parse_csv(text), session, store).await
}

/// Import every valid row of the CSV file at `path` for the signed-in user
pub async fn contribute_file<P: AsRef<Path>>(
    path: P,
    session: &Session,
    store: &dyn RecordStore,
) -> Result<Contribution> {
    submit_ingested(ingest_file(path).await, session, store).await
}

/// Add the location described by the entry form for the signed-in user. If
/// the form is invalid, the error is [Error::Validation] with a message for
/// each offending field.
pub async fn contribute_form(
    form: &RecordForm,
    session: &Session,
    store: &dyn RecordStore,
) -> Result<Contribution> {
    let mut record = validate_form(form).map_err(Error::Validation)?;
    record.kind.get_or_insert_with(|| TYPE_DEFAULT.to_string());
    let inserted = submit(vec![record], "add a project", session, store).await?;
    Ok(Contribution {
        inserted,
        skipped: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        record::{Field, UserId},
        session::UserIdentity,
        store::MemoryStore,
    };
    use test_log::test;

    fn signed_in() -> Session {
        Session::signed_in(UserIdentity {
            id: UserId(7),
            username: "weaver".to_string(),
        })
    }

    #[test(tokio::test)]
    async fn csv_contribution() {
        let store = MemoryStore::new();
        let result = contribute_csv(
            "name,lat,lng\nBad,notanumber,28\nGood,41.0,29.0\n",
            &signed_in(),
            &store,
        )
        .await;
        let outcome = Outcome::from(&result);
        assert_eq!(
            outcome,
            Outcome {
                success: true,
                accepted: 1,
                reason: None
            }
        );
        let contribution = result.unwrap();
        assert_eq!(contribution.skipped.len(), 1);
        let stored = store.fetch_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].user_id, Some(UserId(7)));
        assert_eq!(stored[0].kind.as_deref(), Some("uploaded"));
    }

    #[test(tokio::test)]
    async fn no_user_means_no_insert() {
        let store = MemoryStore::new();
        let session = Session::anonymous();
        let result = contribute_csv(
            "name,latitude,longitude\nIstanbul,41.0082,28.9784\n",
            &session,
            &store,
        )
        .await;
        assert!(Outcome::needs_sign_in(&result));
        let outcome = Outcome::from(&result);
        assert!(!outcome.success);
        assert_eq!(
            outcome.reason.as_deref(),
            Some("You must be logged in to upload locations")
        );
        assert_eq!(store.insert_count(), 0);
        assert!(store.fetch_all().await.unwrap().is_empty());

        let form = RecordForm {
            name: "Istanbul".to_string(),
            latitude: "41.0082".to_string(),
            longitude: "28.9784".to_string(),
            ..Default::default()
        };
        let result = contribute_form(&form, &session, &store).await;
        assert!(matches!(result, Err(Error::Unauthorized(_))));
        assert_eq!(store.insert_count(), 0);
    }

    #[test(tokio::test)]
    async fn user_id_is_never_taken_from_input() {
        let store = MemoryStore::new();
        // a user_id column in the file is just ignored
        contribute_csv("name,lat,lng,user_id\nA,1,1,999\n", &signed_in(), &store)
            .await
            .unwrap();
        assert_eq!(store.fetch_all().await.unwrap()[0].user_id, Some(UserId(7)));
    }

    #[test(tokio::test)]
    async fn invalid_csv_is_reported() {
        let store = MemoryStore::new();
        let result = contribute_csv("name,lat,lng\n", &signed_in(), &store).await;
        let outcome = Outcome::from(&result);
        assert!(!outcome.success);
        assert_eq!(
            outcome.reason.as_deref(),
            Some("CSV must contain a header and at least one data row")
        );
        assert_eq!(store.insert_count(), 0);
    }

    #[test(tokio::test)]
    async fn invalid_form_is_not_inserted() {
        let store = MemoryStore::new();
        let form = RecordForm {
            name: "Somewhere".to_string(),
            latitude: "95".to_string(),
            longitude: "10".to_string(),
            ..Default::default()
        };
        match contribute_form(&form, &signed_in(), &store).await {
            Err(Error::Validation(errors)) => {
                assert_eq!(
                    errors.get(Field::Latitude),
                    Some("Latitude must be between -90 and 90")
                );
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(store.insert_count(), 0);
    }

    #[test(tokio::test)]
    async fn form_contribution_defaults_type() {
        let store = MemoryStore::new();
        let form = RecordForm {
            name: "Puvidham".to_string(),
            latitude: "12.0887125".to_string(),
            longitude: "78.046902".to_string(),
            description: "School that champions localisation".to_string(),
            ..Default::default()
        };
        let contribution = contribute_form(&form, &signed_in(), &store).await.unwrap();
        assert_eq!(contribution.accepted(), 1);
        let rec = &contribution.inserted[0];
        assert!(rec.id.is_some());
        assert_eq!(rec.kind.as_deref(), Some("location"));
        assert_eq!(rec.user_id, Some(UserId(7)));
    }

    #[test(tokio::test)]
    async fn only_csv_files_are_read() {
        let store = MemoryStore::new();
        let result = contribute_file("locations.xlsx", &signed_in(), &store).await;
        assert_eq!(
            Outcome::from(&result).reason.as_deref(),
            Some("Please upload a CSV file")
        );
        let result = contribute_file("/nonexistent/locations.csv", &signed_in(), &store).await;
        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(store.insert_count(), 0);
    }

    #[test(tokio::test)]
    async fn store_failure_is_surfaced() {
        let store = MemoryStore::new();
        store.set_fail_insert(true);
        let result = contribute_csv("name,lat,lng\nA,1,1\n", &signed_in(), &store).await;
        let outcome = Outcome::from(&result);
        assert!(!outcome.success);
        assert_eq!(outcome.reason.as_deref(), Some("Store error: insert failed"));
        assert!(!Outcome::needs_sign_in(&result));
    }
}
