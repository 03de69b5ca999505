//! A [RecordStore] backed by the SQLite location database
use crate::{
    database::Database,
    error::{Error, Result},
    record::{GeoRecord, RecordId, UserId},
    store::RecordStore,
};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;

/// A type for specifying fields that can be used for filtering a database query
/// for locations
#[derive(Clone, Debug)]
pub enum Filter {
    /// Match the id of the user who contributed the location
    UserId(UserId),

    /// Match locations whose name or description contains the given string
    Text(String),

    /// Match the type of the location exactly
    Kind(String),
}

impl Filter {
    fn add_to_query(&self, builder: &mut QueryBuilder<Sqlite>) {
        match self {
            Self::UserId(id) => _ = builder.push(" L.userid = ").push_bind(id.0),
            Self::Text(frag) => {
                let s = format!("%{frag}%");
                builder
                    .push(" (L.locname LIKE ")
                    .push_bind(s.clone())
                    .push(" OR L.locdesc LIKE ")
                    .push_bind(s)
                    .push(")");
            }
            Self::Kind(kind) => _ = builder.push(" L.loctype = ").push_bind(kind.clone()),
        }
    }
}

/// Stores records in the `sc_locations` table
#[derive(Clone, Debug)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn build_query(filters: &[Filter]) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new(
            r#"SELECT L.locid, L.locname, L.locdesc, L.latitude, L.longitude,
            L.loctype, L.userid FROM sc_locations L"#,
        );
        for (i, filter) in filters.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            filter.add_to_query(&mut qb);
        }
        qb.push(" ORDER BY L.locid ASC");
        qb
    }

    /// Loads all locations that match every one of `filters`
    pub async fn load_matching(&self, filters: &[Filter]) -> Result<Vec<GeoRecord>> {
        Self::build_query(filters)
            .build_query_as()
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| e.into())
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn fetch_all(&self) -> Result<Vec<GeoRecord>> {
        self.load_matching(&[]).await
    }

    async fn insert(&self, records: Vec<GeoRecord>) -> Result<Vec<GeoRecord>> {
        let mut tx = self.db.pool().begin().await?;
        let mut inserted = Vec::with_capacity(records.len());
        for mut rec in records {
            if let Some(id) = rec.id {
                return Err(Error::InvalidInsertObjectAlreadyExists(id.0));
            }
            let userid = rec.user_id.ok_or_else(|| {
                Error::InvalidStateMissingAttribute(format!("user_id of '{}'", rec.name))
            })?;
            let res = sqlx::query(
                r#"INSERT INTO sc_locations
                (locname, locdesc, latitude, longitude, loctype, userid)
                VALUES (?, ?, ?, ?, ?, ?)"#,
            )
            .bind(&rec.name)
            .bind(&rec.description)
            .bind(rec.latitude)
            .bind(rec.longitude)
            .bind(&rec.kind)
            .bind(userid.0)
            .execute(&mut *tx)
            .await?;
            rec.id = Some(RecordId(res.last_insert_rowid()));
            inserted.push(rec);
        }
        tx.commit().await?;
        debug!(count = inserted.len(), "inserted locations");
        Ok(inserted)
    }
}
