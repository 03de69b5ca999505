use crate::{
    error::{Error, Result},
    session::UserIdentity,
    user::User,
};
use sqlx::{Pool, Sqlite, SqlitePool, sqlite::SqliteConnectOptions};
use std::path::Path;
use tracing::{debug, trace};

/// An object that represents a connection to the location database
#[derive(Clone, Debug)]
pub struct Database(Pool<Sqlite>);

impl From<Pool<Sqlite>> for Database {
    /// **WARNING**: This is primarily intended for tests. You should probably
    /// use [Database::open()] instead of creating the pool yourself, since
    /// [Database::open()] will perform database schema migration automatically.
    fn from(value: Pool<Sqlite>) -> Self {
        Self(value)
    }
}

impl Database {
    /// Open a connection to an existing database. This will also perform any
    /// necessary sql migrations to ensure that the database is up to date with
    /// the latest schema changes. Fails if there is no database at `db`.
    pub async fn open<P: AsRef<Path>>(db: P) -> Result<Self> {
        Self::connect(SqliteConnectOptions::new().filename(db)).await
    }

    /// Create a new database file at `db` and set up its schema
    pub async fn create<P: AsRef<Path>>(db: P) -> Result<Self> {
        let db = db.as_ref();
        debug!(?db, "creating database");
        Self::connect(SqliteConnectOptions::new().filename(db).create_if_missing(true)).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self> {
        let dbpool = SqlitePool::connect_with(options.foreign_keys(true)).await?;
        trace!("Running database migrations");
        sqlx::migrate!("../db/migrations").run(&dbpool).await?;
        Ok(Database(dbpool))
    }

    /// gets a reference to the underlying sqlx connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.0
    }

    /// Add the first user to a freshly created database
    pub async fn init(&self, username: String, password: String) -> Result<User> {
        let pwhash = User::hash_password(&password)?;
        let mut user = User::new(username, pwhash);
        user.insert(self).await?;
        debug!(id = user.id, username = %user.username, "initialized database");
        Ok(user)
    }

    /// Check a username and password against the stored password hash and
    /// return the identity of the user if they match
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<UserIdentity> {
        let user = User::load_by_username(username, self)
            .await?
            .ok_or(Error::AuthInvalidCredentials)?;
        user.verify_password(password)?;
        Ok(user.identity())
    }
}
