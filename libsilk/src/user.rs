//! User accounts for the SQLite store
use crate::{
    database::Database,
    error::{Error, Result},
    record::UserId,
    session::UserIdentity,
};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString, rand_core::OsRng};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteQueryResult;

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    #[sqlx(rename = "userid")]
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub pwhash: String,
}

impl User {
    pub fn new(username: String, pwhash: String) -> Self {
        Self {
            id: -1,
            username,
            pwhash,
        }
    }

    pub async fn load_all(db: &Database) -> Result<Vec<User>> {
        Ok(
            sqlx::query_as("SELECT userid, username, pwhash FROM sc_users ORDER BY username ASC")
                .fetch_all(db.pool())
                .await?,
        )
    }

    pub async fn load_by_username(username: &str, db: &Database) -> Result<Option<User>> {
        Ok(
            sqlx::query_as("SELECT userid, username, pwhash FROM sc_users WHERE username=?")
                .bind(username)
                .fetch_optional(db.pool())
                .await?,
        )
    }

    /// Add this user to the database. On success the id of this object is
    /// updated to the id of the inserted row.
    pub async fn insert(&mut self, db: &Database) -> Result<SqliteQueryResult> {
        if self.id != -1 {
            return Err(Error::InvalidInsertObjectAlreadyExists(self.id));
        }
        sqlx::query("INSERT INTO sc_users (username, pwhash) VALUES (?, ?)")
            .bind(&self.username)
            .bind(&self.pwhash)
            .execute(db.pool())
            .await
            .inspect(|r| self.id = r.last_insert_rowid())
            .map_err(|e| e.into())
    }

    pub fn hash_password(pw: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hasher = Argon2::default();
        Ok(hasher.hash_password(pw.as_bytes(), &salt)?.to_string())
    }

    pub fn verify_password(&self, pw: &str) -> Result<()> {
        let hasher = Argon2::default();
        let expected_hash = PasswordHash::new(&self.pwhash)?;
        hasher
            .verify_password(pw.as_bytes(), &expected_hash)
            .map_err(|_| Error::AuthInvalidCredentials)
    }

    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            id: UserId(self.id),
            username: self.username.clone(),
        }
    }
}
