//! `SQLite` implementation of [`UserDirectory`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use alerthub_app::ports::UserDirectory;
use alerthub_domain::error::HubError;
use alerthub_domain::id::UserId;
use alerthub_domain::user::{DeviceToken, UserRecord};

use crate::error::StorageError;

struct Wrapper(UserRecord);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<UserRecord> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let uid: String = row.try_get("uid")?;
        let email: Option<String> = row.try_get("email")?;
        let tokens_json: String = row.try_get("tokens")?;
        let tokens: Vec<DeviceToken> = serde_json::from_str(&tokens_json)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(UserRecord {
            uid: UserId::new(uid),
            email,
            tokens,
        }))
    }
}

/// `SQLite`-backed user directory.
#[derive(Clone)]
pub struct SqliteUserDirectory {
    pool: SqlitePool,
}

impl SqliteUserDirectory {
    /// Create a new directory backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace a user record.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the tokens cannot be serialized or the
    /// write fails.
    pub async fn upsert(&self, user: &UserRecord) -> Result<(), HubError> {
        let tokens_json = serde_json::to_string(&user.tokens).map_err(StorageError::from)?;
        sqlx::query(
            "INSERT INTO users (uid, email, tokens) VALUES (?, ?, ?) \
             ON CONFLICT(uid) DO UPDATE SET email = excluded.email, tokens = excluded.tokens",
        )
        .bind(user.uid.as_str())
        .bind(&user.email)
        .bind(&tokens_json)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(())
    }
}

impl UserDirectory for SqliteUserDirectory {
    async fn get_by_uid(&self, uid: &UserId) -> Result<Option<UserRecord>, HubError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM users WHERE uid = ?")
            .bind(uid.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, HubError> {
        let row: Option<Wrapper> =
            sqlx::query_as("SELECT * FROM users WHERE email = ? ORDER BY rowid LIMIT 1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }
}
