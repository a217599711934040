//! `SQLite` implementation of [`RuleStore`].
//!
//! `SQLite` has no change notifications, so the feed polls the `rules`
//! table and emits the difference between two consecutive snapshots.

use std::collections::BTreeMap;
use std::time::Duration;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use alerthub_app::ports::{RuleChangeStream, RuleStore};
use alerthub_domain::error::HubError;
use alerthub_domain::id::RuleId;
use alerthub_domain::rule::{RuleChange, RuleDocument};
use alerthub_domain::time::now;

use crate::error::StorageError;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

struct Wrapper(RuleDocument);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let document: String = row.try_get("document")?;
        let data =
            serde_json::from_str(&document).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        Ok(Self(RuleDocument::new(RuleId::new(id), data)))
    }
}

/// `SQLite`-backed rule store.
#[derive(Clone)]
pub struct SqliteRuleStore {
    pool: SqlitePool,
    poll_interval: Duration,
}

impl SqliteRuleStore {
    /// Create a new store backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set how often the change feed polls the table.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Insert or replace a rule document.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the document cannot be serialized or written.
    pub async fn upsert(&self, rule: &RuleDocument) -> Result<(), HubError> {
        let document = serde_json::to_string(&rule.data).map_err(StorageError::from)?;
        sqlx::query(
            "INSERT INTO rules (id, document, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
             document = excluded.document, updated_at = excluded.updated_at",
        )
        .bind(rule.id.as_str())
        .bind(&document)
        .bind(now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(())
    }

    /// Delete a rule. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the delete fails.
    pub async fn delete(&self, id: &RuleId) -> Result<bool, HubError> {
        let result = sqlx::query("DELETE FROM rules WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn snapshot(
        pool: &SqlitePool,
    ) -> Result<BTreeMap<RuleId, serde_json::Value>, StorageError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT id, document FROM rules ORDER BY id")
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(|w| (w.0.id, w.0.data)).collect())
    }

    async fn poll(
        pool: SqlitePool,
        interval: Duration,
        tx: mpsc::Sender<Result<Vec<RuleChange>, HubError>>,
    ) {
        let mut previous = match Self::snapshot(&pool).await {
            Ok(current) => current,
            Err(err) => {
                let _ = tx.send(Err(err.into())).await;
                return;
            }
        };
        let initial = previous
            .iter()
            .map(|(id, data)| RuleChange::Added(RuleDocument::new(id.clone(), data.clone())))
            .collect();
        if tx.send(Ok(initial)).await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                () = tx.closed() => return,
                () = tokio::time::sleep(interval) => {}
            }
            let current = match Self::snapshot(&pool).await {
                Ok(current) => current,
                Err(err) => {
                    let _ = tx.send(Err(err.into())).await;
                    return;
                }
            };
            let changes = diff(&previous, &current);
            previous = current;
            if changes.is_empty() {
                continue;
            }
            tracing::debug!(changes = changes.len(), "rule table changed");
            if tx.send(Ok(changes)).await.is_err() {
                return;
            }
        }
    }
}

/// Changes turning `before` into `after`, ordered by rule id.
fn diff(
    before: &BTreeMap<RuleId, serde_json::Value>,
    after: &BTreeMap<RuleId, serde_json::Value>,
) -> Vec<RuleChange> {
    let mut changes: Vec<RuleChange> = after
        .iter()
        .filter_map(|(id, data)| match before.get(id) {
            None => Some(RuleChange::Added(RuleDocument::new(id.clone(), data.clone()))),
            Some(old) if old != data => {
                Some(RuleChange::Modified(RuleDocument::new(id.clone(), data.clone())))
            }
            Some(_) => None,
        })
        .collect();
    changes.extend(
        before
            .keys()
            .filter(|id| !after.contains_key(*id))
            .map(|id| RuleChange::Removed(id.clone())),
    );
    changes.sort_by(|a, b| a.rule_id().cmp(b.rule_id()));
    changes
}

impl RuleStore for SqliteRuleStore {
    async fn get_all(&self) -> Result<Vec<RuleDocument>, HubError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT id, document FROM rules ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn subscribe(&self) -> Result<RuleChangeStream, HubError> {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(Self::poll(self.pool.clone(), self.poll_interval, tx));
        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}
