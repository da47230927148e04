use chrono::Utc;
use exam_core::model::SessionSnapshot;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser};
use crate::repository::{SessionSnapshotRepository, StorageError};

#[async_trait::async_trait]
impl SessionSnapshotRepository for SqliteRepository {
    async fn save_snapshot(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        let payload = serde_json::to_string(snapshot).map_err(ser)?;

        sqlx::query(
            r"
                INSERT INTO session_snapshots (slot, session_id, saved_at, payload)
                VALUES (1, ?1, ?2, ?3)
                ON CONFLICT(slot) DO UPDATE SET
                    session_id = excluded.session_id,
                    saved_at = excluded.saved_at,
                    payload = excluded.payload
            ",
        )
        .bind(snapshot.session_id.to_string())
        .bind(Utc::now())
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn load_snapshot(&self) -> Result<Option<SessionSnapshot>, StorageError> {
        let row = sqlx::query("SELECT payload FROM session_snapshots WHERE slot = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.map(|row| {
            let payload: String = row.try_get("payload").map_err(ser)?;
            serde_json::from_str(&payload).map_err(ser)
        })
        .transpose()
    }

    async fn clear_snapshot(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM session_snapshots WHERE slot = 1")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
