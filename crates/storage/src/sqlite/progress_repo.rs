use async_trait::async_trait;
use chrono::Utc;
use lesson_core::model::{LearnerId, LearnerProgress};
use sqlx::Row;

use crate::repository::{ProgressRepository, StorageError};

use super::SqliteRepository;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_progress(
        &self,
        learner: LearnerId,
    ) -> Result<Option<LearnerProgress>, StorageError> {
        let row = sqlx::query("SELECT payload FROM learner_progress WHERE learner_id = ?1")
            .bind(learner.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload: String = row.try_get("payload").map_err(ser)?;
        let progress: LearnerProgress = serde_json::from_str(&payload).map_err(ser)?;
        if progress.learner_id() != learner {
            return Err(StorageError::Serialization(format!(
                "payload belongs to learner {}, expected {learner}",
                progress.learner_id()
            )));
        }
        Ok(Some(progress))
    }

    async fn save_progress(&self, progress: &LearnerProgress) -> Result<(), StorageError> {
        let payload = serde_json::to_string(progress).map_err(ser)?;
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO learner_progress (learner_id, payload, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT(learner_id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
        )
        .bind(progress.learner_id().to_string())
        .bind(payload)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn list_learners(&self) -> Result<Vec<LearnerId>, StorageError> {
        let rows = sqlx::query(
            "SELECT learner_id FROM learner_progress ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| {
                let raw: String = row.try_get("learner_id").map_err(ser)?;
                raw.parse::<LearnerId>().map_err(ser)
            })
            .collect()
    }
}
