mod entries;

pub use entries::Entity as ActivityLog;
pub use entries::Model as Activity;

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, QuerySelect, Set};
use serde::Serialize;
use serde_json::Value as Json;

use sitecms::algorithm::SnowflakeId;
use sitecms::cache::{cached, Scope, Snapshots};

pub const RECENT_LIMIT: u64 = 100;

/// Append-only audit trail of admin mutations.
pub struct Journal {
    db: Arc<DatabaseConnection>,
    cache: Arc<dyn Snapshots>,
    ids: Arc<SnowflakeId>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NewActivity {
    pub user_id: Option<String>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub details: Option<Json>,
}

impl Journal {
    pub fn new(
        db: Arc<DatabaseConnection>,
        cache: Arc<dyn Snapshots>,
        ids: Arc<SnowflakeId>,
    ) -> Self {
        Self { db, cache, ids }
    }

    /// Newest first, at most [`RECENT_LIMIT`] rows.
    pub async fn list_recent(&self) -> Result<Vec<Activity>, DbErr> {
        cached(self.cache.as_ref(), Scope::ActivityLog, "recent", || async {
            ActivityLog::find()
                .order_by_desc(entries::Column::CreatedAt)
                .limit(RECENT_LIMIT)
                .all(&*self.db)
                .await
        })
        .await
    }

    pub async fn append(&self, entry: NewActivity) -> Result<Activity, DbErr> {
        let record = entries::ActiveModel {
            id: Set(self.ids.generate()),
            user_id: Set(entry.user_id),
            action: Set(entry.action),
            entity_type: Set(entry.entity_type),
            entity_id: Set(entry.entity_id),
            details: Set(entry.details),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        self.cache.invalidate(Scope::ActivityLog).await;
        Ok(record)
    }
}
