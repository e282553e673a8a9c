mod files;

pub use files::Entity as MediaFiles;
pub use files::Model as MediaFile;

use std::sync::Arc;

use chrono::Utc;
use sea_orm::entity::prelude::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;

use sitecms::algorithm::SnowflakeId;
use sitecms::cache::{cached, Scope, Snapshots};

/// Metadata of files kept in external object storage. Only the URL is known
/// here, the bytes never pass through this service.
pub struct Media {
    db: Arc<DatabaseConnection>,
    cache: Arc<dyn Snapshots>,
    ids: Arc<SnowflakeId>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewMediaFile {
    pub file_name: String,
    pub file_url: String,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub alt_text: Option<String>,
}

impl Media {
    pub fn new(
        db: Arc<DatabaseConnection>,
        cache: Arc<dyn Snapshots>,
        ids: Arc<SnowflakeId>,
    ) -> Self {
        Self { db, cache, ids }
    }

    pub async fn list_media(&self) -> Result<Vec<MediaFile>, DbErr> {
        cached(self.cache.as_ref(), Scope::Media, "all", || async {
            MediaFiles::find()
                .order_by_desc(files::Column::CreatedAt)
                .all(&*self.db)
                .await
        })
        .await
    }

    pub async fn register_media(
        &self,
        file: NewMediaFile,
        uploaded_by: &str,
    ) -> Result<MediaFile, DbErr> {
        let record = files::ActiveModel {
            id: Set(self.ids.generate()),
            file_name: Set(file.file_name),
            file_url: Set(file.file_url),
            file_type: Set(file.file_type),
            file_size: Set(file.file_size),
            alt_text: Set(file.alt_text),
            uploaded_by: Set(Some(uploaded_by.to_string())),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        self.cache.invalidate(Scope::Media).await;
        Ok(record)
    }

    pub async fn update_alt_text(
        &self,
        id: i64,
        alt_text: Option<String>,
    ) -> Result<MediaFile, DbErr> {
        let result = MediaFiles::update_many()
            .col_expr(files::Column::AltText, Expr::value(alt_text))
            .filter(files::Column::Id.eq(id))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("Media file {} not found", id)));
        }

        self.cache.invalidate(Scope::Media).await;

        MediaFiles::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("Media file {} not found", id)))
    }

    pub async fn delete_media(&self, id: i64) -> Result<(), DbErr> {
        let result = MediaFiles::delete_by_id(id).exec(&*self.db).await?;

        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("Media file {} not found", id)));
        }

        self.cache.invalidate(Scope::Media).await;
        Ok(())
    }

    pub async fn count_media(&self) -> Result<u64, DbErr> {
        MediaFiles::find().count(&*self.db).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::testing::{cache, ids, mock};
    use chrono::TimeZone;
    use sea_orm::MockExecResult;

    fn file(alt_text: Option<&str>) -> MediaFile {
        MediaFile {
            id: 31,
            file_name: "hero.png".to_string(),
            file_url: "https://cdn.example.com/hero.png".to_string(),
            file_type: Some("image/png".to_string()),
            file_size: Some(2048),
            alt_text: alt_text.map(str::to_string),
            uploaded_by: Some("user-1".to_string()),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_update_alt_text() {
        let db = mock(|db| {
            db.append_query_results([vec![file(Some("Hero banner"))]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
        });
        let media = Media::new(db, cache(), ids());

        let updated = media
            .update_alt_text(31, Some("Hero banner".to_string()))
            .await
            .unwrap();

        assert_eq!(updated.alt_text.as_deref(), Some("Hero banner"));
    }

    #[tokio::test]
    async fn test_register_media_invalidates_list() {
        let db = mock(|db| {
            db.append_query_results([vec![], vec![file(None)], vec![file(None)]])
        });
        let media = Media::new(db, cache(), ids());

        assert!(media.list_media().await.unwrap().is_empty());
        media
            .register_media(
                NewMediaFile {
                    file_name: "hero.png".to_string(),
                    file_url: "https://cdn.example.com/hero.png".to_string(),
                    ..Default::default()
                },
                "user-1",
            )
            .await
            .unwrap();
        assert_eq!(media.list_media().await.unwrap().len(), 1);
    }
}
