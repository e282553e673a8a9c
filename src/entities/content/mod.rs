mod sections;
mod settings;
mod social_links;

pub use sections::Entity as PageContent;
pub use sections::Model as Section;
pub use settings::Entity as SiteSettings;
pub use settings::Model as SiteSetting;
pub use social_links::Entity as SocialLinks;
pub use social_links::Model as SocialLink;

use std::sync::Arc;

use chrono::Utc;
use sea_orm::entity::prelude::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use serde_json::Value as Json;

use sitecms::algorithm::SnowflakeId;
use sitecms::cache::{cached, Scope, Snapshots};

use super::nullable;

pub struct Content {
    db: Arc<DatabaseConnection>,
    cache: Arc<dyn Snapshots>,
    ids: Arc<SnowflakeId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SectionPatch {
    pub section_name: Option<String>,
    pub content: Option<Json>,
    pub is_enabled: Option<bool>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewSocialLink {
    pub platform: String,
    pub url: String,
    pub icon_name: Option<String>,
    pub display_order: Option<i32>,
    pub is_visible: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SocialLinkPatch {
    pub platform: Option<String>,
    pub url: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub icon_name: Option<Option<String>>,

    pub display_order: Option<i32>,
    pub is_visible: Option<bool>,
}

impl Content {
    pub fn new(
        db: Arc<DatabaseConnection>,
        cache: Arc<dyn Snapshots>,
        ids: Arc<SnowflakeId>,
    ) -> Self {
        Self { db, cache, ids }
    }

    /// Every section, grouped by page then display order.
    pub async fn list_sections(&self) -> Result<Vec<Section>, DbErr> {
        cached(self.cache.as_ref(), Scope::PageContent, "all", || async {
            PageContent::find()
                .order_by_asc(sections::Column::PageSlug)
                .order_by_asc(sections::Column::DisplayOrder)
                .all(&*self.db)
                .await
        })
        .await
    }

    pub async fn list_enabled_sections(&self, slug: &str) -> Result<Vec<Section>, DbErr> {
        cached(self.cache.as_ref(), Scope::PageContent, slug, || async {
            PageContent::find()
                .filter(sections::Column::PageSlug.eq(slug))
                .filter(sections::Column::IsEnabled.eq(true))
                .order_by_asc(sections::Column::DisplayOrder)
                .all(&*self.db)
                .await
        })
        .await
    }

    pub async fn update_section(&self, id: i64, patch: SectionPatch) -> Result<Section, DbErr> {
        let mut query = PageContent::update_many().filter(sections::Column::Id.eq(id));

        set_if_present!(query, sections::Column::SectionName, patch.section_name);
        set_if_present!(query, sections::Column::Content, patch.content);
        set_if_present!(query, sections::Column::IsEnabled, patch.is_enabled);
        set_if_present!(query, sections::Column::DisplayOrder, patch.display_order);

        let result = query
            .col_expr(sections::Column::UpdatedAt, Expr::value(Utc::now()))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("Section {} not found", id)));
        }

        self.cache.invalidate(Scope::PageContent).await;

        PageContent::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("Section {} not found", id)))
    }

    pub async fn count_sections(&self) -> Result<u64, DbErr> {
        PageContent::find().count(&*self.db).await
    }

    /// Links ordered for display. `visible_only` hides the ones switched off.
    pub async fn list_social_links(&self, visible_only: bool) -> Result<Vec<SocialLink>, DbErr> {
        let id = if visible_only { "visible" } else { "all" };

        cached(self.cache.as_ref(), Scope::SocialLinks, id, || async {
            let mut query = SocialLinks::find();

            if visible_only {
                query = query.filter(social_links::Column::IsVisible.eq(true));
            }

            query
                .order_by_asc(social_links::Column::DisplayOrder)
                .all(&*self.db)
                .await
        })
        .await
    }

    pub async fn create_social_link(&self, link: NewSocialLink) -> Result<SocialLink, DbErr> {
        let now = Utc::now();
        let record = social_links::ActiveModel {
            id: Set(self.ids.generate()),
            platform: Set(link.platform),
            url: Set(link.url),
            icon_name: Set(link.icon_name),
            display_order: Set(link.display_order.unwrap_or(0)),
            is_visible: Set(link.is_visible.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        self.cache.invalidate(Scope::SocialLinks).await;
        Ok(record)
    }

    pub async fn update_social_link(
        &self,
        id: i64,
        patch: SocialLinkPatch,
    ) -> Result<SocialLink, DbErr> {
        let mut query = SocialLinks::update_many().filter(social_links::Column::Id.eq(id));

        set_if_present!(query, social_links::Column::Platform, patch.platform);
        set_if_present!(query, social_links::Column::Url, patch.url);
        set_if_present!(query, social_links::Column::IconName, patch.icon_name);
        set_if_present!(query, social_links::Column::DisplayOrder, patch.display_order);
        set_if_present!(query, social_links::Column::IsVisible, patch.is_visible);

        let result = query
            .col_expr(social_links::Column::UpdatedAt, Expr::value(Utc::now()))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("Social link {} not found", id)));
        }

        self.cache.invalidate(Scope::SocialLinks).await;

        SocialLinks::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("Social link {} not found", id)))
    }

    pub async fn delete_social_link(&self, id: i64) -> Result<(), DbErr> {
        let result = SocialLinks::delete_by_id(id).exec(&*self.db).await?;

        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("Social link {} not found", id)));
        }

        self.cache.invalidate(Scope::SocialLinks).await;
        Ok(())
    }

    pub async fn list_settings(&self) -> Result<Vec<SiteSetting>, DbErr> {
        cached(self.cache.as_ref(), Scope::SiteSettings, "all", || async {
            SiteSettings::find()
                .order_by_asc(settings::Column::SettingKey)
                .all(&*self.db)
                .await
        })
        .await
    }

    pub async fn update_setting(&self, id: i64, value: Json) -> Result<SiteSetting, DbErr> {
        let result = SiteSettings::update_many()
            .col_expr(settings::Column::SettingValue, Expr::value(value))
            .col_expr(settings::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(settings::Column::Id.eq(id))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("Setting {} not found", id)));
        }

        self.cache.invalidate(Scope::SiteSettings).await;

        SiteSettings::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("Setting {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::testing::{cache, ids, mock};
    use chrono::TimeZone;
    use sea_orm::MockExecResult;
    use serde_json::json;

    fn link(platform: &str, visible: bool) -> SocialLink {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        SocialLink {
            id: 11,
            platform: platform.to_string(),
            url: format!("https://{}.com/thahaseen", platform),
            icon_name: None,
            display_order: 1,
            is_visible: visible,
            created_at: at,
            updated_at: at,
        }
    }

    fn section(slug: &str, order: i32) -> Section {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

        Section {
            id: order as i64,
            page_slug: slug.to_string(),
            section_name: "hero".to_string(),
            content: json!({"headline": "Hello"}),
            is_enabled: true,
            display_order: order,
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn test_visible_and_all_links_are_cached_apart() {
        let db = mock(|db| {
            db.append_query_results([
                vec![link("github", true)],
                vec![link("github", true), link("dribbble", false)],
            ])
        });
        let content = Content::new(db, cache(), ids());

        assert_eq!(content.list_social_links(true).await.unwrap().len(), 1);
        assert_eq!(content.list_social_links(false).await.unwrap().len(), 2);
        assert_eq!(content.list_social_links(true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_social_link_invalidates_lists() {
        let db = mock(|db| {
            db.append_query_results([
                vec![link("github", true)],
                vec![link("linkedin", true)],
                vec![link("github", true), link("linkedin", true)],
            ])
        });
        let content = Content::new(db, cache(), ids());

        content.list_social_links(false).await.unwrap();
        let created = content
            .create_social_link(NewSocialLink {
                platform: "linkedin".to_string(),
                url: "https://linkedin.com/in/thahaseen".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(created.platform, "linkedin");
        assert_eq!(content.list_social_links(false).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_missing_section_is_not_found() {
        let db = mock(|db| {
            db.append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
        });
        let content = Content::new(db, cache(), ids());

        assert!(matches!(
            content.update_section(5, SectionPatch::default()).await,
            Err(DbErr::RecordNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_enabled_sections_are_cached_per_page() {
        let db = mock(|db| {
            db.append_query_results([vec![section("/", 1), section("/", 2)], vec![section("/about", 1)]])
        });
        let content = Content::new(db, cache(), ids());

        assert_eq!(content.list_enabled_sections("/").await.unwrap().len(), 2);
        assert_eq!(content.list_enabled_sections("/about").await.unwrap().len(), 1);
        assert_eq!(content.list_enabled_sections("/").await.unwrap().len(), 2);
    }
}
