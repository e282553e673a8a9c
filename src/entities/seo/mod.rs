mod global_seo;
mod page_seo;
mod sitemap;

pub use global_seo::Entity as GlobalSeoSettings;
pub use global_seo::Model as GlobalSeoRecord;
pub use page_seo::Entity as SeoSettings;
pub use page_seo::Keywords;
pub use page_seo::Model as PageSeoRecord;
pub use sitemap::Entity as SitemapEntries;
pub use sitemap::Model as SitemapEntryRecord;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::Deserialize;
use serde_json::Value as Json;

use sitecms::algorithm::SnowflakeId;
use sitecms::cache::{cached, Scope, Snapshots};
use sitecms::seo::{GlobalSeo, PageSeo, SitemapRecord};

use super::nullable;

pub struct Seo {
    db: Arc<DatabaseConnection>,
    cache: Arc<dyn Snapshots>,
    ids: Arc<SnowflakeId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageSeoPatch {
    pub page_name: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub meta_title: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub meta_description: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub primary_keyword: Option<Option<String>>,

    pub secondary_keywords: Option<Vec<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub canonical_url: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub og_title: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub og_description: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub og_image: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub twitter_title: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub twitter_description: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub twitter_image: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub schema_type: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub schema_data: Option<Option<Json>>,

    pub no_index: Option<bool>,
    pub no_follow: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GlobalSeoPatch {
    #[serde(default, deserialize_with = "nullable")]
    pub site_name: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub site_description: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub default_og_image: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub google_analytics_id: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub google_search_console_verification: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub robots_txt_content: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub business_schema: Option<Option<Json>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewSitemapEntry {
    pub url: String,
    pub page_type: Option<String>,
    pub priority: Option<f64>,
    pub changefreq: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SitemapEntryPatch {
    pub url: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub page_type: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub priority: Option<Option<f64>>,

    #[serde(default, deserialize_with = "nullable")]
    pub changefreq: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable")]
    pub last_modified: Option<Option<DateTime<Utc>>>,

    pub is_active: Option<bool>,
}

impl From<PageSeoRecord> for PageSeo {
    fn from(record: PageSeoRecord) -> Self {
        Self {
            page_slug: record.page_slug,
            meta_title: record.meta_title,
            meta_description: record.meta_description,
            primary_keyword: record.primary_keyword,
            secondary_keywords: record.secondary_keywords.0,
            canonical_url: record.canonical_url,
            og_title: record.og_title,
            og_description: record.og_description,
            og_image: record.og_image,
            twitter_title: record.twitter_title,
            twitter_description: record.twitter_description,
            twitter_image: record.twitter_image,
            schema_type: record.schema_type,
            schema_data: record.schema_data,
            no_index: record.no_index,
            no_follow: record.no_follow,
        }
    }
}

impl From<GlobalSeoRecord> for GlobalSeo {
    fn from(record: GlobalSeoRecord) -> Self {
        Self {
            site_name: record.site_name,
            site_description: record.site_description,
            default_og_image: record.default_og_image,
            google_analytics_id: record.google_analytics_id,
            google_search_console_verification: record.google_search_console_verification,
            robots_txt_content: record.robots_txt_content,
            business_schema: record.business_schema,
        }
    }
}

impl From<SitemapEntryRecord> for SitemapRecord {
    fn from(record: SitemapEntryRecord) -> Self {
        Self {
            url: record.url,
            priority: record.priority,
            changefreq: record.changefreq,
            last_modified: record.last_modified,
        }
    }
}

impl Seo {
    pub fn new(
        db: Arc<DatabaseConnection>,
        cache: Arc<dyn Snapshots>,
        ids: Arc<SnowflakeId>,
    ) -> Self {
        Self { db, cache, ids }
    }

    pub async fn get_page_seo(&self, slug: &str) -> Result<Option<PageSeoRecord>, DbErr> {
        cached(self.cache.as_ref(), Scope::PageSeo, slug, || async {
            SeoSettings::find()
                .filter(page_seo::Column::PageSlug.eq(slug))
                .one(&*self.db)
                .await
        })
        .await
    }

    pub async fn list_page_seo(&self) -> Result<Vec<PageSeoRecord>, DbErr> {
        cached(self.cache.as_ref(), Scope::AllPageSeo, "all", || async {
            SeoSettings::find()
                .order_by_asc(page_seo::Column::PageSlug)
                .all(&*self.db)
                .await
        })
        .await
    }

    pub async fn update_page_seo(
        &self,
        id: i64,
        patch: PageSeoPatch,
    ) -> Result<PageSeoRecord, DbErr> {
        let mut query = SeoSettings::update_many().filter(page_seo::Column::Id.eq(id));

        set_if_present!(query, page_seo::Column::PageName, patch.page_name);
        set_if_present!(query, page_seo::Column::MetaTitle, patch.meta_title);
        set_if_present!(query, page_seo::Column::MetaDescription, patch.meta_description);
        set_if_present!(query, page_seo::Column::PrimaryKeyword, patch.primary_keyword);
        set_if_present!(
            query,
            page_seo::Column::SecondaryKeywords,
            patch.secondary_keywords.map(Keywords)
        );
        set_if_present!(query, page_seo::Column::CanonicalUrl, patch.canonical_url);
        set_if_present!(query, page_seo::Column::OgTitle, patch.og_title);
        set_if_present!(query, page_seo::Column::OgDescription, patch.og_description);
        set_if_present!(query, page_seo::Column::OgImage, patch.og_image);
        set_if_present!(query, page_seo::Column::TwitterTitle, patch.twitter_title);
        set_if_present!(query, page_seo::Column::TwitterDescription, patch.twitter_description);
        set_if_present!(query, page_seo::Column::TwitterImage, patch.twitter_image);
        set_if_present!(query, page_seo::Column::SchemaType, patch.schema_type);
        set_if_present!(query, page_seo::Column::SchemaData, patch.schema_data);
        set_if_present!(query, page_seo::Column::NoIndex, patch.no_index);
        set_if_present!(query, page_seo::Column::NoFollow, patch.no_follow);

        let result = query
            .col_expr(page_seo::Column::UpdatedAt, Expr::value(Utc::now()))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("Page SEO {} not found", id)));
        }

        self.cache.invalidate(Scope::PageSeo).await;
        self.cache.invalidate(Scope::AllPageSeo).await;

        SeoSettings::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("Page SEO {} not found", id)))
    }

    pub async fn get_global_seo(&self) -> Result<Option<GlobalSeoRecord>, DbErr> {
        cached(self.cache.as_ref(), Scope::GlobalSeo, "singleton", || async {
            GlobalSeoSettings::find()
                .order_by_asc(global_seo::Column::CreatedAt)
                .one(&*self.db)
                .await
        })
        .await
    }

    pub async fn update_global_seo(
        &self,
        id: i64,
        patch: GlobalSeoPatch,
    ) -> Result<GlobalSeoRecord, DbErr> {
        let mut query = GlobalSeoSettings::update_many().filter(global_seo::Column::Id.eq(id));

        set_if_present!(query, global_seo::Column::SiteName, patch.site_name);
        set_if_present!(query, global_seo::Column::SiteDescription, patch.site_description);
        set_if_present!(query, global_seo::Column::DefaultOgImage, patch.default_og_image);
        set_if_present!(query, global_seo::Column::GoogleAnalyticsId, patch.google_analytics_id);
        set_if_present!(
            query,
            global_seo::Column::GoogleSearchConsoleVerification,
            patch.google_search_console_verification
        );
        set_if_present!(query, global_seo::Column::RobotsTxtContent, patch.robots_txt_content);
        set_if_present!(query, global_seo::Column::BusinessSchema, patch.business_schema);

        let result = query
            .col_expr(global_seo::Column::UpdatedAt, Expr::value(Utc::now()))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("Global SEO {} not found", id)));
        }

        self.cache.invalidate(Scope::GlobalSeo).await;

        GlobalSeoSettings::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("Global SEO {} not found", id)))
    }

    pub async fn get_robots_txt(&self) -> Result<Option<String>, DbErr> {
        Ok(self
            .get_global_seo()
            .await?
            .and_then(|global| global.robots_txt_content))
    }

    /// Active entries, highest priority first.
    pub async fn list_active_sitemap_entries(&self) -> Result<Vec<SitemapRecord>, DbErr> {
        let entries = cached(self.cache.as_ref(), Scope::SitemapEntries, "active", || async {
            SitemapEntries::find()
                .filter(sitemap::Column::IsActive.eq(true))
                .order_by_desc(sitemap::Column::Priority)
                .all(&*self.db)
                .await
        })
        .await?;

        Ok(entries.into_iter().map(SitemapRecord::from).collect())
    }

    pub async fn list_sitemap_entries(&self) -> Result<Vec<SitemapEntryRecord>, DbErr> {
        cached(self.cache.as_ref(), Scope::SitemapEntries, "all", || async {
            SitemapEntries::find()
                .order_by_desc(sitemap::Column::Priority)
                .all(&*self.db)
                .await
        })
        .await
    }

    pub async fn create_sitemap_entry(
        &self,
        entry: NewSitemapEntry,
    ) -> Result<SitemapEntryRecord, DbErr> {
        let record = sitemap::ActiveModel {
            id: Set(self.ids.generate()),
            url: Set(entry.url),
            page_type: Set(entry.page_type),
            priority: Set(entry.priority),
            changefreq: Set(entry.changefreq),
            last_modified: Set(entry.last_modified),
            is_active: Set(entry.is_active.unwrap_or(true)),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        self.cache.invalidate(Scope::SitemapEntries).await;
        Ok(record)
    }

    pub async fn update_sitemap_entry(
        &self,
        id: i64,
        patch: SitemapEntryPatch,
    ) -> Result<SitemapEntryRecord, DbErr> {
        let mut query = SitemapEntries::update_many().filter(sitemap::Column::Id.eq(id));

        set_if_present!(query, sitemap::Column::Url, patch.url);
        set_if_present!(query, sitemap::Column::PageType, patch.page_type);
        set_if_present!(query, sitemap::Column::Priority, patch.priority);
        set_if_present!(query, sitemap::Column::Changefreq, patch.changefreq);
        set_if_present!(query, sitemap::Column::LastModified, patch.last_modified);
        set_if_present!(query, sitemap::Column::IsActive, patch.is_active);

        let result = query.exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("Sitemap entry {} not found", id)));
        }

        self.cache.invalidate(Scope::SitemapEntries).await;

        SitemapEntries::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("Sitemap entry {} not found", id)))
    }

    pub async fn delete_sitemap_entry(&self, id: i64) -> Result<(), DbErr> {
        let result = SitemapEntries::delete_by_id(id).exec(&*self.db).await?;

        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("Sitemap entry {} not found", id)));
        }

        self.cache.invalidate(Scope::SitemapEntries).await;
        Ok(())
    }
}
