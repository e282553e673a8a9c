use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-page SEO record, keyed by the route path used as slug.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSeo {
    pub page_slug: String,

    #[serde(default)]
    pub meta_title: Option<String>,

    #[serde(default)]
    pub meta_description: Option<String>,

    #[serde(default)]
    pub primary_keyword: Option<String>,

    #[serde(default)]
    pub secondary_keywords: Vec<String>,

    #[serde(default)]
    pub canonical_url: Option<String>,

    #[serde(default)]
    pub og_title: Option<String>,

    #[serde(default)]
    pub og_description: Option<String>,

    #[serde(default)]
    pub og_image: Option<String>,

    #[serde(default)]
    pub twitter_title: Option<String>,

    #[serde(default)]
    pub twitter_description: Option<String>,

    #[serde(default)]
    pub twitter_image: Option<String>,

    #[serde(default)]
    pub schema_type: Option<String>,

    #[serde(default)]
    pub schema_data: Option<Value>,

    #[serde(default)]
    pub no_index: bool,

    #[serde(default)]
    pub no_follow: bool,
}

/// Site-wide SEO defaults. At most one exists.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalSeo {
    #[serde(default)]
    pub site_name: Option<String>,

    #[serde(default)]
    pub site_description: Option<String>,

    #[serde(default)]
    pub default_og_image: Option<String>,

    #[serde(default)]
    pub google_analytics_id: Option<String>,

    #[serde(default)]
    pub google_search_console_verification: Option<String>,

    #[serde(default)]
    pub robots_txt_content: Option<String>,

    #[serde(default)]
    pub business_schema: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SitemapRecord {
    pub url: String,

    #[serde(default)]
    pub priority: Option<f64>,

    #[serde(default)]
    pub changefreq: Option<String>,

    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}
