mod document;
mod head;
mod model;
mod resolve;
mod robots;
mod sitemap;

pub use document::Document;
pub use head::{Head, TagKey};
pub use model::{GlobalSeo, PageSeo, SitemapRecord};
pub use resolve::{first_defined, resolve, GlobalField, Lookup, Metadata, PageField, Sources};
pub use resolve::{OG_TYPE, TITLE, TWITTER_CARD};
pub use robots::{default_robots, render_robots};
pub use sitemap::{render_sitemap, Sitemap, DEFAULT_CHANGEFREQ, DEFAULT_PRIORITY};
