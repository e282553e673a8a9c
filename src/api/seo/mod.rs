pub mod v1;

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{HttpResponse, Result};

use chrono::Utc;
use log::{error, info};
use sea_orm::DbErr;

use sitecms::seo::{render_robots, render_sitemap, GlobalSeo, PageSeo, SitemapRecord};

use crate::api::{edge_response, AppState};

/// Fetch the page and global records concurrently. A failed read is logged
/// and treated as missing so the head degrades to its defaults.
pub async fn load_sources(
    appstate: &AppState,
    route: &str,
) -> (Option<PageSeo>, Option<GlobalSeo>) {
    let seo = match appstate.seo_entity() {
        Some(seo) => seo,
        None => return (None, None),
    };

    let (page, global) = futures::join!(seo.get_page_seo(route), seo.get_global_seo());
    let page = match page {
        Ok(page) => page.map(PageSeo::from),
        Err(error) => {
            error!("Failed to fetch SEO settings of {}: {}", route, error);
            None
        }
    };
    let global = match global {
        Ok(global) => global.map(GlobalSeo::from),
        Err(error) => {
            error!("Failed to fetch global SEO settings: {}", error);
            None
        }
    };

    (page, global)
}

/// Sitemap of the active entries, or the root-only fallback.
pub async fn sitemap_document(appstate: &AppState) -> String {
    let read: std::result::Result<Vec<SitemapRecord>, DbErr> = match appstate.seo_entity() {
        Some(seo) => seo.list_active_sitemap_entries().await,
        None => Err(DbErr::Custom("Database is not configured".to_string())),
    };

    render_sitemap(appstate.config(), read, Utc::now().date_naive())
}

/// Stored robots.txt, or the default policy.
pub async fn robots_document(appstate: &AppState) -> String {
    let read: std::result::Result<Option<String>, DbErr> = match appstate.seo_entity() {
        Some(seo) => seo.get_robots_txt().await,
        None => Err(DbErr::Custom("Database is not configured".to_string())),
    };

    render_robots(appstate.config(), read)
}

pub async fn sitemap(appstate: Data<Arc<AppState>>) -> Result<HttpResponse> {
    let xml = sitemap_document(&appstate).await;

    info!("Served sitemap.xml");
    Ok(edge_response(StatusCode::OK)
        .content_type("application/xml")
        .body(xml))
}

pub async fn robots(appstate: Data<Arc<AppState>>) -> Result<HttpResponse> {
    let text = robots_document(&appstate).await;

    info!("Served robots.txt");
    Ok(edge_response(StatusCode::OK)
        .content_type("text/plain")
        .body(text))
}
