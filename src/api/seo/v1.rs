use std::sync::Arc;

use actix_web::http::header::{ETAG, IF_NONE_MATCH};
use actix_web::web::{Data, Path};
use actix_web::{HttpRequest, HttpResponse, Result};

use log::{debug, error};
use serde::Serialize;

use sitecms::seo::{resolve, Document, Sources, TagKey};

use super::load_sources;
use crate::api::{AppState, ErrorResponse};

#[derive(Serialize, Clone, Debug)]
pub struct TagResponseV1 {
    tag: TagKey,
    value: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct MetaResponseV1 {
    route: String,
    fingerprint: String,
    title: Option<String>,
    tags: Vec<TagResponseV1>,
}

fn route_of(slug: &str) -> String {
    format!("/{}", slug.trim_matches('/'))
}

fn matches_etag(req: &HttpRequest, etag: &str) -> bool {
    match req.headers().get(IF_NONE_MATCH).and_then(|value| value.to_str().ok()) {
        Some(value) => value.split(',').map(str::trim).any(|candidate| {
            candidate == "*" || candidate.trim_start_matches("W/") == etag
        }),
        None => false,
    }
}

/// Head fragment of a route with SEO records merged over the site shell.
pub async fn head(
    appstate: Data<Arc<AppState>>,
    slug: Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let route = route_of(&slug);
    let (page, global) = load_sources(&appstate, &route).await;
    let mut document = Document::shell(appstate.config());

    document.sync(&route, Sources::new(page.as_ref(), global.as_ref()));

    let etag = format!("\"{}\"", document.fingerprint().unwrap_or_default());
    if matches_etag(&req, &etag) {
        debug!("Head of {} not modified", route);
        return Ok(HttpResponse::NotModified()
            .insert_header((ETAG, etag))
            .finish());
    }

    match document.head().render() {
        Ok(html) => Ok(HttpResponse::Ok()
            .insert_header((ETAG, etag))
            .content_type("text/html; charset=utf-8")
            .body(html)),
        Err(error) => {
            error!("Failed to render head of {}: {}", route, error);

            Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("Failed to render head: {}", error),
            }))
        }
    }
}

/// Resolved metadata of a route, without the shell defaults.
pub async fn meta(appstate: Data<Arc<AppState>>, slug: Path<String>) -> Result<HttpResponse> {
    let route = route_of(&slug);
    let (page, global) = load_sources(&appstate, &route).await;
    let meta = resolve(Sources::new(page.as_ref(), global.as_ref()));

    Ok(HttpResponse::Ok().json(MetaResponseV1 {
        fingerprint: meta.fingerprint(),
        title: meta.title,
        tags: meta
            .tags
            .into_iter()
            .map(|(tag, value)| TagResponseV1 { tag, value })
            .collect(),
        route,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::routes;
    use crate::api::testing::{appstate, RecordingMailer};
    use crate::entities::seo::{GlobalSeoRecord, Keywords, PageSeoRecord};
    use crate::entities::testing::mock;
    use actix_web::http::StatusCode;
    use actix_web::{test as actix_test, App};
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::Value;
    use sitecms::config::SiteConfig;

    fn page(slug: &str) -> PageSeoRecord {
        PageSeoRecord {
            id: 7,
            page_slug: slug.to_string(),
            page_name: "About".to_string(),
            meta_title: Some("About | Thahaseen Web".to_string()),
            meta_description: None,
            primary_keyword: None,
            secondary_keywords: Keywords::default(),
            canonical_url: None,
            og_title: None,
            og_description: None,
            og_image: None,
            twitter_title: None,
            twitter_description: None,
            twitter_image: None,
            schema_type: None,
            schema_data: None,
            no_index: true,
            no_follow: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    #[case("", "/")]
    #[case("about", "/about")]
    #[case("services/web/", "/services/web")]
    fn test_route_of(#[case] slug: &str, #[case] expected: &str) {
        assert_eq!(route_of(slug), expected);
    }

    #[actix_web::test]
    async fn test_head_without_records_keeps_shell() {
        let db = mock(|db| {
            db.append_query_results([Vec::<PageSeoRecord>::new()])
                .append_query_results([Vec::<GlobalSeoRecord>::new()])
        });
        let app = actix_test::init_service(
            App::new()
                .app_data(appstate(
                    SiteConfig::default(),
                    Some(db),
                    Arc::new(RecordingMailer::default()),
                ))
                .configure(routes),
        )
        .await;

        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/seo/v1/head/about").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = String::from_utf8(actix_test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.starts_with("<title>Thahaseen Web</title>"));
        assert_eq!(body.lines().count(), 2);
        assert!(!body.contains("og:"));
    }

    #[actix_web::test]
    async fn test_head_merges_page_record() {
        let db = mock(|db| {
            db.append_query_results([vec![page("/about")]])
                .append_query_results([Vec::<GlobalSeoRecord>::new()])
        });
        let app = actix_test::init_service(
            App::new()
                .app_data(appstate(
                    SiteConfig::default(),
                    Some(db),
                    Arc::new(RecordingMailer::default()),
                ))
                .configure(routes),
        )
        .await;

        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/seo/v1/head/about").to_request(),
        )
        .await;
        assert!(resp.headers().get(ETAG).is_some());

        let body = String::from_utf8(actix_test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.starts_with("<title>About | Thahaseen Web</title>"));
        assert!(body.contains(r#"<meta property="og:title" content="About | Thahaseen Web"/>"#));
        assert!(body.contains(r#"<meta name="twitter:title" content="About | Thahaseen Web"/>"#));
        assert!(body.contains(r#"<meta name="robots" content="noindex"/>"#));
    }

    #[actix_web::test]
    async fn test_head_honours_if_none_match() {
        let db = mock(|db| {
            db.append_query_results([vec![page("/about")]])
                .append_query_results([Vec::<GlobalSeoRecord>::new()])
        });
        let app = actix_test::init_service(
            App::new()
                .app_data(appstate(
                    SiteConfig::default(),
                    Some(db),
                    Arc::new(RecordingMailer::default()),
                ))
                .configure(routes),
        )
        .await;

        let first = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/seo/v1/head/about").to_request(),
        )
        .await;
        let etag = first.headers().get(ETAG).unwrap().clone();

        // both records are now served from the snapshot cache
        let second = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/seo/v1/head/about")
                .insert_header((IF_NONE_MATCH, etag))
                .to_request(),
        )
        .await;

        assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
    }

    #[actix_web::test]
    async fn test_meta_lists_resolved_tags() {
        let db = mock(|db| {
            db.append_query_results([vec![page("/about")]])
                .append_query_results([Vec::<GlobalSeoRecord>::new()])
        });
        let app = actix_test::init_service(
            App::new()
                .app_data(appstate(
                    SiteConfig::default(),
                    Some(db),
                    Arc::new(RecordingMailer::default()),
                ))
                .configure(routes),
        )
        .await;

        let body: Value = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::get().uri("/api/seo/v1/meta/about").to_request(),
        )
        .await;

        assert_eq!(body["route"], "/about");
        assert_eq!(body["title"], "About | Thahaseen Web");
        assert_eq!(body["fingerprint"].as_str().unwrap().len(), 64);
        assert!(body["tags"]
            .as_array()
            .unwrap()
            .iter()
            .any(|tag| tag["tag"]["key"] == "robots" && tag["value"] == "noindex"));
    }
}
