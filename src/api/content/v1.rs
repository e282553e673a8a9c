use std::sync::Arc;

use actix_web::web::{Data, Path};
use actix_web::{HttpResponse, Result};

use crate::api::{not_implemented, store_failure, AppState};

/// Enabled sections of one page, in display order.
pub async fn list_sections(
    appstate: Data<Arc<AppState>>,
    slug: Path<String>,
) -> Result<HttpResponse> {
    let content = match appstate.content_entity() {
        Some(content) => content,
        None => return Ok(not_implemented()),
    };

    match content.list_enabled_sections(&slug).await {
        Ok(sections) => Ok(HttpResponse::Ok().json(sections)),
        Err(error) => Ok(store_failure("Failed to fetch page content", error)),
    }
}

pub async fn list_social_links(appstate: Data<Arc<AppState>>) -> Result<HttpResponse> {
    let content = match appstate.content_entity() {
        Some(content) => content,
        None => return Ok(not_implemented()),
    };

    match content.list_social_links(true).await {
        Ok(links) => Ok(HttpResponse::Ok().json(links)),
        Err(error) => Ok(store_failure("Failed to fetch social links", error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::routes;
    use crate::api::testing::{appstate, RecordingMailer};
    use crate::entities::content::Section;
    use crate::entities::testing::mock;
    use actix_web::http::StatusCode;
    use actix_web::{test as actix_test, App};
    use chrono::Utc;
    use sea_orm::DbErr;
    use serde_json::{json, Value};
    use sitecms::config::SiteConfig;

    fn hero() -> Section {
        Section {
            id: 3,
            page_slug: "home".to_string(),
            section_name: "hero".to_string(),
            content: json!({"headline": "Websites that convert"}),
            is_enabled: true,
            display_order: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[actix_web::test]
    async fn test_list_sections_of_page() {
        let db = mock(|db| db.append_query_results([vec![hero()]]));
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
            actix_test::TestRequest::get()
                .uri("/api/content/v1/pages/home/sections")
                .to_request(),
        )
        .await;

        assert_eq!(body[0]["section_name"], "hero");
        assert_eq!(body[0]["content"]["headline"], "Websites that convert");
    }

    #[actix_web::test]
    async fn test_social_links_store_failure() {
        let db = mock(|db| db.append_query_errors([DbErr::Custom("timeout".to_string())]));
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
            actix_test::TestRequest::get()
                .uri("/api/content/v1/social-links")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = actix_test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("timeout"));
    }

    #[actix_web::test]
    async fn test_social_links_without_database() {
        let app = actix_test::init_service(
            App::new()
                .app_data(appstate(
                    SiteConfig::default(),
                    None,
                    Arc::new(RecordingMailer::default()),
                ))
                .configure(routes),
        )
        .await;

        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/content/v1/social-links")
                .to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
