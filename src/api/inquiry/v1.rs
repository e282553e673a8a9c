use std::sync::Arc;

use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::web::{Data, Json};
use actix_web::{Error, HttpRequest, HttpResponse, Result};

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use sitecms::mailer;

use crate::api::{bad_request, edge_response, not_implemented, store_failure, AppState, ErrorResponse};
use crate::entities::inbox::{Inquiry, NewInquiry};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct InquiryInputV1 {
    name: String,
    email: String,

    #[serde(default)]
    phone: Option<String>,

    message: String,
}

#[derive(Serialize, Clone, Debug)]
pub struct InquiryResponseV1 {
    inquiry: Inquiry,
    notified: bool,
}

/// Store a contact-form submission, then alert the owner when an admin
/// address is configured. Mail failures are logged and reported through
/// `notified` only.
pub async fn submit(
    appstate: Data<Arc<AppState>>,
    input: Json<InquiryInputV1>,
) -> Result<HttpResponse> {
    let input = input.into_inner();
    let name = input.name.trim().to_string();
    let email = input.email.trim().to_string();
    let message = input.message.trim().to_string();

    if name.is_empty() || email.is_empty() || message.is_empty() {
        return Ok(bad_request("Name, email and message are required"));
    }

    let inbox = match appstate.inbox_entity() {
        Some(inbox) => inbox,
        None => return Ok(not_implemented()),
    };

    let inquiry = match inbox
        .create_inquiry(NewInquiry {
            name: name.clone(),
            email: email.clone(),
            phone: input.phone.clone(),
            message: message.clone(),
        })
        .await
    {
        Ok(inquiry) => inquiry,
        Err(error) => return Ok(store_failure("Failed to store inquiry", error)),
    };

    let notified = match &appstate.config().admin_email {
        Some(admin_email) => {
            let notification = mailer::Inquiry {
                name,
                email,
                phone: input.phone,
                message,
                admin_email: admin_email.clone(),
            };

            match mailer::notify(appstate.mailer(), appstate.config(), &notification).await {
                Ok(_) => true,
                Err(error) => {
                    error!("Failed to notify inquiry {}: {}", inquiry.id, error);
                    false
                }
            }
        }
        None => false,
    };

    info!("Stored inquiry {} (notified: {})", inquiry.id, notified);
    Ok(HttpResponse::Ok().json(InquiryResponseV1 { inquiry, notified }))
}

/// Send the owner alert and the visitor acknowledgment for an inquiry
/// collected elsewhere.
pub async fn notify(
    appstate: Data<Arc<AppState>>,
    input: Json<mailer::Inquiry>,
) -> Result<HttpResponse> {
    match mailer::notify(appstate.mailer(), appstate.config(), &input).await {
        Ok(delivery) => Ok(edge_response(StatusCode::OK).json(delivery)),
        Err(error) => {
            error!("Failed to send inquiry notification: {}", error);

            Ok(
                edge_response(StatusCode::INTERNAL_SERVER_ERROR).json(ErrorResponse {
                    error: error.to_string(),
                }),
            )
        }
    }
}

/// Unreadable notification bodies answer like a failed send: 500 with an
/// error message and the edge CORS headers.
pub fn notify_payload_error(error: JsonPayloadError, _req: &HttpRequest) -> Error {
    let message = format!("Invalid notification payload: {}", error);

    warn!("{}", message);
    InternalError::from_response(
        error,
        edge_response(StatusCode::INTERNAL_SERVER_ERROR).json(ErrorResponse { error: message }),
    )
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::routes;
    use crate::api::testing::{appstate, RecordingMailer};
    use crate::entities::testing::mock;
    use actix_web::{test as actix_test, App};
    use chrono::Utc;
    use serde_json::{json, Value};
    use sitecms::config::SiteConfig;

    fn stored() -> Inquiry {
        Inquiry {
            id: 21,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            message: "Need a landing page".to_string(),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    fn with_admin() -> SiteConfig {
        SiteConfig {
            admin_email: Some("owner@example.com".to_string()),
            ..Default::default()
        }
    }

    #[actix_web::test]
    async fn test_submit_stores_and_notifies() {
        let db = mock(|db| db.append_query_results([vec![stored()]]));
        let mailer = Arc::new(RecordingMailer::default());
        let app = actix_test::init_service(
            App::new()
                .app_data(appstate(with_admin(), Some(db), mailer.clone()))
                .configure(routes),
        )
        .await;

        let body: Value = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/inquiry/v1/inquiries")
                .set_json(json!({
                    "name": " Ada ",
                    "email": "ada@example.com",
                    "message": "Need a landing page",
                }))
                .to_request(),
        )
        .await;

        assert_eq!(body["inquiry"]["id"], 21);
        assert_eq!(body["notified"], true);

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, vec!["owner@example.com".to_string()]);
        assert_eq!(sent[0].subject, "New Contact Inquiry from Ada");
        assert_eq!(sent[1].to, vec!["ada@example.com".to_string()]);
    }

    #[actix_web::test]
    async fn test_submit_survives_mail_failure() {
        let db = mock(|db| db.append_query_results([vec![stored()]]));
        let mailer = Arc::new(RecordingMailer {
            failing: true,
            ..Default::default()
        });
        let app = actix_test::init_service(
            App::new()
                .app_data(appstate(with_admin(), Some(db), mailer))
                .configure(routes),
        )
        .await;

        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/inquiry/v1/inquiries")
                .set_json(json!({
                    "name": "Ada",
                    "email": "ada@example.com",
                    "message": "Need a landing page",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["notified"], false);
    }

    #[actix_web::test]
    async fn test_submit_rejects_blank_fields() {
        let mailer = Arc::new(RecordingMailer::default());
        let app = actix_test::init_service(
            App::new()
                .app_data(appstate(with_admin(), None, mailer.clone()))
                .configure(routes),
        )
        .await;

        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/inquiry/v1/inquiries")
                .set_json(json!({
                    "name": "Ada",
                    "email": "   ",
                    "message": "Need a landing page",
                }))
                .to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_notify_returns_delivery() {
        let mailer = Arc::new(RecordingMailer::default());
        let app = actix_test::init_service(
            App::new()
                .app_data(appstate(SiteConfig::default(), None, mailer))
                .configure(routes),
        )
        .await;

        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/inquiry/v1/notify")
                .set_json(json!({
                    "name": "Ada",
                    "email": "ada@example.com",
                    "phone": "+1 555 0100",
                    "message": "Hello",
                    "adminEmail": "owner@example.com",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );

        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["adminEmail"]["id"], "mail-1");
        assert_eq!(body["userEmail"]["id"], "mail-2");
    }

    #[actix_web::test]
    async fn test_notify_reports_provider_failure() {
        let mailer = Arc::new(RecordingMailer {
            failing: true,
            ..Default::default()
        });
        let app = actix_test::init_service(
            App::new()
                .app_data(appstate(SiteConfig::default(), None, mailer))
                .configure(routes),
        )
        .await;

        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/inquiry/v1/notify")
                .set_json(json!({
                    "name": "Ada",
                    "email": "ada@example.com",
                    "message": "Hello",
                    "adminEmail": "owner@example.com",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "provider down");
    }

    #[actix_web::test]
    async fn test_notify_rejects_malformed_body_with_cors() {
        let mailer = Arc::new(RecordingMailer::default());
        let app = actix_test::init_service(
            App::new()
                .app_data(appstate(SiteConfig::default(), None, mailer.clone()))
                .configure(routes),
        )
        .await;

        let resp = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/inquiry/v1/notify")
                .insert_header(("content-type", "application/json"))
                .set_payload("{\"name\": ")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );

        let body: Value = actix_test::read_body_json(resp).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid notification payload"));
        assert!(mailer.sent.lock().unwrap().is_empty());
    }
}
