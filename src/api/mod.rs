use std::io::{Error, ErrorKind, Result as AppStateResult};
use std::sync::Arc;

use actix_web::http::{Method, StatusCode};
use actix_web::web::{
    delete, get, method, patch, post, put, resource, scope, Data, JsonConfig, ServiceConfig,
};
use actix_web::{HttpResponse, HttpResponseBuilder, Result as HttpResult};

use chrono::Utc;
use log::{error, warn};
use redis::Client as RedisClient;
use sea_orm::{Database, DatabaseConnection, DbErr};
use serde::{Deserialize, Serialize};

use sitecms::algorithm::{SnowflakeId, DEFAULT_EPOCH_MS};
use sitecms::cache::{MemorySnapshots, RedisSnapshots, Snapshots};
use sitecms::config::{SiteConfig, DEFAULT_RESEND_ENDPOINT};
use sitecms::mailer::{Mailer, ResendMailer};

use crate::entities;
use crate::entities::activity::{Journal, NewActivity};

pub mod admin;
pub mod content;
pub mod inquiry;
pub mod seo;

pub const CORS_ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct Status {
    status: bool,
    current: i64,
}

pub struct AppState {
    // @NOTE: site
    config: SiteConfig,

    // @NOTE: monitoring
    db: Option<Arc<DatabaseConnection>>,
    redis: Option<Arc<RedisSnapshots>>,

    // @NOTE: database models
    seo_entity: Option<entities::seo::Seo>,
    content_entity: Option<entities::content::Content>,
    inbox_entity: Option<entities::inbox::Inbox>,
    media_entity: Option<entities::media::Media>,
    users_entity: Option<entities::users::Users>,
    journal_entity: Option<Arc<Journal>>,

    // @NOTE: shared components
    mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub async fn new() -> AppStateResult<AppState> {
        let config = SiteConfig::from_env()?;

        // @NOTE: id generator
        let machine_id = std::env::var("MACHINE_ID")
            .unwrap_or_else(|_| "1".to_string())
            .parse::<u16>()
            .map_err(|_| Error::new(ErrorKind::InvalidInput, "Invalid MACHINE_ID"))?;
        let ids = Arc::new(
            SnowflakeId::new(machine_id, DEFAULT_EPOCH_MS)
                .map_err(|error| Error::new(ErrorKind::InvalidInput, error))?,
        );

        // @NOTE: snapshot cache
        let cache_ttl = std::env::var("CACHE_TTL")
            .unwrap_or_else(|_| "3600".to_string())
            .parse::<i64>()
            .map_err(|_| Error::new(ErrorKind::InvalidInput, "Invalid CACHE_TTL"))?;
        let redis_host = std::env::var("REDIS_HOST").unwrap_or_default();
        let redis_port = std::env::var("REDIS_PORT").unwrap_or_default();
        let redis_password = std::env::var("REDIS_PASSWORD").unwrap_or_default();
        let redis_username = std::env::var("REDIS_USERNAME").unwrap_or_default();

        let redis = if redis_host.is_empty() {
            None
        } else {
            match RedisClient::open(format!(
                "redis://{}:{}@{}:{}",
                redis_username, redis_password, redis_host, redis_port
            )) {
                Ok(client) => Some(Arc::new(RedisSnapshots::new(client, cache_ttl))),
                Err(error) => {
                    warn!("Invalid redis settings, fall back to in-process cache: {}", error);
                    None
                }
            }
        };
        let redis_alive = match &redis {
            Some(redis) => redis.ping().await,
            None => false,
        };
        let cache: Arc<dyn Snapshots> = match &redis {
            Some(redis) if redis_alive => redis.clone(),
            Some(_) => {
                warn!("Redis is unreachable, fall back to in-process cache");
                Arc::new(MemorySnapshots::new())
            }
            None => Arc::new(MemorySnapshots::new()),
        };

        // @NOTE: relational store
        let db = match std::env::var("DATABASE_DSN") {
            Ok(dsn) => Some(Arc::new(Database::connect(dsn).await.map_err(|error| {
                Error::new(
                    ErrorKind::InvalidInput,
                    format!("Failed to connect database: {}", error),
                )
            })?)),
            Err(_) => None,
        };

        // @NOTE: outgoing mail
        let mailer = Arc::new(ResendMailer::new(
            std::env::var("RESEND_ENDPOINT").unwrap_or_else(|_| DEFAULT_RESEND_ENDPOINT.to_string()),
            std::env::var("RESEND_API_KEY").unwrap_or_default(),
        ));

        let mut appstate = Self::from_parts(config, db, cache, ids, mailer);
        appstate.redis = if redis_alive { redis } else { None };
        Ok(appstate)
    }

    pub fn from_parts(
        config: SiteConfig,
        db: Option<Arc<DatabaseConnection>>,
        cache: Arc<dyn Snapshots>,
        ids: Arc<SnowflakeId>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let seo_entity = db
            .as_ref()
            .map(|db| entities::seo::Seo::new(db.clone(), cache.clone(), ids.clone()));
        let content_entity = db
            .as_ref()
            .map(|db| entities::content::Content::new(db.clone(), cache.clone(), ids.clone()));
        let inbox_entity = db
            .as_ref()
            .map(|db| entities::inbox::Inbox::new(db.clone(), cache.clone(), ids.clone()));
        let media_entity = db
            .as_ref()
            .map(|db| entities::media::Media::new(db.clone(), cache.clone(), ids.clone()));
        let users_entity = db
            .as_ref()
            .map(|db| entities::users::Users::new(db.clone(), cache.clone(), ids.clone()));
        let journal_entity = db
            .as_ref()
            .map(|db| Arc::new(Journal::new(db.clone(), cache.clone(), ids.clone())));

        Self {
            config,
            db,
            redis: None,
            seo_entity,
            content_entity,
            inbox_entity,
            media_entity,
            users_entity,
            journal_entity,
            mailer,
        }
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }

    pub fn seo_entity(&self) -> &Option<entities::seo::Seo> {
        &self.seo_entity
    }

    pub fn content_entity(&self) -> &Option<entities::content::Content> {
        &self.content_entity
    }

    pub fn inbox_entity(&self) -> &Option<entities::inbox::Inbox> {
        &self.inbox_entity
    }

    pub fn media_entity(&self) -> &Option<entities::media::Media> {
        &self.media_entity
    }

    pub fn users_entity(&self) -> &Option<entities::users::Users> {
        &self.users_entity
    }

    pub fn journal_entity(&self) -> &Option<Arc<Journal>> {
        &self.journal_entity
    }

    pub async fn ping(&self) -> bool {
        let redis_ok = match &self.redis {
            Some(redis) => redis.ping().await,
            None => true,
        };
        let db_ok = match &self.db {
            Some(client) => client.ping().await.is_ok(),
            None => true,
        };

        redis_ok && db_ok
    }
}

/// Append an audit row without waiting for it. A failed append is logged and
/// never reaches the caller.
pub fn record_activity(
    appstate: &AppState,
    actor: &str,
    action: String,
    entity_type: &str,
    entity_id: Option<String>,
) {
    if let Some(journal) = appstate.journal_entity().clone() {
        let entry = NewActivity {
            user_id: Some(actor.to_string()),
            action,
            entity_type: entity_type.to_string(),
            entity_id,
            details: None,
        };

        actix_rt::spawn(async move {
            if let Err(error) = journal.append(entry).await {
                error!("Failed to record activity: {}", error);
            }
        });
    }
}

pub fn not_implemented() -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: "Not implemented".to_string(),
    })
}

pub fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: message.into(),
    })
}

/// Map a store failure to its response: 404 for a missing row, 500 otherwise.
pub fn store_failure(context: &str, error: DbErr) -> HttpResponse {
    let message = format!("{}: {}", context, error);

    error!("{}", message);
    match error {
        DbErr::RecordNotFound(_) => HttpResponse::NotFound().json(ErrorResponse { error: message }),
        _ => HttpResponse::InternalServerError().json(ErrorResponse { error: message }),
    }
}

/// Response builder for the public edge routes, with permissive CORS.
pub fn edge_response(status: StatusCode) -> HttpResponseBuilder {
    let mut builder = HttpResponse::build(status);

    builder
        .insert_header(("Access-Control-Allow-Origin", "*"))
        .insert_header(("Access-Control-Allow-Headers", CORS_ALLOW_HEADERS));
    builder
}

pub async fn preflight() -> HttpResult<HttpResponse> {
    Ok(edge_response(StatusCode::OK).finish())
}

pub async fn health(appstate: Data<Arc<AppState>>) -> HttpResult<HttpResponse> {
    let current = Utc::now().timestamp();

    if appstate.ping().await {
        Ok(HttpResponse::Ok().json(Status {
            status: true,
            current,
        }))
    } else {
        Ok(HttpResponse::InternalServerError().json(Status {
            status: false,
            current,
        }))
    }
}

pub fn routes(cfg: &mut ServiceConfig) {
    cfg
        // @NOTE: health-check
        .route("/health", get().to(health))
        // @NOTE: edge documents
        .route("/sitemap.xml", get().to(seo::sitemap))
        .route("/sitemap.xml", method(Method::OPTIONS).to(preflight))
        .route("/robots.txt", get().to(seo::robots))
        .route("/robots.txt", method(Method::OPTIONS).to(preflight))
        // @NOTE: public APIs
        .service(
            scope("/api/seo")
                .route("/v1/head/{slug:.*}", get().to(seo::v1::head))
                .route("/v1/meta/{slug:.*}", get().to(seo::v1::meta)),
        )
        .service(
            scope("/api/content")
                .route(
                    "/v1/pages/{slug}/sections",
                    get().to(content::v1::list_sections),
                )
                .route("/v1/social-links", get().to(content::v1::list_social_links)),
        )
        .service(
            scope("/api/inquiry")
                .route("/v1/inquiries", post().to(inquiry::v1::submit))
                .service(
                    resource("/v1/notify")
                        .app_data(
                            JsonConfig::default().error_handler(inquiry::v1::notify_payload_error),
                        )
                        .route(post().to(inquiry::v1::notify))
                        .route(method(Method::OPTIONS).to(preflight)),
                ),
        )
        // @NOTE: admin APIs
        .service(
            scope("/api/admin")
                .route("/v1/seo/pages", get().to(admin::v1::list_page_seo))
                .route("/v1/seo/pages/{id}", patch().to(admin::v1::update_page_seo))
                .route("/v1/seo/global", get().to(admin::v1::get_global_seo))
                .route("/v1/seo/global/{id}", patch().to(admin::v1::update_global_seo))
                .route("/v1/seo/sitemap", get().to(admin::v1::list_sitemap_entries))
                .route("/v1/seo/sitemap", post().to(admin::v1::create_sitemap_entry))
                .route(
                    "/v1/seo/sitemap/{id}",
                    patch().to(admin::v1::update_sitemap_entry),
                )
                .route(
                    "/v1/seo/sitemap/{id}",
                    delete().to(admin::v1::delete_sitemap_entry),
                )
                .route("/v1/content/sections", get().to(admin::v1::list_sections))
                .route(
                    "/v1/content/sections/{id}",
                    patch().to(admin::v1::update_section),
                )
                .route("/v1/social-links", get().to(admin::v1::list_social_links))
                .route("/v1/social-links", post().to(admin::v1::create_social_link))
                .route(
                    "/v1/social-links/{id}",
                    patch().to(admin::v1::update_social_link),
                )
                .route(
                    "/v1/social-links/{id}",
                    delete().to(admin::v1::delete_social_link),
                )
                .route("/v1/inquiries", get().to(admin::v1::list_inquiries))
                .route("/v1/inquiries/{id}", patch().to(admin::v1::mark_inquiry))
                .route("/v1/inquiries/{id}", delete().to(admin::v1::delete_inquiry))
                .route("/v1/media", get().to(admin::v1::list_media))
                .route("/v1/media", post().to(admin::v1::register_media))
                .route("/v1/media/{id}", patch().to(admin::v1::update_media))
                .route("/v1/media/{id}", delete().to(admin::v1::delete_media))
                .route("/v1/activity", get().to(admin::v1::list_activity))
                .route("/v1/settings", get().to(admin::v1::list_settings))
                .route("/v1/settings/{id}", patch().to(admin::v1::update_setting))
                .route("/v1/users/me/role", get().to(admin::v1::get_my_role))
                .route("/v1/users/roles", get().to(admin::v1::list_roles))
                .route("/v1/users/roles/{user_id}", put().to(admin::v1::set_role))
                .route("/v1/users/roles/{user_id}", delete().to(admin::v1::remove_role))
                .route("/v1/users/invitations", get().to(admin::v1::list_invitations))
                .route("/v1/users/invitations", post().to(admin::v1::invite))
                .route(
                    "/v1/users/invitations/{id}",
                    delete().to(admin::v1::cancel_invitation),
                )
                .route("/v1/dashboard", get().to(admin::v1::dashboard)),
        );
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use actix_web::web::Data;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use sea_orm::DatabaseConnection;
    use serde_json::{json, Value};

    use sitecms::cache::MemorySnapshots;
    use sitecms::config::SiteConfig;
    use sitecms::mailer::{Email, Mailer};

    use super::AppState;
    use crate::entities::testing::ids;

    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<Email>>,
        pub failing: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &Email) -> Result<Value> {
            if self.failing {
                return Err(anyhow!("provider down"));
            }

            let mut sent = self.sent.lock().unwrap();
            sent.push(email.clone());
            Ok(json!({ "id": format!("mail-{}", sent.len()) }))
        }
    }

    pub fn appstate(
        config: SiteConfig,
        db: Option<Arc<DatabaseConnection>>,
        mailer: Arc<RecordingMailer>,
    ) -> Data<Arc<AppState>> {
        Data::new(Arc::new(AppState::from_parts(
            config,
            db,
            Arc::new(MemorySnapshots::new()),
            ids(),
            mailer,
        )))
    }
}
