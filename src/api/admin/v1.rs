use std::sync::Arc;

use actix_web::web::{Data, Json, Path};
use actix_web::{HttpResponse, Result};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AdminHeaders;
use crate::api::{
    bad_request, not_implemented, record_activity, store_failure, AppState, ErrorResponse,
};
use crate::entities::content::{NewSocialLink, SectionPatch, SocialLinkPatch};
use crate::entities::media::NewMediaFile;
use crate::entities::seo::{GlobalSeoPatch, NewSitemapEntry, PageSeoPatch, SitemapEntryPatch};
use crate::entities::users::{NewInvitation, Role};

macro_rules! entity {
    ($entity:expr) => {
        match $entity {
            Some(entity) => entity,
            None => return Ok(not_implemented()),
        }
    };
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MarkInquiryInputV1 {
    is_read: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AltTextInputV1 {
    #[serde(default)]
    alt_text: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SettingInputV1 {
    setting_value: Value,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RoleInputV1 {
    role: Role,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RoleResponseV1 {
    user_id: String,
    role: Option<Role>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponseV1 {
    total_inquiries: u64,
    unread_inquiries: u64,
    total_pages: u64,
    total_media: u64,
}

fn valid_priority(priority: Option<f64>) -> bool {
    priority.map_or(true, |priority| (0.0..=1.0).contains(&priority))
}

/// Role-changing operations are reserved to admins.
async fn require_admin(appstate: &AppState, headers: &AdminHeaders) -> Option<HttpResponse> {
    let users = match appstate.users_entity() {
        Some(users) => users,
        None => return Some(not_implemented()),
    };

    match users.get_role(headers.user_id()).await {
        Ok(Some(Role::Admin)) => None,
        Ok(_) => Some(HttpResponse::Forbidden().json(ErrorResponse {
            error: "Only admins can manage users".to_string(),
        })),
        Err(error) => Some(store_failure("Failed to fetch role", error)),
    }
}

// SEO

pub async fn list_page_seo(
    appstate: Data<Arc<AppState>>,
    _headers: AdminHeaders,
) -> Result<HttpResponse> {
    let seo = entity!(appstate.seo_entity());

    match seo.list_page_seo().await {
        Ok(pages) => Ok(HttpResponse::Ok().json(pages)),
        Err(error) => Ok(store_failure("Failed to fetch SEO settings", error)),
    }
}

pub async fn update_page_seo(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
    id: Path<i64>,
    patch: Json<PageSeoPatch>,
) -> Result<HttpResponse> {
    let seo = entity!(appstate.seo_entity());

    match seo.update_page_seo(*id, patch.into_inner()).await {
        Ok(page) => {
            record_activity(
                &appstate,
                headers.user_id(),
                format!("Updated SEO for {}", page.page_name),
                "seo_settings",
                Some(page.id.to_string()),
            );
            Ok(HttpResponse::Ok().json(page))
        }
        Err(error) => Ok(store_failure("Failed to update SEO settings", error)),
    }
}

pub async fn get_global_seo(
    appstate: Data<Arc<AppState>>,
    _headers: AdminHeaders,
) -> Result<HttpResponse> {
    let seo = entity!(appstate.seo_entity());

    match seo.get_global_seo().await {
        Ok(global) => Ok(HttpResponse::Ok().json(global)),
        Err(error) => Ok(store_failure("Failed to fetch global SEO settings", error)),
    }
}

pub async fn update_global_seo(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
    id: Path<i64>,
    patch: Json<GlobalSeoPatch>,
) -> Result<HttpResponse> {
    let seo = entity!(appstate.seo_entity());

    match seo.update_global_seo(*id, patch.into_inner()).await {
        Ok(global) => {
            record_activity(
                &appstate,
                headers.user_id(),
                "Updated global SEO settings".to_string(),
                "global_seo_settings",
                Some(global.id.to_string()),
            );
            Ok(HttpResponse::Ok().json(global))
        }
        Err(error) => Ok(store_failure("Failed to update global SEO settings", error)),
    }
}

pub async fn list_sitemap_entries(
    appstate: Data<Arc<AppState>>,
    _headers: AdminHeaders,
) -> Result<HttpResponse> {
    let seo = entity!(appstate.seo_entity());

    match seo.list_sitemap_entries().await {
        Ok(entries) => Ok(HttpResponse::Ok().json(entries)),
        Err(error) => Ok(store_failure("Failed to fetch sitemap entries", error)),
    }
}

pub async fn create_sitemap_entry(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
    entry: Json<NewSitemapEntry>,
) -> Result<HttpResponse> {
    let entry = entry.into_inner();

    if entry.url.trim().is_empty() {
        return Ok(bad_request("Url is required"));
    }
    if !valid_priority(entry.priority) {
        return Ok(bad_request("Priority must be between 0 and 1"));
    }

    let seo = entity!(appstate.seo_entity());

    match seo.create_sitemap_entry(entry).await {
        Ok(entry) => {
            record_activity(
                &appstate,
                headers.user_id(),
                format!("Added {} to sitemap", entry.url),
                "sitemap_entry",
                Some(entry.id.to_string()),
            );
            Ok(HttpResponse::Ok().json(entry))
        }
        Err(error) => Ok(store_failure("Failed to create sitemap entry", error)),
    }
}

pub async fn update_sitemap_entry(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
    id: Path<i64>,
    patch: Json<SitemapEntryPatch>,
) -> Result<HttpResponse> {
    let patch = patch.into_inner();

    if !valid_priority(patch.priority.flatten()) {
        return Ok(bad_request("Priority must be between 0 and 1"));
    }
    if patch.url.as_deref().is_some_and(|url| url.trim().is_empty()) {
        return Ok(bad_request("Url must not be empty"));
    }

    let seo = entity!(appstate.seo_entity());

    match seo.update_sitemap_entry(*id, patch).await {
        Ok(entry) => {
            record_activity(
                &appstate,
                headers.user_id(),
                format!("Updated sitemap entry {}", entry.url),
                "sitemap_entry",
                Some(entry.id.to_string()),
            );
            Ok(HttpResponse::Ok().json(entry))
        }
        Err(error) => Ok(store_failure("Failed to update sitemap entry", error)),
    }
}

pub async fn delete_sitemap_entry(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
    id: Path<i64>,
) -> Result<HttpResponse> {
    let seo = entity!(appstate.seo_entity());

    match seo.delete_sitemap_entry(*id).await {
        Ok(()) => {
            record_activity(
                &appstate,
                headers.user_id(),
                "Deleted sitemap entry".to_string(),
                "sitemap_entry",
                Some(id.into_inner().to_string()),
            );
            Ok(HttpResponse::NoContent().finish())
        }
        Err(error) => Ok(store_failure("Failed to delete sitemap entry", error)),
    }
}

// Content

pub async fn list_sections(
    appstate: Data<Arc<AppState>>,
    _headers: AdminHeaders,
) -> Result<HttpResponse> {
    let content = entity!(appstate.content_entity());

    match content.list_sections().await {
        Ok(sections) => Ok(HttpResponse::Ok().json(sections)),
        Err(error) => Ok(store_failure("Failed to fetch page content", error)),
    }
}

pub async fn update_section(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
    id: Path<i64>,
    patch: Json<SectionPatch>,
) -> Result<HttpResponse> {
    let content = entity!(appstate.content_entity());

    match content.update_section(*id, patch.into_inner()).await {
        Ok(section) => {
            record_activity(
                &appstate,
                headers.user_id(),
                format!("Updated {} on {}", section.section_name, section.page_slug),
                "page_content",
                Some(section.id.to_string()),
            );
            Ok(HttpResponse::Ok().json(section))
        }
        Err(error) => Ok(store_failure("Failed to update page content", error)),
    }
}

pub async fn list_social_links(
    appstate: Data<Arc<AppState>>,
    _headers: AdminHeaders,
) -> Result<HttpResponse> {
    let content = entity!(appstate.content_entity());

    match content.list_social_links(false).await {
        Ok(links) => Ok(HttpResponse::Ok().json(links)),
        Err(error) => Ok(store_failure("Failed to fetch social links", error)),
    }
}

pub async fn create_social_link(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
    link: Json<NewSocialLink>,
) -> Result<HttpResponse> {
    let link = link.into_inner();

    if link.platform.trim().is_empty() || link.url.trim().is_empty() {
        return Ok(bad_request("Platform and url are required"));
    }

    let content = entity!(appstate.content_entity());

    match content.create_social_link(link).await {
        Ok(link) => {
            record_activity(
                &appstate,
                headers.user_id(),
                format!("Added {} link", link.platform),
                "social_link",
                Some(link.id.to_string()),
            );
            Ok(HttpResponse::Ok().json(link))
        }
        Err(error) => Ok(store_failure("Failed to create social link", error)),
    }
}

pub async fn update_social_link(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
    id: Path<i64>,
    patch: Json<SocialLinkPatch>,
) -> Result<HttpResponse> {
    let content = entity!(appstate.content_entity());

    match content.update_social_link(*id, patch.into_inner()).await {
        Ok(link) => {
            record_activity(
                &appstate,
                headers.user_id(),
                format!("Updated {} link", link.platform),
                "social_link",
                Some(link.id.to_string()),
            );
            Ok(HttpResponse::Ok().json(link))
        }
        Err(error) => Ok(store_failure("Failed to update social link", error)),
    }
}

pub async fn delete_social_link(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
    id: Path<i64>,
) -> Result<HttpResponse> {
    let content = entity!(appstate.content_entity());

    match content.delete_social_link(*id).await {
        Ok(()) => {
            record_activity(
                &appstate,
                headers.user_id(),
                "Deleted social link".to_string(),
                "social_link",
                Some(id.into_inner().to_string()),
            );
            Ok(HttpResponse::NoContent().finish())
        }
        Err(error) => Ok(store_failure("Failed to delete social link", error)),
    }
}

// Inquiries

pub async fn list_inquiries(
    appstate: Data<Arc<AppState>>,
    _headers: AdminHeaders,
) -> Result<HttpResponse> {
    let inbox = entity!(appstate.inbox_entity());

    match inbox.list_inquiries().await {
        Ok(inquiries) => Ok(HttpResponse::Ok().json(inquiries)),
        Err(error) => Ok(store_failure("Failed to fetch inquiries", error)),
    }
}

pub async fn mark_inquiry(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
    id: Path<i64>,
    input: Json<MarkInquiryInputV1>,
) -> Result<HttpResponse> {
    let inbox = entity!(appstate.inbox_entity());

    match inbox.mark_inquiry(*id, input.is_read).await {
        Ok(inquiry) => {
            let action = if inquiry.is_read {
                "Marked inquiry as read"
            } else {
                "Marked inquiry as unread"
            };

            record_activity(
                &appstate,
                headers.user_id(),
                action.to_string(),
                "inquiry",
                Some(inquiry.id.to_string()),
            );
            Ok(HttpResponse::Ok().json(inquiry))
        }
        Err(error) => Ok(store_failure("Failed to update inquiry", error)),
    }
}

pub async fn delete_inquiry(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
    id: Path<i64>,
) -> Result<HttpResponse> {
    let inbox = entity!(appstate.inbox_entity());

    match inbox.delete_inquiry(*id).await {
        Ok(()) => {
            record_activity(
                &appstate,
                headers.user_id(),
                "Deleted inquiry".to_string(),
                "inquiry",
                Some(id.into_inner().to_string()),
            );
            Ok(HttpResponse::NoContent().finish())
        }
        Err(error) => Ok(store_failure("Failed to delete inquiry", error)),
    }
}

// Media

pub async fn list_media(
    appstate: Data<Arc<AppState>>,
    _headers: AdminHeaders,
) -> Result<HttpResponse> {
    let media = entity!(appstate.media_entity());

    match media.list_media().await {
        Ok(files) => Ok(HttpResponse::Ok().json(files)),
        Err(error) => Ok(store_failure("Failed to fetch media files", error)),
    }
}

pub async fn register_media(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
    file: Json<NewMediaFile>,
) -> Result<HttpResponse> {
    let file = file.into_inner();

    if file.file_name.trim().is_empty() || file.file_url.trim().is_empty() {
        return Ok(bad_request("File name and url are required"));
    }

    let media = entity!(appstate.media_entity());

    match media.register_media(file, headers.user_id()).await {
        Ok(file) => {
            record_activity(
                &appstate,
                headers.user_id(),
                format!("Uploaded {}", file.file_name),
                "media",
                Some(file.id.to_string()),
            );
            Ok(HttpResponse::Ok().json(file))
        }
        Err(error) => Ok(store_failure("Failed to register media file", error)),
    }
}

pub async fn update_media(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
    id: Path<i64>,
    input: Json<AltTextInputV1>,
) -> Result<HttpResponse> {
    let media = entity!(appstate.media_entity());

    match media.update_alt_text(*id, input.into_inner().alt_text).await {
        Ok(file) => {
            record_activity(
                &appstate,
                headers.user_id(),
                format!("Updated alt text of {}", file.file_name),
                "media",
                Some(file.id.to_string()),
            );
            Ok(HttpResponse::Ok().json(file))
        }
        Err(error) => Ok(store_failure("Failed to update media file", error)),
    }
}

pub async fn delete_media(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
    id: Path<i64>,
) -> Result<HttpResponse> {
    let media = entity!(appstate.media_entity());

    match media.delete_media(*id).await {
        Ok(()) => {
            record_activity(
                &appstate,
                headers.user_id(),
                "Deleted media file".to_string(),
                "media",
                Some(id.into_inner().to_string()),
            );
            Ok(HttpResponse::NoContent().finish())
        }
        Err(error) => Ok(store_failure("Failed to delete media file", error)),
    }
}

// Activity & settings

pub async fn list_activity(
    appstate: Data<Arc<AppState>>,
    _headers: AdminHeaders,
) -> Result<HttpResponse> {
    let journal = entity!(appstate.journal_entity());

    match journal.list_recent().await {
        Ok(entries) => Ok(HttpResponse::Ok().json(entries)),
        Err(error) => Ok(store_failure("Failed to fetch activity log", error)),
    }
}

pub async fn list_settings(
    appstate: Data<Arc<AppState>>,
    _headers: AdminHeaders,
) -> Result<HttpResponse> {
    let content = entity!(appstate.content_entity());

    match content.list_settings().await {
        Ok(settings) => Ok(HttpResponse::Ok().json(settings)),
        Err(error) => Ok(store_failure("Failed to fetch settings", error)),
    }
}

pub async fn update_setting(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
    id: Path<i64>,
    input: Json<SettingInputV1>,
) -> Result<HttpResponse> {
    let content = entity!(appstate.content_entity());

    match content
        .update_setting(*id, input.into_inner().setting_value)
        .await
    {
        Ok(setting) => {
            record_activity(
                &appstate,
                headers.user_id(),
                format!("Updated {} settings", setting.setting_key),
                "site_settings",
                Some(setting.id.to_string()),
            );
            Ok(HttpResponse::Ok().json(setting))
        }
        Err(error) => Ok(store_failure("Failed to update setting", error)),
    }
}

// Users

pub async fn get_my_role(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
) -> Result<HttpResponse> {
    let users = entity!(appstate.users_entity());

    match users.get_role(headers.user_id()).await {
        Ok(role) => Ok(HttpResponse::Ok().json(RoleResponseV1 {
            user_id: headers.user_id().to_string(),
            role,
        })),
        Err(error) => Ok(store_failure("Failed to fetch role", error)),
    }
}

pub async fn list_roles(
    appstate: Data<Arc<AppState>>,
    _headers: AdminHeaders,
) -> Result<HttpResponse> {
    let users = entity!(appstate.users_entity());

    match users.list_roles().await {
        Ok(roles) => Ok(HttpResponse::Ok().json(roles)),
        Err(error) => Ok(store_failure("Failed to fetch roles", error)),
    }
}

pub async fn set_role(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
    user_id: Path<String>,
    input: Json<RoleInputV1>,
) -> Result<HttpResponse> {
    if let Some(denied) = require_admin(&appstate, &headers).await {
        return Ok(denied);
    }

    let users = entity!(appstate.users_entity());

    match users.set_role(&user_id, input.role).await {
        Ok(role) => {
            record_activity(
                &appstate,
                headers.user_id(),
                format!("Updated role for {} to {}", role.user_id, role.role.as_str()),
                "user_role",
                Some(role.user_id.clone()),
            );
            Ok(HttpResponse::Ok().json(role))
        }
        Err(error) => Ok(store_failure("Failed to update role", error)),
    }
}

pub async fn remove_role(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
    user_id: Path<String>,
) -> Result<HttpResponse> {
    if let Some(denied) = require_admin(&appstate, &headers).await {
        return Ok(denied);
    }

    let users = entity!(appstate.users_entity());

    match users.remove_role(&user_id).await {
        Ok(()) => {
            record_activity(
                &appstate,
                headers.user_id(),
                "Removed user role".to_string(),
                "user_role",
                Some(user_id.into_inner()),
            );
            Ok(HttpResponse::NoContent().finish())
        }
        Err(error) => Ok(store_failure("Failed to remove role", error)),
    }
}

pub async fn list_invitations(
    appstate: Data<Arc<AppState>>,
    _headers: AdminHeaders,
) -> Result<HttpResponse> {
    let users = entity!(appstate.users_entity());

    match users.list_pending_invitations().await {
        Ok(invitations) => Ok(HttpResponse::Ok().json(invitations)),
        Err(error) => Ok(store_failure("Failed to fetch invitations", error)),
    }
}

pub async fn invite(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
    invitation: Json<NewInvitation>,
) -> Result<HttpResponse> {
    let invitation = invitation.into_inner();

    if invitation.email.trim().is_empty() {
        return Ok(bad_request("Email is required"));
    }
    if let Some(denied) = require_admin(&appstate, &headers).await {
        return Ok(denied);
    }

    let users = entity!(appstate.users_entity());

    match users.invite(invitation, headers.user_id()).await {
        Ok(invitation) => {
            record_activity(
                &appstate,
                headers.user_id(),
                format!("Invited {} as {}", invitation.email, invitation.role.as_str()),
                "user_invitation",
                Some(invitation.id.to_string()),
            );
            Ok(HttpResponse::Ok().json(invitation))
        }
        Err(error) => Ok(store_failure("Failed to create invitation", error)),
    }
}

pub async fn cancel_invitation(
    appstate: Data<Arc<AppState>>,
    headers: AdminHeaders,
    id: Path<i64>,
) -> Result<HttpResponse> {
    if let Some(denied) = require_admin(&appstate, &headers).await {
        return Ok(denied);
    }

    let users = entity!(appstate.users_entity());

    match users.cancel_invitation(*id).await {
        Ok(()) => {
            record_activity(
                &appstate,
                headers.user_id(),
                "Cancelled invitation".to_string(),
                "user_invitation",
                Some(id.into_inner().to_string()),
            );
            Ok(HttpResponse::NoContent().finish())
        }
        Err(error) => Ok(store_failure("Failed to cancel invitation", error)),
    }
}

// Dashboard

pub async fn dashboard(
    appstate: Data<Arc<AppState>>,
    _headers: AdminHeaders,
) -> Result<HttpResponse> {
    let inbox = entity!(appstate.inbox_entity());
    let content = entity!(appstate.content_entity());
    let media = entity!(appstate.media_entity());

    let (inquiries, pages, files) = futures::join!(
        inbox.count_inquiries(),
        content.count_sections(),
        media.count_media(),
    );

    match (inquiries, pages, files) {
        (Ok((total_inquiries, unread_inquiries)), Ok(total_pages), Ok(total_media)) => {
            Ok(HttpResponse::Ok().json(DashboardResponseV1 {
                total_inquiries,
                unread_inquiries,
                total_pages,
                total_media,
            }))
        }
        (Err(error), _, _) | (_, Err(error), _) | (_, _, Err(error)) => {
            Ok(store_failure("Failed to fetch dashboard stats", error))
        }
    }
}
