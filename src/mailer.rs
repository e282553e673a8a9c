use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::info;
use quick_xml::escape::escape;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::SiteConfig;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Email {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver `email` and return the provider's receipt.
    async fn send(&self, email: &Email) -> Result<Value>;
}

/// Transactional mail through the Resend HTTP API.
pub struct ResendMailer {
    client: HttpClient,
    endpoint: String,
    api_key: String,
}

impl ResendMailer {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            client: HttpClient::default(),
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &Email) -> Result<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(anyhow!("Failed to send email ({}): {}", status, error_text));
        }

        Ok(response.json::<Value>().await?)
    }
}

/// Payload of a contact-form notification.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub name: String,
    pub email: String,

    #[serde(default)]
    pub phone: Option<String>,

    pub message: String,
    pub admin_email: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub success: bool,
    pub admin_email: Value,
    pub user_email: Value,
}

fn html(text: &str) -> String {
    escape(text).replace("\r\n", "\n").replace('\n', "<br>")
}

const STYLE: &str = "body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; } \
.container { max-width: 600px; margin: 0 auto; padding: 20px; } \
.header { background: linear-gradient(135deg, #6366f1, #8b5cf6); color: white; padding: 30px; border-radius: 10px 10px 0 0; } \
.content { background: #f8f9fa; padding: 30px; border-radius: 0 0 10px 10px; } \
.label { font-weight: 600; color: #6366f1; font-size: 14px; text-transform: uppercase; } \
.value { margin-top: 5px; padding: 15px; background: white; border-radius: 8px; border-left: 4px solid #6366f1; } \
.footer { text-align: center; margin-top: 20px; color: #666; font-size: 12px; }";

fn field(label: &str, value: &str) -> String {
    format!(
        "<div class=\"field\"><div class=\"label\">{}</div><div class=\"value\">{}</div></div>",
        label, value
    )
}

fn page(header: &str, content: &str, footer: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><style>{}</style></head><body><div class=\"container\">\
<div class=\"header\">{}</div><div class=\"content\">{}</div>\
<div class=\"footer\"><p>{}</p></div></div></body></html>",
        STYLE, header, content, footer
    )
}

/// Alert sent to the site owner.
pub fn admin_alert(config: &SiteConfig, inquiry: &Inquiry) -> Email {
    let name = html(&inquiry.name);
    let email = html(&inquiry.email);
    let mut content = field("Name", &name);

    content.push_str(&field(
        "Email",
        &format!("<a href=\"mailto:{}\">{}</a>", email, email),
    ));
    if let Some(phone) = inquiry.phone.as_deref().filter(|phone| !phone.trim().is_empty()) {
        let phone = html(phone);
        content.push_str(&field(
            "Phone",
            &format!("<a href=\"tel:{}\">{}</a>", phone, phone),
        ));
    }
    content.push_str(&field("Message", &html(&inquiry.message)));

    Email {
        from: config.mail_from.clone(),
        to: vec![inquiry.admin_email.clone()],
        subject: format!("New Contact Inquiry from {}", inquiry.name),
        html: page(
            "<h1 style=\"margin: 0;\">New Contact Inquiry</h1>\
<p style=\"margin: 10px 0 0 0;\">You have received a new message from your website</p>",
            &content,
            &format!("This email was sent from {} contact form", html(&config.name)),
        ),
    }
}

/// Acknowledgment sent back to the visitor.
pub fn acknowledgment(config: &SiteConfig, inquiry: &Inquiry) -> Email {
    let name = html(&inquiry.name);
    let site = html(&config.name);

    Email {
        from: config.mail_from.clone(),
        to: vec![inquiry.email.clone()],
        subject: "We received your message!".to_string(),
        html: page(
            &format!(
                "<h1 style=\"margin: 0;\">Thank You, {}!</h1>\
<p style=\"margin: 10px 0 0 0;\">We've received your message</p>",
                name
            ),
            &format!(
                "<p>Hi {},</p><p>Thank you for reaching out to us! We've received your message \
and will get back to you within 24 hours.</p><p>Here's a copy of your message:</p>\
<blockquote class=\"value\">{}</blockquote><p>Best regards,<br><strong>The {} Team</strong></p>",
                name,
                html(&inquiry.message),
                site
            ),
            &format!("&copy; {}", site),
        ),
    }
}

/// Send the owner alert, then the visitor acknowledgment. The first failure
/// aborts.
pub async fn notify(mailer: &dyn Mailer, config: &SiteConfig, inquiry: &Inquiry) -> Result<Delivery> {
    let admin_email = mailer.send(&admin_alert(config, inquiry)).await?;
    info!("Inquiry alert from {} sent to {}", inquiry.email, inquiry.admin_email);

    let user_email = mailer.send(&acknowledgment(config, inquiry)).await?;
    info!("Inquiry acknowledgment sent to {}", inquiry.email);

    Ok(Delivery {
        success: true,
        admin_email,
        user_email,
    })
}
