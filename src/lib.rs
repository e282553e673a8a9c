pub mod algorithm;
pub mod cache;
pub mod config;
pub mod mailer;
pub mod seo;
