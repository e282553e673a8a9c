use std::io::{Error, ErrorKind, Result};

pub const DEFAULT_SITE_NAME: &str = "Thahaseen Web";
pub const DEFAULT_SITE_URL: &str = "https://www.thahaseenweb.site";
pub const DEFAULT_SITE_DESCRIPTION: &str = "Professional freelance web developer offering custom website design, website development, and Vercel deployment.";
pub const DEFAULT_RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// Branding and absolute-URL settings shared by the head shell, the sitemap,
/// robots.txt and outgoing mail.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteConfig {
    pub name: String,
    pub url: String,
    pub description: String,
    pub og_image: String,
    pub mail_from: String,
    pub admin_email: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SITE_NAME.to_string(),
            url: DEFAULT_SITE_URL.to_string(),
            description: DEFAULT_SITE_DESCRIPTION.to_string(),
            og_image: format!("{}/og-image.jpg", DEFAULT_SITE_URL),
            mail_from: format!("{} <onboarding@resend.dev>", DEFAULT_SITE_NAME),
            admin_email: None,
        }
    }
}

impl SiteConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let name = std::env::var("SITE_NAME").unwrap_or(defaults.name);
        let url = std::env::var("SITE_URL")
            .unwrap_or(defaults.url)
            .trim_end_matches('/')
            .to_string();

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("Invalid SITE_URL: {}", url),
            ));
        }

        Ok(Self {
            description: std::env::var("SITE_DESCRIPTION").unwrap_or(defaults.description),
            og_image: std::env::var("SITE_OG_IMAGE")
                .unwrap_or_else(|_| format!("{}/og-image.jpg", url)),
            mail_from: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| format!("{} <onboarding@resend.dev>", name)),
            admin_email: std::env::var("ADMIN_EMAIL")
                .ok()
                .map(|email| email.trim().to_string())
                .filter(|email| !email.is_empty()),
            name,
            url,
        })
    }

    /// Absolute URL for a site-relative path.
    pub fn absolute(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.url, path)
        } else {
            format!("{}/{}", self.url, path)
        }
    }

    pub fn sitemap_url(&self) -> String {
        self.absolute("/sitemap.xml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/about", "https://www.thahaseenweb.site/about")]
    #[case("about", "https://www.thahaseenweb.site/about")]
    #[case("/", "https://www.thahaseenweb.site/")]
    #[case("https://cdn.example.com/a.png", "https://cdn.example.com/a.png")]
    fn test_absolute(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(SiteConfig::default().absolute(path), expected);
    }

    #[test]
    fn test_sitemap_url() {
        assert_eq!(
            SiteConfig::default().sitemap_url(),
            "https://www.thahaseenweb.site/sitemap.xml"
        );
    }
}
