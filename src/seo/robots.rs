use std::fmt::Display;

use log::error;

use crate::config::SiteConfig;

pub fn default_robots(config: &SiteConfig) -> String {
    format!(
        "User-agent: *\nAllow: /\n\nSitemap: {}",
        config.sitemap_url()
    )
}

/// Stored robots.txt content when present and non-blank, the default policy
/// otherwise. A failed read also yields the default.
pub fn render_robots<E: Display>(config: &SiteConfig, read: Result<Option<String>, E>) -> String {
    match read {
        Ok(Some(content)) if !content.trim().is_empty() => content,
        Ok(_) => default_robots(config),
        Err(error) => {
            error!("Failed to read robots.txt content: {}", error);
            default_robots(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_robots() {
        assert_eq!(
            default_robots(&SiteConfig::default()),
            "User-agent: *\nAllow: /\n\nSitemap: https://www.thahaseenweb.site/sitemap.xml"
        );
    }

    #[rstest]
    #[case(Ok(None), true)]
    #[case(Ok(Some("   \n".to_string())), true)]
    #[case(Err("timeout"), true)]
    #[case(Ok(Some("User-agent: *\nDisallow: /admin".to_string())), false)]
    fn test_render_robots(#[case] read: Result<Option<String>, &str>, #[case] defaulted: bool) {
        let config = SiteConfig::default();
        let stored = read.clone().ok().flatten();
        let robots = render_robots(&config, read);

        if defaulted {
            assert_eq!(robots, default_robots(&config));
        } else {
            assert_eq!(Some(robots), stored);
        }
    }
}
