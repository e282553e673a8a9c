use log::debug;

use super::head::{Head, TagKey};
use super::resolve::{resolve, Metadata, Sources};
use crate::config::SiteConfig;

/// A rendered page head together with the route and content fingerprint it
/// was last synchronized to.
#[derive(Clone, Debug)]
pub struct Document {
    head: Head,
    route: Option<String>,
    fingerprint: Option<String>,
}

impl Document {
    pub fn new(head: Head) -> Self {
        Self {
            head,
            route: None,
            fingerprint: None,
        }
    }

    /// Static shell served before any metadata is known.
    pub fn shell(config: &SiteConfig) -> Self {
        Self::new(
            Head::new(config.name.clone())
                .with_baseline(TagKey::Name("description".to_string()), config.description.clone()),
        )
    }

    pub fn head(&self) -> &Head {
        &self.head
    }

    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Merge `sources` for `route` and apply the result. Nothing is touched
    /// when the merged content matches what is already applied. Returns
    /// whether the head was rewritten.
    pub fn sync(&mut self, route: &str, sources: Sources<'_>) -> bool {
        let meta = resolve(sources);
        self.sync_metadata(route, &meta)
    }

    pub fn sync_metadata(&mut self, route: &str, meta: &Metadata) -> bool {
        let fingerprint = meta.fingerprint();

        self.route = Some(route.to_string());
        if self.fingerprint.as_deref() == Some(fingerprint.as_str()) {
            debug!("Head of {} already up to date", route);
            return false;
        }

        self.head.apply(meta);
        self.fingerprint = Some(fingerprint);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seo::model::PageSeo;

    #[test]
    fn test_sync_skips_unchanged_content() {
        let page = PageSeo {
            page_slug: "/".to_string(),
            meta_title: Some("Home".to_string()),
            ..Default::default()
        };
        let mut document = Document::new(Head::new("Site"));

        assert!(document.sync("/", Sources::new(Some(&page), None)));
        assert!(!document.sync("/", Sources::new(Some(&page), None)));
        assert_eq!(document.head().title(), "Home");
    }

    #[test]
    fn test_sync_reapplies_when_content_changes() {
        let mut page = PageSeo {
            page_slug: "/".to_string(),
            meta_title: Some("Home".to_string()),
            ..Default::default()
        };
        let mut document = Document::new(Head::new("Site"));

        document.sync("/", Sources::new(Some(&page), None));
        page.meta_title = Some("Welcome".to_string());

        assert!(document.sync("/", Sources::new(Some(&page), None)));
        assert_eq!(document.head().title(), "Welcome");
    }

    #[test]
    fn test_shell_keeps_description_for_bare_pages() {
        let config = SiteConfig::default();
        let mut document = Document::shell(&config);

        document.sync("/missing", Sources::default());

        assert_eq!(document.head().title(), config.name);
        assert_eq!(
            document.head().get(&TagKey::Name("description".to_string())),
            Some(config.description.as_str())
        );
        assert_eq!(document.head().len(), 1);
        assert_eq!(document.route(), Some("/missing"));
    }
}
