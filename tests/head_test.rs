use serde_json::json;

use sitecms::config::SiteConfig;
use sitecms::seo::{Document, GlobalSeo, PageSeo, Sources, TagKey};

fn name(key: &str) -> TagKey {
    TagKey::Name(key.to_string())
}

fn property(key: &str) -> TagKey {
    TagKey::Property(key.to_string())
}

fn page(slug: &str) -> PageSeo {
    PageSeo {
        page_slug: slug.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_no_records_keep_default_title() {
    let config = SiteConfig::default();
    let mut document = Document::shell(&config);

    document.sync("/", Sources::new(None, None));

    let head = document.head();
    assert_eq!(head.title(), config.name);
    assert_eq!(head.get(&name("description")), Some(config.description.as_str()));
    assert_eq!(head.get(&property("og:type")), None);
    assert_eq!(head.get(&name("twitter:card")), None);
    assert_eq!(head.get(&TagKey::Canonical), None);
    assert_eq!(head.get(&TagKey::JsonLd), None);
}

#[test]
fn test_meta_title_feeds_social_titles() {
    let mut about = page("/about");
    about.meta_title = Some("About Us".to_string());

    let mut document = Document::shell(&SiteConfig::default());
    document.sync("/about", Sources::new(Some(&about), None));

    let head = document.head();
    assert_eq!(head.title(), "About Us");
    assert_eq!(head.get(&property("og:title")), Some("About Us"));
    assert_eq!(head.get(&name("twitter:title")), Some("About Us"));
}

#[test]
fn test_robots_flags() {
    let mut hidden = page("/drafts");
    hidden.no_index = true;

    let mut document = Document::shell(&SiteConfig::default());
    document.sync("/drafts", Sources::new(Some(&hidden), None));
    assert_eq!(document.head().get(&name("robots")), Some("noindex"));

    document.sync("/", Sources::new(Some(&page("/")), None));
    assert_eq!(document.head().get(&name("robots")), None);
}

#[test]
fn test_repeated_sync_never_duplicates() {
    let mut home = page("/");
    home.canonical_url = Some("https://www.thahaseenweb.site/".to_string());
    home.schema_data = Some(json!({"@type": "WebSite", "name": "Thahaseen Web"}));

    let mut document = Document::shell(&SiteConfig::default());

    assert!(document.sync("/", Sources::new(Some(&home), None)));
    assert!(!document.sync("/", Sources::new(Some(&home), None)));

    let head = document.head();
    assert_eq!(head.count(&TagKey::Canonical), 1);
    assert_eq!(head.count(&TagKey::JsonLd), 1);

    let html = head.render().unwrap();
    assert_eq!(html.matches("rel=\"canonical\"").count(), 1);
    assert_eq!(html.matches("application/ld+json").count(), 1);
}

#[test]
fn test_navigation_withdraws_canonical() {
    let mut first = page("/a");
    first.canonical_url = Some("https://www.thahaseenweb.site/a".to_string());
    let second = page("/b");
    let global = GlobalSeo {
        site_name: Some("Thahaseen Web".to_string()),
        ..Default::default()
    };

    let mut document = Document::shell(&SiteConfig::default());
    document.sync("/a", Sources::new(Some(&first), Some(&global)));
    assert!(document.head().get(&TagKey::Canonical).is_some());

    document.sync("/b", Sources::new(Some(&second), Some(&global)));
    assert_eq!(document.head().get(&TagKey::Canonical), None);
    assert_eq!(document.route(), Some("/b"));
}

#[test]
fn test_withdrawn_description_restores_shell() {
    let config = SiteConfig::default();
    let mut described = page("/services");
    described.meta_description = Some("Custom websites".to_string());

    let mut document = Document::shell(&config);
    document.sync("/services", Sources::new(Some(&described), None));
    assert_eq!(document.head().get(&name("description")), Some("Custom websites"));

    document.sync("/", Sources::new(Some(&page("/")), None));
    assert_eq!(
        document.head().get(&name("description")),
        Some(config.description.as_str())
    );
}

#[test]
fn test_json_ld_cannot_close_script() {
    let mut home = page("/");
    home.schema_data = Some(json!({"name": "</script><script>alert(1)</script>"}));

    let mut document = Document::shell(&SiteConfig::default());
    document.sync("/", Sources::new(Some(&home), None));

    let html = document.head().render().unwrap();
    assert_eq!(html.matches("</script>").count(), 1);
}
