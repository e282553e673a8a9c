use serde::Serialize;
use sha2::{Digest, Sha256};

use super::head::TagKey;
use super::model::{GlobalSeo, PageSeo};

pub const OG_TYPE: &str = "website";
pub const TWITTER_CARD: &str = "summary_large_image";

/// The records a merge reads from. Either one may be missing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sources<'a> {
    pub page: Option<&'a PageSeo>,
    pub global: Option<&'a GlobalSeo>,
}

impl<'a> Sources<'a> {
    pub fn new(page: Option<&'a PageSeo>, global: Option<&'a GlobalSeo>) -> Self {
        Self { page, global }
    }

    pub fn is_empty(&self) -> bool {
        self.page.is_none() && self.global.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageField {
    MetaTitle,
    MetaDescription,
    CanonicalUrl,
    OgTitle,
    OgDescription,
    OgImage,
    TwitterTitle,
    TwitterDescription,
    TwitterImage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlobalField {
    DefaultOgImage,
    SearchConsoleVerification,
}

/// One `(source, field)` probe of a fallback chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup {
    Page(PageField),
    Global(GlobalField),
    Constant(&'static str),
}

impl Lookup {
    fn get<'a>(&self, sources: &Sources<'a>) -> Option<&'a str> {
        let value = match self {
            Lookup::Page(field) => {
                let page = sources.page?;

                match field {
                    PageField::MetaTitle => page.meta_title.as_deref(),
                    PageField::MetaDescription => page.meta_description.as_deref(),
                    PageField::CanonicalUrl => page.canonical_url.as_deref(),
                    PageField::OgTitle => page.og_title.as_deref(),
                    PageField::OgDescription => page.og_description.as_deref(),
                    PageField::OgImage => page.og_image.as_deref(),
                    PageField::TwitterTitle => page.twitter_title.as_deref(),
                    PageField::TwitterDescription => page.twitter_description.as_deref(),
                    PageField::TwitterImage => page.twitter_image.as_deref(),
                }
            }
            Lookup::Global(field) => {
                let global = sources.global?;

                match field {
                    GlobalField::DefaultOgImage => global.default_og_image.as_deref(),
                    GlobalField::SearchConsoleVerification => {
                        global.google_search_console_verification.as_deref()
                    }
                }
            }
            Lookup::Constant(value) => Some(*value),
        };

        value.filter(|value| !value.trim().is_empty())
    }
}

/// First non-empty value along `chain`.
pub fn first_defined<'a>(chain: &[Lookup], sources: &Sources<'a>) -> Option<&'a str> {
    chain.iter().find_map(|lookup| lookup.get(sources))
}

#[derive(Clone, Copy, Debug)]
enum KeySpec {
    Name(&'static str),
    Property(&'static str),
    Canonical,
    JsonLd,
}

impl KeySpec {
    fn key(&self) -> TagKey {
        match self {
            KeySpec::Name(name) => TagKey::Name(name.to_string()),
            KeySpec::Property(property) => TagKey::Property(property.to_string()),
            KeySpec::Canonical => TagKey::Canonical,
            KeySpec::JsonLd => TagKey::JsonLd,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Rule {
    Chain(&'static [Lookup]),
    Keywords,
    Robots,
    StructuredData,
}

pub const TITLE: &[Lookup] = &[Lookup::Page(PageField::MetaTitle)];

const RULES: &[(KeySpec, Rule)] = &[
    (
        KeySpec::Name("description"),
        Rule::Chain(&[Lookup::Page(PageField::MetaDescription)]),
    ),
    (KeySpec::Name("keywords"), Rule::Keywords),
    (
        KeySpec::Property("og:title"),
        Rule::Chain(&[
            Lookup::Page(PageField::OgTitle),
            Lookup::Page(PageField::MetaTitle),
        ]),
    ),
    (
        KeySpec::Property("og:description"),
        Rule::Chain(&[
            Lookup::Page(PageField::OgDescription),
            Lookup::Page(PageField::MetaDescription),
        ]),
    ),
    (
        KeySpec::Property("og:image"),
        Rule::Chain(&[
            Lookup::Page(PageField::OgImage),
            Lookup::Global(GlobalField::DefaultOgImage),
        ]),
    ),
    (
        KeySpec::Property("og:type"),
        Rule::Chain(&[Lookup::Constant(OG_TYPE)]),
    ),
    (
        KeySpec::Name("twitter:card"),
        Rule::Chain(&[Lookup::Constant(TWITTER_CARD)]),
    ),
    (
        KeySpec::Name("twitter:title"),
        Rule::Chain(&[
            Lookup::Page(PageField::TwitterTitle),
            Lookup::Page(PageField::MetaTitle),
        ]),
    ),
    (
        KeySpec::Name("twitter:description"),
        Rule::Chain(&[
            Lookup::Page(PageField::TwitterDescription),
            Lookup::Page(PageField::MetaDescription),
        ]),
    ),
    (
        KeySpec::Name("twitter:image"),
        Rule::Chain(&[
            Lookup::Page(PageField::TwitterImage),
            Lookup::Page(PageField::OgImage),
            Lookup::Global(GlobalField::DefaultOgImage),
        ]),
    ),
    (KeySpec::Name("robots"), Rule::Robots),
    (
        KeySpec::Canonical,
        Rule::Chain(&[Lookup::Page(PageField::CanonicalUrl)]),
    ),
    (
        KeySpec::Name("google-site-verification"),
        Rule::Chain(&[Lookup::Global(GlobalField::SearchConsoleVerification)]),
    ),
    (KeySpec::JsonLd, Rule::StructuredData),
];

impl Rule {
    fn evaluate(&self, sources: &Sources<'_>) -> Option<String> {
        match self {
            Rule::Chain(chain) => first_defined(chain, sources).map(str::to_string),
            Rule::Keywords => {
                let page = sources.page?;
                let keywords = page
                    .primary_keyword
                    .iter()
                    .chain(page.secondary_keywords.iter())
                    .map(|keyword| keyword.trim())
                    .filter(|keyword| !keyword.is_empty())
                    .collect::<Vec<_>>();

                if keywords.is_empty() {
                    None
                } else {
                    Some(keywords.join(", "))
                }
            }
            Rule::Robots => {
                let page = sources.page?;
                let mut directives = Vec::new();

                if page.no_index {
                    directives.push("noindex");
                }
                if page.no_follow {
                    directives.push("nofollow");
                }

                if directives.is_empty() {
                    None
                } else {
                    Some(directives.join(", "))
                }
            }
            Rule::StructuredData => {
                let schema = sources
                    .page
                    .and_then(|page| page.schema_data.as_ref())
                    .filter(|value| !value.is_null())
                    .or_else(|| {
                        sources
                            .global
                            .and_then(|global| global.business_schema.as_ref())
                            .filter(|value| !value.is_null())
                    })?;

                serde_json::to_string(schema)
                    .ok()
                    .map(|json| json.replace('<', "\\u003c"))
            }
        }
    }
}

/// Final head metadata for one route. Tags are in document order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub tags: Vec<(TagKey, String)>,
}

impl Metadata {
    pub fn get(&self, key: &TagKey) -> Option<&str> {
        self.tags
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.tags.is_empty()
    }

    /// SHA-256 over the serialized content, hex encoded.
    pub fn fingerprint(&self) -> String {
        let payload = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&payload))
    }
}

/// Pure merge of the page and global records.
pub fn resolve(sources: Sources<'_>) -> Metadata {
    if sources.is_empty() {
        return Metadata::default();
    }

    Metadata {
        title: first_defined(TITLE, &sources).map(str::to_string),
        tags: RULES
            .iter()
            .filter_map(|(spec, rule)| Some((spec.key(), rule.evaluate(&sources)?)))
            .collect(),
    }
}
