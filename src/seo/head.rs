use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Serialize;

use super::resolve::Metadata;

/// Identity of a head element. Two elements with the same key are the same
/// element, whatever their value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "key", rename_all = "lowercase")]
pub enum TagKey {
    Name(String),
    Property(String),
    Canonical,
    JsonLd,
}

#[derive(Clone, Debug, PartialEq)]
struct Element {
    key: TagKey,
    value: String,
}

/// In-memory document head.
///
/// Elements are only ever written through [`Head::upsert`], so every key
/// appears at most once no matter how often metadata is applied.
#[derive(Clone, Debug, PartialEq)]
pub struct Head {
    default_title: String,
    title: String,
    elements: Vec<Element>,
    baseline: HashMap<TagKey, String>,
    managed: BTreeSet<TagKey>,
}

impl Head {
    pub fn new(default_title: impl Into<String>) -> Self {
        let default_title = default_title.into();

        Self {
            title: default_title.clone(),
            default_title,
            elements: Vec::new(),
            baseline: HashMap::new(),
            managed: BTreeSet::new(),
        }
    }

    /// Element shipped with the static shell. Metadata may override it and
    /// it comes back once the override is withdrawn.
    pub fn with_baseline(mut self, key: TagKey, value: impl Into<String>) -> Self {
        let value = value.into();

        self.upsert(key.clone(), &value);
        self.baseline.insert(key, value);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn default_title(&self) -> &str {
        &self.default_title
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, key: &TagKey) -> Option<&str> {
        self.elements
            .iter()
            .find(|element| &element.key == key)
            .map(|element| element.value.as_str())
    }

    pub fn count(&self, key: &TagKey) -> usize {
        self.elements
            .iter()
            .filter(|element| &element.key == key)
            .count()
    }

    pub fn keys(&self) -> impl Iterator<Item = &TagKey> {
        self.elements.iter().map(|element| &element.key)
    }

    /// Update the element under `key` in place or append it. Returns whether
    /// the head changed.
    pub fn upsert(&mut self, key: TagKey, value: &str) -> bool {
        match self.elements.iter_mut().find(|element| element.key == key) {
            Some(element) if element.value == value => false,
            Some(element) => {
                element.value = value.to_string();
                true
            }
            None => {
                self.elements.push(Element {
                    key,
                    value: value.to_string(),
                });
                true
            }
        }
    }

    /// Drop an override: restore the shell value when there is one, otherwise
    /// remove the element.
    pub fn withdraw(&mut self, key: &TagKey) -> bool {
        match self.baseline.get(key).cloned() {
            Some(value) => self.upsert(key.clone(), &value),
            None => {
                let before = self.elements.len();
                self.elements.retain(|element| &element.key != key);
                before != self.elements.len()
            }
        }
    }

    /// Make the head reflect `meta` exactly. Keys written by an earlier
    /// application and absent from `meta` are withdrawn.
    pub fn apply(&mut self, meta: &Metadata) {
        self.title = meta
            .title
            .clone()
            .unwrap_or_else(|| self.default_title.clone());

        let incoming = meta
            .tags
            .iter()
            .map(|(key, _)| key.clone())
            .collect::<BTreeSet<_>>();

        let stale = self
            .managed
            .difference(&incoming)
            .cloned()
            .collect::<Vec<_>>();
        for key in stale {
            self.withdraw(&key);
        }

        for (key, value) in &meta.tags {
            self.upsert(key.clone(), value);
        }

        self.managed = incoming;
    }

    /// Serialize as HTML head markup, one element per line.
    pub fn render(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());

        writer.write_event(Event::Start(BytesStart::new("title")))?;
        writer.write_event(Event::Text(BytesText::new(&self.title)))?;
        writer.write_event(Event::End(BytesEnd::new("title")))?;

        for element in &self.elements {
            writer.get_mut().push(b'\n');

            match &element.key {
                TagKey::Name(name) => {
                    writer.write_event(Event::Empty(BytesStart::new("meta").with_attributes([
                        ("name", name.as_str()),
                        ("content", element.value.as_str()),
                    ])))?;
                }
                TagKey::Property(property) => {
                    writer.write_event(Event::Empty(BytesStart::new("meta").with_attributes([
                        ("property", property.as_str()),
                        ("content", element.value.as_str()),
                    ])))?;
                }
                TagKey::Canonical => {
                    writer.write_event(Event::Empty(
                        BytesStart::new("link")
                            .with_attributes([("rel", "canonical"), ("href", element.value.as_str())]),
                    ))?;
                }
                TagKey::JsonLd => {
                    writer.write_event(Event::Start(
                        BytesStart::new("script").with_attributes([("type", "application/ld+json")]),
                    ))?;
                    // already JSON with `<` escaped, must not be entity-encoded
                    writer.write_event(Event::Text(BytesText::from_escaped(element.value.as_str())))?;
                    writer.write_event(Event::End(BytesEnd::new("script")))?;
                }
            }
        }

        Ok(String::from_utf8(writer.into_inner())?)
    }
}
