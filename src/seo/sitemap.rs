//! Sitemap generation.
//!
//! Active sitemap entries become one `<url>` each, in the order they are
//! given (highest priority first when read from storage). When the entries
//! cannot be read the document degrades to the site root alone.

use std::fmt::Display;
use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use log::error;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::model::SitemapRecord;
use crate::config::SiteConfig;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

pub const DEFAULT_CHANGEFREQ: &str = "weekly";
pub const DEFAULT_PRIORITY: f64 = 0.5;

#[derive(Clone, Debug, PartialEq)]
struct UrlEntry {
    loc: String,
    lastmod: Option<String>,
    changefreq: Option<String>,
    priority: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sitemap {
    urls: Vec<UrlEntry>,
}

impl Sitemap {
    /// Entries without a modification date are stamped with `today`.
    pub fn from_records(config: &SiteConfig, records: &[SitemapRecord], today: NaiveDate) -> Self {
        let urls = records
            .iter()
            .map(|record| UrlEntry {
                loc: config.absolute(&record.url),
                lastmod: Some(
                    record
                        .last_modified
                        .map(|at| at.date_naive())
                        .unwrap_or(today)
                        .format("%Y-%m-%d")
                        .to_string(),
                ),
                changefreq: Some(
                    record
                        .changefreq
                        .as_deref()
                        .map(str::trim)
                        .filter(|freq| !freq.is_empty())
                        .unwrap_or(DEFAULT_CHANGEFREQ)
                        .to_string(),
                ),
                priority: format_priority(record.priority.unwrap_or(DEFAULT_PRIORITY)),
            })
            .collect();

        Self { urls }
    }

    /// Root URL only, top priority.
    pub fn fallback(config: &SiteConfig) -> Self {
        Self {
            urls: vec![UrlEntry {
                loc: config.absolute("/"),
                lastmod: None,
                changefreq: None,
                priority: "1.0".to_string(),
            }],
        }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(
            BytesStart::new("urlset").with_attributes([("xmlns", SITEMAP_NS)]),
        ))?;

        for entry in &self.urls {
            writer.write_event(Event::Start(BytesStart::new("url")))?;
            write_text(&mut writer, "loc", &entry.loc)?;
            if let Some(lastmod) = &entry.lastmod {
                write_text(&mut writer, "lastmod", lastmod)?;
            }
            if let Some(changefreq) = &entry.changefreq {
                write_text(&mut writer, "changefreq", changefreq)?;
            }
            write_text(&mut writer, "priority", &entry.priority)?;
            writer.write_event(Event::End(BytesEnd::new("url")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("urlset")))?;

        let mut xml = String::from_utf8(writer.into_inner())?;
        xml.push('\n');
        Ok(xml)
    }
}

/// Render the sitemap for a storage read, degrading to the fallback document
/// when the read or the rendering fails.
pub fn render_sitemap<E: Display>(
    config: &SiteConfig,
    read: std::result::Result<Vec<SitemapRecord>, E>,
    today: NaiveDate,
) -> String {
    let sitemap = match read {
        Ok(records) => Sitemap::from_records(config, &records, today),
        Err(error) => {
            error!("Failed to read sitemap entries: {}", error);
            Sitemap::fallback(config)
        }
    };

    match sitemap.to_xml() {
        Ok(xml) => xml,
        Err(error) => {
            error!("Failed to render sitemap: {}", error);
            fallback_xml(config)
        }
    }
}

fn fallback_xml(config: &SiteConfig) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"{}\">\n  <url>\n    <loc>{}</loc>\n    <priority>1.0</priority>\n  </url>\n</urlset>\n",
        SITEMAP_NS,
        quick_xml::escape::escape(config.absolute("/").as_str()),
    )
}

fn format_priority(priority: f64) -> String {
    let priority = if priority.is_finite() {
        priority.clamp(0.0, 1.0)
    } else {
        DEFAULT_PRIORITY
    };

    if priority.fract() == 0.0 {
        format!("{:.1}", priority)
    } else {
        priority.to_string()
    }
}

fn write_text<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
