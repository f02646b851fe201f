//! Data models for site configurations, extraction schemas and article records.
//!
//! This module defines the core data structures used throughout the application:
//! - [`SiteConfig`]: one target site, its link-discovery globs and its [`ArticleSchema`]
//! - [`FieldSchema`]: how a single logical field is located, read and typed
//! - [`ArticleRecord`]: the article extracted from one page
//! - [`PersistedRecord`]: an [`ArticleRecord`] with its durable identifier
//!
//! The serialized shapes use camelCase field names to match the documents
//! already held in the record store.

use crate::utils::parse_date;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which representation of a matched element is extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    /// Rendered inner text.
    Text,
    /// Serialized inner markup.
    Html,
    /// The value of a named attribute.
    Attribute,
}

/// The declared type of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    String,
    Number,
    Boolean,
    Date,
    Object,
    Array,
}

/// Whether a field expects one or many matching elements per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    #[default]
    Unique,
    Multiple,
}

/// Declarative description of one logical field.
///
/// # Example (YAML)
///
/// ```yaml
/// selector: "article time"
/// content: attribute
/// attribute: datetime
/// type: date
/// count: unique
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FieldSchema {
    /// CSS selector identifying the element(s).
    pub selector: String,
    /// Which representation of the element to read.
    pub content: ContentMode,
    /// Attribute name, only consulted when `content` is [`ContentMode::Attribute`].
    #[serde(default)]
    pub attribute: String,
    /// Declared type of the extracted value.
    #[serde(default, rename = "type")]
    pub value_type: ValueType,
    /// Expected number of matching elements.
    #[serde(default)]
    pub count: Cardinality,
}

impl FieldSchema {
    /// A `unique` text field of type string.
    #[cfg(test)]
    pub fn text(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            content: ContentMode::Text,
            attribute: String::new(),
            value_type: ValueType::String,
            count: Cardinality::Unique,
        }
    }
}

/// The logical fields of an article, in extraction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArticleField {
    Teaser,
    Headline,
    Subline,
    Content,
    Date,
}

impl ArticleField {
    pub fn name(self) -> &'static str {
        match self {
            ArticleField::Teaser => "teaser",
            ArticleField::Headline => "headline",
            ArticleField::Subline => "subline",
            ArticleField::Content => "content",
            ArticleField::Date => "date",
        }
    }
}

/// Per-site mapping from article fields to their [`FieldSchema`].
///
/// `subline` is optional; every other field must be declared.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArticleSchema {
    pub teaser: FieldSchema,
    pub headline: FieldSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subline: Option<FieldSchema>,
    pub content: FieldSchema,
    pub date: FieldSchema,
}

impl ArticleSchema {
    /// All fields in a fixed order, with `None` for an undeclared optional field.
    pub fn fields(&self) -> [(ArticleField, Option<&FieldSchema>); 5] {
        [
            (ArticleField::Teaser, Some(&self.teaser)),
            (ArticleField::Headline, Some(&self.headline)),
            (ArticleField::Subline, self.subline.as_ref()),
            (ArticleField::Content, Some(&self.content)),
            (ArticleField::Date, Some(&self.date)),
        ]
    }
}

/// Wrapper matching the stored `articles.data` nesting.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArticleSection {
    pub data: ArticleSchema,
}

/// One target website.
///
/// Loaded once per run and never modified afterwards. The `name` doubles as
/// the routing label for article pages discovered on this site.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SiteConfig {
    /// Stable site name; used as routing label and stamped as `sourceName`.
    pub name: String,
    /// Base URL; a page belongs to this site when its URL contains this string.
    pub url: String,
    /// Free-form location of the publication.
    #[serde(default)]
    pub location: String,
    /// The CMS or framework the site runs on, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    /// URL globs selecting which discovered links are article pages.
    #[serde(default)]
    pub globs: Vec<String>,
    /// Field extraction schema for article pages.
    pub articles: ArticleSection,
}

impl SiteConfig {
    pub fn schema(&self) -> &ArticleSchema {
        &self.articles.data
    }
}

/// An article's date: a parsed timestamp or the raw string it was read from.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ArticleDate {
    Timestamp(DateTime<Utc>),
    Raw(String),
}

impl ArticleDate {
    /// The instant this date denotes, parsing raw strings on demand.
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        match self {
            ArticleDate::Timestamp(ts) => Some(*ts),
            ArticleDate::Raw(raw) => parse_date(raw),
        }
    }
}

impl Default for ArticleDate {
    fn default() -> Self {
        ArticleDate::Raw(String::new())
    }
}

/// An article extracted from one page.
///
/// Two records are duplicate-equivalent when they share a `url` OR a
/// `headline`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    /// Base URL of the site the article came from.
    pub source_url: String,
    /// Name of the site the article came from.
    pub source_name: String,
    /// URL of the article page.
    pub url: String,
    pub teaser: String,
    pub headline: String,
    pub subline: String,
    pub content: String,
    pub date: ArticleDate,
    /// Fields whose extracted value was invalid for their declared type.
    #[serde(skip)]
    pub invalid_fields: Vec<&'static str>,
}

impl ArticleRecord {
    pub fn is_valid(&self) -> bool {
        self.invalid_fields.is_empty()
    }
}

/// An [`ArticleRecord`] as held by the record store.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PersistedRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(flatten)]
    pub record: ArticleRecord,
}

impl PersistedRecord {
    /// Assign a freshly generated identifier.
    pub fn assign(record: ArticleRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            record,
        }
    }
}
