//! Building one [`ArticleRecord`] from a page using a site's schema.

use super::{FieldExtractor, coerce};
use crate::errors::ExtractError;
use crate::models::{ArticleField, ArticleRecord, SiteConfig};
use crate::page::RenderedPage;
use crate::utils::truncate_for_log;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct RecordBuilder {
    extractor: FieldExtractor,
}

impl RecordBuilder {
    pub fn new(extractor: FieldExtractor) -> Self {
        Self { extractor }
    }

    /// Extract every declared field of `site`'s schema from `page`.
    ///
    /// An undeclared optional field stays empty. A field whose element read
    /// timed out, or whose value is invalid for its declared type, is left
    /// empty (the date keeps its raw string) and listed in `invalid_fields`.
    /// Invalid locators and malformed structured values fail the whole page.
    #[instrument(level = "debug", skip_all, fields(site = %site.name, url = %page.url()))]
    pub async fn build<P: RenderedPage>(
        &self,
        site: &SiteConfig,
        page: &P,
    ) -> Result<ArticleRecord, ExtractError> {
        let mut record = ArticleRecord::default();

        for (field, schema) in site.schema().fields() {
            let Some(schema) = schema else {
                continue;
            };

            let raw = match self.extractor.extract(page, schema).await {
                Ok(raw) => raw,
                Err(e @ ExtractError::Timeout { .. }) => {
                    warn!(field = field.name(), error = %e, "Field extraction timed out");
                    record.invalid_fields.push(field.name());
                    continue;
                }
                Err(e) => return Err(e),
            };

            let value = coerce(&raw, schema.value_type).map_err(|source| ExtractError::Coerce {
                field: field.name(),
                source,
            })?;
            if value.is_invalid() {
                debug!(field = field.name(), ?schema.value_type, raw = %truncate_for_log(&raw, 120), "Invalid value for declared type");
                record.invalid_fields.push(field.name());
            }

            let text = value.to_text().unwrap_or_default();
            match field {
                ArticleField::Teaser => record.teaser = text,
                ArticleField::Headline => record.headline = text,
                ArticleField::Subline => record.subline = text,
                ArticleField::Content => record.content = text,
                ArticleField::Date => record.date = value.to_article_date(&raw),
            }
        }

        record.source_url = site.url.clone();
        record.source_name = site.name.clone();
        record.url = page.url().to_string();
        Ok(record)
    }
}
