//! Resolution of one schema field against a rendered page to a raw string.

use crate::errors::{ExtractError, PageError};
use crate::models::{Cardinality, ContentMode, FieldSchema};
use crate::page::RenderedPage;
use itertools::Itertools;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{instrument, trace};

/// Per-element read timeout.
pub const DEFAULT_FIELD_TIMEOUT: Duration = Duration::from_millis(3000);

/// Reads raw field strings from a page, bounding every element-level call.
#[derive(Debug, Clone, Copy)]
pub struct FieldExtractor {
    timeout: Duration,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_FIELD_TIMEOUT)
    }
}

impl FieldExtractor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Extract the raw string for `field`.
    ///
    /// `unique` reads the first match (missing means empty); `multiple` reads
    /// every match in document order and joins them with `\n`.
    ///
    /// # Arguments
    ///
    /// * `page` - The rendered article page
    /// * `field` - Locator, content mode, attribute name and cardinality
    ///
    /// # Returns
    ///
    /// The raw string, or [`ExtractError::Timeout`] if any element read
    /// exceeded the extractor's timeout.
    #[instrument(level = "trace", skip_all, fields(selector = %field.selector))]
    pub async fn extract<P: RenderedPage>(
        &self,
        page: &P,
        field: &FieldSchema,
    ) -> Result<String, ExtractError> {
        match field.count {
            Cardinality::Unique => self.read_element(page, field, 0).await,
            Cardinality::Multiple => {
                let matches = self.bounded(&field.selector, page.count(&field.selector)).await?;
                trace!(matches, "Resolving multiple elements");
                let mut values = Vec::with_capacity(matches);
                for nth in 0..matches {
                    values.push(self.read_element(page, field, nth).await?);
                }
                Ok(values.iter().join("\n"))
            }
        }
    }

    async fn read_element<P: RenderedPage>(
        &self,
        page: &P,
        field: &FieldSchema,
        nth: usize,
    ) -> Result<String, ExtractError> {
        let locator = field.selector.as_str();
        let value = match field.content {
            ContentMode::Text => self.bounded(locator, page.inner_text(locator, nth)).await?,
            ContentMode::Html => self.bounded(locator, page.inner_html(locator, nth)).await?,
            ContentMode::Attribute => {
                self.bounded(locator, page.attribute(locator, nth, &field.attribute))
                    .await?
            }
        };
        Ok(value.unwrap_or_default())
    }

    async fn bounded<T>(
        &self,
        locator: &str,
        call: impl Future<Output = Result<T, PageError>>,
    ) -> Result<T, ExtractError> {
        match timeout(self.timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ExtractError::Timeout {
                locator: locator.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::HtmlPage;

    const HTML: &str = r#"
        <html><body>
          <ul>
            <li class="item" data-id="1">a</li>
            <li class="item" data-id="2">b</li>
            <li class="item" data-id="3">c</li>
          </ul>
          <h1>Hello</h1>
          <div id="body"><p>First</p></div>
        </body></html>
    "#;

    fn page() -> HtmlPage {
        HtmlPage::new("https://site-a.test/articles/1", HTML)
    }

    fn field(selector: &str, content: ContentMode, count: Cardinality) -> FieldSchema {
        FieldSchema {
            selector: selector.to_string(),
            content,
            attribute: "data-id".to_string(),
            value_type: Default::default(),
            count,
        }
    }

    #[tokio::test]
    async fn test_multiple_joins_with_newline_in_order() {
        let extractor = FieldExtractor::default();
        let raw = extractor
            .extract(&page(), &field(".item", ContentMode::Text, Cardinality::Multiple))
            .await
            .unwrap();
        assert_eq!(raw, "a\nb\nc");
    }

    #[tokio::test]
    async fn test_unique_takes_first_match() {
        let extractor = FieldExtractor::default();
        let raw = extractor
            .extract(&page(), &field(".item", ContentMode::Attribute, Cardinality::Unique))
            .await
            .unwrap();
        assert_eq!(raw, "1");
    }

    #[tokio::test]
    async fn test_missing_element_is_empty() {
        let extractor = FieldExtractor::default();
        for count in [Cardinality::Unique, Cardinality::Multiple] {
            let raw = extractor
                .extract(&page(), &field("h2", ContentMode::Text, count))
                .await
                .unwrap();
            assert_eq!(raw, "");
        }
    }

    #[tokio::test]
    async fn test_html_mode() {
        let extractor = FieldExtractor::default();
        let raw = extractor
            .extract(&page(), &field("#body", ContentMode::Html, Cardinality::Unique))
            .await
            .unwrap();
        assert_eq!(raw, "<p>First</p>");
    }

    struct SlowPage;

    impl RenderedPage for SlowPage {
        fn url(&self) -> &str {
            "https://slow.test/"
        }

        async fn count(&self, _locator: &str) -> Result<usize, PageError> {
            Ok(1)
        }

        async fn inner_text(&self, _locator: &str, _nth: usize) -> Result<Option<String>, PageError> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(Some("late".to_string()))
        }

        async fn inner_html(&self, _locator: &str, _nth: usize) -> Result<Option<String>, PageError> {
            Ok(None)
        }

        async fn attribute(
            &self,
            _locator: &str,
            _nth: usize,
            _name: &str,
        ) -> Result<Option<String>, PageError> {
            Ok(None)
        }

        async fn links(&self) -> Result<Vec<String>, PageError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_slow_element_times_out() {
        let extractor = FieldExtractor::new(Duration::from_millis(20));
        let err = extractor
            .extract(&SlowPage, &field("h1", ContentMode::Text, Cardinality::Unique))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Timeout { timeout_ms: 20, .. }));
    }
}
