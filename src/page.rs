//! Rendered-document access.
//!
//! Extraction never touches a DOM directly; it goes through [`RenderedPage`],
//! which addresses elements Playwright-style as a locator plus an index.
//! [`HtmlPage`] implements it over a fetched HTML body using `scraper`.

use crate::errors::PageError;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static selector is valid"));

/// Read access to a rendered page.
///
/// Element-level reads return `Ok(None)` when the `nth` match does not exist.
/// Implementations may be slow (remote browsers); callers bound each call
/// with their own timeout.
pub trait RenderedPage {
    /// The page's current location.
    fn url(&self) -> &str;

    /// Number of elements matching `locator`.
    async fn count(&self, locator: &str) -> Result<usize, PageError>;

    /// Rendered inner text of the `nth` match.
    async fn inner_text(&self, locator: &str, nth: usize) -> Result<Option<String>, PageError>;

    /// Serialized inner markup of the `nth` match.
    async fn inner_html(&self, locator: &str, nth: usize) -> Result<Option<String>, PageError>;

    /// Value of attribute `name` on the `nth` match.
    async fn attribute(
        &self,
        locator: &str,
        nth: usize,
        name: &str,
    ) -> Result<Option<String>, PageError>;

    /// Absolute URLs of all links on the page, in document order.
    async fn links(&self) -> Result<Vec<String>, PageError>;
}

/// A static HTML document addressed by CSS selectors.
pub struct HtmlPage {
    url: String,
    document: Html,
}

impl HtmlPage {
    pub fn new(url: impl Into<String>, body: &str) -> Self {
        Self {
            url: url.into(),
            document: Html::parse_document(body),
        }
    }

    fn nth_element(&self, locator: &str, nth: usize) -> Result<Option<ElementRef<'_>>, PageError> {
        let selector = parse_selector(locator)?;
        Ok(self.document.select(&selector).nth(nth))
    }
}

fn parse_selector(locator: &str) -> Result<Selector, PageError> {
    Selector::parse(locator).map_err(|e| PageError::InvalidLocator {
        locator: locator.to_string(),
        reason: e.to_string(),
    })
}

/// Inner text with whitespace runs collapsed to single spaces.
fn rendered_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

impl RenderedPage for HtmlPage {
    fn url(&self) -> &str {
        &self.url
    }

    async fn count(&self, locator: &str) -> Result<usize, PageError> {
        let selector = parse_selector(locator)?;
        Ok(self.document.select(&selector).count())
    }

    async fn inner_text(&self, locator: &str, nth: usize) -> Result<Option<String>, PageError> {
        Ok(self.nth_element(locator, nth)?.map(rendered_text))
    }

    async fn inner_html(&self, locator: &str, nth: usize) -> Result<Option<String>, PageError> {
        Ok(self.nth_element(locator, nth)?.map(|el| el.inner_html()))
    }

    async fn attribute(
        &self,
        locator: &str,
        nth: usize,
        name: &str,
    ) -> Result<Option<String>, PageError> {
        Ok(self
            .nth_element(locator, nth)?
            .and_then(|el| el.value().attr(name).map(str::to_string)))
    }

    async fn links(&self) -> Result<Vec<String>, PageError> {
        let base = Url::parse(&self.url)
            .map_err(|e| PageError::Unavailable(format!("bad page url {}: {e}", self.url)))?;

        let mut links = Vec::new();
        for element in self.document.select(&LINK_SELECTOR) {
            if let Some(href) = element.value().attr("href") {
                if let Ok(mut resolved) = base.join(href) {
                    if !matches!(resolved.scheme(), "http" | "https") {
                        continue;
                    }
                    resolved.set_fragment(None);
                    links.push(resolved.to_string());
                }
            }
        }
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r##"
        <html><body>
          <h1>  Hello
              World </h1>
          <div class="teaser"><b>Bold</b> teaser</div>
          <time datetime="2025-05-06T12:00:00Z">6 May</time>
          <a href="/articles/1">One</a>
          <a href="https://other.test/x#top">Other</a>
          <a href="mailto:news@site-a.test">Mail</a>
          <a href="#comments">Comments</a>
        </body></html>
    "##;

    fn page() -> HtmlPage {
        HtmlPage::new("https://site-a.test/", HTML)
    }

    #[tokio::test]
    async fn test_inner_text_collapses_whitespace() {
        let text = page().inner_text("h1", 0).await.unwrap();
        assert_eq!(text.as_deref(), Some("Hello World"));
    }

    #[tokio::test]
    async fn test_inner_html_keeps_markup() {
        let html = page().inner_html(".teaser", 0).await.unwrap().unwrap();
        assert_eq!(html, "<b>Bold</b> teaser");
    }

    #[tokio::test]
    async fn test_attribute_and_missing_element() {
        let p = page();
        assert_eq!(
            p.attribute("time", 0, "datetime").await.unwrap().as_deref(),
            Some("2025-05-06T12:00:00Z")
        );
        assert_eq!(p.attribute("time", 0, "title").await.unwrap(), None);
        assert_eq!(p.inner_text("h2", 0).await.unwrap(), None);
        assert_eq!(p.count("a").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_invalid_locator() {
        let err = page().count("h1[").await.unwrap_err();
        assert!(matches!(err, PageError::InvalidLocator { .. }));
    }

    #[tokio::test]
    async fn test_links_resolved_and_filtered() {
        let links = page().links().await.unwrap();
        assert_eq!(
            links,
            vec![
                "https://site-a.test/articles/1".to_string(),
                "https://other.test/x".to_string(),
                "https://site-a.test/".to_string(),
            ]
        );
    }
}
