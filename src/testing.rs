//! Shared fixtures for unit tests.

use crate::models::{
    ArticleDate, ArticleRecord, ArticleSchema, ArticleSection, Cardinality, ContentMode,
    FieldSchema, SiteConfig, ValueType,
};
use chrono::{DateTime, Utc};

/// A site whose articles live under `https://{url}/articles/*`.
pub fn site(name: &str, url: &str) -> SiteConfig {
    SiteConfig {
        name: name.to_string(),
        url: url.to_string(),
        location: String::new(),
        framework: None,
        globs: vec![format!("https://{url}/articles/*")],
        articles: ArticleSection {
            data: ArticleSchema {
                teaser: FieldSchema::text(".teaser"),
                headline: FieldSchema::text("h1"),
                subline: None,
                content: FieldSchema {
                    count: Cardinality::Multiple,
                    ..FieldSchema::text("article p")
                },
                date: FieldSchema {
                    content: ContentMode::Attribute,
                    attribute: "datetime".to_string(),
                    value_type: ValueType::Date,
                    ..FieldSchema::text("time")
                },
            },
        },
    }
}

pub fn record(url: &str, headline: &str, date: DateTime<Utc>) -> ArticleRecord {
    ArticleRecord {
        source_url: "x".to_string(),
        source_name: "x".to_string(),
        url: url.to_string(),
        headline: headline.to_string(),
        date: ArticleDate::Timestamp(date),
        ..Default::default()
    }
}

/// Serve canned pages over plain HTTP/1.1 on a local port; returns `host:port`.
/// Unknown paths answer 404.
pub async fn serve(pages: Vec<(String, String)>) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let pages = pages.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let head = String::from_utf8_lossy(&buf[..n]);
                let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                let (status, body) = match pages.iter().find(|(p, _)| *p == path) {
                    Some((_, body)) => ("200 OK", body.clone()),
                    None => ("404 Not Found", "missing".to_string()),
                };
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr.to_string()
}

/// `serve` with borrowed path/body pairs.
pub async fn serve_static(pages: &[(&str, &str)]) -> String {
    serve(
        pages
            .iter()
            .map(|(path, body)| (path.to_string(), body.to_string()))
            .collect(),
    )
    .await
}
