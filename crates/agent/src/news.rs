//! Headline sentiment from NewsAPI.
//!
//! News is optional context: without `NEWSAPI_KEY` no source is built, and a
//! failed fetch degrades to "no recent headlines" for that cycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use llm_trade_core::{Headline, HeadlineSource, NewsConfig, NewsDigest, NewsError};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

/// Environment variable holding the NewsAPI key.
pub const NEWSAPI_KEY_ENV: &str = "NEWSAPI_KEY";

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    title: Option<String>,
    description: Option<String>,
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
}

/// Searches NewsAPI's `everything` endpoint, newest first.
pub struct NewsApiClient {
    http: Client,
    api_url: String,
    api_key: SecretString,
    query: String,
    page_size: usize,
}

impl std::fmt::Debug for NewsApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsApiClient")
            .field("api_url", &self.api_url)
            .field("query", &self.query)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl NewsApiClient {
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &NewsConfig, api_key: SecretString) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            query: config.query.clone(),
            page_size: config.page_size,
        })
    }

    /// Builds a client when `NEWSAPI_KEY` is set; `None` otherwise.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn from_env(config: &NewsConfig) -> anyhow::Result<Option<Self>> {
        match std::env::var(NEWSAPI_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Self::new(config, SecretString::from(key)).map(Some),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl HeadlineSource for NewsApiClient {
    async fn headlines(&self) -> Result<Vec<Headline>, NewsError> {
        let page_size = self.page_size.to_string();
        let response = self
            .http
            .get(format!("{}/everything", self.api_url))
            .header("X-Api-Key", self.api_key.expose_secret())
            .query(&[
                ("q", self.query.as_str()),
                ("pageSize", page_size.as_str()),
                ("sortBy", "publishedAt"),
            ])
            .send()
            .await
            .map_err(|e| NewsError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or(body);
            return Err(NewsError::Api {
                status_code: status.as_u16(),
                message,
            });
        }

        let body: EverythingResponse = response
            .json()
            .await
            .map_err(|e| NewsError::InvalidResponse(e.to_string()))?;

        // articles without a title or timestamp cannot be scored
        Ok(body
            .articles
            .into_iter()
            .filter_map(|a| {
                Some(Headline {
                    title: a.title?,
                    description: a.description.unwrap_or_default(),
                    published_at: a.published_at?,
                })
            })
            .collect())
    }
}

/// Scores the latest headlines from `source`. Failures are logged and read
/// as no news.
pub async fn fetch_digest<S: HeadlineSource + ?Sized>(source: &S) -> NewsDigest {
    match source.headlines().await {
        Ok(headlines) => {
            let digest = NewsDigest::from_headlines(&headlines, Utc::now());
            tracing::debug!(
                headlines = digest.titles.len(),
                score = %digest.score,
                impact = %digest.impact,
                "News sentiment"
            );
            digest
        }
        Err(e) => {
            tracing::warn!(error = %e, "News fetch failed, continuing without headlines");
            NewsDigest::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> NewsApiClient {
        let config = NewsConfig {
            api_url: server.uri(),
            query: "bitcoin".to_string(),
            page_size: 5,
            timeout_secs: 5,
        };
        NewsApiClient::new(&config, SecretString::from("news-key".to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_fetches_and_scores_headlines() {
        let server = MockServer::start().await;
        let published = (Utc::now() - chrono::Duration::hours(1)).to_rfc3339();
        Mock::given(method("GET"))
            .and(path("/everything"))
            .and(header("X-Api-Key", "news-key"))
            .and(query_param("q", "bitcoin"))
            .and(query_param("pageSize", "5"))
            .and(query_param("sortBy", "publishedAt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok",
                "totalResults": 3,
                "articles": [
                    {"title": "Bitcoin rally extends", "description": "ETF inflows", "publishedAt": published},
                    {"title": null, "description": "no title", "publishedAt": published},
                    {"title": "Undated", "description": null}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let headlines = client.headlines().await.unwrap();
        assert_eq!(headlines.len(), 1);
        assert_eq!(headlines[0].description, "ETF inflows");

        let digest = fetch_digest(&client).await;
        assert_eq!(digest.titles, vec!["Bitcoin rally extends".to_string()]);
        assert!(digest.score > rust_decimal::Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_api_error_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "status": "error",
                "code": "apiKeyInvalid",
                "message": "Your API key is invalid"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).headlines().await.unwrap_err();
        assert_eq!(
            err,
            NewsError::Api {
                status_code: 401,
                message: "Your API key is invalid".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_reads_as_no_news() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let digest = fetch_digest(&client_for(&server)).await;
        assert!(digest.is_empty());
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = NewsApiClient::new(
            &NewsConfig {
                api_url: "https://newsapi.org/v2".to_string(),
                query: "bitcoin".to_string(),
                page_size: 5,
                timeout_secs: 5,
            },
            SecretString::from("news-key".to_string()),
        )
        .unwrap();
        assert!(!format!("{client:?}").contains("news-key"));
    }
}
