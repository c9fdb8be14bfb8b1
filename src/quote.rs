use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

const FALLBACK_ORIGINAL: &str = "The best preparation for tomorrow is doing your best today.";
const FALLBACK_TRANSLATED: &str = "对明天最好的准备就是今天做到最好";
const MISSING_ORIGINAL: &str = "Have a nice day!";
const MISSING_TRANSLATED: &str = "祝你今天愉快!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub original: String,
    pub translated: String,
}

impl Quote {
    pub fn fallback() -> Self {
        Self {
            original: FALLBACK_ORIGINAL.to_string(),
            translated: FALLBACK_TRANSLATED.to_string(),
        }
    }
}

/// Outcome of the daily quote lookup; the fallback branch is a value, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyQuote {
    Fetched(Quote),
    Fallback(Quote),
}

impl DailyQuote {
    pub fn from_result(result: Result<Quote>) -> Self {
        match result {
            Ok(quote) => DailyQuote::Fetched(quote),
            Err(e) => {
                tracing::warn!("Daily quote unavailable, using fallback: {e:#}");
                DailyQuote::Fallback(Quote::fallback())
            }
        }
    }

    pub fn into_quote(self) -> Quote {
        match self {
            DailyQuote::Fetched(q) | DailyQuote::Fallback(q) => q,
        }
    }
}

// iciba "dsapi" payload; only the sentence pair is used.
#[derive(Deserialize)]
struct IcibaResponse {
    content: Option<String>,
    note: Option<String>,
}

pub async fn daily_quote(client: &Client, url: &str) -> DailyQuote {
    DailyQuote::from_result(fetch(client, url).await)
}

async fn fetch(client: &Client, url: &str) -> Result<Quote> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to call {url}"))?
        .error_for_status()?;

    // The endpoint does not always label its JSON as such.
    let text = response.text().await?;
    let body: IcibaResponse =
        serde_json::from_str(&text).context("Failed to parse quote response")?;

    Ok(Quote {
        original: body
            .content
            .unwrap_or_else(|| MISSING_ORIGINAL.to_string()),
        translated: body
            .note
            .unwrap_or_else(|| MISSING_TRANSLATED.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::test_support::serve;

    #[test]
    fn test_fallback_branch_from_error() {
        let quote = DailyQuote::from_result(Err(anyhow::anyhow!("connection reset")));
        assert_eq!(
            quote,
            DailyQuote::Fallback(Quote {
                original: "The best preparation for tomorrow is doing your best today."
                    .to_string(),
                translated: "对明天最好的准备就是今天做到最好".to_string(),
            })
        );
    }

    #[test]
    fn test_fetched_branch_from_ok() {
        let q = Quote {
            original: "a".to_string(),
            translated: "b".to_string(),
        };
        let quote = DailyQuote::from_result(Ok(q.clone()));
        assert_eq!(quote, DailyQuote::Fetched(q.clone()));
        assert_eq!(quote.into_quote(), q);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back() {
        let quote = daily_quote(&Client::new(), "http://127.0.0.1:9/dsapi/").await;
        assert_eq!(quote, DailyQuote::Fallback(Quote::fallback()));
    }

    #[tokio::test]
    async fn test_server_error_falls_back() {
        let app = Router::new().route(
            "/dsapi/",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = serve(app).await;
        let quote = daily_quote(&Client::new(), &format!("{base}/dsapi/")).await;
        assert_eq!(quote, DailyQuote::Fallback(Quote::fallback()));
    }

    #[tokio::test]
    async fn test_fetched_quote_and_missing_fields() {
        let app = Router::new()
            .route(
                "/dsapi/",
                get(|| async {
                    Json(json!({
                        "content": "Stay hungry, stay foolish.",
                        "note": "求知若饥，虚心若愚。",
                        "dateline": "2024-02-08"
                    }))
                }),
            )
            .route("/partial/", get(|| async { Json(json!({"dateline": "2024-02-08"})) }))
            .route("/garbage/", get(|| async { "<html>not json</html>" }));
        let base = serve(app).await;
        let client = Client::new();

        let quote = daily_quote(&client, &format!("{base}/dsapi/")).await;
        assert_eq!(
            quote,
            DailyQuote::Fetched(Quote {
                original: "Stay hungry, stay foolish.".to_string(),
                translated: "求知若饥，虚心若愚。".to_string(),
            })
        );

        let partial = daily_quote(&client, &format!("{base}/partial/")).await;
        assert_eq!(
            partial.into_quote(),
            Quote {
                original: "Have a nice day!".to_string(),
                translated: "祝你今天愉快!".to_string(),
            }
        );

        let garbage = daily_quote(&client, &format!("{base}/garbage/")).await;
        assert_eq!(garbage, DailyQuote::Fallback(Quote::fallback()));
    }
}
