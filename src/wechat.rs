use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

use crate::message::TemplateMessage;

/// Fetches the Official Account access token once and reuses it for the run.
pub struct TokenProvider {
    client: Client,
    base_url: String,
    app_id: String,
    app_secret: String,
    cached: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    errcode: Option<i64>,
    errmsg: Option<String>,
}

#[derive(Deserialize)]
struct SendResponse {
    errcode: Option<i64>,
    #[serde(default)]
    errmsg: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendStatus {
    Delivered,
    Rejected { errcode: i64, errmsg: String },
    Failed(String),
}

impl TokenProvider {
    pub fn new(client: Client, base_url: &str, app_id: &str, app_secret: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id: app_id.to_string(),
            app_secret: app_secret.to_string(),
            cached: None,
        }
    }

    pub async fn token(&mut self) -> Result<&str> {
        if self.cached.is_none() {
            self.cached = Some(self.fetch().await?);
        }
        Ok(self.cached.as_deref().unwrap_or_default())
    }

    async fn fetch(&self) -> Result<String> {
        let url = format!("{}/cgi-bin/token", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("grant_type", "client_credential"),
                ("appid", self.app_id.as_str()),
                ("secret", self.app_secret.as_str()),
            ])
            .send()
            .await
            .context("Failed to call WeChat token API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("WeChat token API error ({}): {}", status, body);
        }

        let body: TokenResponse = response
            .json()
            .await
            .context("Failed to parse WeChat token response")?;

        match body.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => anyhow::bail!(
                "WeChat token API returned no access_token (errcode {}: {})",
                body.errcode.unwrap_or_default(),
                body.errmsg.unwrap_or_default()
            ),
        }
    }
}

/// Posts a template message. Never retries; every outcome is a `SendStatus`.
pub async fn send_template(
    client: &Client,
    base_url: &str,
    token: &str,
    message: &TemplateMessage,
) -> SendStatus {
    let url = format!(
        "{}/cgi-bin/message/template/send",
        base_url.trim_end_matches('/')
    );
    let response = match client
        .post(&url)
        .query(&[("access_token", token)])
        .json(message)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => return SendStatus::Failed(format!("request failed: {e}")),
    };

    let status = response.status();
    if !status.is_success() {
        return SendStatus::Failed(format!("HTTP {status}"));
    }

    match response.json::<SendResponse>().await {
        Ok(SendResponse {
            errcode: Some(0), ..
        }) => SendStatus::Delivered,
        Ok(body) => SendStatus::Rejected {
            errcode: body.errcode.unwrap_or(-1),
            errmsg: body.errmsg,
        },
        Err(e) => SendStatus::Failed(format!("unreadable response: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::extract::Query;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::*;
    use crate::test_support::serve;

    fn message() -> TemplateMessage {
        TemplateMessage::new("openid", "tpl", "https://github.com")
    }

    #[tokio::test]
    async fn test_token_is_fetched_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/cgi-bin/token",
            get(move |Query(q): Query<HashMap<String, String>>| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(q["appid"], "wx123");
                    assert_eq!(q["secret"], "s3cret");
                    assert_eq!(q["grant_type"], "client_credential");
                    Json(json!({"access_token": "TOKEN", "expires_in": 7200}))
                }
            }),
        );
        let base = serve(app).await;

        let mut tokens = TokenProvider::new(Client::new(), &base, "wx123", "s3cret");
        assert_eq!(tokens.token().await.unwrap(), "TOKEN");
        assert_eq!(tokens.token().await.unwrap(), "TOKEN");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_token_error_response_is_fatal() {
        let app = Router::new().route(
            "/cgi-bin/token",
            get(|| async { Json(json!({"errcode": 40013, "errmsg": "invalid appid"})) }),
        );
        let base = serve(app).await;

        let mut tokens = TokenProvider::new(Client::new(), &base, "bad", "bad");
        let err = tokens.token().await.unwrap_err().to_string();
        assert!(err.contains("40013"), "{err}");
        assert!(err.contains("invalid appid"), "{err}");
    }

    #[tokio::test]
    async fn test_send_delivered() {
        let app = Router::new().route(
            "/cgi-bin/message/template/send",
            post(
                |Query(q): Query<HashMap<String, String>>, Json(body): Json<Value>| async move {
                    assert_eq!(q["access_token"], "TOKEN");
                    assert_eq!(body["touser"], "openid");
                    assert_eq!(body["template_id"], "tpl");
                    Json(json!({"errcode": 0, "errmsg": "ok", "msgid": 1}))
                },
            ),
        );
        let base = serve(app).await;

        let status = send_template(&Client::new(), &base, "TOKEN", &message()).await;
        assert_eq!(status, SendStatus::Delivered);
    }

    #[tokio::test]
    async fn test_send_rejected() {
        let app = Router::new().route(
            "/cgi-bin/message/template/send",
            post(|| async { Json(json!({"errcode": 40037, "errmsg": "invalid template_id"})) }),
        );
        let base = serve(app).await;

        let status = send_template(&Client::new(), &base, "TOKEN", &message()).await;
        assert_eq!(
            status,
            SendStatus::Rejected {
                errcode: 40037,
                errmsg: "invalid template_id".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_send_unreachable_is_failure() {
        // Nothing listens on the discard port.
        let status = send_template(&Client::new(), "http://127.0.0.1:9", "TOKEN", &message()).await;
        assert!(matches!(status, SendStatus::Failed(_)));
    }
}
