use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;

use crate::config::Config;
use crate::lunar::{self, Countdown, HOLIDAYS};
use crate::message::Digest;
use crate::quote;
use crate::weather::WeatherClient;
use crate::wechat::{self, SendStatus, TokenProvider};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const LUNAR_UNAVAILABLE: &str = "农历信息获取失败";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    SendFailed { failed: usize, total: usize },
}

/// One run of the daily push: token, weather, lunar calendar, quote, send.
pub struct Notifier {
    config: Config,
    client: Client,
    tokens: TokenProvider,
}

impl Notifier {
    pub fn new(config: Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        let tokens = TokenProvider::new(
            client.clone(),
            &config.endpoints.wechat_base,
            &config.app_id,
            &config.app_secret,
        );
        Ok(Self {
            config,
            client,
            tokens,
        })
    }

    pub async fn run(&mut self, today: NaiveDate) -> Result<RunStatus> {
        let cfg = &self.config;

        tracing::info!("Fetching WeChat access token...");
        Config::required(&cfg.app_id, "app_id")?;
        Config::required(&cfg.app_secret, "app_secret")?;
        let token = self.tokens.token().await?.to_string();

        let region = Config::required(&cfg.region, "region")?;
        tracing::info!("Fetching weather for {region}...");
        let weather = WeatherClient::new(
            self.client.clone(),
            &cfg.endpoints.geo_base,
            &cfg.endpoints.weather_base,
            Config::required(&cfg.weather_key, "weather_key")?,
        );
        let location = weather.resolve(region).await?;
        let snapshot = weather.forecast(&location).await?;

        tracing::info!("Computing lunar calendar for {today}...");
        let (lunar_text, countdowns) = lunar_section(today, cfg.holiday_limit);

        tracing::info!("Fetching daily quote...");
        let quote = quote::daily_quote(&self.client, &cfg.endpoints.quote_url)
            .await
            .into_quote();

        let digest = Digest {
            today,
            region: region.to_string(),
            weather: snapshot,
            lunar: lunar_text,
            countdowns,
            holiday_slots: cfg.holiday_limit,
            quote,
        };

        let template_id = Config::required(&cfg.template_id, "template_id")?;
        let recipients = cfg.recipients()?;
        tracing::info!("Sending template message to {} recipient(s)...", recipients.len());

        let mut failed = 0;
        for user in &recipients {
            let message = digest.to_message(user, template_id, &cfg.link);
            match wechat::send_template(&self.client, &cfg.endpoints.wechat_base, &token, &message)
                .await
            {
                SendStatus::Delivered => tracing::info!("Delivered to {user}"),
                SendStatus::Rejected { errcode, errmsg } => {
                    failed += 1;
                    tracing::error!("WeChat rejected message to {user}: {errcode} {errmsg}");
                }
                SendStatus::Failed(reason) => {
                    failed += 1;
                    tracing::error!("Failed to send message to {user}: {reason}");
                }
            }
        }

        if failed == 0 {
            Ok(RunStatus::Success)
        } else {
            Ok(RunStatus::SendFailed {
                failed,
                total: recipients.len(),
            })
        }
    }
}

/// Lunar summary and holiday countdowns; degrades to a placeholder instead of failing.
pub fn lunar_section(today: NaiveDate, limit: usize) -> (String, Vec<Countdown>) {
    let summary = lunar::describe(today).and_then(|text| {
        let countdowns = lunar::upcoming_countdowns(today, &HOLIDAYS, limit)?;
        Ok((text, countdowns))
    });
    match summary {
        Ok(section) => section,
        Err(e) => {
            tracing::warn!("Lunar calendar unavailable: {e}");
            (LUNAR_UNAVAILABLE.to_string(), Vec::new())
        }
    }
}
