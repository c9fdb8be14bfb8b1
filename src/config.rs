use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct Config {
    /// WeChat Official Account credentials.
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub app_secret: String,
    /// QWeather API key.
    #[serde(default)]
    pub weather_key: String,
    /// Place name looked up for the forecast, e.g. "北京".
    #[serde(default)]
    pub region: String,
    /// OpenIDs of the recipients.
    #[serde(default)]
    pub user: Vec<String>,
    #[serde(default)]
    pub template_id: String,
    /// Page opened when the template message is tapped.
    #[serde(default = "default_link")]
    pub link: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_holiday_limit")]
    pub holiday_limit: usize,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

#[derive(Debug, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_wechat_base")]
    pub wechat_base: String,
    #[serde(default = "default_geo_base")]
    pub geo_base: String,
    #[serde(default = "default_weather_base")]
    pub weather_base: String,
    #[serde(default = "default_quote_url")]
    pub quote_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            wechat_base: default_wechat_base(),
            geo_base: default_geo_base(),
            weather_base: default_weather_base(),
            quote_url: default_quote_url(),
        }
    }
}

fn default_link() -> String {
    "https://github.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_holiday_limit() -> usize {
    3
}

fn default_wechat_base() -> String {
    "https://api.weixin.qq.com".to_string()
}

fn default_geo_base() -> String {
    "https://geoapi.qweather.com".to_string()
}

fn default_weather_base() -> String {
    "https://devapi.qweather.com".to_string()
}

fn default_quote_url() -> String {
    "http://open.iciba.com/dsapi/".to_string()
}

impl Config {
    /// Returns `value`, or fails naming `key` when it is blank.
    pub fn required<'a>(value: &'a str, key: &str) -> Result<&'a str> {
        let value = value.trim();
        if value.is_empty() {
            anyhow::bail!("Missing required config key `{key}`");
        }
        Ok(value)
    }

    /// Non-blank recipient OpenIDs. Blank entries are skipped with a warning.
    pub fn recipients(&self) -> Result<Vec<&str>> {
        let users: Vec<&str> = self
            .user
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .collect();
        if users.is_empty() {
            anyhow::bail!("Missing required config key `user`");
        }
        if users.len() < self.user.len() {
            tracing::warn!(
                "Skipping {} blank `user` entries",
                self.user.len() - users.len()
            );
        }
        Ok(users)
    }
}

pub fn load(path: &str) -> Result<Config> {
    let path = expand_tilde(path);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    parse(&path, &content)
}

fn parse(path: &Path, content: &str) -> Result<Config> {
    if path.extension().is_some_and(|e| e == "json") {
        serde_json::from_str(content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    } else {
        toml::from_str(content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

pub async fn init_config(path: &str) -> Result<bool> {
    let path = expand_tilde(path);
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(
        &path,
        r#"# WeChat Official Account (test accounts work too)
app_id = "YOUR_APP_ID"
app_secret = "YOUR_APP_SECRET"
template_id = "YOUR_TEMPLATE_ID"
# OpenIDs of everyone who should receive the message
user = ["RECIPIENT_OPENID"]

# QWeather (https://dev.qweather.com)
weather_key = "YOUR_QWEATHER_KEY"
region = "北京"

# link = "https://github.com"
# timeout_secs = 10
# holiday_limit = 3

# [endpoints]
# wechat_base = "https://api.weixin.qq.com"
# geo_base = "https://geoapi.qweather.com"
# weather_base = "https://devapi.qweather.com"
# quote_url = "http://open.iciba.com/dsapi/"
"#,
    )
    .await
    .with_context(|| format!("Failed to write config: {}", path.display()))?;
    Ok(true)
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
