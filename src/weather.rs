use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

/// QWeather city lookup + 3-day forecast.
pub struct WeatherClient {
    client: Client,
    geo_base: String,
    weather_base: String,
    key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherSnapshot {
    pub temp_min: String,
    pub temp_max: String,
    pub text_day: String,
    pub text_night: String,
}

impl WeatherSnapshot {
    pub fn temperature(&self) -> String {
        format!("{}~{}°C", self.temp_min, self.temp_max)
    }

    pub fn conditions(&self) -> String {
        format!("{}转{}", self.text_day, self.text_night)
    }
}

// --- Response types ---

#[derive(Deserialize)]
struct LookupResponse {
    code: String,
    #[serde(default)]
    location: Vec<Location>,
}

#[derive(Deserialize)]
struct Location {
    id: String,
}

#[derive(Deserialize)]
struct ForecastResponse {
    code: String,
    #[serde(default)]
    daily: Vec<DailyForecast>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyForecast {
    temp_min: String,
    temp_max: String,
    text_day: String,
    text_night: String,
}

fn check_code(code: &str) -> Result<()> {
    match code {
        "200" => Ok(()),
        "404" => anyhow::bail!("invalid region name, check `region` in config"),
        "401" => anyhow::bail!("invalid weather API key, check `weather_key` in config"),
        other => anyhow::bail!("weather API returned code {other}"),
    }
}

impl WeatherClient {
    pub fn new(client: Client, geo_base: &str, weather_base: &str, key: &str) -> Self {
        Self {
            client,
            geo_base: geo_base.trim_end_matches('/').to_string(),
            weather_base: weather_base.trim_end_matches('/').to_string(),
            key: key.to_string(),
        }
    }

    /// Resolves a place name to a QWeather location id.
    pub async fn resolve(&self, region: &str) -> Result<String> {
        let url = format!("{}/v2/city/lookup", self.geo_base);
        let body: LookupResponse = self
            .get_json(&url, region)
            .await
            .context("Failed to look up weather location")?;
        check_code(&body.code).context("Failed to look up weather location")?;

        body.location
            .into_iter()
            .next()
            .map(|l| l.id)
            .ok_or_else(|| anyhow::anyhow!("No weather location found for {region}"))
    }

    /// Today's entry of the 3-day forecast.
    pub async fn forecast(&self, location_id: &str) -> Result<WeatherSnapshot> {
        let url = format!("{}/v7/weather/3d", self.weather_base);
        let body: ForecastResponse = self
            .get_json(&url, location_id)
            .await
            .context("Failed to fetch weather forecast")?;
        check_code(&body.code).context("Failed to fetch weather forecast")?;

        let today = body
            .daily
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty daily forecast for location {location_id}"))?;
        Ok(WeatherSnapshot {
            temp_min: today.temp_min,
            temp_max: today.temp_max,
            text_day: today.text_day,
            text_night: today.text_night,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, location: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .query(&[("location", location), ("key", self.key.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to call {url}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Weather API error ({}): {}", status, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {url}"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::test_support::serve;

    fn qweather() -> Router {
        Router::new()
            .route(
                "/v2/city/lookup",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    match (q["location"].as_str(), q["key"].as_str()) {
                        (_, k) if k != "good-key" => Json(json!({"code": "401"})),
                        ("北京", _) => Json(json!({
                            "code": "200",
                            "location": [{"name": "北京", "id": "101010100"}]
                        })),
                        ("无人区", _) => Json(json!({"code": "200", "location": []})),
                        _ => Json(json!({"code": "404"})),
                    }
                }),
            )
            .route(
                "/v7/weather/3d",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    assert_eq!(q["location"], "101010100");
                    Json(json!({
                        "code": "200",
                        "daily": [
                            {"fxDate": "2024-02-08", "tempMin": "-3", "tempMax": "6",
                             "textDay": "晴", "textNight": "多云"},
                            {"fxDate": "2024-02-09", "tempMin": "-1", "tempMax": "8",
                             "textDay": "阴", "textNight": "阴"}
                        ]
                    }))
                }),
            )
    }

    #[tokio::test]
    async fn test_resolve_and_forecast() {
        let base = serve(qweather()).await;
        let weather = WeatherClient::new(Client::new(), &base, &base, "good-key");

        let id = weather.resolve("北京").await.unwrap();
        assert_eq!(id, "101010100");

        let snapshot = weather.forecast(&id).await.unwrap();
        assert_eq!(snapshot.temperature(), "-3~6°C");
        assert_eq!(snapshot.conditions(), "晴转多云");
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let base = serve(qweather()).await;
        let weather = WeatherClient::new(Client::new(), &base, &base, "bad-key");
        let err = format!("{:#}", weather.resolve("北京").await.unwrap_err());
        assert!(err.contains("invalid weather API key"), "{err}");
    }

    #[tokio::test]
    async fn test_invalid_region() {
        let base = serve(qweather()).await;
        let weather = WeatherClient::new(Client::new(), &base, &base, "good-key");
        let err = format!("{:#}", weather.resolve("火星").await.unwrap_err());
        assert!(err.contains("invalid region name"), "{err}");
    }

    #[tokio::test]
    async fn test_empty_location_list() {
        let base = serve(qweather()).await;
        let weather = WeatherClient::new(Client::new(), &base, &base, "good-key");
        assert!(weather.resolve("无人区").await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_forecast() {
        let app = Router::new().route(
            "/v7/weather/3d",
            get(|| async { Json(json!({"code": "200", "daily": [{"tempMin": "1"}]})) }),
        );
        let base = serve(app).await;
        let weather = WeatherClient::new(Client::new(), &base, &base, "good-key");
        assert!(weather.forecast("101010100").await.is_err());
    }

    #[test]
    fn test_check_code() {
        assert!(check_code("200").is_ok());
        assert!(check_code("404").is_err());
        assert!(check_code("401").is_err());
        assert!(check_code("429").unwrap_err().to_string().contains("429"));
    }
}
