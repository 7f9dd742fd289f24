use crate::domain::model::{Planet, PlanetPosition, PlanetPositions, ZodiacSign};
use crate::domain::ports::{EphemerisProvider, EphemerisQuery};
use crate::utils::error::{MatchError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Deserialize)]
struct EphemerisResponse {
    planets: HashMap<String, RawPlacement>,
}

#[derive(Debug, Deserialize)]
struct RawPlacement {
    sign: String,
    degree: f64,
    house: u8,
}

/// 以 HTTP GET 查詢外部星曆服務
pub struct HttpEphemerisProvider {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpEphemerisProvider {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    fn parse_positions(body: EphemerisResponse) -> Result<PlanetPositions> {
        let mut positions = PlanetPositions::new();
        for (name, placement) in body.planets {
            // 只保留評分用到的七顆星體
            let Ok(planet) = name.parse::<Planet>() else {
                tracing::debug!("Ignoring unsupported body '{}' from ephemeris", name);
                continue;
            };
            let sign = placement.sign.parse::<ZodiacSign>()?;
            positions.insert(
                planet,
                PlanetPosition {
                    sign,
                    degree: placement.degree,
                    house: placement.house,
                },
            );
        }
        Ok(positions)
    }
}

#[async_trait]
impl EphemerisProvider for HttpEphemerisProvider {
    async fn lookup(&self, query: &EphemerisQuery) -> Result<PlanetPositions> {
        tracing::debug!("Making ephemeris request to: {}", self.endpoint);

        let latitude = query.latitude.to_string();
        let longitude = query.longitude.to_string();
        let mut request = self.client.get(&self.endpoint).query(&[
            ("date", query.date.as_str()),
            ("time", query.time.as_str()),
            ("lat", latitude.as_str()),
            ("lon", longitude.as_str()),
            ("tz", query.timezone.as_str()),
        ]);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        tracing::debug!("Ephemeris response status: {}", response.status());

        if !response.status().is_success() {
            return Err(MatchError::EphemerisResponse {
                message: format!("HTTP {}", response.status()),
            });
        }

        let body: EphemerisResponse =
            response
                .json()
                .await
                .map_err(|e| MatchError::EphemerisResponse {
                    message: format!("malformed payload: {}", e),
                })?;

        Self::parse_positions(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn query() -> EphemerisQuery {
        EphemerisQuery {
            date: "1990-03-25".to_string(),
            time: "14:30".to_string(),
            latitude: 51.5,
            longitude: -0.12,
            timezone: "Europe/London".to_string(),
        }
    }

    #[tokio::test]
    async fn test_lookup_sends_query_and_key() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/chart")
                .query_param("date", "1990-03-25")
                .query_param("time", "14:30")
                .query_param("tz", "Europe/London")
                .header(API_KEY_HEADER, "secret");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "planets": {
                        "Sun": {"sign": "Aries", "degree": 4.6, "house": 9},
                        "Moon": {"sign": "capricorn", "degree": 21.0, "house": 5},
                        "Pluto": {"sign": "Scorpio", "degree": 16.0, "house": 4}
                    }
                }));
        });

        let provider = HttpEphemerisProvider::new(
            server.url("/chart"),
            Some("secret".to_string()),
            Duration::from_secs(2),
        )
        .unwrap();
        let positions = provider.lookup(&query()).await.unwrap();

        api_mock.assert();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[&Planet::Sun].sign, ZodiacSign::Aries);
        assert_eq!(positions[&Planet::Moon].sign, ZodiacSign::Capricorn);
        assert_eq!(positions[&Planet::Moon].house, 5);
    }

    #[tokio::test]
    async fn test_server_error_is_ephemeris_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/chart");
            then.status(503);
        });

        let provider =
            HttpEphemerisProvider::new(server.url("/chart"), None, Duration::from_secs(2)).unwrap();
        let err = provider.lookup(&query()).await.unwrap_err();
        assert!(matches!(err, MatchError::EphemerisResponse { .. }));
    }

    #[tokio::test]
    async fn test_unknown_sign_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/chart");
            then.status(200).json_body(serde_json::json!({
                "planets": {"Sun": {"sign": "Ophiuchus", "degree": 3.0, "house": 1}}
            }));
        });

        let provider =
            HttpEphemerisProvider::new(server.url("/chart"), None, Duration::from_secs(2)).unwrap();
        assert!(provider.lookup(&query()).await.is_err());
    }
}
