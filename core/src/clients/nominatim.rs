use std::time::Duration;

use async_trait::async_trait;
use invsync_common::config::GeocoderSettings;
use invsync_common::error::GeocodeError;
use invsync_common::geocoder::ReverseGeocoder;
use invsync_common::inventory::device::Coordinates;
use invsync_common::inventory::location::{AddressComponents, GeocodedPlace};
use reqwest::Client;
use serde::Deserialize;

use super::describe_failure;

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    #[serde(default)]
    address: AddressComponents,
    error: Option<String>,
}

/// Reverse geocoding against a Nominatim instance.
pub struct NominatimClient {
    http: Client,
    base_url: String,
    language: String,
}

impl NominatimClient {
    pub fn new(settings: &GeocoderSettings) -> Result<Self, GeocodeError> {
        let http = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            language: settings.language.clone(),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    async fn reverse(&self, coordinates: Coordinates) -> Result<GeocodedPlace, GeocodeError> {
        let response = self
            .http
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", coordinates.lat.to_string()),
                ("lon", coordinates.lng.to_string()),
                ("accept-language", self.language.clone()),
            ])
            .send()
            .await
            .map_err(|e| GeocodeError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeocodeError::Request(describe_failure(response).await));
        }

        let body: ReverseResponse = response.json().await.map_err(|e| GeocodeError::Decode(e.to_string()))?;
        if let Some(error) = body.error {
            return Err(GeocodeError::NotFound(error));
        }
        let display_name = body
            .display_name
            .ok_or_else(|| GeocodeError::NotFound(format!("nothing at {coordinates}")))?;

        Ok(GeocodedPlace {
            display_name,
            address: body.address,
        })
    }
}
