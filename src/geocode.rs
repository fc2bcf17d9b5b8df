//! Reverse geocoding against a Nominatim-compatible service.

use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::models::GeoPoint;

const USER_AGENT: &str = concat!("ride-book/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Place {
    pub display_name: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Clone)]
pub struct ReverseGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl ReverseGeocoder {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn reverse(&self, point: GeoPoint) -> Result<Place, ApiError> {
        let url = format!("{}/reverse", self.base_url);
        debug!("Reverse geocoding ({}, {}) via {}", point.lat, point.lng, url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", point.lat.to_string()),
                ("lon", point.lng.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("Geocoder answered {}", response.status());
            return Err(ApiError::Upstream(format!(
                "geocoder returned {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        place_from_response(point, &body)
    }
}

/// Nominatim reports errors in-band as `{"error": "..."}`.
pub fn place_from_response(point: GeoPoint, body: &Value) -> Result<Place, ApiError> {
    if let Some(message) = body["error"].as_str() {
        return Err(ApiError::Upstream(message.to_string()));
    }
    let display_name = body["display_name"]
        .as_str()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::Upstream("no address found".to_string()))?;

    Ok(Place {
        display_name: display_name.to_string(),
        lat: point.lat,
        lng: point.lng,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const GALLE_FACE: GeoPoint = GeoPoint { lat: 6.9271, lng: 79.8441 };

    #[test]
    fn reads_display_name() {
        let body = json!({
            "place_id": 1,
            "display_name": "Galle Face Green, Colombo, Western Province, Sri Lanka",
            "lat": "6.9271",
            "lon": "79.8441",
        });
        let place = place_from_response(GALLE_FACE, &body).unwrap();
        assert_eq!(place.display_name, "Galle Face Green, Colombo, Western Province, Sri Lanka");
        assert_eq!(place.lat, 6.9271);
    }

    #[test]
    fn in_band_errors_surface() {
        let body = json!({ "error": "Unable to geocode" });
        match place_from_response(GALLE_FACE, &body) {
            Err(ApiError::Upstream(msg)) => assert_eq!(msg, "Unable to geocode"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(place_from_response(GALLE_FACE, &json!({})).is_err());
    }

    #[test]
    fn base_url_is_normalized() {
        let geocoder = ReverseGeocoder::new("https://nominatim.example.org/");
        assert_eq!(geocoder.base_url, "https://nominatim.example.org");
    }
}
