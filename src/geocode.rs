use std::time::Duration;

use anyhow::{Context, Result};
use geo_types::Point;
use log::{debug, warn};
use serde::Deserialize;
use tokio::time::Instant;

/// Resolves a free-text place name to a coordinate.
///
/// Implementations must never fail loudly: an unresolvable name is `None`,
/// logged by the implementation, and the caller carries on.
#[allow(async_fn_in_trait)]
pub trait Geocoder {
    async fn resolve(&mut self, name: &str) -> Option<Point<f64>>;
}

/// One result row of a Nominatim `/search` response. Coordinates come back
/// as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

/// Geocoding client for a Nominatim-compatible search endpoint.
///
/// Queries get a region qualifier appended (", India" by default) to
/// disambiguate place names. Consecutive requests are separated by a minimum
/// delay to respect the service's rate limit; this is a hard sequencing
/// constraint, enforced here so no caller can forget it.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    region: String,
    min_delay: Duration,
    last_request: Option<Instant>,
}

impl NominatimGeocoder {
    pub fn new(base_url: String, region: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("highway-tracer/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("failed to build geocoding HTTP client")?;

        Ok(Self {
            client,
            base_url,
            region,
            min_delay: Duration::from_secs(1),
            last_request: None,
        })
    }

    async fn throttle(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_delay {
                tokio::time::sleep(self.min_delay - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    async fn search(&self, query: &str) -> Result<Vec<NominatimPlace>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

impl Geocoder for NominatimGeocoder {
    async fn resolve(&mut self, name: &str) -> Option<Point<f64>> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        self.throttle().await;

        let query = format!("{}, {}", name, self.region);
        let places = match self.search(&query).await {
            Ok(places) => places,
            Err(e) => {
                warn!("Geocoding request for {:?} failed: {}", name, e);
                return None;
            }
        };

        let Some(place) = places.first() else {
            warn!("No geocoding result for {:?}", name);
            return None;
        };

        match (place.lon.parse::<f64>(), place.lat.parse::<f64>()) {
            (Ok(lon), Ok(lat)) => {
                debug!("Resolved {:?} to ({}, {}): {}", name, lat, lon, place.display_name);
                Some(Point::new(lon, lat))
            }
            _ => {
                warn!(
                    "Unparseable coordinates for {:?}: lat={:?} lon={:?}",
                    name, place.lat, place.lon
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_name_resolves_to_none_without_a_request() {
        let mut geocoder = NominatimGeocoder::new(
            "http://localhost:1/search".to_string(),
            "India".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(geocoder.resolve("").await.is_none());
        assert!(geocoder.resolve("   ").await.is_none());
        // No request was made, so the throttle clock never started.
        assert!(geocoder.last_request.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_requests_are_separated_by_the_minimum_delay() {
        let mut geocoder = NominatimGeocoder::new(
            "http://localhost:1/search".to_string(),
            "India".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();

        geocoder.throttle().await;
        let first = Instant::now();
        geocoder.throttle().await;
        assert!(Instant::now() - first >= geocoder.min_delay);
    }
}
