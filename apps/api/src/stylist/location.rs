//! Geolocation with a fixed fallback.
//!
//! The browser reports coordinates when the user allows it. Anything else
//! (denial, no position, nonsense values) resolves to the fallback coordinate
//! so the styling flow never stalls on location.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::stylist::models::Coordinates;

/// Central Tokyo.
pub const FALLBACK_COORDINATES: Coordinates = Coordinates {
    latitude: 35.6895,
    longitude: 139.6917,
};

#[derive(Debug, Error, PartialEq)]
pub enum GeolocationError {
    #[error("Location permission was denied")]
    Denied,

    #[error("Coordinates out of range: ({latitude}, {longitude})")]
    OutOfRange { latitude: f64, longitude: f64 },
}

/// A source of the user's current position.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn locate(&self) -> Result<Coordinates, GeolocationError>;
}

/// Coordinates the client sent along with the request, if any.
pub struct ReportedLocation(pub Option<Coordinates>);

#[async_trait]
impl GeolocationProvider for ReportedLocation {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        let coords = self.0.ok_or(GeolocationError::Denied)?;
        if coords.is_valid() {
            Ok(coords)
        } else {
            Err(GeolocationError::OutOfRange {
                latitude: coords.latitude,
                longitude: coords.longitude,
            })
        }
    }
}

/// Resolves a position, substituting [`FALLBACK_COORDINATES`] on any failure.
pub async fn locate_or_fallback(provider: &dyn GeolocationProvider) -> Coordinates {
    match provider.locate().await {
        Ok(coords) => coords,
        Err(e) => {
            warn!("Geolocation unavailable ({e}), using fallback coordinates");
            FALLBACK_COORDINATES
        }
    }
}
