use async_trait::async_trait;

use crate::error::GeocodeError;
use crate::inventory::device::Coordinates;
use crate::inventory::location::GeocodedPlace;

/// Defines the contract for raw reverse-geocoding lookups.
///
/// Locale and timeout are fixed by the implementation; caching is not its concern.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Resolves `coordinates` to a human-readable place.
    ///
    /// # Returns
    /// * `Ok(GeocodedPlace)` - The display name and address components of the place.
    /// * `Err(GeocodeError)` - Transport failure, no match, or an unreadable answer.
    async fn reverse(&self, coordinates: Coordinates) -> Result<GeocodedPlace, GeocodeError>;
}
