//! Cache-first reverse geocoding of device coordinates.

use invsync_common::error::GeocodeError;
use invsync_common::geocoder::ReverseGeocoder;
use invsync_common::inventory::device::Coordinates;
use invsync_common::inventory::location::{GeocodedPlace, LocationRecord};
use thiserror::Error;
use tracing::debug;

use crate::cache::{CacheError, LocationCache};

#[derive(Debug, Error)]
pub enum GeolocationError {
    #[error("device has no coordinates")]
    MissingCoordinates,
    #[error(transparent)]
    Lookup(#[from] GeocodeError),
    #[error("geocoder result has no {0}")]
    MissingField(&'static str),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

pub struct GeolocationResolver<'a> {
    cache: &'a mut LocationCache,
    geocoder: &'a dyn ReverseGeocoder,
}

impl<'a> GeolocationResolver<'a> {
    pub fn new(cache: &'a mut LocationCache, geocoder: &'a dyn ReverseGeocoder) -> Self {
        Self { cache, geocoder }
    }

    /// Returns the location of the device with `serial`.
    ///
    /// A cached serial is answered from memory, whatever `coordinates` says. Otherwise the
    /// coordinates are reverse-geocoded once and the result is persisted before it is returned.
    pub async fn resolve(
        &mut self,
        serial: &str,
        coordinates: Option<Coordinates>,
    ) -> Result<LocationRecord, GeolocationError> {
        if let Some(record) = self.cache.get(serial) {
            debug!("Location of {serial} served from cache");
            return Ok(record.clone());
        }

        let coordinates = coordinates.ok_or(GeolocationError::MissingCoordinates)?;
        debug!("Reverse geocoding {serial} at {coordinates}");
        let place = self.geocoder.reverse(coordinates).await?;
        let record = build_record(serial, coordinates, place)?;

        Ok(self.cache.append(record)?.clone())
    }

    pub fn cache(&self) -> &LocationCache {
        self.cache
    }
}

fn build_record(
    serial: &str,
    coordinates: Coordinates,
    place: GeocodedPlace,
) -> Result<LocationRecord, GeolocationError> {
    // Without any locality field the whole display name stands in for the city.
    let city = place
        .address
        .locality()
        .map(str::to_string)
        .unwrap_or_else(|| place.display_name.clone());
    let country = place.address.country.ok_or(GeolocationError::MissingField("country"))?;
    let state = place.address.state.ok_or(GeolocationError::MissingField("state"))?;

    Ok(LocationRecord {
        serial: serial.to_string(),
        lat: coordinates.lat,
        lng: coordinates.lng,
        country,
        state,
        city,
        address: place.display_name,
    })
}
