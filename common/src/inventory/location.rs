use serde::{Deserialize, Serialize};

/// A resolved location, cached per device serial.
///
/// Field order is the on-disk column order of the location cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub serial: String,
    pub lat: f64,
    pub lng: f64,
    pub country: String,
    pub state: String,
    pub city: String,
    pub address: String,
}

/// Raw reverse-geocoding answer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeocodedPlace {
    pub display_name: String,
    pub address: AddressComponents,
}

/// The address components the resolver looks at. Everything else the geocoder sends is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AddressComponents {
    pub city: Option<String>,
    pub village: Option<String>,
    pub municipality: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl AddressComponents {
    /// Locality name: first present of city, village, municipality, county.
    pub fn locality(&self) -> Option<&str> {
        [&self.city, &self.village, &self.municipality, &self.county]
            .into_iter()
            .find_map(|field| field.as_deref())
    }
}
