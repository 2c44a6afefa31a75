//! HTTP adapters behind the port traits of `invsync-common`.
//!
//! * [`meraki`]: the cloud management API, as an [`InventorySource`](invsync_common::source::InventorySource).
//! * [`swis`]: the monitoring platform, as a [`MonitoringGateway`](invsync_common::gateway::MonitoringGateway).
//! * [`nominatim`]: the reverse geocoder, as a [`ReverseGeocoder`](invsync_common::geocoder::ReverseGeocoder).

use std::time::Duration;

use reqwest::Response;
use reqwest::header::RETRY_AFTER;

pub mod meraki;
pub mod nominatim;
pub mod swis;

pub use meraki::MerakiClient;
pub use nominatim::NominatimClient;
pub use swis::SwisClient;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Wait before retrying a throttled request, from its `Retry-After` header (whole seconds).
fn retry_after(response: &Response) -> Duration {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map_or(Duration::from_secs(1), Duration::from_secs)
}

/// Status line plus body of a failed response, for error messages.
async fn describe_failure(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {}", body.trim())
    }
}
