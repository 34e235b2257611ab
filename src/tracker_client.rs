use async_trait::async_trait;
use reqwest::redirect::{Attempt, Policy};
use reqwest::Url;
use tracing::{debug, warn};

use crate::config::TrackerConfig;
use crate::error::FetchError;
use crate::room_url::{is_valid_room_code, AllowList};
use crate::status::{decode_status, RoomStatus};

// ============================================================================
// SOURCE ABSTRACTION
// ============================================================================

/// Where room pages and room status come from
#[async_trait]
pub trait TrackerSource: Send + Sync {
    /// Fetches the room page. Transport failures and non-2xx responses are errors.
    async fn fetch_html(&self, url: &Url) -> Result<String, FetchError>;

    /// Fetches and decodes the room status. Any failure yields `None`.
    async fn fetch_status(&self, room_code: &str) -> Option<RoomStatus>;
}

// ============================================================================
// HTTP CLIENT
// ============================================================================

/// reqwest-backed tracker source
#[derive(Debug, Clone)]
pub struct HttpTrackerClient {
    client: reqwest::Client,
    api_base: Url,
}

impl HttpTrackerClient {
    /// Builds a client with the configured timeout and user agent. No cookie store.
    /// Redirects are only followed to allow-listed hosts.
    pub fn new(config: &TrackerConfig) -> Result<HttpTrackerClient, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .redirect(redirect_policy(config))
            .build()?;

        Ok(HttpTrackerClient {
            client,
            api_base: config.api_base.clone(),
        })
    }

    /// `<api-base>/room_status/<room_code>`
    pub fn status_url(&self, room_code: &str) -> Option<Url> {
        if !is_valid_room_code(room_code) {
            return None;
        }
        self.api_base.join(&format!("room_status/{}", room_code)).ok()
    }

    async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

const MAX_REDIRECTS: usize = 10;

/// Follows a redirect only when the next hop stays on the stored-URL allow-list
/// or on the API base host.
fn redirect_policy(config: &TrackerConfig) -> Policy {
    let allow_list = config.stored_allow_list();
    let api_host = config.api_base.host_str().map(str::to_ascii_lowercase);

    Policy::custom(move |attempt| follow_if_allowed(attempt, &allow_list, api_host.as_deref()))
}

fn follow_if_allowed(attempt: Attempt, allow_list: &AllowList, api_host: Option<&str>) -> reqwest::redirect::Action {
    if attempt.previous().len() >= MAX_REDIRECTS {
        return attempt.error("too many redirects");
    }

    let next_host = attempt.url().host_str().unwrap_or_default().to_ascii_lowercase();
    let allowed = allow_list.permits(&next_host) || api_host == Some(next_host.as_str());
    if allowed {
        attempt.follow()
    } else {
        warn!("Refusing redirect to {}", attempt.url());
        let message = format!("redirect to disallowed host '{}'", next_host);
        attempt.error(message)
    }
}

#[async_trait]
impl TrackerSource for HttpTrackerClient {
    async fn fetch_html(&self, url: &Url) -> Result<String, FetchError> {
        let response = self.client.get(url.clone()).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    async fn fetch_status(&self, room_code: &str) -> Option<RoomStatus> {
        let url = self.status_url(room_code)?;

        let body = match self.get_bytes(url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Room status unavailable for {}: {}", room_code, e);
                return None;
            }
        };

        let status = decode_status(&body);
        if status.is_none() {
            warn!("Room status for {} is not a JSON object", room_code);
        } else {
            debug!("Decoded room status for {}", room_code);
        }
        status
    }
}

// ============================================================================
// TESTS
// ============================================================================
