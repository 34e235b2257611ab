use reqwest::Url;
use std::fmt;

use crate::error::ValidationError;

// ============================================================================
// ALLOW-LIST
// ============================================================================

/// Hosts the service is willing to talk to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    domain: String,
    hosts: Vec<String>,
}

impl AllowList {
    /// Allow-list applied to URLs submitted by users: the canonical domain only.
    pub fn submission(domain: &str) -> AllowList {
        let domain = domain.to_ascii_lowercase();
        AllowList {
            hosts: vec![domain.clone()],
            domain,
        }
    }

    /// Allow-list applied to stored URLs right before fetching: domain and www.domain.
    pub fn stored(domain: &str) -> AllowList {
        let domain = domain.to_ascii_lowercase();
        AllowList {
            hosts: vec![domain.clone(), format!("www.{}", domain)],
            domain,
        }
    }

    /// The canonical tracker domain.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn permits(&self, host: &str) -> bool {
        self.hosts.iter().any(|allowed| allowed.eq_ignore_ascii_case(host))
    }
}

// ============================================================================
// VALIDATED URL
// ============================================================================

/// An https room URL on an allow-listed host, with its room code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSourceUrl {
    url: Url,
    room_code: String,
}

impl TrackerSourceUrl {
    pub fn as_url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Room identifier taken from the second path segment.
    pub fn room_code(&self) -> &str {
        &self.room_code
    }
}

impl fmt::Display for TrackerSourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Room codes are restricted to ASCII letters, digits, '_' and '-'.
pub fn is_valid_room_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Validates a room URL against the allow-list. Rules are checked in order and the
/// first failing rule is reported.
pub fn validate_room_url(raw: &str, allow_list: &AllowList) -> Result<TrackerSourceUrl, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::MissingUrl);
    }

    let url = Url::parse(raw).map_err(|_| ValidationError::NotAbsolute)?;

    if url.scheme() != "https" {
        return Err(ValidationError::WrongScheme);
    }

    let host_allowed = url.host_str().map_or(false, |host| allow_list.permits(host));
    if !host_allowed {
        return Err(ValidationError::WrongHost {
            domain: allow_list.domain().to_string(),
        });
    }

    let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() != 2 || !segments[0].eq_ignore_ascii_case("room") {
        return Err(ValidationError::WrongPath {
            domain: allow_list.domain().to_string(),
        });
    }

    let room_code = segments[1];
    if !is_valid_room_code(room_code) {
        return Err(ValidationError::InvalidRoomCode);
    }

    let room_code = room_code.to_string();
    Ok(TrackerSourceUrl { url, room_code })
}

// ============================================================================
// TESTS
// ============================================================================
