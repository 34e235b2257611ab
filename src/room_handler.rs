use scraper::Html;
use serde::Serialize;
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};

use crate::error::{FetchError, TrackerError};
use crate::registry::RoomRecord;
use crate::room_url::{validate_room_url, AllowList};
use crate::status::RoomStatus;
use crate::table_handler::{extract_hints, extract_players, HintRow, PlayerRow};
use crate::tracker_client::TrackerSource;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Live state of one room, assembled per request and never stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_code: String,
    pub tracker_url: String,
    #[serde(rename = "roomStatus")]
    pub status: Option<RoomStatus>,
    pub players: Vec<PlayerRow>,
    pub hints: Vec<HintRow>,
}

// ============================================================================
// ASSEMBLY
// ============================================================================

/// Builds a snapshot for a registered room.
///
/// The stored URL is re-validated against `allow_list` before any request is made.
/// The page and status fetches run concurrently and are both bounded by `deadline`.
/// Only the page fetch can fail the call; status problems leave `status` empty.
pub async fn fetch_room_snapshot(
    source: &dyn TrackerSource,
    allow_list: &AllowList,
    record: &RoomRecord,
    deadline: Instant,
) -> Result<RoomSnapshot, TrackerError> {
    let tracker_url = validate_room_url(&record.url, allow_list).map_err(|e| {
        warn!("Stored URL for room {} failed validation: {}", record.link, e);
        TrackerError::InvalidTrackerUrl(e)
    })?;

    info!("Fetching snapshot for room {} from {}", record.link, tracker_url);

    let page = async {
        match timeout_at(deadline, source.fetch_html(tracker_url.as_url())).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        }
    };
    let status = async {
        let status = timeout_at(deadline, source.fetch_status(&record.link))
            .await
            .ok()
            .flatten();
        Ok::<_, FetchError>(status)
    };

    let (html, status) = futures::future::try_join(page, status).await.map_err(|e| {
        warn!("Tracker page fetch failed for room {}: {}", record.link, e);
        TrackerError::from(e)
    })?;

    let (players, hints) = extract_tables(&html);

    info!(
        "Room {}: {} players, {} hints, status {}",
        record.link,
        players.len(),
        hints.len(),
        if status.is_some() { "present" } else { "absent" }
    );

    Ok(RoomSnapshot {
        room_code: record.link.clone(),
        tracker_url: tracker_url.to_string(),
        status,
        players,
        hints,
    })
}

/// Parses a room page and pulls out both tables.
pub fn extract_tables(html: &str) -> (Vec<PlayerRow>, Vec<HintRow>) {
    let document = Html::parse_document(html);
    (extract_players(&document), extract_hints(&document))
}
