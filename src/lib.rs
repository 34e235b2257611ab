pub mod api;
pub mod config;
pub mod error;
pub mod output;
pub mod registry;
pub mod room_handler;
pub mod room_url;
pub mod status;
pub mod table_handler;
pub mod tracker_client;

use tokio::time::Instant;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================
pub use api::{build_router, ApiError, AppState};
pub use config::TrackerConfig;
pub use error::{FetchError, RegistryError, TrackerError, ValidationError};
pub use output::{print_snapshot, write_snapshot_csv};
pub use registry::{RoomRecord, RoomRegistry};
pub use room_handler::{fetch_room_snapshot, RoomSnapshot};
pub use room_url::{validate_room_url, AllowList, TrackerSourceUrl};
pub use status::{decode_status, RoomStatus};
pub use table_handler::{extract_hints, extract_players, HintRow, PlayerRow, RowExtractor};
pub use tracker_client::{HttpTrackerClient, TrackerSource};

// ============================================================================
// ERRORS
// ============================================================================

/// Failure of a one-off snapshot for a URL that is not in the registry
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// Validates a submitted room URL and fetches its snapshot without touching the
/// registry. Validation runs before any network request.
pub async fn snapshot_url(
    source: &dyn TrackerSource,
    config: &TrackerConfig,
    url: &str,
) -> Result<RoomSnapshot, SnapshotError> {
    let tracker_url = validate_room_url(url, &config.submission_allow_list())?;
    let record = RoomRecord::new(tracker_url.to_string(), tracker_url.room_code().to_string(), None);

    let deadline = Instant::now() + config.deadline;
    let snapshot = fetch_room_snapshot(source, &config.stored_allow_list(), &record, deadline).await?;
    Ok(snapshot)
}
