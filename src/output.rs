use std::path::{Path, PathBuf};

use crate::room_handler::RoomSnapshot;
use crate::status::RoomStatus;

const PLAYERS_CSV_FILE: &str = "players.csv";
const HINTS_CSV_FILE: &str = "hints.csv";

// ============================================================================
// CSV OUTPUT
// ============================================================================

/// Writes players.csv and hints.csv into `dir` and returns the two paths.
pub fn write_snapshot_csv(snapshot: &RoomSnapshot, dir: &Path) -> Result<(PathBuf, PathBuf), csv::Error> {
    std::fs::create_dir_all(dir)?;

    let players_path = dir.join(PLAYERS_CSV_FILE);
    let mut writer = csv::Writer::from_path(&players_path)?;
    writer.write_record(["room_code", "slot", "player", "state", "checks", "last_activity"])?;
    for player in &snapshot.players {
        writer.write_record([
            &snapshot.room_code,
            &player.slot,
            &player.player,
            &player.state,
            &player.checks,
            &player.last_activity,
        ])?;
    }
    writer.flush()?;

    let hints_path = dir.join(HINTS_CSV_FILE);
    let mut writer = csv::Writer::from_path(&hints_path)?;
    writer.write_record(["room_code", "sender", "receiver", "item", "location"])?;
    for hint in &snapshot.hints {
        writer.write_record([
            &snapshot.room_code,
            &hint.sender,
            &hint.receiver,
            &hint.item,
            &hint.location,
        ])?;
    }
    writer.flush()?;

    Ok((players_path, hints_path))
}

// ============================================================================
// TERMINAL OUTPUT
// ============================================================================

/// One-line summary of the room status
pub fn format_status(status: Option<&RoomStatus>) -> String {
    let Some(status) = status else {
        return "Status: unavailable".to_string();
    };

    let last_activity = status
        .last_activity
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "?".to_string());
    let port = status.last_port.map(|p| p.to_string()).unwrap_or_else(|| "?".to_string());
    let timeout = status
        .timeout_seconds
        .map(|t| format!("{}s", t))
        .unwrap_or_else(|| "?".to_string());

    format!("Status: last activity {}, port {}, timeout {}", last_activity, port, timeout)
}

/// Prints a snapshot to stdout
pub fn print_snapshot(snapshot: &RoomSnapshot) {
    println!("Room: {}", snapshot.room_code);
    println!("Tracker: {}", snapshot.tracker_url);
    println!("{}", format_status(snapshot.status.as_ref()));

    println!("\nPlayers ({})", snapshot.players.len());
    println!("{:-<80}", "");
    for player in &snapshot.players {
        println!(
            "{:>4} {:25} {:15} {:12} {}",
            player.slot, player.player, player.state, player.checks, player.last_activity
        );
    }

    println!("\nHints ({})", snapshot.hints.len());
    println!("{:-<80}", "");
    for hint in &snapshot.hints {
        println!(
            "{:20} -> {:20} {:25} @ {}",
            hint.sender, hint.receiver, hint.item, hint.location
        );
    }
}
