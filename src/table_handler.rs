use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::sync::OnceLock;
use tracing::warn;

const PLAYER_ROWS: &str = "#checks-table tbody tr";
const HINT_ROWS: &str = "#hints-table tbody tr";
const CELLS: &str = "td";

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// One row of the tracker's players table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRow {
    pub slot: String,
    pub player: String,
    pub state: String,
    pub checks: String,
    pub last_activity: String,
}

/// One row of the tracker's hints table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HintRow {
    pub sender: String,
    pub receiver: String,
    pub item: String,
    pub location: String,
}

// ============================================================================
// ROW EXTRACTION STRATEGIES
// ============================================================================

/// Maps the rows under one table anchor to typed records.
///
/// Each tracker table gets its own implementation, so a markup change on the
/// tracker only touches the selectors and cell mapping here.
pub trait RowExtractor {
    type Row;

    /// Selector matching every data row of the table, parsed once per process.
    /// `None` if the selector text does not parse.
    fn row_selector(&self) -> Option<&'static Selector>;

    /// Rows with fewer cells than this are skipped.
    fn min_cells(&self) -> usize;

    /// Builds a record from the trimmed cell texts; `cells.len() >= min_cells()`.
    fn build_row(&self, cells: &[String]) -> Self::Row;
}

/// Players table: slot, player, state, checks, last activity
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayersTable;

impl RowExtractor for PlayersTable {
    type Row = PlayerRow;

    fn row_selector(&self) -> Option<&'static Selector> {
        static ROWS: OnceLock<Option<Selector>> = OnceLock::new();
        cached_selector(&ROWS, PLAYER_ROWS)
    }

    fn min_cells(&self) -> usize {
        5
    }

    fn build_row(&self, cells: &[String]) -> PlayerRow {
        PlayerRow {
            slot: cell_at(cells, 0),
            player: cell_at(cells, 1),
            state: cell_at(cells, 2),
            checks: cell_at(cells, 3),
            last_activity: cell_at(cells, 4),
        }
    }
}

/// Hints table: sender, receiver, item, location
#[derive(Debug, Clone, Copy, Default)]
pub struct HintsTable;

impl RowExtractor for HintsTable {
    type Row = HintRow;

    fn row_selector(&self) -> Option<&'static Selector> {
        static ROWS: OnceLock<Option<Selector>> = OnceLock::new();
        cached_selector(&ROWS, HINT_ROWS)
    }

    fn min_cells(&self) -> usize {
        4
    }

    fn build_row(&self, cells: &[String]) -> HintRow {
        HintRow {
            sender: cell_at(cells, 0),
            receiver: cell_at(cells, 1),
            item: cell_at(cells, 2),
            location: cell_at(cells, 3),
        }
    }
}

fn cell_at(cells: &[String], index: usize) -> String {
    cells.get(index).cloned().unwrap_or_default()
}

fn cached_selector(cell: &'static OnceLock<Option<Selector>>, css: &str) -> Option<&'static Selector> {
    cell.get_or_init(|| match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!("Unusable selector '{}': {:?}", css, e);
            None
        }
    })
    .as_ref()
}

fn cell_selector() -> Option<&'static Selector> {
    static CELL: OnceLock<Option<Selector>> = OnceLock::new();
    cached_selector(&CELL, CELLS)
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Runs an extractor over a parsed document. Never fails: a missing table yields
/// no rows and short rows are dropped.
pub fn extract_rows<E: RowExtractor>(document: &Html, extractor: &E) -> Vec<E::Row> {
    let (Some(row_selector), Some(cell_selector)) = (extractor.row_selector(), cell_selector()) else {
        return Vec::new();
    };

    document
        .select(row_selector)
        .filter_map(|row| {
            let cells = row_cells(row, cell_selector);
            if cells.len() < extractor.min_cells() {
                return None;
            }
            Some(extractor.build_row(&cells))
        })
        .collect()
}

fn row_cells(row: ElementRef, cell_selector: &Selector) -> Vec<String> {
    row.select(cell_selector)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect()
}

pub fn extract_players(document: &Html) -> Vec<PlayerRow> {
    extract_rows(document, &PlayersTable)
}

pub fn extract_hints(document: &Html) -> Vec<HintRow> {
    extract_rows(document, &HintsTable)
}

// ============================================================================
// TESTS
// ============================================================================
