//! Shared fixtures for the integration tests:
//! - FakeSource: scripted TrackerSource that counts calls
//! - StubTracker: local HTTP server standing in for the tracker site

#![allow(dead_code)]

pub mod stub_tracker;

pub use stub_tracker::StubTracker;

use async_trait::async_trait;
use reqwest::Url;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use architracker::{FetchError, RoomStatus, TrackerSource};

/// Room page with a two-row players table: one complete row, one short row
pub const TWO_ROW_PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Room AbCd12</title></head>
<body>
  <table id="checks-table">
    <thead><tr><th>#</th><th>Name</th><th>Status</th><th>Checks</th><th>Last Activity</th></tr></thead>
    <tbody>
      <tr><td>1</td><td>Alice</td><td>Playing</td><td>12/40</td><td>0:01:30</td></tr>
      <tr><td>2</td><td>Bob</td><td>Connected</td></tr>
    </tbody>
  </table>
</body></html>"#;

/// What the fake returns for the room page
pub enum PageBehavior {
    Html(String),
    HttpError(u16),
    Hang,
}

/// What the fake returns for the status endpoint
pub enum StatusBehavior {
    Ready(Option<RoomStatus>),
    Hang,
}

pub struct FakeSource {
    page: PageBehavior,
    status: StatusBehavior,
    html_calls: AtomicUsize,
    status_calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new(page: PageBehavior, status: Option<RoomStatus>) -> FakeSource {
        FakeSource::with_status(page, StatusBehavior::Ready(status))
    }

    pub fn with_status(page: PageBehavior, status: StatusBehavior) -> FakeSource {
        FakeSource {
            page,
            status,
            html_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn with_page(html: &str) -> FakeSource {
        FakeSource::new(PageBehavior::Html(html.to_string()), None)
    }

    pub fn html_calls(&self) -> usize {
        self.html_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn network_calls(&self) -> usize {
        self.html_calls() + self.status_calls()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackerSource for FakeSource {
    async fn fetch_html(&self, url: &Url) -> Result<String, FetchError> {
        self.html_calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(url.to_string());

        match &self.page {
            PageBehavior::Html(html) => Ok(html.clone()),
            PageBehavior::HttpError(code) => Err(FetchError::Status(*code)),
            PageBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(FetchError::Timeout)
            }
        }
    }

    async fn fetch_status(&self, _room_code: &str) -> Option<RoomStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        match &self.status {
            StatusBehavior::Ready(status) => status.clone(),
            StatusBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                None
            }
        }
    }
}
