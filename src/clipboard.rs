//! Clipboard change notifier
//!
//! Polls the clipboard text on a fixed interval and reports only changes:
//! the latest non-blank value that differs from the last one reported.
//! Nothing is buffered between polls.

use std::time::{Duration, Instant};

use arboard::Clipboard;
use tracing::{debug, warn};

use crate::ticker::Ticker;

/// Something that can read the current clipboard text ("" when empty)
pub trait ClipboardSource {
    fn read_text(&mut self) -> String;
}

/// System clipboard through arboard
pub struct SystemClipboard {
    clipboard: Option<Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        SystemClipboard {
            clipboard: open_clipboard(),
        }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

fn open_clipboard() -> Option<Clipboard> {
    match Clipboard::new() {
        Ok(clipboard) => Some(clipboard),
        Err(e) => {
            warn!("Clipboard unavailable: {}", e);
            None
        }
    }
}

impl ClipboardSource for SystemClipboard {
    fn read_text(&mut self) -> String {
        if self.clipboard.is_none() {
            self.clipboard = open_clipboard();
        }
        let Some(ref mut clipboard) = self.clipboard else {
            return String::new();
        };

        // Non-text contents read as empty
        clipboard.get_text().unwrap_or_default()
    }
}

pub struct ClipboardNotifier {
    interval: Duration,
    task: Option<Ticker>,
    last_seen: String,
}

impl ClipboardNotifier {
    pub fn new(interval: Duration) -> Self {
        ClipboardNotifier {
            interval,
            task: None,
            last_seen: String::new(),
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.task = Some(Ticker::start(self.interval, now));
    }

    pub fn stop(&mut self) {
        self.task = None;
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    pub fn last_seen(&self) -> &str {
        &self.last_seen
    }

    /// Record a read; returns the text when it should be broadcast
    pub fn observe(&mut self, text: String) -> Option<String> {
        if text == self.last_seen || text.trim().is_empty() {
            return None;
        }
        debug!("Clipboard changed ({} bytes)", text.len());
        self.last_seen = text.clone();
        Some(text)
    }

    /// Read the clipboard if the poll is due
    pub fn poll(&mut self, now: Instant, source: &mut dyn ClipboardSource) -> Option<String> {
        if !self.task.as_mut().is_some_and(|t| t.fire(now)) {
            return None;
        }
        self.observe(source.read_text())
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.task.map(|t| t.next_due())
    }
}
