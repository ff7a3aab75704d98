//! Per-window content state for the desktop host
//!
//! Window content reacts to `WindowMessage`s pushed by the controllers and
//! to raw input on its own window. The time bar's timer lives here and talks
//! back to its controller with [`TimeBarRequest`]s.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::TimeBarConfig;
use crate::host::{Point, Rect};
use crate::ipc::TimeBarRequest;
use crate::overlay::OverlaySettings;
use crate::reader::BionicReader;
use crate::ui::ContentView;

/// How long the expired-timer flash stays over the screen
pub const FLASH_LENGTH: Duration = Duration::from_secs(3);

const MAX_MINUTES: u32 = 180;

/// Dimmed screen with a clear reading band following the cursor
#[derive(Debug, Clone, PartialEq)]
pub struct FocusBand {
    pub settings: OverlaySettings,
    /// Screen position of the display this window covers
    pub origin: Point,
    pub cursor: Option<Point>,
}

impl FocusBand {
    pub fn new(origin: Point) -> Self {
        FocusBand {
            settings: OverlaySettings::default(),
            origin,
            cursor: None,
        }
    }

    /// Returns true when the cursor moved and the band needs repainting
    pub fn set_cursor(&mut self, cursor: Point) -> bool {
        if self.cursor == Some(cursor) {
            return false;
        }
        self.cursor = Some(cursor);
        true
    }

    /// Clear band in window coordinates, or None when the cursor is elsewhere
    pub fn band(&self, width: u32, height: u32) -> Option<Rect> {
        let cursor = self.cursor?;
        let local_x = cursor.x - self.origin.x;
        let local_y = cursor.y - self.origin.y;
        if local_x < 0 || local_y < 0 || local_x >= width as i32 || local_y >= height as i32 {
            return None;
        }

        let band = self.settings.size.max(1.0).round() as i32;
        let top = (local_y - band / 2).max(0);
        let bottom = (local_y + band - band / 2).min(height as i32);
        Some(Rect {
            x: 0,
            y: top,
            width,
            height: (bottom - top).max(0) as u32,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running { started: Instant, length: Duration },
    Flashing { until: Instant },
    Done,
}

/// Timer shown in the time bar
#[derive(Debug, Clone)]
pub struct TimeBarContent {
    minutes: u32,
    state: TimerState,
    hovered: bool,
    collapsed_height: u32,
    expanded_height: u32,
}

impl TimeBarContent {
    pub fn new(config: &TimeBarConfig) -> Self {
        TimeBarContent {
            minutes: config.default_minutes.clamp(1, MAX_MINUTES),
            state: TimerState::Idle,
            hovered: false,
            collapsed_height: config.collapsed_height,
            expanded_height: config.expanded_height,
        }
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// Elapsed share of the running timer, 0.0 when idle, 1.0 once expired
    pub fn progress(&self, now: Instant) -> f64 {
        match self.state {
            TimerState::Idle => 0.0,
            TimerState::Running { started, length } => {
                let elapsed = now.saturating_duration_since(started).as_secs_f64();
                (elapsed / length.as_secs_f64().max(f64::EPSILON)).clamp(0.0, 1.0)
            }
            TimerState::Flashing { .. } | TimerState::Done => 1.0,
        }
    }

    /// Whole seconds left on the clock
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.state {
            TimerState::Idle => Duration::from_secs(u64::from(self.minutes) * 60),
            TimerState::Running { started, length } => {
                length.saturating_sub(now.saturating_duration_since(started))
            }
            TimerState::Flashing { .. } | TimerState::Done => Duration::ZERO,
        }
    }

    /// Click on the bar: start the timer when idle
    pub fn click(&mut self, now: Instant) -> Vec<TimeBarRequest> {
        if self.state != TimerState::Idle {
            return Vec::new();
        }
        self.state = TimerState::Running {
            started: now,
            length: Duration::from_secs(u64::from(self.minutes) * 60),
        };
        let mut requests = Vec::new();
        if self.hovered {
            self.hovered = false;
            requests.push(TimeBarRequest::Resize(self.collapsed_height));
        }
        requests.push(TimeBarRequest::BeginTimer);
        requests
    }

    /// Wheel over the idle bar changes the length by whole minutes
    pub fn adjust_minutes(&mut self, delta: i32) {
        if self.state == TimerState::Idle {
            self.minutes = (self.minutes as i32 + delta).clamp(1, MAX_MINUTES as i32) as u32;
        }
    }

    pub fn hover(&mut self, inside: bool) -> Vec<TimeBarRequest> {
        if self.state != TimerState::Idle || self.hovered == inside {
            return Vec::new();
        }
        self.hovered = inside;
        let height = if inside {
            self.expanded_height
        } else {
            self.collapsed_height
        };
        vec![TimeBarRequest::Resize(height)]
    }

    /// Reset from the global shortcut
    pub fn reset(&mut self) -> Vec<TimeBarRequest> {
        let was_flashing = matches!(self.state, TimerState::Flashing { .. });
        self.state = TimerState::Idle;
        self.hovered = false;
        if was_flashing {
            vec![TimeBarRequest::SetFullscreenFlash(false)]
        } else {
            Vec::new()
        }
    }

    pub fn tick(&mut self, now: Instant) -> Vec<TimeBarRequest> {
        match self.state {
            TimerState::Running { started, length } if now >= started + length => {
                self.state = TimerState::Flashing {
                    until: now + FLASH_LENGTH,
                };
                vec![
                    TimeBarRequest::TimeExpired,
                    TimeBarRequest::SetFullscreenFlash(true),
                ]
            }
            TimerState::Flashing { until } if now >= until => {
                self.state = TimerState::Done;
                vec![TimeBarRequest::SetFullscreenFlash(false)]
            }
            _ => Vec::new(),
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            TimerState::Running { started, length } => Some(started + length),
            TimerState::Flashing { until } => Some(until),
            TimerState::Idle | TimerState::Done => None,
        }
    }
}

/// Placeholder for a detached page: the page itself opens in the browser
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContent {
    pub page: PathBuf,
}

fn open_in_browser(path: &Path) -> io::Result<()> {
    open::that(path)
}

/// Dashboard content view
///
/// The clipboard consumer is read natively in the dashboard so copied text
/// reaches it; every other page opens in the default browser.
pub struct EmbeddedContent {
    consumer: String,
    current: Option<PathBuf>,
    reader: Option<BionicReader>,
    open_page: fn(&Path) -> io::Result<()>,
}

impl EmbeddedContent {
    pub fn new(consumer: impl Into<String>) -> Self {
        Self::with_opener(consumer, open_in_browser)
    }

    pub fn with_opener(consumer: impl Into<String>, open_page: fn(&Path) -> io::Result<()>) -> Self {
        EmbeddedContent {
            consumer: consumer.into(),
            current: None,
            reader: None,
            open_page,
        }
    }

    pub fn current(&self) -> Option<&Path> {
        self.current.as_deref()
    }
}

impl ContentView for EmbeddedContent {
    fn load(&mut self, identifier: &str, path: &Path) {
        if identifier == self.consumer {
            info!("Showing {} in the reader", identifier);
            self.reader.get_or_insert_with(BionicReader::new);
            self.current = Some(path.to_path_buf());
            return;
        }

        self.reader = None;
        if self.current.as_deref() == Some(path) {
            debug!("{} already open", identifier);
            return;
        }
        info!("Opening {} in the browser", identifier);
        if let Err(e) = (self.open_page)(path) {
            warn!("Failed to open {}: {}", path.display(), e);
            self.current = None;
            return;
        }
        self.current = Some(path.to_path_buf());
    }

    fn clear(&mut self) {
        self.current = None;
        self.reader = None;
    }

    fn post_text(&mut self, text: &str) {
        match self.reader {
            Some(ref mut reader) => {
                reader.set_text(text);
            }
            None => debug!("No reader loaded, clipboard text dropped"),
        }
    }

    /// The reader, while the consumer app is the loaded page
    fn reader(&self) -> Option<&BionicReader> {
        self.reader.as_ref()
    }
}
