//! Software rendering into softbuffer frames
//!
//! Frames are drawn into a tiny-skia pixmap and copied out as `0x00RRGGBB`
//! words on present. Text goes through [`TextRenderer`].

use std::time::Instant;

use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

use super::content::{FocusBand, PageContent, TimeBarContent, TimerState};
use super::text::{TextRenderer, TextWeight};
use crate::host::Rect;
use crate::reader::BionicReader;
use crate::ui::{ContentView, DashboardView, Layout, Page, SIZE_RANGE};

/// Color-keyed to fully transparent on the overlay windows
pub const COLOR_KEY: u32 = 0x00FF00FF;

const BACKGROUND: u32 = 0x001E1E2E;
const HEADER: u32 = 0x00181825;
const SIDEBAR: u32 = 0x00252537;
const ROW_ACTIVE: u32 = 0x003B3B58;
const ROW_FLASH: u32 = 0x005B8DEF;
const ACCENT: u32 = 0x0089B4FA;
const TEXT: u32 = 0x00CDD6F4;
const MUTED: u32 = 0x007F849C;
const TRACK: u32 = 0x00313244;
const DANGER: u32 = 0x00F38BA8;
const DIM: u32 = 0x00000000;

const SMALL: f32 = 12.0;
const BODY: f32 = 15.0;
const TITLE: f32 = 22.0;
const ICON: f32 = 20.0;
const BANNER: f32 = 40.0;

fn color(rgb: u32) -> Color {
    Color::from_rgba8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 0xFF)
}

fn solid(rgb: u32, anti_alias: bool) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color(rgb));
    paint.anti_alias = anti_alias;
    paint
}

fn skia_rect(rect: Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(rect.x as f32, rect.y as f32, rect.width as f32, rect.height as f32)
}

pub struct Canvas<'t> {
    pixmap: Pixmap,
    text: &'t mut TextRenderer,
}

impl<'t> Canvas<'t> {
    /// None for an empty frame
    pub fn new(width: u32, height: u32, text: &'t mut TextRenderer) -> Option<Self> {
        Some(Canvas {
            pixmap: Pixmap::new(width, height)?,
            text,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn fill(&mut self, rgb: u32) {
        self.pixmap.fill(color(rgb));
    }

    /// Pixel-exact fill, so keyed colours survive untouched
    pub fn fill_rect(&mut self, rect: Rect, rgb: u32) {
        if let Some(area) = skia_rect(rect) {
            self.pixmap
                .fill_rect(area, &solid(rgb, false), Transform::identity(), None);
        }
    }

    pub fn round_rect(&mut self, rect: Rect, radius: f32, rgb: u32) {
        if let Some(path) = rounded(rect, radius) {
            self.pixmap
                .fill_path(&path, &solid(rgb, true), FillRule::Winding, Transform::identity(), None);
        }
    }

    pub fn outline(&mut self, rect: Rect, radius: f32, rgb: u32) {
        let inset = Rect {
            x: rect.x,
            y: rect.y,
            width: rect.width.saturating_sub(1),
            height: rect.height.saturating_sub(1),
        };
        if let Some(path) = rounded(inset, radius) {
            let stroke = Stroke {
                width: 1.5,
                ..Stroke::default()
            };
            self.pixmap
                .stroke_path(&path, &solid(rgb, true), &stroke, Transform::identity(), None);
        }
    }

    /// Draw `text` with the top of its line at (x, y); returns the advance
    pub fn text(&mut self, x: f32, y: f32, text: &str, size: f32, rgb: u32) -> f32 {
        self.text
            .draw(&mut self.pixmap, x, y, text, size, rgb, TextWeight::Regular)
    }

    pub fn bold_text(&mut self, x: f32, y: f32, text: &str, size: f32, rgb: u32) -> f32 {
        self.text
            .draw(&mut self.pixmap, x, y, text, size, rgb, TextWeight::Bold)
    }

    pub fn text_width(&self, text: &str, size: f32, weight: TextWeight) -> f32 {
        self.text.measure(text, size, weight)
    }

    pub fn line_height(&self, size: f32) -> f32 {
        self.text.line_height(size)
    }

    /// Shorten `text` with an ellipsis until it fits in `max` pixels
    pub fn fit(&self, text: &str, size: f32, max: f32) -> String {
        if self.text_width(text, size, TextWeight::Regular) <= max {
            return text.to_string();
        }
        let mut chars: Vec<char> = text.chars().collect();
        while !chars.is_empty() {
            chars.pop();
            let candidate: String = chars.iter().collect::<String>() + "…";
            if self.text_width(&candidate, size, TextWeight::Regular) <= max {
                return candidate;
            }
        }
        String::new()
    }

    fn centered_text(&mut self, rect: Rect, text: &str, size: f32, rgb: u32) {
        let width = self.text_width(text, size, TextWeight::Regular);
        let x = rect.x as f32 + (rect.width as f32 - width).max(0.0) / 2.0;
        let y = rect.y as f32 + (rect.height as f32 - self.line_height(size)).max(0.0) / 2.0;
        self.text(x, y, text, size, rgb);
    }

    /// Copy the frame out as `0x00RRGGBB` pixels
    pub fn present(&self, out: &mut [u32]) {
        for (dst, px) in out.iter_mut().zip(self.pixmap.pixels()) {
            let c = px.demultiply();
            *dst = (u32::from(c.red()) << 16) | (u32::from(c.green()) << 8) | u32::from(c.blue());
        }
    }
}

fn rounded(rect: Rect, radius: f32) -> Option<tiny_skia::Path> {
    let area = skia_rect(rect)?;
    let r = radius.min(area.width() / 2.0).min(area.height() / 2.0).max(0.0);
    let (left, top, right, bottom) = (area.left(), area.top(), area.right(), area.bottom());

    let mut pb = PathBuilder::new();
    pb.move_to(left + r, top);
    pb.line_to(right - r, top);
    pb.quad_to(right, top, right, top + r);
    pb.line_to(right, bottom - r);
    pb.quad_to(right, bottom, right - r, bottom);
    pb.line_to(left + r, bottom);
    pb.quad_to(left, bottom, left, bottom - r);
    pb.line_to(left, top + r);
    pb.quad_to(left, top, left + r, top);
    pb.close();
    pb.finish()
}

fn slider(canvas: &mut Canvas, row: Rect, label: &str, fraction: f64) {
    canvas.text(row.x as f32, row.y as f32, label, BODY, TEXT);
    let track = Rect {
        x: row.x,
        y: row.y + canvas.line_height(BODY).ceil() as i32 + 4,
        width: row.width,
        height: 8,
    };
    canvas.round_rect(track, 4.0, TRACK);
    let filled = Rect {
        width: (track.width as f64 * fraction.clamp(0.0, 1.0)) as u32,
        ..track
    };
    canvas.round_rect(filled, 4.0, ACCENT);
}

pub fn paint_dashboard<V: ContentView>(canvas: &mut Canvas, view: &DashboardView<V>, title: &str, now: Instant) {
    let layout = Layout::new(canvas.width(), canvas.height());
    canvas.fill(BACKGROUND);

    let header = layout.header();
    canvas.fill_rect(header, HEADER);
    canvas.bold_text(12.0, 10.0, title, BODY, TEXT);
    let minimize = layout.minimize_button();
    canvas.round_rect(minimize, 6.0, TRACK);
    canvas.centered_text(minimize, "−", BODY, TEXT);
    let close = layout.close_button();
    canvas.round_rect(close, 6.0, DANGER);
    canvas.centered_text(close, "✕", BODY, HEADER);

    canvas.fill_rect(layout.sidebar(), SIDEBAR);
    let home = layout.sidebar_row(0);
    if view.active_folder().is_none() {
        canvas.round_rect(inset(home, 6), 8.0, ROW_ACTIVE);
    }
    canvas.text(home.x as f32 + 16.0, home.y as f32 + 12.0, "🏠", ICON, TEXT);
    canvas.text(home.x as f32 + 48.0, home.y as f32 + 13.0, "Accueil", BODY, TEXT);

    let flashing = view.flashing(now);
    let label_width = (Layout::SIDEBAR - 64) as f32;
    for (index, app) in view.apps().iter().enumerate() {
        let row = layout.sidebar_row(index + 1);
        if flashing == Some(app.identifier.as_str()) {
            canvas.round_rect(inset(row, 6), 8.0, ROW_FLASH);
        } else if view.active_folder() == Some(app.identifier.as_str()) {
            canvas.round_rect(inset(row, 6), 8.0, ROW_ACTIVE);
        }
        canvas.text(row.x as f32 + 16.0, row.y as f32 + 12.0, &app.label.icon, ICON, TEXT);
        let label = canvas.fit(&app.label.title, BODY, label_width);
        canvas.text(row.x as f32 + 48.0, row.y as f32 + 13.0, &label, BODY, TEXT);
    }

    let main = layout.main_area();
    if view.focus_panel_visible() {
        paint_focus_panel(canvas, view, layout);
        return;
    }

    match view.page() {
        Page::Home => {
            canvas.centered_text(main, "Choisissez une application", TITLE, MUTED);
        }
        Page::Content { identifier, path } => {
            let label = view
                .apps()
                .iter()
                .find(|a| &a.identifier == identifier)
                .map(|a| a.label.title.clone())
                .unwrap_or_else(|| identifier.clone());
            let x = main.x as f32 + 24.0;
            let max = main.width.saturating_sub(48) as f32;
            let label = canvas.fit(&label, TITLE, max);
            canvas.bold_text(x, main.y as f32 + 20.0, &label, TITLE, TEXT);

            if let Some(reader) = view.content().reader() {
                let body = Rect {
                    x: main.x + 24,
                    y: main.y + 64,
                    width: main.width.saturating_sub(48),
                    height: main.height.saturating_sub(88),
                };
                paint_reader(canvas, body, reader);
                return;
            }
            canvas.text(x, main.y as f32 + 56.0, "Ouvert dans le navigateur", BODY, MUTED);
            let shown = canvas.fit(&path.display().to_string(), SMALL, max);
            canvas.text(x, main.y as f32 + 82.0, &shown, SMALL, MUTED);
        }
    }
}

fn inset(rect: Rect, by: u32) -> Rect {
    Rect {
        x: rect.x + by as i32,
        y: rect.y,
        width: rect.width.saturating_sub(2 * by),
        height: rect.height,
    }
}

fn paint_focus_panel<V: ContentView>(canvas: &mut Canvas, view: &DashboardView<V>, layout: Layout) {
    let panel = view.panel();
    let (lo, hi) = SIZE_RANGE;

    slider(
        canvas,
        layout.panel_row(0),
        &format!("Taille : {} px", panel.size.round() as i64),
        (panel.size - lo) / (hi - lo),
    );
    slider(
        canvas,
        layout.panel_row(1),
        &format!("Opacité : {} %", (panel.opacity * 100.0).round() as i64),
        panel.opacity,
    );

    let toggle = layout.panel_row(2);
    let (label, fill) = if panel.active {
        ("Désactiver le focus", DANGER)
    } else {
        ("Activer le focus", ACCENT)
    };
    canvas.round_rect(toggle, 8.0, fill);
    canvas.centered_text(toggle, label, BODY, HEADER);

    let shortcut = layout.panel_row(3);
    canvas.outline(shortcut, 8.0, if panel.recording { ACCENT } else { TRACK });
    let text = if panel.recording {
        "Appuyez sur une combinaison…".to_string()
    } else if panel.shortcut.is_empty() {
        "Raccourci : aucun".to_string()
    } else {
        format!("Raccourci : {}", panel.shortcut)
    };
    let y = shortcut.y as f32 + (shortcut.height as f32 - canvas.line_height(BODY)) / 2.0;
    canvas.text(shortcut.x as f32 + 12.0, y, &text, BODY, TEXT);
}

/// Word-wrapped bionic text: heads bold, tails regular
pub fn paint_reader(canvas: &mut Canvas, area: Rect, reader: &BionicReader) {
    let left = area.x as f32;
    let right = left + area.width as f32;
    let bottom = (area.y as i64 + area.height as i64) as f32;
    let line = canvas.line_height(BODY).ceil().max(1.0);

    if reader.text().is_none() {
        canvas.text(left, area.y as f32, "Copiez du texte pour le lire ici", BODY, MUTED);
        return;
    }

    let space = canvas.text_width(" ", BODY, TextWeight::Regular);
    let mut y = area.y as f32;
    for paragraph in reader.paragraphs() {
        let mut x = left;
        for word in paragraph {
            let width = canvas.text_width(word.head, BODY, TextWeight::Bold)
                + canvas.text_width(word.tail, BODY, TextWeight::Regular);
            if x > left && x + width > right {
                x = left;
                y += line;
            }
            if y + line > bottom {
                return;
            }
            x += canvas.bold_text(x, y, word.head, BODY, TEXT);
            x += canvas.text(x, y, word.tail, BODY, TEXT);
            x += space;
        }
        y += line;
    }
}

/// Dark everywhere except the band, which is keyed out
pub fn paint_focus(canvas: &mut Canvas, band: &FocusBand) {
    canvas.fill(DIM);
    if let Some(clear) = band.band(canvas.width(), canvas.height()) {
        canvas.fill_rect(clear, COLOR_KEY);
    }
}

pub fn paint_timebar(canvas: &mut Canvas, timer: &TimeBarContent, now: Instant) {
    let full = Rect {
        x: 0,
        y: 0,
        width: canvas.width(),
        height: canvas.height(),
    };

    if let TimerState::Flashing { .. } = timer.state() {
        canvas.fill(DANGER);
        canvas.centered_text(full, "⏰ Temps écoulé !", BANNER, HEADER);
        return;
    }

    canvas.fill(HEADER);
    canvas.fill_rect(
        Rect {
            width: (full.width as f64 * timer.progress(now)) as u32,
            ..full
        },
        ACCENT,
    );

    let remaining = timer.remaining(now).as_secs();
    let label = match timer.state() {
        TimerState::Idle if timer.is_hovered() => {
            format!("{} min · cliquez pour démarrer, molette pour régler", timer.minutes())
        }
        TimerState::Idle => format!("{} min", timer.minutes()),
        TimerState::Done => "Terminé · Alt+T pour recommencer".to_string(),
        _ => format!("{:02}:{:02}", remaining / 60, remaining % 60),
    };
    canvas.centered_text(full, &label, TITLE, TEXT);
}

/// Detached page windows: the page itself is in the browser
pub fn paint_page(canvas: &mut Canvas, page: &PageContent) {
    canvas.fill(BACKGROUND);
    let name = page
        .page
        .parent()
        .and_then(|dir| dir.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let max = canvas.width().saturating_sub(48) as f32;
    let name = canvas.fit(&name, TITLE, max);
    canvas.bold_text(24.0, 24.0, &name, TITLE, TEXT);
    canvas.text(24.0, 60.0, "Ouvert dans le navigateur", BODY, MUTED);
}

/// Detached bionic reader window
pub fn paint_reader_window(canvas: &mut Canvas, reader: &BionicReader) {
    canvas.fill(BACKGROUND);
    let area = Rect {
        x: 24,
        y: 24,
        width: canvas.width().saturating_sub(48),
        height: canvas.height().saturating_sub(48),
    };
    paint_reader(canvas, area, reader);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Point;

    fn frame(canvas: &Canvas) -> Vec<u32> {
        let mut out = vec![0xDEAD_BEEF; (canvas.width() * canvas.height()) as usize];
        canvas.present(&mut out);
        out
    }

    #[test]
    fn fill_rect_clips_to_the_canvas() {
        let mut text = TextRenderer::empty();
        let mut canvas = Canvas::new(4, 3, &mut text).unwrap();
        canvas.fill(0);
        canvas.fill_rect(Rect { x: 2, y: -1, width: 10, height: 2 }, 0x000007);
        assert_eq!(frame(&canvas), vec![0, 0, 7, 7, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn empty_frames_have_no_canvas() {
        let mut text = TextRenderer::empty();
        assert!(Canvas::new(0, 10, &mut text).is_none());
    }

    #[test]
    fn focus_band_is_keyed_out() {
        let mut band = FocusBand::new(Point::default());
        band.settings.size = 2.0;
        band.set_cursor(Point { x: 1, y: 2 });

        let mut text = TextRenderer::empty();
        let mut canvas = Canvas::new(3, 5, &mut text).unwrap();
        paint_focus(&mut canvas, &band);
        let pixels = frame(&canvas);
        assert_eq!(&pixels[3..9], &[COLOR_KEY; 6]);
        assert_eq!(&pixels[..3], &[DIM; 3]);
    }

    #[test]
    fn reader_text_is_drawn_in_the_area() {
        let mut text = TextRenderer::system();
        if !text.has_fonts() {
            return;
        }
        let mut reader = BionicReader::new();
        reader.set_text("Lecture rapide du presse-papiers");

        let mut canvas = Canvas::new(200, 80, &mut text).unwrap();
        canvas.fill(BACKGROUND);
        let blank = frame(&canvas);
        paint_reader(&mut canvas, Rect { x: 10, y: 10, width: 180, height: 60 }, &reader);
        let drawn = frame(&canvas);

        assert_ne!(drawn, blank);
        // Nothing well above the area
        assert!(drawn[..200 * 6].iter().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn long_labels_are_shortened_to_fit() {
        let mut text = TextRenderer::system();
        if !text.has_fonts() {
            return;
        }
        let canvas = Canvas::new(10, 10, &mut text).unwrap();
        let label = "Lecture Bionique et beaucoup plus encore";
        let fitted = canvas.fit(label, BODY, 80.0);
        assert!(fitted.ends_with('…'));
        assert!(canvas.text_width(&fitted, BODY, TextWeight::Regular) <= 80.0);
        assert_eq!(canvas.fit("Court", BODY, 400.0), "Court");
    }
}
