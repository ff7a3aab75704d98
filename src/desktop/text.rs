//! Text rasterization
//!
//! Faces come from the system font database (fontdb) and glyphs are
//! rasterized with swash, colour sources first so emoji faces keep their
//! colours. Glyphs are cached per face, size and colour as tiny-skia pixmaps.

use std::collections::HashMap;

use fontdb::{Database, Family, Query, Weight};
use swash::scale::image::Content;
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::Format;
use swash::{CacheKey, FontRef};
use tiny_skia::{IntSize, Pixmap, PixmapPaint, Transform};
use tracing::{debug, info, warn};

/// Interface faces, first match wins
const UI_FAMILIES: &[&str] = &[
    "Segoe UI",
    "Noto Sans",
    "DejaVu Sans",
    "Liberation Sans",
    "Helvetica Neue",
    "Arial",
];

/// Fallbacks for the sidebar icons
const EMOJI_FAMILIES: &[&str] = &[
    "Segoe UI Emoji",
    "Noto Color Emoji",
    "Apple Color Emoji",
    "Twemoji Mozilla",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextWeight {
    Regular,
    Bold,
}

/// Owned font bytes plus the location of one face inside them
pub struct FontFace {
    data: Vec<u8>,
    offset: u32,
    key: CacheKey,
}

impl FontFace {
    pub fn from_data(data: Vec<u8>, index: usize) -> Option<Self> {
        let font = FontRef::from_index(&data, index)?;
        let (offset, key) = (font.offset, font.key);
        Some(FontFace { data, offset, key })
    }

    pub fn font(&self) -> FontRef<'_> {
        FontRef {
            data: &self.data,
            offset: self.offset,
            key: self.key,
        }
    }

    fn glyph_id(&self, ch: char) -> Option<u16> {
        let id = self.font().charmap().map(ch);
        (id != 0).then_some(id)
    }
}

fn load_face(db: &Database, family: &str, weight: Weight) -> Option<FontFace> {
    let query = Query {
        families: &[Family::Name(family)],
        weight,
        ..Query::default()
    };
    let id = db.query(&query)?;
    if db.face(id).map(|face| face.weight) != Some(weight) {
        return None;
    }
    db.with_face_data(id, |data, index| FontFace::from_data(data.to_vec(), index as usize))?
}

fn first_face(db: &Database, families: &[&'static str], weight: Weight) -> Option<(&'static str, FontFace)> {
    families
        .iter()
        .find_map(|&family| load_face(db, family, weight).map(|face| (family, face)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FaceSlot {
    Regular(usize),
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GlyphKey {
    slot: FaceSlot,
    glyph: u16,
    size: u32,
    color: u32,
}

struct Glyph {
    pixmap: Pixmap,
    left: i32,
    top: i32,
}

/// Characters that shape neighbours but have no ink of their own
fn is_invisible(ch: char) -> bool {
    matches!(ch, '\u{FE00}'..='\u{FE0F}' | '\u{200D}') || ch.is_control()
}

fn premultiply(r: u8, g: u8, b: u8, a: u8) -> [u8; 4] {
    let scale = |c: u8| ((u16::from(c) * u16::from(a) + 127) / 255) as u8;
    [scale(r), scale(g), scale(b), a]
}

pub struct TextRenderer {
    /// Interface face first, then fallbacks
    regular: Vec<FontFace>,
    bold: Option<FontFace>,
    context: ScaleContext,
    cache: HashMap<GlyphKey, Option<Glyph>>,
}

impl TextRenderer {
    /// Renderer without any face: measures zero and draws nothing
    pub fn empty() -> Self {
        Self::from_faces(Vec::new(), None)
    }

    pub fn from_faces(regular: Vec<FontFace>, bold: Option<FontFace>) -> Self {
        TextRenderer {
            regular,
            bold,
            context: ScaleContext::new(),
            cache: HashMap::new(),
        }
    }

    /// Pick interface, bold and emoji faces from the installed fonts
    pub fn system() -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        debug!("Font database holds {} faces", db.len());

        let mut regular = Vec::new();
        let mut bold = None;
        match first_face(&db, UI_FAMILIES, Weight::NORMAL) {
            Some((family, face)) => {
                info!("Interface font: {}", family);
                regular.push(face);
                bold = load_face(&db, family, Weight::BOLD);
            }
            None => warn!("No interface font found, dashboard text will be missing"),
        }
        match first_face(&db, EMOJI_FAMILIES, Weight::NORMAL) {
            Some((family, face)) => {
                debug!("Emoji font: {}", family);
                regular.push(face);
            }
            None => debug!("No emoji font found, icons fall back to plain markers"),
        }

        Self::from_faces(regular, bold)
    }

    pub fn has_fonts(&self) -> bool {
        !self.regular.is_empty()
    }

    /// Whether some loaded face has a glyph for `ch`
    pub fn covers(&self, ch: char) -> bool {
        self.regular.iter().any(|face| face.glyph_id(ch).is_some())
    }

    fn face(&self, slot: FaceSlot) -> Option<&FontFace> {
        match slot {
            FaceSlot::Regular(index) => self.regular.get(index),
            FaceSlot::Bold => self.bold.as_ref(),
        }
    }

    fn resolve(&self, ch: char, weight: TextWeight) -> Option<(FaceSlot, u16)> {
        if weight == TextWeight::Bold {
            if let Some(id) = self.bold.as_ref().and_then(|face| face.glyph_id(ch)) {
                return Some((FaceSlot::Bold, id));
            }
        }
        self.regular
            .iter()
            .enumerate()
            .find_map(|(index, face)| face.glyph_id(ch).map(|id| (FaceSlot::Regular(index), id)))
    }

    fn scale(&self, slot: FaceSlot, size: f32) -> f32 {
        self.face(slot)
            .map(|face| size / f32::from(face.font().metrics(&[]).units_per_em.max(1)))
            .unwrap_or(0.0)
    }

    fn advance(&self, slot: FaceSlot, glyph: u16, size: f32) -> f32 {
        let Some(face) = self.face(slot) else {
            return 0.0;
        };
        face.font().glyph_metrics(&[]).advance_width(glyph) * self.scale(slot, size)
    }

    /// Distance from the top of a line to its baseline
    pub fn ascent(&self, size: f32) -> f32 {
        match self.regular.first() {
            Some(face) => face.font().metrics(&[]).ascent * self.scale(FaceSlot::Regular(0), size),
            None => size * 0.8,
        }
    }

    pub fn line_height(&self, size: f32) -> f32 {
        match self.regular.first() {
            Some(face) => {
                let metrics = face.font().metrics(&[]);
                (metrics.ascent + metrics.descent + metrics.leading) * self.scale(FaceSlot::Regular(0), size)
            }
            None => size * 1.25,
        }
    }

    pub fn measure(&self, text: &str, size: f32, weight: TextWeight) -> f32 {
        text.chars()
            .filter(|ch| !is_invisible(*ch))
            .filter_map(|ch| self.resolve(ch, weight))
            .map(|(slot, glyph)| self.advance(slot, glyph, size))
            .sum()
    }

    fn rasterize(&mut self, slot: FaceSlot, glyph: u16, size: f32, color: u32) -> Option<&Glyph> {
        let key = GlyphKey {
            slot,
            glyph,
            size: size.to_bits(),
            color,
        };
        if !self.cache.contains_key(&key) {
            let rendered = self.render_glyph(slot, glyph, size, color);
            self.cache.insert(key, rendered);
        }
        self.cache.get(&key).and_then(Option::as_ref)
    }

    fn render_glyph(&mut self, slot: FaceSlot, glyph: u16, size: f32, color: u32) -> Option<Glyph> {
        let face = match slot {
            FaceSlot::Regular(index) => self.regular.get(index)?,
            FaceSlot::Bold => self.bold.as_ref()?,
        };
        let mut scaler = self.context.builder(face.font()).size(size).hint(true).build();
        let image = Render::new(&[
            Source::ColorOutline(0),
            Source::ColorBitmap(StrikeWith::BestFit),
            Source::Outline,
        ])
        .format(Format::Alpha)
        .render(&mut scaler, glyph)?;

        let placement = image.placement;
        let area = IntSize::from_wh(placement.width, placement.height)?;
        let [r, g, b] = [(color >> 16) as u8, (color >> 8) as u8, color as u8];
        let mut data = Vec::with_capacity(placement.width as usize * placement.height as usize * 4);
        match image.content {
            Content::Mask => {
                for &alpha in &image.data {
                    data.extend_from_slice(&premultiply(r, g, b, alpha));
                }
            }
            Content::Color => {
                for px in image.data.chunks_exact(4) {
                    data.extend_from_slice(&premultiply(px[0], px[1], px[2], px[3]));
                }
            }
            Content::SubpixelMask => {
                for px in image.data.chunks_exact(4) {
                    let alpha = px[0].max(px[1]).max(px[2]);
                    data.extend_from_slice(&premultiply(r, g, b, alpha));
                }
            }
        }

        Some(Glyph {
            pixmap: Pixmap::from_vec(data, area)?,
            left: placement.left,
            top: placement.top,
        })
    }

    /// Draw `text` with the top of its line at `y`; returns the advance
    pub fn draw(&mut self, pixmap: &mut Pixmap, x: f32, y: f32, text: &str, size: f32, color: u32, weight: TextWeight) -> f32 {
        let baseline = (y + self.ascent(size)).round() as i32;
        let mut pen = x;
        for ch in text.chars().filter(|ch| !is_invisible(*ch)) {
            let Some((slot, glyph)) = self.resolve(ch, weight) else {
                continue;
            };
            // No bold face for this glyph: overstrike by one pixel
            let overstrike = weight == TextWeight::Bold && slot != FaceSlot::Bold;
            let origin = pen.round() as i32;
            if let Some(raster) = self.rasterize(slot, glyph, size, color) {
                let gx = origin + raster.left;
                let gy = baseline - raster.top;
                let paint = PixmapPaint::default();
                pixmap.draw_pixmap(gx, gy, raster.pixmap.as_ref(), &paint, Transform::identity(), None);
                if overstrike {
                    pixmap.draw_pixmap(gx + 1, gy, raster.pixmap.as_ref(), &paint, Transform::identity(), None);
                }
            }
            pen += self.advance(slot, glyph, size);
        }
        pen - x
    }
}
