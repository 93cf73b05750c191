use std::fmt;
use std::path::{Path, PathBuf};

use glam::Vec2;
use log::info;
use serde::{Deserialize, Serialize};
use ttf_parser::{Face, OutlineBuilder};

use super::typeface::TypefaceFont;
use crate::error::FontError;

const BUILTIN_TYPEFACE: &str = include_str!("../../assets/block.typeface.json");

/// Where the glyph font comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontSource {
    /// The block typeface bundled with the crate.
    #[default]
    Builtin,
    /// A `.ttf`/`.otf` file or a three.js `.typeface.json` file.
    Path(PathBuf),
}

impl fmt::Display for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontSource::Builtin => f.write_str("builtin"),
            FontSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

impl FontSource {
    /// `"builtin"` selects the bundled font, anything else is a path.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("builtin") {
            FontSource::Builtin
        } else {
            FontSource::Path(PathBuf::from(value))
        }
    }
}

/// Fetches font resources. Loading happens once; failures are not retried.
pub trait FontLoader {
    fn load(&self, source: &FontSource) -> Result<Font, FontError>;
}

/// Loads fonts from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFontLoader;

impl FontLoader for FsFontLoader {
    fn load(&self, source: &FontSource) -> Result<Font, FontError> {
        match source {
            FontSource::Builtin => Font::builtin(),
            FontSource::Path(path) => {
                let font = Font::from_file(path)?;
                info!(
                    "loaded {} font {:?} from {}",
                    font.kind(),
                    font.family_name().unwrap_or_default(),
                    path.display()
                );
                Ok(font)
            }
        }
    }
}

/// A parsed font able to produce glyph outlines.
#[derive(Debug, Clone)]
pub enum Font {
    TrueType { data: Vec<u8>, units_per_em: f32 },
    Typeface(TypefaceFont),
}

/// Flattened closed contours of one glyph, in scene units.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphOutline {
    pub glyph: char,
    pub contours: Vec<Vec<Vec2>>,
    pub advance: f32,
}

impl Font {
    pub fn builtin() -> Result<Self, FontError> {
        Ok(Font::Typeface(TypefaceFont::from_json(BUILTIN_TYPEFACE)?))
    }

    pub fn from_file(path: &Path) -> Result<Self, FontError> {
        let data = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(data)
    }

    /// Detects typeface JSON by its leading `{`, otherwise parses TrueType.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, FontError> {
        let is_json = data
            .iter()
            .find(|byte| !byte.is_ascii_whitespace())
            .is_some_and(|byte| *byte == b'{');
        if is_json {
            let text = String::from_utf8_lossy(&data);
            return Ok(Font::Typeface(TypefaceFont::from_json(&text)?));
        }
        let face =
            Face::parse(&data, 0).map_err(|err| FontError::InvalidTrueType(err.to_string()))?;
        let units_per_em = f32::from(face.units_per_em());
        Ok(Font::TrueType { data, units_per_em })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Font::TrueType { .. } => "TrueType",
            Font::Typeface(_) => "typeface",
        }
    }

    /// Family name from the typeface JSON or the TrueType `name` table.
    pub fn family_name(&self) -> Option<String> {
        match self {
            Font::Typeface(typeface) => {
                Some(typeface.family_name.clone()).filter(|name| !name.is_empty())
            }
            Font::TrueType { data, .. } => Face::parse(data, 0)
                .ok()?
                .names()
                .into_iter()
                .find(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
                .and_then(|name| name.to_string()),
        }
    }

    /// False when outlining `glyph` would fall back to `'?'`.
    pub fn has_glyph(&self, glyph: char) -> bool {
        match self {
            Font::Typeface(typeface) => typeface.has_glyph(glyph),
            Font::TrueType { data, .. } => Face::parse(data, 0)
                .is_ok_and(|face| face.glyph_index(glyph).is_some()),
        }
    }

    /// Outlines `glyph` at `size` scene units per em, flattening every curve
    /// into `curve_segments` straight segments.
    pub fn outline(
        &self,
        glyph: char,
        size: f32,
        curve_segments: u32,
    ) -> Result<GlyphOutline, FontError> {
        match self {
            Font::Typeface(typeface) => typeface.outline(glyph, size, curve_segments),
            Font::TrueType { data, units_per_em } => {
                let face = Face::parse(data, 0)
                    .map_err(|err| FontError::InvalidTrueType(err.to_string()))?;
                let id = face
                    .glyph_index(glyph)
                    .or_else(|| face.glyph_index('?'))
                    .ok_or(FontError::MissingGlyph(glyph))?;
                let scale = size / units_per_em.max(1.0);
                let mut sink = ContourSink::new(scale, curve_segments);
                // Glyphs without outlines (spaces) report `None`; the empty
                // contour list is handled by the extruder.
                let _ = face.outline_glyph(id, &mut sink);
                let advance = f32::from(face.glyph_hor_advance(id).unwrap_or(0)) * scale;
                Ok(GlyphOutline {
                    glyph,
                    contours: sink.finish(),
                    advance,
                })
            }
        }
    }
}

/// Collects outline commands into flattened closed polylines.
pub(crate) struct ContourSink {
    scale: f32,
    segments: u32,
    contours: Vec<Vec<Vec2>>,
    current: Vec<Vec2>,
}

impl ContourSink {
    pub(crate) fn new(scale: f32, segments: u32) -> Self {
        Self {
            scale,
            segments: segments.max(1),
            contours: Vec::new(),
            current: Vec::new(),
        }
    }

    fn point(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y) * self.scale
    }

    fn last(&self) -> Vec2 {
        self.current.last().copied().unwrap_or(Vec2::ZERO)
    }

    fn flush(&mut self) {
        let contour = clean_ring(std::mem::take(&mut self.current));
        if contour.len() >= 3 {
            self.contours.push(contour);
        }
    }

    pub(crate) fn finish(mut self) -> Vec<Vec<Vec2>> {
        self.flush();
        self.contours
    }
}

impl OutlineBuilder for ContourSink {
    fn move_to(&mut self, x: f32, y: f32) {
        self.flush();
        let p = self.point(x, y);
        self.current.push(p);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.point(x, y);
        self.current.push(p);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let p0 = self.last();
        let c = self.point(x1, y1);
        let p1 = self.point(x, y);
        for i in 1..=self.segments {
            let t = i as f32 / self.segments as f32;
            let mt = 1.0 - t;
            self.current
                .push(p0 * (mt * mt) + c * (2.0 * mt * t) + p1 * (t * t));
        }
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let p0 = self.last();
        let c0 = self.point(x1, y1);
        let c1 = self.point(x2, y2);
        let p1 = self.point(x, y);
        for i in 1..=self.segments {
            let t = i as f32 / self.segments as f32;
            let mt = 1.0 - t;
            self.current.push(
                p0 * (mt * mt * mt)
                    + c0 * (3.0 * mt * mt * t)
                    + c1 * (3.0 * mt * t * t)
                    + p1 * (t * t * t),
            );
        }
    }

    fn close(&mut self) {
        self.flush();
    }
}

/// Drops repeated points and an explicit closing point.
fn clean_ring(points: Vec<Vec2>) -> Vec<Vec2> {
    const EPSILON: f32 = 1e-6;
    let mut ring: Vec<Vec2> = Vec::with_capacity(points.len());
    for point in points {
        if let Some(last) = ring.last() {
            if (*last - point).length_squared() < EPSILON * EPSILON {
                continue;
            }
        }
        ring.push(point);
    }
    while ring.len() >= 2 && (ring[0] - ring[ring.len() - 1]).length_squared() < EPSILON * EPSILON
    {
        ring.pop();
    }
    ring
}

/// A two-glyph TrueType face: a rounded `o` (quadratic outer contour and a
/// square counter) and a straight `n`, 1000 units per em.
#[cfg(test)]
pub(crate) fn minimal_truetype() -> Vec<u8> {
    fn simple_glyph(contours: &[&[(i16, i16, bool)]]) -> Vec<u8> {
        let points: Vec<(i16, i16, bool)> =
            contours.iter().flat_map(|c| c.iter().copied()).collect();
        let xs = points.iter().map(|p| p.0);
        let ys = points.iter().map(|p| p.1);
        let mut out = Vec::new();
        out.extend((contours.len() as i16).to_be_bytes());
        for bound in [
            xs.clone().min().unwrap_or(0),
            ys.clone().min().unwrap_or(0),
            xs.max().unwrap_or(0),
            ys.max().unwrap_or(0),
        ] {
            out.extend(bound.to_be_bytes());
        }
        let mut end = 0u16;
        for contour in contours {
            end += contour.len() as u16;
            out.extend((end - 1).to_be_bytes());
        }
        out.extend(0u16.to_be_bytes());
        // Flags: bit 0 marks on-curve points; every coordinate is a 16-bit delta.
        out.extend(points.iter().map(|p| u8::from(p.2)));
        for axis in [0, 1] {
            let mut previous = 0i16;
            for point in &points {
                let value = if axis == 0 { point.0 } else { point.1 };
                out.extend((value - previous).to_be_bytes());
                previous = value;
            }
        }
        if out.len() % 2 == 1 {
            out.push(0);
        }
        out
    }

    let o = simple_glyph(&[
        &[
            (500, 0, true),
            (0, 0, false),
            (0, 500, true),
            (0, 1000, false),
            (500, 1000, true),
            (1000, 1000, false),
            (1000, 500, true),
            (1000, 0, false),
        ],
        &[
            (400, 400, true),
            (600, 400, true),
            (600, 600, true),
            (400, 600, true),
        ],
    ]);
    let n = simple_glyph(&[&[
        (80, 0, true),
        (80, 700, true),
        (620, 700, true),
        (620, 0, true),
        (470, 0, true),
        (470, 550, true),
        (230, 550, true),
        (230, 0, true),
    ]]);

    let mut glyf = o.clone();
    glyf.extend(&n);
    let mut loca = Vec::new();
    for offset in [0, 0, o.len(), o.len() + n.len()] {
        loca.extend(((offset / 2) as u16).to_be_bytes());
    }

    let mut head = vec![0u8; 54];
    head[0..2].copy_from_slice(&1u16.to_be_bytes());
    head[12..16].copy_from_slice(&0x5F0F_3CF5u32.to_be_bytes());
    head[18..20].copy_from_slice(&1000u16.to_be_bytes());
    head[40..42].copy_from_slice(&1000i16.to_be_bytes());
    head[42..44].copy_from_slice(&1000i16.to_be_bytes());

    let mut hhea = vec![0u8; 36];
    hhea[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    hhea[4..6].copy_from_slice(&1000i16.to_be_bytes());
    hhea[34..36].copy_from_slice(&3u16.to_be_bytes());

    let mut maxp = 0x0000_5000u32.to_be_bytes().to_vec();
    maxp.extend(3u16.to_be_bytes());

    let mut hmtx = Vec::new();
    for advance in [500u16, 1000, 700] {
        hmtx.extend(advance.to_be_bytes());
        hmtx.extend(0i16.to_be_bytes());
    }

    // One Windows full-Unicode record pointing at a format 12 subtable.
    let mut cmap = Vec::new();
    for field in [0u16, 1, 3, 10] {
        cmap.extend(field.to_be_bytes());
    }
    cmap.extend(12u32.to_be_bytes());
    cmap.extend(12u16.to_be_bytes());
    cmap.extend(0u16.to_be_bytes());
    for field in [16 + 2 * 12, 0, 2, 'n' as u32, 'n' as u32, 2, 'o' as u32, 'o' as u32, 1] {
        cmap.extend(field.to_be_bytes());
    }

    // Table records must be sorted by tag.
    let tables: [(&[u8; 4], Vec<u8>); 7] = [
        (b"cmap", cmap),
        (b"glyf", glyf),
        (b"head", head),
        (b"hhea", hhea),
        (b"hmtx", hmtx),
        (b"loca", loca),
        (b"maxp", maxp),
    ];
    let mut font = 0x0001_0000u32.to_be_bytes().to_vec();
    for field in [tables.len() as u16, 64, 2, 16 * tables.len() as u16 - 64] {
        font.extend(field.to_be_bytes());
    }
    let mut offset = 12 + 16 * tables.len();
    let mut body = Vec::new();
    for (tag, data) in &tables {
        font.extend(*tag);
        font.extend(0u32.to_be_bytes());
        font.extend((offset as u32).to_be_bytes());
        font.extend((data.len() as u32).to_be_bytes());
        let padded = (data.len() + 3) & !3;
        body.extend(data);
        body.resize(body.len() + padded - data.len(), 0);
        offset += padded;
    }
    font.extend(body);
    font
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_font_has_demo_glyphs() {
        let font = Font::builtin().unwrap();
        for glyph in ['n', '1'] {
            let outline = font.outline(glyph, 2.0, 12).unwrap();
            assert_eq!(outline.contours.len(), 1);
            assert!(outline.advance > 0.0);
        }
    }

    #[test]
    fn truetype_outlines_are_scaled_by_units_per_em() {
        let font = Font::from_bytes(minimal_truetype()).unwrap();
        assert_eq!(font.kind(), "TrueType");
        assert_eq!(font.family_name(), None);

        let n = font.outline('n', 2.0, 12).unwrap();
        assert_eq!(n.contours.len(), 1);
        assert_eq!(n.contours[0].len(), 8);
        assert!(n.contours[0]
            .iter()
            .any(|p| (*p - Vec2::new(0.16, 0.0)).length() < 1e-5));
        assert!((n.advance - 1.4).abs() < 1e-6);

        let o = font.outline('o', 1.0, 4).unwrap();
        assert_eq!(o.contours.len(), 2);
        // four quadratic segments flattened into four points each
        assert_eq!(o.contours[0].len(), 16);
        assert_eq!(o.contours[1].len(), 4);
        assert!(o.contours[0]
            .iter()
            .any(|p| (*p - Vec2::new(0.125, 0.125)).length() < 1e-5));
        assert!((o.advance - 1.0).abs() < 1e-6);
    }

    #[test]
    fn truetype_missing_glyph_without_fallback_is_an_error() {
        let font = Font::from_bytes(minimal_truetype()).unwrap();
        assert!(font.has_glyph('o'));
        assert!(!font.has_glyph('x'));
        let err = font.outline('x', 1.0, 4).unwrap_err();
        assert!(matches!(err, FontError::MissingGlyph('x')));
    }

    #[test]
    fn builtin_font_reports_family_and_coverage() {
        let font = Font::builtin().unwrap();
        assert_eq!(font.family_name().as_deref(), Some("Glyphlight Block"));
        assert!(font.has_glyph('n'));
        assert!(!font.has_glyph('Z'));
    }

    #[test]
    fn garbage_bytes_are_not_a_font() {
        let err = Font::from_bytes(b"definitely not a font".to_vec()).unwrap_err();
        assert!(matches!(err, FontError::InvalidTrueType(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = FsFontLoader
            .load(&FontSource::Path("/nonexistent/font.ttf".into()))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/font.ttf"));
    }

    #[test]
    fn quadratic_curves_are_flattened_into_segments() {
        let mut sink = ContourSink::new(1.0, 4);
        sink.move_to(0.0, 0.0);
        sink.quad_to(1.0, 2.0, 2.0, 0.0);
        sink.close();
        let contours = sink.finish();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 5);
        assert_eq!(contours[0][2], Vec2::new(1.0, 1.0));
    }

    #[test]
    fn degenerate_contours_are_dropped() {
        let mut sink = ContourSink::new(1.0, 4);
        sink.move_to(0.0, 0.0);
        sink.line_to(1.0, 0.0);
        sink.line_to(0.0, 0.0);
        sink.close();
        assert!(sink.finish().is_empty());
    }

    #[test]
    fn source_parsing() {
        assert_eq!(FontSource::parse("builtin"), FontSource::Builtin);
        assert_eq!(
            FontSource::parse("fonts/helvetiker.typeface.json"),
            FontSource::Path("fonts/helvetiker.typeface.json".into())
        );
    }
}
