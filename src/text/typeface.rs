use std::collections::HashMap;

use serde::Deserialize;
use ttf_parser::OutlineBuilder;

use super::font::{ContourSink, GlyphOutline};
use crate::error::FontError;

/// A three.js typeface font (the JSON written by facetype.js).
#[derive(Debug, Clone, Deserialize)]
pub struct TypefaceFont {
    #[serde(rename = "familyName", default)]
    pub family_name: String,
    pub resolution: f32,
    glyphs: HashMap<String, TypefaceGlyph>,
}

#[derive(Debug, Clone, Deserialize)]
struct TypefaceGlyph {
    #[serde(default)]
    ha: f32,
    #[serde(default)]
    o: Option<String>,
}

impl TypefaceFont {
    pub fn from_json(json: &str) -> Result<Self, FontError> {
        let font: TypefaceFont = serde_json::from_str(json)?;
        if !(font.resolution > 0.0) {
            return Err(FontError::InvalidResolution(font.resolution));
        }
        Ok(font)
    }

    pub fn has_glyph(&self, glyph: char) -> bool {
        self.glyphs.contains_key(&glyph.to_string())
    }

    pub fn outline(
        &self,
        glyph: char,
        size: f32,
        curve_segments: u32,
    ) -> Result<GlyphOutline, FontError> {
        let key = glyph.to_string();
        let data = self
            .glyphs
            .get(&key)
            .or_else(|| self.glyphs.get("?"))
            .ok_or(FontError::MissingGlyph(glyph))?;
        let scale = size / self.resolution;
        let mut sink = ContourSink::new(scale, curve_segments);
        if let Some(commands) = data.o.as_deref() {
            replay_commands(glyph, commands, &mut sink)?;
        }
        Ok(GlyphOutline {
            glyph,
            contours: sink.finish(),
            advance: data.ha * scale,
        })
    }
}

/// Feeds an outline command string (`m`, `l`, `q`, `b`, `z`) into `sink`.
///
/// Curve commands list the end point first: `q x y cx cy` and
/// `b x y c1x c1y c2x c2y`.
fn replay_commands(glyph: char, commands: &str, sink: &mut ContourSink) -> Result<(), FontError> {
    let mut tokens = commands.split_whitespace();
    while let Some(command) = tokens.next() {
        let mut next = || -> Result<f32, FontError> {
            tokens
                .next()
                .and_then(|token| token.parse::<f32>().ok())
                .ok_or_else(|| FontError::MalformedOutline {
                    glyph,
                    command: command.to_string(),
                })
        };
        match command {
            "m" => {
                let (x, y) = (next()?, next()?);
                sink.move_to(x, y);
            }
            "l" => {
                let (x, y) = (next()?, next()?);
                sink.line_to(x, y);
            }
            "q" => {
                let (x, y, cx, cy) = (next()?, next()?, next()?, next()?);
                sink.quad_to(cx, cy, x, y);
            }
            "b" => {
                let (x, y) = (next()?, next()?);
                let (c1x, c1y, c2x, c2y) = (next()?, next()?, next()?, next()?);
                sink.curve_to(c1x, c1y, c2x, c2y, x, y);
            }
            "z" => sink.close(),
            other => {
                return Err(FontError::MalformedOutline {
                    glyph,
                    command: other.to_string(),
                })
            }
        }
    }
    Ok(())
}
