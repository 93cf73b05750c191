use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading a font or looking up one of its glyphs.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("unable to read font {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TrueType/OpenType data: {0}")]
    InvalidTrueType(String),
    #[error("invalid typeface JSON")]
    InvalidTypeface(#[from] serde_json::Error),
    #[error("typeface resolution must be positive, got {0}")]
    InvalidResolution(f32),
    #[error("malformed outline command {command:?} in glyph {glyph:?}")]
    MalformedOutline { glyph: char, command: String },
    #[error("font has no glyph for {0:?}")]
    MissingGlyph(char),
}

/// Failures while turning a glyph outline into an extruded mesh.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error(transparent)]
    Font(#[from] FontError),
    #[error("glyph {0:?} has no outline to extrude")]
    EmptyOutline(char),
    #[error("failed to tessellate glyph {glyph:?}: {message}")]
    Tessellation { glyph: char, message: String },
}
