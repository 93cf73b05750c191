//! Fonts and the extruded glyph meshes built from them.

mod extrude;
mod font;
mod typeface;

pub use extrude::{build_glyph, extrude_contours, Aabb, ExtrudeOptions, GlyphGeometry, Vertex};
pub use font::{Font, FontLoader, FontSource, FsFontLoader, GlyphOutline};
pub use typeface::TypefaceFont;
