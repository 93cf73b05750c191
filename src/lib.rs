//! Extruded 3D glyphs lit by a single movable point light.
//!
//! Glyph outlines come from a TrueType or typeface font and are extruded
//! into closed meshes. Every glyph material reads the same [`SharedLight`],
//! so moving the light with the keyboard changes the shading of all glyphs
//! on the next frame. Scene state and per-frame uniforms are computed
//! without a GPU; [`Renderer`] only uploads and draws them.

pub mod app;
pub mod camera;
pub mod error;
pub mod input;
pub mod light;
pub mod render;
pub mod scene;
pub mod shading;
pub mod state;
pub mod text;

pub use app::App;
pub use camera::{CameraParams, CameraState};
pub use error::{FontError, GeometryError};
pub use input::{parse_key_sequence, Action, Controller, KeyBindings, KeyCode, NamedKey};
pub use light::{LightFlags, LightState, SharedLight};
pub use render::{DrawItem, Frame, GlobalUniform, MeshId, ObjectUniform, Renderer};
pub use scene::{GlyphSpec, Placement, Preset, SceneDescription};
pub use shading::{shade, LightingParams, MaterialParams, Shade, ShadingFeatures, SurfaceSample};
pub use state::{GlyphMaterial, GlyphMesh, LightMarker, SceneState};
pub use text::{
    build_glyph, extrude_contours, Aabb, ExtrudeOptions, Font, FontLoader, FontSource,
    FsFontLoader, GlyphGeometry, GlyphOutline, TypefaceFont, Vertex,
};
