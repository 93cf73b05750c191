use std::fmt;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec3;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::camera::CameraState;
use crate::input::{Controller, KeyCode};
use crate::light::{LightFlags, LightState};
use crate::shading::ShadingFeatures;
use crate::text::{ExtrudeOptions, FontSource};

/// Built-in scene setups, one per stage of the lighting demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Preset {
    /// Flat colors, no lighting.
    Flat,
    /// Ambient and diffuse terms.
    Diffuse,
    /// Ambient, diffuse and Blinn-Phong specular.
    Specular,
    /// Specular highlights tinted by the surface color.
    #[default]
    Metallic,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Flat,
        Preset::Diffuse,
        Preset::Specular,
        Preset::Metallic,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn name(self) -> &'static str {
        match self {
            Preset::Flat => "flat",
            Preset::Diffuse => "diffuse",
            Preset::Specular => "specular",
            Preset::Metallic => "metallic",
        }
    }

    pub fn description(self) -> SceneDescription {
        match self {
            Preset::Flat => SceneDescription {
                preset: self,
                text: ExtrudeOptions {
                    size: 1.0,
                    depth: 0.2,
                    ..ExtrudeOptions::default()
                },
                shading: ShadingFeatures::UNLIT,
                marker: None,
                clear_color: Vec3::ZERO,
                glyphs: vec![
                    GlyphSpec {
                        placement: Placement::At(Vec3::new(-3.0, 0.0, 0.0)),
                        centered: true,
                        ..GlyphSpec::new('n', hex(0x191970), 30.0)
                    },
                    GlyphSpec {
                        placement: Placement::At(Vec3::new(3.0, 0.0, 0.0)),
                        centered: true,
                        ..GlyphSpec::new('1', hex(0x707019), 100.0)
                    },
                ],
                ..SceneDescription::lit(self)
            },
            Preset::Diffuse => SceneDescription {
                shading: ShadingFeatures::DIFFUSE,
                light: LightState {
                    ambient_intensity: 0.061,
                    ..LightState::default()
                },
                ..SceneDescription::lit(self)
            },
            Preset::Specular => SceneDescription::lit(self),
            Preset::Metallic => {
                let mut description = SceneDescription::lit(self);
                description.light.flags.metallic = true;
                description
            }
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything needed to build a [`crate::SceneState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    pub preset: Preset,
    pub font: FontSource,
    pub text: ExtrudeOptions,
    pub shading: ShadingFeatures,
    pub light: LightState,
    /// Edge length of the cube drawn at the light position.
    pub marker: Option<f32>,
    pub camera: CameraState,
    pub controls: Controller,
    pub clear_color: Vec3,
    pub glyphs: Vec<GlyphSpec>,
}

impl Default for SceneDescription {
    fn default() -> Self {
        Preset::default().description()
    }
}

/// One extruded character and its material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphSpec {
    pub glyph: char,
    pub color: Vec3,
    pub shininess: f32,
    /// Overrides the light's metallic flag for this glyph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metallic: Option<bool>,
    pub placement: Placement,
    /// Center the geometry on its bounding box before placing it.
    #[serde(default)]
    pub centered: bool,
}

impl GlyphSpec {
    pub fn new(glyph: char, color: Vec3, shininess: f32) -> Self {
        Self {
            glyph,
            color,
            shininess,
            metallic: None,
            placement: Placement::At(Vec3::ZERO),
            centered: false,
        }
    }
}

/// How a glyph is positioned in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Placement {
    At(Vec3),
    /// Right edge ends `gap` units left of the origin: x = -(width + gap).
    LeftOfOrigin { gap: f32 },
}

impl SceneDescription {
    /// Shared layout of the lit presets.
    fn lit(preset: Preset) -> Self {
        Self {
            preset,
            font: FontSource::Builtin,
            text: ExtrudeOptions::default(),
            shading: ShadingFeatures::BLINN_PHONG,
            light: LightState {
                position: Vec3::new(0.0, 1.0, 0.0),
                color: Vec3::ONE,
                ambient_intensity: 0.261,
                flags: LightFlags::default(),
            },
            marker: Some(0.5),
            camera: CameraState::default(),
            controls: Controller::default(),
            clear_color: hex(0x222222),
            glyphs: vec![
                GlyphSpec {
                    placement: Placement::LeftOfOrigin { gap: 1.0 },
                    ..GlyphSpec::new('n', hex(0x191970), 30.0)
                },
                GlyphSpec {
                    placement: Placement::At(Vec3::new(1.0, 0.0, 0.0)),
                    ..GlyphSpec::new('1', hex(0x707019), 100.0)
                },
            ],
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read scene file {}", path.display()))?;
        Self::from_xml(&xml).with_context(|| format!("invalid scene file {}", path.display()))
    }

    /// Parses a scene file. Fields that are not present keep the values of
    /// the preset named by the root's `preset` attribute.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let root = document.root_element();
        if !root.has_tag_name("scene") {
            bail!("root element must be <scene>, found <{}>", root.tag_name().name());
        }

        let preset = match root.attribute("preset") {
            Some(name) => Preset::from_name(name).ok_or_else(|| anyhow!("unknown preset {name:?}"))?,
            None => Preset::default(),
        };
        let mut scene = preset.description();

        if let Some(font) = optional_text(&root, "font") {
            scene.font = FontSource::parse(&font);
        }
        if let Some(text) = child(&root, "text") {
            scene.text.size = parse_f32(optional_text(&text, "size"), scene.text.size)?;
            scene.text.depth = parse_f32(optional_text(&text, "depth"), scene.text.depth)?;
            scene.text.curve_segments = parse_u32(
                optional_text(&text, "curve-segments"),
                scene.text.curve_segments,
            )?;
        }
        if let Some(shading) = child(&root, "shading") {
            scene.shading.lighting =
                parse_bool(optional_text(&shading, "lighting"), scene.shading.lighting)?;
            scene.shading.specular =
                parse_bool(optional_text(&shading, "specular"), scene.shading.specular)?;
        }
        if let Some(light) = child(&root, "light") {
            let state = &mut scene.light;
            state.position = parse_vec3(optional_text(&light, "position"), state.position)?;
            state.color = parse_color(optional_text(&light, "color"), state.color)?;
            state.ambient_intensity =
                parse_f32(optional_text(&light, "ambient"), state.ambient_intensity)?;
            state.flags.metallic =
                parse_bool(optional_text(&light, "metallic"), state.flags.metallic)?;
            if let Some(marker) = optional_text(&light, "marker") {
                scene.marker = match marker.as_str() {
                    "none" | "off" | "false" => None,
                    size => Some(parse_f32(Some(size.to_string()), 0.5)?),
                };
            }
        }
        if let Some(camera) = child(&root, "camera") {
            let state = &mut scene.camera;
            state.position = parse_vec3(optional_text(&camera, "position"), state.position)?;
            state.fov = parse_f32(optional_text(&camera, "fov"), state.fov)?;
            state.near = parse_f32(optional_text(&camera, "near"), state.near)?;
            state.far = parse_f32(optional_text(&camera, "far"), state.far)?;
        }
        if let Some(controls) = child(&root, "controls") {
            let c = &mut scene.controls;
            c.step = parse_f32(optional_text(&controls, "step"), c.step)?;
            c.bindings.light_up = parse_key(optional_text(&controls, "light-up"), c.bindings.light_up)?;
            c.bindings.light_down =
                parse_key(optional_text(&controls, "light-down"), c.bindings.light_down)?;
            c.bindings.camera_left =
                parse_key(optional_text(&controls, "camera-left"), c.bindings.camera_left)?;
            c.bindings.camera_right =
                parse_key(optional_text(&controls, "camera-right"), c.bindings.camera_right)?;
        }
        scene.clear_color = parse_color(optional_text(&root, "clear-color"), scene.clear_color)?;

        let glyph_nodes: Vec<Node<'_, '_>> = root
            .children()
            .filter(|n| n.has_tag_name("glyph"))
            .collect();
        if !glyph_nodes.is_empty() {
            scene.glyphs = glyph_nodes
                .iter()
                .map(parse_glyph)
                .collect::<Result<Vec<_>>>()?;
        }

        scene.validate()?;
        Ok(scene)
    }

    /// Rejects values that cannot produce a drawable scene.
    pub fn validate(&self) -> Result<()> {
        if !(self.text.size > 0.0) {
            bail!("text size must be positive, got {}", self.text.size);
        }
        if !(self.text.depth > 0.0) {
            bail!("text depth must be positive, got {}", self.text.depth);
        }
        if self.text.curve_segments == 0 {
            bail!("curve segments must be at least 1");
        }
        if !(self.camera.near > 0.0 && self.camera.far > self.camera.near) {
            bail!(
                "camera clip range {}..{} is invalid",
                self.camera.near,
                self.camera.far
            );
        }
        if !(self.camera.fov > 0.0 && self.camera.fov < 180.0) {
            bail!("camera fov must be between 0 and 180 degrees");
        }
        if !self.controls.step.is_finite() {
            bail!("control step must be finite");
        }
        if let Some(size) = self.marker {
            if !(size > 0.0) {
                bail!("light marker size must be positive, got {size}");
            }
        }
        if self.glyphs.is_empty() {
            bail!("scene has no glyphs");
        }
        for spec in &self.glyphs {
            if !(spec.shininess >= 0.0 && spec.shininess.is_finite()) {
                bail!(
                    "glyph {:?} shininess must be a non-negative number, got {}",
                    spec.glyph,
                    spec.shininess
                );
            }
        }
        Ok(())
    }
}

fn parse_glyph(node: &Node<'_, '_>) -> Result<GlyphSpec> {
    let text = required_text(node, "char")?;
    let mut chars = text.chars();
    let (Some(glyph), None) = (chars.next(), chars.next()) else {
        bail!("<char> must hold exactly one character, got {text:?}");
    };
    let mut spec = GlyphSpec::new(glyph, Vec3::ONE, 30.0);
    spec.color = parse_color(optional_text(node, "color"), spec.color)?;
    spec.shininess = parse_f32(optional_text(node, "shininess"), spec.shininess)?;
    spec.metallic = optional_text(node, "metallic")
        .map(|value| parse_bool(Some(value), false))
        .transpose()?;
    spec.centered = parse_bool(optional_text(node, "centered"), false)?;
    if let Some(placement) = optional_text(node, "placement") {
        spec.placement = parse_placement(&placement)?;
    } else {
        spec.placement = Placement::At(parse_vec3(optional_text(node, "position"), Vec3::ZERO)?);
    }
    Ok(spec)
}

fn parse_placement(value: &str) -> Result<Placement> {
    let mut parts = value.split_whitespace();
    match parts.next() {
        Some("left") => {
            let gap = parts
                .next()
                .map(|gap| gap.parse::<f32>())
                .transpose()
                .map_err(|err| anyhow!("invalid placement gap: {err}"))?
                .unwrap_or(1.0);
            Ok(Placement::LeftOfOrigin { gap })
        }
        _ => Err(anyhow!(
            "unknown placement {value:?}, expected \"left <gap>\""
        )),
    }
}

fn hex(rgb: u32) -> Vec3 {
    Vec3::new(
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
    )
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let numbers = value
        .split_whitespace()
        .map(|component| component.parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| anyhow!("invalid vector {value:?}: {err}"))?;
    match numbers.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!("vector {value:?} must have 3 components")),
    }
}

/// Accepts `#rrggbb` or three 0-255 components.
fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    if let Some(digits) = value.strip_prefix('#') {
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            bail!("color {value:?} must have six hex digits");
        }
        let rgb = u32::from_str_radix(digits, 16)
            .map_err(|err| anyhow!("invalid color {value:?}: {err}"))?;
        return Ok(hex(rgb));
    }
    let rgb = parse_vec3(Some(value.clone()), Vec3::ZERO).context("color is missing components")?;
    if !rgb.cmpge(Vec3::ZERO).all() || !rgb.cmple(Vec3::splat(255.0)).all() {
        bail!("color {value:?} components must be between 0 and 255");
    }
    Ok(rgb / 255.0)
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float {value:?}: {err}")),
        None => Ok(default),
    }
}

fn parse_u32(value: Option<String>, default: u32) -> Result<u32> {
    match value {
        Some(value) => value
            .parse::<u32>()
            .map_err(|err| anyhow!("failed to parse integer {value:?}: {err}")),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, default: bool) -> Result<bool> {
    match value.as_deref() {
        None => Ok(default),
        Some("true" | "yes" | "on" | "1") => Ok(true),
        Some("false" | "no" | "off" | "0") => Ok(false),
        Some(other) => Err(anyhow!("expected a boolean, got {other:?}")),
    }
}

fn parse_key(value: Option<String>, default: KeyCode) -> Result<KeyCode> {
    match value {
        Some(name) => KeyCode::from_name(&name).ok_or_else(|| anyhow!("unknown key {name:?}")),
        None => Ok(default),
    }
}
