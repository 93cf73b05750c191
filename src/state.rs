use anyhow::{Context, Result};
use glam::{Mat4, Vec3};
use log::{debug, warn};

use crate::camera::CameraState;
use crate::light::{LightState, SharedLight};
use crate::render::{ObjectUniform, CUBE_SIZE};
use crate::scene::{GlyphSpec, Placement, SceneDescription};
use crate::shading::{MaterialParams, ShadingFeatures};
use crate::text::{build_glyph, Font, GlyphGeometry};

/// Surface parameters of a glyph, bound to the scene's shared light.
#[derive(Debug, Clone)]
pub struct GlyphMaterial {
    pub base_color: Vec3,
    pub shininess: f32,
    /// Overrides the light's metallic flag when set.
    pub metallic: Option<bool>,
    light: SharedLight,
}

impl GlyphMaterial {
    pub fn new(
        base_color: Vec3,
        shininess: f32,
        metallic: Option<bool>,
        light: SharedLight,
    ) -> Self {
        Self {
            base_color,
            shininess,
            metallic,
            light,
        }
    }

    pub fn light(&self) -> &SharedLight {
        &self.light
    }

    pub fn params(&self, light: &LightState) -> MaterialParams {
        MaterialParams {
            base_color: self.base_color,
            shininess: self.shininess,
            is_metallic: self.metallic.unwrap_or(light.flags.metallic),
        }
    }

    /// Uniform values for the current state of the shared light.
    pub fn uniform(&self, model: Mat4, features: ShadingFeatures) -> ObjectUniform {
        let light = self.light.snapshot();
        ObjectUniform::new(model, &self.params(&light), &light, features)
    }
}

/// An extruded glyph placed in the scene.
#[derive(Debug, Clone)]
pub struct GlyphMesh {
    pub geometry: GlyphGeometry,
    pub material: GlyphMaterial,
    pub position: Vec3,
}

impl GlyphMesh {
    pub fn model(&self) -> Mat4 {
        Mat4::from_translation(self.position)
    }

    pub fn uniform(&self, features: ShadingFeatures) -> ObjectUniform {
        self.material.uniform(self.model(), features)
    }
}

/// Unlit cube that follows the light.
#[derive(Debug, Clone)]
pub struct LightMarker {
    pub size: f32,
    light: SharedLight,
}

impl LightMarker {
    pub fn new(size: f32, light: SharedLight) -> Self {
        Self { size, light }
    }

    pub fn model(&self) -> Mat4 {
        let scale = Vec3::splat(self.size / CUBE_SIZE);
        Mat4::from_translation(self.light.position()) * Mat4::from_scale(scale)
    }

    pub fn uniform(&self) -> ObjectUniform {
        let light = self.light.snapshot();
        let material = MaterialParams {
            base_color: light.color,
            shininess: 1.0,
            is_metallic: false,
        };
        ObjectUniform::new(self.model(), &material, &light, ShadingFeatures::UNLIT)
    }
}

/// Live scene: the shared light, camera and every drawable.
#[derive(Debug)]
pub struct SceneState {
    pub light: SharedLight,
    pub camera: CameraState,
    pub glyphs: Vec<GlyphMesh>,
    pub marker: Option<LightMarker>,
    pub features: ShadingFeatures,
    pub clear_color: Vec3,
}

impl SceneState {
    /// Builds glyph geometry and materials. Every material and the marker
    /// share one light handle.
    pub fn build(description: &SceneDescription, font: &Font) -> Result<Self> {
        let light = SharedLight::new(description.light);
        let glyphs = description
            .glyphs
            .iter()
            .map(|spec| build_mesh(spec, description, font, &light))
            .collect::<Result<Vec<_>>>()?;
        let marker = description
            .marker
            .map(|size| LightMarker::new(size, light.clone()));

        Ok(Self {
            light,
            camera: description.camera,
            glyphs,
            marker,
            features: description.shading,
            clear_color: description.clear_color,
        })
    }
}

fn build_mesh(
    spec: &GlyphSpec,
    description: &SceneDescription,
    font: &Font,
    light: &SharedLight,
) -> Result<GlyphMesh> {
    if !font.has_glyph(spec.glyph) {
        warn!("font has no glyph {:?}; drawing '?' instead", spec.glyph);
    }
    let mut geometry = build_glyph(font, spec.glyph, &description.text)
        .with_context(|| format!("failed to build glyph {:?}", spec.glyph))?;
    if spec.centered {
        geometry.center();
    }
    let position = match spec.placement {
        Placement::At(position) => position,
        Placement::LeftOfOrigin { gap } => Vec3::new(-(geometry.bounds().width() + gap), 0.0, 0.0),
    };
    debug!(
        "glyph {:?}: {} triangles at {position:?}",
        spec.glyph,
        geometry.triangle_count()
    );
    Ok(GlyphMesh {
        geometry,
        material: GlyphMaterial::new(spec.color, spec.shininess, spec.metallic, light.clone()),
        position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Action, Controller, KeyCode};
    use crate::scene::Preset;

    fn scene(preset: Preset) -> SceneState {
        SceneState::build(&preset.description(), &Font::builtin().unwrap()).unwrap()
    }

    #[test]
    fn materials_share_the_scene_light() {
        let state = scene(Preset::Metallic);
        assert_eq!(state.glyphs.len(), 2);
        for glyph in &state.glyphs {
            assert!(glyph.material.light().ptr_eq(&state.light));
        }
        state.light.set_position(Vec3::new(0.0, 3.0, 0.0));
        for glyph in &state.glyphs {
            let uniform = glyph.uniform(state.features);
            assert_eq!(uniform.light_position(), Vec3::new(0.0, 3.0, 0.0));
        }
    }

    #[test]
    fn left_placement_ends_one_unit_left_of_origin() {
        let state = scene(Preset::Specular);
        let n = &state.glyphs[0];
        assert!((n.position.x + n.geometry.bounds().width() + 1.0).abs() < 1e-5);
        assert_eq!(state.glyphs[1].position, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn metallic_flag_follows_light_unless_overridden() {
        let mut state = scene(Preset::Metallic);
        let light = state.light.snapshot();
        assert!(state.glyphs[0].material.params(&light).is_metallic);
        state.glyphs[0].material.metallic = Some(false);
        assert!(!state.glyphs[0].material.params(&light).is_metallic);

        let specular = scene(Preset::Specular);
        let light = specular.light.snapshot();
        assert!(!specular.glyphs[1].material.params(&light).is_metallic);
    }

    #[test]
    fn marker_tracks_light_and_ignores_lighting() {
        let mut state = scene(Preset::Diffuse);
        let controller = Controller::default();
        controller.apply(&mut state, Action::LightUp);
        let marker = state.marker.as_ref().unwrap();
        let uniform = marker.uniform();
        let center = uniform.model().transform_point3(Vec3::ZERO);
        assert!((center - Vec3::new(0.0, 1.1, 0.0)).length() < 1e-5);
        assert_eq!(uniform.features(), ShadingFeatures::UNLIT);
        assert_eq!(uniform.material().base_color, Vec3::ONE);
    }

    #[test]
    fn flat_preset_has_no_marker() {
        let state = scene(Preset::Flat);
        assert!(state.marker.is_none());
        assert_eq!(state.clear_color, Vec3::ZERO);
        assert!(state.glyphs[0].geometry.bounds().center().length() < 1e-4);
    }

    #[test]
    fn unbound_keys_leave_the_scene_untouched() {
        let mut state = scene(Preset::Metallic);
        let before = (state.light.position(), state.camera.position);
        let action = Controller::default().handle_key(&mut state, KeyCode::Character('Q'));
        assert_eq!(action, None);
        assert_eq!((state.light.position(), state.camera.position), before);
    }
}
