use std::fmt::Write as _;

use anyhow::{Context, Result};
use glam::Vec3;
use log::info;

use crate::input::{Action, Controller, KeyCode};
use crate::render::{DrawItem, Frame, GlobalUniform, MeshId};
use crate::scene::SceneDescription;
use crate::state::SceneState;
use crate::text::FontLoader;

/// The interactive demo without any window or GPU: scene state, keyboard
/// controller and per-frame uniform generation.
#[derive(Debug)]
pub struct App {
    state: SceneState,
    controller: Controller,
    frames: u64,
}

impl App {
    pub fn new(state: SceneState, controller: Controller) -> Self {
        Self {
            state,
            controller,
            frames: 0,
        }
    }

    /// Loads the font through `loader` and builds the scene.
    pub fn from_description(description: &SceneDescription, loader: &dyn FontLoader) -> Result<Self> {
        let font = loader
            .load(&description.font)
            .with_context(|| format!("failed to load font {}", description.font))?;
        let state = SceneState::build(description, &font)?;
        info!(
            "built {} scene with {} glyph(s)",
            description.preset,
            state.glyphs.len()
        );
        Ok(Self::new(state, description.controls))
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn handle_key(&mut self, key: KeyCode) -> Option<Action> {
        self.controller.handle_key(&mut self.state, key)
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.state.camera.set_viewport(width, height);
    }

    /// Captures the uniforms for the next frame from the current scene.
    pub fn frame(&mut self) -> Frame {
        let globals = GlobalUniform::from_camera(&self.state.camera.params());
        let features = self.state.features;
        let mut draws: Vec<DrawItem> = self
            .state
            .glyphs
            .iter()
            .enumerate()
            .map(|(index, glyph)| DrawItem {
                mesh: MeshId::Glyph(index),
                uniform: glyph.uniform(features),
            })
            .collect();
        if let Some(marker) = &self.state.marker {
            draws.push(DrawItem {
                mesh: MeshId::Marker,
                uniform: marker.uniform(),
            });
        }

        let frame = Frame {
            index: self.frames,
            clear_color: self.state.clear_color,
            globals,
            draws,
        };
        self.frames += 1;
        frame
    }

    /// Human readable report of the scene, one fact per line.
    ///
    /// Each glyph's color is shaded at the center of its front face, as seen
    /// from the current camera.
    pub fn summary(&self) -> String {
        let state = &self.state;
        let mut out = String::new();
        let _ = writeln!(out, "Frames rendered: {}", self.frames);
        let _ = writeln!(out, "Light position: {}", fmt_vec3(state.light.position()));
        let _ = writeln!(out, "Camera position: {}", fmt_vec3(state.camera.position));
        let _ = writeln!(out, "Glyphs:");
        for glyph in &state.glyphs {
            let bounds = glyph.geometry.bounds();
            let front = Vec3::new(bounds.center().x, bounds.center().y, bounds.max.z);
            let shade = glyph.uniform(state.features).shade_local(
                state.camera.position,
                front,
                Vec3::Z,
            );
            let [r, g, b, _] = shade.rgba();
            let _ = writeln!(
                out,
                " - {:?} at {}: {} triangles, advance {:.2}, front color ({r:.3}, {g:.3}, {b:.3})",
                glyph.geometry.glyph(),
                fmt_vec3(glyph.position),
                glyph.geometry.triangle_count(),
                glyph.geometry.advance(),
            );
        }
        match &state.marker {
            Some(marker) => {
                let _ = writeln!(
                    out,
                    "Light marker: size {:.2} at {}",
                    marker.size,
                    fmt_vec3(state.light.position())
                );
            }
            None => {
                let _ = writeln!(out, "Light marker: none");
            }
        }
        out
    }
}

fn fmt_vec3(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Preset;
    use crate::text::FsFontLoader;

    fn app(preset: Preset) -> App {
        App::from_description(&preset.description(), &FsFontLoader).unwrap()
    }

    #[test]
    fn frame_contains_glyphs_then_marker() {
        let mut app = app(Preset::Metallic);
        let frame = app.frame();
        assert_eq!(frame.index, 0);
        let meshes: Vec<MeshId> = frame.draws.iter().map(|item| item.mesh).collect();
        assert_eq!(
            meshes,
            vec![MeshId::Glyph(0), MeshId::Glyph(1), MeshId::Marker]
        );
        assert_eq!(app.frame().index, 1);
        assert_eq!(app.frames(), 2);
    }

    #[test]
    fn light_moves_are_visible_in_the_next_frame() {
        let mut app = app(Preset::Specular);
        app.handle_key(KeyCode::Character('W'));
        let frame = app.frame();
        for item in &frame.draws {
            assert!((item.uniform.light_position() - Vec3::new(0.0, 1.1, 0.0)).length() < 1e-5);
        }
    }

    #[test]
    fn camera_moves_update_global_uniform() {
        let mut app = app(Preset::Diffuse);
        app.handle_key(KeyCode::Character('D'));
        app.handle_key(KeyCode::Character('D'));
        let frame = app.frame();
        assert!((frame.globals.camera_position() - Vec3::new(0.2, 0.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn viewport_changes_projection_only() {
        let mut app = app(Preset::Metallic);
        let before = app.frame().globals;
        app.set_viewport(800, 800);
        let after = app.frame().globals;
        assert_ne!(before.view_proj, after.view_proj);
        assert_eq!(before.camera_position, after.camera_position);
        app.set_viewport(800, 0);
        assert_eq!(app.frame().globals, after);
    }

    #[test]
    fn summary_reports_positions() {
        let mut app = app(Preset::Metallic);
        app.handle_key(KeyCode::Character('S'));
        app.frame();
        let summary = app.summary();
        assert!(summary.contains("Frames rendered: 1"));
        assert!(summary.contains("Light position: (0.00, 0.90, 0.00)"));
        assert!(summary.contains("Camera position: (0.00, 0.00, 5.00)"));
        assert!(summary.contains("'n' at"));
        assert!(summary.contains("advance 1.40"));
        assert!(summary.contains("Light marker: size 0.50"));
    }

    #[test]
    fn flat_summary_shows_base_colors() {
        let app = app(Preset::Flat);
        let summary = app.summary();
        assert!(summary.contains("front color (0.098, 0.098, 0.439)"));
        assert!(summary.contains("Light marker: none"));
    }
}
