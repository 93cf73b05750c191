use std::sync::Arc;

use glam::Vec3;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Scene-wide switches carried by the light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LightFlags {
    /// Specular highlights take the surface color instead of the light color.
    #[serde(default)]
    pub metallic: bool,
}

/// The single point light illuminating the glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightState {
    pub position: Vec3,
    pub color: Vec3,
    pub ambient_intensity: f32,
    #[serde(default)]
    pub flags: LightFlags,
}

impl Default for LightState {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.0, 0.0),
            color: Vec3::ONE,
            ambient_intensity: 0.261,
            flags: LightFlags::default(),
        }
    }
}

/// Handle to one [`LightState`] shared by every material that reads it.
///
/// Cloning the handle aliases the same light: a write through any clone is
/// observed by all other clones on their next read.
#[derive(Debug, Default)]
pub struct SharedLight {
    inner: Arc<RwLock<LightState>>,
}

impl Clone for SharedLight {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SharedLight {
    pub fn new(state: LightState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Returns a copy of the current light.
    pub fn snapshot(&self) -> LightState {
        *self.inner.read()
    }

    pub fn position(&self) -> Vec3 {
        self.inner.read().position
    }

    pub fn set_position(&self, position: Vec3) {
        self.inner.write().position = position;
    }

    /// Moves the light by `delta` and returns the new position.
    pub fn translate(&self, delta: Vec3) -> Vec3 {
        let mut guard = self.inner.write();
        guard.position += delta;
        guard.position
    }

    /// True when both handles refer to the same light.
    pub fn ptr_eq(&self, other: &SharedLight) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_alias_the_same_light() {
        let light = SharedLight::new(LightState::default());
        let alias = light.clone();
        light.translate(Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(alias.position(), Vec3::new(0.0, 1.5, 0.0));
        assert!(light.ptr_eq(&alias));
    }

    #[test]
    fn independent_lights_do_not_alias() {
        let a = SharedLight::new(LightState::default());
        let b = SharedLight::new(LightState::default());
        a.set_position(Vec3::ZERO);
        assert_eq!(b.position(), Vec3::new(0.0, 1.0, 0.0));
        assert!(!a.ptr_eq(&b));
    }
}
