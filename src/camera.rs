use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Perspective camera looking down -Z, the way the demo scenes frame the text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub position: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    #[serde(default = "default_aspect")]
    pub aspect: f32,
}

fn default_aspect() -> f32 {
    16.0 / 9.0
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            aspect: default_aspect(),
        }
    }
}

impl CameraState {
    /// Updates the aspect ratio from a surface size; zero heights are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, Vec3::NEG_Z, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov.to_radians(),
            self.aspect.max(0.01),
            self.near,
            self.far,
        )
    }

    pub fn params(&self) -> CameraParams {
        CameraParams {
            view_proj: self.projection() * self.view(),
            position: self.position,
        }
    }
}

/// Camera values consumed by the renderer's global uniform buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraParams {
    pub view_proj: Mat4,
    pub position: Vec3,
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn point_in_front_of_camera_projects_inside_clip_volume() {
        let camera = CameraState::default();
        let clip = camera.params().view_proj * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn moving_camera_right_shifts_scene_left() {
        let mut camera = CameraState::default();
        camera.position.x += 1.0;
        let clip = camera.params().view_proj * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(clip.x / clip.w < 0.0);
    }

    #[test]
    fn zero_height_viewport_keeps_previous_aspect() {
        let mut camera = CameraState::default();
        camera.set_viewport(800, 400);
        assert_eq!(camera.aspect, 2.0);
        camera.set_viewport(800, 0);
        assert_eq!(camera.aspect, 2.0);
    }
}
