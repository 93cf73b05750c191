//! Blinn-Phong shading shared by the CPU reference path and the WGSL shader.
//!
//! [`shade`] mirrors `fs_main` in the renderer's shader term for term so the
//! lighting formula can be exercised without a GPU.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Which lighting terms are evaluated.
///
/// With `lighting` disabled the surface is drawn in its flat base color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadingFeatures {
    pub lighting: bool,
    pub specular: bool,
}

impl ShadingFeatures {
    pub const UNLIT: Self = Self {
        lighting: false,
        specular: false,
    };
    pub const DIFFUSE: Self = Self {
        lighting: true,
        specular: false,
    };
    pub const BLINN_PHONG: Self = Self {
        lighting: true,
        specular: true,
    };
}

impl Default for ShadingFeatures {
    fn default() -> Self {
        Self::BLINN_PHONG
    }
}

/// Per-material uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialParams {
    pub base_color: Vec3,
    pub shininess: f32,
    pub is_metallic: bool,
}

/// Light and camera uniforms seen by one fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingParams {
    pub light_position: Vec3,
    pub light_color: Vec3,
    pub ambient_intensity: f32,
    pub camera_position: Vec3,
}

/// Interpolated surface attributes of one fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    pub normal: Vec3,
    pub world_position: Vec3,
}

/// Individual lighting terms; [`Shade::color`] is their sum.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Shade {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl Shade {
    pub fn color(&self) -> Vec3 {
        self.ambient + self.diffuse + self.specular
    }

    /// Opaque RGBA, clamped to the displayable range.
    pub fn rgba(&self) -> [f32; 4] {
        let c = self.color().clamp(Vec3::ZERO, Vec3::ONE);
        [c.x, c.y, c.z, 1.0]
    }
}

/// Evaluates the lighting model for one surface sample.
pub fn shade(
    features: ShadingFeatures,
    material: &MaterialParams,
    lighting: &LightingParams,
    surface: &SurfaceSample,
) -> Shade {
    if !features.lighting {
        return Shade {
            ambient: material.base_color,
            ..Shade::default()
        };
    }

    let ambient = lighting.ambient_intensity * material.base_color;

    // Zero-length vectors stay zero, which zeroes every term depending on them.
    let normal = surface.normal.normalize_or_zero();
    let light_dir = (lighting.light_position - surface.world_position).normalize_or_zero();
    let n_dot_l = normal.dot(light_dir).max(0.0);
    let diffuse = n_dot_l * lighting.light_color * material.base_color;

    let specular = if features.specular {
        let view_dir = (lighting.camera_position - surface.world_position).normalize_or_zero();
        let halfway = (light_dir + view_dir).normalize_or_zero();
        let n_dot_h = normal.dot(halfway).max(0.0);
        let strength = if n_dot_h > 0.0 {
            n_dot_h.powf(material.shininess)
        } else {
            0.0
        };
        let tint = if material.is_metallic {
            material.base_color
        } else {
            lighting.light_color
        };
        strength * tint
    } else {
        Vec3::ZERO
    };

    Shade {
        ambient,
        diffuse,
        specular,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAVY: Vec3 = Vec3::new(25.0 / 255.0, 25.0 / 255.0, 112.0 / 255.0);

    fn material(is_metallic: bool) -> MaterialParams {
        MaterialParams {
            base_color: NAVY,
            shininess: 30.0,
            is_metallic,
        }
    }

    fn lighting(light_position: Vec3) -> LightingParams {
        LightingParams {
            light_position,
            light_color: Vec3::ONE,
            ambient_intensity: 0.261,
            camera_position: Vec3::new(0.0, 0.0, 5.0),
        }
    }

    fn facing_camera() -> SurfaceSample {
        SurfaceSample {
            normal: Vec3::Z,
            world_position: Vec3::ZERO,
        }
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-6
    }

    #[test]
    fn ambient_ignores_geometry() {
        let expected = 0.261 * NAVY;
        for (normal, light) in [
            (Vec3::Z, Vec3::new(0.0, 1.0, 0.0)),
            (Vec3::NEG_Z, Vec3::new(4.0, -2.0, 9.0)),
            (Vec3::ZERO, Vec3::new(-3.0, 3.0, 3.0)),
        ] {
            let surface = SurfaceSample {
                normal,
                world_position: Vec3::new(0.3, 0.1, 0.0),
            };
            let out = shade(
                ShadingFeatures::BLINN_PHONG,
                &material(false),
                &lighting(light),
                &surface,
            );
            assert!(approx(out.ambient, expected));
        }
    }

    #[test]
    fn diffuse_is_zero_when_light_is_behind_or_grazing() {
        let behind = shade(
            ShadingFeatures::DIFFUSE,
            &material(false),
            &lighting(Vec3::new(0.0, 0.0, -3.0)),
            &facing_camera(),
        );
        assert_eq!(behind.diffuse, Vec3::ZERO);

        let grazing = shade(
            ShadingFeatures::DIFFUSE,
            &material(false),
            &lighting(Vec3::new(3.0, 0.0, 0.0)),
            &facing_camera(),
        );
        assert_eq!(grazing.diffuse, Vec3::ZERO);
    }

    #[test]
    fn diffuse_peaks_when_light_is_along_normal() {
        let out = shade(
            ShadingFeatures::DIFFUSE,
            &material(false),
            &lighting(Vec3::new(0.0, 0.0, 2.0)),
            &facing_camera(),
        );
        assert!(approx(out.diffuse, NAVY));
        assert_eq!(out.specular, Vec3::ZERO);
    }

    #[test]
    fn metallic_flag_switches_specular_tint() {
        let light = lighting(Vec3::new(0.0, 0.0, 3.0));
        let dielectric = shade(
            ShadingFeatures::BLINN_PHONG,
            &material(false),
            &light,
            &facing_camera(),
        );
        let metal = shade(
            ShadingFeatures::BLINN_PHONG,
            &material(true),
            &light,
            &facing_camera(),
        );
        assert!(approx(dielectric.specular, Vec3::ONE));
        assert!(approx(metal.specular, NAVY));
        assert_ne!(dielectric.color(), metal.color());
    }

    #[test]
    fn zero_normal_contributes_only_ambient() {
        let surface = SurfaceSample {
            normal: Vec3::ZERO,
            world_position: Vec3::ZERO,
        };
        let out = shade(
            ShadingFeatures::BLINN_PHONG,
            &material(true),
            &lighting(Vec3::new(0.0, 0.0, 3.0)),
            &surface,
        );
        assert_eq!(out.diffuse, Vec3::ZERO);
        assert_eq!(out.specular, Vec3::ZERO);
        assert!(approx(out.color(), out.ambient));
    }

    #[test]
    fn light_at_surface_point_is_not_nan() {
        let out = shade(
            ShadingFeatures::BLINN_PHONG,
            &material(false),
            &lighting(Vec3::ZERO),
            &facing_camera(),
        );
        assert!(out.color().is_finite());
    }

    #[test]
    fn fractional_shininess_widens_the_highlight() {
        // Light and camera share a direction 60 degrees off the normal, so n.h = 0.5.
        let direction = Vec3::new(60f32.to_radians().sin(), 0.0, 60f32.to_radians().cos());
        let lighting = LightingParams {
            light_position: 3.0 * direction,
            light_color: Vec3::ONE,
            ambient_intensity: 0.261,
            camera_position: 5.0 * direction,
        };
        let mut soft = material(false);
        soft.shininess = 0.5;
        let out = shade(ShadingFeatures::BLINN_PHONG, &soft, &lighting, &facing_camera());
        let expected = 0.5f32.powf(0.5);
        assert!((out.specular - Vec3::splat(expected)).abs().max_element() < 1e-5);

        soft.shininess = 0.0;
        let flat = shade(ShadingFeatures::BLINN_PHONG, &soft, &lighting, &facing_camera());
        assert!(approx(flat.specular, Vec3::ONE));
    }

    #[test]
    fn unlit_returns_base_color() {
        let out = shade(
            ShadingFeatures::UNLIT,
            &material(false),
            &lighting(Vec3::new(0.0, 0.0, -3.0)),
            &facing_camera(),
        );
        assert_eq!(out.color(), NAVY);
        assert_eq!(out.rgba()[3], 1.0);
    }
}
