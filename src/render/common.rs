use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3, Vec4Swizzles};

use crate::camera::CameraParams;
use crate::light::LightState;
use crate::shading::{shade, LightingParams, MaterialParams, Shade, ShadingFeatures, SurfaceSample};

/// Group 0 uniform: values shared by every draw in a frame.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
}

impl GlobalUniform {
    pub fn from_camera(camera: &CameraParams) -> Self {
        Self {
            view_proj: camera.view_proj.to_cols_array_2d(),
            camera_position: camera.position.extend(1.0).into(),
        }
    }

    pub fn camera_position(&self) -> Vec3 {
        Vec3::new(
            self.camera_position[0],
            self.camera_position[1],
            self.camera_position[2],
        )
    }
}

/// Group 1 uniform: material and light values of one mesh.
///
/// `light_color.w` carries the ambient intensity and `params` packs
/// `(shininess, metallic, lighting, specular)` with booleans as 0 or 1.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    pub base_color: [f32; 4],
    pub light_position: [f32; 4],
    pub light_color: [f32; 4],
    pub params: [f32; 4],
}

impl ObjectUniform {
    pub fn new(
        model: Mat4,
        material: &MaterialParams,
        light: &LightState,
        features: ShadingFeatures,
    ) -> Self {
        let normal = Mat3::from_mat4(model).inverse().transpose();
        Self {
            model: model.to_cols_array_2d(),
            normal: mat3_to_3x4(normal),
            base_color: material.base_color.extend(1.0).into(),
            light_position: light.position.extend(1.0).into(),
            light_color: light.color.extend(light.ambient_intensity).into(),
            params: [
                material.shininess,
                flag(material.is_metallic),
                flag(features.lighting),
                flag(features.specular),
            ],
        }
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model)
    }

    pub fn light_position(&self) -> Vec3 {
        Vec3::from_slice(&self.light_position[..3])
    }

    pub fn features(&self) -> ShadingFeatures {
        ShadingFeatures {
            lighting: self.params[2] > 0.5,
            specular: self.params[3] > 0.5,
        }
    }

    pub fn material(&self) -> MaterialParams {
        MaterialParams {
            base_color: Vec3::from_slice(&self.base_color[..3]),
            shininess: self.params[0],
            is_metallic: self.params[1] > 0.5,
        }
    }

    pub fn lighting(&self, camera_position: Vec3) -> LightingParams {
        LightingParams {
            light_position: self.light_position(),
            light_color: Vec3::from_slice(&self.light_color[..3]),
            ambient_intensity: self.light_color[3],
            camera_position,
        }
    }

    /// Evaluates the fragment shader on the CPU for a point given in the
    /// mesh's local space.
    pub fn shade_local(&self, camera_position: Vec3, position: Vec3, normal: Vec3) -> Shade {
        let world_position = (self.model() * position.extend(1.0)).xyz();
        let n = self.normal;
        let normal_matrix = Mat3::from_cols(
            Vec3::from_slice(&n[0][..3]),
            Vec3::from_slice(&n[1][..3]),
            Vec3::from_slice(&n[2][..3]),
        );
        let sample = SurfaceSample {
            normal: normal_matrix * normal,
            world_position,
        };
        shade(
            self.features(),
            &self.material(),
            &self.lighting(camera_position),
            &sample,
        )
    }
}

/// Mesh referenced by a [`DrawItem`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshId {
    /// Index into the scene's glyph list.
    Glyph(usize),
    /// The cube drawn at the light position.
    Marker,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawItem {
    pub mesh: MeshId,
    pub uniform: ObjectUniform,
}

/// Everything the renderer needs to draw one frame, without any GPU state.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub index: u64,
    pub clear_color: Vec3,
    pub globals: GlobalUniform,
    pub draws: Vec<DrawItem>,
}

impl Frame {
    pub fn draw(&self, mesh: MeshId) -> Option<&DrawItem> {
        self.draws.iter().find(|item| item.mesh == mesh)
    }
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}
