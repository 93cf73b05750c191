use crate::text::Vertex;

/// Blinn-Phong shader. `fs_main` computes the same terms as
/// [`crate::shading::shade`].
pub(crate) const SHADER: &str = r#"
struct GlobalUniform {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
}

struct ObjectUniform {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    base_color: vec4<f32>,
    light_position: vec4<f32>,
    // w: ambient intensity
    light_color: vec4<f32>,
    // x: shininess, y: metallic, z: lighting, w: specular
    params: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> globals: GlobalUniform;

@group(1) @binding(0)
var<uniform> object: ObjectUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

fn safe_normalize(v: vec3<f32>) -> vec3<f32> {
    let len = length(v);
    if (len > 0.0) {
        return v / len;
    }
    return vec3<f32>(0.0);
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_position = object.model * vec4<f32>(input.position, 1.0);
    out.position = globals.view_proj * world_position;
    out.world_pos = world_position.xyz;
    out.normal = mat3x3<f32>(
        object.normal[0].xyz,
        object.normal[1].xyz,
        object.normal[2].xyz
    ) * input.normal;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let base = object.base_color.rgb;
    if (object.params.z < 0.5) {
        return vec4<f32>(base, 1.0);
    }

    let light_color = object.light_color.rgb;
    let ambient = object.light_color.w * base;

    let normal = safe_normalize(input.normal);
    let light_dir = safe_normalize(object.light_position.xyz - input.world_pos);
    let diffuse = max(dot(normal, light_dir), 0.0) * light_color * base;

    var specular = vec3<f32>(0.0);
    if (object.params.w > 0.5) {
        let view_dir = safe_normalize(globals.camera_position.xyz - input.world_pos);
        let halfway = safe_normalize(light_dir + view_dir);
        let n_dot_h = max(dot(normal, halfway), 0.0);
        var strength = 0.0;
        if (n_dot_h > 0.0) {
            strength = pow(n_dot_h, object.params.x);
        }
        let tint = select(light_color, base, object.params.y > 0.5);
        specular = strength * tint;
    }

    let color = clamp(ambient + diffuse + specular, vec3<f32>(0.0), vec3<f32>(1.0));
    return vec4<f32>(color, 1.0);
}
"#;

/// Edge length of the marker cube before scaling.
pub const CUBE_SIZE: f32 = 1.0;

const CUBE_VERTICES: &[f32] = &[
    // positions        // normals
    -0.5, -0.5, 0.5, 0.0, 0.0, 1.0, 0.5, -0.5, 0.5, 0.0, 0.0, 1.0, 0.5, 0.5, 0.5, 0.0, 0.0, 1.0,
    -0.5, 0.5, 0.5, 0.0, 0.0, 1.0, -0.5, -0.5, -0.5, 0.0, 0.0, -1.0, 0.5, -0.5, -0.5, 0.0, 0.0,
    -1.0, 0.5, 0.5, -0.5, 0.0, 0.0, -1.0, -0.5, 0.5, -0.5, 0.0, 0.0, -1.0, -0.5, -0.5, -0.5, -1.0,
    0.0, 0.0, -0.5, -0.5, 0.5, -1.0, 0.0, 0.0, -0.5, 0.5, 0.5, -1.0, 0.0, 0.0, -0.5, 0.5, -0.5,
    -1.0, 0.0, 0.0, 0.5, -0.5, -0.5, 1.0, 0.0, 0.0, 0.5, -0.5, 0.5, 1.0, 0.0, 0.0, 0.5, 0.5, 0.5,
    1.0, 0.0, 0.0, 0.5, 0.5, -0.5, 1.0, 0.0, 0.0, -0.5, -0.5, -0.5, 0.0, -1.0, 0.0, 0.5, -0.5,
    -0.5, 0.0, -1.0, 0.0, 0.5, -0.5, 0.5, 0.0, -1.0, 0.0, -0.5, -0.5, 0.5, 0.0, -1.0, 0.0, -0.5,
    0.5, -0.5, 0.0, 1.0, 0.0, 0.5, 0.5, -0.5, 0.0, 1.0, 0.0, 0.5, 0.5, 0.5, 0.0, 1.0, 0.0, -0.5,
    0.5, 0.5, 0.0, 1.0, 0.0,
];

pub(crate) const CUBE_INDICES: &[u32] = &[
    0, 1, 2, 0, 2, 3, // front
    4, 6, 5, 4, 7, 6, // back
    8, 9, 10, 8, 10, 11, // left
    12, 14, 13, 12, 15, 14, // right
    16, 18, 17, 16, 19, 18, // bottom
    20, 21, 22, 20, 22, 23, // top
];

/// Unit cube centered on the origin, with flat face normals.
pub(crate) fn cube_vertices() -> Vec<Vertex> {
    CUBE_VERTICES
        .chunks_exact(6)
        .map(|v| Vertex {
            position: [v[0], v[1], v[2]],
            normal: [v[3], v[4], v[5]],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_spans_its_edge_length() {
        let vertices = cube_vertices();
        assert_eq!(vertices.len(), 24);
        for vertex in &vertices {
            for component in vertex.position {
                assert_eq!(component.abs(), CUBE_SIZE / 2.0);
            }
        }
        assert!(CUBE_INDICES.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn shader_declares_both_entry_points() {
        assert!(SHADER.contains("fn vs_main"));
        assert!(SHADER.contains("fn fs_main"));
    }
}
