use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use lyon_path::{math, Path};
use lyon_tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, VertexBuffers,
};
use serde::{Deserialize, Serialize};

use super::font::Font;
use crate::error::GeometryError;

const EPSILON: f32 = 1e-6;

/// Interleaved vertex consumed by the renderer: position then normal.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }
}

/// Glyph extrusion parameters, in scene units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtrudeOptions {
    /// Em size of the glyph.
    pub size: f32,
    /// Extrusion depth along +Z.
    pub depth: f32,
    /// Straight segments used per outline curve.
    pub curve_segments: u32,
}

impl Default for ExtrudeOptions {
    fn default() -> Self {
        Self {
            size: 2.0,
            depth: 0.5,
            curve_segments: 12,
        }
    }
}

/// Solid mesh of one extruded glyph. Geometry is fixed once built.
#[derive(Debug, Clone)]
pub struct GlyphGeometry {
    glyph: char,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    bounds: Aabb,
    advance: f32,
}

impl GlyphGeometry {
    pub fn glyph(&self) -> char {
        self.glyph
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Horizontal advance reported by the font.
    pub fn advance(&self) -> f32 {
        self.advance
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Translates the geometry so its bounding box is centered on the origin.
    pub fn center(&mut self) {
        let offset = self.bounds.center();
        for vertex in &mut self.vertices {
            let p = Vec3::from(vertex.position) - offset;
            vertex.position = p.into();
        }
        self.bounds = Aabb {
            min: self.bounds.min - offset,
            max: self.bounds.max - offset,
        };
    }
}

/// Outlines `glyph` from `font` and extrudes it into a closed solid.
pub fn build_glyph(
    font: &Font,
    glyph: char,
    options: &ExtrudeOptions,
) -> Result<GlyphGeometry, GeometryError> {
    let outline = font.outline(glyph, options.size, options.curve_segments)?;
    let (vertices, indices) = extrude_contours(glyph, &outline.contours, options.depth)?;
    let bounds = Aabb::from_points(vertices.iter().map(|v| Vec3::from(v.position)))
        .ok_or(GeometryError::EmptyOutline(glyph))?;
    Ok(GlyphGeometry {
        glyph,
        vertices,
        indices,
        bounds,
        advance: outline.advance,
    })
}

/// Extrudes closed contours from z = 0 to z = `depth`.
///
/// The back cap faces -Z, the front cap faces +Z and side walls face away
/// from the filled region. Every triangle winds counter-clockwise when seen
/// from the side its normal points to.
pub fn extrude_contours(
    glyph: char,
    contours: &[Vec<Vec2>],
    depth: f32,
) -> Result<(Vec<Vertex>, Vec<u32>), GeometryError> {
    let contours: Vec<&Vec<Vec2>> = contours.iter().filter(|c| c.len() >= 3).collect();
    if contours.is_empty() {
        return Err(GeometryError::EmptyOutline(glyph));
    }

    let mut builder = Path::builder();
    for contour in &contours {
        builder.begin(math::point(contour[0].x, contour[0].y));
        for p in contour.iter().skip(1) {
            builder.line_to(math::point(p.x, p.y));
        }
        builder.end(true);
    }
    let path = builder.build();

    let mut cap: VertexBuffers<Vec2, u32> = VertexBuffers::new();
    FillTessellator::new()
        .tessellate_path(
            &path,
            &FillOptions::tolerance(0.001).with_fill_rule(FillRule::EvenOdd),
            &mut BuffersBuilder::new(&mut cap, |vertex: FillVertex| {
                Vec2::new(vertex.position().x, vertex.position().y)
            }),
        )
        .map_err(|err| GeometryError::Tessellation {
            glyph,
            message: format!("{err:?}"),
        })?;
    if cap.indices.is_empty() {
        return Err(GeometryError::EmptyOutline(glyph));
    }

    let mut vertices = Vec::with_capacity(cap.vertices.len() * 2);
    let mut indices = Vec::with_capacity(cap.indices.len() * 2);

    for p in &cap.vertices {
        vertices.push(Vertex::new(p.extend(0.0), Vec3::NEG_Z));
    }
    let front_offset = vertices.len() as u32;
    for p in &cap.vertices {
        vertices.push(Vertex::new(p.extend(depth), Vec3::Z));
    }

    for tri in cap.indices.chunks_exact(3) {
        let (a, mut b, mut c) = (tri[0], tri[1], tri[2]);
        let pa = cap.vertices[a as usize];
        let pb = cap.vertices[b as usize];
        let pc = cap.vertices[c as usize];
        let area = (pb - pa).perp_dot(pc - pa);
        if area == 0.0 {
            continue;
        }
        if area < 0.0 {
            std::mem::swap(&mut b, &mut c);
        }
        // back cap is seen from -Z, so its winding is reversed
        indices.extend_from_slice(&[a, c, b]);
        indices.extend_from_slice(&[front_offset + a, front_offset + b, front_offset + c]);
    }

    for (index, contour) in contours.iter().enumerate() {
        let is_hole = nesting_depth(index, &contours) % 2 == 1;
        let counter_clockwise = signed_area(contour) > 0.0;
        let sign = if counter_clockwise != is_hole { 1.0 } else { -1.0 };
        add_side_walls(&mut vertices, &mut indices, contour, depth, sign);
    }

    Ok((vertices, indices))
}

/// `sign` = 1 when the filled region lies to the left of the contour direction.
fn add_side_walls(
    vertices: &mut Vec<Vertex>,
    indices: &mut Vec<u32>,
    contour: &[Vec2],
    depth: f32,
    sign: f32,
) {
    for (i, &p0) in contour.iter().enumerate() {
        let p1 = contour[(i + 1) % contour.len()];
        let edge = p1 - p0;
        let len = edge.length();
        if len < EPSILON {
            continue;
        }
        let normal = (Vec2::new(edge.y, -edge.x) / len * sign).extend(0.0);
        let base = vertices.len() as u32;
        vertices.push(Vertex::new(p0.extend(0.0), normal));
        vertices.push(Vertex::new(p1.extend(0.0), normal));
        vertices.push(Vertex::new(p1.extend(depth), normal));
        vertices.push(Vertex::new(p0.extend(depth), normal));
        if sign > 0.0 {
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        } else {
            indices.extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
        }
    }
}

fn signed_area(ring: &[Vec2]) -> f32 {
    let mut area = 0.0;
    for (i, p) in ring.iter().enumerate() {
        let q = ring[(i + 1) % ring.len()];
        area += p.perp_dot(q);
    }
    area * 0.5
}

/// Number of other contours enclosing the first point of `contours[index]`.
fn nesting_depth(index: usize, contours: &[&Vec<Vec2>]) -> usize {
    let probe = contours[index][0];
    contours
        .iter()
        .enumerate()
        .filter(|(other, ring)| *other != index && contains_point(ring, probe))
        .count()
}

fn contains_point(ring: &[Vec2], point: Vec2) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > point.y) != (b.y > point.y) {
            let x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
