//! Procedural meshes for every [`ModelKind`].
//!
//! Fish face −Z with the tail toward +Z, matching the orientation
//! controller's forward axis.

use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::scene::ModelKind;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Indexed triangle list.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Mesh for `kind`, in model space.
    pub fn for_model(kind: ModelKind) -> Self {
        match kind {
            ModelKind::Fish => fish(Vec3::new(0.35, 0.5, 1.2), 0.6),
            ModelKind::Grouper => fish(Vec3::new(0.5, 0.8, 1.1), 0.5),
            ModelKind::Seabed => slab(Vec3::new(21.0, 0.25, 27.5)),
            // Centred vertically so it fills its box collider.
            ModelKind::Plant => stalks(&[(Vec3::new(0.0, -0.47, 0.0), 0.25, 0.93)], 8),
            ModelKind::Kelp => stalks(
                &[
                    (Vec3::new(0.0, 0.0, 0.0), 0.06, 1.0),
                    (Vec3::new(0.3, 0.0, 0.2), 0.05, 0.8),
                    (Vec3::new(-0.25, 0.0, 0.3), 0.05, 0.9),
                    (Vec3::new(0.1, 0.0, -0.3), 0.04, 0.7),
                ],
                6,
            ),
            ModelKind::Lotus => lotus(8),
        }
    }

    fn push_triangle_fan(&mut self, center: Vertex, ring: &[Vertex]) {
        let base = self.vertices.len() as u32;
        self.vertices.push(center);
        self.vertices.extend_from_slice(ring);
        let n = ring.len() as u32;
        for i in 0..n {
            self.indices
                .extend_from_slice(&[base, base + 1 + i, base + 1 + (i + 1) % n]);
        }
    }

    /// Append another mesh, offsetting its indices.
    fn append(&mut self, other: MeshData) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }
}

fn vertex(position: Vec3, normal: Vec3) -> Vertex {
    Vertex {
        position: position.to_array(),
        normal: normal.normalize_or_zero().to_array(),
    }
}

/// UV sphere scaled to `radii`.
fn ellipsoid(radii: Vec3, rings: u32, segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    for r in 0..=rings {
        let v = r as f32 / rings as f32;
        let phi = v * std::f32::consts::PI;
        for s in 0..=segments {
            let theta = s as f32 / segments as f32 * TAU;
            let unit = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            // Normal of an ellipsoid is the unit normal divided by the radii.
            mesh.vertices.push(vertex(unit * radii, unit / radii));
        }
    }
    let stride = segments + 1;
    for r in 0..rings {
        for s in 0..segments {
            let a = r * stride + s;
            let b = a + stride;
            mesh.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    mesh
}

/// Body ellipsoid plus a flat tail fin behind it.
fn fish(body: Vec3, tail: f32) -> MeshData {
    let mut mesh = ellipsoid(Vec3::new(body.x, body.y, body.z), 10, 16);

    let root = Vec3::new(0.0, 0.0, body.z * 0.85);
    let tip = body.z + tail;
    let fin = [
        root,
        Vec3::new(0.0, body.y * 0.9, tip),
        Vec3::new(0.0, -body.y * 0.9, tip),
    ];
    // Both faces so the fin shows from either side.
    for normal in [Vec3::X, Vec3::NEG_X] {
        let base = mesh.vertices.len() as u32;
        mesh.vertices.extend(fin.iter().map(|&p| vertex(p, normal)));
        if normal.x > 0.0 {
            mesh.indices.extend_from_slice(&[base, base + 1, base + 2]);
        } else {
            mesh.indices.extend_from_slice(&[base, base + 2, base + 1]);
        }
    }
    mesh
}

/// Axis-aligned box with flat shading.
fn slab(half: Vec3) -> MeshData {
    let mut mesh = MeshData::default();
    let faces = [
        (Vec3::Y, Vec3::X, Vec3::Z),
        (Vec3::NEG_Y, Vec3::Z, Vec3::X),
        (Vec3::X, Vec3::Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Y, Vec3::Z),
        (Vec3::Z, Vec3::Y, Vec3::X),
        (Vec3::NEG_Z, Vec3::X, Vec3::Y),
    ];
    for (normal, u, v) in faces {
        let center = normal * half;
        let du = u * half;
        let dv = v * half;
        let base = mesh.vertices.len() as u32;
        for corner in [-du - dv, du - dv, du + dv, -du + dv] {
            mesh.vertices.push(vertex(center + corner, normal));
        }
        // Wind counter-clockwise as seen from outside.
        if u.cross(v).dot(normal) > 0.0 {
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        } else {
            mesh.indices
                .extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
        }
    }
    mesh
}

/// Tapered vertical cylinders standing on y = 0, each `(base, radius, height)`.
fn stalks(stalks: &[(Vec3, f32, f32)], segments: u32) -> MeshData {
    let mut mesh = MeshData::default();
    for &(base, radius, height) in stalks {
        let mut stalk = MeshData::default();
        for s in 0..=segments {
            let theta = s as f32 / segments as f32 * TAU;
            let dir = Vec3::new(theta.cos(), 0.0, theta.sin());
            stalk.vertices.push(vertex(base + dir * radius, dir));
            stalk
                .vertices
                .push(vertex(base + dir * radius * 0.3 + Vec3::Y * height, dir));
        }
        for s in 0..segments {
            let a = s * 2;
            stalk
                .indices
                .extend_from_slice(&[a, a + 1, a + 2, a + 2, a + 1, a + 3]);
        }
        mesh.append(stalk);
    }
    mesh
}

/// Flat flower: a disc of petals in the XY plane facing +Z.
fn lotus(petals: u32) -> MeshData {
    let mut mesh = MeshData::default();
    let center = vertex(Vec3::new(0.0, 0.0, 0.1), Vec3::Z);
    let ring: Vec<Vertex> = (0..petals * 2)
        .map(|i| {
            let theta = i as f32 / (petals * 2) as f32 * TAU;
            let r = if i % 2 == 0 { 0.5 } else { 0.25 };
            vertex(Vec3::new(theta.cos() * r, theta.sin() * r, 0.0), Vec3::Z)
        })
        .collect();
    mesh.push_triangle_fan(center, &ring);
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_model_has_a_valid_mesh() {
        for kind in ModelKind::ALL {
            let mesh = MeshData::for_model(kind);
            assert!(!mesh.indices.is_empty(), "{:?} is empty", kind);
            assert_eq!(mesh.indices.len() % 3, 0);
            let n = mesh.vertices.len() as u32;
            assert!(mesh.indices.iter().all(|&i| i < n), "{:?} index out of range", kind);
            for v in &mesh.vertices {
                let len = Vec3::from_array(v.normal).length();
                assert!((len - 1.0).abs() < 1e-3, "{:?} normal length {}", kind, len);
            }
        }
    }

    #[test]
    fn test_fish_tail_points_backward() {
        let mesh = MeshData::for_model(ModelKind::Fish);
        let max_z = mesh
            .vertices
            .iter()
            .map(|v| v.position[2])
            .fold(f32::MIN, f32::max);
        let min_z = mesh
            .vertices
            .iter()
            .map(|v| v.position[2])
            .fold(f32::MAX, f32::min);
        assert!(max_z > -min_z);
    }

    #[test]
    fn test_flat_faces_wind_with_normals() {
        let fish = MeshData::for_model(ModelKind::Fish);
        let fin_start = fish.indices.len() - 6;
        assert_faces_match_normals(&fish, fin_start);
        assert_faces_match_normals(&MeshData::for_model(ModelKind::Seabed), 0);
        assert_faces_match_normals(&MeshData::for_model(ModelKind::Lotus), 0);
    }

    fn assert_faces_match_normals(mesh: &MeshData, start: usize) {
        for tri in mesh.indices[start..].chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from_array(mesh.vertices[i as usize].position));
            let face = (b - a).cross(c - a);
            let normal = Vec3::from_array(mesh.vertices[tri[0] as usize].normal);
            assert!(face.dot(normal) > 0.0);
        }
    }
}
