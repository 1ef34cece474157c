//! Flat triangle mesh handed to the renderer.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use glam::Vec3;

use crate::Triangle;

/// Axis-aligned bounds of a mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Positions, parallel normals and a flat index list.
///
/// Vertices are never shared, so index `i` always refers to vertex `i`
/// and the three buffers have equal length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffer {
    /// Chunk-local vertex positions.
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// Triangle list, three indices per triangle.
    pub indices: Vec<u32>,
}

impl MeshBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_triangle_capacity(triangles: usize) -> Self {
        Self {
            positions: Vec::with_capacity(triangles * 3),
            normals: Vec::with_capacity(triangles * 3),
            indices: Vec::with_capacity(triangles * 3),
        }
    }

    pub fn from_triangles(triangles: &[Triangle]) -> Self {
        let mut mesh = Self::with_triangle_capacity(triangles.len());
        for tri in triangles {
            mesh.push_triangle(tri);
        }
        mesh
    }

    pub fn push_triangle(&mut self, tri: &Triangle) {
        for (p, n) in tri.positions.iter().zip(&tri.normals) {
            self.indices.push(self.positions.len() as u32);
            self.positions.push(p.to_array());
            self.normals.push(n.to_array());
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Whether the buffer lengths agree with a flat non-indexed triangle list.
    pub fn is_consistent(&self) -> bool {
        self.indices.len() % 3 == 0
            && self.positions.len() == self.indices.len()
            && self.normals.len() == self.indices.len()
            && self
                .indices
                .iter()
                .enumerate()
                .all(|(i, &index)| index as usize == i)
    }

    /// Recompute bounds over all positions. `None` for an empty mesh.
    pub fn bounds(&self) -> Option<Aabb> {
        let mut iter = self.positions.iter().map(|p| Vec3::from_array(*p));
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Aabb { min, max })
    }

    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Bit-exact digest of all three buffers.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.position_bytes().hash(&mut hasher);
        self.normal_bytes().hash(&mut hasher);
        self.indices.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(offset: f32) -> Triangle {
        Triangle {
            positions: [
                Vec3::new(offset, 0.0, 0.0),
                Vec3::new(offset + 1.0, 2.0, 0.0),
                Vec3::new(offset, 0.0, -3.0),
            ],
            normals: [Vec3::Y; 3],
        }
    }

    #[test]
    fn test_from_triangles_is_flat() {
        let mesh = MeshBuffer::from_triangles(&[tri(0.0), tri(5.0)]);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert!(mesh.is_consistent());
        assert_eq!(mesh.normals[4], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_bounds() {
        assert_eq!(MeshBuffer::new().bounds(), None);
        let mesh = MeshBuffer::from_triangles(&[tri(0.0), tri(5.0)]);
        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(0.0, 0.0, -3.0));
        assert_eq!(bounds.max, Vec3::new(6.0, 2.0, 0.0));
        assert_eq!(bounds.size(), Vec3::new(6.0, 2.0, 3.0));
    }

    #[test]
    fn test_byte_views() {
        let mesh = MeshBuffer::from_triangles(&[tri(1.0)]);
        assert_eq!(mesh.position_bytes().len(), 3 * 12);
        assert_eq!(mesh.normal_bytes().len(), 3 * 12);
        assert_eq!(mesh.index_bytes().len(), 3 * 4);
    }

    #[test]
    fn test_content_hash_tracks_content() {
        let a = MeshBuffer::from_triangles(&[tri(0.0)]);
        let b = MeshBuffer::from_triangles(&[tri(0.0)]);
        let c = MeshBuffer::from_triangles(&[tri(0.5)]);
        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn test_inconsistent_buffers_detected() {
        let mut mesh = MeshBuffer::from_triangles(&[tri(0.0)]);
        mesh.indices.push(3);
        assert!(!mesh.is_consistent());
    }
}
