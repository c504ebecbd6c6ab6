//! Vertex mesh buffer
//!
//! Triangle-list vertices emitted by the tessellator. The buffer is append
//! only: vertices are never removed individually, only bulk-cleared between
//! frames, and the backing storage grows by doubling and is never shrunk.

use crate::config::{INITIAL_BUFFER_CAPACITY, TEXTURE_SIZE, VERTEX_Z};

/// A textured, coloured line vertex (matches the line shader input)
///
/// Memory layout:
/// - position: `vec3<f32>` (12 bytes)
/// - color: `vec4<f32>`    (16 bytes)
/// - uv: `vec2<f32>`       (8 bytes)
/// Total: 36 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

impl Vertex {
    /// Build a vertex from falloff texel coordinates
    ///
    /// `u` and `v` are in texels (`0..=TEXTURE_SIZE`); they are normalized
    /// and `v` is flipped so texel row 0 maps to the top of the texture.
    pub fn textured(x: f32, y: f32, u: f32, v: f32, color: [f32; 4]) -> Self {
        let size = TEXTURE_SIZE as f32;
        Self {
            position: [x, y, VERTEX_Z],
            color,
            uv: [u / size, 1.0 - v / size],
        }
    }

    pub fn x(&self) -> f32 {
        self.position[0]
    }

    pub fn y(&self) -> f32 {
        self.position[1]
    }
}

/// Growable vertex storage for one frame of geometry
#[derive(Clone, Debug)]
pub struct MeshBuffer {
    vertices: Vec<Vertex>,
}

impl MeshBuffer {
    pub fn new() -> Self {
        Self {
            vertices: Vec::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Append one vertex, doubling the storage when full
    pub fn push(&mut self, vertex: Vertex) {
        if self.vertices.len() == self.vertices.capacity() {
            let grow = self.vertices.capacity().max(INITIAL_BUFFER_CAPACITY);
            self.vertices.reserve_exact(grow);
        }
        self.vertices.push(vertex);
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Current storage capacity in vertices
    pub fn capacity(&self) -> usize {
        self.vertices.capacity()
    }

    /// Drop all vertices, keeping the storage
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    pub fn as_slice(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Raw bytes for a GPU upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

impl Default for MeshBuffer {
    fn default() -> Self {
        Self::new()
    }
}
