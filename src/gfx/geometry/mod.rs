//! # Procedural Geometry Generation
//!
//! This module generates the unit meshes the tree is built from, so no model
//! files need to ship with the application.
//!
//! ## Supported Primitives
//!
//! - **Cube**: Unit cube, used by box ornaments and photo frames
//! - **Sphere**: UV sphere with configurable resolution
//! - **Octahedron**: The star on top of the tree
//! - **Tetrahedron**: Dust motes
//! - **Candy cane**: A tube swept along a hooked Catmull-Rom curve
//! - **Quad**: Flat textured photo surface
//!
//! ## Usage
//!
//! ```no_run
//! use tinsel::gfx::geometry::{generate_mesh, generate_sphere};
//! use tinsel::gfx::scene::MeshKind;
//!
//! let star = generate_mesh(MeshKind::Octahedron);
//! let sphere = generate_sphere(32, 16);
//! ```

pub mod primitives;

pub use primitives::*;

use cgmath::Vector3;

use crate::gfx::{picking::Aabb, scene::MeshKind};

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Texture coordinates (u, v)
    pub tex_coords: Vec<[f32; 2]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            tex_coords: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Bounds of every vertex position
    pub fn bounds(&self) -> Aabb {
        let points: Vec<Vector3<f32>> = self.vertices.iter().map(|v| Vector3::from(*v)).collect();
        Aabb::from_points(&points)
    }

    /// Convert to the vertex format used by the renderer
    pub fn to_scene_format(&self) -> (Vec<crate::gfx::scene::vertex::Vertex3D>, Vec<u32>) {
        use crate::gfx::scene::vertex::Vertex3D;

        let vertices: Vec<Vertex3D> = (0..self.vertices.len())
            .map(|i| Vertex3D {
                position: self.vertices[i],
                normal: self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                tex_coords: self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
            })
            .collect();

        (vertices, self.indices.clone())
    }
}

impl Default for GeometryData {
    fn default() -> Self {
        Self::new()
    }
}

/// Unit geometry for a mesh kind, matching [`MeshKind::unit_bounds`]
pub fn generate_mesh(kind: MeshKind) -> GeometryData {
    match kind {
        MeshKind::Cube => generate_cube(),
        MeshKind::Sphere => generate_sphere(32, 16),
        MeshKind::Octahedron => generate_octahedron(),
        MeshKind::Tetrahedron => generate_tetrahedron(),
        MeshKind::CandyCane => generate_candy_cane(16, 8),
        MeshKind::Quad => generate_quad(),
    }
}
