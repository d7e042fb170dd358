//! # Primitive Shape Generation
//!
//! This module contains functions to generate the unit meshes used by the
//! scene. All shapes are generated with proper normals and texture coordinates.

use super::GeometryData;
use cgmath::{InnerSpace, Vector3};
use std::f32::consts::PI;

/// Generate a unit cube centered at the origin
/// 
/// Returns a cube with vertices from -0.5 to 0.5 on all axes.
/// Each face has proper normals pointing outward and UV coordinates from 0 to 1.
pub fn generate_cube() -> GeometryData {
    let mut data = GeometryData::new();
    
    // Cube vertices (8 corners)
    let positions = [
        // Front face
        [-0.5, -0.5,  0.5], [ 0.5, -0.5,  0.5], [ 0.5,  0.5,  0.5], [-0.5,  0.5,  0.5],
        // Back face  
        [-0.5, -0.5, -0.5], [-0.5,  0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5, -0.5, -0.5],
        // Left face
        [-0.5, -0.5, -0.5], [-0.5, -0.5,  0.5], [-0.5,  0.5,  0.5], [-0.5,  0.5, -0.5],
        // Right face
        [ 0.5, -0.5,  0.5], [ 0.5, -0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5,  0.5,  0.5],
        // Top face
        [-0.5,  0.5,  0.5], [ 0.5,  0.5,  0.5], [ 0.5,  0.5, -0.5], [-0.5,  0.5, -0.5],
        // Bottom face
        [-0.5, -0.5, -0.5], [ 0.5, -0.5, -0.5], [ 0.5, -0.5,  0.5], [-0.5, -0.5,  0.5],
    ];
    
    // Texture coordinates (same for each face)
    let tex_coords = [
        // Front, Back, Left, Right, Top, Bottom faces
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
        [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0],
        [1.0, 0.0], [0.0, 0.0], [0.0, 1.0], [1.0, 1.0],
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
        [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0],
        [0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0],
    ];
    
    // Face normals
    let normals = [
        // Front face (positive Z)
        [0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0],
        // Back face (negative Z)
        [0.0, 0.0, -1.0], [0.0, 0.0, -1.0], [0.0, 0.0, -1.0], [0.0, 0.0, -1.0],
        // Left face (negative X)
        [-1.0, 0.0, 0.0], [-1.0, 0.0, 0.0], [-1.0, 0.0, 0.0], [-1.0, 0.0, 0.0],
        // Right face (positive X)
        [1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 0.0],
        // Top face (positive Y in Z-up becomes positive Z in Y-up for rendering)
        [0.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.0, 1.0, 0.0],
        // Bottom face (negative Y in Z-up becomes negative Z in Y-up for rendering)
        [0.0, -1.0, 0.0], [0.0, -1.0, 0.0], [0.0, -1.0, 0.0], [0.0, -1.0, 0.0],
    ];
    
    data.vertices = positions.to_vec();
    data.tex_coords = tex_coords.to_vec();
    data.normals = normals.to_vec();
    
    // Indices for each face (2 triangles per face, counter-clockwise)
    data.indices = vec![
        // Front face
        0, 1, 2,    2, 3, 0,
        // Back face
        4, 5, 6,    6, 7, 4,
        // Left face
        8, 9, 10,   10, 11, 8,
        // Right face
        12, 13, 14, 14, 15, 12,
        // Top face
        16, 17, 18, 18, 19, 16,
        // Bottom face
        20, 21, 22, 22, 23, 20,
    ];
    
    data
}

/// Generate a UV sphere with specified resolution
/// 
/// # Arguments
/// * `longitude_segments` - Number of vertical segments (longitude lines)
/// * `latitude_segments` - Number of horizontal segments (latitude lines)
/// 
/// Returns a sphere of radius 1.0 centered at the origin.
pub fn generate_sphere(longitude_segments: u32, latitude_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();
    
    let long_segs = longitude_segments.max(3);
    let lat_segs = latitude_segments.max(2);
    
    // Generate vertices
    for lat in 0..=lat_segs {
        let theta = lat as f32 * PI / lat_segs as f32; // 0 to PI
        let sin_theta = theta.sin();
        let cos_theta = theta.cos();
        
        for long in 0..=long_segs {
            let phi = long as f32 * 2.0 * PI / long_segs as f32; // 0 to 2*PI
            let sin_phi = phi.sin();
            let cos_phi = phi.cos();
            
            // Spherical to Cartesian coordinates
            let x = sin_theta * cos_phi;
            let y = cos_theta;  // Y-up for rendering
            let z = sin_theta * sin_phi;
            
            data.vertices.push([x, y, z]);
            data.normals.push([x, y, z]); // Normal is same as position for unit sphere
            
            // UV coordinates
            let u = long as f32 / long_segs as f32;
            let v = lat as f32 / lat_segs as f32;
            data.tex_coords.push([u, v]);
        }
    }
    
    // Generate indices
    for lat in 0..lat_segs {
        for long in 0..long_segs {
            let first = lat * (long_segs + 1) + long;
            let second = first + long_segs + 1;
            
            // First triangle
            data.indices.push(first);
            data.indices.push(second);
            data.indices.push(first + 1);
            
            // Second triangle
            data.indices.push(second);
            data.indices.push(second + 1);
            data.indices.push(first + 1);
        }
    }
    
    data
}

/// Generate a unit quad in the XY plane facing +Z
///
/// Spans -0.5..0.5 on X and Y. The top edge maps to v = 0 so images render
/// upright.
pub fn generate_quad() -> GeometryData {
    let mut data = GeometryData::new();

    data.vertices = vec![[-0.5, -0.5, 0.0], [0.5, -0.5, 0.0], [0.5, 0.5, 0.0], [-0.5, 0.5, 0.0]];
    data.normals = vec![[0.0, 0.0, 1.0]; 4];
    data.tex_coords = vec![[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];
    data.indices = vec![0, 1, 2, 2, 3, 0];

    data
}

/// Generate an octahedron of radius 1 with flat-shaded faces
pub fn generate_octahedron() -> GeometryData {
    let corners = [
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(-1.0, 0.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(0.0, -1.0, 0.0),
        Vector3::new(0.0, 0.0, 1.0),
        Vector3::new(0.0, 0.0, -1.0),
    ];
    let faces = [
        [0, 2, 4], [0, 4, 3], [0, 3, 5], [0, 5, 2],
        [1, 2, 5], [1, 5, 3], [1, 3, 4], [1, 4, 2],
    ];

    let mut data = GeometryData::new();
    for [a, b, c] in faces {
        push_convex_face(&mut data, corners[a], corners[b], corners[c]);
    }
    data
}

/// Generate a tetrahedron inscribed in a sphere of radius 1
pub fn generate_tetrahedron() -> GeometryData {
    let corners = [
        Vector3::new(1.0, 1.0, 1.0).normalize(),
        Vector3::new(-1.0, -1.0, 1.0).normalize(),
        Vector3::new(-1.0, 1.0, -1.0).normalize(),
        Vector3::new(1.0, -1.0, -1.0).normalize(),
    ];
    let faces = [[2, 1, 0], [0, 3, 2], [1, 3, 0], [2, 3, 1]];

    let mut data = GeometryData::new();
    for [a, b, c] in faces {
        push_convex_face(&mut data, corners[a], corners[b], corners[c]);
    }
    data
}

/// Appends a flat triangle of a convex shape centered on the origin,
/// wound so its normal faces away from the center
fn push_convex_face(data: &mut GeometryData, a: Vector3<f32>, b: Vector3<f32>, c: Vector3<f32>) {
    let mut normal = (b - a).cross(c - a).normalize();
    let (b, c) = if normal.dot(a + b + c) < 0.0 {
        normal = -normal;
        (c, b)
    } else {
        (b, c)
    };

    let base = data.vertices.len() as u32;
    for (position, uv) in [(a, [0.0, 0.0]), (b, [1.0, 0.0]), (c, [0.5, 1.0])] {
        data.vertices.push(position.into());
        data.normals.push(normal.into());
        data.tex_coords.push(uv);
    }
    data.indices.extend([base, base + 1, base + 2]);
}

/// Control points of the candy cane's hooked spine
const CANDY_CANE_SPINE: [[f32; 3]; 4] = [
    [0.0, -0.5, 0.0],
    [0.0, 0.3, 0.0],
    [0.1, 0.5, 0.0],
    [0.3, 0.4, 0.0],
];

const CANDY_CANE_RADIUS: f32 = 0.08;

/// Uniform Catmull-Rom interpolation through `points` at `t` in 0..=1
fn catmull_rom(points: &[Vector3<f32>], t: f32) -> Vector3<f32> {
    let last = points.len() - 1;
    let scaled = t.clamp(0.0, 1.0) * last as f32;
    let segment = (scaled.floor() as usize).min(last - 1);
    let local = scaled - segment as f32;

    let p0 = points[segment.saturating_sub(1)];
    let p1 = points[segment];
    let p2 = points[segment + 1];
    let p3 = points[(segment + 2).min(last)];

    let t2 = local * local;
    let t3 = t2 * local;
    (p1 * 2.0
        + (p2 - p0) * local
        + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * t2
        + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * t3)
        * 0.5
}

/// Generate the candy cane: a tube swept along a hooked curve
///
/// # Arguments
/// * `tubular_segments` - Number of rings along the curve
/// * `radial_segments` - Number of vertices around each ring
pub fn generate_candy_cane(tubular_segments: u32, radial_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let tube_segs = tubular_segments.max(2);
    let radial_segs = radial_segments.max(3);
    let spine: Vec<Vector3<f32>> = CANDY_CANE_SPINE.iter().map(|p| Vector3::from(*p)).collect();

    // The spine lies in the XY plane, so +Z is perpendicular to every tangent
    let binormal = Vector3::unit_z();
    let step = 1.0 / tube_segs as f32;

    for i in 0..=tube_segs {
        let t = i as f32 * step;
        let center = catmull_rom(&spine, t);
        let ahead = catmull_rom(&spine, (t + step * 0.5).min(1.0));
        let behind = catmull_rom(&spine, (t - step * 0.5).max(0.0));
        let tangent = (ahead - behind).normalize();
        let normal = binormal.cross(tangent).normalize();

        for j in 0..=radial_segs {
            let angle = j as f32 * 2.0 * PI / radial_segs as f32;
            let direction = normal * angle.cos() + binormal * angle.sin();
            let position = center + direction * CANDY_CANE_RADIUS;

            data.vertices.push(position.into());
            data.normals.push(direction.into());
            data.tex_coords.push([t, j as f32 / radial_segs as f32]);
        }
    }

    for i in 0..tube_segs {
        for j in 0..radial_segs {
            let a = i * (radial_segs + 1) + j;
            let b = a + radial_segs + 1;

            data.indices.extend([a, b, a + 1]);
            data.indices.extend([b, b + 1, a + 1]);
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_generation() {
        let cube = generate_cube();
        assert_eq!(cube.vertices.len(), 24); // 6 faces * 4 vertices
        assert_eq!(cube.indices.len(), 36); // 6 faces * 2 triangles * 3 indices
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
    }

    #[test]
    fn test_sphere_generation() {
        let sphere = generate_sphere(8, 6);
        assert!(!sphere.vertices.is_empty());
        assert!(!sphere.indices.is_empty());
        assert_eq!(sphere.vertices.len(), sphere.normals.len());
        assert_eq!(sphere.vertices.len(), sphere.tex_coords.len());
    }

    #[test]
    fn test_platonic_faces_point_outward() {
        for (data, faces) in [(generate_octahedron(), 8), (generate_tetrahedron(), 4)] {
            assert_eq!(data.triangle_count(), faces);
            for tri in data.indices.chunks(3) {
                let a = Vector3::from(data.vertices[tri[0] as usize]);
                let b = Vector3::from(data.vertices[tri[1] as usize]);
                let c = Vector3::from(data.vertices[tri[2] as usize]);
                let wound = (b - a).cross(c - a);
                assert!(wound.dot(a + b + c) > 0.0);
            }
        }
    }

    #[test]
    fn test_candy_cane_follows_spine_endpoints() {
        let spine: Vec<Vector3<f32>> = CANDY_CANE_SPINE.iter().map(|p| Vector3::from(*p)).collect();
        assert!((catmull_rom(&spine, 0.0) - spine[0]).magnitude() < 1e-5);
        assert!((catmull_rom(&spine, 1.0) - spine[3]).magnitude() < 1e-5);

        let cane = generate_candy_cane(16, 8);
        assert_eq!(cane.vertex_count(), 17 * 9);
        assert_eq!(cane.triangle_count(), 16 * 8 * 2);
    }
}
