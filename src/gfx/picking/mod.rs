//! # Object Picking System
//!
//! Ray-casting against scene graph nodes, used to select photos with the
//! mouse or a tap.
//!
//! ## How it works
//!
//! 1. **Screen to Ray**: Convert a pointer position inside the render surface
//!    rectangle to a world-space ray through the camera
//! 2. **Ray-Node Intersection**: Move the ray into each candidate drawable's
//!    local space and test it against the drawable's own bounds, so rotated
//!    meshes are hit exactly rather than through their enclosing world box
//! 3. **Selection**: Return the closest intersected node; callers walk up its
//!    ancestors to find the object that owns it
//!
//! ## Usage
//!
//! ```no_run
//! use tinsel::config::CameraConfig;
//! use tinsel::gfx::picking::{ObjectPicker, ScreenRect};
//! use tinsel::gfx::scene::Scene;
//!
//! let scene = Scene::from_camera_config(&CameraConfig::default(), 1.0);
//! let rect = ScreenRect::from_size(800.0, 800.0);
//! let ray = ObjectPicker::screen_to_ray((400.0, 400.0), &rect, &scene.camera);
//! let hit = ObjectPicker::pick_subtrees(&ray, &scene.graph, &[scene.photo_group]);
//! ```

use cgmath::{ElementWise, InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4, Zero};

use crate::gfx::{
    camera::perspective_camera::PerspectiveCamera,
    scene::{NodeId, SceneGraph},
};

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin point in world space
    pub origin: Vector3<f32>,
    /// Ray direction, normalized unless produced by [`Ray::to_local`]
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vector3<f32> {
        self.origin + self.direction * t
    }

    /// The same ray in the space that `world` maps from
    ///
    /// The direction is left unnormalized, so a distance along the local ray
    /// equals the distance along `self`. `None` for a singular matrix.
    pub fn to_local(&self, world: &Matrix4<f32>) -> Option<Ray> {
        let inverse = world.invert()?;
        let origin = inverse * self.origin.extend(1.0);
        let direction = inverse * self.direction.extend(0.0);
        Some(Ray {
            origin: origin.truncate() / origin.w,
            direction: direction.truncate(),
        })
    }
}

/// Axis-aligned bounding box for intersection testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    /// Create an AABB enclosing a set of points
    pub fn from_points(points: &[Vector3<f32>]) -> Self {
        let Some((first, rest)) = points.split_first() else {
            return Self::new(Vector3::zero(), Vector3::zero());
        };

        rest.iter().fold(Self::new(*first, *first), |acc, p| Self {
            min: Vector3::new(acc.min.x.min(p.x), acc.min.y.min(p.y), acc.min.z.min(p.z)),
            max: Vector3::new(acc.max.x.max(p.x), acc.max.y.max(p.y), acc.max.z.max(p.z)),
        })
    }

    /// Slab test. Returns the distance along the ray to the first intersection
    /// in front of the origin, or the exit distance if the origin is inside.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = Vector3::new(
            1.0 / ray.direction.x,
            1.0 / ray.direction.y,
            1.0 / ray.direction.z,
        );

        let t_min = (self.min - ray.origin).mul_element_wise(inv_dir);
        let t_max = (self.max - ray.origin).mul_element_wise(inv_dir);

        let t1 = Vector3::new(
            t_min.x.min(t_max.x),
            t_min.y.min(t_max.y),
            t_min.z.min(t_max.z),
        );
        let t2 = Vector3::new(
            t_min.x.max(t_max.x),
            t_min.y.max(t_max.y),
            t_min.z.max(t_max.z),
        );

        let t_near = t1.x.max(t1.y.max(t1.z));
        let t_far = t2.x.min(t2.y.min(t2.z));

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }

    /// Bounds of all 8 corners after applying `matrix`
    pub fn transform(&self, matrix: &Matrix4<f32>) -> Self {
        let corners = [
            Vector3::new(self.min.x, self.min.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.min.z),
            Vector3::new(self.min.x, self.max.y, self.min.z),
            Vector3::new(self.min.x, self.min.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.min.z),
            Vector3::new(self.max.x, self.min.y, self.max.z),
            Vector3::new(self.min.x, self.max.y, self.max.z),
            Vector3::new(self.max.x, self.max.y, self.max.z),
        ];

        let transformed: Vec<Vector3<f32>> = corners
            .iter()
            .map(|corner| {
                let p = matrix * corner.extend(1.0);
                p.truncate() / p.w
            })
            .collect();

        Self::from_points(&transformed)
    }
}

/// Bounding rectangle of the render surface in window coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    /// Rectangle anchored at the window origin
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Normalized device coordinates (-1..1, Y up) of a window position
    pub fn to_ndc(&self, position: (f32, f32)) -> (f32, f32) {
        let (x, y) = position;
        let ndc_x = ((x - self.left) / self.width) * 2.0 - 1.0;
        let ndc_y = -((y - self.top) / self.height) * 2.0 + 1.0;
        (ndc_x, ndc_y)
    }
}

/// Result of a picking operation
#[derive(Debug, Clone, Copy)]
pub struct PickResult {
    /// Node whose drawable was hit
    pub node: NodeId,
    /// Distance from the ray origin to the intersection point
    pub distance: f32,
    /// World space intersection point
    pub intersection_point: Vector3<f32>,
}

/// Ray-casting helpers for pointer selection
pub struct ObjectPicker;

impl ObjectPicker {
    /// Convert a window position to a world-space ray through the camera
    pub fn screen_to_ray(position: (f32, f32), rect: &ScreenRect, camera: &PerspectiveCamera) -> Ray {
        let (ndc_x, ndc_y) = rect.to_ndc(position);

        let view_proj = camera.projection_matrix() * camera.view_matrix();
        let inv_view_proj = view_proj.invert().unwrap_or(Matrix4::from_scale(1.0));

        // OpenGL convention: near plane at z = -1, far plane at z = 1
        let world_near = inv_view_proj * Vector4::new(ndc_x, ndc_y, -1.0, 1.0);
        let world_far = inv_view_proj * Vector4::new(ndc_x, ndc_y, 1.0, 1.0);

        let near = world_near.truncate() / world_near.w;
        let far = world_far.truncate() / world_far.w;

        Ray::new(near, far - near)
    }

    /// Nearest hit among the visible drawables in the subtrees under `roots`
    pub fn pick_subtrees(ray: &Ray, graph: &SceneGraph, roots: &[NodeId]) -> Option<PickResult> {
        let worlds = graph.world_matrices();
        let mut closest: Option<PickResult> = None;

        for node_id in roots.iter().flat_map(|root| graph.subtree(*root)) {
            let Some(drawable) = graph.get(node_id).and_then(|node| node.drawable) else {
                continue;
            };
            if !graph.is_visible(node_id) {
                continue;
            }

            let Some(local_ray) = ray.to_local(&worlds[node_id.index()]) else {
                continue;
            };
            if let Some(distance) = drawable.local_bounds().intersect_ray(&local_ray) {
                if closest.map_or(true, |hit| distance < hit.distance) {
                    closest = Some(PickResult {
                        node: node_id,
                        distance,
                        intersection_point: ray.point_at(distance),
                    });
                }
            }
        }

        closest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::gfx::material::Material;
    use crate::gfx::scene::{Drawable, MeshKind, Transform};
    use float_cmp::approx_eq;

    #[test]
    fn test_aabb_creation() {
        let points = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(-1.0, -1.0, -1.0),
        ];
        let aabb = Aabb::from_points(&points);

        assert_eq!(aabb.min, Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.max, Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_ray_aabb_intersection() {
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));

        let ray = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        let distance = aabb.intersect_ray(&ray).unwrap();
        assert!(approx_eq!(f32, distance, 4.0, epsilon = 1e-5));

        let ray_miss = Ray::new(Vector3::new(5.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray_miss).is_none());

        let ray_behind = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&ray_behind).is_none());
    }

    #[test]
    fn test_transform_translates_and_scales() {
        let aabb = Aabb::new(Vector3::new(-0.5, -0.5, -0.5), Vector3::new(0.5, 0.5, 0.5));
        let matrix = Matrix4::from_translation(Vector3::new(10.0, 0.0, 0.0)) * Matrix4::from_scale(2.0);
        let moved = aabb.transform(&matrix);
        assert_eq!(moved.min, Vector3::new(9.0, -1.0, -1.0));
        assert_eq!(moved.max, Vector3::new(11.0, 1.0, 1.0));
    }

    #[test]
    fn test_screen_center_ray_follows_camera_forward() {
        let camera = PerspectiveCamera::from_config(&CameraConfig::default(), 1.0);
        let rect = ScreenRect::new(100.0, 50.0, 800.0, 800.0);
        let ray = ObjectPicker::screen_to_ray((500.0, 450.0), &rect, &camera);

        let forward = camera.forward();
        assert!(approx_eq!(f32, ray.direction.dot(forward), 1.0, epsilon = 1e-4));
    }

    #[test]
    fn test_pick_returns_nearest_node() {
        let mut graph = SceneGraph::new();
        let group = graph.add_node(graph.root(), Transform::default(), None);
        let cube = Drawable::uniform(MeshKind::Cube, 1.0, Material::Gold);
        let far = graph.add_node(group, Transform::from_position(Vector3::new(0.0, 0.0, -5.0)), Some(cube));
        let near = graph.add_node(group, Transform::from_position(Vector3::new(0.0, 0.0, 5.0)), Some(cube));
        let outside = graph.add_node(graph.root(), Transform::from_position(Vector3::new(0.0, 0.0, 20.0)), Some(cube));

        let ray = Ray::new(Vector3::new(0.0, 0.0, 50.0), Vector3::new(0.0, 0.0, -1.0));
        let hit = ObjectPicker::pick_subtrees(&ray, &graph, &[group]).unwrap();
        assert_eq!(hit.node, near);
        assert_ne!(hit.node, far);
        assert_ne!(hit.node, outside);
        assert!(approx_eq!(f32, hit.distance, 44.5, epsilon = 1e-4));

        graph.get_mut(near).unwrap().visible = false;
        let hit = ObjectPicker::pick_subtrees(&ray, &graph, &[group]).unwrap();
        assert_eq!(hit.node, far);
    }

    #[test]
    fn test_rotated_quad_is_hit_on_its_surface_only() {
        let mut graph = SceneGraph::new();
        let group = graph.add_node(graph.root(), Transform::default(), None);
        let card = Drawable::uniform(MeshKind::Cube, 1.0, Material::Gold);
        let transform = Transform::from_position(Vector3::new(0.0, 2.0, 30.0))
            .with_scale(2.0)
            .with_rotation(Vector3::new(0.0, 0.0, std::f32::consts::FRAC_PI_4));
        let node = graph.add_node(group, transform, Some(card));

        // Inside the world box of the diamond but outside the diamond itself
        let corner = Ray::new(Vector3::new(1.2, 3.2, 50.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(ObjectPicker::pick_subtrees(&corner, &graph, &[group]).is_none());

        let centre = Ray::new(Vector3::new(0.0, 2.0, 50.0), Vector3::new(0.0, 0.0, -1.0));
        let hit = ObjectPicker::pick_subtrees(&centre, &graph, &[group]).unwrap();
        assert_eq!(hit.node, node);
        assert!(approx_eq!(f32, hit.distance, 19.0, epsilon = 1e-4));
        assert!(approx_eq!(f32, hit.intersection_point.z, 31.0, epsilon = 1e-4));

        // Still inside the diamond, near its top vertex
        let tip = Ray::new(Vector3::new(0.0, 3.2, 50.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(ObjectPicker::pick_subtrees(&tip, &graph, &[group]).is_some());
    }

    #[test]
    fn test_local_ray_keeps_world_distances() {
        let world = Matrix4::from_translation(Vector3::new(0.0, 0.0, 10.0)) * Matrix4::from_scale(4.0);
        let ray = Ray::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0));
        let local = ray.to_local(&world).unwrap();
        assert!(approx_eq!(f32, local.origin.z, -2.5, epsilon = 1e-6));
        assert!(approx_eq!(f32, local.direction.z, 0.25, epsilon = 1e-6));

        let unit = Aabb::new(Vector3::new(-0.5, -0.5, -0.5), Vector3::new(0.5, 0.5, 0.5));
        let distance = unit.intersect_ray(&local).unwrap();
        assert!(approx_eq!(f32, distance, 8.0, epsilon = 1e-5));

        assert!(ray.to_local(&Matrix4::from_scale(0.0)).is_none());
    }
}
