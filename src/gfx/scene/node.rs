//! # Scene Graph Nodes
//!
//! An arena of transform nodes. Every node is addressed by a [`NodeId`] and
//! stores its transform relative to its parent. Nodes are never removed, and a
//! parent is always created before its children, so node indices are already
//! in parent-first order.

use std::f32::EPSILON;

use cgmath::{InnerSpace, Matrix4, Rad, SquareMatrix, Vector3, Zero};

use crate::gfx::material::Material;
use crate::gfx::picking::Aabb;

/// Stable handle to a node in a [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Local transform: translation, XYZ Euler rotation (radians) and uniform scale
///
/// The rotation matrix is composed as `Rx * Ry * Rz`, so the Z rotation is
/// applied to the geometry first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::zero(),
            rotation: Vector3::zero(),
            scale: 1.0,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: Vector3<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn rotation_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_z(Rad(self.rotation.z))
    }

    /// Local matrix, composed as `T * R * S`
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * self.rotation_matrix()
            * Matrix4::from_scale(self.scale)
    }

    /// Rotates the node so its local +Z axis points at `target`
    ///
    /// `target` is expressed in the same space as `position` (the parent's).
    pub fn look_at(&mut self, target: Vector3<f32>) {
        let mut forward = target - self.position;
        if forward.magnitude2() < EPSILON {
            return;
        }
        forward = forward.normalize();

        let up = Vector3::unit_y();
        let mut right = up.cross(forward);
        if right.magnitude2() < EPSILON {
            // Looking straight up or down, nudge off the pole
            forward.z += 0.0001;
            forward = forward.normalize();
            right = up.cross(forward);
        }
        let right = right.normalize();
        let true_up = forward.cross(right);

        // Columns of the rotation matrix are right, true_up, forward
        let m13 = forward.x.clamp(-1.0, 1.0);
        let y = m13.asin();
        let (x, z) = if m13.abs() < 0.999_999_9 {
            ((-forward.y).atan2(forward.z), (-true_up.x).atan2(right.x))
        } else {
            (true_up.z.atan2(true_up.y), 0.0)
        };

        self.rotation = Vector3::new(x, y, z);
    }
}

/// Unit meshes shared by every node that draws them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKind {
    /// Cube spanning -0.5..0.5 on every axis
    Cube,
    /// Sphere of radius 1
    Sphere,
    /// Octahedron of radius 1
    Octahedron,
    /// Tetrahedron inscribed in a sphere of radius 1
    Tetrahedron,
    /// Hooked tube swept along a short curve
    CandyCane,
    /// Quad spanning -0.5..0.5 in the XY plane, facing +Z
    Quad,
}

impl MeshKind {
    pub const ALL: [MeshKind; 6] = [
        MeshKind::Cube,
        MeshKind::Sphere,
        MeshKind::Octahedron,
        MeshKind::Tetrahedron,
        MeshKind::CandyCane,
        MeshKind::Quad,
    ];

    /// Bounds of the unit mesh in its own space
    pub fn unit_bounds(self) -> Aabb {
        match self {
            MeshKind::Cube => Aabb::new(Vector3::new(-0.5, -0.5, -0.5), Vector3::new(0.5, 0.5, 0.5)),
            MeshKind::Sphere | MeshKind::Octahedron | MeshKind::Tetrahedron => {
                Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0))
            }
            MeshKind::CandyCane => {
                Aabb::new(Vector3::new(-0.1, -0.6, -0.1), Vector3::new(0.4, 0.6, 0.1))
            }
            // Quads get a sliver of depth so edge-on rays still resolve
            MeshKind::Quad => Aabb::new(Vector3::new(-0.5, -0.5, -0.005), Vector3::new(0.5, 0.5, 0.005)),
        }
    }
}

/// Something a node renders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawable {
    pub mesh: MeshKind,
    /// Non-uniform size applied to the unit mesh before the node transform
    pub extent: Vector3<f32>,
    pub material: Material,
}

impl Drawable {
    pub fn new(mesh: MeshKind, extent: Vector3<f32>, material: Material) -> Self {
        Self { mesh, extent, material }
    }

    pub fn uniform(mesh: MeshKind, size: f32, material: Material) -> Self {
        Self::new(mesh, Vector3::new(size, size, size), material)
    }

    pub fn extent_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_nonuniform_scale(self.extent.x, self.extent.y, self.extent.z)
    }

    /// Bounds in the owning node's local space
    pub fn local_bounds(&self) -> Aabb {
        self.mesh.unit_bounds().transform(&self.extent_matrix())
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub transform: Transform,
    pub drawable: Option<Drawable>,
    pub visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena of nodes rooted at a single scene root
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                transform: Transform::default(),
                drawable: None,
                visible: true,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a node under `parent`
    ///
    /// # Panics
    /// Panics if `parent` does not belong to this graph.
    pub fn add_node(
        &mut self,
        parent: NodeId,
        transform: Transform,
        drawable: Option<Drawable>,
    ) -> NodeId {
        assert!(parent.0 < self.nodes.len(), "parent node {parent:?} does not exist");

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            transform,
            drawable,
            visible: true,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn transform(&self, id: NodeId) -> Option<&Transform> {
        self.get(id).map(|node| &node.transform)
    }

    pub fn transform_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        self.get_mut(id).map(|node| &mut node.transform)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    /// The node itself followed by each of its ancestors up to the root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.get(id).map(|_| id), move |current| self.parent(*current))
    }

    /// The node and all of its descendants, parents before children
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.get(id).is_none() {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        out
    }

    /// World matrix of a single node
    pub fn world_matrix(&self, id: NodeId) -> Matrix4<f32> {
        let mut chain: Vec<NodeId> = self.ancestors(id).collect();
        chain.reverse();
        chain
            .into_iter()
            .fold(Matrix4::identity(), |acc, node| acc * self.nodes[node.0].transform.matrix())
    }

    /// World matrices of every node, indexed by [`NodeId::index`]
    pub fn world_matrices(&self) -> Vec<Matrix4<f32>> {
        let mut worlds: Vec<Matrix4<f32>> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let local = node.transform.matrix();
            let world = match node.parent {
                Some(parent) => worlds[parent.0] * local,
                None => local,
            };
            worlds.push(world);
        }
        worlds
    }

    /// Whether a node and every ancestor is visible
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.ancestors(id).all(|node| self.nodes[node.0].visible)
    }

    /// Every visible drawable with its world matrix, extent included
    pub fn visible_drawables(&self) -> Vec<(NodeId, Matrix4<f32>, Drawable)> {
        let worlds = self.world_matrices();
        let mut visible = vec![true; self.nodes.len()];
        let mut out = Vec::new();

        for (index, node) in self.nodes.iter().enumerate() {
            visible[index] = node.visible && node.parent.map_or(true, |parent| visible[parent.0]);
            if !visible[index] {
                continue;
            }
            if let Some(drawable) = node.drawable {
                out.push((NodeId(index), worlds[index] * drawable.extent_matrix(), drawable));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Vector4, Zero};
    use float_cmp::approx_eq;

    fn assert_vec_eq(a: Vector3<f32>, b: Vector3<f32>) {
        assert!(
            approx_eq!(f32, a.x, b.x, epsilon = 1e-4)
                && approx_eq!(f32, a.y, b.y, epsilon = 1e-4)
                && approx_eq!(f32, a.z, b.z, epsilon = 1e-4),
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn test_look_at_points_forward_axis() {
        let targets = [
            Vector3::new(0.0, 0.0, 10.0),
            Vector3::new(10.0, 0.0, 0.0),
            Vector3::new(-3.0, 4.0, -2.0),
            Vector3::new(0.5, -7.0, 1.0),
        ];

        for target in targets {
            let mut transform = Transform::from_position(Vector3::new(1.0, 1.0, 1.0));
            transform.look_at(target);

            let forward = transform.rotation_matrix() * Vector4::new(0.0, 0.0, 1.0, 0.0);
            let expected = (target - transform.position).normalize();
            assert_vec_eq(forward.truncate(), expected);
        }
    }

    #[test]
    fn test_look_at_same_point_keeps_rotation() {
        let mut transform = Transform::default().with_rotation(Vector3::new(0.3, 0.2, 0.1));
        transform.look_at(Vector3::zero());
        assert_eq!(transform.rotation, Vector3::new(0.3, 0.2, 0.1));
    }

    #[test]
    fn test_world_matrix_composes_parents() {
        let mut graph = SceneGraph::new();
        let group = graph.add_node(
            graph.root(),
            Transform::from_position(Vector3::new(0.0, 5.0, 0.0)).with_scale(2.0),
            None,
        );
        let child = graph.add_node(group, Transform::from_position(Vector3::new(1.0, 0.0, 0.0)), None);

        let world = graph.world_matrix(child) * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_vec_eq(world.truncate(), Vector3::new(2.0, 5.0, 0.0));

        let all = graph.world_matrices();
        assert_eq!(all[child.index()], graph.world_matrix(child));
    }

    #[test]
    fn test_ancestors_and_subtree() {
        let mut graph = SceneGraph::new();
        let group = graph.add_node(graph.root(), Transform::default(), None);
        let a = graph.add_node(group, Transform::default(), None);
        let b = graph.add_node(a, Transform::default(), None);
        let c = graph.add_node(group, Transform::default(), None);

        let chain: Vec<NodeId> = graph.ancestors(b).collect();
        assert_eq!(chain, vec![b, a, group, graph.root()]);
        assert_eq!(graph.subtree(group), vec![group, a, b, c]);
        assert!(graph.subtree(NodeId(99)).is_empty());
    }

    #[test]
    fn test_hidden_parent_hides_drawables() {
        let mut graph = SceneGraph::new();
        let group = graph.add_node(graph.root(), Transform::default(), None);
        graph.add_node(
            group,
            Transform::default(),
            Some(Drawable::uniform(MeshKind::Cube, 1.0, Material::Gold)),
        );
        assert_eq!(graph.visible_drawables().len(), 1);

        graph.get_mut(group).unwrap().visible = false;
        assert!(graph.visible_drawables().is_empty());
    }
}
