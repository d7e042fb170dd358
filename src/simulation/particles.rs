//! The particle population
//!
//! [`ParticleSystem`] owns every [`Entity`] and creates the scene nodes they
//! drive. Ornaments, dust and the star are created once by
//! [`ParticleSystem::populate`]; photos arrive later through
//! [`ParticleSystem::add_photo`].

use std::collections::HashMap;

use cgmath::Vector3;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::config::{ParticleConfig, SceneConfig};
use crate::gfx::material::{Material, TextureId};
use crate::gfx::scene::{Drawable, MeshKind, NodeId, Scene, SceneGraph, Transform};

use super::entity::{Entity, EntityId, EntityKind};
use super::layout::LayoutGenerator;

/// Edge length of box ornaments
const BOX_SIZE: f32 = 0.55;
/// Radius of sphere ornaments
const SPHERE_RADIUS: f32 = 0.5;
/// Radius of a dust mote
const DUST_RADIUS: f32 = 0.08;
/// Radius of the star and its gap above the tree tip
const STAR_RADIUS: f32 = 1.2;

/// Width of a photo; the height follows the image aspect
pub const PHOTO_WIDTH: f32 = 1.2;
/// Frame border added around a photo, in total per axis
pub const FRAME_MARGIN: f32 = 0.2;
const FRAME_DEPTH: f32 = 0.05;
/// Offset of the photo quad in front of its frame
const PHOTO_OFFSET: f32 = 0.04;
/// Base scale of a photo composite
const PHOTO_SCALE: f32 = 0.8;

/// Picks an ornament type from a uniform roll in 0..1
pub fn ornament_kind(roll: f32) -> EntityKind {
    if roll < 0.4 {
        EntityKind::OrnamentBox
    } else if roll < 0.7 {
        EntityKind::GoldBox
    } else if roll < 0.92 {
        EntityKind::GoldSphere
    } else if roll < 0.97 {
        EntityKind::Red
    } else {
        EntityKind::CandyCane
    }
}

/// The single drawable of a non-photo entity; photos are composites
fn entity_drawable(kind: EntityKind) -> Option<Drawable> {
    let drawable = match kind {
        EntityKind::OrnamentBox => Drawable::uniform(MeshKind::Cube, BOX_SIZE, Material::Green),
        EntityKind::GoldBox => Drawable::uniform(MeshKind::Cube, BOX_SIZE, Material::Gold),
        EntityKind::GoldSphere => Drawable::uniform(MeshKind::Sphere, SPHERE_RADIUS, Material::Gold),
        EntityKind::Red => Drawable::uniform(MeshKind::Sphere, SPHERE_RADIUS, Material::Red),
        EntityKind::CandyCane => Drawable::uniform(MeshKind::CandyCane, 1.0, Material::CandyStripe),
        EntityKind::Dust => Drawable::uniform(MeshKind::Tetrahedron, DUST_RADIUS, Material::Dust),
        EntityKind::Photo => return None,
    };
    Some(drawable)
}

/// Photo width and height for an image of the given pixel size
pub fn photo_size(image_size: (u32, u32)) -> (f32, f32) {
    let (width, height) = image_size;
    if width == 0 || height == 0 {
        return (PHOTO_WIDTH, PHOTO_WIDTH);
    }
    (PHOTO_WIDTH, PHOTO_WIDTH * height as f32 / width as f32)
}

pub struct ParticleSystem {
    entities: Vec<Entity>,
    node_index: HashMap<NodeId, EntityId>,
    layout: LayoutGenerator,
    rng: StdRng,
    star: Option<NodeId>,
}

impl ParticleSystem {
    pub fn new(config: &SceneConfig) -> Self {
        let rng = match config.particles.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            entities: Vec::new(),
            node_index: HashMap::new(),
            layout: LayoutGenerator::new(&config.particles, &config.layout),
            rng,
            star: None,
        }
    }

    /// Creates the ornaments, the star and the dust
    pub fn populate(&mut self, scene: &mut Scene, config: &ParticleConfig) {
        let parent = scene.main_group;

        for _ in 0..config.ornament_count {
            let kind = ornament_kind(self.rng.random());
            let scale = self.rng.random_range(0.4..0.9);
            let rotation = Vector3::new(
                self.rng.random_range(0.0..6.0),
                self.rng.random_range(0.0..6.0),
                self.rng.random_range(0.0..6.0),
            );
            self.spawn(scene, parent, kind, scale, rotation);
        }

        let star_height = self.layout.tree_height() / 2.0 + STAR_RADIUS;
        self.star = Some(scene.graph.add_node(
            parent,
            Transform::from_position(Vector3::new(0.0, star_height, 0.0)),
            Some(Drawable::uniform(MeshKind::Octahedron, STAR_RADIUS, Material::Star)),
        ));

        for _ in 0..config.dust_count {
            let scale = self.rng.random_range(0.5..1.5);
            self.spawn(scene, parent, EntityKind::Dust, scale, Vector3::new(0.0, 0.0, 0.0));
        }

        log::info!(
            "Populated tree with {} ornaments and {} dust motes ({} nodes)",
            config.ornament_count,
            config.dust_count,
            scene.graph.len()
        );
    }

    /// Adds a framed photo showing `texture`
    ///
    /// `image_size` is the pixel size of the texture and sets the photo's
    /// aspect ratio.
    pub fn add_photo(&mut self, scene: &mut Scene, texture: TextureId, image_size: (u32, u32)) -> EntityId {
        let (width, height) = photo_size(image_size);
        let frame_width = width + FRAME_MARGIN;
        let frame_height = height + FRAME_MARGIN;

        let parent = scene.photo_group;
        let id = self.spawn(scene, parent, EntityKind::Photo, PHOTO_SCALE, Vector3::new(0.0, 0.0, 0.0));
        let entity = &mut self.entities[id.index()];
        *entity = entity.clone().with_frame_size(frame_width, frame_height);
        let root = entity.node();

        scene.graph.add_node(
            root,
            Transform::default(),
            Some(Drawable::new(
                MeshKind::Cube,
                Vector3::new(frame_width, frame_height, FRAME_DEPTH),
                Material::Gold,
            )),
        );
        scene.graph.add_node(
            root,
            Transform::from_position(Vector3::new(0.0, 0.0, PHOTO_OFFSET)),
            Some(Drawable::new(MeshKind::Quad, Vector3::new(width, height, 1.0), Material::Photo(texture))),
        );

        log::debug!("Added photo {id:?} ({width:.2} x {height:.2})");
        id
    }

    fn spawn(
        &mut self,
        scene: &mut Scene,
        parent: NodeId,
        kind: EntityKind,
        base_scale: f32,
        rotation: Vector3<f32>,
    ) -> EntityId {
        // Each entity samples from its own generator
        let mut rng = StdRng::from_rng(&mut self.rng);
        let targets = self.layout.sample(&mut rng, kind.is_dust());
        let multiplier = kind.spin_multiplier();
        let spin = Vector3::new(
            (rng.random::<f32>() - 0.5) * multiplier,
            (rng.random::<f32>() - 0.5) * multiplier,
            (rng.random::<f32>() - 0.5) * multiplier,
        );

        let transform = Transform::default().with_scale(base_scale).with_rotation(rotation);
        let node = scene.graph.add_node(parent, transform, entity_drawable(kind));

        let id = EntityId::new(self.entities.len());
        self.entities.push(Entity::new(id, node, kind, targets, base_scale, spin));
        self.node_index.insert(node, id);
        id
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn star(&self) -> Option<NodeId> {
        self.star
    }

    /// Whether `id` refers to a live photo entity
    pub fn is_photo(&self, id: EntityId) -> bool {
        self.get(id).is_some_and(Entity::is_photo)
    }

    pub fn photos(&self) -> Vec<EntityId> {
        self.entities.iter().filter(|e| e.is_photo()).map(Entity::id).collect()
    }

    pub fn photo_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_photo()).count()
    }

    /// Root nodes of every photo composite
    pub fn photo_nodes(&self) -> Vec<NodeId> {
        self.entities.iter().filter(|e| e.is_photo()).map(Entity::node).collect()
    }

    /// The entity owning `node`: the nearest ancestor (or the node itself)
    /// that an entity drives
    pub fn owning_entity(&self, graph: &SceneGraph, node: NodeId) -> Option<EntityId> {
        graph.ancestors(node).find_map(|n| self.node_index.get(&n).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use cgmath::InnerSpace;

    fn setup(ornaments: usize, dust: usize) -> (Scene, ParticleSystem) {
        let config = SceneConfig::default()
            .with_seed(42)
            .with_ornament_count(ornaments)
            .with_dust_count(dust);
        let mut scene = Scene::from_camera_config(&CameraConfig::default(), 1.0);
        let mut particles = ParticleSystem::new(&config);
        particles.populate(&mut scene, &config.particles);
        (scene, particles)
    }

    #[test]
    fn test_ornament_thresholds() {
        assert_eq!(ornament_kind(0.0), EntityKind::OrnamentBox);
        assert_eq!(ornament_kind(0.4), EntityKind::GoldBox);
        assert_eq!(ornament_kind(0.75), EntityKind::GoldSphere);
        assert_eq!(ornament_kind(0.95), EntityKind::Red);
        assert_eq!(ornament_kind(0.99), EntityKind::CandyCane);
    }

    #[test]
    fn test_populate_counts_and_scales() {
        let (scene, particles) = setup(300, 200);
        assert_eq!(particles.len(), 500);
        assert_eq!(particles.photo_count(), 0);

        let dust: Vec<&Entity> = particles.entities().iter().filter(|e| e.is_dust()).collect();
        assert_eq!(dust.len(), 200);
        assert!(dust.iter().all(|e| (0.5..1.5).contains(&e.base_scale())));

        for entity in particles.entities().iter().filter(|e| !e.is_dust()) {
            assert!((0.4..0.9).contains(&entity.base_scale()));
            let spin = entity.spin_velocity();
            assert!(spin.x.abs() <= 1.0 && spin.y.abs() <= 1.0 && spin.z.abs() <= 1.0);

            // Entities start at the origin
            let transform = scene.graph.transform(entity.node()).unwrap();
            assert_eq!(transform.position, Vector3::new(0.0, 0.0, 0.0));
            assert_eq!(transform.scale, entity.base_scale());
        }

        let star = scene.graph.transform(particles.star().unwrap()).unwrap();
        assert!((star.position - Vector3::new(0.0, 13.2, 0.0)).magnitude() < 1e-5);
    }

    #[test]
    fn test_entities_get_distinct_targets() {
        let (_, particles) = setup(50, 0);
        let first = particles.entities()[0].target_tree();
        assert!(particles.entities()[1..].iter().all(|e| e.target_tree() != first));
    }

    #[test]
    fn test_photo_composite() {
        let (mut scene, mut particles) = setup(10, 10);
        let photo = particles.add_photo(&mut scene, TextureId(0), (400, 600));

        let entity = particles.get(photo).unwrap();
        assert!(entity.is_photo());
        assert_eq!(entity.base_scale(), 0.8);
        assert!(entity.spin_velocity().x.abs() <= 0.15);
        let (frame_w, frame_h) = entity.frame_size().unwrap();
        assert!((frame_w - 1.4).abs() < 1e-6);
        assert!((frame_h - 2.0).abs() < 1e-6);

        let root = entity.node();
        assert_eq!(scene.graph.parent(root), Some(scene.photo_group));
        let children = scene.graph.get(root).unwrap().children().to_vec();
        assert_eq!(children.len(), 2);

        for child in children {
            assert_eq!(particles.owning_entity(&scene.graph, child), Some(photo));
        }
        assert_eq!(particles.photos(), vec![photo]);
        assert_eq!(particles.photo_nodes(), vec![root]);
        assert!(particles.is_photo(photo));
        assert!(!particles.is_photo(EntityId::new(0)));
        assert!(!particles.is_photo(EntityId::new(999)));
    }

    #[test]
    fn test_photo_size_handles_degenerate_images() {
        assert_eq!(photo_size((0, 10)), (1.2, 1.2));
        let (w, h) = photo_size((200, 100));
        assert_eq!(w, 1.2);
        assert!((h - 0.6).abs() < 1e-6);
    }
}
