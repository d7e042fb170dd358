use std::sync::Arc;

use image::RgbaImage;

use crate::config::CameraConfig;
use crate::gfx::{
    camera::perspective_camera::PerspectiveCamera,
    material::TextureId,
};

use super::node::{NodeId, SceneGraph, Transform};

/// Decoded photo pixels waiting for (or already given) a GPU texture
#[derive(Debug, Clone)]
pub struct PhotoTexture {
    pub label: String,
    pub image: Arc<RgbaImage>,
}

/// Main scene containing the node graph, camera and photo textures
///
/// Everything that animates hangs under `main_group`, whose rotation spins the
/// whole tree. Photo entities live one level deeper under `photo_group`.
pub struct Scene {
    pub camera: PerspectiveCamera,
    pub graph: SceneGraph,
    pub main_group: NodeId,
    pub photo_group: NodeId,
    textures: Vec<PhotoTexture>,
}

impl Scene {
    /// Creates an empty scene with the standard group hierarchy
    pub fn new(camera: PerspectiveCamera) -> Self {
        let mut graph = SceneGraph::new();
        let main_group = graph.add_node(graph.root(), Transform::default(), None);
        let photo_group = graph.add_node(main_group, Transform::default(), None);

        Self {
            camera,
            graph,
            main_group,
            photo_group,
            textures: Vec::new(),
        }
    }

    pub fn from_camera_config(config: &CameraConfig, aspect: f32) -> Self {
        Self::new(PerspectiveCamera::from_config(config, aspect))
    }

    /// Updates the scene (camera matrices, etc.)
    pub fn update(&mut self) {
        self.camera.update_view_proj();
    }

    /// Registers decoded photo pixels and returns the id drawables refer to
    pub fn add_texture(&mut self, label: impl Into<String>, image: Arc<RgbaImage>) -> TextureId {
        let id = TextureId(self.textures.len());
        self.textures.push(PhotoTexture {
            label: label.into(),
            image,
        });
        id
    }

    pub fn textures(&self) -> &[PhotoTexture] {
        &self.textures
    }

    /// Gets statistics about the scene
    pub fn get_statistics(&self) -> SceneStatistics {
        SceneStatistics {
            node_count: self.graph.len(),
            drawable_count: self.graph.visible_drawables().len(),
            texture_count: self.textures.len(),
        }
    }
}

/// Scene statistics for debugging and UI display
#[derive(Debug)]
pub struct SceneStatistics {
    pub node_count: usize,
    pub drawable_count: usize,
    pub texture_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_hierarchy() {
        let scene = Scene::from_camera_config(&CameraConfig::default(), 1.5);
        assert_eq!(scene.graph.parent(scene.main_group), Some(scene.graph.root()));
        assert_eq!(scene.graph.parent(scene.photo_group), Some(scene.main_group));
    }

    #[test]
    fn test_texture_ids_are_sequential() {
        let mut scene = Scene::from_camera_config(&CameraConfig::default(), 1.0);
        let image = Arc::new(RgbaImage::new(2, 2));
        assert_eq!(scene.add_texture("a", image.clone()), TextureId(0));
        assert_eq!(scene.add_texture("b", image), TextureId(1));
        assert_eq!(scene.get_statistics().texture_count, 2);
    }
}
