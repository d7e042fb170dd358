//! Per-frame instance batching
//!
//! Every visible drawable becomes one [`InstanceRaw`]. Solid drawables are
//! grouped by mesh so each mesh is a single instanced draw; photo quads are
//! grouped by texture since each needs its own bind group.

use std::collections::BTreeMap;
use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::gfx::material::TextureId;
use crate::gfx::scene::{MeshKind, Scene};

/// Per-instance vertex data
///
/// Locations 0-2 belong to [`Vertex3D`](crate::gfx::scene::Vertex3D), so the
/// instance attributes start at 3.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub base_color: [f32; 4],
    pub emissive: [f32; 4],
}

impl InstanceRaw {
    const ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// A run of instances drawn with one mesh
#[derive(Debug, Clone, PartialEq)]
pub struct SolidBatch {
    pub mesh: MeshKind,
    pub instances: Range<u32>,
}

/// A run of photo quads sampling one texture
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoBatch {
    pub texture: TextureId,
    pub instances: Range<u32>,
}

/// Everything one frame draws, ready for upload
#[derive(Debug, Default)]
pub struct FrameBatches {
    pub instances: Vec<InstanceRaw>,
    pub solid: Vec<SolidBatch>,
    pub photos: Vec<PhotoBatch>,
}

impl FrameBatches {
    pub fn collect(scene: &Scene) -> Self {
        let mut by_mesh: Vec<(MeshKind, Vec<InstanceRaw>)> =
            MeshKind::ALL.iter().map(|&mesh| (mesh, Vec::new())).collect();
        let mut by_texture: BTreeMap<usize, Vec<InstanceRaw>> = BTreeMap::new();

        for (_, model, drawable) in scene.graph.visible_drawables() {
            let shading = drawable.material.shading();
            let instance = InstanceRaw {
                model: model.into(),
                base_color: shading.base_color,
                emissive: shading.emissive,
            };

            match drawable.material.texture() {
                Some(texture) => by_texture.entry(texture.0).or_default().push(instance),
                None => {
                    if let Some((_, list)) = by_mesh.iter_mut().find(|(mesh, _)| *mesh == drawable.mesh) {
                        list.push(instance);
                    }
                }
            }
        }

        let mut batches = FrameBatches::default();
        for (mesh, list) in by_mesh {
            if let Some(instances) = batches.append(list) {
                batches.solid.push(SolidBatch { mesh, instances });
            }
        }
        for (texture, list) in by_texture {
            if let Some(instances) = batches.append(list) {
                batches.photos.push(PhotoBatch {
                    texture: TextureId(texture),
                    instances,
                });
            }
        }
        batches
    }

    fn append(&mut self, list: Vec<InstanceRaw>) -> Option<Range<u32>> {
        if list.is_empty() {
            return None;
        }
        let start = self.instances.len() as u32;
        self.instances.extend(list);
        Some(start..self.instances.len() as u32)
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
