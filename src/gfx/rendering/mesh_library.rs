//! GPU copies of the unit meshes

use std::collections::HashMap;

use wgpu::util::DeviceExt;
use wgpu::{Buffer, Device};

use crate::gfx::geometry::generate_mesh;
use crate::gfx::scene::MeshKind;

pub struct GpuMesh {
    pub vertex_buffer: Buffer,
    pub index_buffer: Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    fn new(device: &Device, kind: MeshKind) -> Self {
        let (vertices, indices) = generate_mesh(kind).to_scene_format();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{kind:?} Vertex Buffer")),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{kind:?} Index Buffer")),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }
}

/// One uploaded mesh per [`MeshKind`]
pub struct MeshLibrary {
    meshes: HashMap<MeshKind, GpuMesh>,
}

impl MeshLibrary {
    pub fn new(device: &Device) -> Self {
        let meshes = MeshKind::ALL
            .iter()
            .map(|&kind| (kind, GpuMesh::new(device, kind)))
            .collect();
        Self { meshes }
    }

    pub fn get(&self, kind: MeshKind) -> Option<&GpuMesh> {
        self.meshes.get(&kind)
    }
}
