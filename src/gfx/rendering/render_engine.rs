//! WGPU-based renderer for the tree scene
//!
//! Draws the scene graph in one depth-tested pass: instanced solid meshes
//! first, then the photo quads with one bind group per photo texture. An
//! optional UI callback records its own pass on top.

use std::sync::Arc;

use anyhow::Context;
use wgpu::{Device, TextureFormat};

use crate::gfx::{
    camera::camera_utils::CameraUniform,
    scene::{MeshKind, Scene},
};
use crate::simulation::animation::SceneRenderer;
use crate::wgpu_utils::uniform_buffer::UniformBuffer;

use super::instances::{FrameBatches, InstanceRaw};
use super::mesh_library::MeshLibrary;
use super::pipeline_manager::{PipelineConfig, PipelineManager};
use super::texture::{fit_within, photo_bind_group_layout, PhotoTextureBinding, TextureResource};

const SOLID_PIPELINE: &str = "Solid";
const PHOTO_PIPELINE: &str = "Photo";

/// Largest photo texture side uploaded to the GPU
const MAX_TEXTURE_DIMENSION: u32 = 4096;

/// Instance buffer capacity allocated up front
const INITIAL_INSTANCE_CAPACITY: usize = 4096;

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pipeline_manager: PipelineManager,
    camera_buffer: UniformBuffer<CameraUniform>,
    camera_bind_group: wgpu::BindGroup,
    photo_layout: wgpu::BindGroupLayout,
    meshes: MeshLibrary,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    photo_textures: Vec<PhotoTextureBinding>,
}

impl RenderEngine {
    /// Creates a render engine drawing into `window`
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> anyhow::Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("Failed to create a rendering surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to request adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: MAX_TEXTURE_DIMENSION,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to request a device")?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .context("Surface reports no supported formats")?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let camera_buffer = UniformBuffer::<CameraUniform>::new(&device);
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.binding_resource(),
            }],
        });
        let photo_layout = photo_bind_group_layout(&device);

        let meshes = MeshLibrary::new(&device);
        let instance_buffer = Self::create_instance_buffer(&device, INITIAL_INSTANCE_CAPACITY);

        let device_handle: Arc<Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("solid", include_str!("shaders/solid.wgsl"));
        pipeline_manager.load_shader("photo", include_str!("shaders/photo.wgsl"));

        pipeline_manager.register_pipeline(
            SOLID_PIPELINE,
            PipelineConfig::default()
                .with_label("SOLID")
                .with_shader("solid")
                .with_depth(TextureResource::DEPTH_FORMAT)
                .with_color_target(format, Some(wgpu::BlendState::REPLACE))
                .with_bind_group_layouts(vec![camera_layout.clone()]),
        );

        // Photos are visible from behind while the tree turns
        pipeline_manager.register_pipeline(
            PHOTO_PIPELINE,
            PipelineConfig::default()
                .with_label("PHOTO")
                .with_shader("photo")
                .with_depth(TextureResource::DEPTH_FORMAT)
                .with_cull_mode(None)
                .with_color_target(format, Some(wgpu::BlendState::REPLACE))
                .with_bind_group_layouts(vec![camera_layout, photo_layout.clone()]),
        );

        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            anyhow::bail!("Failed to create render pipelines: {}", errors.join("; "));
        }

        log::info!(
            "Renderer ready: {} ({:?}), surface {}x{} {:?}",
            adapter.get_info().name,
            adapter.get_info().backend,
            config.width,
            config.height,
            format
        );

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_texture,
            format,
            pipeline_manager,
            camera_buffer,
            camera_bind_group,
            photo_layout,
            meshes,
            instance_buffer,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            photo_textures: Vec::new(),
        })
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: (capacity * std::mem::size_of::<InstanceRaw>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Uploads photo textures added to the scene since the last frame
    fn sync_textures(&mut self, scene: &Scene) {
        let uploaded = self.photo_textures.len();
        for photo in scene.textures().iter().skip(uploaded) {
            let image = fit_within(&photo.image, MAX_TEXTURE_DIMENSION);
            let binding = PhotoTextureBinding::new(
                &self.device,
                &self.queue,
                &self.photo_layout,
                &image,
                &photo.label,
            );
            self.photo_textures.push(binding);
            log::debug!("Uploaded photo texture {}", photo.label);
        }
    }

    fn upload_instances(&mut self, batches: &FrameBatches) {
        let needed = batches.instances.len();
        if needed > self.instance_capacity {
            self.instance_capacity = needed.next_power_of_two();
            self.instance_buffer = Self::create_instance_buffer(&self.device, self.instance_capacity);
            log::debug!("Grew instance buffer to {} instances", self.instance_capacity);
        }
        if !batches.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&batches.instances));
        }
    }

    /// Renders a frame with an optional UI overlay
    pub fn render_frame<F>(
        &mut self,
        scene: &Scene,
        ui_callback: Option<F>,
    ) -> Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        self.sync_textures(scene);
        self.camera_buffer.update_content(&self.queue, scene.camera.uniform);
        let batches = FrameBatches::collect(scene);
        self.upload_instances(&batches);

        let surface_texture = self.surface.get_current_texture()?;
        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

            if let Some(pipeline) = self.pipeline_manager.get_pipeline(SOLID_PIPELINE) {
                render_pass.set_pipeline(pipeline);
                for batch in &batches.solid {
                    let Some(mesh) = self.meshes.get(batch.mesh) else {
                        continue;
                    };
                    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..mesh.index_count, 0, batch.instances.clone());
                }
            }

            let quad = self.meshes.get(MeshKind::Quad);
            if let (Some(pipeline), Some(quad)) = (self.pipeline_manager.get_pipeline(PHOTO_PIPELINE), quad) {
                render_pass.set_pipeline(pipeline);
                render_pass.set_vertex_buffer(0, quad.vertex_buffer.slice(..));
                render_pass.set_index_buffer(quad.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                for batch in &batches.photos {
                    let Some(texture) = self.photo_textures.get(batch.texture.0) else {
                        continue;
                    };
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                    render_pass.draw_indexed(0..quad.index_count, 0, batch.instances.clone());
                }
            }
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(&self.device, &self.queue, &mut encoder, &surface_texture_view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Recovers from a failed frame where possible
    pub fn handle_surface_error(&mut self, error: wgpu::SurfaceError) {
        match error {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                log::debug!("Surface {error:?}, reconfiguring");
                self.surface.configure(&self.device, &self.config);
            }
            wgpu::SurfaceError::Timeout => log::debug!("Surface timed out, skipping frame"),
            other => log::error!("Failed to acquire surface texture: {other}"),
        }
    }

    /// Resizes the surface and recreates the depth buffer
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

/// Signature of the overlay pass recorded after the scene
pub type UiPass = fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView);

impl SceneRenderer for RenderEngine {
    fn render(&mut self, scene: &Scene) {
        if let Err(e) = self.render_frame(scene, None::<UiPass>) {
            self.handle_surface_error(e);
        }
    }
}
