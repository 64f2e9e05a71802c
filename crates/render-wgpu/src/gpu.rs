use crate::camera::SceneCamera;
use crate::mesh::{self, Vertex};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use std::f32::consts::PI;
use synthwave_assets::{HeightField, ImageData, ModelData};
use synthwave_common::Color;
use synthwave_kernel::{DriveScene, LightingMode, SunStyle};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Uniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    fog_color: [f32; 4],
    params: [f32; 4],
    sky_color: [f32; 4],
    ground_color: [f32; 4],
    spot_position: [f32; 4],
    spot_direction: [f32; 4],
    spot_color: [f32; 4],
    sun_top: [f32; 4],
    sun_bottom: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
}

impl InstanceData {
    fn new(model: Mat4, color: Color) -> Self {
        let cols = model.to_cols_array_2d();
        let [r, g, b] = color.to_linear();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color: [r, g, b, 1.0],
        }
    }
}

fn rgb_w(color: Color, w: f32) -> [f32; 4] {
    let [r, g, b] = color.to_linear();
    [r, g, b, w]
}

/// Pack the per-frame uniform block from scene state.
pub(crate) fn scene_uniforms(
    view_proj: Mat4,
    eye: Vec3,
    scene: &DriveScene,
    sun_texture_loaded: bool,
) -> Uniforms {
    let atmo = scene.atmosphere();
    let light = scene.lighting();
    let sun = scene.sun();
    let spot_on = light.mode == LightingMode::SpotAndHemisphere;
    let spot_dir = (light.spot_target - light.spot_position).normalize_or(Vec3::NEG_Z);
    let textured = sun.style == SunStyle::Textured && sun_texture_loaded;

    Uniforms {
        view_proj: view_proj.to_cols_array_2d(),
        camera_pos: eye.extend(1.0).to_array(),
        fog_color: rgb_w(atmo.fog_color, 1.0),
        params: [
            atmo.fog_near,
            atmo.fog_far,
            atmo.exposure,
            scene.terrain().clip_distance,
        ],
        sky_color: rgb_w(light.sky_color, light.hemisphere_intensity),
        ground_color: rgb_w(light.ground_color, 1.0),
        spot_position: light.spot_position.extend(f32::from(u8::from(spot_on))).to_array(),
        spot_direction: spot_dir.extend(light.spot_angle.cos()).to_array(),
        spot_color: rgb_w(light.spot_color, light.spot_intensity),
        sun_top: rgb_w(sun.top_color, f32::from(u8::from(textured))),
        sun_bottom: rgb_w(sun.bottom_color, 0.0),
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, vertices: &[Vertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>, instances: &wgpu::Buffer, count: u32) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, instances.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..count);
    }
}

const VERTEX_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<Vertex>() as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
    ],
};

const INSTANCE_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<InstanceData>() as u64,
    step_mode: wgpu::VertexStepMode::Instance,
    attributes: &wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
    ],
};

struct PipelineDesc<'a> {
    label: &'a str,
    layout: &'a wgpu::PipelineLayout,
    module: &'a wgpu::ShaderModule,
    vs: &'a str,
    fs: &'a str,
    topology: wgpu::PrimitiveTopology,
    cull_mode: Option<wgpu::Face>,
}

fn create_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    desc: PipelineDesc<'_>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(desc.layout),
        vertex: wgpu::VertexState {
            module: desc.module,
            entry_point: Some(desc.vs),
            compilation_options: Default::default(),
            buffers: &[VERTEX_LAYOUT, INSTANCE_LAYOUT],
        },
        fragment: Some(wgpu::FragmentState {
            module: desc.module,
            entry_point: Some(desc.fs),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: desc.topology,
            cull_mode: desc.cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

/// wgpu renderer for the drive scene.
///
/// Terrain and car meshes can be replaced after construction, when their
/// assets finish loading; until then a flat grid is drawn and the car is
/// skipped.
pub struct SceneRenderer {
    terrain_pipeline: wgpu::RenderPipeline,
    car_pipeline: wgpu::RenderPipeline,
    sun_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    sun_bind_group_layout: wgpu::BindGroupLayout,
    sun_bind_group: wgpu::BindGroup,
    sun_sampler: wgpu::Sampler,
    sun_texture_loaded: bool,
    terrain_mesh: GpuMesh,
    sun_mesh: GpuMesh,
    car_mesh: Option<GpuMesh>,
    terrain_instances: wgpu::Buffer,
    car_instance: wgpu::Buffer,
    sun_instance: wgpu::Buffer,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        scene: &DriveScene,
    ) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform_buffer"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
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

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let sun_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("sun_bind_group_layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let sun_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sun_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // Placeholder until the sun texture arrives.
        let placeholder = ImageData::solid_color(1, 1, [255, 255, 255, 255]);
        let sun_bind_group = Self::create_sun_bind_group(
            device,
            queue,
            &sun_bind_group_layout,
            &sun_sampler,
            &placeholder,
        );

        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });
        let sun_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sun_pipeline_layout"),
            bind_group_layouts: &[&uniform_layout, &sun_bind_group_layout],
            push_constant_ranges: &[],
        });

        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });
        let sun_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sun_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SUN_SHADER.into()),
        });

        let terrain_pipeline = create_pipeline(
            device,
            surface_format,
            PipelineDesc {
                label: "terrain_pipeline",
                layout: &scene_layout,
                module: &scene_shader,
                vs: "vs_main",
                fs: "fs_terrain",
                topology: wgpu::PrimitiveTopology::LineList,
                cull_mode: None,
            },
        );
        let car_pipeline = create_pipeline(
            device,
            surface_format,
            PipelineDesc {
                label: "car_pipeline",
                layout: &scene_layout,
                module: &scene_shader,
                vs: "vs_main",
                fs: "fs_car",
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
            },
        );
        let sun_pipeline = create_pipeline(
            device,
            surface_format,
            PipelineDesc {
                label: "sun_pipeline",
                layout: &sun_layout,
                module: &sun_shader,
                vs: "vs_sun",
                fs: "fs_sun",
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
            },
        );

        let terrain = scene.terrain();
        let (terrain_verts, terrain_indices) = mesh::terrain_wireframe(
            terrain.size,
            terrain.segments,
            &HeightField::flat(),
            terrain.displacement_scale,
        );
        let terrain_mesh = GpuMesh::upload(device, "terrain", &terrain_verts, &terrain_indices);

        let sun = scene.sun();
        let (sun_verts, sun_indices) = mesh::sun_disc(sun.radius, sun.segments, 0.0, PI);
        let sun_mesh = GpuMesh::upload(device, "sun", &sun_verts, &sun_indices);

        let instance_buffer = |label: &str, count: u64| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: count * std::mem::size_of::<InstanceData>() as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let terrain_instances = instance_buffer("terrain_instances", 2);
        let car_instance = instance_buffer("car_instance", 1);
        let sun_instance = instance_buffer("sun_instance", 1);

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            terrain_pipeline,
            car_pipeline,
            sun_pipeline,
            uniform_buffer,
            uniform_bind_group,
            sun_bind_group_layout,
            sun_bind_group,
            sun_sampler,
            sun_texture_loaded: false,
            terrain_mesh,
            sun_mesh,
            car_mesh: None,
            terrain_instances,
            car_instance,
            sun_instance,
            depth_texture,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Rebuild the terrain tile with heights from a loaded heightmap.
    pub fn set_heightfield(&mut self, device: &wgpu::Device, scene: &DriveScene, field: &HeightField) {
        let terrain = scene.terrain();
        let (verts, indices) = mesh::terrain_wireframe(
            terrain.size,
            terrain.segments,
            field,
            terrain.displacement_scale,
        );
        self.terrain_mesh = GpuMesh::upload(device, "terrain", &verts, &indices);
        tracing::debug!(vertices = verts.len(), "terrain mesh rebuilt from heightmap");
    }

    pub fn set_sun_texture(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, image: &ImageData) {
        self.sun_bind_group = Self::create_sun_bind_group(
            device,
            queue,
            &self.sun_bind_group_layout,
            &self.sun_sampler,
            image,
        );
        self.sun_texture_loaded = true;
    }

    pub fn set_car_model(&mut self, device: &wgpu::Device, model: &ModelData) {
        let (verts, indices) = mesh::model_mesh(model);
        self.car_mesh = Some(GpuMesh::upload(device, "car", &verts, &indices));
    }

    /// Render one frame: sun, both terrain tiles, then the car if present.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &SceneCamera,
        scene: &DriveScene,
    ) {
        let rig = scene.camera();
        let uniforms = scene_uniforms(
            camera.view_projection(rig),
            camera.eye(rig),
            scene,
            self.sun_texture_loaded,
        );
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let terrain_color = scene.terrain().color;
        let tiles = scene
            .terrain_transforms()
            .map(|t| InstanceData::new(t.matrix(), terrain_color));
        queue.write_buffer(&self.terrain_instances, 0, bytemuck::cast_slice(&tiles));

        let sun = InstanceData::new(scene.sun().transform.matrix(), Color::WHITE);
        queue.write_buffer(&self.sun_instance, 0, bytemuck::bytes_of(&sun));

        let car = scene.car().node().zip(self.car_mesh.as_ref());
        if let Some((node, _)) = car {
            let instance = InstanceData::new(node.transform.matrix(), node.color);
            queue.write_buffer(&self.car_instance, 0, bytemuck::bytes_of(&instance));
        }

        let [r, g, b] = scene.atmosphere().background.to_linear();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(&self.sun_pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_bind_group(1, &self.sun_bind_group, &[]);
            self.sun_mesh.draw(&mut pass, &self.sun_instance, 1);

            pass.set_pipeline(&self.terrain_pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            self.terrain_mesh.draw(&mut pass, &self.terrain_instances, 2);

            if let Some((_, mesh)) = car {
                pass.set_pipeline(&self.car_pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                mesh.draw(&mut pass, &self.car_instance, 1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_sun_bind_group(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        image: &ImageData,
    ) -> wgpu::BindGroup {
        let size = wgpu::Extent3d {
            width: image.width.max(1),
            height: image.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sun_texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * size.width),
                rows_per_image: Some(size.height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sun_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synthwave_kernel::SceneConfig;

    #[test]
    fn uniform_block_is_std140_sized() {
        assert_eq!(std::mem::size_of::<Uniforms>(), 64 + 10 * 16);
        assert_eq!(std::mem::size_of::<InstanceData>(), 80);
    }

    #[test]
    fn uniforms_carry_fog_exposure_and_clip() {
        let scene = DriveScene::default();
        let u = scene_uniforms(Mat4::IDENTITY, Vec3::ZERO, &scene, true);
        assert_eq!(u.params, [25.0, 60.0, 2.3, 50.0]);
        assert_eq!(u.spot_position[3], 1.0);
        assert_eq!(u.sun_top[3], 1.0);
        assert_eq!(u.sun_bottom[3], 0.0);
    }

    #[test]
    fn fog_range_measured_from_eye() {
        let scene = DriveScene::default();
        let eye = Vec3::new(0.0, 0.5, 3.0);
        let u = scene_uniforms(Mat4::IDENTITY, eye, &scene, false);
        assert_eq!(u.camera_pos, [0.0, 0.5, 3.0, 1.0]);
        assert!(shaders::SCENE_SHADER.contains("distance(p, uniforms.camera_pos.xyz)"));
        assert!(!shaders::SCENE_SHADER.contains("view_depth"));
    }

    #[test]
    fn hemisphere_only_disables_spot() {
        let mut config = SceneConfig::default();
        config.lighting.mode = LightingMode::HemisphereOnly;
        let scene = DriveScene::new(&config);
        let u = scene_uniforms(Mat4::IDENTITY, Vec3::ZERO, &scene, true);
        assert_eq!(u.spot_position[3], 0.0);
    }

    #[test]
    fn gradient_sun_when_texture_missing_or_not_requested() {
        let scene = DriveScene::default();
        let u = scene_uniforms(Mat4::IDENTITY, Vec3::ZERO, &scene, false);
        assert_eq!(u.sun_top[3], 0.0);

        let mut config = SceneConfig::default();
        config.sun.style = SunStyle::Gradient;
        let scene = DriveScene::new(&config);
        let u = scene_uniforms(Mat4::IDENTITY, Vec3::ZERO, &scene, true);
        assert_eq!(u.sun_top[3], 0.0);
    }

    #[test]
    fn spot_points_from_sun_to_origin() {
        let scene = DriveScene::default();
        let u = scene_uniforms(Mat4::IDENTITY, Vec3::ZERO, &scene, true);
        let dir = Vec3::new(u.spot_direction[0], u.spot_direction[1], u.spot_direction[2]);
        assert!(dir.z > 0.9);
        assert!((u.spot_direction[3] - 0.5).abs() < 1e-5);
    }
}
