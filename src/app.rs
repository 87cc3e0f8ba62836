use std::borrow::Cow;

use anyhow::{anyhow, Context as _, Result};
use juxtapose::label::{GlyphPainter, LabelStyle};
use juxtapose::orientation::Cursor;
use juxtapose::{CanvasRenderer, Viewport, Widget, WidgetEvent};
use log::{debug, error, info};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::window::{CursorIcon, Window};

pub type ComparisonWidget = Widget<CanvasRenderer<GlyphPainter>>;

const BLIT_SHADER: &str = r#"
struct Placement {
    rect: vec4<f32>,
};

@group(0) @binding(0) var frame_tex: texture_2d<f32>;
@group(0) @binding(1) var frame_sampler: sampler;
@group(0) @binding(2) var<uniform> placement: Placement;

struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOut {
    var corners = array<vec2<f32>, 4>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 1.0),
    );
    let uv = corners[index];
    var out: VertexOut;
    out.position = vec4<f32>(
        mix(placement.rect.x, placement.rect.z, uv.x),
        mix(placement.rect.y, placement.rect.w, uv.y),
        0.0,
        1.0,
    );
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {
    return textureSample(frame_tex, frame_sampler, in.uv);
}
"#;

/// Where the composited frame lands on the surface, in clip space.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Placement {
    rect: [f32; 4],
}

struct FrameTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    size: (u32, u32),
}

pub struct AppState {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    placement: wgpu::Buffer,
    frame: Option<FrameTexture>,
    widget: ComparisonWidget,
    dirty: bool,
}

impl AppState {
    pub async fn new(window: &Window, widget: ComparisonWidget) -> Result<Self> {
        info!("Initializing AppState");
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        // SAFETY: the window outlives the surface; both live until the event loop exits.
        let surface = unsafe { instance.create_surface(window) }
            .context("Failed to create rendering surface")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow!("No suitable graphics adapter found"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("juxtapose-device"),
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .context("Failed to create graphics device")?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow!("Surface reports no supported formats"))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let bind_group_layout = create_bind_group_layout(&device);
        let pipeline = create_pipeline(&device, &bind_group_layout, format);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("juxtapose-frame-sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let placement = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("juxtapose-placement"),
            contents: bytemuck::bytes_of(&Placement { rect: [-1.0, 1.0, 1.0, -1.0] }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        window.set_cursor_icon(match widget.params().cursor {
            Cursor::ColResize => CursorIcon::ColResize,
            Cursor::RowResize => CursorIcon::RowResize,
        });

        info!(
            "AppState initialized: surface {}x{} {:?}",
            config.width, config.height, format
        );
        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            bind_group_layout,
            sampler,
            placement,
            frame: None,
            widget,
            dirty: true,
        })
    }

    /// Routes window events into the widget. Returns whether a redraw is needed.
    pub fn handle_event(&mut self, window: &Window, event: &Event<()>) -> bool {
        let Event::WindowEvent { event, .. } = event else {
            return false;
        };
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let (ox, oy) = self.frame_origin();
                self.dispatch(WidgetEvent::Pointer {
                    x: position.x - ox as f64,
                    y: position.y - oy as f64,
                })
            }
            WindowEvent::Resized(size) => {
                self.resize(*size, window.scale_factor());
                true
            }
            WindowEvent::ScaleFactorChanged {
                scale_factor,
                new_inner_size,
            } => {
                self.rescale_labels(*scale_factor);
                self.resize(**new_inner_size, *scale_factor);
                true
            }
            _ => false,
        }
    }

    fn dispatch(&mut self, event: WidgetEvent) -> bool {
        match self.widget.handle(event) {
            Ok(Some(_)) => {
                self.dirty = true;
                true
            }
            Ok(None) => false,
            Err(e) => {
                error!("Comparison failed: {}", e);
                false
            }
        }
    }

    fn resize(&mut self, size: PhysicalSize<u32>, scale_factor: f64) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        self.dispatch(WidgetEvent::Resize(Viewport::new(
            size.width as f64 / scale_factor,
            size.height as f64 / scale_factor,
            scale_factor,
        )));
        self.dirty = true;
    }

    /// Rebuilds the label painter for a new device pixel ratio. The following
    /// resize bakes the layers again.
    fn rescale_labels(&mut self, scale_factor: f64) {
        let style = LabelStyle::default().scaled(scale_factor);
        let renderer = self.widget.renderer_mut();
        let painter = renderer.painter().map(|p| p.with_font_px(style.font_px));
        info!("Label size {}px at scale factor {}", style.font_px, scale_factor);
        renderer.set_labels(painter, style);
    }

    /// Top-left of the frame when centred on the surface, in physical pixels.
    fn frame_origin(&self) -> (u32, u32) {
        let (w, h) = self.widget.renderer().frame().dimensions();
        (
            self.config.width.saturating_sub(w) / 2,
            self.config.height.saturating_sub(h) / 2,
        )
    }

    /// Uploads the latest composited frame if it changed.
    pub fn update(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;

        let frame = self.widget.renderer().frame();
        let size = frame.dimensions();
        if self.frame.as_ref().map(|f| f.size) != Some(size) {
            debug!("Creating frame texture {}x{}", size.0, size.1);
            self.frame = Some(self.create_frame_texture(size));
        }
        let Some(target) = &self.frame else {
            return;
        };

        let extent = wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        };
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            frame.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * size.0),
                rows_per_image: Some(size.1),
            },
            extent,
        );

        let (ox, oy) = self.frame_origin();
        let (sw, sh) = (self.config.width as f32, self.config.height as f32);
        let left = -1.0 + 2.0 * ox as f32 / sw;
        let top = 1.0 - 2.0 * oy as f32 / sh;
        let rect = [
            left,
            top,
            left + 2.0 * size.0 as f32 / sw,
            top - 2.0 * size.1 as f32 / sh,
        ];
        self.queue
            .write_buffer(&self.placement, 0, bytemuck::bytes_of(&Placement { rect }));
    }

    fn create_frame_texture(&self, size: (u32, u32)) -> FrameTexture {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("juxtapose-frame"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("juxtapose-frame-bind-group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.placement.as_entire_binding(),
                },
            ],
        });
        FrameTexture {
            texture,
            bind_group,
            size,
        }
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                self.surface.get_current_texture()?
            }
            Err(e) => return Err(e),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("juxtapose-encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("juxtapose-blit"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            if let Some(frame) = &self.frame {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &frame.bind_group, &[]);
                pass.draw(0..4, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("juxtapose-frame-layout"),
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
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("juxtapose-blit-shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(BLIT_SHADER)),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("juxtapose-blit-layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("juxtapose-blit"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}
