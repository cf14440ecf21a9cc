use crate::camera::{Camera, CameraController};
use crate::gpu::GpuContext;
use crate::interpolate::Frame;
use crate::present::Presenter;
use crate::{DrawParams, Particle};
use anyhow::{anyhow, Context, Result};
use std::borrow::Cow;
use std::mem::{offset_of, size_of};
use std::sync::Arc;
use wgpu::{util::DeviceExt, PipelineCompilationOptions};
use winit::{dpi::PhysicalSize, event::WindowEvent};

const CURRENT_ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
  wgpu::VertexAttribute {
    format: wgpu::VertexFormat::Float32x3,
    offset: offset_of!(Particle, pos) as u64,
    shader_location: 0,
  },
  wgpu::VertexAttribute {
    format: wgpu::VertexFormat::Float32,
    offset: offset_of!(Particle, radius) as u64,
    shader_location: 1,
  },
  wgpu::VertexAttribute {
    format: wgpu::VertexFormat::Float32x4,
    offset: offset_of!(Particle, color) as u64,
    shader_location: 2,
  },
];

const PREVIOUS_ATTRIBUTES: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
  format: wgpu::VertexFormat::Float32x3,
  offset: offset_of!(Particle, pos) as u64,
  shader_location: 3,
}];

/// Draws each particle as a round sprite blended between the previous and
/// current snapshot.
pub struct WindowPresenter {
  surface: wgpu::Surface<'static>,
  config: wgpu::SurfaceConfiguration,
  device: Arc<wgpu::Device>,
  queue: Arc<wgpu::Queue>,
  render_pipeline: wgpu::RenderPipeline,
  draw_params_buffer: wgpu::Buffer,
  draw_bind_group: wgpu::BindGroup,
  camera: Camera,
  camera_controller: CameraController,
  num_particles: u32,
}

impl WindowPresenter {
  pub fn init(
    context: &GpuContext,
    surface: wgpu::Surface<'static>,
    size: PhysicalSize<u32>,
    num_particles: u32,
  ) -> Result<Self> {
    let device = context.device.clone();
    let width = size.width.max(1);
    let height = size.height.max(1);
    let mut config = surface
      .get_default_config(&context.adapter, width, height)
      .ok_or_else(|| anyhow!("surface is not supported by the adapter"))?;
    config.present_mode = wgpu::PresentMode::AutoNoVsync;
    let view_format = config.format.add_srgb_suffix();
    config.view_formats.push(view_format);
    surface.configure(&device, &config);

    let draw_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("sprites"),
      source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/draw.wgsl"))),
    });

    let camera = Camera::new(width as f32 / height as f32);
    let draw_params = DrawParams::new(camera.build_view_projection_matrix().into(), 0.0);
    let draw_params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Draw Parameter Buffer"),
      contents: bytemuck::cast_slice(&[draw_params]),
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let draw_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::VERTEX,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(size_of::<DrawParams>() as _),
          },
          count: None,
        }],
        label: Some("draw_bind_group_layout"),
      });
    let draw_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &draw_bind_group_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: draw_params_buffer.as_entire_binding(),
      }],
      label: Some("draw_bind_group"),
    });

    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("render"),
      bind_group_layouts: &[&draw_bind_group_layout],
      push_constant_ranges: &[],
    });
    let current_buffer = wgpu::VertexBufferLayout {
      array_stride: size_of::<Particle>() as u64,
      step_mode: wgpu::VertexStepMode::Instance,
      attributes: &CURRENT_ATTRIBUTES,
    };
    let previous_buffer = wgpu::VertexBufferLayout {
      array_stride: size_of::<Particle>() as u64,
      step_mode: wgpu::VertexStepMode::Instance,
      attributes: &PREVIOUS_ATTRIBUTES,
    };
    let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
      label: Some("Render Pipeline"),
      layout: Some(&render_pipeline_layout),
      vertex: wgpu::VertexState {
        module: &draw_shader,
        entry_point: "main_vs",
        compilation_options: PipelineCompilationOptions::default(),
        buffers: &[current_buffer, previous_buffer],
      },
      fragment: Some(wgpu::FragmentState {
        module: &draw_shader,
        entry_point: "main_fs",
        compilation_options: PipelineCompilationOptions::default(),
        targets: &[Some(wgpu::ColorTargetState {
          format: config.view_formats[0],
          blend: Some(wgpu::BlendState::ALPHA_BLENDING),
          write_mask: wgpu::ColorWrites::ALL,
        })],
      }),
      primitive: wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleStrip,
        ..wgpu::PrimitiveState::default()
      },
      depth_stencil: None,
      multisample: wgpu::MultisampleState::default(),
      multiview: None,
      cache: None,
    });

    Ok(Self {
      surface,
      config,
      device,
      queue: context.queue.clone(),
      render_pipeline,
      draw_params_buffer,
      draw_bind_group,
      camera,
      camera_controller: CameraController::init(0.02, 0.02),
      num_particles,
    })
  }

  pub fn input(&mut self, event: &WindowEvent) -> bool {
    self.camera_controller.process_events(event)
  }

  pub fn resize(&mut self, size: PhysicalSize<u32>) {
    if size.width == 0 || size.height == 0 {
      return;
    }
    self.config.width = size.width;
    self.config.height = size.height;
    self.camera.aspect = size.width as f32 / size.height as f32;
    self.surface.configure(&self.device, &self.config);
  }

  fn acquire(&mut self) -> Result<wgpu::SurfaceTexture> {
    match self.surface.get_current_texture() {
      Ok(frame) => Ok(frame),
      Err(wgpu::SurfaceError::Timeout) => self
        .surface
        .get_current_texture()
        .context("timed out acquiring a frame"),
      Err(
        err @ (wgpu::SurfaceError::Outdated
        | wgpu::SurfaceError::Lost
        | wgpu::SurfaceError::OutOfMemory),
      ) => {
        log::warn!("reconfiguring surface: {err}");
        self.surface.configure(&self.device, &self.config);
        self
          .surface
          .get_current_texture()
          .context("failed to acquire a frame after reconfiguring")
      }
    }
  }
}

impl Presenter<wgpu::Buffer> for WindowPresenter {
  fn present(&mut self, frame: Frame<'_, wgpu::Buffer>) -> Result<()> {
    self.camera_controller.update_camera(&mut self.camera);
    let draw_params = DrawParams::new(self.camera.build_view_projection_matrix().into(), frame.t);
    self.queue.write_buffer(
      &self.draw_params_buffer,
      0,
      bytemuck::cast_slice(&[draw_params]),
    );

    let surface_texture = self.acquire()?;
    let view = surface_texture
      .texture
      .create_view(&wgpu::TextureViewDescriptor {
        format: Some(self.config.view_formats[0]),
        ..wgpu::TextureViewDescriptor::default()
      });
    let color_attachments = [Some(wgpu::RenderPassColorAttachment {
      view: &view,
      resolve_target: None,
      ops: wgpu::Operations {
        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
        store: wgpu::StoreOp::Store,
      },
    })];
    let render_pass_descriptor = wgpu::RenderPassDescriptor {
      label: None,
      color_attachments: &color_attachments,
      depth_stencil_attachment: None,
      timestamp_writes: None,
      occlusion_query_set: None,
    };
    let mut command_encoder = self
      .device
      .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    {
      let mut rpass = command_encoder.begin_render_pass(&render_pass_descriptor);
      rpass.set_pipeline(&self.render_pipeline);
      rpass.set_bind_group(0, &self.draw_bind_group, &[]);
      rpass.set_vertex_buffer(0, frame.current.slice(..));
      rpass.set_vertex_buffer(1, frame.previous.slice(..));
      rpass.draw(0..4, 0..self.num_particles);
    }
    self.queue.submit(Some(command_encoder.finish()));
    surface_texture.present();
    log::trace!("presented frame t={:.3}", frame.t);
    Ok(())
  }
}
