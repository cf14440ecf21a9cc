use crate::compute::ComputeBackend;
use crate::{Particle, StepParams};
use anyhow::{anyhow, Context, Result};
use std::borrow::Cow;
use std::sync::{mpsc, Arc};
use wgpu::{util::DeviceExt, PipelineCompilationOptions};

const PARTICLE_SIZE: u64 = std::mem::size_of::<Particle>() as u64;

/// Device and queue shared between the compute backend and the presenter.
pub struct GpuContext {
  pub instance: wgpu::Instance,
  pub adapter: wgpu::Adapter,
  pub device: Arc<wgpu::Device>,
  pub queue: Arc<wgpu::Queue>,
}

impl GpuContext {
  pub async fn new(compatible_surface: Option<&wgpu::Surface<'_>>) -> Result<Self> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
      #[cfg(not(target_arch = "wasm32"))]
      backends: wgpu::Backends::PRIMARY,
      ..Default::default()
    });
    Self::with_instance(instance, compatible_surface).await
  }

  pub async fn with_instance(
    instance: wgpu::Instance,
    compatible_surface: Option<&wgpu::Surface<'_>>,
  ) -> Result<Self> {
    let adapter = instance
      .request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface,
        force_fallback_adapter: false,
      })
      .await
      .ok_or_else(|| anyhow!("no suitable graphics adapter"))?;
    log::info!("using adapter {:?}", adapter.get_info().name);

    let (device, queue) = adapter
      .request_device(
        &wgpu::DeviceDescriptor {
          label: Some("nbody device"),
          required_features: wgpu::Features::empty(),
          required_limits: wgpu::Limits::default(),
          memory_hints: Default::default(),
        },
        None,
      )
      .await
      .context("failed to open graphics device")?;

    Ok(Self {
      instance,
      adapter,
      device: Arc::new(device),
      queue: Arc::new(queue),
    })
  }
}

/// Runs the force kernel as a wgpu compute pass.
pub struct GpuBackend {
  device: Arc<wgpu::Device>,
  queue: Arc<wgpu::Queue>,
  pipeline: wgpu::ComputePipeline,
  bind_group_layout: wgpu::BindGroupLayout,
  params_buffer: wgpu::Buffer,
  num_particles: u32,
  work_group_count: u32,
}

impl GpuBackend {
  #[must_use]
  pub fn new(context: &GpuContext, num_particles: u32, workgroup_size: u32) -> Self {
    let device = context.device.clone();
    let source = include_str!("shaders/compute.wgsl")
      .replace("{{workgroup_size}}", &workgroup_size.to_string());
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("force kernel"),
      source: wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
    });

    let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Step Parameter Buffer"),
      contents: bytemuck::cast_slice(&[StepParams::new(0.0, num_particles)]),
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let particles_size = wgpu::BufferSize::new(u64::from(num_particles.max(1)) * PARTICLE_SIZE);
    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
      entries: &[
        wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::COMPUTE,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<StepParams>() as _),
          },
          count: None,
        },
        wgpu::BindGroupLayoutEntry {
          binding: 1,
          visibility: wgpu::ShaderStages::COMPUTE,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: particles_size,
          },
          count: None,
        },
        wgpu::BindGroupLayoutEntry {
          binding: 2,
          visibility: wgpu::ShaderStages::COMPUTE,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: false },
            has_dynamic_offset: false,
            min_binding_size: particles_size,
          },
          count: None,
        },
      ],
      label: Some("force kernel bindings"),
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("compute"),
      bind_group_layouts: &[&bind_group_layout],
      push_constant_ranges: &[],
    });
    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
      label: Some("Compute pipeline"),
      layout: Some(&pipeline_layout),
      module: &shader,
      entry_point: "main",
      compilation_options: PipelineCompilationOptions::default(),
      cache: None,
    });

    let work_group_count = num_particles.div_ceil(workgroup_size.max(1));
    Self {
      device,
      queue: context.queue.clone(),
      pipeline,
      bind_group_layout,
      params_buffer,
      num_particles,
      work_group_count,
    }
  }

  fn wait(&self) {
    let result = self.device.poll(wgpu::Maintain::Wait);
    log::trace!("device idle, queue empty: {}", result.is_queue_empty());
  }
}

impl ComputeBackend for GpuBackend {
  type Buffer = wgpu::Buffer;

  fn allocate(&mut self, particles: &[Particle]) -> Result<Self::Buffer> {
    if particles.len() as u32 != self.num_particles {
      return Err(anyhow!(
        "backend was built for {} particles, got {}",
        self.num_particles,
        particles.len()
      ));
    }
    self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Particle Buffer"),
      contents: bytemuck::cast_slice(particles),
      usage: wgpu::BufferUsages::VERTEX
        | wgpu::BufferUsages::STORAGE
        | wgpu::BufferUsages::COPY_SRC
        | wgpu::BufferUsages::COPY_DST,
    });
    if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
      return Err(anyhow!("particle buffer allocation failed: {err}"));
    }
    Ok(buffer)
  }

  fn copy(&mut self, src: &Self::Buffer, dst: &mut Self::Buffer) -> Result<()> {
    let mut encoder = self
      .device
      .create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("snapshot"),
      });
    encoder.copy_buffer_to_buffer(src, 0, dst, 0, src.size());
    self.queue.submit(Some(encoder.finish()));
    Ok(())
  }

  fn dispatch(&mut self, source: &Self::Buffer, target: &mut Self::Buffer, dt: f32) -> Result<()> {
    self.queue.write_buffer(
      &self.params_buffer,
      0,
      bytemuck::cast_slice(&[StepParams::new(dt, self.num_particles)]),
    );
    let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &self.bind_group_layout,
      entries: &[
        wgpu::BindGroupEntry {
          binding: 0,
          resource: self.params_buffer.as_entire_binding(),
        },
        wgpu::BindGroupEntry {
          binding: 1,
          resource: source.as_entire_binding(),
        },
        wgpu::BindGroupEntry {
          binding: 2,
          resource: target.as_entire_binding(),
        },
      ],
      label: None,
    });

    self.device.push_error_scope(wgpu::ErrorFilter::Validation);
    let mut encoder = self
      .device
      .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    {
      let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: None,
        timestamp_writes: None,
      });
      cpass.set_pipeline(&self.pipeline);
      cpass.set_bind_group(0, &bind_group, &[]);
      cpass.dispatch_workgroups(self.work_group_count, 1, 1);
    }
    self.queue.submit(Some(encoder.finish()));
    if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
      return Err(anyhow!("compute dispatch failed: {err}"));
    }
    self.wait();
    Ok(())
  }

  fn read(&mut self, buffer: &Self::Buffer) -> Result<Vec<Particle>> {
    let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("readback"),
      size: buffer.size(),
      usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });
    let mut encoder = self
      .device
      .create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback"),
      });
    encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, buffer.size());
    self.queue.submit(Some(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
      let _ = tx.send(result);
    });
    self.wait();
    rx.recv()
      .context("readback callback dropped")?
      .context("failed to map readback buffer")?;

    let particles = bytemuck::cast_slice::<u8, Particle>(&slice.get_mapped_range()).to_vec();
    staging.unmap();
    Ok(particles)
  }

  fn name(&self) -> &'static str {
    "gpu"
  }
}
