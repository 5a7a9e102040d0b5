//! wgpu device context (Metal / Vulkan / DX12).

use std::sync::Arc;

use crate::error::{ParallaxError, Result};

/// The single device execution context: adapter, device, queue, and the
/// pre-compiled gradient pipelines.
///
/// Create one `DeviceContext` and keep it for the lifetime of the pipeline —
/// adapter and device acquisition are expensive, cloning the inner `Arc`s is
/// not. All operations issued through it are synchronous from the caller's
/// point of view.
pub struct DeviceContext {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    adapter_name: String,
    sobel_global_pipeline: wgpu::ComputePipeline,
    sobel_tex_pipeline: wgpu::ComputePipeline,
}

impl DeviceContext {
    /// Acquire a device and compile the gradient pipelines.
    ///
    /// # Errors
    /// Returns [`ParallaxError::Device`] if no suitable adapter is found or
    /// the device request fails.
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| ParallaxError::Device(format!("no suitable GPU adapter found: {e}")))?;

        let adapter_name = adapter.get_info().name.clone();
        tracing::info!("GPU adapter: {adapter_name}");

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("parallax"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        }))
        .map_err(|e| ParallaxError::Device(format!("failed to create GPU device: {e}")))?;

        let device: Arc<wgpu::Device> = Arc::new(device);
        let queue: Arc<wgpu::Queue> = Arc::new(queue);

        let sobel_mod = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sobel"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sobel.wgsl").into()),
        });

        // Both entry points live in one module and share the stencil
        // arithmetic. The global path derives its bind group layout from the
        // bindings the entry point uses; the texture path needs an explicit
        // layout because R32Float is a non-filterable format and layout
        // derivation would ask for a filterable one.
        let pipe = |entry: &str, layout: Option<&wgpu::PipelineLayout>| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(entry),
                layout,
                module: &sobel_mod,
                entry_point: Some(entry),
                compilation_options: Default::default(),
                cache: None,
            })
        };

        let tex_pipeline_layout = sobel_tex_layout(&device);

        Ok(Self {
            adapter_name,
            sobel_global_pipeline: pipe("main_global", None),
            sobel_tex_pipeline: pipe("main_tex", Some(&tex_pipeline_layout)),
            device,
            queue,
        })
    }

    /// Name of the selected adapter, for diagnostics.
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    pub(crate) fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub(crate) fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    pub(crate) fn sobel_global_pipeline(&self) -> &wgpu::ComputePipeline {
        &self.sobel_global_pipeline
    }

    pub(crate) fn sobel_tex_pipeline(&self) -> &wgpu::ComputePipeline {
        &self.sobel_tex_pipeline
    }
}

/// Pipeline layout for the texture-cached gradient entry point: the
/// destination storage buffer, the uniform params, and the non-filterable
/// R32Float source texture. The unused binding 0 (the storage-buffer source)
/// is deliberately absent — only bindings the entry point uses must appear.
fn sobel_tex_layout(device: &wgpu::Device) -> wgpu::PipelineLayout {
    let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("sobel_tex"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: false },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
        ],
    });
    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("sobel_tex"),
        bind_group_layouts: &[&bind_layout],
        push_constant_ranges: &[],
    })
}

/// Block the calling thread until all submitted device work has completed.
pub(crate) fn wait_idle(device: &wgpu::Device) {
    device.poll(wgpu::PollType::wait_indefinitely()).ok();
}

/// Drain the device's pending error scope, mapping any captured error
/// through `to_err`. Scopes must have been pushed by the caller.
pub(crate) fn pop_error_scope(
    device: &wgpu::Device,
    to_err: impl Fn(String) -> ParallaxError,
) -> Result<()> {
    match pollster::block_on(device.pop_error_scope()) {
        Some(e) => Err(to_err(e.to_string())),
        None => Ok(()),
    }
}
