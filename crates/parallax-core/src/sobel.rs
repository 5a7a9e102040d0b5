//! Scharr-weighted gradient kernels.
//!
//! Two independent device implementations of the same 3x3 stencil: a
//! storage-buffer path ([`sobel`]) and a texture-cached path
//! ([`sobel_tex`]). The stencil arithmetic lives once in
//! `shaders/sobel.wgsl`; the entry points differ only in how the source
//! neighborhood is read, so the paths cannot drift apart numerically.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::consts::WORKGROUP_DIM;
use crate::context::{pop_error_scope, wait_idle, DeviceContext};
use crate::copy::check_dimensions;
use crate::error::{ParallaxError, Result};
use crate::image::DeviceImage;
use crate::texel::Grad2;

// Must match the WGSL `Params` layout exactly.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SobelParams {
    width: u32,
    height: u32,
    /// Source row stride, in f32 texels.
    src_pitch: u32,
    /// Destination row stride, in vec2<f32> texels.
    dst_pitch: u32,
}

#[derive(Clone, Copy, Debug)]
enum ReadPath {
    Global,
    Texture,
}

/// Compute the 1/32-normalized Scharr gradient of `src` into `dst`, reading
/// neighbor pixels directly from the source's pitched device allocation.
///
/// Every interior pixel `(1..=w-2, 1..=h-2)` receives `(gx, gy)`; the
/// one-pixel border is written as zero. Output is a pure function of the
/// input — each invocation computes one pixel and only reads its neighbors.
/// Blocks until the kernel has completed.
///
/// # Errors
/// [`ParallaxError::DimensionMismatch`] before any device work when the
/// images disagree in size; [`ParallaxError::Execution`] if the launch
/// fails, leaving `dst` unspecified.
pub fn sobel(ctx: &DeviceContext, src: &DeviceImage<f32>, dst: &DeviceImage<Grad2>) -> Result<()> {
    run_sobel(ctx, src, dst, ReadPath::Global)
}

/// Identical result and domain as [`sobel`], but neighbor reads go through a
/// hardware texture binding over the source data instead of direct
/// addressing — better read locality for the 3x3 stencil.
///
/// The binding is scoped strictly to this call: the transient texture is
/// released on every exit path, including launch failure, so no hardware
/// resource stays bound to an allocation that may be mutated later.
pub fn sobel_tex(
    ctx: &DeviceContext,
    src: &DeviceImage<f32>,
    dst: &DeviceImage<Grad2>,
) -> Result<()> {
    run_sobel(ctx, src, dst, ReadPath::Texture)
}

fn run_sobel(
    ctx: &DeviceContext,
    src: &DeviceImage<f32>,
    dst: &DeviceImage<Grad2>,
    path: ReadPath,
) -> Result<()> {
    check_dimensions(src, dst)?;

    let (w, h) = (src.width(), src.height());
    tracing::debug!("sobel dispatch ({path:?}): {w}x{h}");

    let device = ctx.device();
    let params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("sobel params"),
        contents: bytemuck::bytes_of(&SobelParams {
            width: w,
            height: h,
            src_pitch: src.pitch_texels(),
            dst_pitch: dst.pitch_texels(),
        }),
        usage: wgpu::BufferUsages::UNIFORM,
    });

    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let mut enc = device.create_command_encoder(&Default::default());

    // The texture path stages the source into a transient R32Float texture.
    // The image's pitch satisfies wgpu's bytes_per_row alignment, so the
    // pitched buffer is consumed directly. Dropping the texture at the end
    // of this function releases the binding on every exit path.
    let texture = match path {
        ReadPath::Global => None,
        ReadPath::Texture => {
            let extent = wgpu::Extent3d {
                width: w,
                height: h,
                depth_or_array_layers: 1,
            };
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("sobel source"),
                size: extent,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::R32Float,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            enc.copy_buffer_to_texture(
                wgpu::TexelCopyBufferInfo {
                    buffer: src.buffer(),
                    layout: wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(src.pitch()),
                        rows_per_image: Some(h),
                    },
                },
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                extent,
            );
            Some(texture)
        }
    };

    let pipeline = match path {
        ReadPath::Global => ctx.sobel_global_pipeline(),
        ReadPath::Texture => ctx.sobel_tex_pipeline(),
    };

    // Each pipeline's layout contains only the bindings its entry point
    // uses, so the two paths build different bind groups.
    let view;
    let entries: Vec<wgpu::BindGroupEntry> = match &texture {
        None => vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: src.buffer().as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: dst.buffer().as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: params.as_entire_binding(),
            },
        ],
        Some(texture) => {
            view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            vec![
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: dst.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
            ]
        }
    };

    let layout = pipeline.get_bind_group_layout(0);
    let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: None,
        layout: &layout,
        entries: &entries,
    });

    {
        let mut pass = enc.begin_compute_pass(&Default::default());
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bg, &[]);
        pass.dispatch_workgroups(div_ceil(w, WORKGROUP_DIM), div_ceil(h, WORKGROUP_DIM), 1);
    }
    ctx.queue().submit(std::iter::once(enc.finish()));
    wait_idle(device);

    // Pop both scopes even if the first one captured an error.
    let validation = pop_error_scope(device, ParallaxError::Execution);
    let oom = pop_error_scope(device, ParallaxError::Execution);
    validation.and(oom)
}

const fn div_ceil(a: u32, b: u32) -> u32 {
    (a + b - 1) / b
}
