//! GPU-resident 2D typed pixel buffer with explicit host transfers.
//!
//! A `DeviceImage<T>` owns one pitched device allocation for its whole
//! lifetime: rows are padded to [`PITCH_ALIGNMENT`] bytes so the same buffer
//! can feed both the storage-buffer and the texture-cached read paths.
//! Host-side data is always row-major and unpadded; the pitch adjustment
//! happens on the way in and out.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::consts::PITCH_ALIGNMENT;
use crate::context::{pop_error_scope, wait_idle, DeviceContext};
use crate::error::{ParallaxError, Result};
use crate::texel::Texel;

/// A GPU-resident `width` x `height` image of element type `T`.
///
/// The allocation's lifetime is exactly the container's lifetime; no two
/// instances share an allocation (the type is not `Clone` — duplicate data
/// with [`copy`](crate::copy) instead). The pitch is fixed at construction.
///
/// Both transfer operations block the calling thread until the device work
/// has completed. The container provides no internal locking; concurrent use
/// of one image from multiple threads needs external synchronization.
#[derive(Debug)]
pub struct DeviceImage<T: Texel> {
    width: u32,
    height: u32,
    /// Byte stride between consecutive rows; >= `width * T::BYTES`.
    pitch: u32,
    buffer: wgpu::Buffer,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    _texel: PhantomData<T>,
}

impl<T: Texel> DeviceImage<T> {
    /// Allocate a pitched device buffer for `width * height` elements.
    ///
    /// # Errors
    /// [`ParallaxError::InvalidDimensions`] for a zero dimension,
    /// [`ParallaxError::Allocation`] when the device rejects the request.
    pub fn new(ctx: &DeviceContext, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ParallaxError::InvalidDimensions { width, height });
        }

        let row_bytes = width as u64 * T::BYTES as u64;
        let pitch64 = align_up(row_bytes, PITCH_ALIGNMENT as u64);
        let pitch = u32::try_from(pitch64)
            .map_err(|_| ParallaxError::Allocation(format!("row of {row_bytes} bytes is too large")))?;
        let size = pitch64 * height as u64;

        let device = Arc::clone(ctx.device());

        // wgpu reports allocation failure through error scopes rather than a
        // fallible create call; an oversized buffer trips the validation
        // scope, a genuinely exhausted device trips the out-of-memory one.
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(T::LABEL),
            size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        wait_idle(&device);
        // Pop both scopes before propagating so the scope stack stays
        // balanced on the error path.
        let validation = pop_error_scope(&device, ParallaxError::Allocation);
        let oom = pop_error_scope(&device, ParallaxError::Allocation);
        validation.and(oom)?;

        Ok(Self {
            width,
            height,
            pitch,
            buffer,
            queue: Arc::clone(ctx.queue()),
            device,
            _texel: PhantomData,
        })
    }

    /// Upload `width * height` elements of row-major, unpadded host data.
    ///
    /// Blocks until the transfer has completed on the device timeline.
    ///
    /// # Errors
    /// [`ParallaxError::Transfer`] if `host` holds fewer than
    /// `width * height` elements.
    pub fn set_dev_data(&self, host: &[T]) -> Result<()> {
        let count = self.len();
        if host.len() < count {
            return Err(ParallaxError::Transfer(format!(
                "host buffer holds {} elements, image needs {count}",
                host.len()
            )));
        }

        let row_bytes = (self.width * T::BYTES) as usize;
        let src: &[u8] = bytemuck::cast_slice(&host[..count]);
        if self.pitch as usize == row_bytes {
            self.queue.write_buffer(&self.buffer, 0, src);
        } else {
            // Re-pitch on the host: each device row is `pitch` bytes wide,
            // only the first `row_bytes` carry pixels.
            let mut staging = vec![0u8; self.pitch as usize * self.height as usize];
            for y in 0..self.height as usize {
                let s = y * row_bytes;
                let d = y * self.pitch as usize;
                staging[d..d + row_bytes].copy_from_slice(&src[s..s + row_bytes]);
            }
            self.queue.write_buffer(&self.buffer, 0, &staging);
        }

        // write_buffer stages the copy for the next submission; flush and
        // wait so the upload is complete when we return.
        self.queue.submit(std::iter::empty());
        wait_idle(&self.device);
        Ok(())
    }

    /// Download the image into `host` as row-major, unpadded data,
    /// overwriting the entire slice. Blocks until complete.
    ///
    /// # Errors
    /// [`ParallaxError::Transfer`] if `host` is not exactly
    /// `width * height` elements, or the readback mapping fails.
    pub fn get_dev_data(&self, host: &mut [T]) -> Result<()> {
        let count = self.len();
        if host.len() != count {
            return Err(ParallaxError::Transfer(format!(
                "host buffer holds {} elements, image needs {count}",
                host.len()
            )));
        }

        let size = self.pitch as u64 * self.height as u64;
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("DeviceImage::readback"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut enc = self.device.create_command_encoder(&Default::default());
        enc.copy_buffer_to_buffer(&self.buffer, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(enc.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        slice.map_async(wgpu::MapMode::Read, move |r| {
            tx.send(r).ok();
        });
        wait_idle(&self.device);
        rx.recv()
            .map_err(|_| ParallaxError::Transfer("readback channel closed".into()))?
            .map_err(|e| ParallaxError::Transfer(format!("buffer mapping failed: {e}")))?;

        let mapped = slice.get_mapped_range();
        let row_bytes = (self.width * T::BYTES) as usize;
        let dst: &mut [u8] = bytemuck::cast_slice_mut(host);
        for y in 0..self.height as usize {
            let s = y * self.pitch as usize;
            let d = y * row_bytes;
            dst[d..d + row_bytes].copy_from_slice(&mapped[s..s + row_bytes]);
        }
        drop(mapped);
        staging.unmap();
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Byte stride between consecutive device rows.
    pub fn pitch(&self) -> u32 {
        self.pitch
    }

    /// Row stride in elements of `T`. Exact because the pitch alignment is a
    /// multiple of every texel size.
    pub(crate) fn pitch_texels(&self) -> u32 {
        self.pitch / T::BYTES
    }

    /// Number of addressable pixels.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        // Construction rejects zero dimensions.
        false
    }

    pub(crate) fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub(crate) fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub(crate) fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }
}

/// Round `value` up to the next multiple of `alignment`.
#[inline]
pub(crate) const fn align_up(value: u64, alignment: u64) -> u64 {
    (value + alignment - 1) / alignment * alignment
}
