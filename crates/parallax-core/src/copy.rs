//! Device-to-device image duplication.

use crate::context::{pop_error_scope, wait_idle};
use crate::error::{ParallaxError, Result};
use crate::image::DeviceImage;
use crate::texel::Texel;

/// Copy every pixel of `src` into `dst`.
///
/// Both images must have identical dimensions (the element type is enforced
/// by the signature). The transfer stays on the device and respects each
/// image's own pitch — pitches are not assumed equal. On success `dst` is
/// bit-identical to `src` for all `width * height` elements and `src` is
/// untouched. Blocks until the copy has completed.
///
/// # Errors
/// [`ParallaxError::AliasedImages`] when `src` and `dst` are the same image,
/// [`ParallaxError::DimensionMismatch`] when their dimensions differ; in both
/// cases no device work is issued. [`ParallaxError::Execution`] if the
/// device rejects the copy, in which case `dst`'s contents are unspecified.
pub fn copy<T: Texel>(src: &DeviceImage<T>, dst: &DeviceImage<T>) -> Result<()> {
    if std::ptr::eq(src, dst) {
        return Err(ParallaxError::AliasedImages);
    }
    check_dimensions(src, dst)?;

    let device = src.device();
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let mut enc = device.create_command_encoder(&Default::default());
    if src.pitch() == dst.pitch() {
        enc.copy_buffer_to_buffer(
            src.buffer(),
            0,
            dst.buffer(),
            0,
            src.pitch() as u64 * src.height() as u64,
        );
    } else {
        // Row-by-row, each side addressed by its own pitch.
        let row_bytes = (src.width() * T::BYTES) as u64;
        for y in 0..src.height() as u64 {
            enc.copy_buffer_to_buffer(
                src.buffer(),
                y * src.pitch() as u64,
                dst.buffer(),
                y * dst.pitch() as u64,
                row_bytes,
            );
        }
    }
    src.queue().submit(std::iter::once(enc.finish()));
    wait_idle(device);
    pop_error_scope(device, ParallaxError::Execution)
}

pub(crate) fn check_dimensions<A: Texel, B: Texel>(
    src: &DeviceImage<A>,
    dst: &DeviceImage<B>,
) -> Result<()> {
    if src.width() != dst.width() || src.height() != dst.height() {
        return Err(ParallaxError::DimensionMismatch {
            src_width: src.width(),
            src_height: src.height(),
            dst_width: dst.width(),
            dst_height: dst.height(),
        });
    }
    Ok(())
}
