use ndarray::Array2;

use parallax_core::DeviceContext;

/// Acquire a device context, or skip the calling test when the machine has
/// no usable adapter (headless CI). A software adapter is good enough —
/// every operation under test is compute-only.
pub fn gpu_context() -> Option<DeviceContext> {
    match DeviceContext::new() {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            eprintln!("skipping GPU test: {e}");
            None
        }
    }
}

/// Deterministic non-constant test image with values in [0, 1).
pub fn test_pattern(h: usize, w: usize) -> Array2<f32> {
    Array2::from_shape_fn((h, w), |(r, c)| ((c * 31 + r * 17) % 97) as f32 / 97.0)
}

/// CPU reference Scharr operator, 1/32-normalized, matching the device
/// kernels' term grouping. Border pixels are left zero — the stencil is
/// defined on interior pixels only.
pub fn scharr_reference(data: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
    let (h, w) = data.dim();
    let mut gx = Array2::<f32>::zeros((h, w));
    let mut gy = Array2::<f32>::zeros((h, w));

    for row in 1..h - 1 {
        for col in 1..w - 1 {
            let n = [
                data[[row - 1, col - 1]],
                data[[row - 1, col]],
                data[[row - 1, col + 1]],
                data[[row, col - 1]],
                data[[row, col]],
                data[[row, col + 1]],
                data[[row + 1, col - 1]],
                data[[row + 1, col]],
                data[[row + 1, col + 1]],
            ];
            gx[[row, col]] = ((-3.0 * n[0] + 3.0 * n[2])
                + (-10.0 * n[3] + 10.0 * n[5])
                + (-3.0 * n[6] + 3.0 * n[8]))
                / 32.0;
            gy[[row, col]] = ((-3.0 * n[0] - 10.0 * n[1] - 3.0 * n[2])
                + (3.0 * n[6] + 10.0 * n[7] + 3.0 * n[8]))
                / 32.0;
        }
    }
    (gx, gy)
}
