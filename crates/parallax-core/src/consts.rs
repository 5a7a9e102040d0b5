/// Row pitch alignment (bytes) for device image allocations.
///
/// Matches wgpu's buffer-to-texture copy requirement, so a pitched buffer can
/// be handed to the texture-cached gradient path without restaging.
pub const PITCH_ALIGNMENT: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

/// Workgroup edge length for 2D gradient dispatches.
/// 16x16 = 256 invocations, within wgpu's default per-workgroup limit.
pub const WORKGROUP_DIM: u32 = 16;
