use bytemuck::{Pod, Zeroable};

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for super::Grad2 {}
}

/// Pixel element types a [`DeviceImage`](crate::DeviceImage) can hold.
///
/// Device memory layout must be known at compile time, so this is a closed
/// set: scalar `f32` and the two-channel [`Grad2`]. The trait is sealed —
/// downstream crates cannot add instantiations.
pub trait Texel: Pod + Zeroable + Send + Sync + sealed::Sealed + 'static {
    /// Bytes per element, identical on host and device.
    const BYTES: u32;
    /// Label used for wgpu resource debugging.
    const LABEL: &'static str;
}

impl Texel for f32 {
    const BYTES: u32 = 4;
    const LABEL: &'static str = "DeviceImage<f32>";
}

/// A two-channel float texel holding an (x, y) gradient sample.
///
/// `#[repr(C)]` so it is layout-compatible with WGSL's `vec2<f32>`
/// (8 bytes, no padding).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Grad2 {
    pub x: f32,
    pub y: f32,
}

impl Grad2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Texel for Grad2 {
    const BYTES: u32 = 8;
    const LABEL: &'static str = "DeviceImage<Grad2>";
}
