pub mod consts;
pub mod context;
pub mod copy;
pub mod error;
pub mod image;
pub mod sobel;
pub mod texel;

pub use context::DeviceContext;
pub use copy::copy;
pub use error::{ParallaxError, Result};
pub use image::DeviceImage;
pub use sobel::{sobel, sobel_tex};
pub use texel::{Grad2, Texel};
