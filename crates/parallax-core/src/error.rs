use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParallaxError {
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("device allocation failed: {0}")]
    Allocation(String),

    #[error("host transfer failed: {0}")]
    Transfer(String),

    #[error("dimension mismatch: source is {src_width}x{src_height}, destination is {dst_width}x{dst_height}")]
    DimensionMismatch {
        src_width: u32,
        src_height: u32,
        dst_width: u32,
        dst_height: u32,
    },

    #[error("source and destination are the same image")]
    AliasedImages,

    #[error("device execution failed: {0}")]
    Execution(String),

    #[error("GPU device error: {0}")]
    Device(String),
}

pub type Result<T> = std::result::Result<T, ParallaxError>;
