pub mod buffer_pool;
pub mod compositor;

pub use buffer_pool::BufferPool;
pub use compositor::{normalize, render, Compositor, PixelBuffer};
