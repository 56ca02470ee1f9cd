//! GPU plumbing shared by the orrery render extensions: device initialization,
//! per-frame camera state, depth buffer, and surface texture loading.

pub mod depth;
pub mod frame;
pub mod gpu;
pub mod texture;

pub use depth::DepthScheme;
pub use frame::FrameState;
pub use gpu::{Gpu, GpuError, init_gpu_blocking};
pub use texture::{SurfaceTexture, TextureError};
