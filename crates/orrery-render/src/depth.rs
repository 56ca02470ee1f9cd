//! Depth conventions for linear-distance depth at astronomical scales.
//!
//! Body shaders write `length(viewPos) / farClip` to the fragment depth
//! instead of the projected z, so objects tens of billions of metres out
//! still order correctly. The host owns the actual depth attachment; render
//! extensions only need to agree on format, clear value, and comparison.

/// The shared depth conventions.
pub struct DepthScheme;

impl DepthScheme {
    /// 32-bit float depth for precision across the full far-clip range.
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Clear value: 1.0 is the normalised far distance.
    pub const CLEAR_VALUE: f32 = 1.0;

    /// Comparison for linear-distance depth: smaller is closer.
    pub const COMPARE_FUNCTION: wgpu::CompareFunction = wgpu::CompareFunction::LessEqual;
}
