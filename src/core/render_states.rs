//! Render state configurations
//!
//! Cull and depth state of the depth-only shadow pass, plus the snapshot
//! a pass takes of the caller's state so it can be restored afterwards.

use crate::renderer::shadow::TargetHandle;

/// Cull mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullState {
    /// No culling.
    None,
    /// Cull front faces.
    Front,
    /// Cull back faces.
    #[default]
    Back,
}

impl CullState {
    /// Convert to wgpu cull mode.
    pub fn to_wgpu(&self) -> Option<wgpu::Face> {
        match self {
            CullState::None => None,
            CullState::Front => Some(wgpu::Face::Front),
            CullState::Back => Some(wgpu::Face::Back),
        }
    }
}

/// Depth test configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthState {
    /// Whether to write to the depth buffer.
    pub write: bool,
    /// Comparison function for depth test.
    pub compare: wgpu::CompareFunction,
    /// Constant bias in depth units.
    pub bias_constant: i32,
    /// Bias scaled by the polygon's depth slope.
    pub bias_slope: f32,
}

impl DepthState {
    /// Depth testing enabled with writes.
    pub fn read_write() -> Self {
        Self {
            write: true,
            compare: wgpu::CompareFunction::Less,
            bias_constant: 0,
            bias_slope: 0.0,
        }
    }

    /// Depth testing disabled.
    pub fn disabled() -> Self {
        Self {
            write: false,
            compare: wgpu::CompareFunction::Always,
            ..Self::read_write()
        }
    }

    /// Depth writes with a slope bias, for open geometry whose back faces
    /// land in the shadow map.
    pub fn biased(slope: f32) -> Self {
        Self {
            bias_constant: 1,
            bias_slope: slope,
            ..Self::read_write()
        }
    }

    /// Convert to wgpu depth stencil state.
    pub fn to_wgpu(&self, format: wgpu::TextureFormat) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format,
            depth_write_enabled: self.write,
            depth_compare: self.compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState {
                constant: self.bias_constant,
                slope_scale: self.bias_slope,
                clamp: 0.0,
            },
        }
    }
}

impl Default for DepthState {
    fn default() -> Self {
        Self::read_write()
    }
}

/// Pipeline state visible to the caller of a depth pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStateSnapshot {
    pub cull: CullState,
    pub depth: DepthState,
    /// Bound render target; `None` for the main framebuffer.
    pub target: Option<TargetHandle>,
    pub viewport: (u32, u32),
}

impl Default for RenderStateSnapshot {
    fn default() -> Self {
        Self {
            cull: CullState::Back,
            depth: DepthState::read_write(),
            target: None,
            viewport: (0, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgpu_conversion() {
        assert_eq!(CullState::None.to_wgpu(), None);
        assert_eq!(CullState::Back.to_wgpu(), Some(wgpu::Face::Back));

        let state = DepthState::biased(2.0).to_wgpu(wgpu::TextureFormat::Depth32Float);
        assert!(state.depth_write_enabled);
        assert_eq!(state.bias.slope_scale, 2.0);
        assert!(!DepthState::disabled().write);
    }
}
