//! 采样器状态
//!
//! 与图形 API 无关的采样器描述，D3D12 层负责转换为
//! `D3D12_SAMPLER_DESC` / `D3D12_STATIC_SAMPLER_DESC`。

/// 动态采样器的最大各向异性
pub const MAX_ANISOTROPY: u32 = 16;

/// 静态各向异性采样器使用的各向异性
pub const STATIC_ANISOTROPY: u32 = 8;

/// Border 寻址模式的边框颜色
pub const BORDER_COLOR: [f32; 4] = [1.0, 1.0, 0.0, 1.0];

/// 过滤方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    #[default]
    Point,
    Linear,
    Anisotropic,
}

/// 纹理寻址方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    #[default]
    Wrap,
    Clamp,
    Border,
    Mirror,
}

/// 运行时可切换的采样器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerSettings {
    filter: FilterMode,
    address: AddressMode,
    dirty: bool,
}

impl Default for SamplerSettings {
    /// 点采样 + Wrap；初始为脏，第一帧会创建描述符
    fn default() -> Self {
        Self {
            filter: FilterMode::Point,
            address: AddressMode::Wrap,
            dirty: true,
        }
    }
}

impl SamplerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn address(&self) -> AddressMode {
        self.address
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// 只有值真正改变时才标记为脏
    pub fn set_filter(&mut self, filter: FilterMode) {
        if self.filter != filter {
            self.filter = filter;
            self.dirty = true;
        }
    }

    pub fn set_address(&mut self, address: AddressMode) {
        if self.address != address {
            self.address = address;
            self.dirty = true;
        }
    }

    /// 返回是否需要重建采样器描述符，并清除脏标记
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

/// 静态采样器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticSampler {
    /// 着色器寄存器 `s{register}`
    pub register: u32,
    pub filter: FilterMode,
    pub address: AddressMode,
    pub max_anisotropy: u32,
}

/// 混合示例根签名中的 6 个静态采样器，寄存器 s0..s5
///
/// | 寄存器 | 过滤 | 寻址 |
/// |--------|------|------|
/// | s0 | Point | Wrap |
/// | s1 | Point | Clamp |
/// | s2 | Linear | Wrap |
/// | s3 | Linear | Clamp |
/// | s4 | Anisotropic | Wrap |
/// | s5 | Anisotropic | Clamp |
pub fn static_samplers() -> [StaticSampler; 6] {
    let filters = [FilterMode::Point, FilterMode::Linear, FilterMode::Anisotropic];
    let addresses = [AddressMode::Wrap, AddressMode::Clamp];

    let mut samplers = [StaticSampler {
        register: 0,
        filter: FilterMode::Point,
        address: AddressMode::Wrap,
        max_anisotropy: STATIC_ANISOTROPY,
    }; 6];

    for (register, sampler) in samplers.iter_mut().enumerate() {
        sampler.register = register as u32;
        sampler.filter = filters[register / 2];
        sampler.address = addresses[register % 2];
    }

    samplers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_point_wrap_and_dirty() {
        let mut sampler = SamplerSettings::new();
        assert_eq!(sampler.filter(), FilterMode::Point);
        assert_eq!(sampler.address(), AddressMode::Wrap);
        assert!(sampler.take_dirty());
        assert!(!sampler.take_dirty());
    }

    #[test]
    fn test_unchanged_value_stays_clean() {
        let mut sampler = SamplerSettings::new();
        sampler.take_dirty();

        sampler.set_filter(FilterMode::Point);
        sampler.set_address(AddressMode::Wrap);
        assert!(!sampler.is_dirty());

        sampler.set_address(AddressMode::Border);
        assert!(sampler.is_dirty());
        assert!(sampler.take_dirty());

        sampler.set_filter(FilterMode::Anisotropic);
        assert!(sampler.take_dirty());
        assert_eq!(sampler.filter(), FilterMode::Anisotropic);
        assert_eq!(sampler.address(), AddressMode::Border);
    }

    #[test]
    fn test_static_samplers() {
        let samplers = static_samplers();
        assert_eq!(samplers[0].filter, FilterMode::Point);
        assert_eq!(samplers[1].address, AddressMode::Clamp);
        assert_eq!(samplers[2].filter, FilterMode::Linear);
        assert_eq!(samplers[4].filter, FilterMode::Anisotropic);
        assert_eq!(samplers[5].address, AddressMode::Clamp);
        assert!(samplers.iter().enumerate().all(|(i, s)| s.register == i as u32));
        assert!(samplers.iter().all(|s| s.max_anisotropy == STATIC_ANISOTROPY));
    }
}
