//! 光照组件模块
//!
//! 与着色器中 `Light` 结构体布局一致的光源数据，以及示例中通用的三点光照。

use bytemuck::{Pod, Zeroable};

/// 常量缓冲区中光源槽位的数量
pub const MAX_LIGHTS: usize = 16;

/// 光源
///
/// 按 HLSL 16 字节打包规则排列：每个 `float3` 后面跟一个 `float`。
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Light {
    pub strength: [f32; 3],
    /// 点光源/聚光灯
    pub falloff_start: f32,
    /// 方向光/聚光灯
    pub direction: [f32; 3],
    /// 点光源/聚光灯
    pub falloff_end: f32,
    /// 点光源/聚光灯
    pub position: [f32; 3],
    /// 聚光灯
    pub spot_power: f32,
}

impl Light {
    /// 方向光
    pub fn directional(direction: [f32; 3], strength: [f32; 3]) -> Self {
        Self {
            direction,
            strength,
            ..Self::default()
        }
    }
}

impl Default for Light {
    fn default() -> Self {
        Self {
            strength: [0.5, 0.5, 0.5],
            falloff_start: 1.0,
            direction: [0.0, -1.0, 0.0],
            falloff_end: 10.0,
            position: [0.0, 0.0, 0.0],
            spot_power: 64.0,
        }
    }
}

/// 主光、补光、背光三盏方向光
///
/// 只有主光的强度随示例不同。
pub fn three_point_lights(key_strength: [f32; 3]) -> [Light; 3] {
    [
        Light::directional([0.57735, -0.57735, 0.57735], key_strength),
        Light::directional([-0.57735, -0.57735, 0.57735], [0.3, 0.3, 0.3]),
        Light::directional([0.0, -0.707, -0.707], [0.15, 0.15, 0.15]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_layout_matches_hlsl() {
        assert_eq!(std::mem::size_of::<Light>(), 48);
    }

    #[test]
    fn test_three_point_lights() {
        let lights = three_point_lights([0.9, 0.9, 0.8]);
        assert_eq!(lights[0].strength, [0.9, 0.9, 0.8]);
        assert_eq!(lights[1].strength, [0.3, 0.3, 0.3]);
        assert_eq!(lights[2].direction, [0.0, -0.707, -0.707]);
        assert_eq!(lights[2].falloff_end, 10.0);
    }
}
