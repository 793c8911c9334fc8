//! 绑定生成配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。
//! 全局配置只为各选项结构提供默认值，不保存任何绑定状态。

use once_cell::sync::Lazy;
use std::sync::RwLock;
use std::time::Duration;

/// 绑定生成配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct RigConfig {
    // ========== 形状拟合 ==========
    /// 最小图元尺寸，默认 0.5
    /// 包围盒最小边低于此值时三个轴全部替换为此值
    pub min_primitive_size: f32,
    /// 胶囊体半径安全系数，默认 1.01
    pub capsule_radius_margin: f32,
    /// 叶骨骼胶囊长度 = 到父骨骼距离 × 此比例，默认 2/3
    pub leaf_length_ratio: f32,
    /// 幂迭代次数，默认 32
    pub power_iterations: usize,

    // ========== 近邻搜索 ==========
    /// 默认近邻数，默认 3
    pub default_neighbor_count: usize,
    /// 最大近邻数，默认 5
    pub max_neighbor_count: usize,
    /// 锚定骨骼默认近邻数，默认 3
    pub default_extra_bone_neighbors: usize,

    // ========== 关节默认参数 ==========
    /// 线性限制距离，默认 1.0
    pub default_linear_limit: f32,
    /// 驱动阻尼比（阻尼 = 强度 × 比例），默认 0.025
    pub default_damping_ratio: f32,
    /// 角度限制（度），默认 45
    pub default_angular_limit_deg: f32,
    /// 驱动强度质量倍数，默认 10000
    pub default_mass_multiplier: f32,

    // ========== 调整 ==========
    /// 刚体位置插值比例，默认 0.3
    pub body_position_ratio: f32,
    /// 刚体半径比例，默认 0.3
    pub body_radius_ratio: f32,
    /// 关节位置混合比例，默认 0.3
    pub constraint_position_ratio: f32,

    // ========== 质量 ==========
    /// 无显式质量时的密度（质量/体积），默认 0.001
    pub default_density: f32,

    // ========== 姿态 ==========
    /// 姿态快照稳定等待时间，默认 3 秒
    pub pose_settle_delay: Duration,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            // ====== 形状拟合 ======
            min_primitive_size: 0.5,
            capsule_radius_margin: 1.01,
            leaf_length_ratio: 2.0 / 3.0,
            power_iterations: 32,

            // ====== 近邻搜索 ======
            // 邻居数很小（3~5），插入排序足够
            default_neighbor_count: 3,
            max_neighbor_count: 5,
            default_extra_bone_neighbors: 3,

            // ====== 关节默认参数 ======
            default_linear_limit: 1.0,
            default_damping_ratio: 0.025,
            default_angular_limit_deg: 45.0,
            default_mass_multiplier: 10000.0,

            // ====== 调整 ======
            body_position_ratio: 0.3,
            body_radius_ratio: 0.3,
            constraint_position_ratio: 0.3,

            // ====== 质量 ======
            default_density: 0.001,

            // ====== 姿态 ======
            // 等待宿主动画姿态传播完成
            pose_settle_delay: Duration::from_secs(3),
        }
    }
}

/// 全局配置实例
static RIG_CONFIG: Lazy<RwLock<RigConfig>> = Lazy::new(|| RwLock::new(RigConfig::default()));

/// 获取当前配置（只读）
pub fn get_config() -> RigConfig {
    RIG_CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 手动设置配置
pub fn set_config(config: RigConfig) {
    *RIG_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    *RIG_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = RigConfig::default();
}
