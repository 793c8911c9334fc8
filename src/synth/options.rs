//! 合成选项
//!
//! 所有选项都可从 JSON 读取，缺省字段取 `RigConfig` 中的默认值。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::get_config;
use crate::physics::ConstraintTemplate;

/// 刚体调整选项（球体中心/半径）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustBodiesOptions {
    /// 未显式给出刚体列表时用于筛选刚体的正则
    pub match_body_pattern: String,
    /// 中心在骨骼 → 父骨骼之间的插值比例
    pub position_ratio: f32,
    /// 半径 = 比例 × 骨骼间距
    pub radius_ratio: f32,
}

impl Default for AdjustBodiesOptions {
    fn default() -> Self {
        let config = get_config();
        Self {
            match_body_pattern: String::new(),
            position_ratio: config.body_position_ratio,
            radius_ratio: config.body_radius_ratio,
        }
    }
}

/// 关节参考帧调整选项
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustConstraintsOptions {
    /// 未显式给出关节列表时用于筛选子刚体（即关节名）的正则
    pub match_child_body_pattern: String,
    /// 两个参考帧位置的混合比例
    pub position_ratio: f32,
}

impl Default for AdjustConstraintsOptions {
    fn default() -> Self {
        Self {
            match_child_body_pattern: String::new(),
            position_ratio: get_config().constraint_position_ratio,
        }
    }
}

/// 一条命名拓扑规则
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintTopologySpec {
    /// 目标刚体名称正则
    pub pattern: String,
    /// 源刚体名称正则，为空时源集 = 目标集
    pub source_pattern: Option<String>,
    /// 每个点的近邻数
    pub neighbor_count: usize,
    /// 近邻数上限
    pub max_neighbor_count: usize,
    /// 是否对镜像侧重复执行
    pub mirror: bool,

    pub add_point_to_point: bool,
    pub point_to_point: ConstraintTemplate,

    pub add_point_to_parent: bool,
    pub point_to_parent: ConstraintTemplate,

    /// 锚定骨骼 → 连接的最近点数
    pub extra_bones: BTreeMap<String, usize>,
    pub extra_bones_template: ConstraintTemplate,

    pub adjust_bodies: bool,
    pub adjust_bodies_options: AdjustBodiesOptions,
    pub adjust_constraints: bool,
    pub adjust_constraints_options: AdjustConstraintsOptions,
}

impl Default for ConstraintTopologySpec {
    fn default() -> Self {
        let config = get_config();
        Self {
            pattern: String::new(),
            source_pattern: None,
            neighbor_count: config.default_neighbor_count,
            max_neighbor_count: config.max_neighbor_count,
            mirror: true,
            add_point_to_point: false,
            point_to_point: ConstraintTemplate::soft_point(),
            add_point_to_parent: false,
            point_to_parent: ConstraintTemplate::soft_point_to_parent(),
            extra_bones: BTreeMap::new(),
            extra_bones_template: ConstraintTemplate::soft_point(),
            adjust_bodies: false,
            adjust_bodies_options: AdjustBodiesOptions::default(),
            adjust_constraints: false,
            adjust_constraints_options: AdjustConstraintsOptions::default(),
        }
    }
}

impl ConstraintTopologySpec {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
        }
    }

    /// 实际使用的近邻数（不超过上限）
    #[inline]
    pub fn effective_neighbor_count(&self) -> usize {
        self.neighbor_count.min(self.max_neighbor_count)
    }
}

/// 胸部环形/切向/根部关节选项
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConstraintOptions {
    pub add_root: bool,
    pub add_ring: bool,
    pub add_tangent: bool,
    /// 左侧核心骨骼名，右侧自动镜像
    pub core_bone: String,
    pub mirror: bool,
    pub template: ConstraintTemplate,
}

impl Default for RingConstraintOptions {
    fn default() -> Self {
        Self {
            add_root: false,
            add_ring: true,
            add_tangent: true,
            core_bone: "breast_01_l".to_string(),
            mirror: true,
            template: ConstraintTemplate::soft_point(),
        }
    }
}

/// 臀部点默认锚定骨骼连接的最近点数
const GLUTE_ANCHOR_NEIGHBORS: usize = 5;

/// 整体装配选项：各拓扑独立开关，按固定顺序执行
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigAssemblyOptions {
    pub add_glute_cores: bool,
    pub glute_cores: ConstraintTopologySpec,
    pub add_glute_spokes: bool,
    pub glute_spokes: ConstraintTopologySpec,
    pub add_glute_points: bool,
    pub glute_points: ConstraintTopologySpec,
    pub add_breast_cores: bool,
    pub breast_cores: ConstraintTopologySpec,
    pub add_breast_spokes: bool,
    pub breast_spokes: ConstraintTopologySpec,
    pub add_breast_points: bool,
    pub breast_points: ConstraintTopologySpec,
    pub add_breast_rings: bool,
    pub breast_rings: RingConstraintOptions,
}

impl Default for RigAssemblyOptions {
    fn default() -> Self {
        let mut glute_points = ConstraintTopologySpec::new(r"glute_(\d{2})_(\d{2})_(\d{2})_pt_l");
        glute_points.extra_bones.insert("thigh_l".to_string(), GLUTE_ANCHOR_NEIGHBORS);
        glute_points.extra_bones.insert("pelvis".to_string(), GLUTE_ANCHOR_NEIGHBORS);

        Self {
            add_glute_cores: false,
            glute_cores: ConstraintTopologySpec::new(r"glute_(\d{2})_l"),
            add_glute_spokes: false,
            glute_spokes: ConstraintTopologySpec::new(r"glute_(\d{2})_(\d{2})_l"),
            add_glute_points: true,
            glute_points,
            add_breast_cores: false,
            breast_cores: ConstraintTopologySpec::new(r"breast_(\d{2})_l"),
            add_breast_spokes: false,
            breast_spokes: ConstraintTopologySpec::new(r"breast_pt_(\d{2})_l"),
            add_breast_points: false,
            breast_points: ConstraintTopologySpec::new(r"breast_pt_(\d{2})_(\d{2})_l"),
            add_breast_rings: false,
            breast_rings: RingConstraintOptions::default(),
        }
    }
}

/// 刚体图元类型
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    Sphere,
    #[default]
    Capsule,
    Convex,
}

/// 单根骨骼的刚体创建参数
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyCreateParams {
    pub geometry: GeometryKind,
    /// 骨骼长度（到父骨骼距离）低于此值时不创建刚体
    pub min_bone_size: f32,
    pub mass: Option<f32>,
    pub density: Option<f32>,
}

impl Default for BodyCreateParams {
    fn default() -> Self {
        Self {
            geometry: GeometryKind::Capsule,
            min_bone_size: 0.0,
            mass: None,
            density: None,
        }
    }
}
