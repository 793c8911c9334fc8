//! 绑定合成 - 在骨架与物理绑定上生成关节拓扑
//!
//! 核心设计思想：
//! - RigContext: 骨架（只读输入）+ 物理绑定（输出），所有操作都在同一上下文上进行
//! - synthesizer: 单个关节的创建/更新，批处理只记录失败
//! - assembler: 按命名拓扑规则选择刚体、建近邻图、生成关节
//! - rings / bodies / adjust: 胸部环形关节、刚体创建、球体与参考帧调整

mod adjust;
mod assembler;
mod bodies;
mod options;
mod report;
mod rings;
mod synthesizer;

pub use adjust::{adjust_bodies, adjust_constraints, adjust_point_body, align_constraint};
pub use assembler::{
    add_anchor_constraints, add_closest_point_constraints, add_point_to_parent, apply_topology,
    assemble_full_rig, TopologyStage,
};
pub use bodies::{align_capsules_to_bones, create_bodies};
pub use options::{
    AdjustBodiesOptions, AdjustConstraintsOptions, BodyCreateParams, ConstraintTopologySpec,
    GeometryKind, RigAssemblyOptions, RingConstraintOptions,
};
pub use report::{ConstraintOutcome, SynthesisReport};
pub use rings::add_ring_constraints;
pub use synthesizer::{
    apply_all, apply_template, copy_constraints, drive_strength, fix_constraint_scale,
    make_or_update_constraint, mirror_constraints, scale_templates_by_mass,
};

use crate::physics::PhysicsRig;
use crate::proximity::NamedPoint;
use crate::skeleton::Skeleton;

/// 合成上下文
#[derive(Clone, Debug, Default)]
pub struct RigContext {
    pub skeleton: Skeleton,
    pub physics: PhysicsRig,
}

impl RigContext {
    pub fn new(skeleton: Skeleton, physics: PhysicsRig) -> Self {
        Self { skeleton, physics }
    }

    /// 按名称取骨骼世界位置
    ///
    /// 返回 (找到的点, 骨架中缺失的名称)。
    pub fn named_points(&self, names: &[String]) -> (Vec<NamedPoint>, Vec<String>) {
        let mut points = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.skeleton.position(name) {
                Some(p) => points.push(NamedPoint::new(name.as_str(), p)),
                None => missing.push(name.clone()),
            }
        }
        (points, missing)
    }
}
