//! 软体物理绑定生成器
//!
//! 根据骨骼命名规则自动生成次级软体（臀部/胸部抖动骨骼链）的碰撞体和关节约束。
//!
//! 模块划分：
//! - `skeleton`: 骨骼数组、世界变换、顶点簇、姿态快照
//! - `geometry`: 主轴分析与胶囊体/球体拟合
//! - `naming`: 正则筛选与左右镜像
//! - `proximity`: 距离矩阵与 N 近邻
//! - `physics`: 刚体/关节数据模型与提交接口
//! - `synth`: 关节合成、调整、整体装配

pub mod config;
pub mod geometry;
pub mod naming;
pub mod physics;
pub mod proximity;
pub mod skeleton;
pub mod synth;

use thiserror::Error;

pub use config::{get_config, reset_config, set_config, RigConfig};
pub use physics::{
    Body, Constraint, ConstraintEntry, ConstraintTemplate, OverwriteFlags, PhysicsRig, RigCommit,
    RigRecords, Shape,
};
pub use skeleton::{BoneTransform, PoseSnapshot, PoseSnapshotRequest, RigBone, Skeleton};
pub use synth::{
    assemble_full_rig, ConstraintOutcome, ConstraintTopologySpec, RigAssemblyOptions, RigContext,
    SynthesisReport,
};

/// 绑定生成错误
///
/// 单项操作返回这些错误；批处理只记录到 [`SynthesisReport`]，不会中断。
#[derive(Debug, Error)]
pub enum RigError {
    #[error("bone '{0}' not found in skeleton")]
    BoneNotFound(String),

    #[error("body '{0}' not found in physics rig")]
    BodyNotFound(String),

    #[error("constraint '{0}' not found in physics rig")]
    ConstraintNotFound(String),

    #[error("bone '{0}' has no parent bone")]
    NoParentBone(String),

    #[error("bone '{0}' has no vertex data")]
    EmptyVertexCluster(String),

    #[error("invalid name pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    #[error("pose snapshot not settled, {remaining_ms} ms remaining")]
    PoseNotSettled { remaining_ms: u128 },

    #[error("pose has {got} bones, skeleton has {expected}")]
    PoseSizeMismatch { expected: usize, got: usize },
}

/// 结果类型
pub type Result<T> = std::result::Result<T, RigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RigError::BodyNotFound("glute_01_l".to_string());
        assert!(format!("{err}").contains("glute_01_l"));

        let err = RigError::PoseNotSettled { remaining_ms: 250 };
        assert!(format!("{err}").contains("250"));

        let err: RigError = regex::Regex::new("(").unwrap_err().into();
        assert!(matches!(err, RigError::InvalidPattern(_)));
    }
}
