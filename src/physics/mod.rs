//! 物理数据模型 - 刚体、关节、参数模板
//!
//! 这里只保存合成结果，不做任何模拟；结果通过 `RigCommit` 交给宿主引擎。

mod body;
mod commit;
mod constraint;
mod physics_rig;
mod template;

pub use body::{Body, Shape};
pub use commit::{RigCommit, RigRecords};
pub use constraint::{
    AngularDrive, AngularDriveMode, AngularLimits, AngularMotion, Constraint, ConstraintFrame,
    LinearDrive, LinearLimits, LinearMotion,
};
pub use physics_rig::PhysicsRig;
pub use template::{ConstraintEntry, ConstraintTemplate, OverwriteFlags};
