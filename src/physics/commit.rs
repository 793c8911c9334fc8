//! 提交接口
//!
//! 宿主引擎通过 `RigCommit` 接收合成结果；`RigRecords` 是内存/JSON 实现，
//! 同时可以反向构建 `PhysicsRig`（载入已有的刚体和关节）。

use serde::{Deserialize, Serialize};

use super::body::Body;
use super::constraint::Constraint;
use super::physics_rig::PhysicsRig;
use crate::Result;

/// 宿主引擎提交接口
pub trait RigCommit {
    fn commit_body(&mut self, body: &Body) -> Result<()>;

    fn commit_constraint(&mut self, constraint: &Constraint) -> Result<()>;

    fn commit_disabled_collision(&mut self, body_a: &str, body_b: &str) -> Result<()>;

    /// 全部记录提交完毕
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// 刚体/关节记录
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigRecords {
    pub bodies: Vec<Body>,
    pub constraints: Vec<Constraint>,
    pub disabled_collisions: Vec<(String, String)>,
}

impl RigCommit for RigRecords {
    fn commit_body(&mut self, body: &Body) -> Result<()> {
        self.bodies.push(body.clone());
        Ok(())
    }

    fn commit_constraint(&mut self, constraint: &Constraint) -> Result<()> {
        self.constraints.push(constraint.clone());
        Ok(())
    }

    fn commit_disabled_collision(&mut self, body_a: &str, body_b: &str) -> Result<()> {
        self.disabled_collisions
            .push((body_a.to_string(), body_b.to_string()));
        Ok(())
    }
}

impl RigRecords {
    /// 从记录构建物理绑定
    ///
    /// 重复的关节名称和引用不存在刚体的碰撞对会被跳过并记录警告；
    /// 关节参考帧的缩放重置为 1。
    pub fn into_rig(self) -> PhysicsRig {
        let mut rig = PhysicsRig::new();
        for body in self.bodies {
            rig.add_body(body);
        }
        for mut constraint in self.constraints {
            let name = constraint.name.clone();
            if constraint.fix_frame_scale() > 0 {
                log::info!("关节 '{}' 载入时参考帧缩放已重置", name);
            }
            if let Err(e) = rig.add_constraint(constraint) {
                log::warn!("关节 '{}' 载入失败: {}", name, e);
            }
        }
        for (a, b) in &self.disabled_collisions {
            if let Err(e) = rig.disable_collision(a, b) {
                log::warn!("碰撞禁用 '{}' - '{}' 载入失败: {}", a, b, e);
            }
        }
        rig
    }

    /// 收集一个物理绑定的全部记录
    pub fn from_rig(rig: &PhysicsRig) -> Result<Self> {
        let mut records = Self::default();
        rig.commit(&mut records)?;
        Ok(records)
    }
}
