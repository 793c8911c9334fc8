//! 输入文件格式
//!
//! 骨骼按父骨骼在前的顺序给出，变换为世界空间。

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use glam::Vec3;
use serde::Deserialize;

use softbody_rig::synth::{BodyCreateParams, RigContext};
use softbody_rig::{BoneTransform, ConstraintEntry, RigAssemblyOptions, RigRecords, Skeleton};

#[derive(Debug, Deserialize)]
pub struct BoneInput {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub transform: BoneTransform,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RigInput {
    pub bones: Vec<BoneInput>,
    /// 骨骼本地空间顶点簇
    pub vertex_clusters: BTreeMap<String, Vec<Vec3>>,
    /// 已有的刚体/关节
    pub records: RigRecords,
    /// 骨骼名 → 刚体创建参数
    pub body_params: BTreeMap<String, BodyCreateParams>,
    /// 装配完成后逐条应用的关节
    pub constraints: Vec<ConstraintEntry>,
    pub options: RigAssemblyOptions,
}

impl RigInput {
    /// 构建骨架与物理绑定
    pub fn build_context(&mut self) -> Result<RigContext> {
        let mut skeleton = Skeleton::new();
        for bone in &self.bones {
            skeleton
                .add_bone(&bone.name, bone.parent.as_deref(), bone.transform)
                .with_context(|| format!("adding bone '{}'", bone.name))?;
        }
        for (name, points) in std::mem::take(&mut self.vertex_clusters) {
            if skeleton.find_bone(&name).is_none() {
                log::warn!("顶点簇 '{}' 没有对应骨骼", name);
                continue;
            }
            skeleton.set_vertex_cluster(&name, points);
        }
        let physics = std::mem::take(&mut self.records).into_rig();
        Ok(RigContext::new(skeleton, physics))
    }
}
