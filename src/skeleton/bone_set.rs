//! 骨骼集合
//!
//! 管理骨骼层次结构、名称索引以及每骨骼的顶点簇。
//! 骨骼按父先子后的顺序存储，世界变换按索引顺序一次更新即可。

use std::collections::HashMap;

use glam::Vec3;

use super::bone::RigBone;
use super::pose_snapshot::PoseSnapshot;
use super::BoneTransform;
use crate::{Result, RigError};

/// 骨骼集合
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    bones: Vec<RigBone>,
    name_to_index: HashMap<String, usize>,
    /// 子骨骼缓存（按父骨骼索引）
    children_cache: Vec<Vec<usize>>,
    /// 每骨骼顶点簇（骨骼本地空间）
    vertex_clusters: HashMap<String, Vec<Vec3>>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加骨骼（世界变换）
    ///
    /// 父骨骼必须已存在；同名骨骼会被拒绝。
    pub fn add_bone(
        &mut self,
        name: &str,
        parent: Option<&str>,
        world: BoneTransform,
    ) -> Result<usize> {
        if self.name_to_index.contains_key(name) {
            return Err(RigError::DegenerateInput(format!("duplicate bone name '{name}'")));
        }
        let parent_index = match parent {
            Some(parent_name) => Some(
                self.find_bone(parent_name)
                    .ok_or_else(|| RigError::BoneNotFound(parent_name.to_string()))?,
            ),
            None => None,
        };

        let index = self.bones.len();
        let mut bone = RigBone::new(name.to_string());
        bone.world = world;
        bone.reference_local = match parent_index {
            Some(p) => world.relative_to(&self.bones[p].world),
            None => world,
        };
        if let Some(p) = parent_index {
            bone.parent_index = p as i32;
            self.bones[p].is_leaf = false;
            self.children_cache[p].push(index);
        }

        self.bones.push(bone);
        self.children_cache.push(Vec::new());
        self.name_to_index.insert(name.to_string(), index);
        Ok(index)
    }

    /// 添加骨骼（相对父骨骼的本地变换）
    pub fn add_bone_local(
        &mut self,
        name: &str,
        parent: Option<&str>,
        local: BoneTransform,
    ) -> Result<usize> {
        let world = match parent {
            Some(parent_name) => {
                let p = self
                    .find_bone(parent_name)
                    .ok_or_else(|| RigError::BoneNotFound(parent_name.to_string()))?;
                self.bones[p].world.mul_transform(&local)
            }
            None => local,
        };
        let index = self.add_bone(name, parent, world)?;
        self.bones[index].reference_local = local;
        Ok(index)
    }

    // ========================================
    // 查询
    // ========================================

    /// 通过名称查找骨骼索引
    #[inline]
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    #[inline]
    pub fn bone(&self, index: usize) -> Option<&RigBone> {
        self.bones.get(index)
    }

    #[inline]
    pub fn bone_by_name(&self, name: &str) -> Option<&RigBone> {
        self.find_bone(name).map(|i| &self.bones[i])
    }

    #[inline]
    pub fn bones(&self) -> &[RigBone] {
        &self.bones
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// 所有骨骼名称（存储顺序）
    pub fn bone_names(&self) -> Vec<String> {
        self.bones.iter().map(|b| b.name.clone()).collect()
    }

    /// 父骨骼名称
    pub fn parent_name(&self, name: &str) -> Option<&str> {
        let bone = self.bone_by_name(name)?;
        bone.parent_id().map(|p| self.bones[p].name.as_str())
    }

    /// 直接子骨骼索引
    #[inline]
    pub fn children(&self, index: usize) -> &[usize] {
        self.children_cache.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 世界变换
    #[inline]
    pub fn world_transform(&self, name: &str) -> Option<BoneTransform> {
        self.bone_by_name(name).map(|b| b.world)
    }

    /// 世界位置
    #[inline]
    pub fn position(&self, name: &str) -> Option<Vec3> {
        self.bone_by_name(name).map(|b| b.position())
    }

    // ========================================
    // 顶点簇
    // ========================================

    /// 设置骨骼顶点簇（骨骼本地空间）
    pub fn set_vertex_cluster(&mut self, name: &str, positions: Vec<Vec3>) {
        self.vertex_clusters.insert(name.to_string(), positions);
    }

    /// 获取骨骼顶点簇
    pub fn vertex_cluster(&self, name: &str) -> Option<&[Vec3]> {
        self.vertex_clusters.get(name).map(|v| v.as_slice())
    }

    // ========================================
    // 参考姿态
    // ========================================

    /// 采样当前参考姿态（相对父骨骼）
    pub fn reference_pose(&self) -> Vec<BoneTransform> {
        self.bones.iter().map(|b| b.reference_local).collect()
    }

    /// 写入新的参考姿态并重算世界变换
    ///
    /// 骨骼数不一致时保持当前姿态不变。
    pub fn apply_reference_pose(&mut self, snapshot: &PoseSnapshot) -> Result<()> {
        let locals = snapshot.local_transforms();
        if locals.len() != self.bones.len() {
            log::warn!(
                "姿态骨骼数 {} 与骨架 {} 不一致，保留当前姿态",
                locals.len(),
                self.bones.len()
            );
            return Err(RigError::PoseSizeMismatch {
                expected: self.bones.len(),
                got: locals.len(),
            });
        }
        for (bone, local) in self.bones.iter_mut().zip(locals) {
            bone.reference_local = *local;
        }
        self.update_world_transforms();
        Ok(())
    }

    /// 按存储顺序（父先子后）更新世界变换
    fn update_world_transforms(&mut self) {
        for idx in 0..self.bones.len() {
            let world = match self.bones[idx].parent_id() {
                Some(p) => self.bones[p].world.mul_transform(&self.bones[idx].reference_local),
                None => self.bones[idx].reference_local,
            };
            self.bones[idx].world = world;
        }
    }
}
