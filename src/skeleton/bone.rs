//! 骨骼节点
//!
//! RigBone 是骨骼数组的基本单元。父子关系用索引表示（-1 为根），
//! 名称查找由 Skeleton 负责。

use glam::{Quat, Vec3};

use super::BoneTransform;

/// 骨骼节点
///
/// - 静态数据：名称、父骨骼索引、参考姿态（相对父骨骼）
/// - 派生数据：世界变换（由 Skeleton 统一更新）
#[derive(Clone, Debug)]
pub struct RigBone {
    /// 骨骼名称（全局唯一）
    pub name: String,

    /// 父骨骼索引 (-1 表示根骨骼)
    pub parent_index: i32,

    /// 参考姿态（相对父骨骼）
    pub reference_local: BoneTransform,

    /// 世界变换
    pub world: BoneTransform,

    /// 是否为叶节点
    pub(crate) is_leaf: bool,
}

impl RigBone {
    /// 创建新骨骼
    pub fn new(name: String) -> Self {
        Self {
            name,
            parent_index: -1,
            reference_local: BoneTransform::IDENTITY,
            world: BoneTransform::IDENTITY,
            is_leaf: true,
        }
    }

    /// 父骨骼索引
    #[inline]
    pub fn parent_id(&self) -> Option<usize> {
        if self.parent_index >= 0 {
            Some(self.parent_index as usize)
        } else {
            None
        }
    }

    /// 是否为根骨骼
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent_index < 0
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    /// 获取世界位置
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.world.translation
    }

    /// 获取世界旋转
    #[inline]
    pub fn rotation(&self) -> Quat {
        self.world.rotation
    }
}

impl Default for RigBone {
    fn default() -> Self {
        Self::new(String::new())
    }
}
