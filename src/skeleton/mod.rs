//! 骨骼系统 - 绑定生成的输入边界
//!
//! 核心设计思想：
//! - RigBone: 单个骨骼节点（名称、父骨骼、参考姿态、世界变换）
//! - Skeleton: 骨骼数组 + 名称索引 + 每骨骼顶点簇
//! - PoseSnapshot: 两阶段姿态采样（请求 → 稳定后读取）

mod bone;
mod bone_set;
mod pose_snapshot;

pub use bone::RigBone;
pub use bone_set::Skeleton;
pub use pose_snapshot::{PoseSnapshot, PoseSnapshotRequest, PoseSource};

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

// ============================================================================
// 公共类型定义
// ============================================================================

/// 骨骼变换数据
///
/// 列主序约定：`parent * local = world`。
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoneTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl BoneTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// 仅平移
    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// 平移 + 旋转（单位缩放）
    #[inline]
    pub fn from_rotation_translation(rotation: Quat, translation: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// 转换为 4x4 矩阵
    #[inline]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// 从矩阵分解
    #[inline]
    pub fn from_matrix(m: Mat4) -> Self {
        let (scale, rotation, translation) = m.to_scale_rotation_translation();
        Self {
            translation,
            rotation: rotation.normalize(),
            scale,
        }
    }

    /// 复合变换：先应用 `local`，再应用 `self`
    #[inline]
    pub fn mul_transform(&self, local: &BoneTransform) -> Self {
        Self::from_matrix(self.to_matrix() * local.to_matrix())
    }

    /// 逆变换
    #[inline]
    pub fn inverse(&self) -> Self {
        Self::from_matrix(self.to_matrix().inverse())
    }

    /// 将本变换表达为 `base` 空间下的相对变换
    #[inline]
    pub fn relative_to(&self, base: &BoneTransform) -> Self {
        Self::from_matrix(base.to_matrix().inverse() * self.to_matrix())
    }

    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.translation + self.rotation * (self.scale * point)
    }

    /// 世界坐标点 → 本地坐标
    #[inline]
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        self.to_matrix().inverse().transform_point3(point)
    }

    /// 缩放是否为单位缩放
    #[inline]
    pub fn has_unit_scale(&self) -> bool {
        self.scale.abs_diff_eq(Vec3::ONE, 1e-4)
    }

    /// 返回缩放重置为 1 的副本
    #[inline]
    pub fn with_unit_scale(mut self) -> Self {
        self.scale = Vec3::ONE;
        self
    }
}
