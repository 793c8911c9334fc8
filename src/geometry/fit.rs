//! 碰撞图元拟合
//!
//! 胶囊体：顶点簇主轴包围盒决定半径，骨骼间距决定长度。
//! 球体：骨骼与父骨骼位置插值决定中心，骨骼间距决定半径。

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::principal_axis::principal_frame;
use crate::config::get_config;
use crate::naming::{self, Side};
use crate::skeleton::{BoneTransform, Skeleton};
use crate::{Result, RigError};

/// 胶囊体长度参考骨骼
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LengthReference {
    /// 最近的子骨骼世界位置，长度 = 距离
    Child(Vec3),
    /// 父骨骼世界位置（叶骨骼），长度 = 距离 × leaf_length_ratio
    Parent(Vec3),
}

/// 胶囊体参数（骨骼本地空间）
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapsuleParams {
    pub center: Vec3,
    pub rotation: Quat,
    pub radius: f32,
    pub length: f32,
    /// 主轴坐标系下的包围盒中心
    pub box_center: Vec3,
    /// 主轴坐标系下的包围盒半边长（已做最小尺寸钳制）
    pub box_extent: Vec3,
    /// 顶点簇主轴（仅供诊断，朝向不使用）
    pub principal_axis: Vec3,
}

/// 球体参数（骨骼本地空间）
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SphereParams {
    pub center: Vec3,
    pub radius: f32,
}

/// 拟合胶囊体
///
/// 空顶点簇返回 `None`。
pub fn fit_capsule(
    bone: &BoneTransform,
    reference: LengthReference,
    vertices: &[Vec3],
    side: Side,
) -> Option<CapsuleParams> {
    if vertices.is_empty() {
        return None;
    }
    let config = get_config();

    // 主轴坐标系下的包围盒
    let frame = principal_frame(vertices, config.power_iterations);
    let frame_inv = frame.transpose();
    let (mut lo, mut hi) = (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN));
    for v in vertices {
        let p = frame_inv * *v;
        lo = lo.min(p);
        hi = hi.max(p);
    }
    let box_center = (lo + hi) * 0.5;
    let mut box_extent = (hi - lo) * 0.5;

    // 骨骼变换后的包围盒，带上骨骼缩放
    let mut t_lo = Vec3::splat(f32::MAX);
    let mut t_hi = Vec3::splat(f32::MIN);
    for i in 0..8 {
        let corner = Vec3::new(
            if i & 1 == 0 { lo.x } else { hi.x },
            if i & 2 == 0 { lo.y } else { hi.y },
            if i & 4 == 0 { lo.z } else { hi.z },
        );
        let p = bone.transform_point(corner);
        t_lo = t_lo.min(p);
        t_hi = t_hi.max(p);
    }
    let transformed_extent = (t_hi - t_lo) * 0.5;

    let min_extent = box_extent.min_element().min(transformed_extent.min_element());
    if min_extent < config.min_primitive_size {
        box_extent = Vec3::splat(config.min_primitive_size);
    }

    // 半径取两个非主导轴中较小者
    let e = box_extent;
    let radius = if e.x > e.z && e.x > e.y {
        e.y.min(e.z)
    } else if e.y > e.z && e.y > e.x {
        e.x.min(e.z)
    } else {
        e.x.min(e.y)
    } * config.capsule_radius_margin;

    let length = match reference {
        LengthReference::Child(p) => bone.translation.distance(p),
        LengthReference::Parent(p) => bone.translation.distance(p) * config.leaf_length_ratio,
    };

    // 胶囊体沿骨骼 X 轴，右侧骨骼朝反方向偏移
    let half = length * 0.5;
    let center = match side {
        Side::Right => Vec3::new(-half, 0.0, 0.0),
        _ => Vec3::new(half, 0.0, 0.0),
    };

    Some(CapsuleParams {
        center,
        // 固定旋转：本地 Z 轴转到骨骼 X 轴
        rotation: Quat::from_rotation_y(FRAC_PI_2),
        radius,
        length,
        box_center,
        box_extent,
        principal_axis: frame.z_axis,
    })
}

/// 按骨骼名称拟合胶囊体
///
/// 长度参考最近的子骨骼；叶骨骼参考父骨骼。
pub fn fit_capsule_for_bone(skeleton: &Skeleton, name: &str) -> Result<CapsuleParams> {
    let index = skeleton
        .find_bone(name)
        .ok_or_else(|| RigError::BoneNotFound(name.to_string()))?;
    let bone = skeleton
        .bone(index)
        .ok_or_else(|| RigError::BoneNotFound(name.to_string()))?;
    let vertices = skeleton
        .vertex_cluster(name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RigError::EmptyVertexCluster(name.to_string()))?;

    let origin = bone.position();
    let nearest_child = skeleton
        .children(index)
        .iter()
        .filter_map(|&c| skeleton.bone(c))
        .map(|c| c.position())
        .min_by(|a, b| origin.distance_squared(*a).total_cmp(&origin.distance_squared(*b)));

    let reference = match nearest_child {
        Some(p) => LengthReference::Child(p),
        None => {
            let parent = bone
                .parent_id()
                .and_then(|p| skeleton.bone(p))
                .ok_or_else(|| RigError::NoParentBone(name.to_string()))?;
            LengthReference::Parent(parent.position())
        }
    };

    fit_capsule(&bone.world, reference, vertices, naming::side(name))
        .ok_or_else(|| RigError::EmptyVertexCluster(name.to_string()))
}

/// 拟合球体
///
/// 中心 = 骨骼与父骨骼位置按 `position_ratio` 插值（骨骼本地空间），
/// 半径 = `radius_ratio` × 骨骼间距。
pub fn fit_sphere(
    bone: &BoneTransform,
    parent_position: Vec3,
    radius_ratio: f32,
    position_ratio: f32,
) -> SphereParams {
    let origin = bone.translation;
    let world_center = origin.lerp(parent_position, position_ratio);
    SphereParams {
        center: bone.inverse_transform_point(world_center),
        radius: radius_ratio * origin.distance(parent_position),
    }
}

/// 按骨骼名称拟合球体，根骨骼返回 `NoParentBone`
pub fn fit_sphere_for_bone(
    skeleton: &Skeleton,
    name: &str,
    radius_ratio: f32,
    position_ratio: f32,
) -> Result<SphereParams> {
    let bone = skeleton
        .bone_by_name(name)
        .ok_or_else(|| RigError::BoneNotFound(name.to_string()))?;
    let parent = bone
        .parent_id()
        .and_then(|p| skeleton.bone(p))
        .ok_or_else(|| RigError::NoParentBone(name.to_string()))?;
    Ok(fit_sphere(&bone.world, parent.position(), radius_ratio, position_ratio))
}

/// 顶点簇包围盒的外接球（骨骼本地空间）
pub fn bounding_sphere(vertices: &[Vec3]) -> Option<SphereParams> {
    let first = *vertices.first()?;
    let (lo, hi) = vertices
        .iter()
        .fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let radius = ((hi - lo) * 0.5).length().max(get_config().min_primitive_size);
    Some(SphereParams {
        center: (lo + hi) * 0.5,
        radius,
    })
}
