//! 刚体与关节调整
//!
//! 刚体：球体中心放到骨骼与父骨骼之间，半径按骨骼间距缩放。
//! 关节：两个参考帧位置向共同的混合点靠拢，再以该点为原点重新表达。

use glam::Vec3;

use super::options::{AdjustBodiesOptions, AdjustConstraintsOptions};
use super::RigContext;
use crate::geometry::fit_sphere_for_bone;
use crate::naming::filter_names;
use crate::physics::{ConstraintFrame, Shape};
use crate::skeleton::BoneTransform;
use crate::{Result, RigError};

/// 调整单个点刚体
///
/// 刚体的图元被替换为按比例插值得到的球体。
pub fn adjust_point_body(ctx: &mut RigContext, name: &str, options: &AdjustBodiesOptions) -> Result<()> {
    if ctx.physics.find_body(name).is_none() {
        return Err(RigError::BodyNotFound(name.to_string()));
    }
    let sphere = fit_sphere_for_bone(&ctx.skeleton, name, options.radius_ratio, options.position_ratio)?;

    let body = ctx
        .physics
        .body_mut(name)
        .ok_or_else(|| RigError::BodyNotFound(name.to_string()))?;
    body.set_shape(Shape::Sphere {
        center: sphere.center,
        radius: sphere.radius,
    });
    log::debug!("刚体 '{}': 中心 {:?}, 半径 {:.3}", name, sphere.center, sphere.radius);
    Ok(())
}

/// 批量调整刚体，返回成功调整的数量
///
/// `names` 为空时按 `match_body_pattern` 筛选全部刚体。
pub fn adjust_bodies(ctx: &mut RigContext, options: &AdjustBodiesOptions, names: &[String]) -> usize {
    let names = match resolve_names(ctx, names, &options.match_body_pattern) {
        Ok(names) => names,
        Err(e) => {
            log::warn!("刚体调整跳过: {}", e);
            return 0;
        }
    };

    let mut adjusted = 0;
    for name in &names {
        match adjust_point_body(ctx, name, options) {
            Ok(()) => adjusted += 1,
            Err(e) => log::warn!("刚体 '{}' 调整失败: {}", name, e),
        }
    }
    adjusted
}

/// 对齐单个关节的参考帧
///
/// 混合点 = lerp(frame1 位置, frame2 位置, blend)，两个帧都改为相对该点表达。
pub fn align_constraint(ctx: &mut RigContext, name: &str, position_blend: f32) -> Result<()> {
    let constraint = ctx
        .physics
        .constraint(name)
        .ok_or_else(|| RigError::ConstraintNotFound(name.to_string()))?;
    for body in [&constraint.bone1, &constraint.bone2] {
        if ctx.physics.find_body(body).is_none() {
            log::error!("关节 '{}' 的刚体 '{}' 不存在", name, body);
            return Err(RigError::BodyNotFound(body.clone()));
        }
    }

    let frame1 = *constraint.ref_frame(ConstraintFrame::Frame1);
    let frame2 = *constraint.ref_frame(ConstraintFrame::Frame2);
    let blended: Vec3 = frame1.translation.lerp(frame2.translation, position_blend);
    let origin = BoneTransform::from_translation(blended);

    let constraint = ctx
        .physics
        .constraint_mut(name)
        .ok_or_else(|| RigError::ConstraintNotFound(name.to_string()))?;
    constraint.set_ref_frame(ConstraintFrame::Frame1, frame1.relative_to(&origin));
    constraint.set_ref_frame(ConstraintFrame::Frame2, frame2.relative_to(&origin));
    log::debug!("关节 '{}' 参考帧混合点 {:?}", name, blended);
    Ok(())
}

/// 批量对齐关节，返回成功调整的数量
///
/// 关节名与子刚体同名（点到父骨骼关节）。`names` 为空时按 `match_child_body_pattern` 筛选刚体名。
pub fn adjust_constraints(
    ctx: &mut RigContext,
    options: &AdjustConstraintsOptions,
    names: &[String],
) -> usize {
    let names = match resolve_names(ctx, names, &options.match_child_body_pattern) {
        Ok(names) => names,
        Err(e) => {
            log::warn!("关节调整跳过: {}", e);
            return 0;
        }
    };

    let targets: Vec<String> = ctx
        .physics
        .constraint_names()
        .into_iter()
        .filter(|c| names.contains(c))
        .collect();

    let mut adjusted = 0;
    for name in &targets {
        match align_constraint(ctx, name, options.position_ratio) {
            Ok(()) => adjusted += 1,
            Err(e) => log::warn!("关节 '{}' 调整失败: {}", name, e),
        }
    }
    adjusted
}

fn resolve_names(ctx: &RigContext, names: &[String], pattern: &str) -> Result<Vec<String>> {
    if names.is_empty() {
        filter_names(&ctx.physics.body_names(), pattern)
    } else {
        Ok(names.to_vec())
    }
}
