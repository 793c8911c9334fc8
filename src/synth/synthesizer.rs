//! 关节合成
//!
//! 按名称创建或更新关节，按覆盖标志写入参数组，然后对齐参考帧并禁用两端刚体的碰撞。
//! 同名关节已存在且模板不允许覆盖时什么都不做，重复调用不会产生变化。

use super::report::{ConstraintOutcome, SynthesisReport};
use super::RigContext;
use crate::naming::{mirror_name, side, Side};
use crate::physics::{
    AngularDriveMode, Constraint, ConstraintEntry, ConstraintFrame, ConstraintTemplate,
    OverwriteFlags, PhysicsRig,
};
use crate::{Result, RigError};

/// 驱动强度：倍数与质量均为正时 = 倍数 × 质量，否则使用固定强度
#[inline]
pub fn drive_strength(mass_multiplier: f32, mass: Option<f32>, flat_strength: f32) -> f32 {
    match mass {
        Some(m) if mass_multiplier > 0.0 && m > 0.0 => mass_multiplier * m,
        _ => flat_strength,
    }
}

/// 按覆盖标志把模板写入关节
///
/// `mass` 为 bone1 刚体质量。
pub fn apply_template(constraint: &mut Constraint, template: &ConstraintTemplate, mass: Option<f32>) {
    let flags = template.overwrite;

    if flags.contains(OverwriteFlags::REF_FRAMES) {
        constraint.set_ref_frame(ConstraintFrame::Frame1, template.ref_frame1);
        constraint.set_ref_frame(ConstraintFrame::Frame2, template.ref_frame2);
    }

    if flags.contains(OverwriteFlags::LINEAR_LIMITS) {
        let limits = &mut constraint.linear_limits;
        limits.x = template.linear_x;
        limits.y = template.linear_y;
        limits.z = template.linear_z;
        limits.limit = template.linear_limit;
    }

    if flags.contains(OverwriteFlags::LINEAR_DRIVE) {
        let strength = drive_strength(
            template.linear_strength_mass_multiplier,
            mass,
            template.linear_strength,
        );
        let drive = &mut constraint.linear_drive;
        drive.strength = strength;
        drive.damping = strength * template.linear_damping_ratio;
        drive.position_enabled = strength > 0.0;
        drive.velocity_enabled = strength > 0.0;
        drive.target = template.linear_target;
    }

    if flags.contains(OverwriteFlags::ANGULAR_LIMITS) {
        let limits = &mut constraint.angular_limits;
        limits.twist = template.twist;
        limits.twist_limit = template.twist_limit;
        limits.swing1 = template.swing1;
        limits.swing1_limit = template.swing1_limit;
        limits.swing2 = template.swing2;
        limits.swing2_limit = template.swing2_limit;
    }

    if flags.contains(OverwriteFlags::ANGULAR_DRIVE) {
        let strength = drive_strength(
            template.angular_strength_mass_multiplier,
            mass,
            template.angular_strength,
        );
        let drive = &mut constraint.angular_drive;
        drive.strength = strength;
        drive.damping = strength * template.angular_damping_ratio;
        drive.orientation_enabled = strength > 0.0;
        drive.velocity_enabled = strength > 0.0;
        drive.target = template.angular_target;
        drive.mode = if template.slerp {
            AngularDriveMode::Slerp
        } else {
            AngularDriveMode::TwistAndSwing
        };
    }
}

/// 对齐参考帧：frame2 = world(bone2)⁻¹ × world(bone1) × frame1
///
/// 骨架中缺少任一骨骼时保持原样并返回 false。
fn snap_ref_frames(ctx: &mut RigContext, index: usize) -> bool {
    let Some(constraint) = ctx.physics.constraints().get(index) else {
        return false;
    };
    let (Some(world1), Some(world2)) = (
        ctx.skeleton.world_transform(&constraint.bone1),
        ctx.skeleton.world_transform(&constraint.bone2),
    ) else {
        log::warn!("关节 '{}' 的骨骼不在骨架中，跳过参考帧对齐", constraint.name);
        return false;
    };

    let frame1 = *constraint.ref_frame(ConstraintFrame::Frame1);
    let joint_world = world1.mul_transform(&frame1);
    let frame2 = joint_world.relative_to(&world2);

    let constraint = &mut ctx.physics.constraints_mut()[index];
    constraint.set_ref_frame(ConstraintFrame::Frame1, frame1);
    constraint.set_ref_frame(ConstraintFrame::Frame2, frame2);
    true
}

/// 关节改连其他刚体后，恢复旧刚体对的碰撞
///
/// 调用前关节已写入新刚体；仍有关节连接旧刚体对时保持禁用。
fn release_collision(physics: &mut PhysicsRig, a: &str, b: &str) {
    let still_joined = physics
        .constraints()
        .iter()
        .any(|c| c.connects(a) && c.connects(b));
    if !still_joined && physics.enable_collision(a, b) {
        log::debug!("恢复 '{}' - '{}' 碰撞", a, b);
    }
}

/// 创建或更新关节
///
/// - 任一端刚体不存在：返回 `BodyNotFound`（错误日志，不中断批处理）
/// - 已存在且模板不允许覆盖：返回 `Unchanged`，不做任何修改
/// - 否则新建或复用同名关节，写入参数、对齐参考帧、禁用两端碰撞
pub fn make_or_update_constraint(
    ctx: &mut RigContext,
    entry: &ConstraintEntry,
) -> Result<ConstraintOutcome> {
    let name = if entry.name.is_empty() {
        Constraint::default_name(&entry.bone1, &entry.bone2)
    } else {
        entry.name.clone()
    };

    for bone in [&entry.bone1, &entry.bone2] {
        if ctx.physics.find_body(bone).is_none() {
            log::error!(
                "关节 '{}' 创建失败: 刚体 '{}' 或 '{}' 不存在",
                name,
                entry.bone1,
                entry.bone2
            );
            return Err(RigError::BodyNotFound(bone.clone()));
        }
    }

    let existing = ctx.physics.find_constraint(&name);
    if let Some(index) = existing {
        if !entry.template.overwrite_existing {
            log::debug!("关节 '{}' 已存在，不覆盖", name);
            return Ok(ConstraintOutcome::Unchanged(index));
        }
    }

    let index = match existing {
        Some(index) => {
            let constraint = &mut ctx.physics.constraints_mut()[index];
            let old_pair = (
                std::mem::replace(&mut constraint.bone1, entry.bone1.clone()),
                std::mem::replace(&mut constraint.bone2, entry.bone2.clone()),
            );
            release_collision(&mut ctx.physics, &old_pair.0, &old_pair.1);
            index
        }
        None => ctx.physics.add_constraint(Constraint::new(
            name.as_str(),
            entry.bone1.as_str(),
            entry.bone2.as_str(),
        ))?,
    };

    let mass = ctx.physics.body_mass(&entry.bone1);
    apply_template(&mut ctx.physics.constraints_mut()[index], &entry.template, mass);
    snap_ref_frames(ctx, index);
    ctx.physics.disable_collision(&entry.bone1, &entry.bone2)?;

    log::debug!("关节 '{}': {} -> {}", name, entry.bone1, entry.bone2);
    Ok(match existing {
        Some(_) => ConstraintOutcome::Updated(index),
        None => ConstraintOutcome::Created(index),
    })
}

/// 批量应用关节条目，单项失败只记录不中断
pub fn apply_all(ctx: &mut RigContext, entries: &[ConstraintEntry]) -> SynthesisReport {
    let mut report = SynthesisReport::new();
    for entry in entries {
        let result = make_or_update_constraint(ctx, entry);
        let name = if entry.name.is_empty() {
            Constraint::default_name(&entry.bone1, &entry.bone2)
        } else {
            entry.name.clone()
        };
        report.record(&name, &result);
    }
    log::info!("应用关节模板: {} 新建/更新, {} 失败", report.count(), report.failed.len());
    report
}

/// 把一侧关节参数复制到镜像关节
///
/// `right_to_left` 为真时从 `_r` 复制到 `_l`。镜像关节不存在时记录失败。
pub fn mirror_constraints(
    ctx: &mut RigContext,
    names: &[String],
    right_to_left: bool,
) -> SynthesisReport {
    let from_side = if right_to_left { Side::Right } else { Side::Left };
    let mut report = SynthesisReport::new();

    for name in names.iter().filter(|n| side(n) == from_side) {
        let Some(source) = ctx.physics.constraint(name) else {
            report.record_failure(name, &RigError::ConstraintNotFound(name.clone()));
            continue;
        };
        let template =
            ConstraintTemplate::from_constraint(source, ctx.physics.body_mass(&source.bone1));

        let mirror = mirror_name(name);
        let Some(target) = ctx.physics.constraint(&mirror) else {
            log::error!("镜像关节 '{}' 不存在（源 '{}'）", mirror, name);
            report.record_failure(&mirror, &RigError::ConstraintNotFound(mirror.clone()));
            continue;
        };
        let entry = ConstraintEntry::new(
            mirror.as_str(),
            target.bone1.as_str(),
            target.bone2.as_str(),
            template,
        );
        let result = make_or_update_constraint(ctx, &entry);
        report.record(&mirror, &result);
    }
    report
}

/// 从另一个物理绑定复制指定关节的参数
pub fn copy_constraints(
    ctx: &mut RigContext,
    source: &PhysicsRig,
    names: &[String],
) -> SynthesisReport {
    let mut report = SynthesisReport::new();
    for name in names {
        let Some(constraint) = source.constraint(name) else {
            log::warn!("源物理绑定中没有关节 '{}'", name);
            report.record_failure(name, &RigError::ConstraintNotFound(name.clone()));
            continue;
        };
        let template =
            ConstraintTemplate::from_constraint(constraint, source.body_mass(&constraint.bone1));
        let entry = ConstraintEntry::new(
            name.as_str(),
            constraint.bone1.as_str(),
            constraint.bone2.as_str(),
            template,
        );
        let result = make_or_update_constraint(ctx, &entry);
        report.record(name, &result);
    }
    report
}

/// 把指定条目的固定强度改写为 `factor × bone1 质量`
///
/// 返回改写的条目数；刚体不存在或无质量的条目保持不变。
pub fn scale_templates_by_mass(
    physics: &PhysicsRig,
    entries: &mut [ConstraintEntry],
    names: &[String],
    factor: f32,
) -> usize {
    let mut scaled = 0;
    for entry in entries.iter_mut().filter(|e| names.contains(&e.name)) {
        if let Some(mass) = physics.body_mass(&entry.bone1) {
            entry.template.linear_strength = factor * mass;
            entry.template.angular_strength = factor * mass;
            scaled += 1;
        }
    }
    scaled
}

/// 重置所有关节参考帧的非单位缩放，返回修正的帧数
pub fn fix_constraint_scale(physics: &mut PhysicsRig) -> usize {
    let mut fixed = 0;
    for constraint in physics.constraints_mut() {
        let n = constraint.fix_frame_scale();
        if n > 0 {
            log::info!("关节 '{}' 参考帧缩放已重置 ({} 帧)", constraint.name, n);
        }
        fixed += n;
    }
    fixed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{AngularMotion, Body, LinearMotion};
    use crate::skeleton::{BoneTransform, Skeleton};
    use glam::{Quat, Vec3};

    fn context() -> RigContext {
        let mut skeleton = Skeleton::new();
        skeleton
            .add_bone("breast_01_l", None, BoneTransform::from_translation(Vec3::new(0.0, 10.0, 0.0)))
            .unwrap();
        skeleton
            .add_bone(
                "breast_pt_01_01_l",
                Some("breast_01_l"),
                BoneTransform::from_translation(Vec3::new(2.0, 12.0, 0.0)),
            )
            .unwrap();
        let mut physics = PhysicsRig::new();
        physics.add_body(Body::new("breast_01_l").with_mass(4.0));
        physics.add_body(Body::new("breast_pt_01_01_l").with_mass(2.0));
        RigContext::new(skeleton, physics)
    }

    fn entry(template: ConstraintTemplate) -> ConstraintEntry {
        ConstraintEntry::new("", "breast_pt_01_01_l", "breast_01_l", template)
    }

    #[test]
    fn test_drive_strength_rule() {
        assert_eq!(drive_strength(10.0, Some(2.0), 5.0), 20.0);
        assert_eq!(drive_strength(0.0, Some(2.0), 5.0), 5.0);
        assert_eq!(drive_strength(10.0, None, 5.0), 5.0);
        assert_eq!(drive_strength(10.0, Some(0.0), 5.0), 5.0);
    }

    #[test]
    fn test_create_applies_params_and_disables_collision() {
        let mut ctx = context();
        let outcome = make_or_update_constraint(&mut ctx, &entry(ConstraintTemplate::soft_point()))
            .unwrap();
        assert!(outcome.is_created());

        let c = ctx.physics.constraint("breast_pt_01_01_l__breast_01_l").unwrap();
        assert_eq!(c.linear_limits.x, LinearMotion::Limited);
        assert!((c.linear_drive.strength - 20000.0).abs() < 1e-2);
        assert!((c.linear_drive.damping - 500.0).abs() < 1e-2);
        assert!(c.linear_drive.position_enabled && c.linear_drive.velocity_enabled);
        assert!(c.has_unit_scale_frames());
        assert!(ctx
            .physics
            .is_collision_disabled("breast_01_l", "breast_pt_01_01_l"));

        // 两个参考帧在世界空间重合
        let w1 = ctx.skeleton.world_transform("breast_pt_01_01_l").unwrap();
        let w2 = ctx.skeleton.world_transform("breast_01_l").unwrap();
        let p1 = w1.mul_transform(c.ref_frame(ConstraintFrame::Frame1)).translation;
        let p2 = w2.mul_transform(c.ref_frame(ConstraintFrame::Frame2)).translation;
        assert!(p1.abs_diff_eq(p2, 1e-4));
    }

    #[test]
    fn test_idempotent_without_overwrite() {
        let mut ctx = context();
        let e = entry(ConstraintTemplate::soft_point());
        make_or_update_constraint(&mut ctx, &e).unwrap();
        let before = ctx.physics.constraints().to_vec();

        let mut changed = e.clone();
        changed.template.linear_limit = 99.0;
        let outcome = make_or_update_constraint(&mut ctx, &changed).unwrap();
        assert!(matches!(outcome, ConstraintOutcome::Unchanged(0)));
        assert_eq!(ctx.physics.constraints(), before.as_slice());

        changed.template.overwrite_existing = true;
        let outcome = make_or_update_constraint(&mut ctx, &changed).unwrap();
        assert!(matches!(outcome, ConstraintOutcome::Updated(0)));
        assert_eq!(ctx.physics.constraint_count(), 1);
        assert_eq!(ctx.physics.constraints()[0].linear_limits.limit, 99.0);
    }

    #[test]
    fn test_missing_body_fails_without_side_effects() {
        let mut ctx = context();
        let e = ConstraintEntry::new("x", "breast_pt_01_01_l", "nope", ConstraintTemplate::default());
        assert!(matches!(
            make_or_update_constraint(&mut ctx, &e),
            Err(RigError::BodyNotFound(ref b)) if b == "nope"
        ));
        assert_eq!(ctx.physics.constraint_count(), 0);

        let report = apply_all(&mut ctx, &[e, entry(ConstraintTemplate::default())]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.created.len(), 1);
    }

    #[test]
    fn test_overwrite_flags_are_selective() {
        let mut ctx = context();
        make_or_update_constraint(&mut ctx, &entry(ConstraintTemplate::soft_point())).unwrap();

        let mut limits_only = ConstraintTemplate::default()
            .with_overwrite(OverwriteFlags::LINEAR_LIMITS, true);
        limits_only.linear_x = LinearMotion::Free;
        make_or_update_constraint(&mut ctx, &entry(limits_only)).unwrap();

        let c = &ctx.physics.constraints()[0];
        assert_eq!(c.linear_limits.x, LinearMotion::Free);
        // 驱动未被改写
        assert!((c.linear_drive.strength - 20000.0).abs() < 1e-2);
    }

    #[test]
    fn test_angular_limits_overwrite_only() {
        let mut ctx = context();
        make_or_update_constraint(&mut ctx, &entry(ConstraintTemplate::soft_point())).unwrap();
        let before = ctx.physics.constraints()[0].clone();

        let mut template = ConstraintTemplate::default()
            .with_overwrite(OverwriteFlags::ANGULAR_LIMITS, true);
        template.twist = AngularMotion::Limited;
        template.twist_limit = 12.0;
        template.swing1 = AngularMotion::Free;
        template.swing2_limit = 3.0;
        // 以下字段不在覆盖范围内
        template.linear_x = LinearMotion::Free;
        template.linear_strength = 1.0;
        template.angular_strength = 1.0;
        make_or_update_constraint(&mut ctx, &entry(template)).unwrap();

        let c = &ctx.physics.constraints()[0];
        assert_eq!(c.angular_limits.twist, AngularMotion::Limited);
        assert_eq!(c.angular_limits.twist_limit, 12.0);
        assert_eq!(c.angular_limits.swing1, AngularMotion::Free);
        assert_eq!(c.angular_limits.swing2_limit, 3.0);
        assert_eq!(c.linear_limits, before.linear_limits);
        assert_eq!(c.linear_drive, before.linear_drive);
        assert_eq!(c.angular_drive, before.angular_drive);
        assert_eq!(c.ref_frame(ConstraintFrame::Frame1), before.ref_frame(ConstraintFrame::Frame1));
        assert!(c.has_unit_scale_frames());
    }

    #[test]
    fn test_angular_drive_overwrite() {
        let mut ctx = context();
        let target = Quat::from_rotation_x(0.4);
        let mut template = ConstraintTemplate::default()
            .with_overwrite(OverwriteFlags::ANGULAR_DRIVE, true);
        template.angular_strength_mass_multiplier = 100.0;
        template.angular_damping_ratio = 0.1;
        template.angular_target = target;
        template.slerp = true;
        template.linear_strength = 50.0;
        template.twist = AngularMotion::Free;
        make_or_update_constraint(&mut ctx, &entry(template.clone())).unwrap();

        // bone1 质量 2.0
        let c = &ctx.physics.constraints()[0];
        assert!((c.angular_drive.strength - 200.0).abs() < 1e-4);
        assert!((c.angular_drive.damping - 20.0).abs() < 1e-4);
        assert!(c.angular_drive.orientation_enabled && c.angular_drive.velocity_enabled);
        assert_eq!(c.angular_drive.mode, AngularDriveMode::Slerp);
        assert!(c.angular_drive.target.abs_diff_eq(target, 1e-6));
        assert_eq!(c.linear_drive.strength, 0.0);
        assert!(!c.linear_drive.position_enabled);
        assert_eq!(c.angular_limits.twist, AngularMotion::Locked);

        // 倍数为 0 时使用固定强度
        template.angular_strength_mass_multiplier = 0.0;
        template.angular_strength = 7.0;
        template.slerp = false;
        make_or_update_constraint(&mut ctx, &entry(template.clone())).unwrap();
        let c = &ctx.physics.constraints()[0];
        assert_eq!(c.angular_drive.strength, 7.0);
        assert!((c.angular_drive.damping - 0.7).abs() < 1e-5);
        assert_eq!(c.angular_drive.mode, AngularDriveMode::TwistAndSwing);

        // 强度为 0 时关闭驱动
        template.angular_strength = 0.0;
        make_or_update_constraint(&mut ctx, &entry(template)).unwrap();
        let c = &ctx.physics.constraints()[0];
        assert!(!c.angular_drive.orientation_enabled && !c.angular_drive.velocity_enabled);
        assert!(c.has_unit_scale_frames());
    }

    #[test]
    fn test_ref_frames_overwrite_snaps_frame2() {
        let mut ctx = context();
        make_or_update_constraint(&mut ctx, &entry(ConstraintTemplate::soft_point())).unwrap();
        let before = ctx.physics.constraints()[0].clone();

        let rotation = Quat::from_rotation_z(0.3);
        let mut frame1 = BoneTransform::from_rotation_translation(rotation, Vec3::new(0.5, 0.0, 0.0));
        frame1.scale = Vec3::splat(3.0);
        let mut frame2 = BoneTransform::from_translation(Vec3::new(100.0, 0.0, 0.0));
        frame2.scale = Vec3::new(-1.0, 2.0, 1.0);

        let mut template = ConstraintTemplate::default()
            .with_overwrite(OverwriteFlags::REF_FRAMES, true);
        template.ref_frame1 = frame1;
        template.ref_frame2 = frame2;
        template.linear_x = LinearMotion::Free;
        make_or_update_constraint(&mut ctx, &entry(template)).unwrap();

        let c = &ctx.physics.constraints()[0];
        assert!(c.has_unit_scale_frames());
        let f1 = c.ref_frame(ConstraintFrame::Frame1);
        assert!(f1.translation.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-5));
        assert!(f1.rotation.abs_diff_eq(rotation, 1e-5));

        // frame2 由 frame1 推导，模板中的 frame2 被替换
        let f2 = c.ref_frame(ConstraintFrame::Frame2);
        assert!(f2.translation.abs_diff_eq(Vec3::new(2.5, 2.0, 0.0), 1e-4));
        assert!((f2.rotation * Vec3::X).abs_diff_eq(rotation * Vec3::X, 1e-5));

        let w1 = ctx.skeleton.world_transform("breast_pt_01_01_l").unwrap();
        let w2 = ctx.skeleton.world_transform("breast_01_l").unwrap();
        assert!(w1
            .mul_transform(f1)
            .translation
            .abs_diff_eq(w2.mul_transform(f2).translation, 1e-4));

        assert_eq!(c.linear_limits, before.linear_limits);
        assert_eq!(c.linear_drive, before.linear_drive);
        assert_eq!(c.angular_limits, before.angular_limits);
        assert_eq!(c.angular_drive, before.angular_drive);
    }

    #[test]
    fn test_rebinding_releases_old_collision_pair() {
        let mut ctx = context();
        for name in ["a", "b", "c"] {
            ctx.physics.add_body(Body::new(name).with_mass(1.0));
        }
        let overwrite = ConstraintTemplate::default().with_overwrite(OverwriteFlags::DRIVES_LIMITS, true);

        make_or_update_constraint(&mut ctx, &ConstraintEntry::new("j", "a", "b", overwrite.clone()))
            .unwrap();
        assert!(ctx.physics.is_collision_disabled("a", "b"));

        make_or_update_constraint(&mut ctx, &ConstraintEntry::new("j", "a", "c", overwrite.clone()))
            .unwrap();
        assert!(!ctx.physics.is_collision_disabled("a", "b"));
        assert!(ctx.physics.is_collision_disabled("a", "c"));

        // 另一个关节仍连接 a - c 时保持禁用
        make_or_update_constraint(&mut ctx, &ConstraintEntry::new("k", "c", "a", overwrite.clone()))
            .unwrap();
        make_or_update_constraint(&mut ctx, &ConstraintEntry::new("j", "b", "c", overwrite)).unwrap();
        assert!(ctx.physics.is_collision_disabled("a", "c"));
        assert!(ctx.physics.is_collision_disabled("b", "c"));
    }

    #[test]
    fn test_mirror_and_copy() {
        let mut ctx = context();
        ctx.physics.add_body(Body::new("a_l").with_mass(1.0));
        ctx.physics.add_body(Body::new("b_l").with_mass(1.0));
        ctx.physics.add_body(Body::new("a_r").with_mass(1.0));
        ctx.physics.add_body(Body::new("b_r").with_mass(1.0));

        let mut left = ConstraintTemplate::soft_point();
        left.linear_limit = 3.0;
        make_or_update_constraint(&mut ctx, &ConstraintEntry::new("j_l", "a_l", "b_l", left)).unwrap();
        make_or_update_constraint(
            &mut ctx,
            &ConstraintEntry::new("j_r", "a_r", "b_r", ConstraintTemplate::default()),
        )
        .unwrap();

        let names = vec!["j_l".to_string(), "missing_l".to_string(), "j_r".to_string()];
        let report = mirror_constraints(&mut ctx, &names, false);
        assert_eq!(report.updated, vec!["j_r"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(ctx.physics.constraint("j_r").unwrap().linear_limits.limit, 3.0);
        assert_eq!(ctx.physics.constraint("j_r").unwrap().bone1, "a_r");

        let source = ctx.physics.clone();
        let mut target = context();
        target.physics.add_body(Body::new("a_l").with_mass(1.0));
        target.physics.add_body(Body::new("b_l").with_mass(1.0));
        let report = copy_constraints(&mut target, &source, &["j_l".to_string(), "zz".to_string()]);
        assert_eq!(report.created, vec!["j_l"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(target.physics.constraint("j_l").unwrap().linear_limits.limit, 3.0);
    }

    #[test]
    fn test_scale_templates_and_fix_scale() {
        let ctx = context();
        let mut entries = vec![
            ConstraintEntry::new("j", "breast_pt_01_01_l", "breast_01_l", ConstraintTemplate::default()),
            ConstraintEntry::new("k", "missing", "breast_01_l", ConstraintTemplate::default()),
        ];
        let names = vec!["j".to_string(), "k".to_string()];
        assert_eq!(scale_templates_by_mass(&ctx.physics, &mut entries, &names, 0.025), 1);
        assert!((entries[0].template.linear_strength - 0.05).abs() < 1e-6);

        let mut physics = PhysicsRig::new();
        let json = r#"{ "name": "s", "bone1": "a", "bone2": "b", "frame2": { "scale": [0.5, 1.0, 1.0] } }"#;
        physics.add_constraint(serde_json::from_str(json).unwrap()).unwrap();
        assert_eq!(fix_constraint_scale(&mut physics), 1);
        assert!(physics.constraints()[0].has_unit_scale_frames());
    }
}
