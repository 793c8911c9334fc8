//! 关节参数模板
//!
//! 模板描述一条边要写入的参数，`overwrite` 位掩码决定哪些参数组会被写入。

use bitflags::bitflags;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::constraint::{AngularDriveMode, AngularMotion, Constraint, ConstraintFrame, LinearMotion};
use crate::config::get_config;
use crate::skeleton::BoneTransform;

// ============================================================================
// 覆盖标志
// ============================================================================

bitflags! {
    /// 参数组覆盖标志位
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct OverwriteFlags: u8 {
        /// 参考帧
        const REF_FRAMES = 1 << 0;
        /// 线性驱动
        const LINEAR_DRIVE = 1 << 1;
        /// 线性限制
        const LINEAR_LIMITS = 1 << 2;
        /// 角度驱动
        const ANGULAR_DRIVE = 1 << 3;
        /// 角度限制
        const ANGULAR_LIMITS = 1 << 4;

        const LINEAR = Self::LINEAR_DRIVE.bits() | Self::LINEAR_LIMITS.bits();
        const ANGULAR = Self::ANGULAR_DRIVE.bits() | Self::ANGULAR_LIMITS.bits();
        const DRIVES = Self::LINEAR_DRIVE.bits() | Self::ANGULAR_DRIVE.bits();
        const LIMITS = Self::LINEAR_LIMITS.bits() | Self::ANGULAR_LIMITS.bits();
        const DRIVES_LIMITS = Self::DRIVES.bits() | Self::LIMITS.bits();
        const ALL = Self::REF_FRAMES.bits() | Self::DRIVES_LIMITS.bits();
    }
}

impl Default for OverwriteFlags {
    fn default() -> Self {
        OverwriteFlags::DRIVES_LIMITS
    }
}

// ============================================================================
// 模板
// ============================================================================

/// 关节参数模板
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintTemplate {
    /// 要写入的参数组
    pub overwrite: OverwriteFlags,
    /// 已存在同名关节时是否允许修改
    pub overwrite_existing: bool,

    pub ref_frame1: BoneTransform,
    pub ref_frame2: BoneTransform,

    pub linear_x: LinearMotion,
    pub linear_y: LinearMotion,
    pub linear_z: LinearMotion,
    pub linear_limit: f32,
    pub linear_target: Vec3,
    /// 大于 0 时线性强度 = 此值 × bone1 刚体质量
    pub linear_strength_mass_multiplier: f32,
    /// 倍数不可用时的固定线性强度
    pub linear_strength: f32,
    pub linear_damping_ratio: f32,

    pub twist: AngularMotion,
    pub twist_limit: f32,
    pub swing1: AngularMotion,
    pub swing1_limit: f32,
    pub swing2: AngularMotion,
    pub swing2_limit: f32,
    /// 大于 0 时角度强度 = 此值 × bone1 刚体质量
    pub angular_strength_mass_multiplier: f32,
    pub angular_strength: f32,
    pub angular_damping_ratio: f32,
    pub angular_target: Quat,
    pub slerp: bool,
}

impl Default for ConstraintTemplate {
    fn default() -> Self {
        let config = get_config();
        Self {
            overwrite: OverwriteFlags::DRIVES_LIMITS,
            overwrite_existing: false,
            ref_frame1: BoneTransform::IDENTITY,
            ref_frame2: BoneTransform::IDENTITY,
            linear_x: LinearMotion::Locked,
            linear_y: LinearMotion::Locked,
            linear_z: LinearMotion::Locked,
            linear_limit: 0.0,
            linear_target: Vec3::ZERO,
            linear_strength_mass_multiplier: 0.0,
            linear_strength: 0.0,
            linear_damping_ratio: config.default_damping_ratio,
            twist: AngularMotion::Locked,
            twist_limit: config.default_angular_limit_deg,
            swing1: AngularMotion::Locked,
            swing1_limit: config.default_angular_limit_deg,
            swing2: AngularMotion::Locked,
            swing2_limit: config.default_angular_limit_deg,
            angular_strength_mass_multiplier: 0.0,
            angular_strength: 0.0,
            angular_damping_ratio: config.default_damping_ratio,
            angular_target: Quat::IDENTITY,
            slerp: false,
        }
    }
}

impl ConstraintTemplate {
    /// 软体点默认模板：线性三轴受限，驱动强度按质量缩放
    pub fn soft_point() -> Self {
        let config = get_config();
        Self {
            linear_x: LinearMotion::Limited,
            linear_y: LinearMotion::Limited,
            linear_z: LinearMotion::Limited,
            linear_limit: config.default_linear_limit,
            linear_strength_mass_multiplier: config.default_mass_multiplier,
            angular_strength_mass_multiplier: config.default_mass_multiplier,
            ..Self::default()
        }
    }

    /// 在软体点模板基础上放开角度限制（点到父骨骼）
    pub fn soft_point_to_parent() -> Self {
        Self {
            twist: AngularMotion::Limited,
            swing1: AngularMotion::Limited,
            swing2: AngularMotion::Limited,
            ..Self::soft_point()
        }
    }

    /// 返回指定覆盖标志的副本
    pub fn with_overwrite(mut self, overwrite: OverwriteFlags, overwrite_existing: bool) -> Self {
        self.overwrite = overwrite;
        self.overwrite_existing = overwrite_existing;
        self
    }

    /// 从现有关节读回模板
    ///
    /// 质量为正时倍数 = 强度 / 质量，否则倍数为 0 并保留固定强度。
    /// 参考帧会读回，但覆盖标志保持默认的驱动+限制，不会改写目标关节的参考帧。
    pub fn from_constraint(constraint: &Constraint, mass: Option<f32>) -> Self {
        let mass = mass.filter(|m| *m > 0.0);
        let multiplier = |strength: f32| mass.map_or(0.0, |m| strength / m);
        let ratio = |damping: f32, strength: f32, fallback: f32| {
            if strength > 0.0 {
                damping / strength
            } else {
                fallback
            }
        };
        let defaults = Self::default();

        let ll = &constraint.linear_limits;
        let ld = &constraint.linear_drive;
        let al = &constraint.angular_limits;
        let ad = &constraint.angular_drive;

        Self {
            overwrite: OverwriteFlags::DRIVES_LIMITS,
            overwrite_existing: true,
            ref_frame1: *constraint.ref_frame(ConstraintFrame::Frame1),
            ref_frame2: *constraint.ref_frame(ConstraintFrame::Frame2),
            linear_x: ll.x,
            linear_y: ll.y,
            linear_z: ll.z,
            linear_limit: ll.limit,
            linear_target: ld.target,
            linear_strength_mass_multiplier: multiplier(ld.strength),
            linear_strength: ld.strength,
            linear_damping_ratio: ratio(ld.damping, ld.strength, defaults.linear_damping_ratio),
            twist: al.twist,
            twist_limit: al.twist_limit,
            swing1: al.swing1,
            swing1_limit: al.swing1_limit,
            swing2: al.swing2,
            swing2_limit: al.swing2_limit,
            angular_strength_mass_multiplier: multiplier(ad.strength),
            angular_strength: ad.strength,
            angular_damping_ratio: ratio(ad.damping, ad.strength, defaults.angular_damping_ratio),
            angular_target: ad.target,
            slerp: ad.mode == AngularDriveMode::Slerp,
        }
    }
}

/// 一条待创建的关节：名称 + 两端刚体 + 模板
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstraintEntry {
    /// 为空时使用 `bone1__bone2`
    #[serde(default)]
    pub name: String,
    pub bone1: String,
    pub bone2: String,
    #[serde(default)]
    pub template: ConstraintTemplate,
}

impl ConstraintEntry {
    pub fn new(
        name: impl Into<String>,
        bone1: impl Into<String>,
        bone2: impl Into<String>,
        template: ConstraintTemplate,
    ) -> Self {
        Self {
            name: name.into(),
            bone1: bone1.into(),
            bone2: bone2.into(),
            template,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_combos() {
        assert!(OverwriteFlags::ALL.contains(OverwriteFlags::REF_FRAMES));
        assert!(!OverwriteFlags::DRIVES_LIMITS.contains(OverwriteFlags::REF_FRAMES));
        assert_eq!(
            OverwriteFlags::LINEAR | OverwriteFlags::ANGULAR,
            OverwriteFlags::DRIVES_LIMITS
        );
        assert_eq!(OverwriteFlags::default(), OverwriteFlags::DRIVES_LIMITS);
    }

    #[test]
    fn test_soft_point_defaults() {
        let t = ConstraintTemplate::soft_point();
        assert_eq!(t.linear_x, LinearMotion::Limited);
        assert!((t.linear_limit - 1.0).abs() < 1e-6);
        assert!((t.linear_strength_mass_multiplier - 10000.0).abs() < 1e-3);
        assert_eq!(t.twist, AngularMotion::Locked);
        assert!(!t.overwrite_existing);

        let p = ConstraintTemplate::soft_point_to_parent();
        assert_eq!(p.swing2, AngularMotion::Limited);
    }

    #[test]
    fn test_from_constraint_reads_multiplier() {
        let mut c = Constraint::new("a__b", "a", "b");
        c.linear_drive.strength = 500.0;
        c.linear_drive.damping = 12.5;
        c.angular_drive.mode = AngularDriveMode::Slerp;

        let t = ConstraintTemplate::from_constraint(&c, Some(5.0));
        assert!((t.linear_strength_mass_multiplier - 100.0).abs() < 1e-4);
        assert!((t.linear_damping_ratio - 0.025).abs() < 1e-6);
        assert!(t.slerp);
        assert_eq!(t.overwrite, OverwriteFlags::DRIVES_LIMITS);
        assert!(t.overwrite_existing);

        let t = ConstraintTemplate::from_constraint(&c, None);
        assert_eq!(t.linear_strength_mass_multiplier, 0.0);
        assert_eq!(t.linear_strength, 500.0);
    }

    #[test]
    fn test_template_deserialize_partial() {
        let json = r#"{ "overwrite": "ALL", "overwrite_existing": true, "linear_limit": 2.0 }"#;
        let t: ConstraintTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(t.overwrite, OverwriteFlags::ALL);
        assert!(t.overwrite_existing);
        assert!((t.linear_limit - 2.0).abs() < 1e-6);
        assert_eq!(t.linear_x, LinearMotion::Locked);
    }
}
