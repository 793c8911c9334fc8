//! 关节数据
//!
//! 关节连接两个刚体（bone1 = 子，bone2 = 父，约定但不强制）。
//! 参考帧只能通过 `set_ref_frame` 写入，写入时缩放强制为 1。

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::skeleton::BoneTransform;

// ============================================================================
// 运动模式
// ============================================================================

/// 线性轴运动模式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearMotion {
    Free,
    Limited,
    #[default]
    Locked,
}

/// 角度轴运动模式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngularMotion {
    Free,
    Limited,
    #[default]
    Locked,
}

/// 角度驱动模式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngularDriveMode {
    Slerp,
    #[default]
    TwistAndSwing,
}

/// 参考帧选择
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintFrame {
    /// bone1 侧
    Frame1,
    /// bone2 侧
    Frame2,
}

// ============================================================================
// 参数组
// ============================================================================

/// 线性限制
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearLimits {
    pub x: LinearMotion,
    pub y: LinearMotion,
    pub z: LinearMotion,
    pub limit: f32,
}

/// 线性驱动
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearDrive {
    pub target: Vec3,
    pub strength: f32,
    pub damping: f32,
    pub position_enabled: bool,
    pub velocity_enabled: bool,
}

/// 角度限制（度）
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AngularLimits {
    pub twist: AngularMotion,
    pub twist_limit: f32,
    pub swing1: AngularMotion,
    pub swing1_limit: f32,
    pub swing2: AngularMotion,
    pub swing2_limit: f32,
}

/// 角度驱动
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AngularDrive {
    pub target: Quat,
    pub strength: f32,
    pub damping: f32,
    pub mode: AngularDriveMode,
    pub orientation_enabled: bool,
    pub velocity_enabled: bool,
}

impl Default for AngularDrive {
    fn default() -> Self {
        Self {
            target: Quat::IDENTITY,
            strength: 0.0,
            damping: 0.0,
            mode: AngularDriveMode::default(),
            orientation_enabled: false,
            velocity_enabled: false,
        }
    }
}

// ============================================================================
// 关节
// ============================================================================

/// 关节
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// 关节名称（刚体集合内唯一）
    pub name: String,
    /// 子侧刚体
    pub bone1: String,
    /// 父侧刚体
    pub bone2: String,
    #[serde(default)]
    frame1: BoneTransform,
    #[serde(default)]
    frame2: BoneTransform,
    #[serde(default)]
    pub linear_limits: LinearLimits,
    #[serde(default)]
    pub linear_drive: LinearDrive,
    #[serde(default)]
    pub angular_limits: AngularLimits,
    #[serde(default)]
    pub angular_drive: AngularDrive,
}

impl Constraint {
    pub fn new(name: impl Into<String>, bone1: impl Into<String>, bone2: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bone1: bone1.into(),
            bone2: bone2.into(),
            frame1: BoneTransform::IDENTITY,
            frame2: BoneTransform::IDENTITY,
            linear_limits: LinearLimits::default(),
            linear_drive: LinearDrive::default(),
            angular_limits: AngularLimits::default(),
            angular_drive: AngularDrive::default(),
        }
    }

    /// 默认关节名：`bone1__bone2`
    pub fn default_name(bone1: &str, bone2: &str) -> String {
        format!("{bone1}__{bone2}")
    }

    #[inline]
    pub fn ref_frame(&self, which: ConstraintFrame) -> &BoneTransform {
        match which {
            ConstraintFrame::Frame1 => &self.frame1,
            ConstraintFrame::Frame2 => &self.frame2,
        }
    }

    /// 写入参考帧，缩放强制为 1
    pub fn set_ref_frame(&mut self, which: ConstraintFrame, frame: BoneTransform) {
        let frame = frame.with_unit_scale();
        match which {
            ConstraintFrame::Frame1 => self.frame1 = frame,
            ConstraintFrame::Frame2 => self.frame2 = frame,
        }
    }

    /// 两个参考帧都是单位缩放
    pub fn has_unit_scale_frames(&self) -> bool {
        self.frame1.has_unit_scale() && self.frame2.has_unit_scale()
    }

    /// 重置非单位缩放，返回修正的帧数
    pub fn fix_frame_scale(&mut self) -> usize {
        let mut fixed = 0;
        for frame in [&mut self.frame1, &mut self.frame2] {
            if !frame.has_unit_scale() {
                frame.scale = Vec3::ONE;
                fixed += 1;
            }
        }
        fixed
    }

    /// 是否连接了指定刚体
    pub fn connects(&self, body: &str) -> bool {
        self.bone1 == body || self.bone2 == body
    }
}
