//! 刚体数据
//!
//! 每个刚体按名称与一根骨骼一一对应，至多持有一个碰撞图元。

use std::f32::consts::PI;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::get_config;

/// 碰撞图元（骨骼本地空间）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Sphere {
        center: Vec3,
        radius: f32,
    },
    Capsule {
        center: Vec3,
        rotation: Quat,
        radius: f32,
        length: f32,
    },
    /// 凸包原始点，由宿主负责生成凸包
    Convex { points: Vec<Vec3> },
}

impl Shape {
    /// 图元体积
    ///
    /// 凸包用点集包围盒体积近似。
    pub fn volume(&self) -> f32 {
        match self {
            Shape::Sphere { radius, .. } => 4.0 / 3.0 * PI * radius.powi(3),
            Shape::Capsule { radius, length, .. } => {
                PI * radius * radius * length + 4.0 / 3.0 * PI * radius.powi(3)
            }
            Shape::Convex { points } => {
                let Some(first) = points.first() else {
                    return 0.0;
                };
                let (lo, hi) = points
                    .iter()
                    .fold((*first, *first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
                let size = hi - lo;
                size.x * size.y * size.z
            }
        }
    }

    /// 图元中心
    pub fn center(&self) -> Vec3 {
        match self {
            Shape::Sphere { center, .. } | Shape::Capsule { center, .. } => *center,
            Shape::Convex { points } => {
                if points.is_empty() {
                    Vec3::ZERO
                } else {
                    points.iter().copied().sum::<Vec3>() / points.len() as f32
                }
            }
        }
    }
}

/// 刚体
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// 刚体名称 = 绑定骨骼名称
    pub name: String,
    #[serde(default)]
    pub shape: Option<Shape>,
    /// 显式质量；为空时由体积 × 密度推导
    #[serde(default)]
    pub mass: Option<f32>,
    #[serde(default = "default_density")]
    pub density: f32,
}

fn default_density() -> f32 {
    get_config().default_density
}

impl Body {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: None,
            mass: None,
            density: default_density(),
        }
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    /// 刚体质量：显式质量优先，否则体积 × 密度；两者皆无时为 `None`
    pub fn mass(&self) -> Option<f32> {
        self.mass
            .or_else(|| self.shape.as_ref().map(|s| s.volume() * self.density))
    }

    /// 设置图元（替换已有图元）
    pub fn set_shape(&mut self, shape: Shape) {
        self.shape = Some(shape);
    }
}
