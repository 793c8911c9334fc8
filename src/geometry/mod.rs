//! 几何拟合 - 从骨骼顶点簇生成初始碰撞图元
//!
//! - principal_axis: 协方差矩阵、幂迭代主轴、正交补轴
//! - fit: 胶囊体/球体参数

mod fit;
mod principal_axis;

pub use fit::{
    bounding_sphere, fit_capsule, fit_capsule_for_bone, fit_sphere, fit_sphere_for_bone,
    CapsuleParams, LengthReference, SphereParams,
};
pub use principal_axis::{best_axis_vectors, covariance_matrix, dominant_eigenvector, principal_frame};
