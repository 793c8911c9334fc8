//! 主轴分析
//!
//! 协方差矩阵 + 幂迭代求主特征向量，再补出两条正交轴。

use glam::{Mat3, Vec3};

/// 以质心为中心的协方差矩阵（除以点数）
///
/// 空点集返回单位矩阵。
pub fn covariance_matrix(points: &[Vec3]) -> Mat3 {
    if points.is_empty() {
        return Mat3::IDENTITY;
    }

    let n = points.len() as f32;
    let mean = points.iter().copied().sum::<Vec3>() / n;

    let mut cxx = 0.0;
    let mut cxy = 0.0;
    let mut cxz = 0.0;
    let mut cyy = 0.0;
    let mut cyz = 0.0;
    let mut czz = 0.0;
    for p in points {
        let d = *p - mean;
        cxx += d.x * d.x;
        cxy += d.x * d.y;
        cxz += d.x * d.z;
        cyy += d.y * d.y;
        cyz += d.y * d.z;
        czz += d.z * d.z;
    }

    // 对称矩阵，列主序
    Mat3::from_cols(
        Vec3::new(cxx, cxy, cxz) / n,
        Vec3::new(cxy, cyy, cyz) / n,
        Vec3::new(cxz, cyz, czz) / n,
    )
}

/// 幂迭代求主特征向量
///
/// 起始向量 (0,0,1)，每步归一化；零向量时保持不动。
pub fn dominant_eigenvector(matrix: &Mat3, iterations: usize) -> Vec3 {
    let mut bk = Vec3::Z;
    for _ in 0..iterations {
        let len = bk.length();
        if len > 0.0 {
            bk = (*matrix * bk) / len;
        }
    }
    let result = bk.normalize_or_zero();
    if result == Vec3::ZERO {
        Vec3::Z
    } else {
        result
    }
}

/// 由主轴补出两条正交轴，返回 `(x_axis, y_axis)`
///
/// 与 `axis` 组成右手系 (x, y, axis)。
pub fn best_axis_vectors(axis: Vec3) -> (Vec3, Vec3) {
    let a = axis.abs();
    let seed = if a.z > a.x && a.z > a.y { Vec3::X } else { Vec3::Z };

    let y_axis = (seed - axis * seed.dot(axis)).normalize();
    let x_axis = y_axis.cross(axis);
    (x_axis, y_axis)
}

/// 主轴坐标系：列为 (x, y, 主轴)
pub fn principal_frame(points: &[Vec3], iterations: usize) -> Mat3 {
    let z_axis = dominant_eigenvector(&covariance_matrix(points), iterations);
    let (x_axis, y_axis) = best_axis_vectors(z_axis);
    Mat3::from_cols(x_axis, y_axis, z_axis)
}
