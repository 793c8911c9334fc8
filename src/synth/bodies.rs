//! 刚体创建
//!
//! 按骨骼名称 → 创建参数的映射生成刚体，碰撞图元由骨骼顶点簇拟合。

use std::collections::BTreeMap;

use super::options::{BodyCreateParams, GeometryKind};
use super::report::SynthesisReport;
use super::RigContext;
use crate::geometry::{bounding_sphere, fit_capsule_for_bone};
use crate::physics::{Body, Shape};
use crate::{Result, RigError};

/// 由顶点簇拟合图元
fn fit_shape(ctx: &RigContext, name: &str, geometry: GeometryKind) -> Result<Shape> {
    match geometry {
        GeometryKind::Capsule => {
            let capsule = fit_capsule_for_bone(&ctx.skeleton, name)?;
            Ok(Shape::Capsule {
                center: capsule.center,
                rotation: capsule.rotation,
                radius: capsule.radius,
                length: capsule.length,
            })
        }
        GeometryKind::Sphere => {
            let sphere = ctx
                .skeleton
                .vertex_cluster(name)
                .and_then(bounding_sphere)
                .ok_or_else(|| RigError::EmptyVertexCluster(name.to_string()))?;
            Ok(Shape::Sphere {
                center: sphere.center,
                radius: sphere.radius,
            })
        }
        GeometryKind::Convex => {
            let points = ctx
                .skeleton
                .vertex_cluster(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| RigError::EmptyVertexCluster(name.to_string()))?;
            Ok(Shape::Convex {
                points: points.to_vec(),
            })
        }
    }
}

/// 骨骼到父骨骼的距离，根骨骼为 `None`
fn bone_length(ctx: &RigContext, name: &str) -> Option<f32> {
    let parent = ctx.skeleton.parent_name(name)?;
    let p = ctx.skeleton.position(parent)?;
    Some(ctx.skeleton.position(name)?.distance(p))
}

/// 按参数表创建刚体
///
/// - 已有图元的刚体跳过
/// - 骨架中没有的骨骼、拟合失败的骨骼记为失败，不创建刚体
/// - 骨骼长度低于 `min_bone_size` 时跳过
pub fn create_bodies(
    ctx: &mut RigContext,
    params: &BTreeMap<String, BodyCreateParams>,
) -> SynthesisReport {
    let mut report = SynthesisReport::new();

    for (name, p) in params {
        let existing = ctx.physics.body(name);
        if existing.is_some_and(|b| b.shape.is_some()) {
            log::debug!("刚体 '{}' 已存在", name);
            report.skipped.push(name.clone());
            continue;
        }

        if ctx.skeleton.find_bone(name).is_none() {
            log::warn!("骨架中没有骨骼 '{}'，跳过该刚体", name);
            report.record_failure(name, &RigError::BoneNotFound(name.clone()));
            continue;
        }
        if let Some(length) = bone_length(ctx, name) {
            if length < p.min_bone_size {
                log::debug!("骨骼 '{}' 长度 {:.3} 低于 {:.3}，跳过", name, length, p.min_bone_size);
                report.skipped.push(name.clone());
                continue;
            }
        }

        let shape = match fit_shape(ctx, name, p.geometry) {
            Ok(shape) => shape,
            Err(e) => {
                log::warn!("刚体 '{}' 图元拟合失败: {}", name, e);
                report.record_failure(name, &e);
                continue;
            }
        };

        // 已有刚体只补图元，质量/密度仅在参数给出时覆盖
        if let Some(body) = ctx.physics.body_mut(name) {
            body.set_shape(shape);
            if p.mass.is_some() {
                body.mass = p.mass;
            }
            if let Some(density) = p.density {
                body.density = density;
            }
            log::debug!("补全刚体 '{}' ({:?})", name, p.geometry);
            report.updated.push(name.clone());
            continue;
        }

        let mut body = Body::new(name.as_str()).with_shape(shape);
        body.mass = p.mass;
        if let Some(density) = p.density {
            body.density = density;
        }
        ctx.physics.add_body(body);
        log::debug!("创建刚体 '{}' ({:?})", name, p.geometry);
        report.created.push(name.clone());
    }

    log::info!(
        "创建刚体: 新建 {}, 更新 {}, 跳过 {}, 失败 {}",
        report.created.len(),
        report.updated.len(),
        report.skipped.len(),
        report.failed.len()
    );
    report
}

/// 重新拟合胶囊体
///
/// `names` 为空时处理所有胶囊体刚体；质量与密度保持不变。
pub fn align_capsules_to_bones(ctx: &mut RigContext, names: &[String]) -> SynthesisReport {
    let names: Vec<String> = if names.is_empty() {
        ctx.physics
            .bodies()
            .iter()
            .filter(|b| matches!(b.shape, Some(Shape::Capsule { .. })))
            .map(|b| b.name.clone())
            .collect()
    } else {
        names.to_vec()
    };

    let mut report = SynthesisReport::new();
    for name in &names {
        if ctx.physics.find_body(name).is_none() {
            report.record_failure(name, &RigError::BodyNotFound(name.clone()));
            continue;
        }
        let shape = match fit_shape(ctx, name, GeometryKind::Capsule) {
            Ok(shape) => shape,
            Err(e) => {
                log::warn!("胶囊体 '{}' 对齐失败: {}", name, e);
                report.record_failure(name, &e);
                continue;
            }
        };
        if let Some(body) = ctx.physics.body_mut(name) {
            body.set_shape(shape);
            report.updated.push(name.clone());
        }
    }
    log::info!("对齐胶囊体 {} 个", report.updated.len());
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::PhysicsRig;
    use crate::skeleton::{BoneTransform, Skeleton};
    use glam::Vec3;

    fn context() -> RigContext {
        let mut skeleton = Skeleton::new();
        skeleton.add_bone("pelvis", None, BoneTransform::IDENTITY).unwrap();
        skeleton
            .add_bone("thigh_l", Some("pelvis"), BoneTransform::from_translation(Vec3::new(0.0, -10.0, 0.0)))
            .unwrap();
        skeleton
            .add_bone("calf_l", Some("thigh_l"), BoneTransform::from_translation(Vec3::new(0.0, -20.0, 0.0)))
            .unwrap();
        skeleton
            .add_bone("tiny_l", Some("calf_l"), BoneTransform::from_translation(Vec3::new(0.0, -20.1, 0.0)))
            .unwrap();

        let cluster: Vec<Vec3> = (0..20)
            .map(|i| Vec3::new(i as f32 * 0.5, (i % 3) as f32, (i % 2) as f32 * 2.0))
            .collect();
        skeleton.set_vertex_cluster("thigh_l", cluster.clone());
        skeleton.set_vertex_cluster("calf_l", cluster.clone());
        skeleton.set_vertex_cluster("tiny_l", cluster);
        RigContext::new(skeleton, PhysicsRig::new())
    }

    fn params(geometry: GeometryKind) -> BodyCreateParams {
        BodyCreateParams {
            geometry,
            ..BodyCreateParams::default()
        }
    }

    #[test]
    fn test_create_bodies() {
        let mut ctx = context();
        let mut table = BTreeMap::new();
        table.insert("thigh_l".to_string(), params(GeometryKind::Capsule));
        table.insert("calf_l".to_string(), params(GeometryKind::Sphere));
        table.insert("pelvis".to_string(), params(GeometryKind::Convex));
        table.insert("missing_l".to_string(), params(GeometryKind::Sphere));
        table.insert(
            "tiny_l".to_string(),
            BodyCreateParams {
                min_bone_size: 1.0,
                ..params(GeometryKind::Capsule)
            },
        );

        let report = create_bodies(&mut ctx, &table);
        assert_eq!(report.created, vec!["calf_l", "thigh_l"]);
        assert_eq!(report.skipped, vec!["tiny_l"]);
        // pelvis 没有顶点簇，missing_l 不在骨架中
        assert_eq!(report.failed.len(), 2);
        assert!(ctx.physics.find_body("pelvis").is_none());

        let thigh = ctx.physics.body("thigh_l").unwrap();
        match thigh.shape.as_ref().unwrap() {
            Shape::Capsule { radius, length, .. } => {
                assert!(*radius >= 0.5);
                assert!((length - 10.0).abs() < 1e-4);
            }
            other => panic!("unexpected shape {other:?}"),
        }
        assert!(thigh.mass().unwrap() > 0.0);

        // 再次执行全部跳过
        let report = create_bodies(&mut ctx, &table);
        assert!(report.created.is_empty());
        assert!(report.skipped.contains(&"thigh_l".to_string()));
    }

    #[test]
    fn test_create_bodies_keeps_existing_mass() {
        let mut ctx = context();
        ctx.physics.add_body(Body::new("thigh_l").with_mass(12.0));
        let mut calf = Body::new("calf_l");
        calf.density = 3.0;
        ctx.physics.add_body(calf);

        let mut table = BTreeMap::new();
        table.insert("thigh_l".to_string(), params(GeometryKind::Capsule));
        table.insert(
            "calf_l".to_string(),
            BodyCreateParams {
                mass: Some(5.0),
                ..params(GeometryKind::Sphere)
            },
        );

        let report = create_bodies(&mut ctx, &table);
        assert_eq!(report.updated, vec!["calf_l", "thigh_l"]);
        assert!(report.created.is_empty());
        assert_eq!(ctx.physics.bodies().len(), 2);

        let thigh = ctx.physics.body("thigh_l").unwrap();
        assert!(matches!(thigh.shape, Some(Shape::Capsule { .. })));
        assert_eq!(thigh.mass(), Some(12.0));

        let calf = ctx.physics.body("calf_l").unwrap();
        assert!(matches!(calf.shape, Some(Shape::Sphere { .. })));
        assert_eq!(calf.mass(), Some(5.0));
        assert_eq!(calf.density, 3.0);
    }

    #[test]
    fn test_align_capsules() {
        let mut ctx = context();
        ctx.physics.add_body(Body::new("thigh_l").with_mass(3.0).with_shape(Shape::Capsule {
            center: Vec3::ZERO,
            rotation: glam::Quat::IDENTITY,
            radius: 99.0,
            length: 1.0,
        }));
        ctx.physics.add_body(Body::new("calf_l"));

        let report = align_capsules_to_bones(&mut ctx, &[]);
        assert_eq!(report.updated, vec!["thigh_l"]);
        let thigh = ctx.physics.body("thigh_l").unwrap();
        assert_eq!(thigh.mass(), Some(3.0));
        assert!(matches!(thigh.shape, Some(Shape::Capsule { radius, .. }) if radius < 99.0));

        let report = align_capsules_to_bones(&mut ctx, &["nope".to_string()]);
        assert_eq!(report.failed.len(), 1);
    }
}
