//! 拓扑装配
//!
//! 一条 `ConstraintTopologySpec` 的执行顺序：
//! 筛选刚体 → 调整刚体 → 调整关节 → 建近邻图 → 生成关节。
//! 开启镜像时换成镜像模式串与镜像锚点再执行一遍。

use super::adjust::{adjust_bodies, adjust_constraints};
use super::options::{ConstraintTopologySpec, RigAssemblyOptions};
use super::report::SynthesisReport;
use super::rings::add_ring_constraints;
use super::synthesizer::make_or_update_constraint;
use super::RigContext;
use crate::config::get_config;
use crate::naming::{filter_names, mirror_name, mirror_pattern, Side};
use crate::physics::{ConstraintEntry, ConstraintTemplate};
use crate::proximity::build_nearest_neighbors;
use crate::RigError;

// ============================================================================
// 执行阶段
// ============================================================================

/// 单条拓扑规则的执行阶段，只能前进
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TopologyStage {
    #[default]
    Selecting,
    AdjustingBodies,
    AdjustingConstraints,
    BuildingProximity,
    SynthesizingConstraints,
    Done,
}

impl TopologyStage {
    /// 前进到 `next`；目标阶段不在当前阶段之后时保持不变
    pub fn advance(&mut self, next: TopologyStage) -> bool {
        if next > *self {
            log::trace!("拓扑阶段 {:?} -> {:?}", self, next);
            *self = next;
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn is_done(self) -> bool {
        self == TopologyStage::Done
    }
}

// ============================================================================
// 最近点关节
// ============================================================================

/// 把 `targets` 中每个点连接到最近的至多 `neighbor_count` 个源点
///
/// `sources` 为空时源集 = 目标集（点到点），此时互为近邻的反向边只生成一次。
/// 关节名 `pt_pt_{目标}__{源}`，bone1 = 目标（子），bone2 = 源。
pub fn add_closest_point_constraints(
    ctx: &mut RigContext,
    template: &ConstraintTemplate,
    targets: &[String],
    sources: Option<&[String]>,
    neighbor_count: usize,
) -> SynthesisReport {
    let sources = sources.unwrap_or(targets);
    let counts = vec![neighbor_count; sources.len()];
    connect_closest(ctx, template, targets, sources, &counts, "pt_pt_")
}

/// 锚定骨骼到最近点的关节
///
/// 每个锚点使用自己的连接数。关节名 `pt_bone_{点}__{锚点}`。
pub fn add_anchor_constraints(
    ctx: &mut RigContext,
    template: &ConstraintTemplate,
    targets: &[String],
    anchors: &[(String, usize)],
) -> SynthesisReport {
    let (names, counts): (Vec<String>, Vec<usize>) = anchors.iter().cloned().unzip();
    connect_closest(ctx, template, targets, &names, &counts, "pt_bone_")
}

fn connect_closest(
    ctx: &mut RigContext,
    template: &ConstraintTemplate,
    targets: &[String],
    sources: &[String],
    counts: &[usize],
    prefix: &str,
) -> SynthesisReport {
    let mut report = SynthesisReport::new();
    let symmetric = sources == targets;

    let (target_points, missing_targets) = ctx.named_points(targets);
    let (source_points, missing_sources) = ctx.named_points(sources);
    for name in missing_targets.iter().chain(missing_sources.iter()) {
        log::warn!("骨架中没有骨骼 '{}'，跳过", name);
        report.record_failure(name, &RigError::BoneNotFound(name.clone()));
    }

    // 缺失的源点被剔除后，连接数仍按名称对应
    let source_counts: Vec<usize> = source_points
        .iter()
        .map(|p| {
            sources
                .iter()
                .position(|s| *s == p.name)
                .and_then(|i| counts.get(i).copied())
                .unwrap_or(0)
        })
        .collect();
    let max_count = source_counts.iter().copied().max().unwrap_or(0);
    if max_count == 0 || target_points.is_empty() {
        return report;
    }

    let (mut matrix, neighbors) = build_nearest_neighbors(&source_points, &target_points, max_count);
    for (i, list) in neighbors.iter().enumerate() {
        log::trace!("  源点: {}", source_points[i].name);
        for &j in list.iter().take(source_counts[i]) {
            if matrix.is_visited(i, j) {
                continue;
            }
            let target = &target_points[j].name;
            let source = &source_points[i].name;
            let name = format!("{prefix}{target}__{source}");
            let entry = ConstraintEntry::new(name.as_str(), target.as_str(), source.as_str(), template.clone());

            let result = make_or_update_constraint(ctx, &entry);
            if result.is_ok() {
                if symmetric {
                    matrix.mark_symmetric(i, j);
                } else {
                    matrix.mark(i, j);
                }
            }
            report.record(&name, &result);
        }
    }
    report
}

// ============================================================================
// 点到父骨骼
// ============================================================================

/// 每个刚体连接到骨架中的父骨骼，关节与刚体同名
pub fn add_point_to_parent(
    ctx: &mut RigContext,
    template: &ConstraintTemplate,
    bodies: &[String],
) -> SynthesisReport {
    let mut report = SynthesisReport::new();
    for body in bodies {
        let Some(parent) = ctx.skeleton.parent_name(body).map(str::to_string) else {
            log::error!("刚体 '{}' 没有父骨骼", body);
            report.record_failure(body, &RigError::NoParentBone(body.clone()));
            continue;
        };
        let entry = ConstraintEntry::new(body.as_str(), body.as_str(), parent.as_str(), template.clone());
        let result = make_or_update_constraint(ctx, &entry);
        if result.is_ok() {
            log::debug!("父骨骼关节 {} -> {}", body, parent);
        }
        report.record(body, &result);
    }
    report
}

// ============================================================================
// 拓扑规则
// ============================================================================

/// 执行一条拓扑规则（含镜像侧）
pub fn apply_topology(ctx: &mut RigContext, spec: &ConstraintTopologySpec) -> SynthesisReport {
    let mut report = SynthesisReport::new();
    let passes = if spec.mirror { 2 } else { 1 };
    for pass in 0..passes {
        let mirrored = pass == 1;
        report.merge(apply_topology_side(ctx, spec, mirrored));
    }
    log::info!(
        "规则 '{}': 新增或修改 {} 个关节, {} 个失败",
        spec.pattern,
        report.count(),
        report.failed.len()
    );
    report
}

fn apply_topology_side(
    ctx: &mut RigContext,
    spec: &ConstraintTopologySpec,
    mirrored: bool,
) -> SynthesisReport {
    let mut report = SynthesisReport::new();
    let mut stage = TopologyStage::Selecting;

    let pattern = if mirrored {
        mirror_pattern(&spec.pattern)
    } else {
        spec.pattern.clone()
    };

    let body_names = ctx.physics.body_names();
    let targets = match filter_names(&body_names, &pattern) {
        Ok(targets) => targets,
        Err(e) => {
            log::warn!("模式 '{}' 无效: {}", pattern, e);
            report.record_failure(&pattern, &e);
            stage.advance(TopologyStage::Done);
            return report;
        }
    };
    if targets.is_empty() {
        log::warn!("模式 '{}' 没有匹配的刚体", pattern);
        stage.advance(TopologyStage::Done);
        return report;
    }
    log::debug!("模式 '{}': {} 个刚体", pattern, targets.len());

    if spec.adjust_bodies {
        stage.advance(TopologyStage::AdjustingBodies);
        let n = adjust_bodies(ctx, &spec.adjust_bodies_options, &targets);
        log::debug!("  调整刚体 {} 个", n);
    }
    if spec.adjust_constraints {
        stage.advance(TopologyStage::AdjustingConstraints);
        let n = adjust_constraints(ctx, &spec.adjust_constraints_options, &targets);
        log::debug!("  调整关节 {} 个", n);
    }

    stage.advance(TopologyStage::BuildingProximity);
    let sources = match &spec.source_pattern {
        Some(source_pattern) => {
            let source_pattern = if mirrored {
                mirror_pattern(source_pattern)
            } else {
                source_pattern.clone()
            };
            match filter_names(&body_names, &source_pattern) {
                Ok(sources) => Some(sources),
                Err(e) => {
                    log::warn!("源模式 '{}' 无效: {}", source_pattern, e);
                    report.record_failure(&source_pattern, &e);
                    stage.advance(TopologyStage::Done);
                    return report;
                }
            }
        }
        None => None,
    };
    let anchors = anchor_counts(spec, mirrored);

    stage.advance(TopologyStage::SynthesizingConstraints);
    if spec.add_point_to_point {
        report.merge(add_closest_point_constraints(
            ctx,
            &spec.point_to_point,
            &targets,
            sources.as_deref(),
            spec.effective_neighbor_count(),
        ));
    }
    if spec.add_point_to_parent {
        report.merge(add_point_to_parent(ctx, &spec.point_to_parent, &targets));
    }
    if !anchors.is_empty() {
        report.merge(add_anchor_constraints(ctx, &spec.extra_bones_template, &targets, &anchors));
    }

    stage.advance(TopologyStage::Done);
    report
}

/// 锚点名称与连接数
///
/// 镜像侧先查镜像名，再用原名的数量；数量为 0 时取配置默认值。
fn anchor_counts(spec: &ConstraintTopologySpec, mirrored: bool) -> Vec<(String, usize)> {
    let fallback = get_config().default_extra_bone_neighbors;
    spec.extra_bones
        .iter()
        .map(|(name, &count)| {
            let (name, count) = if mirrored {
                let mirror = mirror_name(name);
                let count = spec.extra_bones.get(&mirror).copied().unwrap_or(count);
                (mirror, count)
            } else {
                (name.clone(), count)
            };
            let count = if count == 0 { fallback } else { count };
            (name, count.min(spec.max_neighbor_count))
        })
        .collect()
}

// ============================================================================
// 整体装配
// ============================================================================

/// 按固定顺序执行全部开启的拓扑规则，完成后标记绑定已修改并请求刷新
pub fn assemble_full_rig(ctx: &mut RigContext, options: &RigAssemblyOptions) -> SynthesisReport {
    let mut report = SynthesisReport::new();

    let stages = [
        (options.add_glute_cores, &options.glute_cores),
        (options.add_glute_spokes, &options.glute_spokes),
        (options.add_glute_points, &options.glute_points),
        (options.add_breast_cores, &options.breast_cores),
        (options.add_breast_spokes, &options.breast_spokes),
        (options.add_breast_points, &options.breast_points),
    ];
    for (enabled, spec) in stages {
        if enabled {
            report.merge(apply_topology(ctx, spec));
        }
    }

    if options.add_breast_rings {
        report.merge(add_ring_constraints(ctx, &options.breast_rings, Side::Left));
        if options.breast_rings.mirror {
            report.merge(add_ring_constraints(ctx, &options.breast_rings, Side::Right));
        }
    }

    ctx.physics.mark_dirty();
    ctx.physics.request_refresh();
    log::info!(
        "绑定装配完成: 新建 {}, 更新 {}, 跳过 {}, 失败 {}",
        report.created.len(),
        report.updated.len(),
        report.skipped.len(),
        report.failed.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{Body, PhysicsRig};
    use crate::skeleton::{BoneTransform, Skeleton};
    use glam::Vec3;
    use std::collections::HashSet;

    fn add(skeleton: &mut Skeleton, physics: &mut PhysicsRig, name: &str, parent: Option<&str>, p: Vec3) {
        skeleton
            .add_bone(name, parent, BoneTransform::from_translation(p))
            .unwrap();
        physics.add_body(Body::new(name).with_mass(1.0));
    }

    fn glute_context() -> RigContext {
        let mut skeleton = Skeleton::new();
        let mut physics = PhysicsRig::new();
        add(&mut skeleton, &mut physics, "pelvis", None, Vec3::ZERO);
        add(&mut skeleton, &mut physics, "glute_01_l", Some("pelvis"), Vec3::new(1.0, 0.0, 0.0));
        add(&mut skeleton, &mut physics, "glute_02_l", Some("pelvis"), Vec3::new(2.0, 0.5, 0.0));
        add(&mut skeleton, &mut physics, "glute_03_l", Some("pelvis"), Vec3::new(4.0, 0.0, 1.0));
        RigContext::new(skeleton, physics)
    }

    fn unordered_pairs(ctx: &RigContext) -> HashSet<(String, String)> {
        ctx.physics
            .constraints()
            .iter()
            .map(|c| {
                if c.bone1 < c.bone2 {
                    (c.bone1.clone(), c.bone2.clone())
                } else {
                    (c.bone2.clone(), c.bone1.clone())
                }
            })
            .collect()
    }

    #[test]
    fn test_stage_forward_only() {
        let mut stage = TopologyStage::default();
        assert!(stage.advance(TopologyStage::BuildingProximity));
        assert!(!stage.advance(TopologyStage::AdjustingBodies));
        assert_eq!(stage, TopologyStage::BuildingProximity);
        assert!(stage.advance(TopologyStage::Done));
        assert!(stage.is_done());
        assert!(!stage.advance(TopologyStage::Done));
    }

    #[test]
    fn test_point_to_point_scenario() {
        let mut ctx = glute_context();
        let mut spec = ConstraintTopologySpec::new(r"glute_(\d{2})_l");
        spec.neighbor_count = 2;
        spec.mirror = false;
        spec.add_point_to_point = true;

        let report = apply_topology(&mut ctx, &spec);
        assert!(report.is_clean());

        let constraints = ctx.physics.constraints();
        assert!(constraints.iter().all(|c| c.bone1 != c.bone2));
        assert_eq!(unordered_pairs(&ctx).len(), constraints.len());
        for bone in ["glute_01_l", "glute_02_l", "glute_03_l"] {
            let degree = constraints.iter().filter(|c| c.connects(bone)).count();
            assert!(degree <= 2, "{bone} has {degree} edges");
        }
        assert_eq!(constraints.len(), 3);
        assert!(ctx.physics.find_constraint("pt_pt_glute_02_l__glute_01_l").is_some());

        // 再次执行不产生新关节
        let before = ctx.physics.constraints().to_vec();
        let report = apply_topology(&mut ctx, &spec);
        assert_eq!(report.count(), 0);
        assert_eq!(ctx.physics.constraints(), before.as_slice());
    }

    #[test]
    fn test_point_to_parent_scenario() {
        let mut skeleton = Skeleton::new();
        let mut physics = PhysicsRig::new();
        add(&mut skeleton, &mut physics, "breast_01_l", None, Vec3::new(0.0, 10.0, 0.0));
        add(
            &mut skeleton,
            &mut physics,
            "breast_pt_01_01_l",
            Some("breast_01_l"),
            Vec3::new(1.0, 11.0, 0.0),
        );
        let mut ctx = RigContext::new(skeleton, physics);

        let mut spec = ConstraintTopologySpec::new(r"breast_pt_(\d{2})_(\d{2})_l");
        spec.add_point_to_parent = true;

        let report = apply_topology(&mut ctx, &spec);
        assert_eq!(report.created, vec!["breast_pt_01_01_l"]);
        assert_eq!(ctx.physics.constraint_count(), 1);
        let c = ctx.physics.constraint("breast_pt_01_01_l").unwrap();
        assert_eq!(c.bone2, "breast_01_l");

        let before = ctx.physics.constraints().to_vec();
        let report = apply_topology(&mut ctx, &spec);
        assert_eq!(report.skipped, vec!["breast_pt_01_01_l"]);
        assert_eq!(ctx.physics.constraints(), before.as_slice());
    }

    #[test]
    fn test_root_body_has_no_parent() {
        let mut ctx = glute_context();
        let report = add_point_to_parent(&mut ctx, &ConstraintTemplate::soft_point(), &["pelvis".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(ctx.physics.constraint_count(), 0);
    }

    #[test]
    fn test_anchor_counts_and_mirror() {
        let mut skeleton = Skeleton::new();
        let mut physics = PhysicsRig::new();
        add(&mut skeleton, &mut physics, "pelvis", None, Vec3::ZERO);
        for (i, side) in [(1.0, "l"), (-1.0, "r")] {
            let thigh = format!("thigh_{side}");
            add(&mut skeleton, &mut physics, &thigh, Some("pelvis"), Vec3::new(i * 2.0, -1.0, 0.0));
            for k in 1..=4 {
                let name = format!("glute_01_01_{k:02}_pt_{side}");
                let p = Vec3::new(i * (1.0 + k as f32 * 0.5), -0.5, 1.0);
                add(&mut skeleton, &mut physics, &name, Some(thigh.as_str()), p);
            }
        }
        let mut ctx = RigContext::new(skeleton, physics);

        let mut spec = ConstraintTopologySpec::new(r"glute_(\d{2})_(\d{2})_(\d{2})_pt_l");
        spec.extra_bones.insert("thigh_l".to_string(), 2);
        spec.extra_bones.insert("pelvis".to_string(), 1);

        let report = apply_topology(&mut ctx, &spec);
        assert!(report.is_clean());
        // 每侧: thigh 2 + pelvis 1
        assert_eq!(ctx.physics.constraint_count(), 6);
        let to_thigh_r = ctx
            .physics
            .constraints()
            .iter()
            .filter(|c| c.bone2 == "thigh_r")
            .count();
        assert_eq!(to_thigh_r, 2);
        assert!(ctx
            .physics
            .constraints()
            .iter()
            .all(|c| c.name.starts_with("pt_bone_")));
    }

    #[test]
    fn test_missing_anchor_reported() {
        let mut ctx = glute_context();
        let targets = vec!["glute_01_l".to_string()];
        let report = add_anchor_constraints(
            &mut ctx,
            &ConstraintTemplate::soft_point(),
            &targets,
            &[("thigh_l".to_string(), 3), ("pelvis".to_string(), 1)],
        );
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.created, vec!["pt_bone_glute_01_l__pelvis"]);
    }

    #[test]
    fn test_full_rig_idempotent() {
        let mut ctx = glute_context();
        ctx.physics.add_body(Body::new("thigh_l").with_mass(1.0));
        ctx.skeleton
            .add_bone("thigh_l", Some("pelvis"), BoneTransform::from_translation(Vec3::new(2.0, -2.0, 0.0)))
            .unwrap();
        for k in 1..=3 {
            let name = format!("glute_01_01_{k:02}_pt_l");
            let p = Vec3::new(1.0 + k as f32, -1.0, 0.5);
            ctx.skeleton
                .add_bone(&name, Some("glute_01_l"), BoneTransform::from_translation(p))
                .unwrap();
            ctx.physics.add_body(Body::new(name).with_mass(0.5));
        }

        let mut options = RigAssemblyOptions::default();
        options.add_glute_cores = true;
        options.glute_cores.add_point_to_point = true;
        options.glute_points.add_point_to_point = true;
        options.glute_points.add_point_to_parent = true;

        let report = assemble_full_rig(&mut ctx, &options);
        assert!(ctx.physics.is_dirty());
        assert!(ctx.physics.refresh_requested());
        let created = report.created.len();
        assert_eq!(created, ctx.physics.constraint_count());

        let names: HashSet<_> = ctx.physics.constraint_names().into_iter().collect();
        assert_eq!(names.len(), ctx.physics.constraint_count());

        let before = ctx.physics.constraints().to_vec();
        let report = assemble_full_rig(&mut ctx, &options);
        assert!(report.created.is_empty());
        assert!(report.updated.is_empty());
        assert_eq!(ctx.physics.constraints(), before.as_slice());
    }
}
