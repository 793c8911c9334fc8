//! 胸部环形拓扑
//!
//! 点骨骼 `breast_pt_SS_PP_c`（第 SS 条辐条上的第 PP 个点），辐条骨骼 `breast_pt_SS_c`。
//! - ring: 相邻辐条同一层的点
//! - tangent: 相邻辐条错开一层的点
//! - root: 辐条骨骼到核心骨骼

use std::collections::{BTreeMap, BTreeSet, HashSet};

use regex::Regex;

use super::options::RingConstraintOptions;
use super::report::SynthesisReport;
use super::synthesizer::make_or_update_constraint;
use super::RigContext;
use crate::naming::{mirror_name, Side};
use crate::physics::ConstraintEntry;
use crate::RigError;

fn point_name(spoke: u32, point: u32, c: char) -> String {
    format!("breast_pt_{spoke:02}_{point:02}_{c}")
}

fn spoke_name(spoke: u32, c: char) -> String {
    format!("breast_pt_{spoke:02}_{c}")
}

fn constraint_name(kind: &str, spoke: u32, point: u32, c: char) -> String {
    format!("breast_{kind}_{spoke:02}_{point:02}_{c}")
}

/// 从刚体名中解析出 辐条 → 点编号集合
fn collect_points(names: &[String], c: char) -> crate::Result<BTreeMap<u32, BTreeSet<u32>>> {
    let re = Regex::new(&format!(r"^breast_pt_(\d{{2}})_(\d{{2}})_{c}$"))?;
    let mut spokes: BTreeMap<u32, BTreeSet<u32>> = BTreeMap::new();
    for name in names {
        let Some(caps) = re.captures(name) else {
            continue;
        };
        let (Ok(spoke), Ok(point)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
            continue;
        };
        spokes.entry(spoke).or_default().insert(point);
    }
    Ok(spokes)
}

/// 生成一侧的环形/切向/根部关节
///
/// 辐条按编号排序后首尾相接；同一对刚体只生成一个关节。
pub fn add_ring_constraints(
    ctx: &mut RigContext,
    options: &RingConstraintOptions,
    side: Side,
) -> SynthesisReport {
    let mut report = SynthesisReport::new();
    let Some(c) = side.suffix() else {
        log::warn!("环形关节需要左右侧，忽略 {:?}", side);
        return report;
    };

    let spokes = match collect_points(&ctx.physics.body_names(), c) {
        Ok(spokes) => spokes,
        Err(e) => {
            report.record_failure("breast_pt", &e);
            return report;
        }
    };
    let order: Vec<u32> = spokes.keys().copied().collect();

    let mut entries = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut push = |name: String, a: String, b: String, entries: &mut Vec<ConstraintEntry>| {
        let key = if a < b { (a.clone(), b.clone()) } else { (b.clone(), a.clone()) };
        if a != b && seen.insert(key) {
            entries.push(ConstraintEntry::new(name, a, b, options.template.clone()));
        }
    };

    if order.len() >= 2 && (options.add_ring || options.add_tangent) {
        for (k, &spoke) in order.iter().enumerate() {
            let next = order[(k + 1) % order.len()];
            let next_points = &spokes[&next];
            for &point in &spokes[&spoke] {
                if options.add_ring && next_points.contains(&point) {
                    push(
                        constraint_name("ring", spoke, point, c),
                        point_name(spoke, point, c),
                        point_name(next, point, c),
                        &mut entries,
                    );
                }
                if options.add_tangent && next_points.contains(&(point + 1)) {
                    push(
                        constraint_name("tangent", spoke, point, c),
                        point_name(spoke, point, c),
                        point_name(next, point + 1, c),
                        &mut entries,
                    );
                }
            }
        }
    }

    if options.add_root {
        let core = match side {
            Side::Right => mirror_name(&options.core_bone),
            _ => options.core_bone.clone(),
        };
        if ctx.physics.find_body(&core).is_none() {
            log::warn!("核心刚体 '{}' 不存在", core);
            report.record_failure(&core, &RigError::BodyNotFound(core.clone()));
        } else {
            for &spoke in &order {
                push(
                    constraint_name("root", spoke, 0, c),
                    spoke_name(spoke, c),
                    core.clone(),
                    &mut entries,
                );
            }
        }
    }

    for entry in &entries {
        let result = make_or_update_constraint(ctx, entry);
        report.record(&entry.name, &result);
    }
    log::info!(
        "胸部环形关节 ({}): {} 条辐条, 新增或修改 {} 个",
        c,
        order.len(),
        report.count()
    );
    report
}
