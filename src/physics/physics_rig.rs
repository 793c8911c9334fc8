//! 物理绑定容器
//!
//! 刚体与关节存放在数组中，名称 → 索引映射负责查找。
//! 碰撞禁用关系为对称关系，按刚体索引的无序对存储。

use std::collections::{HashMap, HashSet};

use super::body::Body;
use super::commit::RigCommit;
use super::constraint::Constraint;
use crate::{Result, RigError};

/// 物理绑定（刚体 + 关节）
#[derive(Clone, Debug, Default)]
pub struct PhysicsRig {
    bodies: Vec<Body>,
    body_index: HashMap<String, usize>,
    constraints: Vec<Constraint>,
    constraint_index: HashMap<String, usize>,
    /// 禁用碰撞的刚体对 (min, max)
    disabled_collisions: HashSet<(usize, usize)>,
    dirty: bool,
    refresh_requested: bool,
}

impl PhysicsRig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================
    // 刚体
    // ========================================

    /// 添加刚体，同名刚体已存在时替换并返回原索引
    pub fn add_body(&mut self, body: Body) -> usize {
        if let Some(&index) = self.body_index.get(&body.name) {
            self.bodies[index] = body;
            return index;
        }
        let index = self.bodies.len();
        self.body_index.insert(body.name.clone(), index);
        self.bodies.push(body);
        index
    }

    #[inline]
    pub fn find_body(&self, name: &str) -> Option<usize> {
        self.body_index.get(name).copied()
    }

    #[inline]
    pub fn body(&self, name: &str) -> Option<&Body> {
        self.find_body(name).map(|i| &self.bodies[i])
    }

    #[inline]
    pub fn body_mut(&mut self, name: &str) -> Option<&mut Body> {
        self.find_body(name).map(move |i| &mut self.bodies[i])
    }

    #[inline]
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body_names(&self) -> Vec<String> {
        self.bodies.iter().map(|b| b.name.clone()).collect()
    }

    /// 刚体质量（刚体不存在或无法推导时为 `None`）
    pub fn body_mass(&self, name: &str) -> Option<f32> {
        self.body(name).and_then(Body::mass)
    }

    // ========================================
    // 关节
    // ========================================

    /// 添加关节，名称重复时返回错误
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<usize> {
        if self.constraint_index.contains_key(&constraint.name) {
            return Err(RigError::DegenerateInput(format!(
                "duplicate constraint name '{}'",
                constraint.name
            )));
        }
        let index = self.constraints.len();
        self.constraint_index.insert(constraint.name.clone(), index);
        self.constraints.push(constraint);
        Ok(index)
    }

    #[inline]
    pub fn find_constraint(&self, name: &str) -> Option<usize> {
        self.constraint_index.get(name).copied()
    }

    #[inline]
    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.find_constraint(name).map(|i| &self.constraints[i])
    }

    #[inline]
    pub fn constraint_mut(&mut self, name: &str) -> Option<&mut Constraint> {
        self.find_constraint(name).map(move |i| &mut self.constraints[i])
    }

    #[inline]
    pub fn constraint_at(&self, index: usize) -> Option<&Constraint> {
        self.constraints.get(index)
    }

    #[inline]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    #[inline]
    pub fn constraints_mut(&mut self) -> &mut [Constraint] {
        &mut self.constraints
    }

    pub fn constraint_names(&self) -> Vec<String> {
        self.constraints.iter().map(|c| c.name.clone()).collect()
    }

    #[inline]
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    // ========================================
    // 碰撞
    // ========================================

    /// 禁用两个刚体之间的碰撞
    pub fn disable_collision(&mut self, a: &str, b: &str) -> Result<()> {
        let ia = self
            .find_body(a)
            .ok_or_else(|| RigError::BodyNotFound(a.to_string()))?;
        let ib = self
            .find_body(b)
            .ok_or_else(|| RigError::BodyNotFound(b.to_string()))?;
        self.disabled_collisions.insert((ia.min(ib), ia.max(ib)));
        Ok(())
    }

    /// 恢复两个刚体之间的碰撞，返回此前是否处于禁用状态
    pub fn enable_collision(&mut self, a: &str, b: &str) -> bool {
        match (self.find_body(a), self.find_body(b)) {
            (Some(ia), Some(ib)) => self.disabled_collisions.remove(&(ia.min(ib), ia.max(ib))),
            _ => false,
        }
    }

    pub fn is_collision_disabled(&self, a: &str, b: &str) -> bool {
        match (self.find_body(a), self.find_body(b)) {
            (Some(ia), Some(ib)) => self.disabled_collisions.contains(&(ia.min(ib), ia.max(ib))),
            _ => false,
        }
    }

    /// 禁用碰撞的刚体名称对（按索引排序，输出稳定）
    pub fn disabled_collision_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = self.disabled_collisions.iter().copied().collect();
        pairs.sort_unstable();
        pairs
            .into_iter()
            .map(|(a, b)| (self.bodies[a].name.clone(), self.bodies[b].name.clone()))
            .collect()
    }

    // ========================================
    // 状态
    // ========================================

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// 请求宿主刷新形状与拓扑
    #[inline]
    pub fn request_refresh(&mut self) {
        self.refresh_requested = true;
    }

    #[inline]
    pub fn refresh_requested(&self) -> bool {
        self.refresh_requested
    }

    /// 提交全部刚体、关节与碰撞关系
    pub fn commit(&self, sink: &mut dyn RigCommit) -> Result<()> {
        for body in &self.bodies {
            sink.commit_body(body)?;
        }
        for constraint in &self.constraints {
            sink.commit_constraint(constraint)?;
        }
        for (a, b) in self.disabled_collision_pairs() {
            sink.commit_disabled_collision(&a, &b)?;
        }
        sink.finish()?;

        log::info!(
            "物理绑定提交完成: {} 刚体, {} 关节, {} 碰撞禁用",
            self.bodies.len(),
            self.constraints.len(),
            self.disabled_collisions.len()
        );
        Ok(())
    }
}
