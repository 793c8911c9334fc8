//! 合成结果统计
//!
//! 批处理从不因单项失败而中断，失败与跳过都记录在报告中交给调用方。

use crate::{Result, RigError};

/// 单个关节的处理结果（关节索引）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintOutcome {
    /// 新建
    Created(usize),
    /// 已存在且模板允许覆盖
    Updated(usize),
    /// 已存在且模板禁止覆盖，未做任何修改
    Unchanged(usize),
}

impl ConstraintOutcome {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            ConstraintOutcome::Created(i)
            | ConstraintOutcome::Updated(i)
            | ConstraintOutcome::Unchanged(i) => i,
        }
    }

    #[inline]
    pub fn is_created(self) -> bool {
        matches!(self, ConstraintOutcome::Created(_))
    }
}

/// 批处理报告
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SynthesisReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    /// 策略跳过（已存在且不允许覆盖）
    pub skipped: Vec<String>,
    /// (名称, 原因)
    pub failed: Vec<(String, String)>,
}

impl SynthesisReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新建 + 更新的关节数
    #[inline]
    pub fn count(&self) -> usize {
        self.created.len() + self.updated.len()
    }

    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// 记录单个关节结果
    pub fn record(&mut self, name: &str, result: &Result<ConstraintOutcome>) {
        match result {
            Ok(ConstraintOutcome::Created(_)) => self.created.push(name.to_string()),
            Ok(ConstraintOutcome::Updated(_)) => self.updated.push(name.to_string()),
            Ok(ConstraintOutcome::Unchanged(_)) => self.skipped.push(name.to_string()),
            Err(e) => self.record_failure(name, e),
        }
    }

    pub fn record_failure(&mut self, name: &str, error: &RigError) {
        self.failed.push((name.to_string(), error.to_string()));
    }

    /// 合并另一份报告
    pub fn merge(&mut self, other: SynthesisReport) {
        self.created.extend(other.created);
        self.updated.extend(other.updated);
        self.skipped.extend(other.skipped);
        self.failed.extend(other.failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_merge() {
        let mut report = SynthesisReport::new();
        report.record("a", &Ok(ConstraintOutcome::Created(0)));
        report.record("b", &Ok(ConstraintOutcome::Unchanged(1)));
        report.record("c", &Err(RigError::BodyNotFound("x".into())));

        let mut other = SynthesisReport::new();
        other.record("d", &Ok(ConstraintOutcome::Updated(2)));
        report.merge(other);

        assert_eq!(report.count(), 2);
        assert_eq!(report.skipped, vec!["b"]);
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_clean());
        assert_eq!(ConstraintOutcome::Updated(7).index(), 7);
    }
}
