//! 两阶段姿态快照
//!
//! 宿主动画姿态需要一段时间才能传播到骨骼上。
//! 第一阶段记录请求时间，稳定时间过后第二阶段才读取姿态。

use std::time::{Duration, Instant};

use super::BoneTransform;
use crate::config::get_config;
use crate::{Result, RigError};

/// 宿主姿态来源
pub trait PoseSource {
    /// 采样每根骨骼相对父骨骼的变换（与骨架存储顺序一致）
    fn sample_local_pose(&self) -> Vec<BoneTransform>;
}

/// 姿态快照（本地变换）
#[derive(Clone, Debug, Default)]
pub struct PoseSnapshot {
    local_transforms: Vec<BoneTransform>,
}

impl PoseSnapshot {
    pub fn from_local_transforms(local_transforms: Vec<BoneTransform>) -> Self {
        Self { local_transforms }
    }

    #[inline]
    pub fn local_transforms(&self) -> &[BoneTransform] {
        &self.local_transforms
    }
}

/// 姿态快照请求
#[derive(Clone, Copy, Debug)]
pub struct PoseSnapshotRequest {
    requested_at: Instant,
    settle: Duration,
}

impl Default for PoseSnapshotRequest {
    /// 以当前时间和配置的稳定时间发起请求
    fn default() -> Self {
        Self::new(get_config().pose_settle_delay)
    }
}

impl PoseSnapshotRequest {
    /// 以当前时间发起请求
    pub fn new(settle: Duration) -> Self {
        Self::at(Instant::now(), settle)
    }

    /// 以指定时间发起请求
    pub fn at(requested_at: Instant, settle: Duration) -> Self {
        Self {
            requested_at,
            settle,
        }
    }

    /// 剩余等待时间
    pub fn remaining(&self, now: Instant) -> Duration {
        (self.requested_at + self.settle).saturating_duration_since(now)
    }

    #[inline]
    pub fn is_settled(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }

    /// 稳定后读取姿态，未稳定时返回 `PoseNotSettled`
    pub fn try_consume(&self, now: Instant, source: &dyn PoseSource) -> Result<PoseSnapshot> {
        let remaining = self.remaining(now);
        if !remaining.is_zero() {
            return Err(RigError::PoseNotSettled {
                remaining_ms: remaining.as_millis(),
            });
        }
        let snapshot = PoseSnapshot::from_local_transforms(source.sample_local_pose());
        log::info!("姿态快照完成: {} 骨骼", snapshot.local_transforms.len());
        Ok(snapshot)
    }
}
