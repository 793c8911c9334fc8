//! 近邻图构建
//!
//! 源点集 × 目标点集的距离矩阵只计算一次；每个源点用插入排序保留最近的 N 个目标。
//! 访问标记矩阵防止同一对骨骼（含互为近邻的反向边）重复生成关节。

use glam::Vec3;

/// 带名称的点（骨骼世界位置）
#[derive(Clone, Debug, PartialEq)]
pub struct NamedPoint {
    pub name: String,
    pub position: Vec3,
}

impl NamedPoint {
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

/// 距离矩阵 + 访问标记（行 = 源，列 = 目标）
#[derive(Clone, Debug)]
pub struct AdjacencyMatrix {
    rows: usize,
    cols: usize,
    distances: Vec<f32>,
    visited: Vec<bool>,
}

impl AdjacencyMatrix {
    /// 计算全部源-目标距离
    pub fn build(sources: &[NamedPoint], targets: &[NamedPoint]) -> Self {
        let rows = sources.len();
        let cols = targets.len();
        let mut distances = Vec::with_capacity(rows * cols);
        for s in sources {
            for t in targets {
                distances.push(s.position.distance(t.position));
            }
        }
        Self {
            rows,
            cols,
            distances,
            visited: vec![false; rows * cols],
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn distance(&self, source: usize, target: usize) -> f32 {
        self.distances[source * self.cols + target]
    }

    #[inline]
    pub fn is_visited(&self, source: usize, target: usize) -> bool {
        self.visited[source * self.cols + target]
    }

    #[inline]
    pub fn mark(&mut self, source: usize, target: usize) {
        self.visited[source * self.cols + target] = true;
    }

    /// 同时标记反向边（仅当源集与目标集相同时有意义）
    pub fn mark_symmetric(&mut self, source: usize, target: usize) {
        self.mark(source, target);
        if target < self.rows && source < self.cols {
            self.mark(target, source);
        }
    }

    /// 每个源点最近的至多 `n` 个目标索引，由近到远
    ///
    /// 同名点（自身）始终排除；距离相同时先出现的目标优先。
    pub fn nearest_neighbors(
        &self,
        sources: &[NamedPoint],
        targets: &[NamedPoint],
        n: usize,
    ) -> Vec<Vec<usize>> {
        let mut result = Vec::with_capacity(self.rows);
        // 邻居数很小（3~5），插入排序足够
        let mut slots: Vec<(usize, f32)> = Vec::with_capacity(n + 1);
        for (i, source) in sources.iter().enumerate().take(self.rows) {
            slots.clear();
            for (j, target) in targets.iter().enumerate().take(self.cols) {
                if source.name == target.name {
                    continue;
                }
                let d = self.distance(i, j);
                let pos = slots.iter().position(|&(_, sd)| d < sd).unwrap_or(slots.len());
                if pos < n {
                    slots.insert(pos, (j, d));
                    slots.truncate(n);
                }
            }
            result.push(slots.iter().map(|&(j, _)| j).collect());
        }
        result
    }
}

/// 最近邻结果：距离矩阵 + 每源点邻居列表
pub fn build_nearest_neighbors(
    sources: &[NamedPoint],
    targets: &[NamedPoint],
    n: usize,
) -> (AdjacencyMatrix, Vec<Vec<usize>>) {
    let matrix = AdjacencyMatrix::build(sources, targets);
    let neighbors = matrix.nearest_neighbors(sources, targets, n);
    (matrix, neighbors)
}

/// 生成去重后的边 `(source, target)`
///
/// `symmetric` 为真时（源集即目标集）反向边也被标记，先写者生效。
pub fn build_edges(
    sources: &[NamedPoint],
    targets: &[NamedPoint],
    n: usize,
    symmetric: bool,
) -> Vec<(usize, usize)> {
    let (mut matrix, neighbors) = build_nearest_neighbors(sources, targets, n);
    let mut edges = Vec::new();
    for (i, list) in neighbors.iter().enumerate() {
        for &j in list {
            if matrix.is_visited(i, j) {
                continue;
            }
            edges.push((i, j));
            if symmetric {
                matrix.mark_symmetric(i, j);
            } else {
                matrix.mark(i, j);
            }
        }
    }
    edges
}
