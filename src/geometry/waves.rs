//! 水面波浪模拟
//!
//! 在 m×n 网格上用有限差分求解二维波动方程。
//! 边界行列的高度恒为 0。

use crate::engine_warn;
use crate::math::Vector3;

/// 波浪网格
#[derive(Debug, Clone)]
pub struct Waves {
    num_rows: usize,
    num_cols: usize,

    // 模拟常数
    k1: f32,
    k2: f32,
    k3: f32,

    time_step: f32,
    spatial_step: f32,
    accumulated: f32,

    prev_solution: Vec<Vector3>,
    curr_solution: Vec<Vector3>,
    normals: Vec<Vector3>,
    tangent_x: Vec<Vector3>,
}

impl Waves {
    /// 创建波浪网格
    ///
    /// - `m`, `n`: 行数与列数
    /// - `dx`: 网格间距
    /// - `dt`: 模拟步长（秒）
    /// - `speed`: 波速
    /// - `damping`: 阻尼
    pub fn new(m: usize, n: usize, dx: f32, dt: f32, speed: f32, damping: f32) -> Self {
        let d = damping * dt + 2.0;
        let e = (speed * speed) * (dt * dt) / (dx * dx);

        let half_width = (n.saturating_sub(1)) as f32 * dx * 0.5;
        let half_depth = (m.saturating_sub(1)) as f32 * dx * 0.5;

        let mut positions = Vec::with_capacity(m * n);
        for i in 0..m {
            let z = half_depth - i as f32 * dx;
            for j in 0..n {
                let x = -half_width + j as f32 * dx;
                positions.push(Vector3::new(x, 0.0, z));
            }
        }

        Self {
            num_rows: m,
            num_cols: n,
            k1: (damping * dt - 2.0) / d,
            k2: (4.0 - 8.0 * e) / d,
            k3: (2.0 * e) / d,
            time_step: dt,
            spatial_step: dx,
            accumulated: 0.0,
            prev_solution: positions.clone(),
            curr_solution: positions,
            normals: vec![Vector3::y(); m * n],
            tangent_x: vec![Vector3::x(); m * n],
        }
    }

    pub fn row_count(&self) -> usize {
        self.num_rows
    }

    pub fn column_count(&self) -> usize {
        self.num_cols
    }

    pub fn vertex_count(&self) -> usize {
        self.num_rows * self.num_cols
    }

    pub fn triangle_count(&self) -> usize {
        self.num_rows.saturating_sub(1) * self.num_cols.saturating_sub(1) * 2
    }

    pub fn width(&self) -> f32 {
        self.num_cols as f32 * self.spatial_step
    }

    pub fn depth(&self) -> f32 {
        self.num_rows as f32 * self.spatial_step
    }

    /// 第 i 个网格点的当前位置
    pub fn position(&self, i: usize) -> Vector3 {
        self.curr_solution[i]
    }

    /// 第 i 个网格点的法线
    pub fn normal(&self, i: usize) -> Vector3 {
        self.normals[i]
    }

    /// 第 i 个网格点沿 x 方向的切线
    pub fn tangent_x(&self, i: usize) -> Vector3 {
        self.tangent_x[i]
    }

    /// 推进模拟
    ///
    /// 累计时间达到步长才计算一步，返回这一帧是否计算过。
    pub fn update(&mut self, dt: f32) -> bool {
        self.accumulated += dt;
        if self.accumulated < self.time_step {
            return false;
        }

        let n = self.num_cols;
        let (k1, k2, k3) = (self.k1, self.k2, self.k3);

        // 只更新内部点，新结果写入 prev 后交换
        for i in 1..self.num_rows.saturating_sub(1) {
            for j in 1..n.saturating_sub(1) {
                let curr = &self.curr_solution;
                let neighbours = curr[(i + 1) * n + j].y
                    + curr[(i - 1) * n + j].y
                    + curr[i * n + j + 1].y
                    + curr[i * n + j - 1].y;
                let next = k1 * self.prev_solution[i * n + j].y + k2 * curr[i * n + j].y + k3 * neighbours;
                self.prev_solution[i * n + j].y = next;
            }
        }

        std::mem::swap(&mut self.prev_solution, &mut self.curr_solution);
        self.accumulated = 0.0;

        // 中心差分计算法线与切线
        let two_dx = 2.0 * self.spatial_step;
        for i in 1..self.num_rows.saturating_sub(1) {
            for j in 1..n.saturating_sub(1) {
                let curr = &self.curr_solution;
                let l = curr[i * n + j - 1].y;
                let r = curr[i * n + j + 1].y;
                let t = curr[(i - 1) * n + j].y;
                let b = curr[(i + 1) * n + j].y;

                self.normals[i * n + j] = Vector3::new(-r + l, two_dx, b - t).normalize();
                self.tangent_x[i * n + j] = Vector3::new(two_dx, r - l, 0.0).normalize();
            }
        }

        true
    }

    /// 在 (i, j) 处激起波纹
    ///
    /// 中心点升高 `magnitude`，四个相邻点升高一半。
    /// 要求 1 < i < m-2 且 1 < j < n-2，否则不做任何修改并返回 `false`。
    pub fn disturb(&mut self, i: usize, j: usize, magnitude: f32) -> bool {
        let rows_ok = i > 1 && i + 2 < self.num_rows;
        let cols_ok = j > 1 && j + 2 < self.num_cols;
        if !rows_ok || !cols_ok {
            engine_warn!(i, j, "disturb outside the wave interior ignored");
            return false;
        }

        let n = self.num_cols;
        let half = 0.5 * magnitude;

        self.curr_solution[i * n + j].y += magnitude;
        self.curr_solution[i * n + j + 1].y += half;
        self.curr_solution[i * n + j - 1].y += half;
        self.curr_solution[(i + 1) * n + j].y += half;
        self.curr_solution[(i - 1) * n + j].y += half;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn boundary_heights(waves: &Waves) -> impl Iterator<Item = f32> + '_ {
        let (m, n) = (waves.row_count(), waves.column_count());
        (0..m * n)
            .filter(move |&k| {
                let (i, j) = (k / n, k % n);
                i == 0 || j == 0 || i == m - 1 || j == n - 1
            })
            .map(|k| waves.position(k).y)
    }

    #[test]
    fn test_grid_layout() {
        let waves = Waves::new(128, 128, 1.0, 0.03, 4.0, 0.2);
        assert_eq!(waves.vertex_count(), 128 * 128);
        assert_eq!(waves.triangle_count(), 127 * 127 * 2);
        assert_eq!(waves.width(), 128.0);
        assert_eq!(waves.depth(), 128.0);

        let first = waves.position(0);
        assert!((first.x + 63.5).abs() < EPS);
        assert!((first.z - 63.5).abs() < EPS);
        assert_eq!(waves.normal(0), Vector3::y());
    }

    #[test]
    fn test_update_waits_for_time_step() {
        let mut waves = Waves::new(16, 16, 1.0, 0.03, 4.0, 0.2);
        assert!(!waves.update(0.01));
        assert!(!waves.update(0.01));
        assert!(waves.update(0.015));
        assert!(!waves.update(0.0));
    }

    #[test]
    fn test_disturb_raises_cell_and_neighbours() {
        let mut waves = Waves::new(16, 16, 1.0, 0.03, 4.0, 0.2);
        assert!(waves.disturb(5, 6, 0.4));

        let n = waves.column_count();
        assert!((waves.position(5 * n + 6).y - 0.4).abs() < EPS);
        assert!((waves.position(5 * n + 7).y - 0.2).abs() < EPS);
        assert!((waves.position(4 * n + 6).y - 0.2).abs() < EPS);
        assert_eq!(waves.position(4 * n + 5).y, 0.0);
    }

    #[test]
    fn test_disturb_rejects_edges() {
        let mut waves = Waves::new(16, 16, 1.0, 0.03, 4.0, 0.2);
        assert!(!waves.disturb(1, 5, 1.0));
        assert!(!waves.disturb(5, 14, 1.0));
        assert!(!waves.disturb(14, 5, 1.0));
        assert!(waves.disturb(2, 13, 1.0));
    }

    #[test]
    fn test_ripple_spreads_and_boundary_stays_flat() {
        let mut waves = Waves::new(32, 32, 1.0, 0.03, 4.0, 0.2);
        waves.disturb(16, 16, 0.5);

        for _ in 0..50 {
            waves.update(0.03);
        }

        let n = waves.column_count();
        // 波纹已经传到远处
        assert!(waves.position(16 * n + 22).y.abs() > 0.0);
        assert!(boundary_heights(&waves).all(|h| h == 0.0));

        for k in 0..waves.vertex_count() {
            assert!((waves.normal(k).norm() - 1.0).abs() < 1e-4);
        }
    }
}
