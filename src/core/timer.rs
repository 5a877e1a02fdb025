//! 计时器模块
//!
//! `GameTimer` 负责帧间隔与累计运行时间，暂停期间（窗口失去焦点）的时间不计入总时间。
//! `FrameStats` 每秒统计一次帧率，用于窗口标题显示。

use std::time::{Duration, Instant};

/// 游戏计时器
#[derive(Debug, Clone)]
pub struct GameTimer {
    base_time: Instant,
    paused_time: Duration,
    stop_time: Option<Instant>,
    prev_time: Instant,
    curr_time: Instant,
    delta_time: f32,
}

impl GameTimer {
    /// 创建计时器，并以当前时刻作为基准
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            base_time: now,
            paused_time: Duration::ZERO,
            stop_time: None,
            prev_time: now,
            curr_time: now,
            delta_time: 0.0,
        }
    }

    /// 自 `reset` 以来经过的时间（秒），不包括暂停的时间
    pub fn total_time(&self) -> f32 {
        let end = self.stop_time.unwrap_or(self.curr_time);
        end.saturating_duration_since(self.base_time)
            .saturating_sub(self.paused_time)
            .as_secs_f32()
    }

    /// 上一帧的时间间隔（秒）
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// 是否处于暂停状态
    pub fn is_stopped(&self) -> bool {
        self.stop_time.is_some()
    }

    /// 进入消息循环前调用
    pub fn reset(&mut self) {
        self.reset_at(Instant::now());
    }

    /// 解除暂停
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// 暂停
    pub fn stop(&mut self) {
        self.stop_at(Instant::now());
    }

    /// 每帧调用一次
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    fn reset_at(&mut self, now: Instant) {
        self.base_time = now;
        self.prev_time = now;
        self.curr_time = now;
        self.paused_time = Duration::ZERO;
        self.stop_time = None;
        self.delta_time = 0.0;
    }

    fn start_at(&mut self, now: Instant) {
        if let Some(stop) = self.stop_time.take() {
            self.paused_time += now.saturating_duration_since(stop);
            self.prev_time = now;
        }
    }

    fn stop_at(&mut self, now: Instant) {
        if self.stop_time.is_none() {
            self.stop_time = Some(now);
        }
    }

    fn tick_at(&mut self, now: Instant) {
        if self.stop_time.is_some() {
            self.delta_time = 0.0;
            return;
        }

        self.curr_time = now;
        self.delta_time = now.saturating_duration_since(self.prev_time).as_secs_f32();
        self.prev_time = now;
    }
}

impl Default for GameTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// 帧率统计
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    frame_count: u32,
    time_elapsed: f32,
    fps: f32,
    mspf: f32,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一帧；每满一秒返回 `true`，表示 fps/mspf 已更新
    pub fn record_frame(&mut self, total_time: f32) -> bool {
        self.frame_count += 1;

        let elapsed = total_time - self.time_elapsed;
        if elapsed < 1.0 {
            return false;
        }

        self.fps = self.frame_count as f32 / elapsed;
        self.mspf = if self.fps > 0.0 { 1000.0 / self.fps } else { 0.0 };
        self.frame_count = 0;
        self.time_elapsed = total_time;
        true
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn mspf(&self) -> f32 {
        self.mspf
    }

    /// 带帧率信息的窗口标题
    pub fn window_title(&self, base: &str) -> String {
        format!("{}    fps: {:.0}   mspf: {:.3}", base, self.fps, self.mspf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_measures_delta() {
        let mut timer = GameTimer::new();
        let t0 = Instant::now();
        timer.reset_at(t0);

        timer.tick_at(t0 + Duration::from_millis(16));
        assert!((timer.delta_time() - 0.016).abs() < 1e-4);
        assert!((timer.total_time() - 0.016).abs() < 1e-4);
    }

    #[test]
    fn test_paused_time_is_excluded() {
        let mut timer = GameTimer::new();
        let t0 = Instant::now();
        timer.reset_at(t0);
        timer.tick_at(t0 + Duration::from_secs(1));

        timer.stop_at(t0 + Duration::from_secs(1));
        assert!(timer.is_stopped());
        timer.tick_at(t0 + Duration::from_secs(2));
        assert_eq!(timer.delta_time(), 0.0);

        timer.start_at(t0 + Duration::from_secs(5));
        timer.tick_at(t0 + Duration::from_secs(6));

        assert!((timer.delta_time() - 1.0).abs() < 1e-4);
        assert!((timer.total_time() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_total_time_frozen_while_stopped() {
        let mut timer = GameTimer::new();
        let t0 = Instant::now();
        timer.reset_at(t0);
        timer.tick_at(t0 + Duration::from_secs(3));
        timer.stop_at(t0 + Duration::from_secs(3));
        timer.tick_at(t0 + Duration::from_secs(10));
        assert!((timer.total_time() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_frame_stats() {
        let mut stats = FrameStats::new();
        for i in 0..59 {
            assert!(!stats.record_frame(i as f32 / 60.0));
        }
        assert!(stats.record_frame(1.0));
        assert!((stats.fps() - 60.0).abs() < 1e-3);
        assert!((stats.mspf() - 16.667).abs() < 1e-2);
        assert!(stats.window_title("Crate").starts_with("Crate    fps: 60"));
    }
}
