//! 帧计时器
//!
//! 提供总时间与帧间隔，用于 Pass 常量和材质动画。

use std::time::{Duration, Instant};

/// 帧计时器
#[derive(Debug, Clone)]
pub struct FrameTimer {
    start: Instant,
    last_tick: Instant,
    delta: Duration,
    frame_count: u64,
}

impl FrameTimer {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
            delta: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// 推进一帧，返回帧间隔（秒）
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        self.delta = now - self.last_tick;
        self.last_tick = now;
        self.frame_count += 1;
        self.delta_time()
    }

    /// 以固定步长推进（无实时时钟的回放和测试）
    pub fn advance(&mut self, step: Duration) -> f32 {
        self.delta = step;
        self.last_tick += step;
        self.frame_count += 1;
        self.delta_time()
    }

    /// 距离创建时的总时间（秒）
    pub fn total_time(&self) -> f32 {
        (self.last_tick - self.start).as_secs_f32()
    }

    /// 上一帧的间隔（秒）
    pub fn delta_time(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}
