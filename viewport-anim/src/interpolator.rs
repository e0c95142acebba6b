//! # Interpolator 模块
//!
//! 时间进度插值器。
//!
//! `Interpolator` 只负责时间轴：累计经过时间，根据 `delay` 和 `duration`
//! 计算 `[0, 1]` 进度值。类型化插值器（位置、缩放、角度）在此基础上
//! 根据起止值计算各自的时长，并生成具体的插值结果。

use crate::geometry::{PointD, RectD, ScreenBase, normalize_angle, shortest_distance};

/// 强制完成时在 `duration + delay` 之上额外累加的时间
const FINISH_EPSILON: f64 = 1e-3;

/// 低于该像素距离的平移视为瞬时完成
const MOVE_EPSILON: f64 = 1e-5;

/// 短距离平移的最短时长（秒）
pub const MIN_MOVE_DURATION: f64 = 0.2;

/// 短距离阈值：视口短边的比例
pub const MIN_SPEED_SCALAR: f64 = 0.2;

/// 最大平移速度：视口短边的倍数（每 0.2 秒）
pub const MAX_SPEED_SCALAR: f64 = 7.0;

/// 缩放翻倍所需时长（秒）
pub const SCALE_DOUBLING_DURATION: f64 = 0.2;

/// 旋转半圈所需时长（秒）
pub const ROTATE_DURATION_SCALAR: f64 = 0.75;

/// 时间进度插值器
///
/// 进度 `t` 在 `delay` 之前为 0，在 `[delay, delay + duration]` 内线性增长到 1，
/// 之后固定为 1。未激活的插值器始终视为已完成。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Interpolator {
    /// 已经过的时间
    elapsed: f64,
    /// 插值时长（秒）
    duration: f64,
    /// 延迟启动（秒）
    delay: f64,
    /// 是否激活
    active: bool,
}

impl Interpolator {
    /// 创建激活的插值器
    pub fn new(duration: f64, delay: f64) -> Self {
        debug_assert!(duration >= 0.0, "duration must be non-negative");
        Self {
            elapsed: 0.0,
            duration: duration.max(0.0),
            delay: delay.max(0.0),
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        !self.active || self.elapsed > self.duration + self.delay
    }

    /// 累计经过时间（不做上限截断）
    pub fn advance(&mut self, elapsed_seconds: f64) {
        self.elapsed += elapsed_seconds;
    }

    /// 强制完成，之后 `t()` 恰好为 1
    pub fn finish(&mut self) {
        self.elapsed = self.duration + self.delay + FINISH_EPSILON;
    }

    /// 时长上限
    pub fn set_max_duration(&mut self, max_duration: f64) {
        self.duration = self.duration.min(max_duration);
    }

    /// 时长下限
    pub fn set_min_duration(&mut self, min_duration: f64) {
        self.duration = self.duration.max(min_duration);
    }

    /// 当前进度 `[0, 1]`
    pub fn t(&self) -> f64 {
        if self.is_finished() {
            return 1.0;
        }
        if self.duration <= 0.0 {
            return if self.elapsed > self.delay { 1.0 } else { 0.0 };
        }
        ((self.elapsed - self.delay) / self.duration).clamp(0.0, 1.0)
    }

    pub fn elapsed_time(&self) -> f64 {
        self.elapsed
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn delay(&self) -> f64 {
        self.delay
    }
}

/// 类型化插值器的公共接口
///
/// 类型化插值器内嵌一个 [`Interpolator`]，时间相关的查询统一转发给它。
pub trait Interpolation {
    fn interpolator(&self) -> &Interpolator;

    fn interpolator_mut(&mut self) -> &mut Interpolator;

    /// 推进时间并更新插值结果
    fn advance(&mut self, elapsed_seconds: f64);

    /// 强制完成，结果精确等于终值
    fn finish(&mut self);

    fn is_active(&self) -> bool {
        self.interpolator().is_active()
    }

    fn is_finished(&self) -> bool {
        self.interpolator().is_finished()
    }

    fn duration(&self) -> f64 {
        self.interpolator().duration()
    }

    fn t(&self) -> f64 {
        self.interpolator().t()
    }

    fn set_max_duration(&mut self, max_duration: f64) {
        self.interpolator_mut().set_max_duration(max_duration);
    }

    fn set_min_duration(&mut self, min_duration: f64) {
        self.interpolator_mut().set_min_duration(min_duration);
    }
}

/// 二维位置插值器
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PositionInterpolator {
    base: Interpolator,
    start: PointD,
    end: PointD,
    position: PointD,
}

impl PositionInterpolator {
    /// 指定时长创建
    ///
    /// 起止位置相同时插值器不激活。
    pub fn new(duration: f64, delay: f64, start: PointD, end: PointD) -> Self {
        let mut base = Interpolator::new(duration, delay);
        base.set_active(start != end);
        Self {
            base,
            start,
            end,
            position: start,
        }
    }

    /// 全局坐标起止点，时长由视口像素距离决定
    pub fn with_screen(delay: f64, start: PointD, end: PointD, screen: &ScreenBase) -> Self {
        Self::new(Self::move_duration(start, end, screen), delay, start, end)
    }

    /// 像素坐标起止点，时长由像素矩形决定
    pub fn with_pixel_rect(delay: f64, start: PointD, end: PointD, pixel_rect: &RectD) -> Self {
        Self::new(
            Self::pixel_move_duration(start, end, pixel_rect),
            delay,
            start,
            end,
        )
    }

    /// 全局坐标平移时长
    pub fn move_duration(start: PointD, end: PointD, screen: &ScreenBase) -> f64 {
        Self::pixel_move_duration(
            screen.gtop(start),
            screen.gtop(end),
            &screen.pixel_rect_in_3d(),
        )
    }

    /// 像素坐标平移时长
    ///
    /// - 距离极小：瞬时
    /// - 短于视口短边 20%：固定最短时长
    /// - 其余：按最大速度匀速
    pub fn pixel_move_duration(start: PointD, end: PointD, pixel_rect: &RectD) -> f64 {
        let pixel_length = start.distance(end);
        if pixel_length < MOVE_EPSILON {
            return 0.0;
        }

        let min_size = pixel_rect.min_size();
        if pixel_length < MIN_SPEED_SCALAR * min_size {
            return MIN_MOVE_DURATION;
        }

        let pixel_speed = MAX_SPEED_SCALAR * min_size / MIN_MOVE_DURATION;
        pixel_length / pixel_speed
    }

    pub fn position(&self) -> PointD {
        self.position
    }

    pub fn start_position(&self) -> PointD {
        self.start
    }

    pub fn target_position(&self) -> PointD {
        self.end
    }
}

impl Interpolation for PositionInterpolator {
    fn interpolator(&self) -> &Interpolator {
        &self.base
    }

    fn interpolator_mut(&mut self) -> &mut Interpolator {
        &mut self.base
    }

    fn advance(&mut self, elapsed_seconds: f64) {
        self.base.advance(elapsed_seconds);
        self.position = self.start.lerp(self.end, self.base.t());
    }

    fn finish(&mut self) {
        self.base.finish();
        self.position = self.end;
    }
}

/// 缩放插值器
///
/// 时长按缩放倍数的对数计算，每翻倍耗时固定，
/// 因此无论起始缩放多大，感知到的缩放速度一致。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScaleInterpolator {
    base: Interpolator,
    start: f64,
    end: f64,
    scale: f64,
}

impl ScaleInterpolator {
    pub fn new(delay: f64, start: f64, end: f64) -> Self {
        Self::with_duration(Self::scale_duration(start, end), delay, start, end)
    }

    pub fn with_duration(duration: f64, delay: f64, start: f64, end: f64) -> Self {
        let mut base = Interpolator::new(duration, delay);
        base.set_active(start != end);
        Self {
            base,
            start,
            end,
            scale: start,
        }
    }

    /// 缩放时长：`log2(max / min) × 0.2` 秒
    pub fn scale_duration(start: f64, end: f64) -> f64 {
        debug_assert!(start > 0.0 && end > 0.0, "scale must be positive");
        if start <= 0.0 || end <= 0.0 {
            return 0.0;
        }
        let ratio = start.max(end) / start.min(end);
        ratio.log2() * SCALE_DOUBLING_DURATION
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn start_scale(&self) -> f64 {
        self.start
    }

    pub fn target_scale(&self) -> f64 {
        self.end
    }
}

impl Interpolation for ScaleInterpolator {
    fn interpolator(&self) -> &Interpolator {
        &self.base
    }

    fn interpolator_mut(&mut self) -> &mut Interpolator {
        &mut self.base
    }

    fn advance(&mut self, elapsed_seconds: f64) {
        self.base.advance(elapsed_seconds);
        self.scale = self.start + (self.end - self.start) * self.base.t();
    }

    fn finish(&mut self) {
        self.base.finish();
        self.scale = self.end;
    }
}

/// 角度插值器
///
/// 起止角度归一化到 `[0, 2π)`，沿最短方向旋转。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AngleInterpolator {
    base: Interpolator,
    start: f64,
    end: f64,
    /// 起点到终点的最短有符号角距离
    distance: f64,
    angle: f64,
}

impl AngleInterpolator {
    pub fn new(delay: f64, start: f64, end: f64) -> Self {
        Self::with_duration(Self::rotate_duration(start, end), delay, start, end)
    }

    pub fn with_duration(duration: f64, delay: f64, start: f64, end: f64) -> Self {
        let start = normalize_angle(start);
        let end = normalize_angle(end);
        let mut base = Interpolator::new(duration, delay);
        base.set_active(start != end);
        Self {
            base,
            start,
            end,
            distance: shortest_distance(start, end),
            angle: start,
        }
    }

    /// 旋转时长：`0.75 × |最短角距离| / π` 秒
    pub fn rotate_duration(start: f64, end: f64) -> f64 {
        ROTATE_DURATION_SCALAR * shortest_distance(start, end).abs() / std::f64::consts::PI
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn start_angle(&self) -> f64 {
        self.start
    }

    pub fn target_angle(&self) -> f64 {
        self.end
    }
}

impl Interpolation for AngleInterpolator {
    fn interpolator(&self) -> &Interpolator {
        &self.base
    }

    fn interpolator_mut(&mut self) -> &mut Interpolator {
        &mut self.base
    }

    fn advance(&mut self, elapsed_seconds: f64) {
        self.base.advance(elapsed_seconds);
        self.angle = self.start + self.distance * self.base.t();
    }

    fn finish(&mut self) {
        self.base.finish();
        self.angle = self.end;
    }
}
