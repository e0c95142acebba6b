//! # Screen Animations 模块
//!
//! 把常见的相机意图（切换到某个矩形、缩放、跟随、远距离移动）转换为动画。
//!
//! 跟随目标太远时（[`follow_move_duration`] 超过 [`MAX_ANIMATION_TIME_SEC`]），
//! 应改用 [`get_pretty_follow_animation`]：先缩小，移动到用户位置，再跟随。

use crate::animation::{
    Animation, MapFollowAnimation, MapLinearAnimation, MapScaleAnimation, SequenceAnimation,
};
use crate::geometry::{PointD, ScreenBase};
use crate::interpolator::PositionInterpolator;

/// 单个相机动画的最长时长（秒）
pub const MAX_ANIMATION_TIME_SEC: f64 = 1.5;

/// 远距离移动序列的自定义类型标签
pub const PRETTY_MOVE_ANIM: &str = "PrettyMove";

/// 远距离跟随序列的自定义类型标签
pub const PRETTY_FOLLOW_ANIM: &str = "PrettyFollow";

/// 时长在 `(0, MAX_ANIMATION_TIME_SEC]` 内才值得播放动画，否则应直接跳转
pub fn is_animation_allowed(duration: f64) -> bool {
    duration > 0.0 && duration <= MAX_ANIMATION_TIME_SEC
}

/// 从一个视口过渡到另一个视口
pub fn get_set_rect_animation(start: &ScreenBase, end: &ScreenBase) -> MapLinearAnimation {
    let start_rect = start.global_rect();
    let end_rect = end.global_rect();

    let mut animation = MapLinearAnimation::new();
    animation.set_rotate(start.angle(), end.angle());
    animation.set_move(start_rect.global_center(), end_rect.global_center(), start);
    animation.set_scale(start.scale(), end.scale());
    animation.set_max_scale_duration(MAX_ANIMATION_TIME_SEC);
    animation
}

/// 以像素 `pixel_scale_center` 为焦点缩放
///
/// `factor` 大于 1 为放大（每像素对应的全局长度变小）。
pub fn get_scale_animation(
    start: &ScreenBase,
    pixel_scale_center: PointD,
    global_scale_center: PointD,
    factor: f64,
) -> MapScaleAnimation {
    debug_assert!(factor > 0.0, "scale factor must be positive");
    let end_scale = start.scale() / factor;
    let offset = start.pixel_rect().center() - pixel_scale_center;

    let mut animation =
        MapScaleAnimation::new(start.scale(), end_scale, global_scale_center, offset);
    animation.set_max_duration(MAX_ANIMATION_TIME_SEC);
    animation
}

/// 跟随用户位置，最终让它停在像素 `end_pixel_position`
pub fn get_follow_animation(
    start: &ScreenBase,
    user_position: PointD,
    target_scale: f64,
    target_angle: f64,
    end_pixel_position: PointD,
) -> MapFollowAnimation {
    let mut animation = MapFollowAnimation::new(
        user_position,
        start.scale(),
        target_scale,
        start.angle(),
        target_angle,
        start.gtop(user_position),
        end_pixel_position,
        start.pixel_rect(),
    );
    animation.set_max_duration(MAX_ANIMATION_TIME_SEC);
    animation
}

/// 跟随时相机中心的平移时长
///
/// 终点为目标比例与角度下让 `user_position` 落在 `end_pixel_position` 的中心，
/// 按起止比例的平均值换算像素距离。
pub fn follow_move_duration(
    start: &ScreenBase,
    user_position: PointD,
    target_scale: f64,
    target_angle: f64,
    end_pixel_position: PointD,
) -> f64 {
    let end_center = MapFollowAnimation::calculate_center(
        target_scale,
        &start.pixel_rect(),
        user_position,
        end_pixel_position,
        target_angle,
    );
    let mut average = start.clone();
    average.set_scale((start.scale() + target_scale) / 2.0);
    PositionInterpolator::move_duration(start.org(), end_center, &average)
}

/// 远距离跟随：先缩小，在较粗的比例尺下把用户位置移到视口中心，再跟随到目标
pub fn get_pretty_follow_animation(
    start: &ScreenBase,
    user_position: PointD,
    target_scale: f64,
    target_angle: f64,
    end_pixel_position: PointD,
) -> SequenceAnimation {
    let pixel_rect = start.pixel_rect();
    // 用户位于视口中心时，相机中心就是用户位置
    let move_duration = PositionInterpolator::move_duration(start.org(), user_position, start);
    let scale_factor = (move_duration / MAX_ANIMATION_TIME_SEC * 2.0).max(1.0);
    let coarse_scale = start.scale() * scale_factor;

    let mut sequence = SequenceAnimation::new();
    sequence.set_custom_type(PRETTY_FOLLOW_ANIM.to_string());

    let mut zoom_out = MapLinearAnimation::new();
    zoom_out.set_scale(start.scale(), coarse_scale);
    zoom_out.set_max_duration(MAX_ANIMATION_TIME_SEC * 0.5);

    let mut coarse = start.clone();
    coarse.set_scale(coarse_scale);
    let mut travel = MapLinearAnimation::new();
    travel.set_move(start.org(), user_position, &coarse);
    travel.set_max_duration(MAX_ANIMATION_TIME_SEC);

    let mut follow = MapFollowAnimation::new(
        user_position,
        coarse_scale,
        target_scale,
        start.angle(),
        target_angle,
        pixel_rect.center(),
        end_pixel_position,
        pixel_rect,
    );
    follow.set_max_duration(MAX_ANIMATION_TIME_SEC * 0.5);

    sequence.add_animation(Box::new(zoom_out));
    sequence.add_animation(Box::new(travel));
    sequence.add_animation(Box::new(follow));
    sequence
}

/// 远距离移动：先缩小，在较粗的比例尺下平移，再放大到目标比例
pub fn get_pretty_move_animation(start: &ScreenBase, end: &ScreenBase) -> SequenceAnimation {
    get_pretty_move_animation_between(
        start,
        start.scale(),
        end.scale(),
        start.org(),
        end.org(),
    )
}

/// 指定起止比例与中心的远距离移动
pub fn get_pretty_move_animation_between(
    screen: &ScreenBase,
    start_scale: f64,
    end_scale: f64,
    start_position: PointD,
    end_position: PointD,
) -> SequenceAnimation {
    let move_duration = PositionInterpolator::move_duration(start_position, end_position, screen);
    let scale_factor = (move_duration / MAX_ANIMATION_TIME_SEC * 2.0).max(1.0);
    let coarse_scale = start_scale * scale_factor;

    let mut sequence = SequenceAnimation::new();
    sequence.set_custom_type(PRETTY_MOVE_ANIM.to_string());

    let mut zoom_out = MapLinearAnimation::new();
    zoom_out.set_scale(start_scale, coarse_scale);
    zoom_out.set_max_duration(MAX_ANIMATION_TIME_SEC * 0.5);

    let mut travel = MapLinearAnimation::new();
    travel.set_move(start_position, end_position, screen);
    travel.set_max_duration(MAX_ANIMATION_TIME_SEC);

    let mut zoom_in = MapLinearAnimation::new();
    zoom_in.set_scale(coarse_scale, end_scale);
    zoom_in.set_max_duration(MAX_ANIMATION_TIME_SEC * 0.5);

    sequence.add_animation(Box::new(zoom_out));
    sequence.add_animation(Box::new(travel));
    sequence.add_animation(Box::new(zoom_in));
    sequence
}
