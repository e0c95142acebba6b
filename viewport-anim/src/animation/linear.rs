//! 独立的平移 / 旋转 / 缩放动画

use super::{Animation, AnimationBase, AnimationType, ResultSink};
use crate::geometry::{PointD, ScreenBase};
use crate::interpolator::{
    AngleInterpolator, Interpolation, PositionInterpolator, ScaleInterpolator,
};
use crate::property::{AnimObject, AnimProperty, PropertyValue};

/// 地图平面线性动画
///
/// 最多持有三个互不相关的插值器。只有激活（起止值不同）的插值器
/// 才会声明对应属性，零距离的平移不会驱动 `Position`。
#[derive(Debug)]
pub struct MapLinearAnimation {
    base: AnimationBase,
    position: PositionInterpolator,
    angle: AngleInterpolator,
    scale: ScaleInterpolator,
}

impl Default for MapLinearAnimation {
    fn default() -> Self {
        Self::new()
    }
}

impl MapLinearAnimation {
    /// 创建不驱动任何属性的空动画，随后通过 `set_*` 配置
    pub fn new() -> Self {
        Self {
            base: AnimationBase::new(true, false),
            position: PositionInterpolator::default(),
            angle: AngleInterpolator::default(),
            scale: ScaleInterpolator::default(),
        }
    }

    /// 同时配置平移、旋转与缩放
    pub fn with_params(
        start_pos: PointD,
        end_pos: PointD,
        start_angle: f64,
        end_angle: f64,
        start_scale: f64,
        end_scale: f64,
        screen: &ScreenBase,
    ) -> Self {
        let mut animation = Self::new();
        animation.set_move(start_pos, end_pos, screen);
        animation.set_rotate(start_angle, end_angle);
        animation.set_scale(start_scale, end_scale);
        animation
    }

    /// 平移，时长由视口上的像素距离决定
    pub fn set_move(&mut self, start: PointD, end: PointD, screen: &ScreenBase) {
        self.position = PositionInterpolator::with_screen(0.0, start, end, screen);
        if self.position.is_active() {
            self.base.add_property(AnimObject::MapPlane, AnimProperty::Position);
        }
    }

    pub fn set_rotate(&mut self, start: f64, end: f64) {
        self.angle = AngleInterpolator::new(0.0, start, end);
        if self.angle.is_active() {
            self.base.add_property(AnimObject::MapPlane, AnimProperty::Angle);
        }
    }

    pub fn set_scale(&mut self, start: f64, end: f64) {
        self.scale = ScaleInterpolator::new(0.0, start, end);
        if self.scale.is_active() {
            self.base.add_property(AnimObject::MapPlane, AnimProperty::Scale);
        }
    }

    /// 只限制缩放部分的时长
    pub fn set_max_scale_duration(&mut self, max_duration: f64) {
        if self.scale.is_active() {
            self.scale.set_max_duration(max_duration);
        }
    }

    fn interpolators_mut(&mut self) -> [&mut dyn Interpolation; 3] {
        [&mut self.position, &mut self.angle, &mut self.scale]
    }

    fn interpolators(&self) -> [&dyn Interpolation; 3] {
        [&self.position, &self.angle, &self.scale]
    }
}

impl Animation for MapLinearAnimation {
    fn animation_type(&self) -> AnimationType {
        AnimationType::MapLinear
    }

    fn base(&self) -> &AnimationBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AnimationBase {
        &mut self.base
    }

    fn advance(&mut self, elapsed_seconds: f64, _sink: &mut ResultSink<'_>) {
        for interpolator in self.interpolators_mut() {
            if interpolator.is_active() {
                interpolator.advance(elapsed_seconds);
            }
        }
    }

    fn finish(&mut self, _sink: &mut ResultSink<'_>) {
        for interpolator in self.interpolators_mut() {
            if interpolator.is_active() {
                interpolator.finish();
            }
        }
        self.on_finish();
    }

    fn is_finished(&self) -> bool {
        self.interpolators().iter().all(|i| i.is_finished())
    }

    fn duration(&self) -> f64 {
        self.interpolators()
            .iter()
            .filter(|i| i.is_active())
            .map(|i| i.duration())
            .fold(0.0, f64::max)
    }

    fn set_max_duration(&mut self, max_duration: f64) {
        for interpolator in self.interpolators_mut() {
            if interpolator.is_active() {
                interpolator.set_max_duration(max_duration);
            }
        }
    }

    fn set_min_duration(&mut self, min_duration: f64) {
        for interpolator in self.interpolators_mut() {
            if interpolator.is_active() {
                interpolator.set_min_duration(min_duration);
            }
        }
    }

    fn get_property(
        &self,
        object: AnimObject,
        property: AnimProperty,
        _screen: &ScreenBase,
    ) -> Option<PropertyValue> {
        debug_assert_eq!(object, AnimObject::MapPlane);
        match property {
            AnimProperty::Position if self.position.is_active() => {
                Some(self.position.position().into())
            }
            AnimProperty::Angle if self.angle.is_active() => Some(self.angle.angle().into()),
            AnimProperty::Scale if self.scale.is_active() => Some(self.scale.scale().into()),
            _ => None,
        }
    }

    fn get_target_property(
        &self,
        object: AnimObject,
        property: AnimProperty,
        _screen: &ScreenBase,
    ) -> Option<PropertyValue> {
        debug_assert_eq!(object, AnimObject::MapPlane);
        match property {
            AnimProperty::Position if self.position.is_active() => {
                Some(self.position.target_position().into())
            }
            AnimProperty::Angle if self.angle.is_active() => {
                Some(self.angle.target_angle().into())
            }
            AnimProperty::Scale if self.scale.is_active() => {
                Some(self.scale.target_scale().into())
            }
            _ => None,
        }
    }
}
