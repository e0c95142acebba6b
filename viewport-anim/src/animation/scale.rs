//! 锚点缩放动画

use super::{Animation, AnimationBase, AnimationType, ResultSink};
use crate::geometry::{PointD, ScreenBase};
use crate::interpolator::{Interpolation, ScaleInterpolator};
use crate::property::{AnimObject, AnimProperty, PropertyValue};

/// 以屏幕上某个像素为锚的缩放
///
/// 位置属性不单独插值，每次查询时按当前缩放重新计算，
/// 使锚点在整个缩放过程中停留在同一个屏幕像素上。
#[derive(Debug)]
pub struct MapScaleAnimation {
    base: AnimationBase,
    scale: ScaleInterpolator,
    /// 锚点的全局坐标
    global_scale_center: PointD,
    /// 视口中心相对锚点像素的偏移
    pixel_scale_center_offset: PointD,
}

impl MapScaleAnimation {
    pub fn new(
        start_scale: f64,
        end_scale: f64,
        global_scale_center: PointD,
        pixel_scale_center_offset: PointD,
    ) -> Self {
        let mut base = AnimationBase::new(true, true);
        base.add_property(AnimObject::MapPlane, AnimProperty::Scale);
        base.add_property(AnimObject::MapPlane, AnimProperty::Position);
        Self {
            base,
            scale: ScaleInterpolator::new(0.0, start_scale, end_scale),
            global_scale_center,
            pixel_scale_center_offset,
        }
    }

    fn anchored_center(&self, scale: f64, screen: &ScreenBase) -> PointD {
        let mut screen = screen.clone();
        screen.set_scale(scale);
        let pixel_center = screen.gtop(self.global_scale_center) + self.pixel_scale_center_offset;
        screen.ptog(pixel_center)
    }
}

impl Animation for MapScaleAnimation {
    fn animation_type(&self) -> AnimationType {
        AnimationType::MapScale
    }

    fn base(&self) -> &AnimationBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AnimationBase {
        &mut self.base
    }

    fn advance(&mut self, elapsed_seconds: f64, _sink: &mut ResultSink<'_>) {
        if self.scale.is_active() {
            self.scale.advance(elapsed_seconds);
        }
    }

    fn finish(&mut self, _sink: &mut ResultSink<'_>) {
        if self.scale.is_active() {
            self.scale.finish();
        }
        self.on_finish();
    }

    fn is_finished(&self) -> bool {
        self.scale.is_finished()
    }

    fn duration(&self) -> f64 {
        if self.scale.is_active() {
            self.scale.duration()
        } else {
            0.0
        }
    }

    fn set_max_duration(&mut self, max_duration: f64) {
        if self.scale.is_active() {
            self.scale.set_max_duration(max_duration);
        }
    }

    fn set_min_duration(&mut self, min_duration: f64) {
        if self.scale.is_active() {
            self.scale.set_min_duration(min_duration);
        }
    }

    fn get_property(
        &self,
        object: AnimObject,
        property: AnimProperty,
        screen: &ScreenBase,
    ) -> Option<PropertyValue> {
        debug_assert_eq!(object, AnimObject::MapPlane);
        match property {
            AnimProperty::Position => {
                Some(self.anchored_center(self.scale.scale(), screen).into())
            }
            AnimProperty::Scale => Some(self.scale.scale().into()),
            _ => None,
        }
    }

    fn get_target_property(
        &self,
        object: AnimObject,
        property: AnimProperty,
        screen: &ScreenBase,
    ) -> Option<PropertyValue> {
        debug_assert_eq!(object, AnimObject::MapPlane);
        match property {
            AnimProperty::Position => {
                Some(self.anchored_center(self.scale.target_scale(), screen).into())
            }
            AnimProperty::Scale => Some(self.scale.target_scale().into()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RectD;
    use crate::property::PropertyCache;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_anchor_stays_on_same_pixel() {
        let screen = ScreenBase::new(
            RectD::with_size(800.0, 600.0),
            PointD::new(100.0, 100.0),
            2.0,
            0.3,
        );
        let focus_pixel = PointD::new(200.0, 150.0);
        let anchor = screen.ptog(focus_pixel);
        let offset = screen.pixel_rect().center() - focus_pixel;

        let mut cache = PropertyCache::new();
        let mut sink = ResultSink::new(&screen, &mut cache);
        let mut anim = MapScaleAnimation::new(2.0, 0.5, anchor, offset);
        anim.on_start();

        for _ in 0..5 {
            anim.advance(0.05, &mut sink);
            let center = anim
                .get_property(AnimObject::MapPlane, AnimProperty::Position, &screen)
                .and_then(|v| v.as_point())
                .unwrap_or_default();
            let scale = anim
                .get_property(AnimObject::MapPlane, AnimProperty::Scale, &screen)
                .and_then(|v| v.as_scalar())
                .unwrap_or_default();

            let mut moved = screen.clone();
            moved.set_org(center);
            moved.set_scale(scale);
            assert!(moved.gtop(anchor).almost_eq(focus_pixel, 1e-6));
        }
    }

    #[test]
    fn test_target_property_uses_end_scale() {
        let screen = ScreenBase::default();
        let anim = MapScaleAnimation::new(1.0, 4.0, PointD::new(10.0, 0.0), PointD::zero());
        assert!((anim.duration() - 0.4).abs() < EPS);
        assert_eq!(
            anim.get_target_property(AnimObject::MapPlane, AnimProperty::Scale, &screen),
            Some(PropertyValue::Scalar(4.0))
        );
        // 偏移为零时锚点就是视口中心
        let center = anim
            .get_target_property(AnimObject::MapPlane, AnimProperty::Position, &screen)
            .and_then(|v| v.as_point())
            .unwrap_or_default();
        assert!(center.almost_eq(PointD::new(10.0, 0.0), EPS));
    }

    #[test]
    fn test_could_be_blended_and_interrupted() {
        let anim = MapScaleAnimation::new(1.0, 2.0, PointD::zero(), PointD::zero());
        assert!(anim.could_be_blended());
        assert!(anim.could_be_interrupted());
    }
}
