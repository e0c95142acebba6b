//! 跟随动画：把用户位置带到指定像素，同时旋转与缩放

use super::{Animation, AnimationBase, AnimationType, ResultSink};
use crate::geometry::{PointD, RectD, ScreenBase};
use crate::interpolator::{
    AngleInterpolator, Interpolation, PositionInterpolator, ScaleInterpolator,
};
use crate::property::{AnimObject, AnimProperty, PropertyValue};

/// 跟随动画
///
/// 缩放、角度和用户位置所在像素三个插值器共用同一时长
/// （三者自然时长的最大值）。相机中心由三者的当前值推导得出，
/// 推导时使用查询时视口的像素矩形，视口尺寸变化后仍然正确。
#[derive(Debug)]
pub struct MapFollowAnimation {
    base: AnimationBase,
    scale: ScaleInterpolator,
    angle: AngleInterpolator,
    pixel_position: PositionInterpolator,
    /// 被跟随点的全局坐标
    global_position: PointD,
}

impl MapFollowAnimation {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        global_position: PointD,
        start_scale: f64,
        end_scale: f64,
        start_angle: f64,
        end_angle: f64,
        start_pixel_position: PointD,
        end_pixel_position: PointD,
        pixel_rect: RectD,
    ) -> Self {
        let mut scale = ScaleInterpolator::new(0.0, start_scale, end_scale);
        let mut angle = AngleInterpolator::new(0.0, start_angle, end_angle);
        let mut pixel_position = PositionInterpolator::with_pixel_rect(
            0.0,
            start_pixel_position,
            end_pixel_position,
            &pixel_rect,
        );

        let duration = scale
            .duration()
            .max(angle.duration())
            .max(pixel_position.duration());
        scale.set_min_duration(duration);
        angle.set_min_duration(duration);
        pixel_position.set_min_duration(duration);

        let mut base = AnimationBase::new(true, true);
        if scale.is_active() {
            base.add_property(AnimObject::MapPlane, AnimProperty::Scale);
        }
        if angle.is_active() {
            base.add_property(AnimObject::MapPlane, AnimProperty::Angle);
        }
        if scale.is_active() || angle.is_active() || pixel_position.is_active() {
            base.add_property(AnimObject::MapPlane, AnimProperty::Position);
        }

        Self {
            base,
            scale,
            angle,
            pixel_position,
            global_position,
        }
    }

    /// 相机中心：让 `user_pos` 落在像素 `pixel_pos` 上
    pub fn calculate_center(
        scale: f64,
        pixel_rect: &RectD,
        user_pos: PointD,
        pixel_pos: PointD,
        azimuth: f64,
    ) -> PointD {
        let mut forming = (pixel_rect.center() - pixel_pos) * scale;
        forming.y = -forming.y;
        user_pos + forming.rotate(azimuth)
    }

    /// 以视口当前缩放计算相机中心
    pub fn calculate_center_for_screen(
        screen: &ScreenBase,
        user_pos: PointD,
        pixel_pos: PointD,
        azimuth: f64,
    ) -> PointD {
        Self::calculate_center(
            screen.scale(),
            &screen.pixel_rect(),
            user_pos,
            pixel_pos,
            azimuth,
        )
    }

    pub fn has_scale(&self) -> bool {
        self.scale.is_active()
    }

    pub fn has_pixel_offset(&self) -> bool {
        self.pixel_position.is_active()
    }

    fn interpolators_mut(&mut self) -> [&mut dyn Interpolation; 3] {
        [&mut self.scale, &mut self.angle, &mut self.pixel_position]
    }

    fn interpolators(&self) -> [&dyn Interpolation; 3] {
        [&self.scale, &self.angle, &self.pixel_position]
    }
}

impl Animation for MapFollowAnimation {
    fn animation_type(&self) -> AnimationType {
        AnimationType::MapFollow
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
        screen: &ScreenBase,
    ) -> Option<PropertyValue> {
        debug_assert_eq!(object, AnimObject::MapPlane);
        match property {
            AnimProperty::Position => Some(
                Self::calculate_center(
                    self.scale.scale(),
                    &screen.pixel_rect(),
                    self.global_position,
                    self.pixel_position.position(),
                    self.angle.angle(),
                )
                .into(),
            ),
            AnimProperty::Angle if self.angle.is_active() => Some(self.angle.angle().into()),
            AnimProperty::Scale if self.scale.is_active() => Some(self.scale.scale().into()),
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
            AnimProperty::Position => Some(
                Self::calculate_center(
                    self.scale.target_scale(),
                    &screen.pixel_rect(),
                    self.global_position,
                    self.pixel_position.target_position(),
                    self.angle.target_angle(),
                )
                .into(),
            ),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyCache;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-9;

    fn screen() -> ScreenBase {
        ScreenBase::new(
            RectD::with_size(800.0, 600.0),
            PointD::new(50.0, -20.0),
            1.5,
            0.4,
        )
    }

    #[test]
    fn test_shared_duration() {
        let s = screen();
        let user = PointD::new(10.0, 10.0);
        let anim = MapFollowAnimation::new(
            user,
            s.scale(),
            s.scale() / 2.0,
            s.angle(),
            s.angle() + PI,
            s.gtop(user),
            PointD::new(400.0, 450.0),
            s.pixel_rect(),
        );
        // 旋转半圈 0.75s 是三者中最长的
        assert!((anim.duration() - 0.75).abs() < EPS);
        assert!(anim.has_scale());
        assert!(anim.has_pixel_offset());
        assert!(anim.has_property(AnimObject::MapPlane, AnimProperty::Position));
    }

    #[test]
    fn test_start_center_matches_screen() {
        let s = screen();
        let user = PointD::new(-30.0, 70.0);
        let anim = MapFollowAnimation::new(
            user,
            s.scale(),
            3.0,
            s.angle(),
            1.0,
            s.gtop(user),
            PointD::new(400.0, 300.0),
            s.pixel_rect(),
        );
        let center = anim
            .get_property(AnimObject::MapPlane, AnimProperty::Position, &s)
            .and_then(|v| v.as_point())
            .unwrap_or_default();
        assert!(center.almost_eq(s.org(), 1e-6));
    }

    #[test]
    fn test_finish_lands_user_on_target_pixel() {
        let s = screen();
        let user = PointD::new(-30.0, 70.0);
        let target_pixel = PointD::new(400.0, 450.0);
        let mut anim = MapFollowAnimation::new(
            user,
            s.scale(),
            0.75,
            s.angle(),
            1.2,
            s.gtop(user),
            target_pixel,
            s.pixel_rect(),
        );

        let mut cache = PropertyCache::new();
        let mut sink = ResultSink::new(&s, &mut cache);
        anim.on_start();
        anim.advance(0.05, &mut sink);
        assert!(!anim.is_finished());
        anim.finish(&mut sink);
        assert!(anim.is_finished());

        let center = anim
            .get_property(AnimObject::MapPlane, AnimProperty::Position, &s)
            .and_then(|v| v.as_point())
            .unwrap_or_default();
        let mut landed = s.clone();
        landed.set_org(center);
        landed.set_scale(0.75);
        landed.set_angle(1.2);
        assert!(landed.gtop(user).almost_eq(target_pixel, 1e-6));
    }

    #[test]
    fn test_center_follows_resized_viewport() {
        let s = screen();
        let user = PointD::zero();
        let anim = MapFollowAnimation::new(
            user,
            1.0,
            1.0,
            0.0,
            0.0,
            PointD::new(400.0, 300.0),
            PointD::new(400.0, 350.0),
            s.pixel_rect(),
        );

        let resized = ScreenBase::new(RectD::with_size(1000.0, 500.0), PointD::zero(), 1.0, 0.0);
        let expected = MapFollowAnimation::calculate_center(
            1.0,
            &resized.pixel_rect(),
            user,
            PointD::new(400.0, 300.0),
            0.0,
        );
        let center = anim
            .get_property(AnimObject::MapPlane, AnimProperty::Position, &resized)
            .and_then(|v| v.as_point());
        assert_eq!(center, Some(expected));
        assert!(expected.almost_eq(PointD::new(100.0, 50.0), EPS));

        let target_expected = MapFollowAnimation::calculate_center(
            1.0,
            &resized.pixel_rect(),
            user,
            PointD::new(400.0, 350.0),
            0.0,
        );
        let target = anim
            .get_target_property(AnimObject::MapPlane, AnimProperty::Position, &resized)
            .and_then(|v| v.as_point());
        assert_eq!(target, Some(target_expected));
    }

    #[test]
    fn test_calculate_center_for_screen() {
        let s = screen();
        let user = PointD::new(5.0, 5.0);
        let center =
            MapFollowAnimation::calculate_center_for_screen(&s, user, s.gtop(user), s.angle());
        assert!(center.almost_eq(s.org(), 1e-6));
    }
}
