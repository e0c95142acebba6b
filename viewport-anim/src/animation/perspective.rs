//! 3D 透视倾斜开关动画

use std::cell::Cell;
use std::f64::consts::FRAC_PI_4;

use super::{Animation, AnimationBase, AnimationType, ResultSink};
use crate::geometry::ScreenBase;
use crate::interpolator::{AngleInterpolator, Interpolation};
use crate::property::{AnimObject, AnimProperty, PropertyValue, SwitchPerspectiveParams};

/// 每倾斜 π/4 所需时长（秒）
const PERSPECTIVE_DURATION_SCALAR: f64 = 0.5;

/// 透视开关动画
///
/// 倾斜角连续变化，另外在进入 3D 时（启动）或退出 3D 时（完成）
/// 产生一次性的开关事件。事件被读取一次后即失效。
/// 该动画不可打断也不可混合，必须完整运行。
#[derive(Debug)]
pub struct PerspectiveSwitchAnimation {
    base: AnimationBase,
    angle: AngleInterpolator,
    start_angle: f64,
    end_angle: f64,
    angle_fov: f64,
    /// 终止角度大于零即进入 3D
    enable: bool,
    need_switch: Cell<bool>,
}

impl PerspectiveSwitchAnimation {
    pub fn new(start_angle: f64, end_angle: f64, angle_fov: f64) -> Self {
        let mut base = AnimationBase::new(false, false);
        base.add_property(AnimObject::MapPlane, AnimProperty::AnglePerspective);
        base.add_property(AnimObject::MapPlane, AnimProperty::SwitchPerspective);
        Self {
            base,
            angle: AngleInterpolator::with_duration(
                Self::rotate_duration(start_angle, end_angle),
                0.0,
                start_angle,
                end_angle,
            ),
            start_angle,
            end_angle,
            angle_fov,
            enable: end_angle > 0.0,
            need_switch: Cell::new(false),
        }
    }

    /// 倾斜时长：`0.5 × |Δ| / (π/4)` 秒
    pub fn rotate_duration(start_angle: f64, end_angle: f64) -> f64 {
        PERSPECTIVE_DURATION_SCALAR * (end_angle - start_angle).abs() / FRAC_PI_4
    }

    pub fn is_enable(&self) -> bool {
        self.enable
    }

    fn switch_params(&self) -> SwitchPerspectiveParams {
        SwitchPerspectiveParams {
            enable: self.enable,
            from_angle: self.start_angle,
            to_angle: self.end_angle,
            fov_angle: self.angle_fov,
        }
    }
}

impl Animation for PerspectiveSwitchAnimation {
    fn animation_type(&self) -> AnimationType {
        AnimationType::MapPerspective
    }

    fn base(&self) -> &AnimationBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AnimationBase {
        &mut self.base
    }

    fn on_start(&mut self) {
        if self.enable {
            self.need_switch.set(true);
        }
        super::run_action(self, super::ActionKind::Start);
    }

    fn on_finish(&mut self) {
        if !self.enable {
            self.need_switch.set(true);
        }
        super::run_action(self, super::ActionKind::Finish);
    }

    fn advance(&mut self, elapsed_seconds: f64, _sink: &mut ResultSink<'_>) {
        if self.angle.is_active() {
            self.angle.advance(elapsed_seconds);
        }
    }

    fn finish(&mut self, _sink: &mut ResultSink<'_>) {
        if self.angle.is_active() {
            self.angle.finish();
        }
        self.on_finish();
    }

    fn is_finished(&self) -> bool {
        self.angle.is_finished()
    }

    fn duration(&self) -> f64 {
        if self.angle.is_active() {
            self.angle.duration()
        } else {
            0.0
        }
    }

    fn set_max_duration(&mut self, max_duration: f64) {
        if self.angle.is_active() {
            self.angle.set_max_duration(max_duration);
        }
    }

    fn set_min_duration(&mut self, min_duration: f64) {
        if self.angle.is_active() {
            self.angle.set_min_duration(min_duration);
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
            AnimProperty::AnglePerspective => Some(self.angle.angle().into()),
            AnimProperty::SwitchPerspective if self.need_switch.replace(false) => {
                Some(self.switch_params().into())
            }
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
            AnimProperty::AnglePerspective => Some(self.angle.target_angle().into()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyCache;

    const EPS: f64 = 1e-9;

    fn switch_event(anim: &PerspectiveSwitchAnimation) -> Option<SwitchPerspectiveParams> {
        anim.get_property(
            AnimObject::MapPlane,
            AnimProperty::SwitchPerspective,
            &ScreenBase::default(),
        )
        .and_then(|v| v.as_perspective_params())
    }

    #[test]
    fn test_duration_linear_in_tilt() {
        let anim = PerspectiveSwitchAnimation::new(0.0, FRAC_PI_4, 1.0);
        assert!((anim.duration() - 0.5).abs() < EPS);
        assert!(!anim.could_be_interrupted());
        assert!(!anim.could_be_blended());
    }

    #[test]
    fn test_enable_event_on_start_once() {
        let mut anim = PerspectiveSwitchAnimation::new(0.0, 0.6, 1.1);
        assert!(anim.is_enable());
        assert!(switch_event(&anim).is_none());

        anim.on_start();
        let params = switch_event(&anim);
        assert_eq!(
            params,
            Some(SwitchPerspectiveParams {
                enable: true,
                from_angle: 0.0,
                to_angle: 0.6,
                fov_angle: 1.1,
            })
        );
        assert!(switch_event(&anim).is_none());
    }

    #[test]
    fn test_disable_event_on_finish() {
        let screen = ScreenBase::default();
        let mut cache = PropertyCache::new();
        let mut sink = ResultSink::new(&screen, &mut cache);

        let mut anim = PerspectiveSwitchAnimation::new(0.6, 0.0, 1.1);
        assert!(!anim.is_enable());
        anim.on_start();
        assert!(switch_event(&anim).is_none());

        anim.advance(anim.duration() / 2.0, &mut sink);
        let angle = anim
            .get_property(AnimObject::MapPlane, AnimProperty::AnglePerspective, &screen)
            .and_then(|v| v.as_scalar())
            .unwrap_or_default();
        assert!((angle - 0.3).abs() < EPS);

        anim.finish(&mut sink);
        let params = switch_event(&anim).map(|p| p.enable);
        assert_eq!(params, Some(false));
        assert!(switch_event(&anim).is_none());
    }
}
