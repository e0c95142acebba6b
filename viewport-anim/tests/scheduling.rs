//! 调度器的端到端行为：链、合并、强制结束与透视事件。

use std::cell::Cell;
use std::rc::Rc;

use viewport_anim::screen_animations::get_pretty_move_animation;
use viewport_anim::{
    AnimObject, AnimProperty, Animation, AnimationSystem, AnimationType, MapLinearAnimation,
    MapScaleAnimation, ParallelAnimation, PerspectiveSwitchAnimation, PointD, RectD, ScreenBase,
};

const EPS: f64 = 1e-6;

fn screen() -> ScreenBase {
    ScreenBase::new(RectD::with_size(1000.0, 500.0), PointD::zero(), 1.0, 0.0)
}

fn flag_action(flag: &Rc<Cell<bool>>) -> viewport_anim::Action {
    let flag = Rc::clone(flag);
    Box::new(move |_| flag.set(true))
}

fn scale_of(system: &mut AnimationSystem) -> Option<f64> {
    system
        .get_property(AnimObject::MapPlane, AnimProperty::Scale)
        .and_then(|v| v.as_scalar())
}

#[test]
fn test_push_scale_doubling() {
    let mut system = AnimationSystem::new();
    let mut zoom = MapLinearAnimation::new();
    zoom.set_scale(1.0, 2.0);
    assert!((zoom.duration() - 0.2).abs() < EPS);

    system.push_animation(Box::new(zoom));
    system.advance(0.05);
    system.advance(0.05);

    let scale = scale_of(&mut system).unwrap();
    assert!((scale - 1.5).abs() < EPS);
    assert!(system.has_animations());
}

#[test]
fn test_blendable_animation_joins_front_chain() {
    let mut system = AnimationSystem::new();
    system.update_last_screen(&screen());
    system.push_animation(Box::new(MapScaleAnimation::new(
        1.0,
        0.5,
        PointD::zero(),
        PointD::zero(),
    )));

    let started = Rc::new(Cell::new(false));
    let mut rotate = MapLinearAnimation::new();
    rotate.set_rotate(0.0, 1.0);
    let mut parallel = ParallelAnimation::new();
    parallel.add_animation(Box::new(rotate));
    parallel.set_on_start_action(flag_action(&started));

    system.combine_animation(Box::new(parallel));

    assert!(started.get());
    assert_eq!(system.chain_count(), 1);
    assert_eq!(system.front_chain_len(), 2);
}

#[test]
fn test_non_interruptible_member_defers_new_chain() {
    let mut system = AnimationSystem::new();
    let tilt = PerspectiveSwitchAnimation::new(0.0, 0.5, 1.0);
    let tilt_duration = tilt.duration();
    system.combine_animation(Box::new(tilt));

    let started = Rc::new(Cell::new(false));
    let mut pan = MapLinearAnimation::new();
    pan.set_move(PointD::zero(), PointD::new(200.0, 0.0), &screen());
    pan.set_on_start_action(flag_action(&started));
    system.combine_animation(Box::new(pan));

    assert_eq!(system.chain_count(), 2);
    assert!(!started.get());

    system.advance(tilt_duration + 0.01);
    assert_eq!(system.chain_count(), 1);
    assert!(started.get());
}

#[test]
fn test_conflicting_member_is_interrupted() {
    let mut system = AnimationSystem::new();
    let interrupted = Rc::new(Cell::new(false));

    let mut first = MapLinearAnimation::new();
    first.set_scale(1.0, 4.0);
    first.set_on_interrupt_action(flag_action(&interrupted));
    system.combine_animation(Box::new(first));
    system.advance(0.1);

    let mut second = MapLinearAnimation::new();
    second.set_scale(2.0, 1.0);
    system.combine_animation(Box::new(second));

    assert!(interrupted.get());
    assert_eq!(system.chain_count(), 1);
    assert_eq!(system.front_chain_len(), 1);
}

#[test]
fn test_finish_all_drops_dormant_matches() {
    let mut system = AnimationSystem::new();

    let mut zoom = MapLinearAnimation::new();
    zoom.set_scale(1.0, 4.0);
    system.push_animation(Box::new(zoom));
    system.push_animation(Box::new(MapScaleAnimation::new(
        1.0,
        2.0,
        PointD::zero(),
        PointD::zero(),
    )));
    let mut later = MapLinearAnimation::new();
    later.set_rotate(0.0, 1.0);
    system.push_animation(Box::new(later));
    assert_eq!(system.chain_count(), 3);

    system.finish_animations_of_type(AnimationType::MapScale, None, false, true);
    assert_eq!(system.chain_count(), 2);

    system.finish_animations_of_type(AnimationType::MapLinear, None, true, true);
    assert!(!system.has_animations());

    // 快进后的终值只能读取一次
    assert_eq!(scale_of(&mut system), Some(4.0));
    assert_eq!(scale_of(&mut system), None);
}

#[test]
fn test_target_rect_does_not_consume() {
    let screen = screen();
    let mut system = AnimationSystem::new();
    system.update_last_screen(&screen);

    let mut pan = MapLinearAnimation::new();
    pan.set_move(PointD::zero(), PointD::new(100.0, 50.0), &screen);
    system.combine_animation(Box::new(pan));

    let target = system.get_target_rect(&screen);
    assert!(target.global_center().almost_eq(PointD::new(100.0, 50.0), EPS));
    assert!((target.local_rect().size_x() - 1000.0).abs() < EPS);

    let current = system.get_rect(&screen);
    assert!(current.global_center().almost_eq(PointD::zero(), EPS));
    assert!(system.has_animations());
}

#[test]
fn test_perspective_switch_events() {
    let mut system = AnimationSystem::new();
    let enter = PerspectiveSwitchAnimation::new(0.0, 0.5, 1.0);
    let duration = enter.duration();
    system.push_animation(Box::new(enter));

    insta::assert_debug_snapshot!(system.switch_perspective(), @r"
    Some(
        SwitchPerspectiveParams {
            enable: true,
            from_angle: 0.0,
            to_angle: 0.5,
            fov_angle: 1.0,
        },
    )
    ");
    assert_eq!(system.switch_perspective(), None);

    system.advance(duration + 0.01);
    assert!((system.get_perspective_angle(0.0) - 0.5).abs() < EPS);
    assert!(!system.has_animations());

    system.push_animation(Box::new(PerspectiveSwitchAnimation::new(0.5, 0.0, 1.0)));
    assert_eq!(system.switch_perspective(), None);
    system.advance(duration + 0.01);

    let leave = system.switch_perspective().unwrap();
    assert!(!leave.enable);
    assert_eq!(system.switch_perspective(), None);
}

#[test]
fn test_running_sequence_defers_conflicting_combine() {
    let screen = screen();
    let mut end = screen.clone();
    end.set_org(PointD::new(100_000.0, 0.0));

    let mut system = AnimationSystem::new();
    system.update_last_screen(&screen);
    system.combine_animation(Box::new(get_pretty_move_animation(&screen, &end)));
    system.advance(0.1);

    let mut zoom = MapLinearAnimation::new();
    zoom.set_scale(1.0, 2.0);
    system.combine_animation(Box::new(zoom));

    // 序列不可打断，新动画排在它之后
    assert_eq!(system.chain_count(), 2);
    assert_eq!(system.front_chain_len(), 1);
    assert!(system.find_animation(AnimationType::Sequence, None).is_some());
}

#[test]
fn test_pretty_move_reaches_destination() {
    let mut screen = screen();
    let mut end = screen.clone();
    end.set_org(PointD::new(100_000.0, 0.0));

    let mut system = AnimationSystem::new();
    system.update_last_screen(&screen);
    let sequence = get_pretty_move_animation(&screen, &end);
    assert!(sequence.duration() > 0.0);
    system.combine_animation(Box::new(sequence));

    let mut max_scale = screen.scale();
    let mut frames = 0;
    while system.has_animations() && frames < 600 {
        system.advance(1.0 / 60.0);
        let rect = system.get_rect(&screen);
        screen.set_from_rect(&rect);
        max_scale = max_scale.max(screen.scale());
        frames += 1;
    }

    assert!(!system.has_animations());
    assert!(max_scale > 1.0);
    assert!(screen.org().almost_eq(PointD::new(100_000.0, 0.0), 1e-3));
    assert!((screen.scale() - 1.0).abs() < EPS);
}
