//! # System 模块
//!
//! 视口动画调度器。
//!
//! ```rust,ignore
//! let mut system = AnimationSystem::new();
//! system.combine_animation(Box::new(anim));
//! // 每帧
//! system.advance(dt);
//! let rect = system.get_rect(&screen);
//! ```
//!
//! ## 链
//!
//! 调度器持有一个有序的链队列，每条链是一组同时运行的动画。
//! 只有队首链会被启动和推进，其余链保持休眠（其动画尚未收到 `on_start`），
//! 直到队首链清空。
//!
//! ## 属性缓存
//!
//! 动画完成或被打断时，它的属性终值写入缓存。缓存值只能读取一次，
//! 作为下一个触及该属性的动画的起点。

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::animation::{Animation, AnimationType, ResultSink};
use crate::geometry::{AnyRectD, PointD, ScreenBase};
use crate::property::{
    AnimObject, AnimProperty, PropertyBlender, PropertyCache, PropertyKey, PropertyValue,
    SwitchPerspectiveParams,
};

/// 一组同时运行的动画
type Chain = Vec<Box<dyn Animation>>;

/// 动画调度器
///
/// 显式的上下文对象，由视图控制器创建并在每帧调用。
/// 所有操作都在调用线程内同步完成。
pub struct AnimationSystem {
    chains: VecDeque<Chain>,
    property_cache: PropertyCache,
    /// 派生属性（锚点缩放、跟随位置）计算时使用的视口
    last_screen: ScreenBase,
}

impl Default for AnimationSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AnimationSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let chains: Vec<Vec<AnimationType>> = self
            .chains
            .iter()
            .map(|chain| chain.iter().map(|a| a.animation_type()).collect())
            .collect();
        f.debug_struct("AnimationSystem")
            .field("chains", &chains)
            .field("property_cache", &self.property_cache.len())
            .finish()
    }
}

impl AnimationSystem {
    /// 创建新的调度器
    pub fn new() -> Self {
        Self {
            chains: VecDeque::new(),
            property_cache: PropertyCache::new(),
            last_screen: ScreenBase::default(),
        }
    }

    // ========== 提交 ==========

    /// 尝试合并进队首链
    ///
    /// 队首链中与新动画冲突（不可混合）的成员：
    /// - 全部可打断时，打断它们（保存结果、移出），新动画加入队首链并立即启动
    /// - 任一不可打断时，不做任何打断，新动画作为新链排队
    ///
    /// 标记了 `interrupted_on_combine` 的成员总是被打断。
    pub fn combine_animation(&mut self, mut animation: Box<dyn Animation>) {
        let Some(front) = self.chains.front() else {
            self.push_animation(animation);
            return;
        };

        let mut interrupted = Vec::with_capacity(front.len());
        let mut blocked_by = None;
        for member in front {
            let forced = member.interrupted_on_combine();
            let conflict = forced || !member.could_be_blended_with(animation.as_ref());
            if conflict && !forced && !member.could_be_interrupted() {
                blocked_by = Some(member.animation_type());
                break;
            }
            interrupted.push(conflict);
        }

        if let Some(blocked_by) = blocked_by {
            debug!(
                anim_type = ?animation.animation_type(),
                ?blocked_by,
                "combine blocked, pushing new chain"
            );
            self.push_animation(animation);
            return;
        }

        let Self {
            chains,
            property_cache,
            last_screen,
        } = self;
        let Some(front) = chains.front_mut() else {
            return;
        };

        let mut sink = ResultSink::new(last_screen, property_cache);
        for (member, _) in front
            .iter_mut()
            .zip(&interrupted)
            .filter(|(_, hit)| **hit)
        {
            debug!(anim_type = ?member.animation_type(), "animation interrupted");
            member.interrupt();
            sink.save(member.as_ref());
        }
        let mut marks = interrupted.into_iter();
        front.retain(|_| !marks.next().unwrap_or(false));

        debug!(
            anim_type = ?animation.animation_type(),
            members = front.len() + 1,
            "animation combined into front chain"
        );
        animation.on_start();
        front.push(animation);
    }

    /// 新建一条只含该动画的链
    ///
    /// 没有其他链时立即启动。
    pub fn push_animation(&mut self, mut animation: Box<dyn Animation>) {
        let start = self.chains.is_empty();
        debug!(
            anim_type = ?animation.animation_type(),
            chains = self.chains.len() + 1,
            start,
            "chain pushed"
        );
        if start {
            animation.on_start();
        }
        self.chains.push_back(vec![animation]);
    }

    // ========== 推进 ==========

    /// 推进队首链
    ///
    /// 完成的动画触发 `on_finish`、保存结果并移出；
    /// 队首链清空后启动下一条链。
    pub fn advance(&mut self, elapsed_seconds: f64) {
        let Self {
            chains,
            property_cache,
            last_screen,
        } = self;
        let Some(front) = chains.front_mut() else {
            return;
        };

        trace!(elapsed_seconds, members = front.len(), "advance front chain");
        let mut sink = ResultSink::new(last_screen, property_cache);
        for animation in front.iter_mut() {
            animation.advance(elapsed_seconds, &mut sink);
        }

        let finished: Vec<bool> = front.iter().map(|a| a.is_finished()).collect();
        for (animation, _) in front
            .iter_mut()
            .zip(&finished)
            .filter(|(_, done)| **done)
        {
            debug!(anim_type = ?animation.animation_type(), "animation finished");
            animation.on_finish();
            sink.save(animation.as_ref());
        }
        let mut marks = finished.into_iter();
        front.retain(|_| !marks.next().unwrap_or(false));

        if front.is_empty() {
            self.start_next_chain();
        }
    }

    /// 丢弃空的队首链并启动下一条
    fn start_next_chain(&mut self) {
        while self.chains.front().is_some_and(|chain| chain.is_empty()) {
            self.chains.pop_front();
        }
        debug!(chains = self.chains.len(), "front chain drained");

        if let Some(front) = self.chains.front_mut() {
            for animation in front.iter_mut() {
                animation.on_start();
            }
            debug!(members = front.len(), "chain started");
        }
    }

    // ========== 强制结束 ==========

    /// 结束匹配的动画
    ///
    /// - 队首链中匹配的动画被移出；`rewind` 为 true 时先跳到终值。
    ///   两种情况下当前值都会写入缓存
    /// - `finish_all` 为 true 时，休眠链中匹配的动画直接丢弃
    pub fn finish_animations<P>(&mut self, predicate: P, rewind: bool, finish_all: bool)
    where
        P: Fn(&dyn Animation) -> bool,
    {
        if self.chains.is_empty() {
            return;
        }

        let Self {
            chains,
            property_cache,
            last_screen,
        } = self;

        if let Some(front) = chains.front_mut() {
            let matched: Vec<bool> = front.iter().map(|a| predicate(a.as_ref())).collect();
            let mut sink = ResultSink::new(last_screen, property_cache);
            for (animation, _) in front
                .iter_mut()
                .zip(&matched)
                .filter(|(_, hit)| **hit)
            {
                debug!(anim_type = ?animation.animation_type(), rewind, "animation finished early");
                if rewind {
                    animation.finish(&mut sink);
                }
                sink.save(animation.as_ref());
            }
            let mut marks = matched.into_iter();
            front.retain(|_| !marks.next().unwrap_or(false));
        }

        if finish_all {
            for chain in chains.iter_mut().skip(1) {
                chain.retain(|a| !predicate(a.as_ref()));
            }
            let front = chains.pop_front();
            chains.retain(|chain| !chain.is_empty());
            if let Some(front) = front {
                chains.push_front(front);
            }
        }

        if chains.front().is_some_and(|chain| chain.is_empty()) {
            self.start_next_chain();
        }
    }

    /// 按类型结束动画，`custom_type` 为 `Some` 时还需自定义类型一致
    pub fn finish_animations_of_type(
        &mut self,
        animation_type: AnimationType,
        custom_type: Option<&str>,
        rewind: bool,
        finish_all: bool,
    ) {
        self.finish_animations(
            |a| {
                a.animation_type() == animation_type
                    && custom_type.is_none_or(|custom| a.custom_type() == custom)
            },
            rewind,
            finish_all,
        );
    }

    /// 结束驱动某个对象的所有动画
    pub fn finish_object_animations(&mut self, object: AnimObject, rewind: bool, finish_all: bool) {
        self.finish_animations(|a| a.has_object(object), rewind, finish_all);
    }

    // ========== 查询 ==========

    /// 当前属性值
    ///
    /// 队首链中声明该属性的动画混合得出；没有贡献时取出缓存值（单次有效）。
    /// 返回 `None` 表示该属性未被动画驱动，调用方应使用视口自身的值。
    pub fn get_property(
        &mut self,
        object: AnimObject,
        property: AnimProperty,
    ) -> Option<PropertyValue> {
        if let Some(front) = self.chains.front() {
            let mut blender = PropertyBlender::new();
            for animation in front {
                if !animation.has_property(object, property) {
                    continue;
                }
                if let Some(value) = animation.get_property(object, property, &self.last_screen) {
                    blender.blend(value);
                }
            }
            if !blender.is_empty() {
                return blender.finish();
            }
        }

        self.property_cache
            .remove(&PropertyKey::new(object, property))
    }

    /// 动画结束时的属性值，不消耗缓存
    pub fn get_target_property(
        &self,
        object: AnimObject,
        property: AnimProperty,
    ) -> Option<PropertyValue> {
        self.target_property_on(object, property, &self.last_screen)
    }

    fn target_property_on(
        &self,
        object: AnimObject,
        property: AnimProperty,
        screen: &ScreenBase,
    ) -> Option<PropertyValue> {
        if let Some(front) = self.chains.front() {
            let mut blender = PropertyBlender::new();
            for animation in front {
                if !animation.has_property(object, property) {
                    continue;
                }
                if let Some(value) = animation.get_target_property(object, property, screen) {
                    blender.blend(value);
                }
            }
            if !blender.is_empty() {
                return blender.finish();
            }
        }

        self.property_cache
            .get(&PropertyKey::new(object, property))
            .copied()
    }

    /// 当前相机矩形
    ///
    /// 以 `current_screen` 为基础，叠加正在驱动的位置、角度和缩放。
    /// 同时把 `current_screen` 记为派生属性计算使用的视口。
    pub fn get_rect(&mut self, current_screen: &ScreenBase) -> AnyRectD {
        self.last_screen = current_screen.clone();

        let scale = self
            .get_property(AnimObject::MapPlane, AnimProperty::Scale)
            .and_then(|v| v.as_scalar())
            .unwrap_or(current_screen.scale());
        let angle = self
            .get_property(AnimObject::MapPlane, AnimProperty::Angle)
            .and_then(|v| v.as_scalar())
            .unwrap_or(current_screen.angle());
        let position = self
            .get_property(AnimObject::MapPlane, AnimProperty::Position)
            .and_then(|v| v.as_point())
            .unwrap_or(current_screen.global_rect().global_zero());

        Self::rect_from(current_screen, position, angle, scale)
    }

    /// 动画全部结束后的相机矩形
    pub fn get_target_rect(&self, current_screen: &ScreenBase) -> AnyRectD {
        let target =
            |property| self.target_property_on(AnimObject::MapPlane, property, current_screen);

        let scale = target(AnimProperty::Scale)
            .and_then(|v| v.as_scalar())
            .unwrap_or(current_screen.scale());
        let angle = target(AnimProperty::Angle)
            .and_then(|v| v.as_scalar())
            .unwrap_or(current_screen.angle());
        let position = target(AnimProperty::Position)
            .and_then(|v| v.as_point())
            .unwrap_or(current_screen.global_rect().global_zero());

        Self::rect_from(current_screen, position, angle, scale)
    }

    fn rect_from(screen: &ScreenBase, position: PointD, angle: f64, scale: f64) -> AnyRectD {
        let mut local = screen.pixel_rect();
        local.offset(-local.center());
        local.scale(scale);
        AnyRectD::new(position, angle, local)
    }

    /// 当前透视倾斜角，未被驱动时返回 `current_angle`
    pub fn get_perspective_angle(&mut self, current_angle: f64) -> f64 {
        self.get_property(AnimObject::MapPlane, AnimProperty::AnglePerspective)
            .and_then(|v| v.as_scalar())
            .unwrap_or(current_angle)
    }

    /// 本帧的透视开关事件（至多一个）
    pub fn switch_perspective(&mut self) -> Option<SwitchPerspectiveParams> {
        self.get_property(AnimObject::MapPlane, AnimProperty::SwitchPerspective)
            .and_then(|v| v.as_perspective_params())
    }

    /// 队首链驱动该对象，或缓存中留有它的值
    pub fn animation_exists(&self, object: AnimObject) -> bool {
        let in_front = self
            .chains
            .front()
            .is_some_and(|front| front.iter().any(|a| a.has_object(object)));
        in_front || self.property_cache.keys().any(|key| key.object == object)
    }

    pub fn has_animations(&self) -> bool {
        !self.chains.is_empty()
    }

    /// 链的数量（含队首链）
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// 队首链中的动画数量
    pub fn front_chain_len(&self) -> usize {
        self.chains.front().map_or(0, |front| front.len())
    }

    /// 按类型（及可选的自定义类型）查找动画，依次搜索所有链
    pub fn find_animation(
        &self,
        animation_type: AnimationType,
        custom_type: Option<&str>,
    ) -> Option<&dyn Animation> {
        self.chains
            .iter()
            .flatten()
            .find(|a| {
                a.animation_type() == animation_type
                    && custom_type.is_none_or(|custom| a.custom_type() == custom)
            })
            .map(|a| a.as_ref())
    }

    /// 按具体类型查找动画
    pub fn find_animation_as<T: Animation + 'static>(
        &self,
        animation_type: AnimationType,
        custom_type: Option<&str>,
    ) -> Option<&T> {
        self.find_animation(animation_type, custom_type)
            .and_then(|a| a.as_any().downcast_ref::<T>())
    }

    /// 更新派生属性计算使用的视口
    pub fn update_last_screen(&mut self, screen: &ScreenBase) {
        self.last_screen = screen.clone();
    }

    pub fn last_screen(&self) -> &ScreenBase {
        &self.last_screen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{MapLinearAnimation, MapScaleAnimation, PerspectiveSwitchAnimation};

    fn scale(start: f64, end: f64) -> Box<dyn Animation> {
        let mut anim = MapLinearAnimation::new();
        anim.set_scale(start, end);
        Box::new(anim)
    }

    #[test]
    fn test_new_system_is_idle() {
        let mut system = AnimationSystem::new();
        assert!(!system.has_animations());
        assert_eq!(system.chain_count(), 0);
        assert!(system.get_property(AnimObject::MapPlane, AnimProperty::Scale).is_none());
        system.advance(0.1);
        assert!(!system.has_animations());
    }

    #[test]
    fn test_cache_value_is_single_use() {
        let mut system = AnimationSystem::new();
        system.push_animation(scale(1.0, 2.0));
        system.advance(0.5);
        assert!(!system.has_animations());
        assert!(system.animation_exists(AnimObject::MapPlane));

        assert_eq!(
            system.get_target_property(AnimObject::MapPlane, AnimProperty::Scale),
            Some(PropertyValue::Scalar(2.0))
        );
        assert_eq!(
            system.get_property(AnimObject::MapPlane, AnimProperty::Scale),
            Some(PropertyValue::Scalar(2.0))
        );
        assert_eq!(
            system.get_property(AnimObject::MapPlane, AnimProperty::Scale),
            None
        );
        assert!(!system.animation_exists(AnimObject::MapPlane));
    }

    #[test]
    fn test_combine_interrupts_interruptible_conflict() {
        let mut system = AnimationSystem::new();
        system.push_animation(scale(1.0, 4.0));
        system.advance(0.2);

        system.combine_animation(scale(3.0, 1.0));
        assert_eq!(system.chain_count(), 1);
        assert_eq!(system.front_chain_len(), 1);

        // 被打断的动画把当前值写入了缓存，但队首链仍在驱动缩放
        system.advance(0.0);
        assert_eq!(
            system.get_property(AnimObject::MapPlane, AnimProperty::Scale),
            Some(PropertyValue::Scalar(3.0))
        );
    }

    #[test]
    fn test_blended_values_are_averaged() {
        let mut system = AnimationSystem::new();
        system.push_animation(Box::new(MapScaleAnimation::new(
            2.0,
            2.0,
            PointD::zero(),
            PointD::zero(),
        )));
        let follow = crate::animation::MapFollowAnimation::new(
            PointD::zero(),
            4.0,
            8.0,
            0.0,
            0.0,
            PointD::zero(),
            PointD::zero(),
            ScreenBase::default().pixel_rect(),
        );
        system.combine_animation(Box::new(follow));
        assert_eq!(system.front_chain_len(), 2);

        // 4.0 与 2.0 的平均
        assert_eq!(
            system.get_property(AnimObject::MapPlane, AnimProperty::Scale),
            Some(PropertyValue::Scalar(3.0))
        );
    }

    #[test]
    fn test_finish_all_drops_dormant_matches() {
        let mut system = AnimationSystem::new();
        system.push_animation(Box::new(PerspectiveSwitchAnimation::new(0.0, 0.5, 1.0)));
        system.push_animation(scale(1.0, 2.0));
        system.push_animation(Box::new(PerspectiveSwitchAnimation::new(0.5, 0.0, 1.0)));
        assert_eq!(system.chain_count(), 3);

        system.finish_animations_of_type(AnimationType::MapPerspective, None, true, true);
        assert_eq!(system.chain_count(), 1);
        assert!(system.find_animation(AnimationType::MapLinear, None).is_some());
        assert!(system.find_animation(AnimationType::MapPerspective, None).is_none());
        assert_eq!(
            system.get_property(AnimObject::MapPlane, AnimProperty::AnglePerspective),
            Some(PropertyValue::Scalar(0.5))
        );
    }

    #[test]
    fn test_object_scoped_queries() {
        let mut system = AnimationSystem::new();
        system.push_animation(scale(1.0, 2.0));
        assert!(system.animation_exists(AnimObject::MapPlane));
        assert!(!system.animation_exists(AnimObject::Selection));

        // 没有动画驱动我的位置标记，地图动画不受影响
        system.finish_object_animations(AnimObject::MyPosition, true, true);
        assert_eq!(system.front_chain_len(), 1);

        system.finish_object_animations(AnimObject::MapPlane, true, true);
        assert!(!system.has_animations());
        assert_eq!(
            system.get_property(AnimObject::MapPlane, AnimProperty::Scale),
            Some(PropertyValue::Scalar(2.0))
        );
    }

    #[test]
    fn test_get_rect_without_animation_matches_screen() {
        let mut system = AnimationSystem::new();
        let screen = ScreenBase::new(
            crate::geometry::RectD::with_size(200.0, 100.0),
            PointD::new(3.0, 4.0),
            2.0,
            0.5,
        );
        let rect = system.get_rect(&screen);
        assert_eq!(rect, screen.global_rect());
        assert_eq!(system.get_target_rect(&screen), screen.global_rect());
        assert_eq!(system.last_screen(), &screen);
    }
}
