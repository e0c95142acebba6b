//! 并行组合动画

use super::{Animation, AnimationBase, AnimationType, ResultSink};
use crate::geometry::ScreenBase;
use crate::property::{AnimObject, AnimProperty, PropertyValue};

/// 并行运行多个子动画
///
/// 声明的对象 / 属性集合是所有子动画的并集。
/// 子动画完成时触发其 `on_finish`、保存结果并移出；列表为空即视为完成。
pub struct ParallelAnimation {
    base: AnimationBase,
    animations: Vec<Box<dyn Animation>>,
}

impl std::fmt::Debug for ParallelAnimation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let types: Vec<AnimationType> = self
            .animations
            .iter()
            .map(|a| a.animation_type())
            .collect();
        f.debug_struct("ParallelAnimation")
            .field("base", &self.base)
            .field("animations", &types)
            .finish()
    }
}

impl Default for ParallelAnimation {
    fn default() -> Self {
        Self::new()
    }
}

impl ParallelAnimation {
    pub fn new() -> Self {
        Self {
            base: AnimationBase::new(true, true),
            animations: Vec::new(),
        }
    }

    pub fn add_animation(&mut self, animation: Box<dyn Animation>) {
        for &object in animation.objects() {
            for &property in animation.properties(object) {
                self.base.add_property(object, property);
            }
        }
        self.animations.push(animation);
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// 按类型（及可选的自定义类型）查找子动画
    pub fn find_animation(
        &self,
        animation_type: AnimationType,
        custom_type: Option<&str>,
    ) -> Option<&dyn Animation> {
        self.animations
            .iter()
            .find(|a| {
                a.animation_type() == animation_type
                    && custom_type.is_none_or(|custom| a.custom_type() == custom)
            })
            .map(|a| a.as_ref())
    }

    /// 按具体类型查找子动画
    pub fn find_animation_as<T: Animation + 'static>(
        &self,
        animation_type: AnimationType,
        custom_type: Option<&str>,
    ) -> Option<&T> {
        self.find_animation(animation_type, custom_type)
            .and_then(|a| a.as_any().downcast_ref::<T>())
    }

    fn rebuild_properties(&mut self) {
        self.base.clear_properties();
        for animation in &self.animations {
            for &object in animation.objects() {
                for &property in animation.properties(object) {
                    self.base.add_property(object, property);
                }
            }
        }
    }

    /// 移出已完成的子动画
    ///
    /// 先标记再压缩，回调执行期间列表不变。
    fn evict_finished(&mut self, sink: &mut ResultSink<'_>) {
        let finished: Vec<bool> = self.animations.iter().map(|a| a.is_finished()).collect();
        if !finished.contains(&true) {
            return;
        }

        for (animation, _) in self
            .animations
            .iter_mut()
            .zip(&finished)
            .filter(|(_, done)| **done)
        {
            animation.on_finish();
            sink.save(animation.as_ref());
        }

        let mut marks = finished.into_iter();
        self.animations
            .retain(|_| !marks.next().unwrap_or(false));
        self.rebuild_properties();
    }
}

impl Animation for ParallelAnimation {
    fn animation_type(&self) -> AnimationType {
        AnimationType::Parallel
    }

    fn base(&self) -> &AnimationBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AnimationBase {
        &mut self.base
    }

    fn on_start(&mut self) {
        for animation in &mut self.animations {
            animation.on_start();
        }
        super::run_action(self, super::ActionKind::Start);
    }

    fn advance(&mut self, elapsed_seconds: f64, sink: &mut ResultSink<'_>) {
        for animation in &mut self.animations {
            animation.advance(elapsed_seconds, sink);
        }
        self.evict_finished(sink);
    }

    fn finish(&mut self, sink: &mut ResultSink<'_>) {
        for animation in &mut self.animations {
            animation.finish(sink);
            sink.save(animation.as_ref());
        }
        self.animations.clear();
        self.rebuild_properties();
        self.on_finish();
    }

    fn is_finished(&self) -> bool {
        self.animations.is_empty()
    }

    fn duration(&self) -> f64 {
        self.animations
            .iter()
            .map(|a| a.duration())
            .fold(0.0, f64::max)
    }

    fn set_max_duration(&mut self, max_duration: f64) {
        for animation in &mut self.animations {
            animation.set_max_duration(max_duration);
        }
    }

    fn set_min_duration(&mut self, min_duration: f64) {
        for animation in &mut self.animations {
            animation.set_min_duration(min_duration);
        }
    }

    /// 只有所有子动画都可打断时才可打断
    fn could_be_interrupted(&self) -> bool {
        self.base.could_be_interrupted
            && self.animations.iter().all(|a| a.could_be_interrupted())
    }

    fn get_property(
        &self,
        object: AnimObject,
        property: AnimProperty,
        screen: &ScreenBase,
    ) -> Option<PropertyValue> {
        self.animations
            .iter()
            .filter(|a| a.has_property(object, property))
            .find_map(|a| a.get_property(object, property, screen))
    }

    fn get_target_property(
        &self,
        object: AnimObject,
        property: AnimProperty,
        screen: &ScreenBase,
    ) -> Option<PropertyValue> {
        self.animations
            .iter()
            .filter(|a| a.has_property(object, property))
            .find_map(|a| a.get_target_property(object, property, screen))
    }
}
