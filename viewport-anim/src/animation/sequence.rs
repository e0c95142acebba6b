//! 顺序组合动画

use std::collections::VecDeque;

use tracing::warn;

use super::{Animation, AnimationBase, AnimationType, ResultSink};
use crate::geometry::ScreenBase;
use crate::property::{AnimObject, AnimProperty, PropertyValue};

/// 依次运行多个子动画
///
/// 只有队首动画会被推进。队首完成后保存其结果并出队，
/// 声明的属性切换为新队首的属性，新队首随即启动。
pub struct SequenceAnimation {
    base: AnimationBase,
    animations: VecDeque<Box<dyn Animation>>,
}

impl std::fmt::Debug for SequenceAnimation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let types: Vec<AnimationType> = self
            .animations
            .iter()
            .map(|a| a.animation_type())
            .collect();
        f.debug_struct("SequenceAnimation")
            .field("base", &self.base)
            .field("animations", &types)
            .finish()
    }
}

impl Default for SequenceAnimation {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceAnimation {
    pub fn new() -> Self {
        Self {
            base: AnimationBase::new(false, false),
            animations: VecDeque::new(),
        }
    }

    pub fn add_animation(&mut self, animation: Box<dyn Animation>) {
        self.animations.push_back(animation);
        if self.animations.len() == 1 {
            self.obtain_properties();
        }
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// 当前队首
    pub fn head(&self) -> Option<&dyn Animation> {
        self.animations.front().map(|a| a.as_ref())
    }

    /// 声明的属性与队首一致
    fn obtain_properties(&mut self) {
        self.base.clear_properties();
        if let Some(head) = self.animations.front() {
            for &object in head.objects() {
                for &property in head.properties(object) {
                    self.base.add_property(object, property);
                }
            }
        }
    }
}

impl Animation for SequenceAnimation {
    fn animation_type(&self) -> AnimationType {
        AnimationType::Sequence
    }

    fn base(&self) -> &AnimationBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AnimationBase {
        &mut self.base
    }

    fn on_start(&mut self) {
        if let Some(head) = self.animations.front_mut() {
            head.on_start();
        }
        super::run_action(self, super::ActionKind::Start);
    }

    fn advance(&mut self, elapsed_seconds: f64, sink: &mut ResultSink<'_>) {
        let Some(head) = self.animations.front_mut() else {
            warn!("advance on empty sequence");
            return;
        };

        head.advance(elapsed_seconds, sink);
        if !head.is_finished() {
            return;
        }

        head.on_finish();
        sink.save(head.as_ref());
        self.animations.pop_front();
        self.obtain_properties();
        if let Some(next) = self.animations.front_mut() {
            next.on_start();
        }
    }

    fn finish(&mut self, sink: &mut ResultSink<'_>) {
        for animation in &mut self.animations {
            animation.finish(sink);
            sink.save(animation.as_ref());
        }
        self.animations.clear();
        self.obtain_properties();
        self.on_finish();
    }

    fn is_finished(&self) -> bool {
        self.animations.is_empty()
    }

    /// 所有子动画时长之和
    fn duration(&self) -> f64 {
        self.animations.iter().map(|a| a.duration()).sum()
    }

    /// 序列的时长由子动画各自决定
    fn set_max_duration(&mut self, _max_duration: f64) {}

    fn set_min_duration(&mut self, _min_duration: f64) {}

    fn get_property(
        &self,
        object: AnimObject,
        property: AnimProperty,
        screen: &ScreenBase,
    ) -> Option<PropertyValue> {
        let head = self.animations.front()?;
        if !head.has_property(object, property) {
            return None;
        }
        head.get_property(object, property, screen)
    }

    /// 最后一个驱动该属性的子动画的终值
    fn get_target_property(
        &self,
        object: AnimObject,
        property: AnimProperty,
        screen: &ScreenBase,
    ) -> Option<PropertyValue> {
        self.animations
            .iter()
            .rev()
            .filter(|a| a.has_property(object, property))
            .find_map(|a| a.get_target_property(object, property, screen))
    }
}
