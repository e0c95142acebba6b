//! # Animation 模块
//!
//! 动画的抽象接口与各具体动画类型。
//!
//! ## 生命周期
//!
//! `创建 → 启动（on_start）→ 运行（advance）→ 完成（on_finish）`
//!
//! 状态只能向前推进。`finish()` 是唯一能在自然完成之前直接跳到完成状态的途径。
//!
//! ## 具体类型
//!
//! - [`MapLinearAnimation`]: 独立的平移 / 旋转 / 缩放
//! - [`MapScaleAnimation`]: 以屏幕某点为锚的缩放
//! - [`MapFollowAnimation`]: 跟随用户位置，同时旋转与缩放
//! - [`PerspectiveSwitchAnimation`]: 3D 倾斜开关
//! - [`ParallelAnimation`]: 并行运行多个动画
//! - [`SequenceAnimation`]: 依次运行多个动画

mod follow;
mod linear;
mod parallel;
mod perspective;
mod scale;
mod sequence;

pub use follow::MapFollowAnimation;
pub use linear::MapLinearAnimation;
pub use parallel::ParallelAnimation;
pub use perspective::PerspectiveSwitchAnimation;
pub use scale::MapScaleAnimation;
pub use sequence::SequenceAnimation;

use std::any::Any;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::ScreenBase;
use crate::property::{
    AnimObject, AnimObjects, AnimProperty, ObjectProperties, PropertyCache, PropertyKey,
    PropertyValue,
};

/// 动画类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationType {
    MapLinear,
    MapScale,
    MapFollow,
    MapPerspective,
    Parallel,
    Sequence,
}

/// 生命周期回调
pub type Action = Box<dyn FnMut(&dyn Animation)>;

#[derive(Debug, Clone, Copy)]
enum ActionKind {
    Start,
    Finish,
    Interrupt,
}

static NO_PROPERTIES: ObjectProperties = ObjectProperties::new();

/// 各动画类型共享的状态
///
/// 声明驱动的对象与属性、可打断 / 可混合标志、自定义类型标签和生命周期回调。
pub struct AnimationBase {
    objects: AnimObjects,
    properties: BTreeMap<AnimObject, ObjectProperties>,
    could_be_interrupted: bool,
    could_be_blended: bool,
    interrupted_on_combine: bool,
    custom_type: String,
    on_start: Option<Action>,
    on_finish: Option<Action>,
    on_interrupt: Option<Action>,
}

impl std::fmt::Debug for AnimationBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationBase")
            .field("objects", &self.objects)
            .field("properties", &self.properties)
            .field("could_be_interrupted", &self.could_be_interrupted)
            .field("could_be_blended", &self.could_be_blended)
            .field("interrupted_on_combine", &self.interrupted_on_combine)
            .field("custom_type", &self.custom_type)
            .finish_non_exhaustive()
    }
}

impl AnimationBase {
    pub fn new(could_be_interrupted: bool, could_be_blended: bool) -> Self {
        Self {
            objects: AnimObjects::new(),
            properties: BTreeMap::new(),
            could_be_interrupted,
            could_be_blended,
            interrupted_on_combine: false,
            custom_type: String::new(),
            on_start: None,
            on_finish: None,
            on_interrupt: None,
        }
    }

    /// 声明驱动某个对象的某个属性
    pub fn add_property(&mut self, object: AnimObject, property: AnimProperty) {
        self.objects.insert(object);
        self.properties.entry(object).or_default().insert(property);
    }

    /// 清空已声明的对象与属性
    pub fn clear_properties(&mut self) {
        self.objects.clear();
        self.properties.clear();
    }

    pub fn objects(&self) -> &AnimObjects {
        &self.objects
    }

    pub fn properties(&self, object: AnimObject) -> &ObjectProperties {
        self.properties.get(&object).unwrap_or(&NO_PROPERTIES)
    }

    fn action_slot(&mut self, kind: ActionKind) -> &mut Option<Action> {
        match kind {
            ActionKind::Start => &mut self.on_start,
            ActionKind::Finish => &mut self.on_finish,
            ActionKind::Interrupt => &mut self.on_interrupt,
        }
    }
}

/// 调用回调
///
/// 回调执行期间从槽位中取出，以便把动画本身借给它。
fn run_action<A: Animation + ?Sized>(animation: &mut A, kind: ActionKind) {
    let Some(mut action) = animation.base_mut().action_slot(kind).take() else {
        return;
    };
    action(animation.as_animation());
    let slot = animation.base_mut().action_slot(kind);
    if slot.is_none() {
        *slot = Some(action);
    }
}

/// 动画结果的写入目标
///
/// 组合动画在子动画完成时通过它把子动画的终值写入属性缓存。
pub struct ResultSink<'a> {
    screen: &'a ScreenBase,
    cache: &'a mut PropertyCache,
}

impl<'a> ResultSink<'a> {
    pub fn new(screen: &'a ScreenBase, cache: &'a mut PropertyCache) -> Self {
        Self { screen, cache }
    }

    /// 派生属性计算使用的视口
    pub fn screen(&self) -> &ScreenBase {
        self.screen
    }

    /// 保存动画当前声明的所有属性值
    pub fn save(&mut self, animation: &dyn Animation) {
        for &object in animation.objects() {
            for &property in animation.properties(object) {
                if let Some(value) = animation.get_property(object, property, self.screen) {
                    self.cache
                        .insert(PropertyKey::new(object, property), value);
                }
            }
        }
    }
}

/// 转换为 trait object
///
/// 对所有 `Animation` 实现自动提供。
pub trait AsAnimation {
    fn as_animation(&self) -> &dyn Animation;

    fn as_any(&self) -> &dyn Any;
}

impl<T: Animation + 'static> AsAnimation for T {
    fn as_animation(&self) -> &dyn Animation {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// 动画接口
///
/// 具体动画只需实现时间推进与属性查询，
/// 对象 / 属性声明、标志和回调由 [`AnimationBase`] 提供默认实现。
pub trait Animation: AsAnimation {
    fn animation_type(&self) -> AnimationType;

    fn base(&self) -> &AnimationBase;

    fn base_mut(&mut self) -> &mut AnimationBase;

    /// 推进时间
    fn advance(&mut self, elapsed_seconds: f64, sink: &mut ResultSink<'_>);

    /// 强制完成：所有插值器跳到终值，并触发 `on_finish`
    fn finish(&mut self, sink: &mut ResultSink<'_>);

    fn is_finished(&self) -> bool;

    /// 总时长（秒）
    fn duration(&self) -> f64;

    fn set_max_duration(&mut self, max_duration: f64);

    fn set_min_duration(&mut self, min_duration: f64);

    /// 当前属性值
    ///
    /// 属性未被激活时返回 `None`。
    fn get_property(
        &self,
        object: AnimObject,
        property: AnimProperty,
        screen: &ScreenBase,
    ) -> Option<PropertyValue>;

    /// 动画结束时的属性值
    fn get_target_property(
        &self,
        object: AnimObject,
        property: AnimProperty,
        screen: &ScreenBase,
    ) -> Option<PropertyValue>;

    fn objects(&self) -> &AnimObjects {
        self.base().objects()
    }

    fn has_object(&self, object: AnimObject) -> bool {
        self.objects().contains(&object)
    }

    fn properties(&self, object: AnimObject) -> &ObjectProperties {
        self.base().properties(object)
    }

    fn has_property(&self, object: AnimObject, property: AnimProperty) -> bool {
        self.properties(object).contains(&property)
    }

    fn on_start(&mut self) {
        run_action(self, ActionKind::Start);
    }

    fn on_finish(&mut self) {
        run_action(self, ActionKind::Finish);
    }

    /// 被合并进来的新动画挤掉
    fn interrupt(&mut self) {
        run_action(self, ActionKind::Interrupt);
    }

    fn could_be_interrupted(&self) -> bool {
        self.base().could_be_interrupted
    }

    fn could_be_blended(&self) -> bool {
        self.base().could_be_blended
    }

    fn interrupted_on_combine(&self) -> bool {
        self.base().interrupted_on_combine
    }

    /// 类型不同且双方都允许混合时才能共存
    fn could_be_blended_with(&self, other: &dyn Animation) -> bool {
        self.animation_type() != other.animation_type()
            && self.could_be_blended()
            && other.could_be_blended()
    }

    fn custom_type(&self) -> &str {
        &self.base().custom_type
    }

    fn set_custom_type(&mut self, custom_type: String) {
        self.base_mut().custom_type = custom_type;
    }

    fn set_could_be_interrupted(&mut self, enable: bool) {
        self.base_mut().could_be_interrupted = enable;
    }

    fn set_could_be_blended(&mut self, enable: bool) {
        self.base_mut().could_be_blended = enable;
    }

    fn set_interrupted_on_combine(&mut self, enable: bool) {
        self.base_mut().interrupted_on_combine = enable;
    }

    fn set_on_start_action(&mut self, action: Action) {
        self.base_mut().on_start = Some(action);
    }

    fn set_on_finish_action(&mut self, action: Action) {
        self.base_mut().on_finish = Some(action);
    }

    fn set_on_interrupt_action(&mut self, action: Action) {
        self.base_mut().on_interrupt = Some(action);
    }
}
