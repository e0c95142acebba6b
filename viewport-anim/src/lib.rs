//! # Viewport Anim
//!
//! 视口（地图相机）动画的调度与混合引擎。
//!
//! ## 架构概述
//!
//! `viewport-anim` 是纯逻辑核心，不依赖渲染或输入层。
//! 调用方把意图（平移、缩放、跟随、透视切换）转换为动画并提交，
//! 每帧推进一次，再查询当前相机状态：
//!
//! ```text
//! 手势 / 业务层                AnimationSystem                 渲染层
//!   │                               │                            │
//!   │── combine / push ───────────►│                            │
//!   │                               │ advance(dt)                │
//!   │                               │◄── get_rect / switch ──────│
//!   │                               │─── AnyRectD / 事件 ───────►│
//! ```
//!
//! ## 核心类型
//!
//! - [`Interpolator`]：时间进度 `[0, 1]`
//! - [`Animation`]：动画接口，具体类型见 [`animation`] 模块
//! - [`PropertyBlender`]：同一属性多个并发贡献的合并
//! - [`AnimationSystem`]：链调度、结果缓存与查询
//!
//! ## 使用示例
//!
//! ```ignore
//! use viewport_anim::{AnimationSystem, screen_animations};
//!
//! let mut system = AnimationSystem::new();
//! let anim = screen_animations::get_set_rect_animation(&screen, &target);
//! system.combine_animation(Box::new(anim));
//!
//! loop {
//!     system.advance(frame_dt);
//!     let rect = system.get_rect(&screen);
//!     screen.set_from_rect(&rect);
//!     if let Some(event) = system.switch_perspective() {
//!         // 进入 / 退出 3D
//!     }
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`geometry`]：点、矩形、视口
//! - [`interpolator`]：时间与类型化插值器
//! - [`property`]：对象、属性、属性值与混合器
//! - [`animation`]：动画接口与具体类型
//! - [`system`]：调度器
//! - [`screen_animations`]：意图到动画的工厂函数

pub mod animation;
pub mod geometry;
pub mod interpolator;
pub mod property;
pub mod screen_animations;
pub mod system;

pub use animation::{
    Action, Animation, AnimationBase, AnimationType, MapFollowAnimation, MapLinearAnimation,
    MapScaleAnimation, ParallelAnimation, PerspectiveSwitchAnimation, ResultSink,
    SequenceAnimation,
};
pub use geometry::{AnyRectD, PointD, RectD, ScreenBase};
pub use interpolator::{
    AngleInterpolator, Interpolation, Interpolator, PositionInterpolator, ScaleInterpolator,
};
pub use property::{
    AnimObject, AnimProperty, PropertyBlender, PropertyValue, SwitchPerspectiveParams,
};
pub use system::AnimationSystem;
