//! # Anim Replay
//!
//! 视口动画的无界面回放工具。
//!
//! 读取 JSON 场景（一串相机意图与时间推进），驱动
//! [`viewport_anim::AnimationSystem`]，输出每帧的相机状态。
//! `xtask scenario-check` 复用本 crate 对仓库中的场景做试运行。

pub mod config;
pub mod error;
pub mod replay;
pub mod scenario;

pub use config::ReplayConfig;
pub use error::{ConfigError, ScenarioError};
pub use replay::{FrameReport, ReplayOutcome, Replayer};
pub use scenario::{Intent, Scenario, Step};
