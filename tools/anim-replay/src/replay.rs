//! # Replay 模块
//!
//! 按场景驱动 [`AnimationSystem`]，逐帧把动画结果应用到视口。
//!
//! 每帧的处理顺序与渲染侧一致：
//!
//! 1. `advance(dt)`
//! 2. `get_rect` 写回视口
//! 3. 读取透视开关事件，进入 / 退出 3D
//! 4. 3D 模式下更新倾斜角

use serde::Serialize;
use tracing::{debug, info, warn};
use viewport_anim::{AnimationSystem, PointD, ScreenBase, SwitchPerspectiveParams};

use crate::config::ReplayConfig;
use crate::scenario::{Scenario, Step};

/// 剩余时长小于该值时不再补帧
const TIME_EPSILON: f64 = 1e-9;

/// 单帧的相机状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame: u32,
    /// 场景开始以来的时间（秒）
    pub time: f64,
    pub center: PointD,
    pub scale: f64,
    pub angle: f64,
    /// 3D 模式下的倾斜角
    pub perspective: Option<f64>,
    /// 本帧发生的透视开关事件
    pub switch: Option<SwitchPerspectiveParams>,
}

/// 回放结果
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub frames: Vec<FrameReport>,
    pub final_screen: ScreenBase,
    /// 是否因帧数上限提前停止
    pub truncated: bool,
}

/// 场景回放器
#[derive(Debug)]
pub struct Replayer {
    config: ReplayConfig,
    system: AnimationSystem,
    screen: ScreenBase,
    frames: Vec<FrameReport>,
    time: f64,
    truncated: bool,
}

impl Replayer {
    pub fn new(config: ReplayConfig) -> Self {
        let screen = config.initial_screen();
        let mut system = AnimationSystem::new();
        system.update_last_screen(&screen);
        Self {
            config,
            system,
            screen,
            frames: Vec::new(),
            time: 0.0,
            truncated: false,
        }
    }

    /// 回放整个场景
    pub fn run(mut self, scenario: &Scenario) -> ReplayOutcome {
        info!(steps = scenario.steps.len(), "replay started");
        for step in &scenario.steps {
            if self.truncated {
                break;
            }
            self.apply(step);
        }
        info!(
            frames = self.frames.len(),
            truncated = self.truncated,
            "replay finished"
        );

        ReplayOutcome {
            frames: self.frames,
            final_screen: self.screen,
            truncated: self.truncated,
        }
    }

    /// 执行单个步骤
    pub fn apply(&mut self, step: &Step) {
        match step {
            Step::Combine(intent) => {
                debug!(?intent, "combine");
                let animation = intent.build(&self.screen);
                self.system.combine_animation(animation);
            }
            Step::Push(intent) => {
                debug!(?intent, "push");
                let animation = intent.build(&self.screen);
                self.system.push_animation(animation);
            }
            Step::Advance { seconds } => self.advance(*seconds),
            Step::Finish {
                animation_type,
                custom_type,
                rewind,
                finish_all,
            } => {
                debug!(?animation_type, rewind, finish_all, "finish");
                self.system.finish_animations_of_type(
                    *animation_type,
                    custom_type.as_deref(),
                    *rewind,
                    *finish_all,
                );
                // 结束后的终值留在缓存中，立即写回视口并记为一帧（时间不前进）
                let switch = self.apply_animations();
                self.record(switch);
            }
        }
    }

    /// 按帧率推进 `seconds` 秒，最后一帧取余量
    pub fn advance(&mut self, seconds: f64) {
        let frame_duration = self.config.frame_duration();
        let mut remaining = seconds;
        while remaining > TIME_EPSILON {
            if self.frames.len() >= self.config.max_frames as usize {
                warn!(max_frames = self.config.max_frames, "frame limit reached");
                self.truncated = true;
                return;
            }
            let dt = remaining.min(frame_duration);
            self.tick(dt);
            remaining -= dt;
        }
    }

    fn tick(&mut self, dt: f64) {
        self.time += dt;
        self.system.advance(dt);
        let switch = self.apply_animations();
        self.record(switch);
    }

    fn record(&mut self, switch: Option<SwitchPerspectiveParams>) {
        let report = FrameReport {
            frame: self.frames.len() as u32 + 1,
            time: self.time,
            center: self.screen.org(),
            scale: self.screen.scale(),
            angle: self.screen.angle(),
            perspective: self
                .screen
                .is_perspective()
                .then(|| self.screen.rotation_angle_3d()),
            switch,
        };
        self.frames.push(report);
    }

    /// 把动画系统的当前结果写回视口，返回本帧的透视开关事件
    fn apply_animations(&mut self) -> Option<SwitchPerspectiveParams> {
        let rect = self.system.get_rect(&self.screen);
        self.screen.set_from_rect(&rect);

        let switch = self.system.switch_perspective();
        if let Some(params) = switch {
            debug!(?params, "switch perspective");
            if params.enable {
                self.screen.enable_3d(params.from_angle, params.fov_angle);
            } else {
                self.screen.disable_3d();
            }
        }

        let angle = self
            .system
            .get_perspective_angle(self.screen.rotation_angle_3d());
        if self.screen.is_perspective() {
            self.screen.set_rotation_angle_3d(angle);
        }

        switch
    }

    pub fn screen(&self) -> &ScreenBase {
        &self.screen
    }

    pub fn system(&self) -> &AnimationSystem {
        &self.system
    }

    pub fn frames(&self) -> &[FrameReport] {
        &self.frames
    }
}
