//! # Scenario 模块
//!
//! JSON 场景描述：一串相机意图与时间推进。
//!
//! ```json
//! {
//!   "steps": [
//!     { "combine": { "kind": "scale", "pixel_center": { "x": 960.0, "y": 540.0 }, "factor": 2.0 } },
//!     { "advance": { "seconds": 0.5 } },
//!     { "finish": { "type": "map_scale", "rewind": true } }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use viewport_anim::screen_animations::{
    MAX_ANIMATION_TIME_SEC, follow_move_duration, get_follow_animation,
    get_pretty_follow_animation, get_pretty_move_animation, get_scale_animation,
    get_set_rect_animation,
};
use viewport_anim::{Animation, AnimationType, PerspectiveSwitchAnimation, PointD, ScreenBase};

use crate::error::ScenarioError;

/// 场景
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

/// 场景中的一步
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// 尽量并入当前链
    Combine(Intent),
    /// 追加为新链
    Push(Intent),
    /// 推进时间
    Advance { seconds: f64 },
    /// 提前结束某类动画
    Finish {
        #[serde(rename = "type")]
        animation_type: AnimationType,
        #[serde(default)]
        custom_type: Option<String>,
        #[serde(default)]
        rewind: bool,
        #[serde(default)]
        finish_all: bool,
    },
}

/// 相机意图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    /// 切换到指定中心、比例与角度
    SetRect {
        center: PointD,
        scale: f64,
        #[serde(default)]
        angle: f64,
    },
    /// 以像素点为焦点缩放，`factor > 1` 为放大
    Scale { pixel_center: PointD, factor: f64 },
    /// 跟随用户位置，距离太远时改为先缩小再跟随
    Follow {
        user_position: PointD,
        scale: f64,
        #[serde(default)]
        angle: f64,
        pixel_position: PointD,
        /// 锁定：不可打断，也不与其他动画混合
        #[serde(default)]
        locked: bool,
    },
    /// 透视倾斜，终止角大于零即进入 3D
    Perspective { from: f64, to: f64, fov: f64 },
    /// 远距离移动
    PrettyMove { center: PointD, scale: f64 },
}

impl Scenario {
    /// 从 JSON 文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ScenarioError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 检查步骤参数
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.steps.is_empty() {
            return Err(ScenarioError::Empty);
        }

        for (index, step) in self.steps.iter().enumerate() {
            let invalid = |message: String| ScenarioError::InvalidStep {
                step: index + 1,
                message,
            };
            match step {
                Step::Combine(intent) | Step::Push(intent) => {
                    intent.validate().map_err(invalid)?;
                }
                Step::Advance { seconds } => {
                    if !is_positive(*seconds) {
                        return Err(invalid(format!("推进时长必须为正: {seconds}")));
                    }
                }
                Step::Finish { .. } => {}
            }
        }

        Ok(())
    }

    /// 场景中推进的总时长（秒）
    pub fn total_seconds(&self) -> f64 {
        self.steps
            .iter()
            .map(|step| match step {
                Step::Advance { seconds } => *seconds,
                _ => 0.0,
            })
            .sum()
    }
}

impl Intent {
    fn validate(&self) -> Result<(), String> {
        match self {
            Intent::SetRect { scale, .. }
            | Intent::Follow { scale, .. }
            | Intent::PrettyMove { scale, .. } => {
                if !is_positive(*scale) {
                    return Err(format!("比例必须为正: {scale}"));
                }
            }
            Intent::Scale { factor, .. } => {
                if !is_positive(*factor) {
                    return Err(format!("缩放倍数必须为正: {factor}"));
                }
            }
            Intent::Perspective { from, to, fov } => {
                if *from < 0.0 || *to < 0.0 {
                    return Err(format!("倾斜角不能为负: {from} -> {to}"));
                }
                if !is_positive(*fov) {
                    return Err(format!("视场角必须为正: {fov}"));
                }
            }
        }
        Ok(())
    }

    /// 以当前视口为起点构造动画
    pub fn build(&self, screen: &ScreenBase) -> Box<dyn Animation> {
        match self {
            Intent::SetRect {
                center,
                scale,
                angle,
            } => {
                let end = target_screen(screen, *center, *scale, *angle);
                Box::new(get_set_rect_animation(screen, &end))
            }
            Intent::Scale {
                pixel_center,
                factor,
            } => Box::new(get_scale_animation(
                screen,
                *pixel_center,
                screen.ptog(*pixel_center),
                *factor,
            )),
            Intent::Follow {
                user_position,
                scale,
                angle,
                pixel_position,
                locked,
            } => {
                let duration =
                    follow_move_duration(screen, *user_position, *scale, *angle, *pixel_position);
                let mut animation: Box<dyn Animation> = if duration > MAX_ANIMATION_TIME_SEC {
                    Box::new(get_pretty_follow_animation(
                        screen,
                        *user_position,
                        *scale,
                        *angle,
                        *pixel_position,
                    ))
                } else {
                    Box::new(get_follow_animation(
                        screen,
                        *user_position,
                        *scale,
                        *angle,
                        *pixel_position,
                    ))
                };
                if *locked {
                    animation.set_could_be_interrupted(false);
                    animation.set_could_be_blended(false);
                }
                animation
            }
            Intent::Perspective { from, to, fov } => {
                Box::new(PerspectiveSwitchAnimation::new(*from, *to, *fov))
            }
            Intent::PrettyMove { center, scale } => {
                let end = target_screen(screen, *center, *scale, screen.angle());
                Box::new(get_pretty_move_animation(screen, &end))
            }
        }
    }
}

fn target_screen(screen: &ScreenBase, center: PointD, scale: f64, angle: f64) -> ScreenBase {
    let mut end = screen.clone();
    end.set_org(center);
    end.set_scale(scale);
    end.set_angle(angle);
    end
}

fn is_positive(value: f64) -> bool {
    value > 0.0 && value.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewport_anim::RectD;

    fn screen() -> ScreenBase {
        ScreenBase::new(RectD::with_size(1000.0, 500.0), PointD::zero(), 1.0, 0.0)
    }

    #[test]
    fn test_parse_all_step_kinds() {
        let json = r#"{
            "steps": [
                { "combine": { "kind": "set_rect", "center": { "x": 10.0, "y": 0.0 }, "scale": 2.0 } },
                { "push": { "kind": "perspective", "from": 0.0, "to": 0.5, "fov": 1.0 } },
                { "advance": { "seconds": 0.25 } },
                { "finish": { "type": "map_perspective", "rewind": true } }
            ]
        }"#;
        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.steps.len(), 4);
        assert_eq!(
            scenario.steps[0],
            Step::Combine(Intent::SetRect {
                center: PointD::new(10.0, 0.0),
                scale: 2.0,
                angle: 0.0,
            })
        );
        assert_eq!(
            scenario.steps[3],
            Step::Finish {
                animation_type: AnimationType::MapPerspective,
                custom_type: None,
                rewind: true,
                finish_all: false,
            }
        );
        assert!(scenario.validate().is_ok());
        assert!((scenario.total_seconds() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_intent_rejected() {
        let json = r#"{ "steps": [ { "combine": { "kind": "teleport" } } ] }"#;
        assert!(serde_json::from_str::<Scenario>(json).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_steps() {
        let empty = Scenario { steps: Vec::new() };
        assert!(matches!(empty.validate(), Err(ScenarioError::Empty)));

        let bad_advance = Scenario {
            steps: vec![
                Step::Advance { seconds: 0.1 },
                Step::Advance { seconds: 0.0 },
            ],
        };
        assert!(matches!(
            bad_advance.validate(),
            Err(ScenarioError::InvalidStep { step: 2, .. })
        ));

        let bad_factor = Scenario {
            steps: vec![Step::Combine(Intent::Scale {
                pixel_center: PointD::zero(),
                factor: -2.0,
            })],
        };
        assert!(matches!(
            bad_factor.validate(),
            Err(ScenarioError::InvalidStep { step: 1, .. })
        ));
    }

    #[test]
    fn test_build_maps_intent_to_animation_type() {
        let screen = screen();
        let cases = [
            (
                Intent::SetRect {
                    center: PointD::new(5.0, 5.0),
                    scale: 1.0,
                    angle: 0.0,
                },
                AnimationType::MapLinear,
            ),
            (
                Intent::Scale {
                    pixel_center: PointD::new(500.0, 250.0),
                    factor: 2.0,
                },
                AnimationType::MapScale,
            ),
            (
                Intent::Follow {
                    user_position: PointD::new(3.0, 4.0),
                    scale: 0.5,
                    angle: 0.0,
                    pixel_position: PointD::new(500.0, 400.0),
                    locked: false,
                },
                AnimationType::MapFollow,
            ),
            (
                Intent::Follow {
                    user_position: PointD::new(90_000.0, 0.0),
                    scale: 1.0,
                    angle: 0.0,
                    pixel_position: PointD::new(500.0, 400.0),
                    locked: false,
                },
                AnimationType::Sequence,
            ),
            (
                Intent::Perspective {
                    from: 0.0,
                    to: 0.5,
                    fov: 1.0,
                },
                AnimationType::MapPerspective,
            ),
            (
                Intent::PrettyMove {
                    center: PointD::new(50_000.0, 0.0),
                    scale: 1.0,
                },
                AnimationType::Sequence,
            ),
        ];

        for (intent, expected) in cases {
            assert_eq!(intent.build(&screen).animation_type(), expected, "{intent:?}");
        }
    }

    #[test]
    fn test_locked_follow_is_exclusive() {
        let json = r#"{ "kind": "follow", "user_position": { "x": 3.0, "y": 4.0 },
            "scale": 0.5, "pixel_position": { "x": 500.0, "y": 400.0 }, "locked": true }"#;
        let intent: Intent = serde_json::from_str(json).unwrap();
        let animation = intent.build(&screen());
        assert!(!animation.could_be_interrupted());
        assert!(!animation.could_be_blended());

        let far = Intent::Follow {
            user_position: PointD::new(90_000.0, 0.0),
            scale: 1.0,
            angle: 0.0,
            pixel_position: PointD::new(500.0, 400.0),
            locked: false,
        };
        let animation = far.build(&screen());
        assert_eq!(
            animation.custom_type(),
            viewport_anim::screen_animations::PRETTY_FOLLOW_ANIM
        );
    }

    #[test]
    fn test_load_reports_path_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Scenario::load(&path).unwrap_err();
        assert!(matches!(err, ScenarioError::Parse { .. }));
        assert!(err.to_string().contains("broken.json"));

        let missing = Scenario::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, ScenarioError::Io { .. }));
    }
}
