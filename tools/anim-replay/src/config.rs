//! # Config 模块
//!
//! 回放配置。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (replay.json)
//! 3. 默认值（最低）

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use viewport_anim::{PointD, RectD, ScreenBase};

use crate::error::ConfigError;

/// 回放配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// 视口像素尺寸
    #[serde(default)]
    pub viewport: ViewportConfig,

    /// 帧率（帧/秒）
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,

    /// 单个场景最多推进的帧数
    #[serde(default = "default_max_frames")]
    pub max_frames: u32,

    /// 初始相机
    #[serde(default)]
    pub initial_screen: InitialScreenConfig,
}

/// 视口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_viewport_width")]
    pub width: f64,

    #[serde(default = "default_viewport_height")]
    pub height: f64,
}

/// 初始相机配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialScreenConfig {
    /// 视口中心（全局坐标）
    #[serde(default)]
    pub center: PointD,

    /// 每像素全局单位
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// 旋转角度（弧度）
    #[serde(default)]
    pub angle: f64,
}

// 默认值函数
fn default_frame_rate() -> f64 {
    60.0
}

fn default_max_frames() -> u32 {
    10_000
}

fn default_viewport_width() -> f64 {
    1920.0
}

fn default_viewport_height() -> f64 {
    1080.0
}

fn default_scale() -> f64 {
    1.0
}

fn is_positive(value: f64) -> bool {
    value > 0.0 && value.is_finite()
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            frame_rate: default_frame_rate(),
            max_frames: default_max_frames(),
            initial_screen: InitialScreenConfig::default(),
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_viewport_width(),
            height: default_viewport_height(),
        }
    }
}

impl Default for InitialScreenConfig {
    fn default() -> Self {
        Self {
            center: PointD::zero(),
            scale: default_scale(),
            angle: 0.0,
        }
    }
}

impl ReplayConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(?path, "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    info!(?path, "配置文件加载成功");
                    config
                }
                Err(e) => {
                    warn!(error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// 每帧时长（秒）
    pub fn frame_duration(&self) -> f64 {
        1.0 / self.frame_rate
    }

    /// 初始视口
    pub fn initial_screen(&self) -> ScreenBase {
        ScreenBase::new(
            RectD::with_size(self.viewport.width, self.viewport.height),
            self.initial_screen.center,
            self.initial_screen.scale,
            self.initial_screen.angle,
        )
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_positive(self.viewport.width) || !is_positive(self.viewport.height) {
            return Err(ConfigError::ValidationFailed(format!(
                "视口尺寸必须为正: {}x{}",
                self.viewport.width, self.viewport.height
            )));
        }

        if !is_positive(self.frame_rate) {
            return Err(ConfigError::ValidationFailed(format!(
                "帧率必须为正: {}",
                self.frame_rate
            )));
        }

        if self.max_frames == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_frames 不能为 0".to_string(),
            ));
        }

        if !is_positive(self.initial_screen.scale) {
            return Err(ConfigError::ValidationFailed(format!(
                "初始缩放必须为正: {}",
                self.initial_screen.scale
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReplayConfig::default();
        assert_eq!(config.viewport.width, 1920.0);
        assert_eq!(config.viewport.height, 1080.0);
        assert_eq!(config.frame_rate, 60.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ReplayConfig =
            serde_json::from_str(r#"{ "frame_rate": 30.0, "viewport": { "width": 800.0 } }"#)
                .unwrap();
        assert_eq!(config.frame_rate, 30.0);
        assert_eq!(config.viewport.width, 800.0);
        assert_eq!(config.viewport.height, 1080.0);
        assert_eq!(config.max_frames, 10_000);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ReplayConfig::default();

        config.frame_rate = 0.0;
        assert!(config.validate().is_err());

        config.frame_rate = 60.0;
        config.viewport.height = -1.0;
        assert!(config.validate().is_err());

        config.viewport.height = 1080.0;
        config.initial_screen.scale = 0.0;
        assert!(config.validate().is_err());

        config.initial_screen.scale = 2.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_and_save_roundtrip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replay.json");

        let mut config = ReplayConfig::default();
        config.max_frames = 120;
        config.initial_screen.center = PointD::new(5.0, -5.0);
        config.save(&path).unwrap();

        let loaded = ReplayConfig::load(&path);
        assert_eq!(loaded.max_frames, 120);
        assert_eq!(loaded.initial_screen.center, PointD::new(5.0, -5.0));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ReplayConfig::load(dir.path().join("absent.json"));
        assert_eq!(loaded.frame_rate, 60.0);
    }
}
