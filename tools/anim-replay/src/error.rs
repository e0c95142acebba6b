//! # Error 模块
//!
//! 回放工具的错误类型。

use std::path::PathBuf;

use thiserror::Error;

/// 场景加载 / 校验错误
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// 读取失败
    #[error("无法读取场景文件 {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON 解析失败
    #[error("场景文件 {path:?} 解析失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// 步骤参数无效
    #[error("第 {step} 步无效: {message}")]
    InvalidStep { step: usize, message: String },

    /// 场景没有任何步骤
    #[error("场景为空")]
    Empty,
}

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}
