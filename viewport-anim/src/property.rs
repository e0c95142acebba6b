//! # Property 模块
//!
//! 动画驱动的对象与属性标识，以及属性值与混合器。
//!
//! ## 核心概念
//!
//! - `AnimObject`: 被驱动的视口平面
//! - `AnimProperty`: 平面上可动画的一个方面（位置、缩放、角度、透视）
//! - `PropertyValue`: 属性值（标量 / 点 / 透视切换参数）
//! - `PropertyBlender`: 同一属性多个并发贡献的合并器

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::geometry::PointD;

/// 被动画驱动的对象
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimObject {
    /// 地图平面（相机）
    MapPlane,
    /// 选中标记
    Selection,
    /// 我的位置标记
    MyPosition,
}

/// 对象上的可动画属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimProperty {
    Position,
    Scale,
    Angle,
    /// 连续的透视倾斜角
    AnglePerspective,
    /// 一次性的透视开关事件
    SwitchPerspective,
}

/// 动画驱动的对象集合
pub type AnimObjects = BTreeSet<AnimObject>;

/// 某个对象上被驱动的属性集合
pub type ObjectProperties = BTreeSet<AnimProperty>;

/// 属性键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyKey {
    pub object: AnimObject,
    pub property: AnimProperty,
}

impl PropertyKey {
    pub fn new(object: AnimObject, property: AnimProperty) -> Self {
        Self { object, property }
    }
}

impl std::fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}:{:?}", self.object, self.property)
    }
}

/// 已完成动画留下的属性终值
///
/// 每个值只能被读取一次，作为下一个动画的起点。
pub type PropertyCache = HashMap<PropertyKey, PropertyValue>;

/// 透视开关事件参数
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SwitchPerspectiveParams {
    /// true 为进入 3D，false 为退出
    pub enable: bool,
    pub from_angle: f64,
    pub to_angle: f64,
    /// 视场角
    pub fov_angle: f64,
}

/// 属性值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Scalar(f64),
    Point(PointD),
    PerspectiveParams(SwitchPerspectiveParams),
}

impl PropertyValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<PointD> {
        match self {
            Self::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_perspective_params(&self) -> Option<SwitchPerspectiveParams> {
        match self {
            Self::PerspectiveParams(params) => Some(*params),
            _ => None,
        }
    }

    fn same_variant(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<PointD> for PropertyValue {
    fn from(value: PointD) -> Self {
        Self::Point(value)
    }
}

impl From<SwitchPerspectiveParams> for PropertyValue {
    fn from(value: SwitchPerspectiveParams) -> Self {
        Self::PerspectiveParams(value)
    }
}

/// 属性混合器
///
/// 标量与点取算术平均；透视切换事件不参与平均，后到者覆盖先到者。
/// 变体不一致时丢弃已累积的值，从新值重新开始。
#[derive(Debug, Clone, Default)]
pub struct PropertyBlender {
    value: Option<PropertyValue>,
    counter: u32,
}

impl PropertyBlender {
    pub fn new() -> Self {
        Self::default()
    }

    /// 累加一个贡献
    pub fn blend(&mut self, value: PropertyValue) {
        let accumulated = match (self.value, value) {
            (_, PropertyValue::PerspectiveParams(_)) => None,
            (Some(current), incoming) if !current.same_variant(&incoming) => None,
            (Some(PropertyValue::Scalar(sum)), PropertyValue::Scalar(v)) => {
                Some(PropertyValue::Scalar(sum + v))
            }
            (Some(PropertyValue::Point(sum)), PropertyValue::Point(p)) => {
                Some(PropertyValue::Point(sum + p))
            }
            _ => None,
        };

        match accumulated {
            Some(sum) => {
                self.value = Some(sum);
                self.counter += 1;
            }
            None => {
                self.value = Some(value);
                self.counter = 1;
            }
        }
    }

    /// 取出混合结果并重置
    pub fn finish(&mut self) -> Option<PropertyValue> {
        let counter = std::mem::take(&mut self.counter);
        let value = self.value.take()?;
        let n = f64::from(counter.max(1));
        Some(match value {
            PropertyValue::Scalar(sum) => PropertyValue::Scalar(sum / n),
            PropertyValue::Point(sum) => PropertyValue::Point(sum * (1.0 / n)),
            params @ PropertyValue::PerspectiveParams(_) => params,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.counter == 0
    }
}
