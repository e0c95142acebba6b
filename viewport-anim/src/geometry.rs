//! # Geometry 模块
//!
//! 引擎消费的几何值类型：点、矩形、带旋转的矩形，以及视口（`ScreenBase`）。
//!
//! 坐标约定：
//! - 全局坐标（G）：地图平面坐标，y 轴向上
//! - 像素坐标（P）：屏幕坐标，y 轴向下，原点在像素矩形左上角
//! - `scale`：每像素对应的全局单位长度（数值越大，看到的范围越大）

use std::f64::consts::{PI, TAU};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// 二维点（双精度）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointD {
    pub x: f64,
    pub y: f64,
}

impl PointD {
    /// 创建新的点
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 原点
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// 向量长度
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// 到另一个点的距离
    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// 绕原点逆时针旋转 `angle` 弧度
    pub fn rotate(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    /// 线性插值
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// 在 `eps` 误差内是否相等
    pub fn almost_eq(self, other: Self, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }
}

impl Add for PointD {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for PointD {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for PointD {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for PointD {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for PointD {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for PointD {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// 轴对齐矩形
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RectD {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl RectD {
    /// 由边界创建矩形
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// 由宽高创建左上角在原点的矩形（像素矩形）
    pub const fn with_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn size_x(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn size_y(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// 较短边长度
    pub fn min_size(&self) -> f64 {
        self.size_x().min(self.size_y())
    }

    pub fn center(&self) -> PointD {
        PointD::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    /// 平移
    pub fn offset(&mut self, delta: PointD) {
        self.min_x += delta.x;
        self.max_x += delta.x;
        self.min_y += delta.y;
        self.max_y += delta.y;
    }

    /// 以中心为基准缩放
    pub fn scale(&mut self, factor: f64) {
        let center = self.center();
        let half_x = self.size_x() * 0.5 * factor;
        let half_y = self.size_y() * 0.5 * factor;
        self.min_x = center.x - half_x;
        self.max_x = center.x + half_x;
        self.min_y = center.y - half_y;
        self.max_y = center.y + half_y;
    }
}

/// 带旋转的矩形
///
/// `zero` 为局部坐标系原点在全局坐标中的位置，`rect` 为局部坐标系中的矩形。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnyRectD {
    zero: PointD,
    angle: f64,
    rect: RectD,
}

impl AnyRectD {
    pub fn new(zero: PointD, angle: f64, rect: RectD) -> Self {
        Self { zero, angle, rect }
    }

    pub fn global_zero(&self) -> PointD {
        self.zero
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn local_rect(&self) -> RectD {
        self.rect
    }

    /// 矩形中心的全局坐标
    pub fn global_center(&self) -> PointD {
        self.zero + self.rect.center().rotate(self.angle)
    }
}

/// 将角度归一化到 `[0, 2π)`
pub fn normalize_angle(angle: f64) -> f64 {
    let normalized = angle.rem_euclid(TAU);
    // rem_euclid 在极小负数时可能返回 TAU 本身
    if normalized >= TAU { 0.0 } else { normalized }
}

/// 从 `from` 旋转到 `to` 的最短有符号角距离，范围 `[-π, π]`
pub fn shortest_distance(from: f64, to: f64) -> f64 {
    let mut distance = normalize_angle(to) - normalize_angle(from);
    if distance > PI {
        distance -= TAU;
    } else if distance < -PI {
        distance += TAU;
    }
    distance
}

/// 视口
///
/// 由渲染侧维护的当前相机状态。动画系统只读取它，
/// 并在派生属性（缩放锚点、跟随位置）计算时使用其坐标变换。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenBase {
    /// 像素矩形
    pixel_rect: RectD,
    /// 视口中心的全局坐标
    org: PointD,
    /// 每像素全局单位
    scale: f64,
    /// 旋转角度（弧度）
    angle: f64,
    /// 是否处于 3D 透视模式
    perspective: bool,
    /// 3D 模式下的倾斜角
    rotation_angle_3d: f64,
    /// 3D 模式下的视场角
    angle_fov: f64,
}

impl Default for ScreenBase {
    fn default() -> Self {
        Self::new(RectD::with_size(640.0, 480.0), PointD::zero(), 1.0, 0.0)
    }
}

impl ScreenBase {
    /// 创建视口
    pub fn new(pixel_rect: RectD, org: PointD, scale: f64, angle: f64) -> Self {
        debug_assert!(scale > 0.0, "scale must be positive");
        Self {
            pixel_rect,
            org,
            scale,
            angle,
            perspective: false,
            rotation_angle_3d: 0.0,
            angle_fov: 0.0,
        }
    }

    pub fn pixel_rect(&self) -> RectD {
        self.pixel_rect
    }

    /// 3D 模式下的像素矩形
    ///
    /// 不建模透视投影，与 `pixel_rect` 相同。
    pub fn pixel_rect_in_3d(&self) -> RectD {
        self.pixel_rect
    }

    pub fn org(&self) -> PointD {
        self.org
    }

    pub fn set_org(&mut self, org: PointD) {
        self.org = org;
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        debug_assert!(scale > 0.0, "scale must be positive");
        self.scale = scale;
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn set_angle(&mut self, angle: f64) {
        self.angle = angle;
    }

    pub fn is_perspective(&self) -> bool {
        self.perspective
    }

    pub fn rotation_angle_3d(&self) -> f64 {
        self.rotation_angle_3d
    }

    pub fn angle_fov(&self) -> f64 {
        self.angle_fov
    }

    /// 全局坐标 → 像素坐标
    pub fn gtop(&self, global: PointD) -> PointD {
        let local = (global - self.org).rotate(-self.angle);
        let center = self.pixel_rect.center();
        PointD::new(
            center.x + local.x / self.scale,
            center.y - local.y / self.scale,
        )
    }

    /// 像素坐标 → 全局坐标
    pub fn ptog(&self, pixel: PointD) -> PointD {
        let center = self.pixel_rect.center();
        let local = PointD::new(
            (pixel.x - center.x) * self.scale,
            -(pixel.y - center.y) * self.scale,
        );
        self.org + local.rotate(self.angle)
    }

    /// 当前可见范围（全局坐标）
    pub fn global_rect(&self) -> AnyRectD {
        let mut local = self.pixel_rect;
        local.offset(-local.center());
        local.scale(self.scale);
        AnyRectD::new(self.org, self.angle, local)
    }

    /// 用动画系统计算出的矩形更新视口
    pub fn set_from_rect(&mut self, rect: &AnyRectD) {
        let pixel_width = self.pixel_rect.size_x();
        if pixel_width > 0.0 {
            self.scale = rect.local_rect().size_x() / pixel_width;
        }
        self.angle = rect.angle();
        self.org = rect.global_center();
    }

    /// 开启 3D 透视模式
    pub fn enable_3d(&mut self, rotation_angle: f64, angle_fov: f64) {
        self.perspective = true;
        self.rotation_angle_3d = rotation_angle;
        self.angle_fov = angle_fov;
    }

    /// 关闭 3D 透视模式
    pub fn disable_3d(&mut self) {
        self.perspective = false;
        self.rotation_angle_3d = 0.0;
    }

    /// 3D 模式下更新倾斜角
    pub fn set_rotation_angle_3d(&mut self, rotation_angle: f64) {
        self.rotation_angle_3d = rotation_angle;
    }
}
