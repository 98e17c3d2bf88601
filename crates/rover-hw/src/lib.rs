//! # Rover 硬件抽象层
//!
//! 提供电机、传感器、指示灯与扬声器的统一 trait 抽象。
//! 每个设备在进程启动时独立探测，探测失败的设备在上层表现为缺席
//! （`None`），而不是运行期错误。

use thiserror::Error;

#[cfg(target_os = "linux")]
pub mod ev3dev;

#[cfg(target_os = "linux")]
pub use ev3dev::{
    Ev3ColorSensor, Ev3GyroSensor, Ev3Speaker, Ev3StatusLight, Ev3TachoMotor, Ev3UltrasonicSensor,
};

#[cfg(any(test, feature = "mock"))]
pub mod mock;

/// 硬件层统一错误类型
#[derive(Error, Debug)]
pub enum HwError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device not found: class={class}, address={address}")]
    NotFound { class: String, address: String },
    #[error("Invalid attribute value: {attribute}={value:?}")]
    Parse { attribute: String, value: String },
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

/// 指示灯颜色
///
/// 原始硬件只支持红/绿双色 LED，橙色由两者叠加得到。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedColor {
    Green,
    Red,
    Orange,
}

/// 带编码器的电机
///
/// `run` 以恒定转速持续运转，直到 `brake` 或下一次 `run`。
/// 转速单位为度/秒，符号决定方向。
pub trait Motor {
    fn run(&mut self, speed_deg_s: i32) -> Result<(), HwError>;
    fn brake(&mut self) -> Result<(), HwError>;
    /// 编码器累计角度（度）
    fn angle(&mut self) -> Result<i32, HwError>;
}

/// 超声测距传感器
pub trait RangeSensor {
    /// 当前距离（毫米）
    fn distance_mm(&mut self) -> Result<i32, HwError>;
}

/// 颜色传感器
pub trait ColorSensor {
    /// 识别到的颜色名称（如 "red"，未识别时为 "none"）
    fn color_name(&mut self) -> Result<String, HwError>;
    /// 反射光强度（0-100）
    fn reflection(&mut self) -> Result<i32, HwError>;
}

/// 陀螺仪（累计航向角）
pub trait Gyro {
    /// 累计角度（度），顺时针为正，可越过 ±360
    fn angle(&mut self) -> Result<i32, HwError>;
    /// 将累计角度清零
    ///
    /// 清零发生在传感器内部，之后的 `angle()` 以新零点为基准。
    fn reset(&mut self) -> Result<(), HwError>;
}

/// 状态指示灯
pub trait StatusLight {
    fn set_color(&mut self, color: LedColor) -> Result<(), HwError>;
    fn off(&mut self) -> Result<(), HwError>;
}

/// 扬声器
pub trait Speaker {
    /// 播放一个指定频率与时长的音符（阻塞到写入完成，不等待播放结束）
    fn tone(&mut self, freq_hz: u32, duration_ms: u32) -> Result<(), HwError>;
}
