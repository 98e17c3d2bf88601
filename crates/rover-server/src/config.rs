//! 服务配置
//!
//! 四个历史变体之间的所有差异（速度、请求间延迟、CSV 列集、
//! 蜂鸣旋律）都收敛成配置项，默认值取第一个变体的字面量。
//! 配置文件为 TOML，缺失的字段回退到默认值。

use crate::error::ServerError;
use crate::export::CsvColumn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 蜂鸣旋律中的一个音符
///
/// `gap_ms` 是音符写入后的停顿，不包含在 `duration_ms` 内。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub freq_hz: u32,
    pub duration_ms: u32,
    pub gap_ms: u32,
}

impl Note {
    pub const fn new(freq_hz: u32, duration_ms: u32, gap_ms: u32) -> Self {
        Self {
            freq_hz,
            duration_ms,
            gap_ms,
        }
    }
}

/// 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址（原始实现固定绑定所有接口的 8081 端口）
    pub bind_addr: String,

    /// 直行/倒车速度（度/秒）
    pub drive_speed: i32,

    /// 原地转向速度（度/秒），与直行速度独立
    pub turn_speed: i32,

    /// 升降杆速度（度/秒）
    pub lift_speed: i32,

    /// 每个请求处理完之后的固定延迟（毫秒）
    ///
    /// 用于把请求节奏压到物理执行节奏，不是正确性机制。
    pub request_delay_ms: u64,

    /// CSV 导出文件路径（惰性创建，只追加）
    pub csv_path: PathBuf,

    /// CSV 列集与顺序
    pub csv_columns: Vec<CsvColumn>,

    /// `/beep` 路由播放的旋律（有序音符表）
    pub melody: Vec<Note>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8081".to_string(),
            drive_speed: 500,
            turn_speed: 100,
            lift_speed: 500,
            request_delay_ms: 1000,
            csv_path: PathBuf::from("sensor_data.csv"),
            csv_columns: vec![
                CsvColumn::LeftDeg,
                CsvColumn::RightDeg,
                CsvColumn::UltrasonicMm,
                CsvColumn::ColorName,
                CsvColumn::ColorReflection,
                CsvColumn::GyroDeg,
            ],
            melody: default_melody(),
        }
    }
}

/// 默认旋律（原始实现里的 16 音符主题，按数据表保留）
fn default_melody() -> Vec<Note> {
    vec![
        Note::new(440, 250, 60),
        Note::new(440, 250, 60),
        Note::new(440, 350, 100),
        Note::new(587, 300, 100),
        Note::new(523, 250, 80),
        Note::new(440, 250, 80),
        Note::new(392, 350, 120),
        Note::new(330, 300, 120),
        Note::new(440, 250, 80),
        Note::new(440, 250, 80),
        Note::new(440, 350, 100),
        Note::new(587, 300, 100),
        Note::new(523, 250, 80),
        Note::new(440, 250, 80),
        Note::new(659, 350, 150),
        Note::new(587, 400, 120),
    ]
}

impl ServerConfig {
    /// 从 TOML 文件加载配置
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// 请求间延迟
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}
