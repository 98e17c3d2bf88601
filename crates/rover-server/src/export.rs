//! CSV 导出日志
//!
//! 只追加的快照记录：文件在首次导出时惰性创建，表头恰好写一次，
//! 之后每次导出追加一行。本系统从不截断或轮转这个文件。

use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// CSV 列（列集与顺序是配置项，按变体取舍）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsvColumn {
    LeftDeg,
    RightDeg,
    UltrasonicMm,
    ColorName,
    ColorReflection,
    GyroDeg,
}

impl CsvColumn {
    /// 表头名
    pub fn header(&self) -> &'static str {
        match self {
            CsvColumn::LeftDeg => "left_deg",
            CsvColumn::RightDeg => "right_deg",
            CsvColumn::UltrasonicMm => "ultrasonic_mm",
            CsvColumn::ColorName => "color_name",
            CsvColumn::ColorReflection => "color_reflection",
            CsvColumn::GyroDeg => "gyro_deg",
        }
    }

    /// 从快照取值；缺席值渲染为空串（而不是 null）
    pub fn render(&self, snapshot: &Snapshot) -> String {
        fn opt(value: Option<i32>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }

        match self {
            CsvColumn::LeftDeg => opt(snapshot.left_motor_deg),
            CsvColumn::RightDeg => opt(snapshot.right_motor_deg),
            CsvColumn::UltrasonicMm => opt(snapshot.ultrasonic_mm),
            CsvColumn::ColorName => snapshot
                .color
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            CsvColumn::ColorReflection => {
                opt(snapshot.color.as_ref().map(|c| c.reflection))
            }
            CsvColumn::GyroDeg => opt(snapshot.gyro_deg),
        }
    }
}

/// 只追加的 CSV 导出日志
pub struct ExportLog {
    path: PathBuf,
    columns: Vec<CsvColumn>,
}

impl ExportLog {
    pub fn new(path: PathBuf, columns: Vec<CsvColumn>) -> Self {
        Self { path, columns }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加一行快照；文件不存在时先写表头
    pub fn append(&self, snapshot: &Snapshot) -> io::Result<()> {
        let is_new = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if is_new {
            let header: Vec<&str> = self.columns.iter().map(CsvColumn::header).collect();
            writeln!(file, "{}", header.join(","))?;
        }

        let row: Vec<String> = self
            .columns
            .iter()
            .map(|column| column.render(snapshot))
            .collect();
        writeln!(file, "{}", row.join(","))?;
        Ok(())
    }

    /// 读取整个日志内容（用于流回客户端）
    pub fn read_all(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}
