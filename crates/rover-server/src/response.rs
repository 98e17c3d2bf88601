//! 响应写出
//!
//! 按原始实现的固定顺序做**离散的多次写**：状态行、头、空行、
//! 正文。JSON 响应不带 Content-Length；只有 CSV 附件按实际字节
//! 数补上。一旦开始写出，中途失败不做恢复，错误原样上抛。

use serde::Serialize;
use std::io::{self, Write};

/// 错误响应正文（字段顺序即 JSON 键顺序）
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    message: &'a str,
}

/// 错误响应状态行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStatus {
    /// 404：导出文件读不回来
    NotFound,
    /// 500：导出文件写不进去
    Internal,
}

impl ErrorStatus {
    fn status_line(&self) -> &'static [u8] {
        match self {
            ErrorStatus::NotFound => b"HTTP/1.1 404 Not Found\r\n",
            ErrorStatus::Internal => b"HTTP/1.1 500 Internal Server Error\r\n",
        }
    }
}

/// 200 + JSON 正文
pub fn write_json_ok(out: &mut impl Write, body: &[u8]) -> io::Result<()> {
    out.write_all(b"HTTP/1.1 200 OK\r\n")?;
    out.write_all(b"Content-Type: application/json\r\n\r\n")?;
    out.write_all(body)
}

/// 错误状态 + `{"status":"error","message":...}` 正文
pub fn write_json_error(
    out: &mut impl Write,
    status: ErrorStatus,
    message: &str,
) -> io::Result<()> {
    let body = serde_json::to_vec(&ErrorBody {
        status: "error",
        message,
    })
    .map_err(io::Error::other)?;
    out.write_all(status.status_line())?;
    out.write_all(b"Content-Type: application/json\r\n\r\n")?;
    out.write_all(&body)
}

/// 200 + CSV 文件附件（带 Content-Length）
pub fn write_csv_attachment(
    out: &mut impl Write,
    filename: &str,
    content: &[u8],
) -> io::Result<()> {
    out.write_all(b"HTTP/1.1 200 OK\r\n")?;
    out.write_all(b"Content-Type: text/csv\r\n")?;
    out.write_all(
        format!(
            "Content-Disposition: attachment; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    )?;
    out.write_all(format!("Content-Length: {}\r\n\r\n", content.len()).as_bytes())?;
    out.write_all(content)
}
