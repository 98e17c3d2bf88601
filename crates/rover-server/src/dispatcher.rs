//! 请求调度器
//!
//! 把一次连接的原始请求文本归类成动作路由、CSV 导出或快照回退，
//! 执行动作并在同一连接上写出响应。每个请求恰好产生一个响应
//! 写出序列（或者在畸形请求时什么都不写）。

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::export::ExportLog;
use crate::response::{self, ErrorStatus};
use crate::robot::Robot;
use crate::routes::{self, Action};
use crate::snapshot::Snapshot;
use rover_hw::{HwError, LedColor};
use serde::Serialize;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 动作应答正文（字段顺序即 JSON 键顺序）
#[derive(Debug, Serialize)]
struct Ack {
    status: &'static str,
    action: &'static str,
}

/// 一次请求的处理结局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 写出了常规 JSON 响应
    Responded,
    /// CSV 路由自己完成了全部写出（附件或错误体）
    Streamed,
    /// 畸形请求：一个字节都没写，直接关连接
    NoResponse,
}

/// 记录硬件操作失败但不向客户端暴露
///
/// 设备在场但操作失败沿用缺席语义：退化、不报错。
fn tolerate(context: &'static str, result: Result<(), HwError>) {
    if let Err(e) = result {
        warn!(error = %e, context, "hardware operation failed, tolerated");
    }
}

/// 请求调度器
pub struct Dispatcher {
    robot: Arc<Mutex<Robot>>,
    config: ServerConfig,
    export: ExportLog,
}

impl Dispatcher {
    pub fn new(robot: Arc<Mutex<Robot>>, config: ServerConfig) -> Self {
        let export = ExportLog::new(config.csv_path.clone(), config.csv_columns.clone());
        Self {
            robot,
            config,
            export,
        }
    }

    /// 处理一个请求并写出响应
    ///
    /// 畸形请求（不以 `GET ` 开头）不写任何字节，这是一个独立的
    /// 终止状态而不是错误。写响应途中的 IO 失败原样上抛。
    pub fn handle(
        &self,
        request: &str,
        out: &mut impl Write,
    ) -> Result<Outcome, ServerError> {
        if !request.starts_with("GET ") {
            debug!("malformed request, closing without response");
            return Ok(Outcome::NoResponse);
        }

        let mut robot = self.robot.lock().map_err(|_| ServerError::PoisonedLock)?;

        match routes::match_route(request) {
            Some((_, Action::ExportCsv)) => self.handle_export(&mut robot, out),
            Some((name, action)) => {
                self.perform(&mut robot, action);
                info!(action = name, "action executed");
                let body = serde_json::to_string(&Ack {
                    status: "ok",
                    action: name,
                })?;
                response::write_json_ok(out, body.as_bytes())?;
                Ok(Outcome::Responded)
            }
            None => {
                let snapshot = Snapshot::capture(&mut robot);
                let body = serde_json::to_string(&snapshot)?;
                response::write_json_ok(out, body.as_bytes())?;
                Ok(Outcome::Responded)
            }
        }
    }

    /// 执行一个动作路由对应的硬件操作
    ///
    /// 所需执行器缺席时整个动作是 no-op；调用方照常回 ok 应答。
    fn perform(&self, robot: &mut Robot, action: Action) {
        let drive = self.config.drive_speed;
        let turn = self.config.turn_speed;
        let lift = self.config.lift_speed;

        match action {
            Action::Forward => {
                if let Some(pair) = robot.drive.as_mut() {
                    tolerate("forward", pair.run(drive, drive));
                }
            }
            Action::Reverse => {
                if let Some(pair) = robot.drive.as_mut() {
                    tolerate("reverse", pair.run(-drive, -drive));
                }
            }
            Action::TurnLeft => {
                if let Some(pair) = robot.drive.as_mut() {
                    tolerate("turn left", pair.run(-turn, turn));
                }
            }
            Action::TurnRight => {
                if let Some(pair) = robot.drive.as_mut() {
                    tolerate("turn right", pair.run(turn, -turn));
                }
            }
            Action::Stop => {
                if let Some(pair) = robot.drive.as_mut() {
                    tolerate("stop", pair.brake());
                }
            }
            Action::LiftUp => {
                if let Some(motor) = robot.lift.as_mut() {
                    tolerate("lift up", motor.run(lift));
                }
            }
            Action::LiftDown => {
                if let Some(motor) = robot.lift.as_mut() {
                    tolerate("lift down", motor.run(-lift));
                }
            }
            Action::LiftStop => {
                if let Some(motor) = robot.lift.as_mut() {
                    tolerate("lift stop", motor.brake());
                }
            }
            Action::Beep => {
                if let Some(speaker) = robot.speaker.as_mut() {
                    for note in &self.config.melody {
                        tolerate("beep", speaker.tone(note.freq_hz, note.duration_ms));
                        thread::sleep(Duration::from_millis(u64::from(note.gap_ms)));
                    }
                }
            }
            Action::LedOn => {
                if let Some(light) = robot.light.as_mut() {
                    tolerate("led on", light.set_color(LedColor::Green));
                }
            }
            Action::LedOff => {
                if let Some(light) = robot.light.as_mut() {
                    tolerate("led off", light.off());
                }
            }
            // CSV 路由不经过这里（handle 里单独分支）
            Action::ExportCsv => {}
        }
    }

    /// CSV 导出路由：追加当前快照，然后把整个日志流回去
    ///
    /// 导出失败转成 404/500 JSON 错误体，从不中断接收循环。
    fn handle_export(
        &self,
        robot: &mut Robot,
        out: &mut impl Write,
    ) -> Result<Outcome, ServerError> {
        let snapshot = Snapshot::capture(robot);

        if let Err(e) = self.export.append(&snapshot) {
            warn!(error = %e, path = %self.export.path().display(), "CSV append failed");
            response::write_json_error(out, ErrorStatus::Internal, "CSV not written")?;
            return Ok(Outcome::Streamed);
        }

        match self.export.read_all() {
            Ok(content) => {
                let filename = self
                    .export
                    .path()
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("sensor_data.csv");
                info!(bytes = content.len(), "CSV export streamed");
                response::write_csv_attachment(out, filename, &content)?;
                Ok(Outcome::Streamed)
            }
            Err(e) => {
                warn!(error = %e, "CSV read-back failed");
                response::write_json_error(out, ErrorStatus::NotFound, "CSV not found")?;
                Ok(Outcome::Streamed)
            }
        }
    }
}
