//! 调度器集成测试
//!
//! 用 mock 设备验证路由 → 硬件操作 → 响应的完整链路，
//! 不经过真实套接字。

use rover_hw::mock::{LightCall, MockColorSensor, MockGyro, MockLight, MockMotor, MockRangeSensor, MockSpeaker, MotorCall};
use rover_hw::LedColor;
use rover_server::robot::{DrivePair, Heading};
use rover_server::{Dispatcher, Note, Outcome, Robot, ServerConfig};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// 测试用的全套 mock 设备（保留句柄以便断言调用记录）
struct Rig {
    left: MockMotor,
    right: MockMotor,
    lift: MockMotor,
    speaker: MockSpeaker,
    light: MockLight,
    gyro: MockGyro,
}

impl Rig {
    fn new() -> (Self, Robot) {
        let rig = Rig {
            left: MockMotor::with_angle(100),
            right: MockMotor::with_angle(200),
            lift: MockMotor::new(),
            speaker: MockSpeaker::new(),
            light: MockLight::new(),
            gyro: MockGyro::new(90),
        };
        let robot = Robot {
            drive: DrivePair::new(
                Some(Box::new(rig.left.clone())),
                Some(Box::new(rig.right.clone())),
            ),
            lift: Some(Box::new(rig.lift.clone())),
            range: Some(Box::new(MockRangeSensor::new(345))),
            color: Some(Box::new(MockColorSensor::new("green", 33))),
            heading: Some(Heading::new(Box::new(rig.gyro.clone()))),
            light: Some(Box::new(rig.light.clone())),
            speaker: Some(Box::new(rig.speaker.clone())),
        };
        (rig, robot)
    }
}

fn test_config(csv_path: PathBuf) -> ServerConfig {
    ServerConfig {
        csv_path,
        request_delay_ms: 0,
        melody: vec![
            Note::new(440, 100, 0),
            Note::new(587, 100, 0),
            Note::new(659, 100, 0),
        ],
        ..ServerConfig::default()
    }
}

fn dispatcher(robot: Robot, csv_path: PathBuf) -> Dispatcher {
    Dispatcher::new(Arc::new(Mutex::new(robot)), test_config(csv_path))
}

fn dispatch(dispatcher: &Dispatcher, request: &str) -> (Outcome, Vec<u8>) {
    let mut out = Vec::new();
    let outcome = dispatcher.handle(request, &mut out).unwrap();
    (outcome, out)
}

/// 响应正文（最后一个空行之后的部分）
fn body_of(response: &[u8]) -> String {
    let text = String::from_utf8(response.to_vec()).unwrap();
    text.split("\r\n\r\n").nth(1).unwrap().to_string()
}

/// 每个驱动动作：正确的转速符号与幅值，应答回显路由名
#[test]
fn test_drive_actions_run_both_motors() {
    let cases = [
        ("/avancer", 500, 500),
        ("/reculer", -500, -500),
        ("/gauche", -100, 100),
        ("/droite", 100, -100),
    ];
    for (route, left_speed, right_speed) in cases {
        let dir = tempfile::tempdir().unwrap();
        let (rig, robot) = Rig::new();
        let d = dispatcher(robot, dir.path().join("data.csv"));

        let (outcome, out) = dispatch(&d, &format!("GET {} HTTP/1.1\r\n", route));
        assert_eq!(outcome, Outcome::Responded);
        assert_eq!(rig.left.calls(), vec![MotorCall::Run(left_speed)], "route={}", route);
        assert_eq!(rig.right.calls(), vec![MotorCall::Run(right_speed)], "route={}", route);
        assert_eq!(
            body_of(&out),
            format!("{{\"status\":\"ok\",\"action\":\"{}\"}}", &route[1..])
        );
    }
}

/// /stop：两侧独立刹车
#[test]
fn test_stop_brakes_both_motors() {
    let dir = tempfile::tempdir().unwrap();
    let (rig, robot) = Rig::new();
    let d = dispatcher(robot, dir.path().join("data.csv"));

    let (_, out) = dispatch(&d, "GET /stop HTTP/1.1\r\n");
    assert_eq!(rig.left.calls(), vec![MotorCall::Brake]);
    assert_eq!(rig.right.calls(), vec![MotorCall::Brake]);
    assert_eq!(body_of(&out), "{\"status\":\"ok\",\"action\":\"stop\"}");
}

/// 升降杆动作独立于驱动对
#[test]
fn test_lift_actions() {
    let dir = tempfile::tempdir().unwrap();
    let (rig, robot) = Rig::new();
    let d = dispatcher(robot, dir.path().join("data.csv"));

    dispatch(&d, "GET /upbarre HTTP/1.1\r\n");
    dispatch(&d, "GET /downbarre HTTP/1.1\r\n");
    let (_, out) = dispatch(&d, "GET /stopbarre HTTP/1.1\r\n");

    assert_eq!(
        rig.lift.calls(),
        vec![MotorCall::Run(500), MotorCall::Run(-500), MotorCall::Brake]
    );
    assert!(rig.left.calls().is_empty());
    assert_eq!(body_of(&out), "{\"status\":\"ok\",\"action\":\"stopbarre\"}");
}

/// /beep 按旋律表顺序播放
#[test]
fn test_beep_plays_melody_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let (rig, robot) = Rig::new();
    let d = dispatcher(robot, dir.path().join("data.csv"));

    let (_, out) = dispatch(&d, "GET /beep HTTP/1.1\r\n");
    assert_eq!(rig.speaker.tones(), vec![(440, 100), (587, 100), (659, 100)]);
    assert_eq!(body_of(&out), "{\"status\":\"ok\",\"action\":\"beep\"}");
}

/// LED 路由与别名 token
#[test]
fn test_led_routes_and_aliases() {
    let dir = tempfile::tempdir().unwrap();
    let (rig, robot) = Rig::new();
    let d = dispatcher(robot, dir.path().join("data.csv"));

    let (_, on) = dispatch(&d, "GET /onled HTTP/1.1\r\n");
    let (_, off) = dispatch(&d, "GET /led_off HTTP/1.1\r\n");

    assert_eq!(
        rig.light.calls(),
        vec![LightCall::Set(LedColor::Green), LightCall::Off]
    );
    assert_eq!(body_of(&on), "{\"status\":\"ok\",\"action\":\"onled\"}");
    assert_eq!(body_of(&off), "{\"status\":\"ok\",\"action\":\"led_off\"}");
}

/// 执行器缺席：零硬件调用，仍回同样的 ok 应答
#[test]
fn test_absent_actuators_still_ack_ok() {
    for route in ["/avancer", "/stop", "/upbarre", "/beep", "/onled"] {
        let dir = tempfile::tempdir().unwrap();
        let d = dispatcher(Robot::offline(), dir.path().join("data.csv"));
        let (outcome, out) = dispatch(&d, &format!("GET {} HTTP/1.1\r\n", route));
        assert_eq!(outcome, Outcome::Responded, "route={}", route);
        assert_eq!(
            body_of(&out),
            format!("{{\"status\":\"ok\",\"action\":\"{}\"}}", &route[1..])
        );
    }
}

/// 畸形请求：一个字节都不写
#[test]
fn test_malformed_requests_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (rig, robot) = Rig::new();
    let d = dispatcher(robot, dir.path().join("data.csv"));

    for request in ["POST /avancer HTTP/1.1\r\n", "", "PUT /x\r\n", "get /stop"] {
        let (outcome, out) = dispatch(&d, request);
        assert_eq!(outcome, Outcome::NoResponse, "request={:?}", request);
        assert!(out.is_empty(), "request={:?}", request);
    }
    assert!(rig.left.calls().is_empty());
}

/// 未知 GET 路径回退到快照路由
#[test]
fn test_unknown_path_returns_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let (_rig, robot) = Rig::new();
    let d = dispatcher(robot, dir.path().join("data.csv"));

    let (outcome, out) = dispatch(&d, "GET /xyz HTTP/1.1\r\n");
    assert_eq!(outcome, Outcome::Responded);

    let body: Value = serde_json::from_str(&body_of(&out)).unwrap();
    assert_eq!(body["motor_position"]["left_deg"], 100);
    assert_eq!(body["motor_position"]["right_deg"], 200);
    assert_eq!(body["left_motor_deg"], 100);
    assert_eq!(body["right_motor_deg"], 200);
    assert_eq!(body["ultrasonic_mm"], 345);
    assert_eq!(body["color"]["name"], "green");
    assert_eq!(body["color"]["reflection"], 33);
    assert_eq!(body["gyro_deg"], 90);
}

/// 传感器缺席：快照字段是显式 null
#[test]
fn test_snapshot_with_absent_sensors_has_explicit_nulls() {
    let dir = tempfile::tempdir().unwrap();
    let d = dispatcher(Robot::offline(), dir.path().join("data.csv"));

    let (_, out) = dispatch(&d, "GET / HTTP/1.1\r\n");
    let body: Value = serde_json::from_str(&body_of(&out)).unwrap();
    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 6);
    for key in [
        "motor_position",
        "left_motor_deg",
        "right_motor_deg",
        "ultrasonic_mm",
        "color",
        "gyro_deg",
    ] {
        assert!(object[key].is_null(), "key={}", key);
    }
}

/// 路由优先级经过完整调度路径：/stopbarre 不触发驱动刹车
#[test]
fn test_dispatch_precedence_stopbarre_over_stop() {
    let dir = tempfile::tempdir().unwrap();
    let (rig, robot) = Rig::new();
    let d = dispatcher(robot, dir.path().join("data.csv"));

    dispatch(&d, "GET /stopbarre HTTP/1.1\r\n");
    assert_eq!(rig.lift.calls(), vec![MotorCall::Brake]);
    assert!(rig.left.calls().is_empty());
    assert!(rig.right.calls().is_empty());
}

/// CSV 导出：附件响应 + 文件逐次增长
#[test]
fn test_csv_export_streams_attachment() {
    let dir = tempfile::tempdir().unwrap();
    let (_rig, robot) = Rig::new();
    let d = dispatcher(robot, dir.path().join("data.csv"));

    let (outcome, out) = dispatch(&d, "GET /csv HTTP/1.1\r\n");
    assert_eq!(outcome, Outcome::Streamed);
    let text = String::from_utf8(out.clone()).unwrap();
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("Content-Type: text/csv\r\n"));
    assert!(text.contains("Content-Disposition: attachment; filename=\"data.csv\"\r\n"));
    assert!(text.contains("Content-Length: "));
    let body = body_of(out.as_slice());
    assert!(body.starts_with(
        "left_deg,right_deg,ultrasonic_mm,color_name,color_reflection,gyro_deg\n"
    ));
    assert_eq!(body.lines().count(), 2);

    // 第二次导出：表头不重复，多一行数据
    let (_, out) = dispatch(&d, "GET /csv HTTP/1.1\r\n");
    let body = body_of(out.as_slice());
    assert_eq!(body.lines().count(), 3);
    assert_eq!(body.matches("left_deg").count(), 1);
}

/// CSV 写入失败：500 JSON 错误体，循环不崩溃
#[test]
fn test_csv_write_failure_yields_500() {
    let (_rig, robot) = Rig::new();
    let d = dispatcher(robot, PathBuf::from("/nonexistent-dir/data.csv"));

    let (outcome, out) = dispatch(&d, "GET /csv HTTP/1.1\r\n");
    assert_eq!(outcome, Outcome::Streamed);
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    assert_eq!(
        body_of(text.as_bytes()),
        "{\"status\":\"error\",\"message\":\"CSV not written\"}"
    );

    // 失败后调度器仍可继续服务
    let (outcome, _) = dispatch(&d, "GET /stop HTTP/1.1\r\n");
    assert_eq!(outcome, Outcome::Responded);
}
