//! Rover 守护进程主入口
//!
//! 在机器人本机上运行：绑定 TCP 端点、探测硬件、进入单线程
//! 接收循环。中断信号触发幂等关停（刹停所有执行器后退出）。

use clap::Parser;
use rover_server::robot::Robot;
use rover_server::{Server, ServerConfig};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use tracing::info;

/// EV3 Rover 守护进程
///
/// 接收一行文本请求，触发电机/灯光/声音动作或返回传感器快照。
#[derive(Parser, Debug)]
#[command(name = "rover-daemon")]
#[command(about = "On-device command and telemetry server for the EV3 rover", long_about = None)]
#[command(version)]
struct Args {
    /// TOML 配置文件路径
    ///
    /// 缺省时全部使用内置默认值；命令行开关优先于文件内容
    #[arg(long)]
    config: Option<PathBuf>,

    /// 监听地址（如 0.0.0.0:8081）
    #[arg(long)]
    bind: Option<String>,

    /// CSV 导出文件路径
    #[arg(long)]
    csv: Option<PathBuf>,

    /// 每个请求之后的固定延迟（毫秒）
    #[arg(long)]
    delay_ms: Option<u64>,

    /// 直行/倒车速度（度/秒）
    #[arg(long)]
    drive_speed: Option<i32>,

    /// 原地转向速度（度/秒）
    #[arg(long)]
    turn_speed: Option<i32>,

    /// 升降杆速度（度/秒）
    #[arg(long)]
    lift_speed: Option<i32>,
}

/// 合并配置文件与命令行开关（开关优先）
fn load_config(args: &Args) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };

    if let Some(bind) = &args.bind {
        config.bind_addr = bind.clone();
    }
    if let Some(csv) = &args.csv {
        config.csv_path = csv.clone();
    }
    if let Some(delay_ms) = args.delay_ms {
        config.request_delay_ms = delay_ms;
    }
    if let Some(drive_speed) = args.drive_speed {
        config.drive_speed = drive_speed;
    }
    if let Some(turn_speed) = args.turn_speed {
        config.turn_speed = turn_speed;
    }
    if let Some(lift_speed) = args.lift_speed {
        config.lift_speed = lift_speed;
    }

    Ok(config)
}

/// 探测 ev3dev 设备并装配硬件上下文
///
/// 每个设备独立探测一次：失败的设备记 warn 并缺席，之后不再
/// 重试。端口分配沿用机器人的固定接线（outA/outC 驱动、outB
/// 升降杆、in2 超声、in3 颜色、in4 陀螺仪）。
#[cfg(target_os = "linux")]
fn assemble_robot() -> Robot {
    use rover_hw::{
        Ev3ColorSensor, Ev3GyroSensor, Ev3Speaker, Ev3StatusLight, Ev3TachoMotor,
        Ev3UltrasonicSensor,
    };
    use rover_server::robot::{
        BoxColorSensor, BoxGyro, BoxMotor, BoxRangeSensor, BoxSpeaker, BoxStatusLight, DrivePair,
        Heading,
    };
    use tracing::warn;

    fn probe<T, E: std::fmt::Display>(device: &str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(handle) => {
                info!(device, "device attached");
                Some(handle)
            }
            Err(e) => {
                warn!(device, error = %e, "device absent");
                None
            }
        }
    }

    let left = probe("left motor (outA)", Ev3TachoMotor::new("ev3-ports:outA"))
        .map(|m| Box::new(m) as BoxMotor);
    let right = probe("right motor (outC)", Ev3TachoMotor::new("ev3-ports:outC"))
        .map(|m| Box::new(m) as BoxMotor);
    let drive = DrivePair::new(left, right);
    if drive.is_none() {
        warn!("drive pair incomplete, all drive actions will be no-ops");
    }

    Robot {
        drive,
        lift: probe("lift motor (outB)", Ev3TachoMotor::new("ev3-ports:outB"))
            .map(|m| Box::new(m) as BoxMotor),
        range: probe(
            "ultrasonic sensor (in2)",
            Ev3UltrasonicSensor::new("ev3-ports:in2"),
        )
        .map(|s| Box::new(s) as BoxRangeSensor),
        color: probe("color sensor (in3)", Ev3ColorSensor::new("ev3-ports:in3"))
            .map(|s| Box::new(s) as BoxColorSensor),
        heading: probe("gyro sensor (in4)", Ev3GyroSensor::new("ev3-ports:in4"))
            .map(|g| Heading::new(Box::new(g) as BoxGyro)),
        light: probe("status light", Ev3StatusLight::new())
            .map(|l| Box::new(l) as BoxStatusLight),
        speaker: probe("speaker", Ev3Speaker::new()).map(|s| Box::new(s) as BoxSpeaker),
    }
}

#[cfg(not(target_os = "linux"))]
fn assemble_robot() -> Robot {
    tracing::warn!("no hardware backend on this platform, all devices absent");
    Robot::offline()
}

fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rover_daemon=info".parse().unwrap())
                .add_directive("rover_server=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let robot = Arc::new(Mutex::new(assemble_robot()));

    let mut server = Server::bind(&config, robot.clone())?;
    let shutdown = server.shutdown_flag();

    // 中断信号：刹停所有执行器后退出（幂等，连接开着也安全）
    let robot_for_signal = robot.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nReceived interrupt signal. Shutting down...");
        if let Ok(mut robot) = robot_for_signal.lock() {
            robot.stop_all();
        }
        shutdown.store(true, Ordering::SeqCst);
        process::exit(0);
    })
    .expect("Failed to set signal handler");

    info!(
        bind = %config.bind_addr,
        delay_ms = config.request_delay_ms,
        csv = %config.csv_path.display(),
        "rover-daemon started, press Ctrl+C to stop"
    );

    // 阻塞运行；逃出 accept 的错误是致命的，尽力刹停后退出
    if let Err(e) = server.run() {
        eprintln!("Server error: {}", e);
        if let Ok(mut robot) = robot.lock() {
            robot.stop_all();
        }
        process::exit(1);
    }

    Ok(())
}
