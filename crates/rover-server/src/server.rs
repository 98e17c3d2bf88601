//! 连接接收循环
//!
//! 单线程、严格串行：一个连接完整处理并关闭之后才接收下一个。
//! accept 与 read 都是阻塞调用，没有超时——慢客户端会停住整个
//! 服务，这对单操作者控制链路是可接受的（见 DESIGN.md）。

use crate::config::ServerConfig;
use crate::dispatcher::{Dispatcher, Outcome};
use crate::error::ServerError;
use crate::robot::Robot;
use std::io::{self, Read};
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// 单次接收的请求字节上限；超出部分留在内核缓冲里被一并丢弃
const REQUEST_BUFFER_SIZE: usize = 1024;

/// 命令与遥测服务器
pub struct Server {
    listener: TcpListener,
    dispatcher: Dispatcher,
    robot: Arc<Mutex<Robot>>,
    delay: Duration,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// 绑定监听地址并装配调度器
    pub fn bind(config: &ServerConfig, robot: Arc<Mutex<Robot>>) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(&config.bind_addr)?;
        info!(addr = %listener.local_addr()?, "listening");
        Ok(Self {
            listener,
            dispatcher: Dispatcher::new(robot.clone(), config.clone()),
            robot,
            delay: config.request_delay(),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// 实际绑定到的地址（测试用 0 端口时从这里取）
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// 关停标志：置位后在下一个请求间隙退出循环
    ///
    /// 中断信号只在请求之间生效，从不打断进行中的请求。
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// 阻塞运行接收循环
    ///
    /// 每轮：accept 一个连接 → 最多读 1024 字节（截断照单全收，
    /// 不做分帧）→ 交给调度器 → 关闭连接 → 固定延迟。accept 或
    /// read 的错误是致命的，原样上抛终止循环（忠实于原始行为，
    /// 不做重试）。关停标志置位时刹停执行器后正常返回。
    pub fn run(&mut self) -> Result<(), ServerError> {
        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                info!("shutdown requested, braking all actuators");
                if let Ok(mut robot) = self.robot.lock() {
                    robot.stop_all();
                }
                return Ok(());
            }

            let (mut stream, peer) = self.listener.accept()?;
            debug!(%peer, "client connected");

            let mut buf = [0u8; REQUEST_BUFFER_SIZE];
            let n = stream.read(&mut buf)?;
            let request = String::from_utf8_lossy(&buf[..n]);
            debug!(request = %request.lines().next().unwrap_or(""), "request received");

            match self.dispatcher.handle(&request, &mut stream)? {
                Outcome::Responded => {}
                Outcome::Streamed => debug!("dispatcher finished the connection itself"),
                Outcome::NoResponse => debug!("connection closed without response"),
            }
            drop(stream);

            thread::sleep(self.delay);
        }
    }
}
