//! # Rover 命令与遥测服务器
//!
//! 轮式机器人的本机控制核心：在本地网络上接收一行文本请求，
//! 触发固定集合中的一个电机/灯光/声音动作，或返回一份传感器
//! 快照，并以小的结构化负载应答。
//!
//! 架构是两个严格串行的组件：
//!
//! - [`Server`]（接收循环）：持有监听端点，一次只处理一个连接，
//!   处理完关闭、延迟、再接收下一个；
//! - [`Dispatcher`]（调度器）：把一个请求归类成动作路由、CSV
//!   导出或快照回退，执行并写回响应。
//!
//! 硬件句柄全部独立可缺席（[`Robot`]）；缺席只退化行为，从不
//! 向客户端报错。

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod export;
pub mod response;
pub mod robot;
pub mod routes;
pub mod server;
pub mod snapshot;

pub use config::{Note, ServerConfig};
pub use dispatcher::{Dispatcher, Outcome};
pub use error::ServerError;
pub use export::{CsvColumn, ExportLog};
pub use robot::{BoxMotor, DrivePair, Heading, Robot};
pub use routes::{Action, match_route};
pub use server::Server;
pub use snapshot::Snapshot;
