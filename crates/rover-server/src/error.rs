//! 服务层错误类型定义

use rover_hw::HwError;
use thiserror::Error;

/// 服务层错误类型
///
/// 注意：硬件缺席不是错误（见 `Robot`），CSV 导出失败也不经过
/// 这里（调度器把它转成 404/500 响应）。真正走到这个类型的只有
/// 配置问题和会终止接收循环的 IO 故障。
#[derive(Error, Debug)]
pub enum ServerError {
    /// 套接字或文件 IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 配置文件解析失败
    #[error("Config error: {0}")]
    Config(String),

    /// 硬件层错误
    #[error("Hardware error: {0}")]
    Hw(#[from] HwError),

    /// 响应序列化失败
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// 锁被毒化（线程 panic）
    #[error("Poisoned lock (thread panic)")]
    PoisonedLock,
}

#[cfg(test)]
mod tests {
    use super::ServerError;

    /// 测试 ServerError 的 Display 实现
    #[test]
    fn test_server_error_display() {
        let err = ServerError::Config("bad toml".to_string());
        assert_eq!(format!("{}", err), "Config error: bad toml");

        let err = ServerError::PoisonedLock;
        assert_eq!(format!("{}", err), "Poisoned lock (thread panic)");

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = ServerError::Io(io);
        assert!(format!("{}", err).contains("reset"));
    }

    /// 测试 From<HwError> 转换
    #[test]
    fn test_from_hw_error() {
        let hw = rover_hw::HwError::Unsupported("nope");
        let err: ServerError = hw.into();
        assert!(matches!(err, ServerError::Hw(_)));
    }
}
