//! 机器人硬件上下文
//!
//! 把各自独立可缺席的设备句柄聚合成一个进程级上下文，初始化之后
//! 不再变化。差速驱动的左右电机是耦合的：`DrivePair` 在构造处
//! 强制"要么都有、要么都没有"，上层不需要再逐处检查。

use rover_hw::{ColorSensor, Gyro, HwError, Motor, RangeSensor, Speaker, StatusLight};
use tracing::warn;

pub type BoxMotor = Box<dyn Motor + Send>;
pub type BoxRangeSensor = Box<dyn RangeSensor + Send>;
pub type BoxColorSensor = Box<dyn ColorSensor + Send>;
pub type BoxGyro = Box<dyn Gyro + Send>;
pub type BoxStatusLight = Box<dyn StatusLight + Send>;
pub type BoxSpeaker = Box<dyn Speaker + Send>;

/// 差速驱动对（左右电机耦合）
pub struct DrivePair {
    left: BoxMotor,
    right: BoxMotor,
}

impl DrivePair {
    /// 只有左右电机都在场时才构成驱动对
    pub fn new(left: Option<BoxMotor>, right: Option<BoxMotor>) -> Option<Self> {
        match (left, right) {
            (Some(left), Some(right)) => Some(Self { left, right }),
            _ => None,
        }
    }

    /// 左右电机各自以给定转速运转（度/秒，符号决定方向）
    pub fn run(&mut self, left_speed: i32, right_speed: i32) -> Result<(), HwError> {
        self.left.run(left_speed)?;
        self.right.run(right_speed)
    }

    /// 两侧独立刹车；一侧失败不阻止另一侧
    pub fn brake(&mut self) -> Result<(), HwError> {
        let left = self.left.brake();
        let right = self.right.brake();
        left.and(right)
    }

    /// 左右编码器角度
    pub fn angles(&mut self) -> Result<(i32, i32), HwError> {
        Ok((self.left.angle()?, self.right.angle()?))
    }
}

/// 航向角读取器
///
/// 包装陀螺仪并实现回绕自校正：这是一个**有副作用的读取**，
/// 累计角度到达 ±360 时会把传感器内部零点清掉。
pub struct Heading {
    gyro: BoxGyro,
}

impl Heading {
    pub fn new(gyro: BoxGyro) -> Self {
        Self { gyro }
    }

    /// 读取并归一化航向角到 [0, 360)
    ///
    /// 原始值到达 360 或 -360 时清零传感器并返回 0；
    /// 其余情况做欧几里得取模（-359 → 1，359 → 359）。
    pub fn read_and_normalize(&mut self) -> Result<i32, HwError> {
        let raw = self.gyro.angle()?;
        if raw >= 360 || raw <= -360 {
            self.gyro.reset()?;
            return Ok(0);
        }
        Ok(raw.rem_euclid(360))
    }
}

/// 进程级硬件上下文
///
/// 每个字段独立可缺席；缺席设备对应的动作退化为 no-op，
/// 快照字段退化为 null，从不向客户端报错。
#[derive(Default)]
pub struct Robot {
    pub drive: Option<DrivePair>,
    pub lift: Option<BoxMotor>,
    pub range: Option<BoxRangeSensor>,
    pub color: Option<BoxColorSensor>,
    pub heading: Option<Heading>,
    pub light: Option<BoxStatusLight>,
    pub speaker: Option<BoxSpeaker>,
}

impl Robot {
    /// 所有设备缺席的上下文（无硬件平台、测试基线）
    pub fn offline() -> Self {
        Self::default()
    }

    /// 刹停所有在场的执行器
    ///
    /// 幂等，关机路径随时可调；刹车失败只记日志。
    pub fn stop_all(&mut self) {
        if let Some(drive) = self.drive.as_mut() {
            if let Err(e) = drive.brake() {
                warn!(error = %e, "failed to brake drive pair");
            }
        }
        if let Some(lift) = self.lift.as_mut() {
            if let Err(e) = lift.brake() {
                warn!(error = %e, "failed to brake lift motor");
            }
        }
    }
}
