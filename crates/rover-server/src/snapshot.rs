//! 传感器快照
//!
//! 每个请求即时采样一次，不跨请求缓存。缺席或读取失败的设备
//! 序列化为显式 null（CSV 里为空串），键集合固定。

use crate::robot::Robot;
use serde::Serialize;
use tracing::warn;

/// 左右编码器角度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MotorPosition {
    pub left_deg: i32,
    pub right_deg: i32,
}

/// 颜色读数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorReading {
    pub name: String,
    pub reflection: i32,
}

/// 一次请求的传感器快照
///
/// 字段顺序即 JSON 键顺序；None 序列化为 null，键不会消失。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Snapshot {
    pub motor_position: Option<MotorPosition>,
    pub left_motor_deg: Option<i32>,
    pub right_motor_deg: Option<i32>,
    pub ultrasonic_mm: Option<i32>,
    pub color: Option<ColorReading>,
    pub gyro_deg: Option<i32>,
}

impl Snapshot {
    /// 从当前硬件状态采样
    ///
    /// 在场设备的读取失败与缺席同样退化为 null，只记一条 warn。
    /// 航向角读取有副作用（见 `Heading::read_and_normalize`）。
    pub fn capture(robot: &mut Robot) -> Self {
        let mut snapshot = Self::default();

        if let Some(drive) = robot.drive.as_mut() {
            match drive.angles() {
                Ok((left_deg, right_deg)) => {
                    snapshot.motor_position = Some(MotorPosition {
                        left_deg,
                        right_deg,
                    });
                    snapshot.left_motor_deg = Some(left_deg);
                    snapshot.right_motor_deg = Some(right_deg);
                }
                Err(e) => warn!(error = %e, "encoder read failed"),
            }
        }

        if let Some(range) = robot.range.as_mut() {
            match range.distance_mm() {
                Ok(mm) => snapshot.ultrasonic_mm = Some(mm),
                Err(e) => warn!(error = %e, "ultrasonic read failed"),
            }
        }

        if let Some(color) = robot.color.as_mut() {
            match color.color_name() {
                Ok(name) => match color.reflection() {
                    Ok(reflection) => {
                        snapshot.color = Some(ColorReading { name, reflection });
                    }
                    Err(e) => warn!(error = %e, "reflection read failed"),
                },
                Err(e) => warn!(error = %e, "color read failed"),
            }
        }

        if let Some(heading) = robot.heading.as_mut() {
            match heading.read_and_normalize() {
                Ok(deg) => snapshot.gyro_deg = Some(deg),
                Err(e) => warn!(error = %e, "gyro read failed"),
            }
        }

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot::{DrivePair, Heading};
    use rover_hw::mock::{MockColorSensor, MockGyro, MockMotor, MockRangeSensor};

    fn full_robot() -> Robot {
        let left = MockMotor::with_angle(120);
        let right = MockMotor::with_angle(-45);
        Robot {
            drive: DrivePair::new(
                Some(Box::new(left.clone())),
                Some(Box::new(right.clone())),
            ),
            range: Some(Box::new(MockRangeSensor::new(512))),
            color: Some(Box::new(MockColorSensor::new("red", 42))),
            heading: Some(Heading::new(Box::new(MockGyro::new(370)))),
            ..Robot::offline()
        }
    }

    /// 全设备在场：键集合与归一化值
    #[test]
    fn test_capture_full_robot() {
        let mut robot = full_robot();
        let snapshot = Snapshot::capture(&mut robot);
        assert_eq!(
            snapshot.motor_position,
            Some(MotorPosition {
                left_deg: 120,
                right_deg: -45
            })
        );
        assert_eq!(snapshot.left_motor_deg, Some(120));
        assert_eq!(snapshot.right_motor_deg, Some(-45));
        assert_eq!(snapshot.ultrasonic_mm, Some(512));
        assert_eq!(
            snapshot.color,
            Some(ColorReading {
                name: "red".to_string(),
                reflection: 42
            })
        );
        // 370 ≥ 360：回绕清零
        assert_eq!(snapshot.gyro_deg, Some(0));
    }

    /// 全设备缺席：所有键都是显式 null
    #[test]
    fn test_capture_offline_serializes_explicit_nulls() {
        let mut robot = Robot::offline();
        let snapshot = Snapshot::capture(&mut robot);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(
            json,
            "{\"motor_position\":null,\"left_motor_deg\":null,\
             \"right_motor_deg\":null,\"ultrasonic_mm\":null,\
             \"color\":null,\"gyro_deg\":null}"
        );
    }

    /// 在场设备的读取失败退化为 null，不中断采样
    #[test]
    fn test_capture_degrades_failing_reads_to_null() {
        let mut robot = full_robot();
        let failing = MockRangeSensor::new(0);
        failing.set_should_fail(true);
        robot.range = Some(Box::new(failing));

        let snapshot = Snapshot::capture(&mut robot);
        assert_eq!(snapshot.ultrasonic_mm, None);
        assert!(snapshot.motor_position.is_some());
    }

    /// 序列化后的 JSON 字段顺序固定
    #[test]
    fn test_serialized_key_order() {
        let snapshot = Snapshot {
            ultrasonic_mm: Some(100),
            gyro_deg: Some(90),
            ..Snapshot::default()
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let motor_idx = json.find("motor_position").unwrap();
        let gyro_idx = json.find("gyro_deg").unwrap();
        assert!(motor_idx < gyro_idx);
        assert!(json.contains("\"ultrasonic_mm\":100"));
    }
}
