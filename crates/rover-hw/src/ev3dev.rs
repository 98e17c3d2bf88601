//! ev3dev sysfs 设备后端
//!
//! 通过 Linux sysfs 属性文件访问 LEGO EV3 的电机与传感器
//! （ev3dev 内核驱动：`/sys/class/tacho-motor`、`/sys/class/lego-sensor`）。
//!
//! ## 特性
//!
//! - 按端口地址（如 `ev3-ports:outA`）扫描并绑定设备节点
//! - 所有读写都是同步文件 IO，没有后台线程
//! - 设备缺席在构造时报 `HwError::NotFound`，之后不再重试
//!
//! ## 限制
//!
//! - **仅限 Linux 平台**：依赖 ev3dev 内核驱动暴露的 sysfs 节点
//! - **权限要求**：需要对 sysfs 属性文件的写权限（ev3dev 默认放行）

use crate::{ColorSensor, Gyro, HwError, LedColor, Motor, RangeSensor, Speaker, StatusLight};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

const TACHO_MOTOR_CLASS: &str = "tacho-motor";
const LEGO_SENSOR_CLASS: &str = "lego-sensor";
const SYS_CLASS_ROOT: &str = "/sys/class";
const LEDS_DIR: &str = "/sys/class/leds";
const TONE_DEVICE: &str = "/sys/devices/platform/snd-legoev3/tone";

/// 读取一个 sysfs 属性（去掉结尾换行）
fn read_attr(device: &Path, attribute: &str) -> Result<String, HwError> {
    let raw = fs::read_to_string(device.join(attribute))?;
    Ok(raw.trim().to_string())
}

/// 读取并解析为整数的 sysfs 属性
fn read_attr_i32(device: &Path, attribute: &str) -> Result<i32, HwError> {
    let raw = read_attr(device, attribute)?;
    raw.parse().map_err(|_| HwError::Parse {
        attribute: attribute.to_string(),
        value: raw,
    })
}

fn write_attr(device: &Path, attribute: &str, value: &str) -> Result<(), HwError> {
    trace!(device = %device.display(), attribute, value, "sysfs write");
    fs::write(device.join(attribute), value)?;
    Ok(())
}

/// 在一个设备类下按端口地址查找设备节点
///
/// ev3dev 给每个已连接设备分配 `motorN` / `sensorN` 节点，
/// 其 `address` 属性标识物理端口（如 `ev3-ports:outA`）。
fn find_device(class: &str, address: &str) -> Result<PathBuf, HwError> {
    let class_dir = Path::new(SYS_CLASS_ROOT).join(class);
    let entries = fs::read_dir(&class_dir).map_err(|_| HwError::NotFound {
        class: class.to_string(),
        address: address.to_string(),
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        if let Ok(found) = read_attr(&path, "address") {
            if found == address {
                return Ok(path);
            }
        }
    }

    Err(HwError::NotFound {
        class: class.to_string(),
        address: address.to_string(),
    })
}

/// EV3 大型/中型伺服电机（tacho-motor 驱动）
#[derive(Debug)]
pub struct Ev3TachoMotor {
    path: PathBuf,
}

impl Ev3TachoMotor {
    /// 按端口地址绑定电机（如 `ev3-ports:outA`）
    pub fn new(address: &str) -> Result<Self, HwError> {
        let path = find_device(TACHO_MOTOR_CLASS, address)?;
        Ok(Self { path })
    }
}

impl Motor for Ev3TachoMotor {
    fn run(&mut self, speed_deg_s: i32) -> Result<(), HwError> {
        write_attr(&self.path, "speed_sp", &speed_deg_s.to_string())?;
        write_attr(&self.path, "command", "run-forever")
    }

    fn brake(&mut self) -> Result<(), HwError> {
        write_attr(&self.path, "stop_action", "brake")?;
        write_attr(&self.path, "command", "stop")
    }

    fn angle(&mut self) -> Result<i32, HwError> {
        read_attr_i32(&self.path, "position")
    }
}

/// EV3 超声传感器（lego-sensor 驱动，`US-DIST-CM` 模式）
#[derive(Debug)]
pub struct Ev3UltrasonicSensor {
    path: PathBuf,
}

impl Ev3UltrasonicSensor {
    pub fn new(address: &str) -> Result<Self, HwError> {
        let path = find_device(LEGO_SENSOR_CLASS, address)?;
        // US-DIST-CM 模式下 value0 单位为 0.1 cm，即毫米
        write_attr(&path, "mode", "US-DIST-CM")?;
        Ok(Self { path })
    }
}

impl RangeSensor for Ev3UltrasonicSensor {
    fn distance_mm(&mut self) -> Result<i32, HwError> {
        read_attr_i32(&self.path, "value0")
    }
}

/// ev3dev 颜色索引到名称的映射（COL-COLOR 模式）
const COLOR_NAMES: &[&str] = &[
    "none", "black", "blue", "green", "yellow", "red", "white", "brown",
];

/// EV3 颜色传感器
///
/// 颜色识别与反射光强度使用两个互斥模式，每次读取前切换。
#[derive(Debug)]
pub struct Ev3ColorSensor {
    path: PathBuf,
}

impl Ev3ColorSensor {
    pub fn new(address: &str) -> Result<Self, HwError> {
        let path = find_device(LEGO_SENSOR_CLASS, address)?;
        Ok(Self { path })
    }
}

impl ColorSensor for Ev3ColorSensor {
    fn color_name(&mut self) -> Result<String, HwError> {
        write_attr(&self.path, "mode", "COL-COLOR")?;
        let index = read_attr_i32(&self.path, "value0")?;
        let name = COLOR_NAMES
            .get(usize::try_from(index).unwrap_or(usize::MAX))
            .unwrap_or(&"none");
        Ok((*name).to_string())
    }

    fn reflection(&mut self) -> Result<i32, HwError> {
        write_attr(&self.path, "mode", "COL-REFLECT")?;
        read_attr_i32(&self.path, "value0")
    }
}

/// EV3 陀螺仪（`GYRO-ANG` 模式，累计角度）
#[derive(Debug)]
pub struct Ev3GyroSensor {
    path: PathBuf,
}

impl Ev3GyroSensor {
    pub fn new(address: &str) -> Result<Self, HwError> {
        let path = find_device(LEGO_SENSOR_CLASS, address)?;
        write_attr(&path, "mode", "GYRO-ANG")?;
        Ok(Self { path })
    }
}

impl Gyro for Ev3GyroSensor {
    fn angle(&mut self) -> Result<i32, HwError> {
        read_attr_i32(&self.path, "value0")
    }

    fn reset(&mut self) -> Result<(), HwError> {
        // 重写模式会让驱动把累计角度清零（ev3dev 的标准做法）
        write_attr(&self.path, "mode", "GYRO-ANG")
    }
}

/// EV3 机身状态灯（左右两组红/绿 LED）
#[derive(Debug)]
pub struct Ev3StatusLight {
    green: Vec<PathBuf>,
    red: Vec<PathBuf>,
}

impl Ev3StatusLight {
    pub fn new() -> Result<Self, HwError> {
        let mut green = Vec::new();
        let mut red = Vec::new();

        for entry in fs::read_dir(LEDS_DIR)?.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.ends_with(":brick-status") {
                continue;
            }
            if name.contains(":green:") {
                green.push(entry.path());
            } else if name.contains(":red:") {
                red.push(entry.path());
            }
        }

        if green.is_empty() && red.is_empty() {
            return Err(HwError::NotFound {
                class: "leds".to_string(),
                address: "brick-status".to_string(),
            });
        }

        Ok(Self { green, red })
    }

    fn set_brightness(leds: &[PathBuf], value: u8) -> Result<(), HwError> {
        for led in leds {
            write_attr(led, "brightness", &value.to_string())?;
        }
        Ok(())
    }
}

impl StatusLight for Ev3StatusLight {
    fn set_color(&mut self, color: LedColor) -> Result<(), HwError> {
        let (green, red) = match color {
            LedColor::Green => (255, 0),
            LedColor::Red => (0, 255),
            LedColor::Orange => (255, 255),
        };
        Self::set_brightness(&self.green, green)?;
        Self::set_brightness(&self.red, red)
    }

    fn off(&mut self) -> Result<(), HwError> {
        Self::set_brightness(&self.green, 0)?;
        Self::set_brightness(&self.red, 0)
    }
}

/// EV3 扬声器（legoev3 tone 设备）
#[derive(Debug)]
pub struct Ev3Speaker {
    path: PathBuf,
}

impl Ev3Speaker {
    pub fn new() -> Result<Self, HwError> {
        let path = PathBuf::from(TONE_DEVICE);
        if !path.exists() {
            return Err(HwError::NotFound {
                class: "snd-legoev3".to_string(),
                address: "tone".to_string(),
            });
        }
        Ok(Self { path })
    }
}

impl Speaker for Ev3Speaker {
    fn tone(&mut self, freq_hz: u32, duration_ms: u32) -> Result<(), HwError> {
        // tone 设备接受 "<频率> <时长ms>"，写入后立即返回
        fs::write(&self.path, format!("{} {}", freq_hz, duration_ms))?;
        Ok(())
    }
}
