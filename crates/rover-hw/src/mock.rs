//! 测试用 Mock 设备
//!
//! 记录每次调用并允许注入故障，供上层在无硬件环境下验证
//! 调度逻辑。所有记录器都通过 `Arc` 共享：把 mock 的一个克隆
//! 交给机器人后，测试端仍能读取调用历史。

use crate::{ColorSensor, Gyro, HwError, LedColor, Motor, RangeSensor, Speaker, StatusLight};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn injected_failure() -> HwError {
    HwError::Unsupported("injected mock failure")
}

/// 电机调用记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorCall {
    Run(i32),
    Brake,
}

/// Mock 电机：记录 run/brake 调用，角度可设置
#[derive(Debug, Clone, Default)]
pub struct MockMotor {
    calls: Arc<Mutex<Vec<MotorCall>>>,
    angle: Arc<Mutex<i32>>,
    should_fail: Arc<AtomicBool>,
}

impl MockMotor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_angle(angle: i32) -> Self {
        let motor = Self::default();
        motor.set_angle(angle);
        motor
    }

    pub fn calls(&self) -> Vec<MotorCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_angle(&self, deg: i32) {
        *self.angle.lock().unwrap() = deg;
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::Relaxed);
    }
}

impl Motor for MockMotor {
    fn run(&mut self, speed_deg_s: i32) -> Result<(), HwError> {
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(injected_failure());
        }
        self.calls.lock().unwrap().push(MotorCall::Run(speed_deg_s));
        Ok(())
    }

    fn brake(&mut self) -> Result<(), HwError> {
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(injected_failure());
        }
        self.calls.lock().unwrap().push(MotorCall::Brake);
        Ok(())
    }

    fn angle(&mut self) -> Result<i32, HwError> {
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(injected_failure());
        }
        Ok(*self.angle.lock().unwrap())
    }
}

/// Mock 超声传感器
#[derive(Debug, Clone)]
pub struct MockRangeSensor {
    distance_mm: Arc<Mutex<i32>>,
    should_fail: Arc<AtomicBool>,
}

impl MockRangeSensor {
    pub fn new(distance_mm: i32) -> Self {
        Self {
            distance_mm: Arc::new(Mutex::new(distance_mm)),
            should_fail: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_distance(&self, distance_mm: i32) {
        *self.distance_mm.lock().unwrap() = distance_mm;
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::Relaxed);
    }
}

impl RangeSensor for MockRangeSensor {
    fn distance_mm(&mut self) -> Result<i32, HwError> {
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(injected_failure());
        }
        Ok(*self.distance_mm.lock().unwrap())
    }
}

/// Mock 颜色传感器
#[derive(Debug, Clone)]
pub struct MockColorSensor {
    name: Arc<Mutex<String>>,
    reflection: Arc<Mutex<i32>>,
}

impl MockColorSensor {
    pub fn new(name: &str, reflection: i32) -> Self {
        Self {
            name: Arc::new(Mutex::new(name.to_string())),
            reflection: Arc::new(Mutex::new(reflection)),
        }
    }
}

impl ColorSensor for MockColorSensor {
    fn color_name(&mut self) -> Result<String, HwError> {
        Ok(self.name.lock().unwrap().clone())
    }

    fn reflection(&mut self) -> Result<i32, HwError> {
        Ok(*self.reflection.lock().unwrap())
    }
}

/// Mock 陀螺仪：`reset` 把角度归零并计数
#[derive(Debug, Clone, Default)]
pub struct MockGyro {
    angle: Arc<Mutex<i32>>,
    resets: Arc<AtomicUsize>,
}

impl MockGyro {
    pub fn new(angle: i32) -> Self {
        Self {
            angle: Arc::new(Mutex::new(angle)),
            resets: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_angle(&self, deg: i32) {
        *self.angle.lock().unwrap() = deg;
    }

    pub fn current_angle(&self) -> i32 {
        *self.angle.lock().unwrap()
    }

    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::Relaxed)
    }
}

impl Gyro for MockGyro {
    fn angle(&mut self) -> Result<i32, HwError> {
        Ok(*self.angle.lock().unwrap())
    }

    fn reset(&mut self) -> Result<(), HwError> {
        *self.angle.lock().unwrap() = 0;
        self.resets.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// 指示灯调用记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightCall {
    Set(LedColor),
    Off,
}

/// Mock 状态灯
#[derive(Debug, Clone, Default)]
pub struct MockLight {
    calls: Arc<Mutex<Vec<LightCall>>>,
}

impl MockLight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<LightCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl StatusLight for MockLight {
    fn set_color(&mut self, color: LedColor) -> Result<(), HwError> {
        self.calls.lock().unwrap().push(LightCall::Set(color));
        Ok(())
    }

    fn off(&mut self) -> Result<(), HwError> {
        self.calls.lock().unwrap().push(LightCall::Off);
        Ok(())
    }
}

/// Mock 扬声器：按顺序记录 (频率, 时长)
#[derive(Debug, Clone, Default)]
pub struct MockSpeaker {
    tones: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl MockSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tones(&self) -> Vec<(u32, u32)> {
        self.tones.lock().unwrap().clone()
    }
}

impl Speaker for MockSpeaker {
    fn tone(&mut self, freq_hz: u32, duration_ms: u32) -> Result<(), HwError> {
        self.tones.lock().unwrap().push((freq_hz, duration_ms));
        Ok(())
    }
}
