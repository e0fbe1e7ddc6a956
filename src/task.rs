// 该文件是 Neurodot 项目的一部分。
// src/task.rs - 任务定义
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
  thread,
  time::Duration,
};

use tracing::{info, warn};

pub trait Task<I, M, O>: Sized {
  type Output;
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<Self::Output, Self::Error>;
}

/// 收到中断信号后，强制退出前的等待时间
const FORCE_EXIT_AFTER: Duration = Duration::from_secs(30);

/// 协作式停止标志，在状态之间检查
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn stop(&self) {
    self.0.store(true, Ordering::Release);
  }

  pub fn is_stopped(&self) -> bool {
    self.0.load(Ordering::Acquire)
  }

  /// Ctrl-C 时置位；若程序在宽限期内仍未退出则强制退出
  pub fn install_ctrlc(&self) -> Result<(), ctrlc::Error> {
    let token = self.clone();
    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      token.stop();
      thread::spawn(|| {
        thread::sleep(FORCE_EXIT_AFTER);
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })
  }
}

/// 节拍器：识别循环中所有等待都通过它完成
pub trait Ticker {
  /// 等待 `ticks` 个节拍；被停止时提前返回 `false`
  fn wait(&mut self, ticks: u32, stop: &StopToken) -> bool;
}

/// 真实时钟节拍
pub struct SleepTicker {
  tick: Duration,
  slice: Duration,
}

impl SleepTicker {
  pub fn new(tick: Duration) -> Self {
    Self {
      tick,
      slice: Duration::from_millis(50).min(tick),
    }
  }
}

impl Default for SleepTicker {
  fn default() -> Self {
    Self::new(Duration::from_secs(1))
  }
}

impl Ticker for SleepTicker {
  fn wait(&mut self, ticks: u32, stop: &StopToken) -> bool {
    let mut remaining = self.tick * ticks;
    while !remaining.is_zero() {
      if stop.is_stopped() {
        return false;
      }
      let step = self.slice.min(remaining);
      thread::sleep(step);
      remaining -= step;
    }
    !stop.is_stopped()
  }
}

mod oneshot;
pub use self::oneshot::OneShotTask;

mod recognize;
pub use self::recognize::{
  RecognitionError, RecognitionLoop, RecognitionMachine, RecognitionReport, RecognitionState,
};

mod train;
pub use self::train::{SupervisorError, TrainingReport, TrainingState, TrainingSupervisor};

/// 只计数、不等待的节拍器
#[cfg(test)]
#[derive(Default)]
pub(crate) struct CountingTicker {
  pub(crate) ticks: u32,
}

#[cfg(test)]
impl Ticker for CountingTicker {
  fn wait(&mut self, ticks: u32, stop: &StopToken) -> bool {
    self.ticks += ticks;
    !stop.is_stopped()
  }
}
