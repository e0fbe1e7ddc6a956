// 该文件是 Neurodot 项目的一部分。
// src/task/recognize.rs - 连续识别循环
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

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  engine::{Engine, EngineError, ModelPaths, ModelSession, RecognitionResult},
  frame::{GrayFrame, RgbFrame},
  input::{CaptureConfig, CaptureError, CaptureSource},
  output::{
    DisplaySink, StatusChannel,
    format::{FILLER, Indicator, RESULT_WIDTH, countdown_label, fit_width, indicator_label},
  },
  preprocess::to_gray,
  task::{StopToken, Task, Ticker},
};

/// 每轮倒计时的节拍数
pub const COUNTDOWN_TICKS: u8 = 10;
/// 采集后等待画面稳定的节拍数
const SETTLE_TICKS: u32 = 1;
/// 结果保持显示的节拍数
const HOLD_TICKS: u32 = 2;
/// 尚无识别结果时的占位文本
const PLACEHOLDER: &str = "xxxx";

#[derive(Error, Debug)]
pub enum RecognitionError {
  #[error("采集失败: {0}")]
  Capture(#[from] CaptureError),
  #[error("引擎错误: {0}")]
  Engine(#[from] EngineError),
}

#[derive(Debug, Clone)]
pub enum RecognitionState {
  CountingDown(u8),
  Capturing,
  Preprocessing(RgbFrame),
  Inferring(GrayFrame),
  Formatting(RecognitionResult),
  Displaying(String),
}

impl RecognitionState {
  pub fn name(&self) -> &'static str {
    match self {
      RecognitionState::CountingDown(_) => "CountingDown",
      RecognitionState::Capturing => "Capturing",
      RecognitionState::Preprocessing(_) => "Preprocessing",
      RecognitionState::Inferring(_) => "Inferring",
      RecognitionState::Formatting(_) => "Formatting",
      RecognitionState::Displaying(_) => "Displaying",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionReport {
  pub cycles: u64,
  pub last: String,
}

/// 识别状态机；每次 `step` 完成一个状态并转移到下一个
pub struct RecognitionMachine<'a, C, E, D, T>
where
  C: CaptureSource,
  E: Engine,
  D: DisplaySink,
  T: Ticker,
{
  capture: &'a mut C,
  engine: &'a mut E,
  status: &'a mut StatusChannel<D>,
  ticker: &'a mut T,
  stop: StopToken,
  countdown: u8,
  state: RecognitionState,
  last: String,
  cycles: u64,
}

impl<'a, C, E, D, T> RecognitionMachine<'a, C, E, D, T>
where
  C: CaptureSource,
  E: Engine,
  D: DisplaySink,
  T: Ticker,
{
  pub fn new(
    capture: &'a mut C,
    engine: &'a mut E,
    status: &'a mut StatusChannel<D>,
    ticker: &'a mut T,
    stop: StopToken,
  ) -> Self {
    Self {
      capture,
      engine,
      status,
      ticker,
      stop,
      countdown: COUNTDOWN_TICKS,
      state: RecognitionState::CountingDown(COUNTDOWN_TICKS),
      last: PLACEHOLDER.to_string(),
      cycles: 0,
    }
  }

  /// 倒计时显示为一位数字，超过 `COUNTDOWN_TICKS` 时截断
  pub fn with_countdown(mut self, countdown: u8) -> Self {
    if countdown > COUNTDOWN_TICKS {
      warn!("倒计时 {} 过长，改为 {}", countdown, COUNTDOWN_TICKS);
    }
    let countdown = countdown.min(COUNTDOWN_TICKS);
    self.countdown = countdown;
    self.state = RecognitionState::CountingDown(countdown);
    self
  }

  pub fn state(&self) -> &RecognitionState {
    &self.state
  }

  pub fn last(&self) -> &str {
    &self.last
  }

  pub fn cycles(&self) -> u64 {
    self.cycles
  }

  /// 执行当前状态；等待被停止时保持在原状态
  pub fn step(&mut self) -> Result<(), RecognitionError> {
    let state = std::mem::replace(&mut self.state, RecognitionState::Capturing);
    self.state = match state {
      RecognitionState::CountingDown(0) => {
        if !self.ticker.wait(1, &self.stop) {
          RecognitionState::CountingDown(0)
        } else {
          RecognitionState::Capturing
        }
      }
      RecognitionState::CountingDown(n) => {
        if !self.ticker.wait(1, &self.stop) {
          RecognitionState::CountingDown(n)
        } else {
          self.status.post(&countdown_label(&self.last, n - 1));
          RecognitionState::CountingDown(n - 1)
        }
      }
      RecognitionState::Capturing => {
        self
          .status
          .post(&indicator_label(&self.last, Indicator::Capturing));
        let frame = self.capture.capture()?;
        debug!("采集完成: {}x{}", frame.width(), frame.height());
        self.ticker.wait(SETTLE_TICKS, &self.stop);
        RecognitionState::Preprocessing(frame)
      }
      RecognitionState::Preprocessing(frame) => RecognitionState::Inferring(to_gray(&frame)),
      RecognitionState::Inferring(input) => {
        self
          .status
          .post(&indicator_label(&self.last, Indicator::Computing));
        let now = Instant::now();
        let result = self.engine.recognize(&input)?;
        info!("识别结果: {:?}, 耗时: {:.2?}", result.as_str(), now.elapsed());
        RecognitionState::Formatting(result)
      }
      RecognitionState::Formatting(result) => {
        let formatted = fit_width(result.as_str(), RESULT_WIDTH, FILLER);
        self
          .status
          .post(&indicator_label(&formatted, Indicator::Ready));
        RecognitionState::Displaying(formatted)
      }
      RecognitionState::Displaying(formatted) => {
        self.ticker.wait(HOLD_TICKS, &self.stop);
        self.last = formatted;
        self.cycles += 1;
        RecognitionState::CountingDown(self.countdown)
      }
    };
    Ok(())
  }

  /// 循环直到停止、出错或达到 `max_cycles`
  pub fn run(&mut self, max_cycles: Option<u64>) -> Result<RecognitionReport, RecognitionError> {
    self
      .status
      .post(&indicator_label(&self.last, Indicator::Capturing));

    while !self.stop.is_stopped() {
      if max_cycles.is_some_and(|n| self.cycles >= n) {
        info!("达到指定轮数 {}, 退出识别循环", self.cycles);
        break;
      }
      debug!("识别状态: {}", self.state.name());
      self.step()?;
    }

    if self.stop.is_stopped() {
      warn!("停止信号接收，退出识别循环");
    }
    Ok(RecognitionReport {
      cycles: self.cycles,
      last: self.last.clone(),
    })
  }
}

/// 加载模型并运行识别循环
pub struct RecognitionLoop<T: Ticker> {
  model: ModelPaths,
  capture: CaptureConfig,
  ticker: T,
  stop: StopToken,
  countdown: u8,
  max_cycles: Option<u64>,
}

impl<T: Ticker> RecognitionLoop<T> {
  pub fn new(model: ModelPaths, capture: CaptureConfig, ticker: T) -> Self {
    Self {
      model,
      capture,
      ticker,
      stop: StopToken::default(),
      countdown: COUNTDOWN_TICKS,
      max_cycles: None,
    }
  }

  pub fn with_stop_token(mut self, stop: StopToken) -> Self {
    self.stop = stop;
    self
  }

  pub fn with_countdown(mut self, countdown: u8) -> Self {
    self.countdown = countdown;
    self
  }

  pub fn with_max_cycles(mut self, max_cycles: Option<u64>) -> Self {
    self.max_cycles = max_cycles;
    self
  }

  /// 模型在返回前释放，包括采集失败的情况
  pub fn run<C, E, D>(
    &mut self,
    capture: &mut C,
    engine: &mut E,
    status: &mut StatusChannel<D>,
  ) -> Result<RecognitionReport, RecognitionError>
  where
    C: CaptureSource,
    E: Engine,
    D: DisplaySink,
  {
    let mut session = ModelSession::open(engine, &self.model)?;
    capture.configure(&self.capture)?;

    let mut machine = RecognitionMachine::new(
      capture,
      &mut *session,
      status,
      &mut self.ticker,
      self.stop.clone(),
    )
    .with_countdown(self.countdown);
    let report = machine.run(self.max_cycles);
    if let Err(e) = &report {
      warn!("识别循环中止: {}", e);
    }
    report
  }
}

impl<'a, C, E, D, T> Task<&'a mut C, &'a mut E, &'a mut StatusChannel<D>> for RecognitionLoop<T>
where
  C: CaptureSource,
  E: Engine,
  D: DisplaySink,
  T: Ticker,
{
  type Output = RecognitionReport;
  type Error = anyhow::Error;

  fn run_task(
    mut self,
    input: &'a mut C,
    model: &'a mut E,
    output: &'a mut StatusChannel<D>,
  ) -> Result<Self::Output, Self::Error> {
    Ok(self.run(input, model, output)?)
  }
}
