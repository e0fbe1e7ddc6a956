// 该文件是 Neurodot 项目的一部分。
// src/engine.rs - 神经网络引擎接口
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

use std::{fmt, path::PathBuf};

use thiserror::Error;

use crate::frame::GrayFrame;

#[derive(Error, Debug)]
pub enum EngineError {
  #[error("模型加载错误: {0}")]
  Load(String),
  #[error("模型尚未加载")]
  NotLoaded,
  #[error("训练错误: {0}")]
  Train(String),
  #[error("推理错误: {0}")]
  Infer(String),
}

/// 一组模型文件：拓扑与权重
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
  pub topology: PathBuf,
  pub weights: PathBuf,
}

impl ModelPaths {
  pub fn new(topology: impl Into<PathBuf>, weights: impl Into<PathBuf>) -> Self {
    Self {
      topology: topology.into(),
      weights: weights.into(),
    }
  }
}

/// 一次训练任务的参数，进度由引擎内部维护
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingJob {
  pub dataset: PathBuf,
  pub epochs: u32,
  pub batch_size: u32,
}

/// 识别结果，可能为空
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognitionResult(String);

impl RecognitionResult {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<String> for RecognitionResult {
  fn from(value: String) -> Self {
    Self(value)
  }
}

impl From<&str> for RecognitionResult {
  fn from(value: &str) -> Self {
    Self(value.to_string())
  }
}

impl fmt::Display for RecognitionResult {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// 神经网络引擎
///
/// 推理方法取 `&mut self`，训练取 `&self`：训练进行中引擎只能被共享借用，
/// 因此同一个引擎上推理与训练不可能同时发生。`train_progress` 必须在
/// `train` 执行期间可以从其他线程安全调用。
pub trait Engine: Sync {
  /// 加载模型；必须在其他操作之前调用
  fn init(&mut self, model: &ModelPaths) -> Result<(), EngineError>;

  /// 释放模型；幂等，`init` 部分失败后也可调用
  fn uninit(&mut self);

  fn is_loaded(&self) -> bool;

  /// 将网络输出写入 `out`
  fn infer(&mut self, input: &GrayFrame, out: &mut [f32]) -> Result<(), EngineError>;

  fn recognize(&mut self, input: &GrayFrame) -> Result<RecognitionResult, EngineError>;

  /// 阻塞直到训练结束
  fn train(&self, job: &TrainingJob) -> Result<(), EngineError>;

  /// 当前训练进度百分比 [0, 100]
  fn train_progress(&self) -> u8;
}

mod session;
pub use self::session::ModelSession;

mod simulated;
pub use self::simulated::{SimulatedEngine, SimulatedEngineError};

#[cfg(test)]
pub(crate) mod mock;
