// 该文件是 Neurodot 项目的一部分。
// src/engine/mock.rs - 测试用脚本引擎
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
  sync::atomic::{AtomicU8, Ordering},
  thread,
  time::Duration,
};

use crate::{
  engine::{Engine, EngineError, ModelPaths, RecognitionResult, TrainingJob},
  frame::GrayFrame,
};

/// 按脚本运行的引擎，记录调用次数
#[derive(Default)]
pub(crate) struct ScriptedEngine {
  loaded: bool,
  init_calls: usize,
  uninit_calls: usize,
  fail_init: bool,
  fail_train: bool,
  answer: String,
  steps: u8,
  step_delay: Duration,
  progress: AtomicU8,
  pub(crate) inputs: Vec<GrayFrame>,
}

impl ScriptedEngine {
  pub(crate) fn fail_init(mut self) -> Self {
    self.fail_init = true;
    self
  }

  pub(crate) fn fail_train(mut self) -> Self {
    self.fail_train = true;
    self
  }

  pub(crate) fn with_answer(mut self, answer: &str) -> Self {
    self.answer = answer.to_string();
    self
  }

  pub(crate) fn with_steps(mut self, steps: u8, step_delay: Duration) -> Self {
    self.steps = steps;
    self.step_delay = step_delay;
    self
  }

  pub(crate) fn init_calls(&self) -> usize {
    self.init_calls
  }

  pub(crate) fn uninit_calls(&self) -> usize {
    self.uninit_calls
  }
}

impl Engine for ScriptedEngine {
  fn init(&mut self, _model: &ModelPaths) -> Result<(), EngineError> {
    self.init_calls += 1;
    if self.fail_init {
      return Err(EngineError::Load("脚本要求加载失败".to_string()));
    }
    self.loaded = true;
    Ok(())
  }

  fn uninit(&mut self) {
    self.uninit_calls += 1;
    self.loaded = false;
  }

  fn is_loaded(&self) -> bool {
    self.loaded
  }

  fn infer(&mut self, input: &GrayFrame, out: &mut [f32]) -> Result<(), EngineError> {
    if !self.loaded {
      return Err(EngineError::NotLoaded);
    }
    out.fill(input.mean());
    self.inputs.push(input.clone());
    Ok(())
  }

  fn recognize(&mut self, input: &GrayFrame) -> Result<RecognitionResult, EngineError> {
    if !self.loaded {
      return Err(EngineError::NotLoaded);
    }
    self.inputs.push(input.clone());
    Ok(RecognitionResult::from(self.answer.as_str()))
  }

  fn train(&self, _job: &TrainingJob) -> Result<(), EngineError> {
    if !self.loaded {
      return Err(EngineError::NotLoaded);
    }
    self.progress.store(0, Ordering::Release);
    let steps = self.steps.max(1);
    for step in 1..=steps {
      thread::sleep(self.step_delay);
      if self.fail_train && step > steps / 2 {
        return Err(EngineError::Train("脚本要求训练失败".to_string()));
      }
      let percent = (step as u32 * 100 / steps as u32) as u8;
      self.progress.fetch_max(percent, Ordering::AcqRel);
    }
    Ok(())
  }

  fn train_progress(&self) -> u8 {
    self.progress.load(Ordering::Acquire)
  }
}
