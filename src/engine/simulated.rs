// 该文件是 Neurodot 项目的一部分。
// src/engine/simulated.rs - 模拟引擎
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
  path::Path,
  sync::atomic::{AtomicU8, Ordering},
  thread,
  time::Duration,
};

use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  engine::{Engine, EngineError, ModelPaths, RecognitionResult, TrainingJob},
  frame::GrayFrame,
};

const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(100);
const DIGIT_CLASSES: usize = 10;

#[derive(Error, Debug)]
pub enum SimulatedEngineError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("参数 {0} 无效: {1}")]
  InvalidParameter(String, String),
}

/// 在没有真实引擎的机器上替代外部引擎
///
/// 训练按样本数与批大小推进进度，推理根据输入平均亮度给出一个数字。
/// 通过 `answer` 参数可以固定识别结果。
pub struct SimulatedEngine {
  model: Option<ModelPaths>,
  answer: Option<String>,
  step_delay: Duration,
  progress: AtomicU8,
}

impl Default for SimulatedEngine {
  fn default() -> Self {
    Self {
      model: None,
      answer: None,
      step_delay: DEFAULT_STEP_DELAY,
      progress: AtomicU8::new(0),
    }
  }
}

impl FromUrlWithScheme for SimulatedEngine {
  const SCHEME: &'static str = "sim";
}

impl FromUrl for SimulatedEngine {
  type Error = SimulatedEngineError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(SimulatedEngineError::SchemeMismatch);
    }

    let mut engine = SimulatedEngine::default();
    for (k, v) in url.query_pairs() {
      match &*k {
        "answer" => engine.answer = Some(v.into_owned()),
        "step_ms" => {
          let ms = v.parse::<u64>().map_err(|e| {
            SimulatedEngineError::InvalidParameter(k.to_string(), e.to_string())
          })?;
          engine.step_delay = Duration::from_millis(ms);
        }
        _ => warn!("忽略未知参数: {}={}", k, v),
      }
    }
    Ok(engine)
  }
}

impl SimulatedEngine {
  pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
    self.answer = Some(answer.into());
    self
  }

  pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
    self.step_delay = step_delay;
    self
  }

  fn class_of(&self, input: &GrayFrame) -> usize {
    match self.answer.as_deref().and_then(|a| a.chars().find_map(|c| c.to_digit(10))) {
      Some(digit) => digit as usize,
      None => {
        let samples = input.to_unit_f32();
        let level = samples.iter().sum::<f32>() / samples.len().max(1) as f32;
        ((level * DIGIT_CLASSES as f32) as usize).min(DIGIT_CLASSES - 1)
      }
    }
  }
}

fn check_model_file(path: &Path) -> Result<(), EngineError> {
  let meta = std::fs::metadata(path)
    .map_err(|e| EngineError::Load(format!("{}: {}", path.display(), e)))?;
  if !meta.is_file() {
    return Err(EngineError::Load(format!("{}: 不是普通文件", path.display())));
  }
  if meta.len() == 0 {
    return Err(EngineError::Load(format!("{}: 文件为空", path.display())));
  }
  Ok(())
}

impl Engine for SimulatedEngine {
  fn init(&mut self, model: &ModelPaths) -> Result<(), EngineError> {
    if self.model.is_some() {
      warn!("已有模型加载，先释放旧模型");
      self.uninit();
    }
    check_model_file(&model.topology)?;
    check_model_file(&model.weights)?;
    self.model = Some(model.clone());
    self.progress.store(0, Ordering::Release);
    Ok(())
  }

  fn uninit(&mut self) {
    if let Some(model) = self.model.take() {
      debug!("模拟引擎释放模型: {}", model.weights.display());
    }
  }

  fn is_loaded(&self) -> bool {
    self.model.is_some()
  }

  fn infer(&mut self, input: &GrayFrame, out: &mut [f32]) -> Result<(), EngineError> {
    if self.model.is_none() {
      return Err(EngineError::NotLoaded);
    }
    if out.is_empty() {
      return Err(EngineError::Infer("输出缓冲区为空".to_string()));
    }
    let class = self.class_of(input);
    out.fill(0.0);
    out[class % out.len()] = 1.0;
    Ok(())
  }

  fn recognize(&mut self, input: &GrayFrame) -> Result<RecognitionResult, EngineError> {
    if let Some(answer) = &self.answer {
      if self.model.is_none() {
        return Err(EngineError::NotLoaded);
      }
      return Ok(RecognitionResult::from(answer.as_str()));
    }

    let mut scores = [0.0f32; DIGIT_CLASSES];
    self.infer(input, &mut scores)?;
    let best = scores
      .iter()
      .enumerate()
      .max_by(|a, b| a.1.total_cmp(b.1))
      .map(|(i, _)| i)
      .unwrap_or_default();
    let digit = char::from_digit(best as u32, 10).unwrap_or('?');
    Ok(RecognitionResult::from(digit.to_string()))
  }

  fn train(&self, job: &TrainingJob) -> Result<(), EngineError> {
    if self.model.is_none() {
      return Err(EngineError::NotLoaded);
    }
    if job.epochs == 0 || job.batch_size == 0 {
      return Err(EngineError::Train(format!(
        "轮数与批大小必须为正: epochs={}, batch={}",
        job.epochs, job.batch_size
      )));
    }

    let samples = std::fs::read_to_string(&job.dataset)
      .map_err(|e| EngineError::Train(format!("{}: {}", job.dataset.display(), e)))?
      .lines()
      .filter(|line| !line.trim().is_empty())
      .count() as u64;
    if samples == 0 {
      return Err(EngineError::Train(format!(
        "{}: 没有训练样本",
        job.dataset.display()
      )));
    }

    self.progress.store(0, Ordering::Release);
    let batches = samples.div_ceil(job.batch_size as u64);
    let total = job.epochs as u64 * batches;
    info!(
      "模拟训练: {} 个样本, {} 轮, 每轮 {} 批",
      samples, job.epochs, batches
    );

    for step in 1..=total {
      if !self.step_delay.is_zero() {
        thread::sleep(self.step_delay);
      }
      let percent = (step * 100 / total) as u8;
      self.progress.fetch_max(percent, Ordering::AcqRel);
      if step % batches == 0 {
        debug!("第 {} 轮完成", step / batches);
      }
    }

    self.progress.fetch_max(100, Ordering::AcqRel);
    Ok(())
  }

  fn train_progress(&self) -> u8 {
    self.progress.load(Ordering::Acquire)
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;
  use crate::frame::GrayFrame;

  fn model_files(dir: &tempfile::TempDir) -> ModelPaths {
    let topology = dir.path().join("topology.txt");
    let weights = dir.path().join("weights.bin");
    std::fs::write(&topology, "layer:0:input:28x28\n").unwrap();
    std::fs::write(&weights, [1u8, 2, 3, 4]).unwrap();
    ModelPaths::new(topology, weights)
  }

  fn dataset(dir: &tempfile::TempDir, lines: usize) -> std::path::PathBuf {
    let path = dir.path().join("train.txt");
    let mut file = std::fs::File::create(&path).unwrap();
    for i in 0..lines {
      writeln!(file, "sample-{i}.png {}", i % 10).unwrap();
    }
    path
  }

  #[test]
  fn missing_files_fail_to_load() {
    let mut engine = SimulatedEngine::default();
    let err = engine
      .init(&ModelPaths::new("/nonexistent/topology.txt", "/nonexistent/w.bin"))
      .unwrap_err();
    assert!(matches!(err, EngineError::Load(_)));
    assert!(!engine.is_loaded());
  }

  #[test]
  fn init_uninit_init() {
    let dir = tempfile::tempdir().unwrap();
    let paths = model_files(&dir);
    let mut engine = SimulatedEngine::default();
    engine.init(&paths).unwrap();
    engine.uninit();
    engine.uninit();
    assert!(!engine.is_loaded());
    engine.init(&paths).unwrap();
    assert!(engine.is_loaded());
  }

  #[test]
  fn calls_before_init_are_rejected() {
    let mut engine = SimulatedEngine::default();
    let input = GrayFrame::new(1, 1, vec![0]).unwrap();
    assert!(matches!(engine.recognize(&input), Err(EngineError::NotLoaded)));
    let job = TrainingJob {
      dataset: "train.txt".into(),
      epochs: 1,
      batch_size: 1,
    };
    assert!(matches!(engine.train(&job), Err(EngineError::NotLoaded)));
  }

  #[test]
  fn training_reaches_one_hundred() {
    let dir = tempfile::tempdir().unwrap();
    let paths = model_files(&dir);
    let mut engine = SimulatedEngine::default().with_step_delay(Duration::ZERO);
    engine.init(&paths).unwrap();
    let job = TrainingJob {
      dataset: dataset(&dir, 25),
      epochs: 3,
      batch_size: 10,
    };
    engine.train(&job).unwrap();
    assert_eq!(engine.train_progress(), 100);
  }

  #[test]
  fn zero_epochs_is_a_training_error() {
    let dir = tempfile::tempdir().unwrap();
    let paths = model_files(&dir);
    let mut engine = SimulatedEngine::default();
    engine.init(&paths).unwrap();
    let job = TrainingJob {
      dataset: dataset(&dir, 5),
      epochs: 0,
      batch_size: 10,
    };
    assert!(matches!(engine.train(&job), Err(EngineError::Train(_))));
  }

  #[test]
  fn recognizes_by_brightness() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = SimulatedEngine::default();
    engine.init(&model_files(&dir)).unwrap();
    let dark = GrayFrame::new(2, 1, vec![0, 0]).unwrap();
    let bright = GrayFrame::new(2, 1, vec![255, 255]).unwrap();
    assert_eq!(engine.recognize(&dark).unwrap().as_str(), "0");
    let mid = GrayFrame::new(2, 1, vec![128, 128]).unwrap();
    assert_eq!(engine.recognize(&bright).unwrap().as_str(), "9");
    assert_eq!(engine.recognize(&mid).unwrap().as_str(), "5");
  }

  #[test]
  fn answer_from_url() {
    let url = Url::parse("sim:///?answer=42&step_ms=5").unwrap();
    let engine = SimulatedEngine::from_url(&url).unwrap();
    assert_eq!(engine.answer.as_deref(), Some("42"));
    assert_eq!(engine.step_delay, Duration::from_millis(5));

    let url = Url::parse("v4l:///dev/video0").unwrap();
    assert!(matches!(
      SimulatedEngine::from_url(&url),
      Err(SimulatedEngineError::SchemeMismatch)
    ));
  }
}
