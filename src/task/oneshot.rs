// 该文件是 Neurodot 项目的一部分。
// src/task/oneshot.rs - 单次采集推理
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

use tracing::info;

use crate::{
  engine::{Engine, ModelPaths, ModelSession},
  input::{CaptureConfig, CaptureSource},
  preprocess::to_gray,
  task::{RecognitionError, Task},
};

/// 采集一帧并推理，返回网络输出
pub struct OneShotTask {
  model: ModelPaths,
  capture: CaptureConfig,
  output_len: usize,
}

impl OneShotTask {
  /// 输出长度缺省为 `width * height`
  pub fn new(model: ModelPaths, capture: CaptureConfig) -> Self {
    let output_len = capture.width as usize * capture.height as usize;
    Self {
      model,
      capture,
      output_len,
    }
  }

  pub fn with_output_len(mut self, output_len: usize) -> Self {
    self.output_len = output_len;
    self
  }
}

/// 没有显示设备，输出只写入日志
impl<'a, C, E> Task<&'a mut C, &'a mut E, ()> for OneShotTask
where
  C: CaptureSource,
  E: Engine,
{
  type Output = Vec<f32>;
  type Error = RecognitionError;

  fn run_task(
    self,
    input: &'a mut C,
    model: &'a mut E,
    _output: (),
  ) -> Result<Vec<f32>, Self::Error> {
    info!("开始任务...");
    let mut session = ModelSession::open(model, &self.model)?;
    input.configure(&self.capture)?;

    let frame = input.capture()?;
    info!("输入帧获取成功: {}x{}，开始推理...", frame.width(), frame.height());
    let gray = to_gray(&frame);

    let mut output = vec![0.0f32; self.output_len];
    let now = Instant::now();
    session.infer(&gray, &mut output)?;
    info!("推理完成，耗时: {:.2?}", now.elapsed());

    info!("网络输出 ({} 个值):", output.len());
    let row_len = (self.capture.width as usize).max(1);
    for (row, chunk) in output.chunks(row_len).enumerate() {
      info!("{:>4}: {:?}", row, chunk);
    }
    Ok(output)
  }
}
