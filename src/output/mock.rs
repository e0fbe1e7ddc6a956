// 该文件是 Neurodot 项目的一部分。
// src/output/mock.rs - 测试用显示设备
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

use std::sync::{Arc, Mutex};

use crate::output::{DisplayError, DisplaySink};

#[derive(Default)]
struct Log {
  calls: Vec<String>,
  shown: Vec<String>,
}

/// 记录所有调用的显示设备；克隆体共享同一份记录
#[derive(Default, Clone)]
pub(crate) struct RecordingDisplay {
  log: Arc<Mutex<Log>>,
  buffer: String,
  fail_after: Option<usize>,
}

impl RecordingDisplay {
  /// 成功显示 `n` 次后，之后的 `show` 都返回错误
  pub(crate) fn fail_after(mut self, n: usize) -> Self {
    self.fail_after = Some(n);
    self
  }

  pub(crate) fn calls(&self) -> Vec<String> {
    self.log.lock().unwrap().calls.clone()
  }

  pub(crate) fn shown(&self) -> Vec<String> {
    self.log.lock().unwrap().shown.clone()
  }
}

impl DisplaySink for RecordingDisplay {
  fn clear(&mut self) -> Result<(), DisplayError> {
    self.buffer.clear();
    self.log.lock().unwrap().calls.push("clear".to_string());
    Ok(())
  }

  fn write_string(&mut self, text: &str, _kerning: bool) -> Result<(), DisplayError> {
    self.buffer.push_str(text);
    self.log.lock().unwrap().calls.push(format!("write:{text}"));
    Ok(())
  }

  fn show(&mut self) -> Result<(), DisplayError> {
    let mut log = self.log.lock().unwrap();
    if self.fail_after.is_some_and(|n| log.shown.len() >= n) {
      return Err(DisplayError::Disconnected);
    }
    log.calls.push("show".to_string());
    log.shown.push(self.buffer.clone());
    Ok(())
  }
}
