// 该文件是 Neurodot 项目的一部分。
// src/output.rs - 文字显示输出
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

use std::fmt;

use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme};

/// 点阵显示屏的字符宽度
pub const DEVICE_WIDTH: usize = 6;

#[derive(Error, Debug)]
pub enum DisplayError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("路径编码无效: {0}")]
  PathEncoding(#[from] std::string::FromUtf8Error),
  #[cfg(feature = "record_output")]
  #[error("序列化错误: {0}")]
  Json(#[from] serde_json::Error),
  #[error("显示设备已断开")]
  Disconnected,
}

/// 一次完整的显示内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMessage(String);

impl DisplayMessage {
  pub fn new(text: impl Into<String>) -> Self {
    Self(text.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// 截断到显示宽度（按字符计）
  pub fn clipped(&self, width: usize) -> DisplayMessage {
    DisplayMessage(self.0.chars().take(width).collect())
  }
}

impl fmt::Display for DisplayMessage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// 文字显示设备
///
/// `clear`、`write_string` 只修改缓冲区，`show` 才让内容可见。
pub trait DisplaySink {
  fn width(&self) -> usize {
    DEVICE_WIDTH
  }

  fn clear(&mut self) -> Result<(), DisplayError>;
  fn write_string(&mut self, text: &str, kerning: bool) -> Result<(), DisplayError>;
  fn show(&mut self) -> Result<(), DisplayError>;

  /// 清屏、写入、显示，作为一次可见更新
  fn render(&mut self, message: &DisplayMessage) -> Result<(), DisplayError> {
    let message = message.clipped(self.width());
    self.clear()?;
    self.write_string(message.as_str(), false)?;
    self.show()
  }
}

pub mod format;

mod console;
pub use self::console::ConsoleDisplay;

#[cfg(feature = "record_output")]
mod record;
#[cfg(feature = "record_output")]
pub use self::record::RecordDisplay;

#[cfg(test)]
pub(crate) mod mock;

/// 状态输出
///
/// 显示设备是可选的；设备出错后会被丢弃，之后只输出到日志。
pub struct StatusChannel<D: DisplaySink> {
  display: Option<D>,
}

impl<D: DisplaySink> StatusChannel<D> {
  pub fn new(display: Option<D>) -> Self {
    if display.is_none() {
      info!("没有显示设备，状态将输出到日志");
    }
    Self { display }
  }

  pub fn has_display(&self) -> bool {
    self.display.is_some()
  }

  /// 状态总是写入日志；有显示设备时同时显示
  pub fn post(&mut self, message: &DisplayMessage) {
    info!("状态: {}", message);
    let Some(display) = self.display.as_mut() else {
      return;
    };

    if let Err(e) = display.render(message) {
      warn!("显示设备不可用，改用日志输出: {}", e);
      self.display = None;
    }
  }
}

pub enum OutputWrapper {
  Console(ConsoleDisplay),
  #[cfg(feature = "record_output")]
  Record(RecordDisplay),
}

impl FromUrl for OutputWrapper {
  type Error = DisplayError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() == <ConsoleDisplay as FromUrlWithScheme>::SCHEME {
      return Ok(OutputWrapper::Console(ConsoleDisplay::from_url(url)?));
    }
    #[cfg(feature = "record_output")]
    {
      if url.scheme() == RecordDisplay::SCHEME {
        return Ok(OutputWrapper::Record(RecordDisplay::from_url(url)?));
      }
    }
    Err(DisplayError::SchemeMismatch)
  }
}

impl DisplaySink for OutputWrapper {
  fn width(&self) -> usize {
    match self {
      OutputWrapper::Console(output) => output.width(),
      #[cfg(feature = "record_output")]
      OutputWrapper::Record(output) => output.width(),
    }
  }

  fn clear(&mut self) -> Result<(), DisplayError> {
    match self {
      OutputWrapper::Console(output) => output.clear(),
      #[cfg(feature = "record_output")]
      OutputWrapper::Record(output) => output.clear(),
    }
  }

  fn write_string(&mut self, text: &str, kerning: bool) -> Result<(), DisplayError> {
    match self {
      OutputWrapper::Console(output) => output.write_string(text, kerning),
      #[cfg(feature = "record_output")]
      OutputWrapper::Record(output) => output.write_string(text, kerning),
    }
  }

  fn show(&mut self) -> Result<(), DisplayError> {
    match self {
      OutputWrapper::Console(output) => output.show(),
      #[cfg(feature = "record_output")]
      OutputWrapper::Record(output) => output.show(),
    }
  }
}

/// 启动时探测显示设备，失败时返回 `None`
pub fn probe_display(url: Option<&Url>) -> Option<OutputWrapper> {
  let url = url?;
  match OutputWrapper::from_url(url) {
    Ok(output) => {
      info!("显示设备: {}", url);
      Some(output)
    }
    Err(e) => {
      warn!("无法打开显示设备 {}: {}", url, e);
      None
    }
  }
}
