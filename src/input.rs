// 该文件是 Neurodot 项目的一部分。
// src/input.rs - 图像采集
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

use thiserror::Error;

use crate::{FromUrl, frame::RgbFrame, preprocess::luma};

/// 采集参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
  pub width: u32,
  pub height: u32,
  /// 输出黑白图像（三个通道取相同值）
  pub monochrome: bool,
}

impl Default for CaptureConfig {
  fn default() -> Self {
    Self {
      width: 128,
      height: 112,
      monochrome: false,
    }
  }
}

pub trait CaptureSource {
  fn configure(&mut self, config: &CaptureConfig) -> Result<(), CaptureError>;
  fn capture(&mut self) -> Result<RgbFrame, CaptureError>;
}

#[cfg(feature = "read_image_file")]
mod read_image_file;
#[cfg(feature = "read_image_file")]
pub use self::read_image_file::ImageFileInput;

#[cfg(feature = "v4l_input")]
mod v4l_input;
#[cfg(feature = "v4l_input")]
pub use self::v4l_input::V4lInput;

#[derive(Error, Debug)]
pub enum CaptureError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
  #[error("路径编码无效: {0}")]
  PathEncoding(#[from] std::string::FromUtf8Error),
  #[cfg(feature = "read_image_file")]
  #[error("图像加载错误: {0}")]
  Image(#[from] image::ImageError),
  #[error("V4L 错误: {0}")]
  V4l(String),
  #[error("不支持的像素格式: {0}")]
  UnsupportedPixelFormat(String),
  #[error("帧尺寸错误: {0}")]
  FrameSize(#[from] crate::frame::FrameError),
}

/// 就地转为黑白，保持三通道排布
pub(crate) fn desaturate(rgb: &mut [u8]) {
  for px in rgb.chunks_exact_mut(3) {
    let y = luma(px[0], px[1], px[2]);
    px.fill(y);
  }
}

pub enum InputWrapper {
  #[cfg(feature = "v4l_input")]
  V4l(V4lInput),
  #[cfg(feature = "read_image_file")]
  ReadImageFile(ImageFileInput),
}

impl FromUrl for InputWrapper {
  type Error = CaptureError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "v4l_input")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == V4lInput::SCHEME {
        return Ok(InputWrapper::V4l(V4lInput::from_url(url)?));
      }
    }
    #[cfg(feature = "read_image_file")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == ImageFileInput::SCHEME {
        return Ok(InputWrapper::ReadImageFile(ImageFileInput::from_url(url)?));
      }
    }
    Err(CaptureError::SchemeMismatch)
  }
}

impl CaptureSource for InputWrapper {
  fn configure(&mut self, config: &CaptureConfig) -> Result<(), CaptureError> {
    match self {
      #[cfg(feature = "v4l_input")]
      InputWrapper::V4l(input) => input.configure(config),
      #[cfg(feature = "read_image_file")]
      InputWrapper::ReadImageFile(input) => input.configure(config),
    }
  }

  fn capture(&mut self) -> Result<RgbFrame, CaptureError> {
    match self {
      #[cfg(feature = "v4l_input")]
      InputWrapper::V4l(input) => input.capture(),
      #[cfg(feature = "read_image_file")]
      InputWrapper::ReadImageFile(input) => input.capture(),
    }
  }
}
