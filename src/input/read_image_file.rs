// 该文件是 Neurodot 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
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

use image::{ImageReader, RgbImage, imageops::FilterType};
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{ChannelLayout, RgbFrame},
  input::{CaptureConfig, CaptureError, CaptureSource, desaturate},
  url_file_path,
};

/// 每次采集都返回同一张图片，用于没有摄像头时的台架测试
pub struct ImageFileInput {
  original: RgbImage,
  image: RgbImage,
  monochrome: bool,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = CaptureError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(CaptureError::SchemeMismatch);
    }

    let path = url_file_path(url)?;
    info!("读取图像文件: {}", path.display());
    let image = ImageReader::open(&path)?.decode()?.to_rgb8();
    Ok(ImageFileInput::from(image))
  }
}

impl From<RgbImage> for ImageFileInput {
  fn from(image: RgbImage) -> Self {
    Self {
      original: image.clone(),
      image,
      monochrome: false,
    }
  }
}

impl CaptureSource for ImageFileInput {
  fn configure(&mut self, config: &CaptureConfig) -> Result<(), CaptureError> {
    let (width, height) = self.original.dimensions();
    if (width, height) != (config.width, config.height) {
      debug!(
        "缩放图像: {}x{} -> {}x{}",
        width, height, config.width, config.height
      );
      self.image = image::imageops::resize(
        &self.original,
        config.width,
        config.height,
        FilterType::Triangle,
      );
    } else {
      self.image = self.original.clone();
    }
    self.monochrome = config.monochrome;
    Ok(())
  }

  fn capture(&mut self) -> Result<RgbFrame, CaptureError> {
    let (width, height) = self.image.dimensions();
    let mut data = self.image.as_raw().clone();
    if self.monochrome {
      desaturate(&mut data);
    }
    Ok(RgbFrame::new(
      width as usize,
      height as usize,
      ChannelLayout::Nhwc,
      data,
    )?)
  }
}
