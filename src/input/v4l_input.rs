// 该文件是 Neurodot 项目的一部分。
// src/input/v4l_input.rs - V4L 摄像头输入
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

use std::{thread, time::Duration};

use tracing::{debug, error, info};
use url::Url;
use v4l::{FourCC, buffer::Type, io::mmap::Stream, io::traits::CaptureStream, video::Capture};

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::{ChannelLayout, RgbFrame},
  input::{CaptureConfig, CaptureError, CaptureSource, desaturate},
};

const RGB3: &[u8; 4] = b"RGB3";
const STREAM_BUFFERS: u32 = 4;
/// 摄像头上电后的预热时间
const WARMUP: Duration = Duration::from_millis(100);

pub struct V4lInput {
  device: v4l::Device,
  device_path: String,
  width: u32,
  height: u32,
  monochrome: bool,
}

impl FromUrlWithScheme for V4lInput {
  const SCHEME: &'static str = "v4l";
}

impl FromUrl for V4lInput {
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

    // v4l:///dev/video0
    let device_path = if url.path().is_empty() || url.path() == "/" {
      "/dev/video0".to_string()
    } else {
      url.path().to_string()
    };

    info!("打开摄像头: {}", device_path);
    let device = v4l::Device::with_path(&device_path)?;
    let format = device.format()?;
    debug!(
      "摄像头当前格式: {}x{} {}",
      format.width, format.height, format.fourcc
    );
    thread::sleep(WARMUP);

    Ok(V4lInput {
      device,
      device_path,
      width: format.width,
      height: format.height,
      monochrome: false,
    })
  }
}

impl CaptureSource for V4lInput {
  fn configure(&mut self, config: &CaptureConfig) -> Result<(), CaptureError> {
    let mut format = self.device.format()?;
    format.width = config.width;
    format.height = config.height;
    format.fourcc = FourCC::new(RGB3);

    let applied = self.device.set_format(&format)?;
    if applied.fourcc != FourCC::new(RGB3) {
      return Err(CaptureError::UnsupportedPixelFormat(applied.fourcc.to_string()));
    }
    if (applied.width, applied.height) != (config.width, config.height) {
      info!(
        "{} 不支持 {}x{}，实际分辨率 {}x{}",
        self.device_path, config.width, config.height, applied.width, applied.height
      );
    }

    self.width = applied.width;
    self.height = applied.height;
    self.monochrome = config.monochrome;
    Ok(())
  }

  fn capture(&mut self) -> Result<RgbFrame, CaptureError> {
    let mut stream = Stream::with_buffers(&mut self.device, Type::VideoCapture, STREAM_BUFFERS)?;
    let (buf, meta) = stream.next()?;

    let expected = 3 * self.width as usize * self.height as usize;
    let used = (meta.bytesused as usize).min(buf.len());
    if used < expected {
      return Err(CaptureError::V4l(format!(
        "帧数据不完整: 期望 {} 字节, 实际 {} 字节",
        expected, used
      )));
    }

    let mut data = buf[..expected].to_vec();
    if self.monochrome {
      desaturate(&mut data);
    }
    Ok(RgbFrame::new(
      self.width as usize,
      self.height as usize,
      ChannelLayout::Nhwc,
      data,
    )?)
  }
}
