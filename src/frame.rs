// 该文件是 Neurodot 项目的一部分。
// src/frame.rs - 帧定义
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

pub const RGB_CHANNELS: usize = 3;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
  #[error("数据长度不匹配: 期望长度 {expected}, 实际长度 {actual}")]
  LengthMismatch { expected: usize, actual: usize },
}

/// 像素通道排布
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelLayout {
  /// 交错排布 (HWC)，摄像头与图像文件的默认输出
  #[default]
  Nhwc,
  /// 平面排布 (CHW)
  Nchw,
}

/// 摄像头采集得到的一帧 RGB 图像，采集后不可变
#[derive(Debug, Clone)]
pub struct RgbFrame {
  width: usize,
  height: usize,
  layout: ChannelLayout,
  data: Box<[u8]>,
}

impl RgbFrame {
  pub fn new(
    width: usize,
    height: usize,
    layout: ChannelLayout,
    data: Vec<u8>,
  ) -> Result<Self, FrameError> {
    let expected = RGB_CHANNELS * width * height;
    if data.len() != expected {
      return Err(FrameError::LengthMismatch {
        expected,
        actual: data.len(),
      });
    }

    Ok(Self {
      width,
      height,
      layout,
      data: data.into_boxed_slice(),
    })
  }

  /// 所有像素取同一颜色
  pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
    let data = rgb
      .iter()
      .copied()
      .cycle()
      .take(RGB_CHANNELS * width * height)
      .collect::<Vec<_>>();
    Self {
      width,
      height,
      layout: ChannelLayout::Nhwc,
      data: data.into_boxed_slice(),
    }
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  /// 读取 (x, y) 处的 RGB 值
  pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
    match self.layout {
      ChannelLayout::Nhwc => {
        let base = (y * self.width + x) * RGB_CHANNELS;
        [self.data[base], self.data[base + 1], self.data[base + 2]]
      }
      ChannelLayout::Nchw => {
        let plane = self.width * self.height;
        let offset = y * self.width + x;
        [
          self.data[offset],
          self.data[plane + offset],
          self.data[2 * plane + offset],
        ]
      }
    }
  }
}

/// 预处理后的单通道输入，送入推理引擎
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayFrame {
  width: usize,
  height: usize,
  data: Box<[u8]>,
}

impl GrayFrame {
  pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, FrameError> {
    let expected = width * height;
    if data.len() != expected {
      return Err(FrameError::LengthMismatch {
        expected,
        actual: data.len(),
      });
    }

    Ok(Self {
      width,
      height,
      data: data.into_boxed_slice(),
    })
  }

  pub(crate) fn from_samples(width: usize, height: usize, data: Vec<u8>) -> Self {
    debug_assert_eq!(data.len(), width * height);
    Self {
      width,
      height,
      data: data.into_boxed_slice(),
    }
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.data
  }

  /// 缩放到 [0, 1] 的浮点样本
  pub fn to_unit_f32(&self) -> Vec<f32> {
    self.data.iter().map(|&v| v as f32 / 255.0).collect()
  }

  pub fn mean(&self) -> f32 {
    if self.data.is_empty() {
      return 0.0;
    }
    let sum: u64 = self.data.iter().map(|&v| v as u64).sum();
    sum as f32 / self.data.len() as f32
  }
}
