// 该文件是 Neurodot 项目的一部分。
// src/preprocess.rs - 灰度预处理
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

use crate::frame::{GrayFrame, RgbFrame};

/// RGB 转灰度，权重为 1/4 R + 1/2 G + 1/4 B（四舍五入）
///
/// 中间结果使用 u16，任意 8 位输入都不会溢出。
pub fn to_gray(frame: &RgbFrame) -> GrayFrame {
  let (width, height) = (frame.width(), frame.height());
  let mut data = Vec::with_capacity(width * height);

  for y in 0..height {
    for x in 0..width {
      let [r, g, b] = frame.pixel(x, y);
      data.push(luma(r, g, b));
    }
  }

  GrayFrame::from_samples(width, height, data)
}

#[inline]
pub(crate) fn luma(r: u8, g: u8, b: u8) -> u8 {
  ((r as u16 + 2 * g as u16 + b as u16 + 2) / 4) as u8
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::frame::ChannelLayout;

  #[test]
  fn uniform_gray_is_preserved() {
    let frame = RgbFrame::filled(5, 3, [100, 100, 100]);
    let gray = to_gray(&frame);
    assert_eq!((gray.width(), gray.height()), (5, 3));
    assert!(gray.as_bytes().iter().all(|&v| v == 100));
  }

  #[test]
  fn saturated_input_does_not_overflow() {
    let gray = to_gray(&RgbFrame::filled(1, 1, [255, 255, 255]));
    assert_eq!(gray.as_bytes(), &[255]);
  }

  #[test]
  fn green_weighs_twice() {
    let gray = to_gray(&RgbFrame::filled(1, 1, [0, 200, 0]));
    assert_eq!(gray.as_bytes(), &[100]);
    let gray = to_gray(&RgbFrame::filled(1, 1, [200, 0, 0]));
    assert_eq!(gray.as_bytes(), &[50]);
  }

  #[test]
  fn planar_frames_match_interleaved() {
    let hwc = RgbFrame::new(2, 1, ChannelLayout::Nhwc, vec![10, 20, 30, 40, 50, 60]).unwrap();
    let chw = RgbFrame::new(2, 1, ChannelLayout::Nchw, vec![10, 40, 20, 50, 30, 60]).unwrap();
    assert_eq!(to_gray(&hwc), to_gray(&chw));
  }
}
