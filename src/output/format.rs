// 该文件是 Neurodot 项目的一部分。
// src/output/format.rs - 显示文本格式化
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

use crate::output::DisplayMessage;

/// 识别结果在屏幕上占用的宽度
pub const RESULT_WIDTH: usize = 4;
pub const FILLER: char = '_';

/// 识别循环的状态指示符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
  /// 正在采集
  Capturing,
  /// 正在计算
  Computing,
  /// 结果就绪
  Ready,
}

impl Indicator {
  pub fn symbol(self) -> char {
    match self {
      Indicator::Capturing => 'I',
      Indicator::Computing => 'C',
      Indicator::Ready => 'R',
    }
  }
}

/// 不足 `width` 时左侧补 `filler`，超出时保留前 `width` 个字符
pub fn fit_width(text: &str, width: usize, filler: char) -> String {
  let len = text.chars().count();
  if len >= width {
    return text.chars().take(width).collect();
  }
  std::iter::repeat_n(filler, width - len)
    .chain(text.chars())
    .collect()
}

pub fn countdown_label(last: &str, remaining: u8) -> DisplayMessage {
  DisplayMessage::new(format!("{last}-{remaining}"))
}

pub fn indicator_label(last: &str, indicator: Indicator) -> DisplayMessage {
  DisplayMessage::new(format!("{last}-{}", indicator.symbol()))
}

pub fn progress_label(percent: u8) -> DisplayMessage {
  DisplayMessage::new(format!("{percent}%"))
}
