// 该文件是 Neurodot 项目的一部分。
// src/output/console.rs - 终端模拟显示
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

use std::io::{Stdout, Write};

use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  output::{DEVICE_WIDTH, DisplayError, DisplaySink},
};

/// 在终端中以一行方框模拟点阵屏，`console://?width=8` 可修改宽度
pub struct ConsoleDisplay<W: Write = Stdout> {
  out: W,
  width: usize,
  buffer: String,
}

impl FromUrlWithScheme for ConsoleDisplay {
  const SCHEME: &'static str = "console";
}

impl FromUrl for ConsoleDisplay {
  type Error = DisplayError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(DisplayError::SchemeMismatch);
    }

    let width = url
      .query_pairs()
      .find(|(k, _)| k == "width")
      .and_then(|(_, v)| v.parse().ok())
      .unwrap_or(DEVICE_WIDTH);

    Ok(ConsoleDisplay::new(std::io::stdout(), width))
  }
}

impl<W: Write> ConsoleDisplay<W> {
  pub fn new(out: W, width: usize) -> Self {
    Self {
      out,
      width,
      buffer: String::new(),
    }
  }
}

impl<W: Write> DisplaySink for ConsoleDisplay<W> {
  fn width(&self) -> usize {
    self.width
  }

  fn clear(&mut self) -> Result<(), DisplayError> {
    self.buffer.clear();
    Ok(())
  }

  fn write_string(&mut self, text: &str, _kerning: bool) -> Result<(), DisplayError> {
    self.buffer.push_str(text);
    Ok(())
  }

  fn show(&mut self) -> Result<(), DisplayError> {
    let text: String = self.buffer.chars().take(self.width).collect();
    writeln!(self.out, "[{:<width$}]", text, width = self.width)?;
    self.out.flush()?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::output::DisplayMessage;

  #[test]
  fn only_show_writes() {
    let mut display = ConsoleDisplay::new(Vec::new(), DEVICE_WIDTH);
    display.clear().unwrap();
    display.write_string("10%", false).unwrap();
    assert!(display.out.is_empty());
    display.show().unwrap();
    assert_eq!(String::from_utf8(display.out.clone()).unwrap(), "[10%   ]\n");

    display.render(&DisplayMessage::new("xxxx-I")).unwrap();
    assert!(String::from_utf8(display.out).unwrap().ends_with("[xxxx-I]\n"));
  }
}
