// 该文件是 Neurodot 项目的一部分。
// src/output/record.rs - 显示内容记录
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

use std::{
  fs::{File, OpenOptions},
  io::{BufWriter, Write},
  path::PathBuf,
};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  output::{DEVICE_WIDTH, DisplayError, DisplaySink},
  url_file_path,
};

#[derive(Serialize)]
struct RecordLine<'a> {
  time: DateTime<Local>,
  text: &'a str,
}

/// 每次 `show` 向 JSON Lines 文件追加一条记录
pub struct RecordDisplay {
  writer: BufWriter<File>,
  buffer: String,
}

impl FromUrlWithScheme for RecordDisplay {
  const SCHEME: &'static str = "record";
}

impl FromUrl for RecordDisplay {
  type Error = DisplayError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(DisplayError::SchemeMismatch);
    }
    RecordDisplay::open(url_file_path(url)?)
  }
}

impl RecordDisplay {
  pub fn open(path: PathBuf) -> Result<Self, DisplayError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    info!("显示内容记录到: {}", path.display());
    Ok(Self {
      writer: BufWriter::new(file),
      buffer: String::new(),
    })
  }
}

impl DisplaySink for RecordDisplay {
  fn clear(&mut self) -> Result<(), DisplayError> {
    self.buffer.clear();
    Ok(())
  }

  fn write_string(&mut self, text: &str, _kerning: bool) -> Result<(), DisplayError> {
    self.buffer.push_str(text);
    Ok(())
  }

  fn show(&mut self) -> Result<(), DisplayError> {
    let text: String = self.buffer.chars().take(DEVICE_WIDTH).collect();
    let line = RecordLine {
      time: Local::now(),
      text: &text,
    };
    serde_json::to_writer(&mut self.writer, &line)?;
    self.writer.write_all(b"\n")?;
    self.writer.flush()?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::output::DisplayMessage;

  #[test]
  fn appends_one_line_per_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("status").join("display.jsonl");
    let mut display = RecordDisplay::open(path.clone()).unwrap();
    display.render(&DisplayMessage::new("xxxx-9")).unwrap();
    display.render(&DisplayMessage::new("xxxx-8")).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let texts: Vec<String> = content
      .lines()
      .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["text"]
        .as_str()
        .unwrap()
        .to_string())
      .collect();
    assert_eq!(texts, vec!["xxxx-9", "xxxx-8"]);
  }

  #[test]
  fn opens_percent_encoded_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("my digits").join("状态.jsonl");
    let url = Url::from_file_path(&path).unwrap();
    let url = Url::parse(&url.as_str().replacen("file", "record", 1)).unwrap();

    let mut display = RecordDisplay::from_url(&url).unwrap();
    display.render(&DisplayMessage::new("50%")).unwrap();
    assert!(std::fs::read_to_string(&path).unwrap().contains("\"50%\""));
  }
}
