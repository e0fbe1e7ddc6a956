// 该文件是 Neurodot 项目的一部分。
// src/bin/ocr_camera.rs - 摄像头连续识别
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

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use url::Url;

use neurodot::{
  FromUrl,
  engine::{ModelPaths, SimulatedEngine},
  input::{CaptureConfig, InputWrapper},
  output::{DisplayMessage, StatusChannel, probe_display},
  task::{RecognitionLoop, SleepTicker, StopToken, Task},
};
use tracing::info;

/// 定时采集图像、识别数字并显示在点阵屏上
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 推理引擎
  #[arg(long, value_name = "ENGINE", default_value = "sim:///")]
  pub engine: Url,
  /// 网络拓扑文件
  #[arg(long, value_name = "FILE", default_value = "mnist/topology-mnist-kaggle.txt")]
  pub topology: PathBuf,
  /// 网络权重文件
  #[arg(long, value_name = "FILE", default_value = "mnist/weights-mnist-kaggle.bin")]
  pub weights: PathBuf,
  /// 输入来源，v4l:///dev/video0 或 image:///path/to/digit.png
  #[arg(long, value_name = "SOURCE", default_value = "v4l:///dev/video0")]
  pub input: Url,
  /// 显示设备；缺省时只输出日志
  #[arg(long, value_name = "DISPLAY")]
  pub display: Option<Url>,
  #[arg(long, default_value = "128")]
  pub width: u32,
  #[arg(long, default_value = "112")]
  pub height: u32,
  /// 采集黑白图像
  #[arg(long)]
  pub monochrome: bool,
  /// 节拍长度（毫秒）
  #[arg(long, value_name = "MS", default_value = "1000")]
  pub tick_ms: u64,
  /// 每轮倒计时节拍数，显示为一位数字
  #[arg(long, default_value = "10", value_parser = clap::value_parser!(u8).range(0..=10))]
  pub countdown: u8,
  /// 识别指定轮数后退出
  #[arg(long, value_name = "CYCLES")]
  pub cycles: Option<u64>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("推理引擎: {}", args.engine);
  info!("输入来源: {}", args.input);
  info!("拓扑文件: {}", args.topology.display());
  info!("权重文件: {}", args.weights.display());

  let stop = StopToken::new();
  stop.install_ctrlc()?;

  let mut status = StatusChannel::new(probe_display(args.display.as_ref()));
  status.post(&DisplayMessage::new("INIT 1"));
  let mut engine = SimulatedEngine::from_url(&args.engine)?;
  let mut input = InputWrapper::from_url(&args.input)?;
  status.post(&DisplayMessage::new("INIT 2"));

  let capture = CaptureConfig {
    width: args.width,
    height: args.height,
    monochrome: args.monochrome,
  };
  let report = RecognitionLoop::new(
    ModelPaths::new(args.topology, args.weights),
    capture,
    SleepTicker::new(Duration::from_millis(args.tick_ms)),
  )
  .with_stop_token(stop)
  .with_countdown(args.countdown)
  .with_max_cycles(args.cycles)
  .run_task(&mut input, &mut engine, &mut status)?;

  info!("识别结束: 共 {} 轮, 最后结果 {}", report.cycles, report.last);

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn countdown_is_limited_to_one_digit() {
    let args = Args::try_parse_from(["neurodot-ocr", "--countdown", "10"]).unwrap();
    assert_eq!(args.countdown, 10);
    assert!(Args::try_parse_from(["neurodot-ocr", "--countdown", "12"]).is_err());
  }
}
