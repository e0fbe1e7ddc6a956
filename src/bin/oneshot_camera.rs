// 该文件是 Neurodot 项目的一部分。
// src/bin/oneshot_camera.rs - 单次采集推理
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

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use url::Url;

use neurodot::{
  FromUrl,
  engine::{ModelPaths, SimulatedEngine},
  input::{CaptureConfig, InputWrapper},
  task::{OneShotTask, Task},
};
use tracing::info;

/// 采集一帧并打印网络输出
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 推理引擎
  #[arg(long, value_name = "ENGINE", default_value = "sim:///")]
  pub engine: Url,
  /// 网络拓扑文件
  #[arg(long, value_name = "FILE", default_value = "../nets/alpr/topology-alpr-let2.txt")]
  pub topology: PathBuf,
  /// 网络权重文件
  #[arg(long, value_name = "FILE", default_value = "../nets/alpr/weights-alpr-let2.bin")]
  pub weights: PathBuf,
  /// 输入来源
  #[arg(long, value_name = "SOURCE", default_value = "v4l:///dev/video0")]
  pub input: Url,
  #[arg(long, default_value = "50")]
  pub width: u32,
  #[arg(long, default_value = "100")]
  pub height: u32,
  /// 采集彩色图像（默认黑白）
  #[arg(long)]
  pub color: bool,
  /// 网络输出长度，缺省为 width * height
  #[arg(long, value_name = "LEN")]
  pub output_len: Option<usize>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("推理引擎: {}", args.engine);
  info!("输入来源: {}", args.input);

  let mut engine = SimulatedEngine::from_url(&args.engine)?;
  let mut input = InputWrapper::from_url(&args.input)?;
  let capture = CaptureConfig {
    width: args.width,
    height: args.height,
    monochrome: !args.color,
  };
  let mut task = OneShotTask::new(ModelPaths::new(args.topology, args.weights), capture);
  if let Some(len) = args.output_len {
    task = task.with_output_len(len);
  }
  let output = task.run_task(&mut input, &mut engine, ())?;
  info!("任务完成，共 {} 个输出值", output.len());

  Ok(())
}
