// 该文件是 Neurodot 项目的一部分。
// src/bin/train_progress.rs - 带进度显示的训练
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
  engine::{ModelPaths, SimulatedEngine, TrainingJob},
  output::{StatusChannel, probe_display},
  task::{StopToken, Task, TrainingSupervisor},
};
use tracing::info;

/// 训练网络并在点阵屏上显示进度
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
  /// 训练样本列表
  #[arg(long, value_name = "FILE", default_value = "../nets/alpr/alpr-train-let.txt")]
  pub dataset: PathBuf,
  /// 训练轮数
  #[arg(long, default_value = "10")]
  pub epochs: u32,
  /// 批大小
  #[arg(long, default_value = "10")]
  pub batch: u32,
  /// 显示设备，例如 console:// 或 record:///tmp/display.jsonl；缺省时只输出日志
  #[arg(long, value_name = "DISPLAY")]
  pub display: Option<Url>,
  /// 进度轮询间隔（毫秒）
  #[arg(long, value_name = "MS", default_value = "1000")]
  pub poll_ms: u64,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("推理引擎: {}", args.engine);
  info!("拓扑文件: {}", args.topology.display());
  info!("权重文件: {}", args.weights.display());
  info!("训练样本: {}", args.dataset.display());

  let stop = StopToken::new();
  stop.install_ctrlc()?;

  let mut status = StatusChannel::new(probe_display(args.display.as_ref()));
  let mut engine = SimulatedEngine::from_url(&args.engine)?;
  let job = TrainingJob {
    dataset: args.dataset,
    epochs: args.epochs,
    batch_size: args.batch,
  };

  let report = TrainingSupervisor::new(ModelPaths::new(args.topology, args.weights))
    .with_poll_interval(Duration::from_millis(args.poll_ms))
    .with_stop_token(stop)
    .run_task(&job, &mut engine, &mut status)?;

  info!(
    "训练结束: 最终进度 {}%, 轮询 {} 次",
    report.final_progress,
    report.observed.len()
  );

  Ok(())
}
