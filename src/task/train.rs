// 该文件是 Neurodot 项目的一部分。
// src/task/train.rs - 训练监督
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
  sync::{Condvar, Mutex, MutexGuard, PoisonError},
  thread,
  time::Duration,
};

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
  engine::{Engine, EngineError, ModelPaths, ModelSession, TrainingJob},
  output::{DisplaySink, StatusChannel, format::progress_label},
  task::{StopToken, Task},
};

#[derive(Error, Debug)]
pub enum SupervisorError {
  #[error("模型加载失败: {0}")]
  Load(#[source] EngineError),
  #[error("训练失败: {0}")]
  Train(#[source] EngineError),
  #[error("训练线程异常退出")]
  TrainerPanicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingState {
  Idle,
  Initializing,
  Training,
  Completed,
  Failed,
  Uninitialized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingReport {
  /// 监视线程每次轮询读到的进度
  pub observed: Vec<u8>,
  pub final_progress: u8,
  /// 依次经过的状态
  pub states: Vec<TrainingState>,
}

/// 训练线程结束的信号
///
/// 监视线程在读取、显示进度时持有锁，因此训练线程标记结束之后
/// 不会再有新的进度显示。
struct TrainingSignal {
  running: Mutex<bool>,
  finished: Condvar,
}

impl TrainingSignal {
  fn new() -> Self {
    Self {
      running: Mutex::new(true),
      finished: Condvar::new(),
    }
  }

  fn lock(&self) -> MutexGuard<'_, bool> {
    self.running.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn finish(&self) {
    *self.lock() = false;
    self.finished.notify_all();
  }
}

/// 析构时标记训练结束，训练线程 panic 时同样生效
struct FinishOnDrop<'a>(&'a TrainingSignal);

impl Drop for FinishOnDrop<'_> {
  fn drop(&mut self) {
    self.0.finish();
  }
}

pub struct TrainingSupervisor {
  model: ModelPaths,
  poll_interval: Duration,
  stop: StopToken,
}

impl TrainingSupervisor {
  pub fn new(model: ModelPaths) -> Self {
    Self {
      model,
      poll_interval: Duration::from_secs(1),
      stop: StopToken::default(),
    }
  }

  pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
    self.poll_interval = poll_interval;
    self
  }

  pub fn with_stop_token(mut self, stop: StopToken) -> Self {
    self.stop = stop;
    self
  }

  /// 加载模型、训练并监视进度；任何路径下模型都会被释放
  pub fn supervise<E, D>(
    &self,
    engine: &mut E,
    job: &TrainingJob,
    status: &mut StatusChannel<D>,
  ) -> Result<TrainingReport, SupervisorError>
  where
    E: Engine,
    D: DisplaySink + Send,
  {
    let mut states = vec![TrainingState::Idle];
    let mut enter = |state: TrainingState| {
      info!("训练状态: {:?} -> {:?}", states.last(), state);
      states.push(state);
    };

    enter(TrainingState::Initializing);
    let session = match ModelSession::open(engine, &self.model) {
      Ok(session) => session,
      Err(e) => {
        enter(TrainingState::Failed);
        enter(TrainingState::Uninitialized);
        return Err(SupervisorError::Load(e));
      }
    };

    enter(TrainingState::Training);
    let (outcome, observed) = self.train_and_monitor(&*session, job, status);
    let final_progress = session.train_progress();

    match &outcome {
      Ok(()) => {
        enter(TrainingState::Completed);
        info!("训练完成，进度 {}%", final_progress);
        if observed.last() != Some(&final_progress) {
          status.post(&progress_label(final_progress));
        }
      }
      Err(e) => {
        enter(TrainingState::Failed);
        error!("{}", e);
      }
    }

    drop(session);
    enter(TrainingState::Uninitialized);

    outcome.map(|()| TrainingReport {
      observed,
      final_progress,
      states,
    })
  }

  fn train_and_monitor<E, D>(
    &self,
    engine: &E,
    job: &TrainingJob,
    status: &mut StatusChannel<D>,
  ) -> (Result<(), SupervisorError>, Vec<u8>)
  where
    E: Engine,
    D: DisplaySink + Send,
  {
    let signal = TrainingSignal::new();
    let signal = &signal;

    thread::scope(|s| {
      let trainer = s.spawn(move || {
        let _finish = FinishOnDrop(signal);
        info!(
          "开始训练: 数据集 {}, {} 轮, 批大小 {}",
          job.dataset.display(),
          job.epochs,
          job.batch_size
        );
        engine.train(job)
      });
      let monitor = s.spawn(move || self.monitor(engine, signal, status));

      let outcome = match trainer.join() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(SupervisorError::Train(e)),
        Err(_) => Err(SupervisorError::TrainerPanicked),
      };
      let observed = monitor.join().unwrap_or_else(|_| {
        warn!("进度监视线程异常退出");
        Vec::new()
      });
      (outcome, observed)
    })
  }

  fn monitor<E, D>(
    &self,
    engine: &E,
    signal: &TrainingSignal,
    status: &mut StatusChannel<D>,
  ) -> Vec<u8>
  where
    E: Engine,
    D: DisplaySink,
  {
    debug!("进度监视开始");
    let mut observed = Vec::new();
    let mut running = signal.lock();
    loop {
      running = match signal
        .finished
        .wait_timeout_while(running, self.poll_interval, |running| *running)
      {
        Ok((guard, _)) => guard,
        Err(poisoned) => poisoned.into_inner().0,
      };
      if !*running {
        debug!("训练线程已结束，监视退出");
        break;
      }
      if self.stop.is_stopped() {
        warn!("收到停止信号，不再显示进度，等待训练结束");
        break;
      }

      let percent = engine.train_progress();
      status.post(&progress_label(percent));
      observed.push(percent);
      if percent >= 100 {
        break;
      }
    }
    observed
  }
}

impl<'a, E, D> Task<&'a TrainingJob, &'a mut E, &'a mut StatusChannel<D>> for TrainingSupervisor
where
  E: Engine,
  D: DisplaySink + Send,
{
  type Output = TrainingReport;
  type Error = anyhow::Error;

  fn run_task(
    self,
    input: &'a TrainingJob,
    model: &'a mut E,
    output: &'a mut StatusChannel<D>,
  ) -> Result<Self::Output, Self::Error> {
    Ok(self.supervise(model, input, output)?)
  }
}
