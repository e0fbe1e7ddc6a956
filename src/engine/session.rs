// 该文件是 Neurodot 项目的一部分。
// src/engine/session.rs - 模型生命周期守卫
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

use std::ops::{Deref, DerefMut};

use tracing::{error, info};

use crate::engine::{Engine, EngineError, ModelPaths};

/// 已加载的模型
///
/// 无论成功还是失败，每个生命周期内 `uninit` 恰好调用一次：
/// `open` 失败时立即调用，否则在守卫析构时调用。
pub struct ModelSession<'e, E: Engine> {
  engine: &'e mut E,
}

impl<'e, E: Engine> ModelSession<'e, E> {
  pub fn open(engine: &'e mut E, model: &ModelPaths) -> Result<Self, EngineError> {
    info!(
      "加载模型: 拓扑 {}, 权重 {}",
      model.topology.display(),
      model.weights.display()
    );
    if let Err(e) = engine.init(model) {
      error!("模型加载失败: {}", e);
      engine.uninit();
      return Err(e);
    }
    info!("模型加载完成");
    Ok(Self { engine })
  }
}

impl<E: Engine> Deref for ModelSession<'_, E> {
  type Target = E;

  fn deref(&self) -> &Self::Target {
    self.engine
  }
}

impl<E: Engine> DerefMut for ModelSession<'_, E> {
  fn deref_mut(&mut self) -> &mut Self::Target {
    self.engine
  }
}

impl<E: Engine> Drop for ModelSession<'_, E> {
  fn drop(&mut self) {
    info!("释放模型");
    self.engine.uninit();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::engine::mock::ScriptedEngine;

  #[test]
  fn init_failure_still_uninits_once() {
    let mut engine = ScriptedEngine::default().fail_init();
    let paths = ModelPaths::new("topology.txt", "weights.bin");
    let err = ModelSession::open(&mut engine, &paths).err();
    assert!(matches!(err, Some(EngineError::Load(_))));
    assert_eq!(engine.init_calls(), 1);
    assert_eq!(engine.uninit_calls(), 1);
  }

  #[test]
  fn drop_uninits_once() {
    let mut engine = ScriptedEngine::default();
    let paths = ModelPaths::new("topology.txt", "weights.bin");
    {
      let session = ModelSession::open(&mut engine, &paths).unwrap();
      assert!(session.is_loaded());
    }
    assert_eq!(engine.uninit_calls(), 1);
    assert!(!engine.is_loaded());
  }

  #[test]
  fn reopen_after_drop_succeeds() {
    let mut engine = ScriptedEngine::default();
    let paths = ModelPaths::new("topology.txt", "weights.bin");
    drop(ModelSession::open(&mut engine, &paths).unwrap());
    let session = ModelSession::open(&mut engine, &paths).unwrap();
    assert!(session.is_loaded());
    drop(session);
    assert_eq!(engine.init_calls(), 2);
    assert_eq!(engine.uninit_calls(), 2);
  }
}
