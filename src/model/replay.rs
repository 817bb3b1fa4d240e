// 该文件是 Lingshi （灵视） 项目的一部分。
// src/model/replay.rs - 回放录制的输出张量
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

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use crate::{
  frame::PlanarTensor,
  model::{InferenceEngine, RawOutput},
};

#[derive(Error, Debug)]
pub enum ReplayEngineError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("张量文件解析错误: {0}")]
  ParseError(#[from] serde_json::Error),
  #[error("输入张量长度不匹配: 期望 {expected}, 实际 {actual}")]
  InputSize { expected: usize, actual: usize },
}

/// 每一帧都返回同一个录制好的输出张量
///
/// 张量文件为 JSON: `{"shape": [1, 84, 8400], "data": [...]}`。
#[derive(Debug, Clone)]
pub struct ReplayEngine {
  output: RawOutput,
  input_len: usize,
}

impl ReplayEngine {
  pub fn new(output: RawOutput, input_len: usize) -> Self {
    Self { output, input_len }
  }

  pub fn from_path<P: AsRef<Path>>(path: P, input_len: usize) -> Result<Self, ReplayEngineError> {
    info!("加载录制张量: {}", path.as_ref().display());
    let text = std::fs::read_to_string(path.as_ref())?;
    let output: RawOutput = serde_json::from_str(&text)?;
    debug!(
      "录制张量形状: {:?}, 元素个数: {}",
      output.shape,
      output.data.len()
    );
    Ok(Self::new(output, input_len))
  }

  pub fn output(&self) -> &RawOutput {
    &self.output
  }
}

impl InferenceEngine for ReplayEngine {
  type Error = ReplayEngineError;

  fn infer(&self, input: &PlanarTensor) -> Result<RawOutput, Self::Error> {
    let actual = input.as_nchw().len();
    if actual != self.input_len {
      return Err(ReplayEngineError::InputSize {
        expected: self.input_len,
        actual,
      });
    }
    Ok(self.output.clone())
  }
}
