// 该文件是 Lingshi （灵视） 项目的一部分。
// src/config.rs - 检测参数配置
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

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.5;
pub const DEFAULT_INPUT_WIDTH: u32 = 640;
pub const DEFAULT_INPUT_HEIGHT: u32 = 640;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("置信度阈值必须位于 [0, 1]，实际为 {0}")]
  ConfidenceThreshold(f32),
  #[error("IoU 阈值必须位于 [0, 1]，实际为 {0}")]
  IouThreshold(f32),
  #[error("模型输入尺寸无效: {0}x{1}")]
  InputSize(u32, u32),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("配置解析错误: {0}")]
  ParseError(#[from] serde_json::Error),
}

/// NMS 的抑制范围
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NmsMode {
  /// 不区分类别，任何重叠的低分框都会被抑制
  #[default]
  ClassAgnostic,
  /// 仅抑制同一类别的框
  PerClass,
}

/// 检测流水线的只读配置，在调用时显式传入
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
  pub confidence_threshold: f32,
  pub iou_threshold: f32,
  pub input_width: u32,
  pub input_height: u32,
  pub nms_mode: NmsMode,
}

impl Default for DetectorConfig {
  fn default() -> Self {
    Self {
      confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      iou_threshold: DEFAULT_IOU_THRESHOLD,
      input_width: DEFAULT_INPUT_WIDTH,
      input_height: DEFAULT_INPUT_HEIGHT,
      nms_mode: NmsMode::default(),
    }
  }
}

impl DetectorConfig {
  pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
    self.confidence_threshold = threshold;
    self
  }

  pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
    self.iou_threshold = threshold;
    self
  }

  pub fn with_input_size(mut self, width: u32, height: u32) -> Self {
    self.input_width = width;
    self.input_height = height;
    self
  }

  pub fn with_nms_mode(mut self, mode: NmsMode) -> Self {
    self.nms_mode = mode;
    self
  }

  /// 检查阈值与输入尺寸，NaN 视为无效
  pub fn validate(&self) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&self.confidence_threshold) {
      return Err(ConfigError::ConfidenceThreshold(self.confidence_threshold));
    }
    if !(0.0..=1.0).contains(&self.iou_threshold) {
      return Err(ConfigError::IouThreshold(self.iou_threshold));
    }
    if self.input_width == 0 || self.input_height == 0 {
      return Err(ConfigError::InputSize(self.input_width, self.input_height));
    }
    Ok(())
  }

  /// 从 JSON 文件读取配置，缺省字段使用默认值
  pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let config: DetectorConfig = serde_json::from_str(&text)?;
    config.validate()?;
    debug!("读取配置 {}: {:?}", path.as_ref().display(), config);
    Ok(config)
  }

  /// 模型输入张量的元素个数 (3 * W * H)
  pub fn input_len(&self) -> usize {
    3 * self.input_width as usize * self.input_height as usize
  }
}
