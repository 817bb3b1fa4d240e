// 该文件是 Lingshi （灵视） 项目的一部分。
// src/model.rs - 检测结果与推理引擎接口
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

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::frame::PlanarTensor;

/// 外部推理引擎，输入平面张量，输出原始张量
pub trait InferenceEngine {
  type Error: std::error::Error;

  fn infer(&self, input: &PlanarTensor) -> Result<RawOutput, Self::Error>;
}

/// 推理引擎返回的原始输出，通常形状为 [1, 4 + C, N]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOutput {
  pub shape: Vec<usize>,
  pub data: Vec<f32>,
}

/// 归一化坐标下的检测框，构造后不可修改
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundingBox {
  x1: f32,
  y1: f32,
  x2: f32,
  y2: f32,
  confidence: f32,
  class_id: usize,
  label: String,
}

impl BoundingBox {
  /// `corners` 为 [x1, y1, x2, y2]，要求位于 [0, 1] 且 x1 < x2、y1 < y2，
  /// 否则返回 `None`。置信度被限制在 [0, 1]。
  pub fn new(
    corners: [f32; 4],
    confidence: f32,
    class_id: usize,
    label: impl Into<String>,
  ) -> Option<Self> {
    let [x1, y1, x2, y2] = corners;
    let unit = 0.0..=1.0;
    if !corners.iter().all(|v| unit.contains(v)) || !(x1 < x2 && y1 < y2) {
      return None;
    }
    if confidence.is_nan() {
      return None;
    }

    Some(Self {
      x1,
      y1,
      x2,
      y2,
      confidence: confidence.clamp(0.0, 1.0),
      class_id,
      label: label.into(),
    })
  }

  pub fn x1(&self) -> f32 {
    self.x1
  }

  pub fn y1(&self) -> f32 {
    self.y1
  }

  pub fn x2(&self) -> f32 {
    self.x2
  }

  pub fn y2(&self) -> f32 {
    self.y2
  }

  pub fn corners(&self) -> [f32; 4] {
    [self.x1, self.y1, self.x2, self.y2]
  }

  pub fn confidence(&self) -> f32 {
    self.confidence
  }

  pub fn class_id(&self) -> usize {
    self.class_id
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn width(&self) -> f32 {
    self.x2 - self.x1
  }

  pub fn height(&self) -> f32 {
    self.y2 - self.y1
  }

  pub fn area(&self) -> f32 {
    self.width() * self.height()
  }

  pub fn iou(&self, other: &BoundingBox) -> f32 {
    nms::iou(self, other)
  }

  /// 换算到 `width` x `height` 的像素坐标
  pub fn to_pixels(&self, width: u32, height: u32) -> [f32; 4] {
    let (w, h) = (width as f32, height as f32);
    [self.x1 * w, self.y1 * h, self.x2 * w, self.y2 * h]
  }
}

/// 单帧检测结果，按置信度降序
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectResult {
  pub items: Box<[BoundingBox]>,
  /// 预处理、推理与后处理的总耗时
  pub elapsed: Duration,
}

impl DetectResult {
  pub fn new(items: Vec<BoundingBox>, elapsed: Duration) -> Self {
    Self {
      items: items.into_boxed_slice(),
      elapsed,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, BoundingBox> {
    self.items.iter()
  }
}

pub mod decode;
pub mod nms;
pub mod replay;
pub mod tensor;

pub use self::decode::decode;
pub use self::nms::{iou, suppress, suppress_with_mode};
pub use self::replay::{ReplayEngine, ReplayEngineError};
pub use self::tensor::{OutputTensor, TensorError};
