// 该文件是 Lingshi （灵视） 项目的一部分。
// src/model/decode.rs - 输出张量解码
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

use tracing::{debug, warn};

use crate::{config::DetectorConfig, label::Labels, model::BoundingBox};

use super::tensor::OutputTensor;

/// 将 [4 + C, N] 的输出解码为候选框
///
/// 每个候选框取得分最高的类别（得分相同时取编号较小者），得分低于
/// `confidence_threshold` 的候选被丢弃。坐标由模型输入像素换算到 [0, 1]
/// 并截断，截断后宽或高为零的框同样丢弃。
///
/// `num_classes` 超过张量所含类别数时视为张量不合法，返回空结果。
/// 置信度阈值为 NaN 时同样返回空结果。
pub fn decode(
  output: &OutputTensor,
  num_classes: usize,
  config: &DetectorConfig,
  labels: &Labels,
) -> Vec<BoundingBox> {
  if num_classes == 0 {
    return Vec::new();
  }
  if config.confidence_threshold.is_nan() {
    warn!("置信度阈值为 NaN，丢弃全部候选框");
    return Vec::new();
  }
  if num_classes > output.num_classes() {
    warn!(
      "类别数 {} 超出输出张量的 {} 个类别通道",
      num_classes,
      output.num_classes()
    );
    return Vec::new();
  }

  // 逐类别按行扫描，保持内存连续访问
  let mut best = vec![(f32::NEG_INFINITY, 0usize); output.num_boxes()];
  for class_id in 0..num_classes {
    for (slot, &score) in best.iter_mut().zip(output.class_scores(class_id).iter()) {
      if score > slot.0 {
        *slot = (score, class_id);
      }
    }
  }

  let input_w = config.input_width as f32;
  let input_h = config.input_height as f32;
  let mut items = Vec::new();
  let mut degenerate = 0usize;

  for (index, &(score, class_id)) in best.iter().enumerate() {
    if score < config.confidence_threshold {
      continue;
    }

    let [cx, cy, w, h] = output.box_at(index);
    let corners = [
      ((cx - w / 2.0) / input_w).clamp(0.0, 1.0),
      ((cy - h / 2.0) / input_h).clamp(0.0, 1.0),
      ((cx + w / 2.0) / input_w).clamp(0.0, 1.0),
      ((cy + h / 2.0) / input_h).clamp(0.0, 1.0),
    ];

    match BoundingBox::new(corners, score, class_id, labels.resolve(class_id)) {
      Some(bbox) => items.push(bbox),
      None => degenerate += 1,
    }
  }

  debug!(
    "解码 {} 个候选框: {} 个通过置信度阈值, {} 个退化框被丢弃",
    output.num_boxes(),
    items.len(),
    degenerate
  );

  items
}
