// 该文件是 Lingshi （灵视） 项目的一部分。
// src/model/nms.rs - 非极大值抑制
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

use crate::{config::NmsMode, model::BoundingBox};

const MIN_UNION_AREA: f32 = 1e-6;

/// 计算两个边界框的 IoU，结果位于 [0, 1]
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
  let area_a = a.area();
  let area_b = b.area();
  if area_a <= 0.0 || area_b <= 0.0 {
    return 0.0;
  }

  let x_min = a.x1().max(b.x1());
  let y_min = a.y1().max(b.y1());
  let x_max = a.x2().min(b.x2());
  let y_max = a.y2().min(b.y2());
  let intersection = (x_max - x_min).max(0.0) * (y_max - y_min).max(0.0);

  let union = area_a + area_b - intersection;
  if union <= MIN_UNION_AREA {
    return 0.0;
  }
  (intersection / union).clamp(0.0, 1.0)
}

/// 不区分类别的贪心 NMS
pub fn suppress(boxes: Vec<BoundingBox>, iou_threshold: f32) -> Vec<BoundingBox> {
  suppress_with_mode(boxes, iou_threshold, NmsMode::ClassAgnostic)
}

/// 贪心 NMS，输出按置信度降序
///
/// 置信度相同的框保持输入顺序。被抑制的框不会再参与比较。
/// IoU 阈值为 NaN 时不保留任何框。
pub fn suppress_with_mode(
  mut boxes: Vec<BoundingBox>,
  iou_threshold: f32,
  mode: NmsMode,
) -> Vec<BoundingBox> {
  if boxes.is_empty() {
    return boxes;
  }
  if iou_threshold.is_nan() {
    warn!("IoU 阈值为 NaN，丢弃全部 {} 个候选框", boxes.len());
    return Vec::new();
  }

  // sort_by 是稳定排序
  boxes.sort_by(|a, b| b.confidence().total_cmp(&a.confidence()));

  let total = boxes.len();
  let mut active = vec![true; total];
  for i in 0..total {
    if !active[i] {
      continue;
    }
    for j in (i + 1)..total {
      if !active[j] {
        continue;
      }
      if mode == NmsMode::PerClass && boxes[i].class_id() != boxes[j].class_id() {
        continue;
      }
      if iou(&boxes[i], &boxes[j]) >= iou_threshold {
        active[j] = false;
      }
    }
  }

  let kept: Vec<BoundingBox> = boxes
    .into_iter()
    .zip(active)
    .filter_map(|(bbox, keep)| keep.then_some(bbox))
    .collect();
  debug!("NMS: {} 个候选框保留 {} 个", total, kept.len());
  kept
}
