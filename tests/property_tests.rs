// 该文件是 Lingshi （灵视） 项目的一部分。
// tests/property_tests.rs - 解码与 NMS 的性质测试
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

use lingshi::{
  BoundingBox, DetectorConfig, Labels, NmsMode,
  model::{OutputTensor, decode, iou, suppress, suppress_with_mode},
};
use proptest::prelude::*;

fn bbox() -> impl Strategy<Value = BoundingBox> {
  (0.0f32..0.9, 0.0f32..0.9, 0.01f32..0.1, 0.01f32..0.1, 0.0f32..=1.0, 0usize..3).prop_map(
    |(x1, y1, w, h, confidence, class_id)| {
      BoundingBox::new([x1, y1, x1 + w, y1 + h], confidence, class_id, "object").unwrap()
    },
  )
}

/// [4 + C, N] 的原始输出，坐标以 640 输入像素计，可能越界
fn raw_tensor() -> impl Strategy<Value = (usize, usize, Vec<f32>)> {
  (1usize..5, 1usize..24).prop_flat_map(|(classes, boxes)| {
    let geometry = prop::collection::vec(-100.0f32..740.0, 4 * boxes);
    let scores = prop::collection::vec(0.0f32..=1.0, classes * boxes);
    (Just(classes), Just(boxes), geometry, scores).prop_map(|(classes, boxes, mut data, scores)| {
      // 宽高通道取绝对值，保留一部分零尺寸框
      for v in &mut data[2 * boxes..] {
        *v = v.abs() / 4.0;
      }
      data.extend(scores);
      (classes, boxes, data)
    })
  })
}

proptest! {
  #[test]
  fn iou_is_symmetric_and_bounded(a in bbox(), b in bbox()) {
    let ab = iou(&a, &b);
    let ba = iou(&b, &a);
    prop_assert_eq!(ab, ba);
    prop_assert!((0.0..=1.0).contains(&ab));
    prop_assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
  }

  #[test]
  fn decoded_boxes_are_normalized(
    (classes, boxes, data) in raw_tensor(),
    threshold in 0.0f32..=1.0,
  ) {
    let output = OutputTensor::from_shape(&data, &[1, 4 + classes, boxes]).unwrap();
    let config = DetectorConfig::default().with_confidence_threshold(threshold);
    let coco = Labels::coco();
    let decoded = decode(&output, classes, &config, &coco);

    prop_assert!(decoded.len() <= boxes);
    for b in &decoded {
      prop_assert!(0.0 <= b.x1() && b.x1() < b.x2() && b.x2() <= 1.0);
      prop_assert!(0.0 <= b.y1() && b.y1() < b.y2() && b.y2() <= 1.0);
      prop_assert!(b.confidence() >= threshold);
      prop_assert!(b.class_id() < classes);
      prop_assert_eq!(b.label(), coco.resolve(b.class_id()));
    }
  }

  #[test]
  fn raising_the_threshold_only_removes_boxes(
    (classes, boxes, data) in raw_tensor(),
    low in 0.0f32..0.5,
    step in 0.0f32..0.5,
  ) {
    let output = OutputTensor::from_shape(&data, &[1, 4 + classes, boxes]).unwrap();
    let labels = Labels::coco();
    let loose = decode(
      &output,
      classes,
      &DetectorConfig::default().with_confidence_threshold(low),
      &labels,
    );
    let strict = decode(
      &output,
      classes,
      &DetectorConfig::default().with_confidence_threshold(low + step),
      &labels,
    );

    prop_assert!(strict.len() <= loose.len());
    for b in &strict {
      prop_assert!(loose.contains(b));
    }
  }

  #[test]
  fn suppression_is_idempotent(
    boxes in prop::collection::vec(bbox(), 0..32),
    threshold in 0.0f32..=1.0,
  ) {
    let once = suppress(boxes, threshold);
    let twice = suppress(once.clone(), threshold);
    prop_assert_eq!(once, twice);
  }

  #[test]
  fn survivors_are_sorted_and_separated(
    boxes in prop::collection::vec(bbox(), 0..32),
    threshold in 0.0f32..=1.0,
  ) {
    let kept = suppress(boxes.clone(), threshold);

    prop_assert!(kept.len() <= boxes.len());
    prop_assert!(kept.windows(2).all(|w| w[0].confidence() >= w[1].confidence()));
    for (i, a) in kept.iter().enumerate() {
      prop_assert!(boxes.contains(a));
      for b in &kept[i + 1..] {
        prop_assert!(iou(a, b) < threshold);
      }
    }
  }

  #[test]
  fn per_class_separates_within_each_class(
    boxes in prop::collection::vec(bbox(), 0..32),
    threshold in 0.0f32..=1.0,
  ) {
    let agnostic = suppress_with_mode(boxes.clone(), threshold, NmsMode::ClassAgnostic);
    let per_class = suppress_with_mode(boxes.clone(), threshold, NmsMode::PerClass);

    prop_assert_eq!(boxes.is_empty(), per_class.is_empty());
    // 每个类别内部仍然互不重叠
    for (i, a) in per_class.iter().enumerate() {
      for b in per_class[i + 1..].iter().filter(|b| b.class_id() == a.class_id()) {
        prop_assert!(iou(a, b) < threshold);
      }
    }
    prop_assert_eq!(agnostic.first(), per_class.first());
  }
}
