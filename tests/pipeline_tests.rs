// 该文件是 Lingshi （灵视） 项目的一部分。
// tests/pipeline_tests.rs - 端到端流水线测试
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

use std::{convert::Infallible, sync::Mutex};

use image::{Rgb, RgbImage};
use lingshi::{
  BoundingBox, DetectResult, Detector, DetectorConfig, Labels,
  frame::FrameMeta,
  model::{RawOutput, ReplayEngine, suppress},
  output::{JsonLinesOutput, Render},
  task::{ContinuousTask, OneShotTask, Task},
};

const SIDE: u32 = 32;

fn config() -> DetectorConfig {
  DetectorConfig::default().with_input_size(SIDE, SIDE)
}

fn detector() -> Detector {
  Detector::new(config(), Labels::new(["person", "car"])).unwrap()
}

/// 按 [通道][候选框] 组装 [1, C, N] 张量
fn raw_output(channels: &[&[f32]]) -> RawOutput {
  RawOutput {
    shape: vec![1, channels.len(), channels[0].len()],
    data: channels.iter().flat_map(|c| c.iter().copied()).collect(),
  }
}

/// 两个重叠的 person 候选和一个独立的 car 候选
fn recorded_output() -> RawOutput {
  raw_output(&[
    &[8.0, 9.0, 24.0],
    &[8.0, 8.0, 24.0],
    &[8.0, 8.0, 8.0],
    &[8.0, 8.0, 8.0],
    &[0.9, 0.6, 0.1],
    &[0.0, 0.1, 0.8],
  ])
}

fn engine() -> ReplayEngine {
  ReplayEngine::new(recorded_output(), config().input_len())
}

fn frames(count: usize) -> Vec<RgbImage> {
  (0..count)
    .map(|i| RgbImage::from_pixel(48, 40, Rgb([i as u8 * 10, 128, 255])))
    .collect()
}

fn strip(k: usize, confidence: f32) -> BoundingBox {
  let x1 = 0.1 * k as f32;
  BoundingBox::new([x1, 0.2, x1 + 0.4, 0.8], confidence, 0, "person").unwrap()
}

#[derive(Default)]
struct Collector {
  frames: Mutex<Vec<(FrameMeta, usize)>>,
}

impl Render<DetectResult> for Collector {
  type Error = Infallible;

  fn render_result(&self, frame: &FrameMeta, result: &DetectResult) -> Result<(), Self::Error> {
    self.frames.lock().unwrap().push((*frame, result.len()));
    Ok(())
  }
}

#[test]
fn identical_boxes_keep_the_stronger_one() {
  let boxes = vec![
    BoundingBox::new([0.1, 0.1, 0.5, 0.5], 0.6, 0, "person").unwrap(),
    BoundingBox::new([0.1, 0.1, 0.5, 0.5], 0.9, 0, "person").unwrap(),
  ];
  let kept = suppress(boxes, 0.5);
  assert_eq!(kept.len(), 1);
  assert_eq!(kept[0].confidence(), 0.9);
}

#[test]
fn weakly_overlapping_boxes_both_survive() {
  // b 位于 a 内部: 交集 0.075，并集 0.25，IoU = 0.3
  let a = BoundingBox::new([0.0, 0.0, 0.5, 0.5], 0.9, 0, "person").unwrap();
  let b = BoundingBox::new([0.0, 0.0, 0.25, 0.3], 0.8, 0, "person").unwrap();
  assert!((a.iou(&b) - 0.3).abs() < 1e-5);
  assert_eq!(suppress(vec![a, b], 0.5).len(), 2);
}

#[test]
fn low_scores_decode_to_nothing() {
  let output = raw_output(&[&[16.0], &[16.0], &[8.0], &[8.0], &[0.1], &[0.05]]);
  assert!(detector().postprocess(&output.data, &output.shape).is_empty());
}

#[test]
fn box_beyond_the_edge_is_discarded() {
  // 中心在输入右侧之外，截断后 x1 == x2 == 1
  let output = raw_output(&[&[40.0], &[16.0], &[8.0], &[8.0], &[0.9], &[0.0]]);
  assert!(detector().postprocess(&output.data, &output.shape).is_empty());
}

#[test]
fn empty_tensors_yield_no_detections() {
  let detector = detector();
  assert!(detector.postprocess(&[], &[1, 6, 0]).is_empty());
  assert!(detector.postprocess(&[], &[1, 0, 0]).is_empty());
  assert!(detector.postprocess(&[], &[]).is_empty());
  assert!(detector.postprocess(&[0.5; 5], &[1, 6, 1]).is_empty());
}

#[test]
fn looser_threshold_never_keeps_fewer_strips() {
  // 相邻条带 IoU 依次为 0.6, 0.333, 0.143, 0
  let boxes: Vec<BoundingBox> = (0..5).map(|k| strip(k, 0.9 - 0.1 * k as f32)).collect();
  let thresholds = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.7, 0.9, 1.0];
  let counts: Vec<usize> = thresholds
    .iter()
    .map(|&t| suppress(boxes.clone(), t).len())
    .collect();

  assert_eq!(counts, vec![1, 2, 2, 2, 3, 3, 5, 5, 5]);
  assert!(counts.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn detect_runs_the_whole_pipeline() {
  let detector = detector();
  let image = RgbImage::from_pixel(64, 48, Rgb([10, 20, 30]));
  let result = detector.detect(&engine(), &image);

  assert_eq!(result.len(), 2);
  let first = &result.items[0];
  assert_eq!(first.label(), "person");
  assert_eq!(first.confidence(), 0.9);
  assert_eq!(first.corners(), [0.125, 0.125, 0.375, 0.375]);
  assert_eq!(result.items[1].label(), "car");
  assert_eq!(result.items[1].corners(), [0.625, 0.625, 0.875, 0.875]);
}

#[test]
fn mismatched_engine_input_gives_an_empty_result() {
  let detector = detector();
  let engine = ReplayEngine::new(recorded_output(), 3 * 640 * 640);
  let result = detector.detect(&engine, &RgbImage::new(16, 16));
  assert!(result.is_empty());
}

#[test]
fn one_shot_task_renders_the_first_frame() {
  let collector = Collector::default();
  let summary = OneShotTask
    .run_task(frames(3).into_iter(), &detector(), &engine(), &collector)
    .unwrap();

  assert_eq!(summary.processed, 1);
  assert_eq!(summary.detections, 2);
  let rendered = collector.frames.lock().unwrap();
  assert_eq!(rendered.len(), 1);
  assert_eq!(rendered[0].0.index, 1);
  assert_eq!((rendered[0].0.width, rendered[0].0.height), (48, 40));
}

#[test]
fn one_shot_task_without_frames_fails() {
  let collector = Collector::default();
  let outcome = OneShotTask.run_task(
    std::iter::empty::<RgbImage>(),
    &detector(),
    &engine(),
    &collector,
  );
  assert!(outcome.is_err());
  assert!(collector.frames.lock().unwrap().is_empty());
}

#[test]
fn continuous_task_accounts_for_every_frame() {
  let collector = Collector::default();
  let summary = ContinuousTask::default()
    .run_task(frames(12).into_iter(), &detector(), &engine(), &collector)
    .unwrap();

  assert!(summary.processed >= 1);
  assert_eq!(summary.processed + summary.dropped, 12);
  assert_eq!(summary.detections, summary.processed * 2);

  let rendered = collector.frames.lock().unwrap();
  assert_eq!(rendered.len() as u64, summary.processed);
  assert!(rendered.windows(2).all(|w| w[0].0.index < w[1].0.index));
  assert_eq!(rendered.last().map(|(frame, _)| frame.index), Some(12));
}

#[test]
fn continuous_task_stops_at_frame_number() {
  let collector = Collector::default();
  let summary = ContinuousTask::default()
    .with_frame_number(Some(1))
    .with_fps(Some(200.0))
    .run_task(frames(8).into_iter(), &detector(), &engine(), &collector)
    .unwrap();

  assert_eq!(summary.processed, 1);
  assert_eq!(collector.frames.lock().unwrap().len(), 1);
}

#[test]
fn interruptible_task_runs_twice_in_one_process() {
  for _ in 0..2 {
    let collector = Collector::default();
    let summary = ContinuousTask::default()
      .with_interrupt(true)
      .run_task(frames(3).into_iter(), &detector(), &engine(), &collector)
      .unwrap();
    assert_eq!(summary.processed + summary.dropped, 3);
  }
}

#[test]
fn json_lines_output_records_each_frame() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("detections.jsonl");
  let output = JsonLinesOutput::create(&path).unwrap();

  let summary = OneShotTask
    .run_task(frames(1).into_iter(), &detector(), &engine(), &output)
    .unwrap();
  assert_eq!(summary.processed, 1);
  drop(output);

  let text = std::fs::read_to_string(&path).unwrap();
  let lines: Vec<&str> = text.lines().collect();
  assert_eq!(lines.len(), 1);

  let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
  assert_eq!(record["frame"]["index"], 1);
  let detections = record["detections"].as_array().unwrap();
  assert_eq!(detections.len(), 2);
  assert_eq!(detections[0]["label"], "person");
  assert_eq!(detections[1]["class_id"], 1);
}

#[cfg(feature = "read_image_file")]
#[test]
fn folder_input_feeds_the_continuous_task() {
  use lingshi::{FromUrl, input::InputWrapper};

  let dir = tempfile::tempdir().unwrap();
  for (i, frame) in frames(3).iter().enumerate() {
    frame.save(dir.path().join(format!("{i:03}.png"))).unwrap();
  }
  std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

  let url = url::Url::parse(&format!("folder://{}", dir.path().display())).unwrap();
  let input = InputWrapper::from_url(&url).unwrap();

  let collector = Collector::default();
  let summary = ContinuousTask::default()
    .run_task(input, &detector(), &engine(), &collector)
    .unwrap();

  assert_eq!(summary.processed + summary.dropped, 3);
  let rendered = collector.frames.lock().unwrap();
  assert_eq!(rendered.last().map(|(frame, _)| frame.index), Some(3));
  assert!(rendered.iter().all(|(frame, _)| frame.width == 48 && frame.height == 40));
}
