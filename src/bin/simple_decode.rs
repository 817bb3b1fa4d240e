// 该文件是 Lingshi （灵视） 项目的一部分。
// src/bin/simple_decode.rs - 解码录制的输出张量
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

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use lingshi::{Detector, DetectorConfig, Labels, model::ReplayEngine};

/// 解码一个录制的输出张量并以 JSON 打印检测结果
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 录制的模型输出张量 (JSON)
  #[arg(long, value_name = "FILE")]
  pub tensor: PathBuf,
  /// 标签文件，不指定时使用 COCO 类别
  #[arg(long, value_name = "FILE")]
  pub labels: Option<PathBuf>,
  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.25", value_name = "THRESHOLD")]
  pub confidence: f32,
  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.5", value_name = "THRESHOLD")]
  pub iou_threshold: f32,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  info!("录制张量: {}", args.tensor.display());

  let config = DetectorConfig::default()
    .with_confidence_threshold(args.confidence)
    .with_iou_threshold(args.iou_threshold);
  let labels = match &args.labels {
    Some(path) => Labels::from_path(path)?,
    None => Labels::coco(),
  };
  let engine = ReplayEngine::from_path(&args.tensor, config.input_len())?;
  let detector = Detector::new(config, labels)?;

  let now = std::time::Instant::now();
  let output = engine.output();
  let boxes = detector.postprocess(&output.data, &output.shape);
  info!("后处理完成，耗时: {:.2?}, 共 {} 个检测框", now.elapsed(), boxes.len());

  println!("{}", serde_json::to_string_pretty(&boxes)?);
  Ok(())
}
