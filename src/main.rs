// 该文件是 Lingshi （灵视） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use lingshi::{
  Detector, FromUrl,
  input::InputWrapper,
  model::ReplayEngine,
  output::OutputWrapper,
  task::{ContinuousTask, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("输入来源: {}", args.input);
  info!("录制张量: {}", args.tensor.display());
  info!("输出路径: {}", args.output);

  let config = args.detector_config()?;
  info!(
    "置信度阈值: {}, NMS 阈值: {}",
    config.confidence_threshold, config.iou_threshold
  );

  let labels = args.labels()?;
  let engine = ReplayEngine::from_path(&args.tensor, config.input_len())?;
  let detector = Detector::new(config, labels)?;

  let input = InputWrapper::from_url(&args.input)?;
  let output = OutputWrapper::from_url(&args.output)?;

  let summary = ContinuousTask::default()
    .with_frame_number(args.frame_number)
    .with_fps(args.fps)
    .with_interrupt(true)
    .run_task(input, &detector, &engine, &output)?;

  info!("总帧数: {}", summary.processed);
  info!("丢弃帧数: {}", summary.dropped);
  info!("总检测数: {}", summary.detections);

  Ok(())
}
