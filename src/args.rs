// 该文件是 Lingshi （灵视） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use lingshi::{DetectorConfig, Labels};
use url::Url;

/// Lingshi 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入来源
  /// 支持格式:
  /// - 图片: image:///path/to/frame.png
  /// - 图像序列: folder:///path/to/frames[?repeat]
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 录制的模型输出张量 (JSON)
  #[arg(long, value_name = "FILE")]
  pub tensor: PathBuf,

  /// 标签文件，每行一个类别，不指定时使用 COCO 类别
  #[arg(long, value_name = "FILE")]
  pub labels: Option<PathBuf>,

  /// 输出路径
  /// 支持格式:
  /// - 日志: log:stdout[?always]
  /// - JSON Lines: jsonl:///path/to/out.jsonl 或 jsonl:-
  /// - 目录记录: folder:///path/to/records[?record=id][&always]
  #[arg(long, value_name = "OUTPUT", default_value = "log:stdout")]
  pub output: Url,

  /// 配置文件 (JSON)，命令行阈值优先
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, value_name = "THRESHOLD")]
  pub confidence: Option<f32>,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, value_name = "THRESHOLD")]
  pub iou_threshold: Option<f32>,

  /// 最大处理帧数
  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<u64>,

  /// 输入帧率，不指定时尽快读取
  #[arg(long, value_name = "FPS")]
  pub fps: Option<f64>,
}

impl Args {
  pub fn detector_config(&self) -> anyhow::Result<DetectorConfig> {
    let mut config = match &self.config {
      Some(path) => DetectorConfig::from_path(path)?,
      None => DetectorConfig::default(),
    };
    if let Some(threshold) = self.confidence {
      config = config.with_confidence_threshold(threshold);
    }
    if let Some(threshold) = self.iou_threshold {
      config = config.with_iou_threshold(threshold);
    }
    config.validate()?;
    Ok(config)
  }

  pub fn labels(&self) -> anyhow::Result<Labels> {
    match &self.labels {
      Some(path) => Ok(Labels::from_path(path)?),
      None => Ok(Labels::coco()),
    }
  }
}
