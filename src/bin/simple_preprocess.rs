// 该文件是 Lingshi （灵视） 项目的一部分。
// src/bin/simple_preprocess.rs - 生成模型输入张量
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

use std::{
  fs::File,
  io::{BufWriter, Write},
  path::PathBuf,
};

use anyhow::Result;
use clap::Parser;
use tracing::info;
use url::Url;

use lingshi::{FromUrl, input::ImageFileInput, preprocess::Preprocessor};

/// 将一张图像转换为 [1, 3, H, W] 的小端 f32 张量文件
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 输入图像
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出文件
  #[arg(long, value_name = "FILE")]
  pub output: PathBuf,
  /// 模型输入宽度
  #[arg(long, default_value = "640")]
  pub width: u32,
  /// 模型输入高度
  #[arg(long, default_value = "640")]
  pub height: u32,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  info!("输入来源: {}", args.input);
  info!("输出文件: {}", args.output.display());

  let mut input = ImageFileInput::from_url(&args.input)?;
  let image = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;

  let now = std::time::Instant::now();
  let tensor = Preprocessor::new(args.width, args.height).process(&image);
  info!("预处理完成，耗时: {:.2?}, 形状: {:?}", now.elapsed(), tensor.shape());

  let mut writer = BufWriter::new(File::create(&args.output)?);
  for value in tensor.as_nchw() {
    writer.write_all(&value.to_le_bytes())?;
  }
  writer.flush()?;

  Ok(())
}
