// 该文件是 Lingshi （灵视） 项目的一部分。
// src/output/directory_record.rs - 按日期目录记录检测结果
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

use chrono::Utc;
use thiserror::Error;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::FrameMeta,
  model::DetectResult,
  output::{Render, format_record},
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 每帧写入一个 `.txt` 记录，位于 `目录/年/月/日/` 下
///
/// 首行为 `# 帧序号 宽x高 耗时毫秒`，其后每个检测框一行。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  label_with_name: bool,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let label_with_name = !uri
      .query_pairs()
      .any(|(k, v)| k == "record" && v == "id");
    let always = uri.query_pairs().any(|(k, _)| k == "always");

    Ok(DirectoryRecordOutput {
      directory: PathBuf::from(uri.path()),
      label_with_name,
      always,
    })
  }
}

impl DirectoryRecordOutput {
  fn frame_path(&self, frame: &FrameMeta) -> Result<PathBuf, DirectoryRecordOutputError> {
    let now = Utc::now();
    let day = self.directory.join(now.format("%Y/%m/%d").to_string());
    std::fs::create_dir_all(&day)?;
    Ok(day.join(format!("{}-{:08}.txt", now.format("%H-%M-%S"), frame.index)))
  }
}

impl Render<DetectResult> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &FrameMeta, result: &DetectResult) -> Result<(), Self::Error> {
    if result.is_empty() && !self.always {
      return Ok(());
    }

    let mut text = format!(
      "# {} {}x{} {:.3}\n",
      frame.index,
      frame.width,
      frame.height,
      result.elapsed.as_secs_f64() * 1000.0
    );
    text.push_str(&format_record(result, self.label_with_name));
    std::fs::write(self.frame_path(frame)?, text)?;
    Ok(())
  }
}
