// 该文件是 Lingshi （灵视） 项目的一部分。
// src/output/log_output.rs - 日志输出
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

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme, frame::FrameMeta, model::DetectResult, output::Render,
};

#[derive(Error, Debug)]
pub enum LogOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

/// 通过 tracing 打印每帧的检测结果
#[derive(Debug, Default)]
pub struct LogOutput {
  /// 为空帧也打印一条记录
  always: bool,
}

impl LogOutput {
  pub fn with_always(mut self, always: bool) -> Self {
    self.always = always;
    self
  }
}

impl FromUrlWithScheme for LogOutput {
  const SCHEME: &'static str = "log";
}

impl FromUrl for LogOutput {
  type Error = LogOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(LogOutputError::SchemeMismatch);
    }
    let always = url.query_pairs().any(|(k, _)| k == "always");
    Ok(LogOutput { always })
  }
}

impl Render<DetectResult> for LogOutput {
  type Error = LogOutputError;

  fn render_result(&self, frame: &FrameMeta, result: &DetectResult) -> Result<(), Self::Error> {
    if result.is_empty() {
      if self.always {
        info!("帧 {}: 无检测结果 ({:.2?})", frame.index, result.elapsed);
      }
      return Ok(());
    }

    info!(
      "帧 {}: 检测到 {} 个对象 ({:.2?})",
      frame.index,
      result.len(),
      result.elapsed
    );
    for item in result.iter() {
      let [x1, y1, x2, y2] = item.to_pixels(frame.width, frame.height);
      info!(
        "  - {}: {:.2}% at ({:.0}, {:.0}, {:.0}x{:.0})",
        item.label(),
        item.confidence() * 100.0,
        x1,
        y1,
        x2 - x1,
        y2 - y1
      );
    }
    debug!("帧 {} 检测结果: {:?}", frame.index, result.items);
    Ok(())
  }
}
