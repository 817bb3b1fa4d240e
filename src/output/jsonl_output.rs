// 该文件是 Lingshi （灵视） 项目的一部分。
// src/output/jsonl_output.rs - JSON Lines 输出
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
  path::Path,
  sync::{Mutex, PoisonError},
};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::FrameMeta,
  model::{BoundingBox, DetectResult},
  output::Render,
};

#[derive(Error, Debug)]
pub enum JsonLinesOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct FrameRecord<'a> {
  timestamp: String,
  frame: &'a FrameMeta,
  elapsed_ms: f64,
  detections: &'a [BoundingBox],
}

/// 每帧写入一行 JSON，路径为 `-` 时写到标准输出
pub struct JsonLinesOutput {
  writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesOutput {
  pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
    Self {
      writer: Mutex::new(Box::new(writer)),
    }
  }

  pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, JsonLinesOutputError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)?;
      }
    }
    info!("写入检测记录到: {}", path.display());
    Ok(Self::from_writer(BufWriter::new(File::create(path)?)))
  }
}

impl FromUrlWithScheme for JsonLinesOutput {
  const SCHEME: &'static str = "jsonl";
}

impl FromUrl for JsonLinesOutput {
  type Error = JsonLinesOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(JsonLinesOutputError::SchemeMismatch);
    }
    match url.path() {
      "-" => Ok(Self::from_writer(std::io::stdout())),
      path => Self::create(path),
    }
  }
}

impl Render<DetectResult> for JsonLinesOutput {
  type Error = JsonLinesOutputError;

  fn render_result(&self, frame: &FrameMeta, result: &DetectResult) -> Result<(), Self::Error> {
    let record = FrameRecord {
      timestamp: Utc::now().to_rfc3339(),
      frame,
      elapsed_ms: result.elapsed.as_secs_f64() * 1000.0,
      detections: &result.items,
    };

    let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
    serde_json::to_writer(&mut *writer, &record)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
  }
}
