// 该文件是 Lingshi （灵视） 项目的一部分。
// src/input/folder_input.rs - 目录图像序列输入
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

use std::path::{Path, PathBuf};

use image::RgbImage;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(Error, Debug)]
pub enum FolderInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("目录中没有图像: {0}")]
  NoImages(String),
}

/// 按文件名顺序逐帧读取目录中的图像，`?repeat` 时循环播放
///
/// 无法解码的文件会被跳过。
pub struct FolderInput {
  paths: Vec<PathBuf>,
  cursor: usize,
  repeat: bool,
}

impl FolderInput {
  pub fn open<P: AsRef<Path>>(directory: P) -> Result<Self, FolderInputError> {
    let directory = directory.as_ref();
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(directory)? {
      let path = entry?.path();
      let is_image = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
      if is_image && path.is_file() {
        paths.push(path);
      }
    }
    if paths.is_empty() {
      return Err(FolderInputError::NoImages(directory.display().to_string()));
    }
    paths.sort();
    info!("目录 {} 中共 {} 张图像", directory.display(), paths.len());

    Ok(Self {
      paths,
      cursor: 0,
      repeat: false,
    })
  }

  pub fn with_repeat(mut self, repeat: bool) -> Self {
    self.repeat = repeat;
    self
  }

  pub fn len(&self) -> usize {
    self.paths.len()
  }

  pub fn is_empty(&self) -> bool {
    self.paths.is_empty()
  }
}

impl FromUrlWithScheme for FolderInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for FolderInput {
  type Error = FolderInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(FolderInputError::SchemeMismatch);
    }
    let repeat = url.query_pairs().any(|(k, _)| k == "repeat");
    Ok(Self::open(url.path())?.with_repeat(repeat))
  }
}

impl Iterator for FolderInput {
  type Item = RgbImage;

  fn next(&mut self) -> Option<Self::Item> {
    // 一轮内全部解码失败时停止，避免循环模式下空转
    let mut failures = 0;
    while failures < self.paths.len() {
      if self.cursor >= self.paths.len() {
        if !self.repeat {
          return None;
        }
        self.cursor = 0;
      }

      let path = &self.paths[self.cursor];
      self.cursor += 1;
      match image::open(path) {
        Ok(image) => return Some(image.into_rgb8()),
        Err(e) => {
          warn!("跳过无法读取的图像 {}: {}", path.display(), e);
          failures += 1;
        }
      }
    }
    None
  }
}
