// 该文件是 Lingshi （灵视） 项目的一部分。
// src/preprocess.rs - 图像预处理
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

use image::{RgbImage, imageops::FilterType};
use tracing::{debug, warn};

use crate::frame::{PlanarTensor, RGB_CHANNELS};

/// 将 RGB 图像缩放并转换为 [0, 1] 范围的平面浮点张量
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
  width: u32,
  height: u32,
  filter: FilterType,
}

impl Preprocessor {
  pub fn new(width: u32, height: u32) -> Self {
    Self {
      width,
      height,
      // 双线性插值
      filter: FilterType::Triangle,
    }
  }

  pub fn with_filter(mut self, filter: FilterType) -> Self {
    self.filter = filter;
    self
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn process(&self, image: &RgbImage) -> PlanarTensor {
    let mut tensor = PlanarTensor::with_shape(self.height as usize, self.width as usize);
    self.process_into(image, &mut tensor);
    tensor
  }

  /// 写入调用方持有的缓冲，尺寸不符时重新分配
  pub fn process_into(&self, image: &RgbImage, tensor: &mut PlanarTensor) {
    self.prepare(tensor);

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
      warn!("输入图像为空 ({}x{})，输出全零张量", width, height);
      return;
    }

    if (width, height) == (self.width, self.height) {
      fill_planar(image.as_raw(), width as usize, tensor);
    } else {
      debug!(
        "缩放图像 {}x{} -> {}x{}",
        width, height, self.width, self.height
      );
      let resized = image::imageops::resize(image, self.width, self.height, self.filter);
      fill_planar(resized.as_raw(), self.width as usize, tensor);
    }
  }

  /// 处理按行紧密排列的 RGB 字节缓冲
  ///
  /// 缓冲不足 `width * height * 3` 时，缺失的像素保持为 0，不会越界访问。
  pub fn process_raw(&self, data: &[u8], width: u32, height: u32) -> PlanarTensor {
    let mut tensor = PlanarTensor::with_shape(self.height as usize, self.width as usize);
    let expected = RGB_CHANNELS * width as usize * height as usize;
    if data.len() < expected {
      warn!(
        "像素缓冲长度不足: 期望 {}, 实际 {}，缺失部分将被跳过",
        expected,
        data.len()
      );
    }

    if (width, height) == (self.width, self.height) {
      fill_planar(data, width as usize, &mut tensor);
      return tensor;
    }

    let mut padded = data.to_vec();
    padded.resize(expected, 0);
    match RgbImage::from_raw(width, height, padded) {
      Some(image) => self.process_into(&image, &mut tensor),
      None => warn!("无法构造 {}x{} 图像，输出全零张量", width, height),
    }
    tensor
  }

  fn prepare(&self, tensor: &mut PlanarTensor) {
    if tensor.width() != self.width as usize || tensor.height() != self.height as usize {
      debug!(
        "输入缓冲尺寸 {}x{} 与模型输入 {}x{} 不符，重新分配",
        tensor.width(),
        tensor.height(),
        self.width,
        self.height
      );
      *tensor = PlanarTensor::with_shape(self.height as usize, self.width as usize);
    } else {
      tensor.clear();
    }
  }
}

/// 将交错 RGB 字节写为平面张量，越界的像素直接跳过
fn fill_planar(src: &[u8], src_width: usize, tensor: &mut PlanarTensor) {
  let width = tensor.width();
  let height = tensor.height();
  let plane = width * height;
  let slice = tensor.as_mut();

  for y in 0..height {
    for x in 0..width {
      let pixel = (y * src_width + x) * RGB_CHANNELS;
      if pixel + RGB_CHANNELS > src.len() {
        continue;
      }
      let index = y * width + x;
      for c in 0..RGB_CHANNELS {
        slice[c * plane + index] = src[pixel + c] as f32 / 255.0;
      }
    }
  }
}
