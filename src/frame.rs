// 该文件是 Lingshi （灵视） 项目的一部分。
// src/frame.rs - 平面 (NCHW) 浮点张量定义
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

use serde::Serialize;

pub const RGB_CHANNELS: usize = 3;

/// 帧序号与原始图像尺寸，供输出端将归一化坐标换算为像素
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameMeta {
  pub index: u64,
  pub width: u32,
  pub height: u32,
}

/// 模型输入张量，布局为 [R 平面][G 平面][B 平面]，每个平面按行优先存储
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarTensor {
  data: Box<[f32]>,
  width: usize,
  height: usize,
}

impl PlanarTensor {
  pub fn with_shape(height: usize, width: usize) -> Self {
    let size = RGB_CHANNELS * width * height;
    Self {
      data: vec![0.0f32; size].into_boxed_slice(),
      width,
      height,
    }
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  /// 对应模型输入形状 [1, 3, H, W]
  pub fn shape(&self) -> [usize; 4] {
    [1, RGB_CHANNELS, self.height, self.width]
  }

  pub fn as_nchw(&self) -> &[f32] {
    &self.data
  }

  /// 单个通道的平面
  ///
  /// # Panics
  ///
  /// `channel` 不小于 3 时 panic。
  pub fn plane(&self, channel: usize) -> &[f32] {
    let size = self.width * self.height;
    &self.data[channel * size..(channel + 1) * size]
  }

  /// 重新使用缓冲前清零
  pub fn clear(&mut self) {
    self.data.fill(0.0);
  }

  pub fn into_vec(self) -> Vec<f32> {
    self.data.into_vec()
  }
}

impl AsRef<[f32]> for PlanarTensor {
  fn as_ref(&self) -> &[f32] {
    &self.data
  }
}

impl AsMut<[f32]> for PlanarTensor {
  fn as_mut(&mut self) -> &mut [f32] {
    &mut self.data
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn planes_partition_the_buffer() {
    let mut tensor = PlanarTensor::with_shape(2, 3);
    assert_eq!(tensor.as_nchw().len(), 18);
    assert_eq!(tensor.shape(), [1, 3, 2, 3]);

    tensor.as_mut()[6] = 1.0;
    assert_eq!(tensor.plane(0), &[0.0; 6]);
    assert_eq!(tensor.plane(1)[0], 1.0);

    tensor.clear();
    assert!(tensor.as_nchw().iter().all(|v| *v == 0.0));
  }

  #[test]
  #[should_panic]
  fn plane_out_of_range_panics() {
    PlanarTensor::with_shape(2, 2).plane(3);
  }
}
