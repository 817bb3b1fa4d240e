// 该文件是 Lingshi （灵视） 项目的一部分。
// src/model/tensor.rs - 检测头输出张量访问
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

use ndarray::{ArrayView1, ArrayView2, Axis};
use thiserror::Error;

/// 坐标通道数 (cx, cy, w, h)
pub const BOX_CHANNELS: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TensorError {
  #[error("不支持的张量维度: {0:?}")]
  RankMismatch(Vec<usize>),
  #[error("批大小必须为 1, 实际为 {0}")]
  BatchSize(usize),
  #[error("空张量: {0:?}")]
  Empty(Vec<usize>),
  #[error("通道数 {0} 不足，至少需要 {min} 个", min = BOX_CHANNELS + 1)]
  TooFewChannels(usize),
  #[error("张量形状不匹配: 形状 {shape:?} 需要 {expected} 个元素, 实际 {actual} 个")]
  ShapeMismatch {
    shape: Vec<usize>,
    expected: usize,
    actual: usize,
  },
}

/// 形状为 [4 + C, N] 的输出张量视图
#[derive(Debug, Clone, Copy)]
pub struct OutputTensor<'a> {
  view: ArrayView2<'a, f32>,
}

impl<'a> OutputTensor<'a> {
  /// 接受 [1, 4 + C, N] 或 [4 + C, N]，批维度会被去掉
  pub fn from_shape(data: &'a [f32], shape: &[usize]) -> Result<Self, TensorError> {
    let (channels, boxes) = match *shape {
      [batch, channels, boxes] => {
        if batch != 1 {
          return Err(TensorError::BatchSize(batch));
        }
        (channels, boxes)
      }
      [channels, boxes] => (channels, boxes),
      _ => return Err(TensorError::RankMismatch(shape.to_vec())),
    };

    if channels == 0 || boxes == 0 {
      return Err(TensorError::Empty(shape.to_vec()));
    }
    if channels <= BOX_CHANNELS {
      return Err(TensorError::TooFewChannels(channels));
    }

    let mismatch = || TensorError::ShapeMismatch {
      shape: shape.to_vec(),
      expected: channels.saturating_mul(boxes),
      actual: data.len(),
    };
    if channels.checked_mul(boxes) != Some(data.len()) {
      return Err(mismatch());
    }
    let view = ArrayView2::from_shape((channels, boxes), data).map_err(|_| mismatch())?;

    Ok(Self { view })
  }

  pub fn channels(&self) -> usize {
    self.view.nrows()
  }

  pub fn num_boxes(&self) -> usize {
    self.view.ncols()
  }

  pub fn num_classes(&self) -> usize {
    self.channels() - BOX_CHANNELS
  }

  /// 单个通道在所有候选框上的取值
  ///
  /// # Panics
  ///
  /// `channel >= self.channels()` 时 panic。
  pub fn channel(&self, channel: usize) -> ArrayView1<'a, f32> {
    let view = self.view;
    view.index_axis_move(Axis(0), channel)
  }

  /// 第 `class_id` 个类别的得分
  ///
  /// # Panics
  ///
  /// `class_id >= self.num_classes()` 时 panic。
  pub fn class_scores(&self, class_id: usize) -> ArrayView1<'a, f32> {
    self.channel(BOX_CHANNELS + class_id)
  }

  /// 第 `index` 个候选框的 [cx, cy, w, h]
  ///
  /// # Panics
  ///
  /// `index >= self.num_boxes()` 时 panic。
  pub fn box_at(&self, index: usize) -> [f32; 4] {
    [
      self.view[[0, index]],
      self.view[[1, index]],
      self.view[[2, index]],
      self.view[[3, index]],
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn batch_dimension_is_stripped() {
    let data = [0.0f32; 12];
    let tensor = OutputTensor::from_shape(&data, &[1, 6, 2]).unwrap();
    assert_eq!(tensor.channels(), 6);
    assert_eq!(tensor.num_boxes(), 2);
    assert_eq!(tensor.num_classes(), 2);
  }

  #[test]
  fn channel_major_layout() {
    // 通道 0..5，每个通道 2 个候选框
    let data: Vec<f32> = (0..10).map(|v| v as f32).collect();
    let tensor = OutputTensor::from_shape(&data, &[5, 2]).unwrap();
    assert_eq!(tensor.box_at(1), [1.0, 3.0, 5.0, 7.0]);
    assert_eq!(tensor.class_scores(0).to_vec(), vec![8.0, 9.0]);
  }

  #[test]
  #[should_panic]
  fn box_index_out_of_range_panics() {
    let data = [0.0f32; 10];
    let tensor = OutputTensor::from_shape(&data, &[5, 2]).unwrap();
    tensor.box_at(2);
  }

  #[test]
  #[should_panic]
  fn class_out_of_range_panics() {
    let data = [0.0f32; 10];
    let tensor = OutputTensor::from_shape(&data, &[5, 2]).unwrap();
    tensor.class_scores(1);
  }

  #[test]
  fn malformed_shapes_are_reported() {
    let data = [0.0f32; 12];
    assert_eq!(
      OutputTensor::from_shape(&data, &[2, 6, 1]).unwrap_err(),
      TensorError::BatchSize(2)
    );
    assert_eq!(
      OutputTensor::from_shape(&data, &[12]).unwrap_err(),
      TensorError::RankMismatch(vec![12])
    );
    assert_eq!(
      OutputTensor::from_shape(&data, &[4, 3]).unwrap_err(),
      TensorError::TooFewChannels(4)
    );
    assert_eq!(
      OutputTensor::from_shape(&data, &[1, 6, 3]).unwrap_err(),
      TensorError::ShapeMismatch {
        shape: vec![1, 6, 3],
        expected: 18,
        actual: 12
      }
    );
  }

  #[test]
  fn empty_shapes_are_reported() {
    assert_eq!(
      OutputTensor::from_shape(&[], &[1, 84, 0]).unwrap_err(),
      TensorError::Empty(vec![1, 84, 0])
    );
    assert_eq!(
      OutputTensor::from_shape(&[], &[0, 8400]).unwrap_err(),
      TensorError::Empty(vec![0, 8400])
    );
  }
}
