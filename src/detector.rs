// 该文件是 Lingshi （灵视） 项目的一部分。
// src/detector.rs - 检测流水线
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

use std::time::Instant;

use image::RgbImage;
use tracing::{debug, warn};

use crate::{
  config::{ConfigError, DetectorConfig},
  frame::PlanarTensor,
  label::Labels,
  model::{
    BoundingBox, DetectResult, InferenceEngine, OutputTensor, TensorError, decode,
    suppress_with_mode,
  },
  preprocess::Preprocessor,
};

/// 预处理与后处理的组合，不保存任何跨帧状态
#[derive(Debug, Clone)]
pub struct Detector {
  config: DetectorConfig,
  labels: Labels,
  preprocessor: Preprocessor,
}

impl Detector {
  pub fn new(config: DetectorConfig, labels: Labels) -> Result<Self, ConfigError> {
    config.validate()?;
    debug!("检测配置: {:?}, 类别数: {}", config, labels.len());
    Ok(Self {
      preprocessor: Preprocessor::new(config.input_width, config.input_height),
      config,
      labels,
    })
  }

  pub fn config(&self) -> &DetectorConfig {
    &self.config
  }

  pub fn labels(&self) -> &Labels {
    &self.labels
  }

  pub fn preprocess(&self, image: &RgbImage) -> PlanarTensor {
    self.preprocessor.process(image)
  }

  pub fn preprocess_into(&self, image: &RgbImage, tensor: &mut PlanarTensor) {
    self.preprocessor.process_into(image, tensor)
  }

  /// 解码并抑制原始输出，任何形状问题都只会得到空结果
  pub fn postprocess(&self, data: &[f32], shape: &[usize]) -> Vec<BoundingBox> {
    let output = match OutputTensor::from_shape(data, shape) {
      Ok(output) => output,
      Err(TensorError::Empty(shape)) => {
        debug!("输出张量为空: {:?}", shape);
        return Vec::new();
      }
      Err(e) => {
        warn!("输出张量无法解析，本帧无检测结果: {}", e);
        return Vec::new();
      }
    };

    let candidates = decode(&output, output.num_classes(), &self.config, &self.labels);
    suppress_with_mode(candidates, self.config.iou_threshold, self.config.nms_mode)
  }

  pub fn detect<E: InferenceEngine>(&self, engine: &E, image: &RgbImage) -> DetectResult {
    let mut tensor = PlanarTensor::with_shape(
      self.config.input_height as usize,
      self.config.input_width as usize,
    );
    self.detect_with_buffer(engine, image, &mut tensor)
  }

  /// 与 `detect` 相同，但复用调用方的输入缓冲
  ///
  /// 推理失败时记录日志并返回空结果。
  pub fn detect_with_buffer<E: InferenceEngine>(
    &self,
    engine: &E,
    image: &RgbImage,
    tensor: &mut PlanarTensor,
  ) -> DetectResult {
    let now = Instant::now();
    self.preprocess_into(image, tensor);

    let items = match engine.infer(tensor) {
      Ok(output) => self.postprocess(&output.data, &output.shape),
      Err(e) => {
        warn!("推理失败，本帧无检测结果: {}", e);
        Vec::new()
      }
    };

    let elapsed = now.elapsed();
    debug!("检测到 {} 个物体，耗时: {:.2?}", items.len(), elapsed);
    DetectResult::new(items, elapsed)
  }
}
