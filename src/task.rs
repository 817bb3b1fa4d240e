// 该文件是 Lingshi （灵视） 项目的一部分。
// src/task.rs - 推理任务
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
  sync::{
    Arc, Condvar, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
  },
  thread,
  time::Duration,
};

use image::RgbImage;
use tracing::{debug, info, warn};

use crate::{
  detector::Detector,
  frame::{FrameMeta, PlanarTensor},
  model::{DetectResult, InferenceEngine},
  output::Render,
};

/// 只保存最新一帧的单槽信箱
///
/// 新帧到达时若上一帧尚未被取走，旧帧被直接丢弃。
pub struct LatestFrame<T> {
  state: Mutex<SlotState<T>>,
  ready: Condvar,
}

struct SlotState<T> {
  pending: Option<T>,
  closed: bool,
  dropped: u64,
}

impl<T> Default for LatestFrame<T> {
  fn default() -> Self {
    Self {
      state: Mutex::new(SlotState {
        pending: None,
        closed: false,
        dropped: 0,
      }),
      ready: Condvar::new(),
    }
  }
}

impl<T> LatestFrame<T> {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, SlotState<T>> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// 放入新帧，替换尚未处理的旧帧；信箱关闭后返回 `false`
  pub fn submit(&self, item: T) -> bool {
    let mut state = self.lock();
    if state.closed {
      return false;
    }
    if state.pending.replace(item).is_some() {
      state.dropped += 1;
    }
    drop(state);
    self.ready.notify_one();
    true
  }

  /// 阻塞直到有帧可取；信箱关闭且为空时返回 `None`
  pub fn take(&self) -> Option<T> {
    let guard = self.lock();
    let mut state = self
      .ready
      .wait_while(guard, |s| s.pending.is_none() && !s.closed)
      .unwrap_or_else(PoisonError::into_inner);
    state.pending.take()
  }

  pub fn try_take(&self) -> Option<T> {
    self.lock().pending.take()
  }

  pub fn close(&self) {
    self.lock().closed = true;
    self.ready.notify_all();
  }

  pub fn is_closed(&self) -> bool {
    self.lock().closed
  }

  /// 被新帧覆盖而丢弃的帧数
  pub fn dropped(&self) -> u64 {
    self.lock().dropped
  }
}

pub trait Task<I, E, O>: Sized {
  type Error;
  fn run_task(self, input: I, detector: &Detector, engine: &E, output: &O)
  -> Result<TaskSummary, Self::Error>;
}

/// 任务结束时的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSummary {
  pub processed: u64,
  pub dropped: u64,
  pub detections: u64,
}

fn frame_meta(index: u64, image: &RgbImage) -> FrameMeta {
  FrameMeta {
    index,
    width: image.width(),
    height: image.height(),
  }
}

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static HANDLER_INSTALLED: Mutex<bool> = Mutex::new(false);

/// 进程内只注册一次 Ctrl-C 处理函数，每次调用都会清除上次的中断标记
fn arm_interrupt() -> Result<(), ctrlc::Error> {
  let mut installed = HANDLER_INSTALLED
    .lock()
    .unwrap_or_else(PoisonError::into_inner);
  if !*installed {
    ctrlc::set_handler(|| {
      info!("收到中断信号，准备退出...");
      INTERRUPTED.store(true, Ordering::SeqCst);
    })?;
    *installed = true;
  }
  INTERRUPTED.store(false, Ordering::SeqCst);
  Ok(())
}

/// 只处理第一帧
pub struct OneShotTask;

impl<I, E, O> Task<I, E, O> for OneShotTask
where
  I: Iterator<Item = RgbImage>,
  E: InferenceEngine,
  O: Render<DetectResult>,
  O::Error: std::error::Error + Send + Sync + 'static,
{
  type Error = anyhow::Error;

  fn run_task(
    self,
    mut input: I,
    detector: &Detector,
    engine: &E,
    output: &O,
  ) -> Result<TaskSummary, Self::Error> {
    info!("开始任务...");
    let image = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    let result = detector.detect(engine, &image);
    info!("检测完成，耗时: {:.2?}", result.elapsed);
    output.render_result(&frame_meta(1, &image), &result)?;

    Ok(TaskSummary {
      processed: 1,
      dropped: 0,
      detections: result.len() as u64,
    })
  }
}

/// 连续处理输入流，始终只处理最新的一帧
///
/// 输入在独立线程中读取；检测在调用线程进行，来不及处理的帧被丢弃。
#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<u64>,
  frame_interval: Option<Duration>,
  handle_interrupt: bool,
}

impl ContinuousTask {
  /// 处理指定帧数后退出
  pub fn with_frame_number(mut self, frame_number: Option<u64>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 按给定帧率读取输入，模拟实时视频源
  pub fn with_fps(mut self, fps: Option<f64>) -> Self {
    self.frame_interval = fps
      .filter(|fps| fps.is_finite() && *fps > 0.0)
      .map(|fps| Duration::from_secs_f64(1.0 / fps));
    self
  }

  /// 收到 Ctrl-C 时结束任务
  ///
  /// 处理函数在进程内共享，同一进程可以多次运行带中断的任务。
  pub fn with_interrupt(mut self, handle_interrupt: bool) -> Self {
    self.handle_interrupt = handle_interrupt;
    self
  }
}

impl<I, E, O> Task<I, E, O> for ContinuousTask
where
  I: Iterator<Item = RgbImage> + Send + 'static,
  E: InferenceEngine,
  O: Render<DetectResult>,
  O::Error: std::error::Error + Send + Sync + 'static,
{
  type Error = anyhow::Error;

  fn run_task(
    self,
    input: I,
    detector: &Detector,
    engine: &E,
    output: &O,
  ) -> Result<TaskSummary, Self::Error> {
    info!("开始任务...");
    if self.handle_interrupt {
      arm_interrupt()?;
    }

    let slot = Arc::new(LatestFrame::<(u64, RgbImage)>::new());
    let producer = {
      let slot = Arc::clone(&slot);
      let interval = self.frame_interval;
      thread::spawn(move || {
        for (index, image) in (1u64..).zip(input) {
          if !slot.submit((index, image)) {
            break;
          }
          if let Some(interval) = interval {
            thread::sleep(interval);
          }
        }
        slot.close();
      })
    };

    let mut summary = TaskSummary::default();
    let mut tensor = PlanarTensor::with_shape(
      detector.config().input_height as usize,
      detector.config().input_width as usize,
    );
    let mut failure = None;

    while let Some((index, image)) = slot.take() {
      let result = detector.detect_with_buffer(engine, &image, &mut tensor);
      debug!("第 {} 帧检测完成，耗时: {:.2?}", index, result.elapsed);
      summary.processed += 1;
      summary.detections += result.len() as u64;

      if let Err(e) = output.render_result(&frame_meta(index, &image), &result) {
        failure = Some(anyhow::Error::new(e));
        break;
      }
      if self.frame_number.is_some_and(|n| summary.processed >= n) {
        info!("达到指定帧数 {}, 退出任务循环", summary.processed);
        break;
      }
      if self.handle_interrupt && INTERRUPTED.swap(false, Ordering::SeqCst) {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    slot.close();
    if producer.join().is_err() {
      warn!("输入线程异常退出");
    }
    summary.dropped = slot.dropped();
    info!(
      "任务完成: 处理 {} 帧, 丢弃 {} 帧, 共 {} 个检测结果",
      summary.processed, summary.dropped, summary.detections
    );

    match failure {
      Some(e) => Err(e),
      None => Ok(summary),
    }
  }
}
