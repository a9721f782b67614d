//! Dual-clock scan pipeline
//!
//! # Architecture
//!
//! ```text
//! FrameSource ──(video tick)──> FrameIntake
//!                                    │ snapshot swap
//!                                    v
//!                              ScanConverter ──(block tick)──> broadcast::Sender<Arc<SignalBlock>>
//!                                                                  │
//!                                                         ┌────────┼────────┐
//!                                                         v        v        v
//!                                                      consumer consumer  ...
//! ```
//!
//! The two tasks never wait on each other: the video task only swaps
//! snapshots in, and the block task only holds the scanner lock for the
//! duration of one block.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use super::mode::ModeCommand;
use super::scan::{FrameIntake, ScanConverter, SignalBlock};
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::video::frame::VideoFrame;

/// Producer of frames for the video-rate task
pub trait FrameSource: Send + 'static {
    fn next_frame(&mut self) -> Result<VideoFrame>;
}

/// Scan pipeline configuration
#[derive(Debug, Clone)]
pub struct ScanPipelineConfig {
    /// Frames pulled from the source per second
    pub fps: u32,
    /// Samples per second per channel
    pub sample_rate: u32,
    /// Samples per channel in each block
    pub block_size: usize,
    /// Broadcast channel capacity
    pub channel_capacity: usize,
    /// Mode applied before the first block
    pub initial_mode: ModeCommand,
}

impl Default for ScanPipelineConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ScanPipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            fps: config.video.fps,
            sample_rate: config.stream.sample_rate,
            block_size: config.stream.block_size,
            channel_capacity: config.stream.channel_capacity,
            initial_mode: config.scan.initial_command(),
        }
    }
}

impl ScanPipelineConfig {
    fn validate(&self) -> Result<()> {
        if self.fps == 0 || self.sample_rate == 0 || self.block_size == 0 {
            return Err(AppError::Config(format!(
                "fps, sample_rate and block_size must be positive (got {}, {}, {})",
                self.fps, self.sample_rate, self.block_size
            )));
        }
        if self.channel_capacity == 0 {
            return Err(AppError::Config(
                "channel_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Time covered by one block
    pub fn block_period(&self) -> Duration {
        Duration::from_secs_f64(self.block_size as f64 / self.sample_rate as f64)
    }

    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps as f64)
    }
}

/// Scan pipeline statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPipelineStats {
    /// Frames accepted by the intake
    pub frames_delivered: u64,
    /// Frames the source failed to render or the intake rejected
    pub frames_dropped: u64,
    /// Blocks produced
    pub blocks_produced: u64,
    /// Blocks with no samples taken from a frame
    pub silent_blocks: u64,
    /// Number of active subscribers
    pub subscribers: u64,
    /// Pipeline running time in seconds
    pub running_time_secs: f64,
}

/// Runs a frame source and a scan converter on independent clocks
pub struct ScanPipeline {
    config: ScanPipelineConfig,
    scanner: Mutex<ScanConverter>,
    intake: FrameIntake,
    block_tx: broadcast::Sender<Arc<SignalBlock>>,
    running: AtomicBool,
    /// Stop signal (atomic for lock-free checking)
    stop_flag: AtomicBool,
    frames_delivered: AtomicU64,
    frames_dropped: AtomicU64,
    blocks_produced: AtomicU64,
    silent_blocks: AtomicU64,
    start_time: Mutex<Option<Instant>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ScanPipeline {
    /// Create a new pipeline
    pub fn new(config: ScanPipelineConfig) -> Result<Arc<Self>> {
        config.validate()?;

        let mut scanner = ScanConverter::new();
        scanner.set_mode(config.initial_mode);
        let intake = scanner.intake();
        let (block_tx, _) = broadcast::channel(config.channel_capacity);

        Ok(Arc::new(Self {
            config,
            scanner: Mutex::new(scanner),
            intake,
            block_tx,
            running: AtomicBool::new(false),
            stop_flag: AtomicBool::new(false),
            frames_delivered: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
            blocks_produced: AtomicU64::new(0),
            silent_blocks: AtomicU64::new(0),
            start_time: Mutex::new(None),
            task_handles: Mutex::new(Vec::new()),
        }))
    }

    /// Start both tasks
    pub fn start(self: &Arc<Self>, source: Box<dyn FrameSource>) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        info!(
            "Starting scan pipeline: {} fps, {} Hz, {} samples per block",
            self.config.fps, self.config.sample_rate, self.config.block_size
        );

        self.stop_flag.store(false, Ordering::SeqCst);
        *self.start_time.lock() = Some(Instant::now());

        let video = {
            let pipeline = self.clone();
            tokio::spawn(async move { pipeline.video_task(source).await })
        };
        let blocks = {
            let pipeline = self.clone();
            tokio::spawn(async move { pipeline.block_task().await })
        };
        self.task_handles.lock().extend([video, blocks]);

        Ok(())
    }

    /// Stop both tasks
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        info!("Stopping scan pipeline");
        self.stop_flag.store(true, Ordering::SeqCst);
        for handle in self.task_handles.lock().drain(..) {
            handle.abort();
        }
    }

    /// Check if pipeline is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Handle a mode command while running
    pub fn command(&self, input: &str) -> Result<()> {
        self.scanner.lock().command(input)
    }

    /// Handle for pushing frames from outside the pipeline
    pub fn intake(&self) -> FrameIntake {
        self.intake.clone()
    }

    /// Subscribe to signal blocks
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<SignalBlock>> {
        self.block_tx.subscribe()
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.block_tx.receiver_count()
    }

    pub fn config(&self) -> &ScanPipelineConfig {
        &self.config
    }

    /// Get current statistics
    pub fn stats(&self) -> ScanPipelineStats {
        ScanPipelineStats {
            frames_delivered: self.frames_delivered.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            blocks_produced: self.blocks_produced.load(Ordering::Relaxed),
            silent_blocks: self.silent_blocks.load(Ordering::Relaxed),
            subscribers: self.subscriber_count() as u64,
            running_time_secs: self
                .start_time
                .lock()
                .map(|start| start.elapsed().as_secs_f64())
                .unwrap_or(0.0),
        }
    }

    async fn video_task(self: Arc<Self>, mut source: Box<dyn FrameSource>) {
        debug!("Video task started");
        let mut ticker = tokio::time::interval(self.config.frame_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !self.stop_flag.load(Ordering::Relaxed) {
            ticker.tick().await;

            let delivered = source
                .next_frame()
                .and_then(|frame| self.intake.deliver(frame));
            match delivered {
                Ok(()) => {
                    self.frames_delivered.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    warn!("Frame dropped: {}", e);
                    self.frames_dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        debug!("Video task ended");
    }

    async fn block_task(self: Arc<Self>) {
        debug!("Block task started");
        let mut ticker = tokio::time::interval(self.config.block_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !self.stop_flag.load(Ordering::Relaxed) {
            ticker.tick().await;

            let mut block = SignalBlock::new(self.config.block_size);
            let filled = self.scanner.lock().process(&mut block);

            self.blocks_produced.fetch_add(1, Ordering::Relaxed);
            if filled == 0 {
                self.silent_blocks.fetch_add(1, Ordering::Relaxed);
            }

            // Broadcast to subscribers
            if self.block_tx.receiver_count() > 0 {
                if let Err(e) = self.block_tx.send(Arc::new(block)) {
                    trace!("No signal subscribers: {}", e);
                }
            }
        }
        debug!("Block task ended");
    }
}

impl Drop for ScanPipeline {
    fn drop(&mut self) {
        self.stop();
    }
}
