use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use ringbuf::traits::{Consumer, Observer, Split};
use ringbuf::{HeapCons, HeapRb};
use rubato::{FftFixedIn, Resampler};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::audio::capture::AudioCapture;
use crate::audio::encoder::{self, EncodedFrame, FRAME_SAMPLES, SAMPLE_RATE};
use crate::error::ClientError;

// Half a second of headroom at 48kHz so scheduler jitter never starves
// the capture callback.
const RING_CAPACITY: usize = 32768;
// Input granularity for the resampler.
const CHUNK_SAMPLES: usize = 1024;

/// Owns the microphone, the ring buffer, and the worker thread that turns
/// raw samples into wire frames.
///
/// Lifecycle: `open` acquires the device and starts filling the ring;
/// `begin` arms the worker once the session is open (anything captured
/// earlier is discarded); `stop` tears everything down and may be called
/// any number of times, in any state.
pub struct CapturePipeline {
    capture: Option<AudioCapture>,
    consumer: Option<HeapCons<f32>>,
    worker: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    sample_rate: u32,
}

impl CapturePipeline {
    pub fn open() -> Result<Self, ClientError> {
        let rb = HeapRb::<f32>::new(RING_CAPACITY);
        let (producer, consumer) = rb.split();
        let capture = AudioCapture::open(producer)?;
        let sample_rate = capture.sample_rate;
        Ok(Self {
            capture: Some(capture),
            consumer: Some(consumer),
            worker: None,
            stop: Arc::new(AtomicBool::new(false)),
            sample_rate,
        })
    }

    /// Starts draining the ring into `frame_tx`. No frames leave the
    /// pipeline before this is called.
    pub fn begin(&mut self, frame_tx: mpsc::Sender<EncodedFrame>) {
        let Some(consumer) = self.consumer.take() else {
            // Already begun or already stopped.
            return;
        };
        let stop = self.stop.clone();
        let rate = self.sample_rate;
        info!("capture pipeline streaming at {}Hz device rate", rate);
        self.worker = Some(std::thread::spawn(move || {
            run_worker(consumer, frame_tx, rate, stop);
        }));
    }

    /// Idempotent teardown: flag the worker, drop the stream, join.
    /// Every step is guarded so partial prior teardown is fine.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.capture.take();
        self.consumer.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("capture worker panicked during teardown");
            }
        }
    }

}

impl Drop for CapturePipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(
    mut consumer: HeapCons<f32>,
    frame_tx: mpsc::Sender<EncodedFrame>,
    sample_rate: u32,
    stop: Arc<AtomicBool>,
) {
    // Discard whatever landed in the ring before the session opened.
    while consumer.try_pop().is_some() {}

    let mut resampler = FrameResampler::new(sample_rate as usize, SAMPLE_RATE as usize);
    let mut chunk = vec![0.0f32; CHUNK_SAMPLES];
    let mut frames_sent: u64 = 0;
    let mut channel_gone = false;

    loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        if consumer.occupied_len() < CHUNK_SAMPLES {
            std::thread::sleep(std::time::Duration::from_millis(10));
            continue;
        }
        let n = consumer.pop_slice(&mut chunk);

        resampler.push(&chunk[..n], |frame| {
            if channel_gone {
                return;
            }
            let encoded = encoder::encode(frame);
            // Channel closed means the session is gone; the session side
            // already reported why. Just wind down.
            if frame_tx.blocking_send(encoded).is_err() {
                channel_gone = true;
                return;
            }
            frames_sent += 1;
            if frames_sent % 50 == 0 {
                debug!("streamed {} frames", frames_sent);
            }
        });

        if channel_gone {
            break;
        }
    }
    debug!("capture worker exiting after {} frames", frames_sent);
}

/// Converts device-rate mono samples into fixed 4096-sample blocks at the
/// wire rate, resampling only when the rates differ.
pub struct FrameResampler {
    resampler: Option<FftFixedIn<f32>>,
    in_buf: Vec<f32>,
    pending: Vec<f32>,
}

impl FrameResampler {
    pub fn new(in_hz: usize, out_hz: usize) -> Self {
        let resampler = (in_hz != out_hz).then(|| {
            FftFixedIn::<f32>::new(in_hz, out_hz, CHUNK_SAMPLES, 1, 1)
                .expect("resampler construction")
        });
        Self {
            resampler,
            in_buf: Vec::with_capacity(CHUNK_SAMPLES),
            pending: Vec::with_capacity(FRAME_SAMPLES),
        }
    }

    pub fn push(&mut self, mut src: &[f32], mut emit: impl FnMut(&[f32])) {
        if self.resampler.is_none() {
            self.emit_frames(src, &mut emit);
            return;
        }
        while !src.is_empty() {
            let space = CHUNK_SAMPLES - self.in_buf.len();
            let take = space.min(src.len());
            self.in_buf.extend_from_slice(&src[..take]);
            src = &src[take..];

            if self.in_buf.len() == CHUNK_SAMPLES {
                if let Ok(out) = self
                    .resampler
                    .as_mut()
                    .expect("checked above")
                    .process(&[&self.in_buf[..]], None)
                {
                    self.emit_frames(&out[0], &mut emit);
                }
                self.in_buf.clear();
            }
        }
    }

    fn emit_frames(&mut self, mut data: &[f32], emit: &mut impl FnMut(&[f32])) {
        while !data.is_empty() {
            let space = FRAME_SAMPLES - self.pending.len();
            let take = space.min(data.len());
            self.pending.extend_from_slice(&data[..take]);
            data = &data[take..];

            if self.pending.len() == FRAME_SAMPLES {
                emit(&self.pending);
                self.pending.clear();
            }
        }
    }
}
