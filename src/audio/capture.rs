use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::traits::Producer;
use tracing::{error, info};

use crate::audio::encoder::SAMPLE_RATE;
use crate::error::ClientError;

/// Exclusive hold on the default microphone. The cpal stream stays alive
/// for exactly as long as this struct does; dropping it stops capture.
pub struct AudioCapture {
    _stream: cpal::Stream,
    pub sample_rate: u32,
}

impl AudioCapture {
    /// Acquires the default input device and starts pushing mono f32
    /// samples into `producer`. Prefers a 16kHz config so no resampling
    /// is needed; otherwise takes the device default and the pipeline
    /// resamples downstream.
    ///
    /// Any failure here (no device, unsupported format, permission
    /// denied by the platform) is a Permission error: startup aborts
    /// before any session state is touched.
    pub fn open<P>(mut producer: P) -> Result<Self, ClientError>
    where
        P: Producer<Item = f32> + Send + 'static,
    {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| ClientError::Permission("no input device available".into()))?;

        info!("audio input device: {}", device.name().unwrap_or_default());

        // Look for a config that can do the wire rate directly.
        let mut selected = None;
        let ranges = device
            .supported_input_configs()
            .map_err(|e| ClientError::Permission(e.to_string()))?;
        for range in ranges {
            if range.min_sample_rate().0 <= SAMPLE_RATE && range.max_sample_rate().0 >= SAMPLE_RATE
            {
                selected = Some(range.with_sample_rate(cpal::SampleRate(SAMPLE_RATE)));
                break;
            }
        }
        let config = match selected {
            Some(c) => c,
            // Whatever the device prefers; the pipeline resamples.
            None => device
                .default_input_config()
                .map_err(|e| ClientError::Permission(e.to_string()))?,
        };

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        info!("audio config: rate={}Hz channels={}", sample_rate, channels);

        let err_fn = |err| error!("input stream error: {}", err);

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device
                .build_input_stream(
                    &config.into(),
                    move |data: &[f32], _: &_| {
                        write_input_data(data, channels, &mut producer);
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| ClientError::Permission(e.to_string()))?,
            cpal::SampleFormat::I16 => device
                .build_input_stream(
                    &config.into(),
                    move |data: &[i16], _: &_| {
                        write_input_data_i16(data, channels, &mut producer);
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| ClientError::Permission(e.to_string()))?,
            other => {
                return Err(ClientError::Permission(format!(
                    "unsupported sample format: {other:?}"
                )))
            }
        };

        stream
            .play()
            .map_err(|e| ClientError::Permission(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            sample_rate,
        })
    }
}

// Downmix interleaved channels to mono and push. If the ring is full the
// excess is dropped (lossy); the pipeline drains fast enough in practice.
fn write_input_data<P>(input: &[f32], channels: usize, producer: &mut P)
where
    P: Producer<Item = f32>,
{
    if channels <= 1 {
        producer.push_slice(input);
        return;
    }
    for frame in input.chunks_exact(channels) {
        let mono = frame.iter().sum::<f32>() / channels as f32;
        let _ = producer.try_push(mono);
    }
}

fn write_input_data_i16<P>(input: &[i16], channels: usize, producer: &mut P)
where
    P: Producer<Item = f32>,
{
    let step = channels.max(1);
    for frame in input.chunks_exact(step) {
        let sum: f32 = frame.iter().map(|&s| s as f32 / i16::MAX as f32).sum();
        let _ = producer.try_push(sum / step as f32);
    }
}
