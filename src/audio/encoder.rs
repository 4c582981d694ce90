use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Wire sample rate for the live session.
pub const SAMPLE_RATE: u32 = 16_000;
/// Fixed capture block size, in samples.
pub const FRAME_SAMPLES: usize = 4096;
/// MIME descriptor sent with every frame.
pub const PCM_MIME: &str = "audio/pcm;rate=16000";

/// One wire-ready audio frame: base64 of little-endian 16-bit PCM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    pub mime_type: &'static str,
    pub data: String,
}

/// Encodes normalized f32 samples as base64 PCM16-LE.
///
/// Scale by 32768 and truncate toward zero. Values outside [-1, 1] wrap
/// through the i32 intermediate instead of saturating; a bare `as i16`
/// cast would clamp and change the conversion for hot samples.
pub fn encode(samples: &[f32]) -> EncodedFrame {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample * 32768.0) as i32 as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    EncodedFrame {
        mime_type: PCM_MIME,
        data: BASE64.encode(&bytes),
    }
}
