use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use mozhi::audio::encoder::{encode, FRAME_SAMPLES, PCM_MIME, SAMPLE_RATE};

fn decode_i16(data: &str) -> Vec<i16> {
    let bytes = BASE64.decode(data).expect("valid base64");
    assert_eq!(bytes.len() % 2, 0, "odd byte count");
    bytes
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect()
}

#[test]
fn test_payload_length_is_two_bytes_per_sample() {
    for n in [0usize, 1, 7, 1024, FRAME_SAMPLES] {
        let samples = vec![0.25f32; n];
        let frame = encode(&samples);
        let bytes = BASE64.decode(&frame.data).expect("valid base64");
        assert_eq!(bytes.len(), 2 * n, "byte length for {} samples", n);
    }
}

#[test]
fn test_mime_descriptor_matches_wire_rate() {
    let frame = encode(&[0.0]);
    assert_eq!(frame.mime_type, PCM_MIME);
    assert!(PCM_MIME.ends_with(&SAMPLE_RATE.to_string()));
}

#[test]
fn test_roundtrip_within_quantization_error() {
    let samples: Vec<f32> = (-100..100).map(|i| i as f32 / 101.0).collect();
    let frame = encode(&samples);
    let decoded = decode_i16(&frame.data);
    assert_eq!(decoded.len(), samples.len());
    for (orig, got) in samples.iter().zip(&decoded) {
        let back = *got as f32 / 32768.0;
        // Truncation toward zero: at most one quantization step off.
        assert!(
            (orig - back).abs() <= 1.0 / 32768.0,
            "sample {} decoded as {}",
            orig,
            back
        );
    }
}

#[test]
fn test_empty_frame_is_empty_payload_not_error() {
    let frame = encode(&[]);
    assert_eq!(frame.data, "");
    assert_eq!(frame.mime_type, PCM_MIME);
}

#[test]
fn test_known_values_little_endian() {
    let frame = encode(&[0.0, 0.5, -0.5, -1.0]);
    let decoded = decode_i16(&frame.data);
    assert_eq!(decoded, vec![0, 16384, -16384, -32768]);
}

#[test]
fn test_overdriven_samples_wrap_like_int16() {
    // No saturation: the conversion wraps through 16-bit space exactly
    // like a typed Int16 store would.
    let frame = encode(&[1.0, 1.5, -1.5]);
    let decoded = decode_i16(&frame.data);
    assert_eq!(decoded[0], -32768, "1.0 * 32768 wraps to i16::MIN");
    assert_eq!(decoded[1], -16384, "1.5 wraps, does not clamp to max");
    assert_eq!(decoded[2], 16384, "-1.5 wraps the other way");
}

#[test]
fn test_encode_is_deterministic() {
    let samples: Vec<f32> = (0..FRAME_SAMPLES).map(|i| (i as f32).sin()).collect();
    assert_eq!(encode(&samples), encode(&samples));
}
