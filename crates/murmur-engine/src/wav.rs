//! WAV container encode/decode for engine waveforms

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::EngineError;

/// Encode f32 mono samples as a 16-bit PCM WAV container
///
/// Samples are clamped to [-1, 1] before quantization.
pub fn encode(samples: &[f32], sample_rate: u32) -> crate::Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    // 44-byte header plus two bytes per sample
    let mut buffer = Vec::with_capacity(44 + samples.len() * 2);

    {
        let mut cursor = Cursor::new(&mut buffer);
        let mut writer =
            WavWriter::new(&mut cursor, spec).map_err(|e| EngineError::BadAudio(format!("wav encode: {e}")))?;

        for &sample in samples {
            let clamped = sample.clamp(-1.0, 1.0);
            #[allow(clippy::cast_possible_truncation)]
            let value = (clamped * f32::from(i16::MAX)) as i16;
            writer
                .write_sample(value)
                .map_err(|e| EngineError::BadAudio(format!("wav encode: {e}")))?;
        }

        writer
            .finalize()
            .map_err(|e| EngineError::BadAudio(format!("wav encode: {e}")))?;
    }

    Ok(buffer)
}

/// Decode a mono WAV container into f32 samples and a sample rate
///
/// Accepts 16-bit integer and 32-bit float PCM. Multi-channel audio is
/// rejected rather than silently downmixed.
pub fn decode(bytes: &[u8]) -> crate::Result<(Vec<f32>, u32)> {
    let reader = WavReader::new(Cursor::new(bytes)).map_err(|e| EngineError::BadAudio(format!("wav decode: {e}")))?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(EngineError::BadAudio(format!(
            "expected mono audio, got {} channels",
            spec.channels
        )));
    }

    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader
            .into_samples::<i16>()
            .map(|sample| sample.map(|value| f32::from(value) / f32::from(i16::MAX)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| EngineError::BadAudio(format!("wav decode: {e}")))?,
        (SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| EngineError::BadAudio(format!("wav decode: {e}")))?,
        (format, bits) => {
            return Err(EngineError::BadAudio(format!(
                "unsupported sample format: {bits}-bit {format:?}"
            )));
        }
    };

    Ok((samples, spec.sample_rate))
}
