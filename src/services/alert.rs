//! Completion alert: four-tone synthesis, WAV encoding and local playback

use rodio::{buffer::SamplesBuffer, OutputStream, Sink};
use thiserror::Error;
use tracing::{debug, info};

pub const SAMPLE_RATE: u32 = 44_100;

/// Gain reached at the end of each tone's attack, before volume scaling
const PEAK_GAIN: f64 = 0.3;
/// Gain each tone decays to by its end
const FLOOR_GAIN: f64 = 0.01;
const ATTACK_SECS: f64 = 0.01;

/// One sine pulse of the alert pattern
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f64,
    pub offset_secs: f64,
    pub duration_secs: f64,
}

impl Tone {
    const fn new(frequency_hz: f64, offset_secs: f64, duration_secs: f64) -> Self {
        Self {
            frequency_hz,
            offset_secs,
            duration_secs,
        }
    }

    fn end_secs(&self) -> f64 {
        self.offset_secs + self.duration_secs
    }

    /// Envelope at `t` seconds into the tone: linear attack, exponential decay
    fn gain(&self, t: f64) -> f64 {
        if t < ATTACK_SECS {
            PEAK_GAIN * t / ATTACK_SECS
        } else {
            let decay = (t - ATTACK_SECS) / (self.duration_secs - ATTACK_SECS);
            PEAK_GAIN * (FLOOR_GAIN / PEAK_GAIN).powf(decay)
        }
    }
}

/// Three short 800 Hz beeps, then a longer 1000 Hz one
pub const ALERT_TONES: [Tone; 4] = [
    Tone::new(800.0, 0.0, 0.2),
    Tone::new(800.0, 0.3, 0.2),
    Tone::new(800.0, 0.6, 0.2),
    Tone::new(1000.0, 0.9, 0.4),
];

/// Render the alert pattern as mono samples in `-1.0..=1.0`
pub fn synthesize_alert(volume: f32) -> Vec<f32> {
    let volume = f64::from(volume.clamp(0.0, 1.0));
    let rate = f64::from(SAMPLE_RATE);
    let total_secs = ALERT_TONES
        .iter()
        .map(Tone::end_secs)
        .fold(0.0, f64::max);
    let mut samples = vec![0.0f32; (total_secs * rate).round() as usize];

    for tone in &ALERT_TONES {
        let first = (tone.offset_secs * rate).round() as usize;
        let last = ((tone.end_secs() * rate).round() as usize).min(samples.len());
        for (i, sample) in samples[first..last].iter_mut().enumerate() {
            let t = i as f64 / rate;
            let wave = (2.0 * std::f64::consts::PI * tone.frequency_hz * t).sin();
            *sample += (wave * tone.gain(t) * volume) as f32;
        }
    }

    samples
}

/// Encode mono samples as a 16-bit PCM WAV file
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    const CHANNELS: u16 = 1;
    const BITS_PER_SAMPLE: u16 = 16;
    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
    let byte_rate = sample_rate * u32::from(block_align);
    let data_len = (samples.len() * usize::from(block_align)) as u32;

    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&CHANNELS.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        let pcm = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        wav.extend_from_slice(&pcm.to_le_bytes());
    }
    wav
}

/// The alert pattern at `volume`, ready to serve or play
pub fn alert_wav(volume: f32) -> Vec<u8> {
    encode_wav(&synthesize_alert(volume), SAMPLE_RATE)
}

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("no audio output device: {0}")]
    Output(#[from] rodio::StreamError),
    #[error("failed to open audio sink: {0}")]
    Sink(#[from] rodio::PlayError),
    #[error("playback task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A queued request to sound the alert
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRequest {
    pub timer_name: String,
    pub volume: f32,
}

/// Plays the alert on the default audio output device
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertPlayer;

impl AlertPlayer {
    pub fn new() -> Self {
        Self
    }

    /// Sound the alert at `volume`, returning once it has finished.
    ///
    /// Audio output blocks, so it runs on the blocking pool.
    pub async fn play(&self, volume: f32) -> Result<(), AlertError> {
        debug!("Playing alert at volume {:.2}", volume);
        tokio::task::spawn_blocking(move || play_blocking(volume)).await??;
        info!("Alert played");
        Ok(())
    }
}

/// The alert pattern at full scale as a mono rodio source
pub fn alert_source() -> SamplesBuffer<f32> {
    SamplesBuffer::new(1, SAMPLE_RATE, synthesize_alert(1.0))
}

fn play_blocking(volume: f32) -> Result<(), AlertError> {
    let (_stream, stream_handle) = OutputStream::try_default()?;
    let sink = Sink::try_new(&stream_handle)?;

    sink.set_volume(volume.clamp(0.0, 1.0));
    sink.append(alert_source());
    sink.sleep_until_end();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_spans_whole_pattern() {
        let samples = synthesize_alert(1.0);
        assert_eq!(samples.len(), (1.3 * f64::from(SAMPLE_RATE)).round() as usize);
    }

    #[test]
    fn peak_respects_volume() {
        for volume in [1.0f32, 0.5, 0.1] {
            let peak = synthesize_alert(volume)
                .iter()
                .fold(0.0f32, |acc, s| acc.max(s.abs()));
            assert!(peak <= 0.3 * volume + 1e-4, "peak {peak} at volume {volume}");
            assert!(peak > 0.2 * volume, "peak {peak} at volume {volume}");
        }
    }

    #[test]
    fn zero_volume_is_silent() {
        assert!(synthesize_alert(0.0).iter().all(|s| *s == 0.0));
    }

    #[test]
    fn gaps_between_beeps_are_silent() {
        let samples = synthesize_alert(1.0);
        let gap = (0.25 * f64::from(SAMPLE_RATE)) as usize;
        assert_eq!(samples[gap], 0.0);
    }

    #[test]
    fn wav_header_is_well_formed() {
        let samples = vec![0.0f32, 0.5, -0.5, 1.0];
        let wav = encode_wav(&samples, SAMPLE_RATE);
        assert_eq!(wav.len(), 44 + samples.len() * 2);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32::from_le_bytes(wav[24..28].try_into().unwrap()), SAMPLE_RATE);
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 8);
        assert_eq!(i16::from_le_bytes([wav[50], wav[51]]), i16::MAX);
    }

    #[test]
    fn playback_source_is_mono_pattern() {
        use rodio::Source;
        use std::time::Duration;

        let source = alert_source();
        assert_eq!(source.channels(), 1);
        assert_eq!(source.sample_rate(), SAMPLE_RATE);
        assert_eq!(source.total_duration(), Some(Duration::from_millis(1300)));
    }
}
