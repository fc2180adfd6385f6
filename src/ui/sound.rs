/// Sound engine: procedural sound effects and a looping background tune
/// via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
    use tracing::warn;

    use crate::backend::{AudioBackend, Sfx};
    use crate::error::InitError;

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated buffers for each sound.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_death: Arc<Vec<u8>>,
        sfx_win: Arc<Vec<u8>>,
        sfx_green: Arc<Vec<u8>>,
        music: Arc<Vec<f32>>,
    }

    impl SoundEngine {
        pub fn new() -> Result<Self, InitError> {
            let (stream, handle) = OutputStream::try_default()
                .map_err(|e| InitError::Audio(e.to_string()))?;

            Ok(SoundEngine {
                _stream: stream,
                handle,
                sfx_death: Arc::new(make_wav(&gen_death())),
                sfx_win: Arc::new(make_wav(&gen_win())),
                sfx_green: Arc::new(make_wav(&gen_green())),
                music: Arc::new(gen_music()),
            })
        }

        fn play_buf(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }
    }

    impl AudioBackend for SoundEngine {
        fn play(&self, sfx: Sfx) {
            match sfx {
                Sfx::Death => self.play_buf(&self.sfx_death),
                Sfx::Win => self.play_buf(&self.sfx_win),
                Sfx::GreenShift => self.play_buf(&self.sfx_green),
            }
        }

        fn loop_music(&self) {
            match Sink::try_new(&self.handle) {
                Ok(sink) => {
                    let tune = SamplesBuffer::new(1, SAMPLE_RATE, self.music.as_ref().clone());
                    sink.append(tune.repeat_infinite());
                    sink.set_volume(0.4);
                    sink.detach();
                }
                Err(e) => warn!("music disabled: {e}"),
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn tone(freq: f32, duration: f32, volume: f32, shape: impl Fn(f32) -> f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                (t * freq * TAU).sin() * shape(i as f32 / n as f32) * volume
            })
            .collect()
    }

    /// Caught: low buzz sliding down an octave
    pub(super) fn gen_death() -> Vec<f32> {
        let duration = 0.5;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 220.0 - t * 110.0;
                phase += freq / SAMPLE_RATE as f32;
                // square wave
                let wave = if (phase * TAU).sin() >= 0.0 { 1.0 } else { -1.0 };
                wave * (1.0 - t).powf(0.7) * 0.2
            })
            .collect()
    }

    /// Trophy: rising major arpeggio with a held top note
    pub(super) fn gen_win() -> Vec<f32> {
        let mut samples = Vec::new();
        for freq in [523.0_f32, 659.0, 784.0] {
            samples.extend(tone(freq, 0.09, 0.3, |p| 1.0 - p * 0.3));
        }
        samples.extend(tone(1047.0, 0.35, 0.3, |p| 1.0 - p));
        samples
    }

    /// Green shift: soft two-note chirp
    pub(super) fn gen_green() -> Vec<f32> {
        let mut samples = tone(880.0, 0.05, 0.25, |p| 1.0 - p.powf(0.5));
        samples.extend(tone(1175.0, 0.07, 0.25, |p| 1.0 - p.powf(0.5)));
        samples
    }

    /// Background loop: a slow minor-pentatonic walk over a drone
    pub(super) fn gen_music() -> Vec<f32> {
        let melody = [220.0_f32, 262.0, 294.0, 330.0, 392.0, 330.0, 294.0, 262.0];
        let note = 0.4;
        let mut samples = Vec::new();
        for (i, freq) in melody.iter().enumerate() {
            let lead = tone(*freq, note, 0.12, |p| (p * 8.0).min(1.0) * (1.0 - p * 0.6));
            let drone_freq = if i < 4 { 110.0 } else { 98.0 };
            let drone = tone(drone_freq, note, 0.08, |_| 1.0);
            samples.extend(lead.iter().zip(drone.iter()).map(|(a, b)| a + b));
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Result<Self, crate::error::InitError> { Ok(SoundEngine) }
}

#[cfg(not(feature = "sound"))]
impl crate::backend::AudioBackend for SoundEngine {
    fn play(&self, _sfx: crate::backend::Sfx) {}
    fn loop_music(&self) {}
}
