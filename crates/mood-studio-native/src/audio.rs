use std::io::Cursor;
use std::time::Duration;

use mood_studio::{AudioClip, AudioDevice, PlaybackError, Pipeline};
use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, Sink, Source};
use web_time::Instant;

const SILENCE: u8 = 128;

#[derive(Clone, Copy, Debug, Default)]
pub struct NativeAudioDevice;

struct Decoded {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl Decoded {
    fn from_clip(clip: &AudioClip) -> Result<Self, PlaybackError> {
        let decoder = Decoder::new(Cursor::new(clip.bytes().to_vec()))
            .map_err(|e| PlaybackError::Pipeline(format!("cannot decode {}: {e}", clip.media_type())))?;
        let channels = decoder.channels().max(1);
        let sample_rate = decoder.sample_rate();
        let samples = decoder.convert_samples::<f32>().collect();
        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate.max(1)))
    }
}

/// Fills `buf` with the mono mix of the frames ending at `end_frame`, as
/// unsigned bytes centred on 128. Frames outside the clip read as silence.
fn window_bytes(samples: &[f32], channels: u16, end_frame: usize, buf: &mut [u8]) {
    let channels = usize::from(channels.max(1));
    let available = (samples.len() / channels).min(end_frame);
    let len = buf.len();
    for (i, out) in buf.iter_mut().enumerate() {
        *out = match (end_frame + i).checked_sub(len) {
            Some(frame) if frame < available => {
                let mix = samples[frame * channels..(frame + 1) * channels].iter().sum::<f32>() / channels as f32;
                (128.0 + mix * 128.0).clamp(0.0, 255.0) as u8
            }
            _ => SILENCE,
        };
    }
}

/// What the analyser would see: the window ending at `position` while the
/// clip is audible, flat silence when paused or finished.
fn sample_window(decoded: &Decoded, audible: bool, position: Duration, buf: &mut [u8]) {
    if !audible {
        buf.fill(SILENCE);
        return;
    }
    let position = position.min(decoded.duration());
    let end_frame = (position.as_secs_f64() * f64::from(decoded.sample_rate)) as usize;
    window_bytes(&decoded.samples, decoded.channels, end_frame, buf);
}

#[derive(Debug, Default)]
struct PlayClock {
    started: Option<Instant>,
    elapsed: Duration,
}

impl PlayClock {
    fn position(&self) -> Duration {
        self.elapsed + self.started.map_or(Duration::ZERO, |s| s.elapsed())
    }

    fn resume(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        if let Some(started) = self.started.take() {
            self.elapsed += started.elapsed();
        }
    }
}

struct RodioPipeline {
    // Dropping the stream stops output, so it lives as long as the sink.
    _stream: OutputStream,
    sink: Sink,
    decoded: Decoded,
    clock: PlayClock,
}

impl Pipeline for RodioPipeline {
    fn sample_time_domain(&mut self, buf: &mut [u8]) {
        sample_window(&self.decoded, self.is_playing(), self.clock.position(), buf);
    }

    fn is_playing(&self) -> bool {
        !self.sink.is_paused() && !self.sink.empty()
    }

    fn set_playing(&mut self, playing: bool) {
        if playing {
            if self.sink.empty() {
                // Finished: start over from the top.
                self.sink.append(SamplesBuffer::new(
                    self.decoded.channels,
                    self.decoded.sample_rate,
                    self.decoded.samples.clone(),
                ));
                self.clock = PlayClock::default();
            }
            self.sink.play();
            self.clock.resume();
        } else {
            self.sink.pause();
            self.clock.pause();
        }
    }
}

impl Drop for RodioPipeline {
    fn drop(&mut self) {
        self.sink.stop();
        log::debug!("Released rodio pipeline");
    }
}

/// Stands in when there is no output device or the clip cannot be decoded.
struct SilentPipeline;

impl Pipeline for SilentPipeline {
    fn sample_time_domain(&mut self, buf: &mut [u8]) {
        buf.fill(SILENCE);
    }

    fn is_playing(&self) -> bool {
        false
    }

    fn set_playing(&mut self, _playing: bool) {}
}

impl AudioDevice for NativeAudioDevice {
    fn open(&self, clip: &AudioClip, _fft_size: usize) -> Result<Box<dyn Pipeline>, PlaybackError> {
        let decoded = match Decoded::from_clip(clip) {
            Ok(decoded) => decoded,
            Err(e) => {
                log::warn!("{e}; showing silence");
                return Ok(Box::new(SilentPipeline));
            }
        };
        let (stream, handle) = match OutputStream::try_default() {
            Ok(output) => output,
            Err(e) => {
                log::warn!("No audio output device ({e}); showing silence");
                return Ok(Box::new(SilentPipeline));
            }
        };
        let sink = Sink::try_new(&handle).map_err(|e| PlaybackError::Pipeline(e.to_string()))?;
        sink.append(SamplesBuffer::new(
            decoded.channels,
            decoded.sample_rate,
            decoded.samples.clone(),
        ));

        let mut clock = PlayClock::default();
        clock.resume();
        log::debug!(
            "Playing {:.1}s clip ({} ch, {} Hz)",
            decoded.duration().as_secs_f32(),
            decoded.channels,
            decoded.sample_rate
        );
        Ok(Box::new(RodioPipeline {
            _stream: stream,
            sink,
            decoded,
            clock,
        }))
    }

    fn export(&self, clip: &AudioClip, file_name: &str) -> Result<(), PlaybackError> {
        let ext = clip.file_extension();
        let Some(path) = rfd::FileDialog::new()
            .set_title("Export track")
            .set_file_name(file_name)
            .add_filter("Audio", &[ext])
            .save_file()
        else {
            return Ok(());
        };
        std::fs::write(&path, clip.bytes()).map_err(|e| PlaybackError::Export(e.to_string()))?;
        log::info!("Exported {} bytes to {}", clip.bytes().len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_ends_at_play_position() {
        let samples = [0.0, 0.5, -0.5, 1.0];
        let mut buf = [0u8; 3];
        window_bytes(&samples, 1, 4, &mut buf);
        assert_eq!(buf, [192, 64, 255]);
    }

    #[test]
    fn stereo_is_mixed_down() {
        let samples = [1.0, -1.0, 0.5, 0.5];
        let mut buf = [0u8; 2];
        window_bytes(&samples, 2, 2, &mut buf);
        assert_eq!(buf, [128, 192]);
    }

    #[test]
    fn before_start_reads_as_silence() {
        let samples = [0.5, 0.5];
        let mut buf = [0u8; 4];
        window_bytes(&samples, 1, 1, &mut buf);
        assert_eq!(buf, [SILENCE, SILENCE, SILENCE, 192]);
    }

    fn one_second_ramp() -> Decoded {
        Decoded {
            samples: (0..8).map(|i| i as f32 / 8.0).collect(),
            channels: 1,
            sample_rate: 8,
        }
    }

    #[test]
    fn paused_or_finished_clip_reads_flat() {
        let decoded = one_second_ramp();
        let mut buf = [0u8; 4];
        sample_window(&decoded, false, Duration::from_millis(500), &mut buf);
        assert_eq!(buf, [SILENCE; 4]);

        // Past the end while the sink is drained.
        sample_window(&decoded, false, Duration::from_secs(3), &mut buf);
        assert_eq!(buf, [SILENCE; 4]);
    }

    #[test]
    fn audible_clip_reads_at_position() {
        let decoded = one_second_ramp();
        let mut buf = [0u8; 2];
        sample_window(&decoded, true, Duration::from_millis(500), &mut buf);
        assert_eq!(buf, [160, 176]);
    }

    #[test]
    fn undecodable_clip_gives_silent_pipeline() {
        let clip = AudioClip::new("audio/mpeg", b"definitely not audio".to_vec());
        let mut pipeline = NativeAudioDevice.open(&clip, 2048).unwrap();
        let mut buf = [0u8; 8];
        pipeline.sample_time_domain(&mut buf);
        assert_eq!(buf, [SILENCE; 8]);
        assert!(!pipeline.is_playing());
    }

    #[test]
    fn clock_pauses_and_resumes() {
        let mut clock = PlayClock::default();
        assert_eq!(clock.position(), Duration::ZERO);
        clock.resume();
        std::thread::sleep(Duration::from_millis(5));
        clock.pause();
        let paused_at = clock.position();
        assert!(paused_at >= Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(clock.position(), paused_at);
    }
}
