//! Equal-weight stem mixing
//!
//! The first readable input fixes the reference sample rate and channel count.
//! Every later input is resampled and channel-adapted to match, then the
//! running sum and the newcomer are both cut to the shorter of the two. The
//! result is divided by its peak only when that peak exceeds full scale.

use crate::audio::{self, TrackWriter};
use crate::error::{RagamError, Result};
use crate::types::Track;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// File name every mix request overwrites
pub const MIX_FILE_NAME: &str = "custom_mix.wav";

/// Subdirectory of the outputs root holding mixes
pub const MIX_DIR_NAME: &str = "mixes";

/// What a mix request produced
#[derive(Debug)]
pub struct MixOutcome {
    /// Written file, `None` when no input was readable
    pub output: Option<PathBuf>,
    /// Inputs that were left out, all `MixSkipped`
    pub skipped: Vec<RagamError>,
    /// Inputs that made it into the sum
    pub mixed: usize,
}

/// In-memory accumulator, split out so the sum can be tested without files
#[derive(Debug, Default)]
pub struct MixBuffer {
    sum: Option<Track>,
    count: usize,
}

impl MixBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one track, adapting it to the reference format
    ///
    /// Returns the reason when the track cannot be adapted.
    pub fn add(&mut self, track: Track) -> std::result::Result<(), String> {
        let Some(sum) = self.sum.as_mut() else {
            if track.channels == 0 || track.sample_rate == 0 {
                return Err("Track has no channels or sample rate".to_string());
            }
            self.sum = Some(track);
            self.count = 1;
            return Ok(());
        };

        let track = if track.sample_rate != sum.sample_rate {
            debug!("Resampling mix input {} Hz -> {} Hz", track.sample_rate, sum.sample_rate);
            audio::resample_track(&track, sum.sample_rate)
        } else {
            track
        };
        let track = adapt_channels(track, sum.channels)?;

        let frames = sum.frames().min(track.frames());
        sum.truncate_frames(frames);
        for (acc, s) in sum.samples.iter_mut().zip(&track.samples) {
            *acc += *s;
        }
        self.count += 1;
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Finished mix, scaled down if it would clip
    pub fn finish(self) -> Option<Track> {
        let mut track = self.sum?;
        let peak = track.peak();
        if peak > 1.0 {
            debug!("Mix peak {:.3}, normalizing", peak);
            for s in &mut track.samples {
                *s /= peak;
            }
        }
        Some(track)
    }
}

/// Match `track` to `channels`; only mono and stereo convert into each other
fn adapt_channels(track: Track, channels: u16) -> std::result::Result<Track, String> {
    if track.channels == channels {
        return Ok(track);
    }
    match (track.channels, channels) {
        (1, 2) => {
            let mono = track.channel(0);
            Ok(Track::from_channels(&[mono.clone(), mono], track.sample_rate))
        }
        (2, 1) => {
            let mono = audio::to_mono(&track.samples, 2);
            Ok(Track::new(1, track.sample_rate, mono))
        }
        (from, to) => Err(format!("Cannot mix {} channels into {}", from, to)),
    }
}

/// Decodes, sums and writes stems
pub struct StemMixer {
    writer: Arc<dyn TrackWriter>,
}

impl StemMixer {
    pub fn new(writer: Arc<dyn TrackWriter>) -> Self {
        Self { writer }
    }

    /// `<outputs>/mixes/custom_mix.wav`
    pub fn destination_in(outputs_root: &Path) -> PathBuf {
        outputs_root.join(MIX_DIR_NAME).join(MIX_FILE_NAME)
    }

    /// Mix `inputs` in order into `destination`
    ///
    /// Unreadable inputs are skipped, not fatal. With nothing readable the
    /// outcome has no output and nothing is written.
    pub fn mix(&self, inputs: &[PathBuf], destination: &Path) -> Result<MixOutcome> {
        let mut buffer = MixBuffer::new();
        let mut skipped = Vec::new();

        for path in inputs {
            let added = audio::decode_track(path)
                .map_err(|e| e.to_string())
                .and_then(|track| buffer.add(track));
            if let Err(reason) = added {
                warn!("Skipping {} in mix: {}", path.display(), reason);
                skipped.push(RagamError::MixSkipped {
                    path: path.clone(),
                    reason,
                });
            }
        }

        let mixed = buffer.count();
        let Some(track) = buffer.finish() else {
            info!("No readable tracks to mix");
            return Ok(MixOutcome {
                output: None,
                skipped,
                mixed,
            });
        };

        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RagamError::output_error(parent, e))?;
        }
        self.writer.write(destination, &track)?;
        info!(
            "Mixed {} track(s) into {} ({:.1}s via {})",
            mixed,
            destination.display(),
            track.duration(),
            self.writer.name()
        );

        Ok(MixOutcome {
            output: Some(destination.to_path_buf()),
            skipped,
            mixed,
        })
    }
}
