//! Loads ScreamTracker 3 (S3M) and Amiga ProTracker (MOD) music modules
//! and renders them to interleaved stereo f32 audio in real time.
//!
//! `format` parses the raw containers, `module` holds the canonical
//! playback representation both formats are converted into, and `player`
//! is the tick-based sequencer and mixer. See the `dump` and `towav`
//! programs under demos/ for minimal end-to-end usage.

pub mod format;
pub mod module;
pub mod player;
