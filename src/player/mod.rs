pub mod channel;
pub mod mixer;
mod sequencer;

use crate::module::Module;

use self::channel::{Channel, CHANNELS};
use self::mixer::SampleStream;

/// Fixed attenuation keeping the summed voices inside [-1, 1].
const VOICE_SCALE: f32 = 8.0;

/// Playback state for one module: the song cursor, the sixteen sequenced
/// channels and their mixing streams. Feed an interleaved stereo f32
/// buffer of any size to `render`; the song wraps at the end of the order
/// list and plays forever.
pub struct Player {
    module: Module,
    sample_rate: i32,
    song_speed: i32,
    song_tempo: i32,
    tick_counter: i32,
    samples_per_tick: i32,
    samples_until_next_tick: i32,
    current_order: usize,
    current_pattern: usize,
    current_row: usize,
    channels: Vec<Channel>,
    streams: Vec<SampleStream>,
}

impl Player {
    pub fn new(module: Module, sample_rate: u32) -> Player {
        let mut channels: Vec<_> = (0..CHANNELS).map(|_| Channel::new()).collect();
        // default stereo spread: even channels left dominant, odd right
        for pair in 0..CHANNELS / 2 {
            channels[pair * 2].panning = 0x3;
            channels[pair * 2 + 1].panning = 0xC;
        }

        let current_pattern = module.orders[0] as usize;
        let initial_speed = if module.initial_speed > 0 {
            module.initial_speed
        } else {
            6
        };
        let initial_tempo = module.initial_tempo;

        let mut player = Player {
            module,
            sample_rate: sample_rate as i32,
            song_speed: initial_speed,
            song_tempo: 125,
            tick_counter: 0,
            samples_per_tick: 0,
            samples_until_next_tick: 0,
            current_order: 0,
            current_pattern,
            current_row: 0,
            channels,
            streams: (0..CHANNELS).map(|_| SampleStream::new()).collect(),
        };
        player.set_tempo(125);
        player.set_tempo(initial_tempo);
        player
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate as u32
    }

    pub(crate) fn set_tempo(&mut self, tempo: i32) {
        if tempo <= 0 {
            return;
        }
        self.song_tempo = tempo;
        self.samples_per_tick =
            ((2.5 / tempo as f64 * self.sample_rate as f64) as i32).max(1);
    }

    /// Renders interleaved stereo frames into `buffer`, splitting the
    /// request at tick boundaries so callers may use any buffer size.
    pub fn render(&mut self, buffer: &mut [f32]) {
        let mut remaining = buffer.len() / 2;
        let mut offset = 0;

        while remaining > 0 {
            if self.samples_until_next_tick == 0 {
                self.process_tick();
                self.samples_until_next_tick = self.samples_per_tick;
            }

            let frames = remaining.min(self.samples_until_next_tick as usize);
            let chunk = &mut buffer[offset..offset + frames * 2];
            for sample in chunk.iter_mut() {
                *sample = 0.0;
            }

            for c in 0..CHANNELS {
                if let Some(index) = self.streams[c].sync(&mut self.channels[c], self.sample_rate)
                {
                    self.streams[c].mix(chunk, &self.channels[c], &self.module.instruments[index]);
                }
            }

            for sample in chunk.iter_mut() {
                *sample /= VOICE_SCALE;
            }

            remaining -= frames;
            self.samples_until_next_tick -= frames as i32;
            offset += frames * 2;
        }
    }
}
