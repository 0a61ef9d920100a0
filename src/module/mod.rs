pub mod info;
pub mod note;
pub mod pattern;

use crate::format::protracker::{ModEffect, ProtrackerMod};
use crate::format::s3m::{S3mFile, ORDER_END};
use self::note::{amiga_period_note, finetune_c2_speed};
use self::pattern::{Command, Pattern, PatternEntry, PATTERN_CHANNELS, PATTERN_ROWS, VOLUME_NONE};

/// One playable sample. Waveforms are converted to f32 once at build time;
/// `loop_end` of zero means the sample does not loop.
pub struct Instrument {
    pub name: String,
    pub volume: u8,
    pub c2_speed: i32,
    pub loop_begin: usize,
    pub loop_end: usize,
    pub data: Vec<f32>,
}

impl Instrument {
    pub fn is_looping(&self) -> bool {
        self.loop_end > 0
    }

    fn empty() -> Instrument {
        Instrument {
            name: String::new(),
            volume: 0,
            c2_speed: 8363,
            loop_begin: 0,
            loop_end: 0,
            data: vec![],
        }
    }
}

/// The canonical in-memory form of a loaded module, ready for playback.
/// Every pattern, instrument and order reference is validated at build
/// time, so the sequencer never range-checks at runtime.
pub struct Module {
    pub song_name: String,
    pub initial_speed: i32,
    pub initial_tempo: i32,
    /// Playable pattern indices only; playback wraps at the end.
    pub orders: Vec<u8>,
    pub instruments: Vec<Instrument>,
    pub patterns: Vec<Pattern>,
}

impl Module {
    pub fn from_s3m(file: &S3mFile) -> Module {
        let mut instruments = Vec::with_capacity(file.instrument_count());
        for i in 0..file.instrument_count() {
            let rec = file.instrument(i);
            let raw = file.sample_data(i);
            if rec.kind() == 1 && !raw.is_empty() {
                let (loop_begin, loop_end) = if rec.is_looping() {
                    (rec.loop_begin(), rec.loop_end())
                } else {
                    (0, 0)
                };
                instruments.push(Instrument {
                    name: rec.name(),
                    volume: rec.default_volume().min(64),
                    c2_speed: rec.c2_speed() as i32,
                    loop_begin,
                    loop_end,
                    // unsigned 8-bit to [-1.0, 1.0)
                    data: raw.iter().map(|&b| 2.0 * b as f32 / 255.0 - 1.0).collect(),
                });
            } else {
                instruments.push(Instrument::empty());
            }
        }

        let patterns = (0..file.pattern_count())
            .map(|i| Pattern::unpack(file.packed_pattern(i)))
            .collect();

        let mut module = Module {
            song_name: file.song_name.clone(),
            initial_speed: file.initial_speed as i32,
            initial_tempo: file.initial_tempo as i32,
            orders: file.orders().to_vec(),
            instruments,
            patterns,
        };
        module.sanitize();
        module
    }

    pub fn from_protracker(pt_mod: &ProtrackerMod) -> Module {
        let mut instruments = Vec::with_capacity(pt_mod.samples.len());
        for sample in &pt_mod.samples {
            if sample.data.is_empty() {
                instruments.push(Instrument::empty());
                continue;
            }
            let (loop_begin, loop_end) = if sample.is_looping() {
                (sample.loop_begin, sample.loop_begin + sample.loop_length)
            } else {
                (0, 0)
            };
            instruments.push(Instrument {
                name: sample.name.clone(),
                volume: sample.volume.min(64),
                c2_speed: finetune_c2_speed(sample.finetune),
                loop_begin,
                loop_end,
                // signed 8-bit to [-1.0, 1.0)
                data: sample
                    .data
                    .iter()
                    .map(|&b| 2.0 * (b as i32 + 128) as f32 / 255.0 - 1.0)
                    .collect(),
            });
        }

        let mut patterns = Vec::with_capacity(pt_mod.patterns.len());
        for source in &pt_mod.patterns {
            let mut pattern = Pattern::new();
            for (r, row) in source.rows.iter().enumerate().take(PATTERN_ROWS) {
                for (c, event) in row.iter().enumerate().take(PATTERN_CHANNELS) {
                    let entry = pattern.entry_mut(r, c);
                    if event.period != 0 {
                        if let Some(packed) = amiga_period_note(event.period) {
                            entry.note = packed;
                        }
                    }
                    entry.inst = event.instrument;
                    convert_mod_effect(entry, event.effect, event.effect_data);
                }
            }
            patterns.push(pattern);
        }

        let mut module = Module {
            song_name: pt_mod.title.clone(),
            initial_speed: 6,
            initial_tempo: 125,
            orders: pt_mod.pattern_table.clone(),
            instruments,
            patterns,
        };
        module.sanitize();
        module
    }

    fn sanitize(&mut self) {
        if self.patterns.is_empty() {
            self.patterns.push(Pattern::new());
        }

        let instrument_count = self.instruments.len();
        for pattern in &mut self.patterns {
            for row in 0..PATTERN_ROWS {
                for channel in 0..PATTERN_CHANNELS {
                    let entry = pattern.entry_mut(row, channel);
                    if entry.inst as usize > instrument_count {
                        entry.inst = 0;
                    }
                    if entry.vol != VOLUME_NONE && entry.vol > 64 {
                        entry.vol = 64;
                    }
                }
            }
        }

        for inst in &mut self.instruments {
            if inst.loop_end > inst.data.len() {
                inst.loop_end = inst.data.len();
            }
            if inst.loop_end <= inst.loop_begin {
                inst.loop_begin = 0;
                inst.loop_end = 0;
            }
        }

        // keep only the playable part of the order list: entries past the
        // end marker are unreachable, and skip markers are no-ops
        let pattern_count = self.patterns.len();
        let mut orders = Vec::new();
        for &order in &self.orders {
            if order == ORDER_END {
                break;
            }
            if (order as usize) < pattern_count {
                orders.push(order);
            }
        }
        if orders.is_empty() {
            orders.push(0);
        }
        self.orders = orders;
    }
}

// MOD effects that have a counterpart in the canonical command set; the
// rest are dropped. Set-volume maps onto the volume column.
fn convert_mod_effect(entry: &mut PatternEntry, effect: ModEffect, data: u8) {
    let command = match effect {
        ModEffect::SetVolume => {
            entry.vol = data;
            return;
        }
        ModEffect::Arpeggio if data != 0 => Command::Arpeggio,
        ModEffect::SetSpeed => Command::SetSpeed,
        ModEffect::TonePortamento => Command::TonePortamento,
        ModEffect::SlideUp => Command::SlideUp,
        ModEffect::SlideDown => Command::SlideDown,
        ModEffect::PatternBreak => Command::PatternBreak,
        ModEffect::VolumeSlide => Command::VolumeSlide,
        _ => return,
    };
    entry.command = command.into();
    entry.cominfo = data;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::protracker::{ModEvent, ModPattern, ModSample};
    use super::note::NOTE_EMPTY;

    fn event(period: u16, instrument: u8, effect: ModEffect, data: u8) -> ModEvent {
        ModEvent {
            period,
            instrument,
            effect,
            effect_data: data,
        }
    }

    fn one_pattern_mod() -> ProtrackerMod {
        let mut rows = Vec::new();
        rows.push(vec![
            event(428, 1, ModEffect::SetVolume, 80),
            event(0, 0, ModEffect::SetSpeed, 3),
            event(999, 40, ModEffect::Tremolo, 5),
            event(0, 0, ModEffect::Arpeggio, 0),
        ]);
        for _ in 1..64 {
            rows.push((0..4).map(|_| event(0, 0, ModEffect::Arpeggio, 0)).collect());
        }

        let mut samples: Vec<ModSample> = (0..31)
            .map(|_| ModSample {
                name: String::new(),
                finetune: 0,
                length: 0,
                volume: 0,
                loop_begin: 0,
                loop_length: 0,
                data: vec![],
            })
            .collect();
        samples[0].length = 4;
        samples[0].volume = 70;
        samples[0].data = vec![0, 64, 0, -64];

        ProtrackerMod {
            title: String::from("conversion"),
            num_channels: 4,
            samples,
            pattern_table: vec![0, 9, 0],
            patterns: vec![ModPattern { rows }],
        }
    }

    #[test]
    fn converts_events_to_canonical_entries() {
        let module = Module::from_protracker(&one_pattern_mod());
        let pattern = &module.patterns[0];

        // period 428 is C-4; set-volume becomes the volume column (clamped)
        let entry = pattern.entry(0, 0);
        assert_eq!(entry.note, 0x40);
        assert_eq!(entry.inst, 1);
        assert_eq!(entry.vol, 64);

        let entry = pattern.entry(0, 1);
        assert_eq!(entry.note, NOTE_EMPTY);
        assert_eq!(entry.command, u8::from(Command::SetSpeed));
        assert_eq!(entry.cominfo, 3);

        // unknown period yields no note; unmapped effect is dropped; the
        // out-of-range instrument reference is cleared
        let entry = pattern.entry(0, 2);
        assert_eq!(entry.note, NOTE_EMPTY);
        assert_eq!(entry.inst, 0);
        assert_eq!(entry.command, pattern::COMMAND_NONE);

        // zero-parameter arpeggio is no command at all
        let entry = pattern.entry(0, 3);
        assert_eq!(entry.command, pattern::COMMAND_NONE);
    }

    #[test]
    fn sanitize_trims_orders_and_volumes() {
        let module = Module::from_protracker(&one_pattern_mod());
        // order 9 points past the single pattern and is dropped
        assert_eq!(module.orders, vec![0, 0]);
        // instrument default volume clamps to 64
        assert_eq!(module.instruments[0].volume, 64);
    }

    #[test]
    fn mod_samples_convert_to_float() {
        let module = Module::from_protracker(&one_pattern_mod());
        let data = &module.instruments[0].data;
        assert_eq!(data.len(), 4);
        // signed zero maps to the middle of the unsigned range
        assert!((data[0] - 0.003_921_6).abs() < 1e-4);
        assert!(data[1] > 0.49 && data[1] < 0.51);
        assert!(data[3] < -0.49);
    }

    #[test]
    fn empty_module_still_has_a_playable_order() {
        let pt_mod = ProtrackerMod {
            title: String::new(),
            num_channels: 4,
            samples: vec![],
            pattern_table: vec![],
            patterns: vec![],
        };
        let module = Module::from_protracker(&pt_mod);
        assert_eq!(module.orders, vec![0]);
        assert_eq!(module.patterns.len(), 1);
    }
}
