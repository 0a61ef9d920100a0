/// Voices processed by the sequencer per tick.
pub const CHANNELS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideKind {
    /// step * 4 on every tick after the row trigger
    Normal,
    /// step * 4 once, on the row trigger
    Fine,
    /// step * 1 once, on the row trigger
    ExtraFine,
}

impl Default for SlideKind {
    fn default() -> SlideKind {
        SlideKind::Normal
    }
}

/// The continuous effect a channel is running, if any. Per-activation
/// state (counters) rides in the variant; parameters that the formats
/// remember across rows live in `EffectMemory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveEffect {
    None,
    VolumeSlide,
    PitchSlideUp,
    PitchSlideDown,
    TonePortamento,
    Vibrato,
    TonePortamentoVolumeSlide,
    VibratoVolumeSlide,
    Arpeggio,
    Retrigger { counter: u8 },
    NoteDelay { remaining: u8 },
}

impl ActiveEffect {
    pub fn is_vibrato(&self) -> bool {
        matches!(
            self,
            ActiveEffect::Vibrato | ActiveEffect::VibratoVolumeSlide
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VibratoState {
    pub speed: i32,
    pub depth: i32,
    pub phase: i32,
    /// The period vibrato oscillates around; restored when vibrato ends.
    pub anchor: i32,
}

/// Remembered effect parameters. The formats reuse the previous value
/// whenever a command arrives with a zero parameter, so these survive
/// effect changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectMemory {
    pub volume_slide: i32,
    pub fine_volume_slide: bool,
    pub pitch_slide_kind: SlideKind,
    pub pitch_slide_speed: i32,
    pub porta_target: i32,
    pub porta_speed: i32,
    pub vibrato: VibratoState,
    pub arpeggio_notes: [u8; 3],
    pub arpeggio_step: usize,
    pub retrig_volume_code: u8,
    pub retrig_interval: u8,
    /// Start frame for the next note trigger; consumed by the trigger.
    pub sample_offset: usize,
}

pub struct Channel {
    /// Index into the module's instrument table.
    pub instrument: Option<usize>,
    /// Set when a note (re)triggers; consumed by the sample stream.
    pub note_on: bool,
    pub period: i32,
    /// 0..=64
    pub volume: i32,
    /// 0 = full left, 15 = full right
    pub panning: i32,
    pub active: ActiveEffect,
    pub fx: EffectMemory,
}

impl Channel {
    pub fn new() -> Channel {
        Channel {
            instrument: None,
            note_on: false,
            period: 0,
            volume: 0,
            panning: 7,
            active: ActiveEffect::None,
            fx: EffectMemory::default(),
        }
    }

    pub fn clamp_volume(&mut self) {
        if self.volume > 64 {
            self.volume = 64;
        }
        if self.volume < 0 {
            self.volume = 0;
        }
    }
}

/// Volume adjustment applied each time a retrigger fires, keyed by the
/// modifier code from the effect's high nibble.
pub fn retrig_volume(code: u8, volume: i32) -> i32 {
    match code {
        1 => volume - 1,
        2 => volume - 2,
        3 => volume - 4,
        4 => volume - 8,
        5 => volume - 16,
        6 => volume * 2 / 3,
        7 => volume / 2,
        9 => volume + 1,
        10 => volume + 2,
        11 => volume + 4,
        12 => volume + 8,
        13 => volume + 16,
        14 => volume * 3 / 2,
        15 => volume * 2,
        _ => volume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrig_modifier_table() {
        assert_eq!(retrig_volume(0, 40), 40);
        assert_eq!(retrig_volume(8, 40), 40);
        assert_eq!(retrig_volume(5, 40), 24);
        assert_eq!(retrig_volume(6, 48), 32);
        assert_eq!(retrig_volume(7, 48), 24);
        assert_eq!(retrig_volume(13, 40), 56);
        assert_eq!(retrig_volume(14, 40), 60);
        assert_eq!(retrig_volume(15, 40), 80); // clamped by the caller
    }

    #[test]
    fn volume_clamps_to_range() {
        let mut channel = Channel::new();
        channel.volume = 80;
        channel.clamp_volume();
        assert_eq!(channel.volume, 64);
        channel.volume = -3;
        channel.clamp_volume();
        assert_eq!(channel.volume, 0);
    }
}
