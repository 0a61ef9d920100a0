use std::convert::TryFrom;

use crate::module::note::{self, NOTE_CUT, NOTE_EMPTY};
use crate::module::pattern::{Command, PATTERN_ROWS, VOLUME_NONE};

use super::channel::{retrig_volume, ActiveEffect, Channel, SlideKind, CHANNELS};
use super::Player;

impl Player {
    /// One sequencer step. The first tick of a row reads new notes and
    /// effects; every tick advances the continuous effects.
    pub(crate) fn process_tick(&mut self) {
        if self.tick_counter == 0 {
            self.trigger_row();
        }
        self.step_effects();
        self.tick_counter -= 1;
    }

    fn trigger_row(&mut self) {
        let mut last_row = PATTERN_ROWS;

        for c in 0..CHANNELS {
            let entry = *self.module.patterns[self.current_pattern].entry(self.current_row, c);
            let x = (entry.cominfo >> 4) as i32;
            let y = (entry.cominfo & 0x0F) as i32;
            let command = Command::try_from(entry.command).ok();

            if entry.note != NOTE_EMPTY && entry.note != NOTE_CUT {
                if entry.inst != 0 {
                    let index = entry.inst as usize - 1;
                    self.channels[c].instrument = Some(index);
                    self.channels[c].volume = if entry.vol == VOLUME_NONE {
                        self.module.instruments[index].volume as i32
                    } else {
                        entry.vol as i32
                    };
                }
                if let Some(index) = self.channels[c].instrument {
                    let c2_speed = self.module.instruments[index].c2_speed;
                    let period = note::note_period(entry.note, c2_speed);
                    let ch = &mut self.channels[c];
                    if command == Some(Command::TonePortamento) {
                        // a note beside tone portamento only retargets the
                        // slide, it never retriggers
                        ch.fx.porta_target = period;
                    } else {
                        ch.fx.vibrato.phase = 0;
                        ch.period = period;
                        ch.fx.vibrato.anchor = period;
                        ch.note_on = true;
                    }
                }
            } else {
                if entry.note == NOTE_EMPTY && entry.inst != 0 {
                    let index = entry.inst as usize - 1;
                    self.channels[c].instrument = Some(index);
                    self.channels[c].volume = if entry.vol == VOLUME_NONE {
                        self.module.instruments[index].volume as i32
                    } else {
                        entry.vol as i32
                    };
                }
                let ch = &mut self.channels[c];
                if entry.vol != VOLUME_NONE {
                    ch.volume = entry.vol as i32;
                }
                if entry.note == NOTE_CUT {
                    ch.volume = 0;
                }
            }

            // entering vibrato anchors the current period, leaving restores it
            let incoming_vibrato = matches!(
                command,
                Some(Command::Vibrato) | Some(Command::VibratoVolumeSlide)
            );
            {
                let ch = &mut self.channels[c];
                if incoming_vibrato && !ch.active.is_vibrato() {
                    ch.fx.vibrato.anchor = ch.period;
                }
                if !incoming_vibrato && ch.active.is_vibrato() {
                    ch.period = ch.fx.vibrato.anchor;
                }
            }

            match command {
                Some(Command::SetSpeed) => {
                    if entry.cominfo != 0 {
                        self.song_speed = entry.cominfo as i32;
                    }
                }
                Some(Command::SetTempo) => {
                    self.set_tempo(entry.cominfo as i32);
                }
                Some(Command::PatternBreak) => {
                    last_row = self.current_row + 1;
                }
                Some(Command::VolumeSlide) => {
                    let ch = &mut self.channels[c];
                    update_volume_slide(ch, entry.cominfo, x, y);
                    ch.active = ActiveEffect::VolumeSlide;
                }
                Some(Command::TonePortamentoVolumeSlide) => {
                    let ch = &mut self.channels[c];
                    update_volume_slide(ch, entry.cominfo, x, y);
                    ch.active = ActiveEffect::TonePortamentoVolumeSlide;
                }
                Some(Command::VibratoVolumeSlide) => {
                    let ch = &mut self.channels[c];
                    update_volume_slide(ch, entry.cominfo, x, y);
                    ch.active = ActiveEffect::VibratoVolumeSlide;
                }
                Some(Command::SlideDown) => {
                    let ch = &mut self.channels[c];
                    update_pitch_slide(ch, entry.cominfo, x, y);
                    ch.active = ActiveEffect::PitchSlideDown;
                }
                Some(Command::SlideUp) => {
                    let ch = &mut self.channels[c];
                    update_pitch_slide(ch, entry.cominfo, x, y);
                    ch.active = ActiveEffect::PitchSlideUp;
                }
                Some(Command::TonePortamento) => {
                    let ch = &mut self.channels[c];
                    if entry.cominfo != 0 {
                        ch.fx.porta_speed = entry.cominfo as i32;
                    }
                    ch.active = ActiveEffect::TonePortamento;
                }
                Some(Command::Vibrato) => {
                    let ch = &mut self.channels[c];
                    if x != 0 {
                        ch.fx.vibrato.speed = x;
                    }
                    if y != 0 {
                        ch.fx.vibrato.depth = y;
                    }
                    ch.active = ActiveEffect::Vibrato;
                }
                Some(Command::Arpeggio) => {
                    let ch = &mut self.channels[c];
                    if entry.note != NOTE_EMPTY && entry.note != NOTE_CUT {
                        ch.fx.arpeggio_notes[0] = entry.note;
                    }
                    if entry.cominfo != 0 {
                        let base = ch.fx.arpeggio_notes[0];
                        ch.fx.arpeggio_notes[1] = note::note_offset(base, x as u8);
                        ch.fx.arpeggio_notes[2] = note::note_offset(base, y as u8);
                        ch.fx.arpeggio_step = 0;
                    }
                    ch.active = ActiveEffect::Arpeggio;
                }
                Some(Command::SampleOffset) => {
                    // one-shot; deliberately leaves any running effect alone
                    self.channels[c].fx.sample_offset = entry.cominfo as usize * 256;
                }
                Some(Command::Retrigger) => {
                    let ch = &mut self.channels[c];
                    if entry.cominfo != 0 {
                        ch.fx.retrig_volume_code = x as u8;
                        ch.fx.retrig_interval = y as u8;
                    }
                    ch.active = ActiveEffect::Retrigger { counter: 0 };
                }
                Some(Command::Special) => {
                    let ch = &mut self.channels[c];
                    if x == 0x0D {
                        // defer this row's trigger by y ticks
                        ch.note_on = false;
                        ch.active = ActiveEffect::NoteDelay { remaining: y as u8 };
                    } else {
                        ch.active = ActiveEffect::None;
                    }
                }
                _ => {
                    let ch = &mut self.channels[c];
                    ch.active = ActiveEffect::None;
                    ch.fx.sample_offset = 0;
                }
            }
        }

        self.current_row += 1;
        if self.current_row >= last_row {
            self.current_order = (self.current_order + 1) % self.module.orders.len();
            self.current_pattern = self.module.orders[self.current_order] as usize;
            self.current_row = 0;
        }
        self.tick_counter = self.song_speed;
    }

    fn step_effects(&mut self) {
        let trigger_tick = self.tick_counter == self.song_speed;

        for c in 0..CHANNELS {
            match self.channels[c].active {
                ActiveEffect::None => {}
                ActiveEffect::VolumeSlide => {
                    step_volume_slide(&mut self.channels[c], trigger_tick);
                }
                ActiveEffect::PitchSlideUp => {
                    step_pitch_slide(&mut self.channels[c], trigger_tick, -1);
                }
                ActiveEffect::PitchSlideDown => {
                    step_pitch_slide(&mut self.channels[c], trigger_tick, 1);
                }
                ActiveEffect::TonePortamento => {
                    if !trigger_tick {
                        step_tone_portamento(&mut self.channels[c]);
                    }
                }
                ActiveEffect::Vibrato => {
                    if !trigger_tick {
                        step_vibrato(&mut self.channels[c]);
                    }
                }
                ActiveEffect::TonePortamentoVolumeSlide => {
                    step_volume_slide(&mut self.channels[c], trigger_tick);
                    if !trigger_tick {
                        step_tone_portamento(&mut self.channels[c]);
                    }
                }
                ActiveEffect::VibratoVolumeSlide => {
                    step_volume_slide(&mut self.channels[c], trigger_tick);
                    if !trigger_tick {
                        step_vibrato(&mut self.channels[c]);
                    }
                }
                ActiveEffect::Arpeggio => {
                    if let Some(index) = self.channels[c].instrument {
                        let c2_speed = self.module.instruments[index].c2_speed;
                        let ch = &mut self.channels[c];
                        let packed = ch.fx.arpeggio_notes[ch.fx.arpeggio_step];
                        ch.period = note::note_period(packed, c2_speed);
                        ch.fx.arpeggio_step = (ch.fx.arpeggio_step + 1) % 3;
                    }
                }
                ActiveEffect::Retrigger { counter } => {
                    let ch = &mut self.channels[c];
                    if counter == ch.fx.retrig_interval {
                        ch.note_on = true;
                        ch.volume = retrig_volume(ch.fx.retrig_volume_code, ch.volume);
                        ch.active = ActiveEffect::Retrigger { counter: 0 };
                    } else {
                        ch.active = ActiveEffect::Retrigger {
                            counter: counter + 1,
                        };
                    }
                    ch.clamp_volume();
                }
                ActiveEffect::NoteDelay { remaining } => {
                    let ch = &mut self.channels[c];
                    if remaining == 0 {
                        ch.note_on = true;
                        ch.active = ActiveEffect::None;
                    } else {
                        ch.active = ActiveEffect::NoteDelay {
                            remaining: remaining - 1,
                        };
                    }
                }
            }
        }
    }
}

fn update_volume_slide(ch: &mut Channel, cominfo: u8, x: i32, y: i32) {
    // a zero parameter repeats the previous slide settings
    if cominfo == 0 {
        return;
    }
    if y != 0 && (x == 0 || x == 15) {
        ch.fx.volume_slide = -y;
        ch.fx.fine_volume_slide = x == 15;
    } else if x != 0 && (y == 0 || y == 15) {
        ch.fx.volume_slide = x;
        ch.fx.fine_volume_slide = y == 15;
    }
}

fn update_pitch_slide(ch: &mut Channel, cominfo: u8, x: i32, y: i32) {
    if cominfo == 0 {
        return;
    }
    if x == 15 {
        ch.fx.pitch_slide_kind = SlideKind::Fine;
        ch.fx.pitch_slide_speed = y;
    } else if x == 14 {
        ch.fx.pitch_slide_kind = SlideKind::ExtraFine;
        ch.fx.pitch_slide_speed = y;
    } else {
        ch.fx.pitch_slide_kind = SlideKind::Normal;
        ch.fx.pitch_slide_speed = cominfo as i32;
    }
}

fn step_volume_slide(ch: &mut Channel, trigger_tick: bool) {
    // fine slides run once on the trigger tick, normal slides on the rest
    let perform = if trigger_tick {
        ch.fx.fine_volume_slide
    } else {
        !ch.fx.fine_volume_slide
    };
    if perform {
        ch.volume += ch.fx.volume_slide;
        ch.clamp_volume();
    }
}

fn step_pitch_slide(ch: &mut Channel, trigger_tick: bool, direction: i32) {
    let delta = match (ch.fx.pitch_slide_kind, trigger_tick) {
        (SlideKind::Fine, true) => ch.fx.pitch_slide_speed * 4,
        (SlideKind::ExtraFine, true) => ch.fx.pitch_slide_speed,
        (SlideKind::Normal, false) => ch.fx.pitch_slide_speed * 4,
        _ => return,
    };
    ch.period = ch.period.saturating_add(direction * delta).max(0);
}

fn step_tone_portamento(ch: &mut Channel) {
    let target = ch.fx.porta_target;
    let step = ch.fx.porta_speed * 4;
    if ch.period < target {
        ch.period = (ch.period + step).min(target);
    } else if ch.period > target {
        ch.period = (ch.period - step).max(target);
    }
}

fn step_vibrato(ch: &mut Channel) {
    let v = &mut ch.fx.vibrato;
    let s = (64.0 * (2.0 * std::f64::consts::PI * ((v.phase & 0xFF) as f64 / 255.0)).sin()) as i32;
    let delta = (4 * v.depth * s) >> 5;
    ch.period = v.anchor + delta;
    v.phase = (v.phase + v.speed * 4) & 0xFF;
}
