use byteorder::{BigEndian, ReadBytesExt};
use num_enum::TryFromPrimitive;
use std::convert::TryFrom;
use std::io::{Cursor, Read, Seek, SeekFrom};

use super::{parse_str, LoadError};

const SAMPLE_SLOTS: usize = 31;
const PATTERN_TABLE_LEN: usize = 128;
const SIGNATURE_OFFSET: u64 = 0x438;

#[derive(Debug)]
pub struct ProtrackerMod {
    pub title: String,
    pub num_channels: usize,
    pub samples: Vec<ModSample>,
    pub pattern_table: Vec<u8>,
    pub patterns: Vec<ModPattern>,
}

#[derive(Debug)]
pub struct ModSample {
    pub name: String,
    pub finetune: i8,
    pub length: usize,
    pub volume: u8,
    pub loop_begin: usize,
    pub loop_length: usize,
    pub data: Vec<i8>,
}

impl ModSample {
    // loop lengths of 0 and 2 both mean "no loop" in practice
    pub fn is_looping(&self) -> bool {
        self.loop_length > 2
    }
}

#[derive(Debug)]
pub struct ModPattern {
    /// 64 rows of one event per channel.
    pub rows: Vec<Vec<ModEvent>>,
}

#[derive(Debug)]
pub struct ModEvent {
    pub period: u16,
    pub instrument: u8,
    pub effect: ModEffect,
    pub effect_data: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum ModEffect {
    Arpeggio = 0x0,
    SlideUp = 0x1,
    SlideDown = 0x2,
    TonePortamento = 0x3,
    Vibrato = 0x4,
    TonePortamentoVolumeSlide = 0x5,
    VibratoVolumeSlide = 0x6,
    Tremolo = 0x7,
    SetPanning = 0x8,
    SetSampleOffset = 0x9,
    VolumeSlide = 0xA,
    PositionJump = 0xB,
    SetVolume = 0xC,
    PatternBreak = 0xD,
    Extended = 0xE,
    SetSpeed = 0xF,
}

impl ProtrackerMod {
    pub fn load(data: &[u8]) -> Result<ProtrackerMod, LoadError> {
        let mut r = Cursor::new(data);

        // the 4-byte signature decides the channel layout
        r.seek(SeekFrom::Start(SIGNATURE_OFFSET))?;
        let mut tag = [0u8; 4];
        r.read_exact(&mut tag)?;
        let num_channels = match &tag {
            b"M.K." | b"FLT4" | b"4CHN" => 4,
            b"6CHN" => 6,
            b"8CHN" | b"FLT8" => 8,
            _ => return Err(LoadError::UnsupportedVariant),
        };

        r.seek(SeekFrom::Start(0))?;
        let title = read_str(&mut r, 20)?;

        // always 31 sample records; empty slots have length 0
        let mut samples = Vec::with_capacity(SAMPLE_SLOTS);
        for _ in 0..SAMPLE_SLOTS {
            samples.push(read_sample_record(&mut r)?);
        }

        let song_length = (r.read_u8()? as usize).min(PATTERN_TABLE_LEN);
        r.read_u8()?; // legacy restart byte

        let mut table = [0u8; PATTERN_TABLE_LEN];
        r.read_exact(&mut table)?;
        let pattern_table = table[..song_length].to_vec();

        // number of patterns stored = highest index referenced by the song
        let pattern_count = pattern_table.iter().max().copied().unwrap_or(0) as usize + 1;
        if pattern_count > PATTERN_TABLE_LEN {
            return Err(LoadError::LimitExceeded);
        }

        r.seek(SeekFrom::Current(4))?; // signature, already checked

        let mut patterns = Vec::with_capacity(pattern_count);
        for _ in 0..pattern_count {
            patterns.push(read_pattern(&mut r, num_channels)?);
        }

        // sample data follows the pattern data
        for sample in samples.iter_mut() {
            if sample.length > 0 {
                let mut raw = vec![0u8; sample.length];
                r.read_exact(&mut raw)?;
                sample.data = raw.into_iter().map(|b| b as i8).collect();
            }
        }

        Ok(ProtrackerMod {
            title,
            num_channels,
            samples,
            pattern_table,
            patterns,
        })
    }
}

fn read_str<R: Read>(r: &mut R, length: usize) -> Result<String, LoadError> {
    let mut buf = vec![0u8; length];
    r.read_exact(&mut buf)?;
    Ok(parse_str(&buf))
}

fn read_sample_record<R: Read>(r: &mut R) -> Result<ModSample, LoadError> {
    let name = read_str(r, 22)?;
    let length = r.read_u16::<BigEndian>()? as usize * 2;
    // finetune is a signed nibble stored in the low 4 bits
    let finetune = (((r.read_u8()? & 0x0F) as i8) << 4) >> 4;
    let volume = r.read_u8()?;
    let loop_begin = r.read_u16::<BigEndian>()? as usize * 2;
    let loop_length = r.read_u16::<BigEndian>()? as usize * 2;

    Ok(ModSample {
        name,
        finetune,
        length,
        volume,
        loop_begin,
        loop_length,
        data: vec![],
    })
}

fn read_pattern<R: Read>(r: &mut R, num_channels: usize) -> Result<ModPattern, LoadError> {
    let mut rows = Vec::with_capacity(64);
    for _ in 0..64 {
        let mut row = Vec::with_capacity(num_channels);
        for _ in 0..num_channels {
            row.push(read_event(r)?);
        }
        rows.push(row);
    }
    Ok(ModPattern { rows })
}

fn read_event<R: Read>(r: &mut R) -> Result<ModEvent, LoadError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;

    let period = ((buf[0] & 0x0F) as u16) << 8 | buf[1] as u16;
    let instrument = (buf[0] & 0xF0) | (buf[2] >> 4);
    let effect = ModEffect::try_from(buf[2] & 0x0F).map_err(|_| LoadError::InvalidFormat)?;

    Ok(ModEvent {
        period,
        instrument,
        effect,
        effect_data: buf[3],
    })
}
