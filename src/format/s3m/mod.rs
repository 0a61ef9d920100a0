use byteorder::{ByteOrder, LittleEndian};
use std::ops::Range;

use super::{parse_str, LoadError};

pub const MAX_INSTRUMENTS: usize = 99;
pub const MAX_PATTERNS: usize = 100;

/// End-of-song marker in the order list.
pub const ORDER_END: u8 = 0xFF;
/// Placeholder order, skipped during playback.
pub const ORDER_SKIP: u8 = 0xFE;

const HEADER_LEN: usize = 0x60;
const SAMPLE_RECORD_LEN: usize = 0x50;

/// A loaded S3M file: the raw byte buffer plus validated offsets for the
/// order list, instrument records and packed pattern streams. All
/// parapointer-resolved regions are bounds-checked at load time, so the
/// accessors below never fail.
#[derive(Debug)]
pub struct S3mFile {
    data: Vec<u8>,
    pub song_name: String,
    pub global_volume: u8,
    pub initial_speed: u8,
    pub initial_tempo: u8,
    pub master_volume: u8,
    orders: Range<usize>,
    instrument_offsets: Vec<usize>,
    sample_ranges: Vec<Option<Range<usize>>>,
    pattern_ranges: Vec<Range<usize>>,
}

impl S3mFile {
    pub fn load(data: Vec<u8>) -> Result<S3mFile, LoadError> {
        if data.len() < HEADER_LEN {
            return Err(LoadError::Truncated);
        }

        // magic byte, type byte, "SCRM" tag
        if data[0x1C] != 0x1A || data[0x1D] != 16 || &data[0x2C..0x30] != b"SCRM" {
            return Err(LoadError::InvalidFormat);
        }

        let order_count = LittleEndian::read_u16(&data[0x20..]) as usize;
        let instrument_count = LittleEndian::read_u16(&data[0x22..]) as usize;
        let pattern_count = LittleEndian::read_u16(&data[0x24..]) as usize;

        if instrument_count > MAX_INSTRUMENTS || pattern_count > MAX_PATTERNS {
            return Err(LoadError::LimitExceeded);
        }

        let orders = checked_range(&data, HEADER_LEN, order_count)?;
        let instrument_paras = checked_range(&data, orders.end, instrument_count * 2)?;
        let pattern_paras = checked_range(&data, instrument_paras.end, pattern_count * 2)?;

        // Resolve instrument parapointers to record offsets and waveform
        // byte ranges. A zero parapointer means the slot carries no data.
        let mut instrument_offsets = Vec::with_capacity(instrument_count);
        let mut sample_ranges = Vec::with_capacity(instrument_count);
        for i in 0..instrument_count {
            let para = LittleEndian::read_u16(&data[instrument_paras.start + i * 2..]) as usize;
            let offset = para * 16;
            let record = checked_range(&data, offset, SAMPLE_RECORD_LEN)?;
            instrument_offsets.push(record.start);

            let rec = SampleRecord { bytes: &data[record] };
            let range = if para != 0 && rec.kind() == 1 && rec.length() > 0 {
                let start = rec.data_parapointer() * 16;
                Some(checked_range(&data, start, rec.length())?)
            } else {
                None
            };
            sample_ranges.push(range);
        }

        // Resolve pattern parapointers. The packed stream's length is the
        // little-endian word right before the data.
        let mut pattern_ranges = Vec::with_capacity(pattern_count);
        for i in 0..pattern_count {
            let para = LittleEndian::read_u16(&data[pattern_paras.start + i * 2..]) as usize;
            if para == 0 {
                pattern_ranges.push(0..0);
                continue;
            }
            let offset = para * 16;
            let len_word = checked_range(&data, offset, 2)?;
            let packed_len = LittleEndian::read_u16(&data[len_word]) as usize;
            pattern_ranges.push(checked_range(&data, offset + 2, packed_len)?);
        }

        let song_name = parse_str(&data[0..28]);
        let global_volume = data[0x30];
        let initial_speed = data[0x31];
        let initial_tempo = data[0x32];
        let master_volume = data[0x33];

        Ok(S3mFile {
            data,
            song_name,
            global_volume,
            initial_speed,
            initial_tempo,
            master_volume,
            orders,
            instrument_offsets,
            sample_ranges,
            pattern_ranges,
        })
    }

    pub fn instrument_count(&self) -> usize {
        self.instrument_offsets.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.pattern_ranges.len()
    }

    pub fn orders(&self) -> &[u8] {
        &self.data[self.orders.clone()]
    }

    pub fn instrument(&self, index: usize) -> SampleRecord<'_> {
        let offset = self.instrument_offsets[index];
        SampleRecord {
            bytes: &self.data[offset..offset + SAMPLE_RECORD_LEN],
        }
    }

    /// Raw unsigned 8-bit waveform for an instrument; empty if the slot
    /// carries no sample data.
    pub fn sample_data(&self, index: usize) -> &[u8] {
        match &self.sample_ranges[index] {
            Some(range) => &self.data[range.clone()],
            None => &[],
        }
    }

    pub fn packed_pattern(&self, index: usize) -> &[u8] {
        &self.data[self.pattern_ranges[index].clone()]
    }
}

fn checked_range(data: &[u8], start: usize, len: usize) -> Result<Range<usize>, LoadError> {
    let end = start.checked_add(len).ok_or(LoadError::Truncated)?;
    if end > data.len() {
        return Err(LoadError::Truncated);
    }
    Ok(start..end)
}

/// Typed view over one 0x50-byte instrument record.
pub struct SampleRecord<'a> {
    bytes: &'a [u8],
}

impl<'a> SampleRecord<'a> {
    /// Record type; 1 is a digital sample, anything else is ignored.
    pub fn kind(&self) -> u8 {
        self.bytes[0x00]
    }

    fn data_parapointer(&self) -> usize {
        LittleEndian::read_u16(&self.bytes[0x0E..]) as usize
    }

    pub fn length(&self) -> usize {
        LittleEndian::read_u32(&self.bytes[0x10..]) as usize
    }

    pub fn loop_begin(&self) -> usize {
        LittleEndian::read_u32(&self.bytes[0x14..]) as usize
    }

    pub fn loop_end(&self) -> usize {
        LittleEndian::read_u32(&self.bytes[0x18..]) as usize
    }

    pub fn default_volume(&self) -> u8 {
        self.bytes[0x1C]
    }

    pub fn is_looping(&self) -> bool {
        self.bytes[0x1F] & 1 != 0
    }

    pub fn c2_speed(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[0x20..])
    }

    pub fn name(&self) -> String {
        parse_str(&self.bytes[0x30..0x4C])
    }
}
