use super::note::{NOTE_CUT, NOTE_EMPTY, NOTE_NAMES};
use super::pattern::{Pattern, PatternEntry, COMMAND_NONE, PATTERN_ROWS, VOLUME_NONE};
use super::{Instrument, Module};

static COMMAND_NAMES: &str = ".ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub fn info_str(module: &Module) -> String {
    let mut ret = format!("Title: {}\n", module.song_name);
    ret.push_str(&format!(
        "Speed: {}, Tempo: {}\n",
        module.initial_speed, module.initial_tempo
    ));

    ret.push_str("\nInstruments:\n");
    ret.push_str(&info_instruments(&module.instruments));

    ret.push_str("\n\nOrders:\n");
    ret.push_str(&info_orders(&module.orders));

    ret.push_str("\n\n");
    for (idx, pattern) in module.patterns.iter().enumerate() {
        ret.push_str(&format!("Pattern {:>02x}:\n", idx));
        ret.push_str(&info_pattern(pattern));
        ret.push_str("\n");
    }

    ret
}

fn info_instruments(instruments: &[Instrument]) -> String {
    let inst_strs: Vec<_> = instruments
        .iter()
        .enumerate()
        .filter(|(_idx, inst)| !inst.data.is_empty())
        .map(|(idx, inst)| {
            format!(
                "{:>02} {:>22}, len: {:>05x}, vol: {:>02}, c2: {:>5}, loop: {:>05x}-{:>05x}",
                idx + 1,
                inst.name,
                inst.data.len(),
                inst.volume,
                inst.c2_speed,
                inst.loop_begin,
                inst.loop_end
            )
        })
        .collect();
    inst_strs.join("\n")
}

fn info_orders(orders: &[u8]) -> String {
    let order_strs: Vec<_> = orders
        .iter()
        .enumerate()
        .map(|(pos, pat)| format!("{:>02x} {:>02x}", pos, pat))
        .collect();
    order_strs.join("   ")
}

fn info_pattern(pattern: &Pattern) -> String {
    let mut ret = String::new();
    for row in 0..PATTERN_ROWS {
        ret.push_str(&format!("{:>02x}  ", row));
        let entry_strs: Vec<_> = (0..8)
            .map(|channel| render_entry(pattern.entry(row, channel)))
            .collect();
        ret.push_str(&entry_strs.join(" | "));
        ret.push_str("\n");
    }
    ret
}

// "C-4 01 32 .00", the classic tracker cell notation
fn render_entry(entry: &PatternEntry) -> String {
    let note = if entry.note == NOTE_EMPTY {
        String::from("...")
    } else if entry.note == NOTE_CUT {
        String::from("---")
    } else {
        let semitone = (entry.note & 0x0F) as usize;
        let octave = entry.note >> 4;
        format!("{}{}", NOTE_NAMES[if semitone < 12 { semitone } else { 11 }], octave)
    };

    let inst = if entry.inst != 0 {
        format!("{:>02}", entry.inst)
    } else {
        String::from("..")
    };

    let vol = if entry.vol != VOLUME_NONE {
        format!("{:>02}", entry.vol)
    } else {
        String::from("..")
    };

    let command = if entry.command != COMMAND_NONE && (entry.command as usize) < COMMAND_NAMES.len()
    {
        format!(
            "{}{:>02X}",
            &COMMAND_NAMES[entry.command as usize..entry.command as usize + 1],
            entry.cominfo
        )
    } else {
        String::from(".00")
    };

    format!("{} {} {} {}", note, inst, vol, command)
}
