use crate::module::{note, Instrument};

use super::channel::Channel;

/// Per-channel mixing cursor: a fractional read position into the bound
/// instrument's waveform and the per-frame step derived from the channel's
/// period.
pub struct SampleStream {
    position: f64,
    step: f64,
}

impl SampleStream {
    pub fn new() -> SampleStream {
        SampleStream {
            position: 0.0,
            step: 0.0,
        }
    }

    /// Refreshes the cursor from the channel before a tick-chunk is mixed
    /// and consumes a pending note trigger. Returns the instrument index to
    /// mix, or None if the channel is silent this chunk.
    pub fn sync(&mut self, channel: &mut Channel, sample_rate: i32) -> Option<usize> {
        let index = channel.instrument?;
        if channel.volume == 0 || channel.period <= 0 {
            return None;
        }

        self.step = note::period_hz(channel.period) / sample_rate as f64;

        if channel.note_on {
            self.position = channel.fx.sample_offset as f64;
            channel.fx.sample_offset = 0;
            channel.note_on = false;
        }

        Some(index)
    }

    /// Accumulates one tick-chunk into the interleaved stereo buffer. The
    /// buffer is not cleared here; the render loop clears once per chunk.
    pub fn mix(&mut self, buffer: &mut [f32], channel: &Channel, instrument: &Instrument) {
        let volume = channel.volume as f32 / 64.0;
        let panning = channel.panning as f32 / 15.0;

        for frame in buffer.chunks_exact_mut(2) {
            self.position += self.step;

            if instrument.is_looping() && self.position >= instrument.loop_end as f64 {
                self.position -= (instrument.loop_end - instrument.loop_begin) as f64;
            }

            let index = self.position as usize;
            if index < instrument.data.len() {
                let sample = instrument.data[index];
                frame[0] += (1.0 - panning) * volume * sample;
                frame[1] += panning * volume * sample;
            }
        }
    }

    #[cfg(test)]
    pub fn position(&self) -> f64 {
        self.position
    }

    #[cfg(test)]
    pub fn step(&self) -> f64 {
        self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::channel::Channel;

    fn test_instrument(data: Vec<f32>, loop_begin: usize, loop_end: usize) -> Instrument {
        Instrument {
            name: String::new(),
            volume: 64,
            c2_speed: 8363,
            loop_begin,
            loop_end,
            data,
        }
    }

    fn sounding_channel(period: i32) -> Channel {
        let mut channel = Channel::new();
        channel.instrument = Some(0);
        channel.volume = 64;
        channel.period = period;
        channel
    }

    #[test]
    fn step_is_positive_for_valid_periods() {
        let mut stream = SampleStream::new();
        for &period in &[1, 56, 428, 907, 1712, 27392] {
            for &rate in &[8000, 44100, 48000] {
                let mut channel = sounding_channel(period);
                assert!(stream.sync(&mut channel, rate).is_some());
                assert!(stream.step() > 0.0, "period {} rate {}", period, rate);
            }
        }
    }

    #[test]
    fn silent_or_unbound_channels_are_skipped() {
        let mut stream = SampleStream::new();

        let mut channel = Channel::new();
        assert!(stream.sync(&mut channel, 48000).is_none());

        let mut channel = sounding_channel(428);
        channel.volume = 0;
        assert!(stream.sync(&mut channel, 48000).is_none());

        let mut channel = sounding_channel(0);
        assert!(stream.sync(&mut channel, 48000).is_none());
    }

    #[test]
    fn trigger_resets_position_and_consumes_offset() {
        let mut stream = SampleStream::new();
        let mut channel = sounding_channel(428);
        channel.note_on = true;
        channel.fx.sample_offset = 512;

        stream.sync(&mut channel, 48000).unwrap();
        assert_eq!(stream.position(), 512.0);
        assert!(!channel.note_on);
        assert_eq!(channel.fx.sample_offset, 0);

        // the next trigger starts from zero again
        channel.note_on = true;
        stream.sync(&mut channel, 48000).unwrap();
        assert_eq!(stream.position(), 0.0);
    }

    #[test]
    fn loop_wrap_holds_for_a_thousand_cycles() {
        let instrument = test_instrument(vec![0.5; 100], 20, 100);
        let mut channel = sounding_channel(428);
        let mut stream = SampleStream::new();
        stream.sync(&mut channel, 48000).unwrap();

        let mut buffer = vec![0.0f32; 256];
        let mut wraps = 0;
        let mut last = stream.position();
        while wraps < 1000 {
            stream.mix(&mut buffer, &channel, &instrument);
            let now = stream.position();
            if now < last {
                wraps += 1;
            }
            last = now;
            // the cursor never drifts outside the loop region
            assert!(now < instrument.loop_end as f64 + stream.step());
        }
    }

    #[test]
    fn past_the_end_contributes_silence() {
        let instrument = test_instrument(vec![1.0; 8], 0, 0);
        let mut channel = sounding_channel(428);
        let mut stream = SampleStream::new();
        stream.sync(&mut channel, 48000).unwrap();

        // play far past the 8-frame waveform
        let mut buffer = vec![0.0f32; 4096];
        stream.mix(&mut buffer, &channel, &instrument);
        let mut tail = vec![0.0f32; 64];
        stream.mix(&mut tail, &channel, &instrument);
        assert!(tail.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn panning_splits_the_signal() {
        let instrument = test_instrument(vec![1.0; 1000], 0, 0);
        let mut channel = sounding_channel(428);
        channel.panning = 0; // full left
        let mut stream = SampleStream::new();
        stream.sync(&mut channel, 48000).unwrap();

        let mut buffer = vec![0.0f32; 64];
        stream.mix(&mut buffer, &channel, &instrument);
        assert!(buffer.chunks_exact(2).all(|f| f[1] == 0.0));
        assert!(buffer.chunks_exact(2).any(|f| f[0] > 0.0));
    }
}
