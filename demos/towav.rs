use std::env;
use std::fs;

use s3mplay::format::protracker::ProtrackerMod;
use s3mplay::format::s3m::S3mFile;
use s3mplay::module::Module;
use s3mplay::player::Player;

const SAMPLE_RATE: u32 = 48000;

fn main() {
    let mut args = env::args();
    args.next();
    let filename = args.next().expect("usage: towav <file> <out.wav> [seconds]");
    let filename_out = args.next().expect("usage: towav <file> <out.wav> [seconds]");
    let seconds: u32 = args.next().map(|s| s.parse().expect("bad duration")).unwrap_or(60);

    let data = fs::read(&filename).expect("can't open file");
    let lower = filename.to_lowercase();
    let module = if lower.ends_with(".s3m") {
        Module::from_s3m(&S3mFile::load(data).expect("load failed"))
    } else {
        Module::from_protracker(&ProtrackerMod::load(&data).expect("load failed"))
    };

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(filename_out, spec).expect("can't create wav");

    let mut player = Player::new(module, SAMPLE_RATE);
    let mut buffer = vec![0.0f32; 1024 * 2];
    let mut frames_left = (seconds * SAMPLE_RATE) as usize;
    while frames_left > 0 {
        let frames = frames_left.min(1024);
        let chunk = &mut buffer[..frames * 2];
        player.render(chunk);
        for &sample in chunk.iter() {
            writer.write_sample(sample).expect("write failed");
        }
        frames_left -= frames;
    }
    writer.finalize().expect("finalize failed");
}
