use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::env;
use std::fs;
use std::process;

use s3mplay::format::protracker::ProtrackerMod;
use s3mplay::format::s3m::S3mFile;
use s3mplay::module::Module;
use s3mplay::player::Player;

const SAMPLE_RATE: u32 = 48000;

fn load_module(filename: &str) -> Result<Module, String> {
    let data = fs::read(filename).map_err(|e| format!("can't open file {}: {}", filename, e))?;

    // dispatch on the extension, case-insensitively
    let lower = filename.to_lowercase();
    if lower.ends_with(".s3m") {
        S3mFile::load(data)
            .map(|file| Module::from_s3m(&file))
            .map_err(|e| e.to_string())
    } else if lower.ends_with(".mod") {
        ProtrackerMod::load(&data)
            .map(|pt_mod| Module::from_protracker(&pt_mod))
            .map_err(|e| e.to_string())
    } else {
        Err(format!("unrecognized file type: {}", filename))
    }
}

fn main() {
    let filename = match env::args().nth(1) {
        Some(filename) => filename,
        None => {
            eprintln!("Please enter a filename");
            process::exit(1);
        }
    };

    let module = match load_module(&filename) {
        Ok(module) => module,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    println!("Playing: {}", module.song_name);

    let mut player = Player::new(module, SAMPLE_RATE);

    let host = cpal::default_host();
    let device = match host.default_output_device() {
        Some(device) => device,
        None => {
            eprintln!("Error: no default output device");
            process::exit(1);
        }
    };

    let stream = match device.build_output_stream(
        &cpal::StreamConfig {
            channels: 2,
            sample_rate: cpal::SampleRate(SAMPLE_RATE),
            buffer_size: cpal::BufferSize::Default,
        },
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            player.render(data);
        },
        move |err| {
            eprintln!("stream error: {}", err);
        },
    ) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = stream.play() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    println!("Press enter to exit...");
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);
}
