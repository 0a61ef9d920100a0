use std::env;
use std::fs;

use s3mplay::format::protracker::ProtrackerMod;
use s3mplay::format::s3m::S3mFile;
use s3mplay::module::{info, Module};

fn main() {
    let mut args = env::args();
    args.next();
    let filename = args.next().expect("usage: dump <file.s3m|file.mod>");

    let data = fs::read(&filename).expect("can't open file");
    let lower = filename.to_lowercase();

    let module = if lower.ends_with(".s3m") {
        Module::from_s3m(&S3mFile::load(data).expect("load failed"))
    } else {
        Module::from_protracker(&ProtrackerMod::load(&data).expect("load failed"))
    };

    println!("{}", info::info_str(&module));
}
