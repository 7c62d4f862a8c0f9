use std::env::args;
use std::error::Error as _;

use webp_convert::{ConversionRequest, Converter, Format, Locator};

/// cargo run --example convert -- <source path or url> <destination> [width height] [quality]
///
/// Formats are taken from the file extensions. Set `RUST_LOG=debug` to follow the pipeline.
fn main() {
    env_logger::init();

    let arg: Vec<String> = args().skip(1).collect();
    if !matches!(arg.len(), 2..=5) {
        eprintln!("Usage: convert <source> <destination> [width height] [quality]");
        std::process::exit(2);
    }

    let (source, destination) = (&arg[0], &arg[1]);
    let locator = if source.starts_with("http://") || source.starts_with("https://") {
        Locator::remote(source.as_str())
    } else {
        Locator::local(source.as_str())
    };

    let (Some(from), Some(to)) = (Format::from_path(source), Format::from_path(destination)) else {
        eprintln!("Could not tell the image formats from the file extensions");
        std::process::exit(2);
    };

    let numbers: Vec<i32> = match arg[2..].iter().map(|n| n.parse()).collect() {
        Ok(numbers) => numbers,
        Err(e) => {
            eprintln!("Invalid number: {e}");
            std::process::exit(2);
        }
    };

    let mut request = ConversionRequest::new(from, to, locator, destination.as_str());
    if let [width, height, ..] = numbers[..] {
        // Negative sizes become 0 and are rejected like any other invalid size.
        request = request.size(width.max(0) as u32, height.max(0) as u32);
    }
    if let Some(&quality) = numbers.get(2).or(numbers.first().filter(|_| numbers.len() == 1)) {
        request = request.quality(quality);
    }

    match Converter::new().run(&request) {
        Ok(true) => println!("{from} -> {to}: wrote {destination}"),
        Ok(false) => {
            eprintln!("Rejected: {request:?}");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Conversion failed: {e}");
            let mut source = e.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            std::process::exit(1);
        }
    }
}
