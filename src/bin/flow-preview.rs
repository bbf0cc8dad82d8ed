use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use flow_export::display::{DisplayEvent, TileDecoder};

/// Follows a renderer's tile stream and keeps a snapshot of the image.
#[derive(Parser, Debug)]
#[command(
    name = "flow-preview",
    about = "Decode a renderer tile stream into an image",
    version
)]
struct Args {
    /// Tile stream to read, `-` for stdin.
    #[arg(long, default_value = "-")]
    input: String,

    /// PNG written every time a frame ends.
    #[arg(long, default_value = "preview.png")]
    snapshot: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut stream: Box<dyn Read> = if args.input == "-" {
        Box::new(BufReader::new(io::stdin().lock()))
    } else {
        let file = File::open(&args.input)
            .with_context(|| format!("Cannot open tile stream {}", args.input))?;
        Box::new(BufReader::new(file))
    };

    let mut decoder = TileDecoder::new();
    let mut tiles = 0usize;
    while let Some(event) = decoder.check_stream(&mut stream)? {
        match event {
            DisplayEvent::TileUpdated(_) => tiles += 1,
            DisplayEvent::FrameEnded => {
                if let Some(image) = decoder.image() {
                    image.save(&args.snapshot).with_context(|| {
                        format!("Cannot save snapshot {}", args.snapshot.display())
                    })?;
                    log::info!(
                        "Frame done after {} tiles, saved {}",
                        tiles,
                        args.snapshot.display()
                    );
                }
                tiles = 0;
            }
            DisplayEvent::ConnectionDenied => break,
            _ => {}
        }
    }
    Ok(())
}
