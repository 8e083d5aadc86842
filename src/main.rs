//! psdprobe command line: decode a document and print it as JSON

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use psdprobe_lib::{DecodeOptions, Decoder};

#[derive(Parser, Debug)]
#[command(name = "psdprobe", about = "Inspect the structure of a PSD file")]
struct Args {
    /// Document to decode
    path: PathBuf,
    /// Skip the layer tree, decode the composite only
    #[arg(long = "image-only", conflicts_with = "metadata_only")]
    image_only: bool,
    /// Decode layers without pixels, shapes, text or effects
    #[arg(long = "metadata-only")]
    metadata_only: bool,
    /// Also decode the embedded thumbnail
    #[arg(long)]
    thumbnail: bool,
    /// Read decode options from a JSON file
    #[arg(long, conflicts_with_all = ["image_only", "metadata_only"])]
    options: Option<PathBuf>,
}

fn load_options(args: &Args) -> Result<DecodeOptions, String> {
    let mut options = match &args.options {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            serde_json::from_str(&text)
                .map_err(|e| format!("Invalid options in {}: {}", path.display(), e))?
        }
        None if args.image_only => DecodeOptions::image_only(),
        None if args.metadata_only => DecodeOptions::layer_metadata_only(),
        None => DecodeOptions::default(),
    };
    if args.thumbnail {
        options.decode_thumbnail = true;
    }
    Ok(options)
}

fn run(args: &Args) -> Result<(), String> {
    let options = load_options(args)?;
    let image = Decoder::new(options).decode_file(&args.path)?;

    if let Some(thumbnail) = &image.thumbnail {
        tracing::info!("Thumbnail: {}x{}", thumbnail.width(), thumbnail.height());
    }
    let json = serde_json::to_string_pretty(&image).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn main() -> ExitCode {
    psdprobe_lib::init_logging();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
