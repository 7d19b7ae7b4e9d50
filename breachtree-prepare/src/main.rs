use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use breachtree_prepare::{prepare, Error};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser, Debug)]
#[command(name = "breachtree-prepare")]
#[command(about = "Build a breachtree B-tree file from a sorted hex digest corpus")]
struct Args {
    /// Corpus text file: one hex SHA-1 digest per line, sorted ascending
    #[arg(short, long)]
    input: PathBuf,

    /// Output tree file
    #[arg(short, long)]
    output: PathBuf,

    /// B-tree order; a node holds up to twice this many keys
    #[arg(long, default_value_t = 1024, value_parser = clap::value_parser!(u32).range(1..))]
    order: u32,

    /// Overwrite an existing output file
    #[arg(long)]
    force: bool,

    /// Disable progress bar
    #[arg(long)]
    no_progress: bool,
}

fn main() -> Result<(), Error> {
    let args = Args::parse();

    if args.output.exists() && !args.force {
        return Err(Error::FileExists { path: args.output });
    }

    let input = File::open(&args.input)?;
    let corpus_len = input.metadata()?.len();
    let input = BufReader::with_capacity(1 << 20, input);

    let output = File::options()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&args.output)?;

    let progress_bar = if !args.no_progress {
        let pb = ProgressBar::new(corpus_len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let (device, report) = prepare(input, output, args.order, |bytes| {
        if let Some(ref pb) = progress_bar {
            pb.inc(bytes);
        }
    })?;

    if let Some(pb) = progress_bar {
        pb.finish_with_message("done");
    }

    let tree_bytes = device.metadata()?.len();
    drop(device);

    println!(
        "Inserted {} digests into {:?} ({} bytes, order {})",
        report.keys, args.output, tree_bytes, args.order
    );
    if report.duplicates > 0 {
        println!("Skipped {} duplicate lines", report.duplicates);
    }

    Ok(())
}
