use std::fs::File;
use std::path::PathBuf;

use breachtree::TreeReader;
use breachtree_check::{resolve_digest, Error};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "breachtree-check")]
#[command(about = "Check whether a SHA-1 digest is present in a breachtree file")]
struct Args {
    /// Finalized tree file produced by breachtree-prepare
    #[arg(short, long)]
    tree: PathBuf,

    /// 40-character hex SHA-1 digest to look up
    #[arg(long, conflicts_with = "password", required_unless_present = "password")]
    hash: Option<String>,

    /// Password to hash with SHA-1 and look up
    #[arg(long)]
    password: Option<String>,
}

fn main() -> Result<(), Error> {
    let args = Args::parse();

    let digest = resolve_digest(args.hash.as_deref(), args.password.as_deref())?;

    let file = File::open(&args.tree)?;
    let mut reader = TreeReader::open(file)?;

    if reader.contains(&digest)? {
        println!("pwned");
    } else {
        println!("not found");
    }

    Ok(())
}
