use std::io::BufRead;

use breachtree::{Sha1, StoreDevice, TreeBuilder};

use crate::corpus::line_to_sha1;
use crate::error::Error;

/// What the preparer did with the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareReport {
    /// Digests inserted into the tree.
    pub keys: u64,
    /// Lines skipped because they repeated the previous digest exactly.
    pub duplicates: u64,
}

/// Stream a sorted hex corpus into a finalized tree on `device`.
///
/// `progress` is called with the number of input bytes consumed per line,
/// so a caller can drive a byte-based progress bar against the corpus
/// length. The corpus is never materialized in memory.
///
/// Exact duplicate lines are skipped (and counted); a digest smaller than
/// its predecessor aborts the build, since the builder's sorted-insertion
/// contract would silently produce a broken tree otherwise.
pub fn prepare<R, D, F>(
    mut input: R,
    device: D,
    order: u32,
    mut progress: F,
) -> Result<(D, PrepareReport), Error>
where
    R: BufRead,
    D: StoreDevice,
    F: FnMut(u64),
{
    if order == 0 {
        return Err(Error::InvalidOrder);
    }

    let mut builder = TreeBuilder::create(device, order)?;
    let mut report = PrepareReport {
        keys: 0,
        duplicates: 0,
    };

    let mut line_buf = Vec::with_capacity(64);
    let mut last: Option<Sha1> = None;
    let mut line_no = 0u64;

    loop {
        line_buf.clear();
        let consumed = input.read_until(b'\n', &mut line_buf)?;
        if consumed == 0 {
            break;
        }
        line_no += 1;

        let mut line = line_buf.as_slice();
        if line.ends_with(b"\n") {
            line = &line[..line.len() - 1];
        }
        if line.ends_with(b"\r") {
            line = &line[..line.len() - 1];
        }

        if !line.is_empty() {
            let digest = line_to_sha1(line).ok_or(Error::InvalidDigest { line: line_no })?;

            match last {
                Some(prev) if digest == prev => report.duplicates += 1,
                Some(prev) if digest < prev => return Err(Error::OutOfOrder { line: line_no }),
                _ => {
                    builder.insert_sorted(&digest)?;
                    last = Some(digest);
                    report.keys += 1;
                }
            }
        }

        progress(consumed as u64);
    }

    let device = builder.finalize()?;
    Ok((device, report))
}
