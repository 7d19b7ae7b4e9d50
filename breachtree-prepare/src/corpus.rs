use breachtree::{sha1_from_hex, Sha1};

/// Extract the digest from one corpus line.
///
/// A line is 40 hex characters, optionally followed by `:count` (the HIBP
/// ordered-by-hash format). Trailing line endings must already be stripped.
#[inline]
pub fn line_to_sha1(line: &[u8]) -> Option<Sha1> {
    if line.len() > 40 && line[40] != b':' {
        return None;
    }
    sha1_from_hex(&line[..line.len().min(40)])
}
