//! One-pass line boundary scan.
//!
//! Built once when a file is opened: an ordered sequence of byte-offset/length
//! descriptors, one per newline-delimited record, without materializing record
//! contents. Uses memchr for SIMD-optimized newline detection.

use memchr::memchr;
use std::io::Read;

/// Size of the scan buffer used while building the index.
const SCAN_BUF_SIZE: usize = 64 * 1024;

/// Offset/length descriptor for one undecoded record.
///
/// Immutable once computed at open time. `len` excludes the trailing newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start: u64,
    pub len: usize,
}

/// Scan the source once, splitting on `\n` and recording a [`LineSpan`] per line.
///
/// A read failure before end of input returns the partial index alongside the
/// error so callers can keep a best-effort view of what was scanned. Bytes
/// after the final newline do not form a line, matching the
/// every-record-is-newline-terminated input format.
pub fn scan_index<R: Read>(mut source: R) -> (Vec<LineSpan>, Option<std::io::Error>) {
    let mut index = Vec::new();
    let mut buf = vec![0u8; SCAN_BUF_SIZE];
    let mut start: u64 = 0;
    let mut len: usize = 0;

    loop {
        let read = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return (index, Some(e)),
        };

        let mut pos = 0;
        while pos < read {
            match memchr(b'\n', &buf[pos..read]) {
                Some(off) => {
                    len += off;
                    index.push(LineSpan { start, len });
                    start += len as u64 + 1;
                    len = 0;
                    pos += off + 1;
                }
                None => {
                    len += read - pos;
                    break;
                }
            }
        }
    }

    (index, None)
}
