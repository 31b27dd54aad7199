//! Read-back of generated edge lists.
//!
//! Both on-disk formats can be loaded again, undoing the 1-based shift, so a
//! written graph round-trips to the exact edge multiset that was generated.
//! The text reader scans page-aligned chunks of the mapped file on scoped
//! threads; chunk results are stitched back together in file order.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use atoi::FromRadix10;
use byte_slice_cast::AsSliceOf;
use log::info;
use parking_lot::Mutex;

use crate::{Edge, Error};

/// Optional `n m` header of an edge list file.
pub type Header = Option<(u64, u64)>;

/// Reads a text edge list written by [`crate::output`]. Returns the header,
/// if present, and the edges shifted back to 0-based ids.
pub fn read_edge_list<P: AsRef<Path>>(path: P) -> Result<(Header, Vec<Edge>), Error> {
    let file = File::open(path.as_ref())?;
    let mmap = unsafe { memmap2::MmapOptions::new().populate().map(&file)? };
    parse_edge_list(mmap.as_ref())
}

fn parse_edge_list(bytes: &[u8]) -> Result<(Header, Vec<Edge>), Error> {
    let start = Instant::now();

    let (header, mut body) = match bytes.strip_prefix(b"p ") {
        Some(rest) => {
            let (n, used) = u64::from_radix_10(rest);
            let rest = expect_byte(&rest[used..], b' ')?;
            let (m, used) = u64::from_radix_10(rest);
            let rest = expect_byte(&rest[used..], b'\n')?;
            (Some((n, m)), rest)
        }
        None => (None, bytes),
    };
    // Trailing newline discipline: the writer always ends lines, so an empty
    // body is just an empty slice.
    if body.last() == Some(&b'\n') {
        body = &body[..body.len() - 1];
    }
    if body.is_empty() {
        return Ok((header, Vec::new()));
    }

    let page_size = page_size::get();
    let cpu_count = num_cpus::get_physical();
    let chunk_size = (usize::max(1, body.len() / cpu_count) + (page_size - 1)) & !(page_size - 1);

    let results = Arc::new(Mutex::new(Vec::new()));

    std::thread::scope(|s| {
        for chunk_start in (0..body.len()).step_by(chunk_size) {
            let results = Arc::clone(&results);
            s.spawn(move || {
                // Align both ends to line starts; the first chunk owns the
                // first line.
                let mut begin = chunk_start;
                if begin != 0 {
                    while begin < body.len() && body[begin - 1] != b'\n' {
                        begin += 1;
                    }
                }
                let mut end = usize::min(chunk_start + chunk_size, body.len());
                while end < body.len() && body[end - 1] != b'\n' {
                    end += 1;
                }

                let parsed = parse_lines(&body[begin..end]);
                results.lock().push((chunk_start, parsed));
            });
        }
    });

    let mut parts = Arc::try_unwrap(results)
        .expect("all reader threads have joined")
        .into_inner();
    parts.sort_unstable_by_key(|(start, _)| *start);

    let mut edges = Vec::new();
    for (_, part) in parts {
        edges.append(&mut part?);
    }

    let elapsed = start.elapsed().as_millis() as f64 / 1000.0;
    info!(
        "read {} edges in {:.2}s ({:.2} MB/s)",
        edges.len(),
        elapsed,
        (bytes.len() as f64 / elapsed.max(1e-9)) / (1024.0 * 1024.0)
    );

    Ok((header, edges))
}

fn parse_lines(mut chunk: &[u8]) -> Result<Vec<Edge>, Error> {
    let mut edges = Vec::new();
    while !chunk.is_empty() {
        chunk = expect_byte(chunk, b'e')?;
        chunk = expect_byte(chunk, b' ')?;
        let (source, used) = u64::from_radix_10(chunk);
        chunk = expect_byte(&chunk[used..], b' ')?;
        let (target, used) = u64::from_radix_10(chunk);
        chunk = &chunk[used..];
        if !chunk.is_empty() {
            chunk = expect_byte(chunk, b'\n')?;
        }
        if source == 0 || target == 0 {
            return Err(Error::InvalidFormat("edge ids on disk are 1-based".into()));
        }
        edges.push((source - 1, target - 1));
    }
    Ok(edges)
}

fn expect_byte(bytes: &[u8], expected: u8) -> Result<&[u8], Error> {
    match bytes.first() {
        Some(&b) if b == expected => Ok(&bytes[1..]),
        _ => Err(Error::InvalidFormat(format!(
            "expected {:?} in edge list",
            expected as char
        ))),
    }
}

/// Reads a binary edge list. `has_header` must match how the file was
/// written; the format itself cannot tell.
pub fn read_binary_edge_list<P: AsRef<Path>>(
    path: P,
    has_header: bool,
) -> Result<(Header, Vec<Edge>), Error> {
    let file = File::open(path.as_ref())?;
    let mmap = unsafe { memmap2::MmapOptions::new().populate().map(&file)? };
    // The mapping is page-aligned, so the cast only rejects lengths that are
    // not a multiple of eight bytes.
    let words = mmap
        .as_slice_of::<u64>()
        .map_err(|e| Error::InvalidFormat(e.to_string()))?;
    decode_words(words, has_header)
}

fn decode_words(words: &[u64], has_header: bool) -> Result<(Header, Vec<Edge>), Error> {
    let (header, body) = if has_header {
        if words.len() < 2 {
            return Err(Error::InvalidFormat("missing binary header".into()));
        }
        let n = u64::from_le(words[0]);
        let m = u64::from_le(words[1]);
        (Some((n, m)), &words[2..])
    } else {
        (None, words)
    };

    if body.len() % 2 != 0 {
        return Err(Error::InvalidFormat("odd number of ids in edge list".into()));
    }

    let mut edges = Vec::with_capacity(body.len() / 2);
    for pair in body.chunks_exact(2) {
        let source = u64::from_le(pair[0]);
        let target = u64::from_le(pair[1]);
        if source == 0 || target == 0 {
            return Err(Error::InvalidFormat("edge ids on disk are 1-based".into()));
        }
        edges.push((source - 1, target - 1));
    }
    Ok((header, edges))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_with_header() {
        let (header, edges) = parse_edge_list(b"p 4 2\ne 1 2\ne 3 4\n").unwrap();
        assert_eq!(header, Some((4, 2)));
        assert_eq!(edges, vec![(0, 1), (2, 3)]);
    }

    #[test]
    fn parses_text_without_header() {
        let (header, edges) = parse_edge_list(b"e 10 20\n").unwrap();
        assert_eq!(header, None);
        assert_eq!(edges, vec![(9, 19)]);
    }

    #[test]
    fn parses_empty_body() {
        let (header, edges) = parse_edge_list(b"p 4 0\n").unwrap();
        assert_eq!(header, Some((4, 0)));
        assert!(edges.is_empty());
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_edge_list(b"x 1 2\n").is_err());
        assert!(parse_edge_list(b"e 0 2\n").is_err(), "0 is not a 1-based id");
    }

    #[test]
    fn parses_many_lines_across_chunks() {
        let mut text = String::new();
        let mut expected = Vec::new();
        for i in 0..10_000u64 {
            text.push_str(&format!("e {} {}\n", i + 1, i + 2));
            expected.push((i, i + 1));
        }
        let (_, edges) = parse_edge_list(text.as_bytes()).unwrap();
        assert_eq!(edges, expected);
    }

    fn write_binary(words: &[u64]) -> tempfile::NamedTempFile {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for word in words {
            file.write_all(&word.to_le_bytes()).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_binary_with_header() {
        let file = write_binary(&[4, 1, 1, 2]);
        let (header, edges) = read_binary_edge_list(file.path(), true).unwrap();
        assert_eq!(header, Some((4, 1)));
        assert_eq!(edges, vec![(0, 1)]);
    }

    #[test]
    fn reads_binary_without_header() {
        let file = write_binary(&[5, 7, 2, 9]);
        let (header, edges) = read_binary_edge_list(file.path(), false).unwrap();
        assert_eq!(header, None);
        assert_eq!(edges, vec![(4, 6), (1, 8)]);
    }

    #[test]
    fn rejects_odd_binary_id_count() {
        let file = write_binary(&[4, 1, 1]);
        assert!(read_binary_edge_list(file.path(), true).is_err());
    }
}
