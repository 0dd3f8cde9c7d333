// Scanning one byte range of the input.
//
// A worker maps its range (plus the byte before it and one maximum-length
// line after it) and walks it line by line. A range owns every line that
// starts inside it: a range that begins mid-line skips forward to the next
// line, and the line crossing the end of a range is finished by the range it
// started in.

use std::{fs::File, path::Path};

use memchr::{memchr, memchr2};
use memmap2::{Mmap, MmapOptions};
use tracing::debug;

use crate::{
    error::{Error, FormatErrorKind, Result},
    hash::HashStrategy,
    parse::parse_value,
    partition::ByteRange,
    table::{AggregatorTable, MAX_KEY_LEN},
};

/// `<key>;-99.9\n`
pub const MAX_LINE_LEN: usize = MAX_KEY_LEN + 1 + 5 + 1;

/// One raw record; `offset` is where its line starts in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    pub key: &'a [u8],
    pub value: &'a [u8],
    pub offset: u64,
}

/// Splits mapped bytes into `(key, value)` records without copying.
pub struct ChunkScanner<'a> {
    data: &'a [u8],
    base: u64,
    pos: usize,
    end: usize,
    reaches_eof: bool,
}

impl<'a> ChunkScanner<'a> {
    /// `data` holds the file bytes starting at offset `base`. Lines starting
    /// in `range` are yielded. For a range that does not begin the file,
    /// `data` must include the byte just before `range.start`.
    pub fn new(data: &'a [u8], base: u64, range: ByteRange, reaches_eof: bool) -> Self {
        let pos = if range.start == 0 {
            0
        } else {
            debug_assert!(base < range.start);
            // a line starts at `range.start` only if the byte before it is '\n'
            let before = (range.start - 1 - base) as usize;
            match data.get(before..).and_then(|rest| memchr(b'\n', rest)) {
                Some(i) => before + i + 1,
                None => data.len(),
            }
        };
        let end = (range.end.saturating_sub(base) as usize).min(data.len());

        Self {
            data,
            base,
            pos,
            end,
            reaches_eof,
        }
    }

    /// Scanner over a whole in-memory input.
    pub fn whole(data: &'a [u8]) -> Self {
        Self::new(data, 0, ByteRange::new(0, data.len() as u64), true)
    }

    fn fail(&mut self, offset: u64, kind: FormatErrorKind) -> Option<Result<Record<'a>>> {
        self.pos = self.data.len();
        Some(Err(Error::format(offset, kind)))
    }
}

impl<'a> Iterator for ChunkScanner<'a> {
    type Item = Result<Record<'a>>;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        let data = self.data;
        if self.pos >= self.end || self.pos >= data.len() {
            return None;
        }

        let line_start = self.pos;
        let offset = self.base + line_start as u64;
        let line = &data[line_start..];

        let semicolon_pos = match memchr2(b';', b'\n', line) {
            // an empty key token ends the input for this scanner
            Some(0) => {
                self.pos = data.len();
                return None;
            }
            Some(i) if line[i] == b';' => i,
            found => {
                // the window may end inside a long key before its ';' shows up
                let seen = found.unwrap_or(line.len());
                let kind = if seen > MAX_KEY_LEN {
                    FormatErrorKind::KeyTooLong { len: seen }
                } else {
                    FormatErrorKind::MissingDelimiter
                };
                return self.fail(offset, kind);
            }
        };

        let key = &line[..semicolon_pos];
        if key.len() > MAX_KEY_LEN {
            return self.fail(offset, FormatErrorKind::KeyTooLong { len: key.len() });
        }

        let rest = &line[semicolon_pos + 1..];
        let value = match memchr(b'\n', rest) {
            Some(newline_pos) => {
                self.pos = line_start + semicolon_pos + 1 + newline_pos + 1;
                &rest[..newline_pos]
            }
            None if self.reaches_eof => {
                // last line without a trailing newline
                self.pos = data.len();
                rest
            }
            None => {
                return self.fail(offset, FormatErrorKind::InvalidValue { token: rest.to_vec() });
            }
        };

        Some(Ok(Record { key, value, offset }))
    }
}

/// Parses every record of `scanner` into `table`.
pub fn aggregate<H: HashStrategy>(
    scanner: ChunkScanner<'_>,
    table: &mut AggregatorTable<H>,
) -> Result<usize> {
    let mut records = 0;
    for record in scanner {
        let record = record?;
        let value = parse_value(record.value).ok_or_else(|| {
            Error::format(
                record.offset + record.key.len() as u64 + 1,
                FormatErrorKind::InvalidValue {
                    token: record.value.to_vec(),
                },
            )
        })?;
        table.add(record.key, value)?;
        records += 1;
    }
    return Ok(records);
}

/// Worker body: maps `range` of the file at `path` and aggregates it into a
/// fresh table. The mapping is released when this returns.
pub fn scan_range<H: HashStrategy>(
    path: &Path,
    file_len: u64,
    range: ByteRange,
    hasher: H,
    capacity: usize,
) -> Result<AggregatorTable<H>> {
    let mut table = AggregatorTable::new(hasher, capacity);

    let map_start = range.start.saturating_sub(1);
    let map_end = range.end.saturating_add(MAX_LINE_LEN as u64).min(file_len);
    if range.is_empty() || map_end <= map_start {
        return Ok(table);
    }

    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    // SAFETY: the input is treated as read-only and is not expected to change
    // while the run is in progress.
    let mmap: Mmap = unsafe {
        MmapOptions::new()
            .offset(map_start)
            .len((map_end - map_start) as usize)
            .map(&file)
    }
    .map_err(|e| Error::io(path, e))?;

    let scanner = ChunkScanner::new(&mmap, map_start, range, map_end == file_len);
    let records = aggregate(scanner, &mut table)?;

    debug!(
        start = range.start,
        end = range.end,
        records,
        keys = table.len(),
        "range scanned"
    );
    return Ok(table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::XxHash32;

    fn records(scanner: ChunkScanner<'_>) -> Vec<(String, String, u64)> {
        scanner
            .map(|r| {
                let r = r.unwrap();
                (
                    String::from_utf8(r.key.to_vec()).unwrap(),
                    String::from_utf8(r.value.to_vec()).unwrap(),
                    r.offset,
                )
            })
            .collect()
    }

    #[test]
    fn splits_records() {
        let data = b"Hamburg;12.3\nPalma;30.1\n";
        assert_eq!(
            records(ChunkScanner::whole(data)),
            vec![
                ("Hamburg".to_string(), "12.3".to_string(), 0),
                ("Palma".to_string(), "30.1".to_string(), 13),
            ]
        );
    }

    #[test]
    fn final_line_may_omit_newline() {
        let data = b"a;1.0\nb;-2.5";
        let got = records(ChunkScanner::whole(data));
        assert_eq!(got.len(), 2);
        assert_eq!(got[1], ("b".to_string(), "-2.5".to_string(), 6));
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert_eq!(ChunkScanner::whole(b"").count(), 0);
    }

    #[test]
    fn boundary_line_belongs_to_earlier_range() {
        let data = b"aaa;1.0\nbbb;2.0\nccc;3.0\n";
        // splits inside "bbb;2.0\n"
        let first = records(ChunkScanner::new(data, 0, ByteRange::new(0, 10), true));
        let second = records(ChunkScanner::new(data, 0, ByteRange::new(10, 24), true));

        let keys = |rs: &[(String, String, u64)]| rs.iter().map(|r| r.0.clone()).collect::<Vec<_>>();
        assert_eq!(keys(&first), ["aaa", "bbb"]);
        assert_eq!(keys(&second), ["ccc"]);
    }

    #[test]
    fn range_starting_on_line_start_keeps_that_line() {
        let data = b"aaa;1.0\nbbb;2.0\n";
        let first = records(ChunkScanner::new(data, 0, ByteRange::new(0, 8), true));
        let second = records(ChunkScanner::new(data, 0, ByteRange::new(8, 16), true));
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].0, "bbb");
    }

    #[test]
    fn offsets_are_relative_to_base() {
        // data is a window of the file starting at offset 100
        let data = b"x;1.0\ny;2.0\n";
        let got = records(ChunkScanner::new(data, 100, ByteRange::new(101, 112), true));
        assert_eq!(got, vec![("y".to_string(), "2.0".to_string(), 106)]);
    }

    #[test]
    fn overlong_key_is_rejected() {
        let mut data = vec![b'k'; MAX_KEY_LEN + 1];
        data.extend_from_slice(b";1.0\n");
        let err = ChunkScanner::whole(&data).next().unwrap().unwrap_err();
        match err {
            Error::Format { offset, kind: FormatErrorKind::KeyTooLong { len } } => {
                assert_eq!(offset, 0);
                assert_eq!(len, MAX_KEY_LEN + 1);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn max_length_key_is_accepted() {
        let mut data = vec![b'k'; MAX_KEY_LEN];
        data.extend_from_slice(b";1.0\n");
        assert_eq!(records(ChunkScanner::whole(&data)).len(), 1);
    }

    #[test]
    fn malformed_lines_are_rejected() {
        let missing = ChunkScanner::whole(b"a;1.0\nnodelimiter\n").nth(1).unwrap();
        assert!(matches!(
            missing,
            Err(Error::Format { offset: 6, kind: FormatErrorKind::MissingDelimiter })
        ));
    }

    #[test]
    fn empty_key_token_ends_the_scan() {
        let blank_line = records(ChunkScanner::whole(b"a;1.0\nb;3.0\n\n"));
        assert_eq!(blank_line.len(), 2);

        let mut scanner = ChunkScanner::whole(b"a;1.0\n;2.0\nb;3.0\n");
        assert_eq!(scanner.next().unwrap().unwrap().key, b"a");
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn long_key_cut_off_by_the_window_is_too_long() {
        // the ';' of this key lies past the end of the mapped window
        let data = vec![b'k'; MAX_KEY_LEN + 30];
        let err = ChunkScanner::new(&data, 0, ByteRange::new(0, 10), false)
            .next()
            .unwrap()
            .unwrap_err();
        match err {
            Error::Format { offset, kind: FormatErrorKind::KeyTooLong { len } } => {
                assert_eq!(offset, 0);
                assert_eq!(len, MAX_KEY_LEN + 30);
            }
            other => panic!("unexpected error {other:?}"),
        }

        // short lines without ';' still lack a delimiter
        let short = ChunkScanner::new(b"kkk", 0, ByteRange::new(0, 3), false).next().unwrap();
        assert!(matches!(
            short,
            Err(Error::Format { kind: FormatErrorKind::MissingDelimiter, .. })
        ));
    }

    #[test]
    fn scanning_stops_after_an_error() {
        let mut scanner = ChunkScanner::whole(b"bad\na;1.0\n");
        assert!(scanner.next().unwrap().is_err());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn unterminated_line_inside_file_is_rejected() {
        // the mapping ends before the value does, and more file follows
        let data = b"a;12.34567";
        let err = ChunkScanner::new(data, 0, ByteRange::new(0, 4), false)
            .next()
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, Error::Format { kind: FormatErrorKind::InvalidValue { .. }, .. }));
    }

    #[test]
    fn aggregate_parses_values() {
        let mut table = AggregatorTable::new(XxHash32::new(0), 8);
        let n = aggregate(
            ChunkScanner::whole(b"Hamburg;12.3\nHamburg;8.7\nPalma;30.1\n"),
            &mut table,
        )
        .unwrap();
        assert_eq!(n, 3);
        assert_eq!(table.get(b"Hamburg").unwrap().count, 2);
    }

    #[test]
    fn aggregate_reports_bad_value_offset() {
        let mut table = AggregatorTable::new(XxHash32::new(0), 8);
        let err = aggregate(ChunkScanner::whole(b"a;1.0\nbb;x.y\n"), &mut table).unwrap_err();
        match err {
            Error::Format { offset, kind: FormatErrorKind::InvalidValue { token } } => {
                assert_eq!(offset, 9);
                assert_eq!(token, b"x.y");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
