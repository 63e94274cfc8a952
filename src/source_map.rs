//! Byte-offset ↔ line/column conversion shared by diagnostics, the
//! expression-offset index, and the LSP's `Position` <-> byte-offset bridge
//! (the LSP protocol counts columns in UTF-16 code units).

use crate::compiler_messages::CharPosition;

/// Precomputed byte offsets of each line start in a source string, so offset
/// <-> position conversion is a binary search rather than a linear rescan.
#[derive(Debug, Clone)]
pub struct SourceMap {
    line_starts: Vec<usize>,
    len: usize,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0usize];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }
        SourceMap {
            line_starts,
            len: source.len(),
        }
    }

    /// Converts a byte offset to a zero-based `(line, column)` pair, with
    /// `column` counted in UTF-16 code units as the LSP protocol requires.
    pub fn position_at(&self, source: &str, byte_offset: usize) -> CharPosition {
        let byte_offset = byte_offset.min(self.len);
        let line = match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line_start = self.line_starts[line];
        let column = source[line_start..byte_offset].encode_utf16().count() as u32;
        CharPosition {
            line: line as u32,
            column,
        }
    }

    /// Converts a zero-based `(line, column)` pair (UTF-16 columns) back to a
    /// byte offset into `source`.
    pub fn offset_at(&self, source: &str, position: CharPosition) -> usize {
        let Some(&line_start) = self.line_starts.get(position.line as usize) else {
            return self.len;
        };
        let line_end = self
            .line_starts
            .get(position.line as usize + 1)
            .copied()
            .unwrap_or(self.len);
        let line_text = &source[line_start..line_end];

        let mut units_seen = 0u32;
        for (byte_idx, ch) in line_text.char_indices() {
            if units_seen >= position.column {
                return line_start + byte_idx;
            }
            units_seen += ch.len_utf16() as u32;
        }
        line_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_at_first_line() {
        let src = "abc\ndef";
        let map = SourceMap::new(src);
        assert_eq!(map.position_at(src, 1), CharPosition { line: 0, column: 1 });
        assert_eq!(map.position_at(src, 5), CharPosition { line: 1, column: 1 });
    }

    #[test]
    fn offset_at_round_trips_with_position_at() {
        let src = "let x = 1\nlet y = 2\n";
        let map = SourceMap::new(src);
        for offset in [0, 4, 9, 10, 15, 20] {
            let pos = map.position_at(src, offset);
            let back = map.offset_at(src, pos);
            assert_eq!(back, offset, "offset {offset} round-trip via {pos:?}");
        }
    }
}
