//! LSP `Position` (0-indexed line/UTF-16-code-unit) <-> byte offset
//! conversion. Nova source is treated as ASCII-dominant (matching the
//! tolerant parser's own byte-oriented spans), so `character` is read as a
//! byte count within the line rather than decoding UTF-16; non-ASCII
//! identifiers inside a line are out of scope for this conversion.

pub fn offset_to_position(content: &str, offset: usize) -> (u32, u32) {
    let mut line = 0u32;
    let mut line_start = 0usize;
    for (i, b) in content.bytes().enumerate() {
        if i >= offset {
            break;
        }
        if b == b'\n' {
            line += 1;
            line_start = i + 1;
        }
    }
    let character = offset.saturating_sub(line_start) as u32;
    (line, character)
}

pub fn position_to_offset(content: &str, line: u32, character: u32) -> usize {
    let mut current_line = 0u32;
    let mut offset = 0usize;
    for l in content.split_inclusive('\n') {
        if current_line == line {
            let line_len = l.trim_end_matches('\n').len();
            return offset + (character as usize).min(line_len);
        }
        offset += l.len();
        current_line += 1;
    }
    offset
}

/// Applies one incremental `textDocument/didChange` edit (a byte range
/// replacement expressed as line/character positions) to `content`.
pub fn apply_range_edit(content: &str, start_line: u32, start_char: u32, end_line: u32, end_char: u32, new_text: &str) -> String {
    let start = position_to_offset(content, start_line, start_char);
    let end = position_to_offset(content, end_line, end_char);
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    let mut out = String::with_capacity(content.len() - (end - start) + new_text.len());
    out.push_str(&content[..start.min(content.len())]);
    out.push_str(new_text);
    out.push_str(&content[end.min(content.len())..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_position_round_trip() {
        let src = "val x = 1\nval y = 2\n";
        let (line, ch) = offset_to_position(src, 15);
        assert_eq!((line, ch), (1, 4));
        assert_eq!(position_to_offset(src, line, ch), 15);
    }

    #[test]
    fn range_edit_replaces_in_place() {
        let src = "val x = 1\nval y = 2\n";
        let replaced = apply_range_edit(src, 1, 4, 1, 5, "z");
        assert_eq!(replaced, "val x = 1\nval z = 2\n");
    }
}
