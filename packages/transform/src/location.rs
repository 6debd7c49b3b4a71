/// Convert a byte offset to a (line, column) pair
///
/// Lines are 1-based, columns are 0-based character counts. `\r\n`, `\n`,
/// `\r`, U+2028 and U+2029 all end a line.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 0;
    let mut chars = source.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        if pos >= offset {
            break;
        }
        match ch {
            '\r' => {
                if matches!(chars.peek(), Some((next, '\n')) if *next < offset) {
                    chars.next();
                }
                line += 1;
                col = 0;
            }
            '\n' | '\u{2028}' | '\u{2029}' => {
                line += 1;
                col = 0;
            }
            _ => col += 1,
        }
    }

    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_line() {
        assert_eq!(line_col("function {", 9), (1, 9));
    }

    #[test]
    fn test_crlf_counts_once() {
        let source = "a\r\nb\r\nc";
        assert_eq!(line_col(source, 6), (3, 0));
    }

    #[test]
    fn test_multibyte_columns_count_chars() {
        let source = "é = 'x";
        assert_eq!(line_col(source, source.find('\'').unwrap()), (1, 4));
    }
}
