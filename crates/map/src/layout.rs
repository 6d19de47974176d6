//! Text layout parser.
//!
//! A layout is one grid row per line. Codes are separated by commas, by
//! whitespace, or written back to back as single digits (`0110`). Blank lines
//! are skipped and one trailing comma per row is tolerated.

use crate::field::{MapChipType, MapError};

/// Parse a layout into rows of tile types. All rows must have the same length.
pub fn parse_layout(text: &str) -> Result<Vec<Vec<MapChipType>>, MapError> {
    let mut rows: Vec<Vec<MapChipType>> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let row = parse_row(line, line_no)?;
        if let Some(first) = rows.first() {
            if row.len() != first.len() {
                return Err(MapError::Format {
                    line: line_no,
                    reason: format!("expected {} columns, found {}", first.len(), row.len()),
                });
            }
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(MapError::Empty);
    }
    Ok(rows)
}

fn parse_row(line: &str, line_no: usize) -> Result<Vec<MapChipType>, MapError> {
    let tokens: Vec<&str> = if line.contains(',') {
        let mut tokens: Vec<&str> = line.split(',').map(str::trim).collect();
        if tokens.last().is_some_and(|t| t.is_empty()) {
            tokens.pop();
        }
        tokens
    } else if line.contains(char::is_whitespace) {
        line.split_whitespace().collect()
    } else {
        line.char_indices()
            .map(|(i, c)| &line[i..i + c.len_utf8()])
            .collect()
    };

    tokens
        .into_iter()
        .enumerate()
        .map(|(col, token)| parse_code(token, line_no, col + 1))
        .collect()
}

fn parse_code(token: &str, line: usize, column: usize) -> Result<MapChipType, MapError> {
    if token.is_empty() {
        return Err(MapError::Format {
            line,
            reason: format!("empty cell at column {column}"),
        });
    }
    let code: i64 = token.parse().map_err(|_| MapError::Format {
        line,
        reason: format!("'{token}' at column {column} is not an integer"),
    })?;
    u8::try_from(code)
        .ok()
        .and_then(MapChipType::from_code)
        .ok_or(MapError::UnknownCode { line, column, code })
}

#[cfg(test)]
mod tests {
    use super::*;
    use MapChipType::{Blank, Block, Block2};

    #[test]
    fn comma_separated_rows() {
        let rows = parse_layout("1,1,0\n0,2,1\n").unwrap();
        assert_eq!(rows, vec![vec![Block, Block, Blank], vec![Blank, Block2, Block]]);
    }

    #[test]
    fn trailing_comma_and_blank_lines_are_tolerated() {
        let rows = parse_layout("\n1,0,\n\n0,1,\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![Block, Blank]);
    }

    #[test]
    fn whitespace_and_fixed_width_rows() {
        assert_eq!(parse_layout("1 0  2").unwrap()[0], vec![Block, Blank, Block2]);
        assert_eq!(parse_layout("0120").unwrap()[0], vec![Blank, Block, Block2, Blank]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = parse_layout("1,1,1\n1,1\n").unwrap_err();
        assert!(matches!(err, MapError::Format { line: 2, .. }));
    }

    #[test]
    fn unknown_code_reports_position() {
        let err = parse_layout("0,0\n0,7\n").unwrap_err();
        assert!(matches!(
            err,
            MapError::UnknownCode {
                line: 2,
                column: 2,
                code: 7
            }
        ));
    }

    #[test]
    fn non_numeric_cell_is_a_format_error() {
        let err = parse_layout("0,x\n").unwrap_err();
        assert!(matches!(err, MapError::Format { line: 1, .. }));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(parse_layout("\n \n"), Err(MapError::Empty)));
    }
}
