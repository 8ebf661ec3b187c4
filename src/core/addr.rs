use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref LETTERS_DIGITS: Regex = Regex::new(r"^([A-Z]+)(\d+)$").unwrap();
}

/// A (row, column) cell position, both 1-based.
///
/// Accepts spreadsheet notation (`B5`, column letters in base-26 with A=1)
/// or an explicit `row,column` pair (`5,2`). Input is uppercased first, so
/// `b5` parses the same as `B5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellAddr {
    pub row: u32,
    pub col: u32,
}

impl FromStr for CellAddr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_ascii_uppercase();

        if let Some((row_part, col_part)) = input.split_once(',') {
            let row = row_part
                .trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid row in '{input}'"))?;
            let col = col_part
                .trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid column in '{input}'"))?;
            return Ok(Self { row, col });
        }

        let caps = LETTERS_DIGITS
            .captures(&input)
            .ok_or_else(|| format!("'{input}' is not a cell address"))?;
        let letters = &caps[1];
        let row = caps[2]
            .parse::<u32>()
            .map_err(|_| format!("invalid row in '{input}'"))?;
        let col = letters
            .bytes()
            .fold(0u32, |acc, b| acc * 26 + u32::from(b - b'A') + 1);
        Ok(Self { row, col })
    }
}

impl fmt::Display for CellAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row)
    }
}

/// Spreadsheet letters for a 1-based column number (1 -> A, 27 -> AA).
pub fn column_letters(col: u32) -> String {
    let mut col = col;
    let mut letters = Vec::new();
    while col > 0 {
        col -= 1;
        letters.push(b'A' + (col % 26) as u8);
        col /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}
