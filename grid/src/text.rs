//! Line-oriented text form of a [`Grid`].
//!
//! ```text
//! <rows> <cols>
//! <row 0 weights, space-separated>
//! ...
//! <startX> <startY>
//! <goalX> <goalY>
//! ```
//!
//! A stored weight of `0` reads back as [`BLOCKED_THRESHOLD`] so that
//! placeholder cells in hand-edited maps are impassable.

use std::{
    io::{self, BufRead, Write},
    str::FromStr,
};

use waypath_core::{
    CellCoord, GridError, Marker, ParseError, ParseErrorKind, BLOCKED_THRESHOLD,
};

use crate::Grid;

impl Grid {
    /// Parses a grid from its text form.
    pub fn read_text<R: BufRead>(reader: R) -> Result<Self, GridError> {
        parse_text(reader, ZeroWeight::Blocked)
    }

    /// Parses a filter or influence layer. The text form is the same but
    /// weights are kept verbatim, so a zero stays an empty cell.
    pub fn read_layer_text<R: BufRead>(reader: R) -> Result<Self, GridError> {
        parse_text(reader, ZeroWeight::Kept)
    }

    /// Writes the text form. Fails when either marker is unset.
    pub fn write_text<W: Write>(&self, mut writer: W) -> Result<(), GridError> {
        let start = self.start.ok_or(GridError::MissingMarker(Marker::Start))?;
        let goal = self.goal.ok_or(GridError::MissingMarker(Marker::Goal))?;

        writeln!(writer, "{} {}", self.rows, self.columns)?;
        for y in 0..self.rows {
            let Some(row) = self.row(y) else {
                continue;
            };
            let mut separator = "";
            for node in row {
                write!(writer, "{separator}{}", node.weight())?;
                separator = " ";
            }
            writeln!(writer)?;
        }
        writeln!(writer, "{} {}", start.x(), start.y())?;
        writeln!(writer, "{} {}", goal.x(), goal.y())?;
        writer.flush()?;
        Ok(())
    }

    /// Renders the text form into a string.
    pub fn to_text(&self) -> Result<String, GridError> {
        let mut buffer = Vec::new();
        self.write_text(&mut buffer)?;
        String::from_utf8(buffer).map_err(|error| {
            GridError::Io(io::Error::new(io::ErrorKind::InvalidData, error))
        })
    }
}

impl FromStr for Grid {
    type Err = GridError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::read_text(text.as_bytes())
    }
}

#[derive(Clone, Copy, Debug)]
enum ZeroWeight {
    Blocked,
    Kept,
}

impl ZeroWeight {
    fn apply(self, weight: u32) -> u32 {
        match (self, weight) {
            (Self::Blocked, 0) => BLOCKED_THRESHOLD,
            _ => weight,
        }
    }
}

fn parse_text<R: BufRead>(reader: R, zero: ZeroWeight) -> Result<Grid, GridError> {
    let mut lines = ContentLines::new(reader);

    let Some((line, header)) = lines.next_content()? else {
        return Err(ParseError::new(1, ParseErrorKind::MissingHeader).into());
    };
    let dimensions = parse_values(line, &header, 2)?;
    let rows = to_usize(dimensions[0]);
    let columns = to_usize(dimensions[1]);
    if rows.checked_mul(columns).is_none() {
        return Err(ParseError::new(line, ParseErrorKind::TooLarge { rows, columns }).into());
    }

    // Rows grow as they are read; the header alone is not trusted for sizing.
    let mut table = Vec::new();
    for found in 0..rows {
        let Some((line, text)) = lines.next_content()? else {
            return Err(ParseError::new(
                lines.end_line(),
                ParseErrorKind::RowCount {
                    expected: rows,
                    found,
                },
            )
            .into());
        };
        let row: Vec<u32> = parse_values(line, &text, columns)?
            .into_iter()
            .map(|weight| zero.apply(weight))
            .collect();
        table.push(row);
    }

    let mut grid = Grid::from_weights(&table)?;
    if rows == 0 {
        grid.clear_with_dimensions(0, columns, 0);
    }

    let start = read_marker(&mut lines, &grid, Marker::Start)?;
    let goal = read_marker(&mut lines, &grid, Marker::Goal)?;
    grid.set_start(start)?;
    grid.set_goal(goal)?;

    if let Some((line, _)) = lines.next_content()? {
        return Err(ParseError::new(line, ParseErrorKind::TrailingData).into());
    }

    log::debug!(
        "parsed {}x{} grid with start {} and goal {}",
        columns,
        rows,
        start,
        goal
    );
    Ok(grid)
}

/// Yields non-blank lines together with their 1-based line numbers.
struct ContentLines<R> {
    lines: io::Lines<R>,
    line: usize,
}

impl<R: BufRead> ContentLines<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }

    fn next_content(&mut self) -> Result<Option<(usize, String)>, ParseError> {
        for next in self.lines.by_ref() {
            self.line += 1;
            let text =
                next.map_err(|error| ParseError::new(self.line, ParseErrorKind::Read(error.to_string())))?;
            if !text.trim().is_empty() {
                return Ok(Some((self.line, text)));
            }
        }
        Ok(None)
    }

    /// Line number reported when the stream ends early.
    fn end_line(&self) -> usize {
        self.line + 1
    }
}

fn read_marker<R: BufRead>(
    lines: &mut ContentLines<R>,
    grid: &Grid,
    marker: Marker,
) -> Result<CellCoord, ParseError> {
    let Some((line, text)) = lines.next_content()? else {
        return Err(ParseError::new(
            lines.end_line(),
            ParseErrorKind::MissingMarker(marker),
        ));
    };
    let values = parse_values(line, &text, 2)?;
    let cell = CellCoord::new(values[0], values[1]);
    if !grid.contains(cell) {
        return Err(ParseError::new(
            line,
            ParseErrorKind::MarkerOutOfBounds { marker, cell },
        ));
    }
    Ok(cell)
}

fn parse_values(line: usize, text: &str, expected: usize) -> Result<Vec<u32>, ParseError> {
    let values = text
        .split_whitespace()
        .map(|token| {
            token
                .parse::<u32>()
                .map_err(|_| ParseError::new(line, ParseErrorKind::InvalidNumber(token.to_owned())))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if values.len() != expected {
        return Err(ParseError::new(
            line,
            ParseErrorKind::ValueCount {
                expected,
                found: values.len(),
            },
        ));
    }
    Ok(values)
}

fn to_usize(value: u32) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}
