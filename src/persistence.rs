//! Q-table and convergence files.
//!
//! The table is stored densely: a header row, then one row per canonical
//! state id holding the eight action values in canonical order. Values for
//! actions that are illegal in a state are written as `0.0`.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use itertools::Itertools;
use thiserror::Error;

use crate::engine::{Action, GameState};
use crate::qtable::QTable;
use crate::trainer::Checkpoint;

pub const STATE_ID_COLUMN: &str = "STATE_ID";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to access q-table file: {0}")]
    Io(#[from] io::Error),
    #[error("q-table file has no STATE_ID header")]
    MissingHeader,
    #[error("malformed q-table row on line {line}: {reason}")]
    MalformedTableRow { line: usize, reason: String },
    #[error("q-table file holds {found} of {expected} states")]
    MissingRows { found: usize, expected: usize },
}

fn header() -> String {
    std::iter::once(STATE_ID_COLUMN)
        .chain(Action::ALL.iter().map(|action| action.name()))
        .join(",")
}

pub fn write_q_table<W: Write>(q_table: &QTable, mut writer: W) -> Result<(), PersistenceError> {
    writeln!(writer, "{}", header())?;
    for (state_id, row) in q_table.to_dense().iter().enumerate() {
        // `{:?}` keeps a decimal point and round-trips exactly
        writeln!(
            writer,
            "{},{}",
            state_id,
            row.iter().map(|value| format!("{:?}", value)).join(",")
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn malformed(line: usize, reason: impl Into<String>) -> PersistenceError {
    PersistenceError::MalformedTableRow {
        line,
        reason: reason.into(),
    }
}

fn parse_row(line: usize, text: &str) -> Result<(GameState, [f64; Action::COUNT]), PersistenceError> {
    let fields: Vec<&str> = text.split(',').map(str::trim).collect();
    if fields.len() != Action::COUNT + 1 {
        return Err(malformed(
            line,
            format!("expected {} columns, found {}", Action::COUNT + 1, fields.len()),
        ));
    }

    let state_id: usize = fields[0]
        .parse()
        .map_err(|_| malformed(line, format!("state id {:?} is not an integer", fields[0])))?;
    let state = GameState::from_id(state_id)
        .ok_or_else(|| malformed(line, format!("state id {} is out of range", state_id)))?;

    let mut row = [0.0; Action::COUNT];
    for (value, field) in row.iter_mut().zip(&fields[1..]) {
        *value = field
            .parse()
            .map_err(|_| malformed(line, format!("value {:?} is not a number", field)))?;
    }
    Ok((state, row))
}

/// Reads a table written by `write_q_table`. Any bad row aborts the whole load.
pub fn read_q_table<R: BufRead>(reader: R) -> Result<QTable, PersistenceError> {
    let mut lines = reader.lines().enumerate();
    let first = match lines.next() {
        Some((_, first)) => first?,
        None => return Err(PersistenceError::MissingHeader),
    };
    if !first.trim_start().starts_with(STATE_ID_COLUMN) {
        return Err(PersistenceError::MissingHeader);
    }

    let mut q_table = QTable::new();
    let mut seen = HashSet::new();
    for (index, text) in lines {
        let text = text?;
        if text.trim().is_empty() {
            continue;
        }
        let line = index + 1;
        let (state, row) = parse_row(line, &text)?;
        if !seen.insert(state.id()) {
            return Err(malformed(line, format!("state id {} appears twice", state.id())));
        }
        q_table.set_row(&state, row);
    }

    if seen.len() != GameState::COUNT {
        return Err(PersistenceError::MissingRows {
            found: seen.len(),
            expected: GameState::COUNT,
        });
    }
    Ok(q_table)
}

pub fn save(q_table: &QTable, path: &Path) -> Result<(), PersistenceError> {
    write_q_table(q_table, BufWriter::new(File::create(path)?))?;
    log::info!("Q-table data written to {}", path.display());
    Ok(())
}

pub fn load(path: &Path) -> Result<QTable, PersistenceError> {
    let q_table = read_q_table(BufReader::new(File::open(path)?))?;
    log::info!("Q-table loaded from {}", path.display());
    Ok(q_table)
}

/// Writes the convergence series, one row per checkpoint.
pub fn write_convergence<W: Write>(checkpoints: &[Checkpoint], mut writer: W) -> io::Result<()> {
    writeln!(writer, "CHECKPOINT,EPISODE,EPSILON,DISTANCE")?;
    for (i, checkpoint) in checkpoints.iter().enumerate() {
        writeln!(
            writer,
            "{},{},{:.6},{:.6}",
            i, checkpoint.episode, checkpoint.epsilon, checkpoint.distance
        )?;
    }
    writer.flush()
}
