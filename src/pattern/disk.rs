//! On-disk format for pattern databases.
//!
//! Layout: 8-byte magic, u16 LE version, piece-set kind byte, subset length
//! byte, subset bytes, u64 LE state count, max-depth byte, then the nibble
//! array. Every header field is validated on load against the piece set the
//! caller expects.

use super::{PatternDb, PieceSet};
use crate::prelude::*;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 8] = b"CUBEPDB\0";
const VERSION: u16 = 1;

const KIND_CORNERS: u8 = 0;
const KIND_EDGES: u8 = 1;

pub(super) fn save(db: &PatternDb, path: &Path) -> Result<(), SolveError> {
    let mut writer = BufWriter::new(File::create(path)?);

    writer.write_all(MAGIC)?;
    writer.write_all(&VERSION.to_le_bytes())?;
    match db.piece_set() {
        PieceSet::Corners => {
            writer.write_all(&[KIND_CORNERS, 0])?;
        }
        PieceSet::Edges(pieces) => {
            writer.write_all(&[KIND_EDGES, pieces.len() as u8])?;
            writer.write_all(pieces)?;
        }
    }
    writer.write_all(&(db.states() as u64).to_le_bytes())?;
    writer.write_all(&[db.max_depth()])?;
    writer.write_all(db.raw_data())?;
    writer.flush()?;
    Ok(())
}

pub(super) fn load(path: &Path, expected: &PieceSet) -> Result<PatternDb, SolveError> {
    let mut reader = BufReader::new(File::open(path)?);

    let mut magic = [0u8; 8];
    read_field(&mut reader, &mut magic)?;
    if &magic != MAGIC {
        return Err(SolveError::PersistenceFormat(format!(
            "{} is not a pattern database file",
            path.display()
        )));
    }

    let mut version = [0u8; 2];
    read_field(&mut reader, &mut version)?;
    let version = u16::from_le_bytes(version);
    if version != VERSION {
        return Err(SolveError::PersistenceFormat(format!(
            "unsupported version {} (expected {})",
            version, VERSION
        )));
    }

    let mut kind = [0u8; 2];
    read_field(&mut reader, &mut kind)?;
    let piece_set = match kind[0] {
        KIND_CORNERS => PieceSet::Corners,
        KIND_EDGES => {
            let mut pieces = vec![0u8; kind[1] as usize];
            read_field(&mut reader, &mut pieces)?;
            PieceSet::edges(pieces)
                .map_err(|e| SolveError::PersistenceFormat(e.to_string()))?
        }
        other => {
            return Err(SolveError::PersistenceFormat(format!(
                "unknown piece-set kind {}",
                other
            )))
        }
    };
    if piece_set != *expected {
        return Err(SolveError::PersistenceFormat(format!(
            "file holds {:?}, expected {:?}",
            piece_set, expected
        )));
    }

    let mut states = [0u8; 8];
    read_field(&mut reader, &mut states)?;
    let states = u64::from_le_bytes(states) as usize;
    if states != piece_set.states() {
        return Err(SolveError::PersistenceFormat(format!(
            "state count {} does not match {:?}",
            states, piece_set
        )));
    }

    let mut max_depth = [0u8; 1];
    read_field(&mut reader, &mut max_depth)?;
    if max_depth[0] >= 0xF {
        return Err(SolveError::PersistenceFormat(format!(
            "max depth {} does not fit in a nibble",
            max_depth[0]
        )));
    }

    let mut data = vec![0u8; (states + 1) / 2];
    read_field(&mut reader, &mut data)?;
    let mut trailing = [0u8; 1];
    if reader.read(&mut trailing)? != 0 {
        return Err(SolveError::PersistenceFormat(format!(
            "{} has trailing bytes",
            path.display()
        )));
    }

    Ok(PatternDb::from_parts(piece_set, max_depth[0], data))
}

fn read_field(reader: &mut impl Read, buf: &mut [u8]) -> Result<(), SolveError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => {
            SolveError::PersistenceFormat("truncated pattern database file".to_string())
        }
        _ => SolveError::Io(e),
    })
}
