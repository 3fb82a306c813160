use super::traits::StructureFile;
use crate::core::models::atom::Atom;
use crate::core::models::structure::AtomCollection;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// The plain XYZ format: an atom count line, a free comment line and one
/// `Element x y z` line per atom (Angstroms).
pub struct XyzFile;

impl StructureFile for XyzFile {
    type Metadata = String;
    type Error = XyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<(AtomCollection, String), XyzError> {
        let mut lines = reader.lines().enumerate();

        let count_line = loop {
            match lines.next() {
                Some((_, line)) => {
                    let line = line?;
                    if !line.trim().is_empty() {
                        break line;
                    }
                }
                None => {
                    return Err(XyzError::Parse {
                        line: 1,
                        message: "file is empty".to_string(),
                    });
                }
            }
        };

        let atom_count: usize = count_line.trim().parse().map_err(|_| XyzError::Parse {
            line: 1,
            message: format!("invalid atom count '{}'", count_line.trim()),
        })?;

        let comment = match lines.next() {
            Some((_, line)) => line?.trim().to_string(),
            None => String::new(),
        };

        let mut structure = AtomCollection::new();
        for _ in 0..atom_count {
            let (index, line) = lines.next().ok_or_else(|| XyzError::Parse {
                line: structure.len() + 3,
                message: format!(
                    "expected {} atoms but found only {}",
                    atom_count,
                    structure.len()
                ),
            })?;
            let line = line?;
            structure.push(parse_atom_line(&line, index + 1)?);
        }

        Ok((structure, comment))
    }

    fn write_to(
        structure: &AtomCollection,
        metadata: &String,
        writer: &mut impl Write,
    ) -> Result<(), XyzError> {
        writeln!(writer, "{}", structure.len())?;
        writeln!(writer, "{}", metadata.replace('\n', " "))?;
        for atom in structure.atoms() {
            writeln!(
                writer,
                "{:<3}{:>16.10}{:>16.10}{:>16.10}",
                atom.element, atom.position.x, atom.position.y, atom.position.z
            )?;
        }
        Ok(())
    }
}

fn parse_atom_line(line: &str, line_number: usize) -> Result<Atom, XyzError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(XyzError::Parse {
            line: line_number,
            message: "atom line requires an element and three coordinates".to_string(),
        });
    }

    let coordinate = |field: &str| -> Result<f64, XyzError> {
        field
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| XyzError::Parse {
                line: line_number,
                message: format!("invalid coordinate '{}'", field),
            })
    };

    let position = Point3::new(
        coordinate(fields[1])?,
        coordinate(fields[2])?,
        coordinate(fields[3])?,
    );
    Ok(Atom::new(fields[0], position))
}
