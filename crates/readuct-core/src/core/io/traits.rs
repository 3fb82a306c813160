use crate::core::models::structure::AtomCollection;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing structure file formats.
pub trait StructureFile {
    /// The type of metadata carried alongside the structure (e.g. a comment line).
    type Metadata;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads one structure from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the reader fails.
    fn read_from(reader: &mut impl BufRead)
    -> Result<(AtomCollection, Self::Metadata), Self::Error>;

    /// Writes one structure and its metadata to a writer.
    ///
    /// Writing several structures to the same writer produces a multi-frame file.
    fn write_to(
        structure: &AtomCollection,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    fn read_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<(AtomCollection, Self::Metadata), Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    fn write_to_path<P: AsRef<Path>>(
        structure: &AtomCollection,
        metadata: &Self::Metadata,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(structure, metadata, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
