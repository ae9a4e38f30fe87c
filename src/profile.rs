
//! Finalized MinHash profiles and their binary representation.
//!
//! A profile file holds the number of slots followed by the k-mer of each slot, in slot
//! order. All fields are little-endian `u64` values. There is no header or checksum.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use tempfile::NamedTempFile;

use crate::hashing::Kmer;

const FIELD_BYTES: usize = std::mem::size_of::<u64>();

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    kmers: Vec<Kmer>,
}

impl Profile {
    pub fn new(kmers: Vec<Kmer>) -> Self {
        Profile { kmers }
    }

    /// K-mer held by each slot.
    pub fn kmers(&self) -> &[Kmer] {
        &self.kmers
    }

    pub fn len(&self) -> usize {
        self.kmers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kmers.is_empty()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&(self.kmers.len() as u64).to_le_bytes())?;
        for kmer in &self.kmers {
            writer.write_all(&kmer.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        if bytes.len() < FIELD_BYTES || bytes.len() % FIELD_BYTES != 0 {
            bail!("Profile has invalid size of {} bytes", bytes.len());
        }

        let mut fields = bytes.chunks_exact(FIELD_BYTES).map(|b| {
            let mut field = [0u8; FIELD_BYTES];
            field.copy_from_slice(b);
            u64::from_le_bytes(field)
        });

        let count = fields.next().unwrap_or(0);
        let kmers: Vec<Kmer> = fields.collect();
        if kmers.len() as u64 != count {
            bail!(
                "Profile declares {} k-mers, but contains {}",
                count,
                kmers.len()
            );
        }

        Ok(Profile { kmers })
    }

    /// Write the profile to `path`.
    ///
    /// Data is written to a temporary file next to `path` which is only renamed into
    /// place once complete, so a failed write never leaves a partial profile behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let tmp_file = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

        let mut writer = BufWriter::new(tmp_file);
        self.write_to(&mut writer)
            .with_context(|| format!("Failed to write profile {}", path.display()))?;
        let tmp_file = writer
            .into_inner()
            .map_err(|e| e.into_error())
            .with_context(|| format!("Failed to write profile {}", path.display()))?;

        tmp_file
            .persist(path)
            .with_context(|| format!("Failed to save profile {}", path.display()))?;

        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let mut reader = BufReader::new(file);

        Profile::read_from(&mut reader)
            .with_context(|| format!("Failed to read profile {}", path.display()))
    }
}
