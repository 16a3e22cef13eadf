//! Memory-mapped `.dmap` container reader and writer.
//!
//! The container is little-endian and has up to five contiguous sections:
//!
//! 1. **Header** (64 bytes): magic, version, entry/bin/sample counts, flags
//! 2. **Pixel table** (`n_entries × 16` bytes): `u64` nested index, `u32` nside, `u32` reserved
//! 3. **Distance moduli** (`n_bins × 8` bytes): present when [`FLAG_DISTMODS`] is set
//! 4. **Best fit** (`n_entries × n_bins × 8` bytes)
//! 5. **Samples** (`n_entries × n_samples × n_bins × 8` bytes)
//!
//! The file must be exactly as long as the header implies.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use dust_core::{DustError, DustResult};
use memmap2::Mmap;

use super::{DatasetOptions, HealpixDataset};
use crate::pixel::{PixelCatalog, PixelInfo};

const CONTAINER_MAGIC: &[u8; 4] = b"DMAP";
const CONTAINER_VERSION: u32 = 1;
const HEADER_SIZE: usize = 64;
const PIXEL_ENTRY_SIZE: usize = 16;
const F64_SIZE: usize = 8;

/// Distance moduli are stored after the pixel table.
pub const FLAG_DISTMODS: u32 = 1 << 0;

/// Metadata parsed from the first 64 bytes of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: u32,
    pub n_entries: u64,
    pub n_bins: u32,
    pub n_samples: u32,
    pub flags: u32,
}

impl ContainerHeader {
    pub fn has_distmods(&self) -> bool {
        self.flags & FLAG_DISTMODS != 0
    }

    fn section_sizes(&self) -> DustResult<Sections> {
        let overflow = || DustError::malformed("container dimensions overflow");
        let n_entries = usize::try_from(self.n_entries).map_err(|_| overflow())?;
        let n_bins = self.n_bins as usize;
        let n_samples = self.n_samples as usize;

        let pixel_table = n_entries.checked_mul(PIXEL_ENTRY_SIZE).ok_or_else(overflow)?;
        let distmods = if self.has_distmods() { n_bins * F64_SIZE } else { 0 };
        let best_fit = n_entries
            .checked_mul(n_bins)
            .and_then(|v| v.checked_mul(F64_SIZE))
            .ok_or_else(overflow)?;
        let samples = best_fit.checked_mul(n_samples).ok_or_else(overflow)?;
        let total = [pixel_table, distmods, best_fit, samples]
            .iter()
            .try_fold(HEADER_SIZE, |acc, &s| acc.checked_add(s))
            .ok_or_else(overflow)?;

        Ok(Sections {
            pixel_table,
            distmods,
            best_fit,
            samples,
            total,
        })
    }
}

impl fmt::Display for ContainerHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Container version: {}", self.version)?;
        writeln!(f, "Entries: {}", self.n_entries)?;
        writeln!(f, "Distance bins: {}", self.n_bins)?;
        writeln!(f, "Samples: {}", self.n_samples)?;
        write!(
            f,
            "Distance moduli stored: {}",
            if self.has_distmods() { "yes" } else { "no" }
        )
    }
}

struct Sections {
    pixel_table: usize,
    distmods: usize,
    best_fit: usize,
    samples: usize,
    total: usize,
}

fn map_file(path: &Path) -> DustResult<Mmap> {
    let file = File::open(path).map_err(|e| {
        DustError::data_error("dataset", "open", &format!("{}: {}", path.display(), e))
    })?;
    unsafe { Mmap::map(&file) }.map_err(|e| {
        DustError::data_error("dataset", "mmap", &format!("{}: {}", path.display(), e))
    })
}

/// Reads only the header of the container at `path`.
pub fn read_header(path: impl AsRef<Path>) -> DustResult<ContainerHeader> {
    let mmap = map_file(path.as_ref())?;
    parse_header(&mmap)
}

fn parse_header(bytes: &[u8]) -> DustResult<ContainerHeader> {
    if bytes.len() < HEADER_SIZE {
        return Err(DustError::malformed(format!(
            "container too small: {} bytes",
            bytes.len()
        )));
    }
    let header = &bytes[..HEADER_SIZE];

    let magic = &header[0..4];
    if magic != CONTAINER_MAGIC {
        return Err(DustError::malformed(format!(
            "invalid container magic: expected {:?}, got {:?}",
            CONTAINER_MAGIC, magic
        )));
    }

    let version = LittleEndian::read_u32(&header[4..8]);
    if version != CONTAINER_VERSION {
        return Err(DustError::malformed(format!(
            "unsupported container version: expected {}, got {}",
            CONTAINER_VERSION, version
        )));
    }

    Ok(ContainerHeader {
        version,
        n_entries: LittleEndian::read_u64(&header[8..16]),
        n_bins: LittleEndian::read_u32(&header[16..20]),
        n_samples: LittleEndian::read_u32(&header[20..24]),
        flags: LittleEndian::read_u32(&header[24..28]),
    })
}

fn read_f64s(bytes: &[u8]) -> Vec<f64> {
    let mut out = vec![0.0; bytes.len() / F64_SIZE];
    LittleEndian::read_f64_into(bytes, &mut out);
    out
}

pub(crate) fn read(path: &Path, options: &DatasetOptions) -> DustResult<HealpixDataset> {
    let mmap = map_file(path)?;
    let header = parse_header(&mmap)?;
    let sections = header.section_sizes()?;

    if mmap.len() != sections.total {
        return Err(DustError::malformed(format!(
            "container is {} bytes, header implies {}",
            mmap.len(),
            sections.total
        )));
    }

    let bytes: &[u8] = &mmap;
    let distmods_start = HEADER_SIZE + sections.pixel_table;
    let best_fit_start = distmods_start + sections.distmods;
    let samples_start = best_fit_start + sections.best_fit;

    let entries: Vec<PixelInfo> = bytes[HEADER_SIZE..distmods_start]
        .chunks_exact(PIXEL_ENTRY_SIZE)
        .map(|chunk| {
            PixelInfo::new(
                LittleEndian::read_u64(&chunk[0..8]),
                LittleEndian::read_u32(&chunk[8..12]),
            )
        })
        .collect();
    let catalog = PixelCatalog::new(entries)?;

    let stored_distmods = &bytes[distmods_start..best_fit_start];
    let distmods = match (&options.distmods, header.has_distmods()) {
        (Some(explicit), _) => explicit.clone(),
        (None, true) => read_f64s(stored_distmods),
        (None, false) => {
            return Err(DustError::malformed(
                "container stores no distance moduli and none were supplied",
            ))
        }
    };
    if distmods.len() != header.n_bins as usize {
        return Err(DustError::malformed(format!(
            "{} distance moduli for {} radial bins",
            distmods.len(),
            header.n_bins
        )));
    }

    let best_fit = read_f64s(&bytes[best_fit_start..samples_start]);

    let sample_bytes = &bytes[samples_start..samples_start + sections.samples];
    let samples = if options.load_samples {
        if header.n_samples == 0 {
            tracing::warn!(path = %path.display(), "samples requested but container has none");
            return Err(DustError::SamplesUnavailable);
        }
        Some((header.n_samples as usize, read_f64s(sample_bytes)))
    } else {
        None
    };

    let dataset = HealpixDataset::from_parts(catalog, distmods, best_fit, samples)?;
    tracing::info!(
        path = %path.display(),
        entries = dataset.n_entries(),
        bins = dataset.n_bins(),
        samples = dataset.n_samples(),
        "opened dust dataset"
    );
    Ok(dataset)
}

pub(crate) fn write(dataset: &HealpixDataset, path: &Path) -> DustResult<()> {
    let file = File::create(path).map_err(|e| {
        DustError::data_error("dataset", "create", &format!("{}: {}", path.display(), e))
    })?;
    let mut out = BufWriter::new(file);

    let (n_samples, samples) = dataset.samples_raw().unwrap_or((0, &[][..]));
    let n_samples = u32::try_from(n_samples)
        .map_err(|_| DustError::malformed("sample count exceeds u32"))?;
    let n_bins = u32::try_from(dataset.n_bins())
        .map_err(|_| DustError::malformed("bin count exceeds u32"))?;

    out.write_all(CONTAINER_MAGIC)?;
    out.write_u32::<LittleEndian>(CONTAINER_VERSION)?;
    out.write_u64::<LittleEndian>(dataset.n_entries() as u64)?;
    out.write_u32::<LittleEndian>(n_bins)?;
    out.write_u32::<LittleEndian>(n_samples)?;
    out.write_u32::<LittleEndian>(FLAG_DISTMODS)?;
    out.write_all(&[0u8; HEADER_SIZE - 28])?;

    for info in dataset.catalog().entries() {
        out.write_u64::<LittleEndian>(info.healpix_index)?;
        out.write_u32::<LittleEndian>(info.nside)?;
        out.write_u32::<LittleEndian>(0)?;
    }
    for &value in dataset
        .distmods()
        .iter()
        .chain(dataset.best_fit())
        .chain(samples)
    {
        out.write_f64::<LittleEndian>(value)?;
    }
    out.flush()?;

    tracing::debug!(path = %path.display(), entries = dataset.n_entries(), "wrote dust dataset");
    Ok(())
}
