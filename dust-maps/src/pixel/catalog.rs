use dust_core::{DustError, DustResult};

use super::healpix::{is_valid_nside, npix};

/// One catalog entry: a nested HEALPix pixel at a given resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelInfo {
    pub healpix_index: u64,
    pub nside: u32,
}

impl PixelInfo {
    pub fn new(healpix_index: u64, nside: u32) -> Self {
        Self {
            healpix_index,
            nside,
        }
    }
}

/// Immutable per-entry pixel metadata of a mixed-resolution map.
///
/// Entry `i` describes row `i` of the best-fit matrix. Entries at different
/// nsides coexist; a well-formed catalog covers each sky point at most once.
#[derive(Debug, Clone)]
pub struct PixelCatalog {
    entries: Vec<PixelInfo>,
    min_nside: u32,
    max_nside: u32,
}

impl PixelCatalog {
    /// Validates and wraps catalog entries.
    ///
    /// # Errors
    /// [`DustError::MalformedDataset`] when the catalog is empty, an nside is
    /// not a power of two in `1..=2^29`, or a pixel index is out of range for
    /// its nside.
    pub fn new(entries: Vec<PixelInfo>) -> DustResult<Self> {
        if entries.is_empty() {
            return Err(DustError::malformed("pixel catalog is empty"));
        }

        for (i, entry) in entries.iter().enumerate() {
            if !is_valid_nside(entry.nside) {
                return Err(DustError::malformed(format!(
                    "entry {} has invalid nside {}",
                    i, entry.nside
                )));
            }
            if entry.healpix_index >= npix(entry.nside) {
                return Err(DustError::malformed(format!(
                    "entry {} has pixel {} outside nside {} (npix {})",
                    i,
                    entry.healpix_index,
                    entry.nside,
                    npix(entry.nside)
                )));
            }
        }

        let min_nside = entries.iter().map(|e| e.nside).min().unwrap_or(1);
        let max_nside = entries.iter().map(|e| e.nside).max().unwrap_or(1);

        Ok(Self {
            entries,
            min_nside,
            max_nside,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PixelInfo] {
        &self.entries
    }

    pub fn get(&self, entry: usize) -> Option<&PixelInfo> {
        self.entries.get(entry)
    }

    pub fn min_nside(&self) -> u32 {
        self.min_nside
    }

    pub fn max_nside(&self) -> u32 {
        self.max_nside
    }

    /// Every power of two between the coarsest and finest nside, finest first.
    ///
    /// Levels without entries are included and simply never match.
    pub fn resolution_ladder(&self) -> Vec<u32> {
        let mut ladder = Vec::new();
        let mut nside = self.max_nside;
        while nside >= self.min_nside {
            ladder.push(nside);
            nside >>= 1;
            if nside == 0 {
                break;
            }
        }
        ladder
    }

    /// Number of entries at each nside, coarsest first.
    pub fn nside_histogram(&self) -> Vec<(u32, usize)> {
        let mut counts: Vec<(u32, usize)> = Vec::new();
        for nside in self.resolution_ladder().into_iter().rev() {
            let count = self.entries.iter().filter(|e| e.nside == nside).count();
            counts.push((nside, count));
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_catalog() {
        let err = PixelCatalog::new(Vec::new()).unwrap_err();
        assert!(err.is_integrity_error());
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_rejects_bad_nside() {
        let err = PixelCatalog::new(vec![PixelInfo::new(0, 3)]).unwrap_err();
        assert!(err.to_string().contains("invalid nside 3"));
        let err = PixelCatalog::new(vec![PixelInfo::new(0, 0)]).unwrap_err();
        assert!(err.is_integrity_error());
    }

    #[test]
    fn test_rejects_pixel_out_of_range() {
        let err = PixelCatalog::new(vec![PixelInfo::new(48, 2)]).unwrap_err();
        assert!(err.to_string().contains("pixel 48 outside nside 2"));
        assert!(PixelCatalog::new(vec![PixelInfo::new(47, 2)]).is_ok());
    }

    #[test]
    fn test_ladder_includes_empty_levels() {
        let catalog =
            PixelCatalog::new(vec![PixelInfo::new(0, 16), PixelInfo::new(5, 2)]).unwrap();
        assert_eq!(catalog.resolution_ladder(), vec![16, 8, 4, 2]);
        assert_eq!(catalog.min_nside(), 2);
        assert_eq!(catalog.max_nside(), 16);
    }

    #[test]
    fn test_single_level_ladder() {
        let catalog = PixelCatalog::new(vec![PixelInfo::new(0, 1)]).unwrap();
        assert_eq!(catalog.resolution_ladder(), vec![1]);
    }

    #[test]
    fn test_nside_histogram() {
        let catalog = PixelCatalog::new(vec![
            PixelInfo::new(0, 4),
            PixelInfo::new(1, 4),
            PixelInfo::new(3, 1),
        ])
        .unwrap();
        assert_eq!(catalog.nside_histogram(), vec![(1, 1), (2, 0), (4, 2)]);
    }
}
