//! Planar surface-code lattice built band by band.
//!
//! The lattice is a stack of `2h - 1` bands. Even bands are **full** rows of `w`
//! data sites, odd bands are **offset** rows of `w - 1` data sites sitting in
//! the gaps of the rows around them:
//!
//! ```text
//! band 0   d0 . d1 . d2        full    (X syndromes between data)
//! band 1   .  d3 .  d4 .       offset  (Z syndromes around data)
//! band 2   d5 . d6 . d7        full
//! ```
//!
//! Syndrome sites sit on the `.` positions. Each band hosts one site per
//! position of its shorter neighbouring band, and the stabilizer kind
//! alternates band by band starting with `XType`. No coordinates are kept:
//! sites are addressed by contiguous ids, data first, syndromes after.

use std::fmt;

use log::debug;
use smallvec::SmallVec;

use crate::error::LatticeError;

/// Identifier of a data site. Data ids run from 0 to `data_count - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataSiteId(pub usize);

/// Identifier of a syndrome site. Syndrome ids continue after the last data id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyndromeSiteId(pub usize);

impl fmt::Display for DataSiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

impl fmt::Display for SyndromeSiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Stabilizer measured by a syndrome site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StabilizerKind {
    /// Product of X over the checked data sites; flips on Z errors.
    XType,
    /// Product of Z over the checked data sites; flips on X errors.
    ZType,
}

impl StabilizerKind {
    /// Kind used by band `band`: `XType` on even bands, `ZType` on odd ones.
    pub fn for_band(band: usize) -> Self {
        if band % 2 == 0 {
            StabilizerKind::XType
        } else {
            StabilizerKind::ZType
        }
    }

    /// The other kind.
    pub fn flipped(self) -> Self {
        match self {
            StabilizerKind::XType => StabilizerKind::ZType,
            StabilizerKind::ZType => StabilizerKind::XType,
        }
    }
}

/// A physical data qubit location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSite {
    pub id: DataSiteId,
}

/// A stabilizer-measurement location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyndromeSite {
    pub id: SyndromeSiteId,
    pub kind: StabilizerKind,
    /// Band hosting this site.
    pub band: usize,
    /// Position within the band.
    pub position: usize,
    /// Checked data sites in `[up, left, right, down]` order, absent entries skipped.
    pub data: SmallVec<[DataSiteId; 4]>,
    /// Reserved for hole punching. The round driver does not consult it.
    pub enabled: bool,
}

impl SyndromeSite {
    /// Number of data sites this stabilizer checks (3 or 4, 2 on the smallest lattices).
    pub fn weight(&self) -> usize {
        self.data.len()
    }

    /// Whether this site checks data site `id`.
    pub fn checks(&self, id: DataSiteId) -> bool {
        self.data.contains(&id)
    }
}

/// Complete planar lattice: data bands plus syndrome sites.
///
/// Immutable after construction apart from `SyndromeSite::enabled`, so a
/// `&Lattice` can be shared across concurrent runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lattice {
    width: usize,
    height: usize,
    bands: Vec<Vec<DataSiteId>>,
    syndromes: Vec<SyndromeSite>,
}

impl Lattice {
    /// Build a `width` x `height` lattice.
    ///
    /// Fails with `InvalidDimension` when either dimension is below 2.
    pub fn build(width: usize, height: usize) -> Result<Self, LatticeError> {
        if width < 2 || height < 2 {
            return Err(LatticeError::InvalidDimension { width, height });
        }

        let band_count = 2 * height - 1;
        let mut next_id = 0;
        let bands: Vec<Vec<DataSiteId>> = (0..band_count)
            .map(|band| {
                let len = if band % 2 == 0 { width } else { width - 1 };
                let ids = (next_id..next_id + len).map(DataSiteId).collect();
                next_id += len;
                ids
            })
            .collect();

        let mut syndromes = Vec::new();
        for band in 0..band_count {
            let before = band.checked_sub(1).map(|b| &bands[b]);
            let after = bands.get(band + 1);
            let current = &bands[band];
            let kind = StabilizerKind::for_band(band);

            // One site per position of the shorter neighbour.
            let positions = match (before, after) {
                (Some(b), Some(a)) => b.len().min(a.len()),
                (Some(n), None) | (None, Some(n)) => n.len(),
                (None, None) => 0,
            };

            for position in 0..positions {
                let mut data = SmallVec::new();
                if let Some(b) = before {
                    data.push(b[position]);
                }
                if band % 2 == 0 {
                    // Full band: both flanking data sites always exist.
                    data.push(current[position]);
                    data.push(current[position + 1]);
                } else {
                    if position > 0 {
                        data.push(current[position - 1]);
                    }
                    if let Some(&right) = current.get(position) {
                        data.push(right);
                    }
                }
                if let Some(a) = after {
                    data.push(a[position]);
                }

                syndromes.push(SyndromeSite {
                    id: SyndromeSiteId(next_id),
                    kind,
                    band,
                    position,
                    data,
                    enabled: true,
                });
                next_id += 1;
            }
        }

        debug!(
            "built {}x{} lattice: {} data sites, {} syndrome sites",
            width,
            height,
            next_id - syndromes.len(),
            syndromes.len()
        );

        Ok(Self {
            width,
            height,
            bands,
            syndromes,
        })
    }

    /// Number of data sites in a full row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of full rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of data sites: `h*w + (h-1)*(w-1)`.
    pub fn data_count(&self) -> usize {
        self.height * self.width + (self.height - 1) * (self.width - 1)
    }

    /// Total number of syndrome sites: `h*(w-1) + (h-1)*w`.
    pub fn syndrome_count(&self) -> usize {
        self.syndromes.len()
    }

    /// Data plus syndrome sites.
    pub fn qubit_count(&self) -> usize {
        self.data_count() + self.syndrome_count()
    }

    /// Number of bands (`2h - 1`).
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Data site ids of band `band`, or `None` past the last band.
    pub fn band(&self, band: usize) -> Option<&[DataSiteId]> {
        self.bands.get(band).map(Vec::as_slice)
    }

    /// All data sites in id order.
    pub fn data_sites(&self) -> impl Iterator<Item = DataSite> + '_ {
        self.bands.iter().flatten().map(|&id| DataSite { id })
    }

    /// All syndrome sites in syndrome-index order.
    pub fn syndromes(&self) -> &[SyndromeSite] {
        &self.syndromes
    }

    /// Syndrome site at zero-based syndrome index `index`.
    pub fn syndrome(&self, index: usize) -> Option<&SyndromeSite> {
        self.syndromes.get(index)
    }

    /// Syndrome site with global id `id`.
    pub fn syndrome_by_id(&self, id: SyndromeSiteId) -> Option<&SyndromeSite> {
        id.0
            .checked_sub(self.data_count())
            .and_then(|index| self.syndromes.get(index))
    }

    /// Syndrome index of global id `id`.
    pub fn syndrome_index(&self, id: SyndromeSiteId) -> Option<usize> {
        id.0
            .checked_sub(self.data_count())
            .filter(|&index| index < self.syndromes.len())
    }

    /// Syndrome sites measuring `kind`.
    pub fn syndromes_of_kind(&self, kind: StabilizerKind) -> impl Iterator<Item = &SyndromeSite> {
        self.syndromes.iter().filter(move |s| s.kind == kind)
    }

    /// Syndrome sites that check data site `id`.
    pub fn syndromes_touching(&self, id: DataSiteId) -> impl Iterator<Item = &SyndromeSite> {
        self.syndromes.iter().filter(move |s| s.checks(id))
    }

    /// Set the `enabled` flag of syndrome site `id`. Returns false for unknown ids.
    pub fn set_enabled(&mut self, id: SyndromeSiteId, enabled: bool) -> bool {
        match self.syndrome_index(id) {
            Some(index) => {
                self.syndromes[index].enabled = enabled;
                true
            }
            None => false,
        }
    }
}
