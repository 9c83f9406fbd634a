//! Integer-tagged values exchanged with the measurement engine.
//!
//! Pauli kinds travel as tags (X = 1, Y = 2, Z = 3). A syndrome request is
//! the stabilizer tag followed by the checked data site indices; the empty
//! sequence means there is nothing left to measure in this run. Operations
//! coming back from the engine are `(kind, data site)` pairs.

use crate::error::ProtocolError;
use crate::lattice::{DataSiteId, StabilizerKind, SyndromeSite, SyndromeSiteId};

/// Single-site Pauli operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pauli {
    X = 1,
    Y = 2,
    Z = 3,
}

impl Pauli {
    /// Wire tag of this Pauli.
    pub fn tag(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for Pauli {
    type Error = ProtocolError;

    fn try_from(tag: i64) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(Pauli::X),
            2 => Ok(Pauli::Y),
            3 => Ok(Pauli::Z),
            other => Err(ProtocolError::UnknownPauliTag(other)),
        }
    }
}

impl StabilizerKind {
    /// Pauli the stabilizer is a product of. Y is never used for stabilizers.
    pub fn pauli(self) -> Pauli {
        match self {
            StabilizerKind::XType => Pauli::X,
            StabilizerKind::ZType => Pauli::Z,
        }
    }
}

/// One "measure this stabilizer" request handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyndromeRequest<'a> {
    /// Zero-based syndrome index; doubles as the history slot within a round.
    pub index: usize,
    /// Zero-based round number.
    pub round: usize,
    pub site: SyndromeSiteId,
    pub kind: StabilizerKind,
    pub data: &'a [DataSiteId],
}

impl<'a> SyndromeRequest<'a> {
    pub fn new(index: usize, round: usize, site: &'a SyndromeSite) -> Self {
        Self {
            index,
            round,
            site: site.id,
            kind: site.kind,
            data: site.data.as_slice(),
        }
    }

    /// Wire form: stabilizer tag followed by the data site indices.
    pub fn encode(&self) -> Vec<i64> {
        let mut out = Vec::with_capacity(1 + self.data.len());
        out.push(self.kind.pauli().tag());
        out.extend(self.data.iter().map(|d| d.0 as i64));
        out
    }
}

/// A physical operation the engine asks to have applied to one data site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operation {
    pub kind: Pauli,
    pub target: DataSiteId,
}

impl Operation {
    pub fn new(kind: Pauli, target: DataSiteId) -> Self {
        Self { kind, target }
    }

    pub fn x(target: usize) -> Self {
        Self::new(Pauli::X, DataSiteId(target))
    }

    pub fn y(target: usize) -> Self {
        Self::new(Pauli::Y, DataSiteId(target))
    }

    pub fn z(target: usize) -> Self {
        Self::new(Pauli::Z, DataSiteId(target))
    }

    /// Wire form `(kind tag, site index)`.
    pub fn encode(&self) -> (i64, i64) {
        (self.kind.tag(), self.target.0 as i64)
    }
}

fn decode_pair(kind: i64, site: i64) -> Result<Operation, ProtocolError> {
    let kind = Pauli::try_from(kind)?;
    let site = usize::try_from(site).map_err(|_| ProtocolError::NegativeSite(site))?;
    Ok(Operation::new(kind, DataSiteId(site)))
}

/// Decode `(kind, site)` pairs. An empty slice is a no-op.
pub fn decode_ops(pairs: &[(i64, i64)]) -> Result<Vec<Operation>, ProtocolError> {
    pairs.iter().map(|&(k, s)| decode_pair(k, s)).collect()
}

/// Decode a flat `[kind, site, kind, site, ...]` stream.
pub fn decode_ops_flat(stream: &[i64]) -> Result<Vec<Operation>, ProtocolError> {
    if stream.len() % 2 != 0 {
        return Err(ProtocolError::OddOperationStream(stream.len()));
    }
    stream
        .chunks_exact(2)
        .map(|pair| decode_pair(pair[0], pair[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::Lattice;

    #[test]
    fn test_pauli_tags() {
        assert_eq!(Pauli::X.tag(), 1);
        assert_eq!(Pauli::Y.tag(), 2);
        assert_eq!(Pauli::Z.tag(), 3);
        assert_eq!(Pauli::try_from(2), Ok(Pauli::Y));
        assert_eq!(Pauli::try_from(0), Err(ProtocolError::UnknownPauliTag(0)));
        assert_eq!(Pauli::try_from(4), Err(ProtocolError::UnknownPauliTag(4)));
    }

    #[test]
    fn test_stabilizer_tags_skip_y() {
        assert_eq!(StabilizerKind::XType.pauli().tag(), 1);
        assert_eq!(StabilizerKind::ZType.pauli().tag(), 3);
    }

    #[test]
    fn test_request_encoding() {
        let lat = Lattice::build(3, 3).unwrap();
        let req = SyndromeRequest::new(3, 0, lat.syndrome(3).unwrap());
        assert_eq!(req.kind, StabilizerKind::ZType);
        assert_eq!(req.encode(), vec![3, 1, 3, 4, 6]);

        let first = SyndromeRequest::new(0, 0, lat.syndrome(0).unwrap());
        assert_eq!(first.encode(), vec![1, 0, 1, 3]);
    }

    #[test]
    fn test_decode_ops() {
        assert_eq!(decode_ops(&[]), Ok(vec![]));
        assert_eq!(
            decode_ops(&[(1, 4), (3, 0), (2, 7)]),
            Ok(vec![Operation::x(4), Operation::z(0), Operation::y(7)])
        );
        assert_eq!(decode_ops(&[(5, 1)]), Err(ProtocolError::UnknownPauliTag(5)));
        assert_eq!(decode_ops(&[(1, -2)]), Err(ProtocolError::NegativeSite(-2)));
    }

    #[test]
    fn test_decode_ops_flat() {
        assert_eq!(
            decode_ops_flat(&[3, 2, 1, 9]),
            Ok(vec![Operation::z(2), Operation::x(9)])
        );
        assert_eq!(decode_ops_flat(&[1, 2, 3]), Err(ProtocolError::OddOperationStream(3)));
        assert_eq!(Operation::y(5).encode(), (2, 5));
    }
}
