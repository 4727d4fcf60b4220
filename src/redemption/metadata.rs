//! Stake metadata carried in a REMARK condition
//!
//! Wire format: the REMARK arguments are `(STAKE_REMARK_TAG versioned_blob)`,
//! where `versioned_blob` is `version: u16 BE || len: u32 BE || blob` and
//! `blob` is `stake_type: u16 BE || is_farm: u8 || destination: 32 || owner: 32`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{StakeCatalog, StakeCategory, StakeValue};
use crate::logging::log_rejected_spend;
use crate::types::program::atom_to_u64;
use crate::types::{Bytes32, Condition, ConditionOpcode, Program, SpendConditions};

/// REMARK data type tag marking stake metadata
pub const STAKE_REMARK_TAG: u8 = 3;

/// Current metadata version
pub const STAKE_METADATA_VERSION: u16 = 1;

const METADATA_LEN: usize = 2 + 1 + 32 + 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    #[error("metadata truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("{0} trailing bytes after metadata")]
    TrailingBytes(usize),

    #[error("unsupported metadata version {0}")]
    UnsupportedVersion(u16),

    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),

    #[error("REMARK payload is not an atom")]
    NotAnAtom,
}

/// Durable fingerprint of a stake-creating spend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeMetadata {
    pub stake_type: u16,
    pub is_farm: bool,
    pub stake_destination_hash: Bytes32,
    pub owner_puzzle_hash: Bytes32,
}

impl StakeMetadata {
    pub fn category(&self) -> StakeCategory {
        StakeCategory::from_is_farm(self.is_farm)
    }

    /// Catalog tier of this stake (the null tier when out of range)
    pub fn stake_value<'a>(&self, catalog: &'a StakeCatalog) -> &'a StakeValue {
        catalog.lookup(self.category(), self.stake_type)
    }

    pub fn time_lock(&self, catalog: &StakeCatalog) -> u64 {
        self.stake_value(catalog).time_lock
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(METADATA_LEN);
        out.extend_from_slice(&self.stake_type.to_be_bytes());
        out.push(self.is_farm as u8);
        out.extend_from_slice(self.stake_destination_hash.as_ref());
        out.extend_from_slice(self.owner_puzzle_hash.as_ref());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MetadataError> {
        let mut reader = Reader::new(bytes);
        let stake_type = u16::from_be_bytes(reader.take_array()?);
        let is_farm = match reader.take_array::<1>()?[0] {
            0 => false,
            1 => true,
            other => return Err(MetadataError::InvalidBool(other)),
        };
        let stake_destination_hash = Bytes32(reader.take_array()?);
        let owner_puzzle_hash = Bytes32(reader.take_array()?);
        reader.finish()?;

        Ok(Self {
            stake_type,
            is_farm,
            stake_destination_hash,
            owner_puzzle_hash,
        })
    }

    /// Wrap in the current versioned blob
    pub fn to_versioned_blob(&self) -> Vec<u8> {
        let blob = self.to_bytes();
        let mut out = Vec::with_capacity(6 + blob.len());
        out.extend_from_slice(&STAKE_METADATA_VERSION.to_be_bytes());
        out.extend_from_slice(&(blob.len() as u32).to_be_bytes());
        out.extend_from_slice(&blob);
        out
    }

    pub fn from_versioned_blob(bytes: &[u8]) -> Result<Self, MetadataError> {
        let mut reader = Reader::new(bytes);
        let version = u16::from_be_bytes(reader.take_array()?);
        let len = u32::from_be_bytes(reader.take_array()?) as usize;
        let blob = reader.take(len)?;
        reader.finish()?;

        if version != STAKE_METADATA_VERSION {
            return Err(MetadataError::UnsupportedVersion(version));
        }
        Self::from_bytes(blob)
    }

    /// REMARK condition announcing this stake
    pub fn remark_condition(&self) -> Condition {
        Condition::new(
            ConditionOpcode::Remark,
            vec![
                Program::int(STAKE_REMARK_TAG as i128),
                Program::atom(self.to_versioned_blob()),
            ],
        )
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], MetadataError> {
        let available = self.bytes.len() - self.offset;
        if len > available {
            return Err(MetadataError::Truncated {
                needed: len,
                available,
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], MetadataError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn finish(self) -> Result<(), MetadataError> {
        match self.bytes.len() - self.offset {
            0 => Ok(()),
            extra => Err(MetadataError::TrailingBytes(extra)),
        }
    }
}

/// Whether a condition is a two-argument REMARK tagged as stake metadata
///
/// The tag is compared by value, so padded encodings such as `0x0003` count.
pub fn is_stake_remark(condition: &Condition) -> bool {
    condition.is(ConditionOpcode::Remark)
        && condition.args.len() == 2
        && condition.atom_arg(0).and_then(atom_to_u64) == Some(STAKE_REMARK_TAG as u64)
}

/// Metadata of the last stake REMARK in `conditions`
///
/// `Ok(None)` when no condition is stake-tagged. Every stake REMARK must
/// decode; one malformed payload fails the whole spend.
pub fn find_metadata(conditions: &[Condition]) -> Result<Option<StakeMetadata>, MetadataError> {
    let mut found = None;
    for remark in conditions.iter().filter(|c| is_stake_remark(c)) {
        let payload = remark.atom_arg(1).ok_or(MetadataError::NotAnAtom)?;
        found = Some(StakeMetadata::from_versioned_blob(payload)?);
    }
    Ok(found)
}

/// Stake metadata announced by a spend
///
/// A malformed payload is logged and treated as absent.
pub fn parse_metadata(spend: &SpendConditions) -> Option<StakeMetadata> {
    match find_metadata(&spend.conditions) {
        Ok(metadata) => metadata,
        Err(e) => {
            log_rejected_spend(&spend.coin_id, "METADATA_MALFORMED", &e.to_string());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> StakeMetadata {
        StakeMetadata {
            stake_type: 2,
            is_farm: true,
            stake_destination_hash: Bytes32([0xd1; 32]),
            owner_puzzle_hash: Bytes32([0x0e; 32]),
        }
    }

    #[test]
    fn test_blob_layout() {
        let blob = metadata().to_versioned_blob();
        assert_eq!(&blob[..2], &[0x00, 0x01]);
        assert_eq!(&blob[2..6], &[0x00, 0x00, 0x00, 67]);
        assert_eq!(&blob[6..8], &[0x00, 0x02]);
        assert_eq!(blob[8], 1);
        assert_eq!(blob.len(), 6 + 67);
        assert_eq!(StakeMetadata::from_versioned_blob(&blob), Ok(metadata()));
    }

    #[test]
    fn test_malformed_blobs() {
        let blob = metadata().to_versioned_blob();

        assert!(matches!(
            StakeMetadata::from_versioned_blob(&blob[..40]),
            Err(MetadataError::Truncated { .. })
        ));

        let mut extra = blob.clone();
        extra.push(0);
        assert_eq!(
            StakeMetadata::from_versioned_blob(&extra),
            Err(MetadataError::TrailingBytes(1))
        );

        let mut version = blob.clone();
        version[1] = 2;
        assert_eq!(
            StakeMetadata::from_versioned_blob(&version),
            Err(MetadataError::UnsupportedVersion(2))
        );

        let mut bad_bool = blob;
        bad_bool[8] = 7;
        assert_eq!(
            StakeMetadata::from_versioned_blob(&bad_bool),
            Err(MetadataError::InvalidBool(7))
        );
    }

    #[test]
    fn test_find_metadata() {
        let create = Condition::create_coin(Bytes32([1; 32]), 10, vec![]);
        let plain_remark = Condition::new(ConditionOpcode::Remark, vec![Program::atom(b"hi".to_vec())]);

        assert_eq!(find_metadata(&[create.clone(), plain_remark.clone()]), Ok(None));
        assert_eq!(
            find_metadata(&[create, plain_remark, metadata().remark_condition()]),
            Ok(Some(metadata()))
        );

        let not_atom = Condition::new(
            ConditionOpcode::Remark,
            vec![Program::int(3), Program::list([Program::int(1)])],
        );
        assert_eq!(find_metadata(&[not_atom]), Err(MetadataError::NotAnAtom));
    }

    #[test]
    fn test_padded_tag_and_last_remark_wins() {
        let padded = Condition::new(
            ConditionOpcode::Remark,
            vec![Program::atom(vec![0x00, 0x03]), Program::atom(metadata().to_versioned_blob())],
        );
        assert!(is_stake_remark(&padded));
        assert_eq!(find_metadata(&[padded.clone()]), Ok(Some(metadata())));

        let later = StakeMetadata {
            stake_type: 0,
            ..metadata()
        };
        assert_eq!(
            find_metadata(&[padded.clone(), later.remark_condition()]),
            Ok(Some(later))
        );

        let mut short = metadata().to_versioned_blob();
        short.truncate(10);
        let broken = Condition::new(
            ConditionOpcode::Remark,
            vec![Program::int(3), Program::atom(short)],
        );
        assert!(matches!(
            find_metadata(&[broken, padded]),
            Err(MetadataError::Truncated { .. })
        ));

        let other_tag = Condition::new(
            ConditionOpcode::Remark,
            vec![Program::atom(vec![0x01, 0x03]), Program::atom(later.to_versioned_blob())],
        );
        assert!(!is_stake_remark(&other_tag));
    }

    #[test]
    fn test_parse_metadata_swallows_malformed() {
        let mut blob = metadata().to_versioned_blob();
        blob.truncate(20);
        let bad = Condition::new(
            ConditionOpcode::Remark,
            vec![Program::int(STAKE_REMARK_TAG as i128), Program::atom(blob)],
        );
        let spend = SpendConditions::from_conditions(Bytes32([1; 32]), Bytes32([2; 32]), vec![bad]);
        assert_eq!(parse_metadata(&spend), None);

        let good = SpendConditions::from_conditions(
            Bytes32([1; 32]),
            Bytes32([2; 32]),
            vec![metadata().remark_condition()],
        );
        assert_eq!(parse_metadata(&good), Some(metadata()));
    }

    #[test]
    fn test_time_lock_from_catalog() {
        let catalog = StakeCatalog::default();
        assert_eq!(metadata().time_lock(&catalog), 30 * crate::catalog::SECONDS_PER_DAY);

        let unknown = StakeMetadata {
            stake_type: 99,
            ..metadata()
        };
        assert_eq!(unknown.time_lock(&catalog), 0);
    }
}
