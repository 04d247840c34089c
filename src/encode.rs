//! Outcome encoding.
//!
//! Turns raw per-shot detector outcomes into [`Counts`] keyed by
//! hexadecimal strings. Each shot is first re-encoded through a
//! [`RemappingTable`] into a zero-initialized classical register; the
//! register is then read as an unsigned integer with **bit 0 as the least
//! significant bit**.
//!
//! ```text
//!   shot [q0=1, q1=0, q2=0]  ──identity──→  creg 0b001  ──→  "0x1"
//!   shot [q0=1]              ──{0 → 1}──→   creg 0b10   ──→  "0x2"
//! ```
//!
//! Classical bits with no measured qubit stay zero. Everything here is
//! pure and may be called concurrently.

use crate::error::{HalError, HalResult};
use crate::mapping::RemappingTable;
use crate::result::Counts;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Re-encode one shot into its classical register.
pub fn remap_shot(shot: &[bool], table: &RemappingTable) -> HalResult<Vec<bool>> {
    table.validate(shot.len())?;
    Ok(remap_validated(shot, table))
}

/// Re-encode a shot whose width was already validated against `table`.
fn remap_validated(shot: &[bool], table: &RemappingTable) -> Vec<bool> {
    if table.is_identity() {
        return shot.to_vec();
    }

    let mut creg = vec![false; table.output_width(shot.len())];
    for (source, destination) in table.iter() {
        creg[destination as usize] = shot[source as usize];
    }
    creg
}

/// Format a classical register as a lowercase hex key (`"0x0"`, `"0x1f"`, ...).
///
/// Works for registers of any width.
pub fn format_key(bits: &[bool]) -> String {
    let Some(top) = bits.iter().rposition(|&b| b) else {
        return "0x0".to_string();
    };

    let mut key = String::with_capacity(top / 4 + 3);
    key.push_str("0x");
    for nibble in (0..=top / 4).rev() {
        let value = (0..4)
            .filter(|&j| bits.get(nibble * 4 + j).copied().unwrap_or(false))
            .fold(0usize, |acc, j| acc | (1 << j));
        key.push(char::from(HEX_DIGITS[value]));
    }
    key
}

/// Encode one shot as its hex key.
pub fn encode_shot(shot: &[bool], table: &RemappingTable) -> HalResult<String> {
    remap_shot(shot, table).map(|creg| format_key(&creg))
}

/// Count the hex keys of all shots of one unit.
///
/// The table is validated once, before any shot is encoded. With a
/// non-identity table every shot must have the same width.
pub fn format_counts(samples: &[Vec<bool>], table: &RemappingTable) -> HalResult<Counts> {
    if let Some(first) = samples.first() {
        let width = first.len();
        table.validate(width)?;
        if !table.is_identity() {
            if let Some((shot, bad)) = samples.iter().enumerate().find(|(_, s)| s.len() != width) {
                return Err(HalError::InvalidMapping(format!(
                    "shot {shot} has {} outcomes, expected {width}",
                    bad.len()
                )));
            }
        }
    }

    let mut counts = Counts::new();
    for shot in samples {
        counts.insert(format_key(&remap_validated(shot, table)), 1);
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(raw: &[u8]) -> Vec<bool> {
        raw.iter().map(|&b| b != 0).collect()
    }

    fn key(raw: &[u8], table: &RemappingTable) -> String {
        encode_shot(&bits(raw), table).unwrap()
    }

    #[test]
    fn test_identity_little_endian() {
        let id = RemappingTable::new();
        assert_eq!(key(&[1], &id), "0x1");
        assert_eq!(key(&[1, 0, 0], &id), "0x1");
        assert_eq!(key(&[0, 0, 1], &id), "0x4");
        assert_eq!(key(&[0, 1, 1], &id), "0x6");
    }

    #[test]
    fn test_zero_key() {
        assert_eq!(format_key(&[]), "0x0");
        assert_eq!(format_key(&bits(&[0, 0, 0, 0, 0])), "0x0");
    }

    #[test]
    fn test_no_leading_zeros() {
        assert_eq!(format_key(&bits(&[1, 1, 1, 1, 0, 0, 0, 0])), "0xf");
        assert_eq!(format_key(&bits(&[0, 0, 0, 0, 1])), "0x10");
        assert_eq!(format_key(&bits(&[1, 1, 1, 1, 1])), "0x1f");
    }

    #[test]
    fn test_wide_register() {
        let mut wide = vec![false; 130];
        wide[129] = true;
        wide[0] = true;
        let k = format_key(&wide);
        // bit 129 → 2^129 = 0x2 followed by 32 hex digits
        assert_eq!(k.len(), 2 + 33);
        assert!(k.starts_with("0x2"));
        assert!(k.ends_with('1'));
    }

    #[test]
    fn test_swap_mapping() {
        let table = RemappingTable::from_pairs([(0, 0), (1, 2), (2, 1)]);
        assert_eq!(key(&[0, 0, 1], &table), "0x2");
    }

    #[test]
    fn test_wider_destination_zero_filled() {
        let table = RemappingTable::from_pairs([(0, 1)]);
        assert_eq!(key(&[1], &table), "0x2");

        let table = RemappingTable::from_pairs([(0, 3), (1, 4), (2, 5)]);
        assert_eq!(key(&[0, 1, 1], &table), format!("{:#x}", 0b110 << 3));
        assert_eq!(remap_shot(&bits(&[0, 1, 1]), &table).unwrap().len(), 6);
    }

    #[test]
    fn test_partial_table_rejected() {
        let table = RemappingTable::from_pairs([(1, 2), (2, 1)]);
        let err = encode_shot(&bits(&[0, 0, 1]), &table).unwrap_err();
        assert!(matches!(err, HalError::InvalidMapping(_)));
    }

    #[test]
    fn test_format_counts_identity() {
        let samples = vec![bits(&[1, 0, 0]), bits(&[0, 1, 0]), bits(&[1, 0, 0])];
        let counts = format_counts(&samples, &RemappingTable::new()).unwrap();
        assert_eq!(counts.get("0x1"), 2);
        assert_eq!(counts.get("0x2"), 1);
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_format_counts_reversed() {
        let samples = vec![bits(&[1, 0, 0]), bits(&[0, 1, 0]), bits(&[1, 0, 0])];
        let table = RemappingTable::from_pairs([(0, 2), (1, 1), (2, 0)]);
        let counts = format_counts(&samples, &table).unwrap();
        assert_eq!(counts.get("0x4"), 2);
        assert_eq!(counts.get("0x2"), 1);
    }

    #[test]
    fn test_format_counts_total_equals_shots() {
        let samples: Vec<Vec<bool>> = (0..250u32)
            .map(|i| (0..4).map(|q| (i >> q) & 1 == 1).collect())
            .collect();
        let table = RemappingTable::from_pairs([(0, 3), (1, 2), (2, 1), (3, 0)]);
        let counts = format_counts(&samples, &table).unwrap();
        assert_eq!(counts.total_shots(), 250);
        assert_eq!(counts.len(), 16);
    }

    #[test]
    fn test_format_counts_rejects_ragged_shots() {
        let samples = vec![bits(&[1, 0]), bits(&[1])];
        let table = RemappingTable::from_pairs([(0, 1), (1, 0)]);
        assert!(matches!(
            format_counts(&samples, &table),
            Err(HalError::InvalidMapping(_))
        ));
    }

    #[test]
    fn test_format_counts_validates_before_encoding() {
        let table = RemappingTable::from_pairs([(0, 0)]);
        let samples = vec![bits(&[1, 1])];
        assert!(format_counts(&samples, &table).is_err());
        assert!(format_counts(&[], &table).unwrap().is_empty());
    }
}
