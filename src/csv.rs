//! CSV codec for the hack-record wire format.
//!
//! The format is deliberately simple: a header row naming the columns, then
//! one comma-separated row per record. Fields never legitimately contain the
//! delimiter (the schema is a fixed set of integer columns plus an ISO
//! timestamp), so no quoting or escaping is done on either side. Parsing is
//! lenient: rows with the wrong field count are dropped, bad integers fall
//! back to defaults, and a missing timestamp gets the current time. The same
//! policy applies to local uploads and to remote sync pulls.

use std::collections::BTreeMap;

use crate::constants::{COL_HACK_COUNT, COL_TIMESTAMP, ITEM_COLUMNS};
use crate::error::{AppError, Result};
use crate::store::{now_timestamp, HackRecord};

/// Parse CSV text into records.
///
/// Fails with a format error only when there is no header plus at least one
/// data line. Individual malformed rows are skipped, not rejected. The
/// caller is responsible for merging the result into the store (dedup by
/// timestamp happens there).
pub fn decode(text: &str) -> Result<Vec<HackRecord>> {
    let lines: Vec<&str> = text.trim().split('\n').collect();
    if lines.len() < 2 {
        return Err(AppError::Format(
            "CSV must contain a header line and at least one data line".to_string(),
        ));
    }

    let header: Vec<&str> = lines[0].split(',').map(str::trim).collect();

    let mut records = Vec::new();
    for line in &lines[1..] {
        if line.trim().is_empty() {
            continue;
        }
        let values: Vec<&str> = line.split(',').collect();
        if values.len() != header.len() {
            tracing::debug!(
                "Skipping CSV row with {} fields (header has {})",
                values.len(),
                header.len()
            );
            continue;
        }

        let mut timestamp = None;
        let mut hack_count = 1u32;
        let mut items = BTreeMap::new();

        for (column, value) in header.iter().zip(&values) {
            let value = value.trim();
            if *column == COL_TIMESTAMP {
                if !value.is_empty() {
                    timestamp = Some(value.to_string());
                }
            } else if *column == COL_HACK_COUNT {
                hack_count = parse_count(value).unwrap_or(1) as u32;
            } else if ITEM_COLUMNS.contains(column) {
                let quantity = parse_count(value).unwrap_or(0);
                if quantity > 0 {
                    items.insert(column.to_string(), quantity);
                }
            }
            // Unknown columns are ignored.
        }

        // Absent timestamp/hackCount columns fall out naturally: the
        // defaults above stand in for them.
        records.push(HackRecord {
            timestamp: timestamp.unwrap_or_else(now_timestamp),
            hack_count: Some(hack_count),
            items,
        });
    }

    Ok(records)
}

/// Serialize records in the canonical column order. Missing fields render
/// as 0.
pub fn encode(records: &[HackRecord]) -> String {
    let mut header = vec![COL_TIMESTAMP, COL_HACK_COUNT];
    header.extend(ITEM_COLUMNS);
    let mut lines = vec![header.join(",")];

    for record in records {
        let mut fields = vec![record.timestamp.clone(), record.hack_count().to_string()];
        fields.extend(ITEM_COLUMNS.iter().map(|col| record.item(col).to_string()));
        lines.push(fields.join(","));
    }

    lines.join("\n")
}

/// Decode raw upload bytes to text, trying UTF-8 (with or without a BOM)
/// first, then the legacy Chinese encodings Big5 and GBK. Returns the text
/// and whether a legacy encoding was needed, so the caller can re-save a
/// UTF-8 copy for the user.
pub fn decode_bytes(raw: &[u8]) -> Result<(String, bool)> {
    let stripped = raw.strip_prefix(b"\xef\xbb\xbf").unwrap_or(raw);
    if let Ok(text) = std::str::from_utf8(stripped) {
        return Ok((text.to_string(), false));
    }

    for encoding in [encoding_rs::BIG5, encoding_rs::GBK] {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(raw) {
            tracing::info!("Decoded upload as {}", encoding.name());
            return Ok((text.into_owned(), true));
        }
    }

    Err(AppError::Encoding)
}

/// Integer parse with a float-tolerant path: `"3"` and `"3.0"` both yield 3.
/// Negative and non-numeric values are rejected (the caller defaults them).
fn parse_count(value: &str) -> Option<u64> {
    if value.is_empty() {
        return None;
    }
    value.parse::<u64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f as u64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_basic_row() {
        let records = decode("timestamp,hackCount,L7Res\n2024-01-01T00:00:00,2,5\n").unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.timestamp, "2024-01-01T00:00:00");
        assert_eq!(record.hack_count(), 2);
        assert_eq!(record.item("L7Res"), 5);
        for column in ITEM_COLUMNS.iter().filter(|c| **c != "L7Res") {
            assert_eq!(record.item(column), 0, "{column} should default to 0");
        }
    }

    #[test]
    fn test_decode_yields_one_record_per_well_formed_row() {
        let text = "timestamp,hackCount,L7Res\n\
                    2024-01-01T00:00:00,1,1\n\
                    2024-01-02T00:00:00,1,2\n\
                    2024-01-03T00:00:00,1,3\n";
        assert_eq!(decode(text).unwrap().len(), 3);
    }

    #[test]
    fn test_decode_rejects_header_only() {
        assert!(matches!(
            decode("timestamp,hackCount\n"),
            Err(AppError::Format(_))
        ));
        assert!(matches!(decode(""), Err(AppError::Format(_))));
    }

    #[test]
    fn test_mismatched_field_count_dropped_silently() {
        let text = "timestamp,hackCount,L7Res\n\
                    2024-01-01T00:00:00,1\n\
                    2024-01-02T00:00:00,1,2,extra\n\
                    2024-01-03T00:00:00,1,3\n";
        let records = decode(text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].timestamp, "2024-01-03T00:00:00");
    }

    #[test]
    fn test_float_tolerant_integer_parse() {
        let records = decode("timestamp,hackCount,L7Res\n2024-01-01T00:00:00,3.0,2.9\n").unwrap();
        assert_eq!(records[0].hack_count(), 3);
        assert_eq!(records[0].item("L7Res"), 2);
    }

    #[test]
    fn test_bad_fields_fall_back_to_defaults() {
        let records = decode("timestamp,hackCount,L7Res\n2024-01-01T00:00:00,what,-3\n").unwrap();
        assert_eq!(records[0].hack_count(), 1);
        assert_eq!(records[0].item("L7Res"), 0);
    }

    #[test]
    fn test_missing_columns_get_defaults() {
        // No timestamp or hackCount column at all.
        let records = decode("L7Res,L8Res\n4,2\n").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hack_count(), 1);
        assert!(!records[0].timestamp.is_empty());
        assert_eq!(records[0].item("L7Res"), 4);
    }

    #[test]
    fn test_empty_timestamp_synthesized() {
        let records = decode("timestamp,hackCount,L7Res\n,1,2\n").unwrap();
        assert!(!records[0].timestamp.is_empty());
    }

    #[test]
    fn test_unknown_columns_ignored() {
        let records =
            decode("timestamp,hackCount,L7Res,bogus\n2024-01-01T00:00:00,1,2,99\n").unwrap();
        assert_eq!(records[0].total_items(), 2);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let source = "timestamp,hackCount,L7Res\n\
                      2024-01-01T00:00:00,2,5\n\
                      2024-01-02T00:00:00,1,0\n";
        let records = decode(source).unwrap();
        let encoded = encode(&records);
        assert_eq!(decode(&encoded).unwrap(), records);
    }

    #[test]
    fn test_encode_header_order() {
        let encoded = encode(&[]);
        assert_eq!(
            encoded,
            "timestamp,hackCount,L7Res,L8Res,L7XMP,L8XMP,L7US,L8US,L7PC,L8PC,\
             Cshield,Rshield,VRShield,AXAShield,Else,Cmod,Rmod,VRmod,Virus"
        );
    }

    #[test]
    fn test_decode_bytes_utf8_and_bom() {
        let (text, legacy) = decode_bytes("a,b\n1,2".as_bytes()).unwrap();
        assert_eq!(text, "a,b\n1,2");
        assert!(!legacy);

        let mut with_bom = b"\xef\xbb\xbf".to_vec();
        with_bom.extend_from_slice(b"a,b\n1,2");
        let (text, legacy) = decode_bytes(&with_bom).unwrap();
        assert_eq!(text, "a,b\n1,2");
        assert!(!legacy);
    }

    #[test]
    fn test_decode_bytes_big5_fallback() {
        // "中文" in Big5 is not valid UTF-8.
        let raw = b"\xa4\xa4\xa4\xe5,1\n";
        let (text, legacy) = decode_bytes(raw).unwrap();
        assert!(text.starts_with("中文"));
        assert!(legacy);
    }

    #[test]
    fn test_decode_bytes_unrecognized_encoding() {
        // Lone 0x80 is invalid in UTF-8 and truncated in Big5/GBK.
        assert!(matches!(decode_bytes(b"\x80"), Err(AppError::Encoding)));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("3"), Some(3));
        assert_eq!(parse_count("3.0"), Some(3));
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("-1"), None);
        assert_eq!(parse_count("abc"), None);
    }
}
