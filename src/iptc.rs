//! IPTC-IIM in JPEG APP13 (`Photoshop 3.0` / 8BIM resource 0x0404).

use crate::error::EngineError;
use crate::key::TagKey;
use crate::schema::iptc::{self as table, APPLICATION2, IptcType};
use crate::store::MetadataStore;

pub(crate) const IPTC_HEADER: &[u8] = b"Photoshop 3.0\0";
const IPTC_8BIM: &[u8] = b"8BIM";
const IPTC_RESOURCE_ID: u16 = 0x0404;
const DATASET_MARKER: u8 = 0x1C;

/// IIM version written when the application record lacks one.
const RECORD_VERSION: u16 = 4;

/// One 8BIM resource of an APP13 segment.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Resource<'a> {
    id: u16,
    /// The whole resource, padding included.
    raw: &'a [u8],
    data: &'a [u8],
}

fn resources(segment: &[u8]) -> Vec<Resource<'_>> {
    let mut found = Vec::new();
    let Some(data) = segment.strip_prefix(IPTC_HEADER) else {
        return found;
    };
    let mut pos = 0;
    while pos + 12 <= data.len() {
        if &data[pos..pos + 4] != IPTC_8BIM {
            break;
        }
        let id = u16::from_be_bytes([data[pos + 4], data[pos + 5]]);
        // Skip pascal string (1 byte length + string + padding to even)
        let pascal_len = data[pos + 6] as usize;
        let pascal_padded = if (pascal_len + 1) % 2 == 0 {
            pascal_len + 1
        } else {
            pascal_len + 2
        };
        let data_start = pos + 6 + pascal_padded;
        if data_start + 4 > data.len() {
            break;
        }
        let data_len = u32::from_be_bytes([
            data[data_start],
            data[data_start + 1],
            data[data_start + 2],
            data[data_start + 3],
        ]) as usize;
        let body_start = data_start + 4;
        let body_end = (body_start + data_len).min(data.len());
        let padded_end = if data_len % 2 == 0 { body_end } else { body_end + 1 };
        let padded_end = padded_end.min(data.len());

        found.push(Resource {
            id,
            raw: &data[pos..padded_end],
            data: &data[body_start..body_end],
        });
        pos = padded_end;
    }
    found
}

/// Raw `(record, dataset, bytes)` triples in file order.
fn datasets(iim: &[u8]) -> Result<Vec<(u8, u8, &[u8])>, EngineError> {
    let mut found = Vec::new();
    let mut pos = 0;
    while pos + 5 <= iim.len() {
        if iim[pos] != DATASET_MARKER {
            // Trailing padding
            break;
        }
        let record = iim[pos + 1];
        let number = iim[pos + 2];
        let len_field = u16::from_be_bytes([iim[pos + 3], iim[pos + 4]]);
        pos += 5;

        let len = if len_field & 0x8000 != 0 {
            // Extended dataset: the low bits give the size of the length field
            let size = (len_field & 0x7FFF) as usize;
            if size == 0 || size > 4 || pos + size > iim.len() {
                return Err(EngineError::corrupt("Invalid extended IPTC dataset length"));
            }
            let len = iim[pos..pos + size]
                .iter()
                .fold(0usize, |acc, b| (acc << 8) | *b as usize);
            pos += size;
            len
        } else {
            len_field as usize
        };

        let Some(value) = iim.get(pos..pos + len) else {
            return Err(EngineError::corrupt(format!(
                "IPTC dataset {record}:{number} overruns its block"
            )));
        };
        found.push((record, number, value));
        pos += len;
    }
    Ok(found)
}

/// Decode the IPTC datasets of an APP13 segment into store data.
pub(crate) fn decode(segment: &[u8], store: &mut MetadataStore) -> Result<(), EngineError> {
    let Some(resource) = resources(segment)
        .into_iter()
        .find(|r| r.id == IPTC_RESOURCE_ID)
    else {
        log::debug!("APP13 segment has no IPTC-IIM resource");
        return Ok(());
    };

    for (record, number, raw) in datasets(resource.data)? {
        let key = table::key_for(record, number);
        store.push(key, decode_value(table::kind_of(record, number), raw));
    }
    Ok(())
}

fn decode_value(kind: IptcType, raw: &[u8]) -> String {
    match kind {
        IptcType::Short if raw.len() == 2 => u16::from_be_bytes([raw[0], raw[1]]).to_string(),
        IptcType::Date => {
            let s = String::from_utf8_lossy(raw);
            match (s.get(0..4), s.get(4..6), s.get(6..8)) {
                (Some(y), Some(m), Some(d)) if s.len() == 8 => format!("{y}-{m}-{d}"),
                _ => s.into_owned(),
            }
        }
        IptcType::Time => {
            let s = String::from_utf8_lossy(raw);
            match (s.get(0..2), s.get(2..4), s.get(4..6), s.get(6..9), s.get(9..11)) {
                (Some(h), Some(m), Some(sec), Some(tzh), Some(tzm)) if s.len() == 11 => {
                    format!("{h}:{m}:{sec}{tzh}:{tzm}")
                }
                _ => s.into_owned(),
            }
        }
        _ => String::from_utf8_lossy(raw).into_owned(),
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// On-disk bytes for a store value.
pub(crate) fn encode_value(key: &TagKey, kind: IptcType, value: &str) -> Result<Vec<u8>, EngineError> {
    let invalid = |reason: &str| EngineError::invalid_value(&key.to_string(), value, reason);
    match kind {
        IptcType::Short => value
            .trim()
            .parse::<u16>()
            .map(|n| n.to_be_bytes().to_vec())
            .map_err(|_| invalid("expected an unsigned 16-bit integer")),
        IptcType::Date => {
            let compact: String = value.chars().filter(|c| *c != '-').collect();
            if compact.len() == 8 && all_digits(&compact) {
                Ok(compact.into_bytes())
            } else {
                Err(invalid("expected a date as YYYY-MM-DD"))
            }
        }
        IptcType::Time => {
            let compact: String = value.chars().filter(|c| *c != ':').collect();
            let valid = compact.len() == 11
                && compact.is_ascii()
                && all_digits(&compact[..6])
                && matches!(compact.as_bytes()[6], b'+' | b'-')
                && all_digits(&compact[7..]);
            if valid {
                Ok(compact.into_bytes())
            } else {
                Err(invalid("expected a time as HH:MM:SS+HH:MM"))
            }
        }
        IptcType::String | IptcType::Undefined => Ok(value.as_bytes().to_vec()),
    }
}

fn push_dataset(out: &mut Vec<u8>, record: u8, number: u8, value: &[u8]) -> Result<(), EngineError> {
    let len = u16::try_from(value.len())
        .ok()
        .filter(|len| *len < 0x8000)
        .ok_or_else(|| {
            EngineError::new(
                crate::error::EngineErrorKind::InvalidValue,
                format!("IPTC dataset {record}:{number} is too large ({} bytes)", value.len()),
            )
        })?;
    out.extend_from_slice(&[DATASET_MARKER, record, number]);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(value);
    Ok(())
}

/// Serialize the store as IIM datasets.
fn encode_datasets(store: &MetadataStore) -> Result<Vec<u8>, EngineError> {
    let mut entries = Vec::with_capacity(store.len());
    for datum in store {
        let Some((record, number)) = table::resolve(datum.key()) else {
            return Err(EngineError::invalid_key(&datum.key().to_string()));
        };
        let bytes = encode_value(datum.key(), table::kind_of(record, number), datum.value())?;
        entries.push((record, number, bytes));
    }

    let needs_version = entries.iter().any(|(r, ..)| *r == APPLICATION2)
        && !entries.iter().any(|(r, n, _)| *r == APPLICATION2 && *n == 0);

    // Envelope before application record, store order within each record
    entries.sort_by_key(|(record, ..)| *record);

    let mut iim = Vec::new();
    let mut version_written = !needs_version;
    for (record, number, bytes) in &entries {
        if !version_written && *record == APPLICATION2 {
            push_dataset(&mut iim, APPLICATION2, 0, &RECORD_VERSION.to_be_bytes())?;
            version_written = true;
        }
        push_dataset(&mut iim, *record, *number, bytes)?;
    }
    Ok(iim)
}

/// Build APP13 segment contents holding the store.
///
/// Other 8BIM resources of `existing` are preserved. Returns `None` when the
/// store is empty and nothing else remains, meaning the segment should go.
pub(crate) fn build_segment(
    existing: Option<&[u8]>,
    store: &MetadataStore,
) -> Result<Option<Vec<u8>>, EngineError> {
    let mut result = Vec::new();
    result.extend_from_slice(IPTC_HEADER);

    let mut kept = 0;
    if let Some(data) = existing {
        for resource in resources(data) {
            if resource.id != IPTC_RESOURCE_ID {
                result.extend_from_slice(resource.raw);
                kept += 1;
            }
        }
    }

    if !store.is_empty() {
        let iptc_data = encode_datasets(store)?;
        result.extend_from_slice(IPTC_8BIM);
        result.extend_from_slice(&IPTC_RESOURCE_ID.to_be_bytes());
        result.push(0x00); // pascal string (empty, length 0)
        result.push(0x00); // padding to even
        let data_len = iptc_data.len() as u32;
        result.extend_from_slice(&data_len.to_be_bytes());
        result.extend_from_slice(&iptc_data);
        if iptc_data.len() % 2 != 0 {
            result.push(0x00); // pad to even
        }
    } else if kept == 0 {
        return Ok(None);
    }

    Ok(Some(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineErrorKind;

    fn key(s: &str) -> TagKey {
        s.parse().unwrap()
    }

    fn store_of(entries: &[(&str, &str)]) -> MetadataStore {
        let mut store = MetadataStore::new();
        for (k, v) in entries {
            store.push(key(k), *v);
        }
        store
    }

    fn pairs(store: &MetadataStore) -> Vec<(String, String)> {
        store
            .iter()
            .map(|d| (d.key().to_string(), d.value().to_string()))
            .collect()
    }

    // ── values ────────────────────────────────────────────────────

    #[test]
    fn date_and_time_conversions() {
        let k = key("Iptc.Application2.DateCreated");
        assert_eq!(encode_value(&k, IptcType::Date, "2024-03-09").unwrap(), b"20240309");
        assert_eq!(encode_value(&k, IptcType::Date, "20240309").unwrap(), b"20240309");
        assert_eq!(decode_value(IptcType::Date, b"20240309"), "2024-03-09");
        assert_eq!(
            encode_value(&k, IptcType::Time, "14:05:30+01:00").unwrap(),
            b"140530+0100"
        );
        assert_eq!(decode_value(IptcType::Time, b"140530-0500"), "14:05:30-05:00");
    }

    #[test]
    fn invalid_typed_values() {
        let k = key("Iptc.Application2.DateCreated");
        for bad in ["yesterday", "2024-3-9", ""] {
            let err = encode_value(&k, IptcType::Date, bad).unwrap_err();
            assert_eq!(err.kind(), EngineErrorKind::InvalidValue, "{bad}");
        }
        assert!(encode_value(&k, IptcType::Time, "14:05:30").is_err());
        assert!(encode_value(&k, IptcType::Short, "70000").is_err());
    }

    #[test]
    fn malformed_values_decode_verbatim() {
        assert_eq!(decode_value(IptcType::Date, b"2024"), "2024");
        assert_eq!(decode_value(IptcType::Short, b"\x01"), "\u{1}");
    }

    // ── segments ──────────────────────────────────────────────────

    #[test]
    fn segment_round_trip_preserves_order_and_repeats() {
        let store = store_of(&[
            ("Iptc.Application2.Keywords", "sky"),
            ("Iptc.Application2.Caption", "A view"),
            ("Iptc.Application2.Keywords", "sea"),
            ("Iptc.Envelope.CharacterSet", "\u{1b}%G"),
        ]);

        let segment = build_segment(None, &store).unwrap().unwrap();
        let mut decoded = MetadataStore::new();
        decode(&segment, &mut decoded).unwrap();

        assert_eq!(
            pairs(&decoded),
            vec![
                ("Iptc.Envelope.CharacterSet".to_string(), "\u{1b}%G".to_string()),
                ("Iptc.Application2.RecordVersion".to_string(), "4".to_string()),
                ("Iptc.Application2.Keywords".to_string(), "sky".to_string()),
                ("Iptc.Application2.Caption".to_string(), "A view".to_string()),
                ("Iptc.Application2.Keywords".to_string(), "sea".to_string()),
            ]
        );
    }

    #[test]
    fn other_resources_survive() {
        let mut existing = IPTC_HEADER.to_vec();
        // 8BIM 0x03ED (resolution info), empty name, 3 data bytes + pad
        existing.extend_from_slice(b"8BIM\x03\xED\0\0\0\0\0\x03abc\0");
        let store = store_of(&[("Iptc.Application2.City", "Oslo")]);

        let segment = build_segment(Some(&existing), &store).unwrap().unwrap();

        let ids: Vec<u16> = resources(&segment).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0x03ED, IPTC_RESOURCE_ID]);
        assert_eq!(resources(&segment)[0].data, b"abc");
    }

    #[test]
    fn empty_store_drops_segment_unless_resources_remain() {
        assert!(build_segment(None, &MetadataStore::new()).unwrap().is_none());

        let mut existing = IPTC_HEADER.to_vec();
        existing.extend_from_slice(b"8BIM\x03\xED\0\0\0\0\0\x02ab");
        let rebuilt = build_segment(Some(&existing), &MetadataStore::new())
            .unwrap()
            .unwrap();
        assert_eq!(rebuilt, existing);
    }

    #[test]
    fn unknown_datasets_use_numeric_names() {
        let mut iim = Vec::new();
        push_dataset(&mut iim, 2, 200, b"custom").unwrap();
        let mut segment = IPTC_HEADER.to_vec();
        segment.extend_from_slice(b"8BIM\x04\x04\0\0");
        segment.extend_from_slice(&(iim.len() as u32).to_be_bytes());
        segment.extend_from_slice(&iim);

        let mut store = MetadataStore::new();
        decode(&segment, &mut store).unwrap();
        assert_eq!(
            pairs(&store),
            vec![("Iptc.Application2.0x00c8".to_string(), "custom".to_string())]
        );
    }

    #[test]
    fn extended_length_datasets() {
        let mut iim = vec![DATASET_MARKER, 2, 120, 0x80, 0x02, 0x00, 0x03];
        iim.extend_from_slice(b"abc");
        let parsed = datasets(&iim).unwrap();
        assert_eq!(parsed, vec![(2u8, 120u8, &b"abc"[..])]);
    }

    #[test]
    fn truncated_dataset_is_corrupt() {
        let iim = [DATASET_MARKER, 2, 120, 0x00, 0x10, b'a'];
        assert_eq!(datasets(&iim).unwrap_err().kind(), EngineErrorKind::CorruptData);
    }
}
