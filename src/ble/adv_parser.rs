//! Advertising-data (AD structure) parsing.
//!
//! Each AD structure is `[len][type][len - 1 bytes of data]`; a zero length
//! or a structure running past the end of the buffer stops the walk.

use heapless::Vec;

use crate::ble::DeviceName;
use crate::config::MAX_ADV_SERVICES;

const AD_TYPE_UUID16_INCOMPLETE: u8 = 0x02;
const AD_TYPE_UUID16_COMPLETE: u8 = 0x03;
const AD_TYPE_NAME_SHORT: u8 = 0x08;
const AD_TYPE_NAME_COMPLETE: u8 = 0x09;

/// Iterate `(ad_type, data)` pairs of well-formed AD structures.
fn ad_structures(data: &[u8]) -> impl Iterator<Item = (u8, &[u8])> {
    let mut i = 0;
    core::iter::from_fn(move || {
        let len = *data.get(i)? as usize;
        if len == 0 || i + len >= data.len() {
            return None;
        }
        let item = (data[i + 1], &data[i + 2..i + 1 + len]);
        i += len + 1;
        Some(item)
    })
}

/// Collect the 16-bit service UUIDs (complete or incomplete lists).
pub fn service_uuids16(data: &[u8]) -> Vec<u16, MAX_ADV_SERVICES> {
    let mut uuids = Vec::new();
    for (ad_type, payload) in ad_structures(data) {
        if ad_type == AD_TYPE_UUID16_INCOMPLETE || ad_type == AD_TYPE_UUID16_COMPLETE {
            for chunk in payload.chunks_exact(2) {
                let uuid = u16::from_le_bytes([chunk[0], chunk[1]]);
                if !uuids.contains(&uuid) && uuids.push(uuid).is_err() {
                    return uuids;
                }
            }
        }
    }
    uuids
}

/// Extract complete/shortened local name from advertisement data.
///
/// Bytes are taken as Latin-1 characters; the name is truncated to the
/// [`DeviceName`] capacity.
pub fn extract_device_name(data: &[u8]) -> Option<DeviceName> {
    let (_, name_bytes) = ad_structures(data)
        .find(|(ad_type, _)| *ad_type == AD_TYPE_NAME_SHORT || *ad_type == AD_TYPE_NAME_COMPLETE)?;

    let mut name = DeviceName::new();
    for &b in name_bytes {
        if name.push(b as char).is_err() {
            break;
        }
    }
    Some(name)
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests (run on host, not embedded)
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HR_SERVICE_UUID;

    fn lists_hr(data: &[u8]) -> bool {
        service_uuids16(data).contains(&HR_SERVICE_UUID)
    }

    #[test]
    fn detect_hr_uuid_in_advertisement() {
        // AD structure: len=3, type=0x03 (Complete 16-bit UUIDs), UUID=0x180D
        let ad_data = [0x03, 0x03, 0x0D, 0x18];
        assert!(lists_hr(&ad_data));
    }

    #[test]
    fn no_hr_uuid_in_advertisement() {
        // Battery Service UUID (0x180F) instead
        let ad_data = [0x03, 0x03, 0x0F, 0x18];
        assert!(!lists_hr(&ad_data));
    }

    #[test]
    fn hr_uuid_among_multiple_uuids() {
        let ad_data = [
            0x07, 0x03, // len=7, type=0x03
            0x0F, 0x18, // Battery
            0x0D, 0x18, // Heart Rate
            0x0A, 0x18, // Device Information
        ];
        assert!(lists_hr(&ad_data));
        assert_eq!(service_uuids16(&ad_data).as_slice(), &[0x180F, 0x180D, 0x180A]);
    }

    #[test]
    fn incomplete_uuid_list() {
        let ad_data = [0x03, 0x02, 0x0D, 0x18];
        assert!(lists_hr(&ad_data));
    }

    #[test]
    fn empty_advertisement_data() {
        assert!(!lists_hr(&[]));
        assert!(service_uuids16(&[]).is_empty());
        assert_eq!(extract_device_name(&[]), None);
    }

    #[test]
    fn malformed_lengths() {
        assert!(!lists_hr(&[0x00]));
        // Claims 5 bytes, only 2 follow.
        assert!(!lists_hr(&[0x05, 0x03, 0x0D]));
    }

    #[test]
    fn uuid_list_capped_at_capacity() {
        let mut ad_data = [0u8; 2 + 2 * 10];
        ad_data[0] = 1 + 2 * 10;
        ad_data[1] = 0x03;
        for n in 0..10u16 {
            let le = (0x1800 + n).to_le_bytes();
            ad_data[2 + 2 * n as usize] = le[0];
            ad_data[3 + 2 * n as usize] = le[1];
        }
        assert_eq!(service_uuids16(&ad_data).len(), MAX_ADV_SERVICES);
    }

    #[test]
    fn extract_complete_local_name() {
        let ad_data = [
            0x02, 0x01, 0x06, // Flags
            0x0B, 0x09, b'P', b'o', b'l', b'a', b'r', b' ', b'H', b'1', b'0', b'X',
        ];
        assert_eq!(extract_device_name(&ad_data).as_deref(), Some("Polar H10X"));
    }

    #[test]
    fn extract_shortened_local_name() {
        let ad_data = [0x05, 0x08, b'T', b'I', b'C', b'K'];
        assert_eq!(extract_device_name(&ad_data).as_deref(), Some("TICK"));
    }

    #[test]
    fn no_name_in_advertisement() {
        let ad_data = [0x02, 0x01, 0x06];
        assert_eq!(extract_device_name(&ad_data), None);
    }

    #[test]
    fn name_truncated_to_32_chars() {
        let mut ad_data = [0u8; 40];
        ad_data[0] = 35;
        ad_data[1] = 0x09;
        for b in ad_data.iter_mut().take(37).skip(2) {
            *b = b'X';
        }
        let name = extract_device_name(&ad_data).unwrap();
        assert_eq!(name.len(), 32);
    }
}
