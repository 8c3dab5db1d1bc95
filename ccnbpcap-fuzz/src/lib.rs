//! Fuzz entry points for ccnbpcap-core
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_decode

use ccnbpcap_core::{
    capture::CaptureWriter,
    driver::{process_buffer, DriverConfig, PayloadMode},
};

pub fn fuzz_decode(data: &[u8]) {
    use ccnbpcap_core::skeleton::{decode, DecoderState};

    // Split the input in two so resumption gets exercised too
    let mid = data.len() / 2;
    let (first, state) = decode(DecoderState::new(), &data[..mid]);
    let (second, _) = decode(state, &data[mid..]);
    assert!(first <= mid);
    assert!(second <= data.len() - mid);
}

pub fn fuzz_scan(data: &[u8]) {
    use ccnbpcap_core::scanner::split_records;

    let mut end = 0;
    for record in split_records(data).flatten() {
        assert_eq!(record.offset, end);
        end = record.end();
    }
    assert!(end <= data.len());
}

pub fn fuzz_extract(data: &[u8]) {
    use ccnbpcap_core::content::extract_content;

    if let Ok(range) = extract_content(data) {
        assert!(range.end <= data.len());
    }
}

pub fn fuzz_process(data: &[u8]) {
    for mode in [PayloadMode::WholeRecord, PayloadMode::ContentOnly] {
        let config = DriverConfig {
            mode,
            ..Default::default()
        };
        if let Ok(mut writer) = CaptureWriter::loopback(Vec::new()) {
            let _ = process_buffer(data, &config, &mut writer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccnbpcap_core::ccnb::content_object;

    #[test]
    fn test_fuzz_decode_empty() {
        fuzz_decode(&[]);
    }

    #[test]
    fn test_fuzz_decode_random() {
        fuzz_decode(&[0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_fuzz_scan_empty() {
        fuzz_scan(&[]);
    }

    #[test]
    fn test_fuzz_scan_random() {
        fuzz_scan(&[0xFF; 1024]);
    }

    #[test]
    fn test_fuzz_extract_valid() {
        fuzz_extract(&content_object(&[b"a"], b"payload"));
    }

    #[test]
    fn test_fuzz_process_mixed() {
        let mut data = content_object(&[b"a"], b"payload").to_vec();
        data.extend_from_slice(&[0x00, 0x80, 0x7f, 0xfa]);
        fuzz_process(&data);
    }
}
