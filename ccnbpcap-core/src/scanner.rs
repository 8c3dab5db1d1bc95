//! Record splitting over a whole buffer

use crate::error::Error;
use crate::skeleton::{decode, DecodeStatus, DecoderState};
use core::ops::Range;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// A complete top-level record found in a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedRecord {
    /// Byte offset where the record starts
    pub offset: usize,

    /// Record length in bytes
    pub size: usize,
}

impl LocatedRecord {
    /// Offset one past the record's last byte
    pub fn end(&self) -> usize {
        self.offset + self.size
    }

    /// Record extent within its buffer
    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// The record's bytes within `data`
    pub fn bytes<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.range()]
    }
}

/// Iterator over the records of a buffer
///
/// Each record is decoded with a fresh [`DecoderState`]. The first error ends
/// the iteration: there is no marker to resynchronize on, so nothing after a
/// bad record can be trusted.
#[derive(Debug, Clone)]
pub struct RecordIter<'a> {
    data: &'a [u8],
    offset: usize,
    finished: bool,
}

impl<'a> RecordIter<'a> {
    /// Iterate over the records of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            finished: false,
        }
    }

    /// Offset of the next record to decode
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn next_record(&mut self) -> Result<LocatedRecord, Error> {
        let total = self.data.len();
        let offset = self.offset;
        let remaining = &self.data[offset..];

        let (consumed, state) = decode(DecoderState::new(), remaining);

        match state.status() {
            DecodeStatus::Error(code) => Err(Error::Decode {
                code,
                offset,
                consumed,
                remaining: remaining.len(),
                total,
            }),
            _ if consumed == 0 => Err(Error::NoProgress {
                offset,
                remaining: remaining.len(),
                total,
            }),
            DecodeStatus::Running => Err(Error::IncompleteAtEof {
                offset,
                consumed,
                remaining: remaining.len(),
                total,
            }),
            DecodeStatus::Done => {
                self.offset += consumed;
                Ok(LocatedRecord {
                    offset,
                    size: consumed,
                })
            }
        }
    }
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = Result<LocatedRecord, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.offset >= self.data.len() {
            return None;
        }

        let result = self.next_record();
        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}

/// Iterate over the records of `data`
pub fn split_records(data: &[u8]) -> RecordIter<'_> {
    RecordIter::new(data)
}

/// Split `data` into records, failing on the first bad one
pub fn scan_records(data: &[u8]) -> Result<alloc::vec::Vec<LocatedRecord>, Error> {
    split_records(data).collect()
}

/// Scan statistics
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    /// Total bytes in the buffer
    pub bytes_scanned: usize,

    /// Number of complete records found
    pub records_found: usize,

    /// Bytes covered by complete records
    pub bytes_in_records: usize,

    /// Error that stopped the scan, if any
    pub error: Option<Error>,
}

impl ScanStats {
    /// Percentage of the buffer covered by complete records
    pub fn coverage(&self) -> f64 {
        if self.bytes_scanned == 0 {
            100.0
        } else {
            (self.bytes_in_records as f64 / self.bytes_scanned as f64) * 100.0
        }
    }

    /// Whether the buffer split cleanly
    pub fn is_clean(&self) -> bool {
        self.error.is_none()
    }
}

/// Split `data` into records, keeping those found before any error
pub fn scan_with_stats(data: &[u8]) -> (alloc::vec::Vec<LocatedRecord>, ScanStats) {
    let mut stats = ScanStats {
        bytes_scanned: data.len(),
        ..Default::default()
    };
    let mut records = alloc::vec::Vec::new();

    #[cfg(feature = "logging")]
    debug!("Starting record scan of {} bytes", data.len());

    for item in split_records(data) {
        match item {
            Ok(record) => {
                stats.bytes_in_records += record.size;
                records.push(record);
            }
            Err(e) => {
                #[cfg(feature = "logging")]
                warn!("Record scan stopped: {}", e);

                stats.error = Some(e);
            }
        }
    }

    stats.records_found = records.len();

    #[cfg(feature = "logging")]
    debug!(
        "Scan complete: {} records covering {} of {} bytes",
        stats.records_found, stats.bytes_in_records, stats.bytes_scanned
    );

    (records, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ccnb::{content_object, CcnbWriter};
    use crate::constants::dtag;
    use crate::skeleton::DecodeErrorCode;
    use alloc::vec::Vec;

    fn stream_of(n: usize) -> (Vec<u8>, Vec<usize>) {
        let mut stream = Vec::new();
        let mut sizes = Vec::new();
        for i in 0..n {
            let name = alloc::format!("seg{}", i);
            let record = content_object(&[b"test", name.as_bytes()], &[i as u8; 40]);
            sizes.push(record.len());
            stream.extend_from_slice(&record);
        }
        (stream, sizes)
    }

    #[test]
    fn test_split_clean_stream() {
        let (stream, sizes) = stream_of(3);
        let records = scan_records(&stream).unwrap();

        assert_eq!(records.len(), 3);
        let mut expected_offset = 0;
        for (record, size) in records.iter().zip(sizes) {
            assert_eq!(record.offset, expected_offset);
            assert_eq!(record.size, size);
            expected_offset += size;
        }
        assert_eq!(expected_offset, stream.len());
    }

    #[test]
    fn test_empty_buffer_has_no_records() {
        assert_eq!(split_records(&[]).count(), 0);
        let (records, stats) = scan_with_stats(&[]);
        assert!(records.is_empty());
        assert!(stats.is_clean());
    }

    #[test]
    fn test_trailing_garbage_is_incomplete() {
        let (mut stream, sizes) = stream_of(1);
        stream.extend_from_slice(&[0x01, 0x02, 0x03]);

        let items: Vec<_> = split_records(&stream).collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().size, sizes[0]);
        assert_eq!(
            items[1],
            Err(Error::IncompleteAtEof {
                offset: sizes[0],
                consumed: 3,
                remaining: 3,
                total: stream.len(),
            })
        );
    }

    #[test]
    fn test_decode_error_stops_iteration() {
        let mut w = CcnbWriter::new();
        w.tagged_blob(dtag::NAME, b"ok");
        let mut stream = w.finish().to_vec();
        stream.push(0x00);
        stream.extend_from_slice(&stream.clone());

        let items: Vec<_> = split_records(&stream).collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        match &items[1] {
            Err(Error::Decode { code, consumed, .. }) => {
                assert_eq!(*code, DecodeErrorCode::Nesting);
                assert_eq!(*consumed, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_stats_coverage() {
        let (stream, _) = stream_of(4);
        let (records, stats) = scan_with_stats(&stream);
        assert_eq!(records.len(), 4);
        assert_eq!(stats.records_found, 4);
        assert!(stats.is_clean());
        assert!(stats.coverage() > 99.9);
    }
}
