//! pcap capture stream writer
//!
//! Writes classic (non-ng) little-endian pcap with microsecond timestamps.
//! Record timestamps are zero so identical input gives identical output.

use crate::constants::{
    MAX_FRAME_SIZE, PCAP_HEADER_LEN, PCAP_MAGIC, PCAP_RECORD_HEADER_LEN, PCAP_VERSION_MAJOR,
    PCAP_VERSION_MINOR,
};
use crate::error::Error;
use pcap_parser::{LegacyPcapBlock, PcapHeader, ToVec};
use std::fmt::Debug;
use std::io::Write;

#[cfg(feature = "logging")]
use tracing::debug;

/// Data link type of a capture
///
/// See <http://www.tcpdump.org/linktypes.html>
pub use pcap_parser::Linktype;

fn serialize_error<E: Debug>(err: E) -> Error {
    Error::WriteFailure(format!("pcap serialization failed: {:?}", err))
}

/// Appends capture records to a sink, flushing after each one
pub struct CaptureWriter<W: Write> {
    sink: W,
    link_type: Linktype,
    snaplen: u32,
    records: u64,
    bytes: u64,
}

impl<W: Write> CaptureWriter<W> {
    /// Write the global header and return a writer positioned after it
    pub fn open(mut sink: W, link_type: Linktype, snaplen: u32) -> Result<Self, Error> {
        let mut header = PcapHeader {
            magic_number: PCAP_MAGIC,
            version_major: PCAP_VERSION_MAJOR,
            version_minor: PCAP_VERSION_MINOR,
            thiszone: 0,
            sigfigs: 0,
            snaplen,
            network: link_type,
        };
        let header = header.to_vec().map_err(serialize_error)?;
        debug_assert_eq!(header.len(), PCAP_HEADER_LEN);

        sink.write_all(&header)?;
        sink.flush()?;

        #[cfg(feature = "logging")]
        debug!(
            "Opened capture stream: link type {}, snaplen {}",
            link_type.0, snaplen
        );

        Ok(Self {
            sink,
            link_type,
            snaplen,
            records: 0,
            bytes: PCAP_HEADER_LEN as u64,
        })
    }

    /// Open a loopback capture sized for synthetic frames
    pub fn loopback(sink: W) -> Result<Self, Error> {
        Self::open(sink, Linktype::NULL, MAX_FRAME_SIZE as u32)
    }

    /// Append one record holding `frame`, then flush
    pub fn write_frame(&mut self, frame: &[u8]) -> Result<(), Error> {
        let len = u32::try_from(frame.len())
            .ok()
            .filter(|len| *len <= self.snaplen)
            .ok_or(Error::EncodeOverflow {
                payload_len: frame.len(),
                max: self.snaplen as usize,
            })?;

        // Timestamps stay zero so output depends only on input
        let mut record = LegacyPcapBlock {
            ts_sec: 0,
            ts_usec: 0,
            caplen: len,
            origlen: len,
            data: &[],
        };
        let header = record.to_vec().map_err(serialize_error)?;
        debug_assert_eq!(header.len(), PCAP_RECORD_HEADER_LEN);

        self.sink.write_all(&header)?;
        self.sink.write_all(frame)?;
        self.sink.flush()?;

        self.records += 1;
        self.bytes += (PCAP_RECORD_HEADER_LEN + frame.len()) as u64;
        Ok(())
    }

    /// Link type declared in the global header
    pub fn link_type(&self) -> Linktype {
        self.link_type
    }

    /// Records written so far
    pub fn records_written(&self) -> u64 {
        self.records
    }

    /// Bytes written so far, global header included
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    /// Borrow the sink
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Flush and hand back the sink
    pub fn close(mut self) -> Result<W, Error> {
        self.sink.flush()?;

        #[cfg(feature = "logging")]
        debug!(
            "Closed capture stream: {} records, {} bytes",
            self.records, self.bytes
        );

        Ok(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Accepts writes until `budget` bytes, then rejects flushes
    struct FlushFails {
        written: Vec<u8>,
        budget: usize,
    }

    impl Write for FlushFails {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            if self.written.len() > self.budget {
                Err(io::Error::new(io::ErrorKind::Other, "disk full"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_global_header() {
        let writer = CaptureWriter::loopback(Vec::new()).unwrap();
        let out = writer.close().unwrap();

        assert_eq!(out.len(), 24);
        assert_eq!(&out[0..4], &[0xd4, 0xc3, 0xb2, 0xa1]);
        assert_eq!(&out[4..6], &2u16.to_le_bytes());
        assert_eq!(&out[6..8], &4u16.to_le_bytes());
        assert_eq!(&out[16..20], &65536u32.to_le_bytes());
        assert_eq!(&out[20..24], &0u32.to_le_bytes());
    }

    #[test]
    fn test_link_type_reported() {
        let writer = CaptureWriter::loopback(Vec::new()).unwrap();
        assert_eq!(writer.link_type(), Linktype::NULL);
        assert_eq!(writer.bytes_written(), PCAP_HEADER_LEN as u64);
    }

    #[test]
    fn test_records_in_order() {
        let mut writer = CaptureWriter::loopback(Vec::new()).unwrap();
        writer.write_frame(b"first").unwrap();
        writer.write_frame(b"second!").unwrap();
        assert_eq!(writer.records_written(), 2);
        assert_eq!(writer.bytes_written(), 24 + 16 + 5 + 16 + 7);

        let out = writer.close().unwrap();
        let rec1 = &out[24..];
        assert_eq!(&rec1[8..12], &5u32.to_le_bytes());
        assert_eq!(&rec1[12..16], &5u32.to_le_bytes());
        assert_eq!(&rec1[16..21], b"first");
        let rec2 = &rec1[21..];
        assert_eq!(&rec2[8..12], &7u32.to_le_bytes());
        assert_eq!(&rec2[16..], b"second!");
    }

    #[test]
    fn test_write_failure() {
        assert!(matches!(
            CaptureWriter::loopback(FailingSink),
            Err(Error::WriteFailure(_))
        ));
    }

    #[test]
    fn test_flush_failure() {
        let sink = FlushFails {
            written: Vec::new(),
            budget: 24,
        };
        let mut writer = CaptureWriter::loopback(sink).unwrap();
        let err = writer.write_frame(b"data").unwrap_err();
        assert!(matches!(err, Error::WriteFailure(_)));
        assert_eq!(writer.records_written(), 0);
    }

    #[test]
    fn test_frame_larger_than_snaplen() {
        let mut writer = CaptureWriter::open(Vec::new(), Linktype::NULL, 8).unwrap();
        assert!(matches!(
            writer.write_frame(&[0u8; 9]),
            Err(Error::EncodeOverflow { .. })
        ));
    }
}
