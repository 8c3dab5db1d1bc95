//! Integration tests for the complete split → frame → capture flow

use ccnbpcap_core::{
    ccnb::content_object,
    capture::CaptureWriter,
    constants::{FRAME_OVERHEAD, MAX_FRAME_SIZE},
    driver::{process_buffer, DriverConfig, PayloadMode},
    error::{Error, FailureKind},
    frame::{FrameConfig, FrameView},
};
use pcap_parser::{parse_pcap_frame, parse_pcap_header, Linktype};

/// Parse a capture and return the frame bytes of each record
fn read_capture(data: &[u8]) -> Vec<Vec<u8>> {
    let (mut rest, header) = parse_pcap_header(data).expect("pcap header");
    assert_eq!(header.network, Linktype::NULL);
    assert_eq!(header.snaplen, MAX_FRAME_SIZE as u32);

    let mut frames = Vec::new();
    while !rest.is_empty() {
        let (next, block) = parse_pcap_frame(rest).expect("pcap record");
        assert_eq!(block.caplen, block.origlen);
        assert_eq!(block.caplen as usize, block.data.len());
        frames.push(block.data.to_vec());
        rest = next;
    }
    frames
}

fn run(buffers: &[&[u8]], config: &DriverConfig) -> (Vec<Result<usize, Error>>, Vec<u8>) {
    let mut writer = CaptureWriter::loopback(Vec::new()).unwrap();
    let results = buffers
        .iter()
        .map(|buf| process_buffer(buf, config, &mut writer).map(|stats| stats.records))
        .collect();
    (results, writer.close().unwrap())
}

#[test]
fn test_single_empty_content_record() {
    let record = content_object(&[], b"");
    let (results, out) = run(&[&record[..]], &DriverConfig::default());

    assert_eq!(results, vec![Ok(1)]);
    let frames = read_capture(&out);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].len(), record.len() + 32);

    let view = FrameView::parse(&frames[0]).unwrap();
    assert_eq!(view.endpoints.src_addr, [127, 0, 0, 1]);
    assert_eq!(view.endpoints.dst_addr, [127, 0, 0, 1]);
    assert_eq!(view.endpoints.src_port, 55555);
    assert_eq!(view.endpoints.dst_port, 4485);
    assert_eq!(view.payload, &record[..]);
}

#[test]
fn test_two_records_in_order() {
    let first = content_object(&[b"one"], b"first payload");
    let second = content_object(&[b"two"], b"second, longer payload");
    let mut buf = first.to_vec();
    buf.extend_from_slice(&second);

    let (results, out) = run(&[&buf[..]], &DriverConfig::default());
    assert_eq!(results, vec![Ok(2)]);

    let frames = read_capture(&out);
    assert_eq!(frames.len(), 2);
    assert_eq!(FrameView::parse(&frames[0]).unwrap().payload, &first[..]);
    assert_eq!(FrameView::parse(&frames[1]).unwrap().payload, &second[..]);
}

#[test]
fn test_trailing_garbage_fails_after_first_record() {
    let record = content_object(&[b"ok"], b"good");
    let mut buf = record.to_vec();
    buf.extend_from_slice(&[0x01, 0x02, 0x03]);

    let (results, out) = run(&[&buf[..]], &DriverConfig::default());
    let err = results[0].clone().unwrap_err();
    assert!(matches!(
        err.kind(),
        FailureKind::IncompleteAtEof | FailureKind::NoProgress
    ));
    assert!(err.is_decode_error());

    let frames = read_capture(&out);
    assert_eq!(frames.len(), 1);
    assert_eq!(FrameView::parse(&frames[0]).unwrap().payload, &record[..]);
}

#[test]
fn test_empty_buffer_writes_nothing() {
    let (results, out) = run(&[&[]], &DriverConfig::default());
    assert_eq!(results, vec![Ok(0)]);
    assert!(read_capture(&out).is_empty());
}

#[test]
fn test_failure_does_not_affect_next_buffer() {
    let good = content_object(&[b"a"], b"1");
    let truncated = &good[..good.len() - 1];

    let (results, out) = run(&[&good[..], truncated, &good[..]], &DriverConfig::default());
    assert_eq!(results[0], Ok(1));
    assert_eq!(results[1].as_ref().unwrap_err().kind(), FailureKind::IncompleteAtEof);
    assert_eq!(results[2], Ok(1));
    assert_eq!(read_capture(&out).len(), 2);
}

#[test]
fn test_content_only_with_overrides() {
    let record = content_object(&[b"ccnx.org", b"video"], b"frame data");
    let config = DriverConfig {
        mode: PayloadMode::ContentOnly,
        frame: FrameConfig {
            src_addr: Some([192, 168, 1, 10]),
            dst_addr: Some([192, 168, 1, 20]),
            src_port: Some(9695),
            dst_port: None,
        },
    };

    let (results, out) = run(&[&record[..]], &config);
    assert_eq!(results, vec![Ok(1)]);

    let frames = read_capture(&out);
    let view = FrameView::parse(&frames[0]).unwrap();
    assert_eq!(view.payload, b"frame data");
    assert_eq!(view.endpoints.src_addr, [192, 168, 1, 10]);
    assert_eq!(view.endpoints.dst_addr, [192, 168, 1, 20]);
    assert_eq!(view.endpoints.src_port, 9695);
    assert_eq!(view.endpoints.dst_port, 4485);
    assert_eq!(frames[0].len(), b"frame data".len() + FRAME_OVERHEAD);
}

#[test]
fn test_oversized_record_overflows() {
    let big = vec![0x42; MAX_FRAME_SIZE];
    let record = content_object(&[b"big"], &big);

    let (results, out) = run(&[&record[..]], &DriverConfig::default());
    assert_eq!(
        results[0].as_ref().unwrap_err().kind(),
        FailureKind::EncodeOverflow
    );
    assert!(read_capture(&out).is_empty());
}

#[test]
fn test_content_only_fits_when_whole_record_would_not() {
    // Content value fits exactly; the surrounding record does not
    let value = vec![0x42; MAX_FRAME_SIZE - FRAME_OVERHEAD];
    let record = content_object(&[b"edge"], &value);
    let config = DriverConfig {
        mode: PayloadMode::ContentOnly,
        ..Default::default()
    };

    let (results, out) = run(&[&record[..]], &config);
    assert_eq!(results, vec![Ok(1)]);
    assert_eq!(read_capture(&out)[0].len(), MAX_FRAME_SIZE);
}
