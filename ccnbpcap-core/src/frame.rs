//! Synthetic link + IPv4 + UDP frame encoding
//!
//! Every frame has the same layout:
//! 1. Link tag (4 bytes): address family, little-endian like the capture file
//! 2. IPv4 header (20 bytes, no options, checksum left at zero)
//! 3. UDP header (8 bytes, checksum left at zero)
//! 4. Payload
//!
//! The headers are synthetic and never meant to pass checksum validation.

use crate::constants::{
    AF_INET, DEFAULT_DST_PORT, DEFAULT_SRC_PORT, FRAME_OVERHEAD, IPPROTO_UDP, IPV4_HEADER_LEN,
    IPV4_IDENTIFICATION, IPV4_TTL, IPV4_VERSION_IHL, LINK_TAG_LEN, MAX_FRAME_SIZE, UDP_HEADER_LEN,
};
use crate::error::Error;
use alloc::format;
use bytes::{BufMut, Bytes, BytesMut};
use core::net::Ipv4Addr;
use serde::{Deserialize, Serialize};

/// Loopback, the default for both addresses
pub const LOCALHOST: [u8; 4] = [127, 0, 0, 1];

/// Address and port overrides; unset fields take the defaults
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameConfig {
    /// IPv4 source address (default 127.0.0.1)
    pub src_addr: Option<[u8; 4]>,
    /// IPv4 destination address (default 127.0.0.1)
    pub dst_addr: Option<[u8; 4]>,
    /// UDP source port (default 55555)
    pub src_port: Option<u16>,
    /// UDP destination port (default 4485)
    pub dst_port: Option<u16>,
}

/// Fully resolved addressing of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    /// IPv4 source address
    pub src_addr: [u8; 4],
    /// IPv4 destination address
    pub dst_addr: [u8; 4],
    /// UDP source port
    pub src_port: u16,
    /// UDP destination port
    pub dst_port: u16,
}

impl FrameConfig {
    /// Apply defaults to unset fields
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            src_addr: self.src_addr.unwrap_or(LOCALHOST),
            dst_addr: self.dst_addr.unwrap_or(LOCALHOST),
            src_port: self.src_port.unwrap_or(DEFAULT_SRC_PORT),
            dst_port: self.dst_port.unwrap_or(DEFAULT_DST_PORT),
        }
    }
}

/// Total frame length for a payload, or `EncodeOverflow`
pub fn frame_len(payload_len: usize) -> Result<usize, Error> {
    match payload_len.checked_add(FRAME_OVERHEAD) {
        Some(total) if total <= MAX_FRAME_SIZE => Ok(total),
        _ => Err(Error::EncodeOverflow {
            payload_len,
            max: MAX_FRAME_SIZE,
        }),
    }
}

/// Wrap `payload` in synthetic link, IPv4 and UDP headers
pub fn encode_frame(payload: &[u8], config: &FrameConfig) -> Result<Bytes, Error> {
    let total = frame_len(payload.len())?;
    let ip_len = u16::try_from(payload.len() + IPV4_HEADER_LEN + UDP_HEADER_LEN)
        .map_err(|_| Error::InvalidFrame(format!("IPv4 length overflow for {} bytes", total)))?;
    let udp_len = u16::try_from(payload.len() + UDP_HEADER_LEN)
        .map_err(|_| Error::InvalidFrame(format!("UDP length overflow for {} bytes", total)))?;
    let ep = config.endpoints();

    let mut buf = BytesMut::with_capacity(total);

    // Link tag
    buf.put_u32_le(AF_INET);

    // IPv4 header
    buf.put_u8(IPV4_VERSION_IHL);
    buf.put_u8(0); // DSCP/ECN
    buf.put_u16(ip_len);
    buf.put_u16(IPV4_IDENTIFICATION);
    buf.put_u16(0); // flags, fragment offset
    buf.put_u8(IPV4_TTL);
    buf.put_u8(IPPROTO_UDP);
    buf.put_u16(0); // checksum disabled
    buf.put_slice(&ep.src_addr);
    buf.put_slice(&ep.dst_addr);

    // UDP header
    buf.put_u16(ep.src_port);
    buf.put_u16(ep.dst_port);
    buf.put_u16(udp_len);
    buf.put_u16(0); // checksum disabled

    buf.put_slice(payload);

    let frame = buf.freeze();
    FrameView::parse(&frame)?;
    Ok(frame)
}

/// Read-only view of an encoded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameView<'a> {
    /// Address family from the link tag
    pub family: u32,
    /// IPv4 total length
    pub ip_len: u16,
    /// IPv4 identification
    pub identification: u16,
    /// IPv4 time to live
    pub ttl: u8,
    /// IPv4 protocol
    pub protocol: u8,
    /// IPv4 header checksum
    pub ip_checksum: u16,
    /// UDP length
    pub udp_len: u16,
    /// UDP checksum
    pub udp_checksum: u16,
    /// Resolved addresses and ports
    pub endpoints: Endpoints,
    /// Encapsulated payload
    pub payload: &'a [u8],
}

impl<'a> FrameView<'a> {
    /// Parse a frame and check its length fields against its size
    pub fn parse(frame: &'a [u8]) -> Result<Self, Error> {
        if frame.len() < FRAME_OVERHEAD {
            return Err(Error::InvalidFrame(format!(
                "frame of {} bytes is shorter than its headers",
                frame.len()
            )));
        }
        if frame.len() > MAX_FRAME_SIZE {
            return Err(Error::EncodeOverflow {
                payload_len: frame.len() - FRAME_OVERHEAD,
                max: MAX_FRAME_SIZE,
            });
        }

        let be16 = |at: usize| u16::from_be_bytes([frame[at], frame[at + 1]]);
        let addr = |at: usize| [frame[at], frame[at + 1], frame[at + 2], frame[at + 3]];
        let ip = LINK_TAG_LEN;
        let udp = LINK_TAG_LEN + IPV4_HEADER_LEN;

        let view = FrameView {
            family: u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]),
            ip_len: be16(ip + 2),
            identification: be16(ip + 4),
            ttl: frame[ip + 8],
            protocol: frame[ip + 9],
            ip_checksum: be16(ip + 10),
            udp_len: be16(udp + 4),
            udp_checksum: be16(udp + 6),
            endpoints: Endpoints {
                src_addr: addr(ip + 12),
                dst_addr: addr(ip + 16),
                src_port: be16(udp),
                dst_port: be16(udp + 2),
            },
            payload: &frame[FRAME_OVERHEAD..],
        };

        if frame[ip] != IPV4_VERSION_IHL {
            return Err(Error::InvalidFrame(format!(
                "unexpected version/IHL byte {:#04x}",
                frame[ip]
            )));
        }
        if view.protocol != IPPROTO_UDP {
            return Err(Error::InvalidFrame(format!(
                "unexpected IP protocol {}",
                view.protocol
            )));
        }
        if view.ip_len as usize != frame.len() - LINK_TAG_LEN {
            return Err(Error::InvalidFrame(format!(
                "IPv4 length {} does not match {} encapsulated bytes",
                view.ip_len,
                frame.len() - LINK_TAG_LEN
            )));
        }
        if view.udp_len as usize != frame.len() - udp {
            return Err(Error::InvalidFrame(format!(
                "UDP length {} does not match {} encapsulated bytes",
                view.udp_len,
                frame.len() - udp
            )));
        }

        Ok(view)
    }

    /// Source address
    pub fn src_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.endpoints.src_addr)
    }

    /// Destination address
    pub fn dst_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.endpoints.dst_addr)
    }
}

/// Builder for frames with non-default addressing
#[derive(Debug, Clone, Default)]
pub struct FrameBuilder {
    config: FrameConfig,
    payload: Bytes,
}

impl FrameBuilder {
    /// Create a builder with default addressing and an empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            config,
            payload: Bytes::new(),
        }
    }

    /// Set the source address
    pub fn src_addr(mut self, addr: Ipv4Addr) -> Self {
        self.config.src_addr = Some(addr.octets());
        self
    }

    /// Set the destination address
    pub fn dst_addr(mut self, addr: Ipv4Addr) -> Self {
        self.config.dst_addr = Some(addr.octets());
        self
    }

    /// Set the source port
    pub fn src_port(mut self, port: u16) -> Self {
        self.config.src_port = Some(port);
        self
    }

    /// Set the destination port
    pub fn dst_port(mut self, port: u16) -> Self {
        self.config.dst_port = Some(port);
        self
    }

    /// Set the payload
    pub fn payload(mut self, payload: Bytes) -> Self {
        self.payload = payload;
        self
    }

    /// The configuration built so far
    pub fn config(&self) -> FrameConfig {
        self.config
    }

    /// Build and encode the frame
    pub fn build(self) -> Result<Bytes, Error> {
        encode_frame(&self.payload, &self.config)
    }
}
