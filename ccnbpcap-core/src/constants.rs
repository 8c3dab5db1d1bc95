//! Constants for the ccnb token grammar and the synthetic frame layout

use serde::{Deserialize, Serialize};

/// High bit set on the final byte of a token header
pub const TT_HBIT: u8 = 0x80;

/// Number of type bits carried by the final byte of a token header
pub const TT_BITS: u32 = 3;

/// Mask for the type bits of the final header byte
pub const TT_MASK: u8 = (1 << TT_BITS) - 1;

/// Largest value that fits in the final header byte
pub const MAX_TINY: u8 = (1 << (7 - TT_BITS)) - 1;

/// The single byte that closes an element
pub const CLOSE: u8 = 0x00;

/// Token types of the ccnb encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TokenType {
    /// Extension token, no payload
    Ext = 0,
    /// Element start with an inline tag name (value + 1 bytes)
    Tag = 1,
    /// Element start with a dictionary tag number
    DTag = 2,
    /// Attribute with an inline name (value + 1 bytes)
    Attr = 3,
    /// Attribute with a dictionary number
    DAttr = 4,
    /// Opaque binary data (value bytes)
    Blob = 5,
    /// UTF-8 character data (value bytes)
    UData = 6,
}

impl TokenType {
    /// Map the three type bits of a header byte to a token type
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits & TT_MASK {
            0 => Some(TokenType::Ext),
            1 => Some(TokenType::Tag),
            2 => Some(TokenType::DTag),
            3 => Some(TokenType::Attr),
            4 => Some(TokenType::DAttr),
            5 => Some(TokenType::Blob),
            6 => Some(TokenType::UData),
            _ => None,
        }
    }

    /// Whether this token opens an element
    pub const fn opens_element(&self) -> bool {
        matches!(self, TokenType::Tag | TokenType::DTag)
    }
}

/// Dictionary tag numbers used by ContentObject records
pub mod dtag {
    /// `Name`
    pub const NAME: u64 = 14;
    /// `Component`
    pub const COMPONENT: u64 = 15;
    /// `Content`
    pub const CONTENT: u64 = 19;
    /// `SignedInfo`
    pub const SIGNED_INFO: u64 = 20;
    /// `KeyLocator`
    pub const KEY_LOCATOR: u64 = 28;
    /// `Signature`
    pub const SIGNATURE: u64 = 37;
    /// `Timestamp`
    pub const TIMESTAMP: u64 = 39;
    /// `Type`
    pub const TYPE: u64 = 40;
    /// `Interest`
    pub const INTEREST: u64 = 26;
    /// `Witness`
    pub const WITNESS: u64 = 53;
    /// `SignatureBits`
    pub const SIGNATURE_BITS: u64 = 54;
    /// `DigestAlgorithm`
    pub const DIGEST_ALGORITHM: u64 = 55;
    /// `FreshnessSeconds`
    pub const FRESHNESS_SECONDS: u64 = 58;
    /// `FinalBlockID`
    pub const FINAL_BLOCK_ID: u64 = 59;
    /// `PublisherPublicKeyDigest`
    pub const PUBLISHER_PUBLIC_KEY_DIGEST: u64 = 60;
    /// `ContentObject`
    pub const CONTENT_OBJECT: u64 = 64;

    /// Schema name of a dictionary tag, if known
    pub const fn name(tag: u64) -> Option<&'static str> {
        Some(match tag {
            NAME => "Name",
            COMPONENT => "Component",
            CONTENT => "Content",
            SIGNED_INFO => "SignedInfo",
            INTEREST => "Interest",
            KEY_LOCATOR => "KeyLocator",
            SIGNATURE => "Signature",
            TIMESTAMP => "Timestamp",
            TYPE => "Type",
            WITNESS => "Witness",
            SIGNATURE_BITS => "SignatureBits",
            DIGEST_ALGORITHM => "DigestAlgorithm",
            FRESHNESS_SECONDS => "FreshnessSeconds",
            FINAL_BLOCK_ID => "FinalBlockID",
            PUBLISHER_PUBLIC_KEY_DIGEST => "PublisherPublicKeyDigest",
            CONTENT_OBJECT => "ContentObject",
            _ => return None,
        })
    }
}

/// Length of the link tag preceding the IPv4 header (DLT_NULL family word)
pub const LINK_TAG_LEN: usize = 4;

/// IPv4 header length without options
pub const IPV4_HEADER_LEN: usize = 20;

/// UDP header length
pub const UDP_HEADER_LEN: usize = 8;

/// Bytes added in front of every payload
pub const FRAME_OVERHEAD: usize = LINK_TAG_LEN + IPV4_HEADER_LEN + UDP_HEADER_LEN;

/// Maximum synthetic frame size, also used as the capture snaplen
pub const MAX_FRAME_SIZE: usize = 65536;

/// Largest payload that still fits in a frame
pub const MAX_PAYLOAD_SIZE: usize = MAX_FRAME_SIZE - FRAME_OVERHEAD;

/// Address family value carried by the link tag
pub const AF_INET: u32 = 2;

/// Version 4, five 32-bit words of header
pub const IPV4_VERSION_IHL: u8 = 0x45;

/// Fixed identification field of every synthetic datagram
pub const IPV4_IDENTIFICATION: u16 = 0x1a62;

/// Time to live
pub const IPV4_TTL: u8 = 64;

/// IP protocol number for UDP
pub const IPPROTO_UDP: u8 = 17;

/// Default UDP source port
pub const DEFAULT_SRC_PORT: u16 = 55555;

/// Default UDP destination port (the ccnd port)
pub const DEFAULT_DST_PORT: u16 = 4485;

/// Microsecond-resolution pcap magic
pub const PCAP_MAGIC: u32 = 0xa1b2_c3d4;

/// pcap format major version
pub const PCAP_VERSION_MAJOR: u16 = 2;

/// pcap format minor version
pub const PCAP_VERSION_MINOR: u16 = 4;

/// Size of the pcap global header
pub const PCAP_HEADER_LEN: usize = 24;

/// Size of a pcap record header
pub const PCAP_RECORD_HEADER_LEN: usize = 16;
