//! # ccnbpcap Core
//!
//! Turns a buffer of concatenated ccnb records into pcap records, each record
//! wrapped in synthetic loopback IPv4/UDP headers.
//!
//! ## Modules
//!
//! - `constants`: ccnb token grammar, dictionary tags, frame and pcap layout
//! - `ccnb`: Token headers and an element writer
//! - `skeleton`: Resumable skeleton decoder
//! - `scanner`: Splitting a buffer into top-level records
//! - `content`: ContentObject parsing and content extraction
//! - `frame`: Synthetic link/IPv4/UDP frame encoding
//! - `capture`: pcap stream writer (std only)
//! - `driver`: Per-buffer dispatch loop (std only)

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod ccnb;
pub mod constants;
pub mod content;
pub mod error;
pub mod frame;
pub mod scanner;
pub mod skeleton;

#[cfg(feature = "std")]
pub mod capture;
#[cfg(feature = "std")]
pub mod driver;

// Re-export commonly used types
pub use error::{Error, FailureKind};
pub use frame::{encode_frame, FrameConfig};
pub use scanner::{split_records, LocatedRecord};
pub use skeleton::{decode, DecodeStatus, DecoderState};

#[cfg(feature = "std")]
pub use capture::{CaptureWriter, Linktype};
#[cfg(feature = "std")]
pub use driver::{process_buffer, BufferStats, DriverConfig, PayloadMode};

/// Result type alias for ccnbpcap operations
pub type Result<T> = core::result::Result<T, Error>;
