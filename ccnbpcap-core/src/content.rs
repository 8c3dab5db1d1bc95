//! ContentObject parsing
//!
//! Locates the parts of a ContentObject record and, most importantly, the
//! opaque value carried in its `Content` element. Every range returned points
//! into the record that was parsed; nothing is copied.

use crate::ccnb::{read_token_header, HeaderError, TokenHeader};
use crate::constants::{dtag, TokenType, CLOSE};
use crate::skeleton::{decode, DecoderState};
use alloc::vec::Vec;
use core::ops::Range;

#[cfg(feature = "logging")]
use tracing::trace;

/// Why a record could not be read as a ContentObject
#[cfg_attr(feature = "std", derive(thiserror::Error))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// The record's top-level element is something else
    #[cfg_attr(feature = "std", error("record is not a ContentObject"))]
    NotContentObject,

    /// A required element is absent
    #[cfg_attr(feature = "std", error("missing required element {0}"))]
    MissingElement(&'static str),

    /// A token could not be read at the given offset
    #[cfg_attr(feature = "std", error("malformed token at offset {at}"))]
    Malformed {
        /// Offset within the record
        at: usize,
    },

    /// Bytes follow the closed ContentObject
    #[cfg_attr(feature = "std", error("unexpected data after ContentObject at offset {at}"))]
    TrailingData {
        /// Offset within the record
        at: usize,
    },
}

/// Located parts of a ContentObject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedContentObject {
    /// The `Signature` element
    pub signature: Range<usize>,
    /// The `Name` element
    pub name: Range<usize>,
    /// Value of each name `Component`
    pub components: Vec<Range<usize>>,
    /// The `SignedInfo` element
    pub signed_info: Range<usize>,
    /// The `Content` element
    pub content: Range<usize>,
    /// The opaque value inside `Content`, possibly empty
    pub value: Range<usize>,
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn malformed(&self) -> ContentError {
        ContentError::Malformed { at: self.pos }
    }

    fn at_close(&self) -> bool {
        self.buf.get(self.pos) == Some(&CLOSE)
    }

    fn peek(&self) -> Result<Option<TokenHeader>, ContentError> {
        if self.pos >= self.buf.len() || self.at_close() {
            return Ok(None);
        }
        read_token_header(&self.buf[self.pos..])
            .map(Some)
            .map_err(|_: HeaderError| self.malformed())
    }

    fn peek_dtag(&self, tag: u64) -> Result<bool, ContentError> {
        Ok(matches!(
            self.peek()?,
            Some(TokenHeader { token_type: TokenType::DTag, value, .. }) if value as u64 == tag
        ))
    }

    fn advance(&mut self, n: usize) -> Result<(), ContentError> {
        let end = self.pos.checked_add(n).ok_or_else(|| self.malformed())?;
        if end > self.buf.len() {
            return Err(self.malformed());
        }
        self.pos = end;
        Ok(())
    }

    /// Consume the start of a `tag` element and any attributes; returns its offset
    fn open(&mut self, tag: u64, name: &'static str) -> Result<usize, ContentError> {
        if !self.peek_dtag(tag)? {
            return Err(ContentError::MissingElement(name));
        }
        let start = self.pos;
        if let Some(header) = self.peek()? {
            self.advance(header.header_len)?;
        }
        self.skip_attributes()?;
        Ok(start)
    }

    fn skip_attributes(&mut self) -> Result<(), ContentError> {
        while let Some(header) = self.peek()? {
            let name_len = match header.token_type {
                TokenType::Attr => header.value.checked_add(1).ok_or_else(|| self.malformed())?,
                TokenType::DAttr => 0,
                _ => break,
            };
            self.advance(header.header_len)?;
            self.advance(name_len)?;
            match self.peek()? {
                Some(TokenHeader {
                    token_type: TokenType::UData,
                    value,
                    header_len,
                }) => {
                    self.advance(header_len)?;
                    self.advance(value)?;
                }
                _ => return Err(self.malformed()),
            }
        }
        Ok(())
    }

    /// Consume a close; returns the offset just past it
    fn close(&mut self) -> Result<usize, ContentError> {
        if !self.at_close() {
            return Err(self.malformed());
        }
        self.pos += 1;
        Ok(self.pos)
    }

    /// Consume an optional BLOB or UDATA; returns its value range
    fn data(&mut self) -> Result<Range<usize>, ContentError> {
        match self.peek()? {
            Some(TokenHeader {
                token_type: TokenType::Blob | TokenType::UData,
                value,
                header_len,
            }) => {
                self.advance(header_len)?;
                let start = self.pos;
                self.advance(value)?;
                Ok(start..self.pos)
            }
            _ => Ok(self.pos..self.pos),
        }
    }

    /// Consume an optional BLOB; returns its value range
    fn blob(&mut self) -> Result<Range<usize>, ContentError> {
        match self.peek()? {
            Some(TokenHeader {
                token_type: TokenType::Blob,
                ..
            }) => self.data(),
            _ => Ok(self.pos..self.pos),
        }
    }

    /// Skip one complete element of any content
    fn skip_element(&mut self) -> Result<Range<usize>, ContentError> {
        let start = self.pos;
        let (consumed, state) = decode(DecoderState::new(), &self.buf[start..]);
        if consumed == 0 || !state.is_final() {
            return Err(ContentError::Malformed {
                at: start + state.token_start(),
            });
        }
        self.pos += consumed;
        Ok(start..self.pos)
    }

    fn required(&mut self, tag: u64, name: &'static str) -> Result<Range<usize>, ContentError> {
        if !self.peek_dtag(tag)? {
            return Err(ContentError::MissingElement(name));
        }
        self.skip_element()
    }

    fn optional(&mut self, tag: u64) -> Result<Option<Range<usize>>, ContentError> {
        if self.peek_dtag(tag)? {
            self.skip_element().map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Parse `record` as a ContentObject
pub fn parse_content_object(record: &[u8]) -> Result<ParsedContentObject, ContentError> {
    let mut cursor = Cursor::new(record);

    if !cursor.peek_dtag(dtag::CONTENT_OBJECT)? {
        return Err(ContentError::NotContentObject);
    }
    cursor.open(dtag::CONTENT_OBJECT, "ContentObject")?;

    let sig_start = cursor.open(dtag::SIGNATURE, "Signature")?;
    cursor.optional(dtag::DIGEST_ALGORITHM)?;
    cursor.optional(dtag::WITNESS)?;
    cursor.required(dtag::SIGNATURE_BITS, "SignatureBits")?;
    let signature = sig_start..cursor.close()?;

    let name_start = cursor.open(dtag::NAME, "Name")?;
    let mut components = Vec::new();
    while cursor.peek_dtag(dtag::COMPONENT)? {
        cursor.open(dtag::COMPONENT, "Component")?;
        components.push(cursor.data()?);
        cursor.close()?;
    }
    let name = name_start..cursor.close()?;

    let si_start = cursor.open(dtag::SIGNED_INFO, "SignedInfo")?;
    cursor.required(dtag::PUBLISHER_PUBLIC_KEY_DIGEST, "PublisherPublicKeyDigest")?;
    cursor.required(dtag::TIMESTAMP, "Timestamp")?;
    cursor.optional(dtag::TYPE)?;
    cursor.optional(dtag::FRESHNESS_SECONDS)?;
    cursor.optional(dtag::FINAL_BLOCK_ID)?;
    cursor.optional(dtag::KEY_LOCATOR)?;
    let signed_info = si_start..cursor.close()?;

    let content_start = cursor.open(dtag::CONTENT, "Content")?;
    let value = cursor.blob()?;
    let content = content_start..cursor.close()?;

    cursor.close()?;
    if cursor.pos != record.len() {
        return Err(ContentError::TrailingData { at: cursor.pos });
    }

    #[cfg(feature = "logging")]
    trace!(
        "ContentObject: {} name components, {} content bytes at {}",
        components.len(),
        value.len(),
        value.start
    );

    Ok(ParsedContentObject {
        signature,
        name,
        components,
        signed_info,
        content,
        value,
    })
}

/// Locate the content value of a ContentObject record
pub fn extract_content(record: &[u8]) -> Result<Range<usize>, ContentError> {
    parse_content_object(record).map(|parsed| parsed.value)
}

/// Top-level element of a record, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Dictionary-tagged element
    DTag(u64),
    /// Element with an inline tag name
    Tag,
    /// Not an element start
    Unknown,
}

impl RecordKind {
    /// Classify a record by its first token
    pub fn of(record: &[u8]) -> Self {
        if record.first() == Some(&CLOSE) {
            return RecordKind::Unknown;
        }
        match read_token_header(record) {
            Ok(TokenHeader {
                token_type: TokenType::DTag,
                value,
                ..
            }) => RecordKind::DTag(value as u64),
            Ok(TokenHeader {
                token_type: TokenType::Tag,
                ..
            }) => RecordKind::Tag,
            _ => RecordKind::Unknown,
        }
    }

    /// Whether this is a ContentObject
    pub fn is_content_object(&self) -> bool {
        *self == RecordKind::DTag(dtag::CONTENT_OBJECT)
    }
}

impl core::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RecordKind::DTag(tag) => match dtag::name(*tag) {
                Some(name) => f.write_str(name),
                None => write!(f, "dtag {}", tag),
            },
            RecordKind::Tag => f.write_str("tag"),
            RecordKind::Unknown => f.write_str("unknown"),
        }
    }
}
