//! ccnb token headers and an element writer
//!
//! A token header is a big-endian base-128 number. Every byte but the last has
//! the high bit clear; the last byte is laid out as `1vvvvttt`, carrying the
//! low four bits of the value and the three-bit [`TokenType`].

use crate::constants::{TokenType, CLOSE, MAX_TINY, TT_BITS, TT_HBIT};
use bytes::{BufMut, Bytes, BytesMut};

/// Longest header a `usize` value can need
pub const MAX_HEADER_LEN: usize = 12;

/// A decoded token header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenHeader {
    /// Token type
    pub token_type: TokenType,
    /// Numeric value (length, tag number, ...)
    pub value: usize,
    /// Bytes occupied by the header itself
    pub header_len: usize,
}

/// Why a token header could not be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    /// Input ended before the final header byte
    Truncated,
    /// Value does not fit in `usize`
    Overflow,
    /// Type bits name no token type
    BadType(u8),
}

/// Read the token header at the start of `data`
///
/// `data` must not start with [`CLOSE`]; callers check for it first.
pub fn read_token_header(data: &[u8]) -> Result<TokenHeader, HeaderError> {
    let mut value: usize = 0;
    for (i, &c) in data.iter().enumerate() {
        if c & TT_HBIT == 0 {
            if value > (usize::MAX >> 7) {
                return Err(HeaderError::Overflow);
            }
            value = (value << 7) | c as usize;
            continue;
        }

        if value > (usize::MAX >> (7 - TT_BITS)) {
            return Err(HeaderError::Overflow);
        }
        value = (value << (7 - TT_BITS)) | ((c >> TT_BITS) & MAX_TINY) as usize;
        let token_type = TokenType::from_bits(c).ok_or(HeaderError::BadType(c))?;
        return Ok(TokenHeader {
            token_type,
            value,
            header_len: i + 1,
        });
    }
    Err(HeaderError::Truncated)
}

/// Append the header for a token of type `token_type` carrying `value`
pub fn put_token_header<B: BufMut>(buf: &mut B, token_type: TokenType, value: usize) {
    let mut tmp = [0u8; MAX_HEADER_LEN];
    let mut n = tmp.len() - 1;
    tmp[n] = TT_HBIT | (((value & MAX_TINY as usize) as u8) << TT_BITS) | token_type as u8;

    let mut rest = value >> (7 - TT_BITS);
    while rest != 0 {
        n -= 1;
        tmp[n] = (rest & 0x7f) as u8;
        rest >>= 7;
    }
    buf.put_slice(&tmp[n..]);
}

/// Incremental writer for ccnb elements
///
/// The writer does not check nesting; [`CcnbWriter::finish`] returns whatever
/// has been written.
#[derive(Debug, Default)]
pub struct CcnbWriter {
    buf: BytesMut,
}

impl CcnbWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an element by dictionary tag
    pub fn open_dtag(&mut self, tag: u64) -> &mut Self {
        put_token_header(&mut self.buf, TokenType::DTag, tag as usize);
        self
    }

    /// Open an element with an inline tag name
    pub fn open_tag(&mut self, name: &str) -> &mut Self {
        debug_assert!(!name.is_empty());
        put_token_header(&mut self.buf, TokenType::Tag, name.len() - 1);
        self.buf.put_slice(name.as_bytes());
        self
    }

    /// Add an inline-named attribute; must directly follow an open
    pub fn attr(&mut self, name: &str, value: &str) -> &mut Self {
        debug_assert!(!name.is_empty());
        put_token_header(&mut self.buf, TokenType::Attr, name.len() - 1);
        self.buf.put_slice(name.as_bytes());
        self.udata(value)
    }

    /// Add opaque data
    pub fn blob(&mut self, data: &[u8]) -> &mut Self {
        put_token_header(&mut self.buf, TokenType::Blob, data.len());
        self.buf.put_slice(data);
        self
    }

    /// Add character data
    pub fn udata(&mut self, text: &str) -> &mut Self {
        put_token_header(&mut self.buf, TokenType::UData, text.len());
        self.buf.put_slice(text.as_bytes());
        self
    }

    /// Close the innermost open element
    pub fn close(&mut self) -> &mut Self {
        self.buf.put_u8(CLOSE);
        self
    }

    /// Write `<tag>blob</tag>`
    pub fn tagged_blob(&mut self, tag: u64, data: &[u8]) -> &mut Self {
        self.open_dtag(tag).blob(data).close()
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Take the encoded bytes
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Encode a minimal signed ContentObject
///
/// The signature bits, publisher digest and timestamp are fixed filler; the
/// result is structurally valid but not verifiable.
pub fn content_object(components: &[&[u8]], content: &[u8]) -> Bytes {
    use crate::constants::dtag;

    let mut w = CcnbWriter::new();
    w.open_dtag(dtag::CONTENT_OBJECT);

    w.open_dtag(dtag::SIGNATURE)
        .tagged_blob(dtag::SIGNATURE_BITS, &[0x5a; 16])
        .close();

    w.open_dtag(dtag::NAME);
    for component in components {
        w.tagged_blob(dtag::COMPONENT, component);
    }
    w.close();

    w.open_dtag(dtag::SIGNED_INFO)
        .tagged_blob(dtag::PUBLISHER_PUBLIC_KEY_DIGEST, &[0xa5; 32])
        .tagged_blob(dtag::TIMESTAMP, &[0x04, 0xd2, 0x00, 0x00, 0x00, 0x00])
        .close();

    w.open_dtag(dtag::CONTENT);
    if !content.is_empty() {
        w.blob(content);
    }
    w.close();

    w.close();
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_small_value_single_byte() {
        let mut buf = Vec::new();
        put_token_header(&mut buf, TokenType::DTag, 14);
        assert_eq!(buf, [0x80 | (14 << 3) | 2]);
    }

    #[test]
    fn test_content_object_dtag_header() {
        // 64 = 0b100_0000: continuation byte 4, final nibble 0
        let mut buf = Vec::new();
        put_token_header(&mut buf, TokenType::DTag, 64);
        assert_eq!(buf, [0x04, 0x82]);

        let header = read_token_header(&buf).unwrap();
        assert_eq!(header.token_type, TokenType::DTag);
        assert_eq!(header.value, 64);
        assert_eq!(header.header_len, 2);
    }

    #[test]
    fn test_large_blob_length() {
        let mut buf = Vec::new();
        put_token_header(&mut buf, TokenType::Blob, 70_000);
        let header = read_token_header(&buf).unwrap();
        assert_eq!(header.value, 70_000);
        assert_eq!(header.header_len, buf.len());
    }

    #[test]
    fn test_truncated_header() {
        assert_eq!(read_token_header(&[0x04]), Err(HeaderError::Truncated));
        assert_eq!(read_token_header(&[]), Err(HeaderError::Truncated));
    }

    #[test]
    fn test_bad_type() {
        assert_eq!(read_token_header(&[0x87]), Err(HeaderError::BadType(0x87)));
    }

    #[test]
    fn test_overflow() {
        let data = [0x7f; 12];
        let mut with_final = data.to_vec();
        with_final.push(0x85);
        assert_eq!(read_token_header(&with_final), Err(HeaderError::Overflow));
    }

    #[test]
    fn test_writer_tag_and_attr() {
        let mut w = CcnbWriter::new();
        w.open_tag("doc").attr("id", "7").udata("hi").close();
        let bytes = w.finish();

        // TAG header (len-1 = 2) followed by the name
        assert_eq!(bytes[0], 0x80 | (2 << 3) | 1);
        assert_eq!(&bytes[1..4], b"doc");
        assert_eq!(*bytes.last().unwrap(), CLOSE);
    }
}
