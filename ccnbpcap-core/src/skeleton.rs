//! Resumable skeleton decoder for ccnb
//!
//! The decoder knows only the token grammar, not the schema of any record
//! kind. It is enough to find where one top-level element ends and the next
//! begins. State is an explicit value: a fresh [`DecoderState`] goes in, the
//! advanced state comes back out, and the caller decides what to do with it.

use crate::constants::{TokenType, CLOSE, MAX_TINY, TT_BITS, TT_HBIT};

/// Why a record failed to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeErrorCode {
    /// A numeric value does not fit in `usize`
    Overflow,
    /// Attribute outside a start tag, or without a value
    Attribute,
    /// Invalid token type, or a non-element token at top level
    Coding,
    /// Close without a matching open
    Nesting,
}

impl DecodeErrorCode {
    /// Numeric code reported in diagnostics
    pub const fn code(&self) -> i32 {
        match self {
            DecodeErrorCode::Overflow => -1,
            DecodeErrorCode::Attribute => -2,
            DecodeErrorCode::Coding => -3,
            DecodeErrorCode::Nesting => -4,
        }
    }
}

impl core::fmt::Display for DecodeErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            DecodeErrorCode::Overflow => "overflow",
            DecodeErrorCode::Attribute => "attribute",
            DecodeErrorCode::Coding => "coding",
            DecodeErrorCode::Nesting => "nesting",
        };
        write!(f, "{} ({})", self.code(), name)
    }
}

/// Outcome of a decode attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// More input is needed to finish the record
    Running,
    /// Nothing started, or the record is fully closed
    Done,
    /// The record is malformed
    Error(DecodeErrorCode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Initial,
    NewToken,
    NumVal,
    Skip(usize),
    Closed,
    Failed(DecodeErrorCode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrState {
    None,
    StartTag,
    AwaitValue,
}

/// Decoder progress through one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderState {
    phase: Phase,
    attr: AttrState,
    depth: usize,
    numval: usize,
    index: usize,
    token_start: usize,
}

impl Default for DecoderState {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderState {
    /// State for a record that has not started
    pub const fn new() -> Self {
        Self {
            phase: Phase::Initial,
            attr: AttrState::None,
            depth: 0,
            numval: 0,
            index: 0,
            token_start: 0,
        }
    }

    /// Current status
    pub fn status(&self) -> DecodeStatus {
        match self.phase {
            Phase::Initial | Phase::Closed => DecodeStatus::Done,
            Phase::Failed(code) => DecodeStatus::Error(code),
            Phase::NewToken | Phase::NumVal | Phase::Skip(_) => DecodeStatus::Running,
        }
    }

    /// Whether the record reached a fully closed state
    pub fn is_final(&self) -> bool {
        self.status() == DecodeStatus::Done
    }

    /// Current element nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Bytes consumed across all calls on this state
    pub fn index(&self) -> usize {
        self.index
    }

    /// Offset (relative to the record start) of the token being decoded
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    fn fail(&mut self, code: DecodeErrorCode) {
        self.phase = Phase::Failed(code);
    }

    fn skip(&mut self, n: usize) {
        self.phase = if n == 0 { Phase::NewToken } else { Phase::Skip(n) };
    }

    fn close(&mut self) {
        if self.attr == AttrState::AwaitValue {
            return self.fail(DecodeErrorCode::Attribute);
        }
        if self.depth == 0 {
            return self.fail(DecodeErrorCode::Nesting);
        }
        self.depth -= 1;
        self.attr = AttrState::None;
        self.phase = if self.depth == 0 {
            Phase::Closed
        } else {
            Phase::NewToken
        };
    }

    fn header_byte(&mut self, c: u8) {
        if c & TT_HBIT == 0 {
            if self.numval > (usize::MAX >> 7) {
                return self.fail(DecodeErrorCode::Overflow);
            }
            self.numval = (self.numval << 7) | c as usize;
            return;
        }

        if self.numval > (usize::MAX >> (7 - TT_BITS)) {
            return self.fail(DecodeErrorCode::Overflow);
        }
        self.numval = (self.numval << (7 - TT_BITS)) | ((c >> TT_BITS) & MAX_TINY) as usize;
        match TokenType::from_bits(c) {
            Some(token_type) => self.token(token_type),
            None => self.fail(DecodeErrorCode::Coding),
        }
    }

    fn token(&mut self, token_type: TokenType) {
        let value = self.numval;

        if self.depth == 0 && !token_type.opens_element() {
            return self.fail(DecodeErrorCode::Coding);
        }
        if self.attr == AttrState::AwaitValue && token_type != TokenType::UData {
            return self.fail(DecodeErrorCode::Attribute);
        }

        match token_type {
            TokenType::Ext => {
                self.attr = AttrState::None;
                self.phase = Phase::NewToken;
            }
            TokenType::Tag | TokenType::DTag => {
                self.depth += 1;
                self.attr = AttrState::StartTag;
                if token_type == TokenType::Tag {
                    match value.checked_add(1) {
                        Some(n) => self.skip(n),
                        None => self.fail(DecodeErrorCode::Overflow),
                    }
                } else {
                    self.phase = Phase::NewToken;
                }
            }
            TokenType::Attr | TokenType::DAttr => {
                if self.attr != AttrState::StartTag {
                    return self.fail(DecodeErrorCode::Attribute);
                }
                self.attr = AttrState::AwaitValue;
                if token_type == TokenType::Attr {
                    match value.checked_add(1) {
                        Some(n) => self.skip(n),
                        None => self.fail(DecodeErrorCode::Overflow),
                    }
                } else {
                    self.phase = Phase::NewToken;
                }
            }
            TokenType::Blob => {
                self.attr = AttrState::None;
                self.skip(value);
            }
            TokenType::UData => {
                self.attr = if self.attr == AttrState::AwaitValue {
                    AttrState::StartTag
                } else {
                    AttrState::None
                };
                self.skip(value);
            }
        }
    }
}

/// Advance `state` over `input`
///
/// Decoding stops at the first of: the record closing at depth zero, an
/// error, or the end of `input`. Returns the bytes consumed by this call and
/// the advanced state. A state that is already closed or failed consumes
/// nothing.
pub fn decode(mut state: DecoderState, input: &[u8]) -> (usize, DecoderState) {
    let mut i = 0;

    while i < input.len() {
        match state.phase {
            Phase::Closed | Phase::Failed(_) => break,
            Phase::Skip(remaining) => {
                let chunk = remaining.min(input.len() - i);
                i += chunk;
                state.skip(remaining - chunk);
            }
            Phase::Initial | Phase::NewToken => {
                state.token_start = state.index + i;
                let c = input[i];
                i += 1;
                if c == CLOSE {
                    state.close();
                } else {
                    state.numval = 0;
                    state.phase = Phase::NumVal;
                    state.header_byte(c);
                }
            }
            Phase::NumVal => {
                let c = input[i];
                i += 1;
                state.header_byte(c);
            }
        }
    }

    state.index += i;
    (i, state)
}
