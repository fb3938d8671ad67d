//! # Binary Dictionary Codec
//!
//! Length-prefixed, key-sorted encoding used on the peer wire:
//!
//! ```text
//! byte string   <len>:<bytes>        4:spam
//! integer       i<decimal>e          i-42e
//! list          l<values>e           l4:spami7ee
//! dictionary    d<key><value>...e    d3:cow3:moo4:spam4:eggse
//! ```
//!
//! ## Compatibility Contract
//!
//! Dictionary keys are always emitted in ascending byte order, and
//! [`BtDictConsumer`] relies on that order: it is forward-only and finds a key by
//! skipping every entry that sorts before it. Callers must therefore look keys up
//! in ascending order too. Reordering lookups silently breaks parsing.

use bytes::Bytes;
use std::collections::BTreeMap;

use crate::errors::CodecError;

/// An encodable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BtValue {
    /// Byte string.
    Bytes(Bytes),
    /// Signed integer.
    Int(i64),
    /// List of values.
    List(Vec<BtValue>),
    /// Dictionary; `BTreeMap` keeps keys in wire order.
    Dict(BtDict),
}

/// Dictionary with keys held in wire order.
pub type BtDict = BTreeMap<Vec<u8>, BtValue>;

impl From<&str> for BtValue {
    fn from(s: &str) -> Self {
        BtValue::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for BtValue {
    fn from(s: String) -> Self {
        BtValue::Bytes(Bytes::from(s))
    }
}

impl From<&[u8]> for BtValue {
    fn from(b: &[u8]) -> Self {
        BtValue::Bytes(Bytes::copy_from_slice(b))
    }
}

impl From<Bytes> for BtValue {
    fn from(b: Bytes) -> Self {
        BtValue::Bytes(b)
    }
}

impl From<i64> for BtValue {
    fn from(n: i64) -> Self {
        BtValue::Int(n)
    }
}

impl From<i32> for BtValue {
    fn from(n: i32) -> Self {
        BtValue::Int(i64::from(n))
    }
}

impl From<bool> for BtValue {
    fn from(b: bool) -> Self {
        BtValue::Int(i64::from(b))
    }
}

/// Build a dictionary from `(key, value)` pairs. Order of the pairs does not
/// matter; the encoded output is always key-sorted.
pub fn dict<K, V, I>(entries: I) -> BtValue
where
    K: Into<Vec<u8>>,
    V: Into<BtValue>,
    I: IntoIterator<Item = (K, V)>,
{
    BtValue::Dict(
        entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
    )
}

/// Encode a value.
pub fn encode(value: &BtValue) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(value, &mut out);
    out
}

fn encode_into(value: &BtValue, out: &mut Vec<u8>) {
    match value {
        BtValue::Bytes(b) => encode_bytes(b, out),
        BtValue::Int(n) => {
            out.push(b'i');
            out.extend_from_slice(n.to_string().as_bytes());
            out.push(b'e');
        }
        BtValue::List(items) => {
            out.push(b'l');
            for item in items {
                encode_into(item, out);
            }
            out.push(b'e');
        }
        BtValue::Dict(entries) => {
            out.push(b'd');
            for (k, v) in entries {
                encode_bytes(k, out);
                encode_into(v, out);
            }
            out.push(b'e');
        }
    }
}

fn encode_bytes(b: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(b.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(b);
}

// =============================================================================
// LOW-LEVEL SCANNERS
// =============================================================================

fn byte_at(data: &[u8], pos: usize) -> Result<u8, CodecError> {
    data.get(pos).copied().ok_or(CodecError::UnexpectedEof)
}

/// Parse `<len>:<bytes>` at `pos`. Returns the bytes and the offset after them.
fn scan_string(data: &[u8], pos: usize) -> Result<(&[u8], usize), CodecError> {
    let mut cursor = pos;
    let mut len: usize = 0;
    loop {
        let b = byte_at(data, cursor)?;
        match b {
            b'0'..=b'9' => {
                len = len
                    .checked_mul(10)
                    .and_then(|l| l.checked_add(usize::from(b - b'0')))
                    .ok_or(CodecError::Malformed {
                        what: "string length",
                        offset: pos,
                    })?;
                cursor += 1;
            }
            b':' if cursor > pos => break,
            other => {
                return Err(CodecError::UnexpectedByte {
                    found: other as char,
                    offset: cursor,
                })
            }
        }
    }
    let start = cursor + 1;
    let end = start.checked_add(len).ok_or(CodecError::UnexpectedEof)?;
    if end > data.len() {
        return Err(CodecError::UnexpectedEof);
    }
    Ok((&data[start..end], end))
}

/// Parse `i<n>e` at `pos`. Returns the value and the offset after it.
fn scan_integer(data: &[u8], pos: usize) -> Result<(i64, usize), CodecError> {
    let first = byte_at(data, pos)?;
    if first != b'i' {
        return Err(CodecError::WrongType {
            expected: "integer",
        });
    }
    let digits_start = pos + 1;
    let mut cursor = digits_start;
    while byte_at(data, cursor)? != b'e' {
        cursor += 1;
    }
    let text = std::str::from_utf8(&data[digits_start..cursor]).map_err(|_| {
        CodecError::Malformed {
            what: "integer",
            offset: pos,
        }
    })?;
    let digits = text.strip_prefix('-').unwrap_or(text);
    // Canonical form only: no leading zeros and no negative zero.
    let non_canonical = (digits.len() > 1 && digits.starts_with('0')) || text == "-0";
    if digits.is_empty() || non_canonical || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::Malformed {
            what: "integer",
            offset: pos,
        });
    }
    let value = text.parse::<i64>().map_err(|_| CodecError::IntegerOutOfRange {
        value: text.to_string(),
    })?;
    Ok((value, cursor + 1))
}

/// Offset just past the value starting at `pos`. Iterative so adversarial
/// nesting cannot exhaust the stack.
fn scan_value_end(data: &[u8], pos: usize) -> Result<usize, CodecError> {
    let mut cursor = pos;
    let mut depth = 0usize;
    loop {
        match byte_at(data, cursor)? {
            b'l' | b'd' => {
                depth += 1;
                cursor += 1;
            }
            b'e' if depth > 0 => {
                depth -= 1;
                cursor += 1;
            }
            b'i' => cursor = scan_integer(data, cursor)?.1,
            b'0'..=b'9' => cursor = scan_string(data, cursor)?.1,
            other => {
                return Err(CodecError::UnexpectedByte {
                    found: other as char,
                    offset: cursor,
                })
            }
        }
        if depth == 0 {
            return Ok(cursor);
        }
    }
}

fn narrow<T: TryFrom<i64>>(value: i64) -> Result<T, CodecError> {
    T::try_from(value).map_err(|_| CodecError::IntegerOutOfRange {
        value: value.to_string(),
    })
}

// =============================================================================
// DICTIONARY CONSUMER
// =============================================================================

/// Forward-only dictionary reader.
///
/// Borrowed values point into the input buffer; nothing is copied.
#[derive(Debug, Clone)]
pub struct BtDictConsumer<'a> {
    data: &'a [u8],
    pos: usize,
    pending_key: Option<&'a [u8]>,
    last_key: Option<&'a [u8]>,
}

impl<'a> BtDictConsumer<'a> {
    /// Start reading a dictionary. Fails unless the input starts with `d`.
    pub fn new(data: &'a [u8]) -> Result<Self, CodecError> {
        if data.first() != Some(&b'd') {
            return Err(CodecError::WrongType {
                expected: "dictionary",
            });
        }
        Ok(Self {
            data,
            pos: 1,
            pending_key: None,
            last_key: None,
        })
    }

    fn peek_key(&mut self) -> Result<Option<&'a [u8]>, CodecError> {
        if self.pending_key.is_some() {
            return Ok(self.pending_key);
        }
        if byte_at(self.data, self.pos)? == b'e' {
            return Ok(None);
        }
        let (key, next) = scan_string(self.data, self.pos)?;
        self.pos = next;
        self.pending_key = Some(key);
        Ok(self.pending_key)
    }

    fn take_pending(&mut self) -> Result<(), CodecError> {
        match self.peek_key()? {
            Some(key) => {
                self.pending_key = None;
                self.last_key = Some(key);
                Ok(())
            }
            None => Err(CodecError::Exhausted),
        }
    }

    /// True once every entry has been consumed or skipped.
    pub fn is_finished(&mut self) -> Result<bool, CodecError> {
        Ok(self.peek_key()?.is_none())
    }

    /// Key of the entry most recently looked at, for error reporting.
    pub fn key(&self) -> &'a [u8] {
        self.pending_key.or(self.last_key).unwrap_or_default()
    }

    /// Skip entries until `target`. Returns `true` when positioned on `target`;
    /// `false` when the next key sorts after it or the dictionary ended, in which
    /// case that next key is left unconsumed.
    pub fn skip_until(&mut self, target: &str) -> Result<bool, CodecError> {
        let target = target.as_bytes();
        loop {
            match self.peek_key()? {
                None => return Ok(false),
                Some(key) if key < target => self.skip_value()?,
                Some(key) => return Ok(key == target),
            }
        }
    }

    /// Discard the value of the current entry.
    pub fn skip_value(&mut self) -> Result<(), CodecError> {
        self.take_pending()?;
        self.pos = scan_value_end(self.data, self.pos)?;
        Ok(())
    }

    /// Consume the current entry's byte string value.
    pub fn consume_bytes(&mut self) -> Result<&'a [u8], CodecError> {
        self.take_pending()?;
        if !byte_at(self.data, self.pos)?.is_ascii_digit() {
            return Err(CodecError::WrongType {
                expected: "byte string",
            });
        }
        let (value, next) = scan_string(self.data, self.pos)?;
        self.pos = next;
        Ok(value)
    }

    /// Consume the current entry's integer value, range-checked into `T`.
    pub fn consume_integer<T: TryFrom<i64>>(&mut self) -> Result<T, CodecError> {
        self.take_pending()?;
        let (value, next) = scan_integer(self.data, self.pos)?;
        self.pos = next;
        narrow(value)
    }

    /// Consume the current entry's list value.
    pub fn consume_list(&mut self) -> Result<BtListConsumer<'a>, CodecError> {
        self.take_pending()?;
        if byte_at(self.data, self.pos)? != b'l' {
            return Err(CodecError::WrongType { expected: "list" });
        }
        let end = scan_value_end(self.data, self.pos)?;
        let list = BtListConsumer {
            data: &self.data[self.pos..end],
            pos: 1,
        };
        self.pos = end;
        Ok(list)
    }
}

/// Forward-only list reader.
#[derive(Debug, Clone)]
pub struct BtListConsumer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BtListConsumer<'a> {
    /// True once every element has been consumed.
    pub fn is_finished(&self) -> bool {
        self.data.get(self.pos).map_or(true, |b| *b == b'e')
    }

    fn ensure_element(&self) -> Result<(), CodecError> {
        if self.is_finished() {
            Err(CodecError::Exhausted)
        } else {
            Ok(())
        }
    }

    /// Consume the next element as an integer.
    pub fn consume_integer<T: TryFrom<i64>>(&mut self) -> Result<T, CodecError> {
        self.ensure_element()?;
        let (value, next) = scan_integer(self.data, self.pos)?;
        self.pos = next;
        narrow(value)
    }

    /// Consume the next element as a byte string.
    pub fn consume_bytes(&mut self) -> Result<&'a [u8], CodecError> {
        self.ensure_element()?;
        let (value, next) = scan_string(self.data, self.pos)?;
        self.pos = next;
        Ok(value)
    }
}
