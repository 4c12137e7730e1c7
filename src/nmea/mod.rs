//! NMEA 0183 sentence grammar.
//!
//! A sentence looks like
//!
//!  `$TTSSS,f1,f2,...,fn*hh<CR><LF>`
//!
//!  where:
//!
//!  • `$` or `!`: start delimiter
//!
//!  • TT: talker id (absent in proprietary sentences starting with `P`)
//!
//!  • SSS: sentence id, always the last three characters of the address
//!
//!  • f1..fn: comma separated fields, any of them may be empty
//!
//!  • hh: optional checksum, XOR of all bytes between the delimiter and `*`
use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

pub mod sentences;
pub mod types;

/// Error type for the sentence grammar
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("sentence does not start with '$' or '!'")]
    MissingDelimiter,
    #[error("address field '{0}' is too short")]
    InvalidAddress(String),
    #[error("checksum mismatch: expected {expected:02X}, computed {computed:02X}")]
    Checksum { expected: u8, computed: u8 },
    #[error("malformed checksum '{0}'")]
    MalformedChecksum(String),
    #[error("field {0} is missing")]
    MissingField(usize),
    #[error("field {index} has invalid value '{value}'")]
    InvalidField { index: usize, value: String },
    #[error("data marked invalid by the talker")]
    DataInvalid,
}

/// One syntactically valid sentence, split into address and fields.
///
/// Fields are numbered the way the NMEA standard numbers them: field 1 is the
/// first one after the address.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    /// Talker id, empty for proprietary sentences
    pub talker: String,
    /// Three letter sentence id
    pub id: String,
    fields: Vec<String>,
}

impl Sentence {
    /// Parses and checksum-verifies one sentence
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim_end_matches(&['\r', '\n'][..]).trim();
        let body = line
            .strip_prefix('$')
            .or_else(|| line.strip_prefix('!'))
            .ok_or(ParseError::MissingDelimiter)?;

        let body = match body.split_once('*') {
            Some((data, checksum)) => {
                let expected = u8::from_str_radix(checksum.trim(), 16)
                    .map_err(|_| ParseError::MalformedChecksum(checksum.to_string()))?;
                let computed = checksum_of(data);
                if expected != computed {
                    return Err(ParseError::Checksum { expected, computed });
                }
                data
            }
            None => body,
        };

        let mut parts = body.split(',');
        let address = parts.next().unwrap_or_default();
        if address.len() < 3 || !address.is_ascii() {
            return Err(ParseError::InvalidAddress(address.to_string()));
        }
        let (talker, id) = if address.starts_with('P') || address.len() < 5 {
            ("", &address[address.len() - 3..])
        } else {
            (&address[..2], &address[address.len() - 3..])
        };

        Ok(Sentence {
            talker: talker.to_string(),
            id: id.to_string(),
            fields: parts.map(str::to_string).collect(),
        })
    }

    /// Number of fields after the address
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Raw text of field `index`, empty when the field is missing
    pub fn field(&self, index: usize) -> &str {
        index
            .checked_sub(1)
            .and_then(|i| self.fields.get(i))
            .map(|s| s.trim())
            .unwrap_or("")
    }

    /// Field `index` as a finite number, `None` when empty
    pub fn f64(&self, index: usize) -> Result<Option<f64>, ParseError> {
        let raw = self.field(index);
        if raw.is_empty() {
            return Ok(None);
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            Ok(_) => Err(self.invalid(index, ())),
            Err(e) => Err(self.invalid::<ParseFloatError>(index, e)),
        }
    }

    /// Field `index` as a number that must be present
    pub fn require_f64(&self, index: usize) -> Result<f64, ParseError> {
        self.f64(index)?.ok_or(ParseError::MissingField(index))
    }

    /// Field `index` as an integer, `None` when empty
    pub fn i64(&self, index: usize) -> Result<Option<i64>, ParseError> {
        let raw = self.field(index);
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<i64>()
            .map(Some)
            .map_err(|e: ParseIntError| self.invalid(index, e))
    }

    /// First character of field `index`
    pub fn char(&self, index: usize) -> Option<char> {
        self.field(index).chars().next()
    }

    fn invalid<E>(&self, index: usize, _err: E) -> ParseError {
        ParseError::InvalidField {
            index,
            value: self.field(index).to_string(),
        }
    }
}

/// XOR checksum of the bytes between the delimiter and `*`
pub fn checksum_of(data: &str) -> u8 {
    data.bytes().fold(0, |acc, b| acc ^ b)
}
