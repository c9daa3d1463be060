/*
    cart573

    Copyright 2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------
*/

//! # cart573
//!
//! cart573 is a library crate for reading, writing and identifying the security cartridges used by
//! a family of arcade systems. Three incompatible security chip families are supported:
//!
//! * X76F041 - 512 byte secure EEPROM with a configuration key
//! * X76F100 - 112 byte secure EEPROM with separate read and write keys
//! * ZS01    - 112 byte microcontroller-based chip speaking a scrambled packet protocol
//!
//! A [`driver::Driver`] populates a [`dump::CartDump`] over a user supplied
//! [`transport::CartTransport`]. The dump's payload can then be interpreted by a
//! [`format::CartParser`], either with a known format or by autodetection, and identified using a
//! [`database::Db`] of known cartridges.

pub mod crc;
pub mod database;
pub mod driver;
pub mod dump;
pub mod format;
pub mod identifier;
pub mod prelude;
pub mod transport;
pub mod types;
pub mod util;
pub mod zs01;

use thiserror::Error;

pub use crate::types::{ChipType, DataFlags, DumpFlags, FormatType, TraceIdType};

/// Length of a cartridge data key, in bytes.
pub const KEY_LENGTH: usize = 8;
/// Length of a chip configuration block, in bytes.
pub const CONFIG_LENGTH: usize = 8;
/// Maximum size of the compressed dump embedded in a QR string.
pub const MAX_QR_STRING_LENGTH: usize = 0x600;

/// Length of a full game code such as `GE936`.
pub const CODE_LENGTH: usize = 5;
/// Length of the two letter prefix of a game code.
pub const CODE_PREFIX_LENGTH: usize = 2;
pub const REGION_MIN_LENGTH: usize = 2;
pub const REGION_MAX_LENGTH: usize = 5;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("An IO error occurred reading or writing dump data: {0}")]
    IoError(String),
    #[error("The dump magic number is invalid")]
    InvalidMagic,
    #[error("The dump specifies an invalid chip type: {0}")]
    InvalidChipType(u8),
    #[error("The dump data is truncated")]
    Truncated,
    #[error("The compressed dump does not fit in a QR string")]
    QrStringTooLong,
    #[error("The QR string is malformed")]
    InvalidQrString,
    #[error("A compression error occurred: {0}")]
    CompressionError(String),
}

impl From<std::io::Error> for CartError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => CartError::Truncated,
            _ => CartError::IoError(err.to_string()),
        }
    }
}

impl From<binrw::Error> for CartError {
    fn from(err: binrw::Error) -> Self {
        // Field errors are wrapped in backtraces; classify by what actually went wrong.
        match err.root_cause() {
            binrw::Error::BadMagic { .. } => CartError::InvalidMagic,
            binrw::Error::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => CartError::Truncated,
            _ => CartError::IoError(err.to_string()),
        }
    }
}
