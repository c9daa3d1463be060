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

//! 8-byte identifiers and the identifier sets embedded in cartridge data.
//!
//! Identifiers come from DS2401 serial number chips or are generated by games during
//! installation. The last byte is always a checksum over the first seven, using either a simple
//! inverted sum or the 1-wire CRC-8 depending on where the identifier came from.

use crate::{crc::ds_crc8, types::DataFlags, util, TraceIdType};
use bytemuck::{Pod, Zeroable};
use std::fmt::{self, Display, Formatter};

pub const IDENTIFIER_LENGTH: usize = 8;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Identifier {
    pub data: [u8; IDENTIFIER_LENGTH],
}

impl From<[u8; IDENTIFIER_LENGTH]> for Identifier {
    fn from(data: [u8; IDENTIFIER_LENGTH]) -> Self {
        Identifier { data }
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", util::hex_string(&self.data, '-'))
    }
}

impl Identifier {
    pub fn clear(&mut self) {
        self.data = [0; IDENTIFIER_LENGTH];
    }

    pub fn copy_from(&mut self, data: &[u8; IDENTIFIER_LENGTH]) {
        self.data = *data;
    }

    /// An identifier is considered empty when all of its bytes sum to zero.
    pub fn is_empty(&self) -> bool {
        util::sum(&self.data) == 0
    }

    fn sum_checksum(&self) -> u8 {
        ((util::sum(&self.data[..7]) & 0xFF) as u8) ^ 0xFF
    }

    pub fn update_checksum(&mut self) {
        self.data[7] = self.sum_checksum();
    }

    pub fn validate_checksum(&self) -> bool {
        let value = self.sum_checksum();
        if value != self.data[7] {
            log::warn!("validate_checksum(): mismatch, exp=0x{:02x}, got=0x{:02x}", value, self.data[7]);
            return false;
        }
        true
    }

    pub fn update_ds_crc(&mut self) {
        self.data[7] = ds_crc8(&self.data[..7]);
    }

    /// Validate the identifier as a 1-wire ROM code. A family code of 0x00 or 0xFF is rejected
    /// before the CRC is checked, as those are what an absent or shorted bus reads back as.
    pub fn validate_ds_crc(&self) -> bool {
        if self.data[0] == 0x00 || self.data[0] == 0xFF {
            log::warn!("validate_ds_crc(): invalid 1-wire prefix 0x{:02x}", self.data[0]);
            return false;
        }

        let value = ds_crc8(&self.data[..7]);
        if value != self.data[7] {
            log::warn!("validate_ds_crc(): mismatch, exp=0x{:02x}, got=0x{:02x}", value, self.data[7]);
            return false;
        }
        true
    }
}

/// The full set of identifiers stored in a cartridge's private data area.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct IdentifierSet {
    /// Generated from the cartridge ID during installation, or an arbitrary value.
    pub trace_id: Identifier,
    /// Copy of the cartridge's DS2401 ID.
    pub cart_id: Identifier,
    /// Prefix byte identifying the game the cartridge was installed for.
    pub install_id: Identifier,
    /// Copy of the DS2401 ID of the system the cartridge was installed on.
    pub system_id: Identifier,
}

impl IdentifierSet {
    pub const SIZE: usize = IDENTIFIER_LENGTH * 4;

    pub fn clear(&mut self) {
        *self = IdentifierSet::default();
    }

    /// Return the set of `HAS_*_ID` flags for the identifiers that are not empty.
    pub fn flags(&self) -> DataFlags {
        let mut flags = DataFlags::empty();

        flags.set(DataFlags::HAS_TRACE_ID, !self.trace_id.is_empty());
        flags.set(DataFlags::HAS_CART_ID, !self.cart_id.is_empty());
        flags.set(DataFlags::HAS_INSTALL_ID, !self.install_id.is_empty());
        flags.set(DataFlags::HAS_SYSTEM_ID, !self.system_id.is_empty());
        flags
    }

    pub fn set_install_id(&mut self, prefix: u8) {
        self.install_id.clear();
        self.install_id.data[0] = prefix;
        self.install_id.update_checksum();
    }

    /// Regenerate the trace ID. For the 0x82 types the trace ID contains a `param`-bit checksum
    /// derived from the 48 serial number bits of `cart_id`, or of this set's own cart ID if `None`.
    pub fn update_trace_id(&mut self, trace_type: TraceIdType, param: u8, cart_id: Option<&Identifier>) {
        let input = cart_id.copied().unwrap_or(self.cart_id);

        self.trace_id.clear();

        match trace_type {
            TraceIdType::None => return,
            TraceIdType::Tid81 => {
                self.trace_id.data[0] = 0x81;
                self.trace_id.data[2] = 5;
                self.trace_id.data[5] = 7;
                self.trace_id.data[6] = 3;
                log::debug!("update_trace_id(): prefix=0x81");
            }
            TraceIdType::Tid82BigEndian | TraceIdType::Tid82LittleEndian => {
                let modulus = param.clamp(1, 16) as usize;
                let mut checksum: u16 = 0;

                for (i, &byte) in input.data[1..7].iter().enumerate() {
                    for bit in 0..8 {
                        if (byte >> bit) & 1 != 0 {
                            checksum ^= 1 << ((i * 8 + bit) % modulus);
                        }
                    }
                }

                self.trace_id.data[0] = 0x82;
                let bytes = match trace_type {
                    TraceIdType::Tid82BigEndian => checksum.to_be_bytes(),
                    _ => checksum.to_le_bytes(),
                };
                self.trace_id.data[1..3].copy_from_slice(&bytes);
                log::debug!("update_trace_id(): prefix=0x82, checksum=0x{:04x}", checksum);
            }
        }

        self.trace_id.update_checksum();
    }
}

/// The subset of identifiers mirrored into a cartridge's public data area.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct PublicIdentifierSet {
    pub install_id: Identifier,
    pub system_id: Identifier,
}

impl PublicIdentifierSet {
    pub const SIZE: usize = IDENTIFIER_LENGTH * 2;

    pub fn clear(&mut self) {
        *self = PublicIdentifierSet::default();
    }

    pub fn flags(&self) -> DataFlags {
        let mut flags = DataFlags::empty();

        flags.set(DataFlags::HAS_INSTALL_ID, !self.install_id.is_empty());
        flags.set(DataFlags::HAS_SYSTEM_ID, !self.system_id.is_empty());
        flags
    }

    pub fn set_install_id(&mut self, prefix: u8) {
        self.install_id.clear();
        self.install_id.data[0] = prefix;
        self.install_id.update_checksum();
    }
}
