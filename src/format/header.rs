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

//! Packed header layouts found at the start of a cartridge's (public) data area or ROM header.
//!
//! All multi-byte fields are stored as little-endian byte arrays so the structs have an alignment
//! of 1 and can be viewed directly over any offset of a dump's payload.

use crate::util;
use bytemuck::{Pod, Zeroable};

/// Header holding nothing but a region string.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct SimpleHeader {
    pub region: [u8; 4],
}

impl SimpleHeader {
    pub const SIZE: usize = 4;
}

/// Header with a two character region, an optional two character code prefix and an 8-bit sum.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct BasicHeader {
    pub region: [u8; 2],
    pub code_prefix: [u8; 2],
    pub checksum: u8,
    pub pad: [u8; 3],
}

impl BasicHeader {
    pub const SIZE: usize = 8;

    fn compute_checksum(&self, invert: bool) -> u8 {
        let bytes = bytemuck::bytes_of(self);
        let mask = if invert { 0xFF } else { 0x00 };

        ((util::sum(&bytes[..4]) & 0xFF) as u8) ^ mask
    }

    pub fn update_checksum(&mut self, invert: bool) {
        self.checksum = self.compute_checksum(invert);
    }

    pub fn validate_checksum(&self, invert: bool) -> bool {
        let value = self.compute_checksum(invert);

        if value != self.checksum {
            log::debug!("validate_checksum(): mismatch, exp=0x{:02x}, got=0x{:02x}", value, self.checksum);
            return false;
        }
        true
    }
}

/// Header with a full game code, a year, a region of up to four characters and a 16-bit sum.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ExtendedHeader {
    pub code: [u8; 8],
    /// BCD, may be little endian, big endian or zero depending on the game.
    pub year: [u8; 2],
    pub region: [u8; 4],
    pub checksum: [u8; 2],
}

impl ExtendedHeader {
    pub const SIZE: usize = 16;

    pub fn year(&self) -> u16 {
        u16::from_le_bytes(self.year)
    }

    pub fn set_year(&mut self, value: u16) {
        self.year = value.to_le_bytes();
    }

    pub fn checksum(&self) -> u16 {
        u16::from_le_bytes(self.checksum)
    }

    fn compute_checksum(&self, invert: bool) -> u16 {
        let bytes = bytemuck::bytes_of(self);
        let mask = if invert { 0xFFFF } else { 0x0000 };

        // Seven 16-bit words, everything but the checksum itself.
        ((util::sum_u16_le(&bytes[..14]) & 0xFFFF) as u16) ^ mask
    }

    pub fn update_checksum(&mut self, invert: bool) {
        self.checksum = self.compute_checksum(invert).to_le_bytes();
    }

    pub fn validate_checksum(&self, invert: bool) -> bool {
        let value = self.compute_checksum(invert);

        if value != self.checksum() {
            log::debug!("validate_checksum(): mismatch, exp=0x{:04x}, got=0x{:04x}", value, self.checksum());
            return false;
        }
        true
    }
}
