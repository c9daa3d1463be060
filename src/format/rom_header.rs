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

//! The extended header stored at the start of a game's flash or PCMCIA card image.
//!
//! It shares the extended cartridge header layout and may be followed by an 8-byte signature tying
//! the header to the system it was installed on.

use crate::{
    dump::RomHeaderDump,
    format::{
        extended::{header_code, set_header_code, update_header_checksum, validate_header_checksum},
        header::ExtendedHeader,
        DataParser,
    },
    types::{DataFlags, FormatType},
    util,
};

pub const SIGNATURE_LENGTH: usize = 8;

const SIGNATURE_OFFSET: usize = ExtendedHeader::SIZE;

/// Mixed into the signature alongside the system ID and the header. Identical across all games.
const SIGNATURE_SALT: [u8; 8] = [0xC1, 0xA2, 0x03, 0xD6, 0xAB, 0x70, 0x85, 0x5E];

pub struct ExtendedRomHeaderParser<'a> {
    dump: &'a mut RomHeaderDump,
    flags: DataFlags,
}

impl<'a> ExtendedRomHeaderParser<'a> {
    pub fn new(dump: &'a mut RomHeaderDump, flags: DataFlags) -> Self {
        ExtendedRomHeaderParser {
            dump,
            flags: flags | DataFlags::HAS_CODE_PREFIX,
        }
    }

    pub fn header(&self) -> &ExtendedHeader {
        bytemuck::from_bytes(&self.dump.data[..ExtendedHeader::SIZE])
    }

    pub fn header_mut(&mut self) -> &mut ExtendedHeader {
        bytemuck::from_bytes_mut(&mut self.dump.data[..ExtendedHeader::SIZE])
    }

    pub fn signature(&self) -> &[u8] {
        &self.dump.data[SIGNATURE_OFFSET..SIGNATURE_OFFSET + SIGNATURE_LENGTH]
    }

    /// Compute the signature of the header for the dump's system ID: an MD5 digest folded in half.
    pub fn calculate_signature(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut context = md5::Context::new();

        context.consume(self.dump.system_id.data);
        context.consume(bytemuck::bytes_of(self.header()));
        context.consume(SIGNATURE_SALT);

        let digest = context.compute();
        let mut signature = [0; SIGNATURE_LENGTH];

        for (i, byte) in signature.iter_mut().enumerate() {
            *byte = digest[i] ^ digest[i + SIGNATURE_LENGTH];
        }
        signature
    }
}

impl DataParser for ExtendedRomHeaderParser<'_> {
    fn format_type(&self) -> FormatType {
        FormatType::Extended
    }

    fn flags(&self) -> DataFlags {
        self.flags
    }

    fn code(&self) -> Option<String> {
        Some(header_code(self.header(), self.flags))
    }

    fn set_code(&mut self, code: &str) {
        let flags = self.flags;
        set_header_code(self.header_mut(), code, flags);
    }

    fn region(&self) -> String {
        util::c_str(&self.header().region)
    }

    fn set_region(&mut self, region: &str) {
        util::copy_c_str(&mut self.header_mut().region, region.as_bytes());
    }

    fn year(&self) -> Option<u16> {
        Some(self.header().year())
    }

    fn set_year(&mut self, year: u16) {
        self.header_mut().set_year(year);
    }

    fn flush(&mut self) {
        let flags = self.flags;
        update_header_checksum(self.header_mut(), flags);

        if flags.contains(DataFlags::HAS_SYSTEM_ID) {
            let signature = self.calculate_signature();
            self.dump.data[SIGNATURE_OFFSET..SIGNATURE_OFFSET + SIGNATURE_LENGTH].copy_from_slice(&signature);
        }
    }

    fn validate(&self) -> bool {
        if !crate::format::validate_region(&self.region()) || !validate_header_checksum(self.header(), self.flags) {
            return false;
        }

        if self.flags.contains(DataFlags::HAS_SYSTEM_ID) {
            let signature = self.calculate_signature();

            if signature[..] != *self.signature() {
                log::debug!(
                    "validate(): signature mismatch, exp={}, got={}",
                    util::hex_string(&signature, ' '),
                    util::hex_string(self.signature(), ' ')
                );
                return false;
            }
        }
        true
    }
}
