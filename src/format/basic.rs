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

//! The basic layout used by most X76 cartridges: a region, an optional code prefix and an 8-bit
//! checksum, followed by a full identifier set.

use crate::{
    dump::CartDump,
    format::{header::BasicHeader, DataParser},
    identifier::IdentifierSet,
    types::{DataFlags, FormatType},
    util,
};

pub struct BasicParser<'a> {
    dump: &'a mut CartDump,
    flags: DataFlags,
}

impl<'a> BasicParser<'a> {
    pub fn new(dump: &'a mut CartDump, flags: DataFlags) -> Self {
        BasicParser { dump, flags }
    }

    fn header_offset(&self) -> usize {
        match self.flags.contains(DataFlags::HAS_PUBLIC_SECTION) {
            true => self.dump.chip_size().public_data_offset,
            false => 0,
        }
    }

    fn invert(&self) -> bool {
        self.flags.contains(DataFlags::CHECKSUM_INVERTED)
    }

    pub fn header(&self) -> &BasicHeader {
        let offset = self.header_offset();
        bytemuck::from_bytes(&self.dump.data[offset..offset + BasicHeader::SIZE])
    }

    pub fn header_mut(&mut self) -> &mut BasicHeader {
        let offset = self.header_offset();
        bytemuck::from_bytes_mut(&mut self.dump.data[offset..offset + BasicHeader::SIZE])
    }
}

impl DataParser for BasicParser<'_> {
    fn format_type(&self) -> FormatType {
        FormatType::Basic
    }

    fn flags(&self) -> DataFlags {
        self.flags
    }

    /// Only the code prefix is stored, and only by some games.
    fn set_code(&mut self, code: &str) {
        if !self.flags.contains(DataFlags::HAS_CODE_PREFIX) {
            return;
        }
        util::copy_c_str(&mut self.header_mut().code_prefix, code.as_bytes());
    }

    fn region(&self) -> String {
        util::c_str(&self.header().region)
    }

    fn set_region(&mut self, region: &str) {
        util::copy_c_str(&mut self.header_mut().region, region.as_bytes());
    }

    fn identifiers(&self) -> Option<&IdentifierSet> {
        let start = BasicHeader::SIZE;
        Some(bytemuck::from_bytes(&self.dump.data[start..start + IdentifierSet::SIZE]))
    }

    fn identifiers_mut(&mut self) -> Option<&mut IdentifierSet> {
        let start = BasicHeader::SIZE;
        Some(bytemuck::from_bytes_mut(
            &mut self.dump.data[start..start + IdentifierSet::SIZE],
        ))
    }

    fn flush(&mut self) {
        let invert = self.invert();
        self.header_mut().update_checksum(invert);
    }

    fn validate(&self) -> bool {
        crate::format::validate_region(&self.region()) && self.header().validate_checksum(self.invert())
    }
}
