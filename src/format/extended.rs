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

//! The extended layout used by ZS01 and later X76F041 cartridges.
//!
//! The header stores a full game code, a year and a 16-bit checksum. When the cartridge has a
//! public section, the header is placed there along with a public copy of some identifiers, while
//! the full identifier set lives in the private area. On ZS01 cartridges both sections overlap the
//! start of the payload; on X76F041 cartridges the public section is the last 128-byte sector.

use crate::{
    dump::CartDump,
    format::{header::ExtendedHeader, DataParser},
    identifier::{IdentifierSet, PublicIdentifierSet},
    types::{DataFlags, FormatType},
    util,
};

const PRIVATE_IDS_OFFSET: usize = ExtendedHeader::SIZE + PublicIdentifierSet::SIZE;

pub struct ExtendedParser<'a> {
    dump: &'a mut CartDump,
    flags: DataFlags,
}

impl<'a> ExtendedParser<'a> {
    /// The code prefix is always stored, so `HAS_CODE_PREFIX` is implied.
    pub fn new(dump: &'a mut CartDump, flags: DataFlags) -> Self {
        ExtendedParser {
            dump,
            flags: flags | DataFlags::HAS_CODE_PREFIX,
        }
    }

    fn has_public_section(&self) -> bool {
        self.flags.contains(DataFlags::HAS_PUBLIC_SECTION)
    }

    fn header_offset(&self) -> usize {
        match self.has_public_section() {
            true => self.dump.chip_size().public_data_offset,
            false => 0,
        }
    }

    pub fn header(&self) -> &ExtendedHeader {
        let offset = self.header_offset();
        bytemuck::from_bytes(&self.dump.data[offset..offset + ExtendedHeader::SIZE])
    }

    pub fn header_mut(&mut self) -> &mut ExtendedHeader {
        let offset = self.header_offset();
        bytemuck::from_bytes_mut(&mut self.dump.data[offset..offset + ExtendedHeader::SIZE])
    }
}

/// GX706 stores its code as `GE706` but checksums it as `GX706`. Returns the header as it was
/// checksummed.
pub(crate) fn checksummed_header(header: &ExtendedHeader, flags: DataFlags) -> ExtendedHeader {
    let mut header = *header;
    if flags.contains(DataFlags::GX706_WORKAROUND) {
        header.code[1] = b'X';
    }
    header
}

pub(crate) fn header_code(header: &ExtendedHeader, flags: DataFlags) -> String {
    // The last byte of the field is never part of the code.
    let mut code = util::c_str_bytes(&header.code[..header.code.len() - 1]).to_vec();

    if flags.contains(DataFlags::GX706_WORKAROUND) && code.len() > 1 {
        code[1] = b'X';
    }
    String::from_utf8_lossy(&code).into_owned()
}

pub(crate) fn set_header_code(header: &mut ExtendedHeader, code: &str, flags: DataFlags) {
    util::copy_c_str(&mut header.code, code.as_bytes());

    if flags.contains(DataFlags::GX706_WORKAROUND) {
        header.code[1] = b'E';
    }
}

/// Recompute the checksum of a header, leaving its stored code untouched.
pub(crate) fn update_header_checksum(header: &mut ExtendedHeader, flags: DataFlags) {
    let mut checksummed = checksummed_header(header, flags);

    checksummed.update_checksum(flags.contains(DataFlags::CHECKSUM_INVERTED));
    header.checksum = checksummed.checksum;
}

pub(crate) fn validate_header_checksum(header: &ExtendedHeader, flags: DataFlags) -> bool {
    checksummed_header(header, flags).validate_checksum(flags.contains(DataFlags::CHECKSUM_INVERTED))
}

impl DataParser for ExtendedParser<'_> {
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

    fn identifiers(&self) -> Option<&IdentifierSet> {
        if !self.has_public_section() {
            return None;
        }
        Some(bytemuck::from_bytes(
            &self.dump.data[PRIVATE_IDS_OFFSET..PRIVATE_IDS_OFFSET + IdentifierSet::SIZE],
        ))
    }

    fn identifiers_mut(&mut self) -> Option<&mut IdentifierSet> {
        if !self.has_public_section() {
            return None;
        }
        Some(bytemuck::from_bytes_mut(
            &mut self.dump.data[PRIVATE_IDS_OFFSET..PRIVATE_IDS_OFFSET + IdentifierSet::SIZE],
        ))
    }

    fn public_identifiers(&self) -> Option<&PublicIdentifierSet> {
        if !self.has_public_section() {
            return None;
        }
        let start = self.header_offset() + ExtendedHeader::SIZE;
        Some(bytemuck::from_bytes(
            &self.dump.data[start..start + PublicIdentifierSet::SIZE],
        ))
    }

    fn public_identifiers_mut(&mut self) -> Option<&mut PublicIdentifierSet> {
        if !self.has_public_section() {
            return None;
        }
        let start = self.header_offset() + ExtendedHeader::SIZE;
        Some(bytemuck::from_bytes_mut(
            &mut self.dump.data[start..start + PublicIdentifierSet::SIZE],
        ))
    }

    fn flush(&mut self) {
        // Mirror the system ID into the public area. The private install ID always seems to be
        // left zeroed, so it is not mirrored.
        if let Some(system_id) = self.identifiers().map(|ids| ids.system_id) {
            if let Some(public) = self.public_identifiers_mut() {
                public.system_id = system_id;
            }
        }

        let flags = self.flags;
        update_header_checksum(self.header_mut(), flags);
    }

    fn validate(&self) -> bool {
        crate::format::validate_region(&self.region()) && validate_header_checksum(self.header(), self.flags)
    }
}
