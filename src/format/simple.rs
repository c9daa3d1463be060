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

//! The simplest layout: a region string at the start of the public data area and nothing else.

use crate::{
    dump::CartDump,
    format::{header::SimpleHeader, DataParser},
    types::{DataFlags, FormatType},
    util,
};

pub struct SimpleParser<'a> {
    dump: &'a mut CartDump,
    flags: DataFlags,
}

impl<'a> SimpleParser<'a> {
    /// The header always lives in the public data area, so `HAS_PUBLIC_SECTION` is implied.
    pub fn new(dump: &'a mut CartDump, flags: DataFlags) -> Self {
        SimpleParser {
            dump,
            flags: flags | DataFlags::HAS_PUBLIC_SECTION,
        }
    }

    fn header_offset(&self) -> usize {
        self.dump.chip_size().public_data_offset
    }

    pub fn header(&self) -> &SimpleHeader {
        let offset = self.header_offset();
        bytemuck::from_bytes(&self.dump.data[offset..offset + SimpleHeader::SIZE])
    }

    pub fn header_mut(&mut self) -> &mut SimpleHeader {
        let offset = self.header_offset();
        bytemuck::from_bytes_mut(&mut self.dump.data[offset..offset + SimpleHeader::SIZE])
    }
}

impl DataParser for SimpleParser<'_> {
    fn format_type(&self) -> FormatType {
        FormatType::Simple
    }

    fn flags(&self) -> DataFlags {
        self.flags
    }

    fn region(&self) -> String {
        util::c_str(&self.header().region)
    }

    fn set_region(&mut self, region: &str) {
        util::copy_c_str(&mut self.header_mut().region, region.as_bytes());
    }
}
