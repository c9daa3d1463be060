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

    src/format/dispatch.rs

    Dispatch DataParser operations to the detected layout
*/

use crate::{
    format::{CartParser, DataParser, RomHeaderParser},
    identifier::{IdentifierSet, PublicIdentifierSet},
    types::{DataFlags, FormatType},
};

impl DataParser for CartParser<'_> {
    fn format_type(&self) -> FormatType {
        match self {
            CartParser::Simple(p) => p.format_type(),
            CartParser::Basic(p) => p.format_type(),
            CartParser::Extended(p) => p.format_type(),
        }
    }

    fn flags(&self) -> DataFlags {
        match self {
            CartParser::Simple(p) => p.flags(),
            CartParser::Basic(p) => p.flags(),
            CartParser::Extended(p) => p.flags(),
        }
    }

    fn code(&self) -> Option<String> {
        match self {
            CartParser::Simple(p) => p.code(),
            CartParser::Basic(p) => p.code(),
            CartParser::Extended(p) => p.code(),
        }
    }

    fn set_code(&mut self, code: &str) {
        match self {
            CartParser::Simple(p) => p.set_code(code),
            CartParser::Basic(p) => p.set_code(code),
            CartParser::Extended(p) => p.set_code(code),
        }
    }

    fn region(&self) -> String {
        match self {
            CartParser::Simple(p) => p.region(),
            CartParser::Basic(p) => p.region(),
            CartParser::Extended(p) => p.region(),
        }
    }

    fn set_region(&mut self, region: &str) {
        match self {
            CartParser::Simple(p) => p.set_region(region),
            CartParser::Basic(p) => p.set_region(region),
            CartParser::Extended(p) => p.set_region(region),
        }
    }

    fn year(&self) -> Option<u16> {
        match self {
            CartParser::Simple(p) => p.year(),
            CartParser::Basic(p) => p.year(),
            CartParser::Extended(p) => p.year(),
        }
    }

    fn set_year(&mut self, year: u16) {
        match self {
            CartParser::Simple(p) => p.set_year(year),
            CartParser::Basic(p) => p.set_year(year),
            CartParser::Extended(p) => p.set_year(year),
        }
    }

    fn identifiers(&self) -> Option<&IdentifierSet> {
        match self {
            CartParser::Simple(p) => p.identifiers(),
            CartParser::Basic(p) => p.identifiers(),
            CartParser::Extended(p) => p.identifiers(),
        }
    }

    fn identifiers_mut(&mut self) -> Option<&mut IdentifierSet> {
        match self {
            CartParser::Simple(p) => p.identifiers_mut(),
            CartParser::Basic(p) => p.identifiers_mut(),
            CartParser::Extended(p) => p.identifiers_mut(),
        }
    }

    fn public_identifiers(&self) -> Option<&PublicIdentifierSet> {
        match self {
            CartParser::Simple(p) => p.public_identifiers(),
            CartParser::Basic(p) => p.public_identifiers(),
            CartParser::Extended(p) => p.public_identifiers(),
        }
    }

    fn public_identifiers_mut(&mut self) -> Option<&mut PublicIdentifierSet> {
        match self {
            CartParser::Simple(p) => p.public_identifiers_mut(),
            CartParser::Basic(p) => p.public_identifiers_mut(),
            CartParser::Extended(p) => p.public_identifiers_mut(),
        }
    }

    fn flush(&mut self) {
        match self {
            CartParser::Simple(p) => p.flush(),
            CartParser::Basic(p) => p.flush(),
            CartParser::Extended(p) => p.flush(),
        }
    }

    fn validate(&self) -> bool {
        match self {
            CartParser::Simple(p) => p.validate(),
            CartParser::Basic(p) => p.validate(),
            CartParser::Extended(p) => p.validate(),
        }
    }
}

// Only one ROM header layout is known so far.
#[allow(clippy::match_single_binding)]
impl DataParser for RomHeaderParser<'_> {
    fn format_type(&self) -> FormatType {
        match self {
            RomHeaderParser::Extended(p) => p.format_type(),
        }
    }

    fn flags(&self) -> DataFlags {
        match self {
            RomHeaderParser::Extended(p) => p.flags(),
        }
    }

    fn code(&self) -> Option<String> {
        match self {
            RomHeaderParser::Extended(p) => p.code(),
        }
    }

    fn set_code(&mut self, code: &str) {
        match self {
            RomHeaderParser::Extended(p) => p.set_code(code),
        }
    }

    fn region(&self) -> String {
        match self {
            RomHeaderParser::Extended(p) => p.region(),
        }
    }

    fn set_region(&mut self, region: &str) {
        match self {
            RomHeaderParser::Extended(p) => p.set_region(region),
        }
    }

    fn year(&self) -> Option<u16> {
        match self {
            RomHeaderParser::Extended(p) => p.year(),
        }
    }

    fn set_year(&mut self, year: u16) {
        match self {
            RomHeaderParser::Extended(p) => p.set_year(year),
        }
    }

    fn identifiers(&self) -> Option<&IdentifierSet> {
        match self {
            RomHeaderParser::Extended(p) => p.identifiers(),
        }
    }

    fn identifiers_mut(&mut self) -> Option<&mut IdentifierSet> {
        match self {
            RomHeaderParser::Extended(p) => p.identifiers_mut(),
        }
    }

    fn public_identifiers(&self) -> Option<&PublicIdentifierSet> {
        match self {
            RomHeaderParser::Extended(p) => p.public_identifiers(),
        }
    }

    fn public_identifiers_mut(&mut self) -> Option<&mut PublicIdentifierSet> {
        match self {
            RomHeaderParser::Extended(p) => p.public_identifiers_mut(),
        }
    }

    fn flush(&mut self) {
        match self {
            RomHeaderParser::Extended(p) => p.flush(),
        }
    }

    fn validate(&self) -> bool {
        match self {
            RomHeaderParser::Extended(p) => p.validate(),
        }
    }
}
