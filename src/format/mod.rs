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

//! Parsers for the data layouts games store on cartridges and in ROM headers.
//!
//! There is no field in the data itself identifying its layout, so a [`DataParser`] is either
//! built for a known [`FormatType`] and set of [`DataFlags`], or picked by trying every known
//! layout against the data until one of them validates. Parsers borrow the dump they were created
//! for and read or modify its payload in place; call [`DataParser::flush`] after modifying any
//! field so that checksums and mirrored identifiers are brought up to date.

mod dispatch;
pub mod basic;
pub mod extended;
pub mod header;
pub mod rom_header;
pub mod simple;

use crate::{
    database::CartDbEntry,
    dump::{CartDump, RomHeaderDump},
    identifier::{IdentifierSet, PublicIdentifierSet},
    types::{DataFlags, FormatType},
    REGION_MIN_LENGTH,
};

pub use basic::BasicParser;
pub use extended::ExtendedParser;
pub use header::{BasicHeader, ExtendedHeader, SimpleHeader};
pub use rom_header::ExtendedRomHeaderParser;
pub use simple::SimpleParser;

/// Access to the fields of a cartridge or ROM header data layout. Fields a layout does not store
/// read as `None` (or an empty string) and ignore writes.
pub trait DataParser {
    fn format_type(&self) -> FormatType;
    fn flags(&self) -> DataFlags;

    /// Game code, such as `GE936`.
    fn code(&self) -> Option<String> {
        None
    }
    fn set_code(&mut self, _code: &str) {}
    fn region(&self) -> String;
    fn set_region(&mut self, _region: &str) {}
    fn year(&self) -> Option<u16> {
        None
    }
    fn set_year(&mut self, _year: u16) {}

    fn identifiers(&self) -> Option<&IdentifierSet> {
        None
    }
    fn identifiers_mut(&mut self) -> Option<&mut IdentifierSet> {
        None
    }
    fn public_identifiers(&self) -> Option<&PublicIdentifierSet> {
        None
    }
    fn public_identifiers_mut(&mut self) -> Option<&mut PublicIdentifierSet> {
        None
    }

    /// Recompute checksums and mirrored fields after the data has been modified.
    fn flush(&mut self) {}

    /// Returns true if the data is consistent with this layout.
    fn validate(&self) -> bool {
        validate_region(&self.region())
    }
}

/// Region check shared by all layouts.
pub(crate) fn validate_region(region: &str) -> bool {
    if region.len() < REGION_MIN_LENGTH {
        log::debug!("validate(): region is too short: {:?}", region);
        return false;
    }
    if !is_valid_region(region) {
        log::debug!("validate(): invalid region: {:?}", region);
        return false;
    }
    true
}

fn check_region_grammar(region: &[u8], lowercase: bool) -> bool {
    let (regions, majors, minors, revision) = match lowercase {
        false => (&b"AEJKSU"[..], &b"ABCDEFRSTUVWXYZ"[..], &b"ABCD"[..], b'Z'),
        true => (&b"aejksu"[..], &b"abcdefrstuvwxyz"[..], &b"abcd"[..], b'z'),
    };
    // Bytes past the end of the string read as NUL, as they would in a fixed-width field.
    let at = |i: usize| region.get(i).copied().unwrap_or(0);

    // Character 0:    region code (A=Asia, E=Europe, J=Japan, K=Korea, S=Singapore?, U=US)
    // Character 1:    major version code (A-F=regular, R-W=e-Amusement, X-Z=?)
    // Characters 2-4: minor version code (A-D or Z00-Z99, optional)
    if !regions.contains(&at(0)) || !majors.contains(&at(1)) {
        return false;
    }

    let minor = at(2);
    if minor == 0 {
        return true;
    }

    let end = if minors.contains(&minor) {
        3
    }
    else if minor == revision {
        if !at(3).is_ascii_digit() || !at(4).is_ascii_digit() {
            return false;
        }
        5
    }
    else {
        return false;
    };

    at(end) == 0
}

/// Returns true if `region` is a valid region and version string, such as `JAA` or `EAZ05`.
pub fn is_valid_region(region: &str) -> bool {
    check_region_grammar(region.as_bytes(), false)
}

/// Returns true if `region` is a valid region string for an upgrade cartridge. These use the same
/// grammar as [`is_valid_region`] in lowercase.
pub fn is_valid_upgrade_region(region: &str) -> bool {
    check_region_grammar(region.as_bytes(), true)
}

/// A layout that has been observed on real cartridges.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KnownFormat {
    pub name: &'static str,
    pub format: FormatType,
    pub flags: DataFlags,
}

const fn flags(list: &[DataFlags]) -> DataFlags {
    let mut out = DataFlags::empty();
    let mut i = 0;
    while i < list.len() {
        out = out.union(list[i]);
        i += 1;
    }
    out
}

/// Cartridge layouts, ordered from the least to the most specific. Autodetection walks the list
/// backwards.
#[rustfmt::skip]
pub const KNOWN_CART_FORMATS: [KnownFormat; 11] = [
    // Used by GCB48 (and possibly other games?)
    KnownFormat {
        name: "region only",
        format: FormatType::Simple,
        flags: DataFlags::HAS_PUBLIC_SECTION,
    },
    KnownFormat {
        name: "basic (no IDs)",
        format: FormatType::Basic,
        flags: DataFlags::CHECKSUM_INVERTED,
    },
    KnownFormat {
        name: "basic + TID",
        format: FormatType::Basic,
        flags: flags(&[DataFlags::HAS_TRACE_ID, DataFlags::CHECKSUM_INVERTED]),
    },
    KnownFormat {
        name: "basic + SID",
        format: FormatType::Basic,
        flags: flags(&[DataFlags::HAS_CART_ID, DataFlags::CHECKSUM_INVERTED]),
    },
    KnownFormat {
        name: "basic + TID, SID",
        format: FormatType::Basic,
        flags: flags(&[DataFlags::HAS_TRACE_ID, DataFlags::HAS_CART_ID, DataFlags::CHECKSUM_INVERTED]),
    },
    KnownFormat {
        name: "basic + prefix, TID, SID",
        format: FormatType::Basic,
        flags: flags(&[
            DataFlags::HAS_CODE_PREFIX, DataFlags::HAS_TRACE_ID, DataFlags::HAS_CART_ID,
            DataFlags::CHECKSUM_INVERTED,
        ]),
    },
    // Used by most pre-ZS01 rhythm games
    KnownFormat {
        name: "basic + prefix, all IDs",
        format: FormatType::Basic,
        flags: flags(&[
            DataFlags::HAS_CODE_PREFIX, DataFlags::HAS_TRACE_ID, DataFlags::HAS_CART_ID,
            DataFlags::HAS_INSTALL_ID, DataFlags::HAS_SYSTEM_ID, DataFlags::CHECKSUM_INVERTED,
        ]),
    },
    KnownFormat {
        name: "extended (no IDs)",
        format: FormatType::Extended,
        flags: flags(&[DataFlags::HAS_CODE_PREFIX, DataFlags::CHECKSUM_INVERTED]),
    },
    KnownFormat {
        name: "extended (no IDs, alt)",
        format: FormatType::Extended,
        flags: DataFlags::HAS_CODE_PREFIX,
    },
    // Used by GX706
    KnownFormat {
        name: "extended (no IDs, GX706)",
        format: FormatType::Extended,
        flags: flags(&[DataFlags::HAS_CODE_PREFIX, DataFlags::GX706_WORKAROUND]),
    },
    // Used by GE936/GK936 and all ZS01 rhythm games
    KnownFormat {
        name: "extended + all IDs",
        format: FormatType::Extended,
        flags: flags(&[
            DataFlags::HAS_CODE_PREFIX, DataFlags::HAS_TRACE_ID, DataFlags::HAS_CART_ID,
            DataFlags::HAS_INSTALL_ID, DataFlags::HAS_SYSTEM_ID, DataFlags::HAS_PUBLIC_SECTION,
            DataFlags::CHECKSUM_INVERTED,
        ]),
    },
];

/// ROM header layouts, ordered as [`KNOWN_CART_FORMATS`].
#[rustfmt::skip]
pub const KNOWN_ROM_HEADER_FORMATS: [KnownFormat; 4] = [
    KnownFormat {
        name: "extended (no MD5)",
        format: FormatType::Extended,
        flags: flags(&[DataFlags::HAS_CODE_PREFIX, DataFlags::CHECKSUM_INVERTED]),
    },
    KnownFormat {
        name: "extended (no MD5, alt)",
        format: FormatType::Extended,
        flags: DataFlags::HAS_CODE_PREFIX,
    },
    // Used by GX706
    KnownFormat {
        name: "extended (no MD5, GX706)",
        format: FormatType::Extended,
        flags: flags(&[DataFlags::HAS_CODE_PREFIX, DataFlags::GX706_WORKAROUND]),
    },
    KnownFormat {
        name: "extended + MD5",
        format: FormatType::Extended,
        flags: flags(&[DataFlags::HAS_CODE_PREFIX, DataFlags::HAS_SYSTEM_ID, DataFlags::CHECKSUM_INVERTED]),
    },
];

/// A parser for one of the cartridge data layouts.
pub enum CartParser<'a> {
    Simple(SimpleParser<'a>),
    Basic(BasicParser<'a>),
    Extended(ExtendedParser<'a>),
}

/// A parser for one of the ROM header layouts.
pub enum RomHeaderParser<'a> {
    Extended(ExtendedRomHeaderParser<'a>),
}

/// Create a parser for a known cartridge layout. Returns `None` for [`FormatType::Blank`], which
/// has no layout to parse.
pub fn new_cart_parser_with(dump: &mut CartDump, format: FormatType, flags: DataFlags) -> Option<CartParser<'_>> {
    match format {
        FormatType::Simple => Some(CartParser::Simple(SimpleParser::new(dump, flags))),
        FormatType::Basic => Some(CartParser::Basic(BasicParser::new(dump, flags))),
        FormatType::Extended => Some(CartParser::Extended(ExtendedParser::new(dump, flags))),
        FormatType::Blank => None,
    }
}

/// Create a parser for the layout a database entry says its cartridge uses.
pub fn new_cart_parser_for_entry<'a>(dump: &'a mut CartDump, entry: &CartDbEntry) -> Option<CartParser<'a>> {
    new_cart_parser_with(dump, entry.format_type(), entry.data_flags())
}

/// Detect the layout of a cartridge's data and return a parser for it, or `None` if the data does
/// not match any known layout. The most specific layouts are tried first.
pub fn new_cart_parser(dump: &mut CartDump) -> Option<CartParser<'_>> {
    let mut detected = None;

    for format in KNOWN_CART_FORMATS.iter().rev() {
        log::debug!("new_cart_parser(): trying as {}", format.name);

        if let Some(parser) = new_cart_parser_with(&mut *dump, format.format, format.flags) {
            if parser.validate() {
                detected = Some(format);
                break;
            }
        }
    }

    match detected {
        Some(format) => {
            log::debug!("new_cart_parser(): detected {}", format.name);
            new_cart_parser_with(dump, format.format, format.flags)
        }
        None => {
            log::debug!("new_cart_parser(): unrecognized data format");
            None
        }
    }
}

/// Create a parser for a known ROM header layout. Only [`FormatType::Extended`] headers exist.
pub fn new_rom_header_parser_with(
    dump: &mut RomHeaderDump,
    format: FormatType,
    flags: DataFlags,
) -> Option<RomHeaderParser<'_>> {
    match format {
        FormatType::Extended => Some(RomHeaderParser::Extended(ExtendedRomHeaderParser::new(dump, flags))),
        _ => None,
    }
}

/// Detect the layout of a ROM header, as [`new_cart_parser`] does for cartridges.
pub fn new_rom_header_parser(dump: &mut RomHeaderDump) -> Option<RomHeaderParser<'_>> {
    let mut detected = None;

    for format in KNOWN_ROM_HEADER_FORMATS.iter().rev() {
        log::debug!("new_rom_header_parser(): trying as {}", format.name);

        if let Some(parser) = new_rom_header_parser_with(&mut *dump, format.format, format.flags) {
            if parser.validate() {
                detected = Some(format);
                break;
            }
        }
    }

    match detected {
        Some(format) => {
            log::debug!("new_rom_header_parser(): detected {}", format.name);
            new_rom_header_parser_with(dump, format.format, format.flags)
        }
        None => {
            log::debug!("new_rom_header_parser(): unrecognized data format");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_regions() {
        for region in ["JA", "UAA", "EAD", "KY", "SRZ00", "EAZ00", "AAZ99"] {
            assert!(is_valid_region(region), "{region} should be valid");
        }
    }

    #[test]
    fn invalid_regions() {
        for region in ["", "J", "1A", "UA1", "UAZ0", "UAZ", "XA", "JG", "UAAA", "UAZ001", "jaa"] {
            assert!(!is_valid_region(region), "{region} should be invalid");
        }
    }

    #[test]
    fn upgrade_regions() {
        assert!(is_valid_upgrade_region("jaa"));
        assert!(is_valid_upgrade_region("uaz12"));
        assert!(!is_valid_upgrade_region("JAA"));
        assert!(!is_valid_upgrade_region("jaz1"));
    }

    #[test]
    fn format_tables_are_distinct() {
        for (i, a) in KNOWN_CART_FORMATS.iter().enumerate() {
            for b in &KNOWN_CART_FORMATS[i + 1..] {
                assert!(a.format != b.format || a.flags != b.flags, "{} and {}", a.name, b.name);
            }
        }
        assert!(KNOWN_ROM_HEADER_FORMATS
            .iter()
            .all(|format| format.format == FormatType::Extended));
    }

    #[test]
    fn blank_format_has_no_parser() {
        let mut dump = CartDump::default();
        assert!(new_cart_parser_with(&mut dump, FormatType::Blank, DataFlags::empty()).is_none());

        let mut header = RomHeaderDump::default();
        assert!(new_rom_header_parser_with(&mut header, FormatType::Basic, DataFlags::empty()).is_none());
    }

    #[test]
    fn empty_dump_is_unrecognized() {
        let mut dump = CartDump::default();
        assert!(new_cart_parser(&mut dump).is_none());
    }
}
