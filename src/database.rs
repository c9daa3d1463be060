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

//! Read-only databases of known cartridges and ROM headers.
//!
//! A database is a flat array of fixed-size little-endian records, sorted by game code and region
//! so that entries can be located with a binary search. Records are parsed on access; the backing
//! buffer is never copied.

use crate::{
    dump::CartDump,
    types::{ChipType, DataFlags, FormatType, TraceIdType},
    util,
    CartError,
    CODE_LENGTH,
    CODE_PREFIX_LENGTH,
    KEY_LENGTH,
    REGION_MAX_LENGTH,
};
use binrw::{binrw, BinRead, BinWrite};
use std::{cmp::Ordering, io::Cursor, marker::PhantomData};

pub const DB_CODE_LENGTH: usize = 8;
pub const DB_REGION_LENGTH: usize = 8;
pub const DB_NAME_LENGTH: usize = 96;

/// A fixed-size record that can be looked up by game code and region.
pub trait DbEntry: Sized {
    const SIZE: usize;

    fn parse(bytes: &[u8]) -> Result<Self, CartError>;
    fn code_field(&self) -> &[u8; DB_CODE_LENGTH];
    fn region_field(&self) -> &[u8; DB_REGION_LENGTH];
    fn name_field(&self) -> &[u8; DB_NAME_LENGTH];

    /// Order this entry relative to a code and region. Entries are sorted by the numeric part of
    /// their code first, then by the code prefix, then by region.
    fn compare(&self, code: &str, region: &str) -> Ordering {
        let entry_code = self.code_field();
        let code = code.as_bytes();

        util::strncmp(
            &entry_code[CODE_PREFIX_LENGTH..],
            code.get(CODE_PREFIX_LENGTH..).unwrap_or_default(),
            CODE_LENGTH - CODE_PREFIX_LENGTH + 1,
        )
        .then_with(|| util::strncmp(entry_code, code, CODE_PREFIX_LENGTH))
        .then_with(|| util::strncmp(self.region_field(), region.as_bytes(), REGION_MAX_LENGTH))
    }

    fn code_str(&self) -> String {
        util::c_str(self.code_field())
    }

    fn region_str(&self) -> String {
        util::c_str(self.region_field())
    }

    fn name_str(&self) -> String {
        util::c_str(self.name_field())
    }

    /// Code, region and name formatted for display in a list.
    fn display_name(&self) -> String {
        format!("{} {}\t{}", self.code_str(), self.region_str(), self.name_str())
    }
}

/// A known cartridge, along with everything needed to recreate its data.
#[binrw]
#[brw(little)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartDbEntry {
    pub chip_type: u8,
    pub format_type: u8,
    pub trace_id_type: u8,
    pub flags: u8,
    pub trace_id_param: u8,
    pub install_id_prefix: u8,
    pub year: u16,
    pub data_key: [u8; KEY_LENGTH],
    pub code: [u8; DB_CODE_LENGTH],
    pub region: [u8; DB_REGION_LENGTH],
    pub name: [u8; DB_NAME_LENGTH],
}

impl Default for CartDbEntry {
    fn default() -> Self {
        CartDbEntry {
            chip_type: 0,
            format_type: 0,
            trace_id_type: 0,
            flags: 0,
            trace_id_param: 0,
            install_id_prefix: 0,
            year: 0,
            data_key: [0; KEY_LENGTH],
            code: [0; DB_CODE_LENGTH],
            region: [0; DB_REGION_LENGTH],
            name: [0; DB_NAME_LENGTH],
        }
    }
}

impl CartDbEntry {
    pub fn chip_type(&self) -> ChipType {
        ChipType::from_repr(self.chip_type).unwrap_or_default()
    }

    pub fn format_type(&self) -> FormatType {
        FormatType::from_repr(self.format_type).unwrap_or_default()
    }

    pub fn trace_id_type(&self) -> TraceIdType {
        TraceIdType::from_repr(self.trace_id_type).unwrap_or_default()
    }

    pub fn data_flags(&self) -> DataFlags {
        DataFlags::from_bits_retain(self.flags)
    }

    /// Returns true if recreating this cartridge's data requires knowing its DS2401 ID, either to
    /// store it directly or to derive the trace ID from it.
    pub fn requires_cart_id(&self) -> bool {
        let flags = self.data_flags();

        flags.contains(DataFlags::HAS_CART_ID)
            || (flags.contains(DataFlags::HAS_TRACE_ID) && self.trace_id_type() >= TraceIdType::Tid82BigEndian)
    }

    /// Load this entry's data key into a dump, so that its private data can be accessed.
    pub fn copy_key_to(&self, dump: &mut CartDump) {
        dump.copy_key_from(&self.data_key);
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CartError> {
        let mut cursor = Cursor::new(Vec::with_capacity(Self::SIZE));
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

impl DbEntry for CartDbEntry {
    const SIZE: usize = 8 + KEY_LENGTH + DB_CODE_LENGTH + DB_REGION_LENGTH + DB_NAME_LENGTH;

    fn parse(bytes: &[u8]) -> Result<Self, CartError> {
        Ok(CartDbEntry::read(&mut Cursor::new(bytes))?)
    }

    fn code_field(&self) -> &[u8; DB_CODE_LENGTH] {
        &self.code
    }

    fn region_field(&self) -> &[u8; DB_REGION_LENGTH] {
        &self.region
    }

    fn name_field(&self) -> &[u8; DB_NAME_LENGTH] {
        &self.name
    }
}

/// A known ROM header.
#[binrw]
#[brw(little)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RomHeaderDbEntry {
    pub format_type: u8,
    pub flags: u8,
    pub year: u16,
    pub code: [u8; DB_CODE_LENGTH],
    pub region: [u8; DB_REGION_LENGTH],
    pub name: [u8; DB_NAME_LENGTH],
}

impl Default for RomHeaderDbEntry {
    fn default() -> Self {
        RomHeaderDbEntry {
            format_type: 0,
            flags: 0,
            year: 0,
            code: [0; DB_CODE_LENGTH],
            region: [0; DB_REGION_LENGTH],
            name: [0; DB_NAME_LENGTH],
        }
    }
}

impl RomHeaderDbEntry {
    pub fn format_type(&self) -> FormatType {
        FormatType::from_repr(self.format_type).unwrap_or_default()
    }

    pub fn data_flags(&self) -> DataFlags {
        DataFlags::from_bits_retain(self.flags)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CartError> {
        let mut cursor = Cursor::new(Vec::with_capacity(Self::SIZE));
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

impl DbEntry for RomHeaderDbEntry {
    const SIZE: usize = 4 + DB_CODE_LENGTH + DB_REGION_LENGTH + DB_NAME_LENGTH;

    fn parse(bytes: &[u8]) -> Result<Self, CartError> {
        Ok(RomHeaderDbEntry::read(&mut Cursor::new(bytes))?)
    }

    fn code_field(&self) -> &[u8; DB_CODE_LENGTH] {
        &self.code
    }

    fn region_field(&self) -> &[u8; DB_REGION_LENGTH] {
        &self.region
    }

    fn name_field(&self) -> &[u8; DB_NAME_LENGTH] {
        &self.name
    }
}

/// A sorted database of `T` records over a borrowed byte buffer. Trailing bytes not forming a
/// whole record are ignored.
#[derive(Copy, Clone, Debug)]
pub struct Db<'a, T: DbEntry> {
    data: &'a [u8],
    _entry: PhantomData<T>,
}

pub type CartDb<'a> = Db<'a, CartDbEntry>;
pub type RomHeaderDb<'a> = Db<'a, RomHeaderDbEntry>;

impl<'a, T: DbEntry> Db<'a, T> {
    pub fn new(data: &'a [u8]) -> Self {
        Db {
            data,
            _entry: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len() / T::SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the entry at `index`, or `None` if it is out of bounds.
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.len() {
            return None;
        }

        let start = index * T::SIZE;
        match T::parse(&self.data[start..start + T::SIZE]) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::error!("get(): failed to parse entry {}: {}", index, e);
                None
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    /// Find the entry for a game code and region. This assumes entries are sorted as
    /// [`DbEntry::compare`] orders them.
    pub fn lookup(&self, code: &str, region: &str) -> Option<T> {
        let mut low = 0;
        let mut high = self.len();

        while low < high {
            let mid = low + (high - low) / 2;
            let entry = self.get(mid)?;

            match entry.compare(code, region) {
                Ordering::Equal => {
                    log::debug!("lookup(): {} {} found", code, region);
                    return Some(entry);
                }
                Ordering::Less => low = mid + 1,
                Ordering::Greater => high = mid,
            }
        }

        log::debug!("lookup(): {} {} not found", code, region);
        None
    }
}
