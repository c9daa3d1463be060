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

    enums.rs

    Defines chip, format and trace ID enum types
*/

use strum::{Display, EnumIter, FromRepr};

/// The type of security chip present on a cartridge.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChipType {
    #[default]
    #[strum(to_string = "None")]
    None = 0,
    #[strum(to_string = "X76F041")]
    X76F041 = 1,
    #[strum(to_string = "X76F100")]
    X76F100 = 2,
    #[strum(to_string = "ZS01")]
    Zs01 = 3,
}

/// The general layout of the data stored on a cartridge or in a ROM header.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Display, EnumIter, FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FormatType {
    #[default]
    Blank = 0,
    Simple = 1,
    Basic = 2,
    Extended = 3,
}

/// How the trace ID of a cartridge is generated during installation.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TraceIdType {
    #[default]
    None = 0,
    #[strum(to_string = "0x81")]
    Tid81 = 1,
    #[strum(to_string = "0x82 (big endian)")]
    Tid82BigEndian = 2,
    #[strum(to_string = "0x82 (little endian)")]
    Tid82LittleEndian = 3,
}
