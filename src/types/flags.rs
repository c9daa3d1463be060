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

use bitflags::bitflags;

bitflags! {
    /// Bit flags recording which parts of a [`crate::dump::CartDump`] have been read successfully.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[rustfmt::skip]
    pub struct DumpFlags: u8 {
        #[doc = "A DS2401 responded on the system 1-wire bus"]
        const HAS_SYSTEM_ID   = 0b0000_0001;
        #[doc = "A DS2401 responded on the cartridge 1-wire bus"]
        const HAS_CART_ID     = 0b0000_0010;
        const CONFIG_OK       = 0b0000_0100;
        const SYSTEM_ID_OK    = 0b0000_1000;
        const CART_ID_OK      = 0b0001_0000;
        #[doc = "The ZS01's internal ID was read and validated"]
        const ZS_ID_OK        = 0b0010_0000;
        const PUBLIC_DATA_OK  = 0b0100_0000;
        const PRIVATE_DATA_OK = 0b1000_0000;
    }
}

bitflags! {
    /// Bit flags describing the variant of a cartridge or ROM header data format. They change how
    /// a parser interprets the payload, never the shape of the header itself.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[rustfmt::skip]
    pub struct DataFlags: u8 {
        const HAS_CODE_PREFIX    = 0b0000_0001;
        const HAS_TRACE_ID       = 0b0000_0010;
        const HAS_CART_ID        = 0b0000_0100;
        const HAS_INSTALL_ID     = 0b0000_1000;
        const HAS_SYSTEM_ID      = 0b0001_0000;
        #[doc = "The header lives in the chip's public data area rather than at offset 0"]
        const HAS_PUBLIC_SECTION = 0b0010_0000;
        const CHECKSUM_INVERTED  = 0b0100_0000;
        #[doc = "One title stores its code with a different second letter than it validates with"]
        const GX706_WORKAROUND   = 0b1000_0000;
    }
}
