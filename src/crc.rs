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

//! CRC routines used by the security chips.
//!
//! The DS2401 serial number chips (and the ZS01's internal ID) protect their 8-byte IDs with the
//! standard Dallas/Maxim 1-wire CRC-8. ZS01 packets carry a CRC-16 using the CCITT polynomial
//! with an initial value of 0xFFFF and an inverted result.

use crc::{Crc, CRC_16_GENIBUS, CRC_8_MAXIM_DOW};

const DS_CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_MAXIM_DOW);
const ZS01_CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_GENIBUS);

/// Calculate the 1-wire CRC-8 of `data`.
pub fn ds_crc8(data: &[u8]) -> u8 {
    DS_CRC8.checksum(data)
}

/// Calculate the CRC-16 used by ZS01 request and response packets.
pub fn zs01_crc16(data: &[u8]) -> u16 {
    ZS01_CRC16.checksum(data)
}
