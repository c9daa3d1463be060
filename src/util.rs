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

//! Miscellaneous helpers for byte sums, fixed-width C strings and the base41 text encoding.

use std::cmp::Ordering;

const BASE41_CHARSET: &[u8; 41] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ+-./:";

/// Sum all bytes of a slice.
pub fn sum(data: &[u8]) -> u32 {
    data.iter().map(|&b| b as u32).sum()
}

/// Sum a slice as a sequence of little-endian 16-bit words. A trailing odd byte is ignored.
pub fn sum_u16_le(data: &[u8]) -> u32 {
    data.chunks_exact(2)
        .map(|word| u16::from_le_bytes([word[0], word[1]]) as u32)
        .sum()
}

/// Return the portion of a fixed-width field up to (not including) the first NUL byte.
pub fn c_str_bytes(field: &[u8]) -> &[u8] {
    match field.iter().position(|&b| b == 0) {
        Some(end) => &field[..end],
        None => field,
    }
}

/// Convert a fixed-width, NUL padded field into a `String`.
pub fn c_str(field: &[u8]) -> String {
    String::from_utf8_lossy(c_str_bytes(field)).into_owned()
}

/// Copy `src` into a fixed-width field, stopping at the first NUL and padding the remainder of the
/// field with NULs. The field is not NUL terminated if `src` is as long as the field.
pub fn copy_c_str(field: &mut [u8], src: &[u8]) {
    let src = c_str_bytes(src);
    for (i, byte) in field.iter_mut().enumerate() {
        *byte = src.get(i).copied().unwrap_or(0);
    }
}

/// Compare at most `n` characters of two NUL terminated byte strings. Indices past the end of
/// either slice compare as NUL.
pub fn strncmp(a: &[u8], b: &[u8], n: usize) -> Ordering {
    for i in 0..n {
        let ca = a.get(i).copied().unwrap_or(0);
        let cb = b.get(i).copied().unwrap_or(0);

        match ca.cmp(&cb) {
            Ordering::Equal if ca == 0 => return Ordering::Equal,
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Format bytes as uppercase hex, separating each byte with `separator`.
pub fn hex_string(data: &[u8], separator: char) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for (i, byte) in data.iter().enumerate() {
        if i > 0 {
            out.push(separator);
        }
        out.push_str(&format!("{:02X}", byte));
    }
    out
}

/// Encode binary data using the QR code alphanumeric friendly base41 encoding. Each pair of bytes is
/// packed big-endian into a 16-bit value and emitted as three digits, least significant first. An
/// odd trailing byte is padded with a zero.
pub fn encode_base41(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(2) * 3);

    for pair in data.chunks(2) {
        let hi = pair[0] as u32;
        let lo = pair.get(1).copied().unwrap_or(0) as u32;
        let mut value = (hi << 8) | lo;

        for _ in 0..3 {
            out.push(BASE41_CHARSET[(value % 41) as usize] as char);
            value /= 41;
        }
    }
    out
}

/// Decode a base41 string produced by [`encode_base41`]. Returns `None` if the string contains
/// characters outside the alphabet, has a length that is not a multiple of three, or encodes a
/// value that does not fit in 16 bits.
pub fn decode_base41(text: &str) -> Option<Vec<u8>> {
    let digits = text
        .bytes()
        .map(|c| BASE41_CHARSET.iter().position(|&d| d == c).map(|p| p as u32))
        .collect::<Option<Vec<u32>>>()?;

    if digits.len() % 3 != 0 {
        return None;
    }

    let mut out = Vec::with_capacity(digits.len() / 3 * 2);
    for triple in digits.chunks_exact(3) {
        let value = triple[0] + triple[1] * 41 + triple[2] * 41 * 41;
        if value > 0xFFFF {
            return None;
        }
        out.push((value >> 8) as u8);
        out.push((value & 0xFF) as u8);
    }
    Some(out)
}
