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

//! In-memory mirrors of a cartridge's contents ([`CartDump`]) and of a flash/RTC resident game
//! header ([`RomHeaderDump`]), along with their binary serialization and QR string export.

use crate::{
    identifier::Identifier,
    types::{ChipType, DumpFlags},
    util,
    CartError,
    CONFIG_LENGTH,
    KEY_LENGTH,
    MAX_QR_STRING_LENGTH,
};
use binrw::{binrw, BinRead, BinWrite};
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use std::io::{Cursor, Read, Write};

pub const DUMP_MAGIC: u16 = 0x573D;
pub const ROM_HEADER_DUMP_MAGIC: u16 = 0x573E;
/// Size of the serialized [`CartDump`] header, up to the start of the payload.
pub const DUMP_HEADER_LENGTH: usize = 44;
pub const MAX_DATA_LENGTH: usize = 512;
pub const ROM_HEADER_DATA_LENGTH: usize = 32;
pub const ROM_HEADER_DUMP_HEADER_LENGTH: usize = 12;

const QR_STRING_PREFIX: &str = "573::";
const QR_STRING_SUFFIX: &str = "::";

/// The size and layout of the data area of each chip type.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChipSize {
    pub data_length: usize,
    pub public_data_offset: usize,
    pub public_data_length: usize,
}

#[rustfmt::skip]
pub const CHIP_SIZES: [ChipSize; 4] = [
    ChipSize { data_length:   0, public_data_offset:   0, public_data_length:   0 },
    ChipSize { data_length: 512, public_data_offset: 384, public_data_length: 128 },
    ChipSize { data_length: 112, public_data_offset:   0, public_data_length:   0 },
    ChipSize { data_length: 112, public_data_offset:   0, public_data_length:  32 },
];

impl ChipType {
    pub fn size(&self) -> ChipSize {
        CHIP_SIZES[*self as usize]
    }
}

#[binrw]
#[brw(little, magic = 0x573Du16)]
struct CartDumpHeader {
    chip_type: u8,
    flags: u8,
    system_id: [u8; 8],
    cart_id: [u8; 8],
    zs_id: [u8; 8],
    data_key: [u8; KEY_LENGTH],
    config: [u8; CONFIG_LENGTH],
}

#[binrw]
#[brw(little, magic = 0x573Eu16)]
struct RomHeaderDumpHeader {
    reserved: u8,
    flags: u8,
    system_id: [u8; 8],
}

/// The contents of a security cartridge, plus metadata about which parts of it were read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartDump {
    pub chip_type: ChipType,
    pub flags: DumpFlags,
    pub system_id: Identifier,
    pub cart_id: Identifier,
    pub zs_id: Identifier,
    pub data_key: [u8; KEY_LENGTH],
    pub config: [u8; CONFIG_LENGTH],
    pub data: [u8; MAX_DATA_LENGTH],
}

impl Default for CartDump {
    fn default() -> Self {
        CartDump {
            chip_type: ChipType::None,
            flags: DumpFlags::empty(),
            system_id: Identifier::default(),
            cart_id: Identifier::default(),
            zs_id: Identifier::default(),
            data_key: [0; KEY_LENGTH],
            config: [0; CONFIG_LENGTH],
            data: [0; MAX_DATA_LENGTH],
        }
    }
}

impl CartDump {
    pub fn new(chip_type: ChipType) -> Self {
        CartDump {
            chip_type,
            ..Default::default()
        }
    }

    pub fn chip_size(&self) -> ChipSize {
        self.chip_type.size()
    }

    /// Length of the dump when serialized with [`CartDump::to_bytes`].
    pub fn dump_length(&self) -> usize {
        DUMP_HEADER_LENGTH + self.chip_size().data_length
    }

    /// The part of the payload actually backed by the chip.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.chip_size().data_length]
    }

    /// The part of the payload readable without the data key. Empty for chips without one.
    pub fn public_data(&self) -> &[u8] {
        let size = self.chip_size();
        &self.data[size.public_data_offset..size.public_data_offset + size.public_data_length]
    }

    pub fn clear_identifiers(&mut self) {
        self.system_id.clear();
        self.cart_id.clear();
        self.zs_id.clear();
    }

    pub fn clear_key(&mut self) {
        self.data_key = [0; KEY_LENGTH];
    }

    pub fn clear_data(&mut self) {
        self.data = [0; MAX_DATA_LENGTH];
    }

    pub fn copy_key_from(&mut self, key: &[u8; KEY_LENGTH]) {
        self.data_key = *key;
    }

    /// Reset the configuration block to the values games write during installation.
    pub fn init_config(&mut self, max_attempts: u8, has_public_section: bool) {
        self.config = [0; CONFIG_LENGTH];

        match self.chip_type {
            ChipType::X76F041 => {
                self.config[0] = 0xFF;
                self.config[1] = if has_public_section { 0xAF } else { 0xFF };
                // Disable retry counter
                self.config[2] = 0x20;
                self.config[3] = max_attempts;
            }
            ChipType::Zs01 => {
                self.config[4] = max_attempts;
            }
            _ => {}
        }
    }

    fn is_blank(data: &[u8]) -> bool {
        let sum = util::sum(data);
        sum == 0 || sum == 0xFF * data.len() as u32
    }

    /// Returns true if the public data area was read and is either all zeroes or all 0xFF.
    pub fn is_public_data_empty(&self) -> bool {
        if !self.flags.contains(DumpFlags::PUBLIC_DATA_OK) {
            return false;
        }
        Self::is_blank(self.public_data())
    }

    /// Returns true if the whole payload was read and is either all zeroes or all 0xFF.
    pub fn is_data_empty(&self) -> bool {
        if !self.flags.contains(DumpFlags::PUBLIC_DATA_OK | DumpFlags::PRIVATE_DATA_OK) {
            return false;
        }
        Self::is_blank(self.data())
    }

    /// ZS01 cartridges can be checked for emptiness through their public area alone. Many X76F041
    /// cartridges do not use their public area, so the whole payload is checked instead.
    pub fn is_readable_data_empty(&self) -> bool {
        match self.chip_type {
            ChipType::Zs01 => self.is_public_data_empty(),
            _ => self.is_data_empty(),
        }
    }

    /// Serialize the dump. The payload is truncated to the chip's data length.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CartError> {
        let header = CartDumpHeader {
            chip_type: self.chip_type as u8,
            flags: self.flags.bits(),
            system_id: self.system_id.data,
            cart_id: self.cart_id.data,
            zs_id: self.zs_id.data,
            data_key: self.data_key,
            config: self.config,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(self.dump_length()));
        header.write(&mut cursor)?;
        cursor.write_all(self.data())?;
        Ok(cursor.into_inner())
    }

    /// Deserialize a dump produced by [`CartDump::to_bytes`]. Trailing bytes are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CartError> {
        let mut cursor = Cursor::new(bytes);
        let header = CartDumpHeader::read(&mut cursor)?;

        let chip_type = match ChipType::from_repr(header.chip_type) {
            Some(ChipType::None) | None => {
                log::error!("from_bytes(): invalid chip type {}", header.chip_type);
                return Err(CartError::InvalidChipType(header.chip_type));
            }
            Some(chip_type) => chip_type,
        };

        let mut dump = CartDump {
            chip_type,
            flags: DumpFlags::from_bits_retain(header.flags),
            system_id: Identifier::from(header.system_id),
            cart_id: Identifier::from(header.cart_id),
            zs_id: Identifier::from(header.zs_id),
            data_key: header.data_key,
            config: header.config,
            data: [0; MAX_DATA_LENGTH],
        };

        let data_length = dump.chip_size().data_length;
        let payload = &bytes[DUMP_HEADER_LENGTH..];
        if payload.len() < data_length {
            log::error!(
                "from_bytes(): expected {} bytes of data, got {}",
                data_length,
                payload.len()
            );
            return Err(CartError::Truncated);
        }
        dump.data[..data_length].copy_from_slice(&payload[..data_length]);
        Ok(dump)
    }

    /// Export the dump as a string suitable for encoding into an alphanumeric QR code.
    pub fn to_qr_string(&self) -> Result<String, CartError> {
        let bytes = self.to_bytes()?;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder
            .write_all(&bytes)
            .map_err(|e| CartError::CompressionError(e.to_string()))?;
        let compressed = encoder
            .finish()
            .map_err(|e| CartError::CompressionError(e.to_string()))?;

        if compressed.len() > MAX_QR_STRING_LENGTH {
            log::error!("to_qr_string(): compressed size {} too large", compressed.len());
            return Err(CartError::QrStringTooLong);
        }
        log::debug!(
            "to_qr_string(): compressed size: {} bytes ({}%)",
            compressed.len(),
            compressed.len() * 100 / bytes.len()
        );

        Ok(format!(
            "{}{}{}",
            QR_STRING_PREFIX,
            util::encode_base41(&compressed),
            QR_STRING_SUFFIX
        ))
    }

    /// Parse a string produced by [`CartDump::to_qr_string`]. Surrounding whitespace and letter
    /// case are ignored, as QR scanners may return either.
    pub fn from_qr_string(text: &str) -> Result<Self, CartError> {
        let text = text.trim().to_ascii_uppercase();
        let body = text
            .strip_prefix(QR_STRING_PREFIX)
            .and_then(|s| s.strip_suffix(QR_STRING_SUFFIX))
            .ok_or(CartError::InvalidQrString)?;

        let compressed = util::decode_base41(body).ok_or(CartError::InvalidQrString)?;
        if compressed.len() > MAX_QR_STRING_LENGTH {
            log::error!("from_qr_string(): compressed size {} too large", compressed.len());
            return Err(CartError::QrStringTooLong);
        }

        // One byte over the largest possible dump is enough to detect oversized payloads.
        let limit = DUMP_HEADER_LENGTH + MAX_DATA_LENGTH;
        let mut bytes = Vec::new();
        ZlibDecoder::new(compressed.as_slice())
            .take(limit as u64 + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| CartError::CompressionError(e.to_string()))?;

        if bytes.len() > limit {
            log::error!("from_qr_string(): decompressed dump exceeds {} bytes", limit);
            return Err(CartError::InvalidQrString);
        }
        Self::from_bytes(&bytes)
    }
}

/// The game header stored in the system's internal flash or on a PCMCIA card, with the system ID
/// of the board it was installed on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RomHeaderDump {
    pub flags: DumpFlags,
    pub system_id: Identifier,
    pub data: [u8; ROM_HEADER_DATA_LENGTH],
}

impl RomHeaderDump {
    /// Erased flash reads back as 0xFF.
    pub fn clear_data(&mut self) {
        self.data = [0xFF; ROM_HEADER_DATA_LENGTH];
    }

    pub fn is_data_empty(&self) -> bool {
        util::sum(&self.data) == 0xFF * ROM_HEADER_DATA_LENGTH as u32
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CartError> {
        let header = RomHeaderDumpHeader {
            reserved: 0,
            flags: self.flags.bits(),
            system_id: self.system_id.data,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(ROM_HEADER_DUMP_HEADER_LENGTH + ROM_HEADER_DATA_LENGTH));
        header.write(&mut cursor)?;
        cursor.write_all(&self.data)?;
        Ok(cursor.into_inner())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CartError> {
        let mut cursor = Cursor::new(bytes);
        let header = RomHeaderDumpHeader::read(&mut cursor)?;

        let mut dump = RomHeaderDump {
            flags: DumpFlags::from_bits_retain(header.flags),
            system_id: Identifier::from(header.system_id),
            data: [0; ROM_HEADER_DATA_LENGTH],
        };
        cursor.read_exact(&mut dump.data)?;
        Ok(dump)
    }
}
