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

    src/zs01.rs

    Implements the ZS01 packet cipher and CRC
*/

//! ZS01 packet format and scrambling.
//!
//! Every exchange with a ZS01 is a single 12-byte request followed by a 12-byte response. Requests
//! are scrambled with a fixed command key, and their payload may additionally be scrambled with
//! the cartridge's data key to authenticate privileged operations. Responses are scrambled with a
//! response key chosen by the host and sent along with read requests.
//!
//! The scrambling is obfuscation, not encryption: it has to stay byte-compatible with the chip.

use crate::{crc::zs01_crc16, KEY_LENGTH};

pub const PACKET_LENGTH: usize = 12;
pub const PAYLOAD_LENGTH: usize = 8;

// Request command flags. A request with neither READ nor ADDRESS_MSB set is a write.
pub const REQ_WRITE: u8 = 0;
pub const REQ_READ: u8 = 1 << 0;
pub const REQ_ADDRESS_MSB: u8 = 1 << 1;
pub const REQ_PRIVILEGED: u8 = 1 << 2;

pub const ADDR_PUBLIC: u8 = 0x00;
pub const ADDR_PUBLIC_END: u8 = 0x04;
pub const ADDR_PRIVATE: u8 = 0x04;
pub const ADDR_PRIVATE_END: u8 = 0x0E;
pub const ADDR_ZS01_ID: u8 = 0xFC;
pub const ADDR_DS2401_ID: u8 = 0xFD;
pub const ADDR_ERASE: u8 = 0xFD;
pub const ADDR_CONFIG: u8 = 0xFE;
pub const ADDR_DATA_KEY: u8 = 0xFF;

/// The scrambling parameters derived from an 8-byte key.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Zs01Key {
    pub add: [u8; KEY_LENGTH],
    pub shift: [u8; KEY_LENGTH],
}

/// Fixed key used by all ZS01 cartridges to scramble request packets.
#[rustfmt::skip]
pub const COMMAND_KEY: Zs01Key = Zs01Key {
    add:   [237, 8, 16, 11, 6, 4, 8, 30],
    shift: [  0, 3,  2,  2, 6, 2, 2,  1],
};

/// Key sent to the chip in every read request and used by it to scramble responses. The chip does
/// not place any requirements on it, so a null key is used.
pub const RESPONSE_KEY: Zs01Key = Zs01Key {
    add: [0; KEY_LENGTH],
    shift: [0; KEY_LENGTH],
};

impl Zs01Key {
    pub fn unpack_from(key: &[u8; KEY_LENGTH]) -> Self {
        let mut out = Zs01Key {
            add: [0; KEY_LENGTH],
            shift: [0; KEY_LENGTH],
        };

        out.add[0] = key[0];
        for i in 1..KEY_LENGTH {
            out.add[i] = key[i] & 0x1F;
            out.shift[i] = key[i] >> 5;
        }
        out
    }

    pub fn pack_into(&self, key: &mut [u8; KEY_LENGTH]) {
        key[0] = self.add[0];
        for i in 1..KEY_LENGTH {
            key[i] = (self.add[i] & 0x1F) | (self.shift[i] << 5);
        }
    }

    fn scramble_byte(&self, value: u8, state: u8) -> u8 {
        let mut value = (value ^ state).wrapping_add(self.add[0]);
        for i in 1..KEY_LENGTH {
            value = value.rotate_left(self.shift[i] as u32).wrapping_add(self.add[i]);
        }
        value
    }

    fn unscramble_byte(&self, value: u8, state: u8) -> u8 {
        let mut value = value;
        for i in (1..KEY_LENGTH).rev() {
            value = value.wrapping_sub(self.add[i]).rotate_right(self.shift[i] as u32);
        }
        value.wrapping_sub(self.add[0]) ^ state
    }

    /// Scramble a whole packet in place. Bytes are processed from last to first, each scrambled
    /// byte becoming the state for the one before it.
    pub fn encode_packet(&self, data: &mut [u8], state: u8) {
        let mut state = state;
        for byte in data.iter_mut().rev() {
            *byte = self.scramble_byte(*byte, state);
            state = *byte;
        }
    }

    /// Inverse of [`Zs01Key::encode_packet`].
    pub fn decode_packet(&self, data: &mut [u8], state: u8) {
        let mut state = state;
        for byte in data.iter_mut().rev() {
            let scrambled = *byte;
            *byte = self.unscramble_byte(scrambled, state);
            state = scrambled;
        }
    }

    /// Scramble a request payload in place. Unlike whole packets, payloads are processed from
    /// first to last.
    pub fn encode_payload(&self, data: &mut [u8], state: u8) {
        let mut state = state;
        for byte in data.iter_mut() {
            *byte = self.scramble_byte(*byte, state);
            state = *byte;
        }
    }

    /// Inverse of [`Zs01Key::encode_payload`].
    pub fn decode_payload(&self, data: &mut [u8], state: u8) {
        let mut state = state;
        for byte in data.iter_mut() {
            let scrambled = *byte;
            *byte = self.unscramble_byte(scrambled, state);
            state = scrambled;
        }
    }
}

/// Status codes returned by the chip in the command byte of a response. The exact meaning of most
/// error codes is unknown, so they are only distinguished, never interpreted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Zs01Response {
    NoError,
    UnknownError1,
    SecurityError1,
    SecurityError2,
    UnknownError2,
    SecurityError3,
    Other(u8),
}

impl From<u8> for Zs01Response {
    fn from(code: u8) -> Self {
        match code {
            0x00 => Zs01Response::NoError,
            0x01 => Zs01Response::UnknownError1,
            0x02 => Zs01Response::SecurityError1,
            0x03 => Zs01Response::SecurityError2,
            0x04 => Zs01Response::UnknownError2,
            0x05 => Zs01Response::SecurityError3,
            _ => Zs01Response::Other(code),
        }
    }
}

impl From<Zs01Response> for u8 {
    fn from(response: Zs01Response) -> Self {
        match response {
            Zs01Response::NoError => 0x00,
            Zs01Response::UnknownError1 => 0x01,
            Zs01Response::SecurityError1 => 0x02,
            Zs01Response::SecurityError2 => 0x03,
            Zs01Response::UnknownError2 => 0x04,
            Zs01Response::SecurityError3 => 0x05,
            Zs01Response::Other(code) => code,
        }
    }
}

/// A ZS01 request or response packet. The CRC is stored big-endian on the wire.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Zs01Packet {
    pub command: u8,
    pub address: u8,
    pub data: [u8; PAYLOAD_LENGTH],
    pub crc: [u8; 2],
}

impl Zs01Packet {
    pub fn to_bytes(&self) -> [u8; PACKET_LENGTH] {
        let mut out = [0; PACKET_LENGTH];
        out[0] = self.command;
        out[1] = self.address;
        out[2..10].copy_from_slice(&self.data);
        out[10..12].copy_from_slice(&self.crc);
        out
    }

    pub fn from_bytes(bytes: &[u8; PACKET_LENGTH]) -> Self {
        let mut packet = Zs01Packet {
            command: bytes[0],
            address: bytes[1],
            ..Default::default()
        };
        packet.data.copy_from_slice(&bytes[2..10]);
        packet.crc.copy_from_slice(&bytes[10..12]);
        packet
    }

    fn compute_crc(&self) -> u16 {
        let bytes = self.to_bytes();
        zs01_crc16(&bytes[..PACKET_LENGTH - 2])
    }

    pub fn update_crc(&mut self) {
        self.crc = self.compute_crc().to_be_bytes();
    }

    pub fn validate_crc(&self) -> bool {
        let value = self.compute_crc();
        let stored = u16::from_be_bytes(self.crc);

        if value != stored {
            log::warn!("validate_crc(): mismatch, exp=0x{:04x}, got=0x{:04x}", value, stored);
            return false;
        }
        true
    }

    pub fn response(&self) -> Zs01Response {
        Zs01Response::from(self.command)
    }

    /// Build a read request for `address`. The payload carries the response key the chip should use
    /// to scramble its reply. If `key` is given the request is privileged and its payload is
    /// scrambled with the data key and the current scrambler `state`.
    pub fn encode_read_request(&mut self, address: u8, key: Option<&[u8; KEY_LENGTH]>, state: u8) {
        self.command = REQ_READ;
        self.address = address;
        RESPONSE_KEY.pack_into(&mut self.data);

        self.encode_request(key, state);
    }

    /// Build a write request storing `data` at `address`, optionally privileged as for reads.
    pub fn encode_write_request(
        &mut self,
        address: u8,
        data: &[u8; PAYLOAD_LENGTH],
        key: Option<&[u8; KEY_LENGTH]>,
        state: u8,
    ) {
        self.command = REQ_WRITE;
        self.address = address;
        self.data = *data;

        self.encode_request(key, state);
    }

    fn encode_request(&mut self, key: Option<&[u8; KEY_LENGTH]>, state: u8) {
        match key {
            Some(_) => self.command |= REQ_PRIVILEGED,
            None => self.command &= !REQ_PRIVILEGED,
        }

        // The CRC covers the unscrambled payload.
        self.update_crc();

        if let Some(key) = key {
            Zs01Key::unpack_from(key).encode_payload(&mut self.data, state);
        }

        let mut bytes = self.to_bytes();
        COMMAND_KEY.encode_packet(&mut bytes, 0xFF);
        *self = Zs01Packet::from_bytes(&bytes);
    }

    /// Unscramble a response received from the chip and validate its CRC.
    pub fn decode_response(&mut self) -> bool {
        let mut bytes = self.to_bytes();
        RESPONSE_KEY.decode_packet(&mut bytes, 0xFF);
        *self = Zs01Packet::from_bytes(&bytes);

        self.validate_crc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    const DATA_KEY: [u8; 8] = [0x5E, 0xA3, 0x17, 0xC9, 0x44, 0xF0, 0x2B, 0x88];

    #[test]
    fn key_pack_round_trip() {
        let key = Zs01Key::unpack_from(&DATA_KEY);
        assert_eq!(key.add[0], 0x5E);
        assert_eq!(key.shift[0], 0);
        assert_eq!(key.add[1], 0xA3 & 0x1F);
        assert_eq!(key.shift[1], 0xA3 >> 5);

        let mut packed = [0; 8];
        key.pack_into(&mut packed);
        assert_eq!(packed, DATA_KEY);
    }

    #[test]
    fn packet_scrambling_round_trip() {
        let original: Vec<u8> = (0..PACKET_LENGTH as u8).map(|i| i.wrapping_mul(37)).collect();

        for state in [0x00, 0x5A, 0xFF] {
            let mut data = original.clone();
            COMMAND_KEY.encode_packet(&mut data, state);
            assert_ne!(data, original);
            COMMAND_KEY.decode_packet(&mut data, state);
            assert_eq!(data, original);
        }
    }

    #[test]
    fn payload_scrambling_round_trip() {
        let key = Zs01Key::unpack_from(&DATA_KEY);
        let original = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77];

        let mut data = original;
        key.encode_payload(&mut data, 0x42);
        key.decode_payload(&mut data, 0x42);
        assert_eq!(data, original);

        key.encode_payload(&mut data, 0x42);
        let wrong = Zs01Key::unpack_from(&[0x5F, 0xA3, 0x17, 0xC9, 0x44, 0xF0, 0x2B, 0x88]);
        wrong.decode_payload(&mut data, 0x42);
        assert_ne!(data, original);
    }

    #[test]
    fn packet_scrambling_runs_back_to_front() {
        // With a null key scrambling is a chain of XORs, so the last byte only depends on the state.
        let mut data = [0x00, 0x00, 0x01];
        RESPONSE_KEY.encode_packet(&mut data, 0xFF);
        assert_eq!(data, [0xFE, 0xFE, 0xFE]);

        let mut data = [0x00, 0x00, 0x01];
        RESPONSE_KEY.encode_payload(&mut data, 0xFF);
        assert_eq!(data, [0xFF, 0xFF, 0xFE]);
    }

    #[test]
    fn crc_detects_corruption() {
        init();
        let mut packet = Zs01Packet {
            command: REQ_READ,
            address: ADDR_CONFIG,
            data: [1, 2, 3, 4, 5, 6, 7, 8],
            crc: [0; 2],
        };
        packet.update_crc();
        assert!(packet.validate_crc());

        for i in 0..PAYLOAD_LENGTH {
            let mut corrupt = packet;
            corrupt.data[i] ^= 0x10;
            assert!(!corrupt.validate_crc());
        }
    }

    #[test]
    fn request_decodes_back_to_plain_packet() {
        let state = 0x3C;
        let payload = [0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7];

        let mut request = Zs01Packet::default();
        request.encode_write_request(0x05, &payload, Some(&DATA_KEY), state);

        let mut bytes = request.to_bytes();
        COMMAND_KEY.decode_packet(&mut bytes, 0xFF);
        let mut plain = Zs01Packet::from_bytes(&bytes);

        assert_eq!(plain.command, REQ_WRITE | REQ_PRIVILEGED);
        assert_eq!(plain.address, 0x05);
        assert_ne!(plain.data, payload);

        Zs01Key::unpack_from(&DATA_KEY).decode_payload(&mut plain.data, state);
        assert_eq!(plain.data, payload);
        assert!(plain.validate_crc());
    }

    #[test]
    fn unprivileged_read_request() {
        let mut request = Zs01Packet::default();
        request.encode_read_request(ADDR_ZS01_ID, None, 0x99);

        let mut bytes = request.to_bytes();
        COMMAND_KEY.decode_packet(&mut bytes, 0xFF);
        let plain = Zs01Packet::from_bytes(&bytes);

        assert_eq!(plain.command, REQ_READ);
        assert_eq!(plain.address, ADDR_ZS01_ID);
        assert_eq!(plain.data, [0; 8]);
        assert!(plain.validate_crc());
    }

    #[test]
    fn response_codes_are_preserved() {
        let mut response = Zs01Packet {
            command: 0x05,
            address: 0x12,
            ..Default::default()
        };
        response.update_crc();

        let mut bytes = response.to_bytes();
        RESPONSE_KEY.encode_packet(&mut bytes, 0xFF);
        let mut received = Zs01Packet::from_bytes(&bytes);

        assert!(received.decode_response());
        assert_eq!(received.response(), Zs01Response::SecurityError3);
        assert_eq!(received.address, 0x12);
        assert_eq!(Zs01Response::from(0x42), Zs01Response::Other(0x42));
        assert_eq!(u8::from(Zs01Response::Other(0x42)), 0x42);
    }
}
