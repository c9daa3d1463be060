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

    tests/common/mod.rs

    Common support routines for tests
*/

//! Simulated cartridge hardware for driver tests.
//!
//! [`SimBus`] implements [`CartTransport`] on top of a simulated security chip and up to two DS2401
//! serial number chips, one on each 1-wire bus.
#![allow(dead_code)]

use cart573::{
    prelude::*,
    transport::{DS2401_READ_ROM, ID_X76F041, ID_X76F100, ID_ZS01},
    zs01::{
        Zs01Key,
        Zs01Packet,
        ADDR_CONFIG,
        ADDR_DATA_KEY,
        ADDR_DS2401_ID,
        ADDR_ERASE,
        ADDR_PRIVATE_END,
        ADDR_PUBLIC_END,
        ADDR_ZS01_ID,
        COMMAND_KEY,
        PACKET_LENGTH,
        PAYLOAD_LENGTH,
        REQ_PRIVILEGED,
        REQ_READ,
        RESPONSE_KEY,
    },
};
use std::collections::VecDeque;

/// Build a valid DS2401 ID from a 48-bit serial number.
pub fn ds2401_id(serial: [u8; 6]) -> Identifier {
    let mut id = Identifier::default();
    id.data[0] = 0x01;
    id.data[1..7].copy_from_slice(&serial);
    id.update_ds_crc();
    id
}

pub fn hex_dump(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// The bus side of a simulated I2C chip.
pub trait I2cDevice {
    fn start(&mut self, cs: bool);
    fn stop(&mut self, cs: bool);
    fn write(&mut self, value: u8) -> bool;
    fn read(&mut self) -> u8;
}

/* ZS01 */

const ZS01_DATA_LENGTH: usize = 112;
const ZS01_SECURITY_ERROR: u8 = 0x02;
const ZS01_UNKNOWN_ERROR: u8 = 0x01;

pub struct Zs01Sim {
    pub data: [u8; ZS01_DATA_LENGTH],
    pub config: [u8; 8],
    pub key: [u8; 8],
    pub zs_id: Identifier,
    pub cart_id: Identifier,
    /// Refuse to acknowledge request bytes.
    pub nack: bool,
    /// Flip a bit in every response after computing its CRC.
    pub corrupt_responses: bool,
    pub requests: usize,
    state: u8,
    rx: Vec<u8>,
    tx: VecDeque<u8>,
}

impl Zs01Sim {
    pub fn new(key: [u8; 8]) -> Self {
        Zs01Sim {
            data: [0; ZS01_DATA_LENGTH],
            config: [0; 8],
            key,
            zs_id: ds2401_id([0x5A, 0x53, 0x30, 0x31, 0x00, 0x01]),
            cart_id: ds2401_id([0x8E, 0x21, 0x6B, 0x32, 0x0B, 0x00]),
            nack: false,
            corrupt_responses: false,
            requests: 0,
            state: 0,
            rx: Vec::new(),
            tx: VecDeque::new(),
        }
    }

    pub fn state(&self) -> u8 {
        self.state
    }

    fn execute(&mut self, packet: &Zs01Packet, privileged: bool) -> (u8, [u8; PAYLOAD_LENGTH]) {
        let mut out = [0; PAYLOAD_LENGTH];
        let address = packet.address;
        let offset = address as usize * PAYLOAD_LENGTH;

        if packet.command & REQ_READ != 0 {
            match address {
                a if a < ADDR_PUBLIC_END => out.copy_from_slice(&self.data[offset..offset + PAYLOAD_LENGTH]),
                a if a < ADDR_PRIVATE_END => {
                    if !privileged {
                        return (ZS01_SECURITY_ERROR, out);
                    }
                    out.copy_from_slice(&self.data[offset..offset + PAYLOAD_LENGTH]);
                }
                ADDR_ZS01_ID => out = self.zs_id.data,
                ADDR_DS2401_ID => out = self.cart_id.data,
                ADDR_CONFIG => {
                    if !privileged {
                        return (ZS01_SECURITY_ERROR, out);
                    }
                    out = self.config;
                }
                _ => return (ZS01_UNKNOWN_ERROR, out),
            }
            return (0, out);
        }

        if !privileged {
            return (ZS01_SECURITY_ERROR, out);
        }
        match address {
            a if a < ADDR_PRIVATE_END => {
                self.data[offset..offset + PAYLOAD_LENGTH].copy_from_slice(&packet.data);
            }
            ADDR_ERASE => {
                self.data = [0; ZS01_DATA_LENGTH];
                self.config = [0; 8];
                self.key = [0; 8];
            }
            ADDR_CONFIG => self.config = packet.data,
            ADDR_DATA_KEY => self.key = packet.data,
            _ => return (ZS01_UNKNOWN_ERROR, out),
        }
        (0, out)
    }

    fn process(&mut self) {
        self.requests += 1;

        let mut bytes = [0; PACKET_LENGTH];
        bytes.copy_from_slice(&self.rx);
        COMMAND_KEY.decode_packet(&mut bytes, 0xFF);

        let mut packet = Zs01Packet::from_bytes(&bytes);
        let privileged = packet.command & REQ_PRIVILEGED != 0;
        if privileged {
            Zs01Key::unpack_from(&self.key).decode_payload(&mut packet.data, self.state);
        }

        // A wrong key garbles the payload, which is caught by the CRC.
        let (code, data) = match packet.validate_crc() {
            true => self.execute(&packet, privileged),
            false => (ZS01_SECURITY_ERROR, [0; PAYLOAD_LENGTH]),
        };

        self.state = self.state.wrapping_mul(0x1D).wrapping_add(0x47);

        let mut response = Zs01Packet {
            command: code,
            address: self.state,
            data,
            crc: [0; 2],
        };
        response.update_crc();
        if self.corrupt_responses {
            response.data[0] ^= 0x01;
        }

        let mut out = response.to_bytes();
        RESPONSE_KEY.encode_packet(&mut out, 0xFF);
        self.tx = out.into_iter().collect();
    }
}

impl I2cDevice for Zs01Sim {
    fn start(&mut self, _cs: bool) {
        self.rx.clear();
    }

    fn stop(&mut self, _cs: bool) {
        self.rx.clear();
    }

    fn write(&mut self, value: u8) -> bool {
        if self.nack {
            return false;
        }
        self.rx.push(value);
        if self.rx.len() == PACKET_LENGTH {
            self.process();
            self.rx.clear();
        }
        true
    }

    fn read(&mut self) -> u8 {
        self.tx.pop_front().unwrap_or(0xFF)
    }
}

/* X76 */

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum X76Phase {
    Idle,
    Command,
    Polling { accepted: bool },
    Active,
}

pub struct X76F041Sim {
    pub data: [u8; 512],
    pub config: [u8; 5],
    pub key: [u8; 8],
    /// Offset of a byte whose lowest bit can't be programmed.
    pub stuck_bit: Option<usize>,
    /// Accepted (command, parameter) pairs.
    pub commands: Vec<(u8, u8)>,
    phase: X76Phase,
    rx: Vec<u8>,
    cmd: u8,
    param: u8,
    pointer: usize,
    setup_pending: bool,
    pending: Vec<u8>,
}

impl X76F041Sim {
    pub fn new(key: [u8; 8]) -> Self {
        X76F041Sim {
            data: [0; 512],
            config: [0; 5],
            key,
            stuck_bit: None,
            commands: Vec::new(),
            phase: X76Phase::Idle,
            rx: Vec::new(),
            cmd: 0,
            param: 0,
            pointer: 0,
            setup_pending: false,
            pending: Vec::new(),
        }
    }

    fn is_read(&self) -> bool {
        self.cmd & 0xE0 == 0x60
    }

    fn is_write(&self) -> bool {
        self.cmd & 0xE0 == 0x40
    }

    fn is_valid(&self) -> bool {
        self.is_read() || self.is_write() || (self.cmd == 0x80 && [0x20, 0x50, 0x60, 0x70].contains(&self.param))
    }

    fn begin(&mut self) {
        self.commands.push((self.cmd, self.param));
        self.pointer = ((self.cmd as usize & 1) << 8) | self.param as usize;
        self.setup_pending = self.is_read();
        if self.cmd == 0x80 {
            self.pointer = 0;
        }
    }

    fn commit(&mut self) {
        if self.is_write() {
            for (i, &byte) in self.pending.iter().take(8).enumerate() {
                let offset = self.pointer + i;
                let mut value = byte;
                if self.stuck_bit == Some(offset) {
                    value &= !1;
                }
                self.data[offset] = value;
            }
        }
        else if self.cmd == 0x80 {
            match self.param {
                0x50 if self.pending.len() >= 5 => self.config.copy_from_slice(&self.pending[..5]),
                0x20 if self.pending.len() == 16 && self.pending[..8] == self.pending[8..] => {
                    self.key.copy_from_slice(&self.pending[..8]);
                }
                0x70 => {
                    self.data = [0; 512];
                    self.config = [0; 5];
                    self.key = [0; 8];
                }
                _ => {}
            }
        }
    }
}

impl I2cDevice for X76F041Sim {
    fn start(&mut self, cs: bool) {
        if cs {
            self.phase = X76Phase::Command;
            self.rx.clear();
            self.pending.clear();
        }
    }

    fn stop(&mut self, cs: bool) {
        if cs && self.phase == X76Phase::Active {
            self.commit();
        }
        if cs {
            self.phase = X76Phase::Idle;
        }
    }

    fn write(&mut self, value: u8) -> bool {
        match self.phase {
            X76Phase::Idle => false,
            X76Phase::Command => {
                self.rx.push(value);
                if self.rx.len() == 10 {
                    self.cmd = self.rx[0];
                    self.param = self.rx[1];
                    let accepted = self.rx[2..10] == self.key && self.is_valid();
                    self.phase = X76Phase::Polling { accepted };
                }
                true
            }
            X76Phase::Polling { accepted } => {
                if accepted && value == 0xC0 {
                    self.phase = X76Phase::Active;
                    self.begin();
                    return true;
                }
                false
            }
            X76Phase::Active => {
                if self.is_read() {
                    // Address resent after the setup byte.
                    self.pointer = ((self.cmd as usize & 1) << 8) | value as usize;
                }
                else {
                    self.pending.push(value);
                }
                true
            }
        }
    }

    fn read(&mut self) -> u8 {
        if self.phase != X76Phase::Active {
            return 0xFF;
        }
        if self.is_read() {
            if self.setup_pending {
                self.setup_pending = false;
                return 0xFF;
            }
            let value = self.data[self.pointer % 512];
            self.pointer += 1;
            return value;
        }
        if self.cmd == 0x80 && self.param == 0x60 {
            let value = self.config.get(self.pointer).copied().unwrap_or(0xFF);
            self.pointer += 1;
            return value;
        }
        0xFF
    }
}

pub struct X76F100Sim {
    pub data: [u8; 112],
    pub read_key: [u8; 8],
    pub write_key: [u8; 8],
    pub stuck_bit: Option<usize>,
    pub commands: Vec<u8>,
    phase: X76Phase,
    rx: Vec<u8>,
    cmd: u8,
    pointer: usize,
    pending: Vec<u8>,
}

impl X76F100Sim {
    pub fn new(key: [u8; 8]) -> Self {
        X76F100Sim {
            data: [0; 112],
            read_key: key,
            write_key: key,
            stuck_bit: None,
            commands: Vec::new(),
            phase: X76Phase::Idle,
            rx: Vec::new(),
            cmd: 0,
            pointer: 0,
            pending: Vec::new(),
        }
    }

    fn required_key(&self, cmd: u8) -> Option<[u8; 8]> {
        match cmd {
            0x81 | 0xFE => Some(self.read_key),
            0xFC => Some(self.write_key),
            0x80..=0x9A if cmd & 1 == 0 => Some(self.write_key),
            _ => None,
        }
    }

    fn commit(&mut self) {
        match self.cmd {
            0x81 => {}
            0xFC if self.pending.len() == 8 => self.write_key.copy_from_slice(&self.pending),
            0xFE if self.pending.len() == 8 => self.read_key.copy_from_slice(&self.pending),
            0x80..=0x9A => {
                for (i, &byte) in self.pending.iter().take(8).enumerate() {
                    let offset = self.pointer + i;
                    let mut value = byte;
                    if self.stuck_bit == Some(offset) {
                        value &= !1;
                    }
                    self.data[offset] = value;
                }
            }
            _ => {}
        }
    }
}

impl I2cDevice for X76F100Sim {
    fn start(&mut self, cs: bool) {
        if cs {
            self.phase = X76Phase::Command;
            self.rx.clear();
            self.pending.clear();
        }
    }

    fn stop(&mut self, cs: bool) {
        if cs && self.phase == X76Phase::Active {
            self.commit();
        }
        if cs {
            self.phase = X76Phase::Idle;
        }
    }

    fn write(&mut self, value: u8) -> bool {
        match self.phase {
            X76Phase::Idle => false,
            X76Phase::Command => {
                self.rx.push(value);
                if self.rx.len() == 9 {
                    self.cmd = self.rx[0];
                    let accepted = self.required_key(self.cmd).is_some_and(|key| self.rx[1..9] == key);
                    self.phase = X76Phase::Polling { accepted };
                }
                true
            }
            X76Phase::Polling { accepted } => {
                if accepted && value == 0x55 {
                    self.phase = X76Phase::Active;
                    self.commands.push(self.cmd);
                    self.pointer = match self.cmd {
                        0x80..=0x9A => ((self.cmd as usize & 0x7E) >> 1) * 8,
                        _ => 0,
                    };
                    return true;
                }
                false
            }
            X76Phase::Active => {
                self.pending.push(value);
                true
            }
        }
    }

    fn read(&mut self) -> u8 {
        if self.phase != X76Phase::Active || self.cmd != 0x81 {
            return 0xFF;
        }
        let value = self.data.get(self.pointer).copied().unwrap_or(0xFF);
        self.pointer += 1;
        value
    }
}

/* Bus */

pub enum SimChip {
    None,
    Zs01(Zs01Sim),
    X76F041(X76F041Sim),
    X76F100(X76F100Sim),
}

pub struct SimBus {
    pub inserted: bool,
    pub chip: SimChip,
    pub system_ds2401: Option<Identifier>,
    pub cart_ds2401: Option<Identifier>,
    pub elapsed_us: u64,
    /// Make a ZS01 answer the X76 reset sequence like an X76F041 would.
    pub zs01_acks_x76_reset: bool,
    one_wire_pos: [Option<usize>; 2],
}

impl SimBus {
    pub fn new(chip: SimChip) -> Self {
        SimBus {
            inserted: !matches!(chip, SimChip::None),
            chip,
            system_ds2401: Some(ds2401_id([0x10, 0x20, 0x30, 0x40, 0x50, 0x60])),
            cart_ds2401: None,
            elapsed_us: 0,
            zs01_acks_x76_reset: false,
            one_wire_pos: [None; 2],
        }
    }

    pub fn empty() -> Self {
        SimBus::new(SimChip::None)
    }

    pub fn zs01(&mut self) -> &mut Zs01Sim {
        match &mut self.chip {
            SimChip::Zs01(sim) => sim,
            _ => panic!("not a ZS01"),
        }
    }

    pub fn x76f041(&mut self) -> &mut X76F041Sim {
        match &mut self.chip {
            SimChip::X76F041(sim) => sim,
            _ => panic!("not an X76F041"),
        }
    }

    pub fn x76f100(&mut self) -> &mut X76F100Sim {
        match &mut self.chip {
            SimChip::X76F100(sim) => sim,
            _ => panic!("not an X76F100"),
        }
    }

    fn device(&mut self) -> Option<&mut dyn I2cDevice> {
        match &mut self.chip {
            SimChip::None => None,
            SimChip::Zs01(sim) => Some(sim as &mut dyn I2cDevice),
            SimChip::X76F041(sim) => Some(sim as &mut dyn I2cDevice),
            SimChip::X76F100(sim) => Some(sim as &mut dyn I2cDevice),
        }
    }

    fn ds2401(&self, bus: OneWireBus) -> Option<Identifier> {
        match bus {
            OneWireBus::System => self.system_ds2401,
            OneWireBus::Cart => self.cart_ds2401,
        }
    }
}

impl CartTransport for SimBus {
    fn cart_inserted(&mut self) -> bool {
        self.inserted
    }

    fn reset_zs01(&mut self) -> u32 {
        match self.chip {
            SimChip::Zs01(_) => ID_ZS01,
            _ => 0xFFFF_FFFF,
        }
    }

    fn reset_x76(&mut self) -> u32 {
        match self.chip {
            SimChip::X76F041(_) => ID_X76F041,
            SimChip::X76F100(_) => ID_X76F100,
            SimChip::Zs01(_) if self.zs01_acks_x76_reset => ID_X76F041,
            _ => 0xFFFF_FFFF,
        }
    }

    fn i2c_start(&mut self) {
        if let Some(device) = self.device() {
            device.start(false);
        }
    }

    fn i2c_start_with_cs(&mut self) {
        if let Some(device) = self.device() {
            device.start(true);
        }
    }

    fn i2c_stop(&mut self) {
        if let Some(device) = self.device() {
            device.stop(false);
        }
    }

    fn i2c_stop_with_cs(&mut self, delay_us: u32) {
        if let Some(device) = self.device() {
            device.stop(true);
        }
        self.delay_us(delay_us);
    }

    fn i2c_write_byte(&mut self, value: u8) -> bool {
        self.device().is_some_and(|device| device.write(value))
    }

    fn i2c_read_byte(&mut self) -> u8 {
        self.device().map_or(0xFF, |device| device.read())
    }

    fn one_wire_reset(&mut self, bus: OneWireBus) -> bool {
        let present = self.ds2401(bus).is_some();
        self.one_wire_pos[bus as usize] = None;
        present
    }

    fn one_wire_write_byte(&mut self, bus: OneWireBus, value: u8) {
        if value == DS2401_READ_ROM && self.ds2401(bus).is_some() {
            self.one_wire_pos[bus as usize] = Some(0);
        }
    }

    fn one_wire_read_byte(&mut self, bus: OneWireBus) -> u8 {
        let (Some(id), Some(pos)) = (self.ds2401(bus), self.one_wire_pos[bus as usize]) else {
            return 0xFF;
        };
        self.one_wire_pos[bus as usize] = Some(pos + 1);
        id.data.get(pos).copied().unwrap_or(0xFF)
    }

    fn delay_us(&mut self, us: u32) {
        self.elapsed_us += us as u64;
    }
}
