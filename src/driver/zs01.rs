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

//! Driver for the Konami ZS01 security microcontroller.

use crate::{
    driver::{read_ds2401, CartDriver, DriverError, DriverOptions},
    dump::CartDump,
    transport::{CartTransport, OneWireBus},
    types::{ChipType, DumpFlags},
    zs01::{
        Zs01Packet,
        Zs01Response,
        ADDR_CONFIG,
        ADDR_DATA_KEY,
        ADDR_DS2401_ID,
        ADDR_ERASE,
        ADDR_PRIVATE,
        ADDR_PRIVATE_END,
        ADDR_PUBLIC,
        ADDR_PUBLIC_END,
        ADDR_ZS01_ID,
        PACKET_LENGTH,
        PAYLOAD_LENGTH,
    },
    KEY_LENGTH,
};

/// Driver for ZS01 cartridges. The chip emulates a DS2401 itself, so the cartridge ID is read
/// through it rather than over 1-wire.
pub struct Zs01Driver<'a, T: CartTransport> {
    dump: &'a mut CartDump,
    bus: &'a mut T,
    options: DriverOptions,
    /// Scrambler state for privileged payloads: the address of the last response received.
    encoder_state: u8,
}

impl<'a, T: CartTransport> Zs01Driver<'a, T> {
    pub fn new(dump: &'a mut CartDump, bus: &'a mut T, options: DriverOptions) -> Self {
        dump.chip_type = ChipType::Zs01;
        dump.flags = DumpFlags::HAS_CART_ID;

        Zs01Driver {
            dump,
            bus,
            options,
            encoder_state: 0,
        }
    }

    /// Current scrambler state, as last set by a response from the chip.
    pub fn encoder_state(&self) -> u8 {
        self.encoder_state
    }

    /// Send a request that has already been encoded and return the decoded response.
    fn transact(&mut self, request: &Zs01Packet) -> Result<Zs01Packet, DriverError> {
        self.bus.delay_us(self.options.zs01_packet_delay);
        self.bus.i2c_start();

        if !self.bus.i2c_write_bytes(&request.to_bytes(), self.options.zs01_send_delay) {
            self.bus.i2c_stop();
            log::error!("transact(): NACK while sending request packet");
            return Err(DriverError::Zs01Nack);
        }

        let mut bytes = [0; PACKET_LENGTH];
        self.bus.i2c_read_bytes(&mut bytes);
        self.bus.i2c_stop();

        let mut response = Zs01Packet::from_bytes(&bytes);
        if !response.decode_response() {
            return Err(DriverError::Zs01CrcMismatch);
        }

        self.encoder_state = response.address;

        match response.response() {
            Zs01Response::NoError => Ok(response),
            code => {
                log::error!("transact(): ZS01 error, code=0x{:02x} ({:?})", u8::from(code), code);
                Err(DriverError::Zs01Error)
            }
        }
    }

    fn read(&mut self, address: u8, privileged: bool) -> Result<[u8; PAYLOAD_LENGTH], DriverError> {
        let key = self.dump.data_key;
        let mut request = Zs01Packet::default();

        request.encode_read_request(address, privileged.then_some(&key), self.encoder_state);
        Ok(self.transact(&request)?.data)
    }

    fn write(&mut self, address: u8, data: &[u8; PAYLOAD_LENGTH]) -> Result<(), DriverError> {
        let key = self.dump.data_key;
        let mut request = Zs01Packet::default();

        request.encode_write_request(address, data, Some(&key), self.encoder_state);
        self.transact(&request).map(|_| ())
    }

    fn read_blocks(&mut self, start: u8, end: u8, privileged: bool) -> Result<(), DriverError> {
        for address in start..end {
            let offset = address as usize * PAYLOAD_LENGTH;
            let block = self.read(address, privileged)?;

            self.dump.data[offset..offset + PAYLOAD_LENGTH].copy_from_slice(&block);
        }
        Ok(())
    }
}

impl<T: CartTransport> CartDriver for Zs01Driver<'_, T> {
    fn chip_type(&self) -> ChipType {
        ChipType::Zs01
    }

    fn dump(&self) -> &CartDump {
        self.dump
    }

    fn read_system_id(&mut self) -> Result<(), DriverError> {
        read_ds2401(
            self.bus,
            OneWireBus::System,
            &mut self.dump.system_id,
            &mut self.dump.flags,
            DumpFlags::HAS_SYSTEM_ID,
            DumpFlags::SYSTEM_ID_OK,
        )
    }

    fn read_cart_id(&mut self) -> Result<(), DriverError> {
        let zs_id = self.read(ADDR_ZS01_ID, false)?;
        self.dump.zs_id.data = zs_id;

        if !self.dump.zs_id.validate_ds_crc() {
            return Err(DriverError::Ds2401IdError);
        }
        self.dump.flags |= DumpFlags::ZS_ID_OK;

        let cart_id = self.read(ADDR_DS2401_ID, false)?;
        self.dump.cart_id.data = cart_id;

        if !self.dump.cart_id.validate_ds_crc() {
            return Err(DriverError::Ds2401IdError);
        }
        self.dump.flags |= DumpFlags::CART_ID_OK;

        log::debug!("read_cart_id(): ZS01 ID: {}, cart ID: {}", self.dump.zs_id, self.dump.cart_id);
        Ok(())
    }

    fn read_public_data(&mut self) -> Result<(), DriverError> {
        self.read_blocks(ADDR_PUBLIC, ADDR_PUBLIC_END, false)?;

        self.dump.flags |= DumpFlags::PUBLIC_DATA_OK;
        Ok(())
    }

    fn read_private_data(&mut self) -> Result<(), DriverError> {
        self.read_blocks(ADDR_PRIVATE, ADDR_PRIVATE_END, true)?;
        self.dump.flags |= DumpFlags::PRIVATE_DATA_OK;

        self.dump.config = self.read(ADDR_CONFIG, true)?;
        self.dump.flags |= DumpFlags::CONFIG_OK;
        Ok(())
    }

    fn write_data(&mut self) -> Result<(), DriverError> {
        for address in ADDR_PUBLIC..ADDR_PRIVATE_END {
            let offset = address as usize * PAYLOAD_LENGTH;
            let mut block = [0; PAYLOAD_LENGTH];
            block.copy_from_slice(&self.dump.data[offset..offset + PAYLOAD_LENGTH]);

            self.write(address, &block)?;
        }

        let config = self.dump.config;
        self.write(ADDR_CONFIG, &config)
    }

    fn erase(&mut self) -> Result<(), DriverError> {
        self.write(ADDR_ERASE, &[0; PAYLOAD_LENGTH])?;

        self.dump.clear_key();
        Ok(())
    }

    fn set_data_key(&mut self, key: &[u8; KEY_LENGTH]) -> Result<(), DriverError> {
        self.write(ADDR_DATA_KEY, key)?;

        self.dump.copy_key_from(key);
        Ok(())
    }
}
