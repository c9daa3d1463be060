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

//! Drivers for the X76F041 and X76F100 secure EEPROMs.
//!
//! Both chips use the same framing: chip select is asserted, a command (and optional parameter) is
//! sent followed by the 8-byte key, then the host repeatedly sends an ACK poll byte until the chip
//! acknowledges it. A chip given the wrong key never acknowledges polling. The cartridge ID comes
//! from a separate DS2401 on the cartridge's 1-wire bus.

use crate::{
    driver::{read_ds2401, CartDriver, DriverError, DriverOptions},
    dump::CartDump,
    transport::{CartTransport, OneWireBus},
    types::{ChipType, DumpFlags},
    CONFIG_LENGTH,
    KEY_LENGTH,
};

const X76_BLOCK_LENGTH: usize = 8;

const X76F041_DATA_LENGTH: usize = 512;
// A single read can't cross a 128-byte block boundary.
const X76F041_READ_LENGTH: usize = 128;
const X76F041_CONFIG_LENGTH: usize = 5;

const X76F041_WRITE: u8 = 0x40;
const X76F041_READ: u8 = 0x60;
const X76F041_CONFIG: u8 = 0x80;
const X76F041_ACK_POLL: u8 = 0xC0;

const X76F041_CFG_SET_DATA_KEY: u8 = 0x20;
const X76F041_CFG_WRITE_CONFIG: u8 = 0x50;
const X76F041_CFG_READ_CONFIG: u8 = 0x60;
const X76F041_CFG_MASS_PROGRAM: u8 = 0x70;

const X76F100_DATA_LENGTH: usize = 112;

const X76F100_ACK_POLL: u8 = 0x55;
const X76F100_WRITE: u8 = 0x80;
const X76F100_READ: u8 = 0x81;
const X76F100_SET_KEY: u8 = 0xFC;

/// Framing and 1-wire access shared by both X76 chips.
pub struct X76Driver<'a, T: CartTransport> {
    dump: &'a mut CartDump,
    bus: &'a mut T,
    options: DriverOptions,
}

impl<'a, T: CartTransport> X76Driver<'a, T> {
    fn new(dump: &'a mut CartDump, bus: &'a mut T, options: DriverOptions, chip_type: ChipType) -> Self {
        dump.chip_type = chip_type;
        dump.flags = DumpFlags::empty();

        X76Driver { dump, bus, options }
    }

    /// Send a command authenticated with the dump's data key and wait for the chip to accept it.
    fn command(&mut self, poll_byte: u8, cmd: u8, param: Option<u8>) -> Result<(), DriverError> {
        self.bus.delay_us(self.options.x76_packet_delay);
        self.bus.i2c_start_with_cs();

        if !self.bus.i2c_write_byte(cmd) {
            self.bus.i2c_stop_with_cs(0);
            log::error!("command(): NACK while sending cmd=0x{:02x}", cmd);
            return Err(DriverError::X76Nack);
        }

        if let Some(param) = param {
            if !self.bus.i2c_write_byte(param) {
                self.bus.i2c_stop_with_cs(0);
                log::error!("command(): NACK while sending param=0x{:02x}", param);
                return Err(DriverError::X76Nack);
            }
        }

        let key = self.dump.data_key;
        if !self.bus.i2c_write_bytes(&key, 0) {
            self.bus.i2c_stop_with_cs(0);
            log::error!("command(): NACK while sending data key");
            return Err(DriverError::X76Nack);
        }

        for _ in 0..self.options.x76_max_ack_polls {
            self.bus.delay_us(self.options.x76_write_delay);
            self.bus.i2c_start();

            if self.bus.i2c_write_byte(poll_byte) {
                return Ok(());
            }
        }

        self.bus.i2c_stop_with_cs(0);
        log::warn!("command(): ACK polling timeout (wrong key?)");
        Err(DriverError::X76PollFail)
    }

    /// Issue a command, then send `data` and end the transaction, waiting for the write to complete.
    fn write_command(&mut self, poll_byte: u8, cmd: u8, param: Option<u8>, data: &[u8]) -> Result<(), DriverError> {
        self.command(poll_byte, cmd, param)?;

        let ok = self.bus.i2c_write_bytes(data, 0);
        self.bus.i2c_stop_with_cs(self.options.x76_write_delay);

        if !ok {
            log::error!("write_command(): NACK while sending data bytes, cmd=0x{:02x}", cmd);
            return Err(DriverError::X76Nack);
        }
        Ok(())
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
        read_ds2401(
            self.bus,
            OneWireBus::Cart,
            &mut self.dump.cart_id,
            &mut self.dump.flags,
            DumpFlags::HAS_CART_ID,
            DumpFlags::CART_ID_OK,
        )
    }

    fn verify(&self, expected: &[u8], actual: &[u8]) -> Result<(), DriverError> {
        if let Some(pos) = expected.iter().zip(actual).position(|(a, b)| a != b) {
            log::error!(
                "verify(): mismatch at offset {}, exp=0x{:02x}, got=0x{:02x}",
                pos,
                expected[pos],
                actual[pos]
            );
            return Err(DriverError::X76VerifyFail);
        }
        Ok(())
    }
}

/// Driver for the 512-byte X76F041. Games protect all operations with the configuration key, so
/// it is the only key managed here.
pub struct X76F041Driver<'a, T: CartTransport> {
    base: X76Driver<'a, T>,
}

impl<'a, T: CartTransport> X76F041Driver<'a, T> {
    pub fn new(dump: &'a mut CartDump, bus: &'a mut T, options: DriverOptions) -> Self {
        X76F041Driver {
            base: X76Driver::new(dump, bus, options, ChipType::X76F041),
        }
    }

    fn read_data_into(&mut self, out: &mut [u8; X76F041_DATA_LENGTH]) -> Result<(), DriverError> {
        for offset in (0..X76F041_DATA_LENGTH).step_by(X76F041_READ_LENGTH) {
            let address = (offset & 0xFF) as u8;

            self.base
                .command(X76F041_ACK_POLL, X76F041_READ | (offset >> 8) as u8, Some(address))?;

            // Ignore "secure read setup" byte
            self.base.bus.i2c_read_byte();
            self.base.bus.i2c_start();

            if !self.base.bus.i2c_write_byte(address) {
                self.base.bus.i2c_stop_with_cs(0);
                log::error!("read_data_into(): NACK after resending addr=0x{:02x}", address);
                return Err(DriverError::X76Nack);
            }

            self.base
                .bus
                .i2c_read_bytes(&mut out[offset..offset + X76F041_READ_LENGTH]);
            self.base.bus.i2c_stop_with_cs(0);
        }
        Ok(())
    }

    fn read_config_into(&mut self, out: &mut [u8; CONFIG_LENGTH]) -> Result<(), DriverError> {
        self.base
            .command(X76F041_ACK_POLL, X76F041_CONFIG, Some(X76F041_CFG_READ_CONFIG))?;

        *out = [0; CONFIG_LENGTH];
        self.base.bus.i2c_read_bytes(&mut out[..X76F041_CONFIG_LENGTH]);
        self.base.bus.i2c_stop_with_cs(0);
        Ok(())
    }
}

impl<T: CartTransport> CartDriver for X76F041Driver<'_, T> {
    fn chip_type(&self) -> ChipType {
        ChipType::X76F041
    }

    fn dump(&self) -> &CartDump {
        self.base.dump
    }

    fn read_system_id(&mut self) -> Result<(), DriverError> {
        self.base.read_system_id()
    }

    fn read_cart_id(&mut self) -> Result<(), DriverError> {
        self.base.read_cart_id()
    }

    fn read_private_data(&mut self) -> Result<(), DriverError> {
        let mut data = [0; X76F041_DATA_LENGTH];
        self.read_data_into(&mut data)?;

        self.base.dump.data[..X76F041_DATA_LENGTH].copy_from_slice(&data);
        self.base.dump.flags |= DumpFlags::PRIVATE_DATA_OK;

        let mut config = [0; CONFIG_LENGTH];
        self.read_config_into(&mut config)?;

        self.base.dump.config = config;
        self.base.dump.flags |= DumpFlags::CONFIG_OK;
        Ok(())
    }

    fn write_data(&mut self) -> Result<(), DriverError> {
        // Writes can only be done in 8-byte blocks.
        for offset in (0..X76F041_DATA_LENGTH).step_by(X76_BLOCK_LENGTH) {
            let mut block = [0; X76_BLOCK_LENGTH];
            block.copy_from_slice(&self.base.dump.data[offset..offset + X76_BLOCK_LENGTH]);

            self.base.write_command(
                X76F041_ACK_POLL,
                X76F041_WRITE | (offset >> 8) as u8,
                Some((offset & 0xFF) as u8),
                &block,
            )?;
        }

        let config = self.base.dump.config;
        self.base.write_command(
            X76F041_ACK_POLL,
            X76F041_CONFIG,
            Some(X76F041_CFG_WRITE_CONFIG),
            &config[..X76F041_CONFIG_LENGTH],
        )?;

        if self.base.options.x76_verify_writes {
            let mut data = [0; X76F041_DATA_LENGTH];
            self.read_data_into(&mut data)?;
            self.base.verify(&self.base.dump.data[..X76F041_DATA_LENGTH], &data)?;

            let mut read_config = [0; CONFIG_LENGTH];
            self.read_config_into(&mut read_config)?;
            self.base
                .verify(&config[..X76F041_CONFIG_LENGTH], &read_config[..X76F041_CONFIG_LENGTH])?;
        }
        Ok(())
    }

    fn erase(&mut self) -> Result<(), DriverError> {
        self.base
            .command(X76F041_ACK_POLL, X76F041_CONFIG, Some(X76F041_CFG_MASS_PROGRAM))?;
        self.base.bus.i2c_stop_with_cs(self.base.options.x76_write_delay);

        self.base.dump.clear_key();
        Ok(())
    }

    fn set_data_key(&mut self, key: &[u8; KEY_LENGTH]) -> Result<(), DriverError> {
        // The new key must be sent twice as a way of ensuring it gets received correctly.
        let mut payload = [0; KEY_LENGTH * 2];
        payload[..KEY_LENGTH].copy_from_slice(key);
        payload[KEY_LENGTH..].copy_from_slice(key);

        self.base.write_command(
            X76F041_ACK_POLL,
            X76F041_CONFIG,
            Some(X76F041_CFG_SET_DATA_KEY),
            &payload,
        )?;

        self.base.dump.copy_key_from(key);
        Ok(())
    }
}

/// Driver for the 112-byte X76F100, which has separate read and write keys. Both are always set to
/// the same value.
pub struct X76F100Driver<'a, T: CartTransport> {
    base: X76Driver<'a, T>,
}

impl<'a, T: CartTransport> X76F100Driver<'a, T> {
    pub fn new(dump: &'a mut CartDump, bus: &'a mut T, options: DriverOptions) -> Self {
        X76F100Driver {
            base: X76Driver::new(dump, bus, options, ChipType::X76F100),
        }
    }

    fn read_data_into(&mut self, out: &mut [u8; X76F100_DATA_LENGTH]) -> Result<(), DriverError> {
        self.base.command(X76F100_ACK_POLL, X76F100_READ, None)?;

        self.base.bus.i2c_read_bytes(out);
        self.base.bus.i2c_stop_with_cs(0);
        Ok(())
    }

    fn write_blocks(&mut self, data: &[u8; X76F100_DATA_LENGTH]) -> Result<(), DriverError> {
        for (i, block) in data.chunks_exact(X76_BLOCK_LENGTH).enumerate() {
            self.base
                .write_command(X76F100_ACK_POLL, X76F100_WRITE | ((i as u8) << 1), None, block)?;
        }
        Ok(())
    }
}

impl<T: CartTransport> CartDriver for X76F100Driver<'_, T> {
    fn chip_type(&self) -> ChipType {
        ChipType::X76F100
    }

    fn dump(&self) -> &CartDump {
        self.base.dump
    }

    fn read_system_id(&mut self) -> Result<(), DriverError> {
        self.base.read_system_id()
    }

    fn read_cart_id(&mut self) -> Result<(), DriverError> {
        self.base.read_cart_id()
    }

    fn read_private_data(&mut self) -> Result<(), DriverError> {
        let mut data = [0; X76F100_DATA_LENGTH];
        self.read_data_into(&mut data)?;

        self.base.dump.data[..X76F100_DATA_LENGTH].copy_from_slice(&data);
        self.base.dump.flags |= DumpFlags::PRIVATE_DATA_OK;
        Ok(())
    }

    fn write_data(&mut self) -> Result<(), DriverError> {
        let mut data = [0; X76F100_DATA_LENGTH];
        data.copy_from_slice(&self.base.dump.data[..X76F100_DATA_LENGTH]);

        self.write_blocks(&data)?;

        if self.base.options.x76_verify_writes {
            let mut read_back = [0; X76F100_DATA_LENGTH];
            self.read_data_into(&mut read_back)?;
            self.base.verify(&data, &read_back)?;
        }
        Ok(())
    }

    fn erase(&mut self) -> Result<(), DriverError> {
        // There is no erase command, so blocks are cleared one at a time and the keys reset.
        self.write_blocks(&[0; X76F100_DATA_LENGTH])?;
        self.set_data_key(&[0; KEY_LENGTH])
    }

    fn set_data_key(&mut self, key: &[u8; KEY_LENGTH]) -> Result<(), DriverError> {
        // Set the write key, then the read key.
        for i in 0..2u8 {
            self.base
                .write_command(X76F100_ACK_POLL, X76F100_SET_KEY | (i << 1), None, key)?;
        }

        self.base.dump.copy_key_from(key);
        Ok(())
    }
}
