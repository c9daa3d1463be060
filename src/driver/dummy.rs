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

//! Driver used when no supported cartridge is present.
//!
//! The dummy driver emulates a cartridge from a snapshot dump, which lets the rest of the
//! application be exercised without hardware. Operations succeed only if the snapshot holds the
//! requested data and, for privileged operations, the dump's data key matches the snapshot's.
//! A snapshot with no chip type represents an empty slot: every operation fails.

use crate::{
    driver::{CartDriver, DriverError},
    dump::CartDump,
    types::{ChipType, DumpFlags},
    KEY_LENGTH,
};

pub struct DummyDriver<'a> {
    dump: &'a mut CartDump,
    snapshot: CartDump,
}

impl<'a> DummyDriver<'a> {
    /// Create a dummy driver emulating `snapshot`. Only the chip type and the `HAS_SYSTEM_ID` and
    /// `HAS_CART_ID` flags of the snapshot are copied into `dump` up front.
    pub fn new(dump: &'a mut CartDump, snapshot: CartDump) -> Self {
        dump.chip_type = snapshot.chip_type;
        dump.flags = snapshot.flags & (DumpFlags::HAS_SYSTEM_ID | DumpFlags::HAS_CART_ID);

        DummyDriver { dump, snapshot }
    }

    /// The emulated cartridge's contents, including any changes written to it.
    pub fn snapshot(&self) -> &CartDump {
        &self.snapshot
    }

    fn error_code(&self) -> DriverError {
        match self.snapshot.chip_type {
            ChipType::Zs01 => DriverError::Zs01Error,
            _ => DriverError::X76Nack,
        }
    }

    fn no_cart(&self) -> Option<DriverError> {
        match self.snapshot.chip_type {
            ChipType::None => Some(self.error_code()),
            _ => None,
        }
    }

    fn key_matches(&self) -> bool {
        self.dump.data_key == self.snapshot.data_key
    }
}

impl CartDriver for DummyDriver<'_> {
    fn chip_type(&self) -> ChipType {
        self.snapshot.chip_type
    }

    fn dump(&self) -> &CartDump {
        self.dump
    }

    fn read_system_id(&mut self) -> Result<(), DriverError> {
        if let Some(err) = self.no_cart() {
            return Err(err);
        }
        if self.snapshot.flags.contains(DumpFlags::SYSTEM_ID_OK) {
            self.dump.system_id = self.snapshot.system_id;
            self.dump.flags |= DumpFlags::SYSTEM_ID_OK;
            return Ok(());
        }
        Err(DriverError::Ds2401NoResp)
    }

    fn read_cart_id(&mut self) -> Result<(), DriverError> {
        if let Some(err) = self.no_cart() {
            return Err(err);
        }
        if self.snapshot.flags.contains(DumpFlags::ZS_ID_OK) {
            self.dump.zs_id = self.snapshot.zs_id;
            self.dump.flags |= DumpFlags::ZS_ID_OK;
        }
        if self.snapshot.flags.contains(DumpFlags::CART_ID_OK) {
            self.dump.cart_id = self.snapshot.cart_id;
            self.dump.flags |= DumpFlags::CART_ID_OK;
            return Ok(());
        }
        Err(DriverError::Ds2401NoResp)
    }

    fn read_public_data(&mut self) -> Result<(), DriverError> {
        match self.snapshot.chip_type {
            ChipType::None => return Err(self.error_code()),
            ChipType::Zs01 => {}
            _ => return Err(DriverError::UnsupportedOp),
        }
        if self.snapshot.flags.contains(DumpFlags::PUBLIC_DATA_OK) {
            self.dump.data = self.snapshot.data;
            self.dump.flags |= DumpFlags::PUBLIC_DATA_OK;
            return Ok(());
        }
        Err(self.error_code())
    }

    fn read_private_data(&mut self) -> Result<(), DriverError> {
        if let Some(err) = self.no_cart() {
            return Err(err);
        }
        if self.snapshot.flags.contains(DumpFlags::PRIVATE_DATA_OK) && self.key_matches() {
            self.dump.data = self.snapshot.data;
            self.dump.config = self.snapshot.config;
            self.dump.flags |= DumpFlags::PRIVATE_DATA_OK | DumpFlags::CONFIG_OK;
            return Ok(());
        }
        Err(self.error_code())
    }

    fn write_data(&mut self) -> Result<(), DriverError> {
        if let Some(err) = self.no_cart() {
            return Err(err);
        }
        if self.key_matches() {
            self.snapshot.data = self.dump.data;
            return Ok(());
        }
        Err(self.error_code())
    }

    fn erase(&mut self) -> Result<(), DriverError> {
        if let Some(err) = self.no_cart() {
            return Err(err);
        }
        if self.key_matches() {
            self.snapshot.clear_data();
            self.snapshot.clear_key();
            self.snapshot.config = [0; crate::CONFIG_LENGTH];
            self.dump.clear_key();
            return Ok(());
        }
        Err(self.error_code())
    }

    fn set_data_key(&mut self, key: &[u8; KEY_LENGTH]) -> Result<(), DriverError> {
        if let Some(err) = self.no_cart() {
            return Err(err);
        }
        if self.key_matches() {
            self.snapshot.copy_key_from(key);
            self.dump.copy_key_from(key);
            return Ok(());
        }
        Err(self.error_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slot_fails_everything() {
        let mut dump = CartDump::default();
        let mut driver = DummyDriver::new(&mut dump, CartDump::default());

        assert_eq!(driver.read_system_id(), Err(DriverError::X76Nack));
        assert_eq!(driver.read_cart_id(), Err(DriverError::X76Nack));
        assert_eq!(driver.read_public_data(), Err(DriverError::X76Nack));
        assert_eq!(driver.read_private_data(), Err(DriverError::X76Nack));
        assert_eq!(driver.write_data(), Err(DriverError::X76Nack));
        assert_eq!(driver.erase(), Err(DriverError::X76Nack));
        assert_eq!(driver.set_data_key(&[1; 8]), Err(DriverError::X76Nack));
        assert!(driver.dump().flags.is_empty());
    }

    #[test]
    fn construction_copies_only_presence_flags() {
        let mut snapshot = CartDump::new(ChipType::Zs01);
        snapshot.flags = DumpFlags::all();

        let mut dump = CartDump::default();
        let driver = DummyDriver::new(&mut dump, snapshot);

        assert_eq!(driver.chip_type(), ChipType::Zs01);
        assert_eq!(driver.dump().flags, DumpFlags::HAS_SYSTEM_ID | DumpFlags::HAS_CART_ID);
    }

    #[test]
    fn emulated_zs01_requires_matching_key() {
        let mut snapshot = CartDump::new(ChipType::Zs01);
        snapshot.flags = DumpFlags::PUBLIC_DATA_OK | DumpFlags::PRIVATE_DATA_OK;
        snapshot.data_key = [0xAA; 8];
        snapshot.data[0] = 0x42;

        let mut dump = CartDump::new(ChipType::Zs01);
        let mut driver = DummyDriver::new(&mut dump, snapshot);

        assert_eq!(driver.read_public_data(), Ok(()));
        assert_eq!(driver.read_private_data(), Err(DriverError::Zs01Error));
        assert_eq!(driver.set_data_key(&[0xBB; 8]), Err(DriverError::Zs01Error));
        assert_eq!(driver.read_cart_id(), Err(DriverError::Ds2401NoResp));

        drop(driver);
        dump.data_key = [0xAA; 8];
        let snapshot = {
            let mut s = CartDump::new(ChipType::Zs01);
            s.flags = DumpFlags::PRIVATE_DATA_OK;
            s.data_key = [0xAA; 8];
            s
        };
        let mut driver = DummyDriver::new(&mut dump, snapshot);
        assert_eq!(driver.read_private_data(), Ok(()));
        assert_eq!(driver.set_data_key(&[0xBB; 8]), Ok(()));
        assert_eq!(driver.snapshot().data_key, [0xBB; 8]);
        assert_eq!(driver.erase(), Ok(()));
        assert_eq!(driver.dump().data_key, [0; 8]);
    }

    #[test]
    fn x76_snapshot_has_no_public_data() {
        let mut snapshot = CartDump::new(ChipType::X76F100);
        snapshot.flags = DumpFlags::PUBLIC_DATA_OK;

        let mut dump = CartDump::default();
        let mut driver = DummyDriver::new(&mut dump, snapshot);
        assert_eq!(driver.read_public_data(), Err(DriverError::UnsupportedOp));
        assert_eq!(driver.read_private_data(), Err(DriverError::X76Nack));
    }
}
