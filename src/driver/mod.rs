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

//! Security chip drivers.
//!
//! A [`Driver`] performs the command sequences needed to read and write one chip family, storing
//! what it reads into a [`CartDump`] it borrows for its whole lifetime. Drivers are created by
//! [`new_cart_driver`], which probes the cartridge slot to pick the right one.

mod dispatch;
pub mod dummy;
pub mod x76;
pub mod zs01;

use crate::{
    dump::CartDump,
    identifier::Identifier,
    transport::{self, CartTransport, OneWireBus, DS2401_READ_ROM},
    types::{ChipType, DumpFlags},
    KEY_LENGTH,
};
use thiserror::Error;

pub use dummy::DummyDriver;
pub use x76::{X76F041Driver, X76F100Driver};
pub use zs01::Zs01Driver;

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum DriverError {
    #[error("No error")]
    NoError = 0,
    #[error("Operation not supported by this chip")]
    UnsupportedOp = 1,
    #[error("No DS2401 responded on the 1-wire bus")]
    Ds2401NoResp = 2,
    #[error("The DS2401 ID failed validation")]
    Ds2401IdError = 3,
    #[error("The X76 chip did not acknowledge a command")]
    X76Nack = 4,
    #[error("The X76 chip did not acknowledge polling (wrong key?)")]
    X76PollFail = 5,
    #[error("Data read back from the X76 chip does not match what was written")]
    X76VerifyFail = 6,
    #[error("The ZS01 did not acknowledge a request")]
    Zs01Nack = 7,
    #[error("The ZS01 returned an error")]
    Zs01Error = 8,
    #[error("A ZS01 response failed its CRC check")]
    Zs01CrcMismatch = 9,
}

impl DriverError {
    /// Short name of the error, as shown in logs and on screen.
    pub fn name(&self) -> &'static str {
        match self {
            DriverError::NoError => "NO_ERROR",
            DriverError::UnsupportedOp => "UNSUPPORTED_OP",
            DriverError::Ds2401NoResp => "DS2401_NO_RESP",
            DriverError::Ds2401IdError => "DS2401_ID_ERROR",
            DriverError::X76Nack => "X76_NACK",
            DriverError::X76PollFail => "X76_POLL_FAIL",
            DriverError::X76VerifyFail => "X76_VERIFY_FAIL",
            DriverError::Zs01Nack => "ZS01_NACK",
            DriverError::Zs01Error => "ZS01_ERROR",
            DriverError::Zs01CrcMismatch => "ZS01_CRC_MISMATCH",
        }
    }
}

/// Protocol timing and retry parameters. Delays are in microseconds.
///
/// The ZS01 delays are conservative: shorter delays are known to corrupt the key of a cartridge
/// being written, rendering it inaccessible.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DriverOptions {
    pub x76_packet_delay: u32,
    pub x76_write_delay: u32,
    pub x76_max_ack_polls: u32,
    /// Read data back after writing to an X76 chip and compare it.
    pub x76_verify_writes: bool,
    pub zs01_packet_delay: u32,
    pub zs01_send_delay: u32,
}

impl Default for DriverOptions {
    fn default() -> Self {
        DriverOptions {
            x76_packet_delay: 12_000,
            x76_write_delay: 12_000,
            x76_max_ack_polls: 5,
            x76_verify_writes: true,
            zs01_packet_delay: 300_000,
            zs01_send_delay: 100_000,
        }
    }
}

/// The operations a cartridge driver may support. Any operation a chip does not implement fails
/// with [`DriverError::UnsupportedOp`].
///
/// Each successful read sets the matching `*_OK` flag in the dump; a failed operation leaves it
/// unset.
pub trait CartDriver {
    fn chip_type(&self) -> ChipType;
    fn dump(&self) -> &CartDump;

    fn read_system_id(&mut self) -> Result<(), DriverError> {
        Err(DriverError::UnsupportedOp)
    }
    fn read_cart_id(&mut self) -> Result<(), DriverError> {
        Err(DriverError::UnsupportedOp)
    }
    fn read_public_data(&mut self) -> Result<(), DriverError> {
        Err(DriverError::UnsupportedOp)
    }
    /// Read the private data area using the data key currently stored in the dump.
    fn read_private_data(&mut self) -> Result<(), DriverError> {
        Err(DriverError::UnsupportedOp)
    }
    /// Write the dump's payload (and configuration, where applicable) back to the chip.
    fn write_data(&mut self) -> Result<(), DriverError> {
        Err(DriverError::UnsupportedOp)
    }
    /// Erase the chip and reset its data key to all zeroes.
    fn erase(&mut self) -> Result<(), DriverError> {
        Err(DriverError::UnsupportedOp)
    }
    /// Replace the chip's data key, authenticating with the key currently stored in the dump.
    fn set_data_key(&mut self, _key: &[u8; KEY_LENGTH]) -> Result<(), DriverError> {
        Err(DriverError::UnsupportedOp)
    }
}

/// A driver for whichever chip was detected in the cartridge slot.
pub enum Driver<'a, T: CartTransport> {
    Dummy(DummyDriver<'a>),
    X76F041(X76F041Driver<'a, T>),
    X76F100(X76F100Driver<'a, T>),
    Zs01(Zs01Driver<'a, T>),
}

/// Read a DS2401 ID from one of the 1-wire buses. `has_flag` is set as soon as a device answers,
/// `ok_flag` once its ID has been validated.
pub(crate) fn read_ds2401<T: CartTransport>(
    bus: &mut T,
    which: OneWireBus,
    id: &mut Identifier,
    flags: &mut DumpFlags,
    has_flag: DumpFlags,
    ok_flag: DumpFlags,
) -> Result<(), DriverError> {
    if !bus.one_wire_reset(which) {
        log::debug!("read_ds2401(): no 1-wire device found on {:?} bus", which);
        return Err(DriverError::Ds2401NoResp);
    }

    *flags |= has_flag;

    bus.one_wire_write_byte(which, DS2401_READ_ROM);
    for byte in id.data.iter_mut() {
        *byte = bus.one_wire_read_byte(which);
    }

    if !id.validate_ds_crc() {
        return Err(DriverError::Ds2401IdError);
    }

    log::debug!("read_ds2401(): {:?} ID: {}", which, id);
    *flags |= ok_flag;
    Ok(())
}

/// Probe the cartridge slot and return a driver for the chip found there, using default options.
///
/// `snapshot` is the dump handed to the dummy driver when no supported chip is found. Pass a
/// default [`CartDump`] to have every operation on an absent cartridge fail.
pub fn new_cart_driver<'a, T: CartTransport>(
    dump: &'a mut CartDump,
    bus: &'a mut T,
    snapshot: &CartDump,
) -> Driver<'a, T> {
    new_cart_driver_with_options(dump, bus, snapshot, DriverOptions::default())
}

/// Probe the cartridge slot and return a driver for the chip found there.
///
/// The ZS01 reset sequence is always tried before the X76 one, as X76 chips will spuriously
/// acknowledge parts of it.
pub fn new_cart_driver_with_options<'a, T: CartTransport>(
    dump: &'a mut CartDump,
    bus: &'a mut T,
    snapshot: &CartDump,
    #[cfg_attr(
        not(any(feature = "zs01", feature = "x76f041", feature = "x76f100")),
        allow(unused_variables)
    )]
    options: DriverOptions,
) -> Driver<'a, T> {
    if !bus.cart_inserted() {
        log::debug!("new_cart_driver(): no cartridge inserted");
        return Driver::Dummy(DummyDriver::new(dump, snapshot.clone()));
    }

    #[cfg(feature = "zs01")]
    {
        let id = bus.reset_zs01();
        log::debug!("new_cart_driver(): detecting ZS01: 0x{:08x}", id);

        if id == transport::ID_ZS01 {
            return Driver::Zs01(Zs01Driver::new(dump, bus, options));
        }
    }

    let id = bus.reset_x76();
    log::debug!("new_cart_driver(): detecting X76: 0x{:08x}", id);

    match id {
        #[cfg(feature = "x76f041")]
        transport::ID_X76F041 => Driver::X76F041(X76F041Driver::new(dump, bus, options)),
        #[cfg(feature = "x76f100")]
        transport::ID_X76F100 => Driver::X76F100(X76F100Driver::new(dump, bus, options)),
        _ => {
            log::warn!("new_cart_driver(): unrecognized chip ID 0x{:08x}", id);
            Driver::Dummy(DummyDriver::new(dump, snapshot.clone()))
        }
    }
}
