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

//! The bus access a chip driver needs from the host.
//!
//! Security cartridges are accessed through a bit-banged I2C-like bus, with an extra chip select
//! line used by the X76 family, plus up to two 1-wire buses carrying DS2401 serial number chips:
//! one on the system board and one on the cartridge. Implementors of [`CartTransport`] drive the
//! actual hardware (or a simulation of it); drivers only ever call it synchronously.

/// Identifier returned by a ZS01 in response to its reset sequence.
pub const ID_ZS01: u32 = 0x5A53_0001;
/// Identifier returned by an X76F041 in response to the X76 reset sequence.
pub const ID_X76F041: u32 = 0x55AA_5519;
/// Identifier returned by an X76F100 in response to the X76 reset sequence.
pub const ID_X76F100: u32 = 0x55AA_0019;

/// 1-wire ROM command to read a device's 64-bit ID.
pub const DS2401_READ_ROM: u8 = 0x33;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OneWireBus {
    /// DS2401 on the system board.
    System,
    /// DS2401 on the cartridge.
    Cart,
}

pub trait CartTransport {
    /// Returns true if a cartridge is plugged in.
    fn cart_inserted(&mut self) -> bool;
    /// Perform the ZS01 reset sequence and return the 32-bit identifier clocked out by the chip.
    fn reset_zs01(&mut self) -> u32;
    /// Perform the X76 reset sequence and return the 32-bit identifier clocked out by the chip.
    fn reset_x76(&mut self) -> u32;

    fn i2c_start(&mut self);
    fn i2c_start_with_cs(&mut self);
    fn i2c_stop(&mut self);
    /// Issue a stop condition and release chip select, then wait `delay_us` microseconds.
    fn i2c_stop_with_cs(&mut self, delay_us: u32);
    /// Write a byte, returning true if the chip acknowledged it.
    fn i2c_write_byte(&mut self, value: u8) -> bool;
    /// Read a byte, acknowledging it.
    fn i2c_read_byte(&mut self) -> u8;

    /// Write a sequence of bytes, waiting `delay_us` microseconds after each. Returns false as soon
    /// as a byte is not acknowledged.
    fn i2c_write_bytes(&mut self, data: &[u8], delay_us: u32) -> bool {
        for &byte in data {
            if !self.i2c_write_byte(byte) {
                return false;
            }
            if delay_us > 0 {
                self.delay_us(delay_us);
            }
        }
        true
    }

    fn i2c_read_bytes(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            *byte = self.i2c_read_byte();
        }
    }

    /// Issue a 1-wire reset pulse, returning true if a device answered with a presence pulse.
    fn one_wire_reset(&mut self, bus: OneWireBus) -> bool;
    fn one_wire_write_byte(&mut self, bus: OneWireBus, value: u8);
    fn one_wire_read_byte(&mut self, bus: OneWireBus) -> u8;

    fn delay_us(&mut self, us: u32);
}
