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

    src/driver/dispatch.rs

    Dispatch CartDriver operations to the detected chip driver
*/

use crate::{
    driver::{CartDriver, Driver, DriverError},
    dump::CartDump,
    transport::CartTransport,
    types::ChipType,
    KEY_LENGTH,
};

impl<T: CartTransport> CartDriver for Driver<'_, T> {
    fn chip_type(&self) -> ChipType {
        match self {
            Driver::Dummy(d) => d.chip_type(),
            Driver::X76F041(d) => d.chip_type(),
            Driver::X76F100(d) => d.chip_type(),
            Driver::Zs01(d) => d.chip_type(),
        }
    }

    fn dump(&self) -> &CartDump {
        match self {
            Driver::Dummy(d) => d.dump(),
            Driver::X76F041(d) => d.dump(),
            Driver::X76F100(d) => d.dump(),
            Driver::Zs01(d) => d.dump(),
        }
    }

    fn read_system_id(&mut self) -> Result<(), DriverError> {
        let result = match self {
            Driver::Dummy(d) => d.read_system_id(),
            Driver::X76F041(d) => d.read_system_id(),
            Driver::X76F100(d) => d.read_system_id(),
            Driver::Zs01(d) => d.read_system_id(),
        };
        log_failure("read_system_id", result)
    }

    fn read_cart_id(&mut self) -> Result<(), DriverError> {
        let result = match self {
            Driver::Dummy(d) => d.read_cart_id(),
            Driver::X76F041(d) => d.read_cart_id(),
            Driver::X76F100(d) => d.read_cart_id(),
            Driver::Zs01(d) => d.read_cart_id(),
        };
        log_failure("read_cart_id", result)
    }

    fn read_public_data(&mut self) -> Result<(), DriverError> {
        let result = match self {
            Driver::Dummy(d) => d.read_public_data(),
            Driver::X76F041(d) => d.read_public_data(),
            Driver::X76F100(d) => d.read_public_data(),
            Driver::Zs01(d) => d.read_public_data(),
        };
        log_failure("read_public_data", result)
    }

    fn read_private_data(&mut self) -> Result<(), DriverError> {
        let result = match self {
            Driver::Dummy(d) => d.read_private_data(),
            Driver::X76F041(d) => d.read_private_data(),
            Driver::X76F100(d) => d.read_private_data(),
            Driver::Zs01(d) => d.read_private_data(),
        };
        log_failure("read_private_data", result)
    }

    fn write_data(&mut self) -> Result<(), DriverError> {
        let result = match self {
            Driver::Dummy(d) => d.write_data(),
            Driver::X76F041(d) => d.write_data(),
            Driver::X76F100(d) => d.write_data(),
            Driver::Zs01(d) => d.write_data(),
        };
        log_failure("write_data", result)
    }

    fn erase(&mut self) -> Result<(), DriverError> {
        let result = match self {
            Driver::Dummy(d) => d.erase(),
            Driver::X76F041(d) => d.erase(),
            Driver::X76F100(d) => d.erase(),
            Driver::Zs01(d) => d.erase(),
        };
        log_failure("erase", result)
    }

    fn set_data_key(&mut self, key: &[u8; KEY_LENGTH]) -> Result<(), DriverError> {
        let result = match self {
            Driver::Dummy(d) => d.set_data_key(key),
            Driver::X76F041(d) => d.set_data_key(key),
            Driver::X76F100(d) => d.set_data_key(key),
            Driver::Zs01(d) => d.set_data_key(key),
        };
        log_failure("set_data_key", result)
    }
}

fn log_failure(op: &str, result: Result<(), DriverError>) -> Result<(), DriverError> {
    if let Err(err) = result {
        log::debug!("{}(): failed with {}: {}", op, err.name(), err);
    }
    result
}
