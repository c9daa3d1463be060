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

mod common;

use cart573::{driver::Zs01Driver, prelude::*};
use common::*;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const KEY: [u8; 8] = [0x3A, 0x9F, 0x44, 0xC1, 0x07, 0xEE, 0x52, 0x18];

fn zs01_bus() -> SimBus {
    let mut sim = Zs01Sim::new(KEY);
    for (i, byte) in sim.data.iter_mut().enumerate() {
        *byte = (i as u8).wrapping_mul(13).wrapping_add(5);
    }
    sim.config = [0, 0, 0, 0, 3, 0, 0, 0];
    SimBus::new(SimChip::Zs01(sim))
}

fn fast_options() -> DriverOptions {
    DriverOptions {
        zs01_packet_delay: 10,
        zs01_send_delay: 1,
        ..Default::default()
    }
}

#[test]
fn test_factory_detects_zs01() {
    init();
    let mut bus = zs01_bus();
    let mut dump = CartDump::default();
    dump.flags = DumpFlags::all();

    let driver = new_cart_driver(&mut dump, &mut bus, &CartDump::default());
    assert!(matches!(driver, Driver::Zs01(_)));
    assert_eq!(driver.chip_type(), ChipType::Zs01);
    drop(driver);

    assert_eq!(dump.chip_type, ChipType::Zs01);
    assert_eq!(dump.flags, DumpFlags::HAS_CART_ID);
}

#[test]
fn test_read_ids() {
    init();
    let mut bus = zs01_bus();
    let mut dump = CartDump::default();

    let mut driver = Zs01Driver::new(&mut dump, &mut bus, fast_options());
    assert_eq!(driver.read_cart_id(), Ok(()));
    assert_eq!(driver.read_system_id(), Ok(()));
    drop(driver);

    assert_eq!(dump.zs_id, bus.zs01().zs_id);
    assert_eq!(dump.cart_id, bus.zs01().cart_id);
    assert_eq!(dump.system_id, bus.system_ds2401.unwrap());
    assert!(dump.flags.contains(
        DumpFlags::HAS_CART_ID
            | DumpFlags::ZS_ID_OK
            | DumpFlags::CART_ID_OK
            | DumpFlags::HAS_SYSTEM_ID
            | DumpFlags::SYSTEM_ID_OK
    ));

    // Two transactions, each with a packet delay and a send delay per byte.
    assert_eq!(bus.elapsed_us, 2 * (10 + 12));
}

#[test]
fn test_bad_zs01_id() {
    init();
    let mut bus = zs01_bus();
    bus.zs01().zs_id.data[7] ^= 0xFF;
    let mut dump = CartDump::default();

    let mut driver = Zs01Driver::new(&mut dump, &mut bus, fast_options());
    assert_eq!(driver.read_cart_id(), Err(DriverError::Ds2401IdError));
    drop(driver);

    assert!(!dump.flags.contains(DumpFlags::ZS_ID_OK));
    assert!(!dump.flags.contains(DumpFlags::CART_ID_OK));
}

#[test]
fn test_read_public_and_private_data() {
    init();
    let mut bus = zs01_bus();
    let mut dump = CartDump::default();
    dump.copy_key_from(&KEY);

    let mut driver = Zs01Driver::new(&mut dump, &mut bus, fast_options());
    assert_eq!(driver.read_public_data(), Ok(()));
    assert_eq!(driver.read_private_data(), Ok(()));
    let state = driver.encoder_state();
    drop(driver);

    let sim = bus.zs01();
    assert_eq!(hex_dump(&dump.data[..112]), hex_dump(&sim.data));
    assert_eq!(dump.config, sim.config);
    assert!(dump
        .flags
        .contains(DumpFlags::PUBLIC_DATA_OK | DumpFlags::PRIVATE_DATA_OK | DumpFlags::CONFIG_OK));

    // 4 public blocks, 10 private blocks and the configuration.
    assert_eq!(sim.requests, 15);
    assert_eq!(state, sim.state());
}

#[test]
fn test_wrong_key() {
    init();
    let mut bus = zs01_bus();
    let mut dump = CartDump::default();
    dump.copy_key_from(&[0; 8]);

    let mut driver = Zs01Driver::new(&mut dump, &mut bus, fast_options());
    // Public data does not need the key.
    assert_eq!(driver.read_public_data(), Ok(()));
    assert_eq!(driver.read_private_data(), Err(DriverError::Zs01Error));
    assert_eq!(driver.set_data_key(&[1; 8]), Err(DriverError::Zs01Error));
    drop(driver);

    assert!(!dump.flags.contains(DumpFlags::PRIVATE_DATA_OK));
    assert_eq!(dump.data_key, [0; 8]);
    assert_eq!(bus.zs01().key, KEY);
}

#[test]
fn test_write_data() {
    init();
    let mut bus = zs01_bus();
    let mut dump = CartDump::new(ChipType::Zs01);
    dump.copy_key_from(&KEY);
    for (i, byte) in dump.data[..112].iter_mut().enumerate() {
        *byte = 0xFF - i as u8;
    }
    dump.init_config(5, true);

    let mut driver = Zs01Driver::new(&mut dump, &mut bus, fast_options());
    assert_eq!(driver.write_data(), Ok(()));
    drop(driver);

    let sim = bus.zs01();
    assert_eq!(sim.data[..], dump.data[..112]);
    assert_eq!(sim.config, [0, 0, 0, 0, 5, 0, 0, 0]);
}

#[test]
fn test_set_key_then_read() {
    init();
    let new_key = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];
    let mut bus = zs01_bus();
    let mut dump = CartDump::default();
    dump.copy_key_from(&KEY);

    let mut driver = Zs01Driver::new(&mut dump, &mut bus, fast_options());
    assert_eq!(driver.set_data_key(&new_key), Ok(()));
    assert_eq!(driver.read_private_data(), Ok(()));
    drop(driver);

    assert_eq!(dump.data_key, new_key);
    assert_eq!(bus.zs01().key, new_key);
}

#[test]
fn test_erase() {
    init();
    let mut bus = zs01_bus();
    let mut dump = CartDump::default();
    dump.copy_key_from(&KEY);

    let mut driver = Zs01Driver::new(&mut dump, &mut bus, fast_options());
    assert_eq!(driver.erase(), Ok(()));
    // The key is now all zeroes, which the dump must have picked up.
    assert_eq!(driver.read_private_data(), Ok(()));
    drop(driver);

    assert_eq!(dump.data_key, [0; 8]);
    assert!(dump.data[..112].iter().all(|&b| b == 0));
    assert_eq!(bus.zs01().key, [0; 8]);
}

#[test]
fn test_nack() {
    init();
    let mut bus = zs01_bus();
    bus.zs01().nack = true;
    let mut dump = CartDump::default();

    let mut driver = Zs01Driver::new(&mut dump, &mut bus, fast_options());
    assert_eq!(driver.read_public_data(), Err(DriverError::Zs01Nack));
    drop(driver);

    assert!(!dump.flags.contains(DumpFlags::PUBLIC_DATA_OK));
}

#[test]
fn test_crc_mismatch() {
    init();
    let mut bus = zs01_bus();
    bus.zs01().corrupt_responses = true;
    let mut dump = CartDump::default();

    let mut driver = Zs01Driver::new(&mut dump, &mut bus, fast_options());
    assert_eq!(driver.read_cart_id(), Err(DriverError::Zs01CrcMismatch));
    assert_eq!(driver.encoder_state(), 0);
}
