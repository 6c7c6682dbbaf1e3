//! Level changes through the write queue against the simulated chip.

mod common;

use aw9523b_leds::{Aw9523b, ChannelConfig, Error, LedsConfig, NoPin, PinDescriptor, PinMode};
use common::{init_logging, Bench, Event, FakeDelay, FakeI2c};
use std::sync::Arc;
use std::thread;

type Device = Aw9523b<FakeI2c, NoPin, NoPin, FakeDelay>;

fn active_device(bench: &Bench, config: LedsConfig) -> Device {
    let mut dev = Aw9523b::new(config, bench.i2c(), None, None, bench.delay()).unwrap();
    dev.bring_up().unwrap();
    dev.flush().unwrap();
    bench.take_events();
    dev
}

#[test]
fn test_gpio_level_sets_and_clears_bit() {
    init_logging();
    let bench = Bench::new();
    let dev = active_device(&bench, LedsConfig::new().channel(PinDescriptor::gpio(0, 3, false)));

    dev.set_level(0, 1).unwrap();
    dev.flush().unwrap();
    assert_eq!(bench.register(0x02), 0x08);

    dev.set_level(0, 0).unwrap();
    dev.flush().unwrap();
    assert_eq!(bench.register(0x02), 0x00);

    assert_eq!(
        bench.events(),
        vec![
            Event::Read(0x02, 0x00),
            Event::Write(0x02, 0x08),
            Event::Read(0x02, 0x08),
            Event::Write(0x02, 0x00),
        ]
    );
}

#[test]
fn test_gpio_nonzero_level_means_high() {
    init_logging();
    let bench = Bench::new();
    let dev = active_device(&bench, LedsConfig::new().channel(PinDescriptor::gpio(1, 7, false)));

    dev.set_level(0, 0x01).unwrap();
    dev.flush().unwrap();
    assert_eq!(bench.register(0x03), 0x80);

    dev.set_level(0, 0xFF).unwrap();
    dev.flush().unwrap();
    assert_eq!(bench.register(0x03), 0x80);
}

#[test]
fn test_shared_output_register_keeps_both_updates() {
    init_logging();
    let bench = Bench::new();
    let dev = active_device(
        &bench,
        LedsConfig::new()
            .channel(PinDescriptor::gpio(0, 1, false))
            .channel(PinDescriptor::gpio(0, 6, false)),
    );

    // Both queued before either lands.
    dev.set_level(0, 1).unwrap();
    dev.set_level(1, 1).unwrap();
    dev.flush().unwrap();
    assert_eq!(bench.register(0x02), 0b0100_0010);

    dev.set_level(0, 0).unwrap();
    dev.flush().unwrap();
    assert_eq!(bench.register(0x02), 0b0100_0000);
}

#[test]
fn test_gpio_update_preserves_foreign_bits() {
    init_logging();
    let bench = Bench::new();
    let dev = active_device(&bench, LedsConfig::new().channel(PinDescriptor::gpio(1, 0, false)));
    bench.set_register(0x03, 0b1010_0000);

    dev.set_level(0, 1).unwrap();
    dev.flush().unwrap();
    assert_eq!(bench.register(0x03), 0b1010_0001);
}

#[test]
fn test_concurrent_gpio_channels_lose_no_updates() {
    init_logging();
    let bench = Bench::new();
    let mut config = LedsConfig::new().queue_depth(1024);
    for bit in 0..8 {
        config = config.channel(PinDescriptor::gpio(0, bit, false));
    }
    let dev = Arc::new(active_device(&bench, config));

    let workers: Vec<_> = (0..8)
        .map(|index| {
            let dev = Arc::clone(&dev);
            thread::spawn(move || {
                for i in 0..20u8 {
                    dev.set_level(index, i % 2).unwrap();
                }
                dev.set_level(index, 1).unwrap();
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    dev.flush().unwrap();

    assert_eq!(bench.register(0x02), 0xFF);
}

#[test]
fn test_led_level_writes_current_register() {
    init_logging();
    let bench = Bench::new();
    let dev = active_device(
        &bench,
        LedsConfig::new()
            .channel(PinDescriptor::led(0, 0, 0))
            .channel(PinDescriptor::led(1, 3, 0))
            .channel(PinDescriptor::led(1, 4, 0)),
    );

    dev.set_level(0, 0x11).unwrap();
    dev.set_level(1, 0x22).unwrap();
    dev.set_level(2, 0x33).unwrap();
    dev.flush().unwrap();

    // LED writes are direct, no read-back.
    assert_eq!(
        bench.events(),
        vec![
            Event::Write(0x24, 0x11),
            Event::Write(0x23, 0x22),
            Event::Write(0x2C, 0x33),
        ]
    );
    assert_eq!(dev.level(1), Some(0x22));
}

#[test]
fn test_rapid_levels_are_not_coalesced() {
    init_logging();
    let bench = Bench::new();
    let dev = active_device(&bench, LedsConfig::new().channel(PinDescriptor::led(0, 2, 0)));

    for level in [1, 2, 3, 0] {
        dev.set_level(0, level).unwrap();
    }
    dev.flush().unwrap();

    assert_eq!(
        bench.writes(),
        vec![(0x26, 1), (0x26, 2), (0x26, 3), (0x26, 0)]
    );
}

#[test]
fn test_invalid_index_enqueues_nothing() {
    init_logging();
    let bench = Bench::new();
    let dev = active_device(
        &bench,
        LedsConfig::new()
            .channel(PinDescriptor::led(0, 0, 0))
            .channel(PinDescriptor::led(0, 1, 0)),
    );

    match dev.set_level(16, 0xFF) {
        Err(Error::InvalidChannelIndex { index, count }) => {
            assert_eq!(index, 16);
            assert_eq!(count, 2);
        }
        other => panic!("Expected InvalidChannelIndex error, got: {:?}", other),
    }
    assert!(matches!(
        dev.set_level(2, 0xFF),
        Err(Error::InvalidChannelIndex { index: 2, .. })
    ));
    dev.flush().unwrap();
    assert!(bench.events().is_empty());
}

#[test]
fn test_bus_error_is_dropped_and_queue_continues() {
    init_logging();
    let bench = Bench::new();
    let dev = active_device(
        &bench,
        LedsConfig::new()
            .channel(PinDescriptor::led(1, 5, 0))
            .channel(PinDescriptor::led(1, 6, 0)),
    );
    bench.fail_writes_to(0x2D);

    // The caller never sees the transport failure.
    dev.set_level(0, 0x40).unwrap();
    dev.set_level(1, 0x50).unwrap();
    dev.flush().unwrap();

    assert_eq!(
        bench.events(),
        vec![Event::FailedWrite(0x2D, 0x40), Event::Write(0x2E, 0x50)]
    );
    assert_eq!(bench.register(0x2D), 0x00);
    assert_eq!(bench.register(0x2E), 0x50);
    assert_eq!(dev.is_pending(0), Some(false));
}

#[test]
fn test_pending_until_worker_applies() {
    init_logging();
    let bench = Bench::new();
    let dev = active_device(&bench, LedsConfig::new().channel(PinDescriptor::led(0, 4, 0)));
    assert_eq!(dev.is_pending(0), Some(false));

    let held = bench.hold_bus();
    dev.set_level(0, 0x10).unwrap();
    dev.set_level(0, 0x20).unwrap();
    // Worker is stuck on the bus, so neither write has landed.
    assert_eq!(dev.is_pending(0), Some(true));
    assert_eq!(dev.level(0), Some(0x20));
    assert_eq!(bench.register(0x28), 0x00);

    drop(held);
    dev.flush().unwrap();
    assert_eq!(dev.is_pending(0), Some(false));
    assert_eq!(bench.register(0x28), 0x20);
    assert_eq!(dev.is_pending(1), None);
}

#[test]
fn test_queue_full_keeps_last_accepted_level() {
    init_logging();
    let bench = Bench::new();
    let dev = active_device(
        &bench,
        LedsConfig::new()
            .queue_depth(2)
            .channel(PinDescriptor::led(0, 4, 0)),
    );

    let held = bench.hold_bus();
    let mut accepted = Vec::new();
    let mut rejected = false;
    for level in 1..=10u8 {
        match dev.set_level(0, level) {
            Ok(()) => accepted.push(level),
            Err(Error::QueueFull) => {
                rejected = true;
                break;
            }
            Err(e) => panic!("Expected QueueFull error, got: {:?}", e),
        }
    }
    assert!(rejected);
    let last = *accepted.last().unwrap();
    assert_eq!(dev.level(0), Some(last));
    assert_eq!(dev.is_pending(0), Some(true));

    drop(held);
    dev.flush().unwrap();
    assert_eq!(dev.is_pending(0), Some(false));
    assert_eq!(bench.register(0x28), last);
    let expected: Vec<_> = accepted.iter().map(|&level| (0x28, level)).collect();
    assert_eq!(bench.writes(), expected);
}

#[test]
fn test_channels_from_flag_words() {
    init_logging();
    let bench = Bench::new();
    // port << 24 | bit << 16 | mode << 8 | default
    let dev = active_device(
        &bench,
        LedsConfig::from_flags(&[0x0003_0101, 0x0104_0020]),
    );

    let gpio = dev.descriptor(0).unwrap();
    assert_eq!((gpio.port, gpio.bit, gpio.mode), (0, 3, PinMode::Gpio));
    let led = dev.descriptor(1).unwrap();
    assert_eq!((led.port, led.bit, led.mode, led.default_value), (1, 4, PinMode::Led, 0x20));

    let snapshot = dev.snapshot().unwrap();
    assert_eq!(snapshot.gpio_default_mask(0), 0x08);
    assert_eq!(snapshot.current_default(1, 4), 0x20);
    assert_eq!(dev.level(1), Some(0x20));
}

#[test]
fn test_channel_names_and_triggers() {
    init_logging();
    let bench = Bench::new();
    let dev = active_device(
        &bench,
        LedsConfig::new()
            .channel(
                ChannelConfig::new(PinDescriptor::led(0, 0, 0))
                    .name("status")
                    .default_trigger("heartbeat"),
            )
            .channel(PinDescriptor::gpio(1, 1, false)),
    );

    assert_eq!(dev.channel_count(), 2);
    assert_eq!(dev.channel_name(0), Some("AW.status"));
    assert_eq!(dev.default_trigger(0), Some("heartbeat"));
    assert_eq!(dev.channel_name(1), Some("AW.1"));
    assert_eq!(dev.default_trigger(1), None);
    assert_eq!(dev.channel_name(2), None);
}
