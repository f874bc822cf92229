//! Attach and detach against mock hardware: probe, rollback, supply
//! sequencing and teardown.

use aw2013::app::events::DriverEvent;
use aw2013::device::PowerState;
use aw2013::error::{Error, PowerError};
use aw2013::{ChannelDescriptor, Color, DeviceConfig};

use super::mock_hw::{BusOp, Harness, MockRegistrar, RegCall};

fn registered(names: &[&str]) -> Vec<RegCall> {
    names.iter().map(|n| RegCall::Register((*n).into())).collect()
}

#[test]
fn attach_powers_up_probes_and_registers_in_order() {
    let h = Harness::new();
    let dev = h.attach(&DeviceConfig::rgb()).unwrap();

    assert_eq!(
        h.rig.ops(),
        vec![
            BusOp::Supply(true),
            BusOp::DelayMs(100),
            BusOp::DelayMs(10),
            BusOp::Write { reg: 0x00, value: 0x55 },
        ]
    );
    assert_eq!(h.registrar.calls(), registered(&["red", "green", "blue"]));
    assert_eq!(dev.power_state(), PowerState::PoweredUp);
    assert!(!dev.session_active());
    assert_eq!(h.sink.events(), vec![DriverEvent::Attached { channels: 3 }]);

    let names: Vec<_> = dev.channels().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["red", "green", "blue"]);
    dev.detach().unwrap();
}

#[test]
fn probe_recovers_within_budget() {
    let h = Harness::new();
    h.rig.nack_next(4);
    let dev = h.attach(&DeviceConfig::rgb()).unwrap();
    let probe_delays = h
        .rig
        .ops()
        .iter()
        .filter(|op| **op == BusOp::DelayMs(10))
        .count();
    assert_eq!(probe_delays, 5);
    dev.detach().unwrap();
}

#[test]
fn probe_failure_registers_nothing_and_cuts_supply() {
    let h = Harness::new();
    h.rig.nack_next(usize::MAX);

    let err = h.attach(&DeviceConfig::rgb()).err().unwrap();

    assert_eq!(err, Error::ProbeFailure { attempts: 5 });
    assert!(h.registrar.calls().is_empty());
    let ops = h.rig.ops();
    assert_eq!(ops.first(), Some(&BusOp::Supply(true)));
    assert_eq!(ops.last(), Some(&BusOp::Supply(false)));
    assert_eq!(ops.iter().filter(|op| **op == BusOp::DelayMs(10)).count(), 5);
    assert_eq!(h.sink.events(), vec![DriverEvent::AttachFailed(err)]);
}

#[test]
fn refused_supply_fails_attach_before_probing() {
    let h = Harness::new();
    h.rig.refuse_supply();

    let err = h.attach(&DeviceConfig::rgb()).err().unwrap();

    assert_eq!(err, Error::Power(PowerError::EnableFailed));
    assert!(h.rig.ops().is_empty());
    assert!(h.registrar.calls().is_empty());
}

#[test]
fn registration_failure_rolls_back_in_reverse() {
    let h = Harness::with_registrar(MockRegistrar::failing_at(2));

    let err = h.attach(&DeviceConfig::rgb()).err().unwrap();

    assert!(matches!(err, Error::AllocationFailure(_)));
    assert_eq!(
        h.registrar.calls(),
        vec![
            RegCall::Register("red".into()),
            RegCall::Register("green".into()),
            RegCall::Unregister("green".into()),
            RegCall::Unregister("red".into()),
        ]
    );
    assert_eq!(h.rig.ops().last(), Some(&BusOp::Supply(false)));
}

#[test]
fn first_registration_failure_leaves_nothing_behind() {
    let h = Harness::with_registrar(MockRegistrar::failing_at(0));
    assert!(h.attach(&DeviceConfig::rgb()).is_err());
    assert!(h.registrar.calls().is_empty());
}

#[test]
fn invalid_configuration_never_touches_hardware() {
    let h = Harness::new();
    let err = h.attach(&DeviceConfig::new(Vec::new())).err().unwrap();
    assert!(matches!(err, Error::Configuration(_)));
    assert!(h.rig.ops().is_empty());
    assert!(h.registrar.calls().is_empty());
}

#[test]
fn channel_lookup_by_color_and_name() {
    let h = Harness::new();
    let cfg = DeviceConfig::new(vec![
        ChannelDescriptor::new("green").with_trigger("heartbeat"),
        ChannelDescriptor::new("white"),
    ]);
    let dev = h.attach(&cfg).unwrap();

    assert!(dev.channel(Color::Green).is_some());
    assert!(dev.channel(Color::Red).is_none());
    assert_eq!(dev.channel_by_name("white").map(|c| c.color()), Some(Color::White));
    assert!(dev.channel_by_name("blue").is_none());
    dev.detach().unwrap();
}

#[test]
fn detach_of_dark_device_only_cuts_supply() {
    let h = Harness::new();
    let dev = h.attach_rgb();

    dev.detach().unwrap();

    assert_eq!(h.rig.ops(), vec![BusOp::Supply(false)]);
    assert_eq!(
        h.sink.events().last(),
        Some(&DriverEvent::Detached)
    );
}

#[test]
fn detach_turns_outputs_off_then_unregisters_in_reverse() {
    let h = Harness::new();
    let dev = h.attach_rgb();
    dev.channel(Color::Blue).unwrap().set_brightness(80);
    dev.flush();
    h.rig.clear();

    dev.detach().unwrap();

    let ops = h.rig.ops();
    assert_eq!(ops[0], BusOp::Write { reg: 0x01, value: 0x00 });
    assert_eq!(ops.last(), Some(&BusOp::Supply(false)));
    assert!(ops.contains(&BusOp::Write { reg: 0x30, value: 0x00 }));

    let unregs: Vec<_> = h
        .registrar
        .calls()
        .into_iter()
        .filter(|c| matches!(c, RegCall::Unregister(_)))
        .collect();
    assert_eq!(
        unregs,
        vec![
            RegCall::Unregister("blue".into()),
            RegCall::Unregister("green".into()),
            RegCall::Unregister("red".into()),
        ]
    );

    let events = h.sink.events();
    let tail = &events[events.len() - 2..];
    assert_eq!(tail, &[DriverEvent::SessionEnded, DriverEvent::Detached]);
}

#[test]
fn dropping_an_attached_device_tears_it_down() {
    let h = Harness::new();
    let dev = h.attach_rgb();
    dev.channel(Color::Red).unwrap().set_brightness(120);
    dev.flush();
    h.rig.clear();

    drop(dev);

    let ops = h.rig.ops();
    assert_eq!(ops[0], BusOp::Write { reg: 0x01, value: 0x00 });
    assert_eq!(ops.last(), Some(&BusOp::Supply(false)));
    let unregistered = h
        .registrar
        .calls()
        .iter()
        .filter(|c| matches!(c, RegCall::Unregister(_)))
        .count();
    assert_eq!(unregistered, 3);
    assert_eq!(h.sink.events().last(), Some(&DriverEvent::Detached));
}

#[test]
fn detach_runs_teardown_once() {
    let h = Harness::new();
    let dev = h.attach_rgb();
    dev.detach().unwrap();
    let supply_offs = h
        .rig
        .ops()
        .iter()
        .filter(|op| **op == BusOp::Supply(false))
        .count();
    assert_eq!(supply_offs, 1);
    let detached = h
        .sink
        .events()
        .iter()
        .filter(|e| **e == DriverEvent::Detached)
        .count();
    assert_eq!(detached, 1);
}
