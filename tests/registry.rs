#![allow(missing_docs)]
//! Host-level tests for the channel registry.

use pwm_servo::mock::{PwmCall, RecordingPwm};
use pwm_servo::{AttachConfig, ChannelRegistry, Error, Servo};

fn registry<const N: usize>() -> ChannelRegistry<RecordingPwm, N> {
    ChannelRegistry::new(RecordingPwm::new())
}

#[test]
fn slots_are_handed_out_in_construction_order() {
    let registry = registry::<3>();

    let servos = [
        Servo::new(&registry),
        Servo::new(&registry),
        Servo::new(&registry),
    ];

    let slots: Vec<_> = servos.iter().map(Servo::slot).collect();
    assert_eq!(slots, [Some(0), Some(1), Some(2)]);
    assert_eq!(registry.slot_count(), 3);
}

#[test]
fn construction_past_capacity_yields_unusable_servo() {
    let registry = registry::<2>();
    let _first = Servo::new(&registry);
    let _second = Servo::new(&registry);

    let mut extra = Servo::new(&registry);

    assert_eq!(extra.slot(), None);
    assert!(!extra.attached());
    assert_eq!(
        extra.attach(5, AttachConfig::default()),
        Err(Error::PoolExhausted)
    );
    assert_eq!(
        extra.attach(6, AttachConfig::new().with_min_us(1_000)),
        Err(Error::PoolExhausted)
    );
    assert!(!registry.is_pin_bound(5));
    assert_eq!(registry.slot_count(), 2);
}

#[test]
fn detach_frees_the_pin_but_not_the_slot() {
    let registry = registry::<1>();
    let mut servo = Servo::new(&registry);
    servo.attach(4, AttachConfig::default()).unwrap();

    servo.detach();
    drop(servo);

    assert!(!registry.is_pin_bound(4));
    assert_eq!(registry.allocate_slot(), None);
    assert_eq!(Servo::new(&registry).slot(), None);
}

#[test]
fn dropping_an_attached_servo_keeps_its_binding() {
    let registry = registry::<2>();
    let mut servo = Servo::new(&registry);
    servo.attach(4, AttachConfig::default()).unwrap();

    drop(servo);

    assert_eq!(registry.pin_of(0), Some(4));
    let mut other = Servo::new(&registry);
    assert_eq!(
        other.attach(4, AttachConfig::default()),
        Err(Error::PinInUse { pin: 4 })
    );
}

#[test]
fn released_slot_is_reused_after_fresh_slots() {
    let registry = registry::<2>();
    let first = Servo::new(&registry);
    let mut second = Servo::new(&registry);
    second.attach(8, AttachConfig::default()).unwrap();

    second.release();
    assert!(!registry.is_pin_bound(8));
    assert_eq!(registry.with_pwm(|pwm| pwm.duty(8)), Some(0));

    let reused = Servo::new(&registry);
    assert_eq!(reused.slot(), Some(1));
    assert_eq!(Servo::new(&registry).slot(), None);
    assert_eq!(registry.slot_count(), 2);
    drop(first);
}

#[test]
fn release_never_hands_out_a_live_servos_slot() {
    let registry = registry::<2>();
    let mut first = Servo::new(&registry);
    let second = Servo::new(&registry);
    first.attach(4, AttachConfig::default()).unwrap();

    second.release();
    let mut third = Servo::new(&registry);
    third.attach(5, AttachConfig::default()).unwrap();
    first.write(0);

    assert_eq!(first.slot(), Some(0));
    assert_eq!(third.slot(), Some(1));
    assert_eq!(first.pin(), Some(4));
    assert_eq!(third.pin(), Some(5));
    assert_eq!(registry.with_pwm(|pwm| pwm.duty(4)), Some(1_782));
    assert_eq!(registry.with_pwm(|pwm| pwm.duty(5)), Some(4_915));
}

#[test]
fn release_powers_down_before_the_pin_is_reused() {
    let registry = registry::<1>();
    let mut servo = Servo::new(&registry);
    servo.attach(4, AttachConfig::default()).unwrap();

    servo.release();
    let mut next = Servo::new(&registry);
    next.attach(4, AttachConfig::default()).unwrap();

    assert_eq!(next.slot(), Some(0));
    assert_eq!(registry.pin_of(0), Some(4));
    registry.with_pwm(|pwm| {
        assert_eq!(
            pwm.calls()
                .iter()
                .filter(|call| matches!(call, PwmCall::Duty { pin: 4, duty: 0 }))
                .count(),
            1
        );
    });
}

#[test]
#[should_panic]
fn calling_back_into_the_registry_from_with_pwm_panics() {
    let registry = registry::<1>();

    registry.with_pwm(|_| registry.max_duty());
}

#[test]
fn bind_rejects_pin_already_bound_elsewhere() {
    let registry = registry::<3>();
    let a = registry.allocate_slot().unwrap();
    let b = registry.allocate_slot().unwrap();

    registry.bind(a, 12).unwrap();

    assert_eq!(registry.bind(b, 12), Err(Error::PinInUse { pin: 12 }));
    assert_eq!(registry.pin_of(b), None);
}

#[test]
fn bind_rejects_slot_already_bound() {
    let registry = registry::<2>();
    let slot = registry.allocate_slot().unwrap();
    registry.bind(slot, 1).unwrap();

    assert_eq!(
        registry.bind(slot, 2),
        Err(Error::SlotAlreadyBound { slot })
    );
    assert_eq!(registry.pin_of(slot), Some(1));
}

#[test]
fn bind_rejects_unallocated_or_missing_slot() {
    let registry = registry::<2>();

    assert_eq!(registry.bind(0, 1), Err(Error::InvalidSlot { slot: 0 }));
    assert_eq!(registry.bind(7, 1), Err(Error::InvalidSlot { slot: 7 }));
}

#[test]
fn unbind_is_idempotent() {
    let registry = registry::<1>();
    let slot = registry.allocate_slot().unwrap();
    registry.bind(slot, 3).unwrap();

    registry.unbind(slot);
    registry.unbind(slot);

    assert_eq!(registry.pin_of(slot), None);
    registry.bind(slot, 3).unwrap();
}

#[test]
fn resolution_is_configured_once() {
    let registry = registry::<2>();
    assert_eq!(registry.max_duty(), 0);

    assert_eq!(registry.ensure_resolution_configured(), 65_536);
    assert_eq!(registry.ensure_resolution_configured(), 65_536);

    assert_eq!(registry.max_duty(), 65_536);
    assert_eq!(registry.with_pwm(|pwm| pwm.resolution_calls()), 1);
}

#[test]
fn resolution_waits_for_a_successful_attach() {
    let registry = registry::<2>();
    registry.with_pwm(|pwm| pwm.reject_pin(2));
    let mut servo = Servo::new(&registry);

    assert_eq!(
        servo.attach(2, AttachConfig::default()),
        Err(Error::PeripheralRejected { pin: 2 })
    );
    assert_eq!(registry.max_duty(), 0);

    servo.attach(3, AttachConfig::default()).unwrap();
    assert_eq!(registry.max_duty(), 65_536);

    let mut other = Servo::new(&registry);
    other.attach(4, AttachConfig::default()).unwrap();
    assert_eq!(registry.with_pwm(|pwm| pwm.resolution_calls()), 1);
}

#[test]
fn registry_can_be_static() {
    static SERVOS: ChannelRegistry<RecordingPwm, 4> = ChannelRegistry::new(RecordingPwm::new());

    let mut servo = Servo::new(&SERVOS);
    let slot = servo.attach(10, AttachConfig::default()).unwrap();

    assert_eq!(SERVOS.pin_of(slot), Some(10));
    assert_eq!(SERVOS.capacity(), 4);
}
