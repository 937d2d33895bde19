//! Sweep two servos against the recording backend and print the duty counts a
//! board would see.
//!
//! Run with `cargo run --features host --bin demo_d1_servo_sweep_host`.

use pwm_servo::{
    AttachConfig, ChannelRegistry, Result, Servo,
    mock::{PwmCall, RecordingPwm},
    servo,
};

const PAN_PIN: u8 = 9;
const TILT_PIN: u8 = 10;

static SERVOS: ChannelRegistry<RecordingPwm, 4> = ChannelRegistry::new(RecordingPwm::new());

fn main() -> Result<()> {
    // Pan uses the full 544..2400 us range.
    let mut pan = Servo::new(&SERVOS);
    pan.attach(PAN_PIN, AttachConfig::default())?;

    // Tilt is mechanically limited, so narrow its range.
    let mut tilt = servo! {
        registry: &SERVOS,
        pin: TILT_PIN,
        min_us: 1_000,
        max_us: 2_000,
    }?;

    println!("full scale: {} counts", SERVOS.max_duty());
    println!("{:>7} {:>8} {:>6} {:>8} {:>6}", "degrees", "pan us", "duty", "tilt us", "duty");

    // Loop by 30 degrees. Include 180 degrees.
    for degrees in (0..=180_i32).step_by(30) {
        pan.write(degrees);
        tilt.write(180_i32.saturating_sub(degrees));
        println!(
            "{:>7} {:>8} {:>6} {:>8} {:>6}",
            degrees,
            pan.read_microseconds(),
            duty(PAN_PIN),
            tilt.read_microseconds(),
            duty(TILT_PIN),
        );
    }

    // Values of 500 and up are pulse widths.
    pan.write(1_750);
    println!("pan at {} us reads {} degrees", pan.read_microseconds(), pan.read());

    pan.detach();
    tilt.release();
    println!("after detach: pan duty {}", duty(PAN_PIN));

    let writes = SERVOS.with_pwm(|pwm| {
        pwm.calls()
            .iter()
            .filter(|call| matches!(call, PwmCall::Duty { .. }))
            .count()
    });
    println!("{writes} duty writes recorded");
    Ok(())
}

fn duty(pin: u8) -> u32 {
    SERVOS.with_pwm(|pwm| pwm.duty(pin)).unwrap_or(0)
}
