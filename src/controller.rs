//! Lickometer controller — the high-level command facade.
//!
//! [`Lickometer`] composes one exchange engine and one reward scheduler
//! (explicit composition; each part is independently testable) and exposes
//! the operations an experiment actually calls: calibrate a pump, set a
//! reward size, arm the lick watch, deliver a reward or a punishment cue.
//!
//! The facade issues exchanges in exactly the order the caller requests.
//! The device firmware is the authority on legal sequencing; the host does
//! not second-guess it.

use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::config::ControllerConfig;
use crate::error::Result;
use crate::protocol::Order;
use crate::protocol::engine::ExchangeEngine;
use crate::reward::RewardScheduler;
use crate::transport::{SerialTransport, Transport};

/// Pause after issuing REW so device-side actuation starts before the final
/// acknowledgement is read.
const REWARD_SETTLE: Duration = Duration::from_millis(100);

/// A rewardable side: one pump / lick-sensor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Up,
    Left,
    Right,
}

impl Side {
    fn order(self) -> Order {
        match self {
            Side::Up => Order::Up,
            Side::Left => Order::Left,
            Side::Right => Order::Right,
        }
    }
}

/// A pump target for parameter-setting exchanges. `All` addresses every
/// pump in a single exchange; the firmware does the fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pump {
    All,
    Up,
    Left,
    Right,
}

impl Pump {
    fn order(self) -> Order {
        match self {
            Pump::All => Order::All,
            Pump::Up => Order::Up,
            Pump::Left => Order::Left,
            Pump::Right => Order::Right,
        }
    }
}

impl From<Side> for Pump {
    fn from(side: Side) -> Self {
        match side {
            Side::Up => Pump::Up,
            Side::Left => Pump::Left,
            Side::Right => Pump::Right,
        }
    }
}

/// Host-side controller for the reward apparatus.
pub struct Lickometer<T: Transport> {
    engine: ExchangeEngine<T>,
    scheduler: RewardScheduler,
}

impl Lickometer<SerialTransport> {
    /// Open the serial device at `path` and perform the connection
    /// handshake. Port discovery is the caller's job.
    pub fn open(path: &str, config: &ControllerConfig) -> Result<Self> {
        let transport = SerialTransport::open(
            path,
            config.baud_rate,
            Duration::from_millis(config.read_timeout_ms),
        )?;
        Self::connect(transport, config)
    }
}

impl<T: Transport> Lickometer<T> {
    /// Take ownership of an opened transport, perform the handshake, and
    /// stand up a fresh reward history for this session.
    pub fn connect(transport: T, config: &ControllerConfig) -> Result<Self> {
        let engine = ExchangeEngine::connect(transport)?;
        let scheduler = RewardScheduler::new(config.contingency_percent, config.base_size);
        Ok(Self { engine, scheduler })
    }

    /// Firmware version reported during the handshake.
    pub fn version(&self) -> &str {
        self.engine.version()
    }

    /// Initial device values reported during the handshake.
    pub fn initial_values(&self) -> &str {
        self.engine.initial_values()
    }

    /// The scheduler's decision history for this session.
    pub fn reward_history(&self) -> &[i16] {
        self.scheduler.history()
    }

    // ── Parameter-setting operations ──────────────────────────

    /// Set a pump's motor run time and motor speed.
    ///
    /// `motor_time_s` is converted to milliseconds; non-positive or
    /// non-finite values become 0 (motor disabled). `motor_speed` is
    /// clamped to the shield's 0–255 range. One exchange per pump, in the
    /// order given; an empty slice means all pumps.
    pub fn calibrate(&mut self, pumps: &[Pump], motor_time_s: f64, motor_speed: i32) -> Result<()> {
        let motor_time_ms = seconds_to_ms(motor_time_s);
        let motor_speed = i64::from(motor_speed.clamp(0, 255));
        for pump in targets(pumps) {
            debug!("calibrate {pump:?}: time={motor_time_ms}ms speed={motor_speed}");
            self.engine.write_order(Order::Calibrate)?;
            self.engine.read_order()?;

            self.engine.write_order(pump.order())?;
            self.engine.read_order()?;

            self.engine.write_i32(motor_time_ms)?;
            self.engine.read_i32()?;

            self.engine.write_i16(motor_speed)?;
            self.engine.read_i16()?;
        }
        Ok(())
    }

    /// Set the reward size of the given pumps (empty slice: all pumps).
    pub fn set_reward_size(&mut self, pumps: &[Pump], size: i16) -> Result<()> {
        for pump in targets(pumps) {
            debug!("set_reward_size {pump:?}: {size}");
            self.engine.write_order(Order::SetSize)?;
            self.engine.read_order()?;

            self.engine.write_order(pump.order())?;
            self.engine.read_order()?;

            self.engine.write_i16(i64::from(size))?;
            self.engine.read_i16()?;
        }
        Ok(())
    }

    /// Set the motor speed used for washing and TTL-triggered rewarding
    /// (empty slice: all pumps).
    pub fn set_wash_speed(&mut self, pumps: &[Pump], speed: i16) -> Result<()> {
        for pump in targets(pumps) {
            debug!("set_wash_speed {pump:?}: {speed}");
            self.engine.write_order(Order::SetWashSpeed)?;
            self.engine.read_order()?;

            self.engine.write_order(pump.order())?;
            self.engine.read_order()?;

            self.engine.write_i16(i64::from(speed))?;
            self.engine.read_i16()?;
        }
        Ok(())
    }

    /// Set how long the device waits for a lick in the WFL state.
    ///
    /// Seconds are converted to milliseconds; non-positive or non-finite
    /// values become 0, which the firmware treats as "wait forever". The
    /// device answers with the applied value and a finite/infinite
    /// indicator code.
    pub fn set_response_timeout(&mut self, timeout_s: f64) -> Result<()> {
        let timeout_ms = seconds_to_ms(timeout_s);
        debug!("set_response_timeout: {timeout_ms}ms");
        self.engine.write_order(Order::SetTimeout)?;
        self.engine.read_order()?;

        self.engine.write_i32(timeout_ms)?;
        self.engine.read_i32()?;
        self.engine.read_order()?;
        Ok(())
    }

    // ── Trial operations ──────────────────────────────────────

    /// Arm the wait-for-lick state and block until the device reports a
    /// lick (or its own response timeout fires and it reports none).
    ///
    /// Returns a zero-padded 3-digit decimal string whose digit positions
    /// encode up/left/right lick bits, e.g. `"010"` for a left lick.
    ///
    /// No host-side timeout: the wait spins on the channel with no sleep so
    /// the lick timestamp is as tight as the link allows. Callers needing a
    /// bounded wait set the device-side timeout first via
    /// [`set_response_timeout`](Self::set_response_timeout).
    pub fn watch_for_lick(&mut self) -> Result<String> {
        self.engine.write_order(Order::Wfl)?;
        self.engine.read_order()?;

        while self.engine.bytes_available()? < 1 {
            std::hint::spin_loop();
        }
        let licks = self.engine.read_i8()?;
        debug!("lick result: {licks:03}");
        Ok(format!("{licks:03}"))
    }

    /// Select which pump the next REW command drives.
    ///
    /// The device echoes the selected side and then reports completion.
    pub fn select_side(&mut self, side: Side) -> Result<()> {
        debug!("select_side: {side:?}");
        self.engine.write_order(Order::SetSide)?;
        self.engine.read_order()?;

        self.engine.write_order(side.order())?;
        self.engine.read_order()?;
        self.engine.read_order()?;
        Ok(())
    }

    /// Deliver a reward on `side`; returns the device's final status code.
    ///
    /// With an explicit `size` that size is used as-is. Otherwise the up
    /// pump always receives the full base size — up rewards are
    /// unconditional, the scheduler is never consulted — while left/right
    /// go through the contingency scheduler and may come back as a silent
    /// omission (size 0).
    pub fn reward(&mut self, side: Side, size: Option<i16>) -> Result<Order> {
        let magnitude = match size {
            Some(s) => s,
            None if side == Side::Up => self.scheduler.base_size(),
            None => self.scheduler.decide_magnitude(),
        };
        self.set_reward_size(&[Pump::All], magnitude)?;
        self.select_side(side)?;

        self.engine.write_order(Order::Rew)?;
        self.engine.read_order()?;

        // Let device-side actuation start before collecting the result.
        thread::sleep(REWARD_SETTLE);
        let result = self.engine.read_order()?;
        debug!("reward {side:?} size={magnitude}: {result}");
        Ok(result)
    }

    /// Issue the punishment cue.
    pub fn punish(&mut self) -> Result<Order> {
        self.engine.write_order(Order::Nor)?;
        let result = self.engine.read_order()?;
        debug!("punish: {result}");
        Ok(result)
    }

    /// Read one order/value/time event frame, waiting up to `timeout`.
    /// Returns the `(TIMEOUT, 0, -1)` sentinel when no frame arrives.
    pub fn read_event(&mut self, timeout: Duration) -> Result<(Order, i16, i32)> {
        self.engine.read_order_value_time(timeout)
    }

    /// Shut the session down. Must not be called with an exchange in
    /// flight; consuming `self` makes further operations impossible.
    pub fn close(mut self) -> Result<()> {
        info!("closing controller session");
        self.engine.close()
    }
}

/// Expand an empty target list to "all pumps", preserving caller order
/// otherwise.
fn targets(pumps: &[Pump]) -> impl Iterator<Item = Pump> + '_ {
    const ALL: &[Pump] = &[Pump::All];
    if pumps.is_empty() { ALL.iter() } else { pumps.iter() }.copied()
}

/// Seconds to whole milliseconds; non-positive and non-finite durations
/// collapse to 0.
fn seconds_to_ms(seconds: f64) -> i64 {
    if seconds > 0.0 && seconds.is_finite() {
        (seconds * 1000.0).round() as i64
    } else {
        0
    }
}
