//! Wire protocol: command vocabulary, byte codec, exchange engine.
//!
//! The device speaks a small fixed binary protocol: single-byte command
//! codes ("orders") and little-endian signed parameter fields, exchanged in
//! strict request/echo lockstep. This module owns everything between the
//! facade and the raw byte channel.

pub mod codec;
pub mod engine;

/// A command code, as defined by the device firmware.
///
/// The vocabulary is closed, but the *decoder* is total: a numeric code
/// outside the table is carried through as [`Order::Unknown`] with the exact
/// wire value, so callers can log what the device actually sent. Maintenance
/// and calibration firmware builds are known to emit codes outside this
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    // States
    Off,
    /// Animal detected in position.
    Cat,
    /// Stimulate.
    Stm,
    /// Wait for lick.
    Wfl,
    /// Punish / return to normal.
    Nor,
    /// Deliver reward.
    Rew,

    // Targets (pump & lick sensor selectors)
    All,
    Left,
    Right,
    Up,

    // Parameter setting
    SetSide,
    SetTimeout,
    SetSize,
    Calibrate,
    SetWashSpeed,

    // Control / status
    InvalidOrder,
    Timeout,
    Done,
    None,

    /// A code outside the vocabulary, preserved verbatim.
    Unknown(i8),
}

/// Command family, used for logging and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderFamily {
    State,
    Target,
    Param,
    Control,
    Unknown,
}

impl Order {
    /// The numeric wire code for this order.
    pub fn code(self) -> i8 {
        match self {
            Order::Off => 0,
            Order::Cat => 1,
            Order::Stm => 2,
            Order::Wfl => 3,
            Order::Nor => 4,
            Order::Rew => 5,
            Order::All => 20,
            Order::Left => 21,
            Order::Right => 22,
            Order::Up => 23,
            Order::SetSide => 30,
            Order::SetTimeout => 31,
            Order::SetSize => 32,
            Order::Calibrate => 33,
            Order::SetWashSpeed => 34,
            Order::InvalidOrder => 90,
            Order::Timeout => 91,
            Order::Done => 92,
            Order::None => 100,
            Order::Unknown(code) => code,
        }
    }

    /// Total reverse lookup. Never fails: unrecognised codes become
    /// [`Order::Unknown`].
    pub fn from_code(code: i8) -> Self {
        match code {
            0 => Order::Off,
            1 => Order::Cat,
            2 => Order::Stm,
            3 => Order::Wfl,
            4 => Order::Nor,
            5 => Order::Rew,
            20 => Order::All,
            21 => Order::Left,
            22 => Order::Right,
            23 => Order::Up,
            30 => Order::SetSide,
            31 => Order::SetTimeout,
            32 => Order::SetSize,
            33 => Order::Calibrate,
            34 => Order::SetWashSpeed,
            90 => Order::InvalidOrder,
            91 => Order::Timeout,
            92 => Order::Done,
            100 => Order::None,
            other => Order::Unknown(other),
        }
    }

    pub fn family(self) -> OrderFamily {
        match self {
            Order::Off | Order::Cat | Order::Stm | Order::Wfl | Order::Nor | Order::Rew => {
                OrderFamily::State
            }
            Order::All | Order::Left | Order::Right | Order::Up => OrderFamily::Target,
            Order::SetSide
            | Order::SetTimeout
            | Order::SetSize
            | Order::Calibrate
            | Order::SetWashSpeed => OrderFamily::Param,
            Order::InvalidOrder | Order::Timeout | Order::Done | Order::None => {
                OrderFamily::Control
            }
            Order::Unknown(_) => OrderFamily::Unknown,
        }
    }
}

impl From<i8> for Order {
    fn from(code: i8) -> Self {
        Order::from_code(code)
    }
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Order::Unknown(code) => write!(f, "UNKNOWN({code})"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_lookup_is_inverse_of_from_code() {
        for code in i8::MIN..=i8::MAX {
            assert_eq!(Order::from_code(code).code(), code);
        }
    }

    #[test]
    fn unknown_code_passes_through() {
        // 55 is not in the vocabulary; the raw value must survive.
        assert_eq!(Order::from_code(55), Order::Unknown(55));
        assert_eq!(Order::from_code(55).code(), 55);
    }

    #[test]
    fn vocabulary_matches_firmware_table() {
        assert_eq!(Order::Off.code(), 0);
        assert_eq!(Order::Rew.code(), 5);
        assert_eq!(Order::All.code(), 20);
        assert_eq!(Order::Up.code(), 23);
        assert_eq!(Order::SetSide.code(), 30);
        assert_eq!(Order::SetWashSpeed.code(), 34);
        assert_eq!(Order::InvalidOrder.code(), 90);
        assert_eq!(Order::Timeout.code(), 91);
        assert_eq!(Order::Done.code(), 92);
        assert_eq!(Order::None.code(), 100);
    }

    #[test]
    fn families() {
        assert_eq!(Order::Wfl.family(), OrderFamily::State);
        assert_eq!(Order::Left.family(), OrderFamily::Target);
        assert_eq!(Order::Calibrate.family(), OrderFamily::Param);
        assert_eq!(Order::Done.family(), OrderFamily::Control);
        assert_eq!(Order::Unknown(55).family(), OrderFamily::Unknown);
    }
}
