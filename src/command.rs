//! User-facing control actions and their declared field constraints.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Command field outside its declared constraints. Raised before any network call.
#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("reserve SoC must be an integer within 0..=100, got {value}%")]
    ReserveSoc { value: u8 },

    #[error("{field} must be a multiple of 10 within 10..=100, got {value}")]
    ScheduleStep { field: &'static str, value: u8 },

    #[error("`{value}` is not a valid HH:MM time of day")]
    TimeOfDay { value: String },
}

/// Battery working modes known to the cloud, with their vendor identifiers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum, derive_more::Display)]
pub enum BatteryMode {
    #[display("Self-Consumption Mode")]
    SelfConsumption,

    #[display("Economy Mode")]
    Economy,

    #[display("Backup Mode")]
    Backup,

    #[display("Off-Grid Mode")]
    OffGrid,

    #[display("Peak Shaving Mode")]
    PeakShaving,

    #[display("Time of Use Mode")]
    TimeOfUse,
}

impl BatteryMode {
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::SelfConsumption => 1,
            Self::Economy => 2,
            Self::Backup => 3,
            Self::OffGrid => 4,
            Self::PeakShaving => 7,
            Self::TimeOfUse => 8,
        }
    }

    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::SelfConsumption),
            2 => Some(Self::Economy),
            3 => Some(Self::Backup),
            4 => Some(Self::OffGrid),
            7 => Some(Self::PeakShaving),
            8 => Some(Self::TimeOfUse),
            _ => None,
        }
    }
}

/// Wall-clock time in the `HH:MM` form the scheduling endpoints expect.
#[derive(Copy, Clone, Debug, Eq, PartialEq, derive_more::Display)]
#[display("{hour:02}:{minute:02}")]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    pub(crate) const fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let error = || ValidationError::TimeOfDay { value: value.to_string() };
        let (hour, minute) = value.split_once(':').ok_or_else(error)?;
        let (hour, minute) =
            (u8::from_str(hour).map_err(|_| error())?, u8::from_str(minute).map_err(|_| error())?);
        if hour >= 24 || minute >= 60 {
            return Err(error());
        }
        Ok(Self { hour, minute })
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?.parse().map_err(de::Error::custom)
    }
}

/// One user-initiated control action.
///
/// Constructed from the command line (or whatever front-end drives the poller),
/// checked against the declared constraints, and sent once. The cloud only
/// acknowledges the request, it never confirms the physical effect.
#[derive(Clone, Debug, PartialEq, derive_more::Display)]
pub enum ControlCommand {
    #[display("set-battery-mode({_0})")]
    SetBatteryMode(BatteryMode),

    #[display("set-reserve-soc({_0}%)")]
    SetReserveSoc(u8),

    #[display(
        "set-custom-schedule(charge {}-{} at {}%, discharge {}-{} at {}%)",
        _0.charge_start,
        _0.charge_end,
        _0.charge_power,
        _0.discharge_start,
        _0.discharge_end,
        _0.discharge_power
    )]
    SetCustomSchedule(CustomSchedule),
}

impl ControlCommand {
    /// Check the declared field constraints. Network-free.
    pub const fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::SetBatteryMode(_) => Ok(()),
            Self::SetReserveSoc(value) => {
                if *value > 100 {
                    Err(ValidationError::ReserveSoc { value: *value })
                } else {
                    Ok(())
                }
            }
            Self::SetCustomSchedule(schedule) => schedule.validate(),
        }
    }
}

/// A single time-of-use charge/discharge window.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CustomSchedule {
    pub charge_start: TimeOfDay,
    pub charge_end: TimeOfDay,
    pub discharge_start: TimeOfDay,
    pub discharge_end: TimeOfDay,

    /// Charging power in percent of the rated power, `10..=100` in steps of 10.
    pub charge_power: u8,

    /// Discharging power in percent of the rated power, `10..=100` in steps of 10.
    pub discharge_power: u8,

    /// SoC at which charging stops, `10..=100` in steps of 10.
    pub charge_soc: u8,

    /// SoC at which discharging stops, `10..=100` in steps of 10.
    pub discharge_soc: u8,
}

impl CustomSchedule {
    const fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("charge power", self.charge_power),
            ("discharge power", self.discharge_power),
            ("charge SoC", self.charge_soc),
            ("discharge SoC", self.discharge_soc),
        ];
        let mut index = 0;
        while index < fields.len() {
            let (field, value) = fields[index];
            if value < 10 || value > 100 || value % 10 != 0 {
                return Err(ValidationError::ScheduleStep { field, value });
            }
            index += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_reserve_soc_within_range_ok() -> Result {
        ControlCommand::SetReserveSoc(20).validate()?;
        ControlCommand::SetReserveSoc(0).validate()?;
        ControlCommand::SetReserveSoc(100).validate()?;
        Ok(())
    }

    #[test]
    fn test_reserve_soc_out_of_range_rejected() {
        assert_eq!(
            ControlCommand::SetReserveSoc(101).validate(),
            Err(ValidationError::ReserveSoc { value: 101 })
        );
    }

    #[test]
    fn test_schedule_power_off_step_rejected() {
        let mut schedule = valid_schedule();
        schedule.charge_power = 15;
        assert_eq!(
            ControlCommand::SetCustomSchedule(schedule).validate(),
            Err(ValidationError::ScheduleStep { field: "charge power", value: 15 })
        );
    }

    #[test]
    fn test_schedule_soc_below_minimum_rejected() {
        let mut schedule = valid_schedule();
        schedule.discharge_soc = 0;
        assert_eq!(
            ControlCommand::SetCustomSchedule(schedule).validate(),
            Err(ValidationError::ScheduleStep { field: "discharge SoC", value: 0 })
        );
    }

    #[test]
    fn test_valid_schedule_ok() -> Result {
        ControlCommand::SetCustomSchedule(valid_schedule()).validate()?;
        Ok(())
    }

    #[test]
    fn test_time_of_day_from_str_ok() -> Result {
        assert_eq!(TimeOfDay::from_str("03:00")?, TimeOfDay::new(3, 0));
        assert_eq!(TimeOfDay::from_str("23:59")?, TimeOfDay::new(23, 59));
        Ok(())
    }

    #[test]
    fn test_time_of_day_from_str_rejects_nonsense() {
        assert!(TimeOfDay::from_str("24:00").is_err());
        assert!(TimeOfDay::from_str("12:60").is_err());
        assert!(TimeOfDay::from_str("noon").is_err());
    }

    #[test]
    fn test_time_of_day_display_pads() {
        assert_eq!(TimeOfDay::new(5, 7).to_string(), "05:07");
    }

    fn valid_schedule() -> CustomSchedule {
        CustomSchedule {
            charge_start: TimeOfDay::new(3, 0),
            charge_end: TimeOfDay::new(5, 0),
            discharge_start: TimeOfDay::new(17, 0),
            discharge_end: TimeOfDay::new(21, 0),
            charge_power: 100,
            discharge_power: 50,
            charge_soc: 90,
            discharge_soc: 10,
        }
    }
}
