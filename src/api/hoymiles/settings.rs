//! Battery setting shapes of the `dev/setting` endpoints.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::command::{BatteryMode, CustomSchedule, TimeOfDay};

/// Currently active battery settings, as far as the status endpoint reports them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BatterySettings {
    pub mode: Option<BatteryMode>,
    pub reserve_soc: Option<u8>,

    /// Programmed time-of-use periods, carried along so a partial write
    /// does not wipe them.
    pub time_of_use_periods: Option<Vec<SchedulePeriod>>,
}

/// Raw payload of the setting status endpoint: the interesting part is nested
/// one level down, keyed per mode as `k_1`, `k_2`, and so on.
#[derive(Deserialize)]
pub(super) struct SettingStatus {
    pub data: Option<SettingState>,
}

#[derive(Deserialize)]
pub(super) struct SettingState {
    pub mode: Option<u8>,

    #[serde(default)]
    pub data: HashMap<String, ModeState>,
}

#[derive(Deserialize)]
pub(super) struct ModeState {
    pub reserve_soc: Option<u8>,

    #[serde(default, deserialize_with = "lenient_periods")]
    pub time: Option<Vec<SchedulePeriod>>,
}

/// The per-mode entries are only loosely shaped; an unrecognized `time`
/// block under some other mode must not fail the whole settings read.
fn lenient_periods<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<SchedulePeriod>>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl From<SettingStatus> for BatterySettings {
    fn from(status: SettingStatus) -> Self {
        let Some(state) = status.data else {
            return Self::default();
        };
        let mode = state.mode.and_then(BatteryMode::from_id);
        let reserve_soc = mode
            .and_then(|mode| state.data.get(&format!("k_{}", mode.id())))
            .and_then(|mode_state| mode_state.reserve_soc);
        let time_of_use_periods = state
            .data
            .get(&format!("k_{}", BatteryMode::TimeOfUse.id()))
            .and_then(|mode_state| mode_state.time.clone());
        Self { mode, reserve_soc, time_of_use_periods }
    }
}

/// Inner payload of the setting write endpoint: the selected mode together
/// with its mode-specific settings.
#[derive(Serialize)]
pub(super) struct ModeData {
    pub mode: u8,
    pub data: ModeSettings,
}

impl ModeData {
    /// Default settings the vendor app submits when switching to a mode.
    pub fn defaults_for(mode: BatteryMode) -> Self {
        let data = match mode {
            BatteryMode::SelfConsumption => {
                ModeSettings { reserve_soc: Some(10), ..ModeSettings::default() }
            }

            BatteryMode::Economy => ModeSettings {
                reserve_soc: Some(0),
                money_code: Some("$"),
                date: Some(Vec::new()),
                ..ModeSettings::default()
            },

            BatteryMode::Backup => {
                ModeSettings { reserve_soc: Some(100), ..ModeSettings::default() }
            }

            BatteryMode::OffGrid => ModeSettings::default(),

            BatteryMode::PeakShaving => ModeSettings {
                reserve_soc: Some(30),
                max_soc: Some(70),
                meter_power: Some(3000),
                ..ModeSettings::default()
            },

            BatteryMode::TimeOfUse => ModeSettings {
                reserve_soc: Some(10),
                time: Some(vec![SchedulePeriod::DEFAULT]),
                ..ModeSettings::default()
            },
        };
        Self { mode: mode.id(), data }
    }

    /// A reserve-SoC change on top of the currently active settings.
    ///
    /// In time-of-use mode the write must carry the programmed periods too,
    /// a bare `reserve_soc` would wipe them.
    pub fn reserve_soc(settings: &BatterySettings, reserve_soc: u8) -> Self {
        let mode = settings.mode.unwrap_or(BatteryMode::SelfConsumption);
        let time = (mode == BatteryMode::TimeOfUse)
            .then(|| settings.time_of_use_periods.clone().unwrap_or_default());
        Self {
            mode: mode.id(),
            data: ModeSettings { reserve_soc: Some(reserve_soc), time, ..ModeSettings::default() },
        }
    }

    pub fn custom_schedule(schedule: &CustomSchedule) -> Self {
        Self {
            mode: BatteryMode::TimeOfUse.id(),
            data: ModeSettings {
                time: Some(vec![SchedulePeriod::from(schedule)]),
                ..ModeSettings::default()
            },
        }
    }
}

#[derive(Default, Serialize)]
pub(super) struct ModeSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserve_soc: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub money_code: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<Vec<serde_json::Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_soc: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meter_power: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<Vec<SchedulePeriod>>,
}

/// One time-of-use period in the vendor's field names.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SchedulePeriod {
    #[serde(rename = "cs_time")]
    pub charge_start: TimeOfDay,

    #[serde(rename = "ce_time")]
    pub charge_end: TimeOfDay,

    #[serde(rename = "c_power")]
    pub charge_power: u8,

    #[serde(rename = "dcs_time")]
    pub discharge_start: TimeOfDay,

    #[serde(rename = "dce_time")]
    pub discharge_end: TimeOfDay,

    #[serde(rename = "dc_power")]
    pub discharge_power: u8,

    pub charge_soc: u8,

    #[serde(rename = "dis_charge_soc")]
    pub discharge_soc: u8,
}

impl SchedulePeriod {
    /// The placeholder period the vendor app submits on a fresh time-of-use mode.
    pub const DEFAULT: Self = Self {
        charge_start: TimeOfDay::new(3, 0),
        charge_end: TimeOfDay::new(5, 0),
        charge_power: 100,
        discharge_start: TimeOfDay::new(5, 0),
        discharge_end: TimeOfDay::new(3, 0),
        discharge_power: 100,
        charge_soc: 90,
        discharge_soc: 10,
    };
}

impl From<&CustomSchedule> for SchedulePeriod {
    fn from(schedule: &CustomSchedule) -> Self {
        Self {
            charge_start: schedule.charge_start,
            charge_end: schedule.charge_end,
            charge_power: schedule.charge_power,
            discharge_start: schedule.discharge_start,
            discharge_end: schedule.discharge_end,
            discharge_power: schedule.discharge_power,
            charge_soc: schedule.charge_soc,
            discharge_soc: schedule.discharge_soc,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_settings_from_status_ok() -> Result {
        // language=JSON
        const STATUS: &str = r#"
            {
                "data": {
                    "mode": 3,
                    "data": {
                        "k_1": {"reserve_soc": 10},
                        "k_3": {"reserve_soc": 100}
                    }
                }
            }
        "#;
        let settings = BatterySettings::from(serde_json::from_str::<SettingStatus>(STATUS)?);
        assert_eq!(settings.mode, Some(BatteryMode::Backup));
        assert_eq!(settings.reserve_soc, Some(100));
        assert_eq!(settings.time_of_use_periods, None);
        Ok(())
    }

    #[test]
    fn test_reserve_soc_write_preserves_time_of_use_periods() -> Result {
        // language=JSON
        const STATUS: &str = r#"
            {
                "data": {
                    "mode": 8,
                    "data": {
                        "k_8": {
                            "reserve_soc": 10,
                            "time": [{
                                "cs_time": "02:00",
                                "ce_time": "06:00",
                                "c_power": 80,
                                "dcs_time": "17:30",
                                "dce_time": "21:00",
                                "dc_power": 100,
                                "charge_soc": 90,
                                "dis_charge_soc": 20
                            }]
                        }
                    }
                }
            }
        "#;
        let settings = BatterySettings::from(serde_json::from_str::<SettingStatus>(STATUS)?);
        assert_eq!(settings.mode, Some(BatteryMode::TimeOfUse));
        assert_eq!(
            serde_json::to_value(ModeData::reserve_soc(&settings, 25))?,
            json!({
                "mode": 8,
                "data": {
                    "reserve_soc": 25,
                    "time": [{
                        "cs_time": "02:00",
                        "ce_time": "06:00",
                        "c_power": 80,
                        "dcs_time": "17:30",
                        "dce_time": "21:00",
                        "dc_power": 100,
                        "charge_soc": 90,
                        "dis_charge_soc": 20
                    }]
                }
            })
        );
        Ok(())
    }

    #[test]
    fn test_unrecognized_period_shape_tolerated() -> Result {
        // language=JSON
        const STATUS: &str = r#"
            {
                "data": {
                    "mode": 2,
                    "data": {
                        "k_2": {"reserve_soc": 0, "time": [{"week_day": 1}]},
                        "k_8": {"reserve_soc": 10}
                    }
                }
            }
        "#;
        let settings = BatterySettings::from(serde_json::from_str::<SettingStatus>(STATUS)?);
        assert_eq!(settings.mode, Some(BatteryMode::Economy));
        assert_eq!(settings.reserve_soc, Some(0));
        assert_eq!(settings.time_of_use_periods, None);
        Ok(())
    }

    #[test]
    fn test_reserve_soc_write_for_other_modes_omits_periods() -> Result {
        let settings =
            BatterySettings { mode: Some(BatteryMode::Backup), ..BatterySettings::default() };
        assert_eq!(
            serde_json::to_value(ModeData::reserve_soc(&settings, 40))?,
            json!({"mode": 3, "data": {"reserve_soc": 40}})
        );
        Ok(())
    }

    #[test]
    fn test_reserve_soc_write_without_settings_assumes_self_consumption() -> Result {
        assert_eq!(
            serde_json::to_value(ModeData::reserve_soc(&BatterySettings::default(), 15))?,
            json!({"mode": 1, "data": {"reserve_soc": 15}})
        );
        Ok(())
    }

    #[test]
    fn test_settings_default_without_storage() -> Result {
        // language=JSON
        const STATUS: &str = r#"{"data": null}"#;
        let settings = BatterySettings::from(serde_json::from_str::<SettingStatus>(STATUS)?);
        assert_eq!(settings, BatterySettings::default());
        Ok(())
    }

    #[test]
    fn test_serialize_custom_schedule_wire_shape() -> Result {
        let schedule = CustomSchedule {
            charge_start: TimeOfDay::new(2, 0),
            charge_end: TimeOfDay::new(6, 0),
            discharge_start: TimeOfDay::new(17, 30),
            discharge_end: TimeOfDay::new(21, 0),
            charge_power: 80,
            discharge_power: 100,
            charge_soc: 90,
            discharge_soc: 20,
        };
        assert_eq!(
            serde_json::to_value(ModeData::custom_schedule(&schedule))?,
            json!({
                "mode": 8,
                "data": {
                    "time": [{
                        "cs_time": "02:00",
                        "ce_time": "06:00",
                        "c_power": 80,
                        "dcs_time": "17:30",
                        "dce_time": "21:00",
                        "dc_power": 100,
                        "charge_soc": 90,
                        "dis_charge_soc": 20
                    }]
                }
            })
        );
        Ok(())
    }

    #[test]
    fn test_serialize_mode_defaults_skip_absent_fields() -> Result {
        assert_eq!(
            serde_json::to_value(ModeData::defaults_for(BatteryMode::PeakShaving))?,
            json!({
                "mode": 7,
                "data": {"reserve_soc": 30, "max_soc": 70, "meter_power": 3000}
            })
        );
        assert_eq!(
            serde_json::to_value(ModeData::defaults_for(BatteryMode::OffGrid))?,
            json!({"mode": 4, "data": {}})
        );
        Ok(())
    }
}
