use serde::{Deserialize, Deserializer, de};

use super::settings::BatterySettings;
use crate::command::BatteryMode;

/// A physical site (inverter + battery) registered under the cloud account.
#[derive(Deserialize)]
pub struct Station {
    pub id: u64,
    pub name: String,
}

#[derive(Deserialize)]
pub struct StationList {
    #[serde(rename = "list", default)]
    pub stations: Vec<Station>,
}

/// Flat record of the latest known station telemetry.
///
/// Replaced wholesale on every successful poll: a failed poll leaves the
/// previously published snapshot intact.
#[derive(Clone, Debug, PartialEq)]
pub struct StationSnapshot {
    /// Current PV production in watts.
    pub pv_power: f64,

    /// Battery power in watts as the BMS reports it.
    pub battery_power: f64,

    /// Battery state-of-charge in percent.
    pub battery_soc: f64,

    /// Grid import/export power in watts.
    pub grid_power: f64,

    /// Household load in watts.
    pub load_power: f64,

    /// Today's production in watt-hours.
    pub today_energy: f64,

    /// This month's production in watt-hours.
    pub month_energy: f64,

    /// This year's production in watt-hours.
    pub year_energy: f64,

    /// Lifetime production in watt-hours.
    pub total_energy: f64,

    /// Active battery working mode, when the station has storage.
    pub battery_mode: Option<BatteryMode>,

    /// Reserve SoC of the active mode, when the station has storage.
    pub reserve_soc: Option<u8>,
}

impl StationSnapshot {
    pub(super) fn from_parts(data: RealTimeData, settings: Option<BatterySettings>) -> Self {
        let settings = settings.unwrap_or_default();
        Self {
            pv_power: data.pv_power,
            battery_power: data.storage.battery_power,
            battery_soc: data.storage.battery_soc,
            grid_power: data.storage.grid_power,
            load_power: data.storage.load_power,
            today_energy: data.today_energy,
            month_energy: data.month_energy,
            year_energy: data.year_energy,
            total_energy: data.total_energy,
            battery_mode: settings.mode,
            reserve_soc: settings.reserve_soc,
        }
    }
}

/// Raw payload of the real-time data endpoint.
#[derive(Deserialize)]
pub(super) struct RealTimeData {
    #[serde(rename = "real_power", deserialize_with = "lenient_f64", default)]
    pub pv_power: f64,

    #[serde(rename = "today_eq", deserialize_with = "lenient_f64", default)]
    pub today_energy: f64,

    #[serde(rename = "month_eq", deserialize_with = "lenient_f64", default)]
    pub month_energy: f64,

    #[serde(rename = "year_eq", deserialize_with = "lenient_f64", default)]
    pub year_energy: f64,

    #[serde(rename = "total_eq", deserialize_with = "lenient_f64", default)]
    pub total_energy: f64,

    #[serde(rename = "reflux_station_data", default)]
    pub storage: StorageData,
}

/// The storage-related block, absent on stations without a battery.
#[derive(Default, Deserialize)]
pub(super) struct StorageData {
    #[serde(rename = "bms_power", deserialize_with = "lenient_f64", default)]
    pub battery_power: f64,

    #[serde(rename = "bms_soc", deserialize_with = "lenient_f64", default)]
    pub battery_soc: f64,

    #[serde(rename = "grid_power", deserialize_with = "lenient_f64", default)]
    pub grid_power: f64,

    #[serde(rename = "load_power", deserialize_with = "lenient_f64", default)]
    pub load_power: f64,
}

/// The cloud is not consistent about numbers: depending on the station they
/// arrive as JSON numbers, decimal strings, empty strings, or `null`.
fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Null,
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) if text.is_empty() => Ok(0.0),
        Raw::Text(text) => text
            .parse()
            .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(&text), &"a number")),
        Raw::Null => Ok(0.0),
    }
}
