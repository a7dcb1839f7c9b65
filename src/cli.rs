use clap::{Parser, Subcommand};

use crate::{
    command::{BatteryMode, CustomSchedule, TimeOfDay},
    poller::Credentials,
};

#[derive(Parser)]
#[command(version, about, propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Poll the station telemetry on a fixed interval and log it.
    Watch(WatchArgs),

    /// List the stations registered under the account.
    Stations(AccountArgs),

    /// Fetch and print the current station telemetry once.
    Status(StationArgs),

    /// Switch the battery working mode.
    SetBatteryMode(SetBatteryModeArgs),

    /// Set the reserve state-of-charge of the active mode.
    SetReserveSoc(SetReserveSocArgs),

    /// Program a time-of-use charge/discharge schedule.
    SetCustomSchedule(SetCustomScheduleArgs),
}

#[derive(Parser)]
pub struct AccountArgs {
    /// Hoymiles Cloud account name.
    #[clap(long, env = "HOYMILES_USERNAME")]
    pub username: String,

    /// Hoymiles Cloud password.
    #[clap(long, env = "HOYMILES_PASSWORD")]
    pub password: String,
}

impl From<AccountArgs> for Credentials {
    fn from(args: AccountArgs) -> Self {
        Self { username: args.username, password: args.password }
    }
}

#[derive(Parser)]
pub struct StationArgs {
    #[clap(flatten)]
    pub account: AccountArgs,

    /// Numeric station identifier, see `stations`.
    #[clap(long, env = "HOYMILES_STATION_ID")]
    pub station_id: u64,
}

#[derive(Parser)]
pub struct WatchArgs {
    #[clap(flatten)]
    pub station: StationArgs,

    /// Polling interval in seconds.
    #[clap(long = "interval-secs", default_value = "60", env = "POLL_INTERVAL_SECS")]
    pub interval_secs: u64,
}

#[derive(Parser)]
pub struct SetBatteryModeArgs {
    #[clap(flatten)]
    pub station: StationArgs,

    /// Target working mode.
    #[clap(long)]
    pub mode: BatteryMode,
}

#[derive(Parser)]
pub struct SetReserveSocArgs {
    #[clap(flatten)]
    pub station: StationArgs,

    /// Reserve state-of-charge in percent, 0 to 100.
    #[clap(long)]
    pub soc: u8,
}

#[derive(Parser)]
pub struct SetCustomScheduleArgs {
    #[clap(flatten)]
    pub station: StationArgs,

    /// Charge window start, `HH:MM`.
    #[clap(long)]
    pub charge_start: TimeOfDay,

    /// Charge window end, `HH:MM`.
    #[clap(long)]
    pub charge_end: TimeOfDay,

    /// Discharge window start, `HH:MM`.
    #[clap(long)]
    pub discharge_start: TimeOfDay,

    /// Discharge window end, `HH:MM`.
    #[clap(long)]
    pub discharge_end: TimeOfDay,

    /// Charging power in percent, a multiple of 10 within 10 to 100.
    #[clap(long)]
    pub charge_power: u8,

    /// Discharging power in percent, a multiple of 10 within 10 to 100.
    #[clap(long)]
    pub discharge_power: u8,

    /// SoC at which charging stops, a multiple of 10 within 10 to 100.
    #[clap(long)]
    pub charge_soc: u8,

    /// SoC at which discharging stops, a multiple of 10 within 10 to 100.
    #[clap(long)]
    pub discharge_soc: u8,
}

impl SetCustomScheduleArgs {
    #[must_use]
    pub const fn schedule(&self) -> CustomSchedule {
        CustomSchedule {
            charge_start: self.charge_start,
            charge_end: self.charge_end,
            discharge_start: self.discharge_start,
            discharge_end: self.discharge_end,
            charge_power: self.charge_power,
            discharge_power: self.discharge_power,
            charge_soc: self.charge_soc,
            discharge_soc: self.discharge_soc,
        }
    }
}
