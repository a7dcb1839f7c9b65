mod api;
mod cli;
mod command;
mod poller;
mod prelude;
mod tables;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{
    api::Hoymiles,
    cli::{Args, Command, StationArgs},
    command::ControlCommand,
    poller::Poller,
    prelude::*,
};

#[tokio::main]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match Args::parse().command {
        Command::Watch(args) => {
            let (poller, _snapshots) = Poller::new(
                Hoymiles::try_new()?,
                args.station.account.into(),
                args.station.station_id,
                Duration::from_secs(args.interval_secs),
            );
            poller.run().await;
            Ok(())
        }

        Command::Stations(args) => {
            let api = Hoymiles::try_new()?;
            let session = api.authenticate(&args.username, &args.password).await?;
            let stations = api.get_stations(&session).await?;
            println!("{}", tables::build_stations_table(&stations));
            Ok(())
        }

        Command::Status(args) => {
            let api = Hoymiles::try_new()?;
            let session = api.authenticate(&args.account.username, &args.account.password).await?;
            let snapshot = api.fetch_station_status(&session, args.station_id).await?;
            println!("{}", tables::build_snapshot_table(&snapshot));
            Ok(())
        }

        Command::SetBatteryMode(args) => {
            send_command(args.station, ControlCommand::SetBatteryMode(args.mode)).await
        }

        Command::SetReserveSoc(args) => {
            send_command(args.station, ControlCommand::SetReserveSoc(args.soc)).await
        }

        Command::SetCustomSchedule(args) => {
            let command = ControlCommand::SetCustomSchedule(args.schedule());
            send_command(args.station, command).await
        }
    }
}

/// One-shot command dispatch: validate before touching the network at all,
/// then authenticate and submit once.
async fn send_command(station: StationArgs, command: ControlCommand) -> Result {
    command.validate()?;
    let (mut poller, _snapshots) = Poller::new(
        Hoymiles::try_new()?,
        station.account.into(),
        station.station_id,
        Duration::from_secs(60),
    );
    poller.ensure_authenticated().await?;
    match command {
        ControlCommand::SetBatteryMode(mode) => poller.set_battery_mode(mode).await,
        ControlCommand::SetReserveSoc(reserve_soc) => poller.set_reserve_soc(reserve_soc).await,
        ControlCommand::SetCustomSchedule(schedule) => poller.set_custom_schedule(schedule).await,
    }
}
