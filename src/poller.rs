//! Polling/control adapter: one task per account drives the cloud client.

use std::time::Duration;

use tokio::{
    sync::watch,
    time::{self, MissedTickBehavior},
};

use crate::{
    api::{ApiError, CloudClient, Session, StationSnapshot},
    command::{BatteryMode, ControlCommand, CustomSchedule},
    prelude::*,
};

/// Cloud account credentials.
pub struct Credentials {
    pub username: String,
    pub password: String,
}

enum AccountState {
    Unauthenticated,
    Authenticated(Session),
}

/// Polling and control adapter for one account and station.
///
/// Owns the only [`Session`] for the account. Everything goes through
/// `&mut self`, so the token is never shared between in-flight requests and
/// refresh attempts are serialized by construction.
pub struct Poller<C> {
    client: C,
    credentials: Credentials,
    station_id: u64,
    interval: Duration,
    state: AccountState,
    snapshot_tx: watch::Sender<Option<StationSnapshot>>,
}

impl<C: CloudClient> Poller<C> {
    pub fn new(
        client: C,
        credentials: Credentials,
        station_id: u64,
        interval: Duration,
    ) -> (Self, watch::Receiver<Option<StationSnapshot>>) {
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let this = Self {
            client,
            credentials,
            station_id,
            interval,
            state: AccountState::Unauthenticated,
            snapshot_tx,
        };
        (this, snapshot_rx)
    }

    /// Poll the cloud forever.
    pub async fn run(mut self) {
        let mut interval = time::interval(self.interval);
        // A tick that fires while the previous poll is still in flight is dropped,
        // keeping at most one outstanding fetch:
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            self.poll_once().await;
        }
    }

    /// One tick: authenticate when needed, fetch, publish.
    pub async fn poll_once(&mut self) {
        if let Err(error) = self.try_poll().await {
            error!("Poll failed: {error:#}");
        }
    }

    async fn try_poll(&mut self) -> Result {
        let session = match self.ensure_authenticated().await {
            Ok(session) => session,
            Err(error) => {
                // Without a token every dependent reading is unavailable:
                self.snapshot_tx.send_replace(None);
                return Err(error);
            }
        };
        match self.client.fetch_station_status(&session, self.station_id).await {
            Ok(snapshot) => {
                info!(
                    pv_power = snapshot.pv_power,
                    battery_soc = snapshot.battery_soc,
                    battery_power = snapshot.battery_power,
                    grid_power = snapshot.grid_power,
                    load_power = snapshot.load_power,
                    "Fetched",
                );
                self.snapshot_tx.send_replace(Some(snapshot));
                Ok(())
            }

            Err(ApiError::AuthExpired) => {
                // One token refresh, fetching resumes on the next tick:
                info!("Session token rejected, re-authenticating");
                self.state = AccountState::Unauthenticated;
                self.ensure_authenticated().await.map(drop)
            }

            // A failed poll leaves the previously published snapshot intact:
            Err(error) => Err(error.into()),
        }
    }

    /// Make sure there is a usable session, authenticating when there is none
    /// or the current one has outlived its assumed validity.
    pub async fn ensure_authenticated(&mut self) -> Result<Session> {
        if let AccountState::Authenticated(session) = &self.state {
            if !session.is_expired() {
                return Ok(session.clone());
            }
            info!("Session outlived its assumed validity, re-authenticating");
        }
        let session = self
            .client
            .authenticate(&self.credentials.username, &self.credentials.password)
            .await
            .context("authentication failed")?;
        self.state = AccountState::Authenticated(session.clone());
        Ok(session)
    }

    pub async fn set_battery_mode(&mut self, mode: BatteryMode) -> Result {
        self.handle(ControlCommand::SetBatteryMode(mode)).await
    }

    pub async fn set_reserve_soc(&mut self, reserve_soc: u8) -> Result {
        self.handle(ControlCommand::SetReserveSoc(reserve_soc)).await
    }

    pub async fn set_custom_schedule(&mut self, schedule: CustomSchedule) -> Result {
        self.handle(ControlCommand::SetCustomSchedule(schedule)).await
    }

    /// Validate and submit a command on the current session.
    ///
    /// Fire-and-forget: success only means the cloud accepted the request.
    /// Validation happens before any network call, and a command without an
    /// established session is refused outright.
    pub async fn handle(&mut self, command: ControlCommand) -> Result {
        command.validate()?;
        let AccountState::Authenticated(session) = &self.state else {
            bail!("not authenticated, refusing to send {command}");
        };
        self.client
            .send_command(session, self.station_id, &command)
            .await
            .with_context(|| format!("failed to send {command}"))?;
        info!(%command, "Accepted");
        Ok(())
    }
}
