use async_trait::async_trait;

use super::hoymiles::{Api, ApiError, Session, StationSnapshot};
use crate::command::ControlCommand;

/// Seam between the poller and the vendor client.
#[async_trait]
pub trait CloudClient {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Session, ApiError>;

    async fn fetch_station_status(
        &self,
        session: &Session,
        station_id: u64,
    ) -> Result<StationSnapshot, ApiError>;

    async fn send_command(
        &self,
        session: &Session,
        station_id: u64,
        command: &ControlCommand,
    ) -> Result<(), ApiError>;
}

#[async_trait]
impl CloudClient for Api {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        Self::authenticate(self, username, password).await
    }

    async fn fetch_station_status(
        &self,
        session: &Session,
        station_id: u64,
    ) -> Result<StationSnapshot, ApiError> {
        Self::fetch_station_status(self, session, station_id).await
    }

    async fn send_command(
        &self,
        session: &Session,
        station_id: u64,
        command: &ControlCommand,
    ) -> Result<(), ApiError> {
        Self::send_command(self, session, station_id, command).await
    }
}
