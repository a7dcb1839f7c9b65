//! Hoymiles Cloud API client.
//!
//! The API is unofficial and undocumented: paths, field names, and the login
//! digest were lifted from captured vendor app traffic, so everything
//! vendor-specific stays behind this module.

mod error;
mod models;
mod response;
mod session;
mod settings;

use reqwest::{Client, header};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

pub use self::{
    error::ApiError,
    models::{Station, StationSnapshot},
    session::Session,
    settings::BatterySettings,
};
use self::{
    models::{RealTimeData, StationList},
    response::Response,
    settings::{ModeData, SettingStatus},
};
use crate::{api::client, command::ControlCommand, prelude::*};

const BASE_URL: &str = "https://neapi.hoymiles.com";

/// The only `action` the setting write endpoint is known to accept.
const SETTING_WRITE_ACTION: u32 = 1013;

pub struct Api {
    client: Client,
}

impl Api {
    pub fn try_new() -> Result<Self> {
        Ok(Self { client: client::try_new()? })
    }

    /// Obtain a fresh session token for the account.
    ///
    /// The login endpoint takes an MD5 digest instead of the clear-text
    /// password. Captured traffic shows the vendor app appending a second,
    /// base64-looking hash component, but the plain digest is accepted.
    #[instrument(skip_all, fields(username = username))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        #[derive(Serialize)]
        struct LoginRequest<'a> {
            user_name: &'a str,
            password: String,
        }

        #[derive(Deserialize)]
        struct LoginData {
            token: String,
        }

        let request = LoginRequest {
            user_name: username,
            password: format!("{:x}", md5::compute(password.as_bytes())),
        };
        let data: LoginData =
            self.post("iam/pub/0/auth/login", None, &request).await.map_err(|error| {
                match error {
                    // A login cannot «expire», the cloud is telling us the credentials are bad:
                    ApiError::Cloud { status, message } => {
                        ApiError::Auth(format!(r#"{status} ("{message}")"#))
                    }
                    ApiError::AuthExpired => ApiError::Auth("credentials rejected".to_string()),
                    other => other,
                }
            })?;
        info!("Authenticated");
        Ok(Session::new(data.token))
    }

    /// List the stations registered under the account.
    #[instrument(skip_all)]
    pub async fn get_stations(&self, session: &Session) -> Result<Vec<Station>, ApiError> {
        #[derive(Serialize)]
        struct SelectByPageRequest {
            page_size: u32,
            page_num: u32,
        }

        let list: StationList = self
            .post(
                "pvm/api/0/station/select_by_page",
                Some(session),
                &SelectByPageRequest { page_size: 10, page_num: 1 },
            )
            .await?;
        info!(n_stations = list.stations.len(), "Fetched");
        Ok(list.stations)
    }

    /// Fetch the current telemetry snapshot for the station.
    #[instrument(skip_all, fields(station_id = station_id))]
    pub async fn fetch_station_status(
        &self,
        session: &Session,
        station_id: u64,
    ) -> Result<StationSnapshot, ApiError> {
        #[derive(Serialize)]
        struct RealDataRequest {
            sid: u64,
        }

        let data: RealTimeData = self
            .post(
                "pvm-data/api/0/station/data/count_station_real_data",
                Some(session),
                &RealDataRequest { sid: station_id },
            )
            .await?;

        // A station without storage answers "No Permission" here,
        // so the settings are best-effort only.
        let settings = match self.get_battery_settings(session, station_id).await {
            Ok(settings) => Some(settings),
            Err(error @ ApiError::AuthExpired) => return Err(error),
            Err(error) => {
                warn!(station_id, "No battery settings: {error:#}");
                None
            }
        };
        Ok(StationSnapshot::from_parts(data, settings))
    }

    /// Read the active battery mode and its reserve SoC.
    #[instrument(skip_all, level = Level::DEBUG, fields(station_id = station_id))]
    pub async fn get_battery_settings(
        &self,
        session: &Session,
        station_id: u64,
    ) -> Result<BatterySettings, ApiError> {
        #[derive(Serialize)]
        struct SettingStatusRequest {
            // This endpoint wants the identifier as a string, unlike the others.
            id: String,
        }

        let status: SettingStatus = self
            .post(
                "pvm-ctl/api/0/dev/setting/status",
                Some(session),
                &SettingStatusRequest { id: station_id.to_string() },
            )
            .await?;
        Ok(BatterySettings::from(status))
    }

    /// Submit a control command.
    ///
    /// The cloud acknowledges the request with an opaque request identifier
    /// and never confirms the physical effect: success means «accepted»,
    /// not «applied».
    #[instrument(skip_all, fields(station_id = station_id, command = %command))]
    pub async fn send_command(
        &self,
        session: &Session,
        station_id: u64,
        command: &ControlCommand,
    ) -> Result<(), ApiError> {
        let mode_data = match command {
            ControlCommand::SetBatteryMode(mode) => ModeData::defaults_for(*mode),

            ControlCommand::SetReserveSoc(reserve_soc) => {
                // The write always carries a mode, so preserve whichever one is active,
                // time-of-use periods included:
                let settings = self
                    .get_battery_settings(session, station_id)
                    .await
                    .map_err(|error| warn!("Assuming self-consumption mode: {error:#}"))
                    .unwrap_or_default();
                ModeData::reserve_soc(&settings, *reserve_soc)
            }

            ControlCommand::SetCustomSchedule(schedule) => ModeData::custom_schedule(schedule),
        };

        #[derive(Serialize)]
        struct WriteSettingRequest {
            action: u32,
            data: WriteSettingData,
        }

        #[derive(Serialize)]
        struct WriteSettingData {
            sid: u64,
            data: ModeData,
        }

        let request = WriteSettingRequest {
            action: SETTING_WRITE_ACTION,
            data: WriteSettingData { sid: station_id, data: mode_data },
        };
        let request_id: serde_json::Value =
            self.post("pvm-ctl/api/0/dev/setting/write", Some(session), &request).await?;
        info!(%request_id, "Accepted");
        Ok(())
    }

    /// Issue a `POST` and unwrap the vendor envelope,
    /// retrying once immediately on a transport hiccup.
    async fn post<B: Serialize, D: DeserializeOwned>(
        &self,
        path: &str,
        session: Option<&Session>,
        body: &B,
    ) -> Result<D, ApiError> {
        // Inlined rather than routed through `retry_once`: the closure seam
        // trips rustc's "implementation of `Send` is not general enough"
        // limitation through the `#[async_trait]` boundary.
        match self.post_once(path, session, body).await {
            Err(error) if error.is_transient() => {
                warn!(path, "Retrying after a transient error: {error:#}");
                self.post_once(path, session, body).await
            }
            result => result,
        }
    }

    #[instrument(skip_all, level = Level::DEBUG, fields(path = path))]
    async fn post_once<B: Serialize, D: DeserializeOwned>(
        &self,
        path: &str,
        session: Option<&Session>,
        body: &B,
    ) -> Result<D, ApiError> {
        let mut request = self.client.post(format!("{BASE_URL}/{path}")).json(body);
        if let Some(session) = session {
            // The cloud wants the bare token, no `Bearer` prefix:
            request = request.header(header::AUTHORIZATION, session.token());
        }
        let payload: serde_json::Value =
            request.send().await?.error_for_status()?.json().await?;
        debug!(%payload, "Response received");
        serde_json::from_value::<Response>(payload)?.into_result()
    }
}

/// Run the call, retrying once immediately when the failure is transient.
/// Anything else, vendor rejections included, is returned as-is.
#[cfg(test)]
async fn retry_once<D>(
    path: &str,
    mut call: impl AsyncFnMut() -> Result<D, ApiError>,
) -> Result<D, ApiError> {
    match call().await {
        Err(error) if error.is_transient() => {
            warn!(path, "Retrying after a transient error: {error:#}");
            call().await
        }
        result => result,
    }
}
