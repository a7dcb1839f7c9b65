mod client;
mod cloud;
mod hoymiles;

pub use self::{
    cloud::CloudClient,
    hoymiles::{Api as Hoymiles, ApiError, Session, Station, StationSnapshot},
};
