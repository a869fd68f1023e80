//! Field tables for the SunSpec models this crate reads and writes.

pub mod common;
pub mod controls;
pub mod inverter;
pub mod meter;
pub mod nameplate;
pub mod settings;

pub use common::CommonModel;
pub use controls::{Connection, ControlsModel, Enablement};
pub use inverter::{InverterModel, InverterModelId, OperatingState};
pub use meter::{MeterModel, MeterModelId};
pub use nameplate::NameplateModel;
pub use settings::SettingsModel;
