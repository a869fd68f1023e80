//! Turns decoded SunSpec models into physical-unit readings and combines
//! them across a fleet of devices.

pub mod inverter;
pub mod meter;
pub mod phase;
pub mod rating;

pub use inverter::{aggregate_inverter_metrics, inverter_metrics, InverterMetrics};
pub use meter::{aggregate_meter_metrics, meter_metrics, MeterMetrics};
pub use phase::{PerPhaseMeasurement, PerPhaseNetMeasurement, PhaseTopology};
pub use rating::{aggregate_der_rating, der_rating, DerRating};
