use crate::prelude::*;

use serde::Serialize;

use crate::metrics::phase::{
    average, average_optional, ensure_uniform_topology, sum_optional, PerPhaseMeasurement,
    PerPhaseNetMeasurement, PhaseTopology,
};
use crate::sunspec::codec::{apply_scale, apply_scale_nullable};
use crate::sunspec::models::{InverterModel, OperatingState};

/// Physical-unit readings of one inverter, or of a fleet of inverters
/// sharing a topology.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InverterMetrics {
    pub topology: PhaseTopology,
    /// Amps.
    pub current: PerPhaseNetMeasurement,
    /// Line-to-neutral volts, `None` when the device does not report them.
    pub voltage: Option<PerPhaseMeasurement>,
    /// Watts. Per-phase values are `current × voltage` when voltage is known,
    /// otherwise the whole output is booked on phase A.
    pub real_power: PerPhaseNetMeasurement,
    pub apparent_power: Option<Decimal>,
    pub reactive_power: Option<Decimal>,
    pub power_factor: Option<Decimal>,
    pub frequency: Decimal,
    /// Watt-hours.
    pub lifetime_energy: Decimal,
    pub dc_power: Option<Decimal>,
    pub cabinet_temperature: Option<Decimal>,
    pub operating_state: Option<OperatingState>,
}

fn phase_power(current: Option<Decimal>, voltage: Option<Decimal>) -> Option<Decimal> {
    Some(current? * voltage?)
}

pub fn inverter_metrics(model: &InverterModel) -> Result<InverterMetrics> {
    let topology = PhaseTopology::from_inverter_model_id(model.id)?;

    let amps = |v: Option<u16>| v.map(|v| apply_scale(v, model.a_sf));
    let current = PerPhaseNetMeasurement::new(
        apply_scale(model.a, model.a_sf),
        PerPhaseMeasurement::new(
            topology,
            "current",
            amps(Some(model.aph_a)),
            amps(model.aph_b),
            amps(model.aph_c),
        )?,
    );

    let volts = |v: Option<u16>| v.map(|v| apply_scale(v, model.v_sf));
    let voltage = PerPhaseMeasurement::optional(
        topology,
        "voltage",
        volts(model.ph_v_ph_a),
        volts(model.ph_v_ph_b),
        volts(model.ph_v_ph_c),
    )?;

    let net_power = apply_scale(model.w, model.w_sf);
    let per_phase_power = match &voltage {
        Some(v) => PerPhaseMeasurement {
            phase_a: current.phases.phase_a * v.phase_a,
            phase_b: phase_power(current.phases.phase_b, v.phase_b),
            phase_c: phase_power(current.phases.phase_c, v.phase_c),
        },
        None => PerPhaseMeasurement {
            phase_a: net_power,
            phase_b: None,
            phase_c: None,
        },
    };

    let operating_state = OperatingState::try_from(model.st).ok();
    if operating_state.is_none() {
        warn!("inverter reports unknown operating state {}", model.st);
    }

    Ok(InverterMetrics {
        topology,
        current,
        voltage,
        real_power: PerPhaseNetMeasurement::new(net_power, per_phase_power),
        apparent_power: apply_scale_nullable(model.va, model.va_sf),
        reactive_power: apply_scale_nullable(model.var, model.var_sf),
        power_factor: apply_scale_nullable(model.pf, model.pf_sf),
        frequency: apply_scale(model.hz, model.hz_sf),
        lifetime_energy: apply_scale(model.wh, model.wh_sf),
        dc_power: apply_scale_nullable(model.dcw, model.dcw_sf),
        cabinet_temperature: apply_scale_nullable(model.tmp_cab, model.tmp_sf),
        operating_state,
    })
}

/// Sums additive quantities and averages intensive ones across inverters of
/// one topology. Optional quantities are `None` unless every inverter has them.
pub fn aggregate_inverter_metrics(items: &[InverterMetrics]) -> Result<InverterMetrics> {
    let topology = ensure_uniform_topology("inverter", items.iter().map(|m| m.topology))?;

    let currents: Vec<PerPhaseNetMeasurement> = items.iter().map(|m| m.current).collect();
    let powers: Vec<PerPhaseNetMeasurement> = items.iter().map(|m| m.real_power).collect();
    let voltages: Option<Vec<PerPhaseMeasurement>> = items.iter().map(|m| m.voltage).collect();

    let operating_state = items
        .iter()
        .map(|m| m.operating_state)
        .reduce(|a, b| if a == b { a } else { None })
        .flatten();

    Ok(InverterMetrics {
        topology,
        current: PerPhaseNetMeasurement::sum(&currents),
        voltage: voltages.map(|v| PerPhaseMeasurement::average(&v)),
        real_power: PerPhaseNetMeasurement::sum(&powers),
        apparent_power: sum_optional(items.iter().map(|m| m.apparent_power)),
        reactive_power: sum_optional(items.iter().map(|m| m.reactive_power)),
        power_factor: average_optional(items.iter().map(|m| m.power_factor)),
        frequency: average(items.iter().map(|m| m.frequency)),
        lifetime_energy: items.iter().map(|m| m.lifetime_energy).sum(),
        dc_power: sum_optional(items.iter().map(|m| m.dc_power)),
        cabinet_temperature: average_optional(items.iter().map(|m| m.cabinet_temperature)),
        operating_state,
    })
}
