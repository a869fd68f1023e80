use crate::prelude::*;

use serde::Serialize;

use crate::metrics::phase::{
    average, ensure_uniform_topology, PerPhaseMeasurement, PerPhaseNetMeasurement, PhaseTopology,
};
use crate::sunspec::codec::apply_scale;
use crate::sunspec::models::MeterModel;

/// Physical-unit readings of one site meter, or of several sharing a
/// topology. Real power is positive while importing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MeterMetrics {
    pub topology: PhaseTopology,
    pub current: PerPhaseNetMeasurement,
    pub voltage: PerPhaseMeasurement,
    pub real_power: PerPhaseNetMeasurement,
    pub apparent_power: Option<PerPhaseNetMeasurement>,
    pub reactive_power: Option<PerPhaseNetMeasurement>,
    pub power_factor: Option<PerPhaseNetMeasurement>,
    pub frequency: Decimal,
    pub energy_exported: Decimal,
    pub energy_imported: Decimal,
}

fn scaled_phases(
    topology: PhaseTopology,
    quantity: &'static str,
    net: Option<i16>,
    phases: [Option<i16>; 3],
    scale_factor: Option<i16>,
) -> Result<Option<PerPhaseNetMeasurement>> {
    let (net, scale_factor) = match (net, scale_factor) {
        (Some(net), Some(sf)) => (net, sf),
        _ => return Ok(None),
    };
    let scale = |v: Option<i16>| v.map(|v| apply_scale(v, scale_factor));
    let [a, b, c] = phases;

    let phases = PerPhaseMeasurement::new(topology, quantity, scale(a), scale(b), scale(c))?;
    Ok(Some(PerPhaseNetMeasurement::new(
        apply_scale(net, scale_factor),
        phases,
    )))
}

pub fn meter_metrics(model: &MeterModel) -> Result<MeterMetrics> {
    let topology = PhaseTopology::from_meter_model_id(model.id)?;

    let current = scaled_phases(
        topology,
        "current",
        Some(model.a),
        [Some(model.aph_a), model.aph_b, model.aph_c],
        Some(model.a_sf),
    )?
    .ok_or_else(|| anyhow!("meter current missing"))?;

    let volts = |v: Option<i16>| v.map(|v| apply_scale(v, model.v_sf));
    let voltage = PerPhaseMeasurement::new(
        topology,
        "voltage",
        volts(model.ph_v_ph_a),
        volts(model.ph_v_ph_b),
        volts(model.ph_v_ph_c),
    )?;

    let real_power = scaled_phases(
        topology,
        "real power",
        Some(model.w),
        [model.w_ph_a, model.w_ph_b, model.w_ph_c],
        Some(model.w_sf),
    )?
    .ok_or_else(|| anyhow!("meter real power missing"))?;

    Ok(MeterMetrics {
        topology,
        current,
        voltage,
        real_power,
        apparent_power: scaled_phases(
            topology,
            "apparent power",
            model.va,
            [model.va_ph_a, model.va_ph_b, model.va_ph_c],
            model.va_sf,
        )?,
        reactive_power: scaled_phases(
            topology,
            "reactive power",
            model.var,
            [model.var_ph_a, model.var_ph_b, model.var_ph_c],
            model.var_sf,
        )?,
        power_factor: scaled_phases(
            topology,
            "power factor",
            model.pf,
            [model.pf_ph_a, model.pf_ph_b, model.pf_ph_c],
            model.pf_sf,
        )?,
        frequency: apply_scale(model.hz, model.hz_sf),
        energy_exported: apply_scale(model.tot_wh_exp, model.tot_wh_sf),
        energy_imported: apply_scale(model.tot_wh_imp, model.tot_wh_sf),
    })
}

/// Sums additive quantities and averages voltage, frequency and power
/// factor across meters of one topology.
pub fn aggregate_meter_metrics(items: &[MeterMetrics]) -> Result<MeterMetrics> {
    let topology = ensure_uniform_topology("meter", items.iter().map(|m| m.topology))?;

    let currents: Vec<PerPhaseNetMeasurement> = items.iter().map(|m| m.current).collect();
    let voltages: Vec<PerPhaseMeasurement> = items.iter().map(|m| m.voltage).collect();
    let powers: Vec<PerPhaseNetMeasurement> = items.iter().map(|m| m.real_power).collect();
    let apparent: Vec<Option<PerPhaseNetMeasurement>> =
        items.iter().map(|m| m.apparent_power).collect();
    let reactive: Vec<Option<PerPhaseNetMeasurement>> =
        items.iter().map(|m| m.reactive_power).collect();
    let power_factor: Vec<Option<PerPhaseNetMeasurement>> =
        items.iter().map(|m| m.power_factor).collect();

    Ok(MeterMetrics {
        topology,
        current: PerPhaseNetMeasurement::sum(&currents),
        voltage: PerPhaseMeasurement::average(&voltages),
        real_power: PerPhaseNetMeasurement::sum(&powers),
        apparent_power: PerPhaseNetMeasurement::sum_optional(&apparent),
        reactive_power: PerPhaseNetMeasurement::sum_optional(&reactive),
        power_factor: PerPhaseNetMeasurement::average_optional(&power_factor),
        frequency: average(items.iter().map(|m| m.frequency)),
        energy_exported: items.iter().map(|m| m.energy_exported).sum(),
        energy_imported: items.iter().map(|m| m.energy_imported).sum(),
    })
}
