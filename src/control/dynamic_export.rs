//! Export limit arithmetic: from site and fleet power to a `WMaxLimPct`
//! write. Everything here is decimal; nothing touches binary floats.

use crate::prelude::*;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::RoundingStrategy;
use serde::Serialize;
use std::time::Duration;

use crate::metrics::{InverterMetrics, MeterMetrics};
use crate::sunspec::codec::unapply_scale;
use crate::sunspec::models::{Connection, ControlsModel, Enablement};
use crate::sunspec::schema::WritePayload;

/// Ratio requested from a fully curtailed fleet that should produce more.
/// 0.01, i.e. 1%.
pub const ENABLING_POWER_RATIO: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// What the upstream schedule currently asks for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ControlInput {
    /// Positive allows that much import before solar is curtailed, negative
    /// permits export up to its magnitude.
    pub export_limit_watts: Decimal,
    pub deenergize: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ExportControlState {
    pub site_watts: Decimal,
    pub solar_watts: Decimal,
    pub target_solar_watts: Decimal,
    pub current_power_ratio: Option<Decimal>,
    pub target_solar_power_ratio: Decimal,
}

/// Site watts are positive while importing. The result is not capped at any
/// capacity.
pub fn calculate_target_solar_watts(
    solar_watts: Decimal,
    site_watts: Decimal,
    export_limit_watts: Decimal,
) -> Decimal {
    let change_to_meet_export_limit = -site_watts + -export_limit_watts;
    solar_watts - change_to_meet_export_limit
}

/// The fraction of estimated capacity the fleet should run at, in `0..=1`.
///
/// Capacity is inferred as `current_solar_watts / current_power_ratio`. When
/// that is impossible (no ratio, a zero ratio, or no output to infer from)
/// the fleet is nudged on with [`ENABLING_POWER_RATIO`] if more output is
/// wanted, and held at zero otherwise.
///
/// A limited fleet producing 0 W (night, fault, open DC) estimates zero
/// capacity and takes that path too: it is nudged to 1% rather than released
/// to full power, and the next cycle re-estimates from real output.
pub fn calculate_target_solar_power_ratio(
    current_solar_watts: Decimal,
    current_power_ratio: Option<Decimal>,
    target_solar_watts: Decimal,
) -> Decimal {
    let estimated_capacity = current_power_ratio
        .filter(|ratio| !ratio.is_zero())
        .and_then(|ratio| current_solar_watts.checked_div(ratio))
        .filter(|capacity| !capacity.is_zero());

    let capacity = match estimated_capacity {
        Some(capacity) => capacity,
        None if target_solar_watts > current_solar_watts => return ENABLING_POWER_RATIO,
        None => return Decimal::ZERO,
    };

    target_solar_watts
        .checked_div(capacity)
        .unwrap_or(Decimal::ZERO)
        .clamp(Decimal::ZERO, Decimal::ONE)
}

pub fn calculate_export_control_state(
    site: &MeterMetrics,
    der: &InverterMetrics,
    current_power_ratio: Option<Decimal>,
    input: &ControlInput,
) -> ExportControlState {
    let site_watts = site.real_power.net;
    let solar_watts = der.real_power.net;

    let target_solar_watts =
        calculate_target_solar_watts(solar_watts, site_watts, input.export_limit_watts);
    let target_solar_power_ratio =
        calculate_target_solar_power_ratio(solar_watts, current_power_ratio, target_solar_watts);

    ExportControlState {
        site_watts,
        solar_watts,
        target_solar_watts,
        current_power_ratio,
        target_solar_power_ratio,
    }
}

/// The fleet's current output limit as a ratio: `WMaxLimPct / 100` for each
/// inverter with the limit enabled, 1 for the rest, averaged. `None` for an
/// empty fleet.
pub fn current_power_ratio(controls: &[ControlsModel]) -> Option<Decimal> {
    if controls.is_empty() {
        return None;
    }

    let sum: Decimal = controls
        .iter()
        .map(|c| {
            c.active_power_limit_pct()
                .map(|pct| pct / Decimal::ONE_HUNDRED)
                .unwrap_or(Decimal::ONE)
        })
        .sum();

    Some(sum / Decimal::from(controls.len()))
}

/// Raw `WMaxLimPct` register value for a ratio, given the device's
/// `WMaxLimPct_SF`.
pub fn w_max_lim_pct_from_ratio(ratio: Decimal, scale_factor: i16) -> Result<u16> {
    let raw = unapply_scale(ratio * Decimal::ONE_HUNDRED, scale_factor)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    raw.to_u16()
        .ok_or_else(|| anyhow!("power ratio {} gives WMaxLimPct {} out of range", ratio, raw))
}

/// The controls write for one inverter.
///
/// Starts from the inverter's current writable values, switches off fixed
/// power factor and reactive power modes and enables the power limit. With
/// `deenergize` the inverter is disconnected and limited to 0%; otherwise it
/// stays connected at `ratio`. The limit reverts after `revert_timeout`.
pub fn controls_write_payload(
    controls: &ControlsModel,
    ratio: Decimal,
    deenergize: bool,
    revert_timeout: Duration,
) -> Result<WritePayload<ControlsModel>> {
    let revert_secs = u16::try_from(revert_timeout.as_secs())
        .map_err(|_| anyhow!("revert timeout {:?} too long", revert_timeout))?;

    let (connection, limit) = if deenergize {
        (Connection::Disconnect, 0)
    } else {
        (
            Connection::Connect,
            w_max_lim_pct_from_ratio(ratio, controls.w_max_lim_pct_sf)?,
        )
    };

    let mut payload = controls.to_write_payload()?;
    payload
        .set(&ControlsModel::CONN, connection.into())?
        .set(&ControlsModel::W_MAX_LIM_ENA, Enablement::Enabled.into())?
        .set(&ControlsModel::W_MAX_LIM_PCT, limit)?
        .set(&ControlsModel::W_MAX_LIM_PCT_RVRT_TMS, Some(revert_secs))?
        .set(&ControlsModel::OUT_PF_SET_ENA, Enablement::Disabled.into())?
        .set(&ControlsModel::VAR_PCT_ENA, Enablement::Disabled.into())?;

    Ok(payload)
}
