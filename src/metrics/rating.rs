use crate::prelude::*;

use serde::Serialize;

use crate::metrics::phase::sum_optional;
use crate::sunspec::codec::{apply_scale, apply_scale_nullable};
use crate::sunspec::models::{NameplateModel, SettingsModel};

/// Capability of one inverter (or the fleet total): nameplate ratings plus
/// the configured maximums from the settings model. Reactive ratings are
/// per quadrant, Q1..Q4.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DerRating {
    pub w_rtg: Decimal,
    pub va_rtg: Decimal,
    pub var_rtg: [Decimal; 4],
    pub a_rtg: Decimal,
    pub w_max: Decimal,
    pub va_max: Option<Decimal>,
    pub var_max: [Option<Decimal>; 4],
}

pub fn der_rating(nameplate: &NameplateModel, settings: &SettingsModel) -> DerRating {
    let var_rtg = |v: i16| apply_scale(v, nameplate.var_rtg_sf);
    let var_max = |v: Option<i16>| apply_scale_nullable(v, settings.var_max_sf);

    DerRating {
        w_rtg: apply_scale(nameplate.w_rtg, nameplate.w_rtg_sf),
        va_rtg: apply_scale(nameplate.va_rtg, nameplate.va_rtg_sf),
        var_rtg: [
            var_rtg(nameplate.var_rtg_q1),
            var_rtg(nameplate.var_rtg_q2),
            var_rtg(nameplate.var_rtg_q3),
            var_rtg(nameplate.var_rtg_q4),
        ],
        a_rtg: apply_scale(nameplate.a_rtg, nameplate.a_rtg_sf),
        w_max: apply_scale(settings.w_max, settings.w_max_sf),
        va_max: apply_scale_nullable(settings.va_max, settings.va_max_sf),
        var_max: [
            var_max(settings.var_max_q1),
            var_max(settings.var_max_q2),
            var_max(settings.var_max_q3),
            var_max(settings.var_max_q4),
        ],
    }
}

/// Fleet capability is the sum of each inverter's.
pub fn aggregate_der_rating(items: &[DerRating]) -> Result<DerRating> {
    if items.is_empty() {
        return Err(SunSpecError::EmptyAggregation("rating").into());
    }

    let quadrant = |q: usize| items.iter().map(|r| r.var_rtg[q]).sum::<Decimal>();
    let quadrant_max = |q: usize| sum_optional(items.iter().map(|r| r.var_max[q]));

    Ok(DerRating {
        w_rtg: items.iter().map(|r| r.w_rtg).sum(),
        va_rtg: items.iter().map(|r| r.va_rtg).sum(),
        var_rtg: [quadrant(0), quadrant(1), quadrant(2), quadrant(3)],
        a_rtg: items.iter().map(|r| r.a_rtg).sum(),
        w_max: items.iter().map(|r| r.w_max).sum(),
        va_max: sum_optional(items.iter().map(|r| r.va_max)),
        var_max: [
            quadrant_max(0),
            quadrant_max(1),
            quadrant_max(2),
            quadrant_max(3),
        ],
    })
}
