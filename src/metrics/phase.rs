use crate::prelude::*;

use serde::Serialize;

use crate::sunspec::models::{InverterModelId, MeterModelId};

/// Wiring shape of a device, fixed by the model id it advertises.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum PhaseTopology {
    SinglePhase,
    SplitPhase,
    ThreePhase,
}

impl From<InverterModelId> for PhaseTopology {
    fn from(id: InverterModelId) -> Self {
        match id {
            InverterModelId::SinglePhase => Self::SinglePhase,
            InverterModelId::SplitPhase => Self::SplitPhase,
            InverterModelId::ThreePhase => Self::ThreePhase,
        }
    }
}

impl From<MeterModelId> for PhaseTopology {
    fn from(id: MeterModelId) -> Self {
        match id {
            MeterModelId::SinglePhase => Self::SinglePhase,
            MeterModelId::SplitPhase => Self::SplitPhase,
            MeterModelId::ThreePhase => Self::ThreePhase,
        }
    }
}

impl PhaseTopology {
    pub fn from_inverter_model_id(id: u16) -> Result<Self> {
        InverterModelId::try_from(id)
            .map(Self::from)
            .map_err(|_| SunSpecError::UnknownModelId { family: "inverter", id }.into())
    }

    pub fn from_meter_model_id(id: u16) -> Result<Self> {
        MeterModelId::try_from(id)
            .map(Self::from)
            .map_err(|_| SunSpecError::UnknownModelId { family: "meter", id }.into())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SinglePhase => "single-phase",
            Self::SplitPhase => "split-phase",
            Self::ThreePhase => "three-phase",
        }
    }

    pub fn has_phase_b(&self) -> bool {
        !matches!(self, Self::SinglePhase)
    }

    pub fn has_phase_c(&self) -> bool {
        matches!(self, Self::ThreePhase)
    }
}

/// One value per phase. `phase_b`/`phase_c` are `None` exactly when the
/// topology has no such phase.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct PerPhaseMeasurement {
    pub phase_a: Decimal,
    pub phase_b: Option<Decimal>,
    pub phase_c: Option<Decimal>,
}

impl PerPhaseMeasurement {
    /// Fails when a phase the topology has is missing; values for phases it
    /// lacks are dropped.
    pub fn new(
        topology: PhaseTopology,
        quantity: &'static str,
        phase_a: Option<Decimal>,
        phase_b: Option<Decimal>,
        phase_c: Option<Decimal>,
    ) -> Result<Self> {
        let required = |present: bool, value: Option<Decimal>, phase: char| -> Result<Option<Decimal>> {
            if !present {
                return Ok(None);
            }
            value.map(Some).ok_or_else(|| {
                SunSpecError::MissingPhaseValue {
                    topology: topology.name(),
                    quantity,
                    phase,
                }
                .into()
            })
        };

        Ok(Self {
            phase_a: required(true, phase_a, 'A')?.unwrap_or_default(),
            phase_b: required(topology.has_phase_b(), phase_b, 'B')?,
            phase_c: required(topology.has_phase_c(), phase_c, 'C')?,
        })
    }

    /// Like [`PerPhaseMeasurement::new`], but a missing phase A means the
    /// device does not report the quantity at all.
    pub fn optional(
        topology: PhaseTopology,
        quantity: &'static str,
        phase_a: Option<Decimal>,
        phase_b: Option<Decimal>,
        phase_c: Option<Decimal>,
    ) -> Result<Option<Self>> {
        match phase_a {
            None => Ok(None),
            a => Self::new(topology, quantity, a, phase_b, phase_c).map(Some),
        }
    }

    pub fn sum(items: &[Self]) -> Self {
        Self {
            phase_a: items.iter().map(|m| m.phase_a).sum(),
            phase_b: sum_optional(items.iter().map(|m| m.phase_b)),
            phase_c: sum_optional(items.iter().map(|m| m.phase_c)),
        }
    }

    pub fn average(items: &[Self]) -> Self {
        let sum = Self::sum(items);
        Self {
            phase_a: divide(sum.phase_a, items.len()),
            phase_b: sum.phase_b.map(|v| divide(v, items.len())),
            phase_c: sum.phase_c.map(|v| divide(v, items.len())),
        }
    }
}

/// A per-phase measurement plus the device's own total.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct PerPhaseNetMeasurement {
    pub net: Decimal,
    #[serde(flatten)]
    pub phases: PerPhaseMeasurement,
}

impl PerPhaseNetMeasurement {
    pub fn new(net: Decimal, phases: PerPhaseMeasurement) -> Self {
        Self { net, phases }
    }

    pub fn sum(items: &[Self]) -> Self {
        let phases: Vec<PerPhaseMeasurement> = items.iter().map(|m| m.phases).collect();
        Self {
            net: items.iter().map(|m| m.net).sum(),
            phases: PerPhaseMeasurement::sum(&phases),
        }
    }

    pub fn average(items: &[Self]) -> Self {
        let phases: Vec<PerPhaseMeasurement> = items.iter().map(|m| m.phases).collect();
        Self {
            net: average(items.iter().map(|m| m.net)),
            phases: PerPhaseMeasurement::average(&phases),
        }
    }

    pub fn sum_optional(items: &[Option<Self>]) -> Option<Self> {
        let present: Option<Vec<Self>> = items.iter().copied().collect();
        present.filter(|p| !p.is_empty()).map(|p| Self::sum(&p))
    }

    pub fn average_optional(items: &[Option<Self>]) -> Option<Self> {
        let present: Option<Vec<Self>> = items.iter().copied().collect();
        present.filter(|p| !p.is_empty()).map(|p| Self::average(&p))
    }
}

/// The shared topology of a non-empty set of devices.
pub fn ensure_uniform_topology(
    kind: &'static str,
    topologies: impl IntoIterator<Item = PhaseTopology>,
) -> Result<PhaseTopology> {
    let topologies: Vec<PhaseTopology> = topologies.into_iter().collect();
    let first = *topologies
        .first()
        .ok_or(SunSpecError::EmptyAggregation(kind))?;

    if topologies.iter().any(|t| *t != first) {
        return Err(SunSpecError::MixedTopology(topologies.iter().map(|t| t.name()).collect()).into());
    }

    Ok(first)
}

fn divide(value: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return value;
    }
    value / Decimal::from(count)
}

/// `None` when any item is `None`.
pub fn sum_optional(items: impl Iterator<Item = Option<Decimal>>) -> Option<Decimal> {
    items.sum()
}

pub fn average(items: impl Iterator<Item = Decimal>) -> Decimal {
    let items: Vec<Decimal> = items.collect();
    divide(items.iter().sum(), items.len())
}

/// `None` when any item is `None`.
pub fn average_optional(items: impl Iterator<Item = Option<Decimal>>) -> Option<Decimal> {
    let items: Option<Vec<Decimal>> = items.collect();
    items.map(|items| average(items.into_iter()))
}
