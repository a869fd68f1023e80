#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub use sunspec_export::prelude::*;

use async_trait::async_trait;
use sunspec_export::sunspec::connection::{END_OF_MODELS, SUNSPEC_SIGNATURE};
use sunspec_export::sunspec::models::*;
use sunspec_export::sunspec::schema::{Field, SunSpecModel};
use sunspec_export::sunspec::RegisterTransport;

pub fn common_setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Op {
    Read { address: u16, count: u16 },
    Write { address: u16, values: Vec<u16> },
}

/// In-memory register space. Unpopulated addresses answer like a Modbus
/// illegal-address exception.
#[derive(Default)]
pub struct MockTransport {
    registers: Mutex<HashMap<u16, u16>>,
    pinned: Mutex<HashSet<u16>>,
    log: Mutex<Vec<Op>>,
    failing_reads: AtomicUsize,
    read_delay: Mutex<Option<Duration>>,
    write_delay: Mutex<Option<Duration>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, address: u16, values: &[u16]) {
        let mut registers = self.registers.lock().unwrap();
        for (i, v) in values.iter().enumerate() {
            registers.insert(address + i as u16, *v);
        }
    }

    pub fn register(&self, address: u16) -> Option<u16> {
        self.registers.lock().unwrap().get(&address).copied()
    }

    /// Holds `address` at `value`; later writes to it are accepted but dropped.
    pub fn pin(&self, address: u16, value: u16) {
        self.load(address, &[value]);
        self.pinned.lock().unwrap().insert(address);
    }

    /// The next `count` reads fail with a transport error.
    pub fn fail_next_reads(&self, count: usize) {
        self.failing_reads.store(count, Ordering::SeqCst);
    }

    pub fn set_read_delay(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = Some(delay);
    }

    pub fn ops(&self) -> Vec<Op> {
        self.log.lock().unwrap().clone()
    }

    pub fn reads(&self) -> Vec<(u16, u16)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Read { address, count } => Some((address, count)),
                _ => None,
            })
            .collect()
    }

    pub fn writes(&self) -> Vec<(u16, Vec<u16>)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Write { address, values } => Some((address, values)),
                _ => None,
            })
            .collect()
    }

    pub fn clear_ops(&self) {
        self.log.lock().unwrap().clear();
    }
}

#[async_trait]
impl RegisterTransport for MockTransport {
    async fn read_holding_registers(&self, address: u16, count: u16) -> Result<Vec<u16>> {
        self.log.lock().unwrap().push(Op::Read { address, count });

        let delay = *self.read_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            bail!("connection reset by peer");
        }

        let registers = self.registers.lock().unwrap();
        (address..address + count)
            .map(|a| {
                registers
                    .get(&a)
                    .copied()
                    .ok_or_else(|| anyhow!("illegal data address {}", a))
            })
            .collect()
    }

    async fn write_multiple_registers(&self, address: u16, values: &[u16]) -> Result<()> {
        self.log.lock().unwrap().push(Op::Write {
            address,
            values: values.to_vec(),
        });

        let delay = *self.write_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let pinned = self.pinned.lock().unwrap().clone();
        let mut registers = self.registers.lock().unwrap();
        for (i, v) in values.iter().enumerate() {
            let a = address + i as u16;
            if !pinned.contains(&a) {
                registers.insert(a, *v);
            }
        }

        Ok(())
    }
}

/// Raw registers a device reports for an unimplemented point of each
/// nullable value type.
pub trait NotImplemented {
    const SENTINEL: &'static [u16];
}

impl NotImplemented for Option<u16> {
    const SENTINEL: &'static [u16] = &[0xFFFF];
}

impl NotImplemented for Option<i16> {
    const SENTINEL: &'static [u16] = &[0x8000];
}

impl NotImplemented for Option<u32> {
    const SENTINEL: &'static [u16] = &[0xFFFF, 0xFFFF];
}

/// A model block under construction, filled in through the model's own
/// field table.
#[derive(Clone, Debug)]
pub struct Block(Vec<u16>);

impl Block {
    /// `length` counts the two header registers.
    pub fn new(id: u16, length: usize) -> Self {
        let mut registers = vec![0; length];
        registers[0] = id;
        registers[1] = (length - 2) as u16;
        Self(registers)
    }

    pub fn of<M: SunSpecModel>(id: u16) -> Self {
        Self::new(id, M::LENGTH)
    }

    pub fn raw<T>(mut self, field: &Field<T>, values: &[u16]) -> Self {
        assert_eq!(values.len(), field.len(), "{} width", field.name);
        self.0[field.start..field.end].copy_from_slice(values);
        self
    }

    pub fn u16<T>(self, field: &Field<T>, value: u16) -> Self {
        self.raw(field, &[value])
    }

    pub fn i16<T>(self, field: &Field<T>, value: i16) -> Self {
        self.raw(field, &[value as u16])
    }

    pub fn u32<T>(self, field: &Field<T>, value: u32) -> Self {
        self.raw(field, &[(value >> 16) as u16, value as u16])
    }

    /// Writes the not-implemented sentinel matching the field's value type.
    pub fn absent<T: NotImplemented>(self, field: &Field<T>) -> Self {
        self.raw(field, T::SENTINEL)
    }

    pub fn string<T>(self, field: &Field<T>, value: &str) -> Self {
        let registers = Factory::string_registers(value, field.len());
        self.raw(field, &registers)
    }

    /// Keeps only the first `length` registers, for devices whose block is
    /// shorter than the full table.
    pub fn truncate(mut self, length: usize) -> Self {
        self.0.truncate(length);
        self.0[1] = (length - 2) as u16;
        self
    }

    pub fn registers(self) -> Vec<u16> {
        self.0
    }
}

pub struct Factory;

impl Factory {
    pub const BASE: u16 = 40000;

    pub fn string_registers(value: &str, width: usize) -> Vec<u16> {
        let mut bytes = value.as_bytes().to_vec();
        bytes.resize(width * 2, 0);
        bytes
            .chunks(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect()
    }

    /// Common model with `L = 66`.
    pub fn common(manufacturer: &str) -> Block {
        Block::of::<CommonModel>(1)
            .string(&CommonModel::MN, manufacturer)
            .string(&CommonModel::MD, "Primo 5.0-1")
            .string(&CommonModel::OPT, "")
            .string(&CommonModel::VR, "3.14.1-3")
            .string(&CommonModel::SN, "29071234")
            .u16(&CommonModel::DA, 1)
    }

    /// Common model as Fronius lays it out, `L = 65` with no pad register.
    pub fn fronius_common() -> Block {
        Self::common("Fronius").truncate(67)
    }

    /// An inverter producing `watts`, with 230 V and an even current split
    /// over every phase the topology has.
    pub fn inverter(id: u16, watts: i16) -> Block {
        let phases = match id {
            101 => 1,
            102 => 2,
            _ => 3,
        };
        // centiamps per phase at 230.0 V
        let amps = (i32::from(watts) * 100 / 230 / phases) as u16;

        let mut block = Block::of::<InverterModel>(id)
            .u16(&InverterModel::A, amps * phases as u16)
            .u16(&InverterModel::APH_A, amps)
            .i16(&InverterModel::A_SF, -2)
            .absent(&InverterModel::PPV_PH_AB)
            .absent(&InverterModel::PPV_PH_BC)
            .absent(&InverterModel::PPV_PH_CA)
            .u16(&InverterModel::PH_V_PH_A, 2300)
            .i16(&InverterModel::V_SF, -1)
            .i16(&InverterModel::W, watts)
            .i16(&InverterModel::W_SF, 0)
            .u16(&InverterModel::HZ, 5000)
            .i16(&InverterModel::HZ_SF, -2)
            .i16(&InverterModel::VA, watts)
            .i16(&InverterModel::VA_SF, 0)
            .i16(&InverterModel::VAR, 0)
            .i16(&InverterModel::VAR_SF, 0)
            .i16(&InverterModel::PF, 100)
            .i16(&InverterModel::PF_SF, -2)
            .u32(&InverterModel::WH, 1_234_567)
            .i16(&InverterModel::WH_SF, 0)
            .absent(&InverterModel::DCA)
            .absent(&InverterModel::DCA_SF)
            .absent(&InverterModel::DCV)
            .absent(&InverterModel::DCV_SF)
            .absent(&InverterModel::DCW)
            .absent(&InverterModel::DCW_SF)
            .i16(&InverterModel::TMP_CAB, 420)
            .absent(&InverterModel::TMP_SNK)
            .absent(&InverterModel::TMP_TRNS)
            .absent(&InverterModel::TMP_OT)
            .i16(&InverterModel::TMP_SF, -1)
            .u16(&InverterModel::ST, 4)
            .absent(&InverterModel::ST_VND);

        block = match phases {
            1 => block
                .absent(&InverterModel::APH_B)
                .absent(&InverterModel::APH_C)
                .absent(&InverterModel::PH_V_PH_B)
                .absent(&InverterModel::PH_V_PH_C),
            2 => block
                .u16(&InverterModel::APH_B, amps)
                .absent(&InverterModel::APH_C)
                .u16(&InverterModel::PH_V_PH_B, 2300)
                .absent(&InverterModel::PH_V_PH_C),
            _ => block
                .u16(&InverterModel::APH_B, amps)
                .u16(&InverterModel::APH_C, amps)
                .u16(&InverterModel::PH_V_PH_B, 2300)
                .u16(&InverterModel::PH_V_PH_C, 2300),
        };

        block
    }

    /// A three-phase meter reading `watts` at the grid connection, positive
    /// while importing.
    pub fn meter(watts: i16) -> Block {
        let per_phase = watts / 3;

        let mut block = Block::of::<MeterModel>(203)
            .i16(&MeterModel::A, 300)
            .i16(&MeterModel::APH_A, 100)
            .i16(&MeterModel::APH_B, 100)
            .i16(&MeterModel::APH_C, 100)
            .i16(&MeterModel::A_SF, -2)
            .i16(&MeterModel::PH_V, 2300)
            .i16(&MeterModel::PH_V_PH_A, 2290)
            .i16(&MeterModel::PH_V_PH_B, 2300)
            .i16(&MeterModel::PH_V_PH_C, 2310)
            .i16(&MeterModel::PPV, 3980)
            .i16(&MeterModel::PPV_PH_AB, 3980)
            .i16(&MeterModel::PPV_PH_BC, 3980)
            .i16(&MeterModel::PPV_PH_CA, 3980)
            .i16(&MeterModel::V_SF, -1)
            .i16(&MeterModel::HZ, 4998)
            .i16(&MeterModel::HZ_SF, -2)
            .i16(&MeterModel::W, watts)
            .i16(&MeterModel::W_PH_A, per_phase)
            .i16(&MeterModel::W_PH_B, per_phase)
            .i16(&MeterModel::W_PH_C, watts - 2 * per_phase)
            .i16(&MeterModel::W_SF, 0)
            .i16(&MeterModel::PF, 95)
            .i16(&MeterModel::PF_PH_A, 95)
            .i16(&MeterModel::PF_PH_B, 95)
            .i16(&MeterModel::PF_PH_C, 95)
            .i16(&MeterModel::PF_SF, -2)
            .u32(&MeterModel::TOT_WH_EXP, 5_000_000)
            .u32(&MeterModel::TOT_WH_IMP, 7_000_000)
            .i16(&MeterModel::TOT_WH_SF, 0);

        for field in [
            &MeterModel::VA,
            &MeterModel::VA_PH_A,
            &MeterModel::VA_PH_B,
            &MeterModel::VA_PH_C,
            &MeterModel::VA_SF,
            &MeterModel::VAR,
            &MeterModel::VAR_PH_A,
            &MeterModel::VAR_PH_B,
            &MeterModel::VAR_PH_C,
            &MeterModel::VAR_SF,
        ] {
            block = block.raw(field, &[0x8000]);
        }

        block.raw(&MeterModel::TOT_VAH_SF, &[0x8000]).raw(&MeterModel::TOT_VARH_SF, &[0x8000])
    }

    pub fn nameplate(w_rtg: u16) -> Block {
        Block::of::<NameplateModel>(120)
            .u16(&NameplateModel::DER_TYP, 4)
            .u16(&NameplateModel::W_RTG, w_rtg)
            .u16(&NameplateModel::VA_RTG, w_rtg)
            .i16(&NameplateModel::VAR_RTG_Q1, 2500)
            .i16(&NameplateModel::VAR_RTG_Q2, 2500)
            .i16(&NameplateModel::VAR_RTG_Q3, -2500)
            .i16(&NameplateModel::VAR_RTG_Q4, -2500)
            .u16(&NameplateModel::A_RTG, 2170)
            .i16(&NameplateModel::A_RTG_SF, -2)
            .i16(&NameplateModel::PF_RTG_Q1, -80)
            .i16(&NameplateModel::PF_RTG_SF, -2)
            .absent(&NameplateModel::WH_RTG)
            .absent(&NameplateModel::AHR_RTG)
            .absent(&NameplateModel::MAX_CHA_RTE)
            .absent(&NameplateModel::MAX_DIS_CHA_RTE)
            .raw(&NameplateModel::WH_RTG_SF, &[0x8000])
            .raw(&NameplateModel::AHR_RTG_SF, &[0x8000])
            .raw(&NameplateModel::MAX_CHA_RTE_SF, &[0x8000])
            .raw(&NameplateModel::MAX_DIS_CHA_RTE_SF, &[0x8000])
    }

    pub fn settings(w_max: u16) -> Block {
        Block::of::<SettingsModel>(121)
            .u16(&SettingsModel::W_MAX, w_max)
            .u16(&SettingsModel::V_REF, 230)
            .u16(&SettingsModel::VA_MAX, w_max)
            .i16(&SettingsModel::VAR_MAX_Q1, 2500)
            .i16(&SettingsModel::VAR_MAX_Q2, 2500)
            .i16(&SettingsModel::VAR_MAX_Q3, -2500)
            .i16(&SettingsModel::VAR_MAX_Q4, -2500)
    }

    /// Controls with the power limit at `w_max_lim_pct` (raw, scale factor
    /// -2) and `enabled` deciding `WMaxLim_Ena`.
    pub fn controls(w_max_lim_pct: u16, enabled: bool) -> Block {
        Block::of::<ControlsModel>(123)
            .u16(&ControlsModel::CONN.field, 1)
            .u16(&ControlsModel::W_MAX_LIM_PCT.field, w_max_lim_pct)
            .absent(&ControlsModel::W_MAX_LIM_PCT_WIN_TMS.field)
            .u16(&ControlsModel::W_MAX_LIM_PCT_RVRT_TMS.field, 0)
            .absent(&ControlsModel::W_MAX_LIM_PCT_RMP_TMS.field)
            .u16(&ControlsModel::W_MAX_LIM_ENA.field, enabled as u16)
            .i16(&ControlsModel::OUT_PF_SET.field, 100)
            .u16(&ControlsModel::OUT_PF_SET_ENA.field, 1)
            .u16(&ControlsModel::VAR_PCT_ENA.field, 1)
            .i16(&ControlsModel::W_MAX_LIM_PCT_SF, -2)
            .i16(&ControlsModel::OUT_PF_SET_SF, -2)
            .i16(&ControlsModel::VAR_PCT_SF, 0)
    }

    /// A vendor block the crate has no table for.
    pub fn filler(id: u16, length: usize) -> Block {
        Block::new(id, length)
    }

    /// Loads a signature, `blocks` back to back and the end marker starting
    /// at [`Factory::BASE`].
    pub fn device(blocks: Vec<Block>) -> MockTransport {
        let transport = MockTransport::new();
        transport.load(
            Self::BASE,
            &[(SUNSPEC_SIGNATURE >> 16) as u16, SUNSPEC_SIGNATURE as u16],
        );

        let mut cursor = Self::BASE + 2;
        for block in blocks {
            let registers = block.registers();
            transport.load(cursor, &registers);
            cursor += registers.len() as u16;
        }
        transport.load(cursor, &[END_OF_MODELS, 0]);

        transport
    }

    /// Fronius inverter register map: common 40002, inverter 40069,
    /// nameplate 40121, settings 40149, status 40181, controls 40227.
    pub fn fronius_inverter(inverter: Block, controls: Block) -> MockTransport {
        Self::device(vec![
            Self::fronius_common(),
            inverter,
            Self::nameplate(5000),
            Self::settings(5000),
            Self::filler(122, 46),
            controls,
        ])
    }

    /// Fronius smart meter: common 40002, meter 40069.
    pub fn fronius_meter(meter: Block) -> MockTransport {
        Self::device(vec![Self::fronius_common(), meter])
    }
}

pub const FRONIUS_INVERTER_ADDRESS: u16 = 40069;
pub const FRONIUS_CONTROLS_ADDRESS: u16 = 40227;
