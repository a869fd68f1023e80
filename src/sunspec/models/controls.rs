use crate::sunspec::codec::*;
use crate::sunspec::schema::sunspec_model;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Values of the `Conn` register.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum Connection {
    Disconnect = 0,
    Connect = 1,
}

/// Values of the `*_Ena` registers.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum Enablement {
    Disabled = 0,
    Enabled = 1,
}

sunspec_model! {
    /// SunSpec model 123, immediate inverter controls.
    pub struct ControlsModel {
        name: "controls", ids: [123], length: 26;
        id: u16 => ID("ID") @ 0..1, decode_uint16;
        length: u16 => L("L") @ 1..2, decode_uint16;
        conn_win_tms: Option<u16> => CONN_WIN_TMS("Conn_WinTms") @ 2..3, decode_uint16_nullable, write encode_uint16_nullable;
        conn_rvrt_tms: Option<u16> => CONN_RVRT_TMS("Conn_RvrtTms") @ 3..4, decode_uint16_nullable, write encode_uint16_nullable;
        conn: u16 => CONN("Conn") @ 4..5, decode_enum16, write encode_enum16;
        w_max_lim_pct: u16 => W_MAX_LIM_PCT("WMaxLimPct") @ 5..6, decode_uint16, write encode_uint16;
        w_max_lim_pct_win_tms: Option<u16> => W_MAX_LIM_PCT_WIN_TMS("WMaxLimPct_WinTms") @ 6..7, decode_uint16_nullable, write encode_uint16_nullable;
        w_max_lim_pct_rvrt_tms: Option<u16> => W_MAX_LIM_PCT_RVRT_TMS("WMaxLimPct_RvrtTms") @ 7..8, decode_uint16_nullable, write encode_uint16_nullable;
        w_max_lim_pct_rmp_tms: Option<u16> => W_MAX_LIM_PCT_RMP_TMS("WMaxLimPct_RmpTms") @ 8..9, decode_uint16_nullable, write encode_uint16_nullable;
        w_max_lim_ena: u16 => W_MAX_LIM_ENA("WMaxLim_Ena") @ 9..10, decode_enum16, write encode_enum16;
        out_pf_set: Option<i16> => OUT_PF_SET("OutPFSet") @ 10..11, decode_int16_nullable, write encode_int16_nullable;
        out_pf_set_win_tms: Option<u16> => OUT_PF_SET_WIN_TMS("OutPFSet_WinTms") @ 11..12, decode_uint16_nullable, write encode_uint16_nullable;
        out_pf_set_rvrt_tms: Option<u16> => OUT_PF_SET_RVRT_TMS("OutPFSet_RvrtTms") @ 12..13, decode_uint16_nullable, write encode_uint16_nullable;
        out_pf_set_rmp_tms: Option<u16> => OUT_PF_SET_RMP_TMS("OutPFSet_RmpTms") @ 13..14, decode_uint16_nullable, write encode_uint16_nullable;
        out_pf_set_ena: u16 => OUT_PF_SET_ENA("OutPFSet_Ena") @ 14..15, decode_enum16, write encode_enum16;
        var_w_max_pct: Option<i16> => VAR_W_MAX_PCT("VArWMaxPct") @ 15..16, decode_int16_nullable, write encode_int16_nullable;
        var_max_pct: Option<i16> => VAR_MAX_PCT("VArMaxPct") @ 16..17, decode_int16_nullable, write encode_int16_nullable;
        var_aval_pct: Option<i16> => VAR_AVAL_PCT("VArAvalPct") @ 17..18, decode_int16_nullable, write encode_int16_nullable;
        var_pct_win_tms: Option<u16> => VAR_PCT_WIN_TMS("VArPct_WinTms") @ 18..19, decode_uint16_nullable, write encode_uint16_nullable;
        var_pct_rvrt_tms: Option<u16> => VAR_PCT_RVRT_TMS("VArPct_RvrtTms") @ 19..20, decode_uint16_nullable, write encode_uint16_nullable;
        var_pct_rmp_tms: Option<u16> => VAR_PCT_RMP_TMS("VArPct_RmpTms") @ 20..21, decode_uint16_nullable, write encode_uint16_nullable;
        var_pct_mod: Option<u16> => VAR_PCT_MOD("VArPct_Mod") @ 21..22, decode_enum16_nullable, write encode_uint16_nullable;
        var_pct_ena: u16 => VAR_PCT_ENA("VArPct_Ena") @ 22..23, decode_enum16, write encode_enum16;
        w_max_lim_pct_sf: i16 => W_MAX_LIM_PCT_SF("WMaxLimPct_SF") @ 23..24, decode_sunssf;
        out_pf_set_sf: Option<i16> => OUT_PF_SET_SF("OutPFSet_SF") @ 24..25, decode_sunssf_nullable;
        var_pct_sf: Option<i16> => VAR_PCT_SF("VArPct_SF") @ 25..26, decode_sunssf_nullable;
    }
}

impl ControlsModel {
    /// `WMaxLimPct` in percent when the limit is active, `None` when disabled.
    pub fn active_power_limit_pct(&self) -> Option<rust_decimal::Decimal> {
        (self.w_max_lim_ena == u16::from(Enablement::Enabled))
            .then(|| apply_scale(self.w_max_lim_pct, self.w_max_lim_pct_sf))
    }
}
