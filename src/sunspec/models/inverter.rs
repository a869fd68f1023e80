use crate::sunspec::codec::*;
use crate::sunspec::schema::sunspec_model;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Inverter model identifiers, one per wiring topology.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum InverterModelId {
    SinglePhase = 101,
    SplitPhase = 102,
    ThreePhase = 103,
}

impl InverterModelId {
    /// Discovery preference when a device advertises more than one.
    pub const PREFERENCE: [u16; 3] = [103, 102, 101];
}

/// Values of the `St` register.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive, serde::Serialize)]
#[repr(u16)]
pub enum OperatingState {
    Off = 1,
    Sleeping = 2,
    Starting = 3,
    Mppt = 4,
    Throttled = 5,
    ShuttingDown = 6,
    Fault = 7,
    Standby = 8,
}

sunspec_model! {
    /// SunSpec models 101/102/103, integer + scale factor inverter.
    pub struct InverterModel {
        name: "inverter", ids: [101, 102, 103], length: 52;
        id: u16 => ID("ID") @ 0..1, decode_uint16;
        length: u16 => L("L") @ 1..2, decode_uint16;
        a: u16 => A("A") @ 2..3, decode_uint16;
        aph_a: u16 => APH_A("AphA") @ 3..4, decode_uint16;
        aph_b: Option<u16> => APH_B("AphB") @ 4..5, decode_uint16_nullable;
        aph_c: Option<u16> => APH_C("AphC") @ 5..6, decode_uint16_nullable;
        a_sf: i16 => A_SF("A_SF") @ 6..7, decode_sunssf;
        ppv_ph_ab: Option<u16> => PPV_PH_AB("PPVphAB") @ 7..8, decode_uint16_nullable;
        ppv_ph_bc: Option<u16> => PPV_PH_BC("PPVphBC") @ 8..9, decode_uint16_nullable;
        ppv_ph_ca: Option<u16> => PPV_PH_CA("PPVphCA") @ 9..10, decode_uint16_nullable;
        ph_v_ph_a: Option<u16> => PH_V_PH_A("PhVphA") @ 10..11, decode_uint16_nullable;
        ph_v_ph_b: Option<u16> => PH_V_PH_B("PhVphB") @ 11..12, decode_uint16_nullable;
        ph_v_ph_c: Option<u16> => PH_V_PH_C("PhVphC") @ 12..13, decode_uint16_nullable;
        v_sf: i16 => V_SF("V_SF") @ 13..14, decode_sunssf;
        w: i16 => W("W") @ 14..15, decode_int16;
        w_sf: i16 => W_SF("W_SF") @ 15..16, decode_sunssf;
        hz: u16 => HZ("Hz") @ 16..17, decode_uint16;
        hz_sf: i16 => HZ_SF("Hz_SF") @ 17..18, decode_sunssf;
        va: Option<i16> => VA("VA") @ 18..19, decode_int16_nullable;
        va_sf: Option<i16> => VA_SF("VA_SF") @ 19..20, decode_sunssf_nullable;
        var: Option<i16> => VAR("VAr") @ 20..21, decode_int16_nullable;
        var_sf: Option<i16> => VAR_SF("VAr_SF") @ 21..22, decode_sunssf_nullable;
        pf: Option<i16> => PF("PF") @ 22..23, decode_int16_nullable;
        pf_sf: Option<i16> => PF_SF("PF_SF") @ 23..24, decode_sunssf_nullable;
        wh: u32 => WH("WH") @ 24..26, decode_acc32;
        wh_sf: i16 => WH_SF("WH_SF") @ 26..27, decode_sunssf;
        dca: Option<u16> => DCA("DCA") @ 27..28, decode_uint16_nullable;
        dca_sf: Option<i16> => DCA_SF("DCA_SF") @ 28..29, decode_sunssf_nullable;
        dcv: Option<u16> => DCV("DCV") @ 29..30, decode_uint16_nullable;
        dcv_sf: Option<i16> => DCV_SF("DCV_SF") @ 30..31, decode_sunssf_nullable;
        dcw: Option<i16> => DCW("DCW") @ 31..32, decode_int16_nullable;
        dcw_sf: Option<i16> => DCW_SF("DCW_SF") @ 32..33, decode_sunssf_nullable;
        tmp_cab: Option<i16> => TMP_CAB("TmpCab") @ 33..34, decode_int16_nullable;
        tmp_snk: Option<i16> => TMP_SNK("TmpSnk") @ 34..35, decode_int16_nullable;
        tmp_trns: Option<i16> => TMP_TRNS("TmpTrns") @ 35..36, decode_int16_nullable;
        tmp_ot: Option<i16> => TMP_OT("TmpOt") @ 36..37, decode_int16_nullable;
        tmp_sf: Option<i16> => TMP_SF("Tmp_SF") @ 37..38, decode_sunssf_nullable;
        st: u16 => ST("St") @ 38..39, decode_enum16;
        st_vnd: Option<u16> => ST_VND("StVnd") @ 39..40, decode_enum16_nullable;
        evt1: u32 => EVT1("Evt1") @ 40..42, decode_bitfield32;
        evt2: u32 => EVT2("Evt2") @ 42..44, decode_bitfield32;
        evt_vnd1: u32 => EVT_VND1("EvtVnd1") @ 44..46, decode_bitfield32;
        evt_vnd2: u32 => EVT_VND2("EvtVnd2") @ 46..48, decode_bitfield32;
        evt_vnd3: u32 => EVT_VND3("EvtVnd3") @ 48..50, decode_bitfield32;
        evt_vnd4: u32 => EVT_VND4("EvtVnd4") @ 50..52, decode_bitfield32;
    }
}
