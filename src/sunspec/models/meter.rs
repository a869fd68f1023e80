use crate::sunspec::codec::*;
use crate::sunspec::schema::sunspec_model;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Meter model identifiers, one per wiring topology.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum MeterModelId {
    SinglePhase = 201,
    SplitPhase = 202,
    ThreePhase = 203,
}

impl MeterModelId {
    /// Discovery preference when a device advertises more than one.
    pub const PREFERENCE: [u16; 3] = [203, 202, 201];
}

sunspec_model! {
    /// SunSpec models 201/202/203, integer + scale factor AC meter.
    ///
    /// `W` is positive when the site imports from the grid.
    pub struct MeterModel {
        name: "meter", ids: [201, 202, 203], length: 107;
        id: u16 => ID("ID") @ 0..1, decode_uint16;
        length: u16 => L("L") @ 1..2, decode_uint16;
        a: i16 => A("A") @ 2..3, decode_int16;
        aph_a: i16 => APH_A("AphA") @ 3..4, decode_int16;
        aph_b: Option<i16> => APH_B("AphB") @ 4..5, decode_int16_nullable;
        aph_c: Option<i16> => APH_C("AphC") @ 5..6, decode_int16_nullable;
        a_sf: i16 => A_SF("A_SF") @ 6..7, decode_sunssf;
        ph_v: Option<i16> => PH_V("PhV") @ 7..8, decode_int16_nullable;
        ph_v_ph_a: Option<i16> => PH_V_PH_A("PhVphA") @ 8..9, decode_int16_nullable;
        ph_v_ph_b: Option<i16> => PH_V_PH_B("PhVphB") @ 9..10, decode_int16_nullable;
        ph_v_ph_c: Option<i16> => PH_V_PH_C("PhVphC") @ 10..11, decode_int16_nullable;
        ppv: Option<i16> => PPV("PPV") @ 11..12, decode_int16_nullable;
        ppv_ph_ab: Option<i16> => PPV_PH_AB("PPVphAB") @ 12..13, decode_int16_nullable;
        ppv_ph_bc: Option<i16> => PPV_PH_BC("PPVphBC") @ 13..14, decode_int16_nullable;
        ppv_ph_ca: Option<i16> => PPV_PH_CA("PPVphCA") @ 14..15, decode_int16_nullable;
        v_sf: i16 => V_SF("V_SF") @ 15..16, decode_sunssf;
        hz: i16 => HZ("Hz") @ 16..17, decode_int16;
        hz_sf: i16 => HZ_SF("Hz_SF") @ 17..18, decode_sunssf;
        w: i16 => W("W") @ 18..19, decode_int16;
        w_ph_a: Option<i16> => W_PH_A("WphA") @ 19..20, decode_int16_nullable;
        w_ph_b: Option<i16> => W_PH_B("WphB") @ 20..21, decode_int16_nullable;
        w_ph_c: Option<i16> => W_PH_C("WphC") @ 21..22, decode_int16_nullable;
        w_sf: i16 => W_SF("W_SF") @ 22..23, decode_sunssf;
        va: Option<i16> => VA("VA") @ 23..24, decode_int16_nullable;
        va_ph_a: Option<i16> => VA_PH_A("VAphA") @ 24..25, decode_int16_nullable;
        va_ph_b: Option<i16> => VA_PH_B("VAphB") @ 25..26, decode_int16_nullable;
        va_ph_c: Option<i16> => VA_PH_C("VAphC") @ 26..27, decode_int16_nullable;
        va_sf: Option<i16> => VA_SF("VA_SF") @ 27..28, decode_sunssf_nullable;
        var: Option<i16> => VAR("VAR") @ 28..29, decode_int16_nullable;
        var_ph_a: Option<i16> => VAR_PH_A("VARphA") @ 29..30, decode_int16_nullable;
        var_ph_b: Option<i16> => VAR_PH_B("VARphB") @ 30..31, decode_int16_nullable;
        var_ph_c: Option<i16> => VAR_PH_C("VARphC") @ 31..32, decode_int16_nullable;
        var_sf: Option<i16> => VAR_SF("VAR_SF") @ 32..33, decode_sunssf_nullable;
        pf: Option<i16> => PF("PF") @ 33..34, decode_int16_nullable;
        pf_ph_a: Option<i16> => PF_PH_A("PFphA") @ 34..35, decode_int16_nullable;
        pf_ph_b: Option<i16> => PF_PH_B("PFphB") @ 35..36, decode_int16_nullable;
        pf_ph_c: Option<i16> => PF_PH_C("PFphC") @ 36..37, decode_int16_nullable;
        pf_sf: Option<i16> => PF_SF("PF_SF") @ 37..38, decode_sunssf_nullable;
        tot_wh_exp: u32 => TOT_WH_EXP("TotWhExp") @ 38..40, decode_acc32;
        tot_wh_exp_ph_a: u32 => TOT_WH_EXP_PH_A("TotWhExpPhA") @ 40..42, decode_acc32;
        tot_wh_exp_ph_b: u32 => TOT_WH_EXP_PH_B("TotWhExpPhB") @ 42..44, decode_acc32;
        tot_wh_exp_ph_c: u32 => TOT_WH_EXP_PH_C("TotWhExpPhC") @ 44..46, decode_acc32;
        tot_wh_imp: u32 => TOT_WH_IMP("TotWhImp") @ 46..48, decode_acc32;
        tot_wh_imp_ph_a: u32 => TOT_WH_IMP_PH_A("TotWhImpPhA") @ 48..50, decode_acc32;
        tot_wh_imp_ph_b: u32 => TOT_WH_IMP_PH_B("TotWhImpPhB") @ 50..52, decode_acc32;
        tot_wh_imp_ph_c: u32 => TOT_WH_IMP_PH_C("TotWhImpPhC") @ 52..54, decode_acc32;
        tot_wh_sf: i16 => TOT_WH_SF("TotWh_SF") @ 54..55, decode_sunssf;
        tot_vah_exp: u32 => TOT_VAH_EXP("TotVAhExp") @ 55..57, decode_acc32;
        tot_vah_exp_ph_a: u32 => TOT_VAH_EXP_PH_A("TotVAhExpPhA") @ 57..59, decode_acc32;
        tot_vah_exp_ph_b: u32 => TOT_VAH_EXP_PH_B("TotVAhExpPhB") @ 59..61, decode_acc32;
        tot_vah_exp_ph_c: u32 => TOT_VAH_EXP_PH_C("TotVAhExpPhC") @ 61..63, decode_acc32;
        tot_vah_imp: u32 => TOT_VAH_IMP("TotVAhImp") @ 63..65, decode_acc32;
        tot_vah_imp_ph_a: u32 => TOT_VAH_IMP_PH_A("TotVAhImpPhA") @ 65..67, decode_acc32;
        tot_vah_imp_ph_b: u32 => TOT_VAH_IMP_PH_B("TotVAhImpPhB") @ 67..69, decode_acc32;
        tot_vah_imp_ph_c: u32 => TOT_VAH_IMP_PH_C("TotVAhImpPhC") @ 69..71, decode_acc32;
        tot_vah_sf: Option<i16> => TOT_VAH_SF("TotVAh_SF") @ 71..72, decode_sunssf_nullable;
        tot_varh_imp_q1: u32 => TOT_VARH_IMP_Q1("TotVArhImpQ1") @ 72..74, decode_acc32;
        tot_varh_imp_q1_ph_a: u32 => TOT_VARH_IMP_Q1_PH_A("TotVArhImpQ1PhA") @ 74..76, decode_acc32;
        tot_varh_imp_q1_ph_b: u32 => TOT_VARH_IMP_Q1_PH_B("TotVArhImpQ1PhB") @ 76..78, decode_acc32;
        tot_varh_imp_q1_ph_c: u32 => TOT_VARH_IMP_Q1_PH_C("TotVArhImpQ1PhC") @ 78..80, decode_acc32;
        tot_varh_imp_q2: u32 => TOT_VARH_IMP_Q2("TotVArhImpQ2") @ 80..82, decode_acc32;
        tot_varh_imp_q2_ph_a: u32 => TOT_VARH_IMP_Q2_PH_A("TotVArhImpQ2PhA") @ 82..84, decode_acc32;
        tot_varh_imp_q2_ph_b: u32 => TOT_VARH_IMP_Q2_PH_B("TotVArhImpQ2PhB") @ 84..86, decode_acc32;
        tot_varh_imp_q2_ph_c: u32 => TOT_VARH_IMP_Q2_PH_C("TotVArhImpQ2PhC") @ 86..88, decode_acc32;
        tot_varh_exp_q3: u32 => TOT_VARH_EXP_Q3("TotVArhExpQ3") @ 88..90, decode_acc32;
        tot_varh_exp_q3_ph_a: u32 => TOT_VARH_EXP_Q3_PH_A("TotVArhExpQ3PhA") @ 90..92, decode_acc32;
        tot_varh_exp_q3_ph_b: u32 => TOT_VARH_EXP_Q3_PH_B("TotVArhExpQ3PhB") @ 92..94, decode_acc32;
        tot_varh_exp_q3_ph_c: u32 => TOT_VARH_EXP_Q3_PH_C("TotVArhExpQ3PhC") @ 94..96, decode_acc32;
        tot_varh_exp_q4: u32 => TOT_VARH_EXP_Q4("TotVArhExpQ4") @ 96..98, decode_acc32;
        tot_varh_exp_q4_ph_a: u32 => TOT_VARH_EXP_Q4_PH_A("TotVArhExpQ4PhA") @ 98..100, decode_acc32;
        tot_varh_exp_q4_ph_b: u32 => TOT_VARH_EXP_Q4_PH_B("TotVArhExpQ4PhB") @ 100..102, decode_acc32;
        tot_varh_exp_q4_ph_c: u32 => TOT_VARH_EXP_Q4_PH_C("TotVArhExpQ4PhC") @ 102..104, decode_acc32;
        tot_varh_sf: Option<i16> => TOT_VARH_SF("TotVArh_SF") @ 104..105, decode_sunssf_nullable;
        evt: u32 => EVT("Evt") @ 105..107, decode_bitfield32;
    }
}
