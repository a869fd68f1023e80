use crate::sunspec::codec::*;
use crate::sunspec::schema::sunspec_model;

sunspec_model! {
    /// SunSpec model 121, basic inverter settings.
    pub struct SettingsModel {
        name: "settings", ids: [121], length: 32;
        id: u16 => ID("ID") @ 0..1, decode_uint16;
        length: u16 => L("L") @ 1..2, decode_uint16;
        w_max: u16 => W_MAX("WMax") @ 2..3, decode_uint16;
        v_ref: u16 => V_REF("VRef") @ 3..4, decode_uint16;
        v_ref_ofs: i16 => V_REF_OFS("VRefOfs") @ 4..5, decode_int16;
        v_max: Option<u16> => V_MAX("VMax") @ 5..6, decode_uint16_nullable;
        v_min: Option<u16> => V_MIN("VMin") @ 6..7, decode_uint16_nullable;
        va_max: Option<u16> => VA_MAX("VAMax") @ 7..8, decode_uint16_nullable;
        var_max_q1: Option<i16> => VAR_MAX_Q1("VArMaxQ1") @ 8..9, decode_int16_nullable;
        var_max_q2: Option<i16> => VAR_MAX_Q2("VArMaxQ2") @ 9..10, decode_int16_nullable;
        var_max_q3: Option<i16> => VAR_MAX_Q3("VArMaxQ3") @ 10..11, decode_int16_nullable;
        var_max_q4: Option<i16> => VAR_MAX_Q4("VArMaxQ4") @ 11..12, decode_int16_nullable;
        w_gra: Option<u16> => W_GRA("WGra") @ 12..13, decode_uint16_nullable;
        pf_min_q1: Option<i16> => PF_MIN_Q1("PFMinQ1") @ 13..14, decode_int16_nullable;
        pf_min_q2: Option<i16> => PF_MIN_Q2("PFMinQ2") @ 14..15, decode_int16_nullable;
        pf_min_q3: Option<i16> => PF_MIN_Q3("PFMinQ3") @ 15..16, decode_int16_nullable;
        pf_min_q4: Option<i16> => PF_MIN_Q4("PFMinQ4") @ 16..17, decode_int16_nullable;
        var_act: Option<u16> => VAR_ACT("VArAct") @ 17..18, decode_enum16_nullable;
        clc_tot_va: Option<u16> => CLC_TOT_VA("ClcTotVA") @ 18..19, decode_enum16_nullable;
        max_rmp_rte: Option<u16> => MAX_RMP_RTE("MaxRmpRte") @ 19..20, decode_uint16_nullable;
        ecp_nom_hz: Option<u16> => ECP_NOM_HZ("ECPNomHz") @ 20..21, decode_uint16_nullable;
        conn_ph: Option<u16> => CONN_PH("ConnPh") @ 21..22, decode_enum16_nullable;
        w_max_sf: i16 => W_MAX_SF("WMax_SF") @ 22..23, decode_sunssf;
        v_ref_sf: i16 => V_REF_SF("VRef_SF") @ 23..24, decode_sunssf;
        v_ref_ofs_sf: i16 => V_REF_OFS_SF("VRefOfs_SF") @ 24..25, decode_sunssf;
        v_min_max_sf: Option<i16> => V_MIN_MAX_SF("VMinMax_SF") @ 25..26, decode_sunssf_nullable;
        va_max_sf: Option<i16> => VA_MAX_SF("VAMax_SF") @ 26..27, decode_sunssf_nullable;
        var_max_sf: Option<i16> => VAR_MAX_SF("VArMax_SF") @ 27..28, decode_sunssf_nullable;
        w_gra_sf: Option<i16> => W_GRA_SF("WGra_SF") @ 28..29, decode_sunssf_nullable;
        pf_min_sf: Option<i16> => PF_MIN_SF("PFMin_SF") @ 29..30, decode_sunssf_nullable;
        max_rmp_rte_sf: Option<i16> => MAX_RMP_RTE_SF("MaxRmpRte_SF") @ 30..31, decode_sunssf_nullable;
        ecp_nom_hz_sf: Option<i16> => ECP_NOM_HZ_SF("ECPNomHz_SF") @ 31..32, decode_sunssf_nullable;
    }
}
