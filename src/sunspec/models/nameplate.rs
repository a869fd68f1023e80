use crate::sunspec::codec::*;
use crate::sunspec::schema::sunspec_model;

sunspec_model! {
    /// SunSpec model 120, inverter controls nameplate ratings.
    pub struct NameplateModel {
        name: "nameplate", ids: [120], length: 28;
        id: u16 => ID("ID") @ 0..1, decode_uint16;
        length: u16 => L("L") @ 1..2, decode_uint16;
        der_typ: u16 => DER_TYP("DERTyp") @ 2..3, decode_enum16;
        w_rtg: u16 => W_RTG("WRtg") @ 3..4, decode_uint16;
        w_rtg_sf: i16 => W_RTG_SF("WRtg_SF") @ 4..5, decode_sunssf;
        va_rtg: u16 => VA_RTG("VARtg") @ 5..6, decode_uint16;
        va_rtg_sf: i16 => VA_RTG_SF("VARtg_SF") @ 6..7, decode_sunssf;
        var_rtg_q1: i16 => VAR_RTG_Q1("VArRtgQ1") @ 7..8, decode_int16;
        var_rtg_q2: i16 => VAR_RTG_Q2("VArRtgQ2") @ 8..9, decode_int16;
        var_rtg_q3: i16 => VAR_RTG_Q3("VArRtgQ3") @ 9..10, decode_int16;
        var_rtg_q4: i16 => VAR_RTG_Q4("VArRtgQ4") @ 10..11, decode_int16;
        var_rtg_sf: i16 => VAR_RTG_SF("VArRtg_SF") @ 11..12, decode_sunssf;
        a_rtg: u16 => A_RTG("ARtg") @ 12..13, decode_uint16;
        a_rtg_sf: i16 => A_RTG_SF("ARtg_SF") @ 13..14, decode_sunssf;
        pf_rtg_q1: i16 => PF_RTG_Q1("PFRtgQ1") @ 14..15, decode_int16;
        pf_rtg_q2: i16 => PF_RTG_Q2("PFRtgQ2") @ 15..16, decode_int16;
        pf_rtg_q3: i16 => PF_RTG_Q3("PFRtgQ3") @ 16..17, decode_int16;
        pf_rtg_q4: i16 => PF_RTG_Q4("PFRtgQ4") @ 17..18, decode_int16;
        pf_rtg_sf: i16 => PF_RTG_SF("PFRtg_SF") @ 18..19, decode_sunssf;
        wh_rtg: Option<u16> => WH_RTG("WHRtg") @ 19..20, decode_uint16_nullable;
        wh_rtg_sf: Option<i16> => WH_RTG_SF("WHRtg_SF") @ 20..21, decode_sunssf_nullable;
        ahr_rtg: Option<u16> => AHR_RTG("AhrRtg") @ 21..22, decode_uint16_nullable;
        ahr_rtg_sf: Option<i16> => AHR_RTG_SF("AhrRtg_SF") @ 22..23, decode_sunssf_nullable;
        max_cha_rte: Option<u16> => MAX_CHA_RTE("MaxChaRte") @ 23..24, decode_uint16_nullable;
        max_cha_rte_sf: Option<i16> => MAX_CHA_RTE_SF("MaxChaRte_SF") @ 24..25, decode_sunssf_nullable;
        max_dis_cha_rte: Option<u16> => MAX_DIS_CHA_RTE("MaxDisChaRte") @ 25..26, decode_uint16_nullable;
        max_dis_cha_rte_sf: Option<i16> => MAX_DIS_CHA_RTE_SF("MaxDisChaRte_SF") @ 26..27, decode_sunssf_nullable;
        pad: u16 => PAD("Pad") @ 27..28, decode_uint16;
    }
}
