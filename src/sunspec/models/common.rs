use crate::sunspec::codec::*;
use crate::sunspec::schema::sunspec_model;

sunspec_model! {
    /// SunSpec model 1, the device identity block. Never changes at runtime.
    pub struct CommonModel {
        name: "common", ids: [1], length: 68;
        id: u16 => ID("ID") @ 0..1, decode_uint16;
        length: u16 => L("L") @ 1..2, decode_uint16;
        manufacturer: String => MN("Mn") @ 2..18, decode_string;
        model: String => MD("Md") @ 18..34, decode_string;
        options: String => OPT("Opt") @ 34..42, decode_string;
        version: String => VR("Vr") @ 42..50, decode_string;
        serial_number: String => SN("SN") @ 50..66, decode_string;
        device_address: u16 => DA("DA") @ 66..67, decode_uint16;
        pad: u16 => PAD("Pad") @ 67..68, decode_uint16;
    }
}
