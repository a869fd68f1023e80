//! Declarative register layouts for SunSpec models.
//!
//! A model is a plain struct whose fields are described by [`Field`] (read
//! only) or [`WritableField`] (read + encode) constants. Only a
//! `WritableField` can be put into a [`WritePayload`], so a write can never
//! carry a field that has no encoder.

use crate::prelude::*;

use std::fmt::Debug;
use std::marker::PhantomData;

pub type Decoder<T> = fn(&[u16]) -> Result<T>;
pub type Encoder<T> = fn(&T) -> Result<Vec<u16>>;

/// Half-open register range `start..end` within a model, plus its decoder.
pub struct Field<T> {
    pub name: &'static str,
    pub start: usize,
    pub end: usize,
    pub decode: Decoder<T>,
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Field<T> {}

impl<T> Field<T> {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Decodes this field out of a whole-model register window. Failures are
    /// tagged with the field name and the raw registers involved.
    pub fn read(&self, registers: &[u16]) -> Result<T> {
        let raw = registers.get(self.start..self.end).ok_or_else(|| {
            SunSpecError::FieldDecode {
                field: self.name,
                raw: Vec::new(),
                reason: format!(
                    "range {}..{} outside a {} register window",
                    self.start,
                    self.end,
                    registers.len()
                ),
            }
        })?;

        (self.decode)(raw).map_err(|e| {
            SunSpecError::FieldDecode {
                field: self.name,
                raw: raw.to_vec(),
                reason: format!("{:#}", e),
            }
            .into()
        })
    }
}

pub struct WritableField<T> {
    pub field: Field<T>,
    pub encode: Encoder<T>,
}

impl<T> Clone for WritableField<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for WritableField<T> {}

impl<T> WritableField<T> {
    pub fn read(&self, registers: &[u16]) -> Result<T> {
        self.field.read(registers)
    }

    pub fn name(&self) -> &'static str {
        self.field.name
    }

    fn encode(&self, value: &T) -> Result<Vec<u16>> {
        let encoded = (self.encode)(value).map_err(|e| SunSpecError::FieldEncode {
            field: self.field.name,
            reason: format!("{:#}", e),
        })?;

        if encoded.len() != self.field.len() {
            return Err(SunSpecError::FieldEncode {
                field: self.field.name,
                reason: format!(
                    "encoded {} registers into a {} register field",
                    encoded.len(),
                    self.field.len()
                ),
            }
            .into());
        }

        Ok(encoded)
    }
}

/// Name and extent of one field, used to check a table is self-consistent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpan {
    pub name: &'static str,
    pub start: usize,
    pub end: usize,
}

/// A SunSpec model block with a fixed register layout.
pub trait SunSpecModel: Sized + Debug + Clone + Send + Sync + 'static {
    /// Short human name, used in logs and errors.
    const NAME: &'static str;
    /// Model identifiers this layout decodes. Checked after every read.
    const IDS: &'static [u16];
    /// Total register length including the two header registers.
    const LENGTH: usize;
    const FIELDS: &'static [FieldSpan];

    fn decode(registers: &[u16]) -> Result<Self>;

    /// The decoded `ID` register.
    fn model_id(&self) -> u16;
}

/// Largest `end` over a model's fields; equals `LENGTH` for a well formed table.
pub fn schema_length<M: SunSpecModel>() -> usize {
    M::FIELDS.iter().map(|f| f.end).max().unwrap_or(0)
}

struct PendingWrite {
    name: &'static str,
    start: usize,
    registers: Vec<u16>,
    verify: Box<dyn Fn(&[u16]) -> Result<Option<(String, String)>> + Send + Sync>,
}

/// A partial set of writable field values for one model.
///
/// Fields are encoded eagerly on [`WritePayload::set`], so an unencodable
/// value fails before any register is written.
pub struct WritePayload<M> {
    writes: Vec<PendingWrite>,
    _model: PhantomData<M>,
}

impl<M: SunSpecModel> Default for WritePayload<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: SunSpecModel> WritePayload<M> {
    pub fn new() -> Self {
        Self {
            writes: Vec::new(),
            _model: PhantomData,
        }
    }

    /// Adds (or replaces) a field value.
    pub fn set<T>(&mut self, field: &WritableField<T>, value: T) -> Result<&mut Self>
    where
        T: PartialEq + Debug + Send + Sync + 'static,
    {
        let registers = field.encode(&value)?;
        let decoder = field.field;

        let verify = move |window: &[u16]| -> Result<Option<(String, String)>> {
            let actual = decoder.read(window)?;
            if actual == value {
                Ok(None)
            } else {
                Ok(Some((format!("{:?}", value), format!("{:?}", actual))))
            }
        };

        self.writes.retain(|w| w.name != field.name());
        self.writes.push(PendingWrite {
            name: field.name(),
            start: field.field.start,
            registers,
            verify: Box::new(verify),
        });

        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.writes.iter().map(|w| w.name).collect()
    }

    /// Builds a zero-filled whole-model buffer with every set field spliced in.
    pub fn to_registers(&self) -> Vec<u16> {
        let mut buffer = vec![0u16; M::LENGTH];
        for write in &self.writes {
            buffer[write.start..write.start + write.registers.len()]
                .copy_from_slice(&write.registers);
        }
        buffer
    }

    /// Register offsets `start..end` covering every set field.
    pub fn span(&self) -> Option<(usize, usize)> {
        let start = self.writes.iter().map(|w| w.start).min()?;
        let end = self
            .writes
            .iter()
            .map(|w| w.start + w.registers.len())
            .max()?;
        Some((start, end))
    }

    /// Checks a whole-model register window read back after the write.
    pub fn verify(&self, registers: &[u16]) -> Result<()> {
        for write in &self.writes {
            if let Some((expected, actual)) = (write.verify)(registers)? {
                return Err(SunSpecError::WriteVerification {
                    field: write.name,
                    expected,
                    actual,
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Declares a SunSpec model struct together with its field table.
///
/// ```ignore
/// sunspec_model! {
///     pub struct ControlsModel {
///         name: "controls", ids: [123], length: 26;
///         id: u16 => ID("ID") @ 0..1, decode_uint16;
///         conn: u16 => CONN("Conn") @ 4..5, decode_enum16, write encode_enum16;
///     }
/// }
/// ```
///
/// Every model must declare an `id` field; it backs `SunSpecModel::model_id`.
macro_rules! sunspec_model {
    (@field $konst:ident, $ty:ty, $label:literal, $start:literal, $end:literal, $decode:path) => {
        pub const $konst: $crate::sunspec::schema::Field<$ty> = $crate::sunspec::schema::Field {
            name: $label,
            start: $start,
            end: $end,
            decode: $decode,
        };
    };

    (@field $konst:ident, $ty:ty, $label:literal, $start:literal, $end:literal, $decode:path, $encode:path) => {
        pub const $konst: $crate::sunspec::schema::WritableField<$ty> = $crate::sunspec::schema::WritableField {
            field: $crate::sunspec::schema::Field {
                name: $label,
                start: $start,
                end: $end,
                decode: $decode,
            },
            encode: $encode,
        };
    };

    (@carry $payload:ident, $self:ident, $field:ident, $konst:ident) => {};

    (@carry $payload:ident, $self:ident, $field:ident, $konst:ident, $encode:path) => {
        $payload.set(&Self::$konst, $self.$field.clone())?;
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $model:ident {
            name: $name:literal, ids: [$($id:literal),+ $(,)?], length: $length:literal;
            $(
                $(#[$fmeta:meta])*
                $field:ident : $ty:ty => $konst:ident($label:literal) @ $start:literal .. $end:literal, $decode:path $(, write $encode:path)?;
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize)]
        $vis struct $model {
            $(
                $(#[$fmeta])*
                pub $field: $ty,
            )+
        }

        impl $model {
            $(
                $crate::sunspec::schema::sunspec_model!(@field $konst, $ty, $label, $start, $end, $decode $(, $encode)?);
            )+

            /// A write payload holding the current value of every writable field.
            #[allow(unused_mut)]
            pub fn to_write_payload(&self) -> anyhow::Result<$crate::sunspec::schema::WritePayload<Self>> {
                let mut payload = $crate::sunspec::schema::WritePayload::new();
                $(
                    $crate::sunspec::schema::sunspec_model!(@carry payload, self, $field, $konst $(, $encode)?);
                )+
                Ok(payload)
            }
        }

        impl $crate::sunspec::schema::SunSpecModel for $model {
            const NAME: &'static str = $name;
            const IDS: &'static [u16] = &[$($id),+];
            const LENGTH: usize = $length;
            const FIELDS: &'static [$crate::sunspec::schema::FieldSpan] = &[
                $(
                    $crate::sunspec::schema::FieldSpan { name: $label, start: $start, end: $end },
                )+
            ];

            fn decode(registers: &[u16]) -> anyhow::Result<Self> {
                if registers.len() != $length {
                    return Err($crate::error::SunSpecError::RegisterLength {
                        expected: $length,
                        actual: registers.len(),
                    }
                    .into());
                }

                Ok(Self {
                    $( $field: Self::$konst.read(registers)?, )+
                })
            }

            fn model_id(&self) -> u16 {
                self.id
            }
        }
    };
}

pub(crate) use sunspec_model;
