//! Reads and writes whole SunSpec models through a [`RegisterTransport`].
//!
//! Callers must hold exclusive use of the transport for the duration of a
//! [`write_model`] so the verification read sees the device state the write
//! produced and nothing else.

use crate::prelude::*;
use crate::sunspec::schema::{SunSpecModel, WritePayload};
use crate::sunspec::transport::RegisterTransport;

fn register_count<M: SunSpecModel>() -> Result<u16> {
    u16::try_from(M::LENGTH).map_err(|_| anyhow!("{} model is too long to read", M::NAME))
}

/// Rejects a register window whose `ID` register is not one of the model's ids.
pub fn check_model_id<M: SunSpecModel>(address: u16, registers: &[u16]) -> Result<()> {
    let actual = registers.first().copied().ok_or(SunSpecError::RegisterLength {
        expected: M::LENGTH,
        actual: 0,
    })?;

    if !M::IDS.contains(&actual) {
        return Err(SunSpecError::WrongModel {
            address,
            expected: M::IDS.to_vec(),
            actual,
        }
        .into());
    }

    Ok(())
}

fn decode_at<M: SunSpecModel>(address: u16, registers: &[u16]) -> Result<M> {
    check_model_id::<M>(address, registers)?;
    let model = M::decode(registers)?;
    debug!("{} model at {}: {:?}", M::NAME, address, model);
    Ok(model)
}

pub async fn read_model<M: SunSpecModel>(
    transport: &dyn RegisterTransport,
    address: u16,
) -> Result<M> {
    let registers = transport
        .read_holding_registers(address, register_count::<M>()?)
        .await?;

    decode_at(address, &registers)
}

/// Writes the payload's fields, reads the model back and checks every
/// written field holds the value sent. Returns the model as read back.
pub async fn write_model<M: SunSpecModel>(
    transport: &dyn RegisterTransport,
    address: u16,
    payload: &WritePayload<M>,
) -> Result<M> {
    let (start, end) = payload
        .span()
        .ok_or_else(|| anyhow!("nothing to write to {} model at {}", M::NAME, address))?;

    let buffer = payload.to_registers();
    let write_address = u16::try_from(start)
        .ok()
        .and_then(|offset| address.checked_add(offset))
        .ok_or_else(|| anyhow!("{} model write at {}+{} overflows", M::NAME, address, start))?;

    info!(
        "writing {} model fields {:?} at {}",
        M::NAME,
        payload.field_names(),
        write_address
    );
    transport
        .write_multiple_registers(write_address, &buffer[start..end])
        .await?;

    let registers = transport
        .read_holding_registers(address, register_count::<M>()?)
        .await?;
    let model = decode_at(address, &registers)?;
    payload.verify(&registers)?;

    Ok(model)
}
