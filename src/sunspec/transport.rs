use crate::prelude::*;

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio_modbus::client::{tcp, Context, Reader, Writer};
use tokio_modbus::Slave;

/// Delay between connection attempts. Attempts are unlimited.
pub const RECONNECT_DELAY_SECS: u64 = 5;

/// Holding-register access to one device over a persistent session.
#[async_trait]
pub trait RegisterTransport: Send + Sync {
    async fn read_holding_registers(&self, address: u16, count: u16) -> Result<Vec<u16>>;

    async fn write_multiple_registers(&self, address: u16, values: &[u16]) -> Result<()>;
}

/// Calls `connect` until it succeeds, sleeping `delay` after every failure.
pub async fn connect_with_retry<T, F, Fut>(name: &str, delay: Duration, mut connect: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;

        match connect().await {
            Ok(connection) => {
                if attempt > 1 {
                    info!("{}: connected after {} attempts", name, attempt);
                }
                return connection;
            }
            Err(e) => {
                error!("{}: {}", name, e);
                info!("{}: reconnecting in {}s", name, delay.as_secs());
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Modbus TCP session to one unit id.
///
/// The session is opened lazily and re-opened after any transport failure.
/// A Modbus exception response leaves the session intact.
pub struct ModbusTransport {
    name: String,
    host: String,
    port: u16,
    unit_id: u8,
    timeout: Duration,
    context: tokio::sync::Mutex<Option<Context>>,
}

impl ModbusTransport {
    pub fn new(name: &str, device: &config::Device) -> Self {
        Self {
            name: name.to_string(),
            host: device.host().to_string(),
            port: device.port(),
            unit_id: device.unit_id(),
            timeout: device.timeout(),
            context: tokio::sync::Mutex::new(None),
        }
    }

    async fn connect(&self) -> Result<Context> {
        info!(
            "{}: attempting connection to {}:{} unit {}",
            self.name, self.host, self.port, self.unit_id
        );

        let address = tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| anyhow!("failed to resolve {}: {}", self.host, e))?
            .next()
            .ok_or_else(|| anyhow!("no address found for {}", self.host))?;

        let context = match tokio::time::timeout(
            self.timeout,
            tcp::connect_slave(address, Slave(self.unit_id)),
        )
        .await
        {
            Ok(Ok(context)) => context,
            Ok(Err(e)) => bail!("failed to connect to {}: {}", address, e),
            Err(_) => bail!("connection timeout after {:?}", self.timeout),
        };

        info!("{}: connected to {}", self.name, address);
        Ok(context)
    }

    async fn ensure_connected(&self, context: &mut Option<Context>) {
        if context.is_none() {
            let connected = connect_with_retry(
                &self.name,
                Duration::from_secs(RECONNECT_DELAY_SECS),
                || self.connect(),
            )
            .await;
            *context = Some(connected);
        }
    }

    fn settle<T>(
        &self,
        operation: &str,
        result: std::result::Result<tokio_modbus::Result<T>, tokio::time::error::Elapsed>,
        context: &mut Option<Context>,
    ) -> Result<T> {
        match result {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(exception))) => Err(SunSpecError::ModbusException {
                operation: format!("{}: {}", self.name, operation),
                code: exception.into(),
            }
            .into()),
            Ok(Err(e)) => {
                *context = None;
                bail!("{}: {} failed: {}", self.name, operation, e)
            }
            Err(_) => {
                *context = None;
                bail!("{}: {} timed out after {:?}", self.name, operation, self.timeout)
            }
        }
    }
}

#[async_trait]
impl RegisterTransport for ModbusTransport {
    async fn read_holding_registers(&self, address: u16, count: u16) -> Result<Vec<u16>> {
        let mut guard = self.context.lock().await;
        self.ensure_connected(&mut guard).await;

        let context = guard
            .as_mut()
            .ok_or_else(|| anyhow!("{}: not connected", self.name))?;
        let result =
            tokio::time::timeout(self.timeout, context.read_holding_registers(address, count))
                .await;

        let operation = format!("read {} registers at {}", count, address);
        let registers = self.settle(&operation, result, &mut guard)?;
        trace!("{}: {} -> {:?}", self.name, operation, registers);

        Ok(registers)
    }

    async fn write_multiple_registers(&self, address: u16, values: &[u16]) -> Result<()> {
        let mut guard = self.context.lock().await;
        self.ensure_connected(&mut guard).await;

        let context = guard
            .as_mut()
            .ok_or_else(|| anyhow!("{}: not connected", self.name))?;
        let result =
            tokio::time::timeout(self.timeout, context.write_multiple_registers(address, values))
                .await;

        let operation = format!("write {} registers at {}", values.len(), address);
        self.settle(&operation, result, &mut guard)?;
        debug!("{}: {} <- {:?}", self.name, operation, values);

        Ok(())
    }
}
