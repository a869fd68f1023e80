use crate::prelude::*;

use serde::Serialize;

use crate::control::dynamic_export::ExportControlState;
use crate::metrics::{DerRating, InverterMetrics, MeterMetrics};

/// Everything one control cycle observed and decided.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TelemetrySample {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub site: MeterMetrics,
    pub der: InverterMetrics,
    pub der_rating: Option<DerRating>,
    pub export_control: ExportControlState,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChannelData {
    Sample(Box<TelemetrySample>),
    Shutdown,
}

/// Logs every published sample: a summary at info, the whole sample as
/// JSON at debug.
#[derive(Clone)]
pub struct Telemetry {
    channels: Channels,
}

impl Telemetry {
    pub fn new(channels: Channels) -> Self {
        Self { channels }
    }

    pub async fn start(&self) -> Result<()> {
        use ChannelData::*;

        let mut receiver = self.channels.to_telemetry.subscribe();
        info!("telemetry receiver started");

        loop {
            match receiver.recv().await {
                Ok(Shutdown) => {
                    info!("telemetry receiver received shutdown signal");
                    break;
                }
                Ok(Sample(sample)) => self.log_sample(&sample)?,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("telemetry receiver lagged, skipped {} samples", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    bail!("telemetry channel closed");
                }
            }
        }

        Ok(())
    }

    pub fn stop(&self) {
        let _ = self.channels.to_telemetry.send(ChannelData::Shutdown);
    }

    fn log_sample(&self, sample: &TelemetrySample) -> Result<()> {
        let state = &sample.export_control;
        info!(
            "site {}W, solar {}W, target {}W, ratio {} -> {}",
            state.site_watts.normalize(),
            state.solar_watts.normalize(),
            state.target_solar_watts.normalize(),
            state
                .current_power_ratio
                .map(|r| r.normalize().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            state.target_solar_power_ratio.normalize()
        );
        debug!("telemetry: {}", serde_json::to_string(sample)?);

        Ok(())
    }
}
