use crate::prelude::*;

pub mod dynamic_export;

use futures::future::try_join_all;

use crate::metrics::{
    aggregate_der_rating, aggregate_inverter_metrics, aggregate_meter_metrics, der_rating,
    inverter_metrics, meter_metrics, DerRating,
};
use crate::sunspec::models::ControlsModel;
use crate::sunspec::SunSpecConnection;
use crate::telemetry::{self, TelemetrySample};
use dynamic_export::{calculate_export_control_state, controls_write_payload, current_power_ratio};

/// The poll loop: sample every device, decide, write back, publish.
#[derive(Clone)]
pub struct ExportControl {
    config: ConfigWrapper,
    channels: Channels,
    inverters: Vec<SunSpecConnection>,
    meter: SunSpecConnection,
    shutdown: broadcast::Sender<()>,
}

impl ExportControl {
    pub fn new(
        config: ConfigWrapper,
        channels: Channels,
        inverters: Vec<SunSpecConnection>,
        meter: SunSpecConnection,
    ) -> Self {
        Self {
            config,
            channels,
            inverters,
            meter,
            shutdown: broadcast::channel(1).0,
        }
    }

    pub async fn start(&self) -> Result<()> {
        let mut shutdown = self.shutdown.subscribe();
        let mut interval = tokio::time::interval(self.config.control().interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(
            "export control started for {} inverters every {:?}",
            self.inverters.len(),
            self.config.control().interval()
        );

        loop {
            let cycle = async {
                interval.tick().await;
                self.run_cycle().await
            };

            tokio::select! {
                _ = shutdown.recv() => {
                    info!("export control received shutdown signal");
                    break;
                }
                result = cycle => {
                    if let Err(e) = result {
                        error!("export control cycle failed: {:#}", e);
                    }
                }
            }
        }

        Ok(())
    }

    pub fn stop(&self) {
        let _ = self.shutdown.send(());
    }

    /// One complete sample, decide and write pass. Nothing is written unless
    /// every device was read successfully.
    pub async fn run_cycle(&self) -> Result<TelemetrySample> {
        let read_inverters = try_join_all(self.inverters.iter().map(|connection| async move {
            futures::try_join!(connection.inverter_model(), connection.controls_model())
        }));
        let (inverters, meter) = futures::try_join!(read_inverters, self.meter.meter_model())?;

        let der_metrics = inverters
            .iter()
            .map(|(inverter, _)| inverter_metrics(inverter))
            .collect::<Result<Vec<_>>>()?;
        let der = aggregate_inverter_metrics(&der_metrics)?;
        let site = aggregate_meter_metrics(&[meter_metrics(&meter)?])?;

        let controls: Vec<ControlsModel> = inverters.into_iter().map(|(_, c)| c).collect();
        let input = self.config.control_input();
        let export_control =
            calculate_export_control_state(&site, &der, current_power_ratio(&controls), &input);

        info!(
            "site {}W solar {}W, export limit {}W: target {}W at ratio {}",
            export_control.site_watts,
            export_control.solar_watts,
            input.export_limit_watts,
            export_control.target_solar_watts,
            export_control.target_solar_power_ratio
        );

        if self.config.read_only() {
            info!("read_only set, not writing controls");
        } else {
            let revert_timeout = self.config.control().revert_timeout();
            let writes = self.inverters.iter().zip(&controls).map(|(connection, current)| {
                let ratio = export_control.target_solar_power_ratio;
                async move {
                    let payload =
                        controls_write_payload(current, ratio, input.deenergize, revert_timeout)?;
                    connection.write_controls_model(&payload).await
                }
            });
            try_join_all(writes).await?;
        }

        let sample = TelemetrySample {
            timestamp: chrono::Utc::now(),
            site,
            der,
            der_rating: self.der_rating().await,
            export_control,
        };

        if self
            .channels
            .to_telemetry
            .send(telemetry::ChannelData::Sample(Box::new(sample.clone())))
            .is_err()
        {
            debug!("no telemetry receivers");
        }

        Ok(sample)
    }

    /// Fleet capability, or `None` when any inverter's ratings can't be read.
    async fn der_rating(&self) -> Option<DerRating> {
        let ratings = try_join_all(self.inverters.iter().map(|connection| async move {
            let (nameplate, settings) =
                futures::try_join!(connection.nameplate_model(), connection.settings_model())?;
            Ok::<_, anyhow::Error>(der_rating(&nameplate, &settings))
        }))
        .await;

        match ratings.and_then(|r| aggregate_der_rating(&r)) {
            Ok(rating) => Some(rating),
            Err(e) => {
                warn!("DER rating unavailable: {:#}", e);
                None
            }
        }
    }
}
