use crate::prelude::*;
use crate::telemetry;

#[derive(Debug, Clone)]
pub struct Channels {
    pub to_telemetry: broadcast::Sender<telemetry::ChannelData>,
}

impl Default for Channels {
    fn default() -> Self {
        Self::new()
    }
}

impl Channels {
    pub fn new() -> Self {
        Self {
            to_telemetry: Self::channel(),
        }
    }

    fn channel<T: Clone>() -> broadcast::Sender<T> {
        broadcast::channel(2048).0
    }
}
