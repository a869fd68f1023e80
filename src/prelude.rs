pub use anyhow::{anyhow, bail, Result};
pub use log::{debug, error, info, trace, warn};
pub use rust_decimal::Decimal;
pub use tokio::sync::broadcast;

pub use std::io::Write;
pub use std::str::FromStr;
pub use std::sync::Arc;

pub use crate::channels::Channels;
pub use crate::config::{self, Config, ConfigWrapper};
pub use crate::error::SunSpecError;
pub use crate::options::Options;
pub use crate::sunspec;
