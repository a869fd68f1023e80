pub mod brand;
pub mod cache;
pub mod codec;
pub mod connection;
pub mod engine;
pub mod models;
pub mod schema;
pub mod transport;

pub use brand::Brand;
pub use connection::{ModelAddress, ModelAddressMap, SunSpecConnection};
pub use transport::{ModbusTransport, RegisterTransport};
