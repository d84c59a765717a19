//! Application layer: persistence ports, in-memory adapters, configuration,
//! error mapping and the sale/stock use cases that orchestrate the domain
//! crates.

pub mod config;
pub mod dto;
pub mod error;
pub mod in_memory;
pub mod ports;
pub mod services;


pub use config::ServiceConfig;
pub use error::{ServiceError, ServiceResult, StoreError};
pub use ports::{CustomerLookup, ProductLookup, SaleStore, StockChange, StockStore, StoreResult};
pub use services::{Envelope, SalesService, StockService};
