#![forbid(unsafe_code)]

//! Uniform historical-fetch clients for each upstream market-data vendor (spec.md §4.1).

pub mod alpaca;
pub mod alphavantage;
pub mod client;
pub mod error;
pub mod finnhub;
pub mod marketstack;
pub mod stream;
pub mod twelvedata;
pub mod yahoo;

pub use alpaca::AlpacaClient;
pub use alphavantage::AlphaVantageClient;
pub use client::VendorClient;
pub use error::VendorError;
pub use finnhub::FinnhubClient;
pub use marketstack::MarketstackClient;
pub use stream::{RawEventStream, RawTick};
pub use twelvedata::TwelveDataClient;
pub use yahoo::YahooClient;
