//! Gateway implementations: the MT5 bridge client and a paper account

pub mod client;
pub mod messages;
pub mod paper;
pub mod positions;
pub mod rest;

pub use client::Mt5Gateway;
pub use paper::PaperGateway;
pub use rest::Mt5RestClient;
