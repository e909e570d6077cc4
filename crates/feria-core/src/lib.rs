//! Core types and the seat-reservation protocol for the fair booking service.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! is consumed through [`store::ReservationStore`] and outbound email through
//! [`notify::Notifier`]; the protocol itself lives in [`booking`].

pub mod booking;
pub mod clock;
pub mod error;
pub mod fair;
pub mod institution;
pub mod notify;
pub mod policy;
pub mod reservation;
pub mod store;
pub mod token;

mod validate;

#[cfg(test)]
mod testing;

pub use error::{Error, ErrorKind, Result};
