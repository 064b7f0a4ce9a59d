//! Flushing tracked activity to the remote service

pub mod flush;
pub mod ports;

pub use flush::{FlushReport, FlushService};
pub use ports::{ActivityArchive, ActivityEncoder, ActivityForwarder, ArchivedActivity, Delivery};
