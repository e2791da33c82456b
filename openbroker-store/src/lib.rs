#![forbid(unsafe_code)]

pub mod postgres;
pub mod store;

pub use crate::postgres::run_migrations;
pub use crate::postgres::PostgresStore;
pub use crate::store::{
    BrokerEvent, BrokerStore, NewBrokerEvent, ResourceRef, StaleOperation, StoreError,
};
