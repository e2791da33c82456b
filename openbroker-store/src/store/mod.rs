mod trait_store;
mod types;

pub use trait_store::{BrokerStore, StoreError};
pub use types::{BrokerEvent, NewBrokerEvent, ResourceRef, StaleOperation};
