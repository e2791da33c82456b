mod bindings;
mod events;
mod instances;
mod migrate;
mod rows;
mod specs;
mod store;

pub use migrate::run_migrations;
pub use store::PostgresStore;
