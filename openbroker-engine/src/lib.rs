#![forbid(unsafe_code)]

//! Asynchronous work engine and OSB lifecycle state machine.
//!
//! The HTTP edge and the bundle runtime are collaborators behind traits;
//! this crate owns everything between accepting a lifecycle request and
//! recording its terminal outcome.

pub mod auth;
pub mod broker;
pub mod config;
pub mod engine;
pub mod events;
pub mod recovery;
pub mod runtime;
pub mod subscriber;

pub use crate::auth::{AllowAllAuthorizer, AuthError, Authorizer, Decision};
pub use crate::broker::{Broker, DevelopmentBroker, OpenServiceBroker};
pub use crate::config::BrokerConfig;
pub use crate::engine::{EngineError, WorkEngine, WorkMessage, WorkTopic, DEFAULT_CHANNEL_CAPACITY};
pub use crate::events::{
    CompositeEventSink, Event, EventSink, NoOpEventSink, StdoutEventSink, StoreEventSink,
};
pub use crate::recovery::{Recovery, RecoveryPolicy, RecoveryReport};
pub use crate::runtime::{
    BundleRuntime, DemoRuntime, JobHandle, JobOutcome, JobRequest, RuntimeError,
};
pub use crate::subscriber::{
    attach_default_subscribers, BindWorkSubscriber, DeprovisionWorkSubscriber,
    ProvisionWorkSubscriber, UnbindWorkSubscriber, UpdateWorkSubscriber, WorkSubscriber,
};
