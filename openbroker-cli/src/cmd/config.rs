use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use openbroker_engine::{
    attach_default_subscribers, Broker, BrokerConfig, DemoRuntime, EventSink, NoOpEventSink,
    Recovery, RecoveryPolicy, RecoveryReport, StdoutEventSink, WorkEngine,
};
use openbroker_store::{BrokerStore, PostgresStore};

use crate::args::{ConfigArgs, OutputArgs, StoreArgs};
use crate::exit_codes;
use crate::output::print_error;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub store: StoreSection,
    pub broker: BrokerSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub database_url: Option<String>,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BrokerSection {
    pub channel_capacity: Option<usize>,
    pub job_timeout_secs: Option<u64>,
    pub launch_bundle_on_bind: Option<bool>,
    pub auto_escalate: Option<bool>,
    pub dev_broker: Option<bool>,
    /// "fail_stale" (default) or "resubmit".
    pub recovery: Option<String>,
}

pub fn load_file_config(path: Option<&Path>, output: &OutputArgs) -> Option<FileConfig> {
    let Some(path) = path else {
        return Some(FileConfig::default());
    };
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            print_error(
                output.format,
                output.quiet,
                &format!("failed to read config file: {e}"),
            );
            return None;
        }
    };
    match serde_yaml::from_str(&content) {
        Ok(c) => Some(c),
        Err(e) => {
            print_error(
                output.format,
                output.quiet,
                &format!("invalid config file: {e}"),
            );
            None
        }
    }
}

pub fn broker_config_from(file: &FileConfig) -> BrokerConfig {
    let mut config = BrokerConfig::default();
    if let Some(capacity) = file.broker.channel_capacity {
        config.channel_capacity = capacity;
    }
    if let Some(secs) = file.broker.job_timeout_secs {
        config.job_timeout = Duration::from_secs(secs);
    }
    if let Some(launch) = file.broker.launch_bundle_on_bind {
        config.launch_bundle_on_bind = launch;
    }
    if let Some(escalate) = file.broker.auto_escalate {
        config.auto_escalate = escalate;
    }
    if let Some(dev) = file.broker.dev_broker {
        config.dev_broker = dev;
    }
    if let Some(policy) = file.broker.recovery.as_deref() {
        config.recovery = match policy {
            "resubmit" => RecoveryPolicy::Resubmit,
            _ => RecoveryPolicy::FailStale,
        };
    }
    config
}

pub fn resolve_database_url(store: &StoreArgs, file: &FileConfig) -> Option<String> {
    store
        .store
        .clone()
        .or_else(|| file.store.database_url.clone())
        .or_else(|| std::env::var("OPENBROKER_DATABASE_URL").ok())
        .or_else(|| std::env::var("DATABASE_URL").ok())
}

pub fn redact_url_password(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((credentials, host)) = rest.split_once('@') else {
        return url.to_string();
    };
    match credentials.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
        None => url.to_string(),
    }
}

pub fn parse_uuid(value: &str, what: &str, output: &OutputArgs) -> Option<Uuid> {
    match Uuid::parse_str(value) {
        Ok(u) => Some(u),
        Err(e) => {
            print_error(
                output.format,
                output.quiet,
                &format!("invalid {what}: {e}"),
            );
            None
        }
    }
}

/// Inline parameters accept JSON first, then YAML.
pub fn parse_params(params: Option<&str>, output: &OutputArgs) -> Result<Option<JsonValue>, i32> {
    let Some(raw) = params else {
        return Ok(None);
    };
    if let Ok(v) = serde_json::from_str(raw) {
        return Ok(Some(v));
    }
    match serde_yaml::from_str(raw) {
        Ok(v) => Ok(Some(v)),
        Err(_) => {
            print_error(
                output.format,
                output.quiet,
                "params are neither valid JSON nor YAML",
            );
            Err(exit_codes::RUNTIME_ERROR)
        }
    }
}

pub struct BrokerHandle {
    pub broker: Arc<Broker>,
    pub store: Arc<PostgresStore>,
    pub recovery: RecoveryReport,
}

/// Connects the store, wires the engine and its subscribers, and runs
/// recovery to completion before handing the broker out, so no request is
/// served against un-reconciled state.
pub async fn open_broker(
    output: &OutputArgs,
    store_args: &StoreArgs,
    config_args: &ConfigArgs,
    force_dev: bool,
) -> Result<BrokerHandle, i32> {
    let file = load_file_config(config_args.config.as_deref(), output)
        .ok_or(exit_codes::RUNTIME_ERROR)?;
    let mut config = broker_config_from(&file);
    if force_dev {
        config.dev_broker = true;
    }

    let Some(database_url) = resolve_database_url(store_args, &file) else {
        print_error(output.format, output.quiet, "missing database URL");
        return Err(exit_codes::RUNTIME_ERROR);
    };

    let max_connections = file
        .store
        .max_connections
        .unwrap_or(store_args.max_connections);
    let store = match PostgresStore::connect(&database_url, max_connections).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            let safe_url = redact_url_password(&database_url);
            print_error(
                output.format,
                output.quiet,
                &format!("database connection failed to {safe_url}: {e}"),
            );
            return Err(exit_codes::RUNTIME_ERROR);
        }
    };

    let store_dyn: Arc<dyn BrokerStore> = store.clone();
    let events: Arc<dyn EventSink> = if output.quiet {
        Arc::new(NoOpEventSink)
    } else {
        Arc::new(StdoutEventSink)
    };

    let engine = Arc::new(WorkEngine::new(config.channel_capacity, events.clone()));
    if let Err(e) = attach_default_subscribers(
        &engine,
        store_dyn.clone(),
        Arc::new(DemoRuntime),
        events.clone(),
        config.job_timeout,
    ) {
        print_error(output.format, output.quiet, &e.to_string());
        return Err(exit_codes::RUNTIME_ERROR);
    }

    let recovery = Recovery::new(
        store_dyn.clone(),
        engine.clone(),
        events.clone(),
        config.recovery,
    );
    let report = match recovery.run().await {
        Ok(r) => r,
        Err(e) => {
            print_error(
                output.format,
                output.quiet,
                &format!("recovery failed: {e}"),
            );
            return Err(exit_codes::RUNTIME_ERROR);
        }
    };

    let broker = Arc::new(Broker::new(config, store_dyn, engine, events));
    Ok(BrokerHandle {
        broker,
        store,
        recovery: report,
    })
}
