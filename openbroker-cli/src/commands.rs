use std::path::PathBuf;

use clap::Subcommand;

use crate::args::*;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the service catalog.
    Catalog {
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Provision a service instance.
    Provision {
        instance_id: String,
        #[arg(long)]
        service_id: String,
        #[arg(long)]
        plan_id: String,
        #[arg(long)]
        namespace: String,
        /// Parameters as inline JSON or YAML.
        #[arg(long)]
        params: Option<String>,
        #[command(flatten)]
        request: RequestArgs,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Deprovision a service instance.
    Deprovision {
        instance_id: String,
        #[arg(long)]
        plan_id: String,
        #[command(flatten)]
        request: RequestArgs,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Create a binding against a provisioned instance.
    Bind {
        instance_id: String,
        binding_id: String,
        #[arg(long)]
        service_id: String,
        #[arg(long)]
        plan_id: String,
        #[arg(long)]
        params: Option<String>,
        #[command(flatten)]
        request: RequestArgs,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Remove a binding.
    Unbind {
        instance_id: String,
        binding_id: String,
        #[arg(long)]
        plan_id: String,
        #[command(flatten)]
        request: RequestArgs,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Update an instance's plan or parameters.
    Update {
        instance_id: String,
        #[arg(long)]
        service_id: String,
        #[arg(long)]
        plan_id: Option<String>,
        #[arg(long)]
        params: Option<String>,
        #[command(flatten)]
        request: RequestArgs,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Poll the state of an operation token.
    Status {
        instance_id: String,
        #[arg(long)]
        binding_id: Option<String>,
        #[arg(long)]
        operation: String,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Show a stored service instance.
    Instance {
        instance_id: String,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Development-only catalog manipulation.
    Spec {
        #[command(subcommand)]
        action: SpecAction,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Resolve resources left mid-operation by a crash.
    Recover {
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Apply database migrations.
    Migrate {
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Check that the store is reachable and migrated.
    Doctor {
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum SpecAction {
    /// Push a spec file (YAML or JSON) into the catalog.
    Push { path: PathBuf },
    /// Remove one spec by id.
    Remove { spec_id: String },
    /// Remove every spec.
    Clear,
}
