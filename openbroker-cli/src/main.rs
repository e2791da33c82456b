use clap::Parser;

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod output;

pub use args::*;
use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "openbroker", version, about = "Open Service Broker lifecycle engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(exit_codes::RUNTIME_ERROR);
        }
    };

    let exit_code = rt.block_on(run_command(cli.command));
    std::process::exit(exit_code);
}

async fn run_command(command: Command) -> i32 {
    match command {
        Command::Catalog {
            output,
            store,
            config,
        } => cmd::catalog::catalog_cmd(output, store, config).await,
        Command::Provision {
            instance_id,
            service_id,
            plan_id,
            namespace,
            params,
            request,
            output,
            store,
            config,
        } => {
            cmd::provision::provision_cmd(
                &instance_id,
                &service_id,
                &plan_id,
                &namespace,
                params.as_deref(),
                request,
                output,
                store,
                config,
            )
            .await
        }
        Command::Deprovision {
            instance_id,
            plan_id,
            request,
            output,
            store,
            config,
        } => {
            cmd::deprovision::deprovision_cmd(&instance_id, &plan_id, request, output, store, config)
                .await
        }
        Command::Bind {
            instance_id,
            binding_id,
            service_id,
            plan_id,
            params,
            request,
            output,
            store,
            config,
        } => {
            cmd::bind::bind_cmd(
                &instance_id,
                &binding_id,
                &service_id,
                &plan_id,
                params.as_deref(),
                request,
                output,
                store,
                config,
            )
            .await
        }
        Command::Unbind {
            instance_id,
            binding_id,
            plan_id,
            request,
            output,
            store,
            config,
        } => {
            cmd::unbind::unbind_cmd(
                &instance_id,
                &binding_id,
                &plan_id,
                request,
                output,
                store,
                config,
            )
            .await
        }
        Command::Update {
            instance_id,
            service_id,
            plan_id,
            params,
            request,
            output,
            store,
            config,
        } => {
            cmd::update::update_cmd(
                &instance_id,
                &service_id,
                plan_id.as_deref(),
                params.as_deref(),
                request,
                output,
                store,
                config,
            )
            .await
        }
        Command::Status {
            instance_id,
            binding_id,
            operation,
            output,
            store,
            config,
        } => {
            cmd::status::status_cmd(
                &instance_id,
                binding_id.as_deref(),
                &operation,
                output,
                store,
                config,
            )
            .await
        }
        Command::Instance {
            instance_id,
            output,
            store,
            config,
        } => cmd::instance::instance_cmd(&instance_id, output, store, config).await,
        Command::Spec {
            action,
            output,
            store,
            config,
        } => cmd::spec::spec_cmd(action, output, store, config).await,
        Command::Recover {
            output,
            store,
            config,
        } => cmd::recover::recover_cmd(output, store, config).await,
        Command::Migrate {
            output,
            store,
            config,
        } => cmd::migrate::migrate_cmd(output, store, config).await,
        Command::Doctor {
            output,
            store,
            config,
        } => cmd::doctor::doctor_cmd(output, store, config).await,
    }
}
