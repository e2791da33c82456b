use serde::Serialize;

use openbroker_core::Spec;
use openbroker_engine::{DevelopmentBroker, OpenServiceBroker};

use crate::args::{ConfigArgs, OutputArgs, StoreArgs};
use crate::cmd::config::open_broker;
use crate::commands::SpecAction;
use crate::exit_codes;
use crate::output::{print_error, print_result};

#[derive(Serialize)]
struct SpecResult {
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    spec_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    removed: Option<u64>,
}

pub async fn spec_cmd(
    action: SpecAction,
    output: OutputArgs,
    store: StoreArgs,
    config: ConfigArgs,
) -> i32 {
    let handle = match open_broker(&output, &store, &config, true).await {
        Ok(h) => h,
        Err(code) => return code,
    };

    let Some(dev) = handle.broker.development() else {
        print_error(
            output.format,
            output.quiet,
            "development routes are disabled",
        );
        return exit_codes::REQUEST_REJECTED;
    };

    match action {
        SpecAction::Push { path } => {
            let content = match std::fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    print_error(
                        output.format,
                        output.quiet,
                        &format!("failed to read spec file: {e}"),
                    );
                    return exit_codes::RUNTIME_ERROR;
                }
            };
            let spec: Spec = match serde_yaml::from_str(&content) {
                Ok(s) => s,
                Err(e) => {
                    print_error(
                        output.format,
                        output.quiet,
                        &format!("invalid spec file: {e}"),
                    );
                    return exit_codes::REQUEST_REJECTED;
                }
            };
            let spec_id = spec.id.clone();
            match dev.add_spec(spec).await {
                Ok(()) => {
                    print_result(
                        output.format,
                        output.quiet,
                        &SpecResult {
                            action: "pushed",
                            spec_id: Some(spec_id),
                            removed: None,
                        },
                    );
                    exit_codes::SUCCESS
                }
                Err(e) => {
                    print_error(output.format, output.quiet, &e.to_string());
                    exit_codes::for_broker_error(&e)
                }
            }
        }
        SpecAction::Remove { spec_id } => match dev.remove_spec(&spec_id).await {
            Ok(()) => {
                print_result(
                    output.format,
                    output.quiet,
                    &SpecResult {
                        action: "removed",
                        spec_id: Some(spec_id),
                        removed: None,
                    },
                );
                exit_codes::SUCCESS
            }
            Err(e) => {
                print_error(output.format, output.quiet, &e.to_string());
                exit_codes::for_broker_error(&e)
            }
        },
        SpecAction::Clear => match dev.remove_specs().await {
            Ok(removed) => {
                print_result(
                    output.format,
                    output.quiet,
                    &SpecResult {
                        action: "cleared",
                        spec_id: None,
                        removed: Some(removed),
                    },
                );
                exit_codes::SUCCESS
            }
            Err(e) => {
                print_error(output.format, output.quiet, &e.to_string());
                exit_codes::for_broker_error(&e)
            }
        },
    }
}
