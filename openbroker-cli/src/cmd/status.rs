use openbroker_core::LastOperationRequest;
use openbroker_engine::OpenServiceBroker;

use crate::args::{ConfigArgs, OutputArgs, StoreArgs};
use crate::cmd::config::{open_broker, parse_uuid};
use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};

pub async fn status_cmd(
    instance_id: &str,
    binding_id: Option<&str>,
    operation: &str,
    output: OutputArgs,
    store: StoreArgs,
    config: ConfigArgs,
) -> i32 {
    let Some(instance_uuid) = parse_uuid(instance_id, "instance_id", &output) else {
        return exit_codes::RUNTIME_ERROR;
    };
    let binding_uuid = match binding_id {
        Some(raw) => match parse_uuid(raw, "binding_id", &output) {
            Some(u) => Some(u),
            None => return exit_codes::RUNTIME_ERROR,
        },
        None => None,
    };

    let handle = match open_broker(&output, &store, &config, false).await {
        Ok(h) => h,
        Err(code) => return code,
    };

    let req = LastOperationRequest {
        operation: operation.to_string(),
        service_id: None,
        plan_id: None,
    };

    match handle
        .broker
        .last_operation(instance_uuid, binding_uuid, &req)
        .await
    {
        Ok(resp) => {
            if output.format == OutputFormat::Text && !output.quiet {
                println!("State: {}", resp.state);
                if let Some(description) = &resp.description {
                    println!("Description: {description}");
                }
            } else {
                print_result(output.format, output.quiet, &resp);
            }
            exit_codes::SUCCESS
        }
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            exit_codes::for_broker_error(&e)
        }
    }
}
