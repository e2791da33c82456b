use openbroker_core::UserContext;
use openbroker_engine::OpenServiceBroker;

use crate::args::{ConfigArgs, OutputArgs, RequestArgs, StoreArgs};
use crate::cmd::config::{open_broker, parse_uuid};
use crate::exit_codes;
use crate::output::{print_error, print_result};

#[allow(clippy::too_many_arguments)]
pub async fn unbind_cmd(
    instance_id: &str,
    binding_id: &str,
    plan_id: &str,
    request: RequestArgs,
    output: OutputArgs,
    store: StoreArgs,
    config: ConfigArgs,
) -> i32 {
    let Some(instance_uuid) = parse_uuid(instance_id, "instance_id", &output) else {
        return exit_codes::RUNTIME_ERROR;
    };
    let Some(binding_uuid) = parse_uuid(binding_id, "binding_id", &output) else {
        return exit_codes::RUNTIME_ERROR;
    };

    let handle = match open_broker(&output, &store, &config, false).await {
        Ok(h) => h,
        Err(code) => return code,
    };

    let instance = match handle.broker.get_service_instance(instance_uuid).await {
        Ok(i) => i,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            return exit_codes::for_broker_error(&e);
        }
    };
    let binding = match handle.broker.get_bind_instance(binding_uuid).await {
        Ok(b) => b,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            return exit_codes::for_broker_error(&e);
        }
    };

    let user = request.username.clone().map(|username| UserContext {
        username,
        groups: Vec::new(),
    });

    match handle
        .broker
        .unbind(
            instance,
            binding,
            plan_id,
            user.as_ref(),
            request.accepts_incomplete,
        )
        .await
    {
        Ok(resp) => {
            print_result(output.format, output.quiet, &resp);
            exit_codes::SUCCESS
        }
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            exit_codes::for_broker_error(&e)
        }
    }
}
