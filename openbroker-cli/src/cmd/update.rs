use openbroker_core::{UpdateRequest, UserContext};
use openbroker_engine::OpenServiceBroker;

use crate::args::{ConfigArgs, OutputArgs, RequestArgs, StoreArgs};
use crate::cmd::config::{open_broker, parse_params, parse_uuid};
use crate::exit_codes;
use crate::output::{print_error, print_result};

#[allow(clippy::too_many_arguments)]
pub async fn update_cmd(
    instance_id: &str,
    service_id: &str,
    plan_id: Option<&str>,
    params: Option<&str>,
    request: RequestArgs,
    output: OutputArgs,
    store: StoreArgs,
    config: ConfigArgs,
) -> i32 {
    let Some(instance_uuid) = parse_uuid(instance_id, "instance_id", &output) else {
        return exit_codes::RUNTIME_ERROR;
    };
    let parameters = match parse_params(params, &output) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let handle = match open_broker(&output, &store, &config, false).await {
        Ok(h) => h,
        Err(code) => return code,
    };

    let req = UpdateRequest {
        service_id: service_id.to_string(),
        plan_id: plan_id.map(String::from),
        context: None,
        parameters,
        previous_values: None,
    };
    let user = request.username.clone().map(|username| UserContext {
        username,
        groups: Vec::new(),
    });

    match handle
        .broker
        .update(instance_uuid, &req, user.as_ref(), request.accepts_incomplete)
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
