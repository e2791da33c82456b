use serde::Serialize;

use openbroker_core::{BindRequest, UserContext};
use openbroker_engine::OpenServiceBroker;

use crate::args::{ConfigArgs, OutputArgs, RequestArgs, StoreArgs};
use crate::cmd::config::{open_broker, parse_params, parse_uuid};
use crate::exit_codes;
use crate::output::{print_error, print_result};

#[derive(Serialize)]
struct BindResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    credentials: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation: Option<String>,
    ran_async: bool,
}

#[allow(clippy::too_many_arguments)]
pub async fn bind_cmd(
    instance_id: &str,
    binding_id: &str,
    service_id: &str,
    plan_id: &str,
    params: Option<&str>,
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
    let parameters = match parse_params(params, &output) {
        Ok(p) => p,
        Err(code) => return code,
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

    let req = BindRequest {
        service_id: service_id.to_string(),
        plan_id: plan_id.to_string(),
        app_guid: None,
        parameters,
    };
    let user = request.username.clone().map(|username| UserContext {
        username,
        groups: Vec::new(),
    });

    match handle
        .broker
        .bind(
            instance,
            binding_uuid,
            &req,
            user.as_ref(),
            request.accepts_incomplete,
        )
        .await
    {
        Ok((resp, ran_async)) => {
            print_result(
                output.format,
                output.quiet,
                &BindResult {
                    credentials: resp.credentials,
                    operation: resp.operation,
                    ran_async,
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
