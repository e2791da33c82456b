use openbroker_engine::OpenServiceBroker;

use crate::args::{ConfigArgs, OutputArgs, StoreArgs};
use crate::cmd::config::{open_broker, parse_uuid};
use crate::exit_codes;
use crate::output::{print_error, print_result};

pub async fn instance_cmd(
    instance_id: &str,
    output: OutputArgs,
    store: StoreArgs,
    config: ConfigArgs,
) -> i32 {
    let Some(instance_uuid) = parse_uuid(instance_id, "instance_id", &output) else {
        return exit_codes::RUNTIME_ERROR;
    };

    let handle = match open_broker(&output, &store, &config, false).await {
        Ok(h) => h,
        Err(code) => return code,
    };

    match handle.broker.get_service_instance(instance_uuid).await {
        Ok(instance) => {
            print_result(output.format, output.quiet, &instance);
            exit_codes::SUCCESS
        }
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            exit_codes::for_broker_error(&e)
        }
    }
}
