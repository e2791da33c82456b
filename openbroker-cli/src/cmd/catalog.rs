use openbroker_engine::OpenServiceBroker;

use crate::args::{ConfigArgs, OutputArgs, StoreArgs};
use crate::cmd::config::open_broker;
use crate::exit_codes;
use crate::output::{print_error, print_result};

pub async fn catalog_cmd(output: OutputArgs, store: StoreArgs, config: ConfigArgs) -> i32 {
    let handle = match open_broker(&output, &store, &config, false).await {
        Ok(h) => h,
        Err(code) => return code,
    };

    match handle.broker.catalog().await {
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
