use serde::Serialize;

use crate::args::{ConfigArgs, OutputArgs, StoreArgs};
use crate::cmd::config::open_broker;
use crate::exit_codes;
use crate::output::{print_result, OutputFormat};

#[derive(Serialize)]
struct RecoverResult {
    scanned: usize,
    failed: usize,
    resubmitted: usize,
}

pub async fn recover_cmd(output: OutputArgs, store: StoreArgs, config: ConfigArgs) -> i32 {
    // open_broker runs the recovery pass before the broker serves anything;
    // this command just reports what it did.
    let handle = match open_broker(&output, &store, &config, false).await {
        Ok(h) => h,
        Err(code) => return code,
    };

    let result = RecoverResult {
        scanned: handle.recovery.scanned,
        failed: handle.recovery.failed,
        resubmitted: handle.recovery.resubmitted,
    };

    if output.format == OutputFormat::Text && !output.quiet {
        println!("Stale operations: {}", result.scanned);
        println!("  Failed:      {}", result.failed);
        println!("  Resubmitted: {}", result.resubmitted);
    } else {
        print_result(output.format, output.quiet, &result);
    }

    exit_codes::SUCCESS
}
