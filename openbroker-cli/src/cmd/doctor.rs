use serde::Serialize;

use openbroker_store::{BrokerStore, PostgresStore};

use crate::args::{ConfigArgs, OutputArgs, StoreArgs};
use crate::cmd::config::{load_file_config, redact_url_password, resolve_database_url};
use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};

#[derive(Serialize)]
struct DoctorResult {
    database: &'static str,
    schema: &'static str,
    specs: usize,
}

pub async fn doctor_cmd(output: OutputArgs, store: StoreArgs, config: ConfigArgs) -> i32 {
    let Some(file) = load_file_config(config.config.as_deref(), &output) else {
        return exit_codes::RUNTIME_ERROR;
    };
    let Some(database_url) = resolve_database_url(&store, &file) else {
        print_error(output.format, output.quiet, "missing database URL");
        return exit_codes::RUNTIME_ERROR;
    };

    let pg = match PostgresStore::connect(&database_url, store.max_connections).await {
        Ok(s) => s,
        Err(e) => {
            let safe_url = redact_url_password(&database_url);
            print_error(
                output.format,
                output.quiet,
                &format!("database connection failed to {safe_url}: {e}"),
            );
            return exit_codes::RUNTIME_ERROR;
        }
    };

    // A catalog read exercises both connectivity and the schema.
    let result = match pg.batch_get_specs().await {
        Ok(specs) => DoctorResult {
            database: "ok",
            schema: "ok",
            specs: specs.len(),
        },
        Err(e) => {
            print_error(
                output.format,
                output.quiet,
                &format!("schema check failed (run `openbroker migrate`?): {e}"),
            );
            return exit_codes::RUNTIME_ERROR;
        }
    };

    if output.format == OutputFormat::Text && !output.quiet {
        println!("Database: {}", result.database);
        println!("Schema:   {}", result.schema);
        println!("Specs:    {}", result.specs);
    } else {
        print_result(output.format, output.quiet, &result);
    }

    exit_codes::SUCCESS
}
