use serde::Serialize;

use openbroker_store::{run_migrations, PostgresStore};

use crate::args::{ConfigArgs, OutputArgs, StoreArgs};
use crate::cmd::config::{load_file_config, redact_url_password, resolve_database_url};
use crate::exit_codes;
use crate::output::{print_error, print_result};

#[derive(Serialize)]
struct MigrateResult {
    migrated: bool,
}

pub async fn migrate_cmd(output: OutputArgs, store: StoreArgs, config: ConfigArgs) -> i32 {
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

    match run_migrations(pg.pool()).await {
        Ok(()) => {
            print_result(output.format, output.quiet, &MigrateResult { migrated: true });
            exit_codes::SUCCESS
        }
        Err(e) => {
            print_error(
                output.format,
                output.quiet,
                &format!("migration failed: {e}"),
            );
            exit_codes::RUNTIME_ERROR
        }
    }
}
