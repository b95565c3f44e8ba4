use cardwise_core::config::LoadOptions;

use crate::commands::{with_database, CommandResult, Completed};

pub fn run(options: LoadOptions) -> CommandResult {
    with_database("migrate", options, |_config, _pool| async {
        Ok(Completed::new("applied pending migrations"))
    })
}
