//! Dry-run rendering of the command plan.

use crate::cli::PlanFormat;
use crate::config::Config;
use common::Result;
use ipvs::PlannedCommand;

/// Render the ipvsadm commands `config` would execute, without running them.
pub fn render_plan(config: &Config, format: PlanFormat) -> Result<String> {
    let commands = ipvs::plan(&config.service(), &config.destinations());
    match format {
        PlanFormat::Text => Ok(commands
            .iter()
            .map(|cmd| format!("{}\n", cmd))
            .collect()),
        PlanFormat::Json => {
            let planned: Vec<PlannedCommand> = commands.iter().map(PlannedCommand::from).collect();
            Ok(format!("{}\n", serde_json::to_string_pretty(&planned)?))
        }
    }
}
