//! Config command implementation

use crate::cli::ConfigArgs;
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::{ConfigEntry, ConfigRow, InspectConfigOutput};
use anyhow::Result;
use std::path::Path;

pub fn execute(args: ConfigArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let config = load_config(config_path, (&args.tuning).into())?;
    let inspection_map = config.to_inspection_map();

    if output.is_json() {
        let values = inspection_map
            .into_iter()
            .map(|(key, (value, source))| (key, ConfigEntry { value, source: format!("{:?}", source) }))
            .collect();
        return output.result(InspectConfigOutput { values });
    }

    output.section("Configuration Values");

    let mut rows: Vec<ConfigRow> = inspection_map
        .into_iter()
        .map(|(key, (value, source))| ConfigRow { key, value, source: format!("{:?}", source) })
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    output.table(rows);

    output.section("Configuration Precedence");
    output.info("CLI arguments > Environment variables > Config file > Defaults");

    Ok(())
}
