//! Lists the built-in handlers and the static group code table.

use crate::cli::common::{to_json, CliResult};
use crate::services::HandlerRegistry;
use clap::Args;
use serde::Serialize;

/// List registered handlers and the group codes mapped to them
#[derive(Debug, Clone, Args)]
pub struct HandlersArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct HandlerInfo {
    id: String,
    description: String,
    rows: String,
    merge: String,
    tabs: String,
    item_label: bool,
    group_codes: Vec<String>,
}

impl HandlersArgs {
    /// Execute the handlers command
    pub fn execute(&self) -> CliResult<()> {
        let registry = HandlerRegistry::with_defaults();
        let handlers: Vec<HandlerInfo> = registry
            .handlers()
            .map(|handler| HandlerInfo {
                id: handler.id.to_string(),
                description: handler.description.to_string(),
                rows: handler.plan.rows.to_string(),
                merge: handler.plan.merge.to_string(),
                tabs: handler.plan.tab_split.to_string(),
                item_label: handler.plan.item_label,
                group_codes: registry
                    .group_codes()
                    .filter(|(_, id)| *id == handler.id)
                    .map(|(code, _)| code.to_string())
                    .collect(),
            })
            .collect();

        if self.json {
            println!("{}", to_json(&handlers, false)?);
            return Ok(());
        }

        println!("Handlers ({}):", handlers.len());
        for handler in &handlers {
            println!();
            println!("  {} - {}", handler.id, handler.description);
            println!(
                "    rows: {}, merge: {}, tabs: {}, item label: {}",
                handler.rows,
                handler.merge,
                handler.tabs,
                if handler.item_label { "yes" } else { "no" }
            );
            if !handler.group_codes.is_empty() {
                println!("    group codes: {}", handler.group_codes.join(", "));
            }
        }

        Ok(())
    }
}
