//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `init`: Create a `.tributary/` workspace
//! - `info`: Show graph counts and configuration
//! - `view`: Show the lineage around a node
//! - `path`: Explain how two nodes are related
//! - `layout`: Compute (and optionally save) the global layout
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! tributary view fct_orders -u 3 -d 1
//! tributary view fct_orders --flow orders --show-orphans
//! tributary path raw_orders rpt_revenue
//! tributary --json layout --save
//! ```

mod args;
mod execute;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use args::{InfoArgs, InitArgs, LayoutArgs, PathArgs, ViewArgs};
pub use validators::{validate_flow_id, validate_node_id};

/// Tributary - explore data-pipeline lineage from the command line
///
/// Reads a lineage graph from `.tributary/{nodes,edges,flows}.jsonl` and
/// shows the neighborhood of a node, layer by layer.
#[derive(Parser, Debug)]
#[command(name = "tributary")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a tributary workspace
    ///
    /// Creates `.tributary/` with a default config and empty snapshot files.
    Init(InitArgs),

    /// Show workspace information
    ///
    /// Displays node, edge and flow counts, load warnings and config.
    Info(InfoArgs),

    /// Show the lineage around a node
    ///
    /// Walks upstream and downstream from the anchor and lists the nodes
    /// layer by layer, with ghost nodes at the border.
    View(ViewArgs),

    /// Explain how two nodes are related
    ///
    /// Finds the shortest directed path between them in either direction.
    Path(PathArgs),

    /// Compute the global layout
    ///
    /// Reuses the saved layout when only a few nodes changed.
    Layout(LayoutArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns clap's error for invalid arguments.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Returns any error from loading the workspace or running the command.
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        match &self.command {
            Some(Commands::Init(args)) => execute::execute_init(args, output_mode).await,
            Some(Commands::Info(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_info(&app, args, output_mode).await
            }
            Some(Commands::View(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_view(&app, args, output_mode).await
            }
            Some(Commands::Path(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_path(&app, args, output_mode).await
            }
            Some(Commands::Layout(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_layout(&app, args, output_mode).await
            }
            None => {
                println!("Tributary lineage explorer");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}
