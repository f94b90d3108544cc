//! Command execution logic.

use anyhow::Result;
use std::io::{self, Write};

use super::args::{InfoArgs, InitArgs, LayoutArgs, PathArgs, ViewArgs};
use crate::app::App;
use crate::error::Error;
use crate::graph::LineageGraph;
use crate::layout::SavedLayout;
use crate::output::{self, OutputConfig, OutputMode, ViewJson};
use crate::service::LineageQuery;
use crate::store::GraphStore;

/// Execute the init command
pub async fn execute_init(args: &InitArgs, output_mode: OutputMode) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;
    let result = init::init(&current_dir, args.force).await?;

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "tributary_dir": result.tributary_dir.display().to_string(),
                "config_file": result.config_file.display().to_string(),
                "nodes_file": result.snapshot.nodes.display().to_string(),
                "edges_file": result.snapshot.edges.display().to_string(),
                "flows_file": result.snapshot.flows.display().to_string(),
                "reinitialized": result.reinitialized,
            }))?;
        }
        OutputMode::Text if !args.quiet => {
            let verb = if result.reinitialized {
                "Reinitialized"
            } else {
                "Initialized"
            };
            println!("{verb} tributary in {}", result.tributary_dir.display());
            println!("  Config: {}", result.config_file.display());
            println!("  Nodes:  {}", result.snapshot.nodes.display());
            println!("  Edges:  {}", result.snapshot.edges.display());
            println!("  Flows:  {}", result.snapshot.flows.display());
        }
        OutputMode::Text => {}
    }

    Ok(())
}

/// Execute the info command
pub async fn execute_info(app: &App, _args: &InfoArgs, output_mode: OutputMode) -> Result<()> {
    let snapshot = app.service().store().snapshot().await?;
    let dangling_edges = LineageGraph::new(&snapshot.nodes, &snapshot.edges).skipped_edges();
    let config = app.config();

    match output_mode {
        OutputMode::Json => {
            let warnings: Vec<String> = app.load_warnings().iter().map(ToString::to_string).collect();
            output::print_json(&serde_json::json!({
                "root": app.root().display().to_string(),
                "nodes": snapshot.nodes.len(),
                "edges": snapshot.edges.len(),
                "flows": snapshot.flows.len(),
                "dangling_edges": dangling_edges,
                "warnings": warnings,
                "config": config,
            }))?;
        }
        OutputMode::Text => {
            let style = OutputConfig::from_env();
            println!("Tributary Workspace Information");
            println!("===============================");
            println!();
            println!("Root:   {}", app.root().display());
            println!(
                "Graph:  {} nodes, {} edges, {} flows",
                snapshot.nodes.len(),
                snapshot.edges.len(),
                snapshot.flows.len()
            );
            if dangling_edges > 0 {
                println!(
                    "{}",
                    output::warning(
                        &format!("        {dangling_edges} edges reference missing nodes"),
                        &style
                    )
                );
            }
            println!();
            println!("Cache capacity: {}", config.cache.capacity);
            println!(
                "View depth:     {} up, {} down",
                config.view.upstream_depth, config.view.downstream_depth
            );
            println!(
                "Layer names:    {}",
                if config.view.smart_layer_names {
                    "smart"
                } else {
                    "plain"
                }
            );

            let warnings = app.load_warnings();
            if !warnings.is_empty() {
                println!();
                println!(
                    "{}",
                    output::warning(&format!("{} load warnings:", warnings.len()), &style)
                );
                for warning in warnings {
                    println!("  {warning}");
                }
            }
        }
    }

    Ok(())
}

/// Execute the view command
pub async fn execute_view(app: &App, args: &ViewArgs, output_mode: OutputMode) -> Result<()> {
    let defaults = app.config().view;
    let query = LineageQuery::new(
        args.anchor.clone(),
        args.upstream.unwrap_or(i64::from(defaults.upstream_depth)),
        args.downstream.unwrap_or(i64::from(defaults.downstream_depth)),
    )
    .with_flow(args.flow.clone())
    .with_focus(args.focus.clone())
    .with_orphans(args.show_orphans);

    let response = app
        .service()
        .lineage(&query)
        .await?
        .ok_or_else(|| Error::NodeNotFound(args.anchor.clone()))?;

    match output_mode {
        OutputMode::Json => output::print_json(&ViewJson {
            view: &response.view,
            cache_hit: response.cache_hit,
        })?,
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            output::write_view(&mut handle, &response.view, &OutputConfig::from_env())?;
        }
    }

    Ok(())
}

/// Execute the path command
pub async fn execute_path(app: &App, args: &PathArgs, output_mode: OutputMode) -> Result<()> {
    let path = app.service().explain_path(&args.from, &args.to).await?;

    match output_mode {
        OutputMode::Json => output::print_json(&serde_json::json!({
            "from": args.from,
            "to": args.to,
            "connected": path.is_some(),
            "path": path,
        }))?,
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            output::write_path(
                &mut handle,
                &args.from,
                &args.to,
                path.as_ref(),
                &OutputConfig::from_env(),
            )?;
        }
    }

    Ok(())
}

/// Execute the layout command
pub async fn execute_layout(app: &App, args: &LayoutArgs, output_mode: OutputMode) -> Result<()> {
    let previous = if args.full {
        None
    } else {
        app.load_layout().await?
    };
    let result = app
        .service()
        .global_layout(previous.as_ref(), args.full)
        .await?;

    if args.save {
        let edge_count = app.service().store().get_all_edges().await?.len();
        app.save_layout(&SavedLayout::new(result.positions.clone(), edge_count))
            .await?;
    }

    match output_mode {
        OutputMode::Json => output::print_json(&result)?,
        OutputMode::Text => {
            let style = OutputConfig::from_env();
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            output::write_layout(&mut handle, &result, &style)?;
            if args.save {
                writeln!(
                    handle,
                    "{}",
                    output::success(
                        &format!("Saved layout to {}", app.layout_path().display()),
                        &style
                    )
                )?;
            }
        }
    }

    Ok(())
}
