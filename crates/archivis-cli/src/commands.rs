/// Command dispatch.
///
/// `run` wires the real platform query and terminal; `run_with` takes the
/// volume query and output sink as parameters so whole commands can be
/// exercised against temporary directories.
use crate::args::{Cli, Command, ScanArgs};
use crate::prompt::LinePrompt;
use crate::report;
use anyhow::Context;
use archivis_core::identity::AcceptProposed;
use archivis_core::inventory::{Inventory, InventoryEvent};
use archivis_core::model::DriveStatus;
use archivis_core::platform::{SystemVolumes, VolumeQuery};
use archivis_core::store::Catalog;
use archivis_core::CatalogError;
use std::io::{self, Write};
use tracing::{info, warn};

pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut stdout = io::stdout();
    run_with(cli, &SystemVolumes, &mut stdout)
}

pub fn run_with(cli: &Cli, query: &dyn VolumeQuery, out: &mut dyn Write) -> anyhow::Result<()> {
    let catalog = Catalog::new(cli.home.clone());
    match cli.command() {
        Command::Scan(args) => scan(&catalog, &args, query, out),
        Command::List => list(&catalog, out),
        Command::Status { id, status } => set_status(&catalog, &id, status, out),
        Command::Init => init(&catalog, out),
    }
}

fn scan(
    catalog: &Catalog,
    args: &ScanArgs,
    query: &dyn VolumeQuery,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let rules = match catalog.load_naming_rules() {
        Err(err @ CatalogError::NamingRulesMissing(_)) => {
            return Err(anyhow::Error::new(err)
                .context("run `archivis init` to create a starter naming-rules file"));
        }
        other => other.context("failed to load naming rules")?,
    };
    let mut registry = catalog
        .load_registry()
        .context("failed to load drive registry")?;

    writeln!(out, "{}", report::scan_header())?;

    let inventory = Inventory::new(catalog, &rules).with_max_depth(args.max_depth);
    let mut on_event = |event: InventoryEvent<'_>| {
        if let Some(text) = report::event_lines(&event) {
            // A broken terminal must not abandon a drive halfway through.
            if let Err(err) = writeln!(out, "{text}") {
                warn!("Failed to write progress output: {err}");
            }
        }
    };
    let summary = if args.yes {
        inventory.run(&mut registry, query, &mut AcceptProposed, &mut on_event)
    } else {
        let mut prompt = LinePrompt::new(io::stdin().lock(), io::stdout());
        inventory.run(&mut registry, query, &mut prompt, &mut on_event)
    }
    .context("inventory run stopped")?;

    info!(
        "Run finished: {} found, {} registered, {} skipped",
        summary.volumes_found(),
        summary.registered_count(),
        summary.skipped_count()
    );
    if summary.volumes_found() > 0 {
        writeln!(out, "{}", report::run_footer(&summary, catalog))?;
    }
    Ok(())
}

fn list(catalog: &Catalog, out: &mut dyn Write) -> anyhow::Result<()> {
    let registry = catalog
        .load_registry()
        .context("failed to load drive registry")?;
    writeln!(out, "{}", report::registry_table(&registry))?;
    Ok(())
}

fn set_status(
    catalog: &Catalog,
    id: &str,
    status: DriveStatus,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut registry = catalog
        .load_registry()
        .context("failed to load drive registry")?;
    if !registry.set_status(id, status) {
        return Err(CatalogError::UnknownDrive(id.to_string()).into());
    }
    catalog
        .save_registry(&registry)
        .context("failed to save drive registry")?;
    info!("Set status of {id} to {status}");
    writeln!(out, "✓ {} is now {status}", id.trim().to_uppercase())?;
    Ok(())
}

fn init(catalog: &Catalog, out: &mut dyn Write) -> anyhow::Result<()> {
    let wrote_rules = catalog
        .init_layout()
        .with_context(|| format!("failed to create catalog at {}", catalog.home().display()))?;
    catalog
        .load_registry()
        .context("failed to create drive registry")?;

    writeln!(out, "✓ Catalog ready at {}", catalog.home().display())?;
    if wrote_rules {
        writeln!(
            out,
            "✓ Starter naming rules written to {}",
            catalog.naming_rules_path().display()
        )?;
    } else {
        writeln!(
            out,
            "Naming rules already present at {}",
            catalog.naming_rules_path().display()
        )?;
    }
    Ok(())
}
