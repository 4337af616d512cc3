//! `gatepass pass` command - Gate pass authoring and history

use clap::Subcommand;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tracing::debug;

use crate::cli::helpers::{
    escape_md, load_config, open_store, parse_item_arg, resolve_product, today, truncate_str,
    write_csv, write_output_file,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{parse_quantity, Config, GatePassError, GatePassSession};
use crate::entities::gate_pass::{GatePassMetadata, GatePassRecord, GatePassSubmission};
use crate::entities::product::Product;
use crate::render::document::line_table;
use crate::render::{qr_svg, render_gate_pass, DocumentHeader};
use crate::store::{GatePassStore, HttpStore, InventoryStore};

#[derive(Subcommand, Debug)]
pub enum GatePassCommands {
    /// Author and submit a new gate pass
    New(NewArgs),

    /// List issued gate passes, newest first
    History(HistoryArgs),

    /// Show an issued gate pass as a printable document
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Item to ship as CODE=QTY (repeatable); repeating a code adds to it
    #[arg(long = "item", short = 'I', value_name = "CODE=QTY")]
    pub items: Vec<String>,

    /// Destination of the shipment
    #[arg(long)]
    pub to: Option<String>,

    /// Who prepared the pass (default: configured prepared_by)
    #[arg(long)]
    pub prepared_by: Option<String>,

    /// Who checked the pass
    #[arg(long, default_value = "")]
    pub checked_by: String,

    /// Who authorized the pass
    #[arg(long, default_value = "")]
    pub authorized_by: String,

    /// Build the pass interactively
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Submit without asking for confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Print the payload that would be submitted and stop
    #[arg(long)]
    pub dry_run: bool,

    /// Also write the gate pass QR code to this SVG file
    #[arg(long, value_name = "FILE")]
    pub qr: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct HistoryArgs {
    /// Search in gate pass number, destination and signatories
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Gate pass number (or store key)
    pub number: String,

    /// Also write the gate pass QR code to this SVG file
    #[arg(long, value_name = "FILE")]
    pub qr: Option<PathBuf>,
}

/// Run a gate pass subcommand
pub fn run(cmd: GatePassCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        GatePassCommands::New(args) => run_new(args, global),
        GatePassCommands::History(args) => run_history(args, global),
        GatePassCommands::Show(args) => run_show(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);

    // Item arguments are checked before anything touches the network
    let mut items = Vec::with_capacity(args.items.len());
    for item in &args.items {
        let (code, qty) = parse_item_arg(item)?;
        let qty = parse_quantity(qty).map_err(|e| miette::miette!("{}: {}", code, e))?;
        items.push((code.to_string(), qty));
    }
    if !args.interactive && items.is_empty() {
        return Err(miette::miette!(
            "{}\nUse --item CODE=QTY or --interactive",
            GatePassError::EmptySelection
        ));
    }

    let store = open_store(&config)?;
    let mut session = GatePassSession::new().with_date_format(config.date_format.clone());

    let products = store
        .list_products()
        .map_err(|e| miette::miette!("Error loading products: {}", e))?;
    for (code, qty) in &items {
        let product = resolve_product(&products, code)?;
        session
            .add_selection(product, *qty)
            .map_err(|e| miette::miette!("{}", e))?;
    }

    let mut metadata = GatePassMetadata::new(
        args.to.clone().unwrap_or_default(),
        args.prepared_by
            .clone()
            .or_else(|| config.prepared_by.clone())
            .unwrap_or_default(),
    )
    .with_checked_by(args.checked_by.clone())
    .with_authorized_by(args.authorized_by.clone());

    if args.interactive {
        if !select_interactively(&mut session, &store)? {
            session.cancel();
            println!("Cancelled.");
            return Ok(());
        }
        metadata = prompt_metadata(metadata)?;
    }
    session.set_metadata(metadata);

    let submission = session
        .submission(today())
        .map_err(|e| miette::miette!("{}", e))?;

    if args.dry_run {
        match global.format {
            OutputFormat::Yaml => print!("{}", serde_yml::to_string(&submission).into_diagnostic()?),
            _ => println!("{}", serde_json::to_string_pretty(&submission).into_diagnostic()?),
        }
        return Ok(());
    }

    if !global.quiet {
        print_preview(&submission, &config);
    }

    let can_prompt = !args.yes;
    if can_prompt {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Generate gate pass")
            .default(true)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            session.cancel();
            println!("Cancelled.");
            return Ok(());
        }
    }

    let committed = loop {
        match session.commit(&store, &store, today()) {
            Ok(committed) => break committed,
            Err(GatePassError::SubmissionFailed(e)) if can_prompt => {
                eprintln!(
                    "{} Error generating gate pass: {}",
                    style("✗").red(),
                    e
                );
                let retry = Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt("Retry")
                    .default(true)
                    .interact()
                    .into_diagnostic()?;
                if !retry {
                    return Err(miette::miette!("Gate pass was not generated"));
                }
            }
            Err(e) => return Err(miette::miette!("{}", e)),
        }
    };

    if let Some(path) = &args.qr {
        write_output_file(path, &qr_svg(&committed.record.gate_pass_number))?;
    }

    match global.format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&committed.record).into_diagnostic()?
        ),
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(&committed.record).into_diagnostic()?),
        OutputFormat::Id => println!("{}", committed.record.gate_pass_number),
        _ => {
            println!(
                "{} Gate pass {} generated",
                style("✓").green(),
                style(&committed.record.gate_pass_number).cyan()
            );
            println!();
            println!("{}", render_gate_pass(&committed.record, &header(&config)));
            if !global.quiet {
                match &committed.inventory {
                    Some(products) => println!(
                        "{}",
                        style(format!("Inventory refreshed: {} product(s)", products.len())).dim()
                    ),
                    None => println!(
                        "{}",
                        style("Inventory could not be refreshed; run 'gatepass product list'").yellow()
                    ),
                }
            }
        }
    }

    Ok(())
}

fn header(config: &Config) -> DocumentHeader<'_> {
    DocumentHeader {
        organization: &config.organization,
        station: &config.station,
    }
}

fn print_preview(submission: &GatePassSubmission, config: &Config) {
    println!();
    println!("{}", style("Gate Pass Preview").bold().underlined());
    println!("{}: {}", style("Date").bold(), submission.date);
    println!(
        "{}: {} → {}",
        style("Route").bold(),
        config.station,
        style(&submission.to).yellow()
    );
    println!(
        "{}",
        line_table(&submission.products, &config.station, &submission.to)
    );
    println!(
        "{}: {}",
        style("Prepared By").bold(),
        submission.prepared_by
    );
    println!();
}

/// Drive the selection menu; returns false if the user cancelled
fn select_interactively(session: &mut GatePassSession, store: &HttpStore) -> Result<bool> {
    let theme = ColorfulTheme::default();
    let actions = ["Add item", "Remove item", "Review and continue", "Cancel"];

    loop {
        print_selection(session);

        let action = Select::with_theme(&theme)
            .with_prompt("Gate pass")
            .items(&actions)
            .default(0)
            .interact()
            .into_diagnostic()?;

        match action {
            0 => {
                // Stock may have moved since the last pick
                let products = store
                    .list_products()
                    .map_err(|e| miette::miette!("Error loading products: {}", e))?;
                if products.is_empty() {
                    println!("No products in inventory.");
                    continue;
                }
                let labels: Vec<String> = products.iter().map(product_label).collect();
                let pick = Select::with_theme(&theme)
                    .with_prompt("Product")
                    .items(&labels)
                    .default(0)
                    .interact()
                    .into_diagnostic()?;
                let product = &products[pick];

                let input: String = Input::with_theme(&theme)
                    .with_prompt(format!("Quantity (available {})", product.quantity))
                    .interact_text()
                    .into_diagnostic()?;

                match parse_quantity(&input).and_then(|qty| session.add_selection(product, qty)) {
                    Ok(()) => debug!(product = %product.product_id, "selection updated"),
                    Err(e) => eprintln!("{} {}", style("✗").red(), e),
                }
            }
            1 => {
                let entries = session.ledger().entries();
                if entries.is_empty() {
                    println!("Nothing selected.");
                    continue;
                }
                let labels: Vec<String> = entries
                    .iter()
                    .map(|e| format!("{} x{}", e.product.product_id, e.selected_quantity))
                    .collect();
                let pick = Select::with_theme(&theme)
                    .with_prompt("Remove")
                    .items(&labels)
                    .interact()
                    .into_diagnostic()?;
                let key = entries[pick].key().to_string();
                session.remove_selection(&key);
            }
            2 => {
                if session.ledger().is_empty() {
                    eprintln!("{} {}", style("✗").red(), GatePassError::EmptySelection);
                    continue;
                }
                return Ok(true);
            }
            _ => return Ok(false),
        }
    }
}

fn print_selection(session: &GatePassSession) {
    let ledger = session.ledger();
    println!();
    if ledger.is_empty() {
        println!("{}", style("No items selected").dim());
        return;
    }
    println!("{}", style("Selected items").bold());
    for entry in ledger.entries() {
        println!(
            "  {:<12} {:<28} {}",
            style(&entry.product.product_id).cyan(),
            truncate_str(&entry.product.name, 26),
            style(entry.selected_quantity).yellow()
        );
    }
    println!(
        "  {} line(s), {} unit(s)",
        ledger.len(),
        ledger.total_quantity()
    );
}

fn product_label(product: &Product) -> String {
    format!(
        "{:<12} {:<28} qty {:>5}  {}",
        product.product_id,
        truncate_str(&product.name, 26),
        product.quantity,
        product.product_type
    )
}

fn prompt_metadata(defaults: GatePassMetadata) -> Result<GatePassMetadata> {
    let theme = ColorfulTheme::default();

    let mut to = Input::<String>::with_theme(&theme).with_prompt("To (destination)");
    if !defaults.destination.is_empty() {
        to = to.default(defaults.destination.clone());
    }
    let destination = to.interact_text().into_diagnostic()?;

    let mut prepared = Input::<String>::with_theme(&theme).with_prompt("Prepared by");
    if !defaults.prepared_by.is_empty() {
        prepared = prepared.default(defaults.prepared_by.clone());
    }
    let prepared_by = prepared.interact_text().into_diagnostic()?;

    let checked_by: String = Input::with_theme(&theme)
        .with_prompt("Checked by")
        .default(defaults.checked_by.clone())
        .allow_empty(true)
        .interact_text()
        .into_diagnostic()?;

    let authorized_by: String = Input::with_theme(&theme)
        .with_prompt("Authorized by")
        .default(defaults.authorized_by.clone())
        .allow_empty(true)
        .interact_text()
        .into_diagnostic()?;

    Ok(GatePassMetadata::new(destination, prepared_by)
        .with_checked_by(checked_by)
        .with_authorized_by(authorized_by))
}

fn load_history(store: &dyn GatePassStore) -> Result<Vec<GatePassRecord>> {
    store
        .list_gate_passes()
        .map_err(|e| miette::miette!("Error loading gate passes: {}", e))
}

/// Case-insensitive match on number, destination and signatories
fn record_matches(record: &GatePassRecord, term: &str) -> bool {
    let term = term.to_lowercase();
    [
        record.gate_pass_number.as_str(),
        record.to.as_str(),
        record.prepared_by.as_str(),
        record.checked_by.as_str(),
        record.authorized_by.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&term))
}

/// Filter and order history newest first
fn select_history<'a>(
    records: &'a [GatePassRecord],
    search: Option<&str>,
    limit: Option<usize>,
) -> Vec<&'a GatePassRecord> {
    let mut selected: Vec<&GatePassRecord> = records
        .iter()
        .filter(|r| search.map_or(true, |term| record_matches(r, term)))
        .collect();
    selected.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
    if let Some(limit) = limit {
        selected.truncate(limit);
    }
    selected
}

fn run_history(args: HistoryArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let records = load_history(&store)?;
    let records = select_history(&records, args.search.as_deref(), args.limit);

    if args.count {
        println!("{}", records.len());
        return Ok(());
    }

    if records.is_empty() {
        if !global.quiet {
            println!("No gate passes found.");
        }
        return Ok(());
    }

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&records).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&records).into_diagnostic()?);
        }
        OutputFormat::Csv => {
            write_csv(
                &["gate_pass_number", "date", "generated_at", "to", "items", "units", "prepared_by", "checked_by", "authorized_by"],
                records.iter().map(|r| {
                    vec![
                        r.gate_pass_number.clone(),
                        r.date.clone(),
                        r.generated_at.to_rfc3339(),
                        r.to.clone(),
                        r.products.len().to_string(),
                        r.total_quantity().to_string(),
                        r.prepared_by.clone(),
                        r.checked_by.clone(),
                        r.authorized_by.clone(),
                    ]
                }),
            )?;
        }
        OutputFormat::Md => {
            println!("| Gate Pass No | Generated | To | Items | Prepared By |");
            println!("|---|---|---|---|---|");
            for r in &records {
                println!(
                    "| {} | {} | {} | {} | {} |",
                    escape_md(&r.gate_pass_number),
                    r.generated_at.format("%Y-%m-%d %H:%M"),
                    escape_md(&r.to),
                    r.products.len(),
                    escape_md(&r.prepared_by)
                );
            }
        }
        OutputFormat::Id => {
            for r in &records {
                println!("{}", r.gate_pass_number);
            }
        }
        OutputFormat::Tsv | OutputFormat::Auto => {
            println!(
                "{:<12} {:<17} {:<24} {:<6} {:<20}",
                style("NUMBER").bold(),
                style("GENERATED").bold(),
                style("TO").bold(),
                style("ITEMS").bold(),
                style("PREPARED BY").bold()
            );
            println!("{}", "-".repeat(83));
            for r in &records {
                println!(
                    "{:<12} {:<17} {:<24} {:<6} {:<20}",
                    style(&r.gate_pass_number).cyan(),
                    r.generated_at.format("%Y-%m-%d %H:%M"),
                    truncate_str(&r.to, 22),
                    r.products.len(),
                    truncate_str(&r.prepared_by, 20)
                );
            }
            if !global.quiet {
                println!();
                println!("{} gate pass(es) found.", style(records.len()).cyan());
            }
        }
    }

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let records = load_history(&store)?;
    let record = records
        .iter()
        .find(|r| r.gate_pass_number == args.number || r.key == args.number)
        .ok_or_else(|| {
            miette::miette!(
                "No gate pass numbered '{}'. Use 'gatepass pass history' to list them.",
                args.number
            )
        })?;

    if let Some(path) = &args.qr {
        write_output_file(path, &qr_svg(&record.gate_pass_number))?;
    }

    match global.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(record).into_diagnostic()?),
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(record).into_diagnostic()?),
        OutputFormat::Id => println!("{}", record.gate_pass_number),
        _ => println!("{}", render_gate_pass(record, &header(&config))),
    }

    Ok(())
}
