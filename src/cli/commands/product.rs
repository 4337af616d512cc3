//! `gatepass product` command - Inventory product management

use clap::{Subcommand, ValueEnum};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tracing::debug;

use crate::cli::helpers::{
    escape_md, load_config, open_store, resolve_product, truncate_str, write_csv,
    write_output_file,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::parse_quantity;
use crate::entities::product::{filter_products, Product, ProductDraft, ProductType, TransportMode};
use crate::render::{barcode_svg, qr_svg};
use crate::store::InventoryStore;

#[derive(Subcommand, Debug)]
pub enum ProductCommands {
    /// List products with optional search
    List(ListArgs),

    /// Add a new product to the inventory
    Add(AddArgs),

    /// Show a product's details
    Show(ShowArgs),

    /// Delete a product
    Delete(DeleteArgs),

    /// Set a product's available quantity
    SetQty(SetQtyArgs),

    /// Write QR and barcode artwork for a product
    Codes(CodesArgs),
}

/// List column for display and sorting
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListColumn {
    Id,
    Name,
    Transport,
    Quantity,
    From,
    To,
    Type,
    Remarks,
}

impl std::fmt::Display for ListColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListColumn::Id => write!(f, "id"),
            ListColumn::Name => write!(f, "name"),
            ListColumn::Transport => write!(f, "transport"),
            ListColumn::Quantity => write!(f, "quantity"),
            ListColumn::From => write!(f, "from"),
            ListColumn::To => write!(f, "to"),
            ListColumn::Type => write!(f, "type"),
            ListColumn::Remarks => write!(f, "remarks"),
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Search in name, product code and type (case-insensitive)
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Columns to display
    #[arg(long, value_delimiter = ',', default_values_t = vec![
        ListColumn::Id,
        ListColumn::Name,
        ListColumn::Transport,
        ListColumn::Quantity,
        ListColumn::From,
        ListColumn::Type
    ])]
    pub columns: Vec<ListColumn>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Product name (required)
    #[arg(long)]
    pub name: Option<String>,

    /// Available quantity (required)
    #[arg(long, short = 'Q')]
    pub quantity: Option<u32>,

    /// Origin location (required)
    #[arg(long)]
    pub from: Option<String>,

    /// Destination location (default: configured station)
    #[arg(long)]
    pub to: Option<String>,

    /// Mode of transport
    #[arg(long, short = 't', default_value = "road")]
    pub transport: TransportMode,

    /// Product category
    #[arg(long = "type", default_value = "electronics")]
    pub product_type: ProductType,

    /// Free-text description
    #[arg(long, short = 'd', default_value = "")]
    pub description: String,

    /// Free-text remarks
    #[arg(long, short = 'r', default_value = "")]
    pub remarks: String,

    /// Interactive mode (prompt for fields)
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Product code (e.g. PRD-0001) or store key
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Product code or store key
    pub id: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct SetQtyArgs {
    /// Product code or store key
    pub id: String,

    /// New available quantity
    pub quantity: u32,
}

#[derive(clap::Args, Debug)]
pub struct CodesArgs {
    /// Product code or store key
    pub id: String,

    /// Directory to write <code>-qr.svg and <code>-barcode.svg into
    #[arg(long, short = 'o', default_value = ".")]
    pub out_dir: PathBuf,
}

/// Run a product subcommand
pub fn run(cmd: ProductCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ProductCommands::List(args) => run_list(args, global),
        ProductCommands::Add(args) => run_add(args, global),
        ProductCommands::Show(args) => run_show(args, global),
        ProductCommands::Delete(args) => run_delete(args, global),
        ProductCommands::SetQty(args) => run_set_qty(args, global),
        ProductCommands::Codes(args) => run_codes(args, global),
    }
}

fn load_products(store: &dyn InventoryStore) -> Result<Vec<Product>> {
    store
        .list_products()
        .map_err(|e| miette::miette!("Error loading products: {}", e))
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let products = load_products(&store)?;

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    let mut products: Vec<&Product> = filter_products(&products, args.search.as_deref().unwrap_or(""));
    if let Some(limit) = args.limit {
        products.truncate(limit);
    }

    if args.count {
        println!("{}", products.len());
        return Ok(());
    }

    if products.is_empty() {
        if !global.quiet {
            println!("No products found.");
        }
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&products).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&products).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            write_csv(
                &["product_id", "name", "transport", "description", "quantity", "from", "to", "type", "remarks"],
                products.iter().map(|p| {
                    vec![
                        p.product_id.clone(),
                        p.name.clone(),
                        p.transport.to_string(),
                        p.description.clone(),
                        p.quantity.to_string(),
                        p.from.clone(),
                        p.to.clone(),
                        p.product_type.to_string(),
                        p.remarks.clone(),
                    ]
                }),
            )?;
        }
        OutputFormat::Tsv => {
            let mut headers = vec![];
            let mut widths = vec![];

            for col in &args.columns {
                let (header, width) = match col {
                    ListColumn::Id => ("ID", 12),
                    ListColumn::Name => ("NAME", 26),
                    ListColumn::Transport => ("TRANSPORT", 12),
                    ListColumn::Quantity => ("QTY", 6),
                    ListColumn::From => ("FROM", 16),
                    ListColumn::To => ("TO", 16),
                    ListColumn::Type => ("TYPE", 12),
                    ListColumn::Remarks => ("REMARKS", 24),
                };
                headers.push((header, *col));
                widths.push(width);
            }

            print!("{:<5} ", style("S.NO").bold().dim());
            for (i, (header, _)) in headers.iter().enumerate() {
                print!("{:<width$} ", style(header).bold(), width = widths[i]);
            }
            println!();
            println!(
                "{}",
                "-".repeat(5 + widths.iter().sum::<usize>() + widths.len())
            );

            for (n, product) in products.iter().enumerate() {
                print!("{:<5} ", style(n + 1).dim());
                for (i, (_, col)) in headers.iter().enumerate() {
                    let cell = match col {
                        ListColumn::Id => {
                            print!("{:<width$} ", style(&product.product_id).cyan(), width = widths[i]);
                            continue;
                        }
                        ListColumn::Name => truncate_str(&product.name, widths[i] - 2),
                        ListColumn::Transport => product.transport.to_string(),
                        ListColumn::Quantity => {
                            let qty = if product.quantity == 0 {
                                style(product.quantity.to_string()).red()
                            } else {
                                style(product.quantity.to_string()).green()
                            };
                            print!("{:<width$} ", qty, width = widths[i]);
                            continue;
                        }
                        ListColumn::From => truncate_str(&product.from, widths[i] - 2),
                        ListColumn::To => truncate_str(&product.to, widths[i] - 2),
                        ListColumn::Type => product.product_type.to_string(),
                        ListColumn::Remarks => truncate_str(&product.remarks, widths[i] - 2),
                    };
                    print!("{:<width$} ", cell, width = widths[i]);
                }
                println!();
            }

            if !global.quiet {
                println!();
                println!("{} product(s) found.", style(products.len()).cyan());
            }
        }
        OutputFormat::Id => {
            for product in &products {
                println!("{}", product.product_id);
            }
        }
        OutputFormat::Md => {
            println!("| S.No | Product ID | Name | Transport | Qty | From | To | Type | Remarks |");
            println!("|---|---|---|---|---|---|---|---|---|");
            for (n, p) in products.iter().enumerate() {
                println!(
                    "| {} | {} | {} | {} | {} | {} | {} | {} | {} |",
                    n + 1,
                    escape_md(&p.product_id),
                    escape_md(&p.name),
                    p.transport,
                    p.quantity,
                    escape_md(&p.from),
                    escape_md(&p.to),
                    p.product_type,
                    escape_md(&p.remarks)
                );
            }
        }
        OutputFormat::Auto => unreachable!(),
    }

    Ok(())
}

fn prompt_draft(station: &str) -> Result<ProductDraft> {
    let theme = ColorfulTheme::default();

    println!();
    println!("{} Adding new product", style("◆").cyan());
    println!("{}", style("─".repeat(50)).dim());

    let name: String = Input::with_theme(&theme)
        .with_prompt("Product name")
        .interact_text()
        .into_diagnostic()?;

    let transports: Vec<&str> = TransportMode::ALL.iter().map(|t| t.as_str()).collect();
    let transport = Select::with_theme(&theme)
        .with_prompt("Mode of transport")
        .items(&transports)
        .default(0)
        .interact()
        .into_diagnostic()?;

    let description: String = Input::with_theme(&theme)
        .with_prompt("Description")
        .allow_empty(true)
        .interact_text()
        .into_diagnostic()?;

    let quantity: String = Input::with_theme(&theme)
        .with_prompt("Quantity")
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            parse_quantity(input).map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()
        .into_diagnostic()?;

    let from: String = Input::with_theme(&theme)
        .with_prompt("From")
        .interact_text()
        .into_diagnostic()?;

    let to: String = Input::with_theme(&theme)
        .with_prompt("To")
        .default(station.to_string())
        .interact_text()
        .into_diagnostic()?;

    let types: Vec<&str> = ProductType::ALL.iter().map(|t| t.as_str()).collect();
    let product_type = Select::with_theme(&theme)
        .with_prompt("Type")
        .items(&types)
        .default(0)
        .interact()
        .into_diagnostic()?;

    let remarks: String = Input::with_theme(&theme)
        .with_prompt("Remarks")
        .allow_empty(true)
        .interact_text()
        .into_diagnostic()?;

    let mut draft = ProductDraft::new(name, parse_quantity(&quantity).map_err(|e| miette::miette!("{}", e))?, from, &to);
    draft.transport = TransportMode::ALL[transport];
    draft.description = description;
    draft.product_type = ProductType::ALL[product_type];
    draft.remarks = remarks;
    Ok(draft)
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);

    let draft = if args.interactive {
        prompt_draft(&config.station)?
    } else {
        let to = args.to.unwrap_or_else(|| config.station.clone());
        let mut draft = ProductDraft::new(
            args.name.unwrap_or_default(),
            args.quantity.unwrap_or(0),
            args.from.unwrap_or_default(),
            &to,
        );
        draft.transport = args.transport;
        draft.product_type = args.product_type;
        draft.description = args.description;
        draft.remarks = args.remarks;
        draft
    };

    draft.validate().map_err(|e| {
        miette::miette!(
            "{}\nRequired fields: --name, --quantity, --from",
            e
        )
    })?;

    let store = open_store(&config)?;
    debug!(name = %draft.name, "creating product");
    let product = store
        .create_product(&draft)
        .map_err(|e| miette::miette!("Error adding product: {}", e))?;

    match global.format {
        OutputFormat::Id => println!("{}", product.product_id),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&product).into_diagnostic()?)
        }
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(&product).into_diagnostic()?),
        _ => {
            println!(
                "{} Added product {}",
                style("✓").green(),
                style(&product.product_id).cyan()
            );
            println!(
                "   {} | qty {} | {} → {}",
                style(&product.name).white(),
                style(product.quantity).yellow(),
                product.from,
                product.to
            );
        }
    }

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let products = load_products(&store)?;
    let product = resolve_product(&products, &args.id)?;

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(product).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(product).into_diagnostic()?);
        }
        OutputFormat::Id => println!("{}", product.product_id),
        _ => {
            println!("{}", style("─".repeat(60)).dim());
            println!(
                "{}: {}",
                style("Product ID").bold(),
                style(&product.product_id).cyan()
            );
            println!("{}: {}", style("Name").bold(), style(&product.name).yellow());
            println!("{}: {}", style("Transport").bold(), product.transport);
            println!("{}: {}", style("Type").bold(), product.product_type);
            let qty = if product.quantity == 0 {
                style(product.quantity.to_string()).red()
            } else {
                style(product.quantity.to_string()).green()
            };
            println!("{}: {}", style("Quantity").bold(), qty);
            println!("{}: {}", style("From").bold(), product.from);
            println!("{}: {}", style("To").bold(), product.to);
            println!("{}", style("─".repeat(60)).dim());

            if !product.description.is_empty() {
                println!();
                println!("{}", style("Description:").bold());
                println!("{}", product.description);
            }
            if !product.remarks.is_empty() {
                println!();
                println!("{}", style("Remarks:").bold());
                println!("{}", product.remarks);
            }

            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {}", style("Key").dim(), product.key);
        }
    }

    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let products = load_products(&store)?;
    let product = resolve_product(&products, &args.id)?;

    if !args.yes {
        println!(
            "Delete {} ({}, qty {})? This cannot be undone.",
            style(&product.product_id).cyan(),
            product.name,
            product.quantity
        );
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Delete product")
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store
        .delete_product(&product.key)
        .map_err(|e| miette::miette!("Error deleting product: {}", e))?;

    if !global.quiet {
        println!(
            "{} Deleted product {}",
            style("✓").green(),
            style(&product.product_id).cyan()
        );
    }
    Ok(())
}

fn run_set_qty(args: SetQtyArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let products = load_products(&store)?;
    let product = resolve_product(&products, &args.id)?;

    store
        .update_quantity(&product.key, args.quantity)
        .map_err(|e| miette::miette!("Error updating quantity: {}", e))?;

    if !global.quiet {
        println!(
            "{} {} quantity {} → {}",
            style("✓").green(),
            style(&product.product_id).cyan(),
            product.quantity,
            style(args.quantity).yellow()
        );
    }
    Ok(())
}

fn run_codes(args: CodesArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let store = open_store(&config)?;
    let products = load_products(&store)?;
    let product = resolve_product(&products, &args.id)?;

    let stem = sanitize_file_stem(&product.product_id);
    let qr_path = args.out_dir.join(format!("{}-qr.svg", stem));
    let barcode_path = args.out_dir.join(format!("{}-barcode.svg", stem));

    write_output_file(&qr_path, &qr_svg(&product.product_id))?;
    write_output_file(&barcode_path, &barcode_svg(&product.product_id))?;

    if !global.quiet {
        println!(
            "{} Wrote codes for {}",
            style("✓").green(),
            style(&product.product_id).cyan()
        );
        println!("   {}", style(qr_path.display()).dim());
        println!("   {}", style(barcode_path.display()).dim());
    }
    Ok(())
}

/// Keep product codes usable as file names
fn sanitize_file_stem(code: &str) -> String {
    code.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("PRD-0001"), "PRD-0001");
        assert_eq!(sanitize_file_stem("a/b c"), "a_b_c");
    }
}
