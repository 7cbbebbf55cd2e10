use crate::error::CliError;
use clap::Parser;
use commands::Commands;
use connectors::file::csv::source::CsvSource;
use engine_core::{
    reader::{CursorFallback, KeysetReader},
    settings::PaginationSettings,
};
use futures_util::{StreamExt, pin_mut};
use model::pagination::{
    order::OrderSpec,
    page::{Page, PageSizePolicy},
    token::CursorToken,
};
use planner::query::{
    ast::common::TableRef, dialect::dialect_from_name, keyset::page_select, renderer::render_with,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;

#[derive(Parser)]
#[command(
    name = "keyset",
    version = "0.1.0",
    about = "Keyset pagination over CSV files and SQL tables"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Pagination settings JSON file; defaults come from KEYSET_* environment variables"
    )]
    settings: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let policy = load_settings(cli.settings.as_deref()).await?.page_size_policy();

    match cli.command {
        Commands::Page {
            file,
            order,
            per_page,
            cursor,
            fallback_first_page,
        } => {
            let page = build_page(&order, per_page, policy)?;
            let source = Arc::new(CsvSource::open(&file)?);

            let mut reader = match cursor {
                Some(token) => {
                    let fallback = if fallback_first_page {
                        CursorFallback::FirstPage
                    } else {
                        CursorFallback::Reject
                    };
                    KeysetReader::resume(source, page, &token, fallback)?
                }
                None => KeysetReader::new(source, page)?,
            };

            let result = reader.next_page().await?;
            output::print_page(&result, reader.page().order_by())?;
        }
        Commands::Scan {
            file,
            order,
            per_page,
        } => {
            let page = build_page(&order, per_page, policy)?;
            let source = Arc::new(CsvSource::open(&file)?);
            info!("Scanning {file} ordered by {}", page.order_by());

            let pages = KeysetReader::new(source, page)?.into_pages();
            pin_mut!(pages);

            let mut number = 0;
            let mut total = 0;
            while let Some(result) = pages.next().await {
                let result = result?;
                number += 1;
                total += result.row_count;
                output::print_page_summary(number, &result);
            }
            println!("{total} rows in {number} pages");
        }
        Commands::Sql {
            table,
            order,
            per_page,
            cursor,
            dialect,
        } => {
            let dialect =
                dialect_from_name(&dialect).ok_or(CliError::UnsupportedDialect(dialect))?;
            let page = build_page(&order, per_page, policy)?;
            let lower_bounds = cursor
                .map(|token| CursorToken::decode(&token, page.order_by()))
                .transpose()?;
            let page = page.with_lower_bounds(lower_bounds);

            let select = page_select(table_ref(&table), &page)?;
            let (sql, params) = render_with(&select, dialect.as_ref());
            output::print_sql(&sql, &params)?;
        }
    }

    Ok(())
}

async fn load_settings(path: Option<&str>) -> Result<PaginationSettings, CliError> {
    match path {
        Some(path) => {
            let text = tokio::fs::read_to_string(path).await?;
            Ok(PaginationSettings::from_json(&text)?)
        }
        None => Ok(PaginationSettings::from_env()?),
    }
}

fn build_page(order: &str, per_page: Option<i64>, policy: PageSizePolicy) -> Result<Page, CliError> {
    let order: OrderSpec = order.parse()?;
    // A non-positive size means "use the policy default"
    Ok(Page::new(order)
        .with_policy(policy)
        .with_per_page(per_page.unwrap_or(0)))
}

fn table_ref(name: &str) -> TableRef {
    match name.split_once('.') {
        Some((schema, table)) => TableRef {
            schema: Some(schema.to_string()),
            name: table.to_string(),
        },
        None => TableRef {
            schema: None,
            name: name.to_string(),
        },
    }
}
