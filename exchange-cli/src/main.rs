use anyhow::{Context, Result};
use clap::Parser;
use exchange_tester::{format_xml, ExchangeSession};

mod cli;
mod error;

use crate::cli::{Cli, Mode};
use crate::error::AppError;

fn main() {
    let args = Cli::parse();
    init_logger(args.verbose);

    match run(&args) {
        Ok(()) => log::info!("Exchange complete"),
        Err(e) => {
            log::error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = format!("warn,exchange_tester={0},exchange_cli={0}", level);
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(filter),
    )
    .init();
}

fn run(args: &Cli) -> Result<()> {
    let mut session =
        ExchangeSession::new(args.config()).map_err(AppError::from)?;

    match args.mode {
        Mode::Catalog => {
            let catalog = args
                .catalog
                .as_ref()
                .ok_or(AppError::CatalogNotProvided)?;
            session
                .import_catalog_sync(catalog)
                .map_err(AppError::from)
                .context("Catalog import failed")?;
        }
        Mode::Sale => {
            if let Some(catalog) = &args.catalog {
                log::warn!(
                    "Catalog {} is ignored in sale mode",
                    catalog.display()
                );
            }
            let orders = session
                .export_orders_sync()
                .map_err(AppError::from)
                .context("Orders export failed")?;
            print_orders(&orders);
        }
    }

    Ok(())
}

fn print_orders(orders: &str) {
    match format_xml(orders) {
        Ok(formatted) => print!("{}", formatted),
        Err(e) => {
            log::warn!("Orders are not well-formed XML: {}", e);
            println!("{}", orders);
        }
    }
}
