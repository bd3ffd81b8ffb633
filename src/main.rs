// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use invoicedesk::client::HttpInvoiceClient;
use invoicedesk::collection::InvoiceCollection;
use invoicedesk::{cli, commands, config, logging};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let cfg = config::load()?;
    let client = HttpInvoiceClient::from_config(&cfg)?;
    let mut collection = InvoiceCollection::new(client, cfg.page_size);

    match matches.subcommand() {
        Some(("list", sub)) => commands::invoices::list(&mut collection, sub).await?,
        Some(("summary", sub)) => commands::summary::handle(&mut collection, sub).await?,
        Some(("upload", sub)) => commands::invoices::upload(&mut collection, sub).await?,
        Some(("update", sub)) => commands::invoices::update(&mut collection, sub).await?,
        Some(("delete", sub)) => commands::invoices::delete(&mut collection, sub).await?,
        Some(("export", sub)) => commands::exporter::handle(&collection, &cfg, sub).await?,
        Some(("vouchers", sub)) => commands::vouchers::handle(&collection, &cfg, sub).await?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
