// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::client::InvoiceApi;
use crate::collection::{DirectorySink, InvoiceCollection};
use crate::config::Config;
use anyhow::Result;
use std::path::PathBuf;

pub async fn handle<A: InvoiceApi>(
    collection: &InvoiceCollection<A>,
    cfg: &Config,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let dir = sub
        .get_one::<PathBuf>("out-dir")
        .cloned()
        .or_else(|| cfg.export_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let path = collection.export_excel(&DirectorySink::new(dir)).await?;
    println!("Exported invoices to {}", path.display());
    Ok(())
}
