// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::client::InvoiceApi;
use crate::collection::InvoiceCollection;
use crate::models::SummaryResponse;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::{Context, Result};

pub async fn handle<A: InvoiceApi>(
    collection: &mut InvoiceCollection<A>,
    sub: &clap::ArgMatches,
) -> Result<()> {
    collection.fetch_summary().await?;
    let summary = collection
        .state()
        .summary()
        .context("Service returned no summary")?;
    if maybe_print_json(sub.get_flag("json"), summary)? {
        return Ok(());
    }
    println!(
        "{}",
        pretty_table(&["Category", "Count", "Amount", "Tax"], summary_rows(summary))
    );
    println!(
        "Total: {} invoices, amount {}, tax {}, {} flagged",
        summary.total_count,
        fmt_money(&summary.total_amount),
        fmt_money(&summary.total_tax),
        summary.anomaly_count
    );
    Ok(())
}

pub fn summary_rows(summary: &SummaryResponse) -> Vec<Vec<String>> {
    summary
        .by_category
        .iter()
        .map(|c| {
            vec![
                c.category.clone(),
                c.count.to_string(),
                fmt_money(&c.amount),
                fmt_money(&c.tax_amount),
            ]
        })
        .collect()
}
