// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::client::InvoiceApi;
use crate::collection::{InvoiceCollection, VoucherOptions};
use crate::config::Config;
use crate::error::InvoiceError;
use crate::models::{Direction, VoucherEntry};
use crate::utils::{fmt_money, maybe_print_json, parse_date, pretty_table};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub async fn handle<A: InvoiceApi>(
    collection: &InvoiceCollection<A>,
    cfg: &Config,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let ids: Vec<String> = sub
        .get_many::<String>("ids")
        .map(|v| v.cloned().collect())
        .unwrap_or_default();
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let options = voucher_options(cfg, sub);

    let batch = match collection.generate_vouchers(ids, date, options).await {
        Ok(batch) => batch,
        Err(InvoiceError::UnbalancedVoucher {
            total_debit,
            total_credit,
            vouchers,
        }) => {
            eprintln!("{}", voucher_table(&vouchers));
            anyhow::bail!(
                "Service produced an unbalanced batch (debit {}, credit {}); nothing written",
                fmt_money(&total_debit),
                fmt_money(&total_credit)
            );
        }
        Err(err) => return Err(err.into()),
    };

    if let Some(path) = sub.get_one::<PathBuf>("csv") {
        write_csv(path, &batch.vouchers)?;
        println!("Wrote {} entries to {}", batch.vouchers.len(), path.display());
    }
    if maybe_print_json(sub.get_flag("json"), &batch)? {
        return Ok(());
    }
    println!("{}", voucher_table(&batch.vouchers));
    println!(
        "Debit {} = Credit {}",
        fmt_money(&batch.total_debit),
        fmt_money(&batch.total_credit)
    );
    Ok(())
}

/// Command line values first, then the configured defaults.
pub fn voucher_options(cfg: &Config, sub: &clap::ArgMatches) -> VoucherOptions {
    let pick = |name: &str, fallback: &Option<String>| {
        sub.get_one::<String>(name).cloned().or_else(|| fallback.clone())
    };
    VoucherOptions {
        voucher_type: pick("type", &cfg.voucher_type),
        maker: pick("maker", &cfg.maker),
        department: pick("department", &cfg.department),
    }
}

/// CSV with the accounting system's import headers, one row per entry.
pub fn write_csv(path: &Path, entries: &[VoucherEntry]) -> Result<()> {
    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("Create {}", path.display()))?;
    for entry in entries {
        wtr.serialize(entry)?;
    }
    wtr.flush()?;
    Ok(())
}

fn voucher_table(entries: &[VoucherEntry]) -> comfy_table::Table {
    let rows = entries
        .iter()
        .map(|v| {
            let (debit, credit) = match v.direction {
                Direction::Debit => (fmt_money(&v.amount), String::new()),
                Direction::Credit => (String::new(), fmt_money(&v.amount)),
            };
            vec![
                v.voucher_no.clone(),
                v.account_code.clone(),
                v.account_name.clone(),
                v.memo.clone(),
                debit,
                credit,
                v.attachments.to_string(),
            ]
        })
        .collect();
    pretty_table(
        &["No.", "Account", "Name", "Memo", "Debit", "Credit", "Attachments"],
        rows,
    )
}
