// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::client::{InvoiceApi, UploadFile};
use crate::collection::{CollectionState, InvoiceCollection};
use crate::error::{Applied, InvoiceError};
use crate::models::{Invoice, InvoicePatch, UploadResponse};
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

pub async fn list<A: InvoiceApi>(
    collection: &mut InvoiceCollection<A>,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let page = *sub.get_one::<u32>("page").unwrap_or(&1);
    let category = sub.get_one::<String>("category").cloned();
    let anomaly_only = sub.get_flag("anomaly-only");

    // Filter changes rewind to page 1; only the last request is sent.
    drop(collection.apply_category_filter(category));
    drop(collection.apply_anomaly_only(anomaly_only));
    let ticket = collection.apply_page(page)?;
    let result = collection.api().list(ticket.query()).await;
    collection.finish_fetch_invoices(ticket, result)?;

    // `--select` only ever adds; repeating an id keeps it selected.
    if let Some(ids) = sub.get_many::<String>("select") {
        for id in ids {
            if !collection.state().is_selected(id) {
                collection.toggle_select(id.clone());
            }
        }
    }

    let state = collection.state();
    let rows = invoice_rows(state);
    if maybe_print_json(sub.get_flag("json"), &rows)? {
        return Ok(());
    }
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                if r.selected { "*".into() } else { String::new() },
                r.id.clone(),
                r.date.clone(),
                r.seller.clone(),
                r.category.clone(),
                r.amount.clone(),
                r.tax.clone(),
                r.total.clone(),
                r.anomaly.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["", "ID", "Date", "Seller", "Category", "Amount", "Tax", "Total", "Anomaly"],
            table,
        )
    );
    println!(
        "Page {} of {} ({} invoices)",
        state.page(),
        state.page_count().max(1),
        state.total()
    );
    if !state.selected_ids().is_empty() {
        println!(
            "Selected on this page: {} invoices, total {}, tax {}",
            state.selected_invoices().len(),
            fmt_money(&state.selected_total()),
            fmt_money(&state.selected_tax())
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct InvoiceRow {
    pub selected: bool,
    pub id: String,
    pub date: String,
    pub seller: String,
    pub category: String,
    pub amount: String,
    pub tax: String,
    pub total: String,
    pub anomaly: String,
}

impl InvoiceRow {
    fn from_invoice(inv: &Invoice, selected: bool) -> Self {
        let anomaly = if inv.is_anomalous() {
            inv.anomaly_reason
                .clone()
                .or_else(|| inv.anomaly_flag.clone())
                .unwrap_or_default()
        } else {
            String::new()
        };
        Self {
            selected,
            id: inv.id.clone(),
            date: inv.invoice_date.map(|d| d.to_string()).unwrap_or_default(),
            seller: inv.seller_name.clone().unwrap_or_default(),
            category: inv.expense_category.clone().unwrap_or_default(),
            amount: fmt_money(&inv.amount),
            tax: fmt_money(&inv.tax_amount),
            total: fmt_money(&inv.total_amount),
            anomaly,
        }
    }
}

pub fn invoice_rows(state: &CollectionState) -> Vec<InvoiceRow> {
    state
        .items()
        .iter()
        .map(|inv| InvoiceRow::from_invoice(inv, state.is_selected(&inv.id)))
        .collect()
}

pub async fn upload<A: InvoiceApi>(
    collection: &mut InvoiceCollection<A>,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let paths: Vec<&PathBuf> = sub
        .get_many::<PathBuf>("files")
        .map(|v| v.collect())
        .unwrap_or_default();
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = UploadFile::from_path(path)
            .await
            .with_context(|| format!("Read {}", path.display()))?;
        files.push(file);
    }
    let person = sub.get_one::<String>("person").cloned();
    match collection.upload_files(files, person).await {
        Ok(resp) => {
            print_upload(&resp);
            Ok(())
        }
        Err(InvoiceError::Stale {
            applied: Applied::Upload(resp),
            source,
        }) => {
            print_upload(&resp);
            anyhow::bail!("Upload accepted but the invoice list could not be refreshed: {source}")
        }
        Err(err) => Err(err.into()),
    }
}

fn print_upload(resp: &UploadResponse) {
    println!(
        "Uploaded {}/{} invoices (task {}): {}",
        resp.processed, resp.total_count, resp.task_id, resp.message
    );
}

/// Build the sparse patch from `update` arguments; `--clear` wins over a value.
pub fn patch_from_matches(sub: &clap::ArgMatches) -> InvoicePatch {
    let value = |name: &str| sub.get_one::<String>(name).map(|v| Some(v.clone()));
    let mut patch = InvoicePatch {
        expense_category: value("category"),
        reimbursement_person: value("person"),
        anomaly_flag: value("anomaly-flag"),
        anomaly_reason: value("anomaly-reason"),
    };
    if let Some(fields) = sub.get_many::<String>("clear") {
        for field in fields {
            match field.as_str() {
                "category" => patch.expense_category = Some(None),
                "person" => patch.reimbursement_person = Some(None),
                "anomaly-flag" => patch.anomaly_flag = Some(None),
                "anomaly-reason" => patch.anomaly_reason = Some(None),
                _ => {}
            }
        }
    }
    patch
}

pub async fn update<A: InvoiceApi>(
    collection: &mut InvoiceCollection<A>,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let id = sub.get_one::<String>("id").unwrap();
    let patch = patch_from_matches(sub);
    if patch.is_empty() {
        anyhow::bail!("Nothing to update; pass at least one field or --clear");
    }
    let invoice = collection.update_invoice(id, &patch).await?;
    if !maybe_print_json(sub.get_flag("json"), &invoice)? {
        println!("Updated invoice {}", invoice.id);
    }
    Ok(())
}

pub async fn delete<A: InvoiceApi>(
    collection: &mut InvoiceCollection<A>,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let id = sub.get_one::<String>("id").unwrap();
    collection.delete_invoice(id).await?;
    println!("Deleted invoice {}", id);
    Ok(())
}
