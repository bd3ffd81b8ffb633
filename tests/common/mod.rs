// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use invoicedesk::client::{InvoiceApi, UploadFile, check_upload, check_voucher_request};
use invoicedesk::error::{InvoiceError, Result};
use invoicedesk::models::{
    CategorySummary, Direction, GenerateVouchersRequest, Invoice, InvoicePage, InvoicePatch,
    ListQuery, SummaryResponse, UploadResponse, VoucherBatch, VoucherEntry,
};

pub fn stamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 1)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap()
}

/// Amounts in cents.
pub fn invoice(id: &str, category: &str, amount: i64, tax: i64) -> Invoice {
    Invoice {
        id: id.to_string(),
        invoice_no: Some(format!("NO-{id}")),
        invoice_date: NaiveDate::from_ymd_opt(2025, 2, 14),
        invoice_type: Some("增值税普通发票".to_string()),
        seller_name: Some("Harbor Supplies".to_string()),
        seller_tax_no: None,
        amount: Decimal::new(amount, 2),
        tax_amount: Decimal::new(tax, 2),
        total_amount: Decimal::new(amount + tax, 2),
        expense_category: Some(category.to_string()),
        reimbursement_person: Some("Lin".to_string()),
        confidence: 0.95,
        anomaly_flag: Some("normal".to_string()),
        anomaly_reason: None,
        image_path: None,
        created_at: stamp(),
        updated_at: stamp(),
    }
}

pub fn flagged(mut inv: Invoice, reason: &str) -> Invoice {
    inv.anomaly_flag = Some("amount".to_string());
    inv.anomaly_reason = Some(reason.to_string());
    inv
}

pub fn entry(direction: Direction, account: &str, amount: Decimal) -> VoucherEntry {
    VoucherEntry {
        entry_date: "2025-03-31".to_string(),
        voucher_type: "转".to_string(),
        sequence: 1,
        voucher_no: "1".to_string(),
        preparer: "系统".to_string(),
        attachments: 1,
        fiscal_year: "202503".to_string(),
        account_code: account.to_string(),
        account_name: format!("account {account}"),
        memo: "报销2025-03费用".to_string(),
        direction,
        amount,
        currency: "人民币".to_string(),
        exchange_rate: Decimal::ONE,
        original_amount: amount,
        quantity: None,
        unit_price: None,
        settlement_method: None,
        settlement_date: None,
        settlement_ref: None,
        business_date: Some("2025-03-31".to_string()),
        employee_id: None,
        employee_name: Some("Lin".to_string()),
        counterparty_id: None,
        counterparty_name: None,
        item_id: None,
        item_name: None,
        department: None,
        project: None,
    }
}

/// In-memory stand-in for the invoice service, following its filtering,
/// paging and summary rules. Records call counts and can be told to fail.
#[derive(Debug, Default)]
pub struct FakeInvoiceService {
    invoices: RwLock<Vec<Invoice>>,
    queries: RwLock<Vec<ListQuery>>,
    canned_batch: RwLock<Option<VoucherBatch>>,
    pub list_calls: AtomicUsize,
    pub summary_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub fail_list: AtomicBool,
    pub fail_summary: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl FakeInvoiceService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_invoices(invoices: Vec<Invoice>) -> Self {
        let svc = Self::new();
        *svc.invoices.write().await = invoices;
        svc
    }

    pub async fn insert(&self, invoice: Invoice) {
        self.invoices.write().await.push(invoice);
    }

    pub async fn ids(&self) -> Vec<String> {
        self.invoices.read().await.iter().map(|i| i.id.clone()).collect()
    }

    pub async fn last_query(&self) -> Option<ListQuery> {
        self.queries.read().await.last().cloned()
    }

    pub async fn set_voucher_batch(&self, batch: VoucherBatch) {
        *self.canned_batch.write().await = Some(batch);
    }

    pub fn lists(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn summaries(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InvoiceApi for FakeInvoiceService {
    async fn upload(
        &self,
        files: Vec<UploadFile>,
        reimbursement_person: Option<String>,
    ) -> Result<UploadResponse> {
        check_upload(&files)?;
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        let total = files.len() as u32;
        let mut store = self.invoices.write().await;
        for file in &files {
            let stem = file.file_name.split('.').next().unwrap_or_default();
            let mut inv = invoice(stem, "office", 10000, 1300);
            inv.reimbursement_person = reimbursement_person.clone();
            store.push(inv);
        }
        Ok(UploadResponse {
            task_id: format!("task-{}", store.len()),
            total_count: total,
            processed: total,
            message: format!("成功处理 {total}/{total} 张发票"),
        })
    }

    async fn list(&self, query: &ListQuery) -> Result<InvoicePage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.write().await.push(query.clone());
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(InvoiceError::transport("list unavailable"));
        }
        let page = query.page.unwrap_or(1);
        let size = query.size.unwrap_or(20);
        let store = self.invoices.read().await;
        let matching: Vec<&Invoice> = store
            .iter()
            .filter(|inv| match &query.category {
                Some(c) => inv.expense_category.as_deref() == Some(c.as_str()),
                None => true,
            })
            .filter(|inv| !query.anomaly_only.unwrap_or(false) || inv.is_anomalous())
            .collect();
        let items = matching
            .iter()
            .skip(((page - 1) * size) as usize)
            .take(size as usize)
            .map(|inv| (*inv).clone())
            .collect();
        Ok(InvoicePage {
            items,
            total: matching.len() as u64,
            page,
            size,
        })
    }

    async fn summary(&self) -> Result<SummaryResponse> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_summary.load(Ordering::SeqCst) {
            return Err(InvoiceError::transport("summary unavailable"));
        }
        let store = self.invoices.read().await;
        let mut by_category: BTreeMap<String, CategorySummary> = BTreeMap::new();
        for inv in store.iter() {
            let name = inv
                .expense_category
                .clone()
                .unwrap_or_else(|| "其他".to_string());
            let slot = by_category.entry(name.clone()).or_insert(CategorySummary {
                category: name,
                count: 0,
                amount: Decimal::ZERO,
                tax_amount: Decimal::ZERO,
            });
            slot.count += 1;
            slot.amount += inv.amount;
            slot.tax_amount += inv.tax_amount;
        }
        Ok(SummaryResponse {
            by_category: by_category.into_values().collect(),
            total_count: store.len() as u64,
            total_amount: store.iter().map(|i| i.amount).sum(),
            total_tax: store.iter().map(|i| i.tax_amount).sum(),
            anomaly_count: store.iter().filter(|i| i.is_anomalous()).count() as u64,
        })
    }

    async fn export(&self) -> Result<Vec<u8>> {
        Ok(b"PK\x03\x04invoices".to_vec())
    }

    async fn update(&self, id: &str, patch: &InvoicePatch) -> Result<Invoice> {
        let mut store = self.invoices.write().await;
        let inv = store
            .iter_mut()
            .find(|inv| inv.id == id)
            .ok_or_else(|| InvoiceError::NotFound(id.to_string()))?;
        if let Some(v) = &patch.expense_category {
            inv.expense_category = v.clone();
        }
        if let Some(v) = &patch.reimbursement_person {
            inv.reimbursement_person = v.clone();
        }
        if let Some(v) = &patch.anomaly_flag {
            inv.anomaly_flag = v.clone();
        }
        if let Some(v) = &patch.anomaly_reason {
            inv.anomaly_reason = v.clone();
        }
        Ok(inv.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(InvoiceError::transport("delete failed upstream"));
        }
        let mut store = self.invoices.write().await;
        let before = store.len();
        store.retain(|inv| inv.id != id);
        if store.len() == before {
            return Err(InvoiceError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn generate_vouchers(&self, request: &GenerateVouchersRequest) -> Result<VoucherBatch> {
        check_voucher_request(request)?;
        if let Some(batch) = self.canned_batch.read().await.clone() {
            return Ok(batch);
        }
        let store = self.invoices.read().await;
        let picked: Vec<&Invoice> = store
            .iter()
            .filter(|inv| request.invoice_ids.contains(&inv.id))
            .collect();
        if picked.is_empty() {
            return Err(InvoiceError::NotFound("no matching invoices".to_string()));
        }
        let mut vouchers: Vec<VoucherEntry> = picked
            .iter()
            .map(|inv| entry(Direction::Debit, "6602", inv.total_amount))
            .collect();
        let total: Decimal = picked.iter().map(|inv| inv.total_amount).sum();
        vouchers.push(entry(Direction::Credit, "2241", total));
        Ok(VoucherBatch {
            vouchers,
            total_debit: total,
            total_credit: total,
        })
    }
}
