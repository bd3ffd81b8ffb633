// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Client-side view of the invoice collection.
//!
//! `InvoiceCollection` owns the current page, filters, selection and last summary
//! for one session. The server stays the source of truth: every mutation is
//! followed by a full re-fetch of the page and the summary instead of patching
//! local state.
//!
//! Selection is independent of pagination, but selection aggregates only see
//! invoices on the currently loaded page. A selected id whose page is not loaded
//! contributes nothing to `selected_total` until that page is fetched again.
//!
//! List and summary requests carry sequence tags. A response that arrives after a
//! newer request for the same field was issued is dropped.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::client::{InvoiceApi, UploadFile, check_voucher_request};
use crate::error::{Applied, InvoiceError, Result};
use crate::models::{
    GenerateVouchersRequest, Invoice, InvoicePage, InvoicePatch, ListQuery, SummaryResponse,
    UploadResponse, VoucherBatch,
};
use crate::utils::export_file_name;
use crate::vouchers::ensure_balanced;

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionState {
    items: Vec<Invoice>,
    total: u64,
    page: u32,
    size: u32,
    category: Option<String>,
    anomaly_only: bool,
    selected_ids: BTreeSet<String>,
    summary: Option<SummaryResponse>,
}

impl CollectionState {
    fn new(size: u32) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            size,
            category: None,
            anomaly_only: false,
            selected_ids: BTreeSet::new(),
            summary: None,
        }
    }

    pub fn items(&self) -> &[Invoice] {
        &self.items
    }

    /// Matching count reported by the server for the current filter.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn page_count(&self) -> u64 {
        self.total.div_ceil(u64::from(self.size.max(1)))
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn anomaly_only(&self) -> bool {
        self.anomaly_only
    }

    pub fn selected_ids(&self) -> &BTreeSet<String> {
        &self.selected_ids
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_ids.contains(id)
    }

    pub fn summary(&self) -> Option<&SummaryResponse> {
        self.summary.as_ref()
    }

    /// Loaded invoices that are selected, in page order.
    pub fn selected_invoices(&self) -> Vec<&Invoice> {
        self.items
            .iter()
            .filter(|inv| self.selected_ids.contains(&inv.id))
            .collect()
    }

    pub fn selected_total(&self) -> Decimal {
        self.selected_invoices()
            .iter()
            .map(|inv| inv.total_amount)
            .sum()
    }

    pub fn selected_tax(&self) -> Decimal {
        self.selected_invoices().iter().map(|inv| inv.tax_amount).sum()
    }

    fn query(&self) -> ListQuery {
        ListQuery {
            page: Some(self.page),
            size: Some(self.size),
            category: self.category.clone(),
            anomaly_only: Some(self.anomaly_only),
        }
    }
}

#[derive(Debug, Default)]
struct RequestSeq {
    issued: u64,
}

impl RequestSeq {
    fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn is_latest(&self, tag: u64) -> bool {
        tag == self.issued
    }
}

/// Holds the loading counter up while alive, whichever way the operation ends.
#[derive(Debug)]
struct LoadingGuard(Arc<AtomicU32>);

impl LoadingGuard {
    fn enter(counter: &Arc<AtomicU32>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An issued list request. Hand it back to `finish_fetch_invoices` with the
/// response; the collection counts as loading until it is finished or dropped.
#[must_use]
#[derive(Debug)]
pub struct FetchTicket {
    seq: u64,
    query: ListQuery,
    _loading: LoadingGuard,
}

impl FetchTicket {
    pub fn query(&self) -> &ListQuery {
        &self.query
    }
}

#[must_use]
#[derive(Debug)]
pub struct SummaryTicket {
    seq: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoucherOptions {
    pub voucher_type: Option<String>,
    pub maker: Option<String>,
    pub department: Option<String>,
}

/// Receives export payloads; where they end up is the sink's business.
#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn save(&self, file_name: &str, payload: Vec<u8>) -> Result<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ExportSink for DirectorySink {
    async fn save(&self, file_name: &str, payload: Vec<u8>) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, payload).await?;
        Ok(path)
    }
}

pub struct InvoiceCollection<A> {
    api: A,
    state: CollectionState,
    loading: Arc<AtomicU32>,
    list_seq: RequestSeq,
    summary_seq: RequestSeq,
}

impl<A: InvoiceApi> InvoiceCollection<A> {
    pub fn new(api: A, page_size: u32) -> Self {
        Self {
            api,
            state: CollectionState::new(page_size),
            loading: Arc::new(AtomicU32::new(0)),
            list_seq: RequestSeq::default(),
            summary_seq: RequestSeq::default(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn state(&self) -> &CollectionState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    // ---- list / summary -------------------------------------------------

    /// Tag a list request for the current page and filters.
    pub fn begin_fetch_invoices(&mut self) -> FetchTicket {
        FetchTicket {
            seq: self.list_seq.issue(),
            query: self.state.query(),
            _loading: LoadingGuard::enter(&self.loading),
        }
    }

    /// Apply a list response. Returns `Ok(false)` when a newer request has been
    /// issued since, in which case the response is dropped. On failure `items`
    /// and `total` keep their previous values.
    pub fn finish_fetch_invoices(
        &mut self,
        ticket: FetchTicket,
        result: Result<InvoicePage>,
    ) -> Result<bool> {
        if !self.list_seq.is_latest(ticket.seq) {
            tracing::debug!(
                seq = ticket.seq,
                latest = self.list_seq.issued,
                "dropping superseded invoice list response"
            );
            return Ok(false);
        }
        let page = result?;
        self.state.items = page.items;
        self.state.total = page.total;
        Ok(true)
    }

    pub async fn fetch_invoices(&mut self) -> Result<()> {
        let ticket = self.begin_fetch_invoices();
        let result = self.api.list(ticket.query()).await;
        self.finish_fetch_invoices(ticket, result).map(|_| ())
    }

    pub fn begin_fetch_summary(&mut self) -> SummaryTicket {
        SummaryTicket {
            seq: self.summary_seq.issue(),
        }
    }

    pub fn finish_fetch_summary(
        &mut self,
        ticket: SummaryTicket,
        result: Result<SummaryResponse>,
    ) -> Result<bool> {
        if !self.summary_seq.is_latest(ticket.seq) {
            tracing::debug!(seq = ticket.seq, "dropping superseded summary response");
            return Ok(false);
        }
        self.state.summary = Some(result?);
        Ok(true)
    }

    pub async fn fetch_summary(&mut self) -> Result<()> {
        let ticket = self.begin_fetch_summary();
        let result = self.api.summary().await;
        self.finish_fetch_summary(ticket, result).map(|_| ())
    }

    // ---- filters and paging ----------------------------------------------

    /// Switch the category filter and rewind to page 1. Items already loaded
    /// stay visible until the returned request is finished.
    pub fn apply_category_filter(&mut self, category: Option<String>) -> FetchTicket {
        self.state.category = category.filter(|c| !c.is_empty());
        self.state.page = 1;
        self.begin_fetch_invoices()
    }

    pub fn apply_anomaly_only(&mut self, anomaly_only: bool) -> FetchTicket {
        self.state.anomaly_only = anomaly_only;
        self.state.page = 1;
        self.begin_fetch_invoices()
    }

    pub async fn set_category_filter(&mut self, category: Option<String>) -> Result<()> {
        let ticket = self.apply_category_filter(category);
        let result = self.api.list(ticket.query()).await;
        self.finish_fetch_invoices(ticket, result).map(|_| ())
    }

    pub async fn set_anomaly_only(&mut self, anomaly_only: bool) -> Result<()> {
        let ticket = self.apply_anomaly_only(anomaly_only);
        let result = self.api.list(ticket.query()).await;
        self.finish_fetch_invoices(ticket, result).map(|_| ())
    }

    pub fn apply_page(&mut self, page: u32) -> Result<FetchTicket> {
        if page == 0 {
            return Err(InvoiceError::validation("pages are numbered from 1"));
        }
        self.state.page = page;
        Ok(self.begin_fetch_invoices())
    }

    pub async fn set_page(&mut self, page: u32) -> Result<()> {
        let ticket = self.apply_page(page)?;
        let result = self.api.list(ticket.query()).await;
        self.finish_fetch_invoices(ticket, result).map(|_| ())
    }

    // ---- mutations ---------------------------------------------------------

    /// Upload documents, then re-fetch page and summary. Nothing from the upload
    /// response is written into local state.
    pub async fn upload_files(
        &mut self,
        files: Vec<UploadFile>,
        reimbursement_person: Option<String>,
    ) -> Result<UploadResponse> {
        let _loading = LoadingGuard::enter(&self.loading);
        let response = self.api.upload(files, reimbursement_person).await?;
        tracing::info!(
            task_id = %response.task_id,
            processed = response.processed,
            total = response.total_count,
            "upload accepted"
        );
        match self.reconcile().await {
            Ok(()) => Ok(response),
            Err(err) => Err(InvoiceError::stale(Applied::Upload(response), err)),
        }
    }

    /// Delete one invoice and re-fetch. The id leaves the selection before the
    /// call is made, so it is gone from the selection even if the delete fails.
    pub async fn delete_invoice(&mut self, id: &str) -> Result<()> {
        let _loading = LoadingGuard::enter(&self.loading);
        self.state.selected_ids.remove(id);
        self.api.delete(id).await?;
        tracing::info!(id, "invoice deleted");
        self.reconcile()
            .await
            .map_err(|err| InvoiceError::stale(Applied::Delete(id.to_string()), err))
    }

    pub async fn update_invoice(&mut self, id: &str, patch: &InvoicePatch) -> Result<Invoice> {
        let _loading = LoadingGuard::enter(&self.loading);
        let updated = self.api.update(id, patch).await?;
        tracing::info!(id, "invoice updated");
        match self.reconcile().await {
            Ok(()) => Ok(updated),
            Err(err) => Err(InvoiceError::stale(Applied::Update(Box::new(updated)), err)),
        }
    }

    /// Both re-fetches are attempted; the first failure is returned. Callers wrap
    /// it in `Stale` together with what the server already accepted.
    async fn reconcile(&mut self) -> Result<()> {
        let listed = self.fetch_invoices().await;
        let summarized = self.fetch_summary().await;
        listed.and(summarized).inspect_err(|err| {
            tracing::warn!(error = %err, "reconciliation after mutation failed");
        })
    }

    // ---- selection ---------------------------------------------------------

    /// Returns whether `id` is selected afterwards.
    pub fn toggle_select(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.state.selected_ids.remove(&id) {
            false
        } else {
            self.state.selected_ids.insert(id);
            true
        }
    }

    /// Selection becomes exactly the ids on the loaded page.
    pub fn select_all(&mut self) {
        self.state.selected_ids = self.state.items.iter().map(|inv| inv.id.clone()).collect();
    }

    pub fn clear_selection(&mut self) {
        self.state.selected_ids.clear();
    }

    pub fn selected_invoices(&self) -> Vec<&Invoice> {
        self.state.selected_invoices()
    }

    pub fn selected_total(&self) -> Decimal {
        self.state.selected_total()
    }

    pub fn selected_tax(&self) -> Decimal {
        self.state.selected_tax()
    }

    // ---- export and vouchers -------------------------------------------

    pub async fn export_excel<S>(&self, sink: &S) -> Result<PathBuf>
    where
        S: ExportSink + ?Sized,
    {
        let payload = self.api.export().await?;
        let file_name = export_file_name(Local::now().date_naive());
        let bytes = payload.len();
        let path = sink.save(&file_name, payload).await?;
        tracing::info!(path = %path.display(), bytes, "export saved");
        Ok(path)
    }

    /// Ask the service for a voucher batch and refuse it unless debit equals credit.
    pub async fn generate_vouchers(
        &self,
        invoice_ids: Vec<String>,
        voucher_date: NaiveDate,
        options: VoucherOptions,
    ) -> Result<VoucherBatch> {
        let request = GenerateVouchersRequest {
            invoice_ids,
            voucher_date,
            voucher_type: options.voucher_type,
            maker: options.maker,
            department: options.department,
        };
        check_voucher_request(&request)?;
        let batch = self.api.generate_vouchers(&request).await?;
        ensure_balanced(batch)
    }

    /// Vouchers for every selected id, loaded on the current page or not;
    /// the service resolves the ids itself.
    pub async fn generate_vouchers_for_selection(
        &self,
        voucher_date: NaiveDate,
        options: VoucherOptions,
    ) -> Result<VoucherBatch> {
        let ids = self.state.selected_ids.iter().cloned().collect();
        self.generate_vouchers(ids, voucher_date, options).await
    }
}
