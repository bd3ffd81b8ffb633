// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-session command queue.
//!
//! A spawned task owns one `InvoiceCollection` and runs commands strictly in
//! arrival order, so any number of `SessionHandle` clones can drive the same
//! session without a lock around the collection.

use chrono::NaiveDate;
use tokio::sync::{mpsc, oneshot};

use crate::client::{InvoiceApi, UploadFile};
use crate::collection::{CollectionState, InvoiceCollection, VoucherOptions};
use crate::error::{InvoiceError, Result};
use crate::models::{Invoice, InvoicePatch, UploadResponse, VoucherBatch};

const QUEUE_DEPTH: usize = 32;

type Reply<T> = oneshot::Sender<T>;

enum Command {
    FetchInvoices(Reply<Result<()>>),
    FetchSummary(Reply<Result<()>>),
    SetCategory(Option<String>, Reply<Result<()>>),
    SetAnomalyOnly(bool, Reply<Result<()>>),
    SetPage(u32, Reply<Result<()>>),
    Upload {
        files: Vec<UploadFile>,
        reimbursement_person: Option<String>,
        reply: Reply<Result<UploadResponse>>,
    },
    Update {
        id: String,
        patch: InvoicePatch,
        reply: Reply<Result<Invoice>>,
    },
    Delete(String, Reply<Result<()>>),
    ToggleSelect(String, Reply<bool>),
    SelectAll(Reply<()>),
    ClearSelection(Reply<()>),
    GenerateVouchers {
        /// `None` means the current selection.
        invoice_ids: Option<Vec<String>>,
        voucher_date: NaiveDate,
        options: VoucherOptions,
        reply: Reply<Result<VoucherBatch>>,
    },
    Snapshot(Reply<CollectionState>),
}

#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
}

/// Move `collection` onto its own task. Must be called inside a tokio runtime.
pub fn spawn_session<A>(collection: InvoiceCollection<A>) -> SessionHandle
where
    A: InvoiceApi + 'static,
{
    let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
    tokio::spawn(run(collection, rx));
    SessionHandle { tx }
}

async fn run<A: InvoiceApi>(mut collection: InvoiceCollection<A>, mut rx: mpsc::Receiver<Command>) {
    while let Some(cmd) = rx.recv().await {
        // A dropped reply receiver only means the caller stopped waiting.
        match cmd {
            Command::FetchInvoices(reply) => {
                let _ = reply.send(collection.fetch_invoices().await);
            }
            Command::FetchSummary(reply) => {
                let _ = reply.send(collection.fetch_summary().await);
            }
            Command::SetCategory(category, reply) => {
                let _ = reply.send(collection.set_category_filter(category).await);
            }
            Command::SetAnomalyOnly(flag, reply) => {
                let _ = reply.send(collection.set_anomaly_only(flag).await);
            }
            Command::SetPage(page, reply) => {
                let _ = reply.send(collection.set_page(page).await);
            }
            Command::Upload {
                files,
                reimbursement_person,
                reply,
            } => {
                let _ = reply.send(collection.upload_files(files, reimbursement_person).await);
            }
            Command::Update { id, patch, reply } => {
                let _ = reply.send(collection.update_invoice(&id, &patch).await);
            }
            Command::Delete(id, reply) => {
                let _ = reply.send(collection.delete_invoice(&id).await);
            }
            Command::ToggleSelect(id, reply) => {
                let _ = reply.send(collection.toggle_select(id));
            }
            Command::SelectAll(reply) => {
                collection.select_all();
                let _ = reply.send(());
            }
            Command::ClearSelection(reply) => {
                collection.clear_selection();
                let _ = reply.send(());
            }
            Command::GenerateVouchers {
                invoice_ids,
                voucher_date,
                options,
                reply,
            } => {
                let batch = match invoice_ids {
                    Some(ids) => collection.generate_vouchers(ids, voucher_date, options).await,
                    None => {
                        collection
                            .generate_vouchers_for_selection(voucher_date, options)
                            .await
                    }
                };
                let _ = reply.send(batch);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(collection.state().clone());
            }
        }
    }
    tracing::debug!("invoice session queue closed");
}

impl SessionHandle {
    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| InvoiceError::SessionClosed)?;
        rx.await.map_err(|_| InvoiceError::SessionClosed)
    }

    pub async fn fetch_invoices(&self) -> Result<()> {
        self.request(Command::FetchInvoices).await?
    }

    pub async fn fetch_summary(&self) -> Result<()> {
        self.request(Command::FetchSummary).await?
    }

    pub async fn set_category_filter(&self, category: Option<String>) -> Result<()> {
        self.request(|reply| Command::SetCategory(category, reply))
            .await?
    }

    pub async fn set_anomaly_only(&self, anomaly_only: bool) -> Result<()> {
        self.request(|reply| Command::SetAnomalyOnly(anomaly_only, reply))
            .await?
    }

    pub async fn set_page(&self, page: u32) -> Result<()> {
        self.request(|reply| Command::SetPage(page, reply)).await?
    }

    pub async fn upload_files(
        &self,
        files: Vec<UploadFile>,
        reimbursement_person: Option<String>,
    ) -> Result<UploadResponse> {
        self.request(|reply| Command::Upload {
            files,
            reimbursement_person,
            reply,
        })
        .await?
    }

    pub async fn update_invoice(&self, id: &str, patch: InvoicePatch) -> Result<Invoice> {
        let id = id.to_string();
        self.request(|reply| Command::Update { id, patch, reply })
            .await?
    }

    pub async fn delete_invoice(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.request(|reply| Command::Delete(id, reply)).await?
    }

    pub async fn toggle_select(&self, id: impl Into<String>) -> Result<bool> {
        let id = id.into();
        self.request(|reply| Command::ToggleSelect(id, reply)).await
    }

    pub async fn select_all(&self) -> Result<()> {
        self.request(Command::SelectAll).await
    }

    pub async fn clear_selection(&self) -> Result<()> {
        self.request(Command::ClearSelection).await
    }

    pub async fn generate_vouchers(
        &self,
        invoice_ids: Vec<String>,
        voucher_date: NaiveDate,
        options: VoucherOptions,
    ) -> Result<VoucherBatch> {
        self.request(|reply| Command::GenerateVouchers {
            invoice_ids: Some(invoice_ids),
            voucher_date,
            options,
            reply,
        })
        .await?
    }

    pub async fn generate_vouchers_for_selection(
        &self,
        voucher_date: NaiveDate,
        options: VoucherOptions,
    ) -> Result<VoucherBatch> {
        self.request(|reply| Command::GenerateVouchers {
            invoice_ids: None,
            voucher_date,
            options,
            reply,
        })
        .await?
    }

    /// Copy of the collection state as of this point in the queue.
    pub async fn snapshot(&self) -> Result<CollectionState> {
        self.request(Command::Snapshot).await
    }
}
