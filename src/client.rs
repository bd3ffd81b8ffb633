// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Adapter over the remote invoice service.
//!
//! `InvoiceApi` is the seam the orchestrator is written against; `HttpInvoiceClient`
//! is the REST implementation. Neither keeps any state between calls.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode, Url};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{InvoiceError, Result};
use crate::models::{
    GenerateVouchersRequest, Invoice, InvoicePage, InvoicePatch, ListQuery, SummaryResponse,
    UploadResponse, VoucherBatch,
};
use crate::utils::http_client;

/// Largest batch the service accepts in one upload.
pub const MAX_FILES_PER_BATCH: usize = 200;

/// One document to hand to the extraction service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                InvoiceError::validation(format!("'{}' has no file name", path.display()))
            })?;
        Ok(Self { file_name, bytes })
    }
}

#[async_trait]
pub trait InvoiceApi: Send + Sync {
    async fn upload(
        &self,
        files: Vec<UploadFile>,
        reimbursement_person: Option<String>,
    ) -> Result<UploadResponse>;

    async fn list(&self, query: &ListQuery) -> Result<InvoicePage>;

    /// Aggregate over the whole collection, not just one page.
    async fn summary(&self) -> Result<SummaryResponse>;

    /// Opaque spreadsheet bytes.
    async fn export(&self) -> Result<Vec<u8>>;

    async fn update(&self, id: &str, patch: &InvoicePatch) -> Result<Invoice>;

    /// Not idempotent: deleting an already deleted id fails with `NotFound`.
    async fn delete(&self, id: &str) -> Result<()>;

    async fn generate_vouchers(&self, request: &GenerateVouchersRequest) -> Result<VoucherBatch>;
}

#[async_trait]
impl<T: InvoiceApi + ?Sized> InvoiceApi for Arc<T> {
    async fn upload(
        &self,
        files: Vec<UploadFile>,
        reimbursement_person: Option<String>,
    ) -> Result<UploadResponse> {
        (**self).upload(files, reimbursement_person).await
    }

    async fn list(&self, query: &ListQuery) -> Result<InvoicePage> {
        (**self).list(query).await
    }

    async fn summary(&self) -> Result<SummaryResponse> {
        (**self).summary().await
    }

    async fn export(&self) -> Result<Vec<u8>> {
        (**self).export().await
    }

    async fn update(&self, id: &str, patch: &InvoicePatch) -> Result<Invoice> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        (**self).delete(id).await
    }

    async fn generate_vouchers(&self, request: &GenerateVouchersRequest) -> Result<VoucherBatch> {
        (**self).generate_vouchers(request).await
    }
}

/// Input checks shared by every `InvoiceApi` implementation.
pub fn check_upload(files: &[UploadFile]) -> Result<()> {
    if files.is_empty() {
        return Err(InvoiceError::validation("no files supplied for upload"));
    }
    if files.len() > MAX_FILES_PER_BATCH {
        return Err(InvoiceError::validation(format!(
            "at most {} files per upload, got {}",
            MAX_FILES_PER_BATCH,
            files.len()
        )));
    }
    Ok(())
}

pub fn check_voucher_request(request: &GenerateVouchersRequest) -> Result<()> {
    if request.invoice_ids.is_empty() {
        return Err(InvoiceError::validation(
            "voucher generation needs at least one invoice id",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct HttpInvoiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpInvoiceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = http_client(timeout)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg.base_url.clone(), cfg.timeout())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn invoice_url(&self, id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url("invoices"))
            .map_err(|e| InvoiceError::validation(format!("invalid base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| InvoiceError::validation("base url cannot carry a path"))?
            .push(id);
        Ok(url)
    }
}

#[async_trait]
impl InvoiceApi for HttpInvoiceClient {
    async fn upload(
        &self,
        files: Vec<UploadFile>,
        reimbursement_person: Option<String>,
    ) -> Result<UploadResponse> {
        check_upload(&files)?;
        let count = files.len();
        let mut form = Form::new();
        for file in files {
            let mime = mime_guess::from_path(&file.file_name).first_or_octet_stream();
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(mime.essence_str())?;
            form = form.part("files", part);
        }
        if let Some(person) = reimbursement_person {
            form = form.text("reimbursement_person", person);
        }
        tracing::debug!(files = count, "POST /invoices/upload");
        let resp = self
            .http
            .post(self.url("invoices/upload"))
            .multipart(form)
            .send()
            .await?;
        Ok(check_status(resp, "upload").await?.json().await?)
    }

    async fn list(&self, query: &ListQuery) -> Result<InvoicePage> {
        tracing::debug!(?query, "GET /invoices");
        let resp = self
            .http
            .get(self.url("invoices"))
            .query(query)
            .send()
            .await?;
        Ok(check_status(resp, "invoice list").await?.json().await?)
    }

    async fn summary(&self) -> Result<SummaryResponse> {
        tracing::debug!("GET /invoices/summary");
        let resp = self.http.get(self.url("invoices/summary")).send().await?;
        Ok(check_status(resp, "summary").await?.json().await?)
    }

    async fn export(&self) -> Result<Vec<u8>> {
        tracing::debug!("GET /invoices/export");
        let resp = self.http.get(self.url("invoices/export")).send().await?;
        let bytes = check_status(resp, "export").await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn update(&self, id: &str, patch: &InvoicePatch) -> Result<Invoice> {
        tracing::debug!(id, "PATCH /invoices/{{id}}");
        let resp = self
            .http
            .patch(self.invoice_url(id)?)
            .json(patch)
            .send()
            .await?;
        Ok(check_status(resp, id).await?.json().await?)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        tracing::debug!(id, "DELETE /invoices/{{id}}");
        let resp = self.http.delete(self.invoice_url(id)?).send().await?;
        check_status(resp, id).await?;
        Ok(())
    }

    async fn generate_vouchers(&self, request: &GenerateVouchersRequest) -> Result<VoucherBatch> {
        check_voucher_request(request)?;
        tracing::debug!(
            invoices = request.invoice_ids.len(),
            date = %request.voucher_date,
            "POST /invoices/vouchers/generate"
        );
        let resp = self
            .http
            .post(self.url("invoices/vouchers/generate"))
            .json(request)
            .send()
            .await?;
        Ok(check_status(resp, "voucher generation").await?.json().await?)
    }
}

async fn check_status(resp: Response, subject: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(status_error(status, subject, &body))
}

/// Map a non-success status to the error taxonomy.
pub fn status_error(status: StatusCode, subject: &str, body: &str) -> InvoiceError {
    let detail = error_detail(body);
    match status {
        StatusCode::NOT_FOUND => InvoiceError::NotFound(subject.to_string()),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            InvoiceError::Validation(detail)
        }
        _ => InvoiceError::transport(format!("{subject}: server returned {status}: {detail}")),
    }
}

/// The service reports failures as `{"detail": ...}`; fall back to the raw body.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned())
        .map(|d| match d {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_else(|| body.trim().to_string())
}
