// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{Invoice, UploadResponse, VoucherEntry};

pub type Result<T> = std::result::Result<T, InvoiceError>;

#[derive(Debug, Error)]
pub enum InvoiceError {
    /// Network failure, timeout, undecodable body or unexpected server status.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("invoice not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    /// The generator's totals disagree; the whole batch is kept for diagnostics.
    #[error("unbalanced voucher batch: debit {total_debit} != credit {total_credit}")]
    UnbalancedVoucher {
        total_debit: Decimal,
        total_credit: Decimal,
        vouchers: Vec<VoucherEntry>,
    },

    /// The mutation went through on the server but the local view could not be refreshed.
    #[error("change applied but local state may be stale: {source}")]
    Stale {
        applied: Applied,
        #[source]
        source: Box<InvoiceError>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invoice session is closed")]
    SessionClosed,
}

/// What the server accepted before a refresh failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Upload(UploadResponse),
    Update(Box<Invoice>),
    Delete(String),
}

impl InvoiceError {
    pub fn stale(applied: Applied, source: InvoiceError) -> Self {
        Self::Stale {
            applied,
            source: Box::new(source),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for InvoiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::transport(format!("request timed out: {err}"))
        } else {
            Self::transport(err.to_string())
        }
    }
}
