// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{InvoiceError, Result};
use crate::models::VoucherBatch;

/// Gate a generated batch on the double-entry law: total debit equals total credit.
///
/// The comparison is exact decimal equality on the totals the generator reported;
/// the entries themselves are not re-summed. A balanced batch is returned untouched.
pub fn ensure_balanced(batch: VoucherBatch) -> Result<VoucherBatch> {
    if batch.total_debit == batch.total_credit {
        return Ok(batch);
    }
    tracing::warn!(
        total_debit = %batch.total_debit,
        total_credit = %batch.total_credit,
        entries = batch.vouchers.len(),
        "rejecting unbalanced voucher batch"
    );
    Err(InvoiceError::UnbalancedVoucher {
        total_debit: batch.total_debit,
        total_credit: batch.total_credit,
        vouchers: batch.vouchers,
    })
}
