// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Flag value the extraction service assigns to records that passed every check.
pub const NORMAL_FLAG: &str = "normal";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub invoice_no: Option<String>,
    pub invoice_date: Option<NaiveDate>,
    pub invoice_type: Option<String>,
    pub seller_name: Option<String>,
    pub seller_tax_no: Option<String>,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub tax_amount: Decimal,
    #[serde(default)]
    pub total_amount: Decimal,
    pub expense_category: Option<String>,
    pub reimbursement_person: Option<String>,
    #[serde(default)]
    pub confidence: f64,
    pub anomaly_flag: Option<String>,
    pub anomaly_reason: Option<String>,
    pub image_path: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Invoice {
    /// Same predicate the service applies for `anomaly_only` listings.
    pub fn is_anomalous(&self) -> bool {
        self.anomaly_flag
            .as_deref()
            .is_some_and(|flag| flag != NORMAL_FLAG)
    }

    /// Whether `total_amount == amount + tax_amount`. Mismatches are data, not errors.
    pub fn amounts_consistent(&self) -> bool {
        self.total_amount == self.amount + self.tax_amount
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoicePage {
    pub items: Vec<Invoice>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_only: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub count: u64,
    pub amount: Decimal,
    pub tax_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub by_category: Vec<CategorySummary>,
    pub total_count: u64,
    pub total_amount: Decimal,
    pub total_tax: Decimal,
    pub anomaly_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub task_id: String,
    pub total_count: u32,
    pub processed: u32,
    pub message: String,
}

/// Sparse patch: unset fields are left alone by the service, `Some(None)` clears a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InvoicePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense_category: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reimbursement_person: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_flag: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_reason: Option<Option<String>>,
}

impl InvoicePatch {
    pub fn is_empty(&self) -> bool {
        self.expense_category.is_none()
            && self.reimbursement_person.is_none()
            && self.anomaly_flag.is_none()
            && self.anomaly_reason.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateVouchersRequest {
    pub invoice_ids: Vec<String>,
    pub voucher_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "借")]
    Debit,
    #[serde(rename = "贷")]
    Credit,
}

fn default_currency() -> String {
    "人民币".to_string()
}

fn default_exchange_rate() -> Decimal {
    Decimal::ONE
}

/// One ledger line. Serialized names are the accounting system's import headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherEntry {
    #[serde(rename = "编制日期")]
    pub entry_date: String,
    #[serde(rename = "凭证类型")]
    pub voucher_type: String,
    #[serde(rename = "凭证序号")]
    pub sequence: u32,
    #[serde(rename = "凭证号")]
    pub voucher_no: String,
    #[serde(rename = "制单人")]
    pub preparer: String,
    #[serde(rename = "附件张数")]
    pub attachments: u32,
    #[serde(rename = "会计年度")]
    pub fiscal_year: String,
    #[serde(rename = "科目编码")]
    pub account_code: String,
    #[serde(rename = "科目名称")]
    pub account_name: String,
    #[serde(rename = "凭证摘要")]
    pub memo: String,
    #[serde(rename = "借贷方向")]
    pub direction: Direction,
    #[serde(rename = "金额")]
    pub amount: Decimal,
    #[serde(rename = "币种", default = "default_currency")]
    pub currency: String,
    #[serde(rename = "汇率", default = "default_exchange_rate")]
    pub exchange_rate: Decimal,
    #[serde(rename = "原币金额", default)]
    pub original_amount: Decimal,
    #[serde(rename = "数量", default)]
    pub quantity: Option<Decimal>,
    #[serde(rename = "单价", default)]
    pub unit_price: Option<Decimal>,
    #[serde(rename = "结算方式名称", default)]
    pub settlement_method: Option<String>,
    #[serde(rename = "结算日期", default)]
    pub settlement_date: Option<String>,
    #[serde(rename = "结算票号", default)]
    pub settlement_ref: Option<String>,
    #[serde(rename = "业务日期", default)]
    pub business_date: Option<String>,
    #[serde(rename = "员工编号", default)]
    pub employee_id: Option<String>,
    #[serde(rename = "员工姓名", default)]
    pub employee_name: Option<String>,
    #[serde(rename = "往来单位编号", default)]
    pub counterparty_id: Option<String>,
    #[serde(rename = "往来单位名称", default)]
    pub counterparty_name: Option<String>,
    #[serde(rename = "货品编号", default)]
    pub item_id: Option<String>,
    #[serde(rename = "货品名称", default)]
    pub item_name: Option<String>,
    #[serde(rename = "部门名称", default)]
    pub department: Option<String>,
    #[serde(rename = "项目名称", default)]
    pub project: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherBatch {
    pub vouchers: Vec<VoucherEntry>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
}
