// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

pub const CLEARABLE_FIELDS: [&str; 4] = ["category", "person", "anomaly-flag", "anomaly-reason"];

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print JSON instead of a table")
}

pub fn build_cli() -> Command {
    Command::new("invoicedesk")
        .about("Browse ingested invoices, summarize spend, and generate balanced vouchers")
        .version(clap::crate_version!())
        .subcommand(
            Command::new("list")
                .about("List one page of invoices")
                .arg(
                    Arg::new("page")
                        .long("page")
                        .value_parser(value_parser!(u32).range(1..))
                        .default_value("1"),
                )
                .arg(Arg::new("category").long("category"))
                .arg(
                    Arg::new("anomaly-only")
                        .long("anomaly-only")
                        .action(ArgAction::SetTrue)
                        .help("Only invoices flagged by the extraction service"),
                )
                .arg(
                    Arg::new("select")
                        .long("select")
                        .action(ArgAction::Append)
                        .help("Invoice id to include in the selection totals"),
                )
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("summary")
                .about("Totals by expense category")
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("upload")
                .about("Upload invoice images or PDFs for extraction")
                .arg(
                    Arg::new("files")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(std::path::PathBuf)),
                )
                .arg(Arg::new("person").long("person").help("Reimbursement person")),
        )
        .subcommand(
            Command::new("update")
                .about("Correct fields on one invoice")
                .arg(Arg::new("id").required(true))
                .arg(Arg::new("category").long("category"))
                .arg(Arg::new("person").long("person"))
                .arg(Arg::new("anomaly-flag").long("anomaly-flag"))
                .arg(Arg::new("anomaly-reason").long("anomaly-reason"))
                .arg(
                    Arg::new("clear")
                        .long("clear")
                        .action(ArgAction::Append)
                        .value_parser(CLEARABLE_FIELDS)
                        .help("Reset a field to empty"),
                )
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete one invoice")
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(
            Command::new("export")
                .about("Download the spreadsheet export")
                .arg(
                    Arg::new("out-dir")
                        .long("out-dir")
                        .value_parser(value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            Command::new("vouchers")
                .about("Generate accounting vouchers for invoices")
                .arg(Arg::new("ids").required(true).num_args(1..))
                .arg(Arg::new("date").long("date").required(true).help("YYYY-MM-DD"))
                .arg(Arg::new("type").long("type").help("Voucher type, e.g. 转"))
                .arg(Arg::new("maker").long("maker"))
                .arg(Arg::new("department").long("department"))
                .arg(
                    Arg::new("csv")
                        .long("csv")
                        .value_parser(value_parser!(std::path::PathBuf))
                        .help("Write the entries as CSV for import"),
                )
                .arg(json_flag()),
        )
}
