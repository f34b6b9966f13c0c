//! Command-line access to a tabular database account.
//!
//! Reads `AIRTABLE_API_KEY` (and the optional `AIRTABLE_*` overrides) from
//! the environment and prints every result as one JSON document per line.

use std::path::PathBuf;

use airtable_core::{Attachment, Client, ClientConfig, Sort};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "airtable-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List records of a table, following pages until exhausted
    Records {
        #[arg(long)]
        db: String,
        #[arg(long)]
        table: String,
        /// Formula a record must satisfy
        #[arg(long)]
        filter: Option<String>,
        /// Field to return; repeat for several
        #[arg(long = "field")]
        fields: Vec<String>,
        /// Sort key as FIELD or FIELD:desc; repeat for several
        #[arg(long)]
        sort: Vec<String>,
        #[arg(long)]
        view: Option<String>,
        #[arg(long)]
        page_size: Option<u32>,
        #[arg(long)]
        max_records: Option<u32>,
    },

    /// Fetch a single record
    Record {
        #[arg(long)]
        db: String,
        #[arg(long)]
        table: String,
        id: String,
    },

    /// Delete records by id
    Delete {
        #[arg(long)]
        db: String,
        #[arg(long)]
        table: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Upload a local file into an attachment field
    Upload {
        #[arg(long)]
        db: String,
        #[arg(long)]
        table: String,
        #[arg(long)]
        record: String,
        #[arg(long)]
        field: String,
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
        path: PathBuf,
    },

    /// List accessible bases
    Bases,

    /// Show the tables, fields and views of a base
    Schema {
        #[arg(long)]
        db: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let config = ClientConfig::from_env()?;
    let client = Client::from_config(config)?;
    info!("using {}", client.base_url());

    match cli.command {
        Command::Records {
            db,
            table,
            filter,
            fields,
            sort,
            view,
            page_size,
            max_records,
        } => {
            let table = client.table(&db, &table);
            let mut request = table
                .list_records()
                .return_fields(fields)
                .with_sort(sort.iter().map(String::as_str).map(parse_sort));
            if let Some(filter) = filter {
                request = request.with_filter_formula(filter);
            }
            if let Some(view) = view {
                request = request.from_view(view);
            }
            if let Some(page_size) = page_size {
                request = request.page_size(page_size);
            }
            if let Some(max_records) = max_records {
                request = request.max_records(max_records);
            }

            let mut offset = String::new();
            loop {
                let page = request.clone().with_offset(offset.as_str()).send()?;
                for record in &page {
                    print_json(record)?;
                }
                match page.next_offset() {
                    Some(next) => offset = next.to_string(),
                    None => break,
                }
            }
        }
        Command::Record { db, table, id } => {
            print_json(&client.table(&db, &table).get_record(&id)?)?;
        }
        Command::Delete { db, table, ids } => {
            let table = client.table(&db, &table);
            for batch in ids.chunks(airtable_core::MAX_RECORDS_PER_REQUEST) {
                for record in &table.delete_records(batch)? {
                    print_json(record)?;
                }
            }
        }
        Command::Upload {
            db,
            table,
            record,
            field,
            content_type,
            path,
        } => {
            let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .context("upload path has no file name")?;
            let attachment = Attachment::from_bytes(content_type, filename, &bytes);
            print_json(&client.table(&db, &table).upload_attachment(&record, &field, &attachment)?)?;
        }
        Command::Bases => {
            let mut offset = String::new();
            loop {
                let page = client.list_bases().with_offset(offset.as_str()).send()?;
                for base in &page.bases {
                    print_json(base)?;
                }
                match page.next_offset() {
                    Some(next) => offset = next.to_string(),
                    None => break,
                }
            }
        }
        Command::Schema { db } => {
            for table in &client.base_schema(&db).send()?.tables {
                print_json(table)?;
            }
        }
    }
    Ok(())
}

/// `Name` sorts ascending, `Name:desc` descending.
fn parse_sort(raw: &str) -> Sort {
    match raw.rsplit_once(':') {
        Some((field, "desc")) => Sort::desc(field),
        Some((field, "asc")) => Sort::asc(field),
        _ => Sort::asc(raw),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
