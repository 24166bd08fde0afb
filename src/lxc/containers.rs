use futures::future::join_all;
use std::process::Stdio;
use tokio::process::Command;

use crate::lxc::client::LxcClient;
use crate::lxc::pve::read_hostname;
use crate::types::{AppError, ContainerRecord, ContainerState, Result};

const COLUMNS: [&str; 5] = ["NAME", "STATE", "IPV4", "IPV6", "UNPRIVILEGED"];

pub async fn list_containers(
    client: &LxcClient,
    include_stopped: bool,
) -> Result<Vec<ContainerRecord>> {
    let fetches = COLUMNS.iter().map(|column| fetch_column(client, column));
    let mut columns = Vec::with_capacity(COLUMNS.len());
    for result in join_all(fetches).await {
        columns.push(result?);
    }

    let rows = zip_columns(&columns, include_stopped);

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let hostname = read_hostname(&client.pve_config_dir, &row.id).await;
        records.push(ContainerRecord {
            id: row.id,
            hostname,
            state: row.state,
            ip_addresses: row.ip_addresses,
            unprivileged: row.unprivileged,
        });
    }
    Ok(records)
}

async fn fetch_column(client: &LxcClient, column: &str) -> Result<Vec<String>> {
    let output = Command::new("lxc-ls")
        .arg("--fancy")
        .arg(format!("--fancy-format={}", column))
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(client.column_timeout, output)
        .await
        .map_err(|_| AppError::Fetch(format!("lxc-ls timed out reading column {}", column)))?
        .map_err(|e| AppError::Fetch(format!("failed to run lxc-ls: {}", e)))?;

    if !output.status.success() {
        return Err(AppError::Fetch(format!(
            "lxc-ls exited with {} for column {}: {}",
            output.status,
            column,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(parse_column(&String::from_utf8_lossy(&output.stdout)))
}

/// Values of a single-column `lxc-ls --fancy` listing, header dropped.
pub fn parse_column(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .skip(1)
        .map(str::to_string)
        .collect()
}

/// Splits an address cell; "-" means no address.
pub fn parse_addresses(cell: &str) -> Vec<String> {
    let cell = cell.trim();
    if cell == "-" || cell.is_empty() {
        return Vec::new();
    }
    cell.split(", ")
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect()
}

#[derive(Debug, PartialEq)]
pub struct ListedRow {
    pub id: String,
    pub state: ContainerState,
    pub ip_addresses: Vec<String>,
    pub unprivileged: String,
}

/// Zips NAME, STATE, IPV4, IPV6, UNPRIVILEGED columns row by row, up to the
/// shortest column.
pub fn zip_columns(columns: &[Vec<String>], include_stopped: bool) -> Vec<ListedRow> {
    if columns.len() < COLUMNS.len() {
        return Vec::new();
    }
    let rows = columns.iter().map(Vec::len).min().unwrap_or(0);

    (0..rows)
        .filter_map(|i| {
            let state = ContainerState::parse(&columns[1][i]);
            if !include_stopped && state == ContainerState::Stopped {
                return None;
            }
            let mut ip_addresses = parse_addresses(&columns[2][i]);
            ip_addresses.extend(parse_addresses(&columns[3][i]));
            Some(ListedRow {
                id: columns[0][i].trim().to_string(),
                state,
                ip_addresses,
                unprivileged: columns[4][i].trim().to_string(),
            })
        })
        .collect()
}
