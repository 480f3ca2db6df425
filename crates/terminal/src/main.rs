//! Line-driven terminal for trying the workflows without a scanner.
//!
//! Each stdin line is typed as one scanner burst followed by Enter, unless it
//! starts with `:` in which case it is a command (`:help` lists them).

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use stockscan_catalog::Catalog;
use stockscan_core::{OrderId, Sku, SystemClock};
use stockscan_infra::{InMemoryStore, View};
use stockscan_picking::Order;
use stockscan_scanner::{HostKeyEvent, Key};
use stockscan_terminal::{ScanResponse, Terminal, TerminalConfig};

const CATALOG_ENV: &str = "STOCKSCAN_CATALOG";
const ORDERS_ENV: &str = "STOCKSCAN_ORDERS";

type Term = Terminal<Arc<InMemoryStore>, SystemClock>;

fn main() -> Result<()> {
    stockscan_observability::init();

    let catalog_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CATALOG_ENV).ok())
        .context("usage: stockscan <catalog.json> (or set STOCKSCAN_CATALOG)")?;
    let raw = std::fs::read_to_string(&catalog_path)
        .with_context(|| format!("reading catalog {catalog_path}"))?;
    let catalog = Catalog::from_json(&raw).with_context(|| format!("parsing catalog {catalog_path}"))?;

    let config = TerminalConfig::from_env();
    let mut terminal = Terminal::open(catalog, Arc::new(InMemoryStore::new()), SystemClock, config);
    terminal.roster().seed_if_empty(["Operateur"]);

    if let Ok(path) = std::env::var(ORDERS_ENV) {
        let raw = std::fs::read_to_string(&path).with_context(|| format!("reading orders {path}"))?;
        let orders: Vec<Order> =
            serde_json::from_str(&raw).with_context(|| format!("parsing orders {path}"))?;
        terminal.picking_mut().import_orders(orders);
    }

    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    let mut last_scan: Option<Sku> = None;

    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let line = line.trim_end();

        match line.strip_prefix(':') {
            Some(command) => {
                if !run_command(&mut terminal, command, last_scan.as_ref(), &mut out)? {
                    break;
                }
            }
            None => {
                if let Some(response) = type_burst(&mut terminal, line) {
                    if let Some(sku) = scanned_sku(&response) {
                        last_scan = Some(sku);
                    }
                    writeln!(out, "{response:?}")?;
                }
            }
        }
    }
    Ok(())
}

/// Type `line` as a scanner would, then Enter.
fn type_burst(terminal: &mut Term, line: &str) -> Option<ScanResponse> {
    let mut response = None;
    for key in line.chars().map(Key::Char).chain(std::iter::once(Key::Enter)) {
        if let Some(r) = terminal.key(HostKeyEvent::new(key)).response {
            response = Some(r);
        }
    }
    response
}

fn scanned_sku(response: &ScanResponse) -> Option<Sku> {
    match response {
        ScanResponse::Count(Ok(prompt)) => Some(prompt.item.sku.clone()),
        ScanResponse::Receive(Ok(item)) => Some(item.sku.clone()),
        _ => None,
    }
}

/// Returns `false` when the session should end.
fn run_command(
    terminal: &mut Term,
    command: &str,
    last_scan: Option<&Sku>,
    out: &mut impl Write,
) -> Result<bool> {
    let (name, arg) = command
        .split_once(' ')
        .map(|(n, a)| (n, a.trim()))
        .unwrap_or((command, ""));

    match name {
        "quit" => return Ok(false),
        "help" => writeln!(
            out,
            ":login NAME | :logout | :view menu|inventory|check|stock_in|picking | :qty N | \
             :order ID | :unlock ID | :leave | :done | :export | :quit"
        )?,
        "login" => writeln!(out, "{:?}", terminal.login(arg))?,
        "logout" => terminal.logout(),
        "view" => match View::parse(arg) {
            Some(view) => terminal.navigate(view),
            None => writeln!(out, "unknown view {arg:?}")?,
        },
        "qty" => {
            let Some(sku) = last_scan else {
                writeln!(out, "scan a product first")?;
                return Ok(true);
            };
            match terminal.view() {
                View::Counting => writeln!(out, "{:?}", terminal.commit_count(sku, arg))?,
                View::Receiving => writeln!(out, "{:?}", terminal.commit_receipt(sku, arg))?,
                view => writeln!(out, "no quantity to enter on {view}")?,
            }
        }
        "order" => writeln!(out, "{:?}", terminal.open_order(&OrderId::new(arg)))?,
        "unlock" => writeln!(out, "{:?}", terminal.force_release_order(&OrderId::new(arg)))?,
        "leave" => writeln!(out, "{:?}", terminal.leave_order())?,
        "done" => writeln!(out, "{:?}", terminal.complete_order())?,
        "export" => {
            let export = match terminal.view() {
                View::Counting => terminal.export_counts()?,
                _ => terminal.export_receipts()?,
            };
            std::fs::write(&export.file_name, &export.bytes)
                .with_context(|| format!("writing {}", export.file_name))?;
            writeln!(out, "wrote {}", export.file_name)?;
        }
        other => writeln!(out, "unknown command {other:?}, try :help")?,
    }
    Ok(true)
}
