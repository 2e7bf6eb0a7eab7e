//! Terminal front-end for the term finder
//!
//! Reads one term per line from stdin and prints the definition. While a
//! search is running, further input is refused instead of queued.

use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;

use carcino_term_finder::models::load_settings;
use carcino_term_finder::utils::logging::init_logging;
use carcino_term_finder::{LookupResolver, LookupResult, ResultSink, SearchController, SearchDispatch};

const TITLE: &str = "Carcino Term Finder";
const DISCLAIMER: &str =
    "Disclaimer: definitions are for general information only and are not medical advice.";

/// Result area of the terminal UI
struct TerminalView;

impl TerminalView {
    fn show(&self, text: &str) {
        println!("\n{}\n", text);
    }

    fn prompt(&self) {
        print!("Enter a term> ");
        let _ = std::io::stdout().flush();
    }
}

impl ResultSink for TerminalView {
    fn on_result_ready(&mut self, result: LookupResult) {
        self.show(&result.render());
        self.prompt();
    }
}

#[tokio::main]
async fn main() {
    let _log_guard = init_logging();

    let settings = match load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let resolver = match LookupResolver::from_settings(&settings) {
        Ok(resolver) => resolver,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let mut controller = SearchController::new(resolver);
    let mut view = TerminalView;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}\n{}\n", TITLE, DISCLAIMER);
    view.prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        error!("Failed to read input: {}", e);
                        break;
                    }
                };

                match controller.on_search_requested(&line) {
                    SearchDispatch::Dispatched(term) => view.show(&format!("Searching for '{}'...", term)),
                    SearchDispatch::Busy => view.show("A search is already running, please wait."),
                    SearchDispatch::EmptyInput(e) => {
                        view.show(&e.to_string());
                        view.prompt();
                    }
                }
            }
            _ = controller.deliver_next(&mut view), if controller.is_busy() => {}
        }
    }

    // Input closed: let a running search finish before exiting
    controller.deliver_next(&mut view).await;
    println!();
}
