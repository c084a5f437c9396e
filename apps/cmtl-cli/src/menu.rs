//! Line-oriented interactive menu.
//!
//! Reads selections from any `BufRead` and writes to any `Write`, so the
//! same loop serves a terminal and tests. End of input exits the menu.

use anyhow::Result;
use cmtl_core::Launcher;
use cmtl_core::ledger::preview;
use std::io::{BufRead, Write};

/// Characters of captured output shown after a single run.
const OUTPUT_PREVIEW_CHARS: usize = 1000;

/// Run the interactive menu until `0` or end of input
pub async fn run_menu<R: BufRead, W: Write>(
    launcher: &Launcher,
    target: &str,
    mut input: R,
    mut out: W,
) -> Result<()> {
    let mut target = target.to_string();

    loop {
        writeln!(out, "\n=== {} ===", launcher.config().project_name)?;
        writeln!(out, "Target: {}", target)?;
        writeln!(out, "1) Run a single tool (capture output)")?;
        writeln!(out, "2) Run all tools (sequential)")?;
        writeln!(out, "3) Show available tools")?;
        writeln!(out, "4) Launch a tool (detached)")?;
        writeln!(out, "5) Change target")?;
        writeln!(out, "0) Exit")?;

        let Some(selection) = prompt(&mut input, &mut out, "Select: ")? else {
            break;
        };

        match selection.as_str() {
            "0" => break,
            "1" => {
                let Some(tool) = choose_tool(launcher, &mut input, &mut out)? else {
                    continue;
                };
                let extra = prompt(&mut input, &mut out, "Extra args (space-separated) or Enter: ")?
                    .unwrap_or_default();
                let extra: Vec<String> = extra.split_whitespace().map(String::from).collect();

                writeln!(out, "Running {} ...", tool)?;
                let outcome = launcher.run_tool(&tool, &target, &extra).await;
                writeln!(out, "{}", if outcome.success { "OK" } else { "FAIL" })?;
                writeln!(out, "{}", preview(&outcome.output, OUTPUT_PREVIEW_CHARS))?;
            }
            "2" => {
                let answer = prompt(
                    &mut input,
                    &mut out,
                    "Run ALL tools sequentially? This may take time. (y/N): ",
                )?
                .unwrap_or_default()
                .to_lowercase();
                if answer != "y" && answer != "yes" {
                    continue;
                }

                let summary = launcher.run_all(&target).await;
                for outcome in &summary.outcomes {
                    writeln!(out, "{:<10} {}", outcome.status.as_str(), outcome.tool)?;
                }
                writeln!(
                    out,
                    "{} of {} tools succeeded.",
                    summary.succeeded(),
                    summary.outcomes.len()
                )?;
            }
            "3" => {
                writeln!(out, "Available tools:")?;
                for entry in launcher.registry().entries() {
                    let mark = if launcher.is_available(entry) { "+" } else { "-" };
                    writeln!(out, " {} [{}] {}", mark, entry.source, entry.name)?;
                }
            }
            "4" => {
                let Some(tool) = choose_tool(launcher, &mut input, &mut out)? else {
                    continue;
                };
                match launcher.launch_tool(&tool) {
                    Ok(()) => writeln!(out, "Launched {}", tool)?,
                    Err(e) => writeln!(out, "Launch failed: {}", e)?,
                }
            }
            "5" => {
                if let Some(new_target) = prompt(&mut input, &mut out, "New target: ")?
                    && !new_target.is_empty()
                {
                    target = new_target;
                }
            }
            _ => writeln!(out, "Invalid selection.")?,
        }
    }

    Ok(())
}

/// Print `message` and read one trimmed line; `None` at end of input
fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, message: &str) -> Result<Option<String>> {
    write!(out, "{}", message)?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// List the registry and read a 1-based selection
fn choose_tool<R: BufRead, W: Write>(
    launcher: &Launcher,
    input: &mut R,
    out: &mut W,
) -> Result<Option<String>> {
    let names: Vec<&str> = launcher.registry().names().collect();
    for (index, name) in names.iter().enumerate() {
        writeln!(out, "{}) {}", index + 1, name)?;
    }

    let choice = prompt(input, out, "Select tool (num): ")?.unwrap_or_default();
    let selected = choice
        .parse::<usize>()
        .ok()
        .and_then(|number| number.checked_sub(1))
        .and_then(|index| names.get(index));

    match selected {
        Some(name) => Ok(Some(name.to_string())),
        None => {
            writeln!(out, "Invalid selection.")?;
            Ok(None)
        }
    }
}
