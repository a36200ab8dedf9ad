//! Interactive chat loop.

use std::io::IsTerminal;

use anyhow::Result;
use owo_colors::OwoColorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use toolrelay::{ModelClient, Orchestrator, ToolChannel};

const PROMPT: &str = "You: ";

/// What to do with one line of input.
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Quit,
    Skip,
    Message(&'a str),
}

pub fn classify(line: &str) -> Input<'_> {
    let line = line.trim();
    match line {
        "" => Input::Skip,
        "quit" | "exit" => Input::Quit,
        message => Input::Message(message),
    }
}

/// Read messages until `quit`, `exit`, Ctrl-D or Ctrl-C. A failed message is
/// reported and the loop carries on.
pub async fn run<C: ToolChannel, M: ModelClient>(orchestrator: &Orchestrator<C, M>) -> Result<()> {
    let color = std::io::stdout().is_terminal();
    let banner = "The model can use the tool server's tools. Type 'quit' or 'exit' to leave.";
    if color {
        println!("{}\n", banner.bright_black());
    } else {
        println!("{}\n", banner);
    }

    let mut editor = DefaultEditor::new()?;

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => break,
            Err(e) => return Err(e.into()),
        };

        let message = match classify(&line) {
            Input::Quit => {
                println!("Goodbye!");
                break;
            }
            Input::Skip => continue,
            Input::Message(message) => message,
        };
        let _ = editor.add_history_entry(message);

        match orchestrator.process_message(message).await {
            Ok(reply) if color => println!("{} {}", "Agent:".bright_cyan().bold(), reply),
            Ok(reply) => println!("Agent: {}", reply),
            Err(e) if color => println!("{} {}", "Error:".red().bold(), e),
            Err(e) => println!("Error: {}", e),
        }
        println!();
    }

    Ok(())
}
