//! Built-in shell commands.
//!
//! A command is a line starting with [`COMMAND_PREFIX`]. The registry is a
//! static table: each entry names its parameters, which drive both the arity
//! check and the usage text.

use std::fs;
use std::io::Write;
use std::path::{self, Path, PathBuf};

use colored::Colorize;
use kiln_core::{Compilation, Engine, Result, Symbol, SymbolKind};
use thiserror::Error;

use crate::renderer::render_line;
use crate::shell::Shell;

pub const COMMAND_PREFIX: char = ':';

/// Returns `true` when the first non-blank character is the command prefix.
pub fn is_command(text: &str) -> bool {
    text.trim_start().starts_with(COMMAND_PREFIX)
}

/// What the read loop should do after a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    ClearScreen,
    Exit,
}

/// Command usage errors. Reported to the user, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command ':{0}'")]
    UnknownCommand(String),

    #[error("Wrong number of arguments, usage: {usage}")]
    InvalidArity { usage: String },
}

pub type CommandHandler<E, W> = fn(&mut Shell<E, W>, &[String]) -> Result<CommandOutcome>;

pub struct CommandDescriptor<E: Engine, W: Write> {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [&'static str],
    pub handler: CommandHandler<E, W>,
}

// Derives would require `E: Clone` and `W: Clone`.
impl<E: Engine, W: Write> Clone for CommandDescriptor<E, W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: Engine, W: Write> Copy for CommandDescriptor<E, W> {}

impl<E: Engine, W: Write> CommandDescriptor<E, W> {
    pub fn usage(&self) -> String {
        let mut usage = format!("{}{}", COMMAND_PREFIX, self.name);
        for param in self.params {
            usage.push_str(&format!(" <{}>", param));
        }
        usage
    }
}

pub fn builtin_commands<E: Engine, W: Write>() -> Vec<CommandDescriptor<E, W>> {
    vec![
        CommandDescriptor {
            name: "exit",
            description: "Exits the shell",
            params: &[],
            handler: exit,
        },
        CommandDescriptor {
            name: "cls",
            description: "Clears the screen",
            params: &[],
            handler: clear_screen,
        },
        CommandDescriptor {
            name: "reset",
            description: "Forgets all previous submissions",
            params: &[],
            handler: reset,
        },
        CommandDescriptor {
            name: "showTree",
            description: "Toggles printing of parse trees",
            params: &[],
            handler: show_tree,
        },
        CommandDescriptor {
            name: "showProgram",
            description: "Toggles printing of bound programs",
            params: &[],
            handler: show_program,
        },
        CommandDescriptor {
            name: "load",
            description: "Loads a script file",
            params: &["path"],
            handler: load,
        },
        CommandDescriptor {
            name: "ls",
            description: "Lists all symbols",
            params: &[],
            handler: list_symbols,
        },
        CommandDescriptor {
            name: "dump",
            description: "Shows the bound body of a function",
            params: &["functionName"],
            handler: dump,
        },
    ]
}

/// Splits a command line into words.
///
/// Double quotes group words; inside quotes a doubled quote stands for one
/// literal quote.
pub fn split_arguments(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    // A quoted word is kept even when empty.
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    words.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() || quoted {
        words.push(current);
    }
    words
}

impl<E: Engine, W: Write> Shell<E, W> {
    /// Parses and runs one command line.
    pub(crate) fn execute_command(&mut self, line: &str) -> Result<CommandOutcome> {
        let line = line.trim_start();
        let line = line.strip_prefix(COMMAND_PREFIX).unwrap_or(line);
        let mut words = split_arguments(line);
        let name = if words.is_empty() {
            String::new()
        } else {
            words.remove(0)
        };

        let Some(command) = self.commands.iter().find(|c| c.name == name).copied() else {
            tracing::debug!("[Command] Unknown command '{}'", name);
            self.write_error(&CommandError::UnknownCommand(name).to_string())?;
            return Ok(CommandOutcome::Continue);
        };

        if words.len() != command.params.len() {
            let error = CommandError::InvalidArity {
                usage: command.usage(),
            };
            self.write_error(&error.to_string())?;
            return Ok(CommandOutcome::Continue);
        }

        tracing::debug!("[Command] :{} {:?}", command.name, words);
        (command.handler)(self, &words)
    }

    pub(crate) fn write_error(&mut self, message: &str) -> Result<()> {
        writeln!(self.out, "{}", message.red())?;
        Ok(())
    }

    fn write_notice(&mut self, message: &str) -> Result<()> {
        writeln!(self.out, "{}", message.bright_black())?;
        Ok(())
    }

    /// Symbols of the current compilation, functions first, then by name.
    fn sorted_symbols(&self) -> Vec<Symbol> {
        let mut symbols = match self.state.current_handle() {
            Some(handle) => handle.symbols(),
            None => self.engine.empty_compilation().symbols(),
        };
        symbols.sort_by(|a, b| (a.kind, &a.name).cmp(&(b.kind, &b.name)));
        symbols
    }
}

fn exit<E: Engine, W: Write>(_shell: &mut Shell<E, W>, _args: &[String]) -> Result<CommandOutcome> {
    Ok(CommandOutcome::Exit)
}

fn clear_screen<E: Engine, W: Write>(
    _shell: &mut Shell<E, W>,
    _args: &[String],
) -> Result<CommandOutcome> {
    Ok(CommandOutcome::ClearScreen)
}

fn reset<E: Engine, W: Write>(shell: &mut Shell<E, W>, _args: &[String]) -> Result<CommandOutcome> {
    shell.state.reset();
    shell.store.clear_all()?;
    tracing::info!("[Session] Reset session and cleared stored submissions");
    Ok(CommandOutcome::Continue)
}

fn show_tree<E: Engine, W: Write>(shell: &mut Shell<E, W>, _args: &[String]) -> Result<CommandOutcome> {
    shell.show_tree = !shell.show_tree;
    let message = if shell.show_tree {
        "Showing parse trees."
    } else {
        "Not showing parse trees."
    };
    shell.write_notice(message)?;
    Ok(CommandOutcome::Continue)
}

fn show_program<E: Engine, W: Write>(
    shell: &mut Shell<E, W>,
    _args: &[String],
) -> Result<CommandOutcome> {
    shell.show_program = !shell.show_program;
    let message = if shell.show_program {
        "Showing bound programs."
    } else {
        "Not showing bound programs."
    };
    shell.write_notice(message)?;
    Ok(CommandOutcome::Continue)
}

fn load<E: Engine, W: Write>(shell: &mut Shell<E, W>, args: &[String]) -> Result<CommandOutcome> {
    let path = path::absolute(Path::new(&args[0])).unwrap_or_else(|_| PathBuf::from(&args[0]));

    if !path.is_file() {
        shell.write_error(&format!("error: file does not exist '{}'", path.display()))?;
        return Ok(CommandOutcome::Continue);
    }

    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            shell.write_error(&format!("error: cannot read '{}': {}", path.display(), e))?;
            return Ok(CommandOutcome::Continue);
        }
    };

    tracing::info!("[Command] Loading {}", path.display());
    shell.evaluate_submission(&text)?;
    Ok(CommandOutcome::Continue)
}

fn list_symbols<E: Engine, W: Write>(
    shell: &mut Shell<E, W>,
    _args: &[String],
) -> Result<CommandOutcome> {
    for symbol in shell.sorted_symbols() {
        let line = render_line(shell.engine.as_ref(), &symbol.signature);
        writeln!(shell.out, "{}", line)?;
    }
    Ok(CommandOutcome::Continue)
}

fn dump<E: Engine, W: Write>(shell: &mut Shell<E, W>, args: &[String]) -> Result<CommandOutcome> {
    let name = &args[0];
    let mut matches: Vec<Symbol> = shell
        .sorted_symbols()
        .into_iter()
        .filter(|symbol| symbol.kind == SymbolKind::Function && &symbol.name == name)
        .collect();

    if matches.len() != 1 {
        let message = if matches.is_empty() {
            format!("error: function '{}' does not exist", name)
        } else {
            format!("error: function name '{}' is ambiguous", name)
        };
        shell.write_error(&message)?;
        return Ok(CommandOutcome::Continue);
    }

    let symbol = matches.remove(0);
    let compilation = match shell.state.current_handle() {
        Some(handle) => handle.clone(),
        None => shell.engine.empty_compilation(),
    };
    compilation.emit_tree(Some(&symbol), &mut shell.out)?;
    Ok(CommandOutcome::Continue)
}
