//! `littlesh` - a thin script runner around the `little` interpreter core.
//!
//! Interactive line editing, I/O, and command registration glue belong to
//! the embedding host; this binary just reads a script from `-c`, a file,
//! or stdin, runs it, and prints the resulting value.

use clap::Parser;
use little::{Interpreter, InterpreterOptions};
use std::io::Read;

#[derive(Parser)]
#[command(name = "littlesh")]
#[command(about = "Script runner for the little embeddable command interpreter")]
#[command(version)]
struct Cli {
    /// Execute the script given as a command-line argument
    #[arg(short = 'c')]
    script: Option<String>,

    /// Maximum script-function call depth (disabled if unset)
    #[arg(long = "max-depth")]
    max_depth: Option<usize>,

    /// Emit {"result", "error"} JSON instead of plain text
    #[arg(long = "json")]
    json: bool,

    /// Script file to execute
    #[arg()]
    script_file: Option<String>,
}

fn main() {
    tracing_subscriber::fmt::try_init().ok();

    let cli = Cli::parse();

    let script = if let Some(s) = cli.script {
        s
    } else if let Some(ref file) = cli.script_file {
        match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error: cannot read script file: {file}: {e}");
                std::process::exit(1);
            }
        }
    } else {
        use std::io::IsTerminal;
        if std::io::stdin().is_terminal() {
            eprintln!("Error: no script provided. Use -c 'script', a script file, or pipe via stdin.");
            std::process::exit(1);
        }
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).unwrap_or_default();
        buf
    };

    let mut interp = Interpreter::with_options(InterpreterOptions {
        max_parse_depth: cli.max_depth,
        ..Default::default()
    });

    match interp.parse(script.as_bytes(), false) {
        Ok(value) => {
            if cli.json {
                println!("{}", serde_json::json!({"result": value, "error": serde_json::Value::Null}));
            } else {
                println!("{}", value.as_str());
            }
        }
        Err(err) => {
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "result": serde_json::Value::Null,
                        "error": {"message": err.message(), "position": err.position()},
                    })
                );
            } else {
                eprintln!("error: {} (at byte {})", err.message(), err.position());
            }
            std::process::exit(1);
        }
    }
}
