use clap::Parser as _;
use dirs::home_dir;
use log::{debug, info};
use nu_ansi_term::{Color, Style};
use reedline::{DefaultHinter, FileBackedHistory, Reedline, Signal};
use rmonkey::{
    cli::{Args, Commands},
    environment::Environment,
    error::{Error, Result},
    parser::Parser,
    repl::{ReplPrompt, ReplValidator, SyntaxHighlighter},
    runtime::{interpret, Value},
    tokenizer::Lexer,
};
use std::{fs, path::PathBuf};

fn run_file(file: PathBuf) -> Result<()> {
    let source = fs::read_to_string(file)?;

    let env = Environment::new();
    match interpret(&source, &env)? {
        Value::Null => {}
        result @ Value::Error(_) => eprintln!("{}", result),
        result => println!("{}", result),
    }

    Ok(())
}

fn check_file(file: PathBuf) -> Result<()> {
    let source = fs::read_to_string(file)?;

    let mut parser = Parser::new(Lexer::new(&source));
    let program = parser.parse_program();

    if !parser.errors().is_empty() {
        return Err(Error::Parse(parser.errors().to_vec()));
    }
    dbg!(&program);

    Ok(())
}

fn run_repl() -> Result<()> {
    let mut line_editor = Reedline::create()
        .with_hinter(Box::new(
            DefaultHinter::default().with_style(Style::new().italic().fg(Color::LightGray)),
        ))
        .with_highlighter(Box::new(SyntaxHighlighter))
        .with_validator(Box::new(ReplValidator));

    // Add file-backed history if possible
    if let Some(history) = home_dir()
        .map(|home| home.join(".rmonkey_history"))
        .and_then(|path| FileBackedHistory::with_file(20, path).ok())
        .map(Box::new)
    {
        line_editor = line_editor.with_history(history);
    } else {
        eprintln!("NOTE: Failed to load history. Persistence is now disabled.")
    }

    let prompt = ReplPrompt;

    // One environment for the whole session, so `let` bindings accumulate
    // across lines.
    let env = Environment::new();

    loop {
        match line_editor.read_line(&prompt)? {
            Signal::Success(buffer) => match interpret(&buffer, &env) {
                Ok(Value::Null) => {}
                Ok(result @ Value::Error(_)) => eprintln!("{}", result),
                Ok(result) => println!("{}", result),
                Err(err) => eprintln!("{}", err),
            },
            Signal::CtrlD | Signal::CtrlC => {
                break Ok(());
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Commands::Run { file } => {
            info!("FILE MODE");
            debug!("file: {:?}", file);

            run_file(file)
                .inspect_err(|err| {
                    eprintln!("{}", err);
                })
                .ok();
        }
        Commands::Check { file } => {
            info!("CHECK MODE");
            debug!("file: {:?}", file);

            check_file(file)
                .inspect_err(|err| {
                    eprintln!("{}", err);
                })
                .ok();
        }
        Commands::Repl => {
            info!("REPL MODE");

            run_repl()
                .inspect_err(|err| {
                    eprintln!("{}", err);
                })
                .ok();
        }
    }
    Ok(())
}
