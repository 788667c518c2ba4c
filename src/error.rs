use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{}", format_parse_errors(.0))]
    Parse(Vec<String>),
}

fn format_parse_errors(errors: &[String]) -> String {
    errors
        .iter()
        .map(|error| format!("parse error: {}", error))
        .collect::<Vec<_>>()
        .join("\n")
}

pub type Result<T> = std::result::Result<T, Error>;
