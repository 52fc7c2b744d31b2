use lovebird_derive::lovebird_error;
use std::borrow::Cow;

#[lovebird_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Parse error{}: {source}", format_context(.context))]
    Parse { source: std::num::ParseIntError, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn parse(raw: &str) -> Result<u16, DemoError> {
    Ok(raw.parse::<u16>().context("Parsing port")?)
}

fn main() {
    let _ = parse("3000");
}
