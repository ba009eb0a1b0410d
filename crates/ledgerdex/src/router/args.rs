//! Positional argument checks shared by the asset handlers.

use crate::error::Error;

const ORDINALS: [&str; 7] = ["1st", "2nd", "3rd", "4th", "5th", "6th", "7th"];

fn ordinal(position: usize) -> String {
    ORDINALS
        .get(position)
        .map_or_else(|| format!("{}th", position + 1), |s| (*s).to_string())
}

/// Require exactly `expected` arguments.
pub fn expect_arity(args: &[&str], expected: usize, what: &str) -> Result<(), Error> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "Incorrect number of arguments. Expecting {what}"
        )))
    }
}

/// The argument at `position`, rejected when empty.
pub fn non_empty<'a>(args: &[&'a str], position: usize) -> Result<&'a str, Error> {
    match args.get(position).copied() {
        Some(arg) if !arg.is_empty() => Ok(arg),
        _ => Err(Error::validation(format!(
            "{} argument must be a non-empty string",
            ordinal(position)
        ))),
    }
}

/// Parse a boolean the way ledger clients send them: `1`, `t`, `T`, `TRUE`,
/// `true`, `True` and their false counterparts.
pub fn parse_bool(args: &[&str], position: usize) -> Result<bool, Error> {
    match args.get(position).copied() {
        Some("1" | "t" | "T" | "TRUE" | "true" | "True") => Ok(true),
        Some("0" | "f" | "F" | "FALSE" | "false" | "False") => Ok(false),
        _ => Err(Error::validation(format!(
            "{} argument must be a boolean string",
            ordinal(position)
        ))),
    }
}

/// Parse a signed decimal integer.
pub fn parse_int(args: &[&str], position: usize) -> Result<i64, Error> {
    args.get(position)
        .and_then(|arg| arg.parse::<i64>().ok())
        .ok_or_else(|| {
            Error::validation(format!(
                "{} argument must be a numeric string",
                ordinal(position)
            ))
        })
}

///
/// TESTS
///
