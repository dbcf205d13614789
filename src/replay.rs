//! Parsing recorded key workloads.
//!
//! A capture is a plain text file of keys separated by whitespace and/or
//! commas, as produced by tracing a live workload. Parsed captures feed the
//! comparison driver so the same traffic can be replayed against every
//! balancing policy.

use std::str::FromStr;

use crate::Error;

/// Parses a delimited capture into keys.
///
/// Tokens are separated by any run of whitespace and commas; empty tokens
/// are skipped. A token that does not parse as `K` yields
/// [`Error::InvalidKey`] carrying the offending token.
pub fn parse_keys<K: FromStr>(input: &str) -> Result<Vec<K>, Error> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse()
                .map_err(|_| Error::InvalidKey(token.to_owned()))
        })
        .collect()
}
