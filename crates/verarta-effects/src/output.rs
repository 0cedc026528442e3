//! Parsers for the text `cleos` prints on success
//!
//! `cleos create key --to-console` prints
//!
//! ```text
//! Private key: 5K...
//! Public key: EOS...
//! ```
//!
//! and `cleos wallet create --to-console` prints a few lines of advice
//! followed by the quoted password. Anything that does not yield exactly one
//! value per field is rejected. `cleos get table` prints a JSON object whose
//! `rows` array is all that is kept.

use verarta_core::KeyPair;

const PRIVATE_LABEL: &str = "Private key:";
const PUBLIC_LABEL: &str = "Public key:";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OutputError {
    #[error("no '{label}' line in output")]
    MissingField { label: &'static str },

    #[error("more than one '{label}' line in output")]
    DuplicateField { label: &'static str },

    #[error("'{label}' line has an empty or malformed value")]
    MalformedValue { label: &'static str },

    #[error("no wallet password in output")]
    MissingPassword,

    #[error("table output is not a JSON object with a 'rows' array: {0}")]
    MalformedTable(String),
}

/// Extract the key pair from `create key` output
pub fn parse_key_pair(output: &str) -> Result<KeyPair, OutputError> {
    let mut private = None;
    let mut public = None;

    for line in output.lines().map(str::trim) {
        let (slot, label, value) = if let Some(value) = line.strip_prefix(PRIVATE_LABEL) {
            (&mut private, PRIVATE_LABEL, value)
        } else if let Some(value) = line.strip_prefix(PUBLIC_LABEL) {
            (&mut public, PUBLIC_LABEL, value)
        } else {
            continue;
        };

        let value = value.trim();
        if value.is_empty() || value.chars().any(char::is_whitespace) {
            return Err(OutputError::MalformedValue { label });
        }
        if slot.replace(value.to_string()).is_some() {
            return Err(OutputError::DuplicateField { label });
        }
    }

    let private = private.ok_or(OutputError::MissingField {
        label: PRIVATE_LABEL,
    })?;
    let public = public.ok_or(OutputError::MissingField {
        label: PUBLIC_LABEL,
    })?;
    Ok(KeyPair::new(public, private))
}

/// Extract the password from `wallet create --to-console` output
pub fn parse_wallet_password(output: &str) -> Result<String, OutputError> {
    output
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('"')?.strip_suffix('"'))
        .find(|pw| pw.starts_with("PW") && !pw.chars().any(char::is_whitespace))
        .map(str::to_string)
        .ok_or(OutputError::MissingPassword)
}

/// Extract the rows from `get table` output
pub fn parse_table_rows(output: &str) -> Result<Vec<serde_json::Value>, OutputError> {
    let mut document: serde_json::Value = serde_json::from_str(output.trim())
        .map_err(|e| OutputError::MalformedTable(e.to_string()))?;
    match document.get_mut("rows").map(serde_json::Value::take) {
        Some(serde_json::Value::Array(rows)) => Ok(rows),
        _ => Err(OutputError::MalformedTable("missing 'rows'".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";
    const PUBLIC: &str = "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV";

    #[test]
    fn parses_canonical_output() {
        let output = format!("Private key: {PRIVATE}\nPublic key: {PUBLIC}\n");
        assert_eq!(parse_key_pair(&output).unwrap(), KeyPair::new(PUBLIC, PRIVATE));
    }

    #[test]
    fn tolerates_order_whitespace_and_crlf() {
        let output = format!("  Public key:   {PUBLIC}  \r\n\r\nPrivate key:{PRIVATE}\r\n");
        assert_eq!(parse_key_pair(&output).unwrap(), KeyPair::new(PUBLIC, PRIVATE));
    }

    #[test]
    fn ignores_noise_lines() {
        let output =
            format!("warning: no config\nPrivate key: {PRIVATE}\nsomething else\nPublic key: {PUBLIC}");
        assert!(parse_key_pair(&output).is_ok());
    }

    #[test]
    fn missing_lines_are_rejected() {
        assert_eq!(
            parse_key_pair(&format!("Private key: {PRIVATE}")),
            Err(OutputError::MissingField {
                label: PUBLIC_LABEL
            })
        );
        assert_eq!(
            parse_key_pair(&format!("Public key: {PUBLIC}")),
            Err(OutputError::MissingField {
                label: PRIVATE_LABEL
            })
        );
        assert!(parse_key_pair("").is_err());
    }

    #[test]
    fn duplicate_lines_are_rejected() {
        let output = format!("Private key: {PRIVATE}\nPublic key: {PUBLIC}\nPublic key: {PUBLIC}");
        assert_eq!(
            parse_key_pair(&output),
            Err(OutputError::DuplicateField {
                label: PUBLIC_LABEL
            })
        );
    }

    #[test]
    fn empty_or_split_values_are_rejected() {
        let output = format!("Private key:\nPublic key: {PUBLIC}");
        assert_eq!(
            parse_key_pair(&output),
            Err(OutputError::MalformedValue {
                label: PRIVATE_LABEL
            })
        );

        let output = format!("Private key: {PRIVATE} extra\nPublic key: {PUBLIC}");
        assert!(parse_key_pair(&output).is_err());
    }

    #[test]
    fn finds_wallet_password() {
        let output = "Creating wallet: default\n\
                      Save password to use in the future to unlock this wallet.\n\
                      Without password imported keys will not be retrievable.\n\
                      \"PW5JcEu7jTXd7XwxVx5wZ9Y6Xn8J4aE5rrDT4rQ8wFDBjBpQ3cVgg\"\n";
        assert_eq!(
            parse_wallet_password(output).unwrap(),
            "PW5JcEu7jTXd7XwxVx5wZ9Y6Xn8J4aE5rrDT4rQ8wFDBjBpQ3cVgg"
        );
        assert_eq!(
            parse_wallet_password("Creating wallet: default\n"),
            Err(OutputError::MissingPassword)
        );
    }

    #[test]
    fn table_rows_are_read_from_the_rows_array() {
        let output = r#"{"rows":[{"supply":"10000000000.0000 RAMCORE"}],"more":false,"next_key":""}"#;
        let rows = parse_table_rows(output).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["supply"], "10000000000.0000 RAMCORE");

        assert!(parse_table_rows(r#"{"rows":[],"more":false}"#).unwrap().is_empty());
        assert!(parse_table_rows("Error 3060003: Contract Table Query Exception").is_err());
        assert!(parse_table_rows(r#"{"more":false}"#).is_err());
    }
}
