//! Recognition of "already satisfied" failures
//!
//! The node tooling reports re-applied state as an error: creating an
//! account that exists, importing a key the wallet holds, deploying the code
//! an account already runs. These are the only failures a re-run is expected
//! to hit, so they are mapped to a soft outcome here. Everything not listed
//! stays a hard failure.
//!
//! Chain and wallet exceptions carry a stable numeric code (`Error NNNNNNN:`).
//! Contract assertions all share one code, so those are matched on the
//! assertion message instead.

/// Exception codes meaning the requested state already holds
const SATISFIED_CODES: &[(u32, &str)] = &[
    (3_050_001, "account already exists"),
    (3_120_001, "wallet already exists"),
    (3_120_007, "wallet already unlocked"),
    (3_120_008, "key already in wallet"),
    (3_160_008, "contract code already deployed"),
];

/// Contract assertion / feature messages meaning the same
const SATISFIED_MESSAGES: &[(&str, &str)] = &[
    ("token with symbol already exists", "token already created"),
    ("quantity exceeds available supply", "token supply already issued"),
    (
        "system contract has already been initialized",
        "system contract already initialized",
    ),
    ("already been activated", "protocol feature already activated"),
    ("is already activated", "protocol feature already activated"),
    ("already pre-activated", "protocol feature already scheduled"),
];

/// If `stderr` reports state that already holds, say which
pub fn already_satisfied(stderr: &str) -> Option<&'static str> {
    if let Some(code) = error_code(stderr) {
        if let Some((_, reason)) = SATISFIED_CODES.iter().find(|(c, _)| *c == code) {
            return Some(reason);
        }
    }

    let lowered = stderr.to_ascii_lowercase();
    SATISFIED_MESSAGES
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, reason)| *reason)
}

/// First `Error NNNNNNN:` code in the output
fn error_code(stderr: &str) -> Option<u32> {
    stderr.lines().find_map(|line| {
        let rest = line.trim_start().strip_prefix("Error ")?;
        let (digits, _) = rest.split_once(':')?;
        digits.trim().parse().ok()
    })
}
