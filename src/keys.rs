use crate::args::{CanonicalArg, canonical_string};

/// Namespace for uniqueness keys when no override is configured.
pub const DEFAULT_PREFIX: &str = "solo:uniqueness";

/// Fixed-width 128-bit hex digest of the canonical argument string form.
/// Identity only, not confidentiality: any uniformly-distributed digest
/// works, keyed solely by the stringified argument sequence.
pub fn args_digest(args: &[CanonicalArg]) -> String {
    let hex = blake3::hash(canonical_string(args).as_bytes()).to_hex();
    hex[..32].to_string()
}

/// Operation names may contain the key separator themselves; fold it away so
/// a name like `billing::Invoice` cannot collide with the joined structure.
fn escape_operation(operation: &str) -> String {
    operation.replace(':', "_")
}

/// Lock key for a WorkIdentity: `<prefix>:<operation>[:<digest>]`.
/// The digest is omitted for an empty argument list.
pub fn uniqueness_key(prefix: &str, operation: &str, args: &[CanonicalArg]) -> String {
    let mut key = format!("{}:{}", prefix, escape_operation(operation));
    if !args.is_empty() {
        key.push(':');
        key.push_str(&args_digest(args));
    }
    key
}

/// Error-counter key for the same WorkIdentity, under an `errors`
/// sub-namespace so it can never collide with a lock key.
pub fn error_count_key(prefix: &str, operation: &str, args: &[CanonicalArg]) -> String {
    let mut key = format!("{}:errors:{}", prefix, escape_operation(operation));
    if !args.is_empty() {
        key.push(':');
        key.push_str(&args_digest(args));
    }
    key
}
