//! Structured logging field names shared by every CipherCore crate.
//!
//! Log aggregation queries rely on these names staying stable.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Stored key material is inconsistent, operator attention needed |
//! | WARN  | Rejected credentials, failed integrity findings on a read |
//! | INFO  | Account registered, message sent, message read |
//! | DEBUG | Policy choices, rewrap decisions, timings |
//!
//! Passwords, KEKs, private keys, message keys and plaintext are never
//! logged at any level.

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "crypto", "service", "store", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Logical operation name.
/// Examples: "register", "login", "send", "read", "unlock", "open"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Account id being operated on.
pub const ACCOUNT_ID: &str = "account_id";

/// Message id being operated on.
pub const MESSAGE_ID: &str = "message_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Recomputed content hash matched the stored one.
pub const HASH_VALID: &str = "hash_valid";

/// Sender signature verified.
pub const SIGNATURE_VALID: &str = "signature_valid";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Whether the operation succeeded.
pub const SUCCESS: &str = "success";

/// Error message (on failure).
pub const ERROR_MSG: &str = "error";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_are_unique() {
        let fields = [
            SUBSYSTEM,
            OPERATION,
            ACCOUNT_ID,
            MESSAGE_ID,
            DURATION_MS,
            HASH_VALID,
            SIGNATURE_VALID,
            SUCCESS,
            ERROR_MSG,
        ];
        let unique: std::collections::HashSet<_> = fields.iter().collect();
        assert_eq!(unique.len(), fields.len());
    }

    #[test]
    fn test_integrity_fields_match_envelope_serialization() {
        assert_eq!(HASH_VALID, "hash_valid");
        assert_eq!(SIGNATURE_VALID, "signature_valid");
    }
}
