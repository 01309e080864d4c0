//! The RPC error taxonomy.
//!
//! Code/token pairs are part of the wire protocol: existing values never
//! change, new kinds only append. Clients branch on the token, so the same
//! input must always map to the same token and message.

use meridian_json::Value;
use meridian_ledger::{MarkerError, ResolveError};

/// Enumerated error kinds. Append-only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    UnknownCommand,
    MissingField,
    MalformedField,
    FieldTypeMismatch,
    InvalidParams,
    EntityNotFound,
    LedgerIndexTooSmall,
    LedgerIndexTooLarge,
    LedgerNotFound,
    /// A marker referencing a page or position that no longer exists. Shares
    /// the `invalidParams` wire token for compatibility; distinct in code so
    /// logs can tell the cases apart.
    StaleMarker,
    AccessDenied,
    NotSynchronized,
    Internal,
}

impl ErrorKind {
    /// Stable numeric code.
    pub fn code(self) -> u32 {
        match self {
            ErrorKind::UnknownCommand => 1,
            ErrorKind::MissingField => 2,
            ErrorKind::MalformedField => 3,
            ErrorKind::FieldTypeMismatch => 4,
            ErrorKind::InvalidParams => 5,
            ErrorKind::EntityNotFound => 6,
            ErrorKind::LedgerIndexTooSmall => 7,
            ErrorKind::LedgerIndexTooLarge => 8,
            ErrorKind::LedgerNotFound => 9,
            ErrorKind::StaleMarker => 5,
            ErrorKind::AccessDenied => 10,
            ErrorKind::NotSynchronized => 11,
            ErrorKind::Internal => 12,
        }
    }

    /// Stable machine token.
    pub fn token(self) -> &'static str {
        match self {
            ErrorKind::UnknownCommand => "unknownCmd",
            ErrorKind::MissingField => "missingField",
            ErrorKind::MalformedField => "malformedField",
            ErrorKind::FieldTypeMismatch => "fieldTypeMismatch",
            ErrorKind::InvalidParams | ErrorKind::StaleMarker => "invalidParams",
            ErrorKind::EntityNotFound => "notFound",
            ErrorKind::LedgerIndexTooSmall => "indexTooSmall",
            ErrorKind::LedgerIndexTooLarge => "indexTooLarge",
            ErrorKind::LedgerNotFound => "ledgerNotFound",
            ErrorKind::AccessDenied => "accessDenied",
            ErrorKind::NotSynchronized => "notSynced",
            ErrorKind::Internal => "internal",
        }
    }

    /// Canned human-readable message.
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::UnknownCommand => "Unknown method.",
            ErrorKind::MissingField => "Missing field.",
            ErrorKind::MalformedField => "Invalid field.",
            ErrorKind::FieldTypeMismatch => "Field has wrong type.",
            ErrorKind::InvalidParams | ErrorKind::StaleMarker => "Invalid parameters.",
            ErrorKind::EntityNotFound => "Not found.",
            ErrorKind::LedgerIndexTooSmall => "Ledger index too small.",
            ErrorKind::LedgerIndexTooLarge => "Ledger index too large.",
            ErrorKind::LedgerNotFound => "Ledger not found.",
            ErrorKind::AccessDenied => "Access denied.",
            ErrorKind::NotSynchronized => "Not synchronized to the network.",
            ErrorKind::Internal => "Internal error.",
        }
    }
}

/// An error ready for envelope serialization: kind, message and optional
/// extra context fields (e.g. `have_header` on ledger lookups).
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorObject {
    pub kind: ErrorKind,
    pub message: String,
    pub extra: Vec<(String, Value)>,
}

impl ErrorObject {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: kind.message().to_owned(),
            extra: Vec::new(),
        }
    }

    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            extra: Vec::new(),
        }
    }

    /// `Missing field 'X'.`
    pub fn missing_field(field: &str) -> Self {
        Self::with_message(ErrorKind::MissingField, format!("Missing field '{field}'."))
    }

    /// `Invalid field 'X'.`
    pub fn invalid_field(field: &str) -> Self {
        Self::with_message(ErrorKind::MalformedField, format!("Invalid field '{field}'."))
    }

    /// `Field 'X' has wrong type.`
    pub fn type_mismatch(field: &str) -> Self {
        Self::with_message(
            ErrorKind::FieldTypeMismatch,
            format!("Field '{field}' has wrong type."),
        )
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }
}

impl From<ResolveError> for ErrorObject {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::IndexTooSmall => ErrorObject::new(ErrorKind::LedgerIndexTooSmall),
            ResolveError::IndexTooLarge => ErrorObject::new(ErrorKind::LedgerIndexTooLarge),
            ResolveError::NotFound { have_header } => {
                ErrorObject::new(ErrorKind::LedgerNotFound).with_field("have_header", have_header)
            }
            ResolveError::NotSynchronized => ErrorObject::new(ErrorKind::NotSynchronized),
        }
    }
}

impl From<MarkerError> for ErrorObject {
    fn from(e: MarkerError) -> Self {
        match e {
            MarkerError::Malformed => ErrorObject::invalid_field("marker"),
            MarkerError::Stale => ErrorObject::new(ErrorKind::StaleMarker),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_marker_shares_the_invalid_params_wire_surface() {
        let stale = ErrorObject::from(MarkerError::Stale);
        assert_eq!(stale.kind, ErrorKind::StaleMarker);
        assert_eq!(stale.kind.token(), ErrorKind::InvalidParams.token());
        assert_eq!(stale.kind.code(), ErrorKind::InvalidParams.code());
        assert_eq!(stale.message, ErrorKind::InvalidParams.message());
    }

    #[test]
    fn malformed_marker_is_a_field_error() {
        let e = ErrorObject::from(MarkerError::Malformed);
        assert_eq!(e.kind, ErrorKind::MalformedField);
        assert_eq!(e.message, "Invalid field 'marker'.");
    }

    #[test]
    fn parameterized_messages_are_deterministic() {
        assert_eq!(
            ErrorObject::missing_field("account").message,
            ErrorObject::missing_field("account").message
        );
        assert_eq!(
            ErrorObject::type_mismatch("limit").message,
            "Field 'limit' has wrong type."
        );
    }

    #[test]
    fn not_found_ledger_carries_header_hint() {
        let e = ErrorObject::from(ResolveError::NotFound { have_header: true });
        assert_eq!(e.kind, ErrorKind::LedgerNotFound);
        assert_eq!(e.extra, vec![("have_header".to_owned(), Value::Bool(true))]);
    }
}
