//! Typed error handling for the data-access layer
//!
//! Every fallible operation returns [`DiasporaError`], which wraps a more
//! specific error for each category so callers can match on exactly what
//! went wrong instead of inspecting strings.
//!
//! # Error Categories
//!
//! - [`QueryError`]: malformed queries or options (format, type, range, reference)
//! - [`EntityValidationError`]: an entity failed its attribute schema
//! - [`AdapterError`]: lifecycle and backend failures
//! - [`ConfigError`]: invalid collection configuration
//!
//! # Example
//!
//! ```rust,ignore
//! match adapter.normalize_options(&raw) {
//!     Ok(options) => run(options),
//!     Err(DiasporaError::Query(QueryError::Range { option, .. })) => {
//!         println!("option {option} is out of range");
//!     }
//!     Err(e) => eprintln!("Other error: {e}"),
//! }
//! ```

use crate::core::validation::FieldType;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, DiasporaError>;

/// The main error type of the crate
#[derive(Debug, Error)]
pub enum DiasporaError {
    /// Query or options normalization errors
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Entity schema validation errors
    #[error(transparent)]
    Validation(#[from] EntityValidationError),

    /// Adapter lifecycle or backend errors
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DiasporaError {
    /// Get the error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            DiasporaError::Query(e) => e.error_code(),
            DiasporaError::Validation(_) => "ENTITY_VALIDATION_ERROR",
            DiasporaError::Adapter(e) => e.error_code(),
            DiasporaError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl From<anyhow::Error> for DiasporaError {
    fn from(err: anyhow::Error) -> Self {
        DiasporaError::Adapter(AdapterError::Backend(err))
    }
}

// =============================================================================
// Query Errors
// =============================================================================

/// Errors raised while normalizing a query or its options
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    /// An alias and its canonical operator appear in the same condition
    #[error("search can't have both \"{alias}\" and \"{canonical}\" keys, as they are synonyms")]
    FormatConflict {
        alias: &'static str,
        canonical: &'static str,
    },

    /// A condition key is neither a canonical operator nor an alias
    #[error("unknown operator \"{key}\" on field '{field}'")]
    UnknownOperator { field: String, key: String },

    /// An option or operand has the wrong run-time type
    #[error("expected \"{subject}\" to be {expected}, got {value}")]
    TypeMismatch {
        subject: String,
        expected: &'static str,
        value: String,
    },

    /// A numeric option is out of bounds
    #[error("option \"{option}\" is out of range ({value}): {reason}")]
    Range {
        option: &'static str,
        value: String,
        reason: &'static str,
    },

    /// An option was given without the option it depends on
    #[error("option \"{option}\" requires option \"{requires}\"")]
    MissingOption {
        option: &'static str,
        requires: &'static str,
    },

    /// Two mutually exclusive options were given together
    #[error("option \"{option}\" can't be used together with \"{conflicts_with}\"")]
    IncompatibleOptions {
        option: &'static str,
        conflicts_with: &'static str,
    },
}

impl QueryError {
    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::FormatConflict { .. } => "QUERY_FORMAT_CONFLICT",
            QueryError::UnknownOperator { .. } => "QUERY_UNKNOWN_OPERATOR",
            QueryError::TypeMismatch { .. } => "QUERY_TYPE_MISMATCH",
            QueryError::Range { .. } => "QUERY_RANGE_ERROR",
            QueryError::MissingOption { .. } | QueryError::IncompatibleOptions { .. } => {
                "QUERY_REFERENCE_ERROR"
            }
        }
    }
}

// =============================================================================
// Entity Validation Errors
// =============================================================================

/// One step in the path to a nested attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of an attribute inside an entity, e.g. `test[0][1].name`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Path extended with an object key
    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self(segments)
    }

    /// Path extended with an array index
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// What went wrong at the failing attribute
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationFailure {
    /// A required attribute is absent or null
    MissingRequired,
    /// The value does not belong to the expected type
    TypeMismatch { expected: FieldType, actual: String },
    /// The value is none of the enum members
    EnumViolation { value: String },
    /// A strict object holds a key its descriptor does not know
    UnknownAttribute,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFailure::MissingRequired => write!(f, "a value is required"),
            ValidationFailure::TypeMismatch { expected, actual } => {
                write!(f, "expected type {}, got {}", expected, actual)
            }
            ValidationFailure::EnumViolation { value } => {
                write!(f, "value {} is not in the accepted set", value)
            }
            ValidationFailure::UnknownAttribute => write!(f, "attribute is not allowed"),
        }
    }
}

/// An entity failed schema validation
///
/// Carries the deepest failing path so nested failures can be located.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("entity validation failed at '{path}': {failure}")]
pub struct EntityValidationError {
    pub path: FieldPath,
    pub failure: ValidationFailure,
}

impl EntityValidationError {
    pub fn new(path: FieldPath, failure: ValidationFailure) -> Self {
        Self { path, failure }
    }
}

// =============================================================================
// Adapter Errors
// =============================================================================

/// Errors related to adapters and their lifecycle
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The adapter reached the error state during initialization
    #[error("adapter '{adapter}' failed to initialize: {cause}")]
    Initialization {
        adapter: String,
        cause: Arc<anyhow::Error>,
    },

    /// The lifecycle was dropped before it settled
    #[error("adapter '{adapter}' was dropped before becoming ready")]
    Abandoned { adapter: String },

    /// Neither member of a CRUD pair is implemented by the backend
    #[error("adapter '{adapter}' implements neither {operation} nor its sibling")]
    MissingPrimitive {
        adapter: String,
        operation: &'static str,
    },

    /// Failure raised by the backend itself
    #[error("backend error: {0}")]
    Backend(anyhow::Error),
}

impl AdapterError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AdapterError::Initialization { .. } => "ADAPTER_INITIALIZATION_ERROR",
            AdapterError::Abandoned { .. } => "ADAPTER_ABANDONED",
            AdapterError::MissingPrimitive { .. } => "ADAPTER_MISSING_PRIMITIVE",
            AdapterError::Backend(_) => "ADAPTER_BACKEND_ERROR",
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration parsing and collection setup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Two entity fields remap to the same store field
    #[error("collection '{collection}': fields '{first}' and '{second}' both remap to '{target}'")]
    DuplicateRemap {
        collection: String,
        first: String,
        second: String,
        target: String,
    },

    /// An enum pattern is not a valid regular expression
    #[error("invalid enum pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}
