//! Error types and handling for librovore-core operations.
//!
//! Every public function returns [`Result<T, Error>`]. Each variant carries
//! the structured fields a caller needs to render a one-line CLI message or a
//! JSON-RPC error object: a stable [`Error::category`] tag and a
//! human-oriented [`Error::suggestion`].

use thiserror::Error;

/// Convenience alias used throughout librovore-core.
pub type Result<T> = std::result::Result<T, Error>;

/// The structured error taxonomy for librovore-core.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// No processor could handle this source, or a named processor is unknown.
    #[error("no processor available for {subject}")]
    ProcessorInavailability {
        /// The source URL or the processor name that was requested.
        subject: String,
    },

    /// Network or I/O failure while fetching the inventory artifact.
    #[error("inventory inaccessible at {source}: {cause}")]
    InventoryInaccessibility {
        /// The inventory source URL.
        source: String,
        /// The underlying failure description.
        cause: String,
    },

    /// The inventory artifact was fetched but is malformed.
    #[error("inventory invalid at {source}: {cause}")]
    InventoryInvalidity {
        /// The inventory source URL.
        source: String,
        /// Description of the malformation.
        cause: String,
    },

    /// The source URL could not be parsed.
    #[error("invalid inventory URL: {source}")]
    InventoryUrlInvalidity {
        /// The offending URL text.
        source: String,
    },

    /// The source URL uses a scheme this cache proxy does not support.
    #[error("unsupported URL scheme for inventory: {source}")]
    InventoryUrlNoSupport {
        /// The offending URL text.
        source: String,
    },

    /// Network or I/O failure while fetching a documentation page.
    #[error("documentation inaccessible at {url}: {cause}")]
    DocumentationInaccessibility {
        /// The documentation page URL.
        url: String,
        /// The underlying failure description.
        cause: String,
    },

    /// The page was fetched but no recognizable main-content container was found.
    #[error("no recognizable content container at {url}")]
    DocumentationContentAbsence {
        /// The documentation page URL.
        url: String,
    },

    /// The main content was found but the referenced anchor/element is absent.
    #[error("object {object_id} not found on page {url}")]
    DocumentationObjectAbsence {
        /// The inventory object's identifier (name).
        object_id: String,
        /// The documentation page URL.
        url: String,
    },

    /// HTML parser error.
    #[error("failed to parse page {url}: {cause}")]
    DocumentationParseFailure {
        /// The documentation page URL.
        url: String,
        /// The underlying parser failure description.
        cause: String,
    },

    /// Extraction succeeded mechanically but produced no meaningful content at all.
    #[error("processor {processor_name} could not extract content from {source}")]
    StructureIncompatibility {
        /// The structure processor's name.
        processor_name: String,
        /// The documentation source.
        source: String,
    },

    /// Extraction's success rate fell below the configured threshold.
    #[error(
        "processor {processor_name} extracted only {meaningful_results}/{requested_objects} \
         meaningful documents from {source}"
    )]
    ContentExtractFailure {
        /// The structure processor's name.
        processor_name: String,
        /// The documentation source.
        source: String,
        /// Number of documents judged "meaningful".
        meaningful_results: usize,
        /// Number of objects originally requested.
        requested_objects: usize,
    },

    /// `robots.txt` forbids this request.
    #[error("robots.txt forbids {user_agent} from fetching {url}")]
    UrlImpermissibility {
        /// The requested URL.
        url: String,
        /// The user agent that was denied.
        user_agent: String,
    },

    /// Textual decoding was requested but a binary mimetype was returned.
    #[error("expected textual content at {url} ({context}), got {mimetype}")]
    HttpContentTypeInvalidity {
        /// The requested URL.
        url: String,
        /// The mimetype the server reported.
        mimetype: String,
        /// What the caller was trying to do (e.g. "parsing objects.inv").
        context: String,
    },

    /// Invalid regex (or other malformed behavior) in a search filter.
    #[error("invalid search filter: {message}")]
    InventoryFilterInvalidity {
        /// Description of what was invalid.
        message: String,
    },

    /// A `Detection`'s confidence fell outside `[0.0, 1.0]`.
    #[error("detection confidence {confidence} out of range [0.0, 1.0]")]
    DetectionConfidenceInvalidity {
        /// The out-of-range confidence value.
        confidence: f64,
    },

    /// Configuration file is malformed or inaccessible.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// A stable, machine-readable tag for this error's category.
    ///
    /// This is the `error_type` field emitted by the MCP server and the
    /// symbol printed by the CLI's one-line error renderer.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::ProcessorInavailability { .. } => "ProcessorInavailability",
            Self::InventoryInaccessibility { .. } => "InventoryInaccessibility",
            Self::InventoryInvalidity { .. } => "InventoryInvalidity",
            Self::InventoryUrlInvalidity { .. } => "InventoryUrlInvalidity",
            Self::InventoryUrlNoSupport { .. } => "InventoryUrlNoSupport",
            Self::DocumentationInaccessibility { .. } => "DocumentationInaccessibility",
            Self::DocumentationContentAbsence { .. } => "DocumentationContentAbsence",
            Self::DocumentationObjectAbsence { .. } => "DocumentationObjectAbsence",
            Self::DocumentationParseFailure { .. } => "DocumentationParseFailure",
            Self::StructureIncompatibility { .. } => "StructureIncompatibility",
            Self::ContentExtractFailure { .. } => "ContentExtractFailure",
            Self::UrlImpermissibility { .. } => "UrlImpermissibility",
            Self::HttpContentTypeInvalidity { .. } => "HttpContentTypeInvalidity",
            Self::InventoryFilterInvalidity { .. } => "InventoryFilterInvalidity",
            Self::DetectionConfidenceInvalidity { .. } => "DetectionConfidenceInvalidity",
            Self::Config(_) => "Config",
        }
    }

    /// A one-line, human-oriented suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::ProcessorInavailability { .. } => {
                "verify the source is a supported documentation site, or name a registered processor"
            },
            Self::InventoryInaccessibility { .. } => {
                "check that the source is reachable and the inventory path is correct"
            },
            Self::InventoryInvalidity { .. } => {
                "the inventory artifact does not match the expected format for this processor"
            },
            Self::InventoryUrlInvalidity { .. } | Self::InventoryUrlNoSupport { .. } => {
                "use an http(s) or file URL, or a local path"
            },
            Self::DocumentationInaccessibility { .. } => {
                "check that the documentation page is reachable"
            },
            Self::DocumentationContentAbsence { .. } => {
                "verify this is a documentation page rendered by a supported theme"
            },
            Self::DocumentationObjectAbsence { .. } => {
                "the inventory may be stale relative to the rendered site"
            },
            Self::DocumentationParseFailure { .. } => "the page's HTML could not be parsed",
            Self::StructureIncompatibility { .. } => {
                "verify this is a documentation site rendered by a supported theme"
            },
            Self::ContentExtractFailure { .. } => {
                "most requested objects could not be extracted; the site's markup may have changed"
            },
            Self::UrlImpermissibility { .. } => {
                "this request is disallowed by the site's robots.txt"
            },
            Self::HttpContentTypeInvalidity { .. } => {
                "the server returned a non-textual response where text was expected"
            },
            Self::InventoryFilterInvalidity { .. } => "check the regex pattern in your query",
            Self::DetectionConfidenceInvalidity { .. } => {
                "a processor reported an invalid confidence value; this is an internal error"
            },
            Self::Config(_) => "check the configuration file for syntax or value errors",
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::InventoryInaccessibility {
            source: String::new(),
            cause: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_matches_all_variants() {
        let err = Error::UrlImpermissibility {
            url: "https://example.com".into(),
            user_agent: "librovore".into(),
        };
        assert_eq!(err.category(), "UrlImpermissibility");
        assert!(!err.suggestion().is_empty());
    }
}
