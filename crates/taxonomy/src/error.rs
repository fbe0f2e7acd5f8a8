use crate::tree::NodeId;

#[derive(Debug, thiserror::Error)]
pub enum TaxonomyError {
    #[error("invalid {filter} filter: {message}")]
    FilterParse {
        filter: &'static str,
        message: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),
}

impl TaxonomyError {
    /// Builds a parse error for the named filter category.
    pub fn filter(filter: &'static str, message: impl Into<String>) -> Self {
        Self::FilterParse {
            filter,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TaxonomyError>;
