use thiserror::Error;

/// Errors raised while compiling a locale's pattern tables.
#[derive(Error, Debug)]
pub enum LexiconError {
    #[error("invalid pattern for {table}: {source}")]
    Pattern {
        table: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// Errors raised while loading a knowledge table.
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("failed to read knowledge file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse knowledge file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("knowledge topic '{0}' has no patterns")]
    NoPatterns(String),

    #[error("knowledge topic '{0}' has no answers")]
    NoAnswers(String),

    #[error("duplicate knowledge topic '{0}'")]
    DuplicateTopic(String),
}
