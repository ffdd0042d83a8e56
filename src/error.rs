use thiserror::Error;

/// Failures while loading an instance file.
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("cannot read instance file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("missing or unparsable header line {line} ({label})")]
    Header { line: usize, label: &'static str },
    #[error("expected {expected} customer records, found {found}")]
    CustomerCount { expected: usize, found: usize },
    #[error("malformed customer record on line {line}: {text}")]
    CustomerRecord { line: usize, text: String },
    #[error("missing or unparsable drone beta coefficient")]
    MissingBeta,
}

/// Failures inside the ICA engine: no imperialist could be selected.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no imperialists could be selected: population is empty")]
    EmptyPopulation,
}
