use smol_str::SmolStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("must provide query type")]
    NoQueryTypeSpecified,
    #[error("duplicate type name: `{0}`")]
    DuplicateTypeName(SmolStr),
    #[error("duplicate directive name: `@{0}`")]
    DuplicateDirectiveName(SmolStr),
    #[error("unknown type `{type_name}` referenced from `{referenced_from}`")]
    UnknownTypeReference {
        type_name: SmolStr,
        referenced_from: SmolStr,
    },
    #[error("couldn't parse schema: {0}")]
    SchemaParse(String),
    #[error("couldn't parse document: {0}")]
    DocumentParse(String),
    #[error("unsupported schema definition: {0}")]
    UnsupportedSchemaDefinition(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<TSuccess> = std::result::Result<TSuccess, Error>;
