use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can abort a reflection call. There is no partial output:
/// any of these discards the schema being built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unsupported type `{type_name}`")]
    UnsupportedType { type_name: String },
    #[error("embedded member `{member}` of `{record}` is not a record")]
    EmbeddedNotRecord { record: String, member: String },
    #[error("`{type_name}` is enumerable but exposes no variants")]
    EmptyEnum { type_name: String },
    #[error("definition `{0}` was registered twice")]
    DuplicateDefinition(String),
    #[error("definition `{0}` was reserved but never built")]
    UnresolvedDefinition(String),
}
