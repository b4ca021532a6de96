//! Shared compiler conventions (well-known identifiers).

/// Name of a factory method on a target type.
pub const FACTORY_METHOD_NAME: &str = "map";

/// Decorator marking a class as a mapping target: `@map_from(Source)`.
pub const MAP_FROM_DECORATOR: &str = "map_from";

/// Suffix of the generated static container: `{Target}Mapper`.
pub const MAPPER_SUFFIX: &str = "Mapper";

/// Prefix of the Stage-P record name: `Params_{digest}`.
pub const PARAMS_RECORD_PREFIX: &str = "Params";

/// Prefix of the Stage-V record name: `Vars_{digest}`.
pub const VARS_RECORD_PREFIX: &str = "Vars";

/// Lambda parameter of the Stage-V and Stage-F projections.
pub const STAGE_PARAMETER: &str = "_params";

/// Lambda parameter of projections that read a source value directly.
pub const SOURCE_PARAMETER: &str = "x";

/// Number of hex characters of the declaration digest used in generated names.
pub const DIGEST_LEN: usize = 6;

/// Prefix of synthesized property getters.
pub const GETTER_PREFIX: &str = "get_";

/// Prefix of synthesized property setters.
pub const SETTER_PREFIX: &str = "set_";

/// Type name used when inference has nothing better.
pub const ANY_TYPE_NAME: &str = "any";

/// Module the generated namespace tree is wrapped in.
pub const GENERATED_MODULE: &str = "mappers";

/// Rust path compiled namespaces hang off in generated code.
pub const SOURCE_ROOT: &str = "crate";
