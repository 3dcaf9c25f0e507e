use crate::BoxedIncludeProviderError;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedIncludePath(pub String);

/// User-supplied include reader
///
/// `#include "X"` directives in definition text are handed to `resolve_path`
/// first, and the resolved path is then read with `get_include`.
pub trait IncludeProvider {
    fn resolve_path(&self, path: &str) -> Result<ResolvedIncludePath, BoxedIncludeProviderError>;

    fn get_include(
        &mut self,
        path: &ResolvedIncludePath,
    ) -> Result<String, BoxedIncludeProviderError>;
}
