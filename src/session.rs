use std::path::Path;

use crate::{parse_definitions, LumpIndex, PreviewError, ShaderDefinition};

/// Parsed definitions of one mod, with the index they were resolved against
#[derive(Debug)]
pub struct Session {
    pub index: LumpIndex,
    pub definitions: Vec<ShaderDefinition>,
}

impl Session {
    pub fn new(index: LumpIndex) -> Self {
        let definitions = parse_definitions(&index);
        log::debug!("found {} shader definitions", definitions.len());
        Session { index, definitions }
    }

    pub fn load(mod_root: impl AsRef<Path>) -> Result<Self, PreviewError> {
        Ok(Session::new(LumpIndex::build(mod_root)?))
    }

    /// Identifiers of all definitions, in parse order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.identifier.as_str())
    }

    pub fn find(&self, identifier: &str) -> Option<&ShaderDefinition> {
        let identifier = identifier.to_lowercase();
        self.definitions.iter().find(|d| d.identifier == identifier)
    }

    pub fn find_mut(&mut self, identifier: &str) -> Option<&mut ShaderDefinition> {
        let identifier = identifier.to_lowercase();
        self.definitions
            .iter_mut()
            .find(|d| d.identifier == identifier)
    }
}
