//! Sources loaded during a compilation, keyed by [`SourceId`].
//!
//! The main file and every resolved module land here so that
//! diagnostics can name the file they point into.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct SourceId(usize);

#[derive(Default, Debug, Clone)]
pub struct SourceMap {
    sources: Vec<Source>,
}

#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub source: String,
}

impl Source {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

impl SourceMap {
    pub fn insert(&mut self, source: Source) -> SourceId {
        let id = SourceId(self.sources.len());
        self.sources.push(source);
        id
    }

    #[allow(clippy::missing_panics_doc)]
    pub fn insert_and_get(&mut self, source: Source) -> (SourceId, &Source) {
        let id = self.insert(source);
        (id, self.get(id).unwrap())
    }

    pub fn get(&self, id: SourceId) -> Option<&Source> {
        self.sources.get(id.0)
    }

    pub fn name(&self, id: SourceId) -> Option<&str> {
        self.get(id).map(|source| source.name.as_str())
    }
}
