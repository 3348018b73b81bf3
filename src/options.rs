/// How identifiers inside an expression find their values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubstitutionMode {
    /// Identifiers are tokenized as words and looked up while evaluating.
    #[default]
    Deferred,
    /// Identifiers are rewritten into literal text before tokenizing.
    Textual,
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    pub substitution: SubstitutionMode,
    /// Seed for `random`/`randint`/`choice`; `None` draws one from entropy.
    pub seed: Option<u64>,
}

impl Options {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_substitution(mut self, substitution: SubstitutionMode) -> Self {
        self.substitution = substitution;
        self
    }
}
