//! Parser configuration.

/// Language level accepted by the parser.
///
/// The ordering is meaningful: later versions accept everything earlier ones
/// do. `Es5` selects the index-based destructuring lowering and rejects the
/// post-ES5 syntax; everything from `Es2015` up uses the iterator protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EcmaVersion {
    Es5,
    Es2015,
    Es2016,
    Es2017,
    Es2018,
    Es2019,
    Es2020,
    Latest,
}

impl EcmaVersion {
    pub fn at_least(self, other: EcmaVersion) -> bool {
        self >= other
    }
}

/// Configured environment for a parse.
///
/// A config is cheap to clone and carries no state; the same config can drive
/// any number of parser instances.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Language level; defaults to [`EcmaVersion::Latest`]
    pub version: EcmaVersion,
    /// Start out strict regardless of directives (forced for modules)
    pub strict: bool,
    /// Keep parsing after syntax errors and return an AST with Error nodes;
    /// the collected diagnostics are the caller's to inspect
    pub recover_from_errors: bool,
    /// IDE mode: implies recovery, never fails the parse
    pub ide_mode: bool,
    /// Record comments in the parse output and attach jsdoc to declarations
    pub record_comments: bool,
    /// Upgrade strict-mode warnings to errors
    pub warning_as_error: bool,
    /// Tolerate future-reserved words (`enum`) as identifiers in sloppy code
    pub reserved_keyword_as_identifier: bool,
    /// The source is eval text: enables the Annex-B function-in-block
    /// hoisting exception
    pub in_eval: bool,
    /// URI attached to diagnostics
    pub source_uri: Option<String>,
    /// Reported line number of the first source line
    pub start_line: u32,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            version: EcmaVersion::Latest,
            strict: false,
            recover_from_errors: false,
            ide_mode: false,
            record_comments: false,
            warning_as_error: false,
            reserved_keyword_as_identifier: false,
            in_eval: false,
            source_uri: None,
            start_line: 1,
        }
    }
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: EcmaVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_ide_mode(mut self, ide: bool) -> Self {
        self.ide_mode = ide;
        self
    }

    pub fn with_recovery(mut self, recover: bool) -> Self {
        self.recover_from_errors = recover;
        self
    }

    pub fn with_comments(mut self, record: bool) -> Self {
        self.record_comments = record;
        self
    }

    pub fn with_source_uri(mut self, uri: impl Into<String>) -> Self {
        self.source_uri = Some(uri.into());
        self
    }

    /// Recovery is on when asked for directly or implied by IDE mode.
    pub fn recovering(&self) -> bool {
        self.recover_from_errors || self.ide_mode
    }

    /// Iterator-protocol destructuring and the rest of the ES2015 surface.
    pub fn es2015(&self) -> bool {
        self.version.at_least(EcmaVersion::Es2015)
    }
}
