//! Scope chain and symbol tracking.
//!
//! Scopes live in an arena and refer to each other by index: an upward chain
//! of parent links and a downward tree of children. Each scope owns its symbol
//! map plus the bookkeeping sets needed for redeclaration checking — the names
//! of `var`s hoisted through a block, the function declarations made directly
//! in a block (generators distinguished), and the catch parameter when the
//! scope belongs to a `catch` clause.
//!
//! [`ScopeArena::define`] implements the redeclaration matrix. It stays pure:
//! outcomes are returned as data and the parser turns them into diagnostics,
//! so positions stay where the parser knows them.

use rustc_hash::{FxHashMap, FxHashSet};

/// Index of a scope in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// What kind of construct opened the scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Top level of a classic script
    Script,
    /// Top level of a module; function declarations are lexical here
    Module,
    /// Body of a function, method, or arrow
    Function,
    /// Plain `{ }` block
    Block,
    /// Body scope of an iteration statement
    Loop,
    /// The whole `switch` body; cases share one scope
    Switch,
    /// `catch` clause
    Catch,
    /// `for (...)` head holding lexical loop bindings
    ForHead,
    /// Class body (private names, computed keys)
    ClassBody,
}

impl ScopeKind {
    /// Function-level scopes terminate `var` hoisting.
    pub fn is_function_scope(self) -> bool {
        matches!(self, ScopeKind::Script | ScopeKind::Module | ScopeKind::Function)
    }
}

/// Declaration kind of a bound name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Var,
    Let,
    Const,
    Function,
    Param,
    CatchParam,
}

impl SymbolKind {
    pub fn is_lexical(self) -> bool {
        matches!(self, SymbolKind::Let | SymbolKind::Const)
    }

    pub fn describe(self) -> &'static str {
        match self {
            SymbolKind::Var => "var",
            SymbolKind::Let => "let",
            SymbolKind::Const => "const",
            SymbolKind::Function => "function",
            SymbolKind::Param => "parameter",
            SymbolKind::CatchParam => "catch parameter",
        }
    }
}

/// One scope record.
#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    /// name -> declaration kind
    symbols: FxHashMap<String, SymbolKind>,
    /// `var` names declared below and hoisted through this block
    vars_hoisted_through: FxHashSet<String>,
    /// Function declarations made directly in this block; value records the
    /// generator flag (Annex B tolerance never applies to generators)
    block_functions: FxHashMap<String, bool>,
    /// Simple catch parameter name, when this is a catch scope
    pub catch_param: Option<String>,
}

impl Scope {
    fn new(kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Scope {
            kind,
            parent,
            children: Vec::new(),
            symbols: FxHashMap::default(),
            vars_hoisted_through: FxHashSet::default(),
            block_functions: FxHashMap::default(),
            catch_param: None,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolKind> {
        self.symbols.get(name).copied()
    }
}

/// Result of a definition attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum DefineOutcome {
    /// Binding recorded. `skip_hoist` is the Annex-B signal: a sloppy-eval
    /// function-in-block whose hoisting would collide with a lexical binding
    /// is recorded in its block only.
    Defined { skip_hoist: bool, warning: Option<String> },
    /// Redeclaration error; the parser attaches the position.
    Error { message: String },
}

impl DefineOutcome {
    fn ok() -> Self {
        DefineOutcome::Defined { skip_hoist: false, warning: None }
    }

    fn err(message: String) -> Self {
        DefineOutcome::Error { message }
    }
}

/// Arena owning every scope of one parse.
#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the root scope.
    pub fn push_root(&mut self, kind: ScopeKind) -> ScopeId {
        debug_assert!(self.scopes.is_empty());
        self.scopes.push(Scope::new(kind, None));
        ScopeId(0)
    }

    /// Create a child of `parent` and link it both ways.
    pub fn push_child(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(kind, Some(parent)));
        self.scopes[parent.index()].children.push(id);
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.scopes[id.index()].parent
    }

    /// Nearest enclosing function-level scope, including `id` itself.
    pub fn function_scope(&self, id: ScopeId) -> ScopeId {
        let mut cur = id;
        loop {
            if self.scopes[cur.index()].kind.is_function_scope() {
                return cur;
            }
            match self.scopes[cur.index()].parent {
                Some(p) => cur = p,
                None => return cur,
            }
        }
    }

    pub fn set_catch_param(&mut self, id: ScopeId, name: &str) {
        self.scopes[id.index()].catch_param = Some(name.to_string());
    }

    /// Look a name up through the chain, innermost first.
    pub fn resolve(&self, from: ScopeId, name: &str) -> Option<(ScopeId, SymbolKind)> {
        let mut cur = Some(from);
        while let Some(id) = cur {
            if let Some(kind) = self.scopes[id.index()].lookup(name) {
                return Some((id, kind));
            }
            cur = self.scopes[id.index()].parent;
        }
        None
    }

    /// Record a binding, enforcing the redeclaration rules.
    ///
    /// `is_generator` matters only for function declarations. `strict`,
    /// and `in_eval` select the Annex-B tolerances.
    pub fn define(
        &mut self,
        at: ScopeId,
        kind: SymbolKind,
        name: &str,
        is_generator: bool,
        strict: bool,
        in_eval: bool,
    ) -> DefineOutcome {
        match kind {
            SymbolKind::Let | SymbolKind::Const => self.define_lexical(at, kind, name),
            SymbolKind::Var => self.define_var(at, name, strict),
            SymbolKind::Function => {
                self.define_function(at, name, is_generator, strict, in_eval)
            }
            SymbolKind::Param => {
                self.scopes[at.index()].symbols.insert(name.to_string(), SymbolKind::Param);
                DefineOutcome::ok()
            }
            SymbolKind::CatchParam => {
                let scope = &mut self.scopes[at.index()];
                if scope.lookup(name).is_some() {
                    return DefineOutcome::err(format!(
                        "redeclaration of catch parameter \"{name}\""
                    ));
                }
                scope.symbols.insert(name.to_string(), SymbolKind::CatchParam);
                DefineOutcome::ok()
            }
        }
    }

    fn define_lexical(&mut self, at: ScopeId, kind: SymbolKind, name: &str) -> DefineOutcome {
        let scope = &self.scopes[at.index()];
        if let Some(prior) = scope.lookup(name) {
            return DefineOutcome::err(format!(
                "redeclaration of {} \"{name}\"",
                prior.describe()
            ));
        }
        if scope.vars_hoisted_through.contains(name) {
            return DefineOutcome::err(format!(
                "cannot declare \"{name}\": a var declaration is hoisted through this block"
            ));
        }
        if scope.catch_param.as_deref() == Some(name) {
            return DefineOutcome::err(format!(
                "\"{name}\" shadows the catch parameter of this block"
            ));
        }
        self.scopes[at.index()].symbols.insert(name.to_string(), kind);
        DefineOutcome::ok()
    }

    fn define_var(&mut self, at: ScopeId, name: &str, strict: bool) -> DefineOutcome {
        // Walk to the function scope, recording the hoist in every block on
        // the way and checking for lexical collisions.
        let mut cur = at;
        loop {
            let scope = &self.scopes[cur.index()];
            if scope.kind.is_function_scope() {
                break;
            }
            match scope.lookup(name) {
                Some(SymbolKind::CatchParam) if scope.kind == ScopeKind::Catch => {
                    // Annex B tolerates `catch (e) { var e; }`
                }
                Some(k) if k.is_lexical() => {
                    return DefineOutcome::err(format!(
                        "cannot declare var \"{name}\": conflicts with {} declaration",
                        k.describe()
                    ));
                }
                _ => {}
            }
            self.scopes[cur.index()].vars_hoisted_through.insert(name.to_string());
            cur = match self.scopes[cur.index()].parent {
                Some(p) => p,
                None => break,
            };
        }
        let fscope = &self.scopes[cur.index()];
        match fscope.lookup(name) {
            Some(k) if k.is_lexical() => DefineOutcome::err(format!(
                "cannot declare var \"{name}\": conflicts with {} declaration",
                k.describe()
            )),
            Some(SymbolKind::Var) | Some(SymbolKind::Param) | Some(SymbolKind::Function) => {
                let warning = if strict {
                    Some(format!("redeclaration of var \"{name}\""))
                } else {
                    None
                };
                DefineOutcome::Defined { skip_hoist: false, warning }
            }
            Some(SymbolKind::CatchParam) => DefineOutcome::ok(),
            _ => {
                self.scopes[cur.index()].symbols.insert(name.to_string(), SymbolKind::Var);
                DefineOutcome::ok()
            }
        }
    }

    fn define_function(
        &mut self,
        at: ScopeId,
        name: &str,
        is_generator: bool,
        strict: bool,
        in_eval: bool,
    ) -> DefineOutcome {
        let at_kind = self.scopes[at.index()].kind;
        if at_kind.is_function_scope() {
            if at_kind == ScopeKind::Module {
                // Module top-level functions are lexical bindings
                let scope = &self.scopes[at.index()];
                if let Some(prior) = scope.lookup(name) {
                    return DefineOutcome::err(format!(
                        "redeclaration of {} \"{name}\"",
                        prior.describe()
                    ));
                }
                self.scopes[at.index()].symbols.insert(name.to_string(), SymbolKind::Function);
                return DefineOutcome::ok();
            }
            let scope = &self.scopes[at.index()];
            match scope.lookup(name) {
                Some(k) if k.is_lexical() => {
                    return DefineOutcome::err(format!(
                        "cannot declare function \"{name}\": conflicts with {} declaration",
                        k.describe()
                    ));
                }
                Some(SymbolKind::Function) if strict => {
                    return DefineOutcome::err(format!(
                        "redeclaration of function \"{name}\""
                    ));
                }
                Some(_) => {
                    return DefineOutcome::Defined {
                        skip_hoist: false,
                        warning: if strict {
                            Some(format!("redeclaration of \"{name}\""))
                        } else {
                            None
                        },
                    };
                }
                None => {}
            }
            self.scopes[at.index()].symbols.insert(name.to_string(), SymbolKind::Function);
            return DefineOutcome::ok();
        }

        // Function declared directly inside a block
        let scope = &self.scopes[at.index()];
        if scope.catch_param.as_deref() == Some(name) {
            return DefineOutcome::err(format!(
                "function \"{name}\" shadows the catch parameter of this block"
            ));
        }
        if let Some(prior) = scope.lookup(name) {
            if prior.is_lexical() {
                return DefineOutcome::err(format!(
                    "redeclaration of {} \"{name}\"",
                    prior.describe()
                ));
            }
        }
        if let Some(&prior_generator) = scope.block_functions.get(name) {
            if strict || is_generator || prior_generator {
                return DefineOutcome::err(format!("redeclaration of function \"{name}\""));
            }
        }
        self.scopes[at.index()].block_functions.insert(name.to_string(), is_generator);
        self.scopes[at.index()].symbols.insert(name.to_string(), SymbolKind::Function);

        // Annex-B hoisting of the function's var-binding, sloppy mode only
        if strict {
            return DefineOutcome::ok();
        }
        let mut cur = self.scopes[at.index()].parent;
        while let Some(id) = cur {
            let s = &self.scopes[id.index()];
            if let Some(k) = s.lookup(name) {
                if k.is_lexical() {
                    if in_eval {
                        // Sloppy eval: hoisting is silently skipped
                        return DefineOutcome::Defined { skip_hoist: true, warning: None };
                    }
                    return DefineOutcome::err(format!(
                        "cannot hoist function \"{name}\": conflicts with {} declaration",
                        k.describe()
                    ));
                }
            }
            if s.kind.is_function_scope() {
                break;
            }
            cur = s.parent;
        }
        // Record the hoisted binding at the function scope
        let mut walk = at;
        loop {
            let s = &self.scopes[walk.index()];
            if s.kind.is_function_scope() {
                break;
            }
            self.scopes[walk.index()].vars_hoisted_through.insert(name.to_string());
            walk = match self.scopes[walk.index()].parent {
                Some(p) => p,
                None => break,
            };
        }
        let f = self.function_scope(at);
        let fscope = &mut self.scopes[f.index()];
        fscope.symbols.entry(name.to_string()).or_insert(SymbolKind::Function);
        DefineOutcome::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena_with_block() -> (ScopeArena, ScopeId, ScopeId) {
        let mut arena = ScopeArena::new();
        let root = arena.push_root(ScopeKind::Script);
        let block = arena.push_child(root, ScopeKind::Block);
        (arena, root, block)
    }

    fn is_error(outcome: &DefineOutcome) -> bool {
        matches!(outcome, DefineOutcome::Error { .. })
    }

    #[test]
    fn let_redeclaration_is_an_error() {
        let (mut arena, root, _) = arena_with_block();
        assert!(!is_error(&arena.define(root, SymbolKind::Let, "x", false, false, false)));
        assert!(is_error(&arena.define(root, SymbolKind::Let, "x", false, false, false)));
    }

    #[test]
    fn shadowing_in_inner_block_is_fine() {
        let (mut arena, root, block) = arena_with_block();
        assert!(!is_error(&arena.define(root, SymbolKind::Let, "x", false, false, false)));
        assert!(!is_error(&arena.define(block, SymbolKind::Let, "x", false, false, false)));
    }

    #[test]
    fn var_hoisting_conflicts_with_block_let() {
        let (mut arena, _root, block) = arena_with_block();
        // `{ var x; }` then `let x` in the same block
        assert!(!is_error(&arena.define(block, SymbolKind::Var, "x", false, false, false)));
        assert!(is_error(&arena.define(block, SymbolKind::Let, "x", false, false, false)));
    }

    #[test]
    fn var_through_block_blocks_outer_sibling_let() {
        let (mut arena, root, block) = arena_with_block();
        assert!(!is_error(&arena.define(block, SymbolKind::Var, "x", false, false, false)));
        // The var was hoisted to the script scope
        assert!(is_error(&arena.define(root, SymbolKind::Let, "x", false, false, false)));
    }

    #[test]
    fn var_under_lexical_binding_errors() {
        let (mut arena, _root, block) = arena_with_block();
        assert!(!is_error(&arena.define(block, SymbolKind::Const, "x", false, false, false)));
        assert!(is_error(&arena.define(block, SymbolKind::Var, "x", false, false, false)));
    }

    #[test]
    fn var_redeclaration_warns_in_strict() {
        let mut arena = ScopeArena::new();
        let root = arena.push_root(ScopeKind::Script);
        arena.define(root, SymbolKind::Var, "x", false, true, false);
        match arena.define(root, SymbolKind::Var, "x", false, true, false) {
            DefineOutcome::Defined { warning: Some(_), .. } => {}
            other => panic!("expected warning, got {other:?}"),
        }
    }

    #[test]
    fn block_function_pairs_tolerated_only_sloppy() {
        let (mut arena, _root, block) = arena_with_block();
        assert!(!is_error(&arena.define(block, SymbolKind::Function, "f", false, false, false)));
        assert!(!is_error(&arena.define(block, SymbolKind::Function, "f", false, false, false)));
        let (mut arena2, _root2, block2) = arena_with_block();
        assert!(!is_error(&arena2.define(block2, SymbolKind::Function, "f", false, true, false)));
        assert!(is_error(&arena2.define(block2, SymbolKind::Function, "f", false, true, false)));
    }

    #[test]
    fn generator_pairs_always_error() {
        let (mut arena, _root, block) = arena_with_block();
        assert!(!is_error(&arena.define(block, SymbolKind::Function, "f", true, false, false)));
        assert!(is_error(&arena.define(block, SymbolKind::Function, "f", true, false, false)));
    }

    #[test]
    fn eval_function_hoist_skips_on_conflict() {
        let mut arena = ScopeArena::new();
        let root = arena.push_root(ScopeKind::Script);
        arena.define(root, SymbolKind::Let, "f", false, false, true);
        let block = arena.push_child(root, ScopeKind::Block);
        match arena.define(block, SymbolKind::Function, "f", false, false, true) {
            DefineOutcome::Defined { skip_hoist: true, .. } => {}
            other => panic!("expected skipped hoist, got {other:?}"),
        }
    }

    #[test]
    fn module_top_level_functions_are_lexical() {
        let mut arena = ScopeArena::new();
        let root = arena.push_root(ScopeKind::Module);
        arena.define(root, SymbolKind::Var, "f", false, true, false);
        assert!(is_error(&arena.define(root, SymbolKind::Function, "f", false, true, false)));
    }

    #[test]
    fn catch_param_conflicts() {
        let mut arena = ScopeArena::new();
        let root = arena.push_root(ScopeKind::Script);
        let catch = arena.push_child(root, ScopeKind::Catch);
        arena.define(catch, SymbolKind::CatchParam, "e", false, false, false);
        arena.set_catch_param(catch, "e");
        assert!(is_error(&arena.define(catch, SymbolKind::Let, "e", false, false, false)));
        // Annex B: `var e` inside the catch block is tolerated
        assert!(!is_error(&arena.define(catch, SymbolKind::Var, "e", false, false, false)));
    }

    #[test]
    fn resolve_walks_outward() {
        let (mut arena, root, block) = arena_with_block();
        arena.define(root, SymbolKind::Const, "x", false, false, false);
        let hit = arena.resolve(block, "x");
        assert_eq!(hit, Some((root, SymbolKind::Const)));
    }
}
