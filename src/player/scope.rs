use crate::lingo::datum::{Datum, INVALID_MEMBER_REF, MemberRef};

use super::script::ScriptInstanceRef;

pub type ScopeRef = usize;

/// One activation record. Scopes live in a pool owned by the player and
/// are reset for reuse; `scope_ref` is the stable pool index the debugger
/// keys on. Locals and args are indexed, not named, at opcode level.
pub struct Scope {
    pub scope_ref: ScopeRef,
    pub script_ref: MemberRef,
    pub handler_name: String,
    pub receiver: Option<ScriptInstanceRef>,
    pub args: Vec<Datum>,
    pub locals: Vec<Datum>,
    pub bytecode_index: usize,
    pub loop_return_indices: Vec<usize>,
    pub tell_targets: Vec<Datum>,
    pub stack: Vec<Datum>,
    pub return_value: Datum,
    pub passed: bool,
}

pub struct ScopeResult {
    pub return_value: Datum,
    pub passed: bool,
}

impl Scope {
    pub fn new(scope_ref: ScopeRef) -> Scope {
        Scope {
            scope_ref,
            script_ref: INVALID_MEMBER_REF,
            handler_name: String::new(),
            receiver: None,
            args: vec![],
            locals: vec![],
            bytecode_index: 0,
            loop_return_indices: vec![],
            tell_targets: vec![],
            stack: vec![],
            return_value: Datum::Void,
            passed: false,
        }
    }

    pub fn reset(&mut self) {
        self.script_ref = INVALID_MEMBER_REF;
        self.handler_name.clear();
        self.receiver = None;
        self.args.clear();
        self.locals.clear();
        self.bytecode_index = 0;
        self.loop_return_indices.clear();
        self.tell_targets.clear();
        self.stack.clear();
        self.return_value = Datum::Void;
        self.passed = false;
    }

    /// Underflow yields VOID rather than failing; compiled code trusts the
    /// stack discipline and the player degrades instead of aborting.
    pub fn pop(&mut self) -> Datum {
        self.stack.pop().unwrap_or(Datum::Void)
    }

    pub fn pop_n(&mut self, n: usize) -> Vec<Datum> {
        if n == 0 {
            return vec![];
        }
        if self.stack.len() < n {
            let mut result = std::mem::take(&mut self.stack);
            while result.len() < n {
                result.insert(0, Datum::Void);
            }
            return result;
        }
        self.stack.split_off(self.stack.len() - n)
    }

    pub fn push(&mut self, value: Datum) {
        self.stack.push(value);
    }

    pub fn local(&self, index: usize) -> Datum {
        self.locals.get(index).cloned().unwrap_or(Datum::Void)
    }

    pub fn set_local(&mut self, index: usize, value: Datum) {
        if index >= self.locals.len() {
            self.locals.resize(index + 1, Datum::Void);
        }
        self.locals[index] = value;
    }

    pub fn arg(&self, index: usize) -> Datum {
        self.args.get(index).cloned().unwrap_or(Datum::Void)
    }

    pub fn set_arg(&mut self, index: usize, value: Datum) {
        if index >= self.args.len() {
            self.args.resize(index + 1, Datum::Void);
        }
        self.args[index] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_on_empty_stack_yields_void() {
        let mut scope = Scope::new(0);
        assert!(scope.pop().is_void());
    }

    #[test]
    fn pop_n_pads_short_stacks() {
        let mut scope = Scope::new(0);
        scope.push(Datum::Int(1));
        let items = scope.pop_n(3);
        assert_eq!(items.len(), 3);
        assert!(items[0].is_void());
        assert!(matches!(items[2], Datum::Int(1)));
    }

    #[test]
    fn reset_clears_everything() {
        let mut scope = Scope::new(2);
        scope.push(Datum::Int(1));
        scope.set_local(3, Datum::Int(9));
        scope.passed = true;
        scope.reset();
        assert!(scope.stack.is_empty());
        assert!(scope.locals.is_empty());
        assert!(!scope.passed);
        assert_eq!(scope.scope_ref, 2);
    }
}
