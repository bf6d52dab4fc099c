//! Scoped string arena (spec §4.1).
//!
//! Mirrors the teacher's `Env<T>` scope-stack discipline (push a scope,
//! define things in it, pop it and everything defined since is gone) but
//! allocates byte strings instead of chaining a lookup table. Every
//! allocation is owned by exactly one scope; popping a scope frees every
//! allocation made since the matching push.
//!
//! BIND does not open a new scope (spec §3 invariant 6, §9 "binder scope
//! asymmetry"): its symbol must outlive the BIND cell's own pop and remain
//! valid for the enclosing LET body, so it is allocated in the LET's scope
//! rather than a scope of its own.

#[derive(Default)]
pub struct Arena {
    // Flat log of every live allocation; `marks` records, for each open
    // scope, the length of `allocations` at the time the scope was pushed.
    allocations: Vec<Box<str>>,
    marks: Vec<usize>,
}

impl Arena {
    pub fn new() -> Self {
        let mut arena = Arena { allocations: Vec::new(), marks: Vec::new() };
        arena.push_scope();
        arena
    }

    pub fn push_scope(&mut self) {
        self.marks.push(self.allocations.len());
    }

    /// Frees every allocation made since the matching `push_scope`.
    pub fn pop_scope(&mut self) {
        if let Some(mark) = self.marks.pop() {
            self.allocations.truncate(mark);
        }
    }

    pub fn allocate(&mut self, s: &str) -> Box<str> {
        let owned: Box<str> = s.into();
        self.allocations.push(owned.clone());
        owned
    }

    pub fn scope_depth(&self) -> usize {
        self.marks.len()
    }

    pub fn allocated_bytes(&self) -> usize {
        self.allocations.iter().map(|s| s.len()).sum()
    }

    /// Truncates back to a single, empty root scope, as `Stack::reset` does.
    pub fn reset(&mut self) {
        self.allocations.clear();
        self.marks.clear();
        self.push_scope();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_scope_frees_allocations() {
        let mut arena = Arena::new();
        arena.push_scope();
        arena.allocate("x");
        arena.allocate("y");
        assert_eq!(arena.allocated_bytes(), 2);
        arena.pop_scope();
        assert_eq!(arena.allocated_bytes(), 0);
    }

    #[test]
    fn nested_scopes_are_independent() {
        let mut arena = Arena::new();
        arena.allocate("outer");
        arena.push_scope();
        arena.allocate("inner");
        arena.pop_scope();
        assert_eq!(arena.allocated_bytes(), "outer".len());
    }

    #[test]
    fn reset_restores_single_root_scope() {
        let mut arena = Arena::new();
        arena.push_scope();
        arena.push_scope();
        arena.allocate("leaked-if-not-reset");
        arena.reset();
        assert_eq!(arena.scope_depth(), 1);
        assert_eq!(arena.allocated_bytes(), 0);
    }
}
