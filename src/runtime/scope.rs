use rustc_hash::FxHashMap;

use crate::runtime::error::{ExecError, ExecResult};
use crate::value::Value;

/// Name-resolution scope for expression evaluation.
///
/// Block and method locals shadow session variables; top-level statements
/// have no locals.
pub(crate) struct Scope<'a> {
    globals: &'a FxHashMap<String, Value>,
    locals: Option<&'a FxHashMap<String, Value>>,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(
        globals: &'a FxHashMap<String, Value>,
        locals: &'a FxHashMap<String, Value>,
    ) -> Self {
        Self {
            globals,
            locals: (!locals.is_empty()).then_some(locals),
        }
    }

    pub(crate) fn load(&self, name: &str) -> Option<&Value> {
        if let Some(locals) = self.locals
            && let Some(value) = locals.get(name)
        {
            return Some(value);
        }
        self.globals.get(name)
    }
}

/// One level of block or method execution.
#[derive(Debug, Default)]
pub(crate) struct Frame {
    depth: usize,
    pub(crate) locals: FxHashMap<String, Value>,
}

impl Frame {
    pub(crate) fn root() -> Self {
        Self::default()
    }

    /// Frame for a nested call, refused once `limit` levels are active.
    pub(crate) fn enter(&self, locals: FxHashMap<String, Value>, limit: usize) -> ExecResult<Frame> {
        let depth = self.depth + 1;
        if depth > limit {
            return Err(ExecError::CallDepthExceeded { limit });
        }
        Ok(Frame { depth, locals })
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locals_shadow_globals() {
        let mut globals = FxHashMap::default();
        globals.insert("amount".to_string(), Value::Number(1.0));
        globals.insert("label".to_string(), Value::string("g"));
        let mut locals = FxHashMap::default();
        locals.insert("amount".to_string(), Value::Number(5.0));

        let scope = Scope::new(&globals, &locals);
        assert_eq!(scope.load("amount"), Some(&Value::Number(5.0)));
        assert_eq!(scope.load("label"), Some(&Value::string("g")));
        assert_eq!(scope.load("missing"), None);
    }

    #[test]
    fn frames_stop_at_the_depth_limit() {
        let root = Frame::root();
        let first = root.enter(FxHashMap::default(), 2).expect("depth 1");
        let second = first.enter(FxHashMap::default(), 2).expect("depth 2");
        assert_eq!(second.depth(), 2);
        assert_eq!(
            second.enter(FxHashMap::default(), 2).map(|frame| frame.depth()),
            Err(ExecError::CallDepthExceeded { limit: 2 })
        );
    }
}
