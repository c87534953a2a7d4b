//! Script runtime management
//!
//! Wraps a QuickJS runtime/context pair; the bridge function table is
//! injected separately by [`crate::bindings::register_bridge`].

use rquickjs::{Context, Runtime};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script engine error: {0}")]
    Engine(#[from] rquickjs::Error),

    #[error("failed to read script: {0}")]
    Io(#[from] std::io::Error),
}

/// Script execution context
pub struct ScriptRuntime {
    #[allow(dead_code)] // Kept alive for context lifetime
    runtime: Runtime,
    pub context: Context,
}

impl ScriptRuntime {
    pub fn new() -> Result<Self, ScriptError> {
        let runtime = Runtime::new()?;
        let context = Context::full(&runtime)?;

        Ok(Self { runtime, context })
    }

    pub fn execute_file(&self, path: &Path) -> Result<(), ScriptError> {
        let source = std::fs::read_to_string(path)?;
        self.execute(&source)
    }

    pub fn execute(&self, source: &str) -> Result<(), ScriptError> {
        self.context.with(|ctx| {
            ctx.eval::<(), _>(source)?;
            Ok::<_, rquickjs::Error>(())
        })?;
        Ok(())
    }

    /// Call a JavaScript function by name with no arguments.
    pub fn call_function(&self, name: &str) -> Result<(), ScriptError> {
        self.context.with(|ctx| -> Result<(), rquickjs::Error> {
            let globals = ctx.globals();
            let func: rquickjs::Function = globals.get(name)?;
            func.call::<_, ()>(())?;
            Ok(())
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executes_source() {
        let runtime = ScriptRuntime::new().unwrap();
        runtime.execute("var x = 1 + 1;").unwrap();
    }

    #[test]
    fn surfaces_script_exceptions() {
        let runtime = ScriptRuntime::new().unwrap();
        assert!(runtime.execute("throw new Error('boom');").is_err());
    }

    #[test]
    fn calls_global_functions() {
        let runtime = ScriptRuntime::new().unwrap();
        runtime
            .execute("var called = false; function main() { called = true; }")
            .unwrap();
        runtime.call_function("main").unwrap();
        runtime
            .execute("if (!called) throw new Error('main not called');")
            .unwrap();
    }
}
