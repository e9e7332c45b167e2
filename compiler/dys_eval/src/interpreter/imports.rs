//! `import` and `from ... import ...` against the session's modules.

use dys_ir::{Alias, Name, NodeKind, Program};

use super::Interpreter;
use crate::errors::{import_error, module_not_found, EvalResult};
use crate::value::Value;

impl Interpreter<'_> {
    /// Resolve a dotted module path: the first part is a registered
    /// module, the rest are module-valued members.
    fn resolve_module(&self, dotted: &str) -> EvalResult {
        let mut parts = dotted.split('.');
        let first = parts.next().unwrap_or_default();
        let mut module = self
            .session
            .module(first)
            .ok_or_else(|| module_not_found(dotted))?;
        for part in parts {
            let next = match &module {
                Value::Module(m) => self
                    .session
                    .interner()
                    .get(part)
                    .and_then(|name| m.members.get(&name))
                    .filter(|member| matches!(member, Value::Module(_)))
                    .cloned(),
                _ => None,
            };
            module = next.ok_or_else(|| module_not_found(dotted))?;
        }
        Ok(module)
    }

    pub(super) fn exec_import(&mut self, program: &Program, aliases: &[Alias]) -> EvalResult<()> {
        for alias in aliases {
            self.track(program, NodeKind::Alias, alias.span)?;
            let dotted = self.name_str(alias.name);
            match alias.asname {
                Some(asname) => {
                    let module = self.resolve_module(&dotted)?;
                    self.scope.set(asname, module);
                }
                None => {
                    // `import a.b` binds `a`.
                    self.resolve_module(&dotted)?;
                    let first = dotted.split('.').next().unwrap_or_default();
                    let module = self.resolve_module(first)?;
                    let name = self.session.interner().intern(first);
                    self.scope.set(name, module);
                }
            }
        }
        Ok(())
    }

    pub(super) fn exec_import_from(
        &mut self,
        program: &Program,
        module: Name,
        names: &[Alias],
    ) -> EvalResult<()> {
        let dotted = self.name_str(module);
        let Value::Module(source) = self.resolve_module(&dotted)? else {
            return Err(module_not_found(&dotted));
        };
        for alias in names {
            self.track(program, NodeKind::Alias, alias.span)?;
            let name = self.name_str(alias.name);
            if &*name == "*" {
                for (member, value) in &source.members {
                    if !self.name_str(*member).starts_with('_') {
                        self.scope.set(*member, value.clone());
                    }
                }
                continue;
            }
            let value = source
                .members
                .get(&alias.name)
                .cloned()
                .ok_or_else(|| import_error(&name, &dotted))?;
            self.scope.set(alias.asname.unwrap_or(alias.name), value);
        }
        Ok(())
    }
}
