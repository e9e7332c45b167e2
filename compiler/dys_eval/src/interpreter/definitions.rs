//! `def`, `lambda` and `class`.
//!
//! Defaults and annotations are evaluated once, at definition. Every
//! definition registers its own capability, so a script may call what it
//! defined and nothing else it made up.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use dys_ir::{ClassDef, Constant, ExprId, ExprKind, FunctionDef, NodeKind, Param, Parameters, Program, StmtId, StmtKind};

use super::Interpreter;
use crate::capabilities::{CapabilityId, DefId, DefNode};
use crate::errors::{not_implemented, type_error, ControlAction, EvalResult};
use crate::native::CallArgs;
use crate::value::{
    ClassValue, ExcType, FunctionBody, FxIndexMap, ParamSlot, ScriptFunction, Signature, Value,
};

/// Strip the indentation docstrings carry from their source layout.
pub(crate) fn clean_doc(raw: &str) -> String {
    let mut lines = raw.lines();
    let first = lines.next().unwrap_or_default().trim();
    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    let mut out = vec![first.to_string()];
    out.extend(
        rest.iter()
            .map(|line| line.get(indent..).unwrap_or("").trim_end().to_string()),
    );
    while out.last().is_some_and(String::is_empty) {
        out.pop();
    }
    while out.first().is_some_and(String::is_empty) {
        out.remove(0);
    }
    out.join("\n")
}

/// Docstring of a body: a leading string expression statement.
fn docstring(program: &Program, body: &[StmtId]) -> Option<Rc<str>> {
    let first = program.arena.stmt(*body.first()?);
    let StmtKind::Expr(expr) = first.kind else {
        return None;
    };
    match &program.arena.expr(expr).kind {
        ExprKind::Constant(Constant::Str(s)) => Some(Rc::from(clean_doc(s))),
        _ => None,
    }
}

impl Interpreter<'_> {
    fn eval_slots(&mut self, program: &Program, params: &[Param]) -> EvalResult<Vec<ParamSlot>> {
        let mut slots = Vec::with_capacity(params.len());
        for param in params {
            self.track(program, NodeKind::Arg, param.span)?;
            let default = match param.default {
                Some(default) => Some(self.eval_expr(default)?),
                None => None,
            };
            slots.push(ParamSlot {
                name: param.name,
                default,
            });
        }
        Ok(slots)
    }

    fn eval_signature(&mut self, program: &Program, params: &Parameters) -> EvalResult<Signature> {
        let posonly = self.eval_slots(program, &params.posonly)?;
        let args = self.eval_slots(program, &params.args)?;
        let vararg = params.vararg.as_ref().map(|p| p.name);
        let kwonly = self.eval_slots(program, &params.kwonly)?;
        let kwarg = params.kwarg.as_ref().map(|p| p.name);
        Ok(Signature {
            posonly,
            args,
            vararg,
            kwonly,
            kwarg,
        })
    }

    fn eval_annotations(
        &mut self,
        params: &Parameters,
        returns: Option<ExprId>,
    ) -> EvalResult<FxIndexMap<dys_ir::Name, Value>> {
        let mut annotations = FxIndexMap::default();
        for param in params.iter() {
            if let Some(annotation) = param.annotation {
                annotations.insert(param.name, self.eval_expr(annotation)?);
            }
        }
        if let Some(returns) = returns {
            let key = self.session.interner().intern("return");
            annotations.insert(key, self.eval_expr(returns)?);
        }
        Ok(annotations)
    }

    fn register(&self, program: &Program, node: DefNode, name: Arc<str>) -> DefId {
        let def = DefId {
            program: program.id,
            node,
            name,
        };
        self.session
            .capabilities()
            .insert(CapabilityId::Script(def.clone()));
        def
    }

    /// Apply decorators innermost (last written) first.
    fn decorate(&mut self, decorators: &[ExprId], value: Value) -> EvalResult {
        let mut decorators_evaluated = Vec::with_capacity(decorators.len());
        for &decorator in decorators {
            decorators_evaluated.push(self.eval_expr(decorator)?);
        }
        let mut value = value;
        for decorator in decorators_evaluated.iter().rev() {
            value = self.call_value(decorator, CallArgs::new(vec![value]))?;
        }
        Ok(value)
    }

    pub(super) fn make_lambda(
        &mut self,
        program: &Program,
        id: ExprId,
        params: &Parameters,
        body: ExprId,
    ) -> EvalResult {
        let signature = self.eval_signature(program, params)?;
        let def = self.register(program, DefNode::Expr(id), Arc::from("<lambda>"));
        Ok(Value::Function(Rc::new(ScriptFunction {
            name: Rc::from("<lambda>"),
            def,
            program: self.program.clone(),
            body: FunctionBody::Lambda(body),
            signature,
            closure: self.scope.snapshot(),
            annotations: FxIndexMap::default(),
            doc: None,
        })))
    }

    pub(super) fn define_function(
        &mut self,
        program: &Program,
        id: StmtId,
        def: &FunctionDef,
    ) -> EvalResult<()> {
        let name = self.name_str(def.name);
        let signature = self.eval_signature(program, &def.params)?;
        let annotations = self.eval_annotations(&def.params, def.returns)?;
        let def_id = self.register(program, DefNode::Stmt(id), Arc::clone(&name));
        let function = Value::Function(Rc::new(ScriptFunction {
            name: Rc::from(&*name),
            def: def_id,
            program: self.program.clone(),
            body: FunctionBody::Def(id),
            signature,
            closure: self.scope.snapshot(),
            annotations,
            doc: docstring(program, &def.body),
        }));
        let function = self.decorate(&def.decorators, function)?;
        self.scope.set(def.name, function);
        Ok(())
    }

    pub(super) fn define_class(
        &mut self,
        program: &Program,
        id: StmtId,
        def: &ClassDef,
    ) -> EvalResult<()> {
        if !def.keywords.is_empty() {
            return Err(not_implemented(
                "Sorry, metaclass keyword arguments are not supported",
            ));
        }
        let name = self.name_str(def.name);
        let mut bases = Vec::new();
        let mut exc_base: Option<ExcType> = None;
        for &base in &def.bases {
            match self.eval_expr(base)? {
                Value::Class(class) => {
                    exc_base = exc_base.or(class.exc_base);
                    bases.push(class);
                }
                Value::ExceptionType(ty) => exc_base = exc_base.or(Some(ty)),
                other => {
                    return Err(type_error(format!(
                        "Sorry, cannot inherit from {}",
                        other.type_name()
                    )))
                }
            }
        }

        let doc = docstring(program, &def.body);
        self.scope.push();
        if let Some(doc) = &doc {
            self.scope.set(self.names.doc, Value::str(doc));
        }
        let result = self.exec_block(&def.body);
        let layer = self.scope.pop();
        match result {
            Ok(_) => {}
            Err(ControlAction::Raise(err)) => return Err(err),
            Err(signal) => return Err(signal.into_error()),
        }
        // Drained rather than shared: methods defined in the body must not
        // see class attributes as free names.
        let namespace: FxIndexMap<_, _> = layer
            .map(|layer| layer.borrow_mut().drain(..).collect())
            .unwrap_or_default();

        let def_id = self.register(program, DefNode::Stmt(id), Arc::clone(&name));
        let class = Value::Class(Rc::new(ClassValue {
            name: Rc::from(&*name),
            def: def_id,
            bases,
            exc_base,
            namespace: RefCell::new(namespace),
            doc,
        }));
        let class = self.decorate(&def.decorators, class)?;
        self.scope.set(def.name, class);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::clean_doc;
    use pretty_assertions::assert_eq;

    #[test]
    fn docstrings_lose_their_source_indentation() {
        let raw = "Summary.\n\n    Details here.\n      Indented more.\n    ";
        assert_eq!(clean_doc(raw), "Summary.\n\nDetails here.\n  Indented more.");
    }

    #[test]
    fn one_line_docstrings_are_trimmed() {
        assert_eq!(clean_doc("  hello  "), "hello");
    }
}
