//! List, set and dict comprehensions.
//!
//! Generator expressions are evaluated eagerly as lists. Each comprehension
//! runs in its own scope layer so its targets do not leak.

use dys_ir::{Comprehension, ExprId};

use super::Interpreter;
use crate::errors::EvalResult;
use crate::iter::iterate;
use crate::value::{Dict, Value, ValueSet};

impl Interpreter<'_> {
    pub(super) fn eval_list_comp(&mut self, elt: ExprId, generators: &[Comprehension]) -> EvalResult {
        let mut items = Vec::new();
        self.comprehend(generators, &mut |interp| {
            items.push(interp.eval_expr(elt)?);
            Ok(())
        })?;
        Ok(Value::list(items))
    }

    pub(super) fn eval_set_comp(&mut self, elt: ExprId, generators: &[Comprehension]) -> EvalResult {
        let mut set = ValueSet::new();
        self.comprehend(generators, &mut |interp| {
            set.insert(interp.eval_expr(elt)?)?;
            Ok(())
        })?;
        Ok(Value::set(set))
    }

    pub(super) fn eval_dict_comp(
        &mut self,
        key: ExprId,
        value: ExprId,
        generators: &[Comprehension],
    ) -> EvalResult {
        let mut dict = Dict::new();
        self.comprehend(generators, &mut |interp| {
            let k = interp.eval_expr(key)?;
            let v = interp.eval_expr(value)?;
            dict.insert(k, v)
        })?;
        Ok(Value::dict(dict))
    }

    fn comprehend(
        &mut self,
        generators: &[Comprehension],
        emit: &mut dyn FnMut(&mut Self) -> EvalResult<()>,
    ) -> EvalResult<()> {
        self.scope.push();
        let result = self.run_generators(generators, emit);
        self.scope.pop();
        result
    }

    fn run_generators(
        &mut self,
        generators: &[Comprehension],
        emit: &mut dyn FnMut(&mut Self) -> EvalResult<()>,
    ) -> EvalResult<()> {
        let Some((generator, rest)) = generators.split_first() else {
            return emit(self);
        };
        let program = self.program.clone();
        let iterable = self.eval_expr(generator.iter)?;
        for item in iterate(&iterable)? {
            self.assign(&program, generator.target, item)?;
            let mut keep = true;
            for &cond in &generator.ifs {
                keep &= self.eval_expr(cond)?.is_truthy();
            }
            if keep {
                self.run_generators(rest, emit)?;
            }
        }
        Ok(())
    }
}
