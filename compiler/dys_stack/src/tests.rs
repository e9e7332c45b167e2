use super::*;
use pretty_assertions::assert_eq;

#[test]
fn deep_recursion_does_not_overflow() {
    fn count_down(n: u32) -> u32 {
        ensure_sufficient_stack(|| if n == 0 { 0 } else { count_down(n - 1) + 1 })
    }
    assert_eq!(count_down(200_000), 200_000);
}

#[test]
fn passes_through_results() {
    let ok: Result<u8, ()> = ensure_sufficient_stack(|| Ok(7));
    assert_eq!(ok, Ok(7));
}

#[test]
fn nesting_budget_limits_depth() {
    let mut budget = NestingBudget::new(2);
    assert_eq!(budget.enter(), Ok(()));
    assert_eq!(budget.enter(), Ok(()));
    assert_eq!(budget.enter(), Err(TooDeep { limit: 2 }));
    assert_eq!(budget.depth(), 2);
    budget.exit();
    assert_eq!(budget.enter(), Ok(()));
}

#[test]
fn exit_never_underflows() {
    let mut budget = NestingBudget::new(1);
    budget.exit();
    assert_eq!(budget.depth(), 0);
}
