use super::*;

struct Outer(u32);
impl Capability for Outer {
    const NAME: &'static str = "Outer";
}

struct Inner;
impl Capability for Inner {
    const NAME: &'static str = "Inner";
}

#[test]
fn nested_pushes_shadow_and_restore() {
    let mut env = Environment::new();
    env.push(Arc::new(Outer(1)));
    env.push(Arc::new(Outer(2)));
    assert_eq!(env.peek::<Outer>().unwrap().0, 2);
    assert_eq!(env.pop::<Outer>().unwrap().0, 2);
    assert_eq!(env.peek::<Outer>().unwrap().0, 1);
    env.pop::<Outer>().unwrap();
    assert!(env.peek::<Outer>().is_none());
    assert_eq!(env.depth(), 0);
}

#[test]
fn pops_must_be_lifo() {
    let mut env = Environment::new();
    env.push(Arc::new(Outer(1)));
    env.push(Arc::new(Inner));
    let err = env.pop::<Outer>().err().unwrap().to_string();
    assert!(err.contains("most recently pushed capability is Inner"));
    env.pop::<Inner>().unwrap();
    env.pop::<Outer>().unwrap();
    assert!(env.pop::<Outer>().is_err());
}

#[test]
fn required_peek_reports_missing_capability() {
    let env = Environment::new();
    let err = env.peek_required::<Inner>().err().unwrap();
    assert!(err.to_string().contains("Inner"));
}

#[test]
fn lookup_by_name_returns_shared_value() {
    let mut env = Environment::new();
    env.push(Arc::new(Outer(7)));
    let any = env.peek_by_name("Outer").unwrap();
    assert_eq!(any.downcast::<Outer>().ok().unwrap().0, 7);
}
