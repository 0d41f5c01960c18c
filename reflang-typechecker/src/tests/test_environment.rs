use crate::*;

#[test]
fn test_declare_and_lookup_in_global_scope() {
    let mut env = Environment::new();
    let symbol = env.declare("x", PrimitiveType::Int, None).unwrap();

    assert_eq!(symbol.name, "x");
    assert_eq!(symbol.scope, env.global_scope());
    assert_eq!(env.lookup("x").unwrap().id, symbol.id);
    assert!(env.is_global(symbol.id));
    assert!(env.lookup("y").is_none());
}

#[test]
fn test_shadowing_and_restoration() {
    let mut env = Environment::new();
    let outer = env.declare("x", PrimitiveType::Int, None).unwrap();

    env.enter_scope();
    let inner = env.declare("x", PrimitiveType::Bool, None).unwrap();
    assert_ne!(outer.id, inner.id);
    assert_eq!(env.lookup("x").unwrap().ty, PrimitiveType::Bool);
    assert!(!env.is_global(inner.id));

    env.leave_scope().unwrap();
    let restored = env.lookup("x").unwrap();
    assert_eq!(restored.id, outer.id);
    assert_eq!(restored.ty, PrimitiveType::Int);
}

#[test]
fn test_lookup_walks_parent_chain() {
    let mut env = Environment::new();
    env.declare("a", PrimitiveType::String, None).unwrap();
    env.enter_scope();
    env.enter_scope();

    assert_eq!(env.depth(), 2);
    assert_eq!(env.lookup("a").unwrap().ty, PrimitiveType::String);
}

#[test]
fn test_duplicate_declaration_keeps_original() {
    let mut env = Environment::new();
    let original = env.declare("x", PrimitiveType::Int, None).unwrap();

    let existing = env.declare("x", PrimitiveType::Bool, None).unwrap_err();
    assert_eq!(existing, original);
    assert_eq!(env.lookup("x").unwrap().ty, PrimitiveType::Int);
    assert_eq!(env.symbols().len(), 1);
}

#[test]
fn test_inner_scope_bindings_disappear() {
    let mut env = Environment::new();
    env.enter_scope();
    let temp = env.declare("temp", PrimitiveType::Int, None).unwrap();
    env.leave_scope().unwrap();

    assert!(env.lookup("temp").is_none());
    // The symbol itself stays addressable through its id
    assert_eq!(env.symbol(temp.id).unwrap().name, "temp");
}

#[test]
fn test_leaving_global_scope_fails() {
    let mut env = Environment::new();
    assert_eq!(env.leave_scope(), Err(TypeError::ScopeUnderflow));

    env.enter_scope();
    assert!(env.leave_scope().is_ok());
    assert_eq!(env.leave_scope(), Err(TypeError::ScopeUnderflow));
    assert_eq!(env.current_scope(), env.global_scope());
}
