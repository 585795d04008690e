use eidos_core::{
    define_constant_named, global_id_for_string, ids, pool, EidosError, EidosValue, SymbolTable,
    SymbolTableKind, SYMBOL_TABLE_BASE_SIZE,
};
use std::rc::Rc;

fn chain() -> (eidos_core::ScopeRef, eidos_core::ScopeRef) {
    let intrinsic = SymbolTable::new_intrinsic();
    let variables = SymbolTable::new_variables(Rc::clone(&intrinsic)).unwrap();
    (intrinsic, variables)
}

#[test]
fn test_lookup_walks_to_the_nearest_holder() {
    let (_, variables) = chain();
    let id = global_id_for_string("mu");

    // Not bound anywhere yet.
    assert!(matches!(
        variables.borrow().get_value(id),
        Err(EidosError::UndefinedIdentifier { .. })
    ));

    variables
        .borrow_mut()
        .set_value(id, Rc::new(EidosValue::integer(7)))
        .unwrap();
    assert_eq!(*variables.borrow().get_value(id).unwrap(), EidosValue::integer(7));

    // Intrinsic constants resolve through the chain.
    let (pi, is_const) = variables
        .borrow()
        .get_value_with_constness(ids::PI)
        .unwrap();
    assert!(is_const);
    assert_eq!(pi.float_at(0).unwrap(), std::f64::consts::PI);

    let (mu, is_const) = variables.borrow().get_value_with_constness(id).unwrap();
    assert!(!is_const);
    assert_eq!(mu.integer_at(0).unwrap(), 7);
}

#[test]
fn test_constant_redefinition_is_rejected() {
    let (_, variables) = chain();

    let err = variables
        .borrow_mut()
        .set_value(ids::PI, Rc::new(EidosValue::integer(4)))
        .unwrap_err();
    assert!(matches!(err, EidosError::RedefinitionOfConstant { .. }));

    // PI is unchanged afterward.
    let pi = variables.borrow().get_value(ids::PI).unwrap();
    assert_eq!(pi.float_at(0).unwrap(), std::f64::consts::PI);
}

#[test]
fn test_intrinsic_constants_cannot_be_removed() {
    let (_, variables) = chain();
    for id in [ids::T, ids::F, ids::NULL, ids::PI, ids::E, ids::INF, ids::NAN] {
        assert!(variables.borrow_mut().remove_symbol(id, true).is_err());
    }
}

#[test]
fn test_defined_constants_removal_rules() {
    let (_, variables) = chain();
    define_constant_named(&variables, "K", Rc::new(EidosValue::integer(500))).unwrap();

    let id = global_id_for_string("K");
    assert!(variables.borrow().contains_symbol(id));

    // Without allow_constant the removal fails; with it, it succeeds.
    assert!(variables.borrow_mut().remove_symbol(id, false).is_err());
    variables.borrow_mut().remove_symbol(id, true).unwrap();
    assert!(!variables.borrow().contains_symbol(id));
}

#[test]
fn test_define_constant_splices_a_table_into_the_chain() {
    let (intrinsic, variables) = chain();
    assert!(Rc::ptr_eq(&variables.borrow().parent().unwrap(), &intrinsic));

    define_constant_named(&variables, "K", Rc::new(EidosValue::integer(500))).unwrap();

    let spliced = variables.borrow().parent().unwrap();
    assert_eq!(spliced.borrow().kind(), SymbolTableKind::DefinedConstants);
    assert!(Rc::ptr_eq(&spliced.borrow().parent().unwrap(), &intrinsic));

    // A second definition reuses the spliced table.
    define_constant_named(&variables, "K2", Rc::new(EidosValue::integer(2))).unwrap();
    assert!(Rc::ptr_eq(&variables.borrow().parent().unwrap(), &spliced));

    // Defined constants cannot be shadowed by variables.
    let err = variables
        .borrow_mut()
        .set_value(global_id_for_string("K"), Rc::new(EidosValue::integer(1)))
        .unwrap_err();
    assert!(matches!(err, EidosError::RedefinitionOfConstant { .. }));

    // And redefinition through defineConstant fails too.
    assert!(define_constant_named(&variables, "K", Rc::new(EidosValue::integer(1))).is_err());
}

#[test]
fn test_storage_transition_preserves_bindings() {
    let (_, variables) = chain();

    let count = SYMBOL_TABLE_BASE_SIZE + 8;
    let mut ids = Vec::new();
    for i in 0..count {
        let id = global_id_for_string(&format!("var_{}", i));
        ids.push((id, i as i64));
        variables
            .borrow_mut()
            .set_value(id, Rc::new(EidosValue::integer(i as i64)))
            .unwrap();
        let expect_hash = i + 1 > SYMBOL_TABLE_BASE_SIZE;
        assert_eq!(variables.borrow().is_using_hash_storage(), expect_hash);
    }

    // Every binding survives the migration with its value.
    for (id, expected) in &ids {
        assert_eq!(
            variables.borrow().get_value(*id).unwrap().integer_at(0).unwrap(),
            *expected
        );
    }

    // Enumeration matches as a set.
    let names = variables.borrow().symbol_names(false, true);
    let mut names: Vec<String> = names.into_iter().map(|n| n.to_string()).collect();
    names.sort();
    let mut expected: Vec<String> = (0..count).map(|i| format!("var_{}", i)).collect();
    expected.sort();
    assert_eq!(names, expected);
}

#[test]
fn test_enumerate_is_root_first() {
    let (_, variables) = chain();
    variables
        .borrow_mut()
        .set_value(global_id_for_string("zzz"), Rc::new(EidosValue::integer(1)))
        .unwrap();

    let names = variables.borrow().symbol_names(true, true);
    let names: Vec<String> = names.into_iter().map(|n| n.to_string()).collect();

    // Parent (intrinsic) names precede local names.
    let t_pos = names.iter().position(|n| n == "T").unwrap();
    let z_pos = names.iter().position(|n| n == "zzz").unwrap();
    assert!(t_pos < z_pos);
}

#[test]
fn test_invisible_values_are_never_stored() {
    let (_, variables) = chain();
    let id = global_id_for_string("v");

    let invisible = pool::static_null_invisible();
    assert!(invisible.is_invisible());

    // set_value copies, and the copy is visible.
    variables.borrow_mut().set_value(id, invisible).unwrap();
    assert!(!variables.borrow().get_value(id).unwrap().is_invisible());

    // The no-copy path refuses invisible values outright.
    let mut marked = EidosValue::integer(3);
    marked.set_invisible(true);
    assert!(variables
        .borrow_mut()
        .set_value_no_copy(id, Rc::new(marked))
        .is_err());
}

#[test]
fn test_intrinsic_identity() {
    let (_, variables) = chain();

    // T, F, and NULL resolve to the canonical shared instances.
    let t = variables.borrow().get_value(ids::T).unwrap();
    assert!(Rc::ptr_eq(&t, &pool::static_logical(true)));
    let f = variables.borrow().get_value(ids::F).unwrap();
    assert!(Rc::ptr_eq(&f, &pool::static_logical(false)));
    let null = variables.borrow().get_value(ids::NULL).unwrap();
    assert!(Rc::ptr_eq(&null, &pool::static_null()));

    // Each intrinsic resolves to the same instance on every lookup.
    for id in [ids::PI, ids::E, ids::INF, ids::NAN] {
        let first = variables.borrow().get_value(id).unwrap();
        let second = variables.borrow().get_value(id).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    let inf = variables.borrow().get_value(ids::INF).unwrap();
    assert_eq!(inf.float_at(0).unwrap(), f64::INFINITY);
    let nan = variables.borrow().get_value(ids::NAN).unwrap();
    assert!(nan.float_at(0).unwrap().is_nan());
    let e = variables.borrow().get_value(ids::E).unwrap();
    assert_eq!(e.float_at(0).unwrap(), std::f64::consts::E);
}
