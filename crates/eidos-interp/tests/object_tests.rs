//! Object values dispatch property and method access through a host-supplied
//! element class; these tests stand in for the embedding simulator with a
//! minimal element type.

use eidos_core::{
    global_id_for_string, EidosError, EidosObjectElement, EidosResult, EidosValue, ElementClass,
    MethodSignature, ObjectRc, PropertyGetter, PropertySetter, PropertySignature, ScopeRef,
    SymbolTable, TypeMask, ValueRc,
};
use eidos_interp::{builtin_function_map, Interpreter};
use eidos_parser::Script;
use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

#[derive(Debug)]
struct Particle {
    class: Rc<ElementClass>,
    mass: Cell<f64>,
}

impl EidosObjectElement for Particle {
    fn class(&self) -> Rc<ElementClass> {
        Rc::clone(&self.class)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn downcast(element: &ObjectRc) -> EidosResult<&Particle> {
    element
        .as_any()
        .downcast_ref::<Particle>()
        .ok_or_else(|| EidosError::internal("Particle", "element is not a Particle."))
}

fn particle_class() -> Rc<ElementClass> {
    let getter: PropertyGetter = Rc::new(|element| {
        let particle = downcast(element)?;
        Ok(Rc::new(EidosValue::float(particle.mass.get())))
    });
    let setter: PropertySetter = Rc::new(|element, value| {
        let particle = downcast(element)?;
        particle.mass.set(value.float_at(0)?);
        Ok(())
    });

    let mass = PropertySignature {
        name: Arc::new("mass".to_string()),
        id: global_id_for_string("mass"),
        mask: TypeMask::FLOAT | TypeMask::INTEGER,
        getter,
        setter: Some(setter),
    };

    let tag_getter: PropertyGetter = Rc::new(|element| {
        let particle = downcast(element)?;
        Ok(Rc::new(EidosValue::string(format!(
            "m={}",
            particle.mass.get()
        ))))
    });
    let tag = PropertySignature {
        name: Arc::new("tag".to_string()),
        id: global_id_for_string("tag"),
        mask: TypeMask::STRING,
        getter: tag_getter,
        setter: None,
    };

    let scaled_mass = MethodSignature::new(
        "scaledMass",
        TypeMask::FLOAT,
        Rc::new(|receiver: &EidosValue, _ctx, args: Vec<ValueRc>| {
            let factor = args[0].float_at(0)?;
            let mut out = Vec::with_capacity(receiver.count());
            for i in 0..receiver.count() {
                let particle = receiver.object_at(i)?;
                let particle = downcast(&particle)?;
                out.push(particle.mass.get() * factor);
            }
            Ok(Rc::new(if out.len() == 1 {
                EidosValue::float(out[0])
            } else {
                EidosValue::float_vector(out)
            }))
        }),
    )
    .param("factor", TypeMask::FLOAT | TypeMask::INTEGER | TypeMask::SINGLETON);

    ElementClass::new("Particle", vec![mass, tag], vec![scaled_mass])
}

fn chain_with_particles(masses: &[f64]) -> ScopeRef {
    let class = particle_class();
    let elements: Vec<ObjectRc> = masses
        .iter()
        .map(|&mass| {
            Rc::new(Particle {
                class: Rc::clone(&class),
                mass: Cell::new(mass),
            }) as ObjectRc
        })
        .collect();

    let intrinsic = SymbolTable::new_intrinsic();
    let variables = SymbolTable::new_variables(intrinsic).unwrap();
    let value = if elements.len() == 1 {
        EidosValue::object(elements.into_iter().next().unwrap())
    } else {
        EidosValue::object_vector(class, elements)
    };
    variables
        .borrow_mut()
        .set_value_no_copy(global_id_for_string("p"), Rc::new(value))
        .unwrap();
    variables
}

fn eval_in(variables: &ScopeRef, code: &str) -> EidosResult<ValueRc> {
    let mut script = Script::new(code);
    script.tokenize()?;
    script.parse_interpreter_block()?;

    let mut interpreter = Interpreter::new(&script, variables.clone(), builtin_function_map());
    interpreter.evaluate_interpreter_block(false)
}

#[test]
fn test_property_read_concatenates_across_elements() {
    let variables = chain_with_particles(&[1.0, 2.0, 3.0]);
    let result = eval_in(&variables, "p.mass;").unwrap();
    assert_eq!(*result, EidosValue::float_vector(vec![1.0, 2.0, 3.0]));
}

#[test]
fn test_property_write_broadcasts() {
    let variables = chain_with_particles(&[1.0, 2.0]);

    eval_in(&variables, "p.mass = 5.0;").unwrap();
    let result = eval_in(&variables, "p.mass;").unwrap();
    assert_eq!(*result, EidosValue::float_vector(vec![5.0, 5.0]));

    eval_in(&variables, "p.mass = c(7.0, 8.0);").unwrap();
    let result = eval_in(&variables, "p.mass;").unwrap();
    assert_eq!(*result, EidosValue::float_vector(vec![7.0, 8.0]));

    // One value per element is required otherwise.
    assert!(matches!(
        eval_in(&variables, "p.mass = c(1.0, 2.0, 3.0);").unwrap_err(),
        EidosError::LengthMismatch { .. }
    ));
}

#[test]
fn test_read_only_property_rejects_writes() {
    let variables = chain_with_particles(&[2.5]);
    assert_eq!(
        *eval_in(&variables, "p.tag;").unwrap(),
        EidosValue::string("m=2.5")
    );
    let err = eval_in(&variables, "p.tag = \"x\";").unwrap_err();
    assert!(err.to_string().contains("read-only"));
}

#[test]
fn test_unknown_property_and_member_on_non_object() {
    let variables = chain_with_particles(&[1.0]);
    let err = eval_in(&variables, "p.bogus;").unwrap_err();
    assert!(err.to_string().contains("bogus"));

    let err = eval_in(&variables, "x = 1; x.mass;").unwrap_err();
    assert!(matches!(err, EidosError::Type { .. }));
}

#[test]
fn test_subscript_and_element_access() {
    let variables = chain_with_particles(&[1.0, 2.0, 3.0]);
    let result = eval_in(&variables, "p[1].mass;").unwrap();
    assert_eq!(*result, EidosValue::float(2.0));

    let result = eval_in(&variables, "size(p[c(T, F, T)]);").unwrap();
    assert_eq!(*result, EidosValue::integer(2));
}

#[test]
fn test_method_dispatch() {
    let variables = chain_with_particles(&[1.5, 2.5]);
    let result = eval_in(&variables, "p.scaledMass(2.0);").unwrap();
    assert_eq!(*result, EidosValue::float_vector(vec![3.0, 5.0]));

    // Arity and masks are enforced for methods too.
    let err = eval_in(&variables, "p.scaledMass(\"x\");").unwrap_err();
    assert!(err.to_string().contains("factor"));

    let err = eval_in(&variables, "p.noSuchMethod(1);").unwrap_err();
    assert!(err.to_string().contains("noSuchMethod"));
}

#[test]
fn test_object_identity_comparison() {
    let variables = chain_with_particles(&[1.0, 2.0]);
    let result = eval_in(&variables, "p[0] == p[0];").unwrap();
    assert_eq!(*result, EidosValue::logical(true));
    let result = eval_in(&variables, "p[0] == p[1];").unwrap();
    assert_eq!(*result, EidosValue::logical(false));

    // Ordering comparisons are not defined for objects.
    assert!(eval_in(&variables, "p[0] < p[1];").is_err());
}
