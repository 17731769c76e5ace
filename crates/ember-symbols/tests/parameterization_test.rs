//! Tests for generic parameterization and member substitution

use ember_symbols::{
    CoercionRegistry, EngineConfig, GenericsConfig, MatchConfig, Parameterizer, PopulationState, ScopeId, Span,
    Symbol, SymbolCategory, SymbolError, SymbolGenus, SymbolId, SymbolTable, TypeMatcher,
};

struct Fixture {
    table: SymbolTable,
    module: ScopeId,
    string: SymbolId,
    integer: SymbolId,
    boolean: SymbolId,
}

fn fixture() -> Fixture {
    let mut table = SymbolTable::new();
    let module = table.add_module("lib");
    let string = class(&mut table, module, "String");
    let integer = class(&mut table, module, "Integer");
    let boolean = class(&mut table, module, "Boolean");
    Fixture {
        table,
        module,
        string,
        integer,
        boolean,
    }
}

fn class(table: &mut SymbolTable, module: ScopeId, name: &str) -> SymbolId {
    let id = table.create_type(module, name, SymbolGenus::Class, Span::synthetic()).unwrap();
    table.define(module, id).unwrap();
    id
}

fn property(table: &mut SymbolTable, owner: SymbolId, name: &str, type_ref: SymbolId) -> SymbolId {
    let scope = table.member_scope(owner).unwrap();
    table
        .declare(scope, Symbol::variable(name, Some(type_ref), Span::synthetic()))
        .unwrap()
}

fn member(table: &SymbolTable, owner: SymbolId, name: &str) -> SymbolId {
    let scope = table.member_scope(owner).unwrap();
    let found = table.scope(scope).unwrap().lookup(name);
    assert_eq!(found.len(), 1, "expected exactly one member '{}'", name);
    found[0]
}

fn type_of(table: &SymbolTable, id: SymbolId) -> Option<SymbolId> {
    table.symbol(id).unwrap().type_ref
}

/// `Box of type T` with a single `value: T`
fn boxed(f: &mut Fixture) -> (SymbolId, SymbolId) {
    let boxed = class(&mut f.table, f.module, "Box");
    let t = f.table.create_type_parameter(boxed, "T", Span::synthetic()).unwrap();
    property(&mut f.table, boxed, "value", t);
    (boxed, t)
}

fn parameterize(table: &mut SymbolTable, generic: SymbolId, arguments: &[SymbolId]) -> Result<SymbolId, SymbolError> {
    let config = GenericsConfig::default();
    Parameterizer::new(table, &config).parameterize(generic, arguments, Span::synthetic())
}

fn outline(table: &mut SymbolTable, generic: SymbolId, arguments: &[SymbolId]) -> SymbolId {
    let config = GenericsConfig::default();
    Parameterizer::new(table, &config)
        .outline(generic, arguments, Span::synthetic())
        .unwrap()
}

#[test]
fn test_box_of_string() {
    let mut f = fixture();
    let (boxed, _) = boxed(&mut f);

    let instance = parameterize(&mut f.table, boxed, &[f.string]).unwrap();

    let symbol = f.table.symbol(instance).unwrap();
    assert_ne!(instance, boxed);
    assert_eq!(symbol.category(), SymbolCategory::Type);
    assert!(!symbol.is_generic_in_nature());
    assert_eq!(symbol.generic_info().unwrap().population(), PopulationState::Populated);
    assert_eq!(f.table.display_name(instance).unwrap(), "Box of (String)");

    assert_eq!(f.table.members(instance).unwrap().len(), 1);
    let value = member(&f.table, instance, "value");
    assert_eq!(type_of(&f.table, value), Some(f.string));
}

#[test]
fn test_pair_of_integer_boolean() {
    let mut f = fixture();
    let pair = class(&mut f.table, f.module, "Pair");
    let k = f.table.create_type_parameter(pair, "K", Span::synthetic()).unwrap();
    let v = f.table.create_type_parameter(pair, "V", Span::synthetic()).unwrap();
    property(&mut f.table, pair, "first", k);
    property(&mut f.table, pair, "second", v);
    let swap = f.table.create_method(pair, "lookup", Span::synthetic()).unwrap();
    f.table.add_call_parameter(swap, "key", Some(k), Span::synthetic()).unwrap();
    f.table.symbol_mut(swap).unwrap().type_ref = Some(v);

    let instance = parameterize(&mut f.table, pair, &[f.integer, f.boolean]).unwrap();

    assert_eq!(f.table.members(instance).unwrap().len(), 3);
    assert_eq!(type_of(&f.table, member(&f.table, instance, "first")), Some(f.integer));
    assert_eq!(type_of(&f.table, member(&f.table, instance, "second")), Some(f.boolean));

    let lookup = member(&f.table, instance, "lookup");
    assert_ne!(lookup, swap);
    assert_eq!(type_of(&f.table, lookup), Some(f.boolean));
    assert_eq!(f.table.parameter_types(lookup).unwrap(), vec![Some(f.integer)]);

    // the generic itself is unchanged
    assert_eq!(type_of(&f.table, member(&f.table, pair, "first")), Some(k));
    assert_eq!(f.table.parameter_types(swap).unwrap(), vec![Some(k)]);
    assert_eq!(f.table.display_name(instance).unwrap(), "Pair of (Integer, Boolean)");
}

#[test]
fn test_identity_is_idempotent() {
    let mut f = fixture();
    let (boxed, _) = boxed(&mut f);

    let outlined = outline(&mut f.table, boxed, &[f.string]);
    assert_eq!(
        f.table.generic_info(outlined).unwrap().population(),
        PopulationState::Empty
    );
    assert!(f.table.members(outlined).unwrap().is_empty());

    let first = parameterize(&mut f.table, boxed, &[f.string]).unwrap();
    let second = parameterize(&mut f.table, boxed, &[f.string]).unwrap();

    assert_eq!(first, outlined);
    assert_eq!(second, outlined);
    assert_eq!(f.table.instantiations_created(), 1);
    assert_eq!(f.table.members(first).unwrap().len(), 1);
    assert_eq!(
        f.table.fully_qualified_name(first).unwrap(),
        f.table.fully_qualified_name(second).unwrap()
    );
}

#[test]
fn test_own_parameters_give_the_generic() {
    let mut f = fixture();
    let (boxed, t) = boxed(&mut f);

    assert_eq!(parameterize(&mut f.table, boxed, &[t]).unwrap(), boxed);
    assert_eq!(f.table.instantiations_created(), 0);
}

#[test]
fn test_conceptual_argument_keeps_template() {
    let mut f = fixture();
    let (boxed, _) = boxed(&mut f);
    let holder = class(&mut f.table, f.module, "Holder");
    let u = f.table.create_type_parameter(holder, "U", Span::synthetic()).unwrap();

    let instance = parameterize(&mut f.table, boxed, &[u]).unwrap();

    let symbol = f.table.symbol(instance).unwrap();
    assert!(symbol.is_generic_in_nature());
    assert_eq!(symbol.category(), SymbolCategory::TemplateType);
    assert_eq!(type_of(&f.table, member(&f.table, instance, "value")), Some(u));
}

#[test]
fn test_substitution_preserves_member_count() {
    let mut f = fixture();
    let (boxed, t) = boxed(&mut f);
    property(&mut f.table, boxed, "label", f.string);
    let get = f.table.create_method(boxed, "get", Span::synthetic()).unwrap();
    f.table.symbol_mut(get).unwrap().type_ref = Some(t);

    let of_string = parameterize(&mut f.table, boxed, &[f.string]).unwrap();
    let of_integer = parameterize(&mut f.table, boxed, &[f.integer]).unwrap();

    assert_eq!(f.table.members(boxed).unwrap().len(), 3);
    assert_eq!(f.table.members(of_string).unwrap().len(), 3);
    assert_eq!(f.table.members(of_integer).unwrap().len(), 3);
    assert_eq!(type_of(&f.table, member(&f.table, of_integer, "label")), Some(f.string));
    assert_eq!(type_of(&f.table, member(&f.table, of_integer, "get")), Some(f.integer));
}

#[test]
fn test_constructor_takes_instantiation_name() {
    let mut f = fixture();
    let (boxed, t) = boxed(&mut f);
    let constructor = f.table.create_method(boxed, "Box", Span::synthetic()).unwrap();
    f.table.add_call_parameter(constructor, "value", Some(t), Span::synthetic()).unwrap();
    {
        let symbol = f.table.symbol_mut(constructor).unwrap();
        symbol.flags.is_constructor = true;
        symbol.type_ref = Some(boxed);
    }

    let instance = parameterize(&mut f.table, boxed, &[f.string]).unwrap();
    let name = f.table.symbol(instance).unwrap().name.clone();

    let copied = member(&f.table, instance, &name);
    assert_eq!(type_of(&f.table, copied), Some(instance));
    assert_eq!(f.table.parameter_types(copied).unwrap(), vec![Some(f.string)]);
}

#[test]
fn test_colliding_operations_fail_and_roll_back() {
    let mut f = fixture();
    let (boxed, t) = boxed(&mut f);
    let add_t = f.table.create_method(boxed, "add", Span::synthetic()).unwrap();
    f.table.add_call_parameter(add_t, "item", Some(t), Span::synthetic()).unwrap();
    let add_string = f.table.create_method(boxed, "add", Span::synthetic()).unwrap();
    f.table.add_call_parameter(add_string, "item", Some(f.string), Span::synthetic()).unwrap();
    let symbols = f.table.len();
    let module_size = f.table.scope(f.module).unwrap().len();

    let err = parameterize(&mut f.table, boxed, &[f.string]).unwrap_err();

    assert!(matches!(err, SymbolError::DuplicateOperation { ref operation, .. } if operation == "add"));
    assert_eq!(err.code().as_str(), "S1007");
    assert_eq!(f.table.len(), symbols);
    assert_eq!(f.table.scope(f.module).unwrap().len(), module_size);
    assert_eq!(f.table.instantiations_created(), 0);

    let instance = parameterize(&mut f.table, boxed, &[f.integer]).unwrap();
    assert_eq!(f.table.members(instance).unwrap().len(), 3);
}

#[test]
fn test_self_reference_resolves_to_pending_instance() {
    let mut f = fixture();
    let node = class(&mut f.table, f.module, "Node");
    let t = f.table.create_type_parameter(node, "T", Span::synthetic()).unwrap();
    let node_of_t = outline(&mut f.table, node, &[t]);
    assert_eq!(node_of_t, node);
    property(&mut f.table, node, "value", t);
    property(&mut f.table, node, "next", node_of_t);

    let instance = parameterize(&mut f.table, node, &[f.string]).unwrap();

    assert_eq!(type_of(&f.table, member(&f.table, instance, "next")), Some(instance));
    assert_eq!(type_of(&f.table, member(&f.table, instance, "value")), Some(f.string));
    assert_eq!(f.table.instantiations_created(), 1);
}

#[test]
fn test_mutual_reference() {
    let mut f = fixture();
    let a = class(&mut f.table, f.module, "A");
    let t = f.table.create_type_parameter(a, "T", Span::synthetic()).unwrap();
    let b = class(&mut f.table, f.module, "B");
    let u = f.table.create_type_parameter(b, "U", Span::synthetic()).unwrap();

    let b_of_t = outline(&mut f.table, b, &[t]);
    property(&mut f.table, a, "partner", b_of_t);
    let a_of_u = outline(&mut f.table, a, &[u]);
    property(&mut f.table, b, "partner", a_of_u);

    let config = GenericsConfig::default();
    {
        let mut parameterizer = Parameterizer::new(&mut f.table, &config);
        assert!(parameterizer.add_dependent_reference(a, b_of_t).unwrap());
        assert!(parameterizer.add_dependent_reference(b, a_of_u).unwrap());
    }

    let a_of_string = parameterize(&mut f.table, a, &[f.string]).unwrap();
    let b_of_string = type_of(&f.table, member(&f.table, a_of_string, "partner")).unwrap();

    let b_info = f.table.generic_info(b_of_string).unwrap();
    assert_eq!(b_info.generic_type(), Some(b));
    assert_eq!(b_info.parameter_symbols(), vec![f.string]);
    assert_eq!(b_info.population(), PopulationState::Populated);
    assert_eq!(type_of(&f.table, member(&f.table, b_of_string, "partner")), Some(a_of_string));
    assert_eq!(parameterize(&mut f.table, b, &[f.string]).unwrap(), b_of_string);
    assert_eq!(f.table.instantiations_created(), 4);
}

#[test]
fn test_nested_generic_member_is_parameterized() {
    let mut f = fixture();
    let (boxed, _) = boxed(&mut f);
    let pair = class(&mut f.table, f.module, "Pair");
    let k = f.table.create_type_parameter(pair, "K", Span::synthetic()).unwrap();
    f.table.create_type_parameter(pair, "V", Span::synthetic()).unwrap();
    let box_of_k = outline(&mut f.table, boxed, &[k]);
    property(&mut f.table, pair, "boxed", box_of_k);

    let instance = parameterize(&mut f.table, pair, &[f.integer, f.boolean]).unwrap();
    let box_of_integer = type_of(&f.table, member(&f.table, instance, "boxed")).unwrap();

    assert_eq!(parameterize(&mut f.table, boxed, &[f.integer]).unwrap(), box_of_integer);
    assert_eq!(
        type_of(&f.table, member(&f.table, box_of_integer, "value")),
        Some(f.integer)
    );
}

#[test]
fn test_dependents_follow_partial_instantiation() {
    let mut f = fixture();
    let (boxed, _) = boxed(&mut f);
    let outer = class(&mut f.table, f.module, "Outer");
    let t = f.table.create_type_parameter(outer, "T", Span::synthetic()).unwrap();
    let box_of_t = outline(&mut f.table, boxed, &[t]);
    let box_of_string = parameterize(&mut f.table, boxed, &[f.string]).unwrap();

    let config = GenericsConfig::default();
    {
        let mut parameterizer = Parameterizer::new(&mut f.table, &config);
        assert!(!parameterizer.add_dependent_reference(outer, box_of_string).unwrap());
        assert!(parameterizer.add_dependent_reference(outer, box_of_t).unwrap());
        assert!(!parameterizer.add_dependent_reference(outer, box_of_t).unwrap());
    }
    assert_eq!(f.table.generic_info(outer).unwrap().dependents(), &[box_of_t]);

    let holder = class(&mut f.table, f.module, "Holder");
    let u = f.table.create_type_parameter(holder, "U", Span::synthetic()).unwrap();
    let outer_of_u = parameterize(&mut f.table, outer, &[u]).unwrap();
    let box_of_u = outline(&mut f.table, boxed, &[u]);
    assert_eq!(f.table.generic_info(outer_of_u).unwrap().dependents(), &[box_of_u]);

    let outer_of_integer = parameterize(&mut f.table, outer, &[f.integer]).unwrap();
    assert!(f.table.generic_info(outer_of_integer).unwrap().dependents().is_empty());
    let box_of_integer = outline(&mut f.table, boxed, &[f.integer]);
    assert_eq!(
        f.table.generic_info(box_of_integer).unwrap().population(),
        PopulationState::Populated
    );
}

#[test]
fn test_unbounded_expansion_stops() {
    let mut f = fixture();
    let (boxed, _) = boxed(&mut f);
    let grow = class(&mut f.table, f.module, "Grow");
    let t = f.table.create_type_parameter(grow, "T", Span::synthetic()).unwrap();
    let box_of_t = outline(&mut f.table, boxed, &[t]);
    let grow_of_box = outline(&mut f.table, grow, &[box_of_t]);
    property(&mut f.table, grow, "next", grow_of_box);
    let symbols = f.table.len();
    let created = f.table.instantiations_created();

    let config = GenericsConfig { max_depth: 8 };
    let err = Parameterizer::new(&mut f.table, &config)
        .parameterize(grow, &[f.string], Span::new(10, 14, 3, 5))
        .unwrap_err();

    assert!(matches!(err, SymbolError::NoProgress { .. }));
    assert_eq!(err.span(), Span::new(10, 14, 3, 5));
    assert_eq!(f.table.len(), symbols);
    assert_eq!(f.table.instantiations_created(), created);
}

#[test]
fn test_arity_and_non_generic_failures() {
    let mut f = fixture();
    let (boxed, _) = boxed(&mut f);

    let err = parameterize(&mut f.table, boxed, &[f.string, f.integer]).unwrap_err();
    assert!(matches!(err, SymbolError::ArityMismatch { expected: 1, actual: 2, .. }));
    assert!(err.is_internal());

    let err = parameterize(&mut f.table, f.string, &[f.integer]).unwrap_err();
    assert!(matches!(err, SymbolError::NotGeneric { ref name, .. } if name == "String"));
}

#[test]
fn test_generic_function() {
    let mut f = fixture();
    let identity = f.table.create_function(f.module, "identity", Span::synthetic()).unwrap();
    f.table.define(f.module, identity).unwrap();
    let t = f.table.create_type_parameter(identity, "T", Span::synthetic()).unwrap();
    f.table.add_call_parameter(identity, "x", Some(t), Span::synthetic()).unwrap();
    f.table.symbol_mut(identity).unwrap().type_ref = Some(t);
    assert_eq!(f.table.symbol(identity).unwrap().category(), SymbolCategory::TemplateFunction);

    let instance = parameterize(&mut f.table, identity, &[f.string]).unwrap();

    let symbol = f.table.symbol(instance).unwrap();
    assert_eq!(symbol.category(), SymbolCategory::Function);
    assert_eq!(symbol.type_ref, Some(f.string));
    assert_eq!(f.table.parameter_types(instance).unwrap(), vec![Some(f.string)]);
    assert_eq!(f.table.parameter_types(identity).unwrap(), vec![Some(t)]);
}

#[test]
fn test_super_type_is_substituted() {
    let mut f = fixture();
    let container = class(&mut f.table, f.module, "Container");
    f.table.create_type_parameter(container, "T", Span::synthetic()).unwrap();
    let sorted = class(&mut f.table, f.module, "Sorted");
    let e = f.table.create_type_parameter(sorted, "E", Span::synthetic()).unwrap();
    let container_of_e = outline(&mut f.table, container, &[e]);
    f.table.set_super_type(sorted, container_of_e).unwrap();

    let sorted_of_string = parameterize(&mut f.table, sorted, &[f.string]).unwrap();
    let container_of_string = parameterize(&mut f.table, container, &[f.string]).unwrap();

    let detail = f.table.symbol(sorted_of_string).unwrap().aggregate().unwrap();
    assert_eq!(detail.super_type, Some(container_of_string));

    let coercions = CoercionRegistry::new();
    let config = MatchConfig::default();
    let matcher = TypeMatcher::new(&f.table, &coercions, &config);
    assert!(matcher.weight(sorted_of_string, container_of_string) > 0.0);
    assert!(!matcher.is_assignable(container_of_string, sorted_of_string));
}

#[test]
fn test_engine_config_drives_depth() {
    let config = EngineConfig::from_json(r#"{ "generics": { "max_depth": 1 } }"#).unwrap();
    let mut f = fixture();
    let (boxed, _) = boxed(&mut f);
    let outer = class(&mut f.table, f.module, "Outer");
    let t = f.table.create_type_parameter(outer, "T", Span::synthetic()).unwrap();
    let box_of_t = outline(&mut f.table, boxed, &[t]);
    let box_of_box = outline(&mut f.table, boxed, &[box_of_t]);
    property(&mut f.table, outer, "nested", box_of_box);

    let err = Parameterizer::new(&mut f.table, &config.generics)
        .parameterize(outer, &[f.string], Span::synthetic())
        .unwrap_err();
    assert!(matches!(err, SymbolError::NoProgress { .. }));

    assert!(parameterize(&mut f.table, outer, &[f.string]).is_ok());
}

#[test]
fn test_overloaded_generic_functions_instantiate_separately() {
    let mut f = fixture();
    let single = f.table.create_function(f.module, "convert", Span::synthetic()).unwrap();
    let t1 = f.table.create_type_parameter(single, "T", Span::synthetic()).unwrap();
    f.table.add_call_parameter(single, "x", Some(t1), Span::synthetic()).unwrap();
    f.table.define(f.module, single).unwrap();

    let double = f.table.create_function(f.module, "convert", Span::synthetic()).unwrap();
    let t2 = f.table.create_type_parameter(double, "T", Span::synthetic()).unwrap();
    f.table.add_call_parameter(double, "x", Some(t2), Span::synthetic()).unwrap();
    f.table.add_call_parameter(double, "y", Some(f.integer), Span::synthetic()).unwrap();
    f.table.define(f.module, double).unwrap();

    let coercions = CoercionRegistry::new();
    let config = MatchConfig::default();
    assert!(!TypeMatcher::new(&f.table, &coercions, &config).is_exact_same_type(t1, t2));

    let first = parameterize(&mut f.table, single, &[f.string]).unwrap();
    let second = parameterize(&mut f.table, double, &[f.string]).unwrap();

    assert_ne!(first, second);
    assert_eq!(f.table.generic_info(first).unwrap().generic_type(), Some(single));
    assert_eq!(f.table.generic_info(second).unwrap().generic_type(), Some(double));
    assert_eq!(f.table.parameter_types(first).unwrap(), vec![Some(f.string)]);
    assert_eq!(
        f.table.parameter_types(second).unwrap(),
        vec![Some(f.string), Some(f.integer)]
    );
    assert_eq!(f.table.instantiations_created(), 2);

    // repeated requests still land on the same instantiation
    assert_eq!(parameterize(&mut f.table, double, &[f.string]).unwrap(), second);
}
