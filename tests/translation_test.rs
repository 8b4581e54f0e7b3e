use dynamo_linq::prelude::*;
use dynamo_linq::{parse, translate, translate_with};
use pretty_assertions::assert_eq;
use serde_json::json;

fn model() -> Model {
    Model::builder()
        .entity(
            EntityType::builder("Person")
                .table("people")
                .partition_key("Id")
                .property("Id", HostType::String)
                .property("Name", HostType::String)
                .property_as("Age", HostType::Int32, "age")
                .property("Balance", HostType::Decimal)
                .property("Active", HostType::Bool)
                .build(),
        )
        .build()
        .expect("valid model")
}

fn attribute(shape: &mut QueryShape, model: &Model, name: &str) -> PartiqlExpr {
    let property = model.entity("Person").unwrap().property(name).unwrap();
    shape.get_or_create_attribute(property).into()
}

#[test]
fn test_where_comparison() {
    let model = model();
    let shape = translate(&model, &parse("Person.Where(p => p.Age > 10)").unwrap()).unwrap();

    let f = ExpressionFactory::default();
    let mut expected = QueryShape::new(model.entity("Person").unwrap());
    let age = attribute(&mut expected, &model, "Age");
    expected.apply_filter(f.greater_than(age, f.constant(Literal::Int32(10), None)));

    assert_eq!(shape, expected);
    assert_eq!(shape.from().table, "people");
    assert!(shape.projection_map().is_empty());
}

#[test]
fn test_where_starts_with() {
    let model = model();
    let chain = parse("Person.Where(p => p.Name.StartsWith(\"A\"))").unwrap();
    let shape = translate(&model, &chain).unwrap();

    let PartiqlExpr::FunctionCall { name, args, return_type, .. } = shape.filter().unwrap() else {
        panic!("expected a function call, got {:?}", shape.filter());
    };
    assert_eq!(name, "BEGINS_WITH");
    assert_eq!(*return_type, HostType::Bool);
    assert_eq!(args.len(), 2);
    assert!(matches!(&args[0], PartiqlExpr::AttributeAccess(a) if a.property.name == "Name"));
    assert!(matches!(
        &args[1],
        PartiqlExpr::Constant { value: Some(Literal::String(s)), .. } if s == "A"
    ));
}

#[test]
fn test_two_wheres_conjoin_in_order() {
    let model = model();
    let chain = parse("Person.Where(p => p.Age > 10).Where(p => p.Name.Contains(\"x\"))").unwrap();
    let shape = translate(&model, &chain).unwrap();

    let first = translate(&model, &parse("Person.Where(p => p.Age > 10)").unwrap()).unwrap();
    let second = translate(&model, &parse("Person.Where(p => p.Name.Contains(\"x\"))").unwrap())
        .unwrap();
    let expected = ExpressionFactory::default().and_also(
        first.filter().unwrap().clone(),
        second.filter().unwrap().clone(),
    );
    assert_eq!(shape.filter(), Some(&expected));
}

#[test]
fn test_boolean_constant_keeps_its_own_type() {
    let model = model();
    let chain = parse("Person.Where(p => p.Age > 10 && true)").unwrap();
    let query = translate(&model, &chain).unwrap().to_partiql().unwrap();

    assert_eq!(
        query.statement,
        "SELECT * FROM \"people\" WHERE (\"age\" > ?) AND ?"
    );
    let parameters: Vec<_> = query
        .parameters
        .iter()
        .map(|p| (p.attribute_type, p.value.clone()))
        .collect();
    assert_eq!(
        parameters,
        vec![
            (AttributeType::Number, json!("10")),
            (AttributeType::Boolean, json!(true)),
        ]
    );
}

#[test]
fn test_conjunction_keeps_both_filters_intact() {
    let model = model();
    let first = translate(&model, &parse("Person.Where(p => true)").unwrap()).unwrap();
    let second = translate(&model, &parse("Person.Where(p => p.Age > 10)").unwrap()).unwrap();

    let chain = parse("Person.Where(p => true).Where(p => p.Age > 10)").unwrap();
    let shape = translate(&model, &chain).unwrap();

    let expected = ExpressionFactory::default().and_also(
        first.filter().unwrap().clone(),
        second.filter().unwrap().clone(),
    );
    assert_eq!(shape.filter(), Some(&expected));
    let PartiqlExpr::Binary { left, .. } = shape.filter().unwrap() else {
        panic!("expected a conjunction, got {:?}", shape.filter());
    };
    assert!(left.type_mapping().is_none());
}

#[test]
fn test_select_scalar() {
    let model = model();
    let shape = translate(&model, &parse("Person.Select(p => p.Name)").unwrap()).unwrap();

    let map = shape.projection_map();
    assert_eq!(map.len(), 1);
    let root = map.get(&ProjectionMember::root()).unwrap();
    assert!(matches!(root, PartiqlExpr::AttributeAccess(a) if a.property.name == "Name"));
}

#[test]
fn test_select_object() {
    let model = model();
    let shape = translate(
        &model,
        &parse("Person.Select(p => new { p.Name, p.Age })").unwrap(),
    )
    .unwrap();

    let members: Vec<String> = shape.projection_map().keys().map(|m| m.to_string()).collect();
    assert_eq!(members, vec!["Name", "Age"]);
    let attributes: Vec<&str> = shape
        .projection_map()
        .values()
        .map(|e| match e {
            PartiqlExpr::AttributeAccess(a) => a.property.attribute.as_str(),
            other => panic!("unexpected projection {:?}", other),
        })
        .collect();
    assert_eq!(attributes, vec!["Name", "age"]);
}

#[test]
fn test_unmapped_method_fails() {
    let model = model();
    let chain = parse("Person.Where(p => Math.Round(p.Balance) > 3)").unwrap();
    let err = translate(&model, &chain).unwrap_err();

    let QueryError::Untranslatable { expression, details } = &err else {
        panic!("expected an untranslatable error, got {:?}", err);
    };
    assert_eq!(expression, "p => (Math.Round(p.Balance) > 3)");
    assert_eq!(
        details.as_deref(),
        Some("static method 'Math.Round' has no translation")
    );
    assert!(err.to_string().contains("could not be translated"));
}

#[test]
fn test_unknown_instance_method_fails() {
    let model = model();
    let chain = parse("Person.Where(p => p.Name.EndsWith(\"z\"))").unwrap();
    let err = translate(&model, &chain).unwrap_err();
    assert!(matches!(
        err,
        QueryError::Untranslatable { details: Some(ref d), .. } if d.contains("EndsWith")
    ));
}

#[test]
fn test_translation_is_deterministic() {
    let model = model();
    let chain = parse(
        "Person.Where(p => p.Age >= 18 && !p.Active).Select(p => new { p.Name, Info = new { p.Age, p.Balance } })",
    )
    .unwrap();
    let first = translate(&model, &chain).unwrap();
    let second = translate(&model, &chain).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_partiql().unwrap(), second.to_partiql().unwrap());
}

#[test]
fn test_unsupported_operators_fail_fast() {
    let model = model();
    for (query, operator) in [
        ("Person.OrderBy(p => p.Age)", "OrderBy"),
        ("Person.Where(p => p.Age > 1).ThenByDescending(p => p.Name)", "ThenByDescending"),
        ("Person.Take(10)", "Take"),
        ("Person.Count()", "Count"),
        ("Person.Join(Person, a => a.Id, b => b.Id, a => a.Name)", "Join"),
        ("Person.GroupBy(p => p.Age)", "GroupBy"),
    ] {
        let err = translate(&model, &parse(query).unwrap()).unwrap_err();
        assert!(
            matches!(err, QueryError::UnsupportedOperator(name) if name == operator),
            "{}: {:?}",
            query,
            err
        );
    }
}

#[test]
fn test_where_after_select() {
    let model = model();
    let chain = parse("Person.Select(p => new { p.Name }).Where(x => x.Name == \"A\")").unwrap();
    let shape = translate(&model, &chain).unwrap();

    assert_eq!(shape.filter().unwrap().to_string(), "(\"Person\".Name = \"A\")");
    let query = shape.to_partiql().unwrap();
    assert_eq!(
        query.statement,
        "SELECT \"Name\" FROM \"people\" WHERE \"Name\" = ?"
    );
}

#[test]
fn test_select_after_select() {
    let model = model();
    let chain = parse("Person.Select(p => new { p.Name, p.Age }).Select(x => x.Age)").unwrap();
    let shape = translate(&model, &chain).unwrap();

    assert_eq!(shape.projection_map().len(), 1);
    assert_eq!(
        shape.get_projection(&ProjectionMember::root()).unwrap().to_string(),
        "\"Person\".age"
    );
}

#[test]
fn test_select_whole_entity() {
    let model = model();
    let shape = translate(&model, &parse("Person.Select(p => p)").unwrap()).unwrap();
    assert!(shape
        .get_projection(&ProjectionMember::root())
        .unwrap()
        .is_entity_projection());
    assert_eq!(shape.to_partiql().unwrap().statement, "SELECT * FROM \"people\"");
}

#[test]
fn test_widening_cast_is_transparent() {
    let model = model();
    let chain = parse("Person.Where(p => (long)p.Age > 10L)").unwrap();
    let shape = translate(&model, &chain).unwrap();
    assert_eq!(shape.filter().unwrap().to_string(), "(\"Person\".age > 10L)");
}

#[test]
fn test_narrowing_cast_to_other_store_type_fails() {
    let model = model();
    let chain = parse("Person.Where(p => (string)p.Age == \"1\")").unwrap();
    assert!(matches!(
        translate(&model, &chain),
        Err(QueryError::Untranslatable { .. })
    ));
}

#[test]
fn test_arithmetic_fails() {
    let model = model();
    let chain = parse("Person.Where(p => p.Age + 1 > 10)").unwrap();
    assert!(matches!(
        translate(&model, &chain),
        Err(QueryError::Untranslatable { .. })
    ));
}

#[test]
fn test_unknown_property_fails() {
    let model = model();
    let chain = parse("Person.Where(p => p.Salary > 10)").unwrap();
    let err = translate(&model, &chain).unwrap_err();
    assert!(err.to_string().contains("has no property 'Salary'"));
}

#[test]
fn test_unknown_entity() {
    let model = model();
    let err = translate(&model, &parse("Order.Where(o => o.Total > 1)").unwrap()).unwrap_err();
    assert!(matches!(err, QueryError::UnknownEntity(ref name) if name == "Order"));
}

#[test]
fn test_render_parameters() {
    let model = model();
    let chain = parse(
        "Person.Where(p => p.Age > 21 && p.Balance <= 10.5m || p.Active == true && p.Name != null)",
    )
    .unwrap();
    let query = translate(&model, &chain).unwrap().to_partiql().unwrap();

    assert_eq!(
        query.statement,
        "SELECT * FROM \"people\" WHERE ((\"age\" > ?) AND (\"Balance\" <= ?)) OR ((\"Active\" = ?) AND (\"Name\" IS NOT NULL))"
    );
    let parameters: Vec<_> = query
        .parameters
        .iter()
        .map(|p| (p.attribute_type.descriptor(), p.value.clone()))
        .collect();
    assert_eq!(
        parameters,
        vec![
            ("N", json!("21")),
            ("N", json!("10.5")),
            ("BOOL", json!(true)),
        ]
    );
}

struct EndsWithTranslator;

impl MethodCallTranslator for EndsWithTranslator {
    fn translate(
        &self,
        _model: &Model,
        instance: &PartiqlExpr,
        method: &MethodRef,
        args: &[PartiqlExpr],
    ) -> Option<PartiqlExpr> {
        if method.name != "EndsWith" || instance.host_type() != HostType::String {
            return None;
        }
        let mut all = vec![instance.clone()];
        all.extend(args.iter().cloned());
        Some(ExpressionFactory::default().function("ENDS_WITH", all, HostType::Bool))
    }
}

struct SuffixPlugin;

impl MethodCallTranslatorPlugin for SuffixPlugin {
    fn translators(&self) -> Vec<Box<dyn MethodCallTranslator>> {
        vec![Box::new(EndsWithTranslator)]
    }
}

#[test]
fn test_plugin_translators() {
    let model = model();
    let provider = PartiqlMethodCallTranslatorProvider::new(vec![Box::new(SuffixPlugin)]);
    let chain =
        parse("Person.Where(p => p.Name.EndsWith(\"z\") && p.Name.StartsWith(\"a\"))").unwrap();
    let shape = translate_with(&model, &chain, &provider).unwrap();
    let query = shape.to_partiql().unwrap();
    assert_eq!(
        query.statement,
        "SELECT * FROM \"people\" WHERE ENDS_WITH(\"Name\", ?) AND BEGINS_WITH(\"Name\", ?)"
    );
}
