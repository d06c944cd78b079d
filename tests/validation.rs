use indoc::indoc;
use rayon::prelude::*;
use strum::IntoEnumIterator;

use sommelier::{json_from_errors, parse, Rule};

mod shared;

use shared::{get_schema, init_tracing, pretty_print_json, validate};

fn validation_test(request: &str, expected: &str) {
    init_tracing();
    let schema = get_schema().unwrap();
    let errors = validate(&schema, request);
    let json = json_from_errors(&errors).unwrap();
    assert_eq!(pretty_print_json(&json), pretty_print_json(expected));
}

#[test]
fn test_unknown_field() {
    validation_test(
        indoc!(
            r#"
            {
              actorKatie {
                age
              }
            }
        "#
        ),
        r#"
            {
              "errors": [
                {
                  "message": "Field `age` doesn't exist on `Actor`",
                  "locations": [
                    {
                      "line": 3,
                      "column": 5
                    }
                  ]
                }
              ]
            }
        "#,
    );
}

#[test]
fn test_unused_variable() {
    validation_test(
        indoc!(
            r#"
            query Q($x: Int) {
              actors {
                name
              }
            }
        "#
        ),
        r#"
            {
              "errors": [
                {
                  "message": "Unused variable: `$x`",
                  "locations": [
                    {
                      "line": 1,
                      "column": 9
                    }
                  ]
                }
              ]
            }
        "#,
    );
}

#[test]
fn test_unmergeable_fields() {
    validation_test(
        indoc!(
            r#"
            {
              a: actor(id: 1) {
                name
              }
              a: actor(id: 2) {
                name
              }
            }
        "#
        ),
        r#"
            {
              "errors": [
                {
                  "message": "Fields with response name `a` can't be merged",
                  "locations": [
                    {
                      "line": 2,
                      "column": 3
                    },
                    {
                      "line": 5,
                      "column": 3
                    }
                  ]
                }
              ]
            }
        "#,
    );
}

#[test]
fn test_fragment_cycle() {
    validation_test(
        indoc!(
            r#"
            {
              actors {
                ...F
              }
            }

            fragment F on Actor {
              name
              ...F
            }
        "#
        ),
        r#"
            {
              "errors": [
                {
                  "message": "Cannot spread fragment `F` within itself",
                  "locations": [
                    {
                      "line": 7,
                      "column": 1
                    }
                  ]
                }
              ]
            }
        "#,
    );
}

#[test]
fn test_subscription_root_fields() {
    validation_test(
        indoc!(
            r#"
            subscription {
              actorAdded {
                name
              }
              designerAdded {
                name
              }
            }
        "#
        ),
        r#"
            {
              "errors": [
                {
                  "message": "Anonymous subscription must select exactly one root field",
                  "locations": [
                    {
                      "line": 1,
                      "column": 1
                    }
                  ]
                }
              ]
            }
        "#,
    );
}

#[test]
fn test_operation_name_uniqueness() {
    validation_test(
        indoc!(
            r#"
            query Whee {
              actorKatie {
                name
              }
            }

            query Whee {
              actors {
                name
              }
            }
        "#
        ),
        r#"
            {
              "errors": [
                {
                  "message": "Non-unique operation names: `Whee`",
                  "locations": [
                    {
                      "line": 1,
                      "column": 1
                    },
                    {
                      "line": 7,
                      "column": 1
                    }
                  ]
                }
              ]
            }
        "#,
    );
}

#[test]
fn test_lone_anonymous_operation() {
    validation_test(
        indoc!(
            r#"
            query Named {
              actorKatie {
                name
              }
            }

            {
              actors {
                name
              }
            }
        "#
        ),
        r#"
            {
              "errors": [
                {
                  "message": "Anonymous operation must be only operation",
                  "locations": [
                    {
                      "line": 7,
                      "column": 1
                    }
                  ]
                }
              ]
            }
        "#,
    );
}

#[test]
fn test_valid_document() {
    init_tracing();
    let schema = get_schema().unwrap();
    let request = parse(indoc!(
        r#"
        query Everything($id: ID!, $city: CanadianCity! = VANCOUVER, $withExpression: Boolean! = true) {
          actor(id: $id) {
            ...ActorFields
          }
          actorsAndDesigners {
            __typename
            ... on HasName {
              name
            }
            ... on Designer {
              favoriteOfActors {
                name @tag(name: "nested") @tag(name: "twice")
              }
            }
          }
          canadianCityQuote(city: $city)
          bestCanadianCity
          certainActorOrDesigner {
            ...DesignerFields
          }
        }

        fragment ActorFields on Actor {
          id
          name
          expression @include(if: $withExpression)
          favoriteDesigner {
            ...DesignerFields
          }
        }

        fragment DesignerFields on Designer {
          name
        }
        "#
    ))
    .unwrap();

    let result = schema.validate(&request);
    assert!(result.is_valid(), "{:?}", result.into_errors());
}

/// One violation per rule, none of which cascades into another rule.
#[test]
fn test_errors_from_independent_rules_are_all_reported() {
    init_tracing();
    let schema = get_schema().unwrap();
    let request = parse(indoc!(
        r#"
        query Q($unused: Int) {
          actorKatie {
            age
          }
          bestCanadianCity {
            name
          }
          canadianCityQuote(city: TORONTO)
          actors @cached {
            name
          }
        }
        "#
    ))
    .unwrap();

    let errors = schema.validate(&request).into_errors();
    assert_eq!(
        errors
            .iter()
            .map(|error| error.message.as_str())
            .collect::<Vec<_>>(),
        vec![
            "Field `age` doesn't exist on `Actor`",
            "Field `bestCanadianCity` can't have selection set because it is of scalar type `CanadianCity`",
            "Invalid value `TORONTO` for argument `city`, expected type `CanadianCity`",
            "Non-existent directive: `@cached`",
            "Unused variable: `$unused`",
        ]
    );

    let per_rule_total: usize = Rule::iter()
        .map(|rule| rule.run(&request, &schema).len())
        .sum();
    assert_eq!(per_rule_total, errors.len());
}

#[test]
fn test_validate_rules_runs_only_the_given_rules() {
    let schema = get_schema().unwrap();
    let request = parse("query Q($unused: Int) { actorKatie { age } }").unwrap();

    let errors = schema
        .validate_rules(&request, [Rule::NoUnusedVariables])
        .into_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Unused variable: `$unused`");

    assert!(schema
        .validate_rules(&request, [Rule::OperationNameUniqueness])
        .is_valid());
}

#[test]
fn test_validate_source_reports_syntax_errors() {
    let schema = get_schema().unwrap();
    assert!(schema.validate_source("{ actors { name }").is_err());
    assert!(schema
        .validate_source("{ actors { name } }")
        .unwrap()
        .is_valid());
}

#[test]
fn test_concurrent_validation_against_shared_schema() {
    let schema = get_schema().unwrap();
    let requests = (0..64)
        .map(|index| match index % 3 {
            0 => "{ actors { name } }".to_owned(),
            1 => format!("query Q{index}($x: Int) {{ actorKatie {{ age }} }}"),
            _ => "subscription { actorAdded { name } designerAdded { name } }".to_owned(),
        })
        .collect::<Vec<_>>();

    let sequential = requests
        .iter()
        .map(|request| validate(&schema, request))
        .collect::<Vec<_>>();
    let parallel = requests
        .par_iter()
        .map(|request| validate(&schema, request))
        .collect::<Vec<_>>();

    assert_eq!(parallel, sequential);
    assert!(parallel[0].is_empty());
    assert_eq!(parallel[1].len(), 2);
    assert_eq!(parallel[2].len(), 1);
}
