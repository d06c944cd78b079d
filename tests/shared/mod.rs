#![allow(dead_code)]

use std::sync::Once;

use strum::{EnumString, VariantNames};

use sommelier::{
    parse, DirectiveDefinitionBuilder, DirectiveLocation, EnumType, InterfaceBuilder,
    ObjectTypeBuilder, OperationType, Param, Schema, Type, TypeFieldBuilder, TypeFull, Union,
    ValidationError,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, VariantNames, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
enum CanadianCity {
    Vancouver,
    CornerBrook,
    Quebec,
    Montreal,
}

fn string() -> TypeFull {
    TypeFull::named("String")
}

fn non_null(type_: TypeFull) -> TypeFull {
    TypeFull::non_null(type_)
}

fn field(name: &str, type_: TypeFull) -> sommelier::TypeField {
    TypeFieldBuilder::default()
        .name(name)
        .type_(type_)
        .build()
        .unwrap()
}

pub fn get_schema() -> anyhow::Result<Schema> {
    Ok(Schema::try_new(
        vec![
            Type::Object(
                ObjectTypeBuilder::default()
                    .name("Actor")
                    .fields([
                        field("id", non_null(TypeFull::named("ID"))),
                        field("name", non_null(string())),
                        field("expression", string()),
                        field("favoriteDesigner", TypeFull::named("Designer")),
                        field("favoriteActorOrDesigner", TypeFull::named("ActorOrDesigner")),
                    ])
                    .implements(vec!["HasName".to_owned()])
                    .build()?,
            ),
            Type::Object(
                ObjectTypeBuilder::default()
                    .name("Designer")
                    .fields([
                        field("id", non_null(TypeFull::named("ID"))),
                        field("name", non_null(string())),
                        field(
                            "favoriteOfActors",
                            non_null(TypeFull::list(non_null(TypeFull::named("Actor")))),
                        ),
                    ])
                    .implements(vec!["HasName".to_owned()])
                    .build()?,
            ),
            Type::Object(
                ObjectTypeBuilder::default()
                    .name("Query")
                    .is_top_level_type(OperationType::Query)
                    .fields([
                        TypeFieldBuilder::default()
                            .name("actor")
                            .type_(non_null(TypeFull::named("Actor")))
                            .params([Param::new("id", non_null(TypeFull::named("ID")))])
                            .build()?,
                        field("actorKatie", non_null(TypeFull::named("Actor"))),
                        field(
                            "actors",
                            non_null(TypeFull::list(non_null(TypeFull::named("Actor")))),
                        ),
                        field(
                            "certainActorOrDesigner",
                            non_null(TypeFull::named("ActorOrDesigner")),
                        ),
                        field("bestHasName", non_null(TypeFull::named("HasName"))),
                        field(
                            "actorsAndDesigners",
                            non_null(TypeFull::list(non_null(TypeFull::named(
                                "ActorOrDesigner",
                            )))),
                        ),
                        field("bestCanadianCity", non_null(TypeFull::named("CanadianCity"))),
                        TypeFieldBuilder::default()
                            .name("canadianCityQuote")
                            .type_(non_null(string()))
                            .params([Param::new(
                                "city",
                                non_null(TypeFull::named("CanadianCity")),
                            )])
                            .build()?,
                        field(
                            "designers",
                            non_null(TypeFull::list(non_null(TypeFull::named("Designer")))),
                        ),
                    ])
                    .build()?,
            ),
            Type::Object(
                ObjectTypeBuilder::default()
                    .name("Subscription")
                    .is_top_level_type(OperationType::Subscription)
                    .fields([
                        field("actorAdded", TypeFull::named("Actor")),
                        field("designerAdded", TypeFull::named("Designer")),
                    ])
                    .build()?,
            ),
            Type::Enum(EnumType::new(
                "CanadianCity",
                CanadianCity::VARIANTS.iter().copied(),
            )),
        ],
        vec![Union::new(
            "ActorOrDesigner".to_owned(),
            vec!["Actor".to_owned(), "Designer".to_owned()],
        )],
        vec![InterfaceBuilder::default()
            .name("HasName")
            .fields([field("name", non_null(string()))])
            .build()?],
        vec![DirectiveDefinitionBuilder::default()
            .name("tag")
            .locations(vec![DirectiveLocation::Field])
            .params([Param::new("name", non_null(string()))])
            .is_repeatable(true)
            .build()?],
    )?)
}

/// Parses `request` and runs every rule against it.
pub fn validate(schema: &Schema, request: &str) -> Vec<ValidationError> {
    schema.validate(&parse(request).unwrap()).into_errors()
}

pub fn pretty_print_json(json: &str) -> String {
    let parsed: serde_json::Value = serde_json::from_str(json).unwrap();
    serde_json::to_string_pretty(&parsed).unwrap()
}

static INIT_TRACING: Once = Once::new();

/// Routes the crate's rule-level `debug!` output through the test harness.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}
