use derive_builder::Builder;
use strum::{Display, EnumIter, EnumString};

use crate::{IndexMap, OperationType, Param, TypeFull, Value};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,
    Schema,
    Scalar,
    Object,
    FieldDefinition,
    ArgumentDefinition,
    Interface,
    Union,
    Enum,
    EnumValue,
    InputObject,
    InputFieldDefinition,
}

impl From<OperationType> for DirectiveLocation {
    fn from(value: OperationType) -> Self {
        match value {
            OperationType::Query => Self::Query,
            OperationType::Mutation => Self::Mutation,
            OperationType::Subscription => Self::Subscription,
        }
    }
}

#[derive(Builder, Debug)]
#[builder(pattern = "owned")]
pub struct DirectiveDefinition {
    #[builder(setter(into))]
    pub name: String,
    pub locations: Vec<DirectiveLocation>,
    #[builder(setter(custom), default)]
    pub params: IndexMap<String, Param>,
    #[builder(default)]
    pub is_repeatable: bool,
}

impl DirectiveDefinitionBuilder {
    pub fn params(self, params: impl IntoIterator<Item = Param>) -> Self {
        let mut new = self;
        new.params = Some(
            params
                .into_iter()
                .map(|param| (param.name.clone(), param))
                .collect(),
        );
        new
    }
}

impl DirectiveDefinition {
    pub fn new(
        name: impl Into<String>,
        locations: Vec<DirectiveLocation>,
        params: impl IntoIterator<Item = Param>,
        is_repeatable: bool,
    ) -> Self {
        Self {
            name: name.into(),
            locations,
            params: params
                .into_iter()
                .map(|param| (param.name.clone(), param))
                .collect(),
            is_repeatable,
        }
    }

    pub fn is_allowed_at(&self, location: DirectiveLocation) -> bool {
        self.locations.contains(&location)
    }
}

pub fn builtin_directives() -> Vec<DirectiveDefinition> {
    let conditional_locations = vec![
        DirectiveLocation::Field,
        DirectiveLocation::FragmentSpread,
        DirectiveLocation::InlineFragment,
    ];
    vec![
        DirectiveDefinition::new(
            "skip",
            conditional_locations.clone(),
            [Param::new("if", TypeFull::non_null(TypeFull::named("Boolean")))],
            false,
        ),
        DirectiveDefinition::new(
            "include",
            conditional_locations,
            [Param::new("if", TypeFull::non_null(TypeFull::named("Boolean")))],
            false,
        ),
        DirectiveDefinition::new(
            "deprecated",
            vec![
                DirectiveLocation::FieldDefinition,
                DirectiveLocation::ArgumentDefinition,
                DirectiveLocation::InputFieldDefinition,
                DirectiveLocation::EnumValue,
            ],
            [Param::new_with_default(
                "reason",
                TypeFull::named("String"),
                Value::String("No longer supported".into()),
            )],
            false,
        ),
        DirectiveDefinition::new(
            "specifiedBy",
            vec![DirectiveLocation::Scalar],
            [Param::new("url", TypeFull::non_null(TypeFull::named("String")))],
            false,
        ),
    ]
}
