use serde::Serialize;
use smol_str::SmolStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::{debug, instrument};

use crate::{parse, Location, Request, Result, Schema};

mod arguments;
mod collect;
mod directives;
mod fields;
mod fragments;
mod merging;
mod operations;
#[cfg(test)]
mod test_utils;
mod values;
mod variables;

impl Schema {
    /// Runs every [`Rule`] against `request`.
    #[instrument(level = "trace", skip(self, request))]
    pub fn validate(&self, request: &Request) -> ValidationRequestOrErrors {
        self.validate_rules(request, Rule::iter())
    }

    /// Runs the given rules against `request`, concatenating their errors in
    /// rule order.
    #[instrument(level = "trace", skip(self, request, rules))]
    pub fn validate_rules(
        &self,
        request: &Request,
        rules: impl IntoIterator<Item = Rule>,
    ) -> ValidationRequestOrErrors {
        let errors = rules
            .into_iter()
            .flat_map(|rule| {
                let errors = rule.run(request, self);
                debug!(%rule, error_count = errors.len(), "ran validation rule");
                errors
            })
            .collect::<Vec<_>>();
        debug!(error_count = errors.len(), "validated request");

        if errors.is_empty() {
            ValidatedRequest::new().into()
        } else {
            errors.into()
        }
    }

    /// Parses `source` and validates it. Syntax errors are returned as
    /// `Err`, rule violations inside the `Ok`.
    #[instrument(level = "trace", skip(self, source))]
    pub fn validate_source(&self, source: &str) -> Result<ValidationRequestOrErrors> {
        Ok(self.validate(&parse(source)?))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
pub enum Rule {
    OperationNameUniqueness,
    LoneAnonymousOperation,
    KnownOperationTypes,
    SubscriptionSingleRootField,
    KnownTypeNames,
    FragmentsOnCompositeTypes,
    VariablesAreInputTypes,
    UniqueVariableNames,
    FieldsOnCorrectType,
    ScalarLeafs,
    KnownArgumentNames,
    UniqueArgumentNames,
    ProvidedRequiredArguments,
    ValuesOfCorrectType,
    UniqueFragmentNames,
    KnownFragmentNames,
    NoUnusedFragments,
    PossibleFragmentSpreads,
    NoFragmentCycles,
    KnownDirectives,
    DirectivesInValidLocations,
    UniqueDirectivesPerLocation,
    NoUndefinedVariables,
    NoUnusedVariables,
    VariablesInAllowedPosition,
    OverlappingFieldsCanBeMerged,
}

impl Rule {
    #[instrument(level = "trace", skip(request, schema))]
    pub fn run(self, request: &Request, schema: &Schema) -> Vec<ValidationError> {
        match self {
            Self::OperationNameUniqueness => operations::validate_operation_name_uniqueness(request),
            Self::LoneAnonymousOperation => operations::validate_lone_anonymous_operation(request),
            Self::KnownOperationTypes => operations::validate_known_operation_types(request, schema),
            Self::SubscriptionSingleRootField => {
                operations::validate_subscription_single_root_field(request)
            }
            Self::KnownTypeNames => fragments::validate_type_names_exist(request, schema),
            Self::FragmentsOnCompositeTypes => {
                fragments::validate_fragments_on_composite_types(request, schema)
            }
            Self::VariablesAreInputTypes => {
                variables::validate_variables_are_input_types(request, schema)
            }
            Self::UniqueVariableNames => variables::validate_unique_variable_names(request),
            Self::FieldsOnCorrectType => fields::validate_selection_fields_exist(request, schema),
            Self::ScalarLeafs => fields::validate_scalar_leafs(request, schema),
            Self::KnownArgumentNames => arguments::validate_argument_names_exist(request, schema),
            Self::UniqueArgumentNames => arguments::validate_no_duplicate_arguments(request, schema),
            Self::ProvidedRequiredArguments => {
                arguments::validate_required_arguments(request, schema)
            }
            Self::ValuesOfCorrectType => values::validate_values_of_correct_type(request, schema),
            Self::UniqueFragmentNames => fragments::validate_fragment_name_uniqueness(request),
            Self::KnownFragmentNames => fragments::validate_fragment_spreads_exist(request, schema),
            Self::NoUnusedFragments => fragments::validate_unused_fragments(request),
            Self::PossibleFragmentSpreads => {
                fragments::validate_fragment_spreads_relevant_type(request, schema)
            }
            Self::NoFragmentCycles => fragments::validate_no_fragment_cycles(request),
            Self::KnownDirectives => directives::validate_directives_exist(request, schema),
            Self::DirectivesInValidLocations => {
                directives::validate_directives_place(request, schema)
            }
            Self::UniqueDirectivesPerLocation => {
                directives::validate_directives_duplicate(request, schema)
            }
            Self::NoUndefinedVariables => variables::validate_no_undefined_variables(request, schema),
            Self::NoUnusedVariables => variables::validate_all_variables_used(request, schema),
            Self::VariablesInAllowedPosition => {
                variables::validate_variables_in_allowed_position(request, schema)
            }
            Self::OverlappingFieldsCanBeMerged => {
                merging::validate_overlapping_fields_can_be_merged(request, schema)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub message: SmolStr,
    pub locations: Vec<Location>,
}

impl ValidationError {
    pub fn new(message: impl Into<SmolStr>, locations: Vec<Location>) -> Self {
        Self {
            message: message.into(),
            locations,
        }
    }
}

#[derive(Debug, Default)]
pub struct ValidatedRequest {}

impl ValidatedRequest {
    pub fn new() -> Self {
        Self {}
    }
}

#[derive(Debug)]
pub enum ValidationRequestOrErrors {
    Request(ValidatedRequest),
    Errors(Vec<ValidationError>),
}

impl ValidationRequestOrErrors {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Request(_))
    }

    /// The collected errors, empty when the request was valid.
    pub fn into_errors(self) -> Vec<ValidationError> {
        match self {
            Self::Errors(errors) => errors,
            Self::Request(_) => vec![],
        }
    }
}

impl From<ValidatedRequest> for ValidationRequestOrErrors {
    fn from(value: ValidatedRequest) -> Self {
        Self::Request(value)
    }
}

impl From<Vec<ValidationError>> for ValidationRequestOrErrors {
    fn from(value: Vec<ValidationError>) -> Self {
        Self::Errors(value)
    }
}

/// Drops the missing locations of programmatically built nodes.
fn locations_of(locations: impl IntoIterator<Item = Option<Location>>) -> Vec<Location> {
    locations.into_iter().flatten().collect()
}
