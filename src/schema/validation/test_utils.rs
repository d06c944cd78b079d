use indoc::indoc;

use crate::{parse, Request, Schema, ValidationError};

pub(crate) const TEST_SDL: &str = indoc!(
    "
    interface HasName {
      name: String!
    }

    type Actor implements HasName {
      id: ID!
      name: String!
      age: Int
      nickname: String
      favoriteColor: Color
      bestFriend: Actor
      friends(first: Int = 10, after: String): [Actor!]!
      roles(kind: RoleKind!, filter: RoleFilter): [Role]
    }

    type Designer implements HasName {
      id: ID!
      name: String!
      age: String
      portfolio: [String]
    }

    type Role {
      title: String!
    }

    union ActorOrDesigner = Actor | Designer

    enum Color {
      RED
      GREEN
      BLUE
    }

    enum RoleKind {
      LEAD
      SUPPORTING
    }

    input RoleFilter {
      minYear: Int
      titles: [String!]
      kind: RoleKind = LEAD
    }

    type Query {
      actor(id: ID!): Actor
      actors(first: Int, ids: [ID!]): [Actor!]!
      designers: [Designer]
      searchByName(name: String!): [HasName!]!
      anything: [ActorOrDesigner!]!
      favoriteColor(color: Color): Color
      count(filter: RoleFilter, limit: Float): Int
    }

    type Mutation {
      renameActor(id: ID!, name: String!): Actor
    }

    type Subscription {
      actorAdded: Actor
      designerAdded: Designer
    }

    directive @onQuery on QUERY
    directive @tag(name: String!) repeatable on FIELD | FRAGMENT_SPREAD | INLINE_FRAGMENT
    directive @cached(ttl: Int) on FIELD
    "
);

pub(crate) fn test_schema() -> Schema {
    Schema::from_sdl(TEST_SDL).unwrap()
}

/// Runs a single rule function against `source`.
pub(crate) fn run_rule(
    rule: impl Fn(&Request, &Schema) -> Vec<ValidationError>,
    source: &str,
) -> Vec<ValidationError> {
    let schema = test_schema();
    let request = parse(source).unwrap();
    rule(&request, &schema)
}

pub(crate) fn messages(errors: &[ValidationError]) -> Vec<&str> {
    errors.iter().map(|error| error.message.as_str()).collect()
}
