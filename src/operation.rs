use strum::{Display, EnumString};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}
