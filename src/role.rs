use serde::Serialize;
use std::{
    fmt::{Display, Formatter},
    slice::Iter,
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
/// Architectural layer of a source file.
pub enum Role {
    Repository,
    Entity,
    Service,
    Controller,
    Configuration,
    Component,
    Unknown,
}

impl Role {
    pub fn iter() -> Iter<'static, Role> {
        [
            Role::Repository,
            Role::Entity,
            Role::Service,
            Role::Controller,
            Role::Configuration,
            Role::Component,
            Role::Unknown,
        ]
        .iter()
    }

    /// Roles reported in the analysis result, in report order.
    pub fn impact_categories() -> Iter<'static, Role> {
        [
            Role::Repository,
            Role::Entity,
            Role::Service,
            Role::Controller,
        ]
        .iter()
    }

    /// true iff units of this role are listed in the analysis result.
    pub fn is_impact_category(&self) -> bool {
        matches!(
            self,
            Role::Repository | Role::Entity | Role::Service | Role::Controller
        )
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{self:?}")
    }
}
