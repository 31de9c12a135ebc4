//! Named collision groups.
//!
//! Shapes filter on raw `u32` group/mask bits. This registry maps an ordered
//! list of names to those bits: the first name is bit 0, the second bit 1,
//! and so on. `ALL` and `NONE` are always available.

use serde::{Deserialize, Serialize};

use crate::error::GroupError;

pub const MAX_GROUPS: usize = 32;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CollisionGroups {
    names: Vec<String>,
}

impl CollisionGroups {
    pub const ALL: u32 = u32::MAX;
    pub const NONE: u32 = 0;

    /// Build from names in bit order.
    ///
    /// # Errors
    /// More than 32 names, or a name given twice.
    pub fn new<I, S>(names: I) -> Result<Self, GroupError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut groups = Self::default();
        for name in names {
            let name = name.into();
            if groups.names.contains(&name) {
                return Err(GroupError::DuplicateGroup(name));
            }
            groups.names.push(name);
        }
        if groups.names.len() > MAX_GROUPS {
            return Err(GroupError::TooManyGroups(groups.names.len()));
        }
        Ok(groups)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The single bit for `name`. `"All"` and `"None"` resolve to the
    /// implicit masks when no group by that name was declared.
    ///
    /// # Errors
    /// `name` is not declared.
    pub fn bit(&self, name: &str) -> Result<u32, GroupError> {
        if let Some(index) = self.names.iter().position(|n| n == name) {
            return Ok(1 << index);
        }
        match name {
            "All" => Ok(Self::ALL),
            "None" => Ok(Self::NONE),
            _ => Err(GroupError::UnknownGroup(name.to_owned())),
        }
    }

    /// Union of the bits for every name.
    ///
    /// # Errors
    /// Any name is not declared.
    pub fn mask<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<u32, GroupError> {
        names
            .into_iter()
            .try_fold(Self::NONE, |mask, name| Ok(mask | self.bit(name)?))
    }
}

impl TryFrom<Vec<String>> for CollisionGroups {
    type Error = GroupError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<CollisionGroups> for Vec<String> {
    fn from(groups: CollisionGroups) -> Self {
        groups.names
    }
}
