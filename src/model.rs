use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

pub type PersonId = i64;
pub type RelationshipId = i64;

/// Recorded gender of a person. Unknown is a first-class state, not an
/// empty string; the empty string is only its serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "male" | "m" | "男性" => Self::Male,
            "female" | "f" | "女性" => Self::Female,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unknown => "",
        }
    }
}

impl Default for Gender {
    fn default() -> Self {
        Self::Unknown
    }
}

impl From<String> for Gender {
    fn from(value: String) -> Self {
        Self::from_token(&value)
    }
}

impl From<Gender> for String {
    fn from(value: Gender) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Error)]
#[error("unknown relationship kind `{0}`")]
pub struct ParseKindError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RelationKind {
    Spouse,
    ExSpouse,
    ParentChild,
}

impl RelationKind {
    pub fn from_token(token: &str) -> Result<Self, ParseKindError> {
        match token.trim() {
            "spouse" | "current-spouse" => Ok(Self::Spouse),
            "ex_spouse" | "former-spouse" => Ok(Self::ExSpouse),
            "parent_child" | "parent-child" => Ok(Self::ParentChild),
            other => Err(ParseKindError(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spouse => "spouse",
            Self::ExSpouse => "ex_spouse",
            Self::ParentChild => "parent_child",
        }
    }

    pub fn is_spousal(&self) -> bool {
        matches!(self, Self::Spouse | Self::ExSpouse)
    }
}

impl TryFrom<String> for RelationKind {
    type Error = ParseKindError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_token(&value)
    }
}

impl From<RelationKind> for String {
    fn from(value: RelationKind) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub id: PersonId,
    pub name: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub death_date: Option<String>,
    #[serde(default)]
    pub is_adopted: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Typed edge between two recorded people. For parent-child edges
/// `person1_id` is the parent and `person2_id` the child.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub id: RelationshipId,
    pub person1_id: PersonId,
    pub person2_id: PersonId,
    #[serde(rename = "type", alias = "relationship_type")]
    pub kind: RelationKind,
}

/// The full record set the layout pipeline consumes, and the JSON
/// interchange document produced by export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FamilyGraph {
    #[serde(default)]
    pub persons: Vec<Person>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl FamilyGraph {
    /// Index people by identifier; the first occurrence of an id wins.
    pub fn person_index(&self) -> HashMap<PersonId, &Person> {
        let mut index = HashMap::with_capacity(self.persons.len());
        for person in &self.persons {
            index.entry(person.id).or_insert(person);
        }
        index
    }

    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.persons.iter().find(|person| person.id == id)
    }

    /// First person whose name contains the fragment.
    pub fn find_by_name(&self, fragment: &str) -> Option<&Person> {
        self.persons
            .iter()
            .find(|person| person.name.contains(fragment))
    }

    pub fn has_spousal_edge(&self, id: PersonId) -> bool {
        self.relationships.iter().any(|rel| {
            rel.kind.is_spousal() && (rel.person1_id == id || rel.person2_id == id)
        })
    }

    /// Everyone transitively connected to `start` through any edge.
    ///
    /// Repeats a single expansion pass over all edges until no new
    /// identifiers are added; the reachable set is monotonically
    /// non-decreasing and bounded by the person count, so this
    /// terminates.
    pub fn relative_ids(&self, start: PersonId) -> HashSet<PersonId> {
        let mut related = HashSet::new();
        related.insert(start);

        loop {
            let before = related.len();
            for rel in &self.relationships {
                if related.contains(&rel.person1_id) {
                    related.insert(rel.person2_id);
                }
                if related.contains(&rel.person2_id) {
                    related.insert(rel.person1_id);
                }
            }
            if related.len() == before {
                break;
            }
        }

        related
    }

    /// Restrict the graph to `start` and their transitive relatives.
    /// Edges pointing outside the retained person set are kept here and
    /// dropped by the layout loader.
    pub fn focused(&self, start: PersonId) -> FamilyGraph {
        let related = self.relative_ids(start);
        FamilyGraph {
            persons: self
                .persons
                .iter()
                .filter(|person| related.contains(&person.id))
                .cloned()
                .collect(),
            relationships: self.relationships.clone(),
        }
    }
}
