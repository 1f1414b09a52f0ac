use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{EngineError, Result};

/// The four lists through which a test links to other entities
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssociationKind {
    Requirements,
    Designs,
    Features,
    UserStories,
}

impl AssociationKind {
    pub const ALL: [AssociationKind; 4] = [
        AssociationKind::Requirements,
        AssociationKind::Designs,
        AssociationKind::Features,
        AssociationKind::UserStories,
    ];

    /// Name of the matching array in the metadata JSON
    pub fn field_name(&self) -> &'static str {
        match self {
            AssociationKind::Requirements => "RequirementIds",
            AssociationKind::Designs => "DesignIds",
            AssociationKind::Features => "Features",
            AssociationKind::UserStories => "UserStories",
        }
    }

    /// Parse a kind from user input, accepting the JSON field name too
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "requirements" | "requirement" | "req" | "requirementids" => {
                Some(AssociationKind::Requirements)
            }
            "designs" | "design" | "designids" => Some(AssociationKind::Designs),
            "features" | "feature" => Some(AssociationKind::Features),
            "userstories" | "user-stories" | "stories" | "story" => {
                Some(AssociationKind::UserStories)
            }
            _ => None,
        }
    }

    /// The kind of entity the values in this list refer to
    pub fn target(&self) -> EntityKind {
        match self {
            AssociationKind::Requirements => EntityKind::Requirement,
            AssociationKind::Designs => EntityKind::Design,
            AssociationKind::Features => EntityKind::Feature,
            AssociationKind::UserStories => EntityKind::UserStory,
        }
    }
}

impl fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssociationKind::Requirements => write!(f, "Requirements"),
            AssociationKind::Designs => write!(f, "Designs"),
            AssociationKind::Features => write!(f, "Features"),
            AssociationKind::UserStories => write!(f, "User Stories"),
        }
    }
}

/// Every kind of keyed entity in a metadata document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Test,
    Requirement,
    Rdd,
    Design,
    Feature,
    UserStory,
}

impl EntityKind {
    /// Plural label used in diagnostics ("Duplicate Tests found!")
    pub fn plural(&self) -> &'static str {
        match self {
            EntityKind::Test => "Tests",
            EntityKind::Requirement => "Requirements",
            EntityKind::Rdd => "RDDs",
            EntityKind::Design => "Designs",
            EntityKind::Feature => "Features",
            EntityKind::UserStory => "UserStories",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Test => write!(f, "Test"),
            EntityKind::Requirement => write!(f, "Requirement"),
            EntityKind::Rdd => write!(f, "RDD"),
            EntityKind::Design => write!(f, "Design"),
            EntityKind::Feature => write!(f, "Feature"),
            EntityKind::UserStory => write!(f, "User Story"),
        }
    }
}

fn require(kind: EntityKind, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EngineError::InvalidEntity {
            kind,
            reason: format!("{} is required", field),
        });
    }
    Ok(())
}

/// A test case and the entities it covers
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Test {
    pub id: String,

    #[serde(default)]
    pub requirement_ids: Vec<String>,

    #[serde(default)]
    pub design_ids: Vec<String>,

    #[serde(default)]
    pub features: Vec<String>,

    #[serde(default)]
    pub user_stories: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
}

impl Test {
    /// Creates a test with empty association lists
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn values(&self, kind: AssociationKind) -> &Vec<String> {
        match kind {
            AssociationKind::Requirements => &self.requirement_ids,
            AssociationKind::Designs => &self.design_ids,
            AssociationKind::Features => &self.features,
            AssociationKind::UserStories => &self.user_stories,
        }
    }

    pub fn values_mut(&mut self, kind: AssociationKind) -> &mut Vec<String> {
        match kind {
            AssociationKind::Requirements => &mut self.requirement_ids,
            AssociationKind::Designs => &mut self.design_ids,
            AssociationKind::Features => &mut self.features,
            AssociationKind::UserStories => &mut self.user_stories,
        }
    }

    /// Checks the fields required when a test is entered by hand
    pub fn validate(&self) -> Result<()> {
        require(EntityKind::Test, "Id", &self.id)?;
        require(
            EntityKind::Test,
            "Release",
            self.release.as_deref().unwrap_or_default(),
        )
    }
}

/// A single requirement, owned by exactly one RDD
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Requirement {
    pub id: String,
    #[serde(default)]
    pub description: String,
}

impl Requirement {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require(EntityKind::Requirement, "Id", &self.id)?;
        require(EntityKind::Requirement, "Description", &self.description)
    }
}

/// Release Definition Document: a release and the requirements it defines
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Rdd {
    pub release: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

impl Rdd {
    pub fn new(release: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            release: release.into(),
            location: location.into(),
            requirements: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require(EntityKind::Rdd, "Release", &self.release)?;
        require(EntityKind::Rdd, "Location", &self.location)
    }
}

/// Flat `{key, location}` records that tests reference by key
pub trait KeyedRecord: Clone {
    const KIND: EntityKind;
    const ASSOCIATION: AssociationKind;

    fn new(key: String, location: String) -> Self;
    fn key(&self) -> &str;
    fn set_key(&mut self, key: String);
    fn location(&self) -> &str;
    fn set_location(&mut self, location: String);

    fn collection(metadata: &TestMetadata) -> &Vec<Self>;
    fn collection_mut(metadata: &mut TestMetadata) -> &mut Vec<Self>;

    fn validate(&self) -> Result<()> {
        require(Self::KIND, "Id", self.key())?;
        require(Self::KIND, "Location", self.location())
    }
}

macro_rules! keyed_record {
    ($name:ident, $key:ident, $kind:expr, $association:expr, $field:ident) => {
        #[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
        #[serde(rename_all = "PascalCase")]
        pub struct $name {
            pub $key: String,
            #[serde(default)]
            pub location: String,
        }

        impl KeyedRecord for $name {
            const KIND: EntityKind = $kind;
            const ASSOCIATION: AssociationKind = $association;

            fn new(key: String, location: String) -> Self {
                Self { $key: key, location }
            }

            fn key(&self) -> &str {
                &self.$key
            }

            fn set_key(&mut self, key: String) {
                self.$key = key;
            }

            fn location(&self) -> &str {
                &self.location
            }

            fn set_location(&mut self, location: String) {
                self.location = location;
            }

            fn collection(metadata: &TestMetadata) -> &Vec<Self> {
                &metadata.$field
            }

            fn collection_mut(metadata: &mut TestMetadata) -> &mut Vec<Self> {
                &mut metadata.$field
            }
        }
    };
}

keyed_record!(
    Design,
    design,
    EntityKind::Design,
    AssociationKind::Designs,
    designs
);
keyed_record!(
    Feature,
    feature,
    EntityKind::Feature,
    AssociationKind::Features,
    features
);
keyed_record!(
    UserStory,
    user_story,
    EntityKind::UserStory,
    AssociationKind::UserStories,
    user_stories
);

/// A test id and scenario name read from a feature file; never persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Scenario {
    pub id: String,
    pub name: String,
}

/// Outcome of a test lookup that creates missing tests
#[derive(Debug)]
pub enum TestLookup<'a> {
    Found(&'a mut Test),
    Created(&'a mut Test),
}

impl<'a> TestLookup<'a> {
    pub fn was_created(&self) -> bool {
        matches!(self, TestLookup::Created(_))
    }

    pub fn into_test(self) -> &'a mut Test {
        match self {
            TestLookup::Found(test) | TestLookup::Created(test) => test,
        }
    }
}

/// The whole traceability document: the unit of load and save
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct TestMetadata {
    #[serde(default)]
    pub tests: Vec<Test>,

    #[serde(default)]
    pub designs: Vec<Design>,

    #[serde(default)]
    pub features: Vec<Feature>,

    #[serde(default)]
    pub user_stories: Vec<UserStory>,

    #[serde(default, rename = "RDDs")]
    pub rdds: Vec<Rdd>,
}

impl TestMetadata {
    /// Creates an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// All requirements, in RDD order then insertion order
    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.rdds.iter().flat_map(|rdd| rdd.requirements.iter())
    }

    pub fn find_test(&self, id: &str) -> Option<&Test> {
        self.tests.iter().find(|t| t.id == id)
    }

    /// Looks a test up by exact id, appending a new empty test on a miss
    pub fn lookup_test(&mut self, id: &str) -> TestLookup<'_> {
        match self.tests.iter().position(|t| t.id == id) {
            Some(index) => TestLookup::Found(&mut self.tests[index]),
            None => {
                log::debug!("Creating test '{}' on first reference", id);
                self.tests.push(Test::new(id));
                let last = self.tests.len() - 1;
                TestLookup::Created(&mut self.tests[last])
            }
        }
    }

    /// Get-or-create: every reference to a test id materializes the test
    pub fn get_test(&mut self, id: &str) -> &mut Test {
        self.lookup_test(id).into_test()
    }

    pub fn find_rdd(&self, release: &str) -> Option<&Rdd> {
        self.rdds.iter().find(|r| r.release == release)
    }

    pub fn find_rdd_mut(&mut self, release: &str) -> Option<&mut Rdd> {
        self.rdds.iter_mut().find(|r| r.release == release)
    }

    /// Every key of the given kind, in collection order
    pub fn variants(&self, kind: AssociationKind) -> Vec<String> {
        match kind {
            AssociationKind::Requirements => self.requirements().map(|r| r.id.clone()).collect(),
            AssociationKind::Designs => self.designs.iter().map(|d| d.design.clone()).collect(),
            AssociationKind::Features => self.features.iter().map(|f| f.feature.clone()).collect(),
            AssociationKind::UserStories => {
                self.user_stories.iter().map(|u| u.user_story.clone()).collect()
            }
        }
    }

    /// Set of keys that currently exist for the given kind
    pub fn known_keys(&self, kind: AssociationKind) -> HashSet<String> {
        self.variants(kind).into_iter().collect()
    }

    /// Values that may still be added to a test's list, sorted.
    ///
    /// `filter` narrows the result by case-insensitive substring.
    pub fn options(&self, test_id: &str, kind: AssociationKind, filter: Option<&str>) -> Vec<String> {
        let current = self.find_test(test_id).map(|t| t.values(kind));
        let mut options: Vec<String> = self
            .variants(kind)
            .into_iter()
            .filter(|v| !current.map(|c| c.contains(v)).unwrap_or(false))
            .collect();

        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            let needle = filter.to_uppercase();
            options.retain(|v| v.to_uppercase().contains(&needle));
        }

        options.sort();
        options
    }

    /// Adds a value to a test's list if it matches one of the offered options.
    ///
    /// Matching ignores case; the stored spelling is the entity's own key.
    /// Returns the stored value, or `None` when the value was rejected.
    pub fn add_value(&mut self, test_id: &str, kind: AssociationKind, value: &str) -> Option<String> {
        if value.is_empty() {
            return None;
        }

        let wanted = value.to_uppercase();
        let Some(valid) = self
            .options(test_id, kind, None)
            .into_iter()
            .find(|v| v.to_uppercase() == wanted)
        else {
            log::warn!("\"{}\" is not a valid value for \"{}\"", value, kind.field_name());
            return None;
        };

        self.get_test(test_id).values_mut(kind).push(valid.clone());
        Some(valid)
    }

    /// Removes the first occurrence of a value from a test's list
    pub fn remove_value(&mut self, test_id: &str, kind: AssociationKind, value: &str) -> bool {
        let values = self.get_test(test_id).values_mut(kind);
        match values.iter().position(|v| v == value) {
            Some(index) => {
                values.remove(index);
                true
            }
            None => false,
        }
    }

    /// Adds a test entered by hand
    pub fn add_test(&mut self, test: Test) -> Result<()> {
        test.validate()?;
        self.tests.push(test);
        Ok(())
    }

    /// Fails when another RDD already carries `release`
    pub(crate) fn ensure_release_free(&self, release: &str) -> Result<()> {
        if self.find_rdd(release).is_some() {
            return Err(EngineError::InvalidEntity {
                kind: EntityKind::Rdd,
                reason: format!("Release already exists: {}", release),
            });
        }
        Ok(())
    }

    pub fn add_rdd(&mut self, rdd: Rdd) -> Result<()> {
        rdd.validate()?;
        self.ensure_release_free(&rdd.release)?;
        self.rdds.push(rdd);
        Ok(())
    }

    /// Appends a requirement to the RDD with the given release
    pub fn add_requirement(&mut self, release: &str, requirement: Requirement) -> Result<()> {
        requirement.validate()?;
        let rdd = self
            .find_rdd_mut(release)
            .ok_or_else(|| EngineError::NotFound {
                kind: EntityKind::Rdd,
                key: release.to_string(),
            })?;
        rdd.requirements.push(requirement);
        Ok(())
    }

    pub fn add_record<R: KeyedRecord>(&mut self, record: R) -> Result<()> {
        record.validate()?;
        R::collection_mut(self).push(record);
        Ok(())
    }

    pub fn find_record<R: KeyedRecord>(&self, key: &str) -> Option<&R> {
        R::collection(self).iter().find(|r| r.key() == key)
    }
}
