//! Storage containers ("boxes") and their types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use freezer_core::{ContainerId, ContainerTypeId, DomainError, DomainResult, Entity};

const CONTAINER_TYPE_NOTE_MAX: usize = 100;
const CONTAINER_NOTE_MAX: usize = 200;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Shape {
    Rect,
    Round,
    Oval,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Rect => "RECT",
            Shape::Round => "ROUND",
            Shape::Oval => "OVAL",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RECT" => Ok(Shape::Rect),
            "ROUND" => Ok(Shape::Round),
            "OVAL" => Ok(Shape::Oval),
            other => Err(DomainError::validation(format!(
                "shape must be one of RECT, ROUND, OVAL (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Material {
    Plastic,
    Glass,
}

impl Material {
    pub fn as_str(&self) -> &'static str {
        match self {
            Material::Plastic => "PLASTIC",
            Material::Glass => "GLASS",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PLASTIC" => Ok(Material::Plastic),
            "GLASS" => Ok(Material::Glass),
            other => Err(DomainError::validation(format!(
                "material must be one of PLASTIC, GLASS (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerType {
    pub id: ContainerTypeId,
    pub shape: Shape,
    pub volume_ml: u32,
    pub height_mm: Option<u32>,
    pub width_mm: Option<u32>,
    pub length_mm: Option<u32>,
    pub material: Option<Material>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for ContainerType {
    type Id = ContainerTypeId;
    const RESOURCE: &'static str = "container type";

    fn id(&self) -> ContainerTypeId {
        self.id
    }
}

/// Raw container type input; numbers stay signed so bad values surface as
/// validation errors rather than parse failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewContainerType {
    pub shape: String,
    pub volume_ml: Option<i64>,
    pub height_mm: Option<i64>,
    pub width_mm: Option<i64>,
    pub length_mm: Option<i64>,
    pub material: Option<String>,
    pub note: Option<String>,
}

/// Validated container type, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerTypeDraft {
    pub shape: Shape,
    pub volume_ml: u32,
    pub height_mm: Option<u32>,
    pub width_mm: Option<u32>,
    pub length_mm: Option<u32>,
    pub material: Option<Material>,
    pub note: Option<String>,
}

impl NewContainerType {
    pub fn validate(self) -> DomainResult<ContainerTypeDraft> {
        let shape = Shape::parse(&self.shape)?;
        let volume_ml = match self.volume_ml {
            Some(v) => positive("volume_ml", v)?,
            None => return Err(DomainError::validation("volume_ml is required")),
        };
        let material = match non_blank(self.material) {
            Some(m) => Some(Material::parse(&m)?),
            None => None,
        };

        Ok(ContainerTypeDraft {
            shape,
            volume_ml,
            height_mm: self.height_mm.map(|v| positive("height_mm", v)).transpose()?,
            width_mm: self.width_mm.map(|v| positive("width_mm", v)).transpose()?,
            length_mm: self.length_mm.map(|v| positive("length_mm", v)).transpose()?,
            material,
            note: bounded_note(self.note, CONTAINER_TYPE_NOTE_MAX)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: ContainerId,
    pub container_code: String,
    pub container_type_id: Option<ContainerTypeId>,
    pub note: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Entity for Container {
    type Id = ContainerId;
    const RESOURCE: &'static str = "container";

    fn id(&self) -> ContainerId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContainer {
    pub container_code: String,
    pub container_type_id: Option<ContainerTypeId>,
    pub note: Option<String>,
    pub is_active: bool,
}

impl NewContainer {
    pub fn validate(self) -> DomainResult<Self> {
        Ok(Self {
            container_code: container_code(&self.container_code)?,
            container_type_id: self.container_type_id,
            note: bounded_note(self.note, CONTAINER_NOTE_MAX)?,
            is_active: self.is_active,
        })
    }
}

/// Partial container update. `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerPatch {
    pub container_code: Option<String>,
    pub container_type_id: Option<Option<ContainerTypeId>>,
    pub note: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl ContainerPatch {
    pub fn is_empty(&self) -> bool {
        self.container_code.is_none()
            && self.container_type_id.is_none()
            && self.note.is_none()
            && self.is_active.is_none()
    }

    /// Apply the patch to a copy of `current`, validating changed fields.
    pub fn apply(self, current: &Container) -> DomainResult<Container> {
        if self.is_empty() {
            return Err(DomainError::validation("no fields to update"));
        }
        let mut next = current.clone();
        if let Some(code) = self.container_code {
            next.container_code = container_code(&code)?;
        }
        if let Some(type_id) = self.container_type_id {
            next.container_type_id = type_id;
        }
        if let Some(note) = self.note {
            next.note = bounded_note(note, CONTAINER_NOTE_MAX)?;
        }
        if let Some(active) = self.is_active {
            next.is_active = active;
        }
        Ok(next)
    }
}

/// `?active=` filter for container listings.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ActiveFilter {
    #[default]
    Active,
    Inactive,
    All,
}

impl ActiveFilter {
    /// Accepts `1`, `0` and `all`; anything else falls back to active only.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("0") => ActiveFilter::Inactive,
            Some("all") => ActiveFilter::All,
            _ => ActiveFilter::Active,
        }
    }

    pub fn matches(&self, is_active: bool) -> bool {
        match self {
            ActiveFilter::Active => is_active,
            ActiveFilter::Inactive => !is_active,
            ActiveFilter::All => true,
        }
    }
}

fn container_code(raw: &str) -> DomainResult<String> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(DomainError::validation("container_code cannot be empty"));
    }
    Ok(code.to_string())
}

fn positive(field: &str, value: i64) -> DomainResult<u32> {
    if value <= 0 {
        return Err(DomainError::validation(format!("{field} must be positive")));
    }
    u32::try_from(value).map_err(|_| DomainError::validation(format!("{field} is too large")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn bounded_note(note: Option<String>, max: usize) -> DomainResult<Option<String>> {
    let note = non_blank(note);
    if let Some(n) = &note {
        if n.chars().count() > max {
            return Err(DomainError::validation(format!(
                "note must be at most {max} characters"
            )));
        }
    }
    Ok(note)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> Container {
        Container {
            id: ContainerId::new(1),
            container_code: "B-01".to_string(),
            container_type_id: None,
            note: Some("blue lid".to_string()),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn container_type_validation_accepts_minimal_input() {
        let draft = NewContainerType {
            shape: "round".to_string(),
            volume_ml: Some(500),
            material: Some("  ".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(draft.shape, Shape::Round);
        assert_eq!(draft.volume_ml, 500);
        assert_eq!(draft.material, None);
        assert_eq!(draft.note, None);
    }

    #[test]
    fn container_type_validation_rejects_bad_values() {
        let base = NewContainerType {
            shape: "RECT".to_string(),
            volume_ml: Some(750),
            ..Default::default()
        };
        assert!(NewContainerType { shape: "HEX".into(), ..base.clone() }.validate().is_err());
        assert!(NewContainerType { volume_ml: None, ..base.clone() }.validate().is_err());
        assert!(NewContainerType { volume_ml: Some(0), ..base.clone() }.validate().is_err());
        assert!(NewContainerType { height_mm: Some(-1), ..base.clone() }.validate().is_err());
        assert!(NewContainerType { material: Some("WOOD".into()), ..base.clone() }.validate().is_err());
        assert!(
            NewContainerType { note: Some("x".repeat(101)), ..base }
                .validate()
                .is_err()
        );
    }

    #[test]
    fn new_container_requires_code() {
        let err = NewContainer {
            container_code: "   ".to_string(),
            container_type_id: None,
            note: None,
            is_active: true,
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn patch_toggles_active_and_clears_note() {
        let patch = ContainerPatch {
            is_active: Some(false),
            note: Some(None),
            ..Default::default()
        };
        let next = patch.apply(&container()).unwrap();
        assert!(!next.is_active);
        assert_eq!(next.note, None);
        assert_eq!(next.container_code, "B-01");
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(ContainerPatch::default().apply(&container()).is_err());
    }

    #[test]
    fn active_filter_falls_back_to_active() {
        assert_eq!(ActiveFilter::parse(Some("0")), ActiveFilter::Inactive);
        assert_eq!(ActiveFilter::parse(Some("all")), ActiveFilter::All);
        assert_eq!(ActiveFilter::parse(Some("bogus")), ActiveFilter::Active);
        assert_eq!(ActiveFilter::parse(None), ActiveFilter::Active);
        assert!(ActiveFilter::All.matches(false));
        assert!(!ActiveFilter::Active.matches(false));
    }
}
