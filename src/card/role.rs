//! Element roles: which card elements are filled from live data.
//!
//! A few well-known element ids are bound to data rather than to their
//! stored content. The binding is keyed by [`ElementRole`] so renderers
//! dispatch on an enum instead of comparing id strings.

use super::model::{CardConfig, CardElement, ElementKind};
use crate::roster::Student;

/// Data binding of a card element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRole {
    /// `schoolName`: the design's school name.
    SchoolName,
    /// `studentName`: the student's given name.
    StudentName,
    /// `studentId`: the student's identity code.
    StudentId,
    /// `qrCode`: the only QR element that receives the rendered code.
    QrSlot,
    /// Anything else renders its stored content.
    Other,
}

impl ElementRole {
    pub fn from_id(id: &str) -> Self {
        match id {
            "schoolName" => ElementRole::SchoolName,
            "studentName" => ElementRole::StudentName,
            "studentId" => ElementRole::StudentId,
            "qrCode" => ElementRole::QrSlot,
            _ => ElementRole::Other,
        }
    }
}

/// Resolve the text a text element displays for one student.
///
/// Bound roles ignore the element's stored content entirely. Returns an
/// empty string when the bound value is missing (a student without an
/// identity code) or the element is not a text element.
pub fn resolve_text<'a>(
    element: &'a CardElement,
    config: &'a CardConfig,
    student: &'a Student,
) -> &'a str {
    let ElementKind::Text { content, .. } = &element.kind else {
        return "";
    };

    match element.role() {
        ElementRole::SchoolName => config.school_name.as_str(),
        ElementRole::StudentName => student.given_name.as_str(),
        ElementRole::StudentId => student.identity.as_deref().unwrap_or(""),
        ElementRole::QrSlot | ElementRole::Other => content.as_deref().unwrap_or(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> Student {
        Student {
            given_name: "Lucía".to_string(),
            identity: Some("A-001".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_role_from_id() {
        assert_eq!(ElementRole::from_id("studentName"), ElementRole::StudentName);
        assert_eq!(ElementRole::from_id("qrCode"), ElementRole::QrSlot);
        assert_eq!(ElementRole::from_id("StudentName"), ElementRole::Other);
    }

    #[test]
    fn test_bound_roles_ignore_stored_content() {
        let config = CardConfig::default();
        let s = student();
        let name = config.element("studentName").unwrap();
        assert_eq!(resolve_text(name, &config, &s), "Lucía");
        assert_eq!(resolve_text(name, &config, &s), "Lucía");

        let school = config.element("schoolName").unwrap();
        assert_eq!(resolve_text(school, &config, &s), "Escuela de Ejemplo");

        let id = config.element("studentId").unwrap();
        assert_eq!(resolve_text(id, &config, &s), "A-001");
    }

    #[test]
    fn test_missing_identity_resolves_empty() {
        let config = CardConfig::default();
        let s = Student {
            identity: None,
            ..student()
        };
        let id = config.element("studentId").unwrap();
        assert_eq!(resolve_text(id, &config, &s), "");
    }

    #[test]
    fn test_other_text_uses_content() {
        let config = CardConfig::default();
        let el = CardElement::text("motto", 0.0, 0.0, 10.0, 10.0, "Disciplina");
        assert_eq!(resolve_text(&el, &config, &student()), "Disciplina");
    }

    #[test]
    fn test_non_text_resolves_empty() {
        let config = CardConfig::default();
        let logo = config.element("logo").unwrap();
        assert_eq!(resolve_text(logo, &config, &student()), "");
    }
}
