//! # Resource Type Registry
//!
//! Derives remote collection names from resource type names. The collection name is used twice:
//! as the suffix of every remote procedure (`read_fields`) and as the payload key of batch
//! bodies (`{"fields": [...]}`).

/// Strips module qualification and generic arguments from a Rust type name
/// (e.g. `"resource_sample::model::field::Field"` → `"Field"`).
pub fn simple_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("index", "indices"),
    ("status", "statuses"),
];

const F_TO_VES: &[&str] = &["leaf", "half", "shelf", "wife", "life", "knife"];

/// Lowercased English plural of a type's simple name. Deterministic.
///
/// ```rust
/// use resource_framework::registry::plural_name;
///
/// assert_eq!(plural_name("Field"), "fields");
/// assert_eq!(plural_name("crate::model::Contact"), "contacts");
/// assert_eq!(plural_name("Category"), "categories");
/// ```
pub fn plural_name(type_name: &str) -> String {
    let word = simple_type_name(type_name).to_lowercase();

    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == word) {
        return (*plural).to_string();
    }
    if F_TO_VES.contains(&word.as_str()) {
        let stem = word.trim_end_matches("fe").trim_end_matches('f');
        return format!("{stem}ves");
    }
    if let Some(stem) = word.strip_suffix('y') {
        if stem.chars().last().is_some_and(|c| !"aeiou".contains(c)) {
            return format!("{stem}ies");
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|end| word.ends_with(end)) {
        return format!("{word}es");
    }
    format!("{word}s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_type_name() {
        assert_eq!(simple_type_name("Field"), "Field");
        assert_eq!(simple_type_name("a::b::Contact"), "Contact");
        assert_eq!(simple_type_name("a::Wrapper<b::Inner>"), "Wrapper");
    }

    #[test]
    fn test_regular_plurals() {
        assert_eq!(plural_name("Field"), "fields");
        assert_eq!(plural_name("Contact"), "contacts");
        assert_eq!(plural_name("List"), "lists");
    }

    #[test]
    fn test_suffix_rules() {
        assert_eq!(plural_name("Category"), "categories");
        assert_eq!(plural_name("Survey"), "surveys");
        assert_eq!(plural_name("Address"), "addresses");
        assert_eq!(plural_name("Box"), "boxes");
        assert_eq!(plural_name("Batch"), "batches");
        assert_eq!(plural_name("Wish"), "wishes");
        assert_eq!(plural_name("Shelf"), "shelves");
        assert_eq!(plural_name("Life"), "lives");
    }

    #[test]
    fn test_irregular_plurals() {
        assert_eq!(plural_name("Person"), "people");
        assert_eq!(plural_name("Child"), "children");
    }

    #[test]
    fn test_plural_is_stable_and_lowercase() {
        for name in ["Field", "CONTACT", "app::MailingList"] {
            let first = plural_name(name);
            assert_eq!(first, plural_name(name));
            assert_eq!(first, first.to_lowercase());
        }
        assert_eq!(plural_name("app::MailingList"), "mailinglists");
    }
}
