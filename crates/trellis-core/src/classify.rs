//! Read vs. write classification of query documents.

use serde::{Deserialize, Serialize};

/// Keywords that open a write (update) request.
pub const UPDATE_VERBS: &[&str] = &[
    "INSERT", "DELETE", "LOAD", "CREATE", "DROP", "CLEAR", "COPY", "MOVE", "ADD", "WITH",
];

/// How a query document must be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// Write request, executed through the store's update entry point.
    Update,
    /// Read request producing variable bindings.
    Rows,
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryKind::Update => write!(f, "update"),
            QueryKind::Rows => write!(f, "rows"),
        }
    }
}

/// Classify `text` by its first significant keyword.
///
/// Blank lines, `#` comments and `PREFIX`/`BASE` declarations are skipped.
/// A document with no significant line is a read. Never fails.
pub fn classify_query(text: &str) -> QueryKind {
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let token = line.split_whitespace().next().unwrap_or_default();
        let keyword: String = token
            .trim_start_matches('@')
            .chars()
            .take_while(char::is_ascii_alphabetic)
            .collect::<String>()
            .to_ascii_uppercase();

        if keyword == "PREFIX" || keyword == "BASE" {
            continue;
        }

        return if UPDATE_VERBS.contains(&keyword.as_str()) {
            QueryKind::Update
        } else {
            QueryKind::Rows
        };
    }

    QueryKind::Rows
}

/// Shorthand for `classify_query(text) == QueryKind::Update`.
pub fn is_update_query(text: &str) -> bool {
    classify_query(text) == QueryKind::Update
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_verbs_in_any_case() {
        for verb in [
            "INSERT", "delete", "Load", "CREATE", "drop", "Clear", "copy", "MOVE", "add",
        ] {
            let text = format!("{verb} DATA {{ <urn:a> <urn:b> <urn:c> }}");
            assert!(is_update_query(&text), "{verb} should classify as update");
        }
    }

    #[test]
    fn read_forms_classify_as_rows() {
        for verb in ["SELECT", "ask", "Construct", "DESCRIBE"] {
            assert_eq!(classify_query(&format!("{verb} * {{ }}")), QueryKind::Rows);
        }
    }

    #[test]
    fn comments_and_prologue_are_skipped() {
        let text = "\
# seed a node
  # indented comment

PREFIX ex: <urn:a#>
base <urn:a#>
insert data { ex:x a ex:Thing }";
        assert_eq!(classify_query(text), QueryKind::Update);
    }

    #[test]
    fn keyword_glued_to_brace() {
        assert_eq!(classify_query("DELETE{ ?s ?p ?o } WHERE { }"), QueryKind::Update);
        assert_eq!(classify_query("SELECT*{ ?s ?p ?o }"), QueryKind::Rows);
    }

    #[test]
    fn empty_or_comment_only_is_rows() {
        assert_eq!(classify_query(""), QueryKind::Rows);
        assert_eq!(classify_query("\n   \n"), QueryKind::Rows);
        assert_eq!(classify_query("# INSERT nothing\n# DROP ALL"), QueryKind::Rows);
        assert_eq!(classify_query("PREFIX ex: <urn:a#>\n"), QueryKind::Rows);
    }

    #[test]
    fn with_clause_opens_an_update() {
        assert!(is_update_query(
            "WITH <urn:g> DELETE { ?s ?p ?o } WHERE { ?s ?p ?o }"
        ));
    }
}
