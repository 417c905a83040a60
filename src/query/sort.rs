use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static RE_ORDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)-(asc|desc|ASC|DESC)$").unwrap());

/// A sortable task field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    StartDate,
    EndDate,
    Priority,
    UpdatedDate,
}

impl SortField {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "id" => Some(SortField::Id),
            "startDate" => Some(SortField::StartDate),
            "endDate" => Some(SortField::EndDate),
            "priority" => Some(SortField::Priority),
            "updatedDate" => Some(SortField::UpdatedDate),
            _ => None,
        }
    }

    /// Column name in the `tasks` table. Only these fixed names ever reach SQL.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::StartDate => "start_date",
            SortField::EndDate => "end_date",
            SortField::Priority => "priority",
            SortField::UpdatedDate => "updated_date",
        }
    }
}

/// Sort order for task listings, written `<field>-<asc|desc>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: SortField,
    pub descending: bool,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            field: SortField::Id,
            descending: false,
        }
    }
}

impl SortOrder {
    /// Parse a sort order string.
    ///
    /// Supported fields: `id`, `startDate`, `endDate`, `priority`, `updatedDate`.
    /// Examples: `startDate-asc`, `endDate-desc`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let caps = RE_ORDER
            .captures(s)
            .ok_or_else(|| Error::Validation(format!("unrecognized sort order: {s}")))?;
        let field = SortField::parse(&caps[1])
            .ok_or_else(|| Error::Validation(format!("cannot sort by '{}'", &caps[1])))?;
        let descending = caps[2].eq_ignore_ascii_case("desc");
        Ok(Self { field, descending })
    }

    pub fn to_sql(&self) -> String {
        let dir = if self.descending { "DESC" } else { "ASC" };
        format!("{} {dir}", self.field.column())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dates() {
        assert_eq!(
            SortOrder::parse("startDate-asc").unwrap(),
            SortOrder {
                field: SortField::StartDate,
                descending: false
            }
        );
        assert_eq!(
            SortOrder::parse("endDate-desc").unwrap(),
            SortOrder {
                field: SortField::EndDate,
                descending: true
            }
        );
    }

    #[test]
    fn test_parse_direction_case() {
        assert!(SortOrder::parse("priority-DESC").unwrap().descending);
        assert!(!SortOrder::parse("priority-ASC").unwrap().descending);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(SortOrder::parse("startDate").is_err());
        assert!(SortOrder::parse("startDate-up").is_err());
        assert!(SortOrder::parse("title-asc").is_err());
        assert!(SortOrder::parse("start_date; DROP TABLE tasks-asc").is_err());
        assert!(SortOrder::parse("").is_err());
    }

    #[test]
    fn test_to_sql() {
        assert_eq!(SortOrder::default().to_sql(), "id ASC");
        assert_eq!(
            SortOrder::parse("updatedDate-desc").unwrap().to_sql(),
            "updated_date DESC"
        );
    }
}
