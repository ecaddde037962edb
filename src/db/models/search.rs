use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 200;

/// Paging, sorting and keyword fields shared by every `/search` body.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PageRequest {
    pub page_index: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_descending: bool,
    pub keyword: Option<String>,
    #[serde(alias = "includeRelatedData")]
    pub include_related: bool,
}

impl PageRequest {
    pub fn page_index(&self) -> i64 {
        self.page_index.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Saturates for huge page indexes; such pages are simply empty.
    pub fn offset(&self) -> i64 {
        (self.page_index() - 1).saturating_mul(self.page_size())
    }

    /// `%keyword%` with LIKE wildcards escaped, or None for a blank keyword.
    pub fn keyword_pattern(&self) -> Option<String> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(like_pattern)
    }

    pub fn sort_key(&self) -> Option<String> {
        self.sort_by
            .as_deref()
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
    }
}

pub fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

// 排序白名单: 未识别的字段直接忽略

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectSort {
    Name,
    StartDate,
    EndDate,
    Status,
    Priority,
    CompletionPercentage,
    CreatedAt,
}

impl ProjectSort {
    pub fn parse(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "name" => Some(Self::Name),
            "startdate" => Some(Self::StartDate),
            "enddate" => Some(Self::EndDate),
            "status" => Some(Self::Status),
            "priority" => Some(Self::Priority),
            "completionpercentage" => Some(Self::CompletionPercentage),
            "createdat" => Some(Self::CreatedAt),
            _ => None,
        }
    }
}

/// Tasks share the project allow-list.
pub type TaskSort = ProjectSort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedSort {
    Name,
    CreatedAt,
}

impl NamedSort {
    pub fn parse(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "name" => Some(Self::Name),
            "createdat" => Some(Self::CreatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFileSort {
    Name,
    Status,
    CreatedAt,
}

impl MediaFileSort {
    pub fn parse(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "name" => Some(Self::Name),
            "status" => Some(Self::Status),
            "createdat" => Some(Self::CreatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GanttChartSort {
    CreatedAt,
}

impl GanttChartSort {
    pub fn parse(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "createdat" => Some(Self::CreatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSort {
    Name,
    Account,
}

impl UserSort {
    pub fn parse(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "name" => Some(Self::Name),
            "account" => Some(Self::Account),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleViewSort {
    Name,
}

impl RoleViewSort {
    pub fn parse(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "name" => Some(Self::Name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_page_index_does_not_overflow() {
        let req = PageRequest {
            page_index: Some(i64::MAX),
            page_size: Some(MAX_PAGE_SIZE),
            ..Default::default()
        };
        assert_eq!(req.page_index(), i64::MAX);
        assert_eq!(req.offset(), i64::MAX);

        let req = PageRequest {
            page_index: Some(i64::MAX),
            page_size: Some(1),
            ..Default::default()
        };
        assert_eq!(req.offset(), i64::MAX - 1);
    }

    #[test]
    fn page_defaults_and_clamping() {
        let req = PageRequest::default();
        assert_eq!(req.page_index(), 1);
        assert_eq!(req.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(req.offset(), 0);

        let req = PageRequest {
            page_index: Some(-4),
            page_size: Some(5000),
            ..Default::default()
        };
        assert_eq!(req.page_index(), 1);
        assert_eq!(req.page_size(), MAX_PAGE_SIZE);

        let req = PageRequest {
            page_index: Some(3),
            page_size: Some(0),
            ..Default::default()
        };
        assert_eq!(req.page_size(), 1);
        assert_eq!(req.offset(), 2);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("alpha"), "%alpha%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn blank_keyword_is_ignored() {
        let req = PageRequest {
            keyword: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(req.keyword_pattern(), None);
    }

    #[test]
    fn sort_keys_are_case_insensitive() {
        assert_eq!(ProjectSort::parse("StartDate"), Some(ProjectSort::StartDate));
        assert_eq!(
            ProjectSort::parse("COMPLETIONPERCENTAGE"),
            Some(ProjectSort::CompletionPercentage)
        );
        assert_eq!(ProjectSort::parse("owner"), None);
        assert_eq!(NamedSort::parse("CreatedAt"), Some(NamedSort::CreatedAt));
        assert_eq!(MediaFileSort::parse("status"), Some(MediaFileSort::Status));
        assert_eq!(GanttChartSort::parse("name"), None);
        assert_eq!(UserSort::parse("Account"), Some(UserSort::Account));
    }

    #[test]
    fn search_body_deserializes_camel_case() {
        let req: PageRequest = serde_json::from_str(
            r#"{"pageIndex":2,"pageSize":25,"sortBy":"name","sortDescending":true}"#,
        )
        .unwrap();
        assert_eq!(req.page_index(), 2);
        assert_eq!(req.page_size(), 25);
        assert!(req.sort_descending);
        assert_eq!(req.sort_key().as_deref(), Some("name"));
    }
}
