use project_assistant::db::models::search::{PageRequest, ProjectSort, like_pattern};
use project_assistant::db::models::{PagedResult, ProjectSearch};
use serde_json::json;

#[test]
fn paging_defaults_and_clamps() {
    let page = PageRequest::default();
    assert_eq!(page.page_index(), 1);
    assert_eq!(page.page_size(), 10);
    assert_eq!(page.offset(), 0);

    let page: PageRequest =
        serde_json::from_value(json!({"pageIndex": 0, "pageSize": 5000})).unwrap();
    assert_eq!(page.page_index(), 1);
    assert_eq!(page.page_size(), 200);

    let page: PageRequest = serde_json::from_value(json!({"pageIndex": 3, "pageSize": 20})).unwrap();
    assert_eq!(page.offset(), 40);
}

#[test]
fn keyword_wildcards_are_escaped() {
    assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    let page: PageRequest = serde_json::from_value(json!({"keyword": "   "})).unwrap();
    assert!(page.keyword_pattern().is_none());
}

#[test]
fn search_body_flattens_paging_and_filters() {
    let search: ProjectSearch = serde_json::from_value(json!({
        "pageIndex": 2,
        "sortBy": "EndDate",
        "sortDescending": true,
        "status": "completed",
        "includeRelatedData": true
    }))
    .unwrap();
    assert_eq!(search.page.page_index(), 2);
    assert!(search.page.sort_descending);
    assert!(search.page.include_related);
    assert_eq!(
        search.page.sort_key().as_deref().and_then(ProjectSort::parse),
        Some(ProjectSort::EndDate)
    );
    assert!(ProjectSort::parse("owner_secret").is_none());
}

#[test]
fn paged_result_counts_pages() {
    let page = PagedResult::new(vec![1, 2, 3], 21, 1, 10);
    assert_eq!(page.total_pages, 3);
    let mapped = page.map(|n| n * 2);
    assert_eq!(mapped.items, vec![2, 4, 6]);
    assert_eq!(mapped.total_count, 21);
}
