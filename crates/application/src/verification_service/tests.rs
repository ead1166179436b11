use std::collections::BTreeMap;

use serde_json::{Value, json};
use veriqry_domain::{
    EntitySchema, FetchedPage, FieldFilter, FieldType, FilterCondition, FilterSpec,
    NotificationLog, PageEnvelope, Record, SortKey, SortSpec, ViewEntry, ViewSpec,
};

use super::{ListingCase, VerificationService, pagination};

fn service() -> VerificationService {
    VerificationService::new("/api")
}

fn records(values: Vec<Value>) -> Vec<Record> {
    values
        .into_iter()
        .filter_map(|value| Record::new(value).ok())
        .collect()
}

fn sort_case(values: Vec<Value>, keys: Vec<(&str, Option<&str>)>) -> ListingCase {
    ListingCase {
        records: records(values),
        sort: SortSpec::new(
            keys.into_iter()
                .map(|(field, direction)| SortKey::new(field, direction.map(str::to_owned)))
                .collect(),
        ),
        ..ListingCase::default()
    }
}

fn filter_case(values: Vec<Value>, field: &str, conditions: Vec<(&str, Value)>) -> ListingCase {
    ListingCase {
        records: records(values),
        filter: FilterSpec::new(vec![FieldFilter::new(
            field,
            conditions
                .into_iter()
                .map(|(operator, value)| FilterCondition::new(operator, value))
                .collect(),
        )]),
        ..ListingCase::default()
    }
}

#[test]
fn ascending_sorted_data_validates_and_reversal_fails() {
    let values = vec![
        json!({"name": "alpha"}),
        json!({"name": "beta"}),
        json!({"name": "gamma"}),
    ];

    let ascending = service().verify_listing(&sort_case(values.clone(), vec![("name", Some("asc"))]));
    assert!(ascending.passed(), "issues: {:?}", ascending.issues());

    let descending = service().verify_listing(&sort_case(values, vec![("name", Some("desc"))]));
    assert!(!descending.passed());
    assert!(
        descending.issues()[0].contains("sort 'name' violates desc order"),
        "issue: {}",
        descending.issues()[0]
    );
}

#[test]
fn secondary_key_violation_inside_tie_run_fails() {
    let case = sort_case(
        vec![json!({"a": 1, "b": 2}), json!({"a": 1, "b": 1})],
        vec![("a", Some("asc")), ("b", Some("asc"))],
    );

    let verdict = service().verify_listing(&case);

    assert!(!verdict.passed());
    assert!(
        verdict
            .issues()
            .iter()
            .any(|issue| issue.contains("sort 'b' violates asc order"))
    );
}

#[test]
fn secondary_key_is_only_checked_inside_tie_runs() {
    // "b" descends across the a=1/a=2 boundary, which is irrelevant: the
    // primary key already ordered those records.
    let case = sort_case(
        vec![
            json!({"a": 1, "b": 9}),
            json!({"a": 2, "b": 1}),
            json!({"a": 2, "b": 5}),
        ],
        vec![("a", Some("asc")), ("b", Some("asc"))],
    );

    let verdict = service().verify_listing(&case);
    assert!(verdict.passed(), "issues: {:?}", verdict.issues());
}

#[test]
fn single_record_and_empty_responses_are_valid() {
    let empty = service().verify_listing(&sort_case(Vec::new(), vec![("name", Some("asc"))]));
    assert!(empty.passed());

    let single = service().verify_listing(&sort_case(
        vec![json!({"name": "only"})],
        vec![("name", Some("desc"))],
    ));
    assert!(single.passed());
}

#[test]
fn missing_direction_defaults_to_ascending() {
    let sorted = sort_case(
        vec![json!({"name": "a"}), json!({"name": "b"})],
        vec![("name", None)],
    );
    assert!(service().verify_listing(&sorted).passed());

    let unsorted = sort_case(
        vec![json!({"name": "b"}), json!({"name": "a"})],
        vec![("name", None)],
    );
    assert!(!service().verify_listing(&unsorted).passed());
}

#[test]
fn unknown_direction_token_is_reported_and_key_skipped() {
    let case = sort_case(
        vec![json!({"name": "b"}), json!({"name": "a"})],
        vec![("name", Some("sideways"))],
    );

    let verdict = service().verify_listing(&case);

    // The bad token is the only issue; the unsorted data is not checked.
    assert_eq!(verdict.issues().len(), 1);
    assert!(verdict.issues()[0].contains("unknown sort direction 'sideways'"));
}

#[test]
fn absent_sort_field_warns_unless_api_flagged_it() {
    let unflagged = sort_case(
        vec![json!({"name": "a"}), json!({"name": "b"})],
        vec![("phantom", Some("asc"))],
    );
    let verdict = service().verify_listing(&unflagged);
    assert!(!verdict.passed());
    assert!(verdict.issues()[0].contains("sort field 'phantom' is missing"));

    let mut flagged = sort_case(
        vec![json!({"name": "a"}), json!({"name": "b"})],
        vec![("phantom", Some("asc"))],
    );
    flagged.notifications = NotificationLog::from_response_value(Some(json!([
        {"field": "phantom", "message": "unknown sort field"}
    ])));
    let verdict = service().verify_listing(&flagged);
    assert!(verdict.passed(), "issues: {:?}", verdict.issues());
}

#[test]
fn nulls_sort_before_values() {
    let case = sort_case(
        vec![
            json!({"score": null}),
            json!({"score": 1}),
            json!({"score": 2}),
        ],
        vec![("score", Some("asc"))],
    );

    assert!(service().verify_listing(&case).passed());
}

#[test]
fn last_equality_filter_wins() {
    let all_female = filter_case(
        vec![json!({"gender": "female"}), json!({"gender": "female"})],
        "gender",
        vec![("eq", json!("male")), ("eq", json!("female"))],
    );
    assert!(service().verify_listing(&all_female).passed());

    let all_male = filter_case(
        vec![json!({"gender": "male"}), json!({"gender": "male"})],
        "gender",
        vec![("eq", json!("male")), ("eq", json!("female"))],
    );
    let verdict = service().verify_listing(&all_male);
    assert!(!verdict.passed());
    assert!(verdict.issues()[0].contains("violates eq \"female\""));
}

#[test]
fn first_violated_range_operator_is_reported() {
    let case = filter_case(
        vec![json!({"netWorth": 6000})],
        "netWorth",
        vec![("gte", json!(1000)), ("lte", json!(5000))],
    );

    let verdict = service().verify_listing(&case);

    assert_eq!(verdict.issues().len(), 1);
    assert!(
        verdict.issues()[0].contains("filter 'netWorth' record 0: value 6000 violates lte 5000"),
        "issue: {}",
        verdict.issues()[0]
    );
}

#[test]
fn range_conditions_all_apply() {
    let case = filter_case(
        vec![json!({"netWorth": 1000}), json!({"netWorth": 5000})],
        "netWorth",
        vec![("gte", json!(1000)), ("lte", json!(5000))],
    );

    assert!(service().verify_listing(&case).passed());
}

#[test]
fn bare_date_filter_matches_midnight_datetime_only() {
    let midnight = filter_case(
        vec![json!({"createdDate": "2023-06-01T00:00:00Z"})],
        "createdDate",
        vec![("eq", json!("2023-06-01"))],
    );
    assert!(service().verify_listing(&midnight).passed());

    let morning = filter_case(
        vec![json!({"createdDate": "2023-06-01T08:00:00Z"})],
        "createdDate",
        vec![("eq", json!("2023-06-01"))],
    );
    assert!(!service().verify_listing(&morning).passed());
}

#[test]
fn unknown_operator_token_skips_the_field() {
    let case = filter_case(
        vec![json!({"netWorth": 6000})],
        "netWorth",
        vec![("between", json!(1000)), ("lte", json!(5000))],
    );

    let verdict = service().verify_listing(&case);

    // Only the ambiguous-token issue; the lte violation is never evaluated.
    assert_eq!(verdict.issues().len(), 1);
    assert!(verdict.issues()[0].contains("unknown filter operator 'between'"));
}

#[test]
fn empty_extraction_is_vacuous_unless_field_is_unknown_and_unflagged() {
    let schema = EntitySchema::new(
        "user",
        BTreeMap::from([("name".to_owned(), FieldType::Text)]),
    )
    .ok();

    let mut unknown = filter_case(Vec::new(), "phantom", vec![("eq", json!("x"))]);
    unknown.schema = schema.clone();
    let verdict = service().verify_listing(&unknown);
    assert!(!verdict.passed());
    assert!(verdict.issues()[0].contains("filter field 'phantom' is not in the schema"));

    let mut flagged = filter_case(Vec::new(), "phantom", vec![("eq", json!("x"))]);
    flagged.schema = schema.clone();
    flagged.notifications = NotificationLog::from_response_value(Some(json!(
        "ignored unknown filter field 'phantom'"
    )));
    assert!(service().verify_listing(&flagged).passed());

    let mut known = filter_case(Vec::new(), "name", vec![("eq", json!("x"))]);
    known.schema = schema;
    assert!(service().verify_listing(&known).passed());
}

#[test]
fn declared_schema_type_drives_comparison() {
    // Without the declared number type, "900" vs "1000" on a field with no
    // numeric hint in its name would compare lexically and fail.
    let mut case = filter_case(
        vec![json!({"score": "900"})],
        "score",
        vec![("lte", json!("1000"))],
    );
    case.schema = EntitySchema::new(
        "user",
        BTreeMap::from([("score".to_owned(), FieldType::Number)]),
    )
    .ok();

    assert!(service().verify_listing(&case).passed());
}

#[test]
fn view_fields_are_extracted_for_reporting() {
    let case = ListingCase {
        records: records(vec![
            json!({"name": "a", "account": {"balance": 10}}),
            json!({"name": "b", "account.balance": 20}),
        ]),
        view: ViewSpec::new(vec![ViewEntry::new(
            "account",
            vec!["balance".to_owned()],
        )]),
        ..ListingCase::default()
    };

    let verdict = service().verify_listing(&case);

    assert!(verdict.passed(), "issues: {:?}", verdict.issues());
    assert_eq!(
        verdict.fields().get("view_account.balance"),
        Some(&vec![json!(10), json!(20)])
    );
}

#[test]
fn collection_paths_have_exactly_two_segments_after_the_root() {
    assert!(pagination::is_collection_path("/api/data/users", "/api"));
    assert!(pagination::is_collection_path(
        "/api/data/users?page=2&pageSize=8",
        "/api"
    ));
    assert!(!pagination::is_collection_path("/api/data", "/api"));
    assert!(!pagination::is_collection_path(
        "/api/data/users/42",
        "/api"
    ));
    assert!(!pagination::is_collection_path("/other/data/users", "/api"));
}

#[test]
fn missing_pagination_envelope_fails_collection_responses() {
    let case = ListingCase {
        records: records(vec![json!({"id": 1})]),
        raw_body: Some(br#"{"data": [{"id": 1}]}"#.to_vec()),
        request_path: Some("/api/data/users".to_owned()),
        ..ListingCase::default()
    };

    let verdict = service().verify_listing(&case);

    assert!(!verdict.passed());
    assert!(verdict.issues()[0].contains("missing the integer pagination envelope"));
}

#[test]
fn per_page_record_count_must_match_envelope() {
    let body = br#"{"data": [], "pagination": {"page": 1, "pageSize": 8, "total": 23, "totalPages": 3}}"#;
    let case = ListingCase {
        records: records((0..8).map(|index| json!({"id": index})).collect()),
        raw_body: Some(body.to_vec()),
        request_path: Some("/api/data/users".to_owned()),
        ..ListingCase::default()
    };
    assert!(service().verify_listing(&case).passed());

    let short = ListingCase {
        records: records((0..5).map(|index| json!({"id": index})).collect()),
        raw_body: Some(body.to_vec()),
        request_path: Some("/api/data/users".to_owned()),
        ..ListingCase::default()
    };
    let verdict = service().verify_listing(&short);
    assert!(!verdict.passed());
    assert!(
        verdict.issues()[0]
            .contains("returned 5 records, expected min(pageSize, total) = 8")
    );
}

#[test]
fn non_collection_paths_skip_the_envelope_check() {
    let case = ListingCase {
        records: records(vec![json!({"id": 1})]),
        raw_body: Some(br#"{"data": [{"id": 1}]}"#.to_vec()),
        request_path: Some("/api/data/users/1".to_owned()),
        ..ListingCase::default()
    };

    assert!(service().verify_listing(&case).passed());
}

fn traversal_pages(counts: &[usize], page_size: u64, total: u64) -> Vec<FetchedPage> {
    let total_pages = counts.len() as u64;
    let mut next_id = 0;
    counts
        .iter()
        .enumerate()
        .map(|(page_index, count)| FetchedPage {
            records: records(
                (0..*count)
                    .map(|_| {
                        next_id += 1;
                        json!({"id": next_id})
                    })
                    .collect(),
            ),
            envelope: PageEnvelope {
                page: page_index as u64 + 1,
                page_size,
                total,
                total_pages,
            },
        })
        .collect()
}

#[test]
fn full_traversal_of_23_records_in_pages_of_8_passes() {
    let pages = traversal_pages(&[8, 8, 7], 8, 23);
    let verdict = service().verify_traversal(&pages, 8, 23, "id");
    assert!(verdict.passed(), "issues: {:?}", verdict.issues());
}

#[test]
fn traversal_reports_count_and_page_mismatches() {
    let pages = traversal_pages(&[8, 8], 8, 23);
    let verdict = service().verify_traversal(&pages, 8, 23, "id");

    assert!(!verdict.passed());
    assert!(
        verdict
            .issues()
            .iter()
            .any(|issue| issue.contains("accumulated 16 records"))
    );
    assert!(
        verdict
            .issues()
            .iter()
            .any(|issue| issue.contains("walked 2 pages, expected ceil(23 / 8) = 3"))
    );
}

#[test]
fn traversal_detects_duplicates_across_page_boundaries() {
    let mut pages = traversal_pages(&[2, 2], 2, 4);
    // Overwrite the second page so it repeats the first page's ids: a
    // service that re-sorts per page instead of globally does exactly this.
    pages[1].records = records(vec![json!({"id": 1}), json!({"id": 2})]);

    let verdict = service().verify_traversal(&pages, 2, 4, "id");

    assert!(!verdict.passed());
    assert!(
        verdict
            .issues()
            .iter()
            .any(|issue| issue.contains("duplicate sort key value"))
    );
    assert!(
        verdict
            .issues()
            .iter()
            .any(|issue| issue.contains("not strictly increasing"))
    );
}

#[test]
fn traversal_requires_sort_key_on_every_record() {
    let mut pages = traversal_pages(&[2, 1], 2, 3);
    pages[1].records = records(vec![json!({"other": true})]);

    let verdict = service().verify_traversal(&pages, 2, 3, "id");

    assert!(
        verdict
            .issues()
            .iter()
            .any(|issue| issue.contains("missing sort key 'id'"))
    );
}

#[test]
fn identical_inputs_yield_identical_verdicts() {
    let case = ListingCase {
        records: records(vec![
            json!({"name": "b", "netWorth": 6000}),
            json!({"name": "a", "netWorth": 100}),
        ]),
        sort: SortSpec::new(vec![SortKey::new("name", Some("asc".to_owned()))]),
        filter: FilterSpec::new(vec![FieldFilter::new(
            "netWorth",
            vec![FilterCondition::new("lte", json!(5000))],
        )]),
        ..ListingCase::default()
    };

    let first = service().verify_listing(&case);
    let second = service().verify_listing(&case);

    assert_eq!(first, second);
    let first_bytes = serde_json::to_vec(&first).unwrap_or_default();
    let second_bytes = serde_json::to_vec(&second).unwrap_or_default();
    assert!(!first_bytes.is_empty());
    assert_eq!(first_bytes, second_bytes);
}
