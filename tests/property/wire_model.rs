//! Property-based tests for the wire model.
//!
//! Uses proptest to verify:
//! 1. Any task survives a JSON round-trip, optional fields included.
//! 2. Validation never panics, on well-formed or hostile input.
//! 3. Query rendering emits exactly one pair per set field.
//! 4. Arbitrary JSON never causes a panic during deserialization.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use uuid::Uuid;

use taskdeck_api::{
    CreateTaskRequest, Task, TaskId, TaskPriority, TaskQuery, TaskStatus, validate_title,
};

// --- Strategies ---

fn arb_server_id() -> impl Strategy<Value = TaskId> {
    any::<u128>().prop_map(|n| TaskId::new(Uuid::from_u128(n).to_string()))
}

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![Just(TaskStatus::Pending), Just(TaskStatus::Completed)]
}

fn arb_priority() -> impl Strategy<Value = TaskPriority> {
    prop_oneof![
        Just(TaskPriority::Low),
        Just(TaskPriority::Medium),
        Just(TaskPriority::High),
    ]
}

/// Titles that pass validation: 1 to 100 chars with a non-space char.
fn arb_valid_title() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,99}".prop_map(|s| format!("x{s}"))
}

fn arb_task() -> impl Strategy<Value = Task> {
    (
        arb_server_id(),
        arb_valid_title(),
        prop::option::of("[a-z ]{0,64}"),
        arb_status(),
        prop::option::of(arb_priority()),
        prop::option::of("[0-9-]{8,10}"),
        prop::option::of("[a-z0-9-]{1,16}"),
    )
        .prop_map(
            |(id, title, description, status, priority, due_date, category_id)| Task {
                id,
                title,
                description,
                status,
                priority,
                due_date,
                created_at: "2026-08-30T10:00:00Z".to_string(),
                updated_at: None,
                category_id,
            },
        )
}

fn arb_query() -> impl Strategy<Value = TaskQuery> {
    (
        prop::option::of(arb_status()),
        prop::option::of(arb_priority()),
        prop::option::of(any::<u32>()),
        prop::option::of(any::<u32>()),
    )
        .prop_map(|(status, priority, limit, offset)| TaskQuery {
            status,
            priority,
            limit,
            offset,
        })
}

// --- Property tests ---

proptest! {
    /// Any task survives a JSON round-trip.
    #[test]
    fn task_json_round_trip(task in arb_task()) {
        let json = serde_json::to_string(&task).expect("serialize");
        let decoded: Task = serde_json::from_str(&json).expect("deserialize");
        prop_assert_eq!(task, decoded);
    }

    /// Serialized tasks never contain snake_case field names.
    #[test]
    fn task_serializes_camel_case_only(task in arb_task()) {
        let json = serde_json::to_string(&task).expect("serialize");
        prop_assert!(!json.contains("due_date"));
        prop_assert!(!json.contains("created_at"));
        prop_assert!(!json.contains("category_id"));
    }

    /// Generated tasks always pass structural validation.
    #[test]
    fn generated_task_validates(task in arb_task()) {
        prop_assert!(task.validate().is_ok());
    }

    /// Validation never panics on arbitrary titles.
    #[test]
    fn title_validation_never_panics(title in ".*") {
        let _ = validate_title(&title);
    }

    /// A title accepted by validation is 1 to 100 chars and non-blank.
    #[test]
    fn accepted_titles_are_in_bounds(title in ".*") {
        if validate_title(&title).is_ok() {
            let chars = title.chars().count();
            prop_assert!(chars >= 1 && chars <= 100);
            prop_assert!(!title.trim().is_empty());
        }
    }

    /// Query rendering emits exactly one pair per set field, none for
    /// unset fields.
    #[test]
    fn query_pairs_match_set_fields(query in arb_query()) {
        let expected = usize::from(query.status.is_some())
            + usize::from(query.priority.is_some())
            + usize::from(query.limit.is_some())
            + usize::from(query.offset.is_some());
        prop_assert_eq!(query.to_pairs().len(), expected);
    }

    /// Create requests only serialize the fields that are set.
    #[test]
    fn create_request_omits_unset_fields(
        title in arb_valid_title(),
        description in prop::option::of("[a-z ]{0,64}"),
        priority in prop::option::of(arb_priority()),
    ) {
        let request = CreateTaskRequest {
            title,
            description,
            priority,
            ..CreateTaskRequest::default()
        };
        let json = serde_json::to_string(&request).expect("serialize");
        prop_assert_eq!(json.contains("description"), request.description.is_some());
        prop_assert_eq!(json.contains("priority"), request.priority.is_some());
        prop_assert!(!json.contains("dueDate"));
    }

    /// Arbitrary JSON never panics the deserializer.
    #[test]
    fn arbitrary_json_never_panics(text in ".{0,256}") {
        let _ = serde_json::from_str::<Task>(&text);
    }
}
